#![forbid(unsafe_code)]

//! Token lifecycle: cache lookup, expiry check, STS round trip, persistence.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, warn};
use wstrust_core::Error;
use wstrust_xml::XmlBuilder;

use crate::cache::{TokenCache, SAFETY_MARGIN_SECS};
use crate::clock::{Clock, SystemClock};
use crate::config::RequestConfig;
use crate::envelope::{Envelope, MessageStamp};
use crate::fault::parse_fault;
use crate::request::StsRequest;
use crate::token::SecurityToken;
use crate::transport::{self, HttpRequest, Transport};

/// Fault source name for STS faults.
pub const STS_SOURCE: &str = "STS";

/// Obtains security tokens for one client configuration.
pub struct TokenManager {
    config: RequestConfig,
    builder: XmlBuilder,
    transport: Arc<dyn Transport>,
    cache: Arc<dyn TokenCache>,
    clock: Arc<dyn Clock>,
    token: Option<SecurityToken>,
}

impl TokenManager {
    pub fn new(config: RequestConfig, transport: Arc<dyn Transport>, cache: Arc<dyn TokenCache>) -> Self {
        Self {
            config,
            builder: XmlBuilder::default(),
            transport,
            cache,
            clock: Arc::new(SystemClock),
            token: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// The token returned by the last successful [`ensure_token`](Self::ensure_token).
    pub fn token(&self) -> Option<&SecurityToken> {
        self.token.as_ref()
    }

    /// Return a usable token for `cache_id`, requesting a new one from the
    /// STS when the cache has none, it has expired, or `force_refresh` is set.
    ///
    /// A newly issued token is written to the cache; a failed write is
    /// returned as an error.  A failed cache read counts as a miss.
    pub fn ensure_token(&mut self, cache_id: &str, force_refresh: bool) -> Result<&SecurityToken, Error> {
        if !force_refresh {
            if let Some(token) = self.cached(cache_id) {
                debug!(cache_id, expires = %token.lifetime().expires, "using cached security token");
                return Ok(self.token.insert(token));
            }
        }

        let token = self.request_token()?;
        self.cache.set(cache_id, &token.to_record())?;
        info!(cache_id, expires = %token.lifetime().expires, "security token issued");
        Ok(self.token.insert(token))
    }

    fn cached(&self, cache_id: &str) -> Option<SecurityToken> {
        let record = match self.cache.get(cache_id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(cache_id, "no cached security token");
                return None;
            }
            Err(error) => {
                warn!(cache_id, %error, "cache read failed, treating as miss");
                return None;
            }
        };
        let now = self.clock.now();
        if !record
            .lifetime
            .is_valid_at(now, Duration::seconds(SAFETY_MARGIN_SECS))
        {
            debug!(cache_id, expires = %record.lifetime.expires, "cached security token expired");
            return None;
        }
        Some(SecurityToken::from_record(record))
    }

    /// Request a new token from the STS without touching the cache.
    pub fn request_token(&self) -> Result<SecurityToken, Error> {
        let stamp = MessageStamp::generate(self.clock.now());
        let body = self.build_request(&stamp)?.to_xml();
        debug!(url = self.config.sts_url(), realm = self.config.realm(), "requesting security token");

        let request = HttpRequest::soap(self.config.sts_url(), body, self.config.call_timeout());
        let response = transport::send(self.transport.as_ref(), &request)?;
        {
            let doc = wstrust_xml::parse(&response.body)?;
            if let Some(fault) = parse_fault(&doc, STS_SOURCE) {
                warn!(status = response.status, code = %fault.code, reason = %fault.reason, "STS returned a fault");
                return Err(Error::StsFault(Box::new(fault)));
            }
        }
        SecurityToken::from_response(response.body)
    }

    /// Build the signed STS request for `stamp`.
    pub fn build_request(&self, stamp: &MessageStamp) -> Result<Envelope, Error> {
        StsRequest::new(&self.config, stamp).build(&self.builder)
    }

    /// The signed STS request as it would be sent now.
    pub fn request_xml(&self) -> Result<String, Error> {
        let stamp = MessageStamp::generate(self.clock.now());
        Ok(self.build_request(&stamp)?.to_xml())
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("config", &self.config)
            .field("token", &self.token.as_ref().map(|t| t.lifetime()))
            .finish_non_exhaustive()
    }
}
