#![forbid(unsafe_code)]

//! Token-authenticated service calls with bounded retry.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use wstrust_core::{Error, Fault};
use wstrust_sts::envelope::{Envelope, MessageStamp};
use wstrust_sts::transport::{self, HttpRequest, Transport};
use wstrust_sts::{parse_fault, Clock, RequestConfig, SecurityToken, TokenCache, TokenManager};
use wstrust_xml::XmlBuilder;

use crate::definition::ServiceDefinition;
use crate::envelope::BusinessRequest;
use crate::result::{process_output, CallOutput};

enum Outcome {
    Success(CallOutput),
    Fault(Fault),
}

/// Calls operations of one service, obtaining tokens through a
/// [`TokenManager`] that shares the transport.
pub struct ServiceClient {
    definition: ServiceDefinition,
    service_url: String,
    builder: XmlBuilder,
    transport: Arc<dyn Transport>,
    tokens: TokenManager,
}

impl ServiceClient {
    /// Fails with [`Error::Configuration`] when the config has no service URL.
    pub fn new(
        config: RequestConfig,
        definition: ServiceDefinition,
        transport: Arc<dyn Transport>,
        cache: Arc<dyn TokenCache>,
    ) -> Result<Self, Error> {
        let service_url = config
            .service_url()
            .map(str::to_owned)
            .ok_or_else(|| Error::missing_config(["service_url"]))?;
        let builder = XmlBuilder::new(definition.namespaces().clone());
        let tokens = TokenManager::new(config, Arc::clone(&transport), cache);
        Ok(Self {
            definition,
            service_url,
            builder,
            transport,
            tokens,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.tokens = self.tokens.with_clock(clock);
        self
    }

    pub fn definition(&self) -> &ServiceDefinition {
        &self.definition
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Call `action` with `params`.
    ///
    /// A fault triggers a token refresh and another call, up to
    /// `max_service_attempts` extra calls.  Faults whose tag is in the
    /// service's not-found list are returned at once.  The returned
    /// [`Error::ServiceFault`] carries the number of calls made.
    pub fn invoke(
        &mut self,
        action: &str,
        params: &Map<String, Value>,
        bypass_paths: bool,
    ) -> Result<CallOutput, Error> {
        let max_calls = self.tokens.config().max_service_attempts().saturating_add(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let fault = match self.call_once(action, params, bypass_paths, attempt > 1)? {
                Outcome::Success(output) => {
                    debug!(action, attempt, "service call succeeded");
                    return Ok(output);
                }
                Outcome::Fault(fault) => fault,
            };

            if self.definition.is_not_found(fault.tag.as_deref()) {
                debug!(action, attempt, tag = fault.tag.as_deref(), "not-found fault, not retrying");
                return Err(Error::ServiceFault {
                    fault: Box::new(fault),
                    attempts: attempt,
                });
            }
            if attempt >= max_calls {
                warn!(action, attempts = attempt, code = %fault.code, "service call failed, retries exhausted");
                return Err(Error::ServiceFault {
                    fault: Box::new(fault),
                    attempts: attempt,
                });
            }
            info!(action, attempt, code = %fault.code, reason = %fault.reason, "service fault, refreshing token and retrying");
        }
    }

    fn call_once(
        &mut self,
        action: &str,
        params: &Map<String, Value>,
        bypass_paths: bool,
        force_refresh: bool,
    ) -> Result<Outcome, Error> {
        let token = self
            .tokens
            .ensure_token(self.definition.cache_id(), force_refresh)?
            .clone();
        let body = self.build_request(action, params, &token)?.to_xml();
        let request = HttpRequest::soap(&self.service_url, body, self.tokens.config().call_timeout());
        let response = transport::send(self.transport.as_ref(), &request)?;
        {
            let doc = wstrust_xml::parse(&response.body)?;
            if let Some(fault) = parse_fault(&doc, self.definition.name()) {
                return Ok(Outcome::Fault(fault));
            }
        }
        process_output(&response.body, action, &self.definition, bypass_paths).map(Outcome::Success)
    }

    fn build_request(
        &self,
        action: &str,
        params: &Map<String, Value>,
        token: &SecurityToken,
    ) -> Result<Envelope, Error> {
        let stamp = MessageStamp::generate(self.tokens.clock().now());
        self.build_request_with(action, params, token, &stamp)
    }

    /// Build the signed request for `action` with explicit stamp and token.
    pub fn build_request_with(
        &self,
        action: &str,
        params: &Map<String, Value>,
        token: &SecurityToken,
        stamp: &MessageStamp,
    ) -> Result<Envelope, Error> {
        BusinessRequest {
            definition: &self.definition,
            url: &self.service_url,
            action,
            params,
            stamp,
            token,
        }
        .build(&self.builder)
    }

    /// The signed request for `action` as it would be sent now, using the
    /// cached token (or a newly issued one).
    pub fn request_xml(&mut self, action: &str, params: &Map<String, Value>) -> Result<String, Error> {
        let token = self
            .tokens
            .ensure_token(self.definition.cache_id(), false)?
            .clone();
        Ok(self.build_request(action, params, &token)?.to_xml())
    }
}

impl std::fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("service", &self.definition.name())
            .field("service_url", &self.service_url)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}
