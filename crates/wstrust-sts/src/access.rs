#![forbid(unsafe_code)]

//! OAuth2 access tokens from the token service's authorization endpoint.
//!
//! The first token is obtained with an authorization code.  Once a token
//! with a refresh token is cached, expired or forced renewals use the
//! `refresh_token` grant instead.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wstrust_core::{Error, Fault};

use crate::cache::{CacheRecord, Lifetime, TokenCache};
use crate::clock::{Clock, SystemClock};
use crate::config::DEFAULT_CALL_TIMEOUT;
use crate::transport::{self, HttpRequest, Transport};

/// Keys accepted by [`AccessTokenConfig::from_settings`].
pub const ACCESS_SETTING_KEYS: &[&str] = &[
    "url",
    "client_id",
    "client_secret",
    "redirect_uri",
    "code",
    "cache_id",
    "call_timeout",
];

#[derive(Clone)]
pub struct AccessTokenConfig {
    url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    code: Option<String>,
    cache_id: String,
    call_timeout: StdDuration,
}

impl AccessTokenConfig {
    pub fn builder() -> AccessTokenConfigBuilder {
        AccessTokenConfigBuilder::default()
    }

    /// Build from string settings.  `call_timeout` is in seconds.
    pub fn from_settings<I, K, V>(settings: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut builder = AccessTokenConfigBuilder::default();
        for (key, value) in settings {
            let key = key.as_ref();
            let value: String = value.into();
            match key {
                "url" => builder.url = Some(value),
                "client_id" => builder.client_id = Some(value),
                "client_secret" => builder.client_secret = Some(value),
                "redirect_uri" => builder.redirect_uri = Some(value),
                "code" => builder.code = Some(value),
                "cache_id" => builder.cache_id = Some(value),
                "call_timeout" => match value.trim().parse::<u64>() {
                    Ok(secs) => builder.call_timeout = Some(StdDuration::from_secs(secs)),
                    Err(_) => builder.invalid.push(format!("call_timeout={value}")),
                },
                other => builder.unknown.push(other.to_owned()),
            }
        }
        builder.build()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Authorization code for the first grant.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn cache_id(&self) -> &str {
        &self.cache_id
    }

    pub fn call_timeout(&self) -> StdDuration {
        self.call_timeout
    }
}

impl std::fmt::Debug for AccessTokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenConfig")
            .field("url", &self.url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("code", &self.code.as_ref().map(|_| "<redacted>"))
            .field("cache_id", &self.cache_id)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

#[derive(Debug, Default, Clone)]
pub struct AccessTokenConfigBuilder {
    url: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
    code: Option<String>,
    cache_id: Option<String>,
    call_timeout: Option<StdDuration>,
    unknown: Vec<String>,
    invalid: Vec<String>,
}

impl AccessTokenConfigBuilder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn cache_id(mut self, id: impl Into<String>) -> Self {
        self.cache_id = Some(id.into());
        self
    }

    pub fn call_timeout(mut self, timeout: StdDuration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<AccessTokenConfig, Error> {
        let mut missing = Vec::new();
        let mut invalid = self.invalid;

        let mut required = |name: &str, value: Option<String>| {
            let value = value.filter(|v| !v.trim().is_empty());
            if value.is_none() {
                missing.push(name.to_owned());
            }
            value
        };
        let url = required("url", self.url);
        let client_id = required("client_id", self.client_id);
        let client_secret = required("client_secret", self.client_secret);
        let redirect_uri = required("redirect_uri", self.redirect_uri);

        let call_timeout = self.call_timeout.unwrap_or(DEFAULT_CALL_TIMEOUT);
        if call_timeout.is_zero() {
            invalid.push("call_timeout=0".to_owned());
        }

        match (url, client_id, client_secret, redirect_uri) {
            (Some(url), Some(client_id), Some(client_secret), Some(redirect_uri))
                if self.unknown.is_empty() && invalid.is_empty() =>
            {
                Ok(AccessTokenConfig {
                    url,
                    client_id,
                    client_secret,
                    redirect_uri,
                    code: self.code.filter(|c| !c.trim().is_empty()),
                    cache_id: self.cache_id.unwrap_or_default(),
                    call_timeout,
                })
            }
            _ => Err(Error::Configuration {
                missing,
                unknown: self.unknown,
                invalid,
            }),
        }
    }
}

/// A bearer token and the refresh token that renews it.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    access_token: String,
    refresh_token: Option<String>,
    token_type: Option<String>,
    lifetime: Lifetime,
}

impl AccessToken {
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    fn from_record(record: CacheRecord) -> Result<Self, Error> {
        let stored: StoredToken = serde_json::from_str(&record.payload)
            .map_err(|e| Error::Cache(format!("access token record: {e}")))?;
        Ok(Self {
            access_token: stored.access_token,
            refresh_token: stored.refresh_token,
            token_type: stored.token_type,
            lifetime: record.lifetime,
        })
    }

    fn to_record(&self) -> Result<CacheRecord, Error> {
        let stored = StoredToken {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            token_type: self.token_type.clone(),
        };
        let payload = serde_json::to_string(&stored)
            .map_err(|e| Error::Cache(format!("access token record: {e}")))?;
        Ok(CacheRecord {
            lifetime: self.lifetime,
            payload,
        })
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token_type", &self.token_type)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_type: Option<String>,
}

/// Body of a token endpoint answer, success or error.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<serde_json::Value>,
    error: Option<String>,
    error_description: Option<String>,
    error_message: Option<String>,
}

impl TokenResponse {
    fn parse(body: &str) -> Result<Self, Error> {
        serde_json::from_str(body).map_err(|e| Error::UnexpectedResponse(format!("{e}: {body}")))
    }

    /// Seconds until expiry; some servers send the number as a string.
    fn expires_in(&self) -> Option<i64> {
        match self.expires_in.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn into_token(self, created: DateTime<Utc>, body: &str) -> Result<AccessToken, Error> {
        if let Some(error) = self.error {
            let description = self
                .error_description
                .or(self.error_message)
                .unwrap_or_else(|| Fault::NOT_PROVIDED.to_owned());
            return Err(Error::AccessToken { error, description });
        }
        let expires = self
            .expires_in()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| created.checked_add_signed(ttl));
        match (self.access_token, expires) {
            (Some(access_token), Some(expires)) => Ok(AccessToken {
                access_token,
                refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
                token_type: self.token_type,
                lifetime: Lifetime { created, expires },
            }),
            _ => Err(Error::UnexpectedResponse(body.to_owned())),
        }
    }
}

#[derive(Serialize)]
struct TokenForm<'a> {
    grant_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
    client_id: &'a str,
    client_secret: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_uri: Option<&'a str>,
}

/// Obtains and renews OAuth2 access tokens for one client registration.
pub struct AccessTokenClient {
    config: AccessTokenConfig,
    transport: Arc<dyn Transport>,
    cache: Arc<dyn TokenCache>,
    clock: Arc<dyn Clock>,
}

impl AccessTokenClient {
    pub fn new(config: AccessTokenConfig, transport: Arc<dyn Transport>, cache: Arc<dyn TokenCache>) -> Self {
        Self {
            config,
            transport,
            cache,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &AccessTokenConfig {
        &self.config
    }

    /// Return a usable access token.
    ///
    /// A cached token is reused until its expiry unless `force_refresh` is
    /// set.  Otherwise the cached refresh token is exchanged, or the
    /// authorization code when there is none.  `no_cache` ignores the
    /// cached record entirely.  Every newly obtained token is cached.
    pub fn access_token(&self, no_cache: bool, force_refresh: bool) -> Result<AccessToken, Error> {
        let cache_id = self.config.cache_id();
        let now = self.clock.now();
        let cached = if no_cache { None } else { self.cached(cache_id) };

        let form = match cached {
            Some(token) if !force_refresh && token.lifetime.is_valid_at(now, Duration::zero()) => {
                debug!(cache_id, expires = %token.lifetime.expires, "using cached access token");
                return Ok(token);
            }
            Some(AccessToken {
                refresh_token: Some(refresh),
                ..
            }) => {
                debug!(cache_id, "refreshing access token");
                self.encode_form("refresh_token", None, Some(refresh.as_str()))?
            }
            _ => {
                let code = self
                    .config
                    .code()
                    .ok_or_else(|| Error::missing_config(["code"]))?;
                debug!(cache_id, "requesting access token with authorization code");
                self.encode_form("authorization_code", Some(code), None)?
            }
        };

        let request = HttpRequest::form(self.config.url(), form, self.config.call_timeout());
        let response = transport::send(self.transport.as_ref(), &request)?;
        let token = TokenResponse::parse(&response.body)
            .and_then(|parsed| parsed.into_token(now, &response.body))
            .map_err(|error| {
                warn!(status = response.status, %error, "access token request failed");
                error
            })?;

        self.cache.set(cache_id, &token.to_record()?)?;
        info!(cache_id, expires = %token.lifetime.expires, "access token issued");
        Ok(token)
    }

    fn cached(&self, cache_id: &str) -> Option<AccessToken> {
        let record = match self.cache.get(cache_id) {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(error) => {
                warn!(cache_id, %error, "cache read failed, treating as miss");
                return None;
            }
        };
        match AccessToken::from_record(record) {
            Ok(token) => Some(token),
            Err(error) => {
                warn!(cache_id, %error, "unreadable cached access token");
                None
            }
        }
    }

    fn encode_form(
        &self,
        grant_type: &'static str,
        code: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<String, Error> {
        let form = TokenForm {
            grant_type,
            code,
            refresh_token,
            client_id: self.config.client_id(),
            client_secret: &self.config.client_secret,
            redirect_uri: code.map(|_| self.config.redirect_uri()),
        };
        serde_urlencoded::to_string(&form).map_err(|e| Error::InvalidParameter(e.to_string()))
    }
}

impl std::fmt::Debug for AccessTokenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
