#![forbid(unsafe_code)]

//! Per-client request configuration.
//!
//! A [`RequestConfig`] is immutable once built.  It is assembled either with
//! the typed [`RequestConfigBuilder`] or from string key/value settings via
//! [`RequestConfig::from_settings`]; both report every missing, unknown or
//! invalid field in a single [`Error::Configuration`].

use std::time::Duration;

use wstrust_core::Error;

/// Default STS endpoint (certificate message binding).
pub const DEFAULT_STS_URL: &str =
    "https://auth.agiv.be/sts/Services/SalvadorSecurityTokenServiceConfiguration.svc/CertificateMessage";

/// Default WS-Trust action.
pub const DEFAULT_ACTION: &str = "Issue";

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Retries after the first failed service call.
pub const DEFAULT_MAX_SERVICE_ATTEMPTS: u32 = 1;

/// Keys accepted by [`RequestConfig::from_settings`].
pub const SETTING_KEYS: &[&str] = &[
    "sts_url",
    "service_url",
    "realm",
    "action",
    "call_timeout",
    "max_service_attempts",
    "passphrase",
    "certificate",
    "private_key",
];

#[derive(Clone)]
pub struct RequestConfig {
    sts_url: String,
    service_url: Option<String>,
    realm: String,
    action: String,
    call_timeout: Duration,
    max_service_attempts: u32,
    passphrase: String,
    certificate: Vec<u8>,
    private_key: Vec<u8>,
}

impl RequestConfig {
    pub fn builder() -> RequestConfigBuilder {
        RequestConfigBuilder::default()
    }

    /// Build from string settings, e.g. a parsed settings file.
    ///
    /// `call_timeout` is in seconds.  Empty values count as absent.
    pub fn from_settings<I, K, V>(settings: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut builder = RequestConfigBuilder::default();
        for (key, value) in settings {
            let key = key.as_ref();
            let value: String = value.into();
            match key {
                "sts_url" => builder.sts_url = Some(value),
                "service_url" => builder.service_url = Some(value),
                "realm" => builder.realm = Some(value),
                "action" => builder.action = Some(value),
                "passphrase" => builder.passphrase = Some(value),
                "certificate" => builder.certificate = Some(value.into_bytes()),
                "private_key" => builder.private_key = Some(value.into_bytes()),
                "call_timeout" => match value.trim().parse::<u64>() {
                    Ok(secs) => builder.call_timeout = Some(Duration::from_secs(secs)),
                    Err(_) => builder.invalid.push(format!("call_timeout={value}")),
                },
                "max_service_attempts" => match value.trim().parse::<u32>() {
                    Ok(n) => builder.max_service_attempts = Some(n),
                    Err(_) => builder.invalid.push(format!("max_service_attempts={value}")),
                },
                other => builder.unknown.push(other.to_owned()),
            }
        }
        builder.build()
    }

    pub fn sts_url(&self) -> &str {
        &self.sts_url
    }

    pub fn service_url(&self) -> Option<&str> {
        self.service_url.as_deref()
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    pub fn max_service_attempts(&self) -> u32 {
        self.max_service_attempts
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// PEM certificate bytes.
    pub fn certificate(&self) -> &[u8] {
        &self.certificate
    }

    /// PEM private key bytes.
    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }
}

impl std::fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestConfig")
            .field("sts_url", &self.sts_url)
            .field("service_url", &self.service_url)
            .field("realm", &self.realm)
            .field("action", &self.action)
            .field("call_timeout", &self.call_timeout)
            .field("max_service_attempts", &self.max_service_attempts)
            .field("certificate", &format_args!("{} bytes", self.certificate.len()))
            .field("private_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Clone)]
pub struct RequestConfigBuilder {
    sts_url: Option<String>,
    service_url: Option<String>,
    realm: Option<String>,
    action: Option<String>,
    call_timeout: Option<Duration>,
    max_service_attempts: Option<u32>,
    passphrase: Option<String>,
    certificate: Option<Vec<u8>>,
    private_key: Option<Vec<u8>>,
    unknown: Vec<String>,
    invalid: Vec<String>,
}

impl RequestConfigBuilder {
    pub fn sts_url(mut self, url: impl Into<String>) -> Self {
        self.sts_url = Some(url.into());
        self
    }

    pub fn service_url(mut self, url: impl Into<String>) -> Self {
        self.service_url = Some(url.into());
        self
    }

    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn max_service_attempts(mut self, attempts: u32) -> Self {
        self.max_service_attempts = Some(attempts);
        self
    }

    pub fn passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }

    pub fn certificate(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.certificate = Some(pem.into());
        self
    }

    pub fn private_key(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.private_key = Some(pem.into());
        self
    }

    pub fn build(self) -> Result<RequestConfig, Error> {
        let mut missing = Vec::new();
        let mut invalid = self.invalid;

        let sts_url = non_empty(self.sts_url).unwrap_or_else(|| DEFAULT_STS_URL.to_owned());
        let action = non_empty(self.action).unwrap_or_else(|| DEFAULT_ACTION.to_owned());
        let realm = non_empty(self.realm);
        if realm.is_none() {
            missing.push("realm".to_owned());
        }
        let certificate = self.certificate.filter(|c| !c.is_empty());
        if certificate.is_none() {
            missing.push("certificate".to_owned());
        }
        let private_key = self.private_key.filter(|k| !k.is_empty());
        if private_key.is_none() {
            missing.push("private_key".to_owned());
        }
        let call_timeout = self.call_timeout.unwrap_or(DEFAULT_CALL_TIMEOUT);
        if call_timeout.is_zero() {
            invalid.push("call_timeout=0".to_owned());
        }

        match (realm, certificate, private_key) {
            (Some(realm), Some(certificate), Some(private_key))
                if self.unknown.is_empty() && invalid.is_empty() =>
            {
                Ok(RequestConfig {
                    sts_url,
                    service_url: non_empty(self.service_url),
                    realm,
                    action,
                    call_timeout,
                    max_service_attempts: self
                        .max_service_attempts
                        .unwrap_or(DEFAULT_MAX_SERVICE_ATTEMPTS),
                    passphrase: self.passphrase.unwrap_or_default(),
                    certificate,
                    private_key,
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

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
