#![forbid(unsafe_code)]

//! HTTP collaborator.

use std::time::Duration;

use wstrust_core::Error;

/// SOAP 1.2 content type for every request.
pub const SOAP_CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";

/// Content type of OAuth2 token requests.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub content_type: String,
    pub body: String,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn soap(url: impl Into<String>, body: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            content_type: SOAP_CONTENT_TYPE.to_owned(),
            body: body.into(),
            timeout,
        }
    }

    pub fn form(url: impl Into<String>, body: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            content_type: FORM_CONTENT_TYPE.to_owned(),
            body: body.into(),
            timeout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one POST and returns the response body.
///
/// Responses with an error status are still `Ok` when they carry a body,
/// since SOAP faults arrive that way.  `Err(Error::Transport)` means no
/// response body was obtained.
pub trait Transport: Send + Sync {
    fn post(&self, request: &HttpRequest) -> Result<HttpResponse, Error>;
}

/// Post `request` and reject empty bodies.
pub fn send(transport: &dyn Transport, request: &HttpRequest) -> Result<HttpResponse, Error> {
    let response = transport.post(request)?;
    if response.body.trim().is_empty() {
        return Err(Error::Transport(format!(
            "empty response from {} (status {})",
            request.url, response.status
        )));
    }
    Ok(response)
}

#[cfg(feature = "http")]
pub use self::http::HttpTransport;

#[cfg(feature = "http")]
mod http {
    use super::{HttpRequest, HttpResponse, Transport};
    use wstrust_core::Error;

    /// Blocking HTTPS transport.
    #[derive(Debug, Clone)]
    pub struct HttpTransport {
        client: reqwest::blocking::Client,
    }

    impl HttpTransport {
        pub fn new() -> Result<Self, Error> {
            let client = reqwest::blocking::Client::builder()
                .build()
                .map_err(|e| Error::Transport(format!("cannot create HTTP client: {e}")))?;
            Ok(Self { client })
        }

        pub fn with_client(client: reqwest::blocking::Client) -> Self {
            Self { client }
        }
    }

    impl Transport for HttpTransport {
        fn post(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
            let response = self
                .client
                .post(&request.url)
                .header(reqwest::header::CONTENT_TYPE, request.content_type.as_str())
                .timeout(request.timeout)
                .body(request.body.clone())
                .send()
                .map_err(|e| Error::Transport(format!("POST {} failed: {e}", request.url)))?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .map_err(|e| Error::Transport(format!("reading response from {}: {e}", request.url)))?;
            Ok(HttpResponse { status, body })
        }
    }
}
