#![forbid(unsafe_code)]

//! WS-Trust security token client.
//!
//! [`TokenManager`] issues `RequestSecurityToken` messages signed with the
//! client certificate, parses the STS answer and keeps the token in a
//! [`TokenCache`].  Transport, cache and clock are collaborators passed in
//! at construction.  [`AccessTokenClient`] obtains OAuth2 access tokens
//! with the same collaborators.

pub mod access;
pub mod cache;
pub mod clock;
pub mod config;
pub mod envelope;
pub mod fault;
pub mod manager;
pub mod request;
pub mod token;
pub mod transport;

pub use access::{AccessToken, AccessTokenClient, AccessTokenConfig, AccessTokenConfigBuilder};
pub use cache::{CacheRecord, FileCache, Lifetime, MemoryCache, TokenCache};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{RequestConfig, RequestConfigBuilder};
pub use envelope::{build_envelope, Envelope, EnvelopeTemplate, MessageStamp};
pub use fault::parse_fault;
pub use manager::TokenManager;
pub use request::StsRequest;
pub use token::SecurityToken;
#[cfg(feature = "http")]
pub use transport::HttpTransport;
pub use transport::{HttpRequest, HttpResponse, Transport};
