#![forbid(unsafe_code)]

//! Cryptographic algorithms for WS-Security signing.
//!
//! Digests (SHA-1, SHA-256/384/512, RIPEMD-160) and the two signature
//! profiles used by the client (RSA-SHA1 and HMAC-SHA1), each selected by
//! its XML-DSig algorithm URI.

pub mod digest;
pub mod sign;

pub use digest::DigestMethod;
pub use sign::{SignatureAlgorithm, SigningKey};
