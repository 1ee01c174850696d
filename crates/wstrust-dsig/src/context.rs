#![forbid(unsafe_code)]

//! Sign context: algorithm choice, key and key-info source for one signature.

use wstrust_core::algorithm;
use wstrust_crypto::SigningKey;
use wstrust_xml::NodeId;

/// Holds the key and configuration for one signing operation.
#[derive(Debug)]
pub struct SignContext<'a> {
    /// `SignatureMethod` algorithm URI.
    pub method: &'a str,
    /// `DigestMethod` algorithm URI used for every reference.
    pub digest_method: &'a str,
    pub key: SigningKey,
    /// PEM certificate to embed as a `BinarySecurityToken`.
    pub certificate: Option<&'a [u8]>,
    /// `u:Id` of the embedded token; generated when absent.
    pub token_id: Option<String>,
    /// A detached node of the target document adopted into `KeyInfo`
    /// when no certificate is embedded.
    pub key_info: Option<NodeId>,
}

impl<'a> SignContext<'a> {
    pub fn new(method: &'a str, key: SigningKey) -> Self {
        Self {
            method,
            digest_method: algorithm::SHA1,
            key,
            certificate: None,
            token_id: None,
            key_info: None,
        }
    }

    /// RSA-SHA1 with the certificate embedded and referenced from `KeyInfo`.
    pub fn rsa_sha1(key: SigningKey, certificate: &'a [u8], token_id: impl Into<String>) -> Self {
        Self {
            certificate: Some(certificate),
            token_id: Some(token_id.into()),
            ..Self::new(algorithm::RSA_SHA1, key)
        }
    }

    /// HMAC-SHA1 with a caller-built `KeyInfo` child (a token reference).
    pub fn hmac_sha1(key: SigningKey, key_info: NodeId) -> Self {
        Self {
            key_info: Some(key_info),
            ..Self::new(algorithm::HMAC_SHA1, key)
        }
    }

    pub fn with_digest(mut self, digest_method: &'a str) -> Self {
        self.digest_method = digest_method;
        self
    }
}
