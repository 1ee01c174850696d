#![forbid(unsafe_code)]

//! Digest methods selectable by `DigestMethod` URI.

use digest::Digest;
use wstrust_core::{algorithm, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestMethod {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
    Ripemd160,
}

impl DigestMethod {
    pub fn uri(self) -> &'static str {
        match self {
            DigestMethod::Sha1 => algorithm::SHA1,
            DigestMethod::Sha256 => algorithm::SHA256,
            DigestMethod::Sha384 => algorithm::SHA384,
            DigestMethod::Sha512 => algorithm::SHA512,
            DigestMethod::Ripemd160 => algorithm::RIPEMD160,
        }
    }

    pub fn compute(self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestMethod::Sha1 => hash::<sha1::Sha1>(data),
            DigestMethod::Sha256 => hash::<sha2::Sha256>(data),
            DigestMethod::Sha384 => hash::<sha2::Sha384>(data),
            DigestMethod::Sha512 => hash::<sha2::Sha512>(data),
            DigestMethod::Ripemd160 => hash::<ripemd::Ripemd160>(data),
        }
    }
}

fn hash<D: Digest>(data: &[u8]) -> Vec<u8> {
    D::digest(data).to_vec()
}

/// Resolve a digest method URI.
pub fn from_uri(uri: &str) -> Result<DigestMethod, Error> {
    [
        DigestMethod::Sha1,
        DigestMethod::Sha256,
        DigestMethod::Sha384,
        DigestMethod::Sha512,
        DigestMethod::Ripemd160,
    ]
    .into_iter()
    .find(|m| m.uri() == uri)
    .ok_or_else(|| Error::UnsupportedAlgorithm(format!("digest algorithm: {uri}")))
}

/// Digest `data` with the method named by `uri`.
pub fn digest(uri: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
    Ok(from_uri(uri)?.compute(data))
}
