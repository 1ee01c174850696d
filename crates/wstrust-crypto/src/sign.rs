#![forbid(unsafe_code)]

//! Signature algorithm implementations (RSA-SHA1, HMAC-SHA1).

use signature::SignatureEncoding;
use wstrust_core::{algorithm, Error};

/// Key material for signature operations.
pub enum SigningKey {
    Rsa(rsa::RsaPrivateKey),
    Hmac(Vec<u8>),
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rsa(_) => write!(f, "RSA private key"),
            Self::Hmac(k) => write!(f, "HMAC key ({} bytes)", k.len()),
        }
    }
}

/// Trait for signature algorithms.
pub trait SignatureAlgorithm: Send {
    fn uri(&self) -> &'static str;
    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error>;
    fn verify(&self, key: &SigningKey, data: &[u8], signature: &[u8]) -> Result<bool, Error>;
}

/// Create a signature algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn SignatureAlgorithm>, Error> {
    match uri {
        algorithm::RSA_SHA1 => Ok(Box::new(RsaSha1)),
        algorithm::HMAC_SHA1 => Ok(Box::new(HmacSha1)),
        _ => Err(Error::UnsupportedAlgorithm(format!("signature algorithm: {uri}"))),
    }
}

// ── RSA PKCS#1 v1.5 with SHA-1 ───────────────────────────────────────

struct RsaSha1;

impl SignatureAlgorithm for RsaSha1 {
    fn uri(&self) -> &'static str {
        algorithm::RSA_SHA1
    }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        use signature::Signer;
        let SigningKey::Rsa(private_key) = key else {
            return Err(Error::Signing("RSA private key required".into()));
        };
        let sk = rsa::pkcs1v15::SigningKey::<sha1::Sha1>::new(private_key.clone());
        let sig = sk
            .try_sign(data)
            .map_err(|e| Error::Signing(format!("RSA-SHA1 signing failed: {e}")))?;
        Ok(sig.to_vec())
    }

    fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::Verifier;
        let SigningKey::Rsa(private_key) = key else {
            return Err(Error::Signing("RSA key required".into()));
        };
        let sig = rsa::pkcs1v15::Signature::try_from(sig_bytes)
            .map_err(|e| Error::Signing(format!("invalid RSA signature: {e}")))?;
        let vk = rsa::pkcs1v15::VerifyingKey::<sha1::Sha1>::new(private_key.to_public_key());
        Ok(vk.verify(data, &sig).is_ok())
    }
}

// ── HMAC-SHA1 ────────────────────────────────────────────────────────

struct HmacSha1;

impl SignatureAlgorithm for HmacSha1 {
    fn uri(&self) -> &'static str {
        algorithm::HMAC_SHA1
    }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        let SigningKey::Hmac(key_bytes) = key else {
            return Err(Error::Signing("HMAC key required".into()));
        };
        compute_hmac_sha1(key_bytes, data)
    }

    fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        let SigningKey::Hmac(key_bytes) = key else {
            return Err(Error::Signing("HMAC key required".into()));
        };
        let expected = compute_hmac_sha1(key_bytes, data)?;
        Ok(constant_time_eq(&expected, sig_bytes))
    }
}

/// HMAC-SHA1; an empty key is accepted.
fn compute_hmac_sha1(key: &[u8], data: &[u8]) -> Result<Vec<u8>, Error> {
    use hmac::{Hmac, Mac};
    let mut mac = <Hmac<sha1::Sha1>>::new_from_slice(key)
        .map_err(|e| Error::Signing(format!("invalid HMAC key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    // Canonical SignedInfo of a business request signed with a proof key.
    const SIGNED_INFO: &str = concat!(
        r##"<SignedInfo xmlns="http://www.w3.org/2000/09/xmldsig#">"##,
        r##"<CanonicalizationMethod Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#"></CanonicalizationMethod>"##,
        r##"<SignatureMethod Algorithm="http://www.w3.org/2000/09/xmldsig#hmac-sha1"></SignatureMethod>"##,
        r##"<Reference URI="#_0"><Transforms><Transform Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#"></Transform></Transforms>"##,
        r##"<DigestMethod Algorithm="http://www.w3.org/2000/09/xmldsig#sha1"></DigestMethod>"##,
        r##"<DigestValue>Za0dgYRyzOwb3mmoMaQRZvuh8sM=</DigestValue></Reference></SignedInfo>"##
    );

    #[test]
    fn hmac_sha1_known_signed_info() {
        let key = SigningKey::Hmac(
            hex::decode("7e5e2a73f72c23862b3cad2b7a825e15f55c9b3218f444a7a82c524336ec730e").unwrap(),
        );
        let alg = from_uri(algorithm::HMAC_SHA1).unwrap();
        let sig = alg.sign(&key, SIGNED_INFO.as_bytes()).unwrap();
        assert_eq!(hex::encode(&sig), "8cc5165c908eb98ea08571e2390cbf61cced9f84");
        assert!(alg.verify(&key, SIGNED_INFO.as_bytes(), &sig).unwrap());
        assert!(!alg.verify(&key, b"tampered", &sig).unwrap());
    }

    #[test]
    fn hmac_with_empty_key() {
        let alg = from_uri(algorithm::HMAC_SHA1).unwrap();
        let sig = alg.sign(&SigningKey::Hmac(Vec::new()), b"hello").unwrap();
        assert_eq!(hex::encode(&sig), "63cce3559126764fd2581f05878c6791065c0d06");
    }

    #[test]
    fn hmac_is_deterministic() {
        let key = SigningKey::Hmac(b"proof".to_vec());
        let alg = from_uri(algorithm::HMAC_SHA1).unwrap();
        assert_eq!(alg.sign(&key, b"data").unwrap(), alg.sign(&key, b"data").unwrap());
    }

    #[test]
    fn key_type_must_match_algorithm() {
        let rsa = from_uri(algorithm::RSA_SHA1).unwrap();
        let err = rsa.sign(&SigningKey::Hmac(vec![1]), b"x").unwrap_err();
        assert!(matches!(err, Error::Signing(_)));
    }

    #[test]
    fn unsupported_signature_uri() {
        let err = from_uri("http://www.w3.org/2001/04/xmldsig-more#rsa-sha256").err().unwrap();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }
}
