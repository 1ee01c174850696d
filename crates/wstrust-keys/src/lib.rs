#![forbid(unsafe_code)]

//! Key material for WS-Security signing.
//!
//! The caller supplies PEM text; nothing here reads from disk.  Private keys
//! may be PKCS#8, passphrase-protected PKCS#8 or PKCS#1.  Certificates are
//! reduced to the base64 body embedded in a `BinarySecurityToken`, and
//! proof-key secrets from issued tokens become HMAC keys.

pub mod certificate;
pub mod loader;

pub use certificate::certificate_body;
pub use loader::{hmac_key_from_base64, load_rsa_private_pem, rsa_signing_key};
