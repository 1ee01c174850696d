#![forbid(unsafe_code)]

//! X.509 certificate handling for `BinarySecurityToken` embedding.

use base64::Engine;
use der::Decode;
use wstrust_core::Error;
use x509_cert::Certificate;

const END_MARKER: &str = "-----END ";
const BOUNDARY: &str = "-----";

/// Decode a PEM certificate and return its DER as base64 on one line.
///
/// Only the first certificate of a chain is used.  The PEM label must be
/// `CERTIFICATE` and the DER must parse as an X.509 certificate.
pub fn certificate_body(pem_data: &[u8]) -> Result<String, Error> {
    let der = certificate_der(pem_data)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(der))
}

/// DER bytes of the first certificate in `pem_data`.
pub fn certificate_der(pem_data: &[u8]) -> Result<Vec<u8>, Error> {
    let pem_str = std::str::from_utf8(pem_data)
        .map_err(|e| Error::Signing(format!("invalid certificate encoding: {e}")))?;
    let block = first_block(pem_str)
        .ok_or_else(|| Error::Signing("no PEM block found in certificate data".into()))?;

    let (label, der) = pem_rfc7468::decode_vec(block.as_bytes())
        .map_err(|e| Error::Signing(format!("failed to decode certificate PEM: {e}")))?;
    if label != "CERTIFICATE" {
        return Err(Error::Signing(format!(
            "expected CERTIFICATE PEM label, got: {label}"
        )));
    }
    Certificate::from_der(&der)
        .map_err(|e| Error::Signing(format!("failed to parse X.509 certificate: {e}")))?;
    Ok(der)
}

/// The text from the first `-----BEGIN` up to the end of the first
/// `-----END ...-----` line.
fn first_block(pem: &str) -> Option<&str> {
    let start = pem.find("-----BEGIN ")?;
    let end_marker = start + pem[start..].find(END_MARKER)?;
    let label_start = end_marker + END_MARKER.len();
    let end = label_start + pem[label_start..].find(BOUNDARY)? + BOUNDARY.len();
    Some(&pem[start..end])
}
