#![forbid(unsafe_code)]

//! Signature verification over an in-memory [`Document`].
//!
//! Processing order:
//! 1. Read `SignedInfo`: CanonicalizationMethod, SignatureMethod
//! 2. For each `Reference`: resolve `#id`, canonicalize, compare digest
//! 3. Canonicalize `SignedInfo` and check `SignatureValue` with the key

use base64::Engine;
use wstrust_c14n::C14nMode;
use wstrust_core::{ns, Error};
use wstrust_crypto::{digest, sign as signature, SigningKey};
use wstrust_xml::{Document, NodeId};

/// Result of signature verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid,
    Invalid { reason: String },
}

impl VerifyResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyResult::Valid)
    }
}

/// Verify `signature_node`, a `<Signature>` element of `doc`.
pub fn verify(doc: &Document, signature_node: NodeId, key: &SigningKey) -> Result<bool, Error> {
    Ok(verify_detailed(doc, signature_node, key)?.is_valid())
}

/// Like [`verify`], reporting why a signature is invalid.
pub fn verify_detailed(
    doc: &Document,
    signature_node: NodeId,
    key: &SigningKey,
) -> Result<VerifyResult, Error> {
    let engine = base64::engine::general_purpose::STANDARD;

    let signed_info = child(doc, signature_node, ns::node::SIGNED_INFO)?;
    let c14n_uri = algorithm_of(doc, child(doc, signed_info, ns::node::CANONICALIZATION_METHOD)?)?;
    let c14n_mode = C14nMode::from_uri(&c14n_uri)
        .ok_or_else(|| Error::UnsupportedAlgorithm(format!("C14N: {c14n_uri}")))?;
    let method = algorithm_of(doc, child(doc, signed_info, ns::node::SIGNATURE_METHOD)?)?;
    let signer = signature::from_uri(&method)?;

    let references: Vec<NodeId> = doc
        .child_elements(signed_info)
        .filter(|n| is_dsig(doc, *n, ns::node::REFERENCE))
        .collect();
    for reference in references {
        let uri = doc
            .element(reference)
            .and_then(|e| e.attribute("", ns::attr::URI))
            .unwrap_or_default();
        let Some(id) = uri.strip_prefix('#') else {
            return Ok(VerifyResult::Invalid {
                reason: format!("unsupported reference URI {uri:?}"),
            });
        };
        let Some(target) = find_by_id(doc, id) else {
            return Ok(VerifyResult::Invalid {
                reason: format!("no element with id {id:?}"),
            });
        };
        let digest_method = algorithm_of(doc, child(doc, reference, ns::node::DIGEST_METHOD)?)?;
        let expected = doc.text_content(child(doc, reference, ns::node::DIGEST_VALUE)?);
        let canonical = wstrust_c14n::canonicalize(doc, target, c14n_mode, &[])?;
        let actual = engine.encode(digest::digest(&digest_method, &canonical)?);
        if actual != expected.trim() {
            return Ok(VerifyResult::Invalid {
                reason: format!("digest mismatch for #{id}"),
            });
        }
    }

    let value_text = doc.text_content(child(doc, signature_node, ns::node::SIGNATURE_VALUE)?);
    let cleaned: String = value_text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let value = engine
        .decode(cleaned)
        .map_err(|e| Error::Base64(e.to_string()))?;
    let canonical = wstrust_c14n::canonicalize(doc, signed_info, c14n_mode, &[])?;
    if signer.verify(key, &canonical, &value)? {
        Ok(VerifyResult::Valid)
    } else {
        Ok(VerifyResult::Invalid {
            reason: "signature value mismatch".into(),
        })
    }
}

fn is_dsig(doc: &Document, id: NodeId, local_name: &str) -> bool {
    doc.element(id)
        .is_some_and(|e| e.name.matches(ns::DSIG, local_name))
}

fn child(doc: &Document, parent: NodeId, local_name: &str) -> Result<NodeId, Error> {
    doc.child_elements(parent)
        .find(|n| is_dsig(doc, *n, local_name))
        .ok_or_else(|| Error::MissingElement(local_name.into()))
}

fn algorithm_of(doc: &Document, id: NodeId) -> Result<String, Error> {
    doc.element(id)
        .and_then(|e| e.attribute("", ns::attr::ALGORITHM))
        .map(str::to_owned)
        .ok_or_else(|| Error::MissingElement("Algorithm attribute".into()))
}

/// Locate an element by `wsu:Id` or a plain `Id` attribute.
fn find_by_id(doc: &Document, id: &str) -> Option<NodeId> {
    doc.descendants(doc.root()).into_iter().find(|n| {
        doc.element(*n).is_some_and(|e| {
            e.attribute(ns::WSU, ns::attr::ID) == Some(id) || e.attribute("", ns::attr::ID) == Some(id)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sign, SignContext, SignatureElementSet};
    use wstrust_core::algorithm;
    use wstrust_xml::{ElementSpec, NodeKind, XmlBuilder};

    fn signed_document(key: &[u8]) -> (Document, NodeId, NodeId) {
        let builder = XmlBuilder::default();
        let mut doc = Document::new();
        let root = doc.root();
        let security = builder
            .append(&mut doc, root, ElementSpec::new("o", "o:Security"))
            .unwrap();
        let ts = builder
            .append(&mut doc, security, ElementSpec::new("u", "u:Timestamp").ns_attr("u:Id", "_0"))
            .unwrap();
        builder
            .append(&mut doc, ts, ElementSpec::new("u", "u:Created").text("2024-01-01T00:00:00.000Z"))
            .unwrap();
        let mut set = SignatureElementSet::new();
        set.insert("_0", ts);
        let ctx = SignContext::new(algorithm::HMAC_SHA1, SigningKey::Hmac(key.to_vec()));
        let signature = sign(&mut doc, &builder, security, &set, &ctx).unwrap();
        (doc, signature, ts)
    }

    #[test]
    fn verifies_own_signature() {
        let (doc, signature, _) = signed_document(b"secret");
        assert_eq!(
            verify_detailed(&doc, signature, &SigningKey::Hmac(b"secret".to_vec())).unwrap(),
            VerifyResult::Valid
        );
        assert!(!verify(&doc, signature, &SigningKey::Hmac(b"other".to_vec())).unwrap());
    }

    #[test]
    fn detects_modified_reference() {
        let (mut doc, signature, ts) = signed_document(b"secret");
        let created = doc.child_elements(ts).next().unwrap();
        let text = doc.children(created).next().unwrap();
        let tampered = doc.create_text("2030");
        doc.insert_before(created, tampered, text).unwrap();
        assert!(matches!(doc.node_kind(tampered), Some(NodeKind::Text(_))));

        let result = verify_detailed(&doc, signature, &SigningKey::Hmac(b"secret".to_vec())).unwrap();
        assert_eq!(
            result,
            VerifyResult::Invalid {
                reason: "digest mismatch for #_0".into()
            }
        );
    }
}
