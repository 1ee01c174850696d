#![forbid(unsafe_code)]

//! Issued security tokens.

use chrono::{DateTime, NaiveDateTime, Utc};
use wstrust_core::{ns, Error};
use wstrust_xml::{find, writer, Document, NodeId};

use crate::cache::{CacheRecord, Lifetime};

/// A token issued by the STS, kept as the raw response text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityToken {
    raw: String,
    lifetime: Lifetime,
    from_cache: bool,
}

impl SecurityToken {
    /// Read the lifetime of a successful STS response.
    pub fn from_response(raw: String) -> Result<Self, Error> {
        let lifetime = {
            let doc = wstrust_xml::parse(&raw)?;
            parse_lifetime(&doc)?
        };
        Ok(Self {
            raw,
            lifetime,
            from_cache: false,
        })
    }

    pub fn from_record(record: CacheRecord) -> Self {
        Self {
            raw: record.payload,
            lifetime: record.lifetime,
            from_cache: true,
        }
    }

    pub fn to_record(&self) -> CacheRecord {
        CacheRecord {
            lifetime: self.lifetime,
            payload: self.raw.clone(),
        }
    }

    pub fn lifetime(&self) -> &Lifetime {
        &self.lifetime
    }

    /// Whether the token was loaded from the cache rather than issued for this call.
    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    pub fn raw_response(&self) -> &str {
        &self.raw
    }

    /// The `RequestSecurityTokenResponse` as its own XML document, or an
    /// empty string when the response has none.
    pub fn assertion_xml(&self) -> Result<String, Error> {
        let source = wstrust_xml::parse(&self.raw)?;
        let Some(response) =
            find::find_element(source.root(), ns::TRUST, ns::node::REQUEST_SECURITY_TOKEN_RESPONSE)
        else {
            return Ok(String::new());
        };
        let mut doc = Document::new();
        let root = doc.root();
        if let Some(copy) = doc.import_node(response)? {
            doc.append_child(root, copy)?;
        }
        Ok(writer::to_xml_with_declaration(&doc))
    }

    /// Text of the first `trust:BinarySecret`, empty when absent.
    pub fn proof_key_secret(&self) -> Result<String, Error> {
        let doc = wstrust_xml::parse(&self.raw)?;
        Ok(find::find_element(doc.root(), ns::TRUST, ns::node::BINARY_SECRET)
            .map(find::text_content)
            .unwrap_or_default())
    }

    /// Copy the `xenc:EncryptedData` assertion into `target`, detached.
    pub fn import_encrypted_assertion(&self, target: &mut Document) -> Result<NodeId, Error> {
        let doc = wstrust_xml::parse(&self.raw)?;
        let encrypted = find::find_element(doc.root(), ns::ENC, ns::node::ENCRYPTED_DATA)
            .ok_or_else(|| Error::MissingAssertion("no EncryptedData in security token".into()))?;
        import(target, encrypted)
    }

    /// Copy the second `o:SecurityTokenReference` (the one naming the
    /// proof key) into `target`, detached.
    pub fn import_key_reference(&self, target: &mut Document) -> Result<NodeId, Error> {
        let doc = wstrust_xml::parse(&self.raw)?;
        let reference = find::find_elements(doc.root(), ns::WSSE, ns::node::SECURITY_TOKEN_REFERENCE)
            .get(1)
            .copied()
            .ok_or_else(|| {
                Error::MissingAssertion("no key SecurityTokenReference in security token".into())
            })?;
        import(target, reference)
    }
}

fn import(target: &mut Document, node: roxmltree::Node<'_, '_>) -> Result<NodeId, Error> {
    target
        .import_node(node)?
        .ok_or_else(|| Error::XmlStructure("imported node is not an element".into()))
}

fn parse_lifetime(doc: &roxmltree::Document<'_>) -> Result<Lifetime, Error> {
    let lifetime = find::find_element(doc.root(), ns::TRUST, ns::node::LIFETIME)
        .ok_or_else(|| Error::MissingAssertion("no Lifetime in security token".into()))?;
    let mut created = None;
    let mut expires = None;
    for child in lifetime.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "Created" => created = Some(parse_timestamp(&find::text_content(child))?),
            "Expires" => expires = Some(parse_timestamp(&find::text_content(child))?),
            _ => {}
        }
    }
    match (created, expires) {
        (Some(created), Some(expires)) => Ok(Lifetime { created, expires }),
        _ => Err(Error::MissingAssertion("incomplete token Lifetime".into())),
    }
}

/// Parse an STS timestamp as UTC, ignoring fractional seconds.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, Error> {
    let text = text.trim();
    let whole = text.split('.').next().unwrap_or(text);
    let whole = whole.strip_suffix('Z').unwrap_or(whole);
    NaiveDateTime::parse_from_str(whole, "%Y-%m-%dT%H:%M:%S")
        .map(|t| t.and_utc())
        .map_err(|e| Error::XmlStructure(format!("invalid timestamp {text:?}: {e}")))
}
