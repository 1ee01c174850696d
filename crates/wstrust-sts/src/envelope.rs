#![forbid(unsafe_code)]

//! SOAP 1.2 envelope assembly.
//!
//! A message type implements [`EnvelopeTemplate`]; [`build_envelope`] creates
//! the `s:Envelope`/`s:Header`/`s:Body` skeleton and hands the header and
//! body to the template.  The helpers below emit the WS-Addressing and
//! WS-Security header blocks shared by STS and service requests.

use chrono::{DateTime, Utc};
use wstrust_core::{ns, Error};
use wstrust_dsig::SignatureElementSet;
use wstrust_xml::stamp::{self, generate_guid, DEFAULT_GUID_PREFIX, DEFAULT_VALIDITY_SECS};
use wstrust_xml::{writer, Document, ElementSpec, NodeId, XmlBuilder};

/// WS-Addressing anonymous endpoint used for `ReplyTo`.
pub const REPLY_TO: &str = "http://www.w3.org/2005/08/addressing/anonymous";

/// Id of the signed `u:Timestamp`.
pub const TIMESTAMP_ID: &str = "_0";

/// Time and identifiers of one outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageStamp {
    pub created: DateTime<Utc>,
    /// `a:MessageID` value.
    pub message_id: String,
    /// `u:Id` of the embedded `BinarySecurityToken`.
    pub token_id: String,
}

impl MessageStamp {
    /// Fresh identifiers for a message created at `now`.
    pub fn generate(now: DateTime<Utc>) -> Self {
        Self {
            created: now,
            message_id: generate_guid(DEFAULT_GUID_PREFIX, ""),
            token_id: generate_guid("uuid-", "-2"),
        }
    }
}

/// Fills in the header and body of a SOAP envelope.
pub trait EnvelopeTemplate {
    /// Populate `header` and return the `o:Security` element.
    ///
    /// Elements to be signed are registered in `elements`.
    fn build_header(
        &self,
        builder: &XmlBuilder,
        doc: &mut Document,
        header: NodeId,
        elements: &mut SignatureElementSet,
    ) -> Result<NodeId, Error>;

    fn build_body(&self, builder: &XmlBuilder, doc: &mut Document, body: NodeId) -> Result<(), Error>;
}

/// An assembled, not yet signed, envelope.
#[derive(Debug)]
pub struct Envelope {
    pub document: Document,
    pub header: NodeId,
    pub body: NodeId,
    pub security: NodeId,
    pub elements: SignatureElementSet,
}

impl Envelope {
    /// Wire form, with XML declaration.
    pub fn to_xml(&self) -> String {
        writer::to_xml_with_declaration(&self.document)
    }
}

pub fn build_envelope(builder: &XmlBuilder, template: &dyn EnvelopeTemplate) -> Result<Envelope, Error> {
    let mut document = Document::new();
    let root = document.root();
    let envelope = builder.append(
        &mut document,
        root,
        ElementSpec::new("s", "s:Envelope").declare("a").declare("u"),
    )?;
    let header = builder.append(&mut document, envelope, ElementSpec::new("s", "s:Header"))?;
    let mut elements = SignatureElementSet::new();
    let security = template.build_header(builder, &mut document, header, &mut elements)?;
    let body = builder.append(&mut document, envelope, ElementSpec::new("s", "s:Body"))?;
    template.build_body(builder, &mut document, body)?;

    Ok(Envelope {
        document,
        header,
        body,
        security,
        elements,
    })
}

/// Append `a:Action`, `a:MessageID` and `a:ReplyTo` to `header`.
pub fn append_addressing(
    builder: &XmlBuilder,
    doc: &mut Document,
    header: NodeId,
    action: &str,
    message_id: &str,
) -> Result<(), Error> {
    builder.append(
        doc,
        header,
        ElementSpec::new("a", "a:Action")
            .text(action)
            .ns_attr("s:mustUnderstand", "1"),
    )?;
    builder.append(doc, header, ElementSpec::new("a", "a:MessageID").text(message_id))?;
    let reply_to = builder.append(doc, header, ElementSpec::new("a", "a:ReplyTo"))?;
    builder.append(doc, reply_to, ElementSpec::new("a", "a:Address").text(REPLY_TO))?;
    Ok(())
}

/// Append `o:Security` holding a `u:Timestamp` valid from `created` for
/// the default window, registered under [`TIMESTAMP_ID`].
pub fn append_security(
    builder: &XmlBuilder,
    doc: &mut Document,
    header: NodeId,
    created: DateTime<Utc>,
    elements: &mut SignatureElementSet,
) -> Result<NodeId, Error> {
    let security = builder.append(
        doc,
        header,
        ElementSpec::new("o", "o:Security").ns_attr("s:mustUnderstand", "1"),
    )?;
    let timestamp = builder.append(
        doc,
        security,
        ElementSpec::new("u", "u:Timestamp").ns_attr("u:Id", TIMESTAMP_ID),
    )?;
    let (created, expires) = stamp::timestamp(created, DEFAULT_VALIDITY_SECS)?;
    builder.append(doc, timestamp, ElementSpec::new("u", "u:Created").text(created))?;
    builder.append(doc, timestamp, ElementSpec::new("u", "u:Expires").text(expires))?;
    elements.insert(TIMESTAMP_ID, timestamp);
    Ok(security)
}

/// The `s:Header` or `s:Body` child of an envelope element.
pub fn envelope_part(doc: &Document, envelope: NodeId, local_name: &str) -> Option<NodeId> {
    doc.child_elements(envelope).find(|n| {
        doc.element(*n)
            .is_some_and(|e| e.name.matches(ns::SOAP12, local_name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Empty;

    impl EnvelopeTemplate for Empty {
        fn build_header(
            &self,
            builder: &XmlBuilder,
            doc: &mut Document,
            header: NodeId,
            elements: &mut SignatureElementSet,
        ) -> Result<NodeId, Error> {
            append_addressing(builder, doc, header, "urn:action", "urn:uuid:1")?;
            let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            append_security(builder, doc, header, created, elements)
        }

        fn build_body(&self, _: &XmlBuilder, _: &mut Document, _: NodeId) -> Result<(), Error> {
            Ok(())
        }
    }

    #[test]
    fn skeleton() {
        let envelope = build_envelope(&XmlBuilder::default(), &Empty).unwrap();
        let xml = envelope.to_xml();
        assert!(xml.starts_with(concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<s:Envelope xmlns:a="http://www.w3.org/2005/08/addressing" "#,
            r#"xmlns:u="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd" "#,
            r#"xmlns:s="http://www.w3.org/2003/05/soap-envelope"><s:Header>"#,
            r#"<a:Action s:mustUnderstand="1">urn:action</a:Action>"#,
            r#"<a:MessageID>urn:uuid:1</a:MessageID>"#,
            r#"<a:ReplyTo><a:Address>http://www.w3.org/2005/08/addressing/anonymous</a:Address></a:ReplyTo>"#,
        )));
        assert!(xml.contains(concat!(
            r#"<u:Timestamp u:Id="_0"><u:Created>2024-01-01T00:00:00.000Z</u:Created>"#,
            r#"<u:Expires>2024-01-01T00:05:00.000Z</u:Expires></u:Timestamp>"#,
        )));
        assert!(xml.ends_with("<s:Body/></s:Envelope>"));
        assert_eq!(envelope.elements.len(), 1);

        let root = envelope.document.document_element().unwrap();
        assert_eq!(envelope_part(&envelope.document, root, "Body"), Some(envelope.body));
    }

    #[test]
    fn generated_stamp_shapes() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let stamp = MessageStamp::generate(now);
        assert!(stamp.message_id.starts_with("urn:uuid:"));
        assert!(stamp.token_id.starts_with("uuid-") && stamp.token_id.ends_with("-2"));
        assert_ne!(stamp, MessageStamp::generate(now));
    }
}
