#![forbid(unsafe_code)]

//! WS-Trust `RequestSecurityToken` messages.

use wstrust_core::Error;
use wstrust_dsig::{SignContext, SignatureElementSet};
use wstrust_xml::{Document, ElementSpec, NodeId, XmlBuilder};

use crate::config::RequestConfig;
use crate::envelope::{self, Envelope, EnvelopeTemplate, MessageStamp};

/// Prefix of the `a:Action` URI; the configured action is appended.
pub const ACTION_BASE: &str = "http://docs.oasis-open.org/ws-sx/ws-trust/200512/RST/";

/// Prefix of `trust:RequestType`; the configured action is appended.
pub const REQUEST_TYPE_BASE: &str = "http://docs.oasis-open.org/ws-sx/ws-trust/200512/";

/// Id of the signed `a:To` header.
pub const TO_ID: &str = "_1";

/// A token request for `config.realm()` addressed to `config.sts_url()`.
#[derive(Debug)]
pub struct StsRequest<'a> {
    config: &'a RequestConfig,
    stamp: &'a MessageStamp,
}

impl<'a> StsRequest<'a> {
    pub fn new(config: &'a RequestConfig, stamp: &'a MessageStamp) -> Self {
        Self { config, stamp }
    }

    /// Assemble the envelope and sign Timestamp and To with the client
    /// certificate (RSA-SHA1).
    pub fn build(&self, builder: &XmlBuilder) -> Result<Envelope, Error> {
        let mut envelope = envelope::build_envelope(builder, self)?;
        let key = wstrust_keys::rsa_signing_key(self.config.private_key(), self.config.passphrase())?;
        let ctx = SignContext::rsa_sha1(key, self.config.certificate(), self.stamp.token_id.clone());
        wstrust_dsig::sign(
            &mut envelope.document,
            builder,
            envelope.security,
            &envelope.elements,
            &ctx,
        )?;
        Ok(envelope)
    }
}

impl EnvelopeTemplate for StsRequest<'_> {
    fn build_header(
        &self,
        builder: &XmlBuilder,
        doc: &mut Document,
        header: NodeId,
        elements: &mut SignatureElementSet,
    ) -> Result<NodeId, Error> {
        let action = format!("{ACTION_BASE}{}", self.config.action());
        envelope::append_addressing(builder, doc, header, &action, &self.stamp.message_id)?;
        let security = envelope::append_security(builder, doc, header, self.stamp.created, elements)?;

        let to = builder.insert_before(
            doc,
            security,
            ElementSpec::new("a", "a:To")
                .text(self.config.sts_url())
                .ns_attr("s:mustUnderstand", "1")
                .ns_attr("u:Id", TO_ID),
        )?;
        elements.insert(TO_ID, to);
        Ok(security)
    }

    fn build_body(&self, builder: &XmlBuilder, doc: &mut Document, body: NodeId) -> Result<(), Error> {
        let request = builder.append(doc, body, ElementSpec::new("trust", "trust:RequestSecurityToken"))?;
        let applies_to = builder.append(doc, request, ElementSpec::new("wsp", "wsp:AppliesTo"))?;
        let endpoint = builder.append(doc, applies_to, ElementSpec::new("wsa", "wsa:EndpointReference"))?;
        builder.append(doc, endpoint, ElementSpec::new("wsa", "wsa:Address").text(self.config.realm()))?;
        builder.append(
            doc,
            request,
            ElementSpec::new("trust", "trust:RequestType")
                .text(format!("{REQUEST_TYPE_BASE}{}", self.config.action())),
        )?;
        Ok(())
    }
}
