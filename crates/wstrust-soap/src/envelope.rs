#![forbid(unsafe_code)]

//! Business request envelopes, signed with the token's proof key.

use serde_json::{Map, Value};
use wstrust_core::Error;
use wstrust_dsig::{SignContext, SignatureElementSet};
use wstrust_sts::envelope::{self, Envelope, EnvelopeTemplate, MessageStamp};
use wstrust_sts::SecurityToken;
use wstrust_xml::{Document, ElementSpec, NodeId, XmlBuilder};

use crate::definition::ServiceDefinition;
use crate::params;

/// One operation call addressed to `url`.
#[derive(Debug)]
pub struct BusinessRequest<'a> {
    pub definition: &'a ServiceDefinition,
    pub url: &'a str,
    pub action: &'a str,
    pub params: &'a Map<String, Value>,
    pub stamp: &'a MessageStamp,
    pub token: &'a SecurityToken,
}

impl BusinessRequest<'_> {
    /// Assemble the envelope and sign its Timestamp with HMAC-SHA1 using the
    /// token's proof key, referencing the token's key reference in `KeyInfo`.
    pub fn build(&self, builder: &XmlBuilder) -> Result<Envelope, Error> {
        let mut envelope = envelope::build_envelope(builder, self)?;
        let key_reference = self.token.import_key_reference(&mut envelope.document)?;
        let key = wstrust_keys::hmac_key_from_base64(&self.token.proof_key_secret()?)?;
        let ctx = SignContext::hmac_sha1(key, key_reference);
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

impl EnvelopeTemplate for BusinessRequest<'_> {
    fn build_header(
        &self,
        builder: &XmlBuilder,
        doc: &mut Document,
        header: NodeId,
        elements: &mut SignatureElementSet,
    ) -> Result<NodeId, Error> {
        let action = self.definition.action_uri(self.action);
        envelope::append_addressing(builder, doc, header, &action, &self.stamp.message_id)?;
        builder.append(
            doc,
            header,
            ElementSpec::new("a", "a:To")
                .text(self.url)
                .ns_attr("s:mustUnderstand", "1"),
        )?;
        let security = envelope::append_security(builder, doc, header, self.stamp.created, elements)?;

        let assertion = self.token.import_encrypted_assertion(doc)?;
        doc.append_child(security, assertion)?;
        Ok(security)
    }

    fn build_body(&self, builder: &XmlBuilder, doc: &mut Document, body: NodeId) -> Result<(), Error> {
        let operation = builder.append(
            doc,
            body,
            ElementSpec::new(self.definition.body_namespace(), self.action),
        )?;
        params::append_parameters(builder, doc, operation, self.definition, self.params)
    }
}
