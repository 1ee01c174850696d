#![forbid(unsafe_code)]

//! Signature creation.

use base64::Engine;
use wstrust_c14n::C14nMode;
use wstrust_core::{algorithm, ns, Error};
use wstrust_crypto::{digest, sign as signature};
use wstrust_xml::stamp::generate_guid;
use wstrust_xml::{Document, ElementSpec, NodeId, XmlBuilder};

use crate::context::SignContext;
use crate::references::SignatureElementSet;

/// Sign `elements` and append the result to `security`.
///
/// Appends, in order: the `BinarySecurityToken` (when the context carries
/// a certificate) and the `Signature` element with one `Reference` per
/// entry of `elements`, its `SignatureValue` and `KeyInfo`.  Returns the
/// `Signature` node.  The signature is assembled detached, so `security`
/// is left untouched when signing fails.
pub fn sign(
    doc: &mut Document,
    builder: &XmlBuilder,
    security: NodeId,
    elements: &SignatureElementSet,
    ctx: &SignContext<'_>,
) -> Result<NodeId, Error> {
    let signer = signature::from_uri(ctx.method)?;
    digest::from_uri(ctx.digest_method)?;
    let engine = base64::engine::general_purpose::STANDARD;

    let token = match ctx.certificate {
        Some(certificate) => {
            let body = wstrust_keys::certificate_body(certificate)?;
            let token_id = ctx
                .token_id
                .clone()
                .unwrap_or_else(|| generate_guid("uuid-", "-2"));
            Some((token_id, body))
        }
        None => None,
    };

    let signature = builder.create(doc, &ElementSpec::new("", ns::node::SIGNATURE))?;
    let signed_info = builder.append(doc, signature, ElementSpec::new("", ns::node::SIGNED_INFO))?;
    builder.append(
        doc,
        signed_info,
        ElementSpec::new("", ns::node::CANONICALIZATION_METHOD)
            .attr(ns::attr::ALGORITHM, algorithm::EXC_C14N),
    )?;
    builder.append(
        doc,
        signed_info,
        ElementSpec::new("", ns::node::SIGNATURE_METHOD).attr(ns::attr::ALGORITHM, ctx.method),
    )?;

    for (id, node) in elements.iter() {
        let canonical = wstrust_c14n::canonicalize(doc, node, C14nMode::Exclusive, &[])?;
        let digest_value = engine.encode(digest::digest(ctx.digest_method, &canonical)?);

        let reference = builder.append(
            doc,
            signed_info,
            ElementSpec::new("", ns::node::REFERENCE).attr(ns::attr::URI, format!("#{id}")),
        )?;
        let transforms = builder.append(doc, reference, ElementSpec::new("", ns::node::TRANSFORMS))?;
        builder.append(
            doc,
            transforms,
            ElementSpec::new("", ns::node::TRANSFORM).attr(ns::attr::ALGORITHM, algorithm::EXC_C14N),
        )?;
        builder.append(
            doc,
            reference,
            ElementSpec::new("", ns::node::DIGEST_METHOD)
                .attr(ns::attr::ALGORITHM, ctx.digest_method),
        )?;
        builder.append(
            doc,
            reference,
            ElementSpec::new("", ns::node::DIGEST_VALUE).text(digest_value),
        )?;
    }

    // Exclusive c14n ignores ancestors, so the detached SignedInfo
    // canonicalizes as it will once attached.
    let canonical = wstrust_c14n::canonicalize(doc, signed_info, C14nMode::Exclusive, &[])?;
    let signature_value = engine.encode(signer.sign(&ctx.key, &canonical)?);
    builder.append(
        doc,
        signature,
        ElementSpec::new("", ns::node::SIGNATURE_VALUE).text(signature_value),
    )?;

    if let Some((token_id, _)) = &token {
        let key_info = builder.append(doc, signature, ElementSpec::new("", ns::node::KEY_INFO))?;
        let token_ref = builder.append(
            doc,
            key_info,
            ElementSpec::new("o", "o:SecurityTokenReference"),
        )?;
        builder.append(
            doc,
            token_ref,
            ElementSpec::new("o", "o:Reference").attr(ns::attr::URI, format!("#{token_id}")),
        )?;
    } else if let Some(adopted) = ctx.key_info {
        let key_info = builder.append(doc, signature, ElementSpec::new("", ns::node::KEY_INFO))?;
        doc.append_child(key_info, adopted)?;
    }

    if let Some((token_id, body)) = token {
        builder.append(
            doc,
            security,
            ElementSpec::new("o", "o:BinarySecurityToken")
                .text(body)
                .ns_attr("u:Id", token_id)
                .attr(ns::attr::VALUE_TYPE, algorithm::X509_TOKEN_VALUE_TYPE)
                .attr(ns::attr::ENCODING_TYPE, algorithm::BASE64_ENCODING_TYPE),
        )?;
    }
    doc.append_child(security, signature)?;
    Ok(signature)
}
