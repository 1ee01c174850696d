#![forbid(unsafe_code)]

//! SOAP 1.2 fault detection.

use wstrust_core::{ns, Fault};
use wstrust_xml::find;

/// Extract the first `s:Fault` of a response, if any.
///
/// Missing `Reason/Text` or `Code/Value` read as [`Fault::NOT_PROVIDED`].
/// The tag comes from the vendor fault detail
/// (`Detail/FaultDetail/Messages/FaultMessage/Tag`).
pub fn parse_fault(doc: &roxmltree::Document<'_>, source: &str) -> Option<Fault> {
    let fault = find::find_element(doc.root(), ns::SOAP12, ns::node::FAULT)?;

    let text_at = |namespace: &str, path: &[&str]| {
        find::find_path(fault, namespace, path).map(find::text_content)
    };
    let reason = text_at(ns::SOAP12, &[ns::node::REASON, ns::node::TEXT]);
    let code = text_at(ns::SOAP12, &[ns::node::CODE, ns::node::VALUE]);
    let subcode = text_at(
        ns::SOAP12,
        &[ns::node::CODE, ns::node::SUBCODE, ns::node::VALUE],
    );
    let tag = find::find_child(fault, ns::SOAP12, ns::node::DETAIL).and_then(|detail| {
        find::find_path(
            detail,
            ns::FAULT_DETAIL,
            &[
                ns::node::FAULT_DETAIL,
                ns::node::MESSAGES,
                ns::node::FAULT_MESSAGE,
                ns::node::TAG,
            ],
        )
        .map(find::text_content)
    });

    Some(Fault {
        reason: reason.unwrap_or_else(|| Fault::NOT_PROVIDED.to_owned()),
        code: code.unwrap_or_else(|| Fault::NOT_PROVIDED.to_owned()),
        subcode,
        tag,
        source: source.to_owned(),
    })
}
