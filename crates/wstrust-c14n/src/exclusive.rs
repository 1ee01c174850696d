#![forbid(unsafe_code)]

//! Exclusive Canonical XML 1.0 (exc-C14N).
//!
//! Algorithm URI: `http://www.w3.org/2001/10/xml-exc-c14n#`
//! With comments: `http://www.w3.org/2001/10/xml-exc-c14n#WithComments`
//!
//! Only "visibly utilized" namespace declarations are output.  A namespace
//! is visibly utilized by an element if:
//! 1. Its prefix is used by the element's tag name, OR
//! 2. Its prefix is used by one of the element's attributes, OR
//! 3. The prefix appears in the InclusiveNamespaces PrefixList.
//!
//! The apex element is rendered as if its ancestors were not in the
//! output, so a subtree canonicalizes the same wherever it is attached.

use std::collections::BTreeMap;

use wstrust_core::Error;
use wstrust_xml::document::lookup_namespace;
use wstrust_xml::{escape, Document, NodeId, NodeKind};

use crate::render::{Attr, NsDecl};

/// Canonicalize the subtree rooted at `apex` (or the whole document when
/// `apex` is the document root).
pub fn canonicalize(
    doc: &Document,
    apex: NodeId,
    with_comments: bool,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    let mut output = Vec::new();
    let ctx = ExcC14nContext {
        doc,
        with_comments,
        inclusive_prefixes,
    };
    ctx.process_node(apex, &mut output, &BTreeMap::new())?;
    Ok(output)
}

struct ExcC14nContext<'a> {
    doc: &'a Document,
    with_comments: bool,
    inclusive_prefixes: &'a [String],
}

impl ExcC14nContext<'_> {
    fn process_node(
        &self,
        id: NodeId,
        output: &mut Vec<u8>,
        rendered_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        match self.doc.node_kind(id) {
            Some(NodeKind::Document) => {
                for child in self.doc.children(id) {
                    self.process_node(child, output, rendered_ns)?;
                }
            }
            Some(NodeKind::Element(_)) => self.process_element(id, output, rendered_ns)?,
            Some(NodeKind::Text(text)) => {
                output.extend_from_slice(escape::escape_text(text).as_bytes());
            }
            Some(NodeKind::Comment(text)) => {
                if self.with_comments {
                    let parent_is_root = self
                        .doc
                        .parent(id)
                        .is_some_and(|p| matches!(self.doc.node_kind(p), Some(NodeKind::Document)));

                    if parent_is_root && has_preceding_element(self.doc, id) {
                        output.push(b'\n');
                    }
                    output.extend_from_slice(b"<!--");
                    output.extend_from_slice(text.as_bytes());
                    output.extend_from_slice(b"-->");
                    if parent_is_root && has_following_element(self.doc, id) {
                        output.push(b'\n');
                    }
                }
            }
            None => {
                return Err(Error::Canonicalization(format!(
                    "node {} does not exist",
                    id.index()
                )))
            }
        }
        Ok(())
    }

    fn process_element(
        &self,
        id: NodeId,
        output: &mut Vec<u8>,
        rendered_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        let elem = self
            .doc
            .element(id)
            .ok_or_else(|| Error::Canonicalization(format!("node {} is not an element", id.index())))?;

        // Visibly utilized prefixes and the namespace each is bound to here.
        let mut utilized: BTreeMap<String, String> = BTreeMap::new();
        utilized.insert(elem.name.prefix().to_owned(), elem.name.namespace().to_owned());
        for attr in &elem.attributes {
            let prefix = attr.name.prefix();
            if !prefix.is_empty() {
                utilized.insert(prefix.to_owned(), attr.name.namespace().to_owned());
            }
        }
        for p in self.inclusive_prefixes {
            let prefix = if p == "#default" { "" } else { p.as_str() };
            if utilized.contains_key(prefix) {
                continue;
            }
            if let Some(uri) = lookup_namespace(self.doc, id, prefix) {
                utilized.insert(prefix.to_owned(), uri);
            }
        }

        let mut ns_decls: Vec<NsDecl> = Vec::new();
        for (prefix, uri) in &utilized {
            if prefix == "xml" {
                continue;
            }
            let previously_rendered = rendered_ns.get(prefix).map(String::as_str).unwrap_or("");
            if !uri.is_empty() && previously_rendered != uri {
                ns_decls.push(NsDecl {
                    prefix: prefix.clone(),
                    uri: uri.clone(),
                });
            } else if uri.is_empty() && prefix.is_empty() && !previously_rendered.is_empty() {
                // Default namespace was rendered non-empty above; undeclare it.
                ns_decls.push(NsDecl {
                    prefix: String::new(),
                    uri: String::new(),
                });
            }
        }
        ns_decls.sort();

        let mut attrs: Vec<Attr> = elem
            .attributes
            .iter()
            .map(|attr| Attr {
                ns_uri: attr.name.namespace().to_owned(),
                local_name: attr.name.local_name.clone(),
                qualified_name: attr.name.qualified(),
                value: attr.value.clone(),
            })
            .collect();
        attrs.sort();

        let elem_name = elem.name.qualified();

        output.push(b'<');
        output.extend_from_slice(elem_name.as_bytes());
        for ns_decl in &ns_decls {
            ns_decl.write_to(output);
        }
        for attr in &attrs {
            attr.write_to(output);
        }
        output.push(b'>');

        let mut child_rendered_ns = rendered_ns.clone();
        for ns_decl in ns_decls {
            child_rendered_ns.insert(ns_decl.prefix, ns_decl.uri);
        }

        for child in self.doc.children(id) {
            self.process_node(child, output, &child_rendered_ns)?;
        }

        output.extend_from_slice(b"</");
        output.extend_from_slice(elem_name.as_bytes());
        output.push(b'>');
        Ok(())
    }
}

/// Check if any preceding sibling is an element.
fn has_preceding_element(doc: &Document, id: NodeId) -> bool {
    let mut sib = doc.previous_sibling(id);
    while let Some(s) = sib {
        if doc.element(s).is_some() {
            return true;
        }
        sib = doc.previous_sibling(s);
    }
    false
}

/// Check if any following sibling is an element.
fn has_following_element(doc: &Document, id: NodeId) -> bool {
    let mut sib = doc.next_sibling(id);
    while let Some(s) = sib {
        if doc.element(s).is_some() {
            return true;
        }
        sib = doc.next_sibling(s);
    }
    false
}
