#![forbid(unsafe_code)]

//! Serialization of [`Document`] trees to XML text.
//!
//! Declarations are reconciled while writing: an explicit declaration that
//! repeats an in-scope binding is dropped, and any prefix used by an element
//! or attribute without a matching binding in scope is declared on the spot.

use std::collections::BTreeMap;

use crate::document::{Document, NodeId, NodeKind, QName};
use crate::escape::{escape_attr, escape_text};

/// Serialize the whole document (without an XML declaration).
pub fn to_xml(doc: &Document) -> String {
    let mut out = String::new();
    write_node(doc, doc.root(), &BTreeMap::new(), &mut out);
    out
}

/// Serialize one subtree as a standalone fragment.
///
/// Namespaces declared on ancestors are re-declared where the subtree uses
/// them, so the result parses on its own.
pub fn node_to_xml(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, &BTreeMap::new(), &mut out);
    out
}

/// Serialize the whole document preceded by an XML declaration.
pub fn to_xml_with_declaration(doc: &Document) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>");
    write_node(doc, doc.root(), &BTreeMap::new(), &mut out);
    out
}

fn write_node(doc: &Document, id: NodeId, scope: &BTreeMap<String, String>, out: &mut String) {
    match doc.node_kind(id) {
        Some(NodeKind::Document) => {
            for child in doc.children(id) {
                write_node(doc, child, scope, out);
            }
        }
        Some(NodeKind::Text(text)) => out.push_str(&escape_text(text)),
        Some(NodeKind::Comment(text)) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Some(NodeKind::Element(elem)) => {
            let mut scope = scope.clone();
            let mut decls: Vec<(String, String)> = Vec::new();

            for (prefix, uri) in &elem.namespace_declarations {
                bind(&mut scope, &mut decls, prefix, uri);
            }
            require(&mut scope, &mut decls, &elem.name, true);
            for attr in &elem.attributes {
                require(&mut scope, &mut decls, &attr.name, false);
            }

            let name = elem.name.qualified();
            out.push('<');
            out.push_str(&name);
            for (prefix, uri) in &decls {
                if prefix.is_empty() {
                    out.push_str(" xmlns=\"");
                } else {
                    out.push_str(" xmlns:");
                    out.push_str(prefix);
                    out.push_str("=\"");
                }
                out.push_str(&escape_attr(uri));
                out.push('"');
            }
            for attr in &elem.attributes {
                out.push(' ');
                out.push_str(&attr.name.qualified());
                out.push_str("=\"");
                out.push_str(&escape_attr(&attr.value));
                out.push('"');
            }

            let mut children = doc.children(id).peekable();
            if children.peek().is_none() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for child in children {
                write_node(doc, child, &scope, out);
            }
            out.push_str("</");
            out.push_str(&name);
            out.push('>');
        }
        None => {}
    }
}

fn bind(
    scope: &mut BTreeMap<String, String>,
    decls: &mut Vec<(String, String)>,
    prefix: &str,
    uri: &str,
) {
    let current = scope.get(prefix).map(String::as_str).unwrap_or("");
    if current == uri {
        return;
    }
    if uri.is_empty() {
        scope.remove(prefix);
    } else {
        scope.insert(prefix.to_owned(), uri.to_owned());
    }
    decls.retain(|(p, _)| p != prefix);
    decls.push((prefix.to_owned(), uri.to_owned()));
}

fn require(
    scope: &mut BTreeMap<String, String>,
    decls: &mut Vec<(String, String)>,
    name: &QName,
    is_element: bool,
) {
    let prefix = name.prefix();
    if prefix == "xml" {
        return;
    }
    // Unprefixed attributes are never in a namespace.
    if prefix.is_empty() && !is_element {
        return;
    }
    bind(scope, decls, prefix, name.namespace());
}
