#![forbid(unsafe_code)]

//! Ordering and rendering of namespace declarations and attributes.

use std::cmp::Ordering;

use wstrust_xml::escape;

/// A namespace declaration on a canonical start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsDecl {
    /// The prefix ("" for default namespace).
    pub prefix: String,
    /// The namespace URI ("" undeclares the default namespace).
    pub uri: String,
}

impl NsDecl {
    pub fn write_to(&self, out: &mut Vec<u8>) {
        if self.prefix.is_empty() {
            out.extend_from_slice(b" xmlns=\"");
        } else {
            out.extend_from_slice(b" xmlns:");
            out.extend_from_slice(self.prefix.as_bytes());
            out.extend_from_slice(b"=\"");
        }
        out.extend_from_slice(escape::escape_attr(&self.uri).as_bytes());
        out.push(b'"');
    }
}

/// Default namespace first, then by prefix.
impl Ord for NsDecl {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .prefix
            .is_empty()
            .cmp(&self.prefix.is_empty())
            .then_with(|| self.prefix.cmp(&other.prefix))
    }
}

impl PartialOrd for NsDecl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An attribute on a canonical start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// "" when the attribute has no namespace.
    pub ns_uri: String,
    pub local_name: String,
    /// `prefix:local` or `local`, as written.
    pub qualified_name: String,
    pub value: String,
}

impl Attr {
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(b' ');
        out.extend_from_slice(self.qualified_name.as_bytes());
        out.extend_from_slice(b"=\"");
        out.extend_from_slice(escape::escape_attr(&self.value).as_bytes());
        out.push(b'"');
    }
}

/// Unqualified attributes first, then by namespace URI, then local name.
impl Ord for Attr {
    fn cmp(&self, other: &Self) -> Ordering {
        (!self.ns_uri.is_empty())
            .cmp(&!other.ns_uri.is_empty())
            .then_with(|| self.ns_uri.cmp(&other.ns_uri))
            .then_with(|| self.local_name.cmp(&other.local_name))
    }
}

impl PartialOrd for Attr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(prefix: &str) -> NsDecl {
        NsDecl {
            prefix: prefix.into(),
            uri: format!("urn:{prefix}"),
        }
    }

    fn attr(ns: &str, qname: &str) -> Attr {
        Attr {
            ns_uri: ns.into(),
            local_name: qname.rsplit(':').next().unwrap().into(),
            qualified_name: qname.into(),
            value: String::new(),
        }
    }

    #[test]
    fn default_declaration_sorts_first() {
        let mut decls = vec![decl("u"), decl(""), decl("a")];
        decls.sort();
        let prefixes: Vec<&str> = decls.iter().map(|d| d.prefix.as_str()).collect();
        assert_eq!(prefixes, ["", "a", "u"]);
    }

    #[test]
    fn wsu_id_sorts_before_soap_must_understand() {
        let mut attrs = vec![
            attr("http://www.w3.org/2003/05/soap-envelope", "s:mustUnderstand"),
            attr("http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd", "u:Id"),
            attr("", "URI"),
        ];
        attrs.sort();
        let names: Vec<&str> = attrs.iter().map(|a| a.qualified_name.as_str()).collect();
        assert_eq!(names, ["URI", "u:Id", "s:mustUnderstand"]);
    }

    #[test]
    fn renders_declarations_and_attributes() {
        let mut out = Vec::new();
        decl("").write_to(&mut out);
        NsDecl { prefix: String::new(), uri: String::new() }.write_to(&mut out);
        Attr { value: "a\"b".into(), ..attr("", "Id") }.write_to(&mut out);
        assert_eq!(out, br#" xmlns="urn:" xmlns="" Id="a&quot;b""#);
    }
}
