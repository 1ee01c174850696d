#![forbid(unsafe_code)]

//! Prefix table resolving the short namespace keys used when building
//! WS-* messages.

use std::collections::BTreeMap;

use wstrust_core::{ns, Error};

/// Maps namespace keys (normally the prefix they are written with) to URIs.
///
/// The empty key is the XML-DSig namespace, which signature elements use
/// as their default namespace.  A key that is itself an `http(s)://` or
/// `urn:` URI resolves to itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceTable {
    entries: BTreeMap<String, String>,
}

impl Default for NamespaceTable {
    fn default() -> Self {
        Self::ws_trust()
    }
}

impl NamespaceTable {
    /// The fixed table of WS-Trust / WS-Security namespaces.
    pub fn ws_trust() -> Self {
        let entries = [
            ("s", ns::SOAP12),
            ("a", ns::ADDRESSING),
            ("wsa", ns::ADDRESSING),
            ("u", ns::WSU),
            ("o", ns::WSSE),
            ("trust", ns::TRUST),
            ("wsp", ns::POLICY),
            ("i", ns::XSI),
            ("c", ns::ARRAYS),
            ("xenc", ns::ENC),
            ("tp", ns::FAULT_DETAIL),
            ("", ns::DSIG),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
        Self { entries }
    }

    /// Add or replace a key.
    pub fn with(mut self, key: impl Into<String>, uri: impl Into<String>) -> Self {
        self.insert(key, uri);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, uri: impl Into<String>) {
        self.entries.insert(key.into(), uri.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key) || is_literal_uri(key)
    }

    /// Resolve a key to its namespace URI.
    pub fn resolve<'a>(&'a self, key: &'a str) -> Result<&'a str, Error> {
        if let Some(uri) = self.entries.get(key) {
            return Ok(uri);
        }
        if is_literal_uri(key) {
            return Ok(key);
        }
        Err(Error::Namespace(format!("no namespace registered for prefix '{key}'")))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn is_literal_uri(key: &str) -> bool {
    key.starts_with("http://") || key.starts_with("https://") || key.starts_with("urn:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_fixed_prefixes() {
        let table = NamespaceTable::ws_trust();
        assert_eq!(table.resolve("s").unwrap(), ns::SOAP12);
        assert_eq!(table.resolve("wsa").unwrap(), table.resolve("a").unwrap());
        assert_eq!(table.resolve("").unwrap(), ns::DSIG);
    }

    #[test]
    fn literal_uri_resolves_to_itself() {
        let table = NamespaceTable::ws_trust();
        let uri = "http://www.agiv.be/Gipod/2010/06/service";
        assert_eq!(table.resolve(uri).unwrap(), uri);
    }

    #[test]
    fn unknown_prefix_is_namespace_error() {
        let table = NamespaceTable::ws_trust();
        assert!(matches!(table.resolve("b"), Err(Error::Namespace(_))));
        let extended = table.with("b", "http://www.agiv.be/Gipod/2010/06");
        assert_eq!(extended.resolve("b").unwrap(), "http://www.agiv.be/Gipod/2010/06");
    }
}
