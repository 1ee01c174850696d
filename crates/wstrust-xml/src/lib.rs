#![forbid(unsafe_code)]

//! XML support for the wstrust client.
//!
//! Messages are built in a mutable arena [`Document`] through an
//! [`XmlBuilder`] bound to a [`NamespaceTable`]; responses are read with
//! `roxmltree` and the helpers in [`find`] and [`xpath`].  Parsed nodes can
//! be copied into a message with [`Document::import_node`].

pub mod builder;
pub mod document;
pub mod escape;
pub mod find;
pub mod namespaces;
pub mod stamp;
pub mod writer;
pub mod xpath;

pub use builder::{ElementSpec, XmlBuilder};
pub use document::{Attribute, Document, Element, NodeId, NodeKind, QName};
pub use namespaces::NamespaceTable;
pub use stamp::{generate_guid, timestamp};

use wstrust_core::Error;

/// Parse response text, mapping parser errors into [`Error::XmlParse`].
pub fn parse(text: &str) -> Result<roxmltree::Document<'_>, Error> {
    roxmltree::Document::parse(text).map_err(|e| Error::XmlParse(e.to_string()))
}
