#![forbid(unsafe_code)]

//! Element construction against a [`NamespaceTable`].

use wstrust_core::Error;

use crate::document::{Document, NodeId, QName};
use crate::namespaces::NamespaceTable;

/// Description of one element to create.
///
/// `namespace` is a key into the builder's table (or a literal URI) and
/// `name` is the qualified name written in the document, e.g.
/// `ElementSpec::new("u", "u:Timestamp")`.
#[derive(Debug, Clone)]
pub struct ElementSpec<'a> {
    namespace: &'a str,
    name: &'a str,
    text: Option<String>,
    attributes: Vec<(Option<&'a str>, &'a str, String)>,
    declarations: Vec<&'a str>,
}

impl<'a> ElementSpec<'a> {
    pub fn new(namespace: &'a str, name: &'a str) -> Self {
        Self {
            namespace,
            name,
            text: None,
            attributes: Vec::new(),
            declarations: Vec::new(),
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Text content, skipped when empty.
    pub fn text_opt(mut self, text: Option<&str>) -> Self {
        self.text = text.filter(|t| !t.is_empty()).map(str::to_owned);
        self
    }

    /// An attribute without namespace.
    pub fn attr(mut self, name: &'a str, value: impl Into<String>) -> Self {
        self.attributes.push((None, name, value.into()));
        self
    }

    /// A prefixed attribute (`u:Id`); the prefix must resolve in the table.
    pub fn ns_attr(mut self, name: &'a str, value: impl Into<String>) -> Self {
        let prefix = name.split_once(':').map(|(p, _)| p);
        self.attributes.push((prefix, name, value.into()));
        self
    }

    /// Declare an extra prefix from the table on this element.
    pub fn declare(mut self, prefix: &'a str) -> Self {
        self.declarations.push(prefix);
        self
    }
}

/// Creates elements whose namespaces come from one shared table.
#[derive(Debug, Clone, Default)]
pub struct XmlBuilder {
    namespaces: NamespaceTable,
}

impl XmlBuilder {
    pub fn new(namespaces: NamespaceTable) -> Self {
        Self { namespaces }
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    /// Create the element detached from the tree.
    pub fn create(&self, doc: &mut Document, spec: &ElementSpec<'_>) -> Result<NodeId, Error> {
        let uri = self.namespaces.resolve(spec.namespace)?;
        let id = doc.create_element(QName::new(spec.name, Some(uri)));

        let mut attributes = Vec::with_capacity(spec.attributes.len());
        for (prefix, name, value) in &spec.attributes {
            let name = match prefix {
                Some(p) => QName::new(name, Some(self.namespaces.resolve(p)?)),
                None => QName::local(name),
            };
            attributes.push((name, value.clone()));
        }
        let mut declarations = Vec::with_capacity(spec.declarations.len());
        for prefix in &spec.declarations {
            declarations.push((*prefix, self.namespaces.resolve(prefix)?));
        }

        let elem = doc
            .element_mut(id)
            .ok_or_else(|| Error::XmlStructure("created node is not an element".into()))?;
        for (prefix, uri) in declarations {
            elem.declare_namespace(prefix, uri);
        }
        for (name, value) in attributes {
            elem.set_attribute(name, value);
        }

        if let Some(text) = &spec.text {
            let text = doc.create_text(text.clone());
            doc.append_child(id, text)?;
        }
        Ok(id)
    }

    /// Create the element as the last child of `parent`.
    pub fn append(
        &self,
        doc: &mut Document,
        parent: NodeId,
        spec: ElementSpec<'_>,
    ) -> Result<NodeId, Error> {
        let id = self.create(doc, &spec)?;
        doc.append_child(parent, id)?;
        Ok(id)
    }

    /// Create the element immediately before `sibling`.
    pub fn insert_before(
        &self,
        doc: &mut Document,
        sibling: NodeId,
        spec: ElementSpec<'_>,
    ) -> Result<NodeId, Error> {
        let parent = doc
            .parent(sibling)
            .ok_or_else(|| Error::XmlStructure("sibling has no parent".into()))?;
        let id = self.create(doc, &spec)?;
        doc.insert_before(parent, id, sibling)?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::to_xml;
    use wstrust_core::ns;

    #[test]
    fn builds_namespaced_tree() {
        let builder = XmlBuilder::default();
        let mut doc = Document::new();
        let root = doc.root();
        let env = builder
            .append(&mut doc, root, ElementSpec::new("s", "s:Envelope").declare("u"))
            .unwrap();
        let header = builder
            .append(&mut doc, env, ElementSpec::new("s", "s:Header"))
            .unwrap();
        let security = builder
            .append(
                &mut doc,
                header,
                ElementSpec::new("o", "o:Security").ns_attr("s:mustUnderstand", "1"),
            )
            .unwrap();
        builder
            .insert_before(
                &mut doc,
                security,
                ElementSpec::new("a", "a:To").text("https://sts").ns_attr("u:Id", "_1"),
            )
            .unwrap();

        assert_eq!(
            to_xml(&doc),
            format!(
                concat!(
                    r#"<s:Envelope xmlns:u="{u}" xmlns:s="{s}"><s:Header>"#,
                    r#"<a:To xmlns:a="{a}" u:Id="_1">https://sts</a:To>"#,
                    r#"<o:Security xmlns:o="{o}" s:mustUnderstand="1"/>"#,
                    r#"</s:Header></s:Envelope>"#
                ),
                u = ns::WSU,
                s = ns::SOAP12,
                a = ns::ADDRESSING,
                o = ns::WSSE
            )
        );
    }

    #[test]
    fn default_namespace_elements() {
        let builder = XmlBuilder::default();
        let mut doc = Document::new();
        let root = doc.root();
        let sig = builder
            .append(&mut doc, root, ElementSpec::new("", "Signature"))
            .unwrap();
        let elem = doc.element(sig).unwrap();
        assert_eq!(elem.name.prefix(), "");
        assert_eq!(elem.name.namespace(), ns::DSIG);
    }

    #[test]
    fn unknown_prefix_fails() {
        let builder = XmlBuilder::default();
        let mut doc = Document::new();
        let root = doc.root();
        let err = builder
            .append(&mut doc, root, ElementSpec::new("zz", "zz:Thing"))
            .unwrap_err();
        assert!(matches!(err, Error::Namespace(_)));

        let err = builder
            .append(
                &mut doc,
                root,
                ElementSpec::new("s", "s:Thing").ns_attr("zz:flag", "1"),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Namespace(_)));
    }
}
