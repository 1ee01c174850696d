#![forbid(unsafe_code)]

//! Mutable arena-backed XML document.
//!
//! Messages are assembled node by node, signed in place and finally
//! serialized.  Nodes live in a `Vec` owned by the [`Document`] and are
//! addressed by [`NodeId`]; a node created with [`Document::create_element`]
//! stays detached until it is appended or inserted somewhere.

use std::collections::BTreeMap;

use wstrust_core::{ns, Error};

/// Index of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A namespace-qualified name with the prefix it is written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    pub prefix: Option<String>,
    pub local_name: String,
    pub namespace_uri: Option<String>,
}

impl QName {
    /// Split `qualified` (`p:local` or `local`) and bind it to `namespace_uri`.
    pub fn new(qualified: &str, namespace_uri: Option<&str>) -> Self {
        let (prefix, local_name) = match qualified.split_once(':') {
            Some((p, l)) => (Some(p.to_owned()), l.to_owned()),
            None => (None, qualified.to_owned()),
        };
        Self {
            prefix,
            local_name,
            namespace_uri: namespace_uri.filter(|u| !u.is_empty()).map(str::to_owned),
        }
    }

    /// A name without prefix or namespace.
    pub fn local(local_name: &str) -> Self {
        Self::new(local_name, None)
    }

    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or("")
    }

    pub fn namespace(&self) -> &str {
        self.namespace_uri.as_deref().unwrap_or("")
    }

    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(p) if !p.is_empty() => format!("{p}:{}", self.local_name),
            _ => self.local_name.clone(),
        }
    }

    pub fn matches(&self, namespace: &str, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace() == namespace
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QName,
    pub attributes: Vec<Attribute>,
    /// Explicit `xmlns` declarations as `(prefix, uri)`; `""` is the default namespace.
    pub namespace_declarations: Vec<(String, String)>,
}

impl Element {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            namespace_declarations: Vec::new(),
        }
    }

    /// Look up an attribute by namespace (`""` for none) and local name.
    pub fn attribute(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.matches(namespace, local_name))
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing an existing one with the same expanded name.
    pub fn set_attribute(&mut self, name: QName, value: impl Into<String>) {
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name.matches(name.namespace(), &name.local_name))
        {
            Some(existing) => {
                existing.name = name;
                existing.value = value;
            }
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    /// Declare `prefix` for `uri` on this element, replacing an earlier binding.
    pub fn declare_namespace(&mut self, prefix: &str, uri: &str) {
        match self
            .namespace_declarations
            .iter_mut()
            .find(|(p, _)| p == prefix)
        {
            Some(decl) => decl.1 = uri.to_owned(),
            None => self
                .namespace_declarations
                .push((prefix.to_owned(), uri.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An owned, mutable XML document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse XML text into a mutable document.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let parsed = roxmltree::Document::parse(text).map_err(|e| Error::XmlParse(e.to_string()))?;
        let mut doc = Self::new();
        for child in parsed.root().children() {
            if let Some(id) = doc.import_node(child)? {
                doc.append_child(doc.root(), id)?;
            }
        }
        Ok(doc)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The single top-level element, if one has been attached.
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root()).find(|c| self.element(*c).is_some())
    }

    pub fn node_kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|n| &n.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.node_kind(id) {
            Some(NodeKind::Element(e)) => Some(e),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.kind) {
            Some(NodeKind::Element(e)) => Some(e),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
            .iter()
            .copied()
    }

    /// Element children only.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).filter(|c| self.element(*c).is_some())
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = &self.nodes[self.parent(id)?.0].children;
        let pos = siblings.iter().position(|s| *s == id)?;
        pos.checked_sub(1).map(|p| siblings[p])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = &self.nodes[self.parent(id)?.0].children;
        let pos = siblings.iter().position(|s| *s == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Iterate `id` and all of its descendants in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            if let Some(node) = self.nodes.get(n.0) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Find the first descendant element (or `id` itself) with the given name.
    pub fn find_element(&self, id: NodeId, namespace: &str, local_name: &str) -> Option<NodeId> {
        self.descendants(id).into_iter().find(|n| {
            self.element(*n)
                .is_some_and(|e| e.name.matches(namespace, local_name))
        })
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| match self.node_kind(n) {
                Some(NodeKind::Text(t)) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: QName) -> NodeId {
        self.push(NodeKind::Element(Element::new(name)))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Comment(text.into()))
    }

    fn check_attach(&self, parent: NodeId, child: NodeId) -> Result<(), Error> {
        match self.node_kind(parent) {
            Some(NodeKind::Document) | Some(NodeKind::Element(_)) => {}
            _ => {
                return Err(Error::XmlStructure(format!(
                    "node {} cannot have children",
                    parent.0
                )))
            }
        }
        if child.0 == 0 || child.0 >= self.nodes.len() {
            return Err(Error::XmlStructure(format!("invalid node {}", child.0)));
        }
        if self.nodes[child.0].parent.is_some() {
            return Err(Error::XmlStructure(format!(
                "node {} is already attached",
                child.0
            )));
        }
        let mut ancestor = Some(parent);
        while let Some(a) = ancestor {
            if a == child {
                return Err(Error::XmlStructure("cannot attach a node below itself".into()));
            }
            ancestor = self.parent(a);
        }
        Ok(())
    }

    /// Attach a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), Error> {
        self.check_attach(parent, child)?;
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Attach a detached node immediately before `reference`, a child of `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<(), Error> {
        self.check_attach(parent, child)?;
        let pos = self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == reference)
            .ok_or_else(|| {
                Error::XmlStructure(format!(
                    "node {} is not a child of node {}",
                    reference.0, parent.0
                ))
            })?;
        self.nodes[parent.0].children.insert(pos, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// All namespace bindings visible at `id`, from its own and its
    /// ancestors' explicit declarations.  An empty URI undeclares.
    pub fn in_scope_namespaces(&self, id: NodeId) -> BTreeMap<String, String> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(n) = current {
            if let Some(elem) = self.element(n) {
                chain.push(elem);
            }
            current = self.parent(n);
        }

        let mut result = BTreeMap::new();
        for elem in chain.into_iter().rev() {
            for (prefix, uri) in &elem.namespace_declarations {
                if uri.is_empty() {
                    result.remove(prefix);
                } else {
                    result.insert(prefix.clone(), uri.clone());
                }
            }
        }
        result
    }

    /// Deep-copy a node from a parsed document into this one.
    ///
    /// Element and attribute prefixes are recovered from the source text so
    /// the copy serializes and canonicalizes exactly like the original.  The
    /// copied top element declares every namespace in scope at the source,
    /// descendants declare only what changes.  Returns `None` for node kinds
    /// that are not kept (processing instructions).
    pub fn import_node(&mut self, node: roxmltree::Node<'_, '_>) -> Result<Option<NodeId>, Error> {
        self.import_with_scope(node, &BTreeMap::new())
    }

    fn import_with_scope(
        &mut self,
        node: roxmltree::Node<'_, '_>,
        outer: &BTreeMap<String, String>,
    ) -> Result<Option<NodeId>, Error> {
        if node.is_text() {
            let text = node.text().unwrap_or_default();
            return Ok(Some(self.create_text(text)));
        }
        if node.is_comment() {
            let text = node.text().unwrap_or_default();
            return Ok(Some(self.create_comment(text)));
        }
        if !node.is_element() {
            return Ok(None);
        }

        let source = node.document().input_text();
        let tag = node.tag_name();
        let prefix = element_prefix(source, node.range().start)?;
        let mut element = Element::new(QName {
            prefix,
            local_name: tag.name().to_owned(),
            namespace_uri: tag.namespace().map(str::to_owned),
        });

        let mut scope = BTreeMap::new();
        for namespace in node.namespaces() {
            let prefix = namespace.name().unwrap_or("");
            if prefix == "xml" {
                continue;
            }
            scope.insert(prefix.to_owned(), namespace.uri().to_owned());
        }
        for (prefix, uri) in &scope {
            if outer.get(prefix) != Some(uri) {
                element.declare_namespace(prefix, uri);
            }
        }
        if outer.get("").is_some_and(|u| !u.is_empty()) && !scope.contains_key("") {
            element.declare_namespace("", "");
        }

        for attr in node.attributes() {
            let qname = &source[attr.range_qname()];
            element.attributes.push(Attribute {
                name: QName::new(qname, attr.namespace()),
                value: attr.value().to_owned(),
            });
        }

        let id = self.push(NodeKind::Element(element));
        for child in node.children() {
            if let Some(copy) = self.import_with_scope(child, &scope)? {
                self.append_child(id, copy)?;
            }
        }
        Ok(Some(id))
    }
}

/// Read the qualified name of the start tag at `start` and return its prefix.
fn element_prefix(source: &str, start: usize) -> Result<Option<String>, Error> {
    let tag = source
        .get(start..)
        .and_then(|s| s.strip_prefix('<'))
        .ok_or_else(|| Error::XmlParse(format!("no start tag at offset {start}")))?;
    let end = tag
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(tag.len());
    Ok(tag[..end].split_once(':').map(|(p, _)| p.to_owned()))
}

/// Namespace URI bound to `prefix` at `id`, including the implicit `xml` binding.
pub fn lookup_namespace(doc: &Document, id: NodeId, prefix: &str) -> Option<String> {
    if prefix == "xml" {
        return Some(ns::XML.to_owned());
    }
    doc.in_scope_namespaces(id).remove(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<s:Envelope xmlns:s="urn:s" xmlns:u="urn:u"><s:Body u:Id="_1"><x xmlns="urn:d">t</x></s:Body></s:Envelope>"#;

    #[test]
    fn parse_recovers_prefixes() {
        let doc = Document::parse(SAMPLE).unwrap();
        let env = doc.document_element().unwrap();
        let elem = doc.element(env).unwrap();
        assert_eq!(elem.name.qualified(), "s:Envelope");
        assert_eq!(elem.name.namespace(), "urn:s");

        let body = doc.child_elements(env).next().unwrap();
        let body_elem = doc.element(body).unwrap();
        assert_eq!(body_elem.attributes[0].name.qualified(), "u:Id");
        assert_eq!(body_elem.attribute("urn:u", "Id"), Some("_1"));
        // Inherited bindings are not repeated on descendants.
        assert!(body_elem.namespace_declarations.is_empty());

        let x = doc.find_element(env, "urn:d", "x").unwrap();
        assert_eq!(doc.element(x).unwrap().namespace_declarations, vec![("".into(), "urn:d".into())]);
        assert_eq!(doc.text_content(x), "t");
    }

    #[test]
    fn insert_before_keeps_order() {
        let mut doc = Document::new();
        let parent = doc.create_element(QName::local("p"));
        doc.append_child(doc.root(), parent).unwrap();
        let b = doc.create_element(QName::local("b"));
        doc.append_child(parent, b).unwrap();
        let a = doc.create_element(QName::local("a"));
        doc.insert_before(parent, a, b).unwrap();

        let names: Vec<String> = doc
            .child_elements(parent)
            .map(|c| doc.element(c).unwrap().name.local_name.clone())
            .collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(doc.previous_sibling(b), Some(a));
        assert_eq!(doc.next_sibling(a), Some(b));
    }

    #[test]
    fn attach_rejects_reparenting_and_cycles() {
        let mut doc = Document::new();
        let p = doc.create_element(QName::local("p"));
        let c = doc.create_element(QName::local("c"));
        doc.append_child(doc.root(), p).unwrap();
        doc.append_child(p, c).unwrap();
        assert!(doc.append_child(p, c).is_err());

        let q = doc.create_element(QName::local("q"));
        let r = doc.create_element(QName::local("r"));
        doc.append_child(q, r).unwrap();
        assert!(doc.append_child(r, q).is_err());
    }

    #[test]
    fn insert_before_requires_child_reference() {
        let mut doc = Document::new();
        let p = doc.create_element(QName::local("p"));
        let stranger = doc.create_element(QName::local("s"));
        let n = doc.create_element(QName::local("n"));
        assert!(matches!(
            doc.insert_before(p, n, stranger),
            Err(Error::XmlStructure(_))
        ));
    }

    #[test]
    fn in_scope_namespaces_follow_ancestors() {
        let doc = Document::parse(SAMPLE).unwrap();
        let env = doc.document_element().unwrap();
        let x = doc.find_element(env, "urn:d", "x").unwrap();
        let scope = doc.in_scope_namespaces(x);
        assert_eq!(scope.get("s").map(String::as_str), Some("urn:s"));
        assert_eq!(scope.get("").map(String::as_str), Some("urn:d"));
        assert_eq!(lookup_namespace(&doc, x, "xml").as_deref(), Some(ns::XML));
    }
}
