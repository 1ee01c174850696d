#![forbid(unsafe_code)]

use wstrust_xml::NodeId;

/// Elements to sign, keyed by the id their `Reference` points at.
///
/// Iteration follows insertion order, which is the order of the
/// `Reference` elements in `SignedInfo`.
#[derive(Debug, Clone, Default)]
pub struct SignatureElementSet {
    entries: Vec<(String, NodeId)>,
}

impl SignatureElementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `node` under `id`; re-registering an id replaces the node in place.
    pub fn insert(&mut self, id: impl Into<String>, node: NodeId) {
        let id = id.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => entry.1 = node,
            None => self.entries.push((id, node)),
        }
    }

    pub fn get(&self, id: &str) -> Option<NodeId> {
        self.entries.iter().find(|(i, _)| i == id).map(|(_, n)| *n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.entries.iter().map(|(id, node)| (id.as_str(), *node))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
