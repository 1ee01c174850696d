#![forbid(unsafe_code)]

//! Lookups over parsed (`roxmltree`) documents.

/// First descendant element (or `node` itself) with the given name.
pub fn find_element<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    namespace: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.descendants().find(|n| is_named(*n, namespace, local_name))
}

/// All descendant elements with the given name, in document order.
pub fn find_elements<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    namespace: &str,
    local_name: &str,
) -> Vec<roxmltree::Node<'a, 'input>> {
    node.descendants()
        .filter(|n| is_named(*n, namespace, local_name))
        .collect()
}

/// First child element with the given name.
pub fn find_child<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    namespace: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children().find(|n| is_named(*n, namespace, local_name))
}

/// Follow a chain of child elements, all in `namespace`.
pub fn find_path<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    namespace: &str,
    path: &[&str],
) -> Option<roxmltree::Node<'a, 'input>> {
    path.iter()
        .try_fold(node, |current, name| find_child(current, namespace, name))
}

pub fn is_named(node: roxmltree::Node<'_, '_>, namespace: &str, local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local_name
        && node.tag_name().namespace().unwrap_or("") == namespace
}

/// Concatenated descendant text of a node.
pub fn text_content(node: roxmltree::Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_lookup() {
        let xml = r#"<r xmlns:p="urn:p"><p:a><p:b>one</p:b><p:b>two</p:b></p:a></r>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let b = find_path(doc.root_element(), "urn:p", &["a", "b"]).unwrap();
        assert_eq!(b.text(), Some("one"));
        assert_eq!(find_elements(doc.root(), "urn:p", "b").len(), 2);
        assert!(find_path(doc.root_element(), "urn:p", &["a", "c"]).is_none());
        assert_eq!(text_content(doc.root_element()), "onetwo");
    }
}
