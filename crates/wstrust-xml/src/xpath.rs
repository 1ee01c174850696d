#![forbid(unsafe_code)]

//! Minimal XPath subset for result extraction.
//!
//! Only relative location paths of child steps are supported:
//! `p:Name/p:Child`, `*`, `.` and unprefixed names (no namespace).
//! Prefixes resolve through a [`NamespaceTable`].

use wstrust_core::Error;

use crate::namespaces::NamespaceTable;

enum Step<'p> {
    SelfNode,
    AnyElement,
    Named { namespace: &'p str, local_name: &'p str },
}

fn parse_steps<'p>(path: &'p str, namespaces: &'p NamespaceTable) -> Result<Vec<Step<'p>>, Error> {
    let trimmed = path.trim();
    if trimmed.is_empty() || trimmed.starts_with('/') {
        return Err(Error::XmlStructure(format!("unsupported XPath expression: '{path}'")));
    }
    trimmed
        .split('/')
        .map(|step| match step {
            "." => Ok(Step::SelfNode),
            "*" => Ok(Step::AnyElement),
            "" => Err(Error::XmlStructure(format!("unsupported XPath expression: '{path}'"))),
            _ => match step.split_once(':') {
                Some((prefix, local_name)) => Ok(Step::Named {
                    namespace: namespaces.resolve(prefix)?,
                    local_name,
                }),
                None => Ok(Step::Named {
                    namespace: "",
                    local_name: step,
                }),
            },
        })
        .collect()
}

/// Evaluate `path` relative to `context`, returning matches in document order.
pub fn select<'a, 'input>(
    context: roxmltree::Node<'a, 'input>,
    path: &str,
    namespaces: &NamespaceTable,
) -> Result<Vec<roxmltree::Node<'a, 'input>>, Error> {
    let steps = parse_steps(path, namespaces)?;
    let mut current = vec![context];
    for step in &steps {
        current = match step {
            Step::SelfNode => current,
            Step::AnyElement => current
                .iter()
                .flat_map(|n| n.children().filter(|c| c.is_element()))
                .collect(),
            Step::Named {
                namespace,
                local_name,
            } => current
                .iter()
                .flat_map(|n| {
                    n.children()
                        .filter(|c| crate::find::is_named(*c, namespace, local_name))
                })
                .collect(),
        };
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<Result xmlns:b="urn:b"><b:NextRecord>40</b:NextRecord><b:Items><b:Item>1</b:Item><b:Item>2</b:Item></b:Items><plain>x</plain></Result>"#;

    fn table() -> NamespaceTable {
        NamespaceTable::ws_trust().with("b", "urn:b")
    }

    #[test]
    fn selects_child_paths() {
        let doc = roxmltree::Document::parse(XML).unwrap();
        let root = doc.root_element();
        let items = select(root, "b:Items/b:Item", &table()).unwrap();
        assert_eq!(items.iter().map(|n| n.text().unwrap()).collect::<Vec<_>>(), ["1", "2"]);
        assert_eq!(select(root, "./b:NextRecord", &table()).unwrap().len(), 1);
        assert_eq!(select(root, "*", &table()).unwrap().len(), 3);
        assert_eq!(select(root, "plain", &table()).unwrap().len(), 1);
        assert!(select(root, "b:Missing", &table()).unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_prefix_and_absolute_paths() {
        let doc = roxmltree::Document::parse(XML).unwrap();
        let root = doc.root_element();
        assert!(matches!(select(root, "q:Items", &table()), Err(Error::Namespace(_))));
        assert!(select(root, "//b:Item", &table()).is_err());
    }
}
