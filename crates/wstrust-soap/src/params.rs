#![forbid(unsafe_code)]

//! Mapping of call parameters onto the `request` element.
//!
//! Scalars become `{p}:{name}` elements.  Arrays and objects become a
//! `{p}:{name}` wrapper holding one element per item: list items are named
//! by type (`int`, `string`, `boolean`, `double` in the item namespace),
//! object entries by their key.  Empty values carry `i:nil="true"`.

use serde_json::{Map, Value};
use wstrust_core::Error;
use wstrust_xml::{Document, ElementSpec, NodeId, XmlBuilder};

use crate::definition::ServiceDefinition;

/// Append the `request` element (when `params` is non-empty) to `operation`.
pub fn append_parameters(
    builder: &XmlBuilder,
    doc: &mut Document,
    operation: NodeId,
    definition: &ServiceDefinition,
    params: &Map<String, Value>,
) -> Result<(), Error> {
    if params.is_empty() {
        return Ok(());
    }

    let mut spec = ElementSpec::new(definition.body_namespace(), "request");
    for prefix in definition.request_prefixes() {
        spec = spec.declare(prefix);
    }
    let request = builder.append(doc, operation, spec)?;

    for (name, value) in params {
        let (outer, inner) = definition.param_namespace(name);
        let qname = format!("{outer}:{name}");
        match value {
            Value::Array(_) | Value::Object(_) => {
                let mut spec = ElementSpec::new(outer, &qname);
                if !definition.request_prefixes().iter().any(|p| p == inner) {
                    spec = spec.declare(inner);
                }
                if is_empty(value) {
                    spec = spec.ns_attr("i:nil", "true");
                }
                let wrapper = builder.append(doc, request, spec)?;
                append_items(builder, doc, wrapper, definition, name, inner, value)?;
            }
            scalar => {
                append_scalar(builder, doc, request, outer, &qname, scalar)?;
            }
        }
    }
    Ok(())
}

fn append_items(
    builder: &XmlBuilder,
    doc: &mut Document,
    wrapper: NodeId,
    definition: &ServiceDefinition,
    name: &str,
    prefix: &str,
    value: &Value,
) -> Result<(), Error> {
    match value {
        Value::Array(items) => {
            for item in items {
                let qname = format!("{prefix}:{}", item_name(definition, name, item)?);
                append_scalar(builder, doc, wrapper, prefix, &qname, item)?;
            }
        }
        Value::Object(entries) => {
            for (key, item) in entries {
                if item.is_array() || item.is_object() {
                    return Err(Error::InvalidParameter(format!(
                        "{name}.{key}: nested containers are not supported"
                    )));
                }
                let qname = if key.contains(':') {
                    key.clone()
                } else {
                    format!("{prefix}:{key}")
                };
                let namespace = qname.split_once(':').map_or(prefix, |(p, _)| p);
                append_scalar(builder, doc, wrapper, namespace, &qname, item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn item_name<'d>(definition: &'d ServiceDefinition, name: &str, item: &Value) -> Result<&'d str, Error> {
    match item {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(definition.item_element()),
        Value::Number(_) => Ok("double"),
        Value::String(_) => Ok("string"),
        Value::Bool(_) => Ok("boolean"),
        Value::Null => Ok(definition.item_element()),
        Value::Array(_) | Value::Object(_) => Err(Error::InvalidParameter(format!(
            "{name}: nested containers are not supported"
        ))),
    }
}

fn append_scalar(
    builder: &XmlBuilder,
    doc: &mut Document,
    parent: NodeId,
    namespace: &str,
    qname: &str,
    value: &Value,
) -> Result<NodeId, Error> {
    let text = scalar_text(value);
    let mut spec = ElementSpec::new(namespace, qname).text_opt(text.as_deref());
    if is_empty(value) {
        spec = spec.ns_attr("i:nil", "true");
    }
    builder.append(doc, parent, spec)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// `null`, `""`, `[]` and `{}`; `0` and `false` are values.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) | Value::Bool(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wstrust_xml::writer::node_to_xml;

    fn render(params: Value) -> Result<String, Error> {
        let definition = ServiceDefinition::gipod().unwrap();
        let builder = XmlBuilder::new(definition.namespaces().clone());
        let mut doc = Document::new();
        let root = doc.root();
        let operation = builder.append(
            &mut doc,
            root,
            ElementSpec::new(definition.body_namespace(), "ListHinder"),
        )?;
        let Value::Object(params) = params else {
            panic!("params must be an object");
        };
        append_parameters(&builder, &mut doc, operation, &definition, &params)?;
        Ok(node_to_xml(&doc, operation))
    }

    #[test]
    fn no_parameters_no_request() {
        assert_eq!(
            render(json!({})).unwrap(),
            r#"<ListHinder xmlns="http://www.agiv.be/Gipod/2010/06/service"/>"#
        );
    }

    #[test]
    fn scalars_and_nil() {
        let xml = render(json!({"Gemeente": "Gent", "Postcode": "", "Limit": 0, "Actief": false})).unwrap();
        assert_eq!(
            xml,
            concat!(
                r#"<ListHinder xmlns="http://www.agiv.be/Gipod/2010/06/service">"#,
                r#"<request xmlns:b="http://www.agiv.be/Gipod/2010/06" xmlns:i="http://www.w3.org/2001/XMLSchema-instance">"#,
                r#"<b:Gemeente>Gent</b:Gemeente>"#,
                r#"<b:Postcode i:nil="true"/>"#,
                r#"<b:Limit>0</b:Limit>"#,
                r#"<b:Actief>false</b:Actief>"#,
                r#"</request></ListHinder>"#
            )
        );
    }

    #[test]
    fn arrays_use_item_namespace() {
        let xml = render(json!({"StatusIds": [1, 2], "Leeg": []})).unwrap();
        assert!(xml.contains(concat!(
            r#"<b:StatusIds xmlns:c="http://schemas.microsoft.com/2003/10/Serialization/Arrays">"#,
            r#"<c:int>1</c:int><c:int>2</c:int></b:StatusIds>"#
        )));
        assert!(xml.contains(r#"<b:Leeg i:nil="true"/>"#));
    }

    #[test]
    fn objects_use_keys() {
        let xml = render(json!({"Periode": {"Van": "2024-01-01", "Tot": null}})).unwrap();
        assert!(xml.contains(
            r#"<b:Periode><b:Van>2024-01-01</b:Van><b:Tot i:nil="true"/></b:Periode>"#
        ));
    }

    #[test]
    fn nested_containers_are_rejected() {
        assert!(matches!(
            render(json!({"StatusIds": [[1]]})),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            render(json!({"Periode": {"Van": {"Dag": 1}}})),
            Err(Error::InvalidParameter(_))
        ));
    }
}
