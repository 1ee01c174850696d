#![forbid(unsafe_code)]

//! Turning `{Action}Result` elements into JSON values.

use serde_json::{Map, Value};
use wstrust_core::Error;
use wstrust_xml::{find, xpath};

use crate::definition::ServiceDefinition;

/// Outcome of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutput {
    Structured(Value),
    /// The response had no `{Action}Result`; the full response text.
    Raw(String),
}

impl CallOutput {
    pub fn structured(&self) -> Option<&Value> {
        match self {
            CallOutput::Structured(value) => Some(value),
            CallOutput::Raw(_) => None,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, CallOutput::Raw(_))
    }
}

/// Extract the result of `action` from a fault-free response.
///
/// With registered result paths (and `bypass_paths` unset) every path is
/// evaluated against the result element and its matches flattened into an
/// array under the path's key; keys without matches are left out.
/// Otherwise the whole result element is flattened.
pub fn process_output(
    response: &str,
    action: &str,
    definition: &ServiceDefinition,
    bypass_paths: bool,
) -> Result<CallOutput, Error> {
    let doc = wstrust_xml::parse(response)?;
    let result_name = format!("{action}Result");
    let Some(result) = find::find_element(doc.root(), definition.result_namespace(), &result_name) else {
        return Ok(CallOutput::Raw(response.to_owned()));
    };

    match definition.result_paths(action) {
        Some(paths) if !bypass_paths => {
            let mut output = Map::new();
            for (key, path) in paths {
                let matches = xpath::select(result, path, definition.namespaces())?;
                if !matches.is_empty() {
                    let values = matches.into_iter().map(|n| flatten(n, definition)).collect();
                    output.insert(key.clone(), Value::Array(values));
                }
            }
            Ok(CallOutput::Structured(Value::Object(output)))
        }
        _ => Ok(CallOutput::Structured(flatten(result, definition))),
    }
}

/// Element children become object members; a leaf becomes its text.
///
/// A name seen twice turns into an array at its second occurrence; array
/// marker names are arrays from the first.
pub fn flatten(node: roxmltree::Node<'_, '_>, definition: &ServiceDefinition) -> Value {
    let mut children = node.children().filter(|n| n.is_element()).peekable();
    if children.peek().is_none() {
        return Value::String(find::text_content(node));
    }

    let mut output = Map::new();
    for child in children {
        let name = child.tag_name().name();
        let value = flatten(child, definition);
        if definition.is_array_marker(name) {
            if let Value::Array(items) = output
                .entry(name)
                .or_insert_with(|| Value::Array(Vec::new()))
            {
                items.push(value);
            }
            continue;
        }
        // Leaves and objects are never arrays, so an array here means the
        // name was already repeated.
        match output.get_mut(name) {
            None => {
                output.insert(name.to_owned(), value);
            }
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => *existing = Value::Array(vec![existing.take(), value]),
        }
    }
    Value::Object(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definition() -> ServiceDefinition {
        ServiceDefinition::gipod().unwrap()
    }

    fn wrap(action: &str, inner: &str) -> String {
        format!(
            r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"><s:Body><{action}Response xmlns="http://www.agiv.be/Gipod/2010/06/service"><{action}Result xmlns:b="http://www.agiv.be/Gipod/2010/06">{inner}</{action}Result></{action}Response></s:Body></s:Envelope>"#
        )
    }

    #[test]
    fn markers_always_collect() {
        let xml = wrap(
            "GetLijst",
            "<b:EnumeratieElement><b:Id>1</b:Id></b:EnumeratieElement><b:Totaal>3</b:Totaal><b:EnumeratieElement><b:Id>2</b:Id></b:EnumeratieElement><b:EnumeratieElement><b:Id>3</b:Id></b:EnumeratieElement>",
        );
        let output = process_output(&xml, "GetLijst", &definition(), false).unwrap();
        assert_eq!(
            output,
            CallOutput::Structured(json!({
                "EnumeratieElement": [{"Id": "1"}, {"Id": "2"}, {"Id": "3"}],
                "Totaal": "3"
            }))
        );

        let single = wrap("GetLijst", "<b:EnumeratieElement>x</b:EnumeratieElement>");
        let output = process_output(&single, "GetLijst", &definition(), false).unwrap();
        assert_eq!(output, CallOutput::Structured(json!({"EnumeratieElement": ["x"]})));
    }

    #[test]
    fn repeated_names_become_arrays() {
        let xml = wrap(
            "GetWerkopdracht",
            "<b:Naam>a</b:Naam><b:Item>1</b:Item><b:Item>2</b:Item><b:Item>3</b:Item><b:Leeg/>",
        );
        let output = process_output(&xml, "GetWerkopdracht", &definition(), false).unwrap();
        assert_eq!(
            output.structured(),
            Some(&json!({"Naam": "a", "Item": ["1", "2", "3"], "Leeg": ""}))
        );
    }

    #[test]
    fn result_paths_extract_matches() {
        let xml = wrap(
            "ListHinder",
            "<b:NextRecord>40</b:NextRecord><b:InnameHinder><b:InnameHinderItem><b:Id>7</b:Id></b:InnameHinderItem><b:InnameHinderItem><b:Id>8</b:Id></b:InnameHinderItem></b:InnameHinder>",
        );
        let output = process_output(&xml, "ListHinder", &definition(), false).unwrap();
        assert_eq!(
            output.structured(),
            Some(&json!({"nextRecord": ["40"], "data": [{"Id": "7"}, {"Id": "8"}]}))
        );

        let bypassed = process_output(&xml, "ListHinder", &definition(), true).unwrap();
        assert_eq!(bypassed.structured().unwrap()["NextRecord"], json!("40"));
    }

    #[test]
    fn paths_without_matches_are_omitted() {
        let xml = wrap("ListHinder", "<b:NextRecord>0</b:NextRecord>");
        let output = process_output(&xml, "ListHinder", &definition(), false).unwrap();
        assert_eq!(output.structured(), Some(&json!({"nextRecord": ["0"]})));
    }

    #[test]
    fn missing_result_is_raw() {
        let xml = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"><s:Body><Other/></s:Body></s:Envelope>"#;
        let output = process_output(xml, "ListHinder", &definition(), false).unwrap();
        assert_eq!(output, CallOutput::Raw(xml.to_owned()));
        assert!(output.is_raw());
    }
}
