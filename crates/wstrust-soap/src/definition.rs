#![forbid(unsafe_code)]

//! Static description of one SOAP service: URIs, namespaces, parameter
//! mapping and result extraction tables.

use std::collections::HashMap;

use wstrust_core::Error;
use wstrust_xml::NamespaceTable;

/// Element name of integer items inside array parameters.
pub const DEFAULT_ITEM_ELEMENT: &str = "int";

/// Namespaces and tables of a service.  Build with [`ServiceDefinition::builder`].
#[derive(Debug, Clone)]
pub struct ServiceDefinition {
    name: String,
    cache_id: String,
    action_base: String,
    body_namespace: String,
    result_namespace: String,
    namespaces: NamespaceTable,
    request_prefixes: Vec<String>,
    default_param_namespace: (String, String),
    param_namespaces: HashMap<String, (String, String)>,
    item_element: String,
    array_markers: Vec<String>,
    result_paths: HashMap<String, Vec<(String, String)>>,
    not_found_tags: Vec<String>,
}

impl ServiceDefinition {
    /// `name` names the service in faults and logs; `action_base` is
    /// prefixed to the action for `a:Action`; `body_namespace` holds the
    /// operation element and, unless overridden, the `{Action}Result`.
    pub fn builder(
        name: impl Into<String>,
        action_base: impl Into<String>,
        body_namespace: impl Into<String>,
    ) -> ServiceDefinitionBuilder {
        ServiceDefinitionBuilder::new(name.into(), action_base.into(), body_namespace.into())
    }

    /// The GIPOD work-order service.
    pub fn gipod() -> Result<Self, Error> {
        Self::builder(
            "GipodService",
            "http://www.agiv.be/Gipod/2010/06/service/IGipodService/",
            "http://www.agiv.be/Gipod/2010/06/service",
        )
        .cache_id("gipod")
        .namespace("b", "http://www.agiv.be/Gipod/2010/06")
        .request_prefixes(["b", "i"])
        .default_param_namespace("b", "b")
        .param_namespace("WerkopdrachtStatusIds", "b", "c")
        .param_namespace("StatusIds", "b", "c")
        .array_marker("EnumeratieElement")
        .result_path("GetListLocatieHinder", "data", "b:HinderLocatieElementen/b:EnumeratieElement")
        .result_path("ListHinder", "nextRecord", "b:NextRecord")
        .result_path("ListHinder", "data", "b:InnameHinder/b:InnameHinderItem")
        .build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Token cache id used for this service.
    pub fn cache_id(&self) -> &str {
        &self.cache_id
    }

    pub fn action_uri(&self, action: &str) -> String {
        format!("{}{action}", self.action_base)
    }

    pub fn body_namespace(&self) -> &str {
        &self.body_namespace
    }

    pub fn result_namespace(&self) -> &str {
        &self.result_namespace
    }

    /// The WS-* table extended with this service's prefixes.
    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    /// Prefixes declared on the `request` element.
    pub fn request_prefixes(&self) -> &[String] {
        &self.request_prefixes
    }

    /// `(element prefix, item prefix)` for parameter `name`.
    pub fn param_namespace(&self, name: &str) -> (&str, &str) {
        let (outer, inner) = self
            .param_namespaces
            .get(name)
            .unwrap_or(&self.default_param_namespace);
        (outer.as_str(), inner.as_str())
    }

    pub fn item_element(&self) -> &str {
        &self.item_element
    }

    /// Whether elements named `local_name` always flatten into an array.
    pub fn is_array_marker(&self, local_name: &str) -> bool {
        self.array_markers.iter().any(|m| m == local_name)
    }

    /// `(output key, path)` pairs registered for `action`.
    pub fn result_paths(&self, action: &str) -> Option<&[(String, String)]> {
        self.result_paths.get(action).map(Vec::as_slice)
    }

    /// Whether a fault with this tag must not be retried.
    pub fn is_not_found(&self, tag: Option<&str>) -> bool {
        tag.is_some_and(|t| self.not_found_tags.iter().any(|n| n == t))
    }
}

#[derive(Debug, Clone)]
pub struct ServiceDefinitionBuilder {
    definition: ServiceDefinition,
}

impl ServiceDefinitionBuilder {
    fn new(name: String, action_base: String, body_namespace: String) -> Self {
        Self {
            definition: ServiceDefinition {
                cache_id: name.clone(),
                name,
                action_base,
                result_namespace: body_namespace.clone(),
                body_namespace,
                namespaces: NamespaceTable::ws_trust(),
                request_prefixes: vec!["i".to_owned()],
                default_param_namespace: (String::new(), String::new()),
                param_namespaces: HashMap::new(),
                item_element: DEFAULT_ITEM_ELEMENT.to_owned(),
                array_markers: Vec::new(),
                result_paths: HashMap::new(),
                not_found_tags: Vec::new(),
            },
        }
    }

    pub fn cache_id(mut self, id: impl Into<String>) -> Self {
        self.definition.cache_id = id.into();
        self
    }

    pub fn result_namespace(mut self, uri: impl Into<String>) -> Self {
        self.definition.result_namespace = uri.into();
        self
    }

    /// Register an extra namespace prefix.
    pub fn namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.definition.namespaces.insert(prefix, uri);
        self
    }

    pub fn request_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.definition.request_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_param_namespace(mut self, outer: impl Into<String>, inner: impl Into<String>) -> Self {
        self.definition.default_param_namespace = (outer.into(), inner.into());
        self
    }

    pub fn param_namespace(
        mut self,
        name: impl Into<String>,
        outer: impl Into<String>,
        inner: impl Into<String>,
    ) -> Self {
        self.definition
            .param_namespaces
            .insert(name.into(), (outer.into(), inner.into()));
        self
    }

    pub fn item_element(mut self, name: impl Into<String>) -> Self {
        self.definition.item_element = name.into();
        self
    }

    pub fn array_marker(mut self, local_name: impl Into<String>) -> Self {
        self.definition.array_markers.push(local_name.into());
        self
    }

    /// Extract `path` (relative to `{action}Result`) into output `key`.
    pub fn result_path(
        mut self,
        action: impl Into<String>,
        key: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        self.definition
            .result_paths
            .entry(action.into())
            .or_default()
            .push((key.into(), path.into()));
        self
    }

    /// Fault tags meaning "no such record", never retried.
    pub fn not_found_tag(mut self, tag: impl Into<String>) -> Self {
        self.definition.not_found_tags.push(tag.into());
        self
    }

    /// Check that every prefix the tables use is known.
    pub fn build(self) -> Result<ServiceDefinition, Error> {
        let def = self.definition;
        let mut invalid = Vec::new();
        let mut check = |what: &str, prefix: &str| {
            if prefix.is_empty() || !def.namespaces.contains(prefix) {
                invalid.push(format!("{what}: unknown namespace prefix {prefix:?}"));
            }
        };

        for prefix in &def.request_prefixes {
            check("request", prefix);
        }
        check("default parameter", &def.default_param_namespace.0);
        check("default parameter item", &def.default_param_namespace.1);
        for (name, (outer, inner)) in &def.param_namespaces {
            check(name, outer);
            check(name, inner);
        }

        if invalid.is_empty() {
            Ok(def)
        } else {
            invalid.sort();
            Err(Error::Configuration {
                missing: Vec::new(),
                unknown: Vec::new(),
                invalid,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gipod_tables() {
        let def = ServiceDefinition::gipod().unwrap();
        assert_eq!(
            def.action_uri("ListHinder"),
            "http://www.agiv.be/Gipod/2010/06/service/IGipodService/ListHinder"
        );
        assert_eq!(def.param_namespace("StatusIds"), ("b", "c"));
        assert_eq!(def.param_namespace("Gemeente"), ("b", "b"));
        assert!(def.is_array_marker("EnumeratieElement"));
        let paths = def.result_paths("ListHinder").unwrap();
        assert_eq!(paths[0], ("nextRecord".to_owned(), "b:NextRecord".to_owned()));
        assert!(def.result_paths("GetWerkopdracht").is_none());
        assert_eq!(def.cache_id(), "gipod");
        assert!(!def.is_not_found(None));
    }

    #[test]
    fn unknown_prefixes_are_rejected() {
        let err = ServiceDefinition::builder("svc", "urn:svc/", "urn:svc")
            .default_param_namespace("x", "i")
            .param_namespace("Ids", "i", "y")
            .build()
            .unwrap_err();
        let Error::Configuration { invalid, .. } = err else {
            panic!("expected configuration error");
        };
        assert_eq!(invalid.len(), 2);
        assert!(invalid.iter().any(|m| m.contains("\"x\"")));
        assert!(invalid.iter().any(|m| m.contains("\"y\"")));
    }

    #[test]
    fn not_found_allowlist() {
        let def = ServiceDefinition::builder("svc", "urn:svc/", "urn:svc")
            .default_param_namespace("i", "i")
            .not_found_tag("NotFound")
            .build()
            .unwrap();
        assert!(def.is_not_found(Some("NotFound")));
        assert!(!def.is_not_found(Some("Expired")));
    }
}
