//! Retrievable-by-URI store of raw schema documents.
//!
//! The registry is filled once (`with_resource` + `crawl`) and then only read.
//! Crawling discovers resources embedded via `$id` and `$anchor` names, so the
//! loader can resolve `$ref`s to them without knowing where they live.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use crate::error::LoadError;
use crate::uri;

/// Keys whose values are data, not subschemas; never crawled.
const DATA_KEYWORDS: &[&str] = &["default", "const", "enum", "examples"];

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone)]
pub struct Resource {
    contents: Value,
    /// Resolved `$id`, if the document declares one.
    id: Option<String>,
}

#[derive(Debug, Clone)]
struct AnchorLocation {
    resource: String,
    pointer: String,
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    resources: HashMap<String, Resource>,
    /// (resource URI, anchor name) → location inside that resource.
    anchors: HashMap<(String, String), AnchorLocation>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Resource {
    pub fn from_contents(contents: Value) -> Self {
        let id = declared_id(&contents).map(|id| uri::defrag(id).0);
        Self { contents, id }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn contents(&self) -> &Value {
        &self.contents
    }

    /// Follow a JSON pointer from the resource root. Stepping onto a node
    /// that declares its own `$id` means the target belongs to another
    /// resource, which is rejected.
    pub fn pointer(&self, uri: &str, pointer: &str) -> Result<&Value, LoadError> {
        let mut current = &self.contents;
        if pointer.is_empty() {
            return Ok(current);
        }
        let Some(path) = pointer.strip_prefix('/') else {
            return Err(LoadError::PointerToNowhere { uri: uri.to_owned(), pointer: pointer.to_owned() });
        };
        for raw in path.split('/') {
            let segment = raw.replace("~1", "/").replace("~0", "~");
            let next = match current {
                Value::Object(map) => map.get(&segment),
                Value::Array(xs) => segment.parse::<usize>().ok().and_then(|i| xs.get(i)),
                _ => None,
            };
            current = next.ok_or_else(|| LoadError::PointerToNowhere {
                uri: uri.to_owned(),
                pointer: pointer.to_owned(),
            })?;
            if declared_id(current).is_some() {
                return Err(LoadError::MalformedReference {
                    uri: uri.to_owned(),
                    fragment: pointer.to_owned(),
                    reason: "accessing sub-resources via pointers from base resource is not supported; \
                             use resource URI instead"
                        .to_owned(),
                });
            }
        }
        Ok(current)
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, uri: impl Into<String>, contents: Value) -> Self {
        self.resources.insert(uri.into(), Resource::from_contents(contents));
        self
    }

    /// Read a JSON document from `path` and register it under `uri`.
    pub fn with_json_file(self, uri: impl Into<String>, path: &Path) -> Result<Self, LoadError> {
        Ok(self.with_resource(uri, read_json(path)?))
    }

    /// Register embedded `$id` resources and `$anchor`s of every document.
    pub fn crawl(mut self) -> Self {
        let roots: Vec<(String, Resource)> = self
            .resources
            .iter()
            .map(|(uri, resource)| (uri.clone(), resource.clone()))
            .collect();
        for (uri, resource) in roots {
            let Some(declared) = resource.id() else {
                self.crawl_value(&resource.contents, &uri, String::new(), true);
                continue;
            };
            let base = uri::join(&uri, declared);
            if let Some(existing) = self.resources.get_mut(&uri) {
                existing.id = Some(base.clone());
            }
            if !self.resources.contains_key(&base) {
                tracing::debug!(%base, "registering resource under its declared id");
                self.resources.insert(
                    base.clone(),
                    Resource { contents: resource.contents.clone(), id: Some(base.clone()) },
                );
            }
            self.crawl_value(&resource.contents, &base, String::new(), true);
        }
        self
    }

    fn crawl_value(&mut self, value: &Value, base: &str, pointer: String, is_root: bool) {
        match value {
            Value::Object(map) => {
                let (base, pointer) = match declared_id(value) {
                    Some(id) if !is_root => {
                        let resolved = uri::defrag(&uri::join(base, id)).0;
                        tracing::debug!(%resolved, "found embedded resource");
                        self.resources.insert(
                            resolved.clone(),
                            Resource { contents: value.clone(), id: Some(resolved.clone()) },
                        );
                        (resolved, String::new())
                    }
                    _ => (base.to_owned(), pointer),
                };
                if let Some(anchor) = map.get("$anchor").and_then(Value::as_str) {
                    self.anchors.insert(
                        (base.clone(), anchor.to_owned()),
                        AnchorLocation { resource: base.clone(), pointer: pointer.clone() },
                    );
                }
                for (key, child) in map {
                    if DATA_KEYWORDS.contains(&key.as_str()) {
                        continue;
                    }
                    let escaped = key.replace('~', "~0").replace('/', "~1");
                    self.crawl_value(child, &base, format!("{pointer}/{escaped}"), false);
                }
            }
            Value::Array(xs) => {
                for (i, child) in xs.iter().enumerate() {
                    self.crawl_value(child, base, format!("{pointer}/{i}"), false);
                }
            }
            _ => {}
        }
    }

    pub fn get(&self, uri: &str) -> Result<&Resource, LoadError> {
        self.resources
            .get(uri)
            .ok_or_else(|| LoadError::Unretrievable { uri: uri.to_owned() })
    }

    /// Look up `name` among the anchors declared in resource `uri`.
    pub fn anchor(&self, uri: &str, name: &str) -> Result<&Value, LoadError> {
        if let Some(location) = self.anchors.get(&(uri.to_owned(), name.to_owned())) {
            return self.get(&location.resource)?.pointer(&location.resource, &location.pointer);
        }
        if let Some(((other, _), _)) = self.anchors.iter().find(|((_, anchor), _)| anchor == name) {
            return Err(LoadError::MalformedReference {
                uri: uri.to_owned(),
                fragment: name.to_owned(),
                reason: format!("anchor is declared in resource `{other}`; reference it through that URI"),
            });
        }
        Err(LoadError::NoSuchAnchor { uri: uri.to_owned(), anchor: name.to_owned() })
    }
}

/// Read the schema file at `path`, register it under `root_name` and crawl.
pub fn load_jsons(path: &Path, root_name: &str) -> Result<Registry, LoadError> {
    Ok(Registry::new().with_json_file(root_name, path)?.crawl())
}

fn read_json(path: &Path) -> Result<Value, LoadError> {
    let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| LoadError::Json {
        path: path.to_owned(),
        source,
    })
}

fn declared_id(value: &Value) -> Option<&str> {
    value.get("$id").and_then(Value::as_str).filter(|id| !id.starts_with('#'))
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
