//! Schema → type model compiler.
//!
//! A [`Loader`] is one documentation build's worth of state: the registry it
//! reads from, the stack of base URIs used to resolve relative `$ref`s, the
//! cache of compiled nodes and how often each id was referenced. Loading is
//! eager and depth-first; the first unrecoverable error aborts the load.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::LoadError;
use crate::ir::Ty;
use crate::registry::Registry;
use crate::uri;

// ------------------------------- Policy ---------------------------------- //

/// Extension keyword marking a property as a user-level setting. Any value
/// other than `false` marks it, including an override schema object.
pub const DEFAULT_USER_SETTING_KEYWORD: &str = "x-vscode-setting";

// ------------------------------- State ----------------------------------- //

#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub user_setting_keyword: String,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self { user_setting_keyword: DEFAULT_USER_SETTING_KEYWORD.to_owned() }
    }
}

#[derive(Debug)]
pub struct Loader {
    registry: Rc<Registry>,
    options: LoaderOptions,
    base_uris: Vec<String>,
    cache: BTreeMap<String, Rc<Ty>>,
    ref_count: HashMap<String, usize>,
    /// Ids whose compilation has started but not finished.
    in_progress: HashSet<String>,
    /// Ids that were re-entered while in progress.
    recursive: HashSet<String>,
}

/// Keeps a base URI pushed for as long as it lives.
struct BaseUriScope<'a> {
    loader: &'a mut Loader,
}

impl Deref for BaseUriScope<'_> {
    type Target = Loader;
    fn deref(&self) -> &Loader {
        self.loader
    }
}

impl DerefMut for BaseUriScope<'_> {
    fn deref_mut(&mut self) -> &mut Loader {
        self.loader
    }
}

impl Drop for BaseUriScope<'_> {
    fn drop(&mut self) {
        self.loader.base_uris.pop();
    }
}

// ------------------------------ Front API -------------------------------- //

impl Loader {
    pub fn new(registry: Registry) -> Self {
        Self::with_options(registry, LoaderOptions::default())
    }

    pub fn with_options(registry: Registry, options: LoaderOptions) -> Self {
        Self {
            registry: Rc::new(registry),
            options,
            base_uris: Vec::new(),
            cache: BTreeMap::new(),
            ref_count: HashMap::new(),
            in_progress: HashSet::new(),
            recursive: HashSet::new(),
        }
    }

    /// Compile (or fetch from cache) the node behind `uri`.
    ///
    /// `uri` is either a bare fragment (`#/$defs/Foo`, `#anchor`), resolved
    /// against the resource currently being compiled, or a URI reference
    /// joined onto it. The returned node's `id` is the canonical
    /// `resource#fragment` form.
    pub fn load(&mut self, uri: &str) -> Result<Rc<Ty>, LoadError> {
        let (base, fragment) = match uri.strip_prefix('#') {
            Some(fragment) => (self.base_uri().to_owned(), fragment.to_owned()),
            None => uri::defrag(&uri::join(self.base_uri(), uri)),
        };

        let registry = Rc::clone(&self.registry);
        let resource = registry.get(&base)?;
        let resource_uri = resource.id().unwrap_or(&base).to_owned();
        let id = if fragment.is_empty() {
            resource_uri.clone()
        } else {
            format!("{resource_uri}#{fragment}")
        };

        if let Some(ty) = self.cache.get(&id) {
            tracing::trace!(%id, "cache hit");
            return Ok(Rc::clone(ty));
        }
        if self.in_progress.contains(&id) {
            tracing::debug!(%id, "recursive reference; using a forward placeholder");
            self.recursive.insert(id.clone());
            return Ok(Rc::new(Ty::any().with_id(id)));
        }
        self.ref_count.entry(id.clone()).or_insert(0);

        let contents = if fragment.starts_with('/') {
            resource.pointer(&resource_uri, &fragment)?
        } else if !fragment.is_empty() {
            registry.anchor(&resource_uri, &fragment)?
        } else {
            resource.contents()
        };

        tracing::debug!(%id, "compiling schema node");
        self.in_progress.insert(id.clone());
        let compiled = self.enter_resource(resource_uri).compile(contents);
        self.in_progress.remove(&id);

        let ty = Rc::new(compiled?.with_id(id.clone()));
        self.cache.insert(id, Rc::clone(&ty));
        Ok(ty)
    }

    /// Already-compiled node for `id`, without compiling anything.
    pub fn get(&self, id: &str) -> Option<&Ty> {
        self.cache.get(id).map(Rc::as_ref)
    }

    /// Whether the node behind `id` may be expanded at its use sites.
    ///
    /// Anonymous nodes always can. Named ones only when referenced at most
    /// once, not part of a reference cycle, and inlinable themselves. Ids
    /// that were never loaded are reported as not inlinable.
    pub fn can_inline(&self, id: &str) -> bool {
        if id.is_empty() {
            return true;
        }
        if self.recursive.contains(id) {
            return false;
        }
        match self.cache.get(id) {
            Some(ty) => self.ref_count(id) <= 1 && ty.can_inline(),
            None => {
                tracing::debug!(%id, "inlining query for an id that was never loaded");
                false
            }
        }
    }

    /// Number of `$ref` sites that pointed at `id` so far.
    pub fn ref_count(&self, id: &str) -> usize {
        self.ref_count.get(id).copied().unwrap_or(0)
    }

    /// Every compiled node, sorted by id.
    pub fn get_all_loaded(&self) -> Vec<(String, Rc<Ty>)> {
        self.cache
            .iter()
            .map(|(id, ty)| (id.clone(), Rc::clone(ty)))
            .collect()
    }

    /// Leaf carrying `value` as its constant (`null` becomes a bare `Null`).
    pub fn load_const(value: &Value) -> Ty {
        let leaf = match value {
            Value::Null => return Ty::null(),
            Value::Bool(_) => Ty::boolean(),
            Value::Number(n) if n.is_i64() || n.is_u64() => Ty::integer(),
            Value::Number(_) => Ty::number(),
            Value::String(_) => Ty::string(),
            Value::Array(_) | Value::Object(_) => Ty::any(),
        };
        leaf.with_const(Some(value.clone()))
    }
}

// ----------------------------- Compilation ------------------------------- //

impl Loader {
    fn base_uri(&self) -> &str {
        self.base_uris.last().map(String::as_str).unwrap_or("")
    }

    fn enter_resource(&mut self, uri: String) -> BaseUriScope<'_> {
        self.base_uris.push(uri);
        BaseUriScope { loader: self }
    }

    fn compile(&mut self, root: &Value) -> Result<Ty, LoadError> {
        let Some(obj) = root.as_object() else {
            return Ok(Ty::any());
        };

        // 1) References: the use site keeps its own metadata.
        if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
            let target = self.load(reference)?;
            let id = if target.meta.id.is_empty() {
                reference.to_owned()
            } else {
                target.meta.id.clone()
            };
            *self.ref_count.entry(id.clone()).or_insert(0) += 1;
            tracing::trace!(%id, count = self.ref_count(&id), "reference counted");
            let (user, project) = if self.in_progress.contains(&id) {
                (false, false)
            } else {
                (target.meta.has_user_settings, target.meta.has_project_settings)
            };
            return Ok(attach_meta(Ty::reference(id), obj).with_scope(user, project));
        }

        // 2) One leaf per declared primitive type.
        let declared: Vec<&Value> = match obj.get("type") {
            None => Vec::new(),
            Some(Value::Array(xs)) => xs.iter().collect(),
            Some(other) => vec![other],
        };

        let mut arms = Vec::<Ty>::new();
        for ty in declared {
            match ty {
                Value::String(name) => match name.as_str() {
                    "array" => {
                        let item = match obj.get("items") {
                            Some(items) => self.compile(items)?,
                            None => Ty::any(),
                        };
                        if let Some(prefix) = obj.get("prefixItems") {
                            // A tuple cannot also be anything else.
                            let tuple = self.compile_tuple(obj, prefix, item)?;
                            return Ok(attach_meta(tuple, obj).propagate_scope());
                        }
                        if obj.get("uniqueItems").and_then(Value::as_bool).unwrap_or(false) {
                            arms.push(Ty::set(item));
                        } else {
                            arms.push(Ty::array(item));
                        }
                    }
                    "object" => arms.push(self.compile_object(obj)?),
                    "null" => arms.push(Ty::null()),
                    "boolean" => arms.push(Ty::boolean()),
                    "integer" => arms.push(Ty::integer()),
                    "number" => arms.push(Ty::number()),
                    "string" => arms.push(Ty::string()),
                    other => tracing::debug!(keyword = other, "ignoring unknown type keyword"),
                },
                Value::Bool(true) => arms.push(Ty::any()),
                _ => {}
            }
        }

        // 3) Unions and enums.
        for key in ["anyOf", "oneOf"] {
            if let Some(members) = obj.get(key).and_then(Value::as_array) {
                for member in members {
                    arms.push(self.compile(member)?);
                }
            }
        }
        if let Some(values) = obj.get("enum").and_then(Value::as_array) {
            arms.extend(values.iter().map(Self::load_const));
        }

        // 4) Intersections.
        let mut candidates = Vec::<Ty>::new();
        if !arms.is_empty() {
            candidates.push(Ty::one_of(arms));
        }
        if let Some(members) = obj.get("allOf").and_then(Value::as_array) {
            for member in members {
                candidates.push(self.compile(member)?);
            }
        }

        let result = if candidates.is_empty() {
            Ty::any()
        } else {
            Ty::all_of(candidates)
        };
        Ok(attach_meta(result, obj).propagate_scope())
    }

    fn compile_tuple(&mut self, obj: &Map<String, Value>, prefix: &Value, item: Ty) -> Result<Ty, LoadError> {
        let mut items = Vec::new();
        for schema in prefix.as_array().map(Vec::as_slice).unwrap_or_default() {
            items.push(self.compile(schema)?);
        }
        let capped = obj
            .get("maxItems")
            .and_then(Value::as_u64)
            .is_some_and(|max| max <= items.len() as u64);
        let tail = if capped { None } else { Some(item) };
        Ok(Ty::tuple(items, tail))
    }

    fn compile_object(&mut self, root: &Map<String, Value>) -> Result<Ty, LoadError> {
        let keyword = self.options.user_setting_keyword.clone();
        let defaults = root.get("default").and_then(Value::as_object);
        let required: HashSet<&str> = root
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut named_children = IndexMap::new();
        if let Some(properties) = root.get("properties").and_then(Value::as_object) {
            for (name, data) in properties {
                let child = self.compile(data)?;
                let default = match defaults.and_then(|d| d.get(name)) {
                    Some(value) => Some(value.clone()),
                    None => child.meta.default.clone(),
                };
                let marked = !matches!(data.get(&keyword), None | Some(Value::Bool(false)));
                let (user, project) = if marked {
                    (true, false)
                } else {
                    (child.meta.has_user_settings, child.meta.has_project_settings)
                };
                // Unscoped settings are project settings.
                let project = project || !user;
                let child = child
                    .with_default(default)
                    .with_required(required.contains(name.as_str()))
                    .with_scope(user, project);
                named_children.insert(name.clone(), child);
            }
        }

        let properties = match root.get("additionalProperties") {
            None | Some(Value::Bool(false)) => None,
            Some(schema) => Some(self.compile(schema)?),
        };

        Ok(Ty::object(named_children, properties).propagate_scope())
    }
}

/// Overlay the presentational keywords present in `root`.
fn attach_meta(mut ty: Ty, root: &Map<String, Value>) -> Ty {
    if let Some(title) = root.get("title").and_then(Value::as_str) {
        ty = ty.with_title(Some(title.to_owned()));
    }
    if let Some(description) = root.get("description").and_then(Value::as_str) {
        ty = ty.with_description(Some(description.to_owned()));
    }
    if let Some(deprecated) = root.get("deprecated").and_then(Value::as_bool) {
        ty = ty.with_deprecated(deprecated);
    }
    if let Some(default) = root.get("default") {
        ty = ty.with_default(Some(default.clone()));
    }
    if let Some(value) = root.get("const") {
        ty = ty.with_const(Some(value.clone()));
    }
    ty
}

// ------------------------------- Tests ------------------------------------ //
