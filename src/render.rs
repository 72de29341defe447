//! Documentation walk over a compiled schema.
//!
//! [`AutoDoc`] decides *what* gets documented and in which order; a
//! [`DocSink`] decides what an entry looks like. The walk only ever talks to
//! the sink through nested `begin_entry`/`end_entry` pairs, so any output
//! format with a notion of nested named entries can sit behind it.

pub mod markdown;

use std::collections::HashSet;
use std::fmt;

use serde_json::{Map, Value};

use crate::error::LoadError;
use crate::ir::{Kind, Ty};
use crate::loader::Loader;

// ------------------------------- Policy ---------------------------------- //

/// Section collecting shared types that were not documented inline.
pub const CONFIG_TYPES_TITLE: &str = "Config types";

// ------------------------------- Types ----------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A named setting or type: `name: signature = default`.
    Object,
    /// One literal value of an enumeration.
    Property,
}

/// One documented entry. Its `Display` is the plain signature
/// `owner.name: type = default`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: EntryKind,
    /// Id of the root whose property this is, when the root is unwrapped.
    pub owner: Option<String>,
    /// Member name, literal value, or type id. May itself contain dots.
    pub name: String,
    /// Printed type, when shown inline.
    pub ty: Option<String>,
    /// Printed default value.
    pub default: Option<String>,
    pub required: bool,
    pub deprecated: bool,
}

/// Output side of the documentation walk.
pub trait DocSink {
    /// Open a (possibly nested) entry.
    fn begin_entry(&mut self, entry: &Entry);

    /// Free text belonging to the innermost open entry, or to the page when
    /// no entry is open.
    fn body(&mut self, text: &str);

    fn end_entry(&mut self);

    /// Start a top-level section.
    fn section(&mut self, title: &str);

    /// Anchor of a previously registered entry called `name`, looked up
    /// relative to `scope` first.
    fn resolve(&self, name: &str, scope: &str) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct AutoDocOptions {
    /// Document children of each entry, and every shared type afterwards.
    pub recursive: bool,
    /// List the root object's properties directly instead of nesting them.
    pub unwrap: bool,
    pub title: Option<String>,
    /// `URI` or `URI path` of entries to leave out.
    pub exclude: Vec<String>,
}

pub struct AutoDoc<'a, S: DocSink> {
    loader: &'a Loader,
    sink: &'a mut S,
    options: &'a AutoDocOptions,
    excludes: HashSet<(String, String)>,
    /// Ids that already have an entry.
    rendered: HashSet<String>,
}

// ------------------------------ Front API -------------------------------- //

impl Entry {
    pub fn new(kind: EntryKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            owner: None,
            name: name.into(),
            ty: None,
            default: None,
            required: false,
            deprecated: false,
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_ty(mut self, ty: impl Into<String>) -> Self {
        self.ty = Some(ty.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_flags(mut self, required: bool, deprecated: bool) -> Self {
        self.required = required;
        self.deprecated = deprecated;
        self
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(owner) = &self.owner {
            write!(f, "{owner}.")?;
        }
        f.write_str(&self.name)?;
        if let Some(ty) = &self.ty {
            write!(f, ": {ty}")?;
        }
        if let Some(default) = &self.default {
            write!(f, " = {default}")?;
        }
        Ok(())
    }
}

/// Load `uri` and document it into `sink`.
pub fn document<S: DocSink>(
    loader: &mut Loader,
    uri: &str,
    options: &AutoDocOptions,
    sink: &mut S,
) -> Result<(), LoadError> {
    let root = loader.load(uri)?;

    let mut excludes = HashSet::new();
    for exclude in &options.exclude {
        let mut parts = exclude.trim().splitn(2, char::is_whitespace);
        let Some(target) = parts.next().filter(|t| !t.is_empty()) else {
            continue;
        };
        let path = parts.next().map(str::trim).unwrap_or_default();
        let id = loader.load(target)?.meta.id.clone();
        excludes.insert((id, path.to_owned()));
    }

    AutoDoc {
        loader,
        sink,
        options,
        excludes,
        rendered: HashSet::new(),
    }
    .run(&root);
    Ok(())
}

impl<S: DocSink> AutoDoc<'_, S> {
    fn run(mut self, root: &Ty) {
        if let Some(title) = &self.options.title {
            self.sink.section(title);
        }
        self.render_root(root);

        if !self.options.recursive {
            return;
        }
        let mut opened = false;
        for (id, ty) in self.loader.get_all_loaded() {
            if self.rendered.contains(&id) || self.loader.can_inline(&id) {
                continue;
            }
            if self.excludes.contains(&(id.clone(), String::new())) {
                continue;
            }
            if !opened {
                self.sink.section(CONFIG_TYPES_TITLE);
                opened = true;
            }
            self.render_root(&ty);
        }
    }

    fn render_root(&mut self, root: &Ty) {
        if self.options.unwrap && root.named_children().is_some() {
            self.render_unwrapped(root);
        } else {
            let id = root.meta.id.clone();
            self.render_entry(Entry::new(EntryKind::Object, id.as_str()), root, &id, "");
        }
    }

    /// Root object's properties as top-level `<id>.<name>` entries.
    fn render_unwrapped(&mut self, root: &Ty) {
        if self.is_excluded(&root.meta.id, "") {
            return;
        }
        self.rendered.insert(root.meta.id.clone());
        if let Some(description) = &root.meta.description {
            self.sink.body(description);
        }

        let Some(children) = root.named_children() else {
            return;
        };
        let defaults = object_defaults(root);
        for (name, child) in children {
            let child = self.inline_reference(child, defaults.and_then(|d| d.get(name)));
            let entry = self.member_entry(name, &child).with_owner(root.meta.id.as_str());
            self.render_entry(entry, &child, &root.meta.id, name);
        }
    }

    fn render_entry(&mut self, entry: Entry, ty: &Ty, uri: &str, path: &str) {
        if self.is_excluded(uri, path) {
            tracing::debug!(%uri, %path, "excluded from documentation");
            return;
        }
        self.rendered.insert(ty.meta.id.clone());
        let entry = entry.with_flags(ty.meta.required, ty.meta.deprecated);
        self.sink.begin_entry(&entry);
        if let Some(description) = &ty.meta.description {
            self.sink.body(description);
        }
        if self.options.recursive {
            self.render_children(ty, uri, path);
        }
        self.sink.end_entry();
    }

    fn render_children(&mut self, ty: &Ty, uri: &str, path: &str) {
        let ty = ty.unwrap_optional();
        match &ty.kind {
            Kind::Object { named_children, .. } if !named_children.is_empty() => {
                let defaults = object_defaults(ty);
                for (name, child) in named_children {
                    let child = self.inline_reference(child, defaults.and_then(|d| d.get(name)));
                    self.render_child(name, &child, uri, path);
                }
            }
            Kind::Enum { items, .. } => {
                for item in items {
                    let name = item.print(Some(self.loader), false);
                    let path = join_path(path, &name);
                    self.render_entry(Entry::new(EntryKind::Property, name), item, uri, &path);
                }
            }
            _ => {
                let loader = self.loader;
                for reference in ty.find_refs() {
                    let Some(target) = reference.ref_target() else {
                        continue;
                    };
                    if !loader.can_inline(target) {
                        continue;
                    }
                    if let Some(resolved) = loader.get(target) {
                        self.render_children(resolved, uri, path);
                    }
                }
            }
        }
    }

    fn render_child(&mut self, name: &str, child: &Ty, uri: &str, path: &str) {
        let mut entry = self.member_entry(name, child);
        let leaf = child.unwrap_optional().named_children().is_none();
        if leaf && entry.default.is_none() && child.is_optional() {
            entry = entry.with_default("null");
        }
        let path = join_path(path, name);
        self.render_entry(entry, child, uri, &path);
    }

    /// Entry for a property. Objects show neither type nor default, their
    /// children do.
    fn member_entry(&self, name: &str, child: &Ty) -> Entry {
        let mut entry = Entry::new(EntryKind::Object, name);
        let unwrapped = child.unwrap_optional();
        if unwrapped.named_children().is_some() {
            return entry;
        }
        if self.loader.can_inline(&child.meta.id) && !unwrapped.is_enum() {
            entry = entry.with_ty(child.print(Some(self.loader), false));
        }
        if let Some(default) = &child.meta.default {
            entry = entry.with_default(default.to_string());
        }
        entry
    }

    /// A property whose type is a reference documented nowhere else is
    /// documented in place: the target stands in for the reference, with the
    /// use site's presentation taking precedence.
    fn inline_reference(&self, child: &Ty, parent_default: Option<&Value>) -> Ty {
        let unwrapped = child.unwrap_optional();
        let mut ty = match unwrapped.ref_target() {
            Some(target) if self.loader.can_inline(target) => {
                let resolved = self.loader.get(target).cloned().unwrap_or_else(Ty::any);
                let mut meta = resolved.meta.clone();
                meta.title = child.meta.title.clone().or(meta.title);
                meta.description = child.meta.description.clone().or(meta.description);
                meta.deprecated |= child.meta.deprecated;
                meta.required |= child.meta.required;
                meta.default = child.meta.default.clone().or(meta.default);
                Ty { meta, ..resolved }
            }
            _ => child.clone(),
        };
        if let Some(default) = parent_default {
            ty.meta.default = Some(default.clone());
        }
        ty
    }

    fn is_excluded(&self, uri: &str, path: &str) -> bool {
        self.excludes.contains(&(uri.to_owned(), path.to_owned()))
    }
}

fn object_defaults(ty: &Ty) -> Option<&Map<String, Value>> {
    ty.meta.default.as_ref().and_then(Value::as_object)
}

fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_owned()
    } else {
        format!("{path}.{name}")
    }
}

// ------------------------------- Tests ------------------------------------ //
