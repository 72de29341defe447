//! Strongly-typed model of a compiled JSON-Schema node.
//!
//! A [`Ty`] is built once, bottom-up, by the [`crate::loader::Loader`] and is
//! never mutated afterwards: every adjustment goes through one of the
//! consuming `with_*` builders, which hand back a fresh value.
//!
//! Identity of a node is *structural*: [`Ty::structural_eq`] and
//! [`Ty::structural_hash`] look at the variant, its payload and the `const`
//! value only. Everything in [`Meta`] is presentation and never takes part in
//! comparisons, which is what lets the union/intersection constructors in
//! [`crate::norm`] spot duplicates that merely differ in title or description.

use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde_json::Value;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Presentational metadata shared by every variant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meta {
    /// Resolved `uri#fragment`, empty for anonymous inline nodes.
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
    /// Only meaningful on a named child of an object.
    pub required: bool,
    /// `None` means "no default declared"; `Some(Value::Null)` is an explicit `null`.
    pub default: Option<Value>,
    pub has_user_settings: bool,
    pub has_project_settings: bool,
}

#[derive(Debug, Clone)]
pub struct Ty {
    pub meta: Meta,
    /// Same tri-state as `Meta::default`, but structural.
    pub const_: Option<Value>,
    pub kind: Kind,
}

#[derive(Debug, Clone)]
pub enum Kind {
    Object {
        /// Insertion order is documentation order.
        named_children: IndexMap<String, Ty>,
        /// Type of `additionalProperties`, if declared.
        properties: Option<Box<Ty>>,
    },
    Ref { target: String },
    Array { item: Box<Ty> },
    /// Array with `uniqueItems`.
    Set { item: Box<Ty> },
    Tuple {
        items: Vec<Ty>,
        /// `None` when `maxItems` forbids trailing elements.
        tail: Option<Box<Ty>>,
    },
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Any,
    OneOf { items: Vec<Ty>, contains_null: bool },
    /// A `OneOf` whose members all carry a `const`.
    Enum { items: Vec<Ty>, contains_null: bool },
    AllOf { items: Vec<Ty> },
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

impl Ty {
    pub fn new(kind: Kind) -> Self {
        Self { meta: Meta::default(), const_: None, kind }
    }

    pub fn any() -> Self { Self::new(Kind::Any) }
    pub fn null() -> Self { Self::new(Kind::Null) }
    pub fn boolean() -> Self { Self::new(Kind::Boolean) }
    pub fn integer() -> Self { Self::new(Kind::Integer) }
    pub fn number() -> Self { Self::new(Kind::Number) }
    pub fn string() -> Self { Self::new(Kind::String) }

    pub fn object(named_children: IndexMap<String, Ty>, properties: Option<Ty>) -> Self {
        Self::new(Kind::Object {
            named_children,
            properties: properties.map(Box::new),
        })
    }

    pub fn reference(target: impl Into<String>) -> Self {
        Self::new(Kind::Ref { target: target.into() })
    }

    pub fn array(item: Ty) -> Self {
        Self::new(Kind::Array { item: Box::new(item) })
    }

    pub fn set(item: Ty) -> Self {
        Self::new(Kind::Set { item: Box::new(item) })
    }

    pub fn tuple(items: Vec<Ty>, tail: Option<Ty>) -> Self {
        Self::new(Kind::Tuple { items, tail: tail.map(Box::new) })
    }

    // copy-on-replace builders

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.meta.id = id.into();
        self
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.meta.title = title;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.meta.description = description;
        self
    }

    pub fn with_deprecated(mut self, deprecated: bool) -> Self {
        self.meta.deprecated = deprecated;
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.meta.required = required;
        self
    }

    pub fn with_default(mut self, default: Option<Value>) -> Self {
        self.meta.default = default;
        self
    }

    pub fn with_const(mut self, value: Option<Value>) -> Self {
        self.const_ = value;
        self
    }

    pub fn with_scope(mut self, user: bool, project: bool) -> Self {
        self.meta.has_user_settings = user;
        self.meta.has_project_settings = project;
        self
    }
}

// ————————————————————————————————————————————————————————————————————————————
// QUERIES
// ————————————————————————————————————————————————————————————————————————————

impl Ty {
    /// Lowercase schema keyword for the leaf variants, `None` for containers.
    pub fn leaf_keyword(&self) -> Option<&'static str> {
        match self.kind {
            Kind::Null => Some("null"),
            Kind::Boolean => Some("boolean"),
            Kind::Integer => Some("integer"),
            Kind::Number => Some("number"),
            Kind::String => Some("string"),
            Kind::Any => Some("any"),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, Kind::Null)
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, Kind::Enum { .. })
    }

    pub fn ref_target(&self) -> Option<&str> {
        match &self.kind {
            Kind::Ref { target } => Some(target),
            _ => None,
        }
    }

    /// Named children, if this is an object that declares any.
    pub fn named_children(&self) -> Option<&IndexMap<String, Ty>> {
        match &self.kind {
            Kind::Object { named_children, .. } if !named_children.is_empty() => Some(named_children),
            _ => None,
        }
    }

    /// Members of a union or intersection.
    pub fn members(&self) -> Option<&[Ty]> {
        match &self.kind {
            Kind::OneOf { items, .. } | Kind::Enum { items, .. } | Kind::AllOf { items } => Some(items),
            _ => None,
        }
    }

    /// Two-member union with one `null` arm.
    pub fn is_optional(&self) -> bool {
        match &self.kind {
            Kind::OneOf { items, contains_null } | Kind::Enum { items, contains_null } => {
                *contains_null && items.len() == 2
            }
            _ => false,
        }
    }

    /// The non-null arm of an optional, recursively; `self` otherwise.
    pub fn unwrap_optional(&self) -> &Ty {
        if !self.is_optional() {
            return self;
        }
        self.members()
            .and_then(|items| items.iter().find(|item| !item.is_null()))
            .map(Ty::unwrap_optional)
            .unwrap_or(self)
    }

    /// Whether this node may be expanded at its use site. The loader
    /// combines this with its reference counts.
    pub fn can_inline(&self) -> bool {
        match self.kind {
            Kind::Object { .. }
            | Kind::Ref { .. }
            | Kind::Array { .. }
            | Kind::Set { .. }
            | Kind::Tuple { .. }
            | Kind::Null
            | Kind::Boolean
            | Kind::Integer
            | Kind::Number
            | Kind::String
            | Kind::Any
            | Kind::OneOf { .. }
            | Kind::Enum { .. }
            | Kind::AllOf { .. } => true,
        }
    }

    /// Direct structural children, in declaration order.
    pub fn children(&self) -> Vec<&Ty> {
        match &self.kind {
            Kind::Object { named_children, properties } => named_children
                .values()
                .chain(properties.as_deref())
                .collect(),
            Kind::Array { item } | Kind::Set { item } => vec![item.as_ref()],
            Kind::Tuple { items, tail } => items.iter().chain(tail.as_deref()).collect(),
            Kind::OneOf { items, .. } | Kind::Enum { items, .. } | Kind::AllOf { items } => {
                items.iter().collect()
            }
            Kind::Ref { .. }
            | Kind::Null
            | Kind::Boolean
            | Kind::Integer
            | Kind::Number
            | Kind::String
            | Kind::Any => Vec::new(),
        }
    }

    /// Every `Ref` reachable without following a reference.
    pub fn find_refs(&self) -> Vec<&Ty> {
        match self.kind {
            Kind::Ref { .. } => vec![self],
            _ => self.children().into_iter().flat_map(Ty::find_refs).collect(),
        }
    }

    /// OR the settings-scope flags of the children into this node. Leaves
    /// and references keep whatever they already carry.
    pub fn propagate_scope(self) -> Self {
        let children = self.children();
        if children.is_empty() {
            return self;
        }
        let user = children.iter().any(|ch| ch.meta.has_user_settings);
        let project = children.iter().any(|ch| ch.meta.has_project_settings);
        self.with_scope(user, project)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// STRUCTURAL IDENTITY
// ————————————————————————————————————————————————————————————————————————————

impl Ty {
    /// Equality over variant, payload and `const`. `Meta` is ignored.
    pub fn structural_eq(&self, other: &Ty) -> bool {
        if self.const_ != other.const_ {
            return false;
        }
        match (&self.kind, &other.kind) {
            (
                Kind::Object { named_children: a, properties: pa },
                Kind::Object { named_children: b, properties: pb },
            ) => {
                a.len() == b.len()
                    && a.iter().all(|(name, ty)| b.get(name).is_some_and(|other| ty.structural_eq(other)))
                    && opt_eq(pa.as_deref(), pb.as_deref())
            }
            (Kind::Ref { target: a }, Kind::Ref { target: b }) => a == b,
            (Kind::Array { item: a }, Kind::Array { item: b })
            | (Kind::Set { item: a }, Kind::Set { item: b }) => a.structural_eq(b),
            (Kind::Tuple { items: a, tail: ta }, Kind::Tuple { items: b, tail: tb }) => {
                slice_eq(a, b) && opt_eq(ta.as_deref(), tb.as_deref())
            }
            (Kind::Null, Kind::Null)
            | (Kind::Boolean, Kind::Boolean)
            | (Kind::Integer, Kind::Integer)
            | (Kind::Number, Kind::Number)
            | (Kind::String, Kind::String)
            | (Kind::Any, Kind::Any) => true,
            (
                Kind::OneOf { items: a, contains_null: na },
                Kind::OneOf { items: b, contains_null: nb },
            )
            | (
                Kind::Enum { items: a, contains_null: na },
                Kind::Enum { items: b, contains_null: nb },
            ) => na == nb && slice_eq(a, b),
            (Kind::AllOf { items: a }, Kind::AllOf { items: b }) => slice_eq(a, b),
            _ => false,
        }
    }

    /// Hash consistent with [`Ty::structural_eq`].
    pub fn structural_hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(&self.kind).hash(state);
        match &self.const_ {
            None => 0u8.hash(state),
            Some(value) => {
                1u8.hash(state);
                hash_value(value, state);
            }
        }
        match &self.kind {
            Kind::Object { named_children, properties } => {
                // Object equality ignores key order, so hash in sorted order.
                let mut names: Vec<&String> = named_children.keys().collect();
                names.sort();
                for name in names {
                    name.hash(state);
                    named_children[name].structural_hash(state);
                }
                if let Some(properties) = properties {
                    properties.structural_hash(state);
                }
            }
            Kind::Ref { target } => target.hash(state),
            Kind::Array { item } | Kind::Set { item } => item.structural_hash(state),
            Kind::Tuple { items, tail } => {
                items.len().hash(state);
                items.iter().for_each(|item| item.structural_hash(state));
                if let Some(tail) = tail {
                    tail.structural_hash(state);
                }
            }
            Kind::OneOf { items, contains_null } | Kind::Enum { items, contains_null } => {
                contains_null.hash(state);
                items.len().hash(state);
                items.iter().for_each(|item| item.structural_hash(state));
            }
            Kind::AllOf { items } => {
                items.len().hash(state);
                items.iter().for_each(|item| item.structural_hash(state));
            }
            Kind::Null | Kind::Boolean | Kind::Integer | Kind::Number | Kind::String | Kind::Any => {}
        }
    }
}

impl PartialEq for Ty {
    fn eq(&self, other: &Self) -> bool {
        self.structural_eq(other)
    }
}

impl Eq for Ty {}

/// Owned wrapper that hashes and compares structurally, for use as a set key.
#[derive(Debug, Clone)]
pub struct Structural(pub Ty);

impl PartialEq for Structural {
    fn eq(&self, other: &Self) -> bool {
        self.0.structural_eq(&other.0)
    }
}

impl Eq for Structural {}

impl Hash for Structural {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.structural_hash(state)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn opt_eq(a: Option<&Ty>, b: Option<&Ty>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.structural_eq(b),
        _ => false,
    }
}

fn slice_eq(a: &[Ty], b: &[Ty]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.structural_eq(b))
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    std::mem::discriminant(value).hash(state);
    match value {
        Value::Null => {}
        Value::Bool(b) => b.hash(state),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.hash(state);
            } else if let Some(u) = n.as_u64() {
                u.hash(state);
            } else if let Some(f) = n.as_f64() {
                OrderedFloat(f).hash(state);
            }
        }
        Value::String(s) => s.hash(state),
        Value::Array(xs) => {
            xs.len().hash(state);
            xs.iter().for_each(|x| hash_value(x, state));
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                key.hash(state);
                hash_value(&map[key], state);
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
