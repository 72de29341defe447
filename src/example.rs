//! Synthesized example configuration documents.
//!
//! Walks a compiled [`Ty`] and emits the value a user would most likely
//! write: declared defaults where there are any, constants next, and a
//! neutral placeholder of the right shape otherwise.

use serde_json::{Map, Value};

use crate::ir::{Kind, Ty};
use crate::loader::Loader;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Which settings make it into the example.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ExampleKind {
    #[default]
    All,
    /// Only properties that belong in the per-user configuration.
    User,
    /// Only properties that belong in the per-project configuration.
    Project,
}

impl ExampleKind {
    fn admits(self, ty: &Ty) -> bool {
        match self {
            ExampleKind::All => true,
            ExampleKind::User => ty.meta.has_user_settings,
            ExampleKind::Project => ty.meta.has_project_settings,
        }
    }
}

struct ExampleGenerator<'l> {
    loader: &'l Loader,
    kind: ExampleKind,
    /// Reference targets currently being expanded.
    expanding: Vec<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

/// Example value for `ty`, starting from its own declared default.
pub fn generate_example(loader: &Loader, ty: &Ty, kind: ExampleKind) -> Value {
    ExampleGenerator { loader, kind, expanding: Vec::new() }.generate(ty, None)
}

/// [`generate_example`] pretty-printed with two-space indentation.
pub fn render_example(loader: &Loader, ty: &Ty, kind: ExampleKind) -> String {
    format!("{:#}", generate_example(loader, ty, kind))
}

impl ExampleGenerator<'_> {
    /// `default` is the value a parent object's default assigns to this
    /// position; it wins over the node's own default.
    fn generate(&mut self, ty: &Ty, default: Option<&Value>) -> Value {
        let default = default.or(ty.meta.default.as_ref());
        match &ty.kind {
            Kind::Object { named_children, .. } => {
                let defaults = default.and_then(Value::as_object);
                let mut out = Map::new();
                for (name, child) in named_children {
                    if name.starts_with('$') || !self.kind.admits(child) {
                        continue;
                    }
                    let child_default = defaults.and_then(|d| d.get(name));
                    out.insert(name.clone(), self.generate(child, child_default));
                }
                Value::Object(out)
            }
            Kind::Ref { target } => self.generate_ref(target, default),
            _ if default.is_some() => default.cloned().unwrap_or(Value::Null),
            _ if ty.const_.is_some() => ty.const_.clone().unwrap_or(Value::Null),
            Kind::Array { .. } | Kind::Set { .. } | Kind::Tuple { .. } => Value::Array(Vec::new()),
            Kind::Boolean => Value::Bool(false),
            Kind::Integer => Value::from(0),
            Kind::Number => Value::from(0.0),
            Kind::String => Value::String(String::new()),
            Kind::Null | Kind::Any | Kind::OneOf { .. } | Kind::Enum { .. } | Kind::AllOf { .. } => Value::Null,
        }
    }

    fn generate_ref(&mut self, target: &str, default: Option<&Value>) -> Value {
        let fallback = || default.cloned().unwrap_or(Value::Null);
        if self.expanding.iter().any(|id| id == target) {
            tracing::debug!(%target, "recursive reference in example; stopping expansion");
            return fallback();
        }
        let Some(resolved) = self.loader.get(target) else {
            tracing::warn!(%target, "unresolved reference in example");
            return fallback();
        };
        self.expanding.push(target.to_owned());
        let value = self.generate(resolved, default);
        self.expanding.pop();
        value
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
