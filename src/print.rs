//! Compact type signatures for documentation headers.
//!
//! `{"a": integer, "b": string[]}`, `("a" | "b")?`, `[string, integer...]`.
//! References to types that are documented on their own (see
//! [`Loader::can_inline`]) are printed as their id so the renderer can turn
//! them into links.

use crate::ir::{Kind, Ty};
use crate::loader::Loader;

impl Ty {
    /// Signature of this node. Without a loader, references print as their
    /// raw target. `parens` asks for unions and intersections to be wrapped,
    /// as needed inside `[]` or another combinator.
    pub fn print(&self, loader: Option<&Loader>, parens: bool) -> String {
        Printer { loader, expanding: Vec::new() }.print(self, parens)
    }
}

struct Printer<'l> {
    loader: Option<&'l Loader>,
    /// Reference targets currently being inlined.
    expanding: Vec<String>,
}

impl Printer<'_> {
    fn print(&mut self, ty: &Ty, parens: bool) -> String {
        match &ty.kind {
            Kind::Object { named_children, properties } => {
                if !named_children.is_empty() {
                    let items = named_children
                        .iter()
                        .map(|(name, child)| format!("{}: {}", json_string(name), self.print(child, false)))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{{{items}}}")
                } else if let Some(properties) = properties {
                    format!("{{string: {}}}", self.print(properties, false))
                } else {
                    "{}".to_owned()
                }
            }
            Kind::Ref { target } => self.print_ref(target, parens),
            Kind::Array { item } | Kind::Set { item } => format!("{}[]", self.print(item, true)),
            Kind::Tuple { items, tail } => {
                let mut parts: Vec<String> = items.iter().map(|item| self.print(item, false)).collect();
                if let Some(tail) = tail {
                    parts.push(format!("{}...", self.print(tail, true)));
                }
                format!("[{}]", parts.join(", "))
            }
            Kind::Null | Kind::Boolean | Kind::Integer | Kind::Number | Kind::String | Kind::Any => {
                match &ty.const_ {
                    Some(value) => value.to_string(),
                    None => ty.leaf_keyword().unwrap_or("any").to_owned(),
                }
            }
            Kind::OneOf { items, contains_null } | Kind::Enum { items, contains_null } => {
                let mut joined = items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(|item| self.print(item, true))
                    .collect::<Vec<_>>()
                    .join(" | ");
                if joined.is_empty() {
                    joined = "never".to_owned();
                }
                if *contains_null && items.len() > 2 {
                    format!("({joined})?")
                } else if *contains_null {
                    format!("{joined}?")
                } else if parens {
                    format!("({joined})")
                } else {
                    joined
                }
            }
            Kind::AllOf { items } => {
                let mut joined = items
                    .iter()
                    .map(|item| self.print(item, true))
                    .collect::<Vec<_>>()
                    .join(" & ");
                if joined.is_empty() {
                    joined = "never".to_owned();
                }
                if parens { format!("({joined})") } else { joined }
            }
        }
    }

    fn print_ref(&mut self, target: &str, parens: bool) -> String {
        let Some(loader) = self.loader else {
            return target.to_owned();
        };
        let Some(resolved) = loader.get(target) else {
            tracing::warn!(%target, "unresolved reference; printing its id");
            return target.to_owned();
        };
        if !loader.can_inline(target) || self.expanding.iter().any(|id| id == target) {
            return target.to_owned();
        }
        self.expanding.push(target.to_owned());
        let printed = self.print(resolved, parens);
        self.expanding.pop();
        printed
    }
}

fn json_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
