//! Normalizing constructors for unions and intersections.
//!
//! Goal: whatever combination of `anyOf`/`oneOf`/`enum`/`type` lists a schema
//! uses, end up with one flat, duplicate-free combinator (or a bare member
//! when only one survives), so printing and documentation never show
//! `string | string` or `(a | (b | c))`.

use std::collections::HashSet;

use crate::ir::{Kind, Structural, Ty};

impl Ty {
    /// Union of `types`.
    ///
    /// - nested unions (including enums) are flattened;
    /// - structurally equal members are dropped, keeping the first;
    /// - a bare leaf is dropped when a constant of the same leaf type is
    ///   present (`string` next to `"a"` adds nothing to the listing);
    /// - a single survivor is returned as is;
    /// - if every survivor carries a `const`, the result is an [`Kind::Enum`].
    pub fn one_of(types: impl IntoIterator<Item = Ty>) -> Ty {
        let mut flat = Vec::<Ty>::new();
        for ty in types {
            match ty.kind {
                Kind::OneOf { items, .. } | Kind::Enum { items, .. } => flat.extend(items),
                kind => flat.push(Ty { kind, ..ty }),
            }
        }

        let mut seen: HashSet<Structural> = flat
            .iter()
            .filter(|ty| ty.leaf_keyword().is_some() && ty.const_.is_some())
            .map(|ty| Structural(ty.clone().with_const(None)))
            .collect();

        let mut contains_null = false;
        let mut arms = Vec::<Ty>::with_capacity(flat.len());
        for ty in flat {
            if ty.is_null() {
                contains_null = true;
            }
            if seen.insert(Structural(ty.clone())) {
                arms.push(ty);
            }
        }

        if arms.len() == 1 {
            return arms.remove(0);
        }
        if !arms.is_empty() && arms.iter().all(|arm| arm.const_.is_some()) {
            Ty::new(Kind::Enum { items: arms, contains_null })
        } else {
            Ty::new(Kind::OneOf { items: arms, contains_null })
        }
    }

    /// Intersection of `types`: flattened, de-duplicated, singleton collapsed.
    pub fn all_of(types: impl IntoIterator<Item = Ty>) -> Ty {
        let mut flat = Vec::<Ty>::new();
        for ty in types {
            match ty.kind {
                Kind::AllOf { items } => flat.extend(items),
                kind => flat.push(Ty { kind, ..ty }),
            }
        }

        let mut seen = HashSet::<Structural>::new();
        let mut members = Vec::<Ty>::with_capacity(flat.len());
        for ty in flat {
            if seen.insert(Structural(ty.clone())) {
                members.push(ty);
            }
        }

        match members.len() {
            1 => members.remove(0),
            _ => Ty::new(Kind::AllOf { items: members }),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lit(s: &str) -> Ty {
        Ty::string().with_const(Some(json!(s)))
    }

    #[test]
    fn nested_unions_flatten() {
        let a = Ty::string();
        let b = Ty::integer();
        let c = Ty::boolean();
        let nested = Ty::one_of([Ty::one_of([a.clone(), b.clone()]), c.clone()]);
        let flat = Ty::one_of([a, b, c]);
        assert!(nested.structural_eq(&flat));
        assert_eq!(nested.members().map(<[Ty]>::len), Some(3));
    }

    #[test]
    fn duplicates_collapse_to_single_member() {
        let ty = Ty::one_of([
            Ty::string().with_title(Some("first".into())),
            Ty::string().with_title(Some("second".into())),
        ]);
        assert!(matches!(ty.kind, Kind::String));
        assert_eq!(ty.meta.title.as_deref(), Some("first"));
    }

    #[test]
    fn constants_promote_to_enum() {
        let ty = Ty::one_of([lit("a"), lit("b")]);
        assert!(ty.is_enum());
        assert_eq!(ty.members().map(<[Ty]>::len), Some(2));
    }

    #[test]
    fn bare_leaf_is_absorbed_by_constants() {
        // {"type": "string", "enum": ["a", "b"]}
        let ty = Ty::one_of([Ty::string(), lit("a"), lit("b")]);
        assert!(ty.is_enum());
        assert_eq!(ty.members().map(<[Ty]>::len), Some(2));
    }

    #[test]
    fn optional_shape() {
        let ty = Ty::one_of([Ty::string(), Ty::null()]);
        assert!(ty.is_optional());
        assert!(matches!(ty.unwrap_optional().kind, Kind::String));
        assert!(!Ty::one_of([Ty::string(), Ty::integer(), Ty::null()]).is_optional());
    }

    #[test]
    fn nested_optional_unwraps_recursively() {
        let inner = Ty::one_of([Ty::integer(), Ty::null()]);
        let outer = Ty::new(Kind::OneOf { items: vec![inner, Ty::null()], contains_null: true });
        assert!(matches!(outer.unwrap_optional().kind, Kind::Integer));
    }

    #[test]
    fn enum_with_null_stays_a_union() {
        let ty = Ty::one_of([lit("a"), lit("b"), Ty::null()]);
        assert!(matches!(ty.kind, Kind::OneOf { contains_null: true, .. }));
    }

    #[test]
    fn intersections_flatten_and_dedupe() {
        let ty = Ty::all_of([
            Ty::all_of([Ty::reference("A"), Ty::reference("B")]),
            Ty::reference("A"),
        ]);
        assert_eq!(ty.members().map(<[Ty]>::len), Some(2));
        assert!(matches!(Ty::all_of([Ty::integer()]).kind, Kind::Integer));
    }
}
