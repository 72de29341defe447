//! URI joining for `$ref` / `$id` resolution.
//!
//! Registry keys are either real URLs (`https://…/schema.json`) or logical
//! names (`EmmyRc`, `other.json`). Real URLs go through the `url` crate; for
//! logical names the reference simply replaces the last path segment of the
//! base, which is what RFC 3986 merging amounts to without a scheme.

use url::Url;

/// Resolve `reference` against `base`.
pub fn join(base: &str, reference: &str) -> String {
    if reference.is_empty() {
        return base.to_owned();
    }
    if Url::parse(reference).is_ok() {
        return reference.to_owned();
    }
    if let Ok(base_url) = Url::parse(base) {
        if let Ok(joined) = base_url.join(reference) {
            return joined.into();
        }
    }
    if base.is_empty() {
        return reference.to_owned();
    }
    if let Some(fragment) = reference.strip_prefix('#') {
        let (base, _) = defrag(base);
        return format!("{base}#{fragment}");
    }
    if reference.starts_with('/') {
        return reference.to_owned();
    }
    let (base, _) = defrag(base);
    match base.rfind('/') {
        Some(slash) => format!("{}{}", &base[..=slash], reference),
        None => reference.to_owned(),
    }
}

/// Split off the fragment: `a#/b` → (`a`, `/b`). Missing fragment → empty.
pub fn defrag(uri: &str) -> (String, String) {
    match uri.split_once('#') {
        Some((uri, fragment)) => (uri.to_owned(), fragment.to_owned()),
        None => (uri.to_owned(), String::new()),
    }
}
