//! Markdown output for the documentation walk.
//!
//! Entries become headings whose level follows their nesting depth. Every
//! entry gets an anchor derived from its dotted full name, and type names in
//! signatures link to the entry documenting them. Links can point forward,
//! so the page is only assembled in [`MarkdownSink::finish`].

use indexmap::IndexMap;

use crate::render::{DocSink, Entry};
use crate::sig::{self, Token};

// ------------------------------- Types ----------------------------------- //

#[derive(Debug, Default)]
pub struct MarkdownSink {
    blocks: Vec<Block>,
    /// Full names of the open entries, innermost last.
    context: Vec<String>,
    /// Full name → anchor, in registration order.
    objects: IndexMap<String, String>,
}

#[derive(Debug)]
enum Block {
    Section(String),
    Text(String),
    Entry(Heading),
}

#[derive(Debug)]
struct Heading {
    depth: usize,
    /// `None` for duplicates of an already documented name.
    anchor: Option<String>,
    required: bool,
    deprecated: bool,
    /// Dotted owner shown before the name, e.g. `EmmyRc.` in `EmmyRc.mode`.
    owner: String,
    name: String,
    /// `:` or `=`, if the signature carries a type or a default.
    separator: Option<char>,
    tail: String,
    /// Full name of the enclosing entry; names in `tail` resolve against it.
    scope: String,
}

// ------------------------------ Front API -------------------------------- //

impl MarkdownSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble the page, resolving cross-references.
    pub fn finish(self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                Block::Section(title) => out.push_str(&format!("# {title}\n\n")),
                Block::Text(text) => {
                    out.push_str(text.trim_end());
                    out.push_str("\n\n");
                }
                Block::Entry(heading) => {
                    out.push_str(&self.render_heading(heading));
                    out.push_str("\n\n");
                }
            }
        }
        if !self.objects.is_empty() {
            out.push_str("# Index\n\n");
            let mut names: Vec<(&String, &String)> = self.objects.iter().collect();
            names.sort();
            for (name, anchor) in names {
                out.push_str(&format!("- [{}](#{anchor})\n", code(name)));
            }
        }
        out
    }
}

impl DocSink for MarkdownSink {
    fn begin_entry(&mut self, entry: &Entry) {
        let scope = self.context.last().cloned().unwrap_or_default();
        let owner = entry.owner.as_deref().map(strip_defs).unwrap_or_default();
        let name = strip_defs(&entry.name);
        let (separator, tail) = match (&entry.ty, &entry.default) {
            (Some(ty), Some(default)) => (Some(':'), format!("{ty} = {default}")),
            (Some(ty), None) => (Some(':'), ty.clone()),
            (None, Some(default)) => (Some('='), default.clone()),
            (None, None) => (None, String::new()),
        };
        let tail = strip_defs(&tail);

        let prefix = match (scope.is_empty(), owner.is_empty()) {
            (false, false) => format!("{scope}.{owner}"),
            (true, false) => owner.clone(),
            (_, true) => scope.clone(),
        };
        let fullname = if prefix.is_empty() { name.clone() } else { format!("{prefix}.{name}") };

        let anchor = make_anchor(&fullname);
        let anchor = if self.objects.contains_key(&fullname) {
            tracing::warn!(%fullname, "duplicate documentation entry");
            None
        } else {
            self.objects.insert(fullname.clone(), anchor.clone());
            Some(anchor)
        };

        self.blocks.push(Block::Entry(Heading {
            depth: self.context.len(),
            anchor,
            required: entry.required,
            deprecated: entry.deprecated,
            owner,
            name,
            separator,
            tail,
            scope,
        }));
        self.context.push(fullname);
    }

    fn body(&mut self, text: &str) {
        self.blocks.push(Block::Text(text.to_owned()));
    }

    fn end_entry(&mut self) {
        self.context.pop();
    }

    fn section(&mut self, title: &str) {
        self.blocks.push(Block::Section(title.to_owned()));
    }

    fn resolve(&self, name: &str, scope: &str) -> Option<String> {
        if !scope.is_empty() {
            if let Some(anchor) = self.objects.get(&format!("{scope}.{name}")) {
                return Some(anchor.clone());
            }
        }
        self.objects.get(name).cloned()
    }
}

// ----------------------------- Rendering --------------------------------- //

impl MarkdownSink {
    fn render_heading(&self, heading: &Heading) -> String {
        let mut line = "#".repeat((heading.depth + 2).min(6));
        line.push(' ');
        if let Some(anchor) = &heading.anchor {
            line.push_str(&format!("<a id=\"{anchor}\"></a>"));
        }
        if heading.required {
            line.push_str("*required* ");
        }
        let shown = if heading.owner.is_empty() {
            heading.name.clone()
        } else {
            format!("{}.{}", heading.owner, heading.name)
        };
        line.push_str(&code(&shown));
        match heading.separator {
            Some('=') => line.push_str(" = "),
            Some(sep) => line.push_str(&format!("{sep} ")),
            None => {}
        }
        line.push_str(&self.render_signature(&heading.tail, &heading.scope));
        if heading.deprecated {
            line.push_str(" *(deprecated)*");
        }
        line
    }

    /// Signature as code spans, with documented names turned into links.
    fn render_signature(&self, tail: &str, scope: &str) -> String {
        let mut out = String::new();
        let mut pending = String::new();
        for token in sig::tokenize(tail) {
            if let Token::Name(name) = token {
                if let Some(anchor) = self.resolve(name, scope) {
                    flush_code(&mut out, &mut pending);
                    out.push_str(&format!("[{}](#{anchor})", code(name)));
                    continue;
                }
            }
            pending.push_str(&token.display());
        }
        flush_code(&mut out, &mut pending);
        out.trim().to_owned()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn strip_defs(text: &str) -> String {
    text.replace("/$defs/", "")
}

fn make_anchor(fullname: &str) -> String {
    url::form_urlencoded::byte_serialize(fullname.as_bytes()).collect()
}

/// Inline code span that survives backticks in `text`.
fn code(text: &str) -> String {
    if text.contains('`') {
        format!("`` {text} ``")
    } else {
        format!("`{text}`")
    }
}

/// Move `pending` into `out` as a code span, keeping edge whitespace outside.
fn flush_code(out: &mut String, pending: &mut String) {
    let trimmed = pending.trim();
    if trimmed.is_empty() {
        out.push_str(pending);
    } else {
        let leading = &pending[..pending.len() - pending.trim_start().len()];
        let trailing = &pending[pending.trim_end().len()..];
        out.push_str(leading);
        out.push_str(&code(trimmed));
        out.push_str(trailing);
    }
    pending.clear();
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::EntryKind;

    fn object(name: &str) -> Entry {
        Entry::new(EntryKind::Object, name)
    }

    #[test]
    fn nested_entries_get_dotted_anchors() {
        let mut sink = MarkdownSink::new();
        sink.begin_entry(&object("EmmyRc"));
        sink.body("Root settings.");
        sink.begin_entry(&object("mode").with_ty("string").with_default("\"fast\"").with_flags(true, false));
        sink.end_entry();
        sink.end_entry();
        let page = sink.finish();
        assert!(page.contains("## <a id=\"EmmyRc\"></a>`EmmyRc`\n\nRoot settings.\n\n"));
        assert!(page.contains(
            "### <a id=\"EmmyRc.mode\"></a>*required* `mode`: `string = \"fast\"`"
        ));
        assert!(page.contains("- [`EmmyRc.mode`](#EmmyRc.mode)"));
    }

    #[test]
    fn names_link_to_their_entries() {
        let mut sink = MarkdownSink::new();
        sink.begin_entry(&object("EmmyRc"));
        sink.begin_entry(&object("paths").with_ty("EmmyRc#/$defs/Path[]").with_flags(false, true));
        sink.end_entry();
        sink.end_entry();
        sink.section("Config types");
        sink.begin_entry(&object("EmmyRc#/$defs/Path"));
        sink.end_entry();
        let page = sink.finish();
        assert!(page.contains("`paths`: [`EmmyRc#Path`](#EmmyRc%23Path)`[]` *(deprecated)*"));
        assert!(page.contains("# Config types\n\n## <a id=\"EmmyRc%23Path\"></a>`EmmyRc#Path`"));
    }

    #[test]
    fn scoped_names_win_over_global_ones() {
        let mut sink = MarkdownSink::new();
        sink.begin_entry(&object("A"));
        sink.begin_entry(&object("B"));
        sink.end_entry();
        sink.end_entry();
        sink.begin_entry(&object("B"));
        sink.end_entry();
        assert_eq!(sink.resolve("B", "A").as_deref(), Some("A.B"));
        assert_eq!(sink.resolve("B", "").as_deref(), Some("B"));
        assert_eq!(sink.resolve("B", "Z").as_deref(), Some("B"));
        assert_eq!(sink.resolve("C", "A"), None);
    }

    #[test]
    fn unwrapped_entries_show_their_owner() {
        let mut sink = MarkdownSink::new();
        sink.begin_entry(&object("limit").with_owner("EmmyRc").with_ty("integer?"));
        sink.end_entry();
        sink.begin_entry(&Entry::new(EntryKind::Property, "\"fast\""));
        sink.end_entry();
        let page = sink.finish();
        assert!(page.contains("## <a id=\"EmmyRc.limit\"></a>`EmmyRc.limit`: `integer?`"));
        assert!(page.contains("## <a id=\"%22fast%22\"></a>`\"fast\"`"));
    }

    #[test]
    fn duplicate_names_keep_the_first_anchor() {
        let mut sink = MarkdownSink::new();
        sink.begin_entry(&object("A"));
        sink.end_entry();
        sink.begin_entry(&object("A"));
        sink.end_entry();
        let page = sink.finish();
        assert_eq!(page.matches("<a id=\"A\"></a>").count(), 1);
    }

    #[test]
    fn url_ids_keep_their_punctuation() {
        let root = "https://example.com/emmyrc.json";
        let shared = "https://example.com/emmyrc.json#/$defs/Shared";
        let mut sink = MarkdownSink::new();
        sink.begin_entry(&object(root));
        sink.begin_entry(&object("a").with_ty(shared));
        sink.end_entry();
        sink.end_entry();
        sink.section("Config types");
        sink.begin_entry(&object(shared));
        sink.end_entry();
        let page = sink.finish();
        assert!(page.contains("## <a id=\"https%3A%2F%2Fexample.com%2Femmyrc.json\"></a>`https://example.com/emmyrc.json`\n"));
        assert!(page.contains(
            "`a`: [`https://example.com/emmyrc.json#Shared`](#https%3A%2F%2Fexample.com%2Femmyrc.json%23Shared)"
        ));
        assert_eq!(page.matches("<a id=").count(), 3);
    }
}
