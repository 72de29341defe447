//! Tokenizer for printed type signatures.
//!
//! Renderers use it to highlight signatures and to turn type names into
//! links, without re-parsing the schema.

use once_cell::sync::Lazy;
use regex::Regex;

static SIGNATURE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?x)
        \s+
        | (?P<dots>\.\.\.)
        | (?P<string>"(?:\\.|[^"\\])*"|'(?:\\.|[^'\\])*'|`(?:\\.|[^`\\])*`)
        | (?P<number>(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?)
        | (?P<keyword>null|true|false|boolean|integer|number|string|any|never|object|set|array)\b
          \s*(?P<optional>\??)\s*
        | (?P<name>(?:[A-Za-z][\w+.-]*://)?\w[\w\#/$-]*(?:\.[\w\#/$-]+)*)
        | (?P<punct>[=:,|&])
        | (?P<other_punct>[-!\#$%()*+/;<>?@\[\]^_{}~]+)
        | (?P<other>.)
        "#,
    )
    .expect("signature token pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'s> {
    Ellipsis,
    Str(&'s str),
    Number(&'s str),
    /// Built-in type name; `optional` when followed by `?`.
    Keyword { text: &'s str, optional: bool },
    /// Anything that may name a documented type.
    Name(&'s str),
    /// `=`, `:`, `,`, `|` or `&`.
    Punct(&'s str),
    OtherPunct(&'s str),
    Other(&'s str),
}

impl Token<'_> {
    /// Text of the token as it should appear in a rendered signature,
    /// including the spacing conventions around punctuation.
    pub fn display(&self) -> String {
        match *self {
            Token::Ellipsis => "...".to_owned(),
            Token::Keyword { text, optional: true } => format!("{text}?"),
            Token::Punct(p) if matches!(p, "=" | "|" | "&") => format!(" {p} "),
            Token::Punct(p) => format!("{p} "),
            Token::Str(text)
            | Token::Number(text)
            | Token::Keyword { text, .. }
            | Token::Name(text)
            | Token::OtherPunct(text)
            | Token::Other(text) => text.to_owned(),
        }
    }
}

/// Split `sig` into tokens. Whitespace is dropped.
pub fn tokenize(sig: &str) -> Vec<Token<'_>> {
    SIGNATURE_TOKEN
        .captures_iter(sig)
        .filter_map(|caps| {
            if caps.name("dots").is_some() {
                Some(Token::Ellipsis)
            } else if let Some(m) = caps.name("string") {
                Some(Token::Str(m.as_str()))
            } else if let Some(m) = caps.name("number") {
                Some(Token::Number(m.as_str()))
            } else if let Some(m) = caps.name("keyword") {
                let optional = caps.name("optional").is_some_and(|q| !q.as_str().is_empty());
                Some(Token::Keyword { text: m.as_str(), optional })
            } else if let Some(m) = caps.name("name") {
                Some(Token::Name(m.as_str()))
            } else if let Some(m) = caps.name("punct") {
                Some(Token::Punct(m.as_str()))
            } else if let Some(m) = caps.name("other_punct") {
                Some(Token::OtherPunct(m.as_str()))
            } else {
                caps.name("other").map(|m| Token::Other(m.as_str()))
            }
        })
        .collect()
}

/// Re-assemble tokens into a normalized signature string.
pub fn normalize(sig: &str) -> String {
    tokenize(sig).iter().map(Token::display).collect::<String>().trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_keywords_and_names() {
        let tokens = tokenize(r#""a\"b" | 1.5e3 | string? | EmmyRc#Foo"#);
        assert_eq!(
            tokens,
            vec![
                Token::Str(r#""a\"b""#),
                Token::Punct("|"),
                Token::Number("1.5e3"),
                Token::Punct("|"),
                Token::Keyword { text: "string", optional: true },
                Token::Punct("|"),
                Token::Name("EmmyRc#Foo"),
            ]
        );
    }

    #[test]
    fn keywords_need_a_word_boundary() {
        assert_eq!(tokenize("stringly"), vec![Token::Name("stringly")]);
        assert_eq!(tokenize("string"), vec![Token::Keyword { text: "string", optional: false }]);
    }

    #[test]
    fn containers_and_tails() {
        let tokens = tokenize("[string, (integer | Root#Item)...]");
        assert_eq!(
            tokens,
            vec![
                Token::OtherPunct("["),
                Token::Keyword { text: "string", optional: false },
                Token::Punct(","),
                Token::OtherPunct("("),
                Token::Keyword { text: "integer", optional: false },
                Token::Punct("|"),
                Token::Name("Root#Item"),
                Token::OtherPunct(")"),
                Token::Ellipsis,
                Token::OtherPunct("]"),
            ]
        );
    }

    #[test]
    fn dotted_names_stop_before_ellipsis() {
        assert_eq!(tokenize("EmmyRc.a.b"), vec![Token::Name("EmmyRc.a.b")]);
        assert_eq!(tokenize("Root#Item..."), vec![Token::Name("Root#Item"), Token::Ellipsis]);
    }

    #[test]
    fn pointer_ids_stay_one_name() {
        assert_eq!(tokenize("Root#/$defs/A"), vec![Token::Name("Root#/$defs/A")]);
    }

    #[test]
    fn url_ids_stay_one_name() {
        assert_eq!(
            tokenize("https://example.com/emmyrc.json#Shared[]"),
            vec![
                Token::Name("https://example.com/emmyrc.json#Shared"),
                Token::OtherPunct("[]"),
            ]
        );
        assert_eq!(
            tokenize("{string: string}"),
            vec![
                Token::OtherPunct("{"),
                Token::Keyword { text: "string", optional: false },
                Token::Punct(":"),
                Token::Keyword { text: "string", optional: false },
                Token::OtherPunct("}"),
            ]
        );
    }

    #[test]
    fn normalize_spacing() {
        assert_eq!(normalize(r#"{"a":integer,"b":string[]}"#), r#"{"a": integer, "b": string[]}"#);
        assert_eq!(normalize("string?=null"), "string? = null");
        assert_eq!(normalize("A&B"), "A & B");
    }
}
