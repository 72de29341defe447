use std::path::PathBuf;

/// Failures surfaced by the registry and the loader.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("no schema resource registered for `{uri}`")]
    Unretrievable { uri: String },

    #[error("JSON pointer `{pointer}` does not resolve inside `{uri}`")]
    PointerToNowhere { uri: String, pointer: String },

    #[error("no anchor `{anchor}` in `{uri}`")]
    NoSuchAnchor { uri: String, anchor: String },

    /// The reference is well-formed JSON-Schema but lands in a different
    /// resource than the one it was resolved against. The schema has to
    /// reference that resource by its own URI instead.
    #[error("reference `{uri}#{fragment}` is not supported: {reason}")]
    MalformedReference {
        uri: String,
        fragment: String,
        reason: String,
    },

    #[error("failed to read schema file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Schema authoring errors that make the whole build meaningless.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LoadError::MalformedReference { .. })
    }
}
