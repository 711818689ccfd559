/// Rejection reasons for a path expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,
    #[error("empty segment at position {position}")]
    EmptySegment { position: usize },
    #[error("unbalanced bracket in segment {position}")]
    UnbalancedBracket { position: usize },
    #[error("invalid array index '{raw}'")]
    InvalidIndex { raw: String },
    #[error("placeholder `[item]` cannot address a concrete document location")]
    PlaceholderInConcretePath,
    #[error("path '{path}' does not resolve against the document")]
    NotFound { path: String },
    #[error("'{path}' holds a value of another kind")]
    ShapeMismatch { path: String },
    #[error("index {index} is too far past the end of '{path}' (length {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },
}

/// Problems found while indexing a list of field definitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("field definition has an empty key")]
    EmptyKey,
    #[error("field key '{key}' is declared more than once")]
    DuplicateKey { key: String },
    #[error("field key '{key}' is not a valid path: {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: PathError,
    },
}
