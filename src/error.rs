use thiserror::Error;

/// Compilation failures are terminal: no partial predicate is ever returned.
/// The precise kind is meant for logs; callers show [`QueryError::user_message`].
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Parse error: {message}")]
    Parse { message: String },
    #[error("Unknown attribute: segment '{segment}' in path '{path}'")]
    UnknownAttribute { path: String, segment: String },
    #[error("Cannot coerce '{value}' to {kind}")]
    Coercion { value: String, kind: &'static str },
    #[error("Operator {operator} is not applicable to {kind} attribute '{attribute}'")]
    UnsupportedOperator {
        operator: &'static str,
        kind: &'static str,
        attribute: String,
    },
    #[error("Store error: {0}")]
    Store(String),
}

impl QueryError {
    /// The single message safe to surface to a caller. Schema internals
    /// (attribute names, declared kinds) stay out of user-facing output.
    pub fn user_message(&self) -> &'static str {
        match self {
            QueryError::Store(_) => "Could not execute search query.",
            _ => "Could not parse search query.",
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
