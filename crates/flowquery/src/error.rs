//! Error types for flowquery

use thiserror::Error;

/// Result type alias for query generation
pub type QueryGenResult<T> = Result<T, QueryGenError>;

/// Errors raised while generating query text.
///
/// Every variant is deterministic: retrying with the same input reproduces it,
/// so callers should surface it as an internal read error.
#[derive(Debug, Error)]
pub enum QueryGenError {
    /// The entity has no alias in the mapping
    #[error("No alias mapping for entity '{0}'")]
    UnmappedEntity(String),

    /// The entity declares its fields and this one is not among them
    #[error("Unknown field '{field}' on entity '{entity}'")]
    UnknownField { entity: String, field: String },

    /// A field name or alias is not a plain SQL identifier
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Unbalanced parentheses, dangling combinators or wrong operand arity
    #[error("Malformed filter expression: {0}")]
    MalformedFilter(String),

    /// The `strict` missing ORDER BY policy rejected a query
    #[error("Query has no ORDER BY clause: {0}")]
    MissingOrderBy(String),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl QueryGenError {
    /// Create a malformed filter error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedFilter(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an unknown field error
    pub fn unknown_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            entity: entity.into(),
            field: field.into(),
        }
    }

    /// Check if this error comes from the entity mapping (unmapped entity or unknown field)
    pub fn is_mapping_error(&self) -> bool {
        matches!(self, Self::UnmappedEntity(_) | Self::UnknownField { .. })
    }

    /// Check if this is a malformed filter expression
    pub fn is_malformed_filter(&self) -> bool {
        matches!(self, Self::MalformedFilter(_))
    }
}

impl From<toml::de::Error> for QueryGenError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for QueryGenError {
    fn from(err: std::io::Error) -> Self {
        Self::Config(err.to_string())
    }
}
