//! Error types for Bartleby

use thiserror::Error;

/// The main error type for Bartleby operations
#[derive(Error, Debug)]
pub enum Error {
    /// A value that has no SQL literal representation
    #[error("Unescapable value: {kind}")]
    UnescapableValueKind { kind: String },

    /// Identifier rejected by the strict name helper
    #[error("Invalid column name format: '{name}'")]
    InvalidColumnNameFormat { name: String },

    /// Bulk statement built from an empty row set
    #[error("rows must have data")]
    EmptyRowSet,

    /// Extra bulk columns collide with row columns
    #[error("duplicate column name '{name}' between rows and extra columns")]
    DuplicateColumnName { name: String },

    /// Bulk row whose key list differs from the first row
    #[error("invalid rows[{row}], keys no match: {expected} and {found}")]
    RowShapeMismatch {
        row: usize,
        expected: String,
        found: String,
    },

    /// Column list entry with no SQL rendering
    #[error("Unsupported column expression: {kind}")]
    UnsupportedColumnExpression { kind: String },

    /// Result set does not have the shape a helper requires
    #[error("Malformed fetch shape: {message}")]
    MalformedFetchShape { message: String },

    /// Raw expression template could not be formatted
    #[error("Format error: {message}")]
    Format { message: String },

    /// Invalid query configuration
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    /// Invalid connection configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Database connection or execution error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience Result type for Bartleby operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn unescapable(kind: impl Into<String>) -> Self {
        Self::UnescapableValueKind { kind: kind.into() }
    }

    pub fn invalid_column_name(name: impl Into<String>) -> Self {
        Self::InvalidColumnNameFormat { name: name.into() }
    }

    pub fn duplicate_column(name: impl Into<String>) -> Self {
        Self::DuplicateColumnName { name: name.into() }
    }

    pub fn unsupported_column(kind: impl Into<String>) -> Self {
        Self::UnsupportedColumnExpression { kind: kind.into() }
    }

    pub fn malformed_fetch(message: impl Into<String>) -> Self {
        Self::MalformedFetchShape {
            message: message.into(),
        }
    }

    /// Create a new template formatting error
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create a new invalid query error
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
