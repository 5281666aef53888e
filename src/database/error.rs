//! Error types for the database layer.

use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Failed to open or establish a database connection.
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    /// A query could not be executed (SQL, permission or transport failure).
    ///
    /// `message` already carries the driver's text; the driver error itself is
    /// kept in `cause` for downcasting and is not reported as a source.
    #[error("Query failed: {message}")]
    QueryFailed {
        message: String,
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The session has no usable schema on its search path.
    #[error("Could not resolve current schema from search path '{0}'")]
    SchemaNotResolved(String),

    /// A scalar query returned a value of an unexpected type.
    #[error("Unexpected value for {context}: {value}")]
    UnexpectedValue { context: String, value: String },
}

impl DbError {
    /// Wrap a driver error raised while executing a query
    pub fn query<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DbError::QueryFailed {
            message: err.to_string(),
            cause: Some(Box::new(err)),
        }
    }

    /// Check if this error indicates a query execution problem.
    #[must_use]
    pub fn is_query_error(&self) -> bool {
        matches!(self, DbError::QueryFailed { .. })
    }

    /// Check if this error indicates a connection problem.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, DbError::ConnectionFailed(_))
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        DbError::query(err)
    }
}

#[cfg(feature = "postgres")]
impl From<postgres::Error> for DbError {
    fn from(err: postgres::Error) -> Self {
        DbError::query(err)
    }
}

/// The query text could not be reconstructed for logging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryFormatError {
    /// A placeholder references a parameter that was not bound.
    #[error("placeholder {placeholder} has no bound parameter ({bound} bound)")]
    MissingParameter { placeholder: String, bound: usize },

    /// A placeholder index is not a valid number.
    #[error("invalid placeholder '{0}'")]
    InvalidPlaceholder(String),
}
