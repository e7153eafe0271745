//! Tool-specific error types.

use thiserror::Error;

/// Result type returned by tool handlers and adapter operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors that can occur during tool operations.
///
/// Every variant renders to a single human-readable line; that line is what
/// callers see when a tool invocation fails.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// A required parameter (or required default) was absent.
    ///
    /// Carries the label of the missing value, e.g. `"Keyspace"`.
    #[error("{0} required")]
    MissingParameter(String),

    /// Invalid arguments were provided to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// A JSON-encoded parameter failed to decode.
    #[error("{0}")]
    Parse(#[from] serde_json::Error),

    /// An enumerated value (index kind, format, strategy...) was not recognized.
    #[error("{0}")]
    Translation(String),

    /// The backend rejected the request or could not be reached.
    #[error("{backend} error: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },

    /// The backend configuration cannot produce a usable client.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "missing parameter" error from the value's label.
    pub fn missing(label: impl Into<String>) -> Self {
        Self::MissingParameter(label.into())
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a new translation error for an unrecognized enumerated value.
    pub fn translation(msg: impl Into<String>) -> Self {
        Self::Translation(msg.into())
    }

    /// Create a new backend error.
    pub fn backend(backend: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            backend,
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter_message() {
        let err = ToolError::missing("Where conditions");
        assert_eq!(err.to_string(), "Where conditions required");
    }

    #[test]
    fn test_backend_message() {
        let err = ToolError::backend("CouchDB", "not_found");
        assert_eq!(err.to_string(), "CouchDB error: not_found");
    }

    #[test]
    fn test_parse_error_is_unmodified() {
        let source = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let expected = source.to_string();
        let err = ToolError::from(source);
        assert_eq!(err.to_string(), expected);
    }
}
