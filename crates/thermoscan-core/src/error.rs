//! Error types for Thermoscan

/// Result type alias using Thermoscan's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Thermoscan operations
///
/// Classification, severity and ordering decisions are total and never
/// produce one of these; errors come from configuration and from the
/// decoder/renderer collaborators.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Category table failed validation
    #[error("category table error: {0}")]
    CategoryTable(String),

    /// Narrative table failed validation
    #[error("narrative table error: {0}")]
    Narrative(String),

    /// Capture decoding failed
    #[error("decode error for '{filename}': {message}")]
    Decode { filename: String, message: String },

    /// Report rendering failed
    #[error("render error: {0}")]
    Render(String),

    /// A report was requested without any captures
    #[error("no captures submitted")]
    EmptyBatch,

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new category table error
    pub fn category_table(msg: impl Into<String>) -> Self {
        Self::CategoryTable(msg.into())
    }

    /// Create a new narrative table error
    pub fn narrative(msg: impl Into<String>) -> Self {
        Self::Narrative(msg.into())
    }

    /// Create a new decode error for one capture
    pub fn decode(filename: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Decode {
            filename: filename.into(),
            message: msg.into(),
        }
    }

    /// Create a new render error
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::decode("IR_0001.BMT", "truncated header");
        assert_eq!(
            err.to_string(),
            "decode error for 'IR_0001.BMT': truncated header"
        );

        let err = Error::category_table("duplicate rank 2");
        assert_eq!(err.to_string(), "category table error: duplicate rank 2");
    }
}
