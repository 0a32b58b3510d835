//! Error types for the object model and its persistence envelope.

use thiserror::Error;

/// Main error type for object-model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A prefix has no binding in any enclosing scope.
    #[error("Unbound namespace prefix: '{0}'")]
    UnboundPrefix(String),

    /// Text that should be a qualified name is not one.
    #[error("Invalid qualified name: {0}")]
    InvalidQName(String),

    /// Envelope magic number is not a known format family.
    #[error("Unknown magic number: {}", hex(.0))]
    UnknownMagic(Vec<u8>),

    /// Envelope format tag is not supported by this build.
    #[error("Unsupported envelope format: 0x{0:04x}")]
    UnsupportedFormat(u16),

    /// Envelope carries the nil GUID.
    #[error("Envelope GUID must not be nil")]
    NilGuid,

    /// Frame header and body disagree.
    #[error("Envelope frame mismatch: {0}")]
    FrameMismatch(String),

    /// JSON (de)serialization of the envelope body failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error while reading or writing an envelope.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_magic_display() {
        let err = ModelError::UnknownMagic(vec![0xca, 0xfe]);
        assert_eq!(err.to_string(), "Unknown magic number: cafe");
    }

    #[test]
    fn test_unsupported_format_display() {
        let err = ModelError::UnsupportedFormat(0x10);
        assert_eq!(err.to_string(), "Unsupported envelope format: 0x0010");
    }
}
