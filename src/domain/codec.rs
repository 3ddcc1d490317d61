//! JSON encoding of [`Document`]s.
//!
//! The encoding is compact and lossless: `deserialize(serialize(doc)) == doc`
//! for every document, and re-encoding well-formed input yields the same JSON
//! object up to key order.

use crate::domain::document::Document;
use std::path::{Path, PathBuf};

/// Error returned when a document cannot be encoded or decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// No document was supplied
    Nothing,
    /// The document could not be encoded
    Encode(String),
    /// The input text is not a valid document
    Malformed(String),
    /// The document file could not be read
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O failure
        reason: String,
    },
}

impl std::fmt::Display for SerializationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializationError::Nothing => write!(f, "nothing to serialize"),
            SerializationError::Encode(reason) => {
                write!(f, "failed to encode document: {}", reason)
            }
            SerializationError::Malformed(reason) => {
                write!(f, "malformed document: {}", reason)
            }
            SerializationError::Io { path, reason } => {
                write!(f, "failed to read {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for SerializationError {}

/// Encode a document as compact JSON.
///
/// `None` is an error rather than an empty result.
///
/// # Example
/// ```
/// use crpt_throttle::{codec, Document, SerializationError};
///
/// let document = Document {
///     doc_id: Some("123".to_string()),
///     ..Document::default()
/// };
///
/// assert_eq!(codec::serialize(Some(&document)).unwrap(), r#"{"doc_id":"123","products":[]}"#);
/// assert_eq!(codec::serialize(None), Err(SerializationError::Nothing));
/// ```
pub fn serialize(document: Option<&Document>) -> Result<String, SerializationError> {
    let document = document.ok_or(SerializationError::Nothing)?;
    serde_json::to_string(document).map_err(|e| SerializationError::Encode(e.to_string()))
}

/// Decode a document from JSON text.
///
/// Missing keys become `None` (or an empty product list); unknown keys are
/// ignored.
pub fn deserialize(text: &str) -> Result<Document, SerializationError> {
    serde_json::from_str(text).map_err(|e| SerializationError::Malformed(e.to_string()))
}

/// Read and decode a document from a JSON file.
pub fn read_document(path: impl AsRef<Path>) -> Result<Document, SerializationError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| SerializationError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    deserialize(&text)
}
