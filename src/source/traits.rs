//! Source reader trait definition

use crate::source::types::{SourceKind, VersionMap};

/// Trait for reading a version source into a flat version map
pub trait SourceReader {
    /// Returns the kind of source this reader handles
    fn kind(&self) -> SourceKind;

    /// Parse the content into a version map
    ///
    /// A structurally invalid document yields an error, never a partial map.
    fn parse(&self, content: &str) -> Result<VersionMap, SourceError>;
}

/// Error type for reading version sources
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The document is not well-formed
    #[error("Malformed {kind} source: {message}")]
    Malformed { kind: &'static str, message: String },

    /// The document is well-formed but misses a required element
    #[error("Invalid {kind} source: {message}")]
    InvalidStructure { kind: &'static str, message: String },
}

impl SourceError {
    pub fn malformed(kind: SourceKind, message: impl Into<String>) -> Self {
        SourceError::Malformed {
            kind: kind.as_str(),
            message: message.into(),
        }
    }

    pub fn invalid(kind: SourceKind, message: impl Into<String>) -> Self {
        SourceError::InvalidStructure {
            kind: kind.as_str(),
            message: message.into(),
        }
    }
}
