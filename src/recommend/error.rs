use std::path::PathBuf;

use thiserror::Error;

use crate::source::SourceError;

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("No recommended version for {group}:{name}")]
    NoVersion { group: String, name: String },

    #[error("Provider '{provider}' could not read {origin}: {source}")]
    MalformedSource {
        provider: String,
        origin: String,
        #[source]
        source: SourceError,
    },

    #[error("Provider '{provider}' could not fetch {origin}: {message}")]
    SourceUnavailable {
        provider: String,
        origin: String,
        message: String,
    },

    #[error("No version given for provider '{provider}' and none could be derived")]
    MissingVersionParameter { provider: String },

    #[error("Nothing to store for provider '{provider}': no working version is set")]
    NothingToStore { provider: String },

    #[error("Update query failed for provider '{provider}': {message}")]
    UpdateQuery { provider: String, message: String },

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Duplicate provider name: {0}")]
    DuplicateProvider(String),

    #[error("Providers cannot be added after initialization")]
    AlreadyInitialized,

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to build a provider's version map, kept so every later lookup reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFailure {
    Malformed { origin: String, source: SourceError },
    Unavailable { origin: String, message: String },
}

impl SourceFailure {
    pub fn into_error(self, provider: &str) -> RecommendError {
        match self {
            SourceFailure::Malformed { origin, source } => RecommendError::MalformedSource {
                provider: provider.to_string(),
                origin,
                source,
            },
            SourceFailure::Unavailable { origin, message } => RecommendError::SourceUnavailable {
                provider: provider.to_string(),
                origin,
                message,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Descriptor not found: {0}")]
    NotFound(String),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Module not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
