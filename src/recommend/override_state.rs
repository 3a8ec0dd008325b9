//! Per-provider override state
//!
//! Each provider owns two single-line version files named after it:
//! a working file under the ephemeral work directory and a stored file
//! under the provider's config directory. `reset` only ever removes the
//! working file.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::LOCAL_SUFFIX;
use crate::recommend::error::RecommendError;

/// In-memory override state of a provider
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OverrideState {
    #[default]
    Unset,
    Working { version: String, local: bool },
    Stored { version: String },
}

impl OverrideState {
    pub fn version(&self) -> Option<&str> {
        match self {
            OverrideState::Unset => None,
            OverrideState::Working { version, .. } | OverrideState::Stored { version } => {
                Some(version)
            }
        }
    }
}

/// Appends the local qualifier unless the version already carries it
pub fn local_version(version: &str) -> String {
    if version.ends_with(LOCAL_SUFFIX) {
        version.to_string()
    } else {
        format!("{}{}", version, LOCAL_SUFFIX)
    }
}

/// File name of a provider's override files
pub fn override_file_name(provider: &str) -> String {
    format!(".{}.version", provider)
}

#[derive(Debug, Clone)]
pub struct OverrideStore {
    provider: String,
    working_file: PathBuf,
    stored_file: PathBuf,
    state: OverrideState,
}

impl OverrideStore {
    pub fn new(provider: &str, work_dir: &Path, config_dir: &Path) -> Self {
        let file_name = override_file_name(provider);
        Self {
            provider: provider.to_string(),
            working_file: work_dir.join(&file_name),
            stored_file: config_dir.join(&file_name),
            state: OverrideState::Unset,
        }
    }

    pub fn state(&self) -> &OverrideState {
        &self.state
    }

    pub fn working_file(&self) -> &Path {
        &self.working_file
    }

    pub fn stored_file(&self) -> &Path {
        &self.stored_file
    }

    /// Rebuilds the in-memory state from disk: working file, else stored file, else unset
    pub fn initialize(&mut self) -> Result<&OverrideState, RecommendError> {
        self.state = if let Some(version) = read_version(&self.working_file)? {
            let local = version.ends_with(LOCAL_SUFFIX);
            OverrideState::Working { version, local }
        } else if let Some(version) = read_version(&self.stored_file)? {
            OverrideState::Stored { version }
        } else {
            OverrideState::Unset
        };
        debug!("Override state of {}: {:?}", self.provider, self.state);
        Ok(&self.state)
    }

    /// Records a working version
    pub fn set(&mut self, version: &str, local: bool) -> Result<(), RecommendError> {
        let version = version.trim();
        if version.is_empty() {
            return Err(RecommendError::MissingVersionParameter {
                provider: self.provider.clone(),
            });
        }
        write_version(&self.working_file, version)?;
        info!("Set working version of {} to {}", self.provider, version);
        self.state = OverrideState::Working {
            version: version.to_string(),
            local,
        };
        Ok(())
    }

    /// Drops the working version; the stored version, if any, becomes current again
    pub fn reset(&mut self) -> Result<(), RecommendError> {
        match std::fs::remove_file(&self.working_file) {
            Ok(()) => info!("Reset working version of {}", self.provider),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(RecommendError::Io {
                    path: self.working_file.clone(),
                    source,
                });
            }
        }
        self.state = match read_version(&self.stored_file)? {
            Some(version) => OverrideState::Stored { version },
            None => OverrideState::Unset,
        };
        Ok(())
    }

    /// Persists the working version to the stored file and returns its path
    pub fn store(&mut self) -> Result<PathBuf, RecommendError> {
        let OverrideState::Working { version, .. } = &self.state else {
            return Err(RecommendError::NothingToStore {
                provider: self.provider.clone(),
            });
        };
        let version = version.clone();
        write_version(&self.stored_file, &version)?;
        if let Err(source) = std::fs::remove_file(&self.working_file)
            && source.kind() != std::io::ErrorKind::NotFound
        {
            return Err(RecommendError::Io {
                path: self.working_file.clone(),
                source,
            });
        }
        info!(
            "Stored version {} of {} in {:?}",
            version, self.provider, self.stored_file
        );
        self.state = OverrideState::Stored { version };
        Ok(self.stored_file.clone())
    }
}

fn read_version(path: &Path) -> Result<Option<String>, RecommendError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let version = content.trim();
            Ok((!version.is_empty()).then(|| version.to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(RecommendError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_version(path: &Path, version: &str) -> Result<(), RecommendError> {
    let io_error = |source| RecommendError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, version).map_err(io_error)
}
