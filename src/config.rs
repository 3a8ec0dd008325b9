use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::recommend::error::RecommendError;
use crate::recommend::ordering::UpdateScope;
use crate::recommend::provider::{ProviderOptions, ProviderSource, SourceLocator};
use crate::recommend::repository::RepositoryLayout;
use crate::source::{ModuleId, SourceKind};

// =============================================================================
// Defaults
// =============================================================================

/// Qualifier appended to versions that are not release-ready
pub const LOCAL_SUFFIX: &str = "-LOCAL";

/// Default configuration file name, looked up in the project root
pub const DEFAULT_CONFIG_FILE: &str = "recommendations.json";

/// Default ephemeral directory for working override files
pub const DEFAULT_WORK_DIR: &str = "build/recommendations";

/// Default local repository directory
pub const DEFAULT_REPOSITORY_DIR: &str = "repository";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid provider '{provider}': {message}")]
    InvalidProvider { provider: String, message: String },

    #[error(transparent)]
    Recommend(#[from] RecommendError),
}

/// Recommender configuration for one build scope
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RecommenderConfig {
    /// Directory of working override files
    pub work_dir: PathBuf,
    /// Recommended versions win over versions pinned by the caller
    pub force_recommender_version: bool,
    /// Caller scopes that are never rewritten
    pub excluded_scopes: Vec<String>,
    pub repository: RepositoryConfig,
    /// Base URL of a Maven repository queried for available versions
    pub metadata_url: Option<String>,
    /// Externally supplied versions, keyed by provider name
    pub version_parameters: HashMap<String, String>,
    pub providers: Vec<ProviderConfig>,
    pub update: UpdateConfig,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
            force_recommender_version: false,
            excluded_scopes: Vec::new(),
            repository: RepositoryConfig::default(),
            metadata_url: None,
            version_parameters: HashMap::new(),
            providers: Vec::new(),
            update: UpdateConfig::default(),
        }
    }
}

/// Local repository view
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RepositoryConfig {
    pub root: PathBuf,
    pub layout: RepositoryLayout,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_REPOSITORY_DIR),
            layout: RepositoryLayout::default(),
        }
    }
}

/// Individual provider declaration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub name: String,
    pub kind: SourceKind,
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// `group:name[:version]` fetched through the repository
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub entries: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub transitive: bool,
    #[serde(default)]
    pub override_transitive_deps: bool,
    #[serde(default)]
    pub excludes: Vec<String>,
    /// Directory of the stored override file, defaults to the project root
    #[serde(default)]
    pub config_dir: Option<PathBuf>,
}

impl ProviderConfig {
    fn invalid(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::InvalidProvider {
            provider: self.name.clone(),
            message: message.into(),
        }
    }

    /// Converts the declaration into a typed source with exactly one locator
    pub fn source(&self) -> Result<ProviderSource, ConfigError> {
        let mut locators = Vec::new();
        if let Some(file) = &self.file {
            locators.push(SourceLocator::File(file.clone()));
        }
        if let Some(module) = &self.module {
            let module: ModuleId = module.parse().map_err(|e: String| self.invalid(e))?;
            locators.push(SourceLocator::Module(module));
        }
        if let Some(content) = &self.content {
            locators.push(SourceLocator::Content(content.clone()));
        }
        if let Some(entries) = &self.entries {
            locators.push(SourceLocator::Entries(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ));
        }

        if locators.len() != 1 {
            return Err(self.invalid(
                "exactly one of file, module, content or entries must be given",
            ));
        }
        let locator = locators.remove(0);

        match (self.kind, &locator) {
            (SourceKind::Properties, SourceLocator::Module(_)) => {
                Err(self.invalid("properties providers cannot be located by module"))
            }
            (SourceKind::Ivy | SourceKind::Maven, SourceLocator::Entries(_)) => {
                Err(self.invalid("entries are only supported by properties providers"))
            }
            (SourceKind::Ivy, _) => Ok(ProviderSource::Ivy(locator)),
            (SourceKind::Maven, _) => Ok(ProviderSource::Maven(locator)),
            (SourceKind::Properties, _) => Ok(ProviderSource::Properties(locator)),
        }
    }

    /// Provider options with directories resolved against `project_dir`
    pub fn options(&self, project_dir: &Path) -> ProviderOptions {
        ProviderOptions {
            transitive: self.transitive,
            override_transitive_deps: self.override_transitive_deps,
            excludes: self.excludes.clone(),
            config_dir: self
                .config_dir
                .as_ref()
                .map(|dir| project_dir.join(dir))
                .unwrap_or_else(|| project_dir.to_path_buf()),
        }
    }
}

/// Update engine configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct UpdateConfig {
    /// Providers eligible for update; all providers when absent
    pub providers: Option<Vec<String>>,
    pub items: Vec<UpdateItemConfig>,
}

/// A filter rule of the update engine
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemConfig {
    /// Regex over the module's group (or `group:name`); matches everything when absent
    #[serde(default)]
    pub module_pattern: Option<String>,
    pub search_pattern: String,
    #[serde(default)]
    pub scope: UpdateScope,
}

impl RecommenderConfig {
    /// Loads the configuration and resolves relative paths against its directory
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: RecommenderConfig = serde_json::from_str(&content)?;
        let project_dir = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(project_dir);
        Ok(config)
    }

    fn resolve_paths(&mut self, project_dir: &Path) {
        self.work_dir = project_dir.join(&self.work_dir);
        self.repository.root = project_dir.join(&self.repository.root);
        for provider in &mut self.providers {
            if let Some(file) = &provider.file {
                provider.file = Some(project_dir.join(file));
            }
            provider.config_dir = Some(
                provider
                    .config_dir
                    .as_ref()
                    .map(|dir| project_dir.join(dir))
                    .unwrap_or_else(|| project_dir.to_path_buf()),
            );
        }
    }
}
