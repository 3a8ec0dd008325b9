//! Recommendation provider
//!
//! A provider owns one version source, its override state, and the version
//! map computed from the source on first use.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::recommend::closure::ClosureWalker;
use crate::recommend::error::{RecommendError, RepositoryError, SourceFailure};
use crate::recommend::override_state::{OverrideState, OverrideStore};
use crate::recommend::pattern::GlobPattern;
use crate::recommend::repository::DescriptorRepository;
use crate::source::{
    IvyReader, MavenReader, ModuleId, PropertiesReader, SourceKind, SourceReader, VersionMap,
};

/// Where a provider's source content comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocator {
    /// A descriptor file on disk
    File(PathBuf),
    /// A module fetched through the repository at the provider's current version
    Module(ModuleId),
    /// Already-fetched content
    Content(String),
    /// Inline `group:artifact -> version` entries (properties only)
    Entries(Vec<(String, String)>),
}

impl SourceLocator {
    fn describe(&self) -> String {
        match self {
            SourceLocator::File(path) => format!("file {:?}", path),
            SourceLocator::Module(module) => format!("module {}", module),
            SourceLocator::Content(_) => "inline content".to_string(),
            SourceLocator::Entries(_) => "inline entries".to_string(),
        }
    }
}

/// A version source, closed over the supported formats
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSource {
    Ivy(SourceLocator),
    Maven(SourceLocator),
    Properties(SourceLocator),
}

impl ProviderSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            ProviderSource::Ivy(_) => SourceKind::Ivy,
            ProviderSource::Maven(_) => SourceKind::Maven,
            ProviderSource::Properties(_) => SourceKind::Properties,
        }
    }

    pub fn locator(&self) -> &SourceLocator {
        match self {
            ProviderSource::Ivy(locator)
            | ProviderSource::Maven(locator)
            | ProviderSource::Properties(locator) => locator,
        }
    }
}

/// Per-provider options
#[derive(Debug, Clone, Default)]
pub struct ProviderOptions {
    /// Merge the declared dependencies' own dependencies (Ivy only)
    pub transitive: bool,
    /// Let deeper transitive versions overwrite shallower ones
    pub override_transitive_deps: bool,
    /// `group:artifact` globs never eligible for update
    pub excludes: Vec<String>,
    /// Directory of the stored override file
    pub config_dir: PathBuf,
}

pub struct Provider {
    name: String,
    source: ProviderSource,
    transitive: bool,
    override_transitive_deps: bool,
    excludes: Vec<GlobPattern>,
    overrides: OverrideStore,
    map: OnceCell<Result<VersionMap, SourceFailure>>,
}

impl Provider {
    pub fn new(
        name: &str,
        source: ProviderSource,
        options: ProviderOptions,
        work_dir: &Path,
    ) -> Result<Self, RecommendError> {
        if options.transitive && source.kind() != SourceKind::Ivy {
            warn!(
                "Provider {} is not an Ivy provider; transitive has no effect",
                name
            );
        }
        let excludes = options
            .excludes
            .iter()
            .map(|pattern| GlobPattern::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: name.to_string(),
            source,
            transitive: options.transitive,
            override_transitive_deps: options.override_transitive_deps,
            excludes,
            overrides: OverrideStore::new(name, work_dir, &options.config_dir),
            map: OnceCell::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &ProviderSource {
        &self.source
    }

    pub fn short_kind(&self) -> &'static str {
        self.source.kind().as_str()
    }

    /// Module identity, when the provider is located by a module coordinate
    pub fn module(&self) -> Option<&ModuleId> {
        match self.source.locator() {
            SourceLocator::Module(module) => Some(module),
            _ => None,
        }
    }

    /// Check whether `key` (`group:artifact`) matches one of the exclude globs
    pub fn is_excluded(&self, key: &str) -> bool {
        self.excludes.iter().any(|pattern| pattern.matches(key))
    }

    pub fn override_state(&self) -> &OverrideState {
        self.overrides.state()
    }

    pub fn overrides(&self) -> &OverrideStore {
        &self.overrides
    }

    /// Version originally configured on the module coordinate
    pub fn configured_version(&self) -> Option<&str> {
        self.module().and_then(|m| m.version.as_deref())
    }

    /// Override version if any, else the configured version
    pub fn current_version(&self) -> Option<&str> {
        self.overrides
            .state()
            .version()
            .or_else(|| self.configured_version())
    }

    /// Reads the override files into memory. Safe to call repeatedly.
    pub fn initialize_version(&mut self) -> Result<&OverrideState, RecommendError> {
        let before = self.overrides.state().clone();
        let state = self.overrides.initialize()?;
        if *state != before {
            self.map.take();
        }
        Ok(self.overrides.state())
    }

    pub fn set(&mut self, version: &str, local: bool) -> Result<(), RecommendError> {
        self.overrides.set(version, local)?;
        self.map.take();
        Ok(())
    }

    pub fn reset(&mut self) -> Result<(), RecommendError> {
        self.overrides.reset()?;
        self.map.take();
        Ok(())
    }

    pub fn store(&mut self) -> Result<PathBuf, RecommendError> {
        self.overrides.store()
    }

    /// The provider's version map, computed at most once until invalidated
    pub fn version_map(
        &self,
        repository: &dyn DescriptorRepository,
    ) -> Result<&VersionMap, RecommendError> {
        self.map
            .get_or_init(|| self.compute_map(repository))
            .as_ref()
            .map_err(|failure| failure.clone().into_error(&self.name))
    }

    /// Looks up a coordinate: the override first, then exact key, then `group:*`
    pub fn lookup(
        &self,
        group: &str,
        name: &str,
        repository: &dyn DescriptorRepository,
    ) -> Result<Option<String>, RecommendError> {
        if let Some(version) = self.overrides.state().version() {
            return Ok(Some(version.to_string()));
        }
        Ok(self
            .version_map(repository)?
            .lookup(group, name)
            .map(str::to_string))
    }

    /// Reads and parses the source into a fresh version map
    pub fn compute_map(
        &self,
        repository: &dyn DescriptorRepository,
    ) -> Result<VersionMap, SourceFailure> {
        let origin = self.source.locator().describe();
        let kind = self.source.kind();
        let malformed = |source| SourceFailure::Malformed {
            origin: origin.clone(),
            source,
        };

        let map = match (&self.source, self.source.locator()) {
            (ProviderSource::Properties(_), SourceLocator::Entries(entries)) => {
                PropertiesReader::new()
                    .from_entries(entries.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                    .map_err(malformed)?
            }
            (ProviderSource::Ivy(_), locator) => {
                let content = self.read_content(locator, kind, repository)?;
                let descriptor = IvyReader::new()
                    .parse_descriptor(&content)
                    .map_err(malformed)?;
                let mut map = if self.transitive {
                    ClosureWalker::new(repository, self.override_transitive_deps)
                        .expand(&descriptor)?
                } else {
                    descriptor.to_version_map()
                };
                // The filter module itself resolves to its own version
                if let Some(module) = self.module()
                    && let Some(version) = self.current_version()
                {
                    map.insert(module.key(), version);
                }
                map
            }
            (ProviderSource::Maven(_), locator) => {
                let content = self.read_content(locator, kind, repository)?;
                MavenReader::new().parse(&content).map_err(malformed)?
            }
            (ProviderSource::Properties(_), locator) => {
                let content = self.read_content(locator, kind, repository)?;
                PropertiesReader::new().parse(&content).map_err(malformed)?
            }
        };

        info!(
            "Provider {} ({}) recommends {} versions",
            self.name,
            self.short_kind(),
            map.len()
        );
        Ok(map)
    }

    fn read_content(
        &self,
        locator: &SourceLocator,
        kind: SourceKind,
        repository: &dyn DescriptorRepository,
    ) -> Result<String, SourceFailure> {
        let unavailable = |message: String| SourceFailure::Unavailable {
            origin: locator.describe(),
            message,
        };
        match locator {
            SourceLocator::File(path) => {
                debug!("Reading {} source of {} from {:?}", kind.as_str(), self.name, path);
                std::fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))
            }
            SourceLocator::Content(content) => Ok(content.clone()),
            SourceLocator::Entries(_) => Err(unavailable(format!(
                "inline entries are not a {} source",
                kind.as_str()
            ))),
            SourceLocator::Module(module) => {
                let current = self.current_version().ok_or_else(|| {
                    unavailable(format!("no version known for {}", module.key()))
                })?;
                match self.fetch_module(module, current, kind, repository) {
                    Err(RepositoryError::NotFound(_))
                        if Some(current) != self.configured_version() =>
                    {
                        // Local versions are never published; fall back to the configured one
                        let configured = self.configured_version().ok_or_else(|| {
                            unavailable(format!("{} is not published", module.with_version(current)))
                        })?;
                        warn!(
                            "{} is not published, reading {} for provider {}",
                            module.with_version(current),
                            configured,
                            self.name
                        );
                        self.fetch_module(module, configured, kind, repository)
                            .map_err(|e| unavailable(e.to_string()))
                    }
                    result => result.map_err(|e| unavailable(e.to_string())),
                }
            }
        }
    }

    fn fetch_module(
        &self,
        module: &ModuleId,
        version: &str,
        kind: SourceKind,
        repository: &dyn DescriptorRepository,
    ) -> Result<String, RepositoryError> {
        let versioned = module.with_version(version);
        match kind {
            SourceKind::Maven => repository.fetch_pom(&versioned),
            _ => repository.fetch_ivy(&versioned),
        }
    }
}
