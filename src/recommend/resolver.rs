//! Recommendation resolver for one build scope
//!
//! Holds the scope's providers in declaration order and answers lookups:
//! the first provider with a non-empty answer wins. Lifecycle is two-phase:
//! providers are added with [`Recommender::configure`] (no I/O), then
//! [`Recommender::initialize`] reads override files and builds version maps.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, RecommenderConfig};
use crate::recommend::error::RecommendError;
use crate::recommend::override_state::local_version;
use crate::recommend::provider::Provider;
use crate::recommend::repository::DescriptorRepository;
use crate::recommend::update::UpdatePolicy;

/// Resolver-level policy flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverPolicy {
    /// Recommended versions win over versions pinned by the caller
    pub force_recommender_version: bool,
    /// Caller scopes that are never rewritten
    pub excluded_scopes: HashSet<String>,
}

/// A dependency as requested by the host build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRequest {
    pub group: String,
    pub name: String,
    /// Version pinned by the caller, if any
    pub version: Option<String>,
    /// Named scope (configuration) the dependency is declared in
    pub scope: Option<String>,
}

impl DependencyRequest {
    pub fn new(group: &str, name: &str) -> Self {
        Self {
            group: group.to_string(),
            name: name.to_string(),
            version: None,
            scope: None,
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string()).filter(|v| !v.is_empty());
        self
    }

    pub fn in_scope(mut self, scope: &str) -> Self {
        self.scope = Some(scope.to_string());
        self
    }
}

/// Outcome of resolving a dependency request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A provider supplied the version
    Recommended(String),
    /// The caller's own version is kept
    Pinned(String),
    /// The request's scope is excluded and is left unmodified
    ScopeExcluded,
}

/// External collaborator notified after a version is stored (e.g. a commit step)
pub trait StoreListener {
    fn stored(&self, provider: &str, file: &Path) -> anyhow::Result<()>;
}

pub struct Recommender {
    providers: IndexMap<String, Provider>,
    repository: Arc<dyn DescriptorRepository>,
    policy: ResolverPolicy,
    update_policy: UpdatePolicy,
    work_dir: PathBuf,
    version_parameters: HashMap<String, String>,
    store_listener: Option<Box<dyn StoreListener>>,
    initialized: bool,
}

impl Recommender {
    pub fn new(work_dir: impl Into<PathBuf>, repository: Arc<dyn DescriptorRepository>) -> Self {
        Self {
            providers: IndexMap::new(),
            repository,
            policy: ResolverPolicy::default(),
            update_policy: UpdatePolicy::default(),
            work_dir: work_dir.into(),
            version_parameters: HashMap::new(),
            store_listener: None,
            initialized: false,
        }
    }

    /// Builds a configured (not yet initialized) recommender from a loaded configuration
    pub fn from_config(
        config: &RecommenderConfig,
        project_dir: &Path,
        repository: Arc<dyn DescriptorRepository>,
    ) -> Result<Self, ConfigError> {
        let mut recommender = Recommender::new(&config.work_dir, repository)
            .with_policy(ResolverPolicy {
                force_recommender_version: config.force_recommender_version,
                excluded_scopes: config.excluded_scopes.iter().cloned().collect(),
            })
            .with_update_policy(UpdatePolicy::from_config(&config.update)?)
            .with_version_parameters(config.version_parameters.clone());

        for provider_config in &config.providers {
            let provider = Provider::new(
                &provider_config.name,
                provider_config.source()?,
                provider_config.options(project_dir),
                &config.work_dir,
            )?;
            recommender.configure(provider)?;
        }
        Ok(recommender)
    }

    pub fn with_policy(mut self, policy: ResolverPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_update_policy(mut self, update_policy: UpdatePolicy) -> Self {
        self.update_policy = update_policy;
        self
    }

    pub fn with_version_parameters(mut self, parameters: HashMap<String, String>) -> Self {
        self.version_parameters = parameters;
        self
    }

    pub fn with_store_listener(mut self, listener: Box<dyn StoreListener>) -> Self {
        self.store_listener = Some(listener);
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn repository(&self) -> &dyn DescriptorRepository {
        self.repository.as_ref()
    }

    pub fn policy(&self) -> &ResolverPolicy {
        &self.policy
    }

    pub fn update_policy(&self) -> &UpdatePolicy {
        &self.update_policy
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Adds a provider. Only allowed before [`Recommender::initialize`].
    pub fn configure(&mut self, provider: Provider) -> Result<(), RecommendError> {
        if self.initialized {
            return Err(RecommendError::AlreadyInitialized);
        }
        if self.providers.contains_key(provider.name()) {
            return Err(RecommendError::DuplicateProvider(provider.name().to_string()));
        }
        debug!(
            "Configured provider {} ({})",
            provider.name(),
            provider.short_kind()
        );
        self.providers.insert(provider.name().to_string(), provider);
        Ok(())
    }

    /// Reads override state and builds every provider's version map.
    ///
    /// Failures are isolated per provider and returned; a failed provider
    /// keeps reporting its error on lookup. Calling this again is a no-op.
    pub fn initialize(&mut self) -> Vec<RecommendError> {
        if self.initialized {
            return Vec::new();
        }
        let mut failures = Vec::new();
        for provider in self.providers.values_mut() {
            if let Err(e) = provider.initialize_version() {
                error!("Failed to read override state of {}: {}", provider.name(), e);
                failures.push(e);
                continue;
            }
            if let Err(e) = provider.version_map(self.repository.as_ref()) {
                error!("Failed to initialize provider {}: {}", provider.name(), e);
                failures.push(e);
            }
        }
        self.initialized = true;
        info!(
            "Initialized {} providers ({} failed)",
            self.providers.len(),
            failures.len()
        );
        failures
    }

    /// Re-reads every provider's override files. Safe to call repeatedly.
    pub fn initialize_versions(&mut self) -> Result<(), RecommendError> {
        for provider in self.providers.values_mut() {
            provider.initialize_version()?;
        }
        Ok(())
    }

    pub fn providers(&self) -> impl Iterator<Item = &Provider> {
        self.providers.values()
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    pub fn provider(&self, name: &str) -> Result<&Provider, RecommendError> {
        self.providers
            .get(name)
            .ok_or_else(|| RecommendError::UnknownProvider(name.to_string()))
    }

    pub(crate) fn provider_mut(&mut self, name: &str) -> Result<&mut Provider, RecommendError> {
        self.providers
            .get_mut(name)
            .ok_or_else(|| RecommendError::UnknownProvider(name.to_string()))
    }

    /// Finds the recommended version and the name of the provider that supplied it
    pub fn find(&self, group: &str, name: &str) -> Result<Option<(&str, String)>, RecommendError> {
        for provider in self.providers.values() {
            if let Some(version) = provider.lookup(group, name, self.repository.as_ref())? {
                debug!(
                    "{}:{} -> {} (from {})",
                    group,
                    name,
                    version,
                    provider.name()
                );
                return Ok(Some((provider.name(), version)));
            }
        }
        Ok(None)
    }

    /// Recommended version of a coordinate; fails with `NoVersion` when no provider answers
    pub fn lookup(&self, group: &str, name: &str) -> Result<String, RecommendError> {
        self.find(group, name)?
            .map(|(_, version)| version)
            .ok_or_else(|| RecommendError::NoVersion {
                group: group.to_string(),
                name: name.to_string(),
            })
    }

    /// Decides the version of a requested dependency under the resolver policy
    pub fn resolve_request(
        &self,
        request: &DependencyRequest,
    ) -> Result<Resolution, RecommendError> {
        if let Some(scope) = &request.scope
            && self.policy.excluded_scopes.contains(scope)
        {
            warn!(
                "Scope {} is excluded from recommendations, leaving {}:{} unmodified",
                scope, request.group, request.name
            );
            return Ok(Resolution::ScopeExcluded);
        }

        match &request.version {
            Some(pinned) if !self.policy.force_recommender_version => {
                Ok(Resolution::Pinned(pinned.clone()))
            }
            Some(pinned) => match self.find(&request.group, &request.name)? {
                Some((_, version)) => Ok(Resolution::Recommended(version)),
                None => Ok(Resolution::Pinned(pinned.clone())),
            },
            None => self
                .lookup(&request.group, &request.name)
                .map(Resolution::Recommended),
        }
    }

    fn parameter(&self, provider: &str) -> Option<&str> {
        self.version_parameters
            .get(provider)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Sets a working version: the given one, else the provider's version parameter
    pub fn set(&mut self, provider: &str, version: Option<&str>) -> Result<String, RecommendError> {
        let version = version
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.parameter(provider))
            .map(str::to_string)
            .ok_or_else(|| RecommendError::MissingVersionParameter {
                provider: provider.to_string(),
            })?;
        self.provider_mut(provider)?.set(&version, false)?;
        Ok(version)
    }

    /// Sets a local working version, derived from the current one when none is given
    pub fn set_local(
        &mut self,
        provider: &str,
        version: Option<&str>,
    ) -> Result<String, RecommendError> {
        let current = self.provider(provider)?.current_version().map(str::to_string);
        let base = version
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.parameter(provider))
            .map(str::to_string)
            .or(current)
            .ok_or_else(|| RecommendError::MissingVersionParameter {
                provider: provider.to_string(),
            })?;
        let version = local_version(&base);
        self.provider_mut(provider)?.set(&version, true)?;
        Ok(version)
    }

    /// Applies [`Recommender::set`] to every provider
    pub fn set_all(&mut self, version: Option<&str>) -> Vec<(String, Result<String, RecommendError>)> {
        self.provider_names()
            .into_iter()
            .map(|name| {
                let result = self.set(&name, version);
                (name, result)
            })
            .collect()
    }

    /// Applies [`Recommender::set_local`] to every provider
    pub fn set_local_all(
        &mut self,
        version: Option<&str>,
    ) -> Vec<(String, Result<String, RecommendError>)> {
        self.provider_names()
            .into_iter()
            .map(|name| {
                let result = self.set_local(&name, version);
                (name, result)
            })
            .collect()
    }

    /// Drops working versions of one provider, or of all when `provider` is `None`
    pub fn reset(&mut self, provider: Option<&str>) -> Result<(), RecommendError> {
        match provider {
            Some(name) => self.provider_mut(name)?.reset(),
            None => self
                .providers
                .values_mut()
                .try_for_each(|provider| provider.reset()),
        }
    }

    /// Persists a provider's working version and returns the written file
    pub fn store(&mut self, provider: &str) -> Result<PathBuf, RecommendError> {
        let file = self.provider_mut(provider)?.store()?;
        if let Some(listener) = &self.store_listener
            && let Err(e) = listener.stored(provider, &file)
        {
            error!("Store listener failed for {}: {}", provider, e);
        }
        Ok(file)
    }

    /// Persists every provider that has a working version; the others are skipped
    pub fn store_all(&mut self) -> Result<Vec<PathBuf>, RecommendError> {
        let mut written = Vec::new();
        for name in self.provider_names() {
            match self.store(&name) {
                Ok(file) => written.push(file),
                Err(RecommendError::NothingToStore { .. }) => {
                    debug!("Nothing to store for {}", name);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::override_state::OverrideState;
    use crate::recommend::provider::{ProviderOptions, ProviderSource, SourceLocator};
    use crate::recommend::repository::MockDescriptorRepository;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn properties_provider(temp_dir: &TempDir, name: &str, entries: &[(&str, &str)]) -> Provider {
        Provider::new(
            name,
            ProviderSource::Properties(SourceLocator::Entries(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            )),
            ProviderOptions {
                config_dir: temp_dir.path().to_path_buf(),
                ..Default::default()
            },
            &temp_dir.path().join("build"),
        )
        .unwrap()
    }

    fn recommender(temp_dir: &TempDir) -> Recommender {
        let mut recommender = Recommender::new(
            temp_dir.path().join("build"),
            Arc::new(MockDescriptorRepository::new()),
        );
        recommender
            .configure(properties_provider(
                temp_dir,
                "first",
                &[("g:a", "1.0"), ("h:*", "5.0")],
            ))
            .unwrap();
        recommender
            .configure(properties_provider(
                temp_dir,
                "second",
                &[("g:a", "2.0"), ("g:b", "2.1")],
            ))
            .unwrap();
        assert!(recommender.initialize().is_empty());
        recommender
    }

    #[test]
    fn lookup_returns_first_provider_answer() {
        let temp_dir = TempDir::new().unwrap();
        let recommender = recommender(&temp_dir);

        assert_eq!(recommender.lookup("g", "a").unwrap(), "1.0");
        assert_eq!(recommender.lookup("g", "b").unwrap(), "2.1");
        assert_eq!(
            recommender.find("g", "b").unwrap(),
            Some(("second", "2.1".to_string()))
        );
    }

    #[test]
    fn lookup_falls_back_to_wildcard_entry() {
        let temp_dir = TempDir::new().unwrap();
        let recommender = recommender(&temp_dir);

        assert_eq!(recommender.lookup("h", "anything").unwrap(), "5.0");
    }

    #[test]
    fn lookup_fails_with_no_version_for_unknown_coordinate() {
        let temp_dir = TempDir::new().unwrap();
        let recommender = recommender(&temp_dir);

        assert!(matches!(
            recommender.lookup("x", "y"),
            Err(RecommendError::NoVersion { .. })
        ));
    }

    #[test]
    fn configure_rejects_duplicates_and_late_providers() {
        let temp_dir = TempDir::new().unwrap();
        let mut recommender = Recommender::new(
            temp_dir.path().join("build"),
            Arc::new(MockDescriptorRepository::new()),
        );
        recommender
            .configure(properties_provider(&temp_dir, "p", &[]))
            .unwrap();

        assert!(matches!(
            recommender.configure(properties_provider(&temp_dir, "p", &[])),
            Err(RecommendError::DuplicateProvider(_))
        ));

        recommender.initialize();
        assert!(matches!(
            recommender.configure(properties_provider(&temp_dir, "q", &[])),
            Err(RecommendError::AlreadyInitialized)
        ));
    }

    #[test]
    fn initialize_isolates_malformed_provider() {
        let temp_dir = TempDir::new().unwrap();
        let mut recommender = Recommender::new(
            temp_dir.path().join("build"),
            Arc::new(MockDescriptorRepository::new()),
        );
        recommender
            .configure(properties_provider(&temp_dir, "good", &[("g:a", "1.0")]))
            .unwrap();
        recommender
            .configure(
                Provider::new(
                    "bad",
                    ProviderSource::Maven(SourceLocator::Content("<project".to_string())),
                    ProviderOptions {
                        config_dir: temp_dir.path().to_path_buf(),
                        ..Default::default()
                    },
                    &temp_dir.path().join("build"),
                )
                .unwrap(),
            )
            .unwrap();

        let failures = recommender.initialize();

        assert_eq!(failures.len(), 1);
        assert_eq!(recommender.lookup("g", "a").unwrap(), "1.0");
        assert!(matches!(
            recommender.lookup("g", "other"),
            Err(RecommendError::MalformedSource { .. })
        ));
    }

    #[test]
    fn set_overrides_lookup_of_provider() {
        let temp_dir = TempDir::new().unwrap();
        let mut recommender = recommender(&temp_dir);

        recommender.set("first", Some("9.9.9")).unwrap();

        assert_eq!(recommender.lookup("g", "a").unwrap(), "9.9.9");
    }

    #[test]
    fn set_uses_version_parameter_when_no_version_given() {
        let temp_dir = TempDir::new().unwrap();
        let mut recommender = recommender(&temp_dir).with_version_parameters(HashMap::from([(
            "second".to_string(),
            "3.0".to_string(),
        )]));

        assert_eq!(recommender.set("second", None).unwrap(), "3.0");
        assert!(matches!(
            recommender.set("first", None),
            Err(RecommendError::MissingVersionParameter { .. })
        ));
    }

    #[test]
    fn set_local_without_derivable_version_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut recommender = recommender(&temp_dir);

        assert!(matches!(
            recommender.set_local("first", None),
            Err(RecommendError::MissingVersionParameter { .. })
        ));
    }

    #[test]
    fn set_local_derives_version_from_current_override() {
        let temp_dir = TempDir::new().unwrap();
        let mut recommender = recommender(&temp_dir);
        recommender.set("first", Some("1.5.0")).unwrap();

        let version = recommender.set_local("first", None).unwrap();

        assert_eq!(version, "1.5.0-LOCAL");
        assert_eq!(
            recommender.provider("first").unwrap().override_state(),
            &OverrideState::Working {
                version: "1.5.0-LOCAL".to_string(),
                local: true
            }
        );
    }

    #[test]
    fn reset_all_restores_computed_maps() {
        let temp_dir = TempDir::new().unwrap();
        let mut recommender = recommender(&temp_dir);
        recommender.set_all(Some("9.9.9"));

        recommender.reset(None).unwrap();
        recommender.reset(None).unwrap();

        assert_eq!(recommender.lookup("g", "a").unwrap(), "1.0");
    }

    #[test]
    fn store_notifies_listener_and_store_all_skips_unset_providers() {
        struct Recording(Rc<RefCell<Vec<String>>>);
        impl StoreListener for Recording {
            fn stored(&self, provider: &str, _file: &Path) -> anyhow::Result<()> {
                self.0.borrow_mut().push(provider.to_string());
                Ok(())
            }
        }

        let temp_dir = TempDir::new().unwrap();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut recommender =
            recommender(&temp_dir).with_store_listener(Box::new(Recording(calls.clone())));
        recommender.set("second", Some("4.0")).unwrap();

        let written = recommender.store_all().unwrap();

        assert_eq!(written, vec![temp_dir.path().join(".second.version")]);
        assert_eq!(*calls.borrow(), vec!["second".to_string()]);
    }

    #[test]
    fn initialize_versions_picks_up_external_working_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut recommender = recommender(&temp_dir);
        std::fs::create_dir_all(temp_dir.path().join("build")).unwrap();
        std::fs::write(temp_dir.path().join("build/.second.version"), "7.0\n").unwrap();

        recommender.initialize_versions().unwrap();

        assert_eq!(recommender.lookup("g", "b").unwrap(), "7.0");
        assert_eq!(recommender.lookup("g", "a").unwrap(), "1.0");
    }

    #[test]
    fn store_without_working_version_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut recommender = recommender(&temp_dir);

        assert!(matches!(
            recommender.store("first"),
            Err(RecommendError::NothingToStore { .. })
        ));
    }

    #[test]
    fn resolve_request_keeps_pinned_version_unless_forced() {
        let temp_dir = TempDir::new().unwrap();
        let recommender = recommender(&temp_dir);
        let request = DependencyRequest::new("g", "a").with_version("0.1");

        assert_eq!(
            recommender.resolve_request(&request).unwrap(),
            Resolution::Pinned("0.1".to_string())
        );

        let forced = recommender.with_policy(ResolverPolicy {
            force_recommender_version: true,
            ..Default::default()
        });
        assert_eq!(
            forced.resolve_request(&request).unwrap(),
            Resolution::Recommended("1.0".to_string())
        );
        assert_eq!(
            forced
                .resolve_request(&DependencyRequest::new("x", "y").with_version("0.2"))
                .unwrap(),
            Resolution::Pinned("0.2".to_string())
        );
    }

    #[test]
    fn resolve_request_skips_excluded_scopes() {
        let temp_dir = TempDir::new().unwrap();
        let recommender = recommender(&temp_dir).with_policy(ResolverPolicy {
            excluded_scopes: HashSet::from(["test".to_string()]),
            ..Default::default()
        });

        assert_eq!(
            recommender
                .resolve_request(&DependencyRequest::new("x", "y").in_scope("test"))
                .unwrap(),
            Resolution::ScopeExcluded
        );
        assert!(matches!(
            recommender.resolve_request(&DependencyRequest::new("x", "y").in_scope("compile")),
            Err(RecommendError::NoVersion { .. })
        ));
    }
}
