//! Update engine
//!
//! Queries the published versions of a provider's module and advances its
//! working version to the greatest candidate allowed by the update policy.

use std::collections::HashSet;

use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::config::{LOCAL_SUFFIX, UpdateConfig};
use crate::recommend::error::RecommendError;
use crate::recommend::ordering::{UpdateScope, find_max, within_scope};
use crate::recommend::pattern::full_match_regex;
use crate::recommend::registry::VersionRegistry;
use crate::recommend::resolver::Recommender;
use crate::source::ModuleId;

/// Search pattern of the default update item: any version
pub const DEFAULT_SEARCH_PATTERN: &str = ".*";

/// A filter rule deciding how one family of modules is updated
#[derive(Debug, Clone)]
pub struct UpdateConfigItem {
    module_pattern: Regex,
    search_pattern: String,
    search_regex: Regex,
    scope: UpdateScope,
}

impl UpdateConfigItem {
    pub fn new(
        module_pattern: Option<&str>,
        search_pattern: &str,
        scope: UpdateScope,
    ) -> Result<Self, RecommendError> {
        let search_regex =
            Regex::new(search_pattern).map_err(|e| RecommendError::InvalidPattern {
                pattern: search_pattern.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            module_pattern: full_match_regex(module_pattern.unwrap_or(".*"))?,
            search_pattern: search_pattern.to_string(),
            search_regex,
            scope,
        })
    }

    pub fn search_pattern(&self) -> &str {
        &self.search_pattern
    }

    pub fn scope(&self) -> UpdateScope {
        self.scope
    }

    /// Check whether the item governs `module` (matched on group or `group:name`)
    pub fn matches(&self, module: &ModuleId) -> bool {
        self.module_pattern.is_match(&module.group) || self.module_pattern.is_match(&module.key())
    }

    /// Regex a candidate must fully match, given the current version
    ///
    /// When the search pattern occurs inside `current` (without its local
    /// qualifier), the text around the match is kept literally and only the
    /// matched part may vary. Otherwise the search pattern must match the
    /// whole candidate.
    pub fn candidate_regex(&self, current: &str) -> Result<Regex, RecommendError> {
        let current = release_version(current);
        match self.search_regex.find(current) {
            Some(m) if !m.as_str().is_empty() => full_match_regex(&format!(
                "{}(?:{}){}",
                regex::escape(&current[..m.start()]),
                self.search_pattern,
                regex::escape(&current[m.end()..])
            )),
            _ => full_match_regex(&self.search_pattern),
        }
    }

    /// Greatest available version matching the search pattern within the scope
    pub fn select_candidate<'a>(
        &self,
        current: &str,
        available: &'a [String],
    ) -> Result<Option<&'a str>, RecommendError> {
        let regex = self.candidate_regex(current)?;
        let current = release_version(current);
        Ok(find_max(
            available
                .iter()
                .map(String::as_str)
                .filter(|version| regex.is_match(version))
                .filter(|version| within_scope(current, version, self.scope)),
        ))
    }
}

/// `current` without the local qualifier; local versions are never published
fn release_version(current: &str) -> &str {
    current.strip_suffix(LOCAL_SUFFIX).unwrap_or(current)
}

impl Default for UpdateConfigItem {
    fn default() -> Self {
        Self {
            module_pattern: Regex::new("^(?:.*)$").unwrap(),
            search_pattern: DEFAULT_SEARCH_PATTERN.to_string(),
            search_regex: Regex::new(DEFAULT_SEARCH_PATTERN).unwrap(),
            scope: UpdateScope::Auto,
        }
    }
}

/// Which providers may be updated, and how
#[derive(Debug, Clone, Default)]
pub struct UpdatePolicy {
    /// Eligible provider names; every provider when `None`
    providers: Option<HashSet<String>>,
    items: Vec<UpdateConfigItem>,
    default_item: UpdateConfigItem,
}

impl UpdatePolicy {
    pub fn new(providers: Option<HashSet<String>>, items: Vec<UpdateConfigItem>) -> Self {
        Self {
            providers,
            items,
            default_item: UpdateConfigItem::default(),
        }
    }

    pub fn from_config(config: &UpdateConfig) -> Result<Self, RecommendError> {
        let items = config
            .items
            .iter()
            .map(|item| {
                UpdateConfigItem::new(
                    item.module_pattern.as_deref(),
                    &item.search_pattern,
                    item.scope,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(
            config.providers.as_ref().map(|p| p.iter().cloned().collect()),
            items,
        ))
    }

    pub fn is_eligible(&self, provider: &str) -> bool {
        self.providers
            .as_ref()
            .is_none_or(|providers| providers.contains(provider))
    }

    /// First item whose module pattern matches, else the default item
    pub fn item_for(&self, module: &ModuleId) -> &UpdateConfigItem {
        self.items
            .iter()
            .find(|item| item.matches(module))
            .unwrap_or(&self.default_item)
    }
}

/// Result of updating one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated { from: String, to: String },
    Unchanged { version: String },
    /// The provider's module matches one of its exclude patterns
    Excluded,
    /// Not in the update set, or no module identity to query
    NotEligible,
}

pub struct UpdateEngine<'a> {
    registry: &'a dyn VersionRegistry,
}

impl<'a> UpdateEngine<'a> {
    pub fn new(registry: &'a dyn VersionRegistry) -> Self {
        Self { registry }
    }

    /// Updates one provider's working version
    pub async fn update(
        &self,
        recommender: &mut Recommender,
        name: &str,
    ) -> Result<UpdateOutcome, RecommendError> {
        let provider = recommender.provider(name)?;
        let policy = recommender.update_policy();
        if !policy.is_eligible(name) {
            debug!("Provider {} is not in the update set", name);
            return Ok(UpdateOutcome::NotEligible);
        }
        let Some(module) = provider.module().cloned() else {
            debug!("Provider {} has no module to update", name);
            return Ok(UpdateOutcome::NotEligible);
        };
        if provider.is_excluded(&module.key()) {
            info!("Skipping update of {}: {} is excluded", name, module.key());
            return Ok(UpdateOutcome::Excluded);
        }

        let query_error = |message: String| RecommendError::UpdateQuery {
            provider: name.to_string(),
            message,
        };
        let current = provider
            .current_version()
            .map(str::to_string)
            .ok_or_else(|| query_error(format!("no current version for {}", module.key())))?;
        let item = policy.item_for(&module).clone();

        let available = self
            .registry
            .fetch_all_versions(&module)
            .await
            .map_err(|e| query_error(e.to_string()))?;
        if available.is_empty() {
            return Err(query_error(format!(
                "no published versions of {}",
                module.key()
            )));
        }

        let candidate = item
            .select_candidate(&current, &available)?
            .map(str::to_string)
            .ok_or_else(|| {
                query_error(format!(
                    "no version of {} matches '{}'",
                    module.key(),
                    item.search_pattern()
                ))
            })?;

        if candidate == current {
            info!("{} is up to date at {}", name, current);
            return Ok(UpdateOutcome::Unchanged { version: current });
        }

        recommender.provider_mut(name)?.set(&candidate, false)?;
        info!("Updated {} from {} to {}", name, current, candidate);
        Ok(UpdateOutcome::Updated {
            from: current,
            to: candidate,
        })
    }

    /// Updates every provider; failures are reported per provider
    pub async fn update_all(
        &self,
        recommender: &mut Recommender,
    ) -> Vec<(String, Result<UpdateOutcome, RecommendError>)> {
        let mut results = Vec::new();
        for name in recommender.provider_names() {
            let result = self.update(recommender, &name).await;
            if let Err(e) = &result {
                error!("Failed to update {}: {}", name, e);
            }
            results.push((name, result));
        }
        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        if failed > 0 {
            warn!("{} of {} provider updates failed", failed, results.len());
        }
        results
    }
}
