//! Registry test utilities

use std::collections::HashMap;

use async_trait::async_trait;

use version_recommender::recommend::error::RegistryError;
use version_recommender::recommend::registry::VersionRegistry;
use version_recommender::source::ModuleId;

/// In-memory registry keyed by `group:name`
#[derive(Default)]
pub struct MockRegistry {
    versions: HashMap<String, Vec<String>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_versions(mut self, module: &str, versions: Vec<&str>) -> Self {
        self.versions.insert(
            module.to_string(),
            versions.into_iter().map(|v| v.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl VersionRegistry for MockRegistry {
    async fn fetch_all_versions(&self, module: &ModuleId) -> Result<Vec<String>, RegistryError> {
        match self.versions.get(&module.key()) {
            Some(versions) => Ok(versions.clone()),
            None => Err(RegistryError::NotFound(module.key())),
        }
    }
}
