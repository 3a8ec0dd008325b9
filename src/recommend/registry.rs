//! Registry trait for listing the published versions of a module

#[cfg(test)]
use mockall::automock;

use crate::recommend::error::RegistryError;
use crate::source::ModuleId;

/// Trait for fetching the available versions of a module
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait VersionRegistry: Send + Sync {
    /// Fetches all published versions of a module
    ///
    /// # Arguments
    /// * `module` - The module to query; its version, if any, is ignored
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Published versions, in no particular order
    /// * `Err(RegistryError)` - If the listing cannot be obtained
    async fn fetch_all_versions(&self, module: &ModuleId) -> Result<Vec<String>, RegistryError>;
}
