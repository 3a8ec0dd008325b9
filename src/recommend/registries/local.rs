//! Version listing for a directory-resident repository

use tracing::debug;

use crate::recommend::error::RegistryError;
use crate::recommend::registry::VersionRegistry;
use crate::recommend::repository::LocalRepository;
use crate::source::ModuleId;

#[async_trait::async_trait]
impl VersionRegistry for LocalRepository {
    async fn fetch_all_versions(&self, module: &ModuleId) -> Result<Vec<String>, RegistryError> {
        let dir = self.module_dir(module);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RegistryError::NotFound(module.key()));
            }
            Err(source) => return Err(RegistryError::Io { path: dir, source }),
        };

        // Each published version is a subdirectory of the module directory
        let mut versions = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(source) => return Err(RegistryError::Io { path: dir, source }),
            };
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if is_dir && let Some(name) = entry.file_name().to_str() {
                versions.push(name.to_string());
            }
        }

        debug!("Found {} versions of {} in {:?}", versions.len(), module.key(), dir);
        Ok(versions)
    }
}
