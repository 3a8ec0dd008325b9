//! Repository view for fetching module descriptors

#[cfg(test)]
use mockall::automock;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::recommend::error::RepositoryError;
use crate::source::ModuleId;

/// Trait for fetching already-published descriptors of a module
#[cfg_attr(test, automock)]
pub trait DescriptorRepository: Send + Sync {
    /// Fetches the Ivy descriptor of a versioned module
    fn fetch_ivy(&self, module: &ModuleId) -> Result<String, RepositoryError>;

    /// Fetches the Maven POM of a versioned module
    fn fetch_pom(&self, module: &ModuleId) -> Result<String, RepositoryError>;
}

/// Directory layout of a local repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryLayout {
    /// `<org>/<name>/<rev>/ivy-<rev>.xml`
    #[default]
    Ivy,
    /// `<group as path>/<artifact>/<version>/<artifact>-<version>.pom`
    Maven,
}

/// Repository backed by directory-resident descriptor files
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
    layout: RepositoryLayout,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>, layout: RepositoryLayout) -> Self {
        Self {
            root: root.into(),
            layout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one subdirectory per published version of `module`
    pub fn module_dir(&self, module: &ModuleId) -> PathBuf {
        match self.layout {
            RepositoryLayout::Ivy => self.root.join(&module.group).join(&module.name),
            RepositoryLayout::Maven => module
                .group
                .split('.')
                .fold(self.root.clone(), |path, part| path.join(part))
                .join(&module.name),
        }
    }

    pub fn ivy_path(&self, module: &ModuleId, version: &str) -> PathBuf {
        self.module_dir(module)
            .join(version)
            .join(format!("ivy-{}.xml", version))
    }

    pub fn pom_path(&self, module: &ModuleId, version: &str) -> PathBuf {
        self.module_dir(module)
            .join(version)
            .join(format!("{}-{}.pom", module.name, version))
    }

    fn read(&self, module: &ModuleId, path: PathBuf) -> Result<String, RepositoryError> {
        debug!("Reading descriptor of {} from {:?}", module, path);
        std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                RepositoryError::NotFound(module.to_string())
            } else {
                RepositoryError::Io { path, source }
            }
        })
    }
}

impl DescriptorRepository for LocalRepository {
    fn fetch_ivy(&self, module: &ModuleId) -> Result<String, RepositoryError> {
        let version = module
            .version
            .as_deref()
            .ok_or_else(|| RepositoryError::NotFound(module.to_string()))?;
        self.read(module, self.ivy_path(module, version))
    }

    fn fetch_pom(&self, module: &ModuleId) -> Result<String, RepositoryError> {
        let version = module
            .version
            .as_deref()
            .ok_or_else(|| RepositoryError::NotFound(module.to_string()))?;
        self.read(module, self.pom_path(module, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn ivy_layout_paths_use_org_directory() {
        let repo = LocalRepository::new("/repo", RepositoryLayout::Ivy);
        let module = ModuleId::new("com.acme", "core", Some("1.0"));

        assert_eq!(
            repo.ivy_path(&module, "1.0"),
            PathBuf::from("/repo/com.acme/core/1.0/ivy-1.0.xml")
        );
    }

    #[test]
    fn maven_layout_paths_split_group() {
        let repo = LocalRepository::new("/repo", RepositoryLayout::Maven);
        let module = ModuleId::new("com.acme", "core", Some("1.0"));

        assert_eq!(
            repo.pom_path(&module, "1.0"),
            PathBuf::from("/repo/com/acme/core/1.0/core-1.0.pom")
        );
    }

    #[test]
    fn fetch_ivy_reads_descriptor_file() {
        let temp_dir = TempDir::new().unwrap();
        let repo = LocalRepository::new(temp_dir.path(), RepositoryLayout::Ivy);
        let module = ModuleId::new("com.acme", "core", Some("1.0"));
        let path = repo.ivy_path(&module, "1.0");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "<ivy-module/>").unwrap();

        assert_eq!(repo.fetch_ivy(&module).unwrap(), "<ivy-module/>");
    }

    #[test]
    fn fetch_ivy_returns_not_found_for_missing_descriptor() {
        let temp_dir = TempDir::new().unwrap();
        let repo = LocalRepository::new(temp_dir.path(), RepositoryLayout::Ivy);

        let result = repo.fetch_ivy(&ModuleId::new("g", "a", Some("1.0")));

        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }

    #[test]
    fn fetch_pom_requires_version() {
        let repo = LocalRepository::new("/repo", RepositoryLayout::Maven);

        let result = repo.fetch_pom(&ModuleId::new("g", "a", None));

        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }
}
