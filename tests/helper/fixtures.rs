//! Project and repository fixtures

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use version_recommender::config::{DEFAULT_CONFIG_FILE, RecommenderConfig};
use version_recommender::recommend::repository::LocalRepository;
use version_recommender::recommend::resolver::Recommender;
use version_recommender::source::ModuleId;

/// Renders an Ivy descriptor with the given `(org, name, rev)` dependencies
pub fn ivy_descriptor(org: &str, name: &str, rev: &str, deps: &[(&str, &str, &str)]) -> String {
    let deps: String = deps
        .iter()
        .map(|(o, n, r)| format!("    <dependency org=\"{}\" name=\"{}\" rev=\"{}\"/>\n", o, n, r))
        .collect();
    format!(
        "<ivy-module version=\"2.0\">\n  <info organisation=\"{}\" module=\"{}\" revision=\"{}\"/>\n  <dependencies>\n{}  </dependencies>\n</ivy-module>\n",
        org, name, rev, deps
    )
}

/// Publishes an Ivy descriptor into an Ivy-layout repository under `root`
pub fn publish_ivy(root: &Path, org: &str, name: &str, rev: &str, deps: &[(&str, &str, &str)]) {
    let path = LocalRepository::new(root, Default::default())
        .ivy_path(&ModuleId::new(org, name, None), rev);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, ivy_descriptor(org, name, rev, deps)).unwrap();
}

/// Writes a file relative to the project directory
pub fn write_file(project: &TempDir, relative: &str, content: &str) -> PathBuf {
    let path = project.path().join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

/// Writes the configuration file of the project
pub fn write_config(project: &TempDir, config: serde_json::Value) -> PathBuf {
    write_file(project, DEFAULT_CONFIG_FILE, &config.to_string())
}

/// Loads the project's configuration into a fresh, initialized recommender
pub fn load_recommender(project: &TempDir) -> Recommender {
    let config = RecommenderConfig::load(&project.path().join(DEFAULT_CONFIG_FILE)).unwrap();
    let repository = Arc::new(LocalRepository::new(
        config.repository.root.clone(),
        config.repository.layout,
    ));
    let mut recommender = Recommender::from_config(&config, project.path(), repository).unwrap();
    let failures = recommender.initialize();
    assert!(failures.is_empty(), "initialization failed: {:?}", failures);
    recommender
}
