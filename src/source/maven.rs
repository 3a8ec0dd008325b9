//! Maven BOM / POM reader
//!
//! Reads both `project/dependencies/dependency` and
//! `project/dependencyManagement/dependencies/dependency` elements.
//! `${...}` placeholders are resolved from `<properties>` and the project version.

use std::collections::HashMap;

use regex::Regex;
use roxmltree::{Document, Node};
use tracing::debug;

use crate::source::traits::{SourceError, SourceReader};
use crate::source::types::{SourceKind, VersionMap, coordinate_key};
use crate::source::xml::{child, elements, text};

/// Upper bound on nested placeholder expansion
const MAX_INTERPOLATION_DEPTH: usize = 8;

/// Reader for Maven descriptors
pub struct MavenReader {
    /// Regex for `${property}` placeholders
    placeholder_re: Regex,
}

impl MavenReader {
    pub fn new() -> Self {
        Self {
            placeholder_re: Regex::new(r"\$\{([^}]+)\}").unwrap(),
        }
    }

    fn interpolate(&self, value: &str, properties: &HashMap<String, String>) -> Option<String> {
        let mut current = value.to_string();
        for _ in 0..MAX_INTERPOLATION_DEPTH {
            if !self.placeholder_re.is_match(&current) {
                return Some(current);
            }
            let mut unresolved = false;
            let next = self
                .placeholder_re
                .replace_all(&current, |caps: &regex::Captures| {
                    match properties.get(&caps[1]) {
                        Some(v) => v.clone(),
                        None => {
                            unresolved = true;
                            caps[0].to_string()
                        }
                    }
                })
                .into_owned();
            if unresolved {
                return None;
            }
            current = next;
        }
        None
    }
}

impl Default for MavenReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceReader for MavenReader {
    fn kind(&self) -> SourceKind {
        SourceKind::Maven
    }

    fn parse(&self, content: &str) -> Result<VersionMap, SourceError> {
        let document = Document::parse(content)
            .map_err(|e| SourceError::malformed(SourceKind::Maven, e.to_string()))?;
        let project = document.root_element();
        if project.tag_name().name() != "project" {
            return Err(SourceError::invalid(
                SourceKind::Maven,
                format!("expected <project> root, found <{}>", project.tag_name().name()),
            ));
        }

        let properties = collect_properties(&project);

        let mut dependencies: Vec<Node> = Vec::new();
        if let Some(management) = child(&project, "dependencyManagement")
            && let Some(deps) = child(&management, "dependencies")
        {
            dependencies.extend(elements(&deps, "dependency"));
        }
        if let Some(deps) = child(&project, "dependencies") {
            dependencies.extend(elements(&deps, "dependency"));
        }

        let mut map = VersionMap::new();
        for dep in dependencies {
            let group_id = text(&dep, "groupId").ok_or_else(|| {
                SourceError::invalid(SourceKind::Maven, "dependency without groupId")
            })?;
            let artifact_id = text(&dep, "artifactId").ok_or_else(|| {
                SourceError::invalid(SourceKind::Maven, "dependency without artifactId")
            })?;
            let Some(version) = text(&dep, "version") else {
                continue;
            };
            match self.interpolate(&version, &properties) {
                Some(resolved) => {
                    map.insert(coordinate_key(&group_id, &artifact_id), resolved);
                }
                None => debug!(
                    "Skipping {}:{}: unresolved version placeholder {}",
                    group_id, artifact_id, version
                ),
            }
        }

        Ok(map)
    }
}

/// Properties usable in placeholders, including the project's own version
fn collect_properties(project: &Node) -> HashMap<String, String> {
    let mut properties: HashMap<String, String> = child(project, "properties")
        .map(|props| {
            props
                .children()
                .filter(|n| n.is_element())
                .filter_map(|n| {
                    let value = n.text()?.trim();
                    Some((n.tag_name().name().to_string(), value.to_string()))
                })
                .collect()
        })
        .unwrap_or_default();

    let project_version = text(project, "version")
        .or_else(|| child(project, "parent").and_then(|parent| text(&parent, "version")));
    if let Some(version) = project_version {
        properties.insert("project.version".to_string(), version.clone());
        properties.entry("version".to_string()).or_insert(version);
    }
    properties
}
