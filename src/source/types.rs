//! Common types for version sources

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

/// Wildcard artifact name matching every artifact of a group (`group:*`)
pub const WILDCARD: &str = "*";

/// Kind of recommendation source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Ivy descriptor (ivy.xml)
    Ivy,
    /// Maven BOM or POM (pom.xml)
    #[serde(alias = "bom", alias = "pom")]
    Maven,
    /// Static `group:artifact=version` mapping
    Properties,
}

impl SourceKind {
    /// Returns the short name used in logs and configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Ivy => "ivy",
            SourceKind::Maven => "maven",
            SourceKind::Properties => "properties",
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ivy" => Ok(SourceKind::Ivy),
            "maven" | "bom" | "pom" => Ok(SourceKind::Maven),
            "properties" => Ok(SourceKind::Properties),
            _ => Err(()),
        }
    }
}

/// Builds the lookup key of a coordinate (`group:name`)
pub fn coordinate_key(group: &str, name: &str) -> String {
    format!("{}:{}", group, name)
}

/// A module identity: `group:name` with an optional version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleId {
    pub group: String,
    pub name: String,
    pub version: Option<String>,
}

impl ModuleId {
    pub fn new(group: &str, name: &str, version: Option<&str>) -> Self {
        Self {
            group: group.to_string(),
            name: name.to_string(),
            version: version.filter(|v| !v.is_empty()).map(str::to_string),
        }
    }

    /// Lookup key of this module, without the version
    pub fn key(&self) -> String {
        coordinate_key(&self.group, &self.name)
    }

    /// Returns a copy of this module pinned to `version`
    pub fn with_version(&self, version: &str) -> Self {
        Self::new(&self.group, &self.name, Some(version))
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}:{}:{}", self.group, self.name, version),
            None => write!(f, "{}:{}", self.group, self.name),
        }
    }
}

impl std::str::FromStr for ModuleId {
    type Err = String;

    /// Parses `group:name` or `group:name:version`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        match parts.as_slice() {
            [group, name] if !group.is_empty() && !name.is_empty() => {
                Ok(ModuleId::new(group, name, None))
            }
            [group, name, version] if !group.is_empty() && !name.is_empty() => {
                Ok(ModuleId::new(group, name, Some(*version)))
            }
            _ => Err(format!(
                "invalid module coordinate '{}', expected group:name[:version]",
                s
            )),
        }
    }
}

/// Flat mapping of `group:artifact` (or `group:*`) to a version string
///
/// Empty versions are never stored: absence means "unknown".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionMap {
    entries: HashMap<String, String>,
}

impl VersionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, replacing any previous version for the key.
    /// Returns false when the version is empty and nothing was stored.
    pub fn insert(&mut self, key: impl Into<String>, version: impl Into<String>) -> bool {
        let version = version.into();
        if version.trim().is_empty() {
            return false;
        }
        self.entries.insert(key.into(), version);
        true
    }

    /// Version stored under the exact key, if any
    pub fn get_key(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Looks up `group:name`, falling back to the `group:*` wildcard entry
    pub fn lookup(&self, group: &str, name: &str) -> Option<&str> {
        self.get_key(&coordinate_key(group, name))
            .or_else(|| self.get_key(&coordinate_key(group, WILDCARD)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VersionMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = VersionMap::new();
        for (key, version) in iter {
            map.insert(key, version);
        }
        map
    }
}
