//! Ivy descriptor reader
//!
//! Reads `ivy-module/dependencies/dependency` elements into a version map.
//!
//! Format example:
//! ```text
//! <ivy-module version="2.0">
//!   <info organisation="com.acme" module="platform" revision="1.0"/>
//!   <dependencies>
//!     <dependency org="com.google.guava" name="guava" rev="19.0"/>
//!   </dependencies>
//! </ivy-module>
//! ```

use roxmltree::Document;

use crate::source::traits::{SourceError, SourceReader};
use crate::source::types::{ModuleId, SourceKind, VersionMap};
use crate::source::xml::child;

/// Parsed content of an Ivy descriptor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IvyDescriptor {
    /// Module declared by the `info` element
    pub info: Option<ModuleId>,
    /// Declared dependencies in document order
    pub dependencies: Vec<ModuleId>,
}

impl IvyDescriptor {
    /// Flattens the declared dependencies into a version map
    pub fn to_version_map(&self) -> VersionMap {
        let mut map = VersionMap::new();
        for dependency in &self.dependencies {
            if let Some(version) = &dependency.version {
                map.insert(dependency.key(), version.clone());
            }
        }
        map
    }
}

/// Reader for Ivy descriptors
#[derive(Debug, Clone, Copy, Default)]
pub struct IvyReader;

impl IvyReader {
    pub fn new() -> Self {
        Self
    }

    /// Parse the full descriptor, keeping dependency order
    pub fn parse_descriptor(&self, content: &str) -> Result<IvyDescriptor, SourceError> {
        let document = Document::parse(content)
            .map_err(|e| SourceError::malformed(SourceKind::Ivy, e.to_string()))?;
        let root = document.root_element();

        let info = child(&root, "info").and_then(|info| {
            let organisation = info.attribute("organisation")?;
            let module = info.attribute("module")?;
            Some(ModuleId::new(organisation, module, info.attribute("revision")))
        });
        let default_org = info.as_ref().map(|m| m.group.as_str());

        let mut dependencies = Vec::new();
        if let Some(deps) = child(&root, "dependencies") {
            for dep in deps
                .children()
                .filter(|n| n.is_element() && n.tag_name().name() == "dependency")
            {
                let org = dep.attribute("org").or(default_org).ok_or_else(|| {
                    SourceError::invalid(
                        SourceKind::Ivy,
                        "dependency without org and no info organisation",
                    )
                })?;
                let name = dep.attribute("name").ok_or_else(|| {
                    SourceError::invalid(SourceKind::Ivy, "dependency without name")
                })?;
                dependencies.push(ModuleId::new(org, name, dep.attribute("rev")));
            }
        }

        Ok(IvyDescriptor { info, dependencies })
    }
}

impl SourceReader for IvyReader {
    fn kind(&self) -> SourceKind {
        SourceKind::Ivy
    }

    fn parse(&self, content: &str) -> Result<VersionMap, SourceError> {
        Ok(self.parse_descriptor(content)?.to_version_map())
    }
}
