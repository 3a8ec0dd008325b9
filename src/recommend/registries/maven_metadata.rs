//! Maven repository metadata implementation
//!
//! Lists versions from `<base>/<group path>/<artifact>/maven-metadata.xml`.

use roxmltree::Document;
use tracing::warn;

use crate::recommend::error::RegistryError;
use crate::recommend::registry::VersionRegistry;
use crate::source::ModuleId;

/// Default base URL for Maven Central
const DEFAULT_BASE_URL: &str = "https://repo1.maven.org/maven2";

/// Registry implementation reading Maven repository metadata
pub struct MavenMetadataRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl MavenMetadataRegistry {
    /// Creates a new MavenMetadataRegistry with a custom base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("version-recommender")
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn metadata_url(&self, module: &ModuleId) -> String {
        format!(
            "{}/{}/{}/maven-metadata.xml",
            self.base_url,
            module.group.replace('.', "/"),
            module.name
        )
    }
}

impl Default for MavenMetadataRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl VersionRegistry for MavenMetadataRegistry {
    async fn fetch_all_versions(&self, module: &ModuleId) -> Result<Vec<String>, RegistryError> {
        let url = self.metadata_url(module);

        let response = self.client.get(&url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(module.key()));
        }

        if !status.is_success() {
            warn!("Maven repository returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let body = response.text().await.map_err(|e| {
            warn!("Failed to read Maven metadata response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        parse_metadata_versions(&body)
    }
}

/// Extracts `metadata/versioning/versions/version` entries
fn parse_metadata_versions(xml: &str) -> Result<Vec<String>, RegistryError> {
    let document =
        Document::parse(xml).map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;

    let versions = document
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "versions")
        .flat_map(|versions| versions.children())
        .filter(|n| n.is_element() && n.tag_name().name() == "version")
        .filter_map(|n| n.text())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();

    Ok(versions)
}
