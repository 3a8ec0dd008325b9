//! Registry implementations for listing module versions

pub mod local;
pub mod maven_metadata;

pub use maven_metadata::MavenMetadataRegistry;
