//! Source layer
//! - traits.rs: SourceReader trait definition
//! - types.rs: Common types (VersionMap, ModuleId, SourceKind)
//! - ivy.rs: Ivy descriptor reader
//! - maven.rs: Maven BOM/POM reader
//! - properties.rs: properties reader
//! - xml.rs: element helpers shared by the XML readers

pub mod ivy;
pub mod maven;
pub mod properties;
pub mod traits;
pub mod types;
pub(crate) mod xml;

pub use ivy::{IvyDescriptor, IvyReader};
pub use maven::MavenReader;
pub use properties::PropertiesReader;
pub use traits::{SourceError, SourceReader};
pub use types::{ModuleId, SourceKind, VersionMap};
