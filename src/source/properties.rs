//! Properties reader
//!
//! Parses `group:artifact=version` lines. Group wildcards (`group:*`) are allowed.
//!
//! Format example:
//! ```text
//! # recommended versions
//! com.google.guava:guava=19.0
//! org.slf4j:*=1.7.21
//! ```

use crate::source::traits::{SourceError, SourceReader};
use crate::source::types::{SourceKind, VersionMap};

/// Reader for properties sources
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertiesReader;

impl PropertiesReader {
    pub fn new() -> Self {
        Self
    }

    /// Builds a version map from an inline mapping, validating every key
    pub fn from_entries<'a, I>(&self, entries: I) -> Result<VersionMap, SourceError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut map = VersionMap::new();
        for (key, version) in entries {
            validate_key(key.trim())?;
            map.insert(key.trim(), version.trim());
        }
        Ok(map)
    }
}

impl SourceReader for PropertiesReader {
    fn kind(&self) -> SourceKind {
        SourceKind::Properties
    }

    fn parse(&self, content: &str) -> Result<VersionMap, SourceError> {
        let mut entries = Vec::new();
        for (line_num, line) in content.lines().enumerate() {
            let trimmed = line.trim();

            // Skip empty lines and comments
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                continue;
            }

            let (key, value) = trimmed.split_once('=').ok_or_else(|| {
                SourceError::malformed(
                    SourceKind::Properties,
                    format!("line {}: expected key=value, found '{}'", line_num + 1, trimmed),
                )
            })?;
            entries.push((key, value));
        }
        self.from_entries(entries)
    }
}

fn validate_key(key: &str) -> Result<(), SourceError> {
    match key.split_once(':') {
        Some((group, artifact))
            if !group.is_empty() && !artifact.is_empty() && !artifact.contains(':') =>
        {
            Ok(())
        }
        _ => Err(SourceError::invalid(
            SourceKind::Properties,
            format!("invalid key '{}', expected group:artifact or group:*", key),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parse_reads_key_value_lines() {
        let content = r#"
# comment
! another comment
com.google.guava:guava = 19.0
org.slf4j:*=1.7.21
"#;
        let map = PropertiesReader::new().parse(content).unwrap();

        assert_eq!(map.lookup("com.google.guava", "guava"), Some("19.0"));
        assert_eq!(map.lookup("org.slf4j", "slf4j-simple"), Some("1.7.21"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn parse_skips_empty_values() {
        let map = PropertiesReader::new().parse("g:a=\ng:b=1.0\n").unwrap();

        assert_eq!(map.lookup("g", "a"), None);
        assert_eq!(map.lookup("g", "b"), Some("1.0"));
    }

    #[rstest]
    #[case("g:a")]
    #[case("nokey=1.0")]
    #[case("g:a:b=1.0")]
    #[case(":a=1.0")]
    fn parse_rejects_unparsable_lines(#[case] content: &str) {
        assert!(PropertiesReader::new().parse(content).is_err());
    }

    #[test]
    fn parse_yields_no_partial_map_on_error() {
        let result = PropertiesReader::new().parse("g:a=1.0\nbroken line\n");

        assert!(matches!(result, Err(SourceError::Malformed { .. })));
    }

    #[test]
    fn from_entries_builds_map_from_inline_mapping() {
        let map = PropertiesReader::new()
            .from_entries([("g:a", "1.0"), ("h:*", "2.0")])
            .unwrap();

        assert_eq!(map.lookup("g", "a"), Some("1.0"));
        assert_eq!(map.lookup("h", "x"), Some("2.0"));
    }
}
