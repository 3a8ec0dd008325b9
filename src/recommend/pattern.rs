//! Glob patterns over `group:artifact` coordinates

use regex::Regex;

use crate::recommend::error::RecommendError;

/// A `group:artifact` glob where `*` matches any run of characters
#[derive(Debug, Clone)]
pub struct GlobPattern {
    raw: String,
    regex: Regex,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self, RecommendError> {
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = Regex::new(&format!("^{}$", body)).map_err(|e| {
            RecommendError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(Self {
            raw: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Check whether `key` (`group:artifact`) matches this glob
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}

/// Compiles a regular expression that must match the whole input
pub fn full_match_regex(pattern: &str) -> Result<Regex, RecommendError> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| RecommendError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}
