//! Version ordering
//!
//! Versions are compared by their leading dot-separated numeric segments
//! (numerically, missing segments count as zero), then by the trailing
//! qualifier as a plain lexical tie-break.

use std::cmp::Ordering;

use serde::Deserialize;

/// Segment of a version that an update may advance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateScope {
    /// Any newer version
    Major,
    /// Same major version
    Minor,
    /// Same major.minor version
    Patch,
    /// No segment restriction, the search pattern alone decides
    #[default]
    Auto,
}

impl std::str::FromStr for UpdateScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "major" => Ok(UpdateScope::Major),
            "minor" => Ok(UpdateScope::Minor),
            "patch" => Ok(UpdateScope::Patch),
            "auto" => Ok(UpdateScope::Auto),
            _ => Err(format!("unknown update scope '{}'", s)),
        }
    }
}

/// Sort key of a version string
///
/// Equality follows the ordering: `1.0` and `1.0.0` are equal keys.
#[derive(Debug, Clone)]
pub struct VersionKey {
    /// Numeric segments with leading zeros stripped
    segments: Vec<String>,
    qualifier: String,
}

impl VersionKey {
    pub fn parse(version: &str) -> Self {
        let numeric_end = version
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(version.len());
        let (numeric, qualifier) = version.split_at(numeric_end);

        // A trailing dot belongs to the qualifier separator, not to a segment
        let segments = numeric
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| {
                let stripped = s.trim_start_matches('0');
                let digits = if stripped.is_empty() { "0" } else { stripped };
                digits.to_string()
            })
            .collect();

        Self {
            segments,
            qualifier: qualifier.to_string(),
        }
    }

    /// Numeric segment at `index`, if the version declares it
    fn segment(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

impl Ord for VersionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let ordering = compare_numeric(
                self.segment(i).unwrap_or("0"),
                other.segment(i).unwrap_or("0"),
            );
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        self.qualifier.cmp(&other.qualifier)
    }
}

impl PartialEq for VersionKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionKey {}

impl PartialOrd for VersionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two version strings
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    VersionKey::parse(a).cmp(&VersionKey::parse(b))
}

/// Find the greatest version from a list
pub fn find_max<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    versions
        .into_iter()
        .map(|v| (v, VersionKey::parse(v)))
        .max_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(original, _)| original)
}

/// Check whether moving from `current` to `candidate` stays within `scope`
///
/// A current version without numeric segments places no restriction.
pub fn within_scope(current: &str, candidate: &str, scope: UpdateScope) -> bool {
    let fixed_segments = match scope {
        UpdateScope::Major | UpdateScope::Auto => return true,
        UpdateScope::Minor => 1,
        UpdateScope::Patch => 2,
    };
    let current = VersionKey::parse(current);
    if current.segments.is_empty() {
        return true;
    }
    let candidate = VersionKey::parse(candidate);
    (0..fixed_segments).all(|i| {
        compare_numeric(
            current.segment(i).unwrap_or("0"),
            candidate.segment(i).unwrap_or("0"),
        ) == Ordering::Equal
    })
}
