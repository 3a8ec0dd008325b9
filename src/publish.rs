//! Publication descriptor patching
//!
//! Fills in the versions of unversioned dependencies in a generated Ivy or
//! Maven descriptor. Apart from the inserted versions the text is kept as-is.

use std::collections::HashSet;
use std::fmt;

use roxmltree::{Document, Node};
use tracing::{debug, warn};

use crate::source::xml::{child, elements, text};
use crate::source::{SourceError, SourceKind};

/// Non-fatal problem found while patching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchWarning {
    /// The dependency maps a configuration the descriptor does not declare
    MissingConfiguration {
        module: String,
        configuration: String,
    },
    /// No provider recommends a version for the dependency
    NoRecommendation { module: String },
}

impl fmt::Display for PatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchWarning::MissingConfiguration {
                module,
                configuration,
            } => write!(
                f,
                "{} maps undeclared configuration '{}', left unpatched",
                module, configuration
            ),
            PatchWarning::NoRecommendation { module } => {
                write!(f, "no recommended version for {}, left unpatched", module)
            }
        }
    }
}

/// Patched descriptor text with the warnings raised along the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchedDescriptor {
    pub content: String,
    /// Number of dependencies that received a version
    pub patched: usize,
    pub warnings: Vec<PatchWarning>,
}

struct Insertion {
    offset: usize,
    text: String,
}

/// Patches an Ivy or Maven descriptor, chosen by its root element
pub fn patch_descriptor<F>(content: &str, lookup: F) -> Result<PatchedDescriptor, SourceError>
where
    F: Fn(&str, &str) -> Option<String>,
{
    let root = Document::parse(content)
        .map_err(|e| SourceError::malformed(SourceKind::Ivy, e.to_string()))?
        .root_element()
        .tag_name()
        .name()
        .to_string();
    match root.as_str() {
        "project" => patch_pom(content, lookup),
        _ => patch_ivy(content, lookup),
    }
}

/// Adds `rev` to every Ivy dependency that has none
pub fn patch_ivy<F>(content: &str, lookup: F) -> Result<PatchedDescriptor, SourceError>
where
    F: Fn(&str, &str) -> Option<String>,
{
    let document = Document::parse(content)
        .map_err(|e| SourceError::malformed(SourceKind::Ivy, e.to_string()))?;
    let root = document.root_element();
    if root.tag_name().name() != "ivy-module" {
        return Err(SourceError::invalid(
            SourceKind::Ivy,
            format!(
                "expected <ivy-module> root, found <{}>",
                root.tag_name().name()
            ),
        ));
    }

    let default_org = child(&root, "info").and_then(|info| info.attribute("organisation"));
    let declared: Option<HashSet<&str>> = child(&root, "configurations").map(|confs| {
        elements(&confs, "conf")
            .filter_map(|conf| conf.attribute("name"))
            .collect()
    });

    let mut insertions = Vec::new();
    let mut warnings = Vec::new();
    if let Some(deps) = child(&root, "dependencies") {
        for dep in elements(&deps, "dependency") {
            if dep.attribute("rev").is_some() {
                continue;
            }
            let (Some(org), Some(name)) = (
                dep.attribute("org").or(default_org),
                dep.attribute("name"),
            ) else {
                debug!("Skipping dependency without org or name");
                continue;
            };
            let module = format!("{}:{}", org, name);

            if let Some(declared) = &declared
                && let Some(missing) = dep
                    .attribute("conf")
                    .and_then(|conf| undeclared_configuration(conf, declared))
            {
                let warning = PatchWarning::MissingConfiguration {
                    module,
                    configuration: missing.to_string(),
                };
                warn!("{}", warning);
                warnings.push(warning);
                continue;
            }

            match lookup(org, name) {
                Some(version) => insertions.push(Insertion {
                    offset: tag_name_end(content, &dep),
                    text: format!(r#" rev="{}""#, escape(&version)),
                }),
                None => {
                    let warning = PatchWarning::NoRecommendation { module };
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }
    }

    Ok(finish(content, insertions, warnings))
}

/// Adds `<version>` to every direct POM dependency that has none
pub fn patch_pom<F>(content: &str, lookup: F) -> Result<PatchedDescriptor, SourceError>
where
    F: Fn(&str, &str) -> Option<String>,
{
    let document = Document::parse(content)
        .map_err(|e| SourceError::malformed(SourceKind::Maven, e.to_string()))?;
    let project = document.root_element();
    if project.tag_name().name() != "project" {
        return Err(SourceError::invalid(
            SourceKind::Maven,
            format!(
                "expected <project> root, found <{}>",
                project.tag_name().name()
            ),
        ));
    }

    let mut insertions = Vec::new();
    let mut warnings = Vec::new();
    if let Some(deps) = child(&project, "dependencies") {
        for dep in elements(&deps, "dependency") {
            if child(&dep, "version").is_some() {
                continue;
            }
            let (Some(group_id), Some(artifact_id)) =
                (text(&dep, "groupId"), text(&dep, "artifactId"))
            else {
                debug!("Skipping dependency without groupId or artifactId");
                continue;
            };

            match lookup(&group_id, &artifact_id) {
                Some(version) => insertions.extend(version_element(&dep, &version)),
                None => {
                    let warning = PatchWarning::NoRecommendation {
                        module: format!("{}:{}", group_id, artifact_id),
                    };
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }
    }

    Ok(finish(content, insertions, warnings))
}

/// First master configuration of a `conf` mapping that is not declared
///
/// `conf` looks like `compile->default;runtime,test->runtime`.
fn undeclared_configuration<'a>(conf: &'a str, declared: &HashSet<&str>) -> Option<&'a str> {
    conf.split(';')
        .filter_map(|mapping| mapping.split("->").next())
        .flat_map(|masters| masters.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "*" && !name.starts_with(['@', '%', '!']))
        .find(|name| !declared.contains(name))
}

/// Byte offset right after the element's tag name
fn tag_name_end(content: &str, node: &Node) -> usize {
    let start = node.range().start + 1;
    content[start..]
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .map_or(start, |i| start + i)
}

/// `<version>` element after the dependency's last child, matching its indentation
fn version_element(dep: &Node, version: &str) -> Option<Insertion> {
    let last = dep.children().filter(|n| n.is_element()).last()?;
    let indent = last
        .prev_sibling()
        .filter(|n| n.is_text())
        .and_then(|n| n.text())
        .map(|ws| match ws.rfind('\n') {
            Some(i) => ws[i..].to_string(),
            None => ws.to_string(),
        })
        .unwrap_or_default();
    Some(Insertion {
        offset: last.range().end,
        text: format!("{}<version>{}</version>", indent, escape(version)),
    })
}

fn finish(content: &str, mut insertions: Vec<Insertion>, warnings: Vec<PatchWarning>) -> PatchedDescriptor {
    insertions.sort_by_key(|insertion| insertion.offset);
    let patched = insertions.len();
    let mut output = String::with_capacity(content.len() + patched * 32);
    let mut last = 0;
    for insertion in insertions {
        output.push_str(&content[last..insertion.offset]);
        output.push_str(&insertion.text);
        last = insertion.offset;
    }
    output.push_str(&content[last..]);
    debug!("Patched {} dependencies", patched);

    PatchedDescriptor {
        content: output,
        patched,
        warnings,
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
