//! Transitive closure of Ivy dependencies
//!
//! Expands a root descriptor breadth-first, fetching each dependency's own
//! descriptor from the repository. Conflicts are settled structurally:
//! shallow-wins by default, deep-wins when deeper versions may override.
//! Ties at equal depth keep the first-encountered (declaration order) version.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::recommend::error::{RepositoryError, SourceFailure};
use crate::recommend::repository::DescriptorRepository;
use crate::source::{IvyDescriptor, IvyReader, ModuleId, VersionMap};

pub struct ClosureWalker<'a> {
    repository: &'a dyn DescriptorRepository,
    reader: IvyReader,
    override_transitive_deps: bool,
}

impl<'a> ClosureWalker<'a> {
    pub fn new(repository: &'a dyn DescriptorRepository, override_transitive_deps: bool) -> Self {
        Self {
            repository,
            reader: IvyReader::new(),
            override_transitive_deps,
        }
    }

    /// Flattens the root's dependencies and all of their transitive dependencies
    pub fn expand(&self, root: &IvyDescriptor) -> Result<VersionMap, SourceFailure> {
        // key -> (version, depth)
        let mut recorded: HashMap<String, (String, usize)> = HashMap::new();
        let mut visited: HashSet<ModuleId> = HashSet::new();
        let mut queue: VecDeque<(ModuleId, usize)> = VecDeque::new();

        if let Some(info) = &root.info
            && info.version.is_some()
        {
            visited.insert(info.clone());
        }

        for dependency in &root.dependencies {
            if self.record(&mut recorded, dependency, 1) {
                queue.push_back((dependency.clone(), 1));
            }
        }

        while let Some((module, depth)) = queue.pop_front() {
            if !visited.insert(module.clone()) {
                continue;
            }

            let content = match self.repository.fetch_ivy(&module) {
                Ok(content) => content,
                Err(RepositoryError::NotFound(_)) => {
                    debug!("No descriptor for {}, treating it as a leaf", module);
                    continue;
                }
                Err(e) => {
                    return Err(SourceFailure::Unavailable {
                        origin: format!("transitive descriptor {}", module),
                        message: e.to_string(),
                    });
                }
            };
            let descriptor =
                self.reader
                    .parse_descriptor(&content)
                    .map_err(|source| SourceFailure::Malformed {
                        origin: format!("transitive descriptor {}", module),
                        source,
                    })?;

            for dependency in &descriptor.dependencies {
                if self.record(&mut recorded, dependency, depth + 1) {
                    queue.push_back((dependency.clone(), depth + 1));
                }
            }
        }

        debug!(
            "Flattened {} transitive entries from {} descriptors",
            recorded.len(),
            visited.len()
        );
        Ok(recorded
            .into_iter()
            .map(|(key, (version, _))| (key, version))
            .collect())
    }

    /// Records a dependency under the conflict policy.
    /// Returns true when the dependency's version is the recorded one and should be expanded.
    fn record(
        &self,
        recorded: &mut HashMap<String, (String, usize)>,
        dependency: &ModuleId,
        depth: usize,
    ) -> bool {
        let Some(version) = &dependency.version else {
            return false;
        };
        let key = dependency.key();
        match recorded.get(&key) {
            None => {
                recorded.insert(key, (version.clone(), depth));
                true
            }
            Some((_, existing_depth))
                if self.override_transitive_deps && depth > *existing_depth =>
            {
                recorded.insert(key, (version.clone(), depth));
                true
            }
            Some((existing, _)) => existing == version,
        }
    }
}
