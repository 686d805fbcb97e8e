// src/recipe/kitchen/locator.rs

//! Locating install prefixes for a recipe's requirements

use crate::error::Result;
use crate::platform::Platform;
use crate::recipe::format::Requirement;
use crate::recipe::manifest::{ArtifactManifest, MANIFEST_FILE};
use crate::version::Version;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maps a requirement to an install prefix CMake can search
///
/// This keeps the Kitchen independent of where dependencies come from.
pub trait DependencyLocator: Send + Sync {
    /// Find a prefix providing `requirement` for `platform`
    ///
    /// `Ok(None)` means the locator has nothing suitable.
    fn locate(&self, requirement: &Requirement, platform: &Platform) -> Result<Option<PathBuf>>;
}

/// A locator that never finds anything
pub struct NoopLocator;

impl DependencyLocator for NoopLocator {
    fn locate(&self, _requirement: &Requirement, _platform: &Platform) -> Result<Option<PathBuf>> {
        Ok(None)
    }
}

/// Configured prefixes first, then packages published in an output directory
#[derive(Debug, Clone, Default)]
pub struct PrefixLocator {
    prefixes: BTreeMap<String, PathBuf>,
    published_dirs: Vec<PathBuf>,
}

impl PrefixLocator {
    pub fn new(prefixes: BTreeMap<String, PathBuf>) -> Self {
        Self {
            prefixes,
            published_dirs: Vec::new(),
        }
    }

    /// Also search the packages published under `dir`
    pub fn with_published(mut self, dir: impl Into<PathBuf>) -> Self {
        self.published_dirs.push(dir.into());
        self
    }

    fn find_published(
        &self,
        dir: &Path,
        requirement: &Requirement,
        platform: &Platform,
    ) -> Result<Option<(Version, PathBuf)>> {
        if !dir.is_dir() {
            return Ok(None);
        }

        let mut best: Option<(Version, PathBuf)> = None;
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.join(MANIFEST_FILE).is_file() {
                continue;
            }
            let manifest = match ArtifactManifest::load(&path) {
                Ok(m) => m,
                Err(e) => {
                    debug!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            if manifest.name != requirement.name || manifest.platform != *platform {
                continue;
            }
            let Ok(version) = Version::parse(&manifest.version) else {
                continue;
            };
            if !requirement.version.matches(&version) {
                continue;
            }
            if best.as_ref().is_none_or(|(v, _)| version > *v) {
                best = Some((version, path));
            }
        }
        Ok(best)
    }
}

impl DependencyLocator for PrefixLocator {
    fn locate(&self, requirement: &Requirement, platform: &Platform) -> Result<Option<PathBuf>> {
        if let Some(prefix) = self.prefixes.get(&requirement.name) {
            debug!("{} provided by configured prefix {}", requirement, prefix.display());
            return Ok(Some(prefix.clone()));
        }

        let mut best: Option<(Version, PathBuf)> = None;
        for dir in &self.published_dirs {
            if let Some((version, path)) = self.find_published(dir, requirement, platform)?
                && best.as_ref().is_none_or(|(v, _)| version > *v)
            {
                best = Some((version, path));
            }
        }

        if let Some((_, path)) = &best {
            debug!("{} provided by published package {}", requirement, path.display());
        }
        Ok(best.map(|(_, path)| path))
    }
}
