// src/recipe/manifest.rs

//! Artifact manifest: what a published package exposes to consumers
//!
//! The manifest is written as `larder-manifest.json` at the root of every
//! published package. It holds no timestamps or host paths and lists files
//! in sorted order, so the same configuration always yields the same bytes.

use super::configure::{Artifacts, Configuration};
use super::format::Recipe;
use super::options::ResolvedOptions;
use crate::error::{Error, Result};
use crate::hash;
use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// File name of the manifest inside a published package
pub const MANIFEST_FILE: &str = "larder-manifest.json";

/// One published file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the package root, `/`-separated
    pub path: String,
    pub size: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub name: String,
    pub version: String,
    pub package_id: String,
    pub platform: Platform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    pub options: ResolvedOptions,
    pub requires: Vec<String>,
    #[serde(flatten)]
    pub artifacts: Artifacts,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

impl ArtifactManifest {
    /// Manifest for a configuration, without a file inventory
    pub fn new(recipe: &Recipe, config: &Configuration) -> Self {
        Self {
            name: config.name.clone(),
            version: config.version.clone(),
            package_id: config.package_id(),
            platform: config.platform,
            description: recipe.package.description.clone(),
            license: recipe.package.license.clone(),
            homepage: recipe.package.homepage.clone(),
            options: config.options.clone(),
            requires: config.requirements.iter().map(ToString::to_string).collect(),
            artifacts: config.artifacts.clone(),
            files: Vec::new(),
        }
    }

    /// Record every regular file under `root` (except the manifest itself)
    pub fn collect_files(&mut self, root: &Path) -> Result<()> {
        self.files = inventory(root)?;
        Ok(())
    }

    /// Serialize to pretty JSON with a trailing newline
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::ParseError(format!("Failed to serialize manifest: {}", e)))?;
        json.push('\n');
        Ok(json)
    }

    /// Write `larder-manifest.json` into a package directory
    pub fn write_to(&self, package_dir: &Path) -> Result<()> {
        fs::write(package_dir.join(MANIFEST_FILE), self.to_json()?)?;
        Ok(())
    }

    /// Load the manifest of a published package
    pub fn load(package_dir: &Path) -> Result<Self> {
        let path = package_dir.join(MANIFEST_FILE);
        let content = fs::read_to_string(&path).map_err(|e| {
            Error::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| Error::ParseError(format!("Invalid manifest {}: {}", path.display(), e)))
    }
}

/// Sorted inventory of the regular files under `root`
pub fn inventory(root: &Path) -> Result<Vec<FileEntry>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::IoError(format!("Failed to walk {}: {}", root.display(), e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| Error::IoError(e.to_string()))?;
        let path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if path == MANIFEST_FILE {
            continue;
        }

        files.push(FileEntry {
            path,
            size: entry
                .metadata()
                .map_err(|e| Error::IoError(e.to_string()))?
                .len(),
            sha256: hash::hash_file(entry.path())?,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}
