// src/recipe/kitchen/config.rs

//! Configuration types for the Kitchen

use crate::recipe::manifest::ArtifactManifest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the Kitchen
///
/// Loaded from the `[kitchen]` table of the config file; every field has a
/// default so the table may be partial or absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KitchenConfig {
    /// Directory for downloaded sources, keyed by checksum
    pub source_cache: PathBuf,
    /// Parent of temporary build directories (system temp dir if unset)
    pub build_root: Option<PathBuf>,
    /// Where published packages are written
    pub output_dir: PathBuf,
    /// CMake executable, either a name on PATH or a path
    pub cmake: String,
    /// CMake generator (`-G`), CMake's default if unset
    pub generator: Option<String>,
    /// Number of parallel build jobs
    pub jobs: u32,
    /// Keep build directory after completion (for debugging)
    pub keep_builddir: bool,
    /// Ask CMake for verbose makefiles
    pub verbose: bool,
    /// Install prefixes for requirements, by requirement name
    pub dependency_prefixes: BTreeMap<String, PathBuf>,
    /// Let CMake find unlocated requirements on the system instead of failing
    pub allow_system_dependencies: bool,
    /// Per-request download timeout in seconds
    pub download_timeout_secs: u64,
    /// Show a progress bar while downloading
    pub progress: bool,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        let jobs = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(4);

        let source_cache = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("larder")
            .join("sources");

        Self {
            source_cache,
            build_root: None,
            output_dir: PathBuf::from("larder-packages"),
            cmake: "cmake".to_string(),
            generator: None,
            jobs,
            keep_builddir: false,
            verbose: true,
            dependency_prefixes: BTreeMap::new(),
            allow_system_dependencies: false,
            download_timeout_secs: 600,
            progress: false,
        }
    }
}

impl KitchenConfig {
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

/// Result of cooking a recipe
#[derive(Debug)]
pub struct CookResult {
    /// Path to the published package directory
    pub package_dir: PathBuf,
    pub package_id: String,
    pub manifest: ArtifactManifest,
    /// Build log
    pub log: String,
    /// Warnings generated during build
    pub warnings: Vec<String>,
    /// Build directory, when it was kept
    pub build_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kitchen_config_default() {
        let config = KitchenConfig::default();
        assert!(config.jobs > 0);
        assert!(!config.keep_builddir);
        assert!(config.verbose);
        assert!(!config.allow_system_dependencies);
        assert_eq!(config.cmake, "cmake");
        assert!(config.source_cache.ends_with("larder/sources"));
        assert_eq!(config.download_timeout(), Duration::from_secs(600));
    }

    #[test]
    fn test_partial_table() {
        let config: KitchenConfig = toml::from_str(
            r#"
jobs = 2
generator = "Ninja"

[dependency_prefixes]
sdl = "/opt/sdl"
"#,
        )
        .unwrap();
        assert_eq!(config.jobs, 2);
        assert_eq!(config.generator.as_deref(), Some("Ninja"));
        assert_eq!(config.dependency_prefixes["sdl"], PathBuf::from("/opt/sdl"));
        assert_eq!(config.cmake, "cmake");
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(toml::from_str::<KitchenConfig>("use_isolation = true").is_err());
    }
}
