// src/recipe/kitchen/mod.rs

//! Kitchen: the build environment for cooking recipes
//!
//! The Kitchen turns a configured recipe into a published package. It
//! handles:
//! - Fetching source archives into a checksum-keyed cache
//! - Extracting and patching sources
//! - Generating build descriptors for packages without a usable build
//! - Running CMake configure, build and install
//! - Publishing the install tree with its artifact manifest

mod archive;
pub mod cmake;
mod config;
mod cook;
pub mod generate;
pub mod locator;
pub mod patch;
pub mod publish;

pub use config::{CookResult, KitchenConfig};
pub use cook::{Cook, BUILD_LOG};
pub use locator::{DependencyLocator, NoopLocator, PrefixLocator};

use crate::error::{Error, Result};
use crate::hash::{normalize_checksum, sha256, verify_file_sha256};
use crate::recipe::configure::Configuration;
use crate::recipe::format::Recipe;
use archive::download_file;
use cmake::CmakeDriver;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The Kitchen: where recipes are cooked
pub struct Kitchen {
    pub(crate) config: KitchenConfig,
    /// Optional locator for requirements
    locator: Option<Arc<dyn DependencyLocator>>,
}

impl Kitchen {
    /// Create a new Kitchen with the given configuration
    pub fn new(config: KitchenConfig) -> Self {
        Self {
            config,
            locator: None,
        }
    }

    /// Create a new Kitchen with a dependency locator
    pub fn with_locator(config: KitchenConfig, locator: Arc<dyn DependencyLocator>) -> Self {
        Self {
            config,
            locator: Some(locator),
        }
    }

    /// Create a Kitchen with default configuration
    pub fn with_defaults() -> Self {
        Self::new(KitchenConfig::default())
    }

    /// Set the dependency locator
    pub fn set_locator(&mut self, locator: Arc<dyn DependencyLocator>) {
        self.locator = Some(locator);
    }

    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    /// The configured locator, or one over the configured prefixes and
    /// the packages already published in the output directory
    fn locator(&self) -> Arc<dyn DependencyLocator> {
        match &self.locator {
            Some(locator) => Arc::clone(locator),
            None => Arc::new(
                PrefixLocator::new(self.config.dependency_prefixes.clone())
                    .with_published(&self.config.output_dir),
            ),
        }
    }

    /// Find install prefixes for every requirement of a configuration
    ///
    /// Returns the prefixes in requirement order plus warnings for
    /// requirements left to the system. Unlocated requirements are fatal
    /// unless `allow_system_dependencies` is set.
    pub fn locate_dependencies(&self, config: &Configuration) -> Result<(Vec<PathBuf>, Vec<String>)> {
        if config.requirements.is_empty() {
            debug!("No requirements to locate");
            return Ok((Vec::new(), Vec::new()));
        }

        let locator = self.locator();
        let mut prefixes: Vec<PathBuf> = Vec::new();
        let mut missing = Vec::new();

        for requirement in &config.requirements {
            match locator.locate(requirement, &config.platform)? {
                Some(prefix) => {
                    if !prefixes.contains(&prefix) {
                        prefixes.push(prefix);
                    }
                }
                None => missing.push(requirement.to_string()),
            }
        }

        if missing.is_empty() {
            return Ok((prefixes, Vec::new()));
        }

        if !self.config.allow_system_dependencies {
            return Err(Error::MissingDependency(missing.join(", ")));
        }

        let warnings = missing
            .into_iter()
            .map(|r| {
                let msg = format!("Requirement {} not located, relying on the system", r);
                warn!("{}", msg);
                msg
            })
            .collect();
        Ok((prefixes, warnings))
    }

    /// Cook a configured recipe and publish the result
    ///
    /// This is the main entry point for building from source.
    ///
    /// ## Cooking Process
    /// 1. **Locate**: find every requirement (fatal if missing)
    /// 2. **Prep**: fetch the source archive into the cache
    /// 3. **Unpack**: extract, strip the top directory, drop bundled dirs
    /// 4. **Patch**: apply the recipe's patches in order
    /// 5. **Generate**: write `CMakeLists.txt` / `conanfile.txt` if the
    ///    recipe carries a project for this configuration
    /// 6. **Simmer**: CMake configure, build, install
    /// 7. **Plate**: publish into `<output>/<name>-<version>-<id>/`
    pub fn cook(&self, recipe: &Recipe, config: &Configuration) -> Result<CookResult> {
        info!("Cooking {} version {}", config.name, config.version);

        let (prefix_path, dep_warnings) = self.locate_dependencies(config)?;
        let cmake = CmakeDriver::locate(
            &self.config.cmake,
            self.config.generator.clone(),
            self.config.jobs,
            self.config.verbose,
        )?;

        let mut cook = Cook::new(self, recipe, config)?;
        cook.log_line(&format!(
            "Cooking {} {} for {} (package id {})",
            config.name,
            config.version,
            config.platform,
            config.package_id()
        ));
        cook.warnings.extend(dep_warnings);

        let outcome = (|| {
            // Phase 1: Prep - fetch ingredients
            info!("Prep: fetching ingredients...");
            cook.prep()?;

            // Phase 2: Unpack, patch and generate
            info!("Unpacking and patching sources...");
            cook.unpack()?;
            cook.patch()?;
            cook.generate()?;

            // Phase 3: Simmer - run the build
            info!("Simmering: running CMake...");
            cook.simmer(&cmake, &prefix_path)?;

            // Phase 4: Plate - publish the result
            info!("Plating: publishing package...");
            cook.plate(&self.config.output_dir)
        })();

        if let Err(e) = &outcome {
            cook.log_line(&format!("Failed: {}", e));
        }
        if let Err(e) = cook.write_log() {
            warn!("Failed to write build log: {}", e);
        }

        let build_dir = if self.config.keep_builddir {
            #[allow(deprecated)]
            let kept = cook.build_dir.into_path();
            info!("Keeping build directory {}", kept.display());
            Some(kept)
        } else {
            None
        };

        let published = outcome?;
        Ok(CookResult {
            package_dir: published.package_dir,
            package_id: config.package_id(),
            manifest: published.manifest,
            log: cook.log,
            warnings: cook.warnings,
            build_dir,
        })
    }

    /// Fetch and verify the source archive for a version without building
    ///
    /// Useful for pre-fetching sources for offline builds. `None` fetches
    /// the recipe's default version.
    pub fn fetch(&self, recipe: &Recipe, version: Option<&str>) -> Result<PathBuf> {
        let version = version.unwrap_or_else(|| recipe.default_version());
        info!("Fetching sources for {} version {}", recipe.package.name, version);
        self.fetch_source(recipe, version)
    }

    /// Check if the source for a version is already cached
    pub fn sources_cached(&self, recipe: &Recipe, version: &str) -> Result<bool> {
        Ok(self.cache_path(recipe, version)?.exists())
    }

    fn cache_path(&self, recipe: &Recipe, version: &str) -> Result<PathBuf> {
        let source = recipe.source_for(version)?;
        let key = match &source.sha256 {
            Some(checksum) => normalize_checksum(checksum)?,
            // Unverified sources are keyed by URL instead
            None => format!("url-{}", sha256(recipe.archive_url(version)?.as_bytes())),
        };
        Ok(self.config.source_cache.join(key))
    }

    /// Fetch a source archive (with caching)
    pub(crate) fn fetch_source(&self, recipe: &Recipe, version: &str) -> Result<PathBuf> {
        let source = recipe.source_for(version)?;
        let url = recipe.archive_url(version)?;

        // Create cache directory if needed
        fs::create_dir_all(&self.config.source_cache).map_err(|e| {
            Error::IoError(format!(
                "Failed to create source cache {}: {}",
                self.config.source_cache.display(),
                e
            ))
        })?;

        let cached_path = self.cache_path(recipe, version)?;

        // Check if already cached
        if cached_path.exists() {
            debug!("Using cached source: {}", cached_path.display());
            match &source.sha256 {
                Some(checksum) => match verify_file_sha256(&cached_path, checksum) {
                    Ok(()) => return Ok(cached_path),
                    Err(Error::ChecksumMismatch { .. }) => {
                        warn!("Cached file checksum mismatch, re-downloading");
                        fs::remove_file(&cached_path)?;
                    }
                    Err(e) => return Err(e),
                },
                None => return Ok(cached_path),
            }
        }

        // Download next to the final location, verify, then move into place
        let part_path = cached_path.with_extension("part");
        download_file(
            &url,
            &part_path,
            self.config.download_timeout(),
            self.config.progress,
        )?;

        match &source.sha256 {
            Some(checksum) => {
                if let Err(e) = verify_file_sha256(&part_path, checksum) {
                    fs::remove_file(&part_path)?;
                    return Err(e);
                }
            }
            None => warn!("No checksum for {} {}, source is unverified", recipe.package.name, version),
        }

        fs::rename(&part_path, &cached_path)?;
        Ok(cached_path)
    }
}
