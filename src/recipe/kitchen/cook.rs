// src/recipe/kitchen/cook.rs

//! Cook: the actual build execution for a single configuration

use crate::error::{Error, Result};
use crate::recipe::configure::Configuration;
use crate::recipe::format::Recipe;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

use super::archive::{extract_archive, remove_dirs, strip_root};
use super::cmake::{check_status, render_toolchain, BuildPaths, CmakeDriver, TOOLCHAIN_FILE};
use super::generate::write_descriptors;
use super::patch::apply_patches;
use super::publish::{publish, Published};
use super::Kitchen;

/// File the accumulated log is written to inside the build directory
pub const BUILD_LOG: &str = "build.log";

/// A single cook operation
pub struct Cook<'a> {
    pub(super) kitchen: &'a Kitchen,
    pub(super) recipe: &'a Recipe,
    pub(super) config: &'a Configuration,
    /// Temporary build directory
    pub(super) build_dir: TempDir,
    /// Source archive, once fetched
    pub(super) archive: Option<PathBuf>,
    /// Source directory within build_dir
    pub(super) source_dir: PathBuf,
    /// Destination directory (CMake install prefix)
    pub(super) dest_dir: PathBuf,
    /// Build log accumulator
    pub(super) log: String,
    /// Warnings
    pub(super) warnings: Vec<String>,
}

impl<'a> Cook<'a> {
    pub(super) fn new(
        kitchen: &'a Kitchen,
        recipe: &'a Recipe,
        config: &'a Configuration,
    ) -> Result<Self> {
        let prefix = format!("larder-{}-", config.name);
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        let build_dir = match &kitchen.config.build_root {
            Some(root) => {
                fs::create_dir_all(root)?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .map_err(|e| Error::IoError(format!("Failed to create build directory: {}", e)))?;

        let source_dir = build_dir.path().join("source");
        let dest_dir = build_dir.path().join("install");

        fs::create_dir_all(&source_dir)?;
        fs::create_dir_all(&dest_dir)?;

        Ok(Self {
            kitchen,
            recipe,
            config,
            build_dir,
            archive: None,
            source_dir,
            dest_dir,
            log: String::new(),
            warnings: Vec::new(),
        })
    }

    /// Phase 1: Prep - fetch the source archive
    pub(super) fn prep(&mut self) -> Result<()> {
        let archive = self.kitchen.fetch_source(self.recipe, &self.config.version)?;
        self.log_line(&format!(
            "Fetched source: {}",
            self.recipe.archive_url(&self.config.version)?
        ));
        self.archive = Some(archive);
        Ok(())
    }

    /// Phase 2a: Unpack sources
    pub(super) fn unpack(&mut self) -> Result<()> {
        let archive = self
            .archive
            .clone()
            .ok_or_else(|| Error::NotFound("Source archive has not been fetched".to_string()))?;
        let source = self.recipe.source_for(&self.config.version)?;

        extract_archive(&archive, &self.source_dir)?;
        self.log_line(&format!("Extracted source to {}", self.source_dir.display()));

        if source.strip_root {
            self.source_dir = strip_root(&self.source_dir)?;
            debug!("Source directory: {}", self.source_dir.display());
        }

        for dir in remove_dirs(&self.source_dir, &source.remove)? {
            self.log_line(&format!("Removed bundled directory {}", dir));
        }

        Ok(())
    }

    /// Phase 2b: Apply patches
    pub(super) fn patch(&mut self) -> Result<()> {
        let patches = self.recipe.patches_for(&self.config.version);
        if patches.is_empty() {
            return Ok(());
        }

        let applied = apply_patches(
            &self.source_dir,
            &patches,
            self.recipe.recipe_dir.as_deref(),
        )?;
        for line in applied {
            self.log_line(&line);
        }
        Ok(())
    }

    /// Phase 2c: write generated build descriptors
    pub(super) fn generate(&mut self) -> Result<()> {
        for path in write_descriptors(self.recipe, self.config, &self.source_dir)? {
            self.log_line(&format!("Generated {}", path.display()));
        }
        Ok(())
    }

    /// Phase 3: Simmer - configure, build and install with CMake
    pub(super) fn simmer(&mut self, cmake: &CmakeDriver, prefix_path: &[PathBuf]) -> Result<()> {
        let paths = BuildPaths {
            source_dir: self.source_dir.clone(),
            build_dir: self.build_dir.path().join("build"),
            install_prefix: self.dest_dir.clone(),
            toolchain_file: self.build_dir.path().join(TOOLCHAIN_FILE),
        };
        fs::create_dir_all(&paths.build_dir)?;

        fs::write(&paths.toolchain_file, render_toolchain(&self.config.definitions))
            .map_err(|e| Error::IoError(format!("Failed to write toolchain file: {}", e)))?;
        self.log_line(&format!(
            "Wrote toolchain with {} definition(s)",
            self.config.definitions.len()
        ));

        let cache_args = cmake.cache_args(self.config, &paths, prefix_path);
        let steps = [
            ("configure", cmake.configure_args(&paths, cache_args)),
            ("build", cmake.build_args(&paths, self.config)),
            ("install", cmake.install_args(&paths, self.config)),
        ];

        for (phase, args) in steps {
            info!("Running {} phase", phase);
            let output = cmake.run(phase, &args, self.build_dir.path())?;
            self.log_line(&format!("$ cmake {}", args.join(" ")));
            self.log_build_output(
                phase,
                &String::from_utf8_lossy(&output.stdout),
                &String::from_utf8_lossy(&output.stderr),
            );
            check_status(phase, &output.status)?;
        }

        Ok(())
    }

    /// Phase 4: Plate - publish the install tree
    pub(super) fn plate(&mut self, output_dir: &Path) -> Result<Published> {
        if fs::read_dir(&self.dest_dir)?.next().is_none() {
            return Err(Error::PublishError(
                "No files installed - install phase may have failed".to_string(),
            ));
        }

        let published = publish(
            self.recipe,
            self.config,
            &self.dest_dir,
            &self.source_dir,
            output_dir,
        )?;

        for line in &published.log {
            self.log_line(line);
        }
        self.warnings.extend(published.warnings.iter().cloned());
        info!(
            "Cooked: {} ({} files)",
            published.package_dir.display(),
            published.manifest.files.len()
        );

        Ok(published)
    }

    /// Write the accumulated log into the build directory
    pub(super) fn write_log(&self) -> Result<PathBuf> {
        let path = self.build_dir.path().join(BUILD_LOG);
        fs::write(&path, &self.log)?;
        Ok(path)
    }

    pub(super) fn log_line(&mut self, line: &str) {
        self.log.push_str(line);
        self.log.push('\n');
    }

    /// Log build step output (stdout/stderr) with a phase header
    fn log_build_output(&mut self, phase: &str, stdout: &str, stderr: &str) {
        self.log_line(&format!("=== {} ===", phase));
        if !stdout.is_empty() {
            self.log.push_str(stdout);
            self.log.push('\n');
        }
        if !stderr.is_empty() {
            self.log.push_str(stderr);
            self.log.push('\n');
        }
    }
}
