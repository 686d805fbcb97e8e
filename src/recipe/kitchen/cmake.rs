// src/recipe/kitchen/cmake.rs

//! CMake driver: toolchain file, cache arguments and the three build phases
//!
//! Definitions reach the compiler through a generated toolchain file holding
//! one `add_compile_definitions` call each. Cache variables and the standard
//! CMake knobs are passed as `-D` arguments on the configure command line.

use crate::error::{Error, Result};
use crate::recipe::configure::{Configuration, DefinitionSet};
use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output};
use tracing::debug;

pub const TOOLCHAIN_FILE: &str = "larder_toolchain.cmake";

/// Build phases, in the order they run
pub const PHASES: [&str; 3] = ["configure", "build", "install"];

/// Render the toolchain file injecting compile definitions
///
/// Booleans become `1`/`0`; everything else is written verbatim.
pub fn render_toolchain(definitions: &DefinitionSet) -> String {
    let mut out = String::from("# Generated by larder\n");
    for (name, value) in definitions {
        let define = format!("{}={}", name, value.as_define());
        let _ = writeln!(out, "add_compile_definitions(\"{}\")", escape(&define));
    }
    out
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Paths handed to CMake for one build
#[derive(Debug, Clone)]
pub struct BuildPaths {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub install_prefix: PathBuf,
    pub toolchain_file: PathBuf,
}

/// A resolved `cmake` executable plus the invocation settings
#[derive(Debug, Clone)]
pub struct CmakeDriver {
    program: PathBuf,
    generator: Option<String>,
    jobs: u32,
    verbose: bool,
}

impl CmakeDriver {
    /// Locate `program` (a name on PATH or a path) and build a driver
    pub fn locate(program: &str, generator: Option<String>, jobs: u32, verbose: bool) -> Result<Self> {
        let program = which::which(program)
            .map_err(|e| Error::ToolNotFound(format!("{}: {}", program, e)))?;
        debug!("Using cmake at {}", program.display());
        Ok(Self {
            program,
            generator,
            jobs: jobs.max(1),
            verbose,
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// `-D` arguments for the configure phase
    pub fn cache_args(
        &self,
        config: &Configuration,
        paths: &BuildPaths,
        prefix_path: &[PathBuf],
    ) -> Vec<String> {
        let mut args = vec![
            format!("-DCMAKE_BUILD_TYPE={}", config.platform.build_type),
            format!("-DCMAKE_INSTALL_PREFIX={}", paths.install_prefix.display()),
            format!("-DCMAKE_TOOLCHAIN_FILE={}", paths.toolchain_file.display()),
            format!(
                "-DBUILD_SHARED_LIBS={}",
                if config.is_shared() { "ON" } else { "OFF" }
            ),
        ];

        if let Some(fpic) = config.options.get("fPIC") {
            args.push(format!(
                "-DCMAKE_POSITION_INDEPENDENT_CODE={}",
                fpic.as_cache()
            ));
        }

        if !prefix_path.is_empty() {
            let joined: Vec<String> = prefix_path
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            args.push(format!("-DCMAKE_PREFIX_PATH={}", joined.join(";")));
        }

        if self.verbose {
            args.push("-DCMAKE_VERBOSE_MAKEFILE=ON".to_string());
        }
        args.push("-DCMAKE_INSTALL_LIBDIR=lib".to_string());

        for (name, value) in &config.variables {
            if value.is_bool() {
                args.push(format!("-D{}:BOOL={}", name, value.as_cache()));
            } else {
                args.push(format!("-D{}={}", name, value.as_cache()));
            }
        }

        args
    }

    pub fn configure_args(&self, paths: &BuildPaths, cache_args: Vec<String>) -> Vec<String> {
        let mut args = vec![
            "-S".to_string(),
            paths.source_dir.display().to_string(),
            "-B".to_string(),
            paths.build_dir.display().to_string(),
        ];
        if let Some(generator) = &self.generator {
            args.push("-G".to_string());
            args.push(generator.clone());
        }
        args.extend(cache_args);
        args
    }

    pub fn build_args(&self, paths: &BuildPaths, config: &Configuration) -> Vec<String> {
        vec![
            "--build".to_string(),
            paths.build_dir.display().to_string(),
            "--config".to_string(),
            config.platform.build_type.to_string(),
            "--parallel".to_string(),
            self.jobs.to_string(),
        ]
    }

    pub fn install_args(&self, paths: &BuildPaths, config: &Configuration) -> Vec<String> {
        vec![
            "--install".to_string(),
            paths.build_dir.display().to_string(),
            "--config".to_string(),
            config.platform.build_type.to_string(),
        ]
    }

    /// Run one cmake invocation and capture its output
    ///
    /// Only spawn failures are errors here; check the status with
    /// [`check_status`] once the output has been logged.
    pub fn run(&self, phase: &str, args: &[String], workdir: &Path) -> Result<Output> {
        debug!("{} {}: {}", phase, self.program.display(), args.join(" "));
        Command::new(&self.program)
            .args(args)
            .current_dir(workdir)
            .env("SOURCE_DATE_EPOCH", "0")
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => Error::ToolNotFound(self.program.display().to_string()),
                _ => Error::IoError(format!("Failed to run {} phase: {}", phase, e)),
            })
    }
}

/// Map a finished step's status to `BuildFailed`, keeping the exit code
pub fn check_status(phase: &str, status: &ExitStatus) -> Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(Error::BuildFailed {
            phase: phase.to_string(),
            code: status.code(),
        })
    }
}
