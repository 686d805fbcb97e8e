// src/cli/mod.rs
//! CLI definitions for larder
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.
//!
//! - `list` - Built-in recipes
//! - `show` - Resolved configuration for a platform
//! - `validate` - Parse and check a recipe
//! - `generate` - Write generated build descriptors only
//! - `fetch` - Fetch and verify sources into the cache
//! - `cook` - The full pipeline: fetch, patch, build, publish

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod target;

pub use target::TargetArgs;

#[derive(Parser)]
#[command(name = "larder")]
#[command(author = "Larder Contributors")]
#[command(version)]
#[command(about = "Recipe-driven packaging of native libraries with CMake", long_about = None)]
pub struct Cli {
    /// Config file (default: $LARDER_CONFIG, then the user config directory)
    #[arg(long, global = true, env = "LARDER_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List built-in recipes
    List,

    /// Show a recipe resolved for a platform
    Show {
        #[command(flatten)]
        target: TargetArgs,

        /// Print the configuration and manifest preview as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse and validate a recipe
    Validate {
        /// Built-in recipe name or path to a recipe file
        recipe: String,
    },

    /// Write the generated CMakeLists.txt and conanfile.txt
    Generate {
        #[command(flatten)]
        target: TargetArgs,

        /// Directory to write into
        #[arg(long, value_name = "DIR")]
        dest: PathBuf,
    },

    /// Fetch and verify sources into the cache
    Fetch {
        /// Built-in recipe name or path to a recipe file
        recipe: String,

        /// Version to fetch (default: the recipe's version)
        #[arg(long = "version", value_name = "VERSION", conflicts_with = "all_versions")]
        pkg_version: Option<String>,

        /// Fetch every version the recipe declares
        #[arg(long)]
        all_versions: bool,

        /// Source cache directory
        #[arg(long, env = "LARDER_SOURCE_CACHE", value_name = "DIR")]
        source_cache: Option<PathBuf>,
    },

    /// Fetch, patch, build and publish a recipe
    Cook {
        #[command(flatten)]
        target: TargetArgs,

        /// Output directory for published packages
        #[arg(long, env = "LARDER_OUTPUT", value_name = "DIR")]
        output: Option<PathBuf>,

        /// Source cache directory
        #[arg(long, env = "LARDER_SOURCE_CACHE", value_name = "DIR")]
        source_cache: Option<PathBuf>,

        /// Number of parallel build jobs
        #[arg(short, long)]
        jobs: Option<u32>,

        /// CMake executable
        #[arg(long, env = "LARDER_CMAKE", value_name = "PATH")]
        cmake: Option<String>,

        /// CMake generator
        #[arg(short = 'G', long)]
        generator: Option<String>,

        /// Install prefix for a requirement (repeatable)
        #[arg(long = "prefix", value_name = "NAME=PATH")]
        prefixes: Vec<String>,

        /// Let CMake find requirements larder cannot locate
        #[arg(long)]
        allow_system_deps: bool,

        /// Keep the build directory after completion
        #[arg(long)]
        keep_builddir: bool,

        /// Only validate the recipe, don't cook
        #[arg(long, conflicts_with = "fetch_only")]
        validate_only: bool,

        /// Only fetch sources, don't build
        #[arg(long)]
        fetch_only: bool,

        /// Show a download progress bar
        #[arg(long)]
        progress: bool,
    },
}
