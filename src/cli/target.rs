// src/cli/target.rs
//! Arguments shared by commands that resolve a recipe for a platform

use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Built-in recipe name or path to a recipe file
    pub recipe: String,

    /// Version to use (default: the recipe's version)
    #[arg(long = "version", value_name = "VERSION")]
    pub pkg_version: Option<String>,

    /// Target operating system (default: host)
    #[arg(long)]
    pub os: Option<String>,

    /// Target architecture (default: host)
    #[arg(long)]
    pub arch: Option<String>,

    /// Compiler (default: conventional for the OS)
    #[arg(long)]
    pub compiler: Option<String>,

    /// Build type: Debug, Release, RelWithDebInfo, MinSizeRel
    #[arg(long)]
    pub build_type: Option<String>,

    /// Option override (repeatable)
    #[arg(short = 'o', long = "option", value_name = "NAME=VALUE")]
    pub options: Vec<String>,

    /// Treat a requirement as a shared library (repeatable)
    #[arg(long = "shared-dep", value_name = "NAME")]
    pub shared_deps: Vec<String>,
}
