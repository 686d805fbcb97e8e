// src/recipe/mod.rs

//! Recipe system for packaging native libraries from source
//!
//! Recipes define how to package a library, including:
//! - Source archives per version and their checksums
//! - Options, filtered by platform, and the requirements they pull in
//! - Patches to apply
//! - A generated CMake project for packages without a usable build
//! - Compile definitions and CMake cache variables
//! - Publish rules and the artifact metadata consumers see
//!
//! # Culinary Terminology
//!
//! - **Recipe**: What to package and how (like a recipe card)
//! - **Cook**: Build and publish one configuration of a recipe
//! - **Kitchen**: The build environment
//! - **Ingredients**: Source archives and patches
//! - **Prep**: Fetch and prepare sources
//! - **Simmer**: The CMake build
//! - **Plate**: Publish the result
//!
//! # Example Recipe
//!
//! ```toml
//! [package]
//! name = "smpeg"
//! version = "0.4.5"
//! license = "LGPL-2.0-or-later"
//!
//! [sources."0.4.5"]
//! url = "https://www.libsdl.org/projects/smpeg/release/smpeg-%(version)s.tar.gz"
//!
//! [options.shared]
//! default = false
//!
//! [[requires]]
//! name = "sdl"
//! version = "[>=1.2.0]"
//!
//! [project]
//! languages = ["C", "CXX"]
//! sources = ["MPEG.cpp", "smpeg.cpp"]
//! headers = ["smpeg.h"]
//! link = [{ package = "SDL", target = "SDL::SDL" }]
//! ```

mod builtin;
pub mod condition;
pub mod configure;
mod format;
pub mod kitchen;
pub mod manifest;
pub mod options;
pub mod parser;

pub use builtin::{builtin_names, builtin_recipe, load_recipe};
pub use condition::{Condition, Conditional, EvalContext};
pub use configure::{Artifacts, Configuration, DefinitionSet, Profile};
pub use format::{
    ArtifactSection, DefinitionSpec, DiffPatch, LinkSpec, PackageSection, PatchEntry,
    ProjectSection, PublishSection, Recipe, ReplaceInFile, Requirement, RequirementSpec,
    SourceSection,
};
pub use kitchen::{Cook, CookResult, DependencyLocator, Kitchen, KitchenConfig, PrefixLocator};
pub use manifest::{ArtifactManifest, FileEntry, MANIFEST_FILE};
pub use options::{OptionRef, OptionSpec, OptionValue, ResolvedOptions};
pub use parser::{parse_recipe, parse_recipe_file, validate_recipe};
