// src/lib.rs

//! Larder: recipe-driven packaging of native libraries
//!
//! A recipe describes one upstream library: where its sources live, which
//! options it has on which platforms, what it requires, how to patch it and
//! what consumers get once it is built. Cooking a recipe resolves it for a
//! platform, fetches and patches the sources, builds them with CMake and
//! publishes the install tree together with an artifact manifest.
//!
//! # Architecture
//!
//! - Recipes are data (TOML); all behavior lives in the pipeline
//! - Every run is recomputed from recipe + platform + option overrides
//! - The only persistent state is the source cache and the published tree
//! - Published packages are identified by a digest of their configuration

pub mod config;
mod error;
pub mod hash;
pub mod platform;
pub mod recipe;
pub mod version;

pub use config::LarderConfig;
pub use error::{Error, Result};
pub use platform::{Arch, BuildType, Compiler, Os, Platform};
pub use recipe::{
    load_recipe, ArtifactManifest, Configuration, CookResult, Kitchen, KitchenConfig, Profile,
    Recipe,
};
pub use version::{Version, VersionReq};
