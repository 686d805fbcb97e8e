// src/commands/mod.rs
//! Command handlers for the larder CLI

mod cook;
mod fetch;
mod generate;
mod list;
mod show;
mod validate;

pub use cook::{cmd_cook, CookArgs};
pub use fetch::cmd_fetch;
pub use generate::cmd_generate;
pub use list::cmd_list;
pub use show::cmd_show;
pub use validate::cmd_validate;

use crate::cli::TargetArgs;
use anyhow::{Context, Result};
use larder::config::{parse_option_args, PlatformOverrides};
use larder::{load_recipe, Configuration, LarderConfig, Recipe};
use std::path::Path;

/// Load the config file, the recipe, and resolve it for the target
fn resolve_target(
    config_path: Option<&Path>,
    target: &TargetArgs,
) -> Result<(LarderConfig, Recipe, Configuration)> {
    let config = LarderConfig::discover(config_path).context("Failed to load configuration")?;

    let recipe = load_recipe(&target.recipe)
        .with_context(|| format!("Failed to load recipe: {}", target.recipe))?;

    let overrides = PlatformOverrides {
        os: target.os.clone(),
        arch: target.arch.clone(),
        compiler: target.compiler.clone(),
        build_type: target.build_type.clone(),
    };
    let options = parse_option_args(&target.options)?;
    let mut profile = config.profile_for(&recipe.package.name, &overrides, &options)?;
    profile
        .shared_dependencies
        .extend(target.shared_deps.iter().cloned());

    let configuration = recipe
        .configure(target.pkg_version.as_deref(), &profile)
        .with_context(|| format!("Failed to configure {}", recipe.package.name))?;

    Ok((config, recipe, configuration))
}
