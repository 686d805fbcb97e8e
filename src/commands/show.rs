// src/commands/show.rs

//! Show command - a recipe resolved for one platform

use super::resolve_target;
use crate::cli::TargetArgs;
use anyhow::{Context, Result};
use larder::ArtifactManifest;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ShowOutput<'a> {
    package_id: String,
    configuration: &'a larder::Configuration,
    manifest: ArtifactManifest,
}

pub fn cmd_show(config_path: Option<&Path>, target: &TargetArgs, json: bool) -> Result<()> {
    let (_, recipe, config) = resolve_target(config_path, target)?;
    let manifest = ArtifactManifest::new(&recipe, &config);

    if json {
        let output = ShowOutput {
            package_id: config.package_id(),
            configuration: &config,
            manifest,
        };
        let text = serde_json::to_string_pretty(&output).context("Failed to serialize")?;
        println!("{}", text);
        return Ok(());
    }

    println!("{} {} for {}", config.name, config.version, config.platform);
    println!("Package id: {}", config.package_id());

    println!("\nOptions:");
    for (name, value) in config.options.iter() {
        println!("  {} = {}", name, value);
    }

    println!("\nRequirements:");
    if config.requirements.is_empty() {
        println!("  (none)");
    }
    for requirement in &config.requirements {
        println!("  {}", requirement);
    }

    println!("\nDefinitions:");
    for (name, value) in &config.definitions {
        println!("  {}={}", name, value.as_define());
    }

    if !config.variables.is_empty() {
        println!("\nCache variables:");
        for (name, value) in &config.variables {
            println!("  {}={}", name, value.as_cache());
        }
    }

    let a = &config.artifacts;
    println!("\nArtifacts:");
    println!("  libs:         {}", a.libs.join(" "));
    println!("  include dirs: {}", a.include_dirs.join(" "));
    if !a.defines.is_empty() {
        println!("  defines:      {}", a.defines.join(" "));
    }
    if !a.system_libs.is_empty() {
        println!("  system libs:  {}", a.system_libs.join(" "));
    }
    if !a.frameworks.is_empty() {
        println!("  frameworks:   {}", a.frameworks.join(" "));
    }
    println!("  pkg-config:   {}", a.pkg_config_name);
    println!("  cmake:        {} ({})", a.cmake_file_name, a.cmake_target_name);

    Ok(())
}
