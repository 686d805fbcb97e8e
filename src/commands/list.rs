// src/commands/list.rs

//! List command - the recipes built into larder

use anyhow::{Context, Result};
use larder::recipe::{builtin_names, builtin_recipe};

pub fn cmd_list() -> Result<()> {
    println!("Built-in recipes:");
    for name in builtin_names() {
        let recipe =
            builtin_recipe(name).with_context(|| format!("Built-in recipe {} is invalid", name))?;
        println!(
            "  {:<12} {:<24} {}",
            name,
            recipe.versions().join(", "),
            recipe.package.license.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
