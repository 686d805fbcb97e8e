// src/commands/validate.rs

//! Validate command - parse and check a recipe

use anyhow::{Context, Result};
use larder::load_recipe;
use larder::recipe::validate_recipe;

pub fn cmd_validate(reference: &str) -> Result<()> {
    let recipe =
        load_recipe(reference).with_context(|| format!("Failed to load recipe: {}", reference))?;
    println!("Recipe: {} version {}", recipe.package.name, recipe.package.version);

    let warnings = validate_recipe(&recipe).with_context(|| "Recipe validation failed")?;
    for warning in &warnings {
        println!("Warning: {}", warning);
    }

    println!("Recipe validation passed");
    if warnings.is_empty() {
        println!("[OK] No issues found");
    } else {
        println!("[OK] {} warning(s)", warnings.len());
    }
    Ok(())
}
