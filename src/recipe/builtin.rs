// src/recipe/builtin.rs

//! Recipes shipped inside the binary and recipe lookup by name or path

use super::format::Recipe;
use super::parser::{parse_recipe, parse_recipe_file};
use crate::error::{Error, Result};
use std::path::Path;
use tracing::debug;

const BUILTIN_RECIPES: &[(&str, &str)] = &[
    ("libmikmod", include_str!("../../recipes/libmikmod.toml")),
    ("sdl_gfx", include_str!("../../recipes/sdl_gfx.toml")),
    ("sdl_mixer", include_str!("../../recipes/sdl_mixer.toml")),
    ("smpeg", include_str!("../../recipes/smpeg.toml")),
];

/// Names of the built-in recipes, sorted
pub fn builtin_names() -> Vec<&'static str> {
    BUILTIN_RECIPES.iter().map(|(name, _)| *name).collect()
}

/// Parse a built-in recipe by name (case-insensitive)
pub fn builtin_recipe(name: &str) -> Result<Recipe> {
    BUILTIN_RECIPES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .ok_or_else(|| Error::RecipeNotFound(name.to_string()))
        .and_then(|(_, content)| parse_recipe(content))
}

/// Load a recipe given either a file path or a built-in name
///
/// Anything that exists on disk or ends in `.toml` is treated as a path.
pub fn load_recipe(reference: &str) -> Result<Recipe> {
    let path = Path::new(reference);
    if path.exists() || reference.ends_with(".toml") {
        if !path.is_file() {
            return Err(Error::RecipeNotFound(reference.to_string()));
        }
        debug!("Loading recipe file {}", path.display());
        return parse_recipe_file(path);
    }

    debug!("Loading built-in recipe {}", reference);
    builtin_recipe(reference)
}
