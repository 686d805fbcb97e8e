// src/recipe/parser.rs

//! Recipe file parsing and validation

use super::condition::{Condition, Conditional};
use super::format::{DefinitionSpec, PatchEntry, Recipe};
use super::options::OptionRef;
use crate::error::{Error, Result};
use crate::hash::normalize_checksum;
use std::path::Path;

/// Parse a recipe from a TOML string
pub fn parse_recipe(content: &str) -> Result<Recipe> {
    toml::from_str(content).map_err(|e| Error::ParseError(format!("Invalid recipe: {}", e)))
}

/// Parse a recipe from a file
///
/// Patch files named by the recipe are resolved relative to its directory.
pub fn parse_recipe_file(path: &Path) -> Result<Recipe> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::IoError(format!(
            "Failed to read recipe file {}: {}",
            path.display(),
            e
        ))
    })?;

    let mut recipe = parse_recipe(&content)?;
    recipe.recipe_dir = path.parent().map(Path::to_path_buf);
    Ok(recipe)
}

/// Validate a recipe for completeness and correctness
///
/// Structural problems are errors; omissions that still allow a build
/// (missing checksum, license, description) are returned as warnings.
pub fn validate_recipe(recipe: &Recipe) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if recipe.package.name.is_empty() {
        return Err(Error::ParseError("Recipe package name cannot be empty".to_string()));
    }
    if recipe.package.version.is_empty() {
        return Err(Error::ParseError("Recipe package version cannot be empty".to_string()));
    }
    recipe.source_for(recipe.default_version())?;

    for (version, source) in &recipe.sources {
        crate::version::Version::parse(version)?;
        match &source.sha256 {
            Some(checksum) => {
                normalize_checksum(checksum)?;
            }
            None => warnings.push(format!("Source for version {} has no sha256", version)),
        }
    }

    for (name, spec) in &recipe.options {
        if !spec.values.is_empty() && !spec.values.contains(&spec.default) {
            return Err(Error::ParseError(format!(
                "Default of option '{}' is not among its values",
                name
            )));
        }
        if let Some(by) = &spec.dropped_by {
            check_option_name(recipe, by, &format!("option '{}' dropped_by", name))?;
        }
    }

    for condition in recipe_conditions(recipe) {
        if let Some(reference) = &condition.option {
            check_option_name(recipe, reference.name(), "condition")?;
        }
    }

    for spec in recipe.definitions.iter().chain(&recipe.variables) {
        check_definition(recipe, spec)?;
    }

    for patch in &recipe.patches {
        let versions = match patch {
            PatchEntry::Replace(r) => {
                if r.search.is_empty() {
                    return Err(Error::ParseError(format!(
                        "Empty search text in patch for {}",
                        r.file
                    )));
                }
                &r.versions
            }
            PatchEntry::Diff(d) => {
                if d.diff.is_some() == d.patch_file.is_some() {
                    return Err(Error::ParseError(
                        "Diff patch needs exactly one of 'diff' or 'patch_file'".to_string(),
                    ));
                }
                &d.versions
            }
        };
        for v in versions {
            if !recipe.sources.contains_key(v) {
                warnings.push(format!(
                    "Patch '{}' targets version {} which has no source",
                    patch.describe(),
                    v
                ));
            }
        }
    }

    if recipe.package.license.is_none() {
        warnings.push("Missing package license".to_string());
    }
    if recipe.package.description.is_none() {
        warnings.push("Missing package description".to_string());
    }

    Ok(warnings)
}

fn check_option_name(recipe: &Recipe, name: &str, context: &str) -> Result<()> {
    if recipe.options.contains_key(name) {
        Ok(())
    } else {
        Err(Error::ParseError(format!(
            "Unknown option '{}' referenced in {}",
            name, context
        )))
    }
}

fn check_definition(recipe: &Recipe, spec: &DefinitionSpec) -> Result<()> {
    match (&spec.value, &spec.option) {
        (Some(_), None) => Ok(()),
        (None, Some(option)) => {
            let reference: OptionRef = option.parse()?;
            check_option_name(recipe, reference.name(), &format!("definition '{}'", spec.name))
        }
        _ => Err(Error::ParseError(format!(
            "Definition '{}' needs exactly one of 'value' or 'option'",
            spec.name
        ))),
    }
}

/// Every `when` condition in a recipe
fn recipe_conditions(recipe: &Recipe) -> Vec<&Condition> {
    fn from_list<'a, T>(items: &'a [Conditional<T>], out: &mut Vec<&'a Condition>) {
        out.extend(items.iter().filter_map(Conditional::condition));
    }

    let mut out: Vec<&Condition> = Vec::new();
    out.extend(recipe.options.values().filter_map(|o| o.when.as_ref()));
    out.extend(recipe.requires.iter().filter_map(|r| r.when.as_ref()));
    out.extend(
        recipe
            .definitions
            .iter()
            .chain(&recipe.variables)
            .filter_map(|d| d.when.as_ref()),
    );

    if let Some(project) = &recipe.project {
        out.extend(project.when.as_ref());
        from_list(&project.sources, &mut out);
        from_list(&project.source_globs, &mut out);
        from_list(&project.headers, &mut out);
        from_list(&project.include_dirs, &mut out);
        out.extend(project.link.iter().filter_map(|l| l.when.as_ref()));
    }

    from_list(&recipe.publish.remove, &mut out);
    from_list(&recipe.publish.remove_dirs, &mut out);
    from_list(&recipe.publish.licenses, &mut out);

    let a = &recipe.artifacts;
    for list in [&a.libs, &a.include_dirs, &a.defines, &a.system_libs, &a.frameworks] {
        from_list(list, &mut out);
    }
    for choice in [&a.pkg_config_name, &a.cmake_file_name, &a.cmake_target_name]
        .into_iter()
        .flatten()
    {
        out.extend(choice.candidates().into_iter().filter_map(Conditional::condition));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
[package]
name = "test"
version = "1.0"
license = "MIT"
description = "A test library"

[sources."1.0"]
url = "https://example.com/test-%(version)s.tar.gz"
sha256 = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"

[options.shared]
default = false

[[definitions]]
name = "TEST_STATIC"
option = "!shared"
"#;

    #[test]
    fn test_parse_valid_recipe() {
        let recipe = parse_recipe(VALID).unwrap();
        assert_eq!(recipe.package.name, "test");
        assert!(validate_recipe(&recipe).unwrap().is_empty());
    }

    #[test]
    fn test_parse_invalid_recipe() {
        let content = "this is not valid toml at all {}";
        assert!(parse_recipe(content).is_err());
    }

    #[test]
    fn test_parse_recipe_file_records_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.toml");
        std::fs::write(&path, VALID).unwrap();

        let recipe = parse_recipe_file(&path).unwrap();
        assert_eq!(recipe.recipe_dir.as_deref(), Some(dir.path()));
        assert!(parse_recipe_file(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_validate_empty_name() {
        let recipe = parse_recipe(&VALID.replace("name = \"test\"", "name = \"\"")).unwrap();
        assert!(validate_recipe(&recipe).is_err());
    }

    #[test]
    fn test_validate_default_version_needs_source() {
        let recipe = parse_recipe(&VALID.replace("version = \"1.0\"", "version = \"2.0\"")).unwrap();
        assert!(matches!(
            validate_recipe(&recipe),
            Err(Error::UnknownVersion { .. })
        ));
    }

    #[test]
    fn test_validate_bad_checksum() {
        let recipe = parse_recipe(&VALID.replace("sha256 = \"b94d", "sha256 = \"md5:b94d")).unwrap();
        assert!(validate_recipe(&recipe).is_err());
    }

    #[test]
    fn test_validate_unknown_option_reference() {
        let content = format!(
            "{}\n[[requires]]\nname = \"zlib\"\nversion = \"1.2.13\"\nwhen = {{ option = \"with_zlib\" }}\n",
            VALID
        );
        let recipe = parse_recipe(&content).unwrap();
        let err = validate_recipe(&recipe).unwrap_err();
        assert!(err.to_string().contains("with_zlib"));
    }

    #[test]
    fn test_validate_definition_needs_one_source() {
        let content = format!(
            "{}\n[[definitions]]\nname = \"BOTH\"\nvalue = 1\noption = \"shared\"\n",
            VALID
        );
        let recipe = parse_recipe(&content).unwrap();
        assert!(validate_recipe(&recipe).is_err());
    }

    #[test]
    fn test_validate_warnings() {
        let content = r#"
[package]
name = "test"
version = "1.0"

[sources."1.0"]
url = "https://example.com/test.tar.gz"

[[patches]]
file = "a.c"
search = "x"
replace = "y"
versions = ["0.9"]
"#;
        let recipe = parse_recipe(content).unwrap();
        let warnings = validate_recipe(&recipe).unwrap();
        assert!(warnings.iter().any(|w| w.contains("sha256")));
        assert!(warnings.iter().any(|w| w.contains("license")));
        assert!(warnings.iter().any(|w| w.contains("description")));
        assert!(warnings.iter().any(|w| w.contains("0.9")));
    }
}
