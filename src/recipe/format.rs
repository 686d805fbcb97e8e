// src/recipe/format.rs

//! Recipe file format definitions
//!
//! Recipes are TOML files that describe how to fetch, patch, build and
//! publish one upstream library. Everything that varies by platform, option
//! or version is expressed with `when` conditions (see [`Condition`]) rather
//! than code, so a recipe stays a table of facts.

use super::condition::{Choice, Condition, Conditional};
use super::options::{OptionSpec, OptionValue};
use crate::error::{Error, Result};
use crate::version::VersionReq;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A complete recipe for packaging one library
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Recipe {
    /// Package metadata
    pub package: PackageSection,

    /// Source archives keyed by version
    #[serde(default)]
    pub sources: BTreeMap<String, SourceSection>,

    /// Build options (feature toggles)
    #[serde(default)]
    pub options: BTreeMap<String, OptionSpec>,

    /// Upstream packages this one depends on
    #[serde(default)]
    pub requires: Vec<RequirementSpec>,

    /// Source modifications, applied in listed order
    #[serde(default)]
    pub patches: Vec<PatchEntry>,

    /// Generated CMake project for sources without a usable build description
    #[serde(default)]
    pub project: Option<ProjectSection>,

    /// Preprocessor definitions injected through the toolchain file
    #[serde(default)]
    pub definitions: Vec<DefinitionSpec>,

    /// CMake cache variables passed on the configure command line
    #[serde(default)]
    pub variables: Vec<DefinitionSpec>,

    /// Post-install cleanup of the staged tree
    #[serde(default)]
    pub publish: PublishSection,

    /// What the package exposes to its consumers
    #[serde(default)]
    pub artifacts: ArtifactSection,

    /// Directory the recipe was loaded from (for relative patch files)
    #[serde(skip)]
    pub recipe_dir: Option<PathBuf>,
}

impl Recipe {
    /// Substitute variables in a string
    ///
    /// Replaces `%(name)s` and `%(version)s`.
    pub fn substitute(&self, template: &str, version: &str) -> String {
        template
            .replace("%(version)s", version)
            .replace("%(name)s", &self.package.name)
    }

    /// The version cooked when none is requested
    pub fn default_version(&self) -> &str {
        &self.package.version
    }

    /// Versions with a declared source, oldest first as written
    pub fn versions(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }

    /// The source entry for a version
    pub fn source_for(&self, version: &str) -> Result<&SourceSection> {
        self.sources.get(version).ok_or_else(|| Error::UnknownVersion {
            package: self.package.name.clone(),
            version: version.to_string(),
        })
    }

    /// The archive URL for a version with variables substituted
    pub fn archive_url(&self, version: &str) -> Result<String> {
        Ok(self.substitute(&self.source_for(version)?.url, version))
    }

    /// The archive filename from the URL
    pub fn archive_filename(&self, version: &str) -> Result<String> {
        let url = self.archive_url(version)?;
        Ok(url
            .split('/')
            .next_back()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}-{}.tar.gz", self.package.name, version)))
    }

    /// Patches that apply to a version, in order
    pub fn patches_for(&self, version: &str) -> Vec<&PatchEntry> {
        self.patches
            .iter()
            .filter(|p| p.applies_to(version))
            .collect()
    }
}

/// Package metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageSection {
    /// Package name
    pub name: String,

    /// Default version
    pub version: String,

    /// Short description
    #[serde(default)]
    pub description: Option<String>,

    /// License identifier (SPDX)
    #[serde(default)]
    pub license: Option<String>,

    /// Homepage URL
    #[serde(default)]
    pub homepage: Option<String>,

    #[serde(default)]
    pub topics: Vec<String>,
}

/// Source archive for one version
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSection {
    /// Archive URL
    ///
    /// Supports `%(version)s` and `%(name)s` substitution. `file://` URLs and
    /// plain paths point at local mirrors.
    pub url: String,

    /// Expected SHA-256 of the archive
    #[serde(default)]
    pub sha256: Option<String>,

    /// Drop the single top-level directory most tarballs carry
    #[serde(default = "default_true")]
    pub strip_root: bool,

    /// Directories removed right after extraction (bundled third-party code)
    #[serde(default)]
    pub remove: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// A dependency on another package
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequirementSpec {
    pub name: String,
    pub version: VersionReq,
    #[serde(default)]
    pub when: Option<Condition>,
}

/// A resolved dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub name: String,
    pub version: VersionReq,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// One source modification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchEntry {
    /// Exact-match-and-replace in a single file
    Replace(ReplaceInFile),
    /// Unified diff, inline or from a file next to the recipe
    Diff(DiffPatch),
}

impl PatchEntry {
    /// Whether this entry is limited to versions excluding `version`
    pub fn applies_to(&self, version: &str) -> bool {
        let versions = match self {
            PatchEntry::Replace(r) => &r.versions,
            PatchEntry::Diff(d) => &d.versions,
        };
        versions.is_empty() || versions.iter().any(|v| v == version)
    }

    /// Human-readable label for logs
    pub fn describe(&self) -> String {
        match self {
            PatchEntry::Replace(r) => r
                .description
                .clone()
                .unwrap_or_else(|| format!("replace in {}", r.file)),
            PatchEntry::Diff(d) => d.description.clone().unwrap_or_else(|| {
                d.patch_file
                    .clone()
                    .map(|f| format!("patch {}", f))
                    .unwrap_or_else(|| "inline patch".to_string())
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceInFile {
    /// File relative to the source root
    pub file: String,
    /// Exact text to find; must occur at least once
    pub search: String,
    /// Replacement for every occurrence
    pub replace: String,
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiffPatch {
    /// Inline unified diff
    #[serde(default)]
    pub diff: Option<String>,
    /// Patch file relative to the recipe directory
    #[serde(default)]
    pub patch_file: Option<String>,
    /// Leading path components stripped from file names in the diff
    #[serde(default)]
    pub strip: u32,
    /// Subdirectory of the source root the diff is relative to
    #[serde(default)]
    pub base_path: Option<String>,
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Generated `CMakeLists.txt` and dependency declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    /// CMake project name (defaults to the package name)
    #[serde(default)]
    pub name: Option<String>,

    /// Generate only where this holds (e.g. old versions lacking a build)
    #[serde(default)]
    pub when: Option<Condition>,

    #[serde(default = "default_cmake_minimum")]
    pub cmake_minimum: String,

    /// Enabled languages (`C`, `CXX`)
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Library sources, relative to the source root
    #[serde(default)]
    pub sources: Vec<Conditional<String>>,

    /// Source globs expanded by CMake at configure time
    #[serde(default)]
    pub source_globs: Vec<Conditional<String>>,

    /// Public headers installed into the include directory
    #[serde(default)]
    pub headers: Vec<Conditional<String>>,

    /// Packages to find and targets to link
    #[serde(default)]
    pub link: Vec<LinkSpec>,

    /// Extra build-interface include directories
    #[serde(default)]
    pub include_dirs: Vec<Conditional<String>>,

    /// Also write `conanfile.txt` declaring the resolved requirements
    #[serde(default = "default_true")]
    pub dependency_file: bool,

    /// Generators listed in the dependency declaration
    #[serde(default = "default_generators")]
    pub generators: Vec<String>,
}

fn default_cmake_minimum() -> String {
    "3.1".to_string()
}

fn default_languages() -> Vec<String> {
    vec!["C".to_string()]
}

fn default_generators() -> Vec<String> {
    vec!["CMakeDeps".to_string(), "CMakeToolchain".to_string()]
}

/// `find_package` + `target_link_libraries` pair
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkSpec {
    /// Name passed to `find_package`
    pub package: String,
    /// Imported target to link (e.g. `SDL::SDL`)
    pub target: String,
    #[serde(default)]
    pub when: Option<Condition>,
}

/// One definition or cache variable
///
/// Exactly one of `value` (literal) or `option` (reference, `!name` negates,
/// `name=value` compares) must be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionSpec {
    pub name: String,
    #[serde(default)]
    pub value: Option<OptionValue>,
    #[serde(default)]
    pub option: Option<String>,
    /// Only true when this dependency is built shared (profile setting)
    #[serde(default)]
    pub dependency_shared: Option<String>,
    #[serde(default)]
    pub when: Option<Condition>,
    /// Emitted when the option is off or `when` does not hold
    #[serde(default)]
    pub otherwise: Option<OptionValue>,
}

/// Cleanup rules for the staged install tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishSection {
    /// Files to delete; a listed file that does not exist is an error
    #[serde(default)]
    pub remove: Vec<Conditional<String>>,

    /// Directories to delete recursively; missing ones are ignored
    #[serde(default)]
    pub remove_dirs: Vec<Conditional<String>>,

    /// License files copied from the source root into `licenses/`
    #[serde(default)]
    pub licenses: Vec<Conditional<String>>,

    /// Remove directories left empty after cleanup
    #[serde(default = "default_true")]
    pub prune_empty_dirs: bool,
}

impl Default for PublishSection {
    fn default() -> Self {
        Self {
            remove: Vec::new(),
            remove_dirs: Vec::new(),
            licenses: Vec::new(),
            prune_empty_dirs: true,
        }
    }
}

/// Consumption metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactSection {
    #[serde(default)]
    pub libs: Vec<Conditional<String>>,
    /// Defaults to `["include"]`
    #[serde(default)]
    pub include_dirs: Vec<Conditional<String>>,
    #[serde(default)]
    pub defines: Vec<Conditional<String>>,
    #[serde(default)]
    pub system_libs: Vec<Conditional<String>>,
    #[serde(default)]
    pub frameworks: Vec<Conditional<String>>,
    /// Defaults to the package name
    #[serde(default)]
    pub pkg_config_name: Option<Choice<String>>,
    /// Defaults to the package name
    #[serde(default)]
    pub cmake_file_name: Option<Choice<String>>,
    /// Defaults to `<name>::<name>`
    #[serde(default)]
    pub cmake_target_name: Option<Choice<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RECIPE: &str = r#"
[package]
name = "libmikmod"
version = "3.3.11.1"
description = "Module player library"
license = "LGPL-2.1-or-later"
homepage = "http://mikmod.sourceforge.net"

[sources."3.3.11.1"]
url = "https://example.com/libmikmod-%(version)s.tar.gz"
sha256 = "ad9d64dfc8f83684876419ea7cd4ff4a41d8bcd8c23ef37ecb3a200a16b46d19"

[options.shared]
default = false

[options.with_alsa]
default = true
when = { os = ["Linux"] }

[[requires]]
name = "libalsa"
version = "1.2.7.2"
when = { os = ["Linux"], option = "with_alsa" }

[[patches]]
file = "CMakeLists.txt"
search = "MESSAGE(WARNING"
replace = "MESSAGE(FATAL_ERROR"

[[patches]]
diff = """--- a/x.c
+++ b/x.c
@@ -1 +1 @@
-a
+b
"""
strip = 1
versions = ["3.3.11.0"]

[[definitions]]
name = "ENABLE_ALSA"
option = "with_alsa"

[[variables]]
name = "MYVAR"
value = "1"

[publish]
remove = ["bin/libmikmod-config"]
remove_dirs = ["lib/pkgconfig", { value = "bin", when = { option = "!shared" } }]

[artifacts]
libs = ["mikmod"]
defines = [{ value = "MIKMOD_STATIC", when = { option = "!shared" } }]
pkg_config_name = "mikmod"
"#;

    #[test]
    fn test_parse_recipe() {
        let recipe: Recipe = toml::from_str(SAMPLE_RECIPE).unwrap();

        assert_eq!(recipe.package.name, "libmikmod");
        assert_eq!(recipe.default_version(), "3.3.11.1");
        assert_eq!(recipe.package.license.as_deref(), Some("LGPL-2.1-or-later"));
        assert_eq!(recipe.options.len(), 2);
        assert_eq!(recipe.requires.len(), 1);
        assert_eq!(recipe.patches.len(), 2);
        assert!(matches!(recipe.patches[0], PatchEntry::Replace(_)));
        assert!(matches!(recipe.patches[1], PatchEntry::Diff(_)));
        assert!(recipe.publish.prune_empty_dirs);
        assert_eq!(recipe.publish.remove_dirs.len(), 2);
    }

    #[test]
    fn test_archive_url_substitution() {
        let recipe: Recipe = toml::from_str(SAMPLE_RECIPE).unwrap();

        let url = recipe.archive_url("3.3.11.1").unwrap();
        assert_eq!(url, "https://example.com/libmikmod-3.3.11.1.tar.gz");
        assert_eq!(
            recipe.archive_filename("3.3.11.1").unwrap(),
            "libmikmod-3.3.11.1.tar.gz"
        );
        assert!(recipe.source_for("3.3.11.1").unwrap().strip_root);
    }

    #[test]
    fn test_unknown_version() {
        let recipe: Recipe = toml::from_str(SAMPLE_RECIPE).unwrap();
        match recipe.archive_url("9.9") {
            Err(Error::UnknownVersion { package, version }) => {
                assert_eq!(package, "libmikmod");
                assert_eq!(version, "9.9");
            }
            other => panic!("expected UnknownVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_patches_filtered_by_version() {
        let recipe: Recipe = toml::from_str(SAMPLE_RECIPE).unwrap();
        assert_eq!(recipe.patches_for("3.3.11.1").len(), 1);
        assert_eq!(recipe.patches_for("3.3.11.0").len(), 2);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let bad = r#"
[package]
name = "x"
version = "1.0"
colour = "blue"
"#;
        assert!(toml::from_str::<Recipe>(bad).is_err());

        let bad_patch = r#"
[package]
name = "x"
version = "1.0"

[[patches]]
file = "a.c"
search = "x"
"#;
        assert!(toml::from_str::<Recipe>(bad_patch).is_err());
    }

    #[test]
    fn test_project_defaults() {
        let toml = r#"
[package]
name = "sdl_gfx"
version = "2.0.25"

[project]
sources = ["SDL_framerate.c"]
link = [{ package = "SDL", target = "SDL::SDL" }]
"#;
        let recipe: Recipe = toml::from_str(toml).unwrap();
        let project = recipe.project.unwrap();
        assert_eq!(project.cmake_minimum, "3.1");
        assert_eq!(project.languages, vec!["C"]);
        assert!(project.dependency_file);
        assert_eq!(project.generators, vec!["CMakeDeps", "CMakeToolchain"]);
    }
}
