// src/recipe/configure.rs

//! Resolving a recipe into a concrete build configuration
//!
//! [`Recipe::configure`] evaluates every conditional part of a recipe
//! against a [`Profile`] and produces a [`Configuration`]: the option set,
//! the requirement list, the definitions and cache variables, and the
//! consumption metadata. Everything downstream (descriptor generation, the
//! CMake driver, publishing) works from the configuration alone.

use super::condition::{holds, select_all, EvalContext};
use super::format::{DefinitionSpec, Recipe, Requirement};
use super::options::{resolve_options, OptionRef, OptionValue, ResolvedOptions};
use crate::error::Result;
use crate::hash;
use crate::platform::Platform;
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Caller-side inputs to configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub platform: Platform,
    /// Option overrides as raw strings (`-o name=value`)
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    /// Dependencies that are built as shared libraries
    #[serde(default)]
    pub shared_dependencies: BTreeSet<String>,
}

impl Profile {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            ..Self::default()
        }
    }

    pub fn with_option(mut self, name: &str, value: &str) -> Self {
        self.options.insert(name.to_string(), value.to_string());
        self
    }
}

/// Ordered name → value map; later recipe entries replace earlier ones
pub type DefinitionSet = BTreeMap<String, OptionValue>;

/// Resolved consumption metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifacts {
    pub libs: Vec<String>,
    pub include_dirs: Vec<String>,
    pub lib_dirs: Vec<String>,
    pub defines: Vec<String>,
    pub system_libs: Vec<String>,
    pub frameworks: Vec<String>,
    pub pkg_config_name: String,
    pub cmake_file_name: String,
    pub cmake_target_name: String,
}

/// A recipe resolved for one platform, version and option set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub name: String,
    pub version: String,
    pub platform: Platform,
    pub options: ResolvedOptions,
    pub requirements: Vec<Requirement>,
    pub definitions: DefinitionSet,
    pub variables: DefinitionSet,
    pub artifacts: Artifacts,
    pub shared_dependencies: BTreeSet<String>,
}

#[derive(Serialize)]
struct PackageIdInput<'a> {
    name: &'a str,
    version: &'a str,
    platform: &'a Platform,
    options: &'a ResolvedOptions,
    requires: Vec<String>,
}

impl Configuration {
    /// Deterministic identifier of this configuration
    ///
    /// SHA-256 over a canonical JSON rendering of name, version, platform,
    /// options and requirements. Maps are ordered so the encoding is stable.
    pub fn package_id(&self) -> String {
        let input = PackageIdInput {
            name: &self.name,
            version: &self.version,
            platform: &self.platform,
            options: &self.options,
            requires: self.requirements.iter().map(ToString::to_string).collect(),
        };
        // Serializing plain structs and ordered maps cannot fail
        let encoded = serde_json::to_vec(&input).unwrap_or_default();
        hash::sha256(&encoded)
    }

    /// Short form of the package id used in directory names
    pub fn short_id(&self) -> String {
        self.package_id()[..12].to_string()
    }

    /// Name of the published package directory
    pub fn package_dir_name(&self) -> String {
        format!("{}-{}-{}", self.name, self.version, self.short_id())
    }

    /// Whether the library itself is built shared
    pub fn is_shared(&self) -> bool {
        self.options.is_enabled("shared")
    }

    pub fn requirement(&self, name: &str) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.name == name)
    }

    /// Evaluate recipe conditions against this configuration
    pub fn evaluate<R>(&self, f: impl FnOnce(&EvalContext<'_>) -> R) -> Result<R> {
        let version = Version::parse(&self.version)?;
        let ctx = EvalContext {
            platform: &self.platform,
            version: &version,
            options: &self.options,
            shared_dependencies: &self.shared_dependencies,
        };
        Ok(f(&ctx))
    }
}

impl Recipe {
    /// Resolve this recipe for a profile
    ///
    /// `version` defaults to the recipe's default version and must have a
    /// declared source.
    pub fn configure(&self, version: Option<&str>, profile: &Profile) -> Result<Configuration> {
        let version_str = version.unwrap_or_else(|| self.default_version());
        self.source_for(version_str)?;
        let version = Version::parse(version_str)?;
        let platform = profile.platform;

        let options = resolve_options(&self.options, &platform, &version, &profile.options)?;

        let ctx = EvalContext {
            platform: &platform,
            version: &version,
            options: &options,
            shared_dependencies: &profile.shared_dependencies,
        };

        let mut requirements: Vec<Requirement> = Vec::new();
        for spec in &self.requires {
            if !holds(spec.when.as_ref(), &ctx) {
                continue;
            }
            if requirements.iter().any(|r| r.name == spec.name) {
                warn!("Duplicate requirement '{}' ignored", spec.name);
                continue;
            }
            requirements.push(Requirement {
                name: spec.name.clone(),
                version: spec.version.clone(),
            });
        }

        let definitions = evaluate_definitions(&self.definitions, &ctx);
        let variables = evaluate_definitions(&self.variables, &ctx);
        let artifacts = self.resolve_artifacts(&ctx);

        debug!(
            "Configured {}/{} for {}: {} options, {} requirements",
            self.package.name,
            version_str,
            platform,
            options.len(),
            requirements.len()
        );

        Ok(Configuration {
            name: self.package.name.clone(),
            version: version_str.to_string(),
            platform,
            options,
            requirements,
            definitions,
            variables,
            artifacts,
            shared_dependencies: profile.shared_dependencies.clone(),
        })
    }

    fn resolve_artifacts(&self, ctx: &EvalContext<'_>) -> Artifacts {
        let a = &self.artifacts;
        let name = &self.package.name;

        let mut include_dirs = select_all(&a.include_dirs, ctx);
        if include_dirs.is_empty() {
            include_dirs.push("include".to_string());
        }

        Artifacts {
            libs: select_all(&a.libs, ctx),
            include_dirs,
            lib_dirs: vec!["lib".to_string()],
            defines: select_all(&a.defines, ctx),
            system_libs: select_all(&a.system_libs, ctx),
            frameworks: select_all(&a.frameworks, ctx),
            pkg_config_name: a
                .pkg_config_name
                .as_ref()
                .and_then(|c| c.select(ctx))
                .unwrap_or_else(|| name.clone()),
            cmake_file_name: a
                .cmake_file_name
                .as_ref()
                .and_then(|c| c.select(ctx))
                .unwrap_or_else(|| name.clone()),
            cmake_target_name: a
                .cmake_target_name
                .as_ref()
                .and_then(|c| c.select(ctx))
                .unwrap_or_else(|| format!("{}::{}", name, name)),
        }
    }
}

/// Evaluate one definition entry; `None` leaves earlier entries untouched
fn evaluate_definition(spec: &DefinitionSpec, ctx: &EvalContext<'_>) -> Option<OptionValue> {
    if !holds(spec.when.as_ref(), ctx) {
        return spec.otherwise.clone();
    }

    if let Some(value) = &spec.value {
        return Some(value.clone());
    }

    let reference: OptionRef = spec.option.as_deref()?.parse().ok()?;
    let enabled = reference.holds(ctx.options)
        && spec
            .dependency_shared
            .as_ref()
            .is_none_or(|dep| ctx.shared_dependencies.contains(dep));

    if enabled {
        Some(OptionValue::Bool(true))
    } else {
        spec.otherwise.clone()
    }
}

fn evaluate_definitions(specs: &[DefinitionSpec], ctx: &EvalContext<'_>) -> DefinitionSet {
    let mut set = DefinitionSet::new();
    for spec in specs {
        if let Some(value) = evaluate_definition(spec, ctx) {
            set.insert(spec.name.clone(), value);
        }
    }
    set
}
