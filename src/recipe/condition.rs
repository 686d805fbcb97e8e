// src/recipe/condition.rs

//! `when` conditions and conditional recipe entries
//!
//! A condition is a conjunction of optional criteria; an empty condition
//! always holds. Options are pruned before any option values exist, so
//! [`Condition::platform_matches`] ignores the `option` criterion while
//! [`Condition::eval`] checks everything.

use super::options::{OptionRef, ResolvedOptions};
use crate::platform::{Arch, BuildType, Compiler, OsPattern, Platform};
use crate::version::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Everything a condition can look at
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub platform: &'a Platform,
    pub version: &'a Version,
    pub options: &'a ResolvedOptions,
    /// Dependencies the profile builds as shared libraries
    pub shared_dependencies: &'a BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Condition {
    /// Holds when the target OS matches any entry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub os: Vec<OsPattern>,

    /// Holds when the target OS matches no entry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_os: Vec<OsPattern>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arch: Vec<Arch>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compiler: Vec<Compiler>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_type: Vec<BuildType>,

    /// Option reference: `name`, `!name` or `name=value`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<OptionRef>,

    /// Constraint on the version being cooked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionReq>,
}

impl Condition {
    /// Check the platform and version criteria only
    pub fn platform_matches(&self, platform: &Platform, version: &Version) -> bool {
        if !self.os.is_empty() && !self.os.iter().any(|p| p.matches(platform.os)) {
            return false;
        }
        if self.not_os.iter().any(|p| p.matches(platform.os)) {
            return false;
        }
        if !self.arch.is_empty() && !self.arch.contains(&platform.arch) {
            return false;
        }
        if !self.compiler.is_empty() && !self.compiler.contains(&platform.compiler) {
            return false;
        }
        if !self.build_type.is_empty() && !self.build_type.contains(&platform.build_type) {
            return false;
        }
        if let Some(req) = &self.version {
            if !req.matches(version) {
                return false;
            }
        }
        true
    }

    /// Check every criterion
    pub fn eval(&self, ctx: &EvalContext<'_>) -> bool {
        self.platform_matches(ctx.platform, ctx.version)
            && self.option.as_ref().is_none_or(|r| r.holds(ctx.options))
    }

    /// Whether this condition names an option
    pub fn references_option(&self) -> Option<&OptionRef> {
        self.option.as_ref()
    }
}

/// Evaluate an optional condition; absence means "always"
pub fn holds(when: Option<&Condition>, ctx: &EvalContext<'_>) -> bool {
    when.is_none_or(|c| c.eval(ctx))
}

/// A list entry that is either a plain value or guarded by a condition
///
/// ```toml
/// system_libs = ["m", { value = "dsound", when = { os = ["Windows"] } }]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Conditional<T> {
    Plain(T),
    Guarded { value: T, when: Condition },
}

impl<T> Conditional<T> {
    pub fn value(&self) -> &T {
        match self {
            Conditional::Plain(v) => v,
            Conditional::Guarded { value, .. } => value,
        }
    }

    pub fn condition(&self) -> Option<&Condition> {
        match self {
            Conditional::Plain(_) => None,
            Conditional::Guarded { when, .. } => Some(when),
        }
    }

    pub fn applies(&self, ctx: &EvalContext<'_>) -> bool {
        holds(self.condition(), ctx)
    }
}

/// Values of every applicable entry, in order
pub fn select_all<T: Clone>(items: &[Conditional<T>], ctx: &EvalContext<'_>) -> Vec<T> {
    items
        .iter()
        .filter(|i| i.applies(ctx))
        .map(|i| i.value().clone())
        .collect()
}

/// A single value or a list of candidates where the first applicable wins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Choice<T> {
    One(Conditional<T>),
    Many(Vec<Conditional<T>>),
}

impl<T: Clone> Choice<T> {
    pub fn select(&self, ctx: &EvalContext<'_>) -> Option<T> {
        match self {
            Choice::One(c) => c.applies(ctx).then(|| c.value().clone()),
            Choice::Many(list) => list
                .iter()
                .find(|c| c.applies(ctx))
                .map(|c| c.value().clone()),
        }
    }

    pub fn candidates(&self) -> Vec<&Conditional<T>> {
        match self {
            Choice::One(c) => vec![c],
            Choice::Many(list) => list.iter().collect(),
        }
    }
}
