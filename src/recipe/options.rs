// src/recipe/options.rs

//! Build options and option resolution
//!
//! Resolution runs in three passes, always in this order:
//!
//! 1. prune options whose `when` does not hold for the target platform
//! 2. apply caller overrides (unknown or pruned names are ignored with a
//!    warning, invalid values are rejected)
//! 3. drop options made meaningless by another option (`dropped_by`)
//!
//! The result is an ordered map, so the same inputs always resolve to the
//! same option set.

use super::condition::Condition;
use crate::error::{Error, Result};
use crate::platform::Platform;
use crate::version::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Value of a build option
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl OptionValue {
    /// Whether the value counts as "on"
    pub fn is_truthy(&self) -> bool {
        match self {
            OptionValue::Bool(b) => *b,
            OptionValue::Int(i) => *i != 0,
            OptionValue::Str(s) => !matches!(
                s.to_ascii_lowercase().as_str(),
                "" | "false" | "0" | "off" | "no" | "none"
            ),
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, OptionValue::Bool(_))
    }

    /// Rendering for a C preprocessor definition (`1`/`0` for booleans)
    pub fn as_define(&self) -> String {
        match self {
            OptionValue::Bool(true) => "1".to_string(),
            OptionValue::Bool(false) => "0".to_string(),
            OptionValue::Int(i) => i.to_string(),
            OptionValue::Str(s) => s.clone(),
        }
    }

    /// Rendering for a CMake cache variable (`ON`/`OFF` for booleans)
    pub fn as_cache(&self) -> String {
        match self {
            OptionValue::Bool(true) => "ON".to_string(),
            OptionValue::Bool(false) => "OFF".to_string(),
            OptionValue::Int(i) => i.to_string(),
            OptionValue::Str(s) => s.clone(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "boolean",
            OptionValue::Int(_) => "integer",
            OptionValue::Str(_) => "string",
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Int(i) => write!(f, "{}", i),
            OptionValue::Str(s) => write!(f, "{}", s),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

/// Declaration of one option in a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionSpec {
    /// Default value; its type fixes the option's type
    pub default: OptionValue,

    /// Permitted values (booleans always allow both)
    #[serde(default)]
    pub values: Vec<OptionValue>,

    /// Option only exists where this holds
    #[serde(default)]
    pub when: Option<Condition>,

    /// Removed when the named option is on (e.g. `fPIC` when `shared`)
    #[serde(default)]
    pub dropped_by: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl OptionSpec {
    /// Allowed values as a display string
    pub fn allowed(&self) -> String {
        match &self.default {
            OptionValue::Bool(_) => "true, false".to_string(),
            _ if self.values.is_empty() => format!("any {}", self.default.kind()),
            _ => self
                .values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Parse an override string against this option's type and values
    pub fn parse_value(&self, name: &str, raw: &str) -> Result<OptionValue> {
        let invalid = || Error::InvalidOption {
            option: name.to_string(),
            value: raw.to_string(),
            allowed: self.allowed(),
        };

        let value = match &self.default {
            OptionValue::Bool(_) => OptionValue::Bool(parse_bool(raw).ok_or_else(invalid)?),
            OptionValue::Int(_) => OptionValue::Int(raw.trim().parse().map_err(|_| invalid())?),
            OptionValue::Str(_) => OptionValue::Str(raw.to_string()),
        };

        if !self.values.is_empty() && !matches!(value, OptionValue::Bool(_)) {
            if !self.values.contains(&value) {
                return Err(invalid());
            }
        }

        Ok(value)
    }
}

/// Reference to an option inside a condition or definition
///
/// `name` holds when the option is on, `!name` when it is off or absent,
/// `name=value` when it has exactly that value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionRef {
    Enabled(String),
    Disabled(String),
    Equals(String, String),
}

impl OptionRef {
    pub fn name(&self) -> &str {
        match self {
            OptionRef::Enabled(n) | OptionRef::Disabled(n) | OptionRef::Equals(n, _) => n,
        }
    }

    pub fn holds(&self, options: &ResolvedOptions) -> bool {
        match self {
            OptionRef::Enabled(n) => options.is_enabled(n),
            OptionRef::Disabled(n) => !options.is_enabled(n),
            OptionRef::Equals(n, v) => options.get(n).is_some_and(|o| o.to_string() == *v),
        }
    }
}

impl FromStr for OptionRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let parsed = if let Some(name) = s.strip_prefix('!') {
            OptionRef::Disabled(name.trim().to_string())
        } else if let Some((name, value)) = s.split_once('=') {
            OptionRef::Equals(name.trim().to_string(), value.trim().to_string())
        } else {
            OptionRef::Enabled(s.to_string())
        };

        if parsed.name().is_empty() {
            return Err(Error::ParseError(format!("Invalid option reference: '{}'", s)));
        }
        Ok(parsed)
    }
}

impl fmt::Display for OptionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionRef::Enabled(n) => write!(f, "{}", n),
            OptionRef::Disabled(n) => write!(f, "!{}", n),
            OptionRef::Equals(n, v) => write!(f, "{}={}", n, v),
        }
    }
}

impl Serialize for OptionRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OptionRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The final option set for one build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedOptions(BTreeMap<String, OptionValue>);

impl ResolvedOptions {
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Present and truthy
    pub fn is_enabled(&self, name: &str) -> bool {
        self.0.get(name).is_some_and(OptionValue::is_truthy)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: OptionValue) {
        self.0.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<OptionValue> {
        self.0.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resolve declared options for a platform, version and overrides
pub fn resolve_options(
    specs: &BTreeMap<String, OptionSpec>,
    platform: &Platform,
    version: &Version,
    overrides: &BTreeMap<String, String>,
) -> Result<ResolvedOptions> {
    let mut resolved = ResolvedOptions::default();

    for (name, spec) in specs {
        let applicable = spec
            .when
            .as_ref()
            .is_none_or(|c| c.platform_matches(platform, version));
        if applicable {
            resolved.insert(name.clone(), spec.default.clone());
        } else {
            debug!("Option '{}' does not apply to {}", name, platform);
        }
    }

    for (name, raw) in overrides {
        match specs.get(name) {
            Some(spec) if resolved.contains(name) => {
                let value = spec.parse_value(name, raw)?;
                debug!("Option override: {}={}", name, value);
                resolved.insert(name.clone(), value);
            }
            Some(_) => warn!(
                "Ignoring option '{}': not applicable to {}",
                name, platform
            ),
            None => warn!("Ignoring unknown option '{}'", name),
        }
    }

    // Decide all removals first so the outcome does not depend on map order
    let dropped: Vec<String> = specs
        .iter()
        .filter(|(name, _)| resolved.contains(name))
        .filter_map(|(name, spec)| {
            spec.dropped_by
                .as_deref()
                .filter(|by| resolved.is_enabled(by))
                .map(|_| name.clone())
        })
        .collect();
    for name in dropped {
        debug!("Option '{}' dropped", name);
        resolved.remove(&name);
    }

    Ok(resolved)
}
