// src/platform/mod.rs
//! Target platform descriptors
//!
//! A [`Platform`] is the (operating system, architecture, compiler, build
//! configuration) tuple a recipe is cooked for. It never changes during a
//! run; recipes consult it to prune options and to pick conditional entries.
//! Names follow the conventions of the external package manager the recipes
//! were written for (`Linux`, `Macos`, `x86_64`, `armv8`, `Release`, ...).

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};

/// Target operating system
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Os {
    Linux,
    Windows,
    Macos,
    #[strum(serialize = "iOS")]
    #[serde(rename = "iOS")]
    Ios,
    #[strum(serialize = "tvOS")]
    #[serde(rename = "tvOS")]
    TvOs,
    #[strum(serialize = "watchOS")]
    #[serde(rename = "watchOS")]
    WatchOs,
    FreeBSD,
    Android,
}

impl Os {
    /// Operating system of the running host
    pub fn host() -> Self {
        match std::env::consts::OS {
            "windows" => Os::Windows,
            "macos" => Os::Macos,
            "ios" => Os::Ios,
            "freebsd" => Os::FreeBSD,
            "android" => Os::Android,
            _ => Os::Linux,
        }
    }

    /// Darwin-based platforms
    pub fn is_apple(&self) -> bool {
        matches!(self, Os::Macos | Os::Ios | Os::TvOs | Os::WatchOs)
    }
}

/// Target CPU architecture
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X86,
    #[strum(to_string = "x86_64", serialize = "amd64")]
    #[serde(rename = "x86_64", alias = "amd64")]
    X86_64,
    Armv7,
    #[strum(to_string = "armv8", serialize = "aarch64", serialize = "arm64")]
    #[serde(alias = "aarch64", alias = "arm64")]
    Armv8,
    Wasm,
}

impl Arch {
    /// Architecture of the running host
    pub fn host() -> Self {
        match std::env::consts::ARCH {
            "x86" => Arch::X86,
            "aarch64" => Arch::Armv8,
            "arm" => Arch::Armv7,
            "wasm32" => Arch::Wasm,
            _ => Arch::X86_64,
        }
    }
}

/// Compiler identity
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Compiler {
    Gcc,
    Clang,
    AppleClang,
    Msvc,
}

impl Compiler {
    /// Conventional default compiler for an operating system
    pub fn default_for(os: Os) -> Self {
        match os {
            Os::Windows => Compiler::Msvc,
            os if os.is_apple() => Compiler::AppleClang,
            Os::FreeBSD | Os::Android => Compiler::Clang,
            _ => Compiler::Gcc,
        }
    }
}

/// Build configuration, named as CMake expects in `CMAKE_BUILD_TYPE`
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum BuildType {
    Debug,
    #[default]
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

/// The platform a recipe is being cooked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
    pub compiler: Compiler,
    pub build_type: BuildType,
}

impl Platform {
    /// Create a platform with the conventional compiler for `os`
    pub fn new(os: Os, arch: Arch) -> Self {
        Self {
            os,
            arch,
            compiler: Compiler::default_for(os),
            build_type: BuildType::default(),
        }
    }

    /// The platform of the running host
    pub fn host() -> Self {
        Self::new(Os::host(), Arch::host())
    }

    /// Set the compiler
    pub fn with_compiler(mut self, compiler: Compiler) -> Self {
        self.compiler = compiler;
        self
    }

    /// Set the build configuration
    pub fn with_build_type(mut self, build_type: BuildType) -> Self {
        self.build_type = build_type;
        self
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::host()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.os, self.arch, self.compiler, self.build_type
        )
    }
}

/// An operating system selector used in recipe conditions
///
/// Either a concrete [`Os`] or the `Apple` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsPattern {
    Exact(Os),
    Apple,
}

impl OsPattern {
    pub fn matches(&self, os: Os) -> bool {
        match self {
            OsPattern::Exact(expected) => *expected == os,
            OsPattern::Apple => os.is_apple(),
        }
    }
}

impl FromStr for OsPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("apple") {
            return Ok(OsPattern::Apple);
        }
        Os::from_str(s)
            .map(OsPattern::Exact)
            .map_err(|_| Error::ParseError(format!("Unknown operating system: {}", s)))
    }
}

impl fmt::Display for OsPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsPattern::Exact(os) => write!(f, "{}", os),
            OsPattern::Apple => write!(f, "Apple"),
        }
    }
}

impl Serialize for OsPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OsPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a platform component, naming the component in the error
pub fn parse_component<T: FromStr>(kind: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::ParseError(format!("Unknown {}: {}", kind, value)))
}
