// src/version/mod.rs

//! Version handling and constraint satisfaction for recipe requirements
//!
//! Upstream multimedia libraries do not follow semver: versions such as
//! `3.3.11.1` (four components) or `0.15.1b` (alphabetic suffix) are common.
//! Versions are therefore compared segment by segment: the numeric prefix of
//! each dot-separated segment first, then any trailing suffix. Missing
//! trailing segments count as zero, so `1.2` equals `1.2.0`.
//!
//! Constraints accept an exact version (`1.2.15`), operator comparators
//! (`>=2.0.0`, `<2.0.0`, `!=1.0`), conjunctions separated by commas or
//! whitespace, and the bracketed range form `[>=1.2.0]`.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// One dot-separated version segment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Segment {
    number: u64,
    suffix: String,
}

impl Segment {
    fn parse(s: &str, whole: &str) -> Result<Self> {
        let digits_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, suffix) = s.split_at(digits_end);

        if digits.is_empty() && suffix.is_empty() {
            return Err(Error::ParseError(format!("Empty segment in version '{}'", whole)));
        }

        let number = if digits.is_empty() {
            0
        } else {
            digits.parse::<u64>().map_err(|e| {
                Error::ParseError(format!("Invalid number in version '{}': {}", whole, e))
            })?
        };

        Ok(Self {
            number,
            suffix: suffix.to_string(),
        })
    }

    fn zero() -> Self {
        Self {
            number: 0,
            suffix: String::new(),
        }
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number
            .cmp(&other.number)
            .then_with(|| self.suffix.cmp(&other.suffix))
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A parsed upstream version
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    segments: Vec<Segment>,
}

impl Version {
    /// Parse a version string such as `1.2.15` or `0.15.1b`
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::ParseError("Empty version string".to_string()));
        }

        let segments = s
            .split('.')
            .map(|seg| Segment::parse(seg, s))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            raw: s.to_string(),
            segments,
        })
    }

    /// The version exactly as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The leading numeric component (`2` for `2.0.4`)
    pub fn major(&self) -> u64 {
        self.segments.first().map(|s| s.number).unwrap_or(0)
    }

    /// Compare two versions
    pub fn compare(&self, other: &Version) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        let zero = Segment::zero();
        for i in 0..len {
            let a = self.segments.get(i).unwrap_or(&zero);
            let b = other.segments.get(i).unwrap_or(&zero);
            match a.cmp(b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Comparison operator in a version constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl Op {
    fn as_str(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::NotEq => "!=",
            Op::Lt => "<",
            Op::LtEq => "<=",
            Op::Gt => ">",
            Op::GtEq => ">=",
        }
    }

    fn holds(&self, ord: Ordering) -> bool {
        match self {
            Op::Eq => ord == Ordering::Equal,
            Op::NotEq => ord != Ordering::Equal,
            Op::Lt => ord == Ordering::Less,
            Op::LtEq => ord != Ordering::Greater,
            Op::Gt => ord == Ordering::Greater,
            Op::GtEq => ord != Ordering::Less,
        }
    }
}

/// A single `op version` comparator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparator {
    pub op: Op,
    pub version: Version,
}

impl Comparator {
    fn parse(s: &str) -> Result<Self> {
        // Longer operators first
        let (op, rest) = if let Some(rest) = s.strip_prefix(">=") {
            (Op::GtEq, rest)
        } else if let Some(rest) = s.strip_prefix("<=") {
            (Op::LtEq, rest)
        } else if let Some(rest) = s.strip_prefix("!=") {
            (Op::NotEq, rest)
        } else if let Some(rest) = s.strip_prefix("==") {
            (Op::Eq, rest)
        } else if let Some(rest) = s.strip_prefix('>') {
            (Op::Gt, rest)
        } else if let Some(rest) = s.strip_prefix('<') {
            (Op::Lt, rest)
        } else if let Some(rest) = s.strip_prefix('=') {
            (Op::Eq, rest)
        } else {
            (Op::Eq, s)
        };

        let rest = rest.trim();
        if rest.is_empty() {
            return Err(Error::ParseError(format!(
                "Missing version after operator in '{}'",
                s
            )));
        }

        Ok(Self {
            op,
            version: Version::parse(rest)?,
        })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.op.holds(version.compare(&self.version))
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.as_str(), self.version)
    }
}

/// A version constraint: every comparator must hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionReq {
    raw: String,
    comparators: Vec<Comparator>,
}

impl VersionReq {
    /// Parse a constraint such as `1.2.15`, `>=2.0.0`, `[>=1.2.0]`, `>=1.0, <2.0`
    pub fn parse(s: &str) -> Result<Self> {
        let raw = s.trim();
        let inner = raw
            .strip_prefix('[')
            .and_then(|r| r.strip_suffix(']'))
            .unwrap_or(raw)
            .trim();

        if inner.is_empty() {
            return Err(Error::ParseError("Empty version constraint".to_string()));
        }

        // Glue "op version" pairs written with a space (">= 1.2") back together
        let mut tokens: Vec<String> = Vec::new();
        for token in inner.split(|c: char| c == ',' || c.is_whitespace()) {
            if token.is_empty() {
                continue;
            }
            match tokens.last_mut() {
                Some(last) if last.chars().all(|c| "<>=!".contains(c)) => last.push_str(token),
                _ => tokens.push(token.to_string()),
            }
        }

        let comparators = tokens
            .iter()
            .map(|t| Comparator::parse(t))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            raw: raw.to_string(),
            comparators,
        })
    }

    /// Check whether a version satisfies every comparator
    pub fn matches(&self, version: &Version) -> bool {
        self.comparators.iter().all(|c| c.matches(version))
    }

    /// Check a version given as a string; unparsable versions never match
    pub fn matches_str(&self, version: &str) -> bool {
        Version::parse(version).is_ok_and(|v| self.matches(&v))
    }

    /// Whether this constraint pins one exact version
    pub fn is_exact(&self) -> bool {
        self.comparators.len() == 1 && self.comparators[0].op == Op::Eq
    }

    /// The constraint exactly as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for VersionReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for VersionReq {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for VersionReq {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for VersionReq {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
