//! Version constraints for catalog lookups.
//!
//! Versions are single floating-point numbers (`1.0`, `2.5`). A constraint is
//! empty (any version), a bare number (exact), or a number prefixed with
//! `>=` / `<=`.

use std::fmt;
use std::str::FromStr;

use crate::error::SyncError;

/// Comparison applied between a candidate version and the constraint value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// No prefix: candidate must equal the value.
    Exact,
    /// `>=`
    AtLeast,
    /// `<=`
    AtMost,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Exact => "",
            Operator::AtLeast => ">=",
            Operator::AtMost => "<=",
        }
    }

    fn matches(&self, candidate: f64, value: f64) -> bool {
        match self {
            Operator::Exact => candidate == value,
            Operator::AtLeast => candidate >= value,
            Operator::AtMost => candidate <= value,
        }
    }
}

/// A parsed version constraint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum VersionConstraint {
    /// Empty constraint, any version satisfies it.
    #[default]
    Any,
    Compare { op: Operator, value: f64 },
}

impl VersionConstraint {
    /// Parse a raw constraint string.
    pub fn parse(raw: &str) -> Result<Self, SyncError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(VersionConstraint::Any);
        }

        let (op, number) = if let Some(rest) = raw.strip_prefix(">=") {
            (Operator::AtLeast, rest)
        } else if let Some(rest) = raw.strip_prefix("<=") {
            (Operator::AtMost, rest)
        } else {
            (Operator::Exact, raw)
        };

        let value = parse_number(number.trim())
            .ok_or_else(|| SyncError::InvalidConstraint(raw.to_string()))?;
        Ok(VersionConstraint::Compare { op, value })
    }

    /// Check whether `candidate` satisfies this constraint.
    ///
    /// `Any` accepts every candidate without parsing it. Otherwise the
    /// candidate must be numeric, or `InvalidVersion` is returned.
    pub fn matches(&self, candidate: &str) -> Result<bool, SyncError> {
        match self {
            VersionConstraint::Any => Ok(true),
            VersionConstraint::Compare { op, value } => {
                let candidate_value = parse_version(candidate)?;
                Ok(op.matches(candidate_value, *value))
            }
        }
    }
}

impl FromStr for VersionConstraint {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionConstraint::Any => write!(f, "*"),
            VersionConstraint::Compare { op, value } => write!(f, "{}{}", op.as_str(), value),
        }
    }
}

/// Parse a package version string as a number.
pub fn parse_version(version: &str) -> Result<f64, SyncError> {
    parse_number(version.trim()).ok_or_else(|| SyncError::InvalidVersion(version.to_string()))
}

/// Check `candidate` against a raw constraint string.
pub fn satisfies(candidate: &str, constraint: &str) -> Result<bool, SyncError> {
    VersionConstraint::parse(constraint)?.matches(candidate)
}

fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}
