//! Placement constraints.
//!
//! A constraint is a `(field, operator, optional parameter)` triplet,
//! written as a single-space-delimited string (`"hostname UNIQUE"`,
//! `"rack_id CLUSTER rack-1"`). Constraints come from static
//! configuration and from per-deployment overrides, and are unioned
//! as a set, so identical triplets collapse regardless of origin.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static PARSE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<field>[^ ]+) (?<op>[^ ]+)( (?<param>.+))?$").unwrap()
});

/// The string did not match `<field> <operator>( <parameter>)?`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not parse [{raw}] as a placement constraint (field operator param?)")]
pub struct MalformedConstraint {
    pub raw: String,
}

/// A placement constraint with a field, operator and optional parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    field: String,
    operator: String,
    parameter: Option<String>,
}

impl Constraint {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn parameter(&self) -> Option<&str> {
        self.parameter.as_deref()
    }

    /// Serialize back to the list form the remote APIs expect:
    /// `[field, operator]` or `[field, operator, parameter]`.
    pub fn to_string_list(&self) -> Vec<String> {
        match &self.parameter {
            Some(param) => vec![self.field.clone(), self.operator.clone(), param.clone()],
            None => vec![self.field.clone(), self.operator.clone()],
        }
    }
}

impl FromStr for Constraint {
    type Err = MalformedConstraint;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let captures = PARSE_REGEX.captures(raw).ok_or_else(|| MalformedConstraint {
            raw: raw.to_string(),
        })?;
        Ok(Self {
            field: captures["field"].to_string(),
            operator: captures["op"].to_string(),
            parameter: captures.name("param").map(|m| m.as_str().to_string()),
        })
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parameter {
            Some(param) => write!(f, "{} {} {}", self.field, self.operator, param),
            None => write!(f, "{} {}", self.field, self.operator),
        }
    }
}

/// Parse a comma-delimited list of raw constraint strings into a set.
///
/// Empty segments are skipped, so `""` and `"a UNIQUE,,b UNIQUE"` are
/// both accepted. Duplicate triplets collapse.
pub fn parse_constraint_list(raw: &str) -> Result<HashSet<Constraint>, MalformedConstraint> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Constraint::from_str)
        .collect()
}
