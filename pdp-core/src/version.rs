//! Policy versions and id-references
//!
//! A Policy or PolicySet is identified by `(identifier, version)`. References
//! to them carry an identifier and optional version patterns:
//!
//! - `Version`: dotted non-negative integers, e.g. `1.0.2`
//! - `VersionMatch`: pattern components are a number, `*` (any single
//!   component), or a trailing `+` (any remaining components, including none)
//! - `IdReferenceMatch`: identifier + optional exact/earliest/latest patterns

use crate::identifier::Identifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors parsing versions or version patterns
#[derive(Debug, Error, PartialEq, Clone)]
pub enum VersionError {
    #[error("Empty version string")]
    Empty,

    #[error("Invalid version component '{component}' in '{input}'")]
    InvalidComponent { input: String, component: String },

    #[error("'+' may only appear as the last component of '{0}'")]
    MisplacedPlus(String),
}

// ============================================================================
// VERSION
// ============================================================================

/// Dotted policy version, ordered component-wise
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Version {
    components: Vec<u32>,
}

impl Version {
    pub fn components(&self) -> &[u32] {
        &self.components
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.is_empty() {
            return Err(VersionError::Empty);
        }
        let components = input
            .split('.')
            .map(|component| {
                component
                    .parse::<u32>()
                    .map_err(|_| VersionError::InvalidComponent {
                        input: input.to_string(),
                        component: component.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { components })
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(|c| c.to_string()).collect();
        f.write_str(&parts.join("."))
    }
}

// ============================================================================
// VERSION PATTERNS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternComponent {
    Number(u32),
    Any,
    Remaining,
}

/// Version pattern used by id-references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMatch {
    pattern: String,
    components: Vec<PatternComponent>,
}

impl VersionMatch {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// True if `version` matches the pattern exactly
    pub fn matches(&self, version: &Version) -> bool {
        let actual = version.components();
        for (index, component) in self.components.iter().enumerate() {
            match component {
                PatternComponent::Remaining => return true,
                PatternComponent::Any => {
                    if actual.get(index).is_none() {
                        return false;
                    }
                }
                PatternComponent::Number(expected) => {
                    if actual.get(index) != Some(expected) {
                        return false;
                    }
                }
            }
        }
        actual.len() == self.components.len()
    }

    /// True if `version` is at or above the pattern (wildcards compare equal)
    pub fn is_at_least(&self, version: &Version) -> bool {
        let actual = version.components();
        for (index, component) in self.components.iter().enumerate() {
            match (component, actual.get(index)) {
                (PatternComponent::Remaining, _) => return true,
                (_, None) => return false,
                (PatternComponent::Any, Some(_)) => {}
                (PatternComponent::Number(expected), Some(found)) => {
                    if found > expected {
                        return true;
                    }
                    if found < expected {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// True if `version` is at or below the pattern (wildcards compare equal)
    pub fn is_at_most(&self, version: &Version) -> bool {
        let actual = version.components();
        for (index, component) in self.components.iter().enumerate() {
            match (component, actual.get(index)) {
                (PatternComponent::Remaining, _) => return true,
                (_, None) => return true,
                (PatternComponent::Any, Some(_)) => {}
                (PatternComponent::Number(expected), Some(found)) => {
                    if found < expected {
                        return true;
                    }
                    if found > expected {
                        return false;
                    }
                }
            }
        }
        actual.len() <= self.components.len()
    }
}

impl FromStr for VersionMatch {
    type Err = VersionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.is_empty() {
            return Err(VersionError::Empty);
        }
        let parts: Vec<&str> = input.split('.').collect();
        let last = parts.len() - 1;
        let mut components = Vec::with_capacity(parts.len());
        for (index, part) in parts.iter().enumerate() {
            let component = match *part {
                "*" => PatternComponent::Any,
                "+" if index == last => PatternComponent::Remaining,
                "+" => return Err(VersionError::MisplacedPlus(input.to_string())),
                number => PatternComponent::Number(number.parse().map_err(|_| {
                    VersionError::InvalidComponent {
                        input: input.to_string(),
                        component: number.to_string(),
                    }
                })?),
            };
            components.push(component);
        }
        Ok(Self {
            pattern: input.to_string(),
            components,
        })
    }
}

impl fmt::Display for VersionMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

// ============================================================================
// ID REFERENCES
// ============================================================================

/// Identifier + version of a concrete Policy or PolicySet
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdReference {
    id: Identifier,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<Version>,
}

impl IdReference {
    pub fn new(id: Identifier, version: Option<Version>) -> Self {
        Self { id, version }
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }
}

impl fmt::Display for IdReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}:{}", self.id, version),
            None => write!(f, "{}", self.id),
        }
    }
}

/// Selector used by PolicyIdReference / PolicySetIdReference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdReferenceMatch {
    id: Identifier,
    version: Option<VersionMatch>,
    earliest_version: Option<VersionMatch>,
    latest_version: Option<VersionMatch>,
}

impl IdReferenceMatch {
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self {
            id: id.into(),
            version: None,
            earliest_version: None,
            latest_version: None,
        }
    }

    pub fn with_version(mut self, pattern: VersionMatch) -> Self {
        self.version = Some(pattern);
        self
    }

    pub fn with_earliest_version(mut self, pattern: VersionMatch) -> Self {
        self.earliest_version = Some(pattern);
        self
    }

    pub fn with_latest_version(mut self, pattern: VersionMatch) -> Self {
        self.latest_version = Some(pattern);
        self
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    /// True if `reference` satisfies the identifier and every version bound
    pub fn matches(&self, reference: &IdReference) -> bool {
        if reference.id() != &self.id {
            return false;
        }
        let version = reference.version();
        let satisfies = |pattern: &Option<VersionMatch>, check: fn(&VersionMatch, &Version) -> bool| {
            match pattern {
                None => true,
                Some(pattern) => version.map(|v| check(pattern, v)).unwrap_or(false),
            }
        };
        satisfies(&self.version, VersionMatch::matches)
            && satisfies(&self.earliest_version, VersionMatch::is_at_least)
            && satisfies(&self.latest_version, VersionMatch::is_at_most)
    }
}

impl fmt::Display for IdReferenceMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        if let Some(version) = &self.version {
            write!(f, " version={}", version)?;
        }
        if let Some(earliest) = &self.earliest_version {
            write!(f, " earliest={}", earliest)?;
        }
        if let Some(latest) = &self.latest_version {
            write!(f, " latest={}", latest)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    fn m(s: &str) -> VersionMatch {
        s.parse().unwrap()
    }

    #[test]
    fn test_version_parse_and_display() {
        assert_eq!(v("1.0.2").components(), &[1, 0, 2]);
        assert_eq!(v("1.0.2").to_string(), "1.0.2");
        assert_eq!(
            "1.a".parse::<Version>(),
            Err(VersionError::InvalidComponent {
                input: "1.a".to_string(),
                component: "a".to_string()
            })
        );
        assert_eq!("".parse::<Version>(), Err(VersionError::Empty));
    }

    #[test]
    fn test_version_ordering() {
        assert!(v("1.0") < v("1.0.1"));
        assert!(v("1.2") < v("1.10.0"));
        assert!(v("2") > v("1.9.9"));
    }

    #[test]
    fn test_version_match_wildcards() {
        assert!(m("1.*").matches(&v("1.7")));
        assert!(!m("1.*").matches(&v("1.7.1")));
        assert!(m("1.+").matches(&v("1")));
        assert!(m("1.+").matches(&v("1.7.1")));
        assert!(!m("1.+").matches(&v("2.0")));
        assert_eq!(
            "+.1".parse::<VersionMatch>(),
            Err(VersionError::MisplacedPlus("+.1".to_string()))
        );
    }

    #[test]
    fn test_version_bounds() {
        assert!(m("1.2").is_at_least(&v("1.2")));
        assert!(m("1.2").is_at_least(&v("1.3")));
        assert!(!m("1.2").is_at_least(&v("1.1.9")));
        assert!(m("1.2").is_at_most(&v("1.1.9")));
        assert!(!m("1.2").is_at_most(&v("1.2.1")));
        assert!(m("1.*").is_at_most(&v("1.99")));
    }

    #[test]
    fn test_id_reference_match() {
        let reference = IdReference::new(Identifier::from("urn:p"), Some(v("1.5")));
        assert!(IdReferenceMatch::new("urn:p").matches(&reference));
        assert!(!IdReferenceMatch::new("urn:q").matches(&reference));
        assert!(IdReferenceMatch::new("urn:p")
            .with_earliest_version(m("1.0"))
            .with_latest_version(m("2.0"))
            .matches(&reference));
        assert!(!IdReferenceMatch::new("urn:p")
            .with_version(m("1.4"))
            .matches(&reference));

        // A version pattern cannot match an unversioned reference
        let unversioned = IdReference::new(Identifier::from("urn:p"), None);
        assert!(!IdReferenceMatch::new("urn:p")
            .with_version(m("+"))
            .matches(&unversioned));
    }

    #[test]
    fn test_version_serde_as_string() {
        let json = serde_json::to_string(&v("3.1")).unwrap();
        assert_eq!(json, "\"3.1\"");
        let parsed: Version = serde_json::from_str("\"3.1\"").unwrap();
        assert_eq!(parsed, v("3.1"));
    }
}
