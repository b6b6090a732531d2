//! Identifiers
//!
//! XACML names everything (datatypes, functions, categories, policies,
//! combining algorithms) with URIs. [`Identifier`] is a thin newtype over the
//! URI string; the well-known values used by the core live in the submodules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// URI-valued identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(uri: &str) -> Self {
        Self(uri.to_string())
    }
}

impl From<String> for Identifier {
    fn from(uri: String) -> Self {
        Self(uri)
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// XML Schema datatypes understood by the core
pub mod datatype {
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    pub const ANY_URI: &str = "http://www.w3.org/2001/XMLSchema#anyURI";
}

/// Standard attribute categories
pub mod category {
    pub const ACCESS_SUBJECT: &str = "urn:oasis:names:tc:xacml:1.0:subject-category:access-subject";
    pub const RESOURCE: &str = "urn:oasis:names:tc:xacml:3.0:attribute-category:resource";
    pub const ACTION: &str = "urn:oasis:names:tc:xacml:3.0:attribute-category:action";
    pub const ENVIRONMENT: &str = "urn:oasis:names:tc:xacml:3.0:attribute-category:environment";
}

/// Function identifiers registered by the standard factory
pub mod function {
    pub const STRING_EQUAL: &str = "urn:oasis:names:tc:xacml:1.0:function:string-equal";
    pub const BOOLEAN_EQUAL: &str = "urn:oasis:names:tc:xacml:1.0:function:boolean-equal";
    pub const INTEGER_EQUAL: &str = "urn:oasis:names:tc:xacml:1.0:function:integer-equal";
    pub const DOUBLE_EQUAL: &str = "urn:oasis:names:tc:xacml:1.0:function:double-equal";
    pub const ANY_URI_EQUAL: &str = "urn:oasis:names:tc:xacml:1.0:function:anyURI-equal";
}

/// Combining algorithm identifiers
pub mod algorithm {
    // Rule-combining
    pub const RULE_DENY_OVERRIDES: &str = "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:deny-overrides";
    pub const RULE_PERMIT_OVERRIDES: &str = "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:permit-overrides";
    pub const RULE_ORDERED_DENY_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:ordered-deny-overrides";
    pub const RULE_ORDERED_PERMIT_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:ordered-permit-overrides";
    pub const RULE_DENY_UNLESS_PERMIT: &str = "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:deny-unless-permit";
    pub const RULE_PERMIT_UNLESS_DENY: &str = "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:permit-unless-deny";
    pub const RULE_FIRST_APPLICABLE: &str = "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:first-applicable";
    pub const LEGACY_RULE_DENY_OVERRIDES: &str = "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:deny-overrides";
    pub const LEGACY_RULE_PERMIT_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:permit-overrides";
    pub const LEGACY_RULE_ORDERED_DENY_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:1.1:rule-combining-algorithm:ordered-deny-overrides";
    pub const LEGACY_RULE_ORDERED_PERMIT_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:1.1:rule-combining-algorithm:ordered-permit-overrides";

    // Policy-combining
    pub const POLICY_DENY_OVERRIDES: &str = "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:deny-overrides";
    pub const POLICY_PERMIT_OVERRIDES: &str = "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:permit-overrides";
    pub const POLICY_ORDERED_DENY_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:ordered-deny-overrides";
    pub const POLICY_ORDERED_PERMIT_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:ordered-permit-overrides";
    pub const POLICY_DENY_UNLESS_PERMIT: &str =
        "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:deny-unless-permit";
    pub const POLICY_PERMIT_UNLESS_DENY: &str =
        "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:permit-unless-deny";
    pub const POLICY_FIRST_APPLICABLE: &str = "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:first-applicable";
    pub const POLICY_ONLY_ONE_APPLICABLE: &str =
        "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:only-one-applicable";
    pub const LEGACY_POLICY_DENY_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:deny-overrides";
    pub const LEGACY_POLICY_PERMIT_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:permit-overrides";
    pub const LEGACY_POLICY_ORDERED_DENY_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:1.1:policy-combining-algorithm:ordered-deny-overrides";
    pub const LEGACY_POLICY_ORDERED_PERMIT_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:1.1:policy-combining-algorithm:ordered-permit-overrides";
}
