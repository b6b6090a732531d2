// Inheritable policy defaults

use crate::identifier::Identifier;
use std::sync::Arc;

/// XPath version used when no PolicyDefaults in the chain sets one
pub const XPATH_VERSION_DEFAULT: &str = "http://www.w3.org/TR/1999/REC-xpath-19991116";

/// `<PolicyDefaults>` / `<PolicySetDefaults>` with a link to the enclosing set's defaults
#[derive(Debug, Clone, Default)]
pub struct PolicyDefaults {
    xpath_version: Option<Identifier>,
    parent: Option<Arc<PolicyDefaults>>,
}

impl PolicyDefaults {
    pub fn new(xpath_version: Option<Identifier>, parent: Option<Arc<PolicyDefaults>>) -> Self {
        Self { xpath_version, parent }
    }

    /// Defaults that inherit everything from `parent`
    pub fn inherit(parent: Arc<PolicyDefaults>) -> Self {
        Self::new(None, Some(parent))
    }

    pub fn parent(&self) -> Option<&Arc<PolicyDefaults>> {
        self.parent.as_ref()
    }

    /// Own value, else the nearest ancestor's, else [`XPATH_VERSION_DEFAULT`]
    pub fn xpath_version(&self) -> &str {
        match (&self.xpath_version, &self.parent) {
            (Some(version), _) => version.as_str(),
            (None, Some(parent)) => parent.xpath_version(),
            (None, None) => XPATH_VERSION_DEFAULT,
        }
    }
}
