//! Evaluation status
//!
//! Every result type in the evaluation tree carries a [`Status`] instead of
//! raising an error for expected outcomes. Indeterminate is a first-class
//! decision: the status explains why the evaluation could not complete.

use serde::{Deserialize, Serialize};
use std::fmt;

/// XACML status codes used by the evaluation core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    /// Evaluation completed normally
    Ok,

    /// A required attribute could not be retrieved
    MissingAttribute,

    /// Malformed policy element (missing required fields, empty sequences)
    SyntaxError,

    /// Runtime evaluation failure (bad datatypes, unknown functions, ...)
    ProcessingError,
}

impl StatusCode {
    /// XACML URI for this status code
    pub fn uri(&self) -> &'static str {
        match self {
            StatusCode::Ok => "urn:oasis:names:tc:xacml:1.0:status:ok",
            StatusCode::MissingAttribute => "urn:oasis:names:tc:xacml:1.0:status:missing-attribute",
            StatusCode::SyntaxError => "urn:oasis:names:tc:xacml:1.0:status:syntax-error",
            StatusCode::ProcessingError => "urn:oasis:names:tc:xacml:1.0:status:processing-error",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri())
    }
}

/// Status code plus an optional human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    code: StatusCode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl Status {
    /// Shared "ok" status with no message
    pub const OK: Status = Status {
        code: StatusCode::Ok,
        message: None,
    };

    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    pub fn syntax_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SyntaxError, message)
    }

    pub fn missing_attribute(message: impl Into<String>) -> Self {
        Self::new(StatusCode::MissingAttribute, message)
    }

    pub fn processing_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::ProcessingError, message)
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::OK
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{} ({})", self.code, message),
            None => write!(f, "{}", self.code),
        }
    }
}
