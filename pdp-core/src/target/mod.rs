//! Target matching
//!
//! `Match → AllOf → AnyOf → Target` form a tri-state applicability tree.
//! Children are evaluated in declaration order and the short-circuit rules
//! depend on that order:
//!
//! - AllOf returns on the first NoMatch and otherwise reports the first
//!   Indeterminate it saw.
//! - AnyOf returns on the first Match and otherwise reports the first
//!   Indeterminate it saw.
//! - Target returns the first child result that is not Match, whatever its
//!   kind. An empty Target always matches.

use crate::context::EvaluationContext;
use crate::status::Status;
use crate::tree::PolicyDefaults;
use serde::{Deserialize, Serialize};

pub mod all_of;
pub mod any_of;
pub mod attribute_match;

pub use all_of::AllOf;
pub use any_of::AnyOf;
pub use attribute_match::Match;

/// Tri-state outcome of matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchCode {
    Match,
    NoMatch,
    Indeterminate,
}

/// Match code plus the status explaining an Indeterminate
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    code: MatchCode,
    status: Status,
}

impl MatchResult {
    pub const MATCH: MatchResult = MatchResult {
        code: MatchCode::Match,
        status: Status::OK,
    };

    pub const NO_MATCH: MatchResult = MatchResult {
        code: MatchCode::NoMatch,
        status: Status::OK,
    };

    pub fn indeterminate(status: Status) -> Self {
        Self {
            code: MatchCode::Indeterminate,
            status,
        }
    }

    pub fn code(&self) -> MatchCode {
        self.code
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_match(&self) -> bool {
        self.code == MatchCode::Match
    }
}

/// `<Target>`: conjunction of AnyOf elements
#[derive(Debug, Default)]
pub struct Target {
    any_ofs: Vec<AnyOf>,
}

impl Target {
    /// Target with no AnyOf children; matches every request
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(any_ofs: Vec<AnyOf>) -> Self {
        Self { any_ofs }
    }

    pub fn with_any_of(mut self, any_of: AnyOf) -> Self {
        self.any_ofs.push(any_of);
        self
    }

    pub fn any_ofs(&self) -> &[AnyOf] {
        &self.any_ofs
    }

    pub fn is_empty(&self) -> bool {
        self.any_ofs.is_empty()
    }

    pub fn evaluate_match(&self, context: &dyn EvaluationContext, defaults: &PolicyDefaults) -> MatchResult {
        for any_of in &self.any_ofs {
            let result = any_of.evaluate_match(context, defaults);
            if !result.is_match() {
                return result;
            }
        }
        MatchResult::MATCH
    }
}
