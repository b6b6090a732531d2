//! Policy evaluation tree
//!
//! The tree is built once by a loader and then evaluated concurrently by
//! many requests. All nodes are `Send + Sync`; the only in-place mutations
//! after construction are write-once caches.
//!
//! - `defaults.rs`: inheritable PolicyDefaults
//! - `rule.rs`: Rule and its Target / Condition / obligation pipeline
//! - `def.rs`: PolicyDef, the fields shared by Policy and PolicySet
//! - `child.rs`: ChildCommon and the PolicySetChild variant
//! - `policy.rs` / `policy_set.rs`: the combining nodes and their builders
//! - `reference.rs`: PolicyIdReference / PolicySetIdReference

use crate::context::EvaluationContext;
use crate::decision::EvaluationResult;
use crate::error::EvaluationError;
use crate::target::MatchResult;

pub mod child;
pub mod def;
pub mod defaults;
pub mod policy;
pub mod policy_set;
pub mod reference;
pub mod rule;

pub use child::{ChildCommon, PolicySetChild};
pub use def::PolicyDef;
pub use defaults::{PolicyDefaults, XPATH_VERSION_DEFAULT};
pub use policy::{Policy, PolicyBuilder};
pub use policy_set::{PolicySet, PolicySetBuilder};
pub use reference::{IdReferenceNode, PolicyIdReference, PolicySetIdReference, Referencee};
pub use rule::Rule;

/// Nodes that produce a Decision
///
/// `Err` is reserved for faults that abort the whole request; everything
/// else is reported through the result's decision and status.
pub trait Evaluatable {
    fn evaluate(&self, context: &dyn EvaluationContext) -> Result<EvaluationResult, EvaluationError>;
}

/// Nodes whose applicability can be tested without evaluating them
pub trait Matchable {
    fn evaluate_match(&self, context: &dyn EvaluationContext) -> MatchResult;
}
