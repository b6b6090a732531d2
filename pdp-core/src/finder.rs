//! Policy finder
//!
//! The PolicyFinder locates the root policy and resolves id-references. The
//! storage behind it is external; [`StdPolicyFinder`] is an in-memory store
//! populated by a loader.

use crate::context::EvaluationContext;
use crate::status::Status;
use crate::tree::{Policy, PolicySet};
use crate::version::{IdReference, IdReferenceMatch};
use std::sync::Arc;

/// Outcome of a finder lookup
#[derive(Debug, Clone)]
pub struct PolicyFinderResult<T> {
    status: Status,
    policy_def: Option<T>,
}

impl<T> PolicyFinderResult<T> {
    pub fn found(policy_def: T) -> Self {
        Self {
            status: Status::OK,
            policy_def: Some(policy_def),
        }
    }

    pub fn not_found(status: Status) -> Self {
        Self {
            status,
            policy_def: None,
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn policy_def(&self) -> Option<&T> {
        self.policy_def.as_ref()
    }

    pub fn into_policy_def(self) -> Option<T> {
        self.policy_def
    }
}

/// The root of a policy tree: either a Policy or a PolicySet
#[derive(Debug, Clone)]
pub enum RootPolicy {
    Policy(Arc<Policy>),
    PolicySet(Arc<PolicySet>),
}

/// Locates policies for the evaluation core
pub trait PolicyFinder: Send + Sync {
    fn get_root_policy_def(&self, context: &dyn EvaluationContext) -> PolicyFinderResult<RootPolicy>;

    fn get_policy(&self, id_reference_match: &IdReferenceMatch) -> PolicyFinderResult<Arc<Policy>>;

    fn get_policy_set(&self, id_reference_match: &IdReferenceMatch) -> PolicyFinderResult<Arc<PolicySet>>;
}

/// In-memory policy store
///
/// Lookups pick the highest version satisfying the id-reference match.
#[derive(Debug, Default)]
pub struct StdPolicyFinder {
    root: Option<RootPolicy>,
    policies: Vec<Arc<Policy>>,
    policy_sets: Vec<Arc<PolicySet>>,
}

impl StdPolicyFinder {
    pub fn new(root: Option<RootPolicy>) -> Self {
        Self {
            root,
            policies: Vec::new(),
            policy_sets: Vec::new(),
        }
    }

    /// Make a Policy available to id-references
    pub fn with_policy(mut self, policy: Arc<Policy>) -> Self {
        self.policies.push(policy);
        self
    }

    /// Make a PolicySet available to id-references
    pub fn with_policy_set(mut self, policy_set: Arc<PolicySet>) -> Self {
        self.policy_sets.push(policy_set);
        self
    }

    fn best_match<T, F>(candidates: &[Arc<T>], id_reference_match: &IdReferenceMatch, reference_of: F) -> Option<Arc<T>>
    where
        F: Fn(&T) -> Option<&IdReference>,
    {
        candidates
            .iter()
            .filter_map(|candidate| reference_of(candidate.as_ref()).map(|reference| (candidate, reference)))
            .filter(|(_, reference)| id_reference_match.matches(reference))
            .max_by(|(_, a), (_, b)| a.version().cmp(&b.version()))
            .map(|(candidate, _)| Arc::clone(candidate))
    }

    fn not_found<T>(kind: &str, id_reference_match: &IdReferenceMatch) -> PolicyFinderResult<T> {
        PolicyFinderResult::not_found(Status::processing_error(format!(
            "No {} matching {}",
            kind, id_reference_match
        )))
    }
}

impl PolicyFinder for StdPolicyFinder {
    fn get_root_policy_def(&self, _context: &dyn EvaluationContext) -> PolicyFinderResult<RootPolicy> {
        match &self.root {
            Some(root) => PolicyFinderResult::found(root.clone()),
            None => PolicyFinderResult::not_found(Status::processing_error("No root policy found")),
        }
    }

    fn get_policy(&self, id_reference_match: &IdReferenceMatch) -> PolicyFinderResult<Arc<Policy>> {
        match Self::best_match(&self.policies, id_reference_match, |policy| policy.def().id_reference()) {
            Some(policy) => PolicyFinderResult::found(policy),
            None => Self::not_found("Policy", id_reference_match),
        }
    }

    fn get_policy_set(&self, id_reference_match: &IdReferenceMatch) -> PolicyFinderResult<Arc<PolicySet>> {
        match Self::best_match(&self.policy_sets, id_reference_match, |set| set.def().id_reference()) {
            Some(policy_set) => PolicyFinderResult::found(policy_set),
            None => Self::not_found("PolicySet", id_reference_match),
        }
    }
}
