// Children of a PolicySet

use crate::combining::CombinerTarget;
use crate::context::EvaluationContext;
use crate::decision::EvaluationResult;
use crate::error::EvaluationError;
use crate::identifier::Identifier;
use crate::target::MatchResult;
use crate::trace::Traceable;
use crate::tree::{
    Evaluatable, Matchable, Policy, PolicyDefaults, PolicyIdReference, PolicySet, PolicySetIdReference,
};
use std::sync::{Arc, OnceLock, Weak};

/// Fields every PolicySet child carries
///
/// The parent link is non-owning and is only used for trace cause chains.
#[derive(Debug, Default)]
pub struct ChildCommon {
    identifier: Option<Identifier>,
    defaults: Arc<PolicyDefaults>,
    parent: OnceLock<Weak<PolicySet>>,
}

impl ChildCommon {
    pub fn new(identifier: Option<Identifier>) -> Self {
        Self {
            identifier,
            ..Self::default()
        }
    }

    pub fn with_defaults(mut self, defaults: Arc<PolicyDefaults>) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn identifier(&self) -> Option<&Identifier> {
        self.identifier.as_ref()
    }

    pub(crate) fn set_identifier(&mut self, identifier: Identifier) {
        self.identifier = Some(identifier);
    }

    pub fn defaults(&self) -> &Arc<PolicyDefaults> {
        &self.defaults
    }

    pub(crate) fn set_defaults(&mut self, defaults: Arc<PolicyDefaults>) {
        self.defaults = defaults;
    }

    /// Enclosing PolicySet, if this node was built into one that is still alive
    pub fn parent(&self) -> Option<Arc<PolicySet>> {
        self.parent.get().and_then(Weak::upgrade)
    }

    /// First binding wins
    pub(crate) fn bind_parent(&self, parent: Weak<PolicySet>) {
        let _ = self.parent.set(parent);
    }
}

/// A child of a PolicySet
#[derive(Debug, Clone)]
pub enum PolicySetChild {
    Policy(Arc<Policy>),
    PolicySet(Arc<PolicySet>),
    PolicyIdReference(Arc<PolicyIdReference>),
    PolicySetIdReference(Arc<PolicySetIdReference>),
}

impl PolicySetChild {
    pub fn common(&self) -> &ChildCommon {
        match self {
            PolicySetChild::Policy(policy) => policy.def().common(),
            PolicySetChild::PolicySet(policy_set) => policy_set.def().common(),
            PolicySetChild::PolicyIdReference(reference) => reference.common(),
            PolicySetChild::PolicySetIdReference(reference) => reference.common(),
        }
    }

    pub fn identifier(&self) -> Option<&Identifier> {
        self.common().identifier()
    }

    fn as_node(&self) -> &dyn ChildNode {
        match self {
            PolicySetChild::Policy(policy) => &**policy as &dyn ChildNode,
            PolicySetChild::PolicySet(policy_set) => &**policy_set as &dyn ChildNode,
            PolicySetChild::PolicyIdReference(reference) => &**reference as &dyn ChildNode,
            PolicySetChild::PolicySetIdReference(reference) => &**reference as &dyn ChildNode,
        }
    }
}

trait ChildNode: Evaluatable + Matchable + Traceable {}

impl<T: Evaluatable + Matchable + Traceable> ChildNode for T {}

impl From<Arc<Policy>> for PolicySetChild {
    fn from(policy: Arc<Policy>) -> Self {
        PolicySetChild::Policy(policy)
    }
}

impl From<Arc<PolicySet>> for PolicySetChild {
    fn from(policy_set: Arc<PolicySet>) -> Self {
        PolicySetChild::PolicySet(policy_set)
    }
}

impl From<PolicyIdReference> for PolicySetChild {
    fn from(reference: PolicyIdReference) -> Self {
        PolicySetChild::PolicyIdReference(Arc::new(reference))
    }
}

impl From<PolicySetIdReference> for PolicySetChild {
    fn from(reference: PolicySetIdReference) -> Self {
        PolicySetChild::PolicySetIdReference(Arc::new(reference))
    }
}

impl Evaluatable for PolicySetChild {
    fn evaluate(&self, context: &dyn EvaluationContext) -> Result<EvaluationResult, EvaluationError> {
        self.as_node().evaluate(context)
    }
}

impl Matchable for PolicySetChild {
    fn evaluate_match(&self, context: &dyn EvaluationContext) -> MatchResult {
        self.as_node().evaluate_match(context)
    }
}

impl Traceable for PolicySetChild {
    fn trace_id(&self) -> String {
        self.as_node().trace_id()
    }

    fn cause(&self) -> Option<Arc<dyn Traceable>> {
        self.as_node().cause()
    }
}

impl CombinerTarget for PolicySetChild {
    fn combiner_target_id(&self) -> Option<&Identifier> {
        self.identifier()
    }
}
