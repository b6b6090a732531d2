// PolicyIdReference / PolicySetIdReference
//
// A reference resolves its target through the context the first time it is
// evaluated or matched and keeps it for the rest of its lifetime. Reloading
// the policy store therefore means rebuilding the tree that holds the
// references.

use crate::context::EvaluationContext;
use crate::decision::EvaluationResult;
use crate::error::EvaluationError;
use crate::finder::PolicyFinderResult;
use crate::status::Status;
use crate::target::MatchResult;
use crate::trace::Traceable;
use crate::tree::{ChildCommon, Evaluatable, Matchable, Policy, PolicyDefaults, PolicySet};
use crate::validation::ValidationError;
use crate::version::IdReferenceMatch;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Node types an id-reference can point at
pub trait Referencee: Evaluatable + Matchable + Traceable + fmt::Debug + 'static {
    /// Element name used in trace ids and messages
    const KIND: &'static str;

    fn find(context: &dyn EvaluationContext, id_reference_match: &IdReferenceMatch) -> PolicyFinderResult<Arc<Self>>;
}

impl Referencee for Policy {
    const KIND: &'static str = "Policy";

    fn find(context: &dyn EvaluationContext, id_reference_match: &IdReferenceMatch) -> PolicyFinderResult<Arc<Self>> {
        context.get_policy(id_reference_match)
    }
}

impl Referencee for PolicySet {
    const KIND: &'static str = "PolicySet";

    fn find(context: &dyn EvaluationContext, id_reference_match: &IdReferenceMatch) -> PolicyFinderResult<Arc<Self>> {
        context.get_policy_set(id_reference_match)
    }
}

/// An id-reference to a `T`, resolved lazily and cached
#[derive(Debug)]
pub struct IdReferenceNode<T: Referencee> {
    common: ChildCommon,
    id_reference_match: Option<IdReferenceMatch>,
    referencee: OnceLock<Arc<T>>,
}

pub type PolicyIdReference = IdReferenceNode<Policy>;
pub type PolicySetIdReference = IdReferenceNode<PolicySet>;

impl<T: Referencee> Default for IdReferenceNode<T> {
    fn default() -> Self {
        Self {
            common: ChildCommon::default(),
            id_reference_match: None,
            referencee: OnceLock::new(),
        }
    }
}

impl<T: Referencee> IdReferenceNode<T> {
    pub fn new(id_reference_match: IdReferenceMatch) -> Self {
        Self {
            common: ChildCommon::new(Some(id_reference_match.id().clone())),
            id_reference_match: Some(id_reference_match),
            referencee: OnceLock::new(),
        }
    }

    pub fn with_defaults(mut self, defaults: Arc<PolicyDefaults>) -> Self {
        self.common.set_defaults(defaults);
        self
    }

    pub fn common(&self) -> &ChildCommon {
        &self.common
    }

    pub fn id_reference_match(&self) -> Option<&IdReferenceMatch> {
        self.id_reference_match.as_ref()
    }

    /// The cached referencee, if resolution has already succeeded
    pub fn referencee(&self) -> Option<&Arc<T>> {
        self.referencee.get()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.id_reference_match {
            Some(_) => Ok(()),
            None => Err(ValidationError::MissingIdReferenceMatch),
        }
    }

    fn selector(&self) -> Result<&IdReferenceMatch, Status> {
        self.id_reference_match
            .as_ref()
            .ok_or_else(|| ValidationError::MissingIdReferenceMatch.into())
    }

    /// Resolve through the context unless already cached
    ///
    /// Failed lookups are not cached.
    pub fn resolve(&self, context: &dyn EvaluationContext) -> Result<Arc<T>, Status> {
        if let Some(referencee) = self.referencee.get() {
            return Ok(Arc::clone(referencee));
        }
        let selector = self.selector()?;
        let found = T::find(context, selector);
        let finder_status = found.status().clone();
        match found.into_policy_def() {
            Some(referencee) => Ok(Arc::clone(self.referencee.get_or_init(|| referencee))),
            None => {
                tracing::warn!(
                    kind = T::KIND,
                    reference = %selector,
                    status = %finder_status,
                    "unresolved policy reference"
                );
                Err(Status::processing_error(format!(
                    "Could not find referencee for {}IdReference {}",
                    T::KIND,
                    selector
                )))
            }
        }
    }
}

impl<T: Referencee> Evaluatable for IdReferenceNode<T> {
    fn evaluate(&self, context: &dyn EvaluationContext) -> Result<EvaluationResult, EvaluationError> {
        let referencee = match self.resolve(context) {
            Ok(referencee) => referencee,
            Err(status) => return Ok(EvaluationResult::indeterminate(status)),
        };
        let selector = match self.selector() {
            Ok(selector) => selector,
            Err(status) => return Ok(EvaluationResult::indeterminate(status)),
        };
        if let Err(status) = context.enter_reference(selector) {
            tracing::warn!(reference = %selector, status = %status, "policy reference rejected");
            return Ok(EvaluationResult::indeterminate(status));
        }
        let result = referencee.evaluate(context);
        context.exit_reference();
        result
    }
}

impl<T: Referencee> Matchable for IdReferenceNode<T> {
    fn evaluate_match(&self, context: &dyn EvaluationContext) -> MatchResult {
        match self.resolve(context) {
            Ok(referencee) => referencee.evaluate_match(context),
            Err(status) => MatchResult::indeterminate(status),
        }
    }
}

impl<T: Referencee> Traceable for IdReferenceNode<T> {
    fn trace_id(&self) -> String {
        match &self.id_reference_match {
            Some(selector) => format!("{}IdReference {}", T::KIND, selector),
            None => format!("{}IdReference <unset>", T::KIND),
        }
    }

    fn cause(&self) -> Option<Arc<dyn Traceable>> {
        self.common.parent().map(|parent| parent as Arc<dyn Traceable>)
    }
}
