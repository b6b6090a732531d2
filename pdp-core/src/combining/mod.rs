//! Combining algorithms
//!
//! One generic contract, instantiated for Rules (inside a Policy) and for
//! [`PolicySetChild`](crate::tree::PolicySetChild)ren (inside a PolicySet).
//! Each child is wrapped in a [`CombiningElement`] carrying the combiner
//! parameters that target it.
//!
//! - `parameters.rs`: CombinerParameter and the targeted parameter map
//! - `algorithms.rs`: the standard XACML 3.0 algorithms and the 1.0 policy
//!   overrides tables
//! - `registry.rs`: lookup of algorithms by identifier

use crate::context::EvaluationContext;
use crate::decision::EvaluationResult;
use crate::error::EvaluationError;
use crate::identifier::Identifier;
use crate::tree::Evaluatable;
use std::fmt;

pub mod algorithms;
pub mod parameters;
pub mod registry;

pub use algorithms::{
    DenyOverrides, DenyUnlessPermit, FirstApplicable, LegacyDenyOverrides, LegacyPermitOverrides, OnlyOneApplicable,
    PermitOverrides, PermitUnlessDeny,
};
pub use parameters::{CombinerParameter, CombinerTarget, TargetedCombinerParameter, TargetedCombinerParameterMap};
pub use registry::CombiningAlgorithmFactory;

/// A child being combined, with the parameters that target it
#[derive(Debug)]
pub struct CombiningElement<'a, T> {
    element: &'a T,
    parameters: Vec<CombinerParameter>,
}

impl<'a, T> CombiningElement<'a, T> {
    pub fn new(element: &'a T, parameters: Vec<CombinerParameter>) -> Self {
        Self { element, parameters }
    }

    pub fn element(&self) -> &'a T {
        self.element
    }

    pub fn parameters(&self) -> &[CombinerParameter] {
        &self.parameters
    }
}

impl<T: Evaluatable> CombiningElement<'_, T> {
    pub fn evaluate(&self, context: &dyn EvaluationContext) -> Result<EvaluationResult, EvaluationError> {
        self.element.evaluate(context)
    }
}

/// Strategy merging the decisions of several children into one
pub trait CombiningAlgorithm<T>: fmt::Debug + Send + Sync {
    fn id(&self) -> &Identifier;

    /// Combine `elements` in order
    ///
    /// `parameters` are the untargeted combiner parameters of the owning
    /// Policy or PolicySet.
    fn combine(
        &self,
        context: &dyn EvaluationContext,
        elements: &[CombiningElement<'_, T>],
        parameters: &[CombinerParameter],
    ) -> Result<EvaluationResult, EvaluationError>;
}
