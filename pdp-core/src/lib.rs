//! XACML PDP Core - Rust Engine
//!
//! Evaluation core of a XACML 3.0 Policy Decision Point: given a policy tree
//! and a request, compute Permit / Deny / NotApplicable / Indeterminate with
//! obligations and advice.
//!
//! # Architecture
//!
//! - **target**: Match / AllOf / AnyOf / Target applicability matching
//! - **expression**: literals, Apply, designators, variables
//! - **condition**: boolean Rule guards
//! - **obligation**: Obligation / Advice expressions and results
//! - **combining**: combining-algorithm contract, standard algorithms, registry
//! - **tree**: Rule, Policy, PolicySet, id-references, inherited defaults
//! - **context** / **finder**: per-request state and policy lookup
//! - **engine**: request façade
//!
//! # Critical Invariants
//!
//! 1. Expected failures are statuses on results, never errors
//! 2. Children are evaluated in declaration order
//! 3. Tree nodes are immutable after construction apart from write-once caches

// Module declarations
pub mod combining;
pub mod condition;
pub mod config;
pub mod context;
pub mod decision;
pub mod engine;
pub mod error;
pub mod expression;
pub mod finder;
pub mod function;
pub mod identifier;
pub mod obligation;
pub mod request;
pub mod status;
pub mod target;
pub mod trace;
pub mod tree;
pub mod validation;
pub mod value;
pub mod version;

// Re-exports for convenience
pub use combining::{
    CombinerParameter, CombiningAlgorithm, CombiningAlgorithmFactory, CombiningElement, TargetedCombinerParameter,
};
pub use condition::{Condition, ConditionResult};
pub use config::{ConfigError, PdpConfig};
pub use context::{EvaluationContext, StdEvaluationContext};
pub use decision::{Decision, EvaluationResult, IndeterminateKind, RuleEffect};
pub use engine::PdpEngine;
pub use error::EvaluationError;
pub use expression::{
    Apply, AttributeDesignator, AttributeRetrieval, AttributeValueExpression, Expression, ExpressionResult,
    VariableDefinition, VariableMap, VariableReference,
};
pub use finder::{PolicyFinder, PolicyFinderResult, RootPolicy, StdPolicyFinder};
pub use function::{FunctionArgument, FunctionDefinition, FunctionDefinitionFactory, StdFunctionDefinitionFactory};
pub use identifier::Identifier;
pub use obligation::{
    Advice, AdviceExpression, AttributeAssignment, AttributeAssignmentExpression, Obligation, ObligationExpression,
};
pub use request::{AttributeQuery, Request};
pub use status::{Status, StatusCode};
pub use target::{AllOf, AnyOf, Match, MatchCode, MatchResult, Target};
pub use trace::{TraceEvent, TraceValue, Traceable};
pub use tree::{
    Evaluatable, Matchable, Policy, PolicyDef, PolicyDefaults, PolicyIdReference, PolicySet, PolicySetChild,
    PolicySetIdReference, Rule,
};
pub use validation::{validate_policy, validate_policy_set, ValidationError};
pub use value::{AttributeValue, Bag};
pub use version::{IdReference, IdReferenceMatch, Version, VersionMatch};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::context::StdEvaluationContext;
    use crate::finder::{PolicyFinder, StdPolicyFinder};
    use crate::function::StdFunctionDefinitionFactory;
    use crate::request::Request;
    use std::sync::Arc;

    pub(crate) fn context_with_finder(request: Request, finder: Arc<dyn PolicyFinder>) -> StdEvaluationContext {
        StdEvaluationContext::new(request, finder, Arc::new(StdFunctionDefinitionFactory::default()))
    }

    pub(crate) fn context_for(request: Request) -> StdEvaluationContext {
        context_with_finder(request, Arc::new(StdPolicyFinder::default()))
    }

    pub(crate) fn empty_context() -> StdEvaluationContext {
        context_for(Request::new())
    }
}
