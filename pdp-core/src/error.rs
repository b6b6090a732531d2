// Hard evaluation faults
//
// Expected evaluation outcomes are reported through Status on result types.
// EvaluationError is reserved for configuration-level problems that abort the
// whole evaluate() call for a request: they indicate a policy that should have
// failed load-time validation.

use crate::identifier::Identifier;
use thiserror::Error;

/// Faults that abort evaluation of the current request
#[derive(Debug, Error, PartialEq, Clone)]
pub enum EvaluationError {
    #[error("Invalid ObligationExpression: {0}")]
    InvalidObligationExpression(String),

    #[error("Invalid AdviceExpression: {0}")]
    InvalidAdviceExpression(String),

    #[error("Combiner parameter '{name}' targets unknown element '{target_id}'")]
    UnresolvedCombinerParameter { name: String, target_id: Identifier },
}
