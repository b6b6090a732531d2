//! Expressions
//!
//! An [`Expression`] evaluates to an [`ExpressionResult`] given the request
//! context and the inherited [`PolicyDefaults`]. Failures are reported in the
//! result status, never as errors.
//!
//! - `literal.rs`: constant attribute values
//! - `apply.rs`: function applications
//! - `designator.rs`: attribute retrieval from the request context
//! - `variable.rs`: VariableDefinition / VariableMap / VariableReference

use crate::context::EvaluationContext;
use crate::status::Status;
use crate::tree::PolicyDefaults;
use crate::validation::ValidationError;
use crate::value::{AttributeValue, Bag, EMPTY_BAG};
use std::fmt;

pub mod apply;
pub mod designator;
pub mod literal;
pub mod variable;

pub use apply::Apply;
pub use designator::AttributeDesignator;
pub use literal::AttributeValueExpression;
pub use variable::{VariableDefinition, VariableMap, VariableReference};

/// Payload of an expression result
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionValue {
    /// No value: error results, or an ok result that produced nothing
    None,

    /// Single attribute value
    Value(AttributeValue),

    /// Bag of values, possibly empty
    Bag(Bag),
}

/// Status plus at most one of {single value, bag}
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionResult {
    status: Status,
    value: ExpressionValue,
}

impl ExpressionResult {
    pub fn ok_value(value: AttributeValue) -> Self {
        Self {
            status: Status::OK,
            value: ExpressionValue::Value(value),
        }
    }

    pub fn ok_bag(bag: Bag) -> Self {
        Self {
            status: Status::OK,
            value: ExpressionValue::Bag(bag),
        }
    }

    pub fn empty_bag() -> Self {
        Self::ok_bag(EMPTY_BAG)
    }

    /// Ok result carrying no value
    pub fn ok_absent() -> Self {
        Self {
            status: Status::OK,
            value: ExpressionValue::None,
        }
    }

    pub fn error(status: Status) -> Self {
        debug_assert!(!status.is_ok(), "error results need a non-ok status");
        Self {
            status,
            value: ExpressionValue::None,
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    pub fn is_bag(&self) -> bool {
        matches!(self.value, ExpressionValue::Bag(_))
    }

    pub fn value(&self) -> Option<&AttributeValue> {
        match &self.value {
            ExpressionValue::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn bag(&self) -> Option<&Bag> {
        match &self.value {
            ExpressionValue::Bag(bag) => Some(bag),
            _ => None,
        }
    }

    pub fn payload(&self) -> &ExpressionValue {
        &self.value
    }

    pub fn into_parts(self) -> (Status, ExpressionValue) {
        (self.status, self.value)
    }
}

/// Anything that evaluates to an [`ExpressionResult`]
pub trait Expression: fmt::Debug + Send + Sync {
    fn evaluate(&self, context: &dyn EvaluationContext, defaults: &PolicyDefaults) -> ExpressionResult;

    /// Structural check run before evaluation and by load-time validation
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Leaf expressions that fetch attribute values (designators, selectors)
pub trait AttributeRetrieval: Expression {
    /// True if an empty result must be reported as a missing attribute
    fn must_be_present(&self) -> bool;
}
