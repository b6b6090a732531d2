//! Rule conditions
//!
//! A Condition wraps one Expression and coerces its result to a strict
//! boolean. Each way the coercion can fail has its own stable message.

use crate::context::EvaluationContext;
use crate::expression::{Expression, ExpressionValue};
use crate::status::Status;
use crate::tree::PolicyDefaults;
use crate::validation::ValidationError;
use std::sync::Arc;

pub const BAG_RESULT_MESSAGE: &str = "Condition Expression returned a bag";
pub const NO_VALUE_MESSAGE: &str = "Condition Expression returned no value";
pub const NON_BOOLEAN_MESSAGE: &str = "Condition Expression returned a non-boolean value";

/// Outcome of a Condition: a boolean, or an error status
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionResult {
    status: Status,
    value: Option<bool>,
}

impl ConditionResult {
    pub const TRUE: ConditionResult = ConditionResult {
        status: Status::OK,
        value: Some(true),
    };

    pub const FALSE: ConditionResult = ConditionResult {
        status: Status::OK,
        value: Some(false),
    };

    pub fn indeterminate(status: Status) -> Self {
        Self { status, value: None }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    pub fn value(&self) -> Option<bool> {
        self.value
    }

    pub fn is_true(&self) -> bool {
        self.is_ok() && self.value == Some(true)
    }
}

/// `<Condition>`
#[derive(Debug, Default, Clone)]
pub struct Condition {
    expression: Option<Arc<dyn Expression>>,
}

impl Condition {
    pub fn new(expression: Arc<dyn Expression>) -> Self {
        Self {
            expression: Some(expression),
        }
    }

    pub fn expression(&self) -> Option<&Arc<dyn Expression>> {
        self.expression.as_ref()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.expression {
            Some(expression) => expression.validate(),
            None => Err(ValidationError::MissingConditionExpression),
        }
    }

    pub fn evaluate(&self, context: &dyn EvaluationContext, defaults: &PolicyDefaults) -> ConditionResult {
        if let Err(error) = self.validate() {
            return ConditionResult::indeterminate(error.into());
        }
        let Some(expression) = &self.expression else {
            return ConditionResult::indeterminate(ValidationError::MissingConditionExpression.into());
        };
        let result = expression.evaluate(context, defaults);
        if !result.is_ok() {
            return ConditionResult::indeterminate(result.status().clone());
        }
        match result.payload() {
            ExpressionValue::Bag(_) => ConditionResult::indeterminate(Status::processing_error(BAG_RESULT_MESSAGE)),
            ExpressionValue::None => ConditionResult::indeterminate(Status::processing_error(NO_VALUE_MESSAGE)),
            ExpressionValue::Value(value) => match value.as_bool() {
                Some(true) => ConditionResult::TRUE,
                Some(false) => ConditionResult::FALSE,
                None => ConditionResult::indeterminate(Status::processing_error(NON_BOOLEAN_MESSAGE)),
            },
        }
    }
}
