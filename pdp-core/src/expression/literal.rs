// Literal attribute values

use crate::context::EvaluationContext;
use crate::expression::{Expression, ExpressionResult};
use crate::tree::PolicyDefaults;
use crate::value::AttributeValue;

/// `<AttributeValue>` used as an expression
#[derive(Debug, Clone)]
pub struct AttributeValueExpression {
    value: AttributeValue,
}

impl AttributeValueExpression {
    pub fn new(value: AttributeValue) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &AttributeValue {
        &self.value
    }
}

impl Expression for AttributeValueExpression {
    fn evaluate(&self, _context: &dyn EvaluationContext, _defaults: &PolicyDefaults) -> ExpressionResult {
        ExpressionResult::ok_value(self.value.clone())
    }
}
