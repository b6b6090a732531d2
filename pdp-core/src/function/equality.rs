// Equality predicates
//
// <type>-equal takes exactly two single values of the declared datatype and
// returns an xs:boolean.

use crate::context::EvaluationContext;
use crate::expression::ExpressionResult;
use crate::function::{FunctionArgument, FunctionDefinition};
use crate::identifier::{datatype, function, Identifier};
use crate::status::Status;
use crate::value::AttributeValue;

/// `urn:oasis:names:tc:xacml:1.0:function:<type>-equal`
#[derive(Debug, Clone)]
pub struct EqualityFunction {
    id: Identifier,
    argument_data_type: Identifier,
    return_data_type: Identifier,
}

impl EqualityFunction {
    pub fn new(id: impl Into<Identifier>, argument_data_type: impl Into<Identifier>) -> Self {
        Self {
            id: id.into(),
            argument_data_type: argument_data_type.into(),
            return_data_type: Identifier::from(datatype::BOOLEAN),
        }
    }

    /// The equality functions registered by default
    pub fn standard() -> Vec<EqualityFunction> {
        vec![
            Self::new(function::STRING_EQUAL, datatype::STRING),
            Self::new(function::BOOLEAN_EQUAL, datatype::BOOLEAN),
            Self::new(function::INTEGER_EQUAL, datatype::INTEGER),
            Self::new(function::DOUBLE_EQUAL, datatype::DOUBLE),
            Self::new(function::ANY_URI_EQUAL, datatype::ANY_URI),
        ]
    }

    /// Doubles compare numerically, so `1` and `1.0` are equal
    fn payloads_equal(&self, left: &AttributeValue, right: &AttributeValue) -> bool {
        if self.argument_data_type == datatype::DOUBLE {
            if let (Some(left), Some(right)) = (left.value().as_f64(), right.value().as_f64()) {
                return left == right;
            }
        }
        left.value() == right.value()
    }

    fn single_argument<'a>(
        &self,
        arguments: &'a [FunctionArgument],
        index: usize,
    ) -> Result<&'a AttributeValue, Status> {
        let argument = &arguments[index];
        if !argument.is_ok() {
            return Err(argument.status().clone());
        }
        let value = argument.value().ok_or_else(|| {
            Status::processing_error(format!("{} Expected a simple value, saw a bag at arg index {}", self.id, index))
        })?;
        if value.data_type_id() != &self.argument_data_type {
            return Err(Status::processing_error(format!(
                "{} Expected data type '{}' saw '{}' at arg index {}",
                self.id,
                self.argument_data_type,
                value.data_type_id(),
                index
            )));
        }
        Ok(value)
    }
}

impl FunctionDefinition for EqualityFunction {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn data_type_id(&self) -> &Identifier {
        &self.return_data_type
    }

    fn returns_bag(&self) -> bool {
        false
    }

    fn evaluate(&self, _context: &dyn EvaluationContext, arguments: &[FunctionArgument]) -> ExpressionResult {
        if arguments.len() != 2 {
            return ExpressionResult::error(Status::processing_error(format!(
                "{} Expected 2 arguments, got {}",
                self.id,
                arguments.len()
            )));
        }
        let left = match self.single_argument(arguments, 0) {
            Ok(value) => value,
            Err(status) => return ExpressionResult::error(status),
        };
        let right = match self.single_argument(arguments, 1) {
            Ok(value) => value,
            Err(status) => return ExpressionResult::error(status),
        };
        ExpressionResult::ok_value(AttributeValue::boolean(self.payloads_equal(left, right)))
    }
}
