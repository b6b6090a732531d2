// Function application
//
// Evaluates every argument expression in order, wraps the results as
// FunctionArguments and hands them to the function. Argument failures are
// passed through as FunctionArgument::Error; it is up to the function
// whether they are fatal.

use crate::context::EvaluationContext;
use crate::expression::{Expression, ExpressionResult};
use crate::function::{FunctionArgument, FunctionCache};
use crate::identifier::Identifier;
use crate::tree::PolicyDefaults;
use crate::validation::ValidationError;
use std::sync::Arc;

/// `<Apply>`: call a function on argument expressions
#[derive(Debug, Default)]
pub struct Apply {
    function_id: Option<Identifier>,
    description: Option<String>,
    arguments: Vec<Arc<dyn Expression>>,
    function: FunctionCache,
}

impl Apply {
    pub fn new(function_id: impl Into<Identifier>) -> Self {
        Self {
            function_id: Some(function_id.into()),
            ..Self::default()
        }
    }

    pub fn with_argument(mut self, argument: Arc<dyn Expression>) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn function_id(&self) -> Option<&Identifier> {
        self.function_id.as_ref()
    }

    pub fn arguments(&self) -> &[Arc<dyn Expression>] {
        &self.arguments
    }
}

impl Expression for Apply {
    fn evaluate(&self, context: &dyn EvaluationContext, defaults: &PolicyDefaults) -> ExpressionResult {
        if let Err(error) = self.validate() {
            return ExpressionResult::error(error.into());
        }
        let Some(function_id) = self.function_id.as_ref() else {
            return ExpressionResult::error(ValidationError::MissingFunctionId.into());
        };
        let function = match self.function.resolve(context, function_id) {
            Ok(function) => function,
            Err(status) => return ExpressionResult::error(status),
        };
        let arguments: Vec<FunctionArgument> = self
            .arguments
            .iter()
            .map(|argument| FunctionArgument::from(argument.evaluate(context, defaults)))
            .collect();
        function.evaluate(context, &arguments)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.function_id.is_none() {
            return Err(ValidationError::MissingFunctionId);
        }
        self.arguments.iter().try_for_each(|argument| argument.validate())
    }
}
