// Match: one predicate applied to a literal and retrieved attribute values

use crate::context::EvaluationContext;
use crate::expression::{AttributeRetrieval, ExpressionValue};
use crate::function::{FunctionArgument, FunctionCache, FunctionDefinition};
use crate::identifier::Identifier;
use crate::status::Status;
use crate::target::{MatchCode, MatchResult};
use crate::tree::PolicyDefaults;
use crate::validation::{ValidationCache, ValidationError};
use crate::value::AttributeValue;
use std::sync::Arc;

/// Message for a predicate that returns anything other than a boolean
pub const NON_BOOLEAN_MATCH_MESSAGE: &str = "Non-boolean result from Match function";
pub const NO_VALUE_MATCH_MESSAGE: &str = "Attribute retrieval produced no value";

/// `<Match>`: `MatchId(literal, attribute)` over every retrieved value
#[derive(Debug, Default)]
pub struct Match {
    match_id: Option<Identifier>,
    attribute_value: Option<AttributeValue>,
    attribute_retrieval: Option<Arc<dyn AttributeRetrieval>>,
    function: FunctionCache,
    validation: ValidationCache,
}

impl Match {
    pub fn new(
        match_id: impl Into<Identifier>,
        attribute_value: AttributeValue,
        attribute_retrieval: Arc<dyn AttributeRetrieval>,
    ) -> Self {
        Self {
            match_id: Some(match_id.into()),
            attribute_value: Some(attribute_value),
            attribute_retrieval: Some(attribute_retrieval),
            ..Self::default()
        }
    }

    pub fn match_id(&self) -> Option<&Identifier> {
        self.match_id.as_ref()
    }

    pub fn attribute_value(&self) -> Option<&AttributeValue> {
        self.attribute_value.as_ref()
    }

    pub fn attribute_retrieval(&self) -> Option<&Arc<dyn AttributeRetrieval>> {
        self.attribute_retrieval.as_ref()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.match_id.is_none() {
            return Err(ValidationError::MissingMatchId);
        }
        if self.attribute_value.is_none() {
            return Err(ValidationError::MissingMatchValue);
        }
        match &self.attribute_retrieval {
            None => Err(ValidationError::MissingAttributeRetrieval),
            Some(retrieval) => retrieval.validate(),
        }
    }

    pub fn evaluate_match(&self, context: &dyn EvaluationContext, defaults: &PolicyDefaults) -> MatchResult {
        if let Err(status) = self.validation.check(|| self.validate()) {
            return MatchResult::indeterminate(status);
        }
        let (Some(match_id), Some(literal), Some(retrieval)) =
            (&self.match_id, &self.attribute_value, &self.attribute_retrieval)
        else {
            return MatchResult::indeterminate(ValidationError::MissingMatchId.into());
        };

        let function = match self.function.resolve(context, match_id) {
            Ok(function) => function,
            Err(status) => return MatchResult::indeterminate(status),
        };

        let retrieved = retrieval.evaluate(context, defaults);
        if !retrieved.is_ok() {
            return MatchResult::indeterminate(retrieved.status().clone());
        }
        match retrieved.payload() {
            ExpressionValue::Value(value) => apply_predicate(function.as_ref(), context, literal, value),
            ExpressionValue::Bag(bag) => {
                let mut first_indeterminate = None;
                for value in bag {
                    let result = apply_predicate(function.as_ref(), context, literal, value);
                    match result.code() {
                        MatchCode::Match => return result,
                        MatchCode::NoMatch => {}
                        MatchCode::Indeterminate => {
                            first_indeterminate.get_or_insert(result);
                        }
                    }
                }
                first_indeterminate.unwrap_or(MatchResult::NO_MATCH)
            }
            ExpressionValue::None => MatchResult::indeterminate(Status::processing_error(NO_VALUE_MATCH_MESSAGE)),
        }
    }
}

fn apply_predicate(
    function: &dyn FunctionDefinition,
    context: &dyn EvaluationContext,
    literal: &AttributeValue,
    value: &AttributeValue,
) -> MatchResult {
    let arguments = [
        FunctionArgument::Value(literal.clone()),
        FunctionArgument::Value(value.clone()),
    ];
    let result = function.evaluate(context, &arguments);
    if !result.is_ok() {
        return MatchResult::indeterminate(result.status().clone());
    }
    match result.value().and_then(AttributeValue::as_bool) {
        Some(true) => MatchResult::MATCH,
        Some(false) => MatchResult::NO_MATCH,
        None => MatchResult::indeterminate(Status::processing_error(NON_BOOLEAN_MATCH_MESSAGE)),
    }
}
