//! Obligations and advice
//!
//! Obligation/Advice expressions are attached to Rules, Policies and
//! PolicySets. Each one declares the effect it applies to; when a node
//! produces that decision the expression is evaluated into a concrete
//! [`Obligation`] or [`Advice`] carrying attribute assignments.

use crate::context::EvaluationContext;
use crate::decision::{Decision, RuleEffect};
use crate::error::EvaluationError;
use crate::expression::{Expression, ExpressionValue};
use crate::identifier::Identifier;
use crate::status::Status;
use crate::tree::PolicyDefaults;
use crate::validation::ValidationError;
use crate::value::AttributeValue;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const NO_VALUE_ASSIGNMENT_MESSAGE: &str = "Assignment expression produced no value";

// ============================================================================
// ASSIGNMENTS
// ============================================================================

/// One attribute assignment of an Obligation or Advice
///
/// `value` is absent when the assignment expression produced an empty bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeAssignment {
    attribute_id: Identifier,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<Identifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    issuer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<AttributeValue>,
}

impl AttributeAssignment {
    pub fn attribute_id(&self) -> &Identifier {
        &self.attribute_id
    }

    pub fn category(&self) -> Option<&Identifier> {
        self.category.as_ref()
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    pub fn value(&self) -> Option<&AttributeValue> {
        self.value.as_ref()
    }
}

/// Status plus the assignments produced by one assignment expression
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeAssignmentResult {
    status: Status,
    assignments: Vec<AttributeAssignment>,
}

impl AttributeAssignmentResult {
    fn ok(assignments: Vec<AttributeAssignment>) -> Self {
        Self {
            status: Status::OK,
            assignments,
        }
    }

    fn error(status: Status) -> Self {
        Self {
            status,
            assignments: Vec::new(),
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    pub fn assignments(&self) -> &[AttributeAssignment] {
        &self.assignments
    }

    pub fn into_assignments(self) -> Vec<AttributeAssignment> {
        self.assignments
    }
}

/// `<AttributeAssignmentExpression>`
#[derive(Debug, Default, Clone)]
pub struct AttributeAssignmentExpression {
    attribute_id: Option<Identifier>,
    category: Option<Identifier>,
    issuer: Option<String>,
    expression: Option<Arc<dyn Expression>>,
}

impl AttributeAssignmentExpression {
    pub fn new(attribute_id: impl Into<Identifier>, expression: Arc<dyn Expression>) -> Self {
        Self {
            attribute_id: Some(attribute_id.into()),
            expression: Some(expression),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<Identifier>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn attribute_id(&self) -> Option<&Identifier> {
        self.attribute_id.as_ref()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.attribute_id.is_none() {
            return Err(ValidationError::MissingAttributeId);
        }
        match &self.expression {
            None => Err(ValidationError::MissingAssignmentExpression),
            Some(expression) => expression.validate(),
        }
    }

    /// One assignment per bag element, one with no value for an empty bag,
    /// one for a single value
    pub fn evaluate(&self, context: &dyn EvaluationContext, defaults: &PolicyDefaults) -> AttributeAssignmentResult {
        if let Err(error) = self.validate() {
            return AttributeAssignmentResult::error(error.into());
        }
        let (Some(attribute_id), Some(expression)) = (&self.attribute_id, &self.expression) else {
            return AttributeAssignmentResult::error(ValidationError::MissingAttributeId.into());
        };
        let assignment = |value: Option<AttributeValue>| AttributeAssignment {
            attribute_id: attribute_id.clone(),
            category: self.category.clone(),
            issuer: self.issuer.clone(),
            value,
        };

        let (status, value) = expression.evaluate(context, defaults).into_parts();
        if !status.is_ok() {
            return AttributeAssignmentResult::error(status);
        }
        match value {
            ExpressionValue::Value(value) => AttributeAssignmentResult::ok(vec![assignment(Some(value))]),
            ExpressionValue::Bag(bag) if bag.is_empty() => AttributeAssignmentResult::ok(vec![assignment(None)]),
            ExpressionValue::Bag(bag) => {
                AttributeAssignmentResult::ok(bag.into_iter().map(|value| assignment(Some(value))).collect())
            }
            ExpressionValue::None => AttributeAssignmentResult::error(Status::processing_error(NO_VALUE_ASSIGNMENT_MESSAGE)),
        }
    }
}

/// Assignments of every expression in order; failing ones are left out
fn evaluate_assignments(
    context: &dyn EvaluationContext,
    defaults: &PolicyDefaults,
    expressions: &[AttributeAssignmentExpression],
) -> Vec<AttributeAssignment> {
    expressions
        .iter()
        .map(|expression| expression.evaluate(context, defaults))
        .filter(AttributeAssignmentResult::is_ok)
        .flat_map(AttributeAssignmentResult::into_assignments)
        .collect()
}

fn applies(applies_to: Option<RuleEffect>, decision: Option<Decision>) -> bool {
    match decision {
        None => true,
        Some(decision) => applies_to.map(RuleEffect::decision) == Some(decision),
    }
}

// ============================================================================
// OBLIGATIONS
// ============================================================================

/// An obligation returned with a Permit or Deny
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obligation {
    id: Identifier,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    attribute_assignments: Vec<AttributeAssignment>,
}

impl Obligation {
    pub fn new(id: Identifier, attribute_assignments: Vec<AttributeAssignment>) -> Self {
        Self {
            id,
            attribute_assignments,
        }
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn attribute_assignments(&self) -> &[AttributeAssignment] {
        &self.attribute_assignments
    }
}

/// `<ObligationExpression>`
#[derive(Debug, Default, Clone)]
pub struct ObligationExpression {
    id: Option<Identifier>,
    applies_to: Option<RuleEffect>,
    assignment_expressions: Vec<AttributeAssignmentExpression>,
}

impl ObligationExpression {
    pub fn new(id: impl Into<Identifier>, applies_to: RuleEffect) -> Self {
        Self {
            id: Some(id.into()),
            applies_to: Some(applies_to),
            assignment_expressions: Vec::new(),
        }
    }

    pub fn with_assignment(mut self, expression: AttributeAssignmentExpression) -> Self {
        self.assignment_expressions.push(expression);
        self
    }

    pub fn id(&self) -> Option<&Identifier> {
        self.id.as_ref()
    }

    pub fn applies_to(&self) -> Option<RuleEffect> {
        self.applies_to
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_none() {
            return Err(ValidationError::MissingObligationId);
        }
        if self.applies_to.is_none() {
            return Err(ValidationError::MissingAppliesTo);
        }
        self.assignment_expressions
            .iter()
            .try_for_each(AttributeAssignmentExpression::validate)
    }

    pub fn evaluate(
        &self,
        context: &dyn EvaluationContext,
        defaults: &PolicyDefaults,
    ) -> Result<Obligation, EvaluationError> {
        let id = self
            .id
            .clone()
            .ok_or_else(|| EvaluationError::InvalidObligationExpression(ValidationError::MissingObligationId.to_string()))?;
        Ok(Obligation::new(
            id,
            evaluate_assignments(context, defaults, &self.assignment_expressions),
        ))
    }

    /// Obligations for `decision` from `expressions`
    ///
    /// Every expression is validated before any is evaluated. With no
    /// decision, all expressions are evaluated regardless of effect.
    pub fn evaluate_all(
        context: &dyn EvaluationContext,
        defaults: &PolicyDefaults,
        decision: Option<Decision>,
        expressions: &[ObligationExpression],
    ) -> Result<Vec<Obligation>, EvaluationError> {
        for expression in expressions {
            expression
                .validate()
                .map_err(|error| EvaluationError::InvalidObligationExpression(error.to_string()))?;
        }
        expressions
            .iter()
            .filter(|expression| applies(expression.applies_to, decision))
            .map(|expression| expression.evaluate(context, defaults))
            .collect()
    }
}

// ============================================================================
// ADVICE
// ============================================================================

/// Advice returned with a Permit or Deny
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    id: Identifier,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    attribute_assignments: Vec<AttributeAssignment>,
}

impl Advice {
    pub fn new(id: Identifier, attribute_assignments: Vec<AttributeAssignment>) -> Self {
        Self {
            id,
            attribute_assignments,
        }
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn attribute_assignments(&self) -> &[AttributeAssignment] {
        &self.attribute_assignments
    }
}

/// `<AdviceExpression>`
#[derive(Debug, Default, Clone)]
pub struct AdviceExpression {
    id: Option<Identifier>,
    applies_to: Option<RuleEffect>,
    assignment_expressions: Vec<AttributeAssignmentExpression>,
}

impl AdviceExpression {
    pub fn new(id: impl Into<Identifier>, applies_to: RuleEffect) -> Self {
        Self {
            id: Some(id.into()),
            applies_to: Some(applies_to),
            assignment_expressions: Vec::new(),
        }
    }

    pub fn with_assignment(mut self, expression: AttributeAssignmentExpression) -> Self {
        self.assignment_expressions.push(expression);
        self
    }

    pub fn id(&self) -> Option<&Identifier> {
        self.id.as_ref()
    }

    pub fn applies_to(&self) -> Option<RuleEffect> {
        self.applies_to
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_none() {
            return Err(ValidationError::MissingAdviceId);
        }
        if self.applies_to.is_none() {
            return Err(ValidationError::MissingAppliesTo);
        }
        self.assignment_expressions
            .iter()
            .try_for_each(AttributeAssignmentExpression::validate)
    }

    pub fn evaluate(&self, context: &dyn EvaluationContext, defaults: &PolicyDefaults) -> Result<Advice, EvaluationError> {
        let id = self
            .id
            .clone()
            .ok_or_else(|| EvaluationError::InvalidAdviceExpression(ValidationError::MissingAdviceId.to_string()))?;
        Ok(Advice::new(
            id,
            evaluate_assignments(context, defaults, &self.assignment_expressions),
        ))
    }

    /// Advice for `decision`; see [`ObligationExpression::evaluate_all`]
    pub fn evaluate_all(
        context: &dyn EvaluationContext,
        defaults: &PolicyDefaults,
        decision: Option<Decision>,
        expressions: &[AdviceExpression],
    ) -> Result<Vec<Advice>, EvaluationError> {
        for expression in expressions {
            expression
                .validate()
                .map_err(|error| EvaluationError::InvalidAdviceExpression(error.to_string()))?;
        }
        expressions
            .iter()
            .filter(|expression| applies(expression.applies_to, decision))
            .map(|expression| expression.evaluate(context, defaults))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{AttributeValueExpression, ExpressionResult};
    use crate::test_support::empty_context;
    use crate::value::Bag;

    #[derive(Debug)]
    struct Fixed(ExpressionResult);

    impl Expression for Fixed {
        fn evaluate(&self, _context: &dyn EvaluationContext, _defaults: &PolicyDefaults) -> ExpressionResult {
            self.0.clone()
        }
    }

    fn assignment(result: ExpressionResult) -> AttributeAssignmentExpression {
        AttributeAssignmentExpression::new("urn:example:notify", Arc::new(Fixed(result)))
    }

    fn strings(count: usize) -> ExpressionResult {
        ExpressionResult::ok_bag((0..count).map(|i| AttributeValue::string(format!("v{}", i))).collect::<Bag>())
    }

    #[test]
    fn test_bag_explodes_into_one_assignment_per_element() {
        let result = assignment(strings(3)).evaluate(&empty_context(), &PolicyDefaults::default());
        assert!(result.is_ok());
        assert_eq!(result.assignments().len(), 3);
        assert_eq!(result.assignments()[2].value(), Some(&AttributeValue::string("v2")));
    }

    #[test]
    fn test_empty_bag_yields_one_assignment_without_value() {
        let result = assignment(strings(0)).evaluate(&empty_context(), &PolicyDefaults::default());
        assert_eq!(result.assignments().len(), 1);
        assert_eq!(result.assignments()[0].value(), None);
    }

    #[test]
    fn test_absent_value_fails_the_assignment() {
        let result = assignment(ExpressionResult::ok_absent()).evaluate(&empty_context(), &PolicyDefaults::default());
        assert!(!result.is_ok());
        assert_eq!(result.status(), &Status::processing_error(NO_VALUE_ASSIGNMENT_MESSAGE));
        assert!(result.assignments().is_empty());
    }

    #[test]
    fn test_single_value_yields_one_assignment() {
        let expression = AttributeAssignmentExpression::new(
            "urn:example:notify",
            Arc::new(AttributeValueExpression::new(AttributeValue::string("ops"))),
        )
        .with_category("urn:example:category");
        let result = expression.evaluate(&empty_context(), &PolicyDefaults::default());
        assert_eq!(result.assignments().len(), 1);
        assert_eq!(
            result.assignments()[0].category(),
            Some(&Identifier::from("urn:example:category"))
        );
    }

    #[test]
    fn test_failing_assignment_is_skipped() {
        let obligation = ObligationExpression::new("urn:example:log", RuleEffect::Permit)
            .with_assignment(assignment(ExpressionResult::error(Status::processing_error("boom"))))
            .with_assignment(assignment(strings(2)));
        let built = obligation
            .evaluate(&empty_context(), &PolicyDefaults::default())
            .unwrap();
        assert_eq!(built.attribute_assignments().len(), 2);
    }

    #[test]
    fn test_evaluate_all_filters_by_decision() {
        let expressions = vec![
            ObligationExpression::new("urn:example:on-permit", RuleEffect::Permit),
            ObligationExpression::new("urn:example:on-deny", RuleEffect::Deny),
        ];
        let context = empty_context();
        let defaults = PolicyDefaults::default();

        let permit = ObligationExpression::evaluate_all(&context, &defaults, Some(Decision::Permit), &expressions).unwrap();
        assert_eq!(permit.len(), 1);
        assert_eq!(permit[0].id(), &Identifier::from("urn:example:on-permit"));

        let all = ObligationExpression::evaluate_all(&context, &defaults, None, &expressions).unwrap();
        assert_eq!(all.len(), 2);

        let none =
            ObligationExpression::evaluate_all(&context, &defaults, Some(Decision::NotApplicable), &expressions).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_invalid_expression_aborts_batch() {
        let expressions = vec![
            AdviceExpression::new("urn:example:ok", RuleEffect::Permit),
            AdviceExpression::default(),
        ];
        let error = AdviceExpression::evaluate_all(
            &empty_context(),
            &PolicyDefaults::default(),
            Some(Decision::Permit),
            &expressions,
        )
        .unwrap_err();
        assert_eq!(
            error,
            EvaluationError::InvalidAdviceExpression("AdviceExpression is missing its AdviceId".to_string())
        );
    }

    #[test]
    fn test_invalid_assignment_invalidates_obligation() {
        let expression =
            ObligationExpression::new("urn:example:log", RuleEffect::Deny).with_assignment(AttributeAssignmentExpression::default());
        assert_eq!(expression.validate(), Err(ValidationError::MissingAttributeId));
    }
}
