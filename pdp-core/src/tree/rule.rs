// Rule evaluation
//
// 1. Validate (RuleId, owning Policy, Effect)
// 2. Target, absent meaning Match
// 3. Condition, against the owning Policy's defaults
// 4. Effect decision plus the obligations/advice for that effect
//
// An Indeterminate from a Rule carries the Indeterminate kind of its effect.

use crate::combining::CombinerTarget;
use crate::condition::Condition;
use crate::context::EvaluationContext;
use crate::decision::{EvaluationResult, RuleEffect};
use crate::error::EvaluationError;
use crate::identifier::Identifier;
use crate::obligation::{AdviceExpression, ObligationExpression};
use crate::status::Status;
use crate::target::{MatchCode, MatchResult, Target};
use crate::trace::{TraceEvent, TraceValue, Traceable};
use crate::tree::{Evaluatable, Matchable, Policy, PolicyDefaults};
use crate::validation::{ValidationCache, ValidationError};
use std::sync::{Arc, OnceLock, Weak};

/// `<Rule>`
#[derive(Debug, Default)]
pub struct Rule {
    rule_id: Option<Identifier>,
    effect: Option<RuleEffect>,
    description: Option<String>,
    target: Option<Target>,
    condition: Option<Condition>,
    obligation_expressions: Vec<ObligationExpression>,
    advice_expressions: Vec<AdviceExpression>,
    policy: OnceLock<Weak<Policy>>,
    validation: ValidationCache,
}

impl Rule {
    /// Rule with no Target and no Condition
    pub fn new(rule_id: impl Into<Identifier>, effect: RuleEffect) -> Self {
        Self {
            rule_id: Some(rule_id.into()),
            effect: Some(effect),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_obligation_expression(mut self, expression: ObligationExpression) -> Self {
        self.obligation_expressions.push(expression);
        self
    }

    pub fn with_advice_expression(mut self, expression: AdviceExpression) -> Self {
        self.advice_expressions.push(expression);
        self
    }

    pub fn id(&self) -> Option<&Identifier> {
        self.rule_id.as_ref()
    }

    pub fn effect(&self) -> Option<RuleEffect> {
        self.effect
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn obligation_expressions(&self) -> &[ObligationExpression] {
        &self.obligation_expressions
    }

    pub fn advice_expressions(&self) -> &[AdviceExpression] {
        &self.advice_expressions
    }

    /// Owning Policy, while it is alive
    pub fn policy(&self) -> Option<Arc<Policy>> {
        self.policy.get().and_then(Weak::upgrade)
    }

    /// Called once by the owning Policy's builder
    pub(crate) fn bind_policy(&self, policy: Weak<Policy>) {
        let _ = self.policy.set(policy);
    }

    pub(crate) fn reset_validation(&mut self) {
        self.validation.reset();
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.rule_id.is_none() {
            return Err(ValidationError::MissingRuleId);
        }
        if self.policy().is_none() {
            return Err(ValidationError::MissingOwningPolicy);
        }
        if self.effect.is_none() {
            return Err(ValidationError::MissingEffect);
        }
        Ok(())
    }

    fn prerequisites(&self) -> Result<(RuleEffect, Arc<Policy>), Status> {
        self.validation.check(|| self.validate())?;
        let effect = self
            .effect
            .ok_or_else(|| Status::from(ValidationError::MissingEffect))?;
        let policy = self
            .policy()
            .ok_or_else(|| Status::from(ValidationError::MissingOwningPolicy))?;
        Ok((effect, policy))
    }

    fn match_with(&self, context: &dyn EvaluationContext, defaults: &PolicyDefaults) -> MatchResult {
        match &self.target {
            Some(target) => target.evaluate_match(context, defaults),
            None => MatchResult::MATCH,
        }
    }

    fn emit(&self, context: &dyn EvaluationContext, message: &str, value: TraceValue) {
        if context.is_tracing() {
            context.trace(TraceEvent::new(message, self, value));
        }
    }

    fn finish(&self, context: &dyn EvaluationContext, result: EvaluationResult) -> EvaluationResult {
        self.emit(context, "Rule result", TraceValue::Result(result.clone()));
        result
    }
}

impl Evaluatable for Rule {
    fn evaluate(&self, context: &dyn EvaluationContext) -> Result<EvaluationResult, EvaluationError> {
        let kind = self.effect.map(RuleEffect::indeterminate_kind).unwrap_or_default();
        let (effect, policy) = match self.prerequisites() {
            Ok(prerequisites) => prerequisites,
            Err(status) => {
                return Ok(self.finish(context, EvaluationResult::indeterminate_with_kind(status, kind)));
            }
        };
        let defaults = policy.def().defaults();

        let target = self.match_with(context, defaults);
        self.emit(context, "Rule target", TraceValue::Match(target.clone()));
        match target.code() {
            MatchCode::Match => {}
            MatchCode::NoMatch => return Ok(self.finish(context, EvaluationResult::not_applicable())),
            MatchCode::Indeterminate => {
                let result = EvaluationResult::indeterminate_with_kind(target.status().clone(), kind);
                return Ok(self.finish(context, result));
            }
        }

        if let Some(condition) = &self.condition {
            let outcome = condition.evaluate(context, defaults);
            self.emit(context, "Rule condition", TraceValue::Condition(outcome.clone()));
            if !outcome.is_ok() {
                let result = EvaluationResult::indeterminate_with_kind(outcome.status().clone(), kind);
                return Ok(self.finish(context, result));
            }
            if !outcome.is_true() {
                return Ok(self.finish(context, EvaluationResult::not_applicable()));
            }
        }

        let decision = Some(effect.decision());
        let obligations =
            ObligationExpression::evaluate_all(context, defaults, decision, &self.obligation_expressions)?;
        let advice = AdviceExpression::evaluate_all(context, defaults, decision, &self.advice_expressions)?;
        let result = EvaluationResult::with_effect(effect.decision(), obligations, advice);
        Ok(self.finish(context, result))
    }
}

impl Matchable for Rule {
    fn evaluate_match(&self, context: &dyn EvaluationContext) -> MatchResult {
        match self.policy() {
            Some(policy) => self.match_with(context, policy.def().defaults()),
            None => self.match_with(context, &PolicyDefaults::default()),
        }
    }
}

impl Traceable for Rule {
    fn trace_id(&self) -> String {
        match &self.rule_id {
            Some(id) => format!("Rule {}", id),
            None => "Rule <unidentified>".to_string(),
        }
    }

    fn cause(&self) -> Option<Arc<dyn Traceable>> {
        self.policy().map(|policy| policy as Arc<dyn Traceable>)
    }
}

impl CombinerTarget for Rule {
    fn combiner_target_id(&self) -> Option<&Identifier> {
        self.id()
    }
}
