// Policy: Rules combined by a rule-combining algorithm

use crate::combining::{CombiningAlgorithm, TargetedCombinerParameter, TargetedCombinerParameterMap};
use crate::context::EvaluationContext;
use crate::decision::EvaluationResult;
use crate::error::EvaluationError;
use crate::expression::VariableMap;
use crate::target::{MatchCode, MatchResult};
use crate::trace::{TraceEvent, TraceValue, Traceable};
use crate::tree::{Evaluatable, Matchable, PolicyDef, Rule};
use crate::validation::ValidationError;
use std::sync::Arc;

/// `<Policy>`
#[derive(Debug)]
pub struct Policy {
    def: PolicyDef,
    rules: Vec<Arc<Rule>>,
    rule_combining_algorithm: Option<Arc<dyn CombiningAlgorithm<Rule>>>,
    rule_combiner_parameters: TargetedCombinerParameterMap<Rule>,
    variables: VariableMap,
}

impl Policy {
    pub fn builder(def: PolicyDef) -> PolicyBuilder {
        PolicyBuilder {
            def,
            rules: Vec::new(),
            rule_combining_algorithm: None,
            rule_combiner_parameters: Vec::new(),
            variables: VariableMap::new(),
        }
    }

    pub fn def(&self) -> &PolicyDef {
        &self.def
    }

    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }

    pub fn rule_combining_algorithm(&self) -> Option<&Arc<dyn CombiningAlgorithm<Rule>>> {
        self.rule_combining_algorithm.as_ref()
    }

    pub fn rule_combiner_parameters(&self) -> &TargetedCombinerParameterMap<Rule> {
        &self.rule_combiner_parameters
    }

    pub fn variables(&self) -> &VariableMap {
        &self.variables
    }

    fn combine(&self, context: &dyn EvaluationContext) -> Result<EvaluationResult, EvaluationError> {
        if let Err(status) = self.def.check_valid(|| match self.rule_combining_algorithm {
            Some(_) => Ok(()),
            None => Err(ValidationError::MissingCombiningAlgorithm),
        }) {
            return Ok(EvaluationResult::indeterminate(status));
        }
        let Some(algorithm) = &self.rule_combining_algorithm else {
            return Ok(EvaluationResult::indeterminate(
                ValidationError::MissingCombiningAlgorithm.into(),
            ));
        };

        let target = self.def.match_target(context);
        match target.code() {
            MatchCode::Match => {}
            MatchCode::NoMatch => return Ok(EvaluationResult::not_applicable()),
            MatchCode::Indeterminate => return Ok(EvaluationResult::indeterminate(target.status().clone())),
        }

        let elements = self
            .rule_combiner_parameters
            .elements(self.rules.iter().map(|rule| rule.as_ref()))?;
        let combined = algorithm.combine(context, &elements, self.def.combiner_parameters())?;
        let mut result = self.def.attach_obligations_and_advice(context, combined)?;
        if result.is_applicable() {
            if let Some(reference) = self.def.id_reference() {
                result.add_policy_identifier(reference.clone());
            }
        }
        Ok(result)
    }
}

impl Evaluatable for Policy {
    fn evaluate(&self, context: &dyn EvaluationContext) -> Result<EvaluationResult, EvaluationError> {
        let result = self.combine(context)?;
        tracing::debug!(
            policy = %self.trace_id(),
            decision = %result.decision(),
            status = %result.status(),
            "policy evaluated"
        );
        if context.is_tracing() {
            context.trace(TraceEvent::new("Policy result", self, TraceValue::Result(result.clone())));
        }
        Ok(result)
    }
}

impl Matchable for Policy {
    fn evaluate_match(&self, context: &dyn EvaluationContext) -> MatchResult {
        self.def.match_target(context)
    }
}

impl Traceable for Policy {
    fn trace_id(&self) -> String {
        match self.def.id_reference() {
            Some(reference) => format!("Policy {}", reference),
            None => "Policy <unidentified>".to_string(),
        }
    }

    fn cause(&self) -> Option<Arc<dyn Traceable>> {
        self.def
            .common()
            .parent()
            .map(|parent| parent as Arc<dyn Traceable>)
    }
}

/// Assembles a [`Policy`] and binds its Rules to it
pub struct PolicyBuilder {
    def: PolicyDef,
    rules: Vec<Arc<Rule>>,
    rule_combining_algorithm: Option<Arc<dyn CombiningAlgorithm<Rule>>>,
    rule_combiner_parameters: Vec<TargetedCombinerParameter>,
    variables: VariableMap,
}

impl PolicyBuilder {
    pub fn def_mut(&mut self) -> &mut PolicyDef {
        &mut self.def
    }

    /// Append a Rule; evaluation order is insertion order
    pub fn rule(mut self, mut rule: Rule) -> Self {
        rule.reset_validation();
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn rule_combining_algorithm(mut self, algorithm: Arc<dyn CombiningAlgorithm<Rule>>) -> Self {
        self.rule_combining_algorithm = Some(algorithm);
        self
    }

    pub fn rule_combiner_parameter(mut self, parameter: TargetedCombinerParameter) -> Self {
        self.rule_combiner_parameters.push(parameter);
        self
    }

    /// Variable definitions; VariableReferences must be built from this same map
    pub fn variables(mut self, variables: VariableMap) -> Self {
        self.variables = variables;
        self
    }

    pub fn build(self) -> Arc<Policy> {
        let PolicyBuilder {
            def,
            rules,
            rule_combining_algorithm,
            rule_combiner_parameters,
            variables,
        } = self;
        Arc::new_cyclic(|policy| {
            for rule in &rules {
                rule.bind_policy(policy.clone());
            }
            Policy {
                def,
                rules,
                rule_combining_algorithm,
                rule_combiner_parameters: TargetedCombinerParameterMap::new(rule_combiner_parameters),
                variables,
            }
        })
    }
}
