// PolicySet: children combined by a policy-combining algorithm

use crate::combining::{CombiningAlgorithm, TargetedCombinerParameter, TargetedCombinerParameterMap};
use crate::context::EvaluationContext;
use crate::decision::EvaluationResult;
use crate::error::EvaluationError;
use crate::target::{MatchCode, MatchResult};
use crate::trace::{TraceEvent, TraceValue, Traceable};
use crate::tree::{Evaluatable, Matchable, PolicyDef, PolicySetChild};
use crate::validation::ValidationError;
use std::sync::Arc;

/// `<PolicySet>`
#[derive(Debug)]
pub struct PolicySet {
    def: PolicyDef,
    children: Vec<PolicySetChild>,
    policy_combining_algorithm: Option<Arc<dyn CombiningAlgorithm<PolicySetChild>>>,
    policy_combiner_parameters: TargetedCombinerParameterMap<PolicySetChild>,
}

impl PolicySet {
    pub fn builder(def: PolicyDef) -> PolicySetBuilder {
        PolicySetBuilder {
            def,
            children: Vec::new(),
            policy_combining_algorithm: None,
            policy_combiner_parameters: Vec::new(),
        }
    }

    pub fn def(&self) -> &PolicyDef {
        &self.def
    }

    pub fn children(&self) -> &[PolicySetChild] {
        &self.children
    }

    pub fn policy_combining_algorithm(&self) -> Option<&Arc<dyn CombiningAlgorithm<PolicySetChild>>> {
        self.policy_combining_algorithm.as_ref()
    }

    pub fn policy_combiner_parameters(&self) -> &TargetedCombinerParameterMap<PolicySetChild> {
        &self.policy_combiner_parameters
    }

    fn combine(&self, context: &dyn EvaluationContext) -> Result<EvaluationResult, EvaluationError> {
        if let Err(status) = self.def.check_valid(|| match self.policy_combining_algorithm {
            Some(_) => Ok(()),
            None => Err(ValidationError::MissingCombiningAlgorithm),
        }) {
            return Ok(EvaluationResult::indeterminate(status));
        }
        let Some(algorithm) = &self.policy_combining_algorithm else {
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

        let elements = self.policy_combiner_parameters.elements(self.children.iter())?;
        let combined = algorithm.combine(context, &elements, self.def.combiner_parameters())?;
        let mut result = self.def.attach_obligations_and_advice(context, combined)?;
        if result.is_applicable() {
            if let Some(reference) = self.def.id_reference() {
                result.add_policy_set_identifier(reference.clone());
            }
        }
        Ok(result)
    }
}

impl Evaluatable for PolicySet {
    fn evaluate(&self, context: &dyn EvaluationContext) -> Result<EvaluationResult, EvaluationError> {
        let result = self.combine(context)?;
        tracing::debug!(
            policy_set = %self.trace_id(),
            decision = %result.decision(),
            status = %result.status(),
            "policy set evaluated"
        );
        if context.is_tracing() {
            context.trace(TraceEvent::new("PolicySet result", self, TraceValue::Result(result.clone())));
        }
        Ok(result)
    }
}

impl Matchable for PolicySet {
    fn evaluate_match(&self, context: &dyn EvaluationContext) -> MatchResult {
        self.def.match_target(context)
    }
}

impl Traceable for PolicySet {
    fn trace_id(&self) -> String {
        match self.def.id_reference() {
            Some(reference) => format!("PolicySet {}", reference),
            None => "PolicySet <unidentified>".to_string(),
        }
    }

    fn cause(&self) -> Option<Arc<dyn Traceable>> {
        self.def
            .common()
            .parent()
            .map(|parent| parent as Arc<dyn Traceable>)
    }
}

/// Assembles a [`PolicySet`] and binds its children's parent links
pub struct PolicySetBuilder {
    def: PolicyDef,
    children: Vec<PolicySetChild>,
    policy_combining_algorithm: Option<Arc<dyn CombiningAlgorithm<PolicySetChild>>>,
    policy_combiner_parameters: Vec<TargetedCombinerParameter>,
}

impl PolicySetBuilder {
    pub fn def_mut(&mut self) -> &mut PolicyDef {
        &mut self.def
    }

    /// Append a child; evaluation order is insertion order
    pub fn child(mut self, child: impl Into<PolicySetChild>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn policy_combining_algorithm(mut self, algorithm: Arc<dyn CombiningAlgorithm<PolicySetChild>>) -> Self {
        self.policy_combining_algorithm = Some(algorithm);
        self
    }

    pub fn policy_combiner_parameter(mut self, parameter: TargetedCombinerParameter) -> Self {
        self.policy_combiner_parameters.push(parameter);
        self
    }

    pub fn build(self) -> Arc<PolicySet> {
        let PolicySetBuilder {
            def,
            children,
            policy_combining_algorithm,
            policy_combiner_parameters,
        } = self;
        Arc::new_cyclic(|policy_set| {
            for child in &children {
                child.common().bind_parent(policy_set.clone());
            }
            PolicySet {
                def,
                children,
                policy_combining_algorithm,
                policy_combiner_parameters: TargetedCombinerParameterMap::new(policy_combiner_parameters),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combining::CombiningAlgorithmFactory;
    use crate::decision::{Decision, RuleEffect};
    use crate::identifier::{algorithm, Identifier};
    use crate::status::StatusCode;
    use crate::target::{AnyOf, Target};
    use crate::target::testing::scripted_all_of;
    use crate::test_support::empty_context;
    use crate::tree::{Policy, Rule};
    use crate::version::Version;

    fn version() -> Version {
        "1.0".parse().unwrap()
    }

    fn policy(id: &str, effect: RuleEffect) -> Arc<Policy> {
        let algorithm = CombiningAlgorithmFactory::default()
            .rule_combining_algorithm(&Identifier::from(algorithm::RULE_FIRST_APPLICABLE))
            .unwrap();
        Policy::builder(PolicyDef::new(id, version()))
            .rule_combining_algorithm(algorithm)
            .rule(Rule::new(format!("{}-rule", id), effect))
            .build()
    }

    fn permit_overrides() -> Arc<dyn CombiningAlgorithm<PolicySetChild>> {
        CombiningAlgorithmFactory::default()
            .policy_combining_algorithm(&Identifier::from(algorithm::POLICY_PERMIT_OVERRIDES))
            .unwrap()
    }

    #[test]
    fn test_policy_set_records_applicable_identifiers() {
        let set = PolicySet::builder(PolicyDef::new("urn:example:set", version()))
            .policy_combining_algorithm(permit_overrides())
            .child(policy("urn:example:deny", RuleEffect::Deny))
            .child(policy("urn:example:permit", RuleEffect::Permit))
            .build();
        let result = set.evaluate(&empty_context()).unwrap();
        assert_eq!(result.decision(), Decision::Permit);
        assert_eq!(result.policy_set_identifiers()[0].to_string(), "urn:example:set:1.0");
        let policies: Vec<String> = result.policy_identifiers().iter().map(ToString::to_string).collect();
        assert_eq!(policies, vec!["urn:example:deny:1.0", "urn:example:permit:1.0"]);
    }

    #[test]
    fn test_children_are_bound_to_parent() {
        let child = policy("urn:example:child", RuleEffect::Permit);
        let set = PolicySet::builder(PolicyDef::new("urn:example:set", version()))
            .policy_combining_algorithm(permit_overrides())
            .child(Arc::clone(&child))
            .build();
        assert!(Arc::ptr_eq(&child.def().common().parent().unwrap(), &set));

        // Rule -> Policy -> PolicySet
        let rule_cause = child.rules()[0].cause().unwrap();
        let set_cause = rule_cause.cause().unwrap();
        assert_eq!(set_cause.trace_id(), "PolicySet urn:example:set:1.0");
    }

    #[test]
    fn test_indeterminate_target_yields_deny_permit_indeterminate() {
        let (all_of, _) = scripted_all_of(MatchCode::Indeterminate);
        let def = PolicyDef::new("urn:example:set", version()).with_target(Target::new(vec![AnyOf::new(vec![all_of])]));
        let set = PolicySet::builder(def)
            .policy_combining_algorithm(permit_overrides())
            .child(policy("urn:example:permit", RuleEffect::Permit))
            .build();
        let result = set.evaluate(&empty_context()).unwrap();
        assert_eq!(result.decision(), Decision::Indeterminate);
        assert_eq!(result.indeterminate_kind(), crate::decision::IndeterminateKind::DenyPermit);
        assert_eq!(result.status().code(), StatusCode::ProcessingError);
    }

    #[test]
    fn test_missing_version_is_syntax_error() {
        let mut builder = PolicySet::builder(PolicyDef::default()).policy_combining_algorithm(permit_overrides());
        builder.def_mut().set_identifier("urn:example:set");
        let set = builder.build();
        let result = set.evaluate(&empty_context()).unwrap();
        assert_eq!(result.decision(), Decision::Indeterminate);
        assert_eq!(result.status().message(), Some("Missing Version"));
    }
}
