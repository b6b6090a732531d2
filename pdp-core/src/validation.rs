// Policy tree validation
//
// Nodes validate themselves before evaluating and memoize the outcome in a
// ValidationCache; a failure degrades to Indeterminate with a syntax-error
// status. validate_policy / validate_policy_set walk a whole tree at load
// time and report every problem found:
// - Required identifiers, versions, effects and targets
// - Empty AnyOf / AllOf sequences
// - Match, Condition and assignment expressions
// - Duplicate rule and variable ids
// - Targeted combiner parameters that bind to no child

use crate::identifier::Identifier;
use crate::obligation::{AdviceExpression, ObligationExpression};
use crate::status::Status;
use crate::target::Target;
use crate::tree::{Policy, PolicySet, PolicySetChild, Rule};
use std::collections::HashSet;
use std::sync::OnceLock;
use thiserror::Error;

/// Validation errors
#[derive(Debug, Error, PartialEq, Clone)]
pub enum ValidationError {
    #[error("Missing RuleId")]
    MissingRuleId,

    #[error("Missing Effect")]
    MissingEffect,

    #[error("Rule is not owned by a Policy")]
    MissingOwningPolicy,

    #[error("Missing policy identifier")]
    MissingPolicyIdentifier,

    #[error("Missing Version")]
    MissingVersion,

    #[error("Missing Target")]
    MissingTarget,

    #[error("Missing combining algorithm")]
    MissingCombiningAlgorithm,

    #[error("AllOf contains no Match elements")]
    EmptyAllOf,

    #[error("AnyOf contains no AllOf elements")]
    EmptyAnyOf,

    #[error("Match is missing its MatchId")]
    MissingMatchId,

    #[error("Match is missing its AttributeValue")]
    MissingMatchValue,

    #[error("Match is missing its attribute retrieval expression")]
    MissingAttributeRetrieval,

    #[error("Condition has no Expression")]
    MissingConditionExpression,

    #[error("ObligationExpression is missing its ObligationId")]
    MissingObligationId,

    #[error("AdviceExpression is missing its AdviceId")]
    MissingAdviceId,

    #[error("Missing FulfillOn / AppliesTo effect")]
    MissingAppliesTo,

    #[error("AttributeAssignmentExpression is missing its AttributeId")]
    MissingAttributeId,

    #[error("AttributeAssignmentExpression has no Expression")]
    MissingAssignmentExpression,

    #[error("Unknown VariableId '{0}'")]
    UnknownVariable(Identifier),

    #[error("Duplicate VariableId '{0}'")]
    DuplicateVariableId(Identifier),

    #[error("Duplicate RuleId '{0}'")]
    DuplicateRuleId(Identifier),

    #[error("Id reference has no IdReferenceMatch")]
    MissingIdReferenceMatch,

    #[error("Apply is missing its FunctionId")]
    MissingFunctionId,

    #[error("Combiner parameter '{name}' targets unknown element '{target_id}'")]
    UnresolvedCombinerParameter { name: String, target_id: Identifier },
}

impl From<ValidationError> for Status {
    fn from(error: ValidationError) -> Self {
        Status::syntax_error(error.to_string())
    }
}

/// Validation result
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Write-once memo of a node's own validation outcome
#[derive(Debug, Default)]
pub(crate) struct ValidationCache(OnceLock<Result<(), ValidationError>>);

impl ValidationCache {
    /// Run `validate` on first use; later calls return the stored outcome
    pub(crate) fn check<F>(&self, validate: F) -> Result<(), Status>
    where
        F: FnOnce() -> Result<(), ValidationError>,
    {
        self.0.get_or_init(validate).clone().map_err(Status::from)
    }

    /// Forget the stored outcome after a field change
    pub(crate) fn reset(&mut self) {
        self.0.take();
    }
}

/// Validate a Policy and everything it contains
///
/// Runs all checks and returns all errors found.
///
/// # Returns
///
/// Ok(()) if all checks pass, Err(errors) otherwise
pub fn validate_policy(policy: &Policy) -> ValidationResult {
    let mut errors = Vec::new();
    collect_policy_errors(policy, &mut errors);
    into_result(errors)
}

/// Validate a PolicySet and, recursively, its inline children
///
/// Id-references are checked for a selector but not resolved.
pub fn validate_policy_set(policy_set: &PolicySet) -> ValidationResult {
    let mut errors = Vec::new();
    collect_policy_set_errors(policy_set, &mut errors);
    into_result(errors)
}

fn into_result(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn collect_policy_errors(policy: &Policy, errors: &mut Vec<ValidationError>) {
    let def = policy.def();
    errors.extend(def.validate().err());
    if let Some(target) = def.target() {
        collect_target_errors(target, errors);
    }
    if policy.rule_combining_algorithm().is_none() {
        errors.push(ValidationError::MissingCombiningAlgorithm);
    }
    collect_expression_list_errors(def.obligation_expressions(), def.advice_expressions(), errors);

    for definition in policy.variables().iter() {
        errors.extend(definition.expression().validate().err());
    }

    let mut seen = HashSet::new();
    for rule in policy.rules() {
        if let Some(id) = rule.id() {
            if !seen.insert(id.clone()) {
                errors.push(ValidationError::DuplicateRuleId(id.clone()));
            }
        }
        collect_rule_errors(rule, errors);
    }

    if let Err(error) = policy.rule_combiner_parameters().check(policy.rules().iter().map(|rule| rule.as_ref())) {
        errors.push(error);
    }
}

fn collect_policy_set_errors(policy_set: &PolicySet, errors: &mut Vec<ValidationError>) {
    let def = policy_set.def();
    errors.extend(def.validate().err());
    if let Some(target) = def.target() {
        collect_target_errors(target, errors);
    }
    if policy_set.policy_combining_algorithm().is_none() {
        errors.push(ValidationError::MissingCombiningAlgorithm);
    }
    collect_expression_list_errors(def.obligation_expressions(), def.advice_expressions(), errors);

    for child in policy_set.children() {
        match child {
            PolicySetChild::Policy(policy) => collect_policy_errors(policy, errors),
            PolicySetChild::PolicySet(nested) => collect_policy_set_errors(nested, errors),
            PolicySetChild::PolicyIdReference(reference) => {
                errors.extend(reference.validate().err());
            }
            PolicySetChild::PolicySetIdReference(reference) => {
                errors.extend(reference.validate().err());
            }
        }
    }

    if let Err(error) = policy_set.policy_combiner_parameters().check(policy_set.children().iter()) {
        errors.push(error);
    }
}

fn collect_rule_errors(rule: &Rule, errors: &mut Vec<ValidationError>) {
    errors.extend(rule.validate().err());
    if let Some(target) = rule.target() {
        collect_target_errors(target, errors);
    }
    if let Some(condition) = rule.condition() {
        errors.extend(condition.validate().err());
    }
    collect_expression_list_errors(rule.obligation_expressions(), rule.advice_expressions(), errors);
}

fn collect_target_errors(target: &Target, errors: &mut Vec<ValidationError>) {
    for any_of in target.any_ofs() {
        errors.extend(any_of.validate().err());
        for all_of in any_of.all_ofs() {
            errors.extend(all_of.validate().err());
            for attribute_match in all_of.matches() {
                errors.extend(attribute_match.validate().err());
            }
        }
    }
}

fn collect_expression_list_errors(
    obligations: &[ObligationExpression],
    advice: &[AdviceExpression],
    errors: &mut Vec<ValidationError>,
) {
    for expression in obligations {
        errors.extend(expression.validate().err());
    }
    for expression in advice {
        errors.extend(expression.validate().err());
    }
}
