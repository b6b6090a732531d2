// Fields shared by Policy and PolicySet

use crate::combining::CombinerParameter;
use crate::context::EvaluationContext;
use crate::decision::EvaluationResult;
use crate::error::EvaluationError;
use crate::identifier::Identifier;
use crate::obligation::{AdviceExpression, ObligationExpression};
use crate::status::Status;
use crate::target::{MatchResult, Target};
use crate::tree::{ChildCommon, PolicyDefaults};
use crate::validation::{ValidationCache, ValidationError};
use crate::version::{IdReference, Version};
use std::sync::{Arc, OnceLock};

/// Identifier, version, Target and obligation/advice lists of a Policy or PolicySet
///
/// The [`IdReference`] is built lazily from identifier and version and is
/// rebuilt after either changes.
#[derive(Debug, Default)]
pub struct PolicyDef {
    common: ChildCommon,
    description: Option<String>,
    issuer: Option<String>,
    target: Option<Target>,
    combiner_parameters: Vec<CombinerParameter>,
    obligation_expressions: Vec<ObligationExpression>,
    advice_expressions: Vec<AdviceExpression>,
    version: Option<Version>,
    id_reference: OnceLock<IdReference>,
    validation: ValidationCache,
}

impl PolicyDef {
    /// Definition with an empty Target
    pub fn new(identifier: impl Into<Identifier>, version: Version) -> Self {
        Self {
            common: ChildCommon::new(Some(identifier.into())),
            target: Some(Target::empty()),
            version: Some(version),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self.validation.reset();
        self
    }

    /// Drop the Target; such a definition fails validation
    pub fn without_target(mut self) -> Self {
        self.target = None;
        self.validation.reset();
        self
    }

    pub fn with_defaults(mut self, defaults: Arc<PolicyDefaults>) -> Self {
        self.common.set_defaults(defaults);
        self
    }

    pub fn with_combiner_parameter(mut self, parameter: CombinerParameter) -> Self {
        self.combiner_parameters.push(parameter);
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

    pub fn set_identifier(&mut self, identifier: impl Into<Identifier>) {
        self.common.set_identifier(identifier.into());
        self.id_reference.take();
        self.validation.reset();
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = Some(version);
        self.id_reference.take();
        self.validation.reset();
    }

    pub fn common(&self) -> &ChildCommon {
        &self.common
    }

    pub fn identifier(&self) -> Option<&Identifier> {
        self.common.identifier()
    }

    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn defaults(&self) -> &Arc<PolicyDefaults> {
        self.common.defaults()
    }

    pub fn combiner_parameters(&self) -> &[CombinerParameter] {
        &self.combiner_parameters
    }

    pub fn obligation_expressions(&self) -> &[ObligationExpression] {
        &self.obligation_expressions
    }

    pub fn advice_expressions(&self) -> &[AdviceExpression] {
        &self.advice_expressions
    }

    /// Identifier plus version, `None` while the identifier is unset
    pub fn id_reference(&self) -> Option<&IdReference> {
        if let Some(reference) = self.id_reference.get() {
            return Some(reference);
        }
        let identifier = self.identifier()?;
        Some(
            self.id_reference
                .get_or_init(|| IdReference::new(identifier.clone(), self.version.clone())),
        )
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.identifier().is_none() {
            return Err(ValidationError::MissingPolicyIdentifier);
        }
        if self.version.is_none() {
            return Err(ValidationError::MissingVersion);
        }
        if self.target.is_none() {
            return Err(ValidationError::MissingTarget);
        }
        Ok(())
    }

    /// Memoized [`validate`](Self::validate) followed by the owner's own checks
    pub(crate) fn check_valid<F>(&self, owner_checks: F) -> Result<(), Status>
    where
        F: FnOnce() -> Result<(), ValidationError>,
    {
        self.validation.check(|| {
            self.validate()?;
            owner_checks()
        })
    }

    pub fn match_target(&self, context: &dyn EvaluationContext) -> MatchResult {
        match &self.target {
            Some(target) => target.evaluate_match(context, self.defaults()),
            None => MatchResult::indeterminate(ValidationError::MissingTarget.into()),
        }
    }

    /// Add this node's obligations and advice for the combined decision
    pub(crate) fn attach_obligations_and_advice(
        &self,
        context: &dyn EvaluationContext,
        mut result: EvaluationResult,
    ) -> Result<EvaluationResult, EvaluationError> {
        if !result.is_applicable() {
            return Ok(result);
        }
        let decision = Some(result.decision());
        let defaults = self.defaults();
        let obligations =
            ObligationExpression::evaluate_all(context, defaults, decision, &self.obligation_expressions)?;
        let advice = AdviceExpression::evaluate_all(context, defaults, decision, &self.advice_expressions)?;
        result.add_obligations(obligations);
        result.add_advice(advice);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(text: &str) -> Version {
        text.parse().unwrap()
    }

    #[test]
    fn test_id_reference_rebuilt_after_version_change() {
        let mut def = PolicyDef::new("urn:example:policy", version("1.0"));
        assert_eq!(def.id_reference().unwrap().to_string(), "urn:example:policy:1.0");

        def.set_version(version("2.1"));
        assert_eq!(def.id_reference().unwrap().to_string(), "urn:example:policy:2.1");

        def.set_identifier("urn:example:renamed");
        assert_eq!(def.id_reference().unwrap().id(), &Identifier::from("urn:example:renamed"));
    }

    #[test]
    fn test_validation_requires_identifier_version_and_target() {
        assert_eq!(
            PolicyDef::default().validate(),
            Err(ValidationError::MissingPolicyIdentifier)
        );
        let mut def = PolicyDef::default();
        def.set_identifier("urn:example:policy");
        assert_eq!(def.validate(), Err(ValidationError::MissingVersion));

        let def = PolicyDef::new("urn:example:policy", version("1")).without_target();
        assert_eq!(def.validate(), Err(ValidationError::MissingTarget));

        assert!(PolicyDef::new("urn:example:policy", version("1")).validate().is_ok());
    }

    #[test]
    fn test_unidentified_def_has_no_id_reference() {
        assert!(PolicyDef::default().id_reference().is_none());
    }
}
