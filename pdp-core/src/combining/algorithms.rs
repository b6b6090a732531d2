// Standard combining algorithms (XACML 3.0 Appendix C)
//
// Each algorithm is generic over the child type so the same implementation
// serves rule- and policy-combining. Ordered variants share the unordered
// implementation: children are always evaluated in declaration order.
//
// The XACML 1.0 rule-combining overrides tables coincide with the 3.0 ones.
// The 1.0 policy-combining tables do not and have their own implementations.

use crate::combining::{CombinerParameter, CombiningAlgorithm, CombiningElement};
use crate::context::EvaluationContext;
use crate::decision::{Decision, EvaluationResult, IndeterminateKind};
use crate::error::EvaluationError;
use crate::identifier::Identifier;
use crate::status::Status;
use crate::tree::{Evaluatable, Matchable};
use crate::target::MatchCode;

/// Bookkeeping shared by the overrides and unless algorithms
#[derive(Debug, Default)]
struct DecisionAccumulator {
    applicable: Vec<EvaluationResult>,
    first_indeterminate: Option<Status>,
    indeterminate_d: bool,
    indeterminate_p: bool,
    indeterminate_dp: bool,
}

impl DecisionAccumulator {
    fn record(&mut self, result: EvaluationResult) {
        match result.decision() {
            Decision::Permit | Decision::Deny => self.applicable.push(result),
            Decision::NotApplicable => {}
            Decision::Indeterminate => {
                match result.indeterminate_kind() {
                    IndeterminateKind::Deny => self.indeterminate_d = true,
                    IndeterminateKind::Permit => self.indeterminate_p = true,
                    IndeterminateKind::DenyPermit => self.indeterminate_dp = true,
                }
                if self.first_indeterminate.is_none() {
                    self.first_indeterminate = Some(result.status().clone());
                }
            }
        }
    }

    fn saw(&self, decision: Decision) -> bool {
        self.applicable.iter().any(|result| result.decision() == decision)
    }

    /// Permit, Deny or NotApplicable with the obligations and advice of the
    /// children that produced the same decision
    fn decide(self, decision: Decision) -> EvaluationResult {
        let mut combined = match decision {
            Decision::Permit => EvaluationResult::permit(),
            Decision::Deny => EvaluationResult::deny(),
            _ => EvaluationResult::not_applicable(),
        };
        for result in &self.applicable {
            combined.merge_identifiers(result);
        }
        for result in self.applicable {
            if result.decision() == decision {
                let (obligations, advice) = result.into_obligations_and_advice();
                combined.add_obligations(obligations);
                combined.add_advice(advice);
            }
        }
        combined
    }

    fn saw_indeterminate(&self) -> bool {
        self.first_indeterminate.is_some()
    }

    /// Kind covering every Indeterminate child seen so far
    fn indeterminate_kind(&self) -> IndeterminateKind {
        let deny = self.indeterminate_d || self.indeterminate_dp;
        let permit = self.indeterminate_p || self.indeterminate_dp;
        match (deny, permit) {
            (true, false) => IndeterminateKind::Deny,
            (false, true) => IndeterminateKind::Permit,
            _ => IndeterminateKind::DenyPermit,
        }
    }

    fn indeterminate(self, kind: IndeterminateKind) -> EvaluationResult {
        let status = self
            .first_indeterminate
            .clone()
            .unwrap_or_else(|| Status::processing_error("Indeterminate child"));
        let mut combined = EvaluationResult::indeterminate_with_kind(status, kind);
        for result in &self.applicable {
            combined.merge_identifiers(result);
        }
        combined
    }
}

// ============================================================================
// DENY-OVERRIDES / PERMIT-OVERRIDES
// ============================================================================

/// deny-overrides and ordered-deny-overrides
#[derive(Debug, Clone)]
pub struct DenyOverrides {
    id: Identifier,
}

impl DenyOverrides {
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self { id: id.into() }
    }
}

impl<T: Evaluatable> CombiningAlgorithm<T> for DenyOverrides {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn combine(
        &self,
        context: &dyn EvaluationContext,
        elements: &[CombiningElement<'_, T>],
        _parameters: &[CombinerParameter],
    ) -> Result<EvaluationResult, EvaluationError> {
        let mut accumulator = DecisionAccumulator::default();
        for element in elements {
            let result = element.evaluate(context)?;
            let decision = result.decision();
            accumulator.record(result);
            if decision == Decision::Deny {
                return Ok(accumulator.decide(Decision::Deny));
            }
        }
        let permit = accumulator.saw(Decision::Permit);
        let combined = if accumulator.indeterminate_dp
            || (accumulator.indeterminate_d && (accumulator.indeterminate_p || permit))
        {
            accumulator.indeterminate(IndeterminateKind::DenyPermit)
        } else if accumulator.indeterminate_d {
            accumulator.indeterminate(IndeterminateKind::Deny)
        } else if permit {
            accumulator.decide(Decision::Permit)
        } else if accumulator.indeterminate_p {
            accumulator.indeterminate(IndeterminateKind::Permit)
        } else {
            accumulator.decide(Decision::NotApplicable)
        };
        Ok(combined)
    }
}

/// permit-overrides and ordered-permit-overrides
#[derive(Debug, Clone)]
pub struct PermitOverrides {
    id: Identifier,
}

impl PermitOverrides {
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self { id: id.into() }
    }
}

impl<T: Evaluatable> CombiningAlgorithm<T> for PermitOverrides {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn combine(
        &self,
        context: &dyn EvaluationContext,
        elements: &[CombiningElement<'_, T>],
        _parameters: &[CombinerParameter],
    ) -> Result<EvaluationResult, EvaluationError> {
        let mut accumulator = DecisionAccumulator::default();
        for element in elements {
            let result = element.evaluate(context)?;
            let decision = result.decision();
            accumulator.record(result);
            if decision == Decision::Permit {
                return Ok(accumulator.decide(Decision::Permit));
            }
        }
        let deny = accumulator.saw(Decision::Deny);
        let combined = if accumulator.indeterminate_dp
            || (accumulator.indeterminate_p && (accumulator.indeterminate_d || deny))
        {
            accumulator.indeterminate(IndeterminateKind::DenyPermit)
        } else if accumulator.indeterminate_p {
            accumulator.indeterminate(IndeterminateKind::Permit)
        } else if deny {
            accumulator.decide(Decision::Deny)
        } else if accumulator.indeterminate_d {
            accumulator.indeterminate(IndeterminateKind::Deny)
        } else {
            accumulator.decide(Decision::NotApplicable)
        };
        Ok(combined)
    }
}

// ============================================================================
// LEGACY (XACML 1.0 / 1.1) POLICY-COMBINING OVERRIDES
// ============================================================================

/// 1.0 policy deny-overrides: an Indeterminate child is treated as Deny
#[derive(Debug, Clone)]
pub struct LegacyDenyOverrides {
    id: Identifier,
}

impl LegacyDenyOverrides {
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self { id: id.into() }
    }
}

impl<T: Evaluatable> CombiningAlgorithm<T> for LegacyDenyOverrides {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn combine(
        &self,
        context: &dyn EvaluationContext,
        elements: &[CombiningElement<'_, T>],
        _parameters: &[CombinerParameter],
    ) -> Result<EvaluationResult, EvaluationError> {
        let mut accumulator = DecisionAccumulator::default();
        for element in elements {
            let result = element.evaluate(context)?;
            let decision = result.decision();
            accumulator.record(result);
            if matches!(decision, Decision::Deny | Decision::Indeterminate) {
                return Ok(accumulator.decide(Decision::Deny));
            }
        }
        let decision = if accumulator.saw(Decision::Permit) {
            Decision::Permit
        } else {
            Decision::NotApplicable
        };
        Ok(accumulator.decide(decision))
    }
}

/// 1.0 policy permit-overrides: Deny wins over Indeterminate children
#[derive(Debug, Clone)]
pub struct LegacyPermitOverrides {
    id: Identifier,
}

impl LegacyPermitOverrides {
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self { id: id.into() }
    }
}

impl<T: Evaluatable> CombiningAlgorithm<T> for LegacyPermitOverrides {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn combine(
        &self,
        context: &dyn EvaluationContext,
        elements: &[CombiningElement<'_, T>],
        _parameters: &[CombinerParameter],
    ) -> Result<EvaluationResult, EvaluationError> {
        let mut accumulator = DecisionAccumulator::default();
        for element in elements {
            let result = element.evaluate(context)?;
            let decision = result.decision();
            accumulator.record(result);
            if decision == Decision::Permit {
                return Ok(accumulator.decide(Decision::Permit));
            }
        }
        let combined = if accumulator.saw(Decision::Deny) {
            accumulator.decide(Decision::Deny)
        } else if accumulator.saw_indeterminate() {
            let kind = accumulator.indeterminate_kind();
            accumulator.indeterminate(kind)
        } else {
            accumulator.decide(Decision::NotApplicable)
        };
        Ok(combined)
    }
}

// ============================================================================
// FIRST-APPLICABLE / ONLY-ONE-APPLICABLE
// ============================================================================

/// first-applicable: the first child that is not NotApplicable decides
#[derive(Debug, Clone)]
pub struct FirstApplicable {
    id: Identifier,
}

impl FirstApplicable {
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self { id: id.into() }
    }
}

impl<T: Evaluatable> CombiningAlgorithm<T> for FirstApplicable {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn combine(
        &self,
        context: &dyn EvaluationContext,
        elements: &[CombiningElement<'_, T>],
        _parameters: &[CombinerParameter],
    ) -> Result<EvaluationResult, EvaluationError> {
        for element in elements {
            let result = element.evaluate(context)?;
            if result.decision() != Decision::NotApplicable {
                return Ok(result);
            }
        }
        Ok(EvaluationResult::not_applicable())
    }
}

/// Status message when more than one child's Target matches
pub const MULTIPLE_APPLICABLE_MESSAGE: &str = "More than one applicable policy for only-one-applicable";

/// only-one-applicable: exactly one child may match; it alone is evaluated
#[derive(Debug, Clone)]
pub struct OnlyOneApplicable {
    id: Identifier,
}

impl OnlyOneApplicable {
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self { id: id.into() }
    }
}

impl<T: Evaluatable + Matchable> CombiningAlgorithm<T> for OnlyOneApplicable {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn combine(
        &self,
        context: &dyn EvaluationContext,
        elements: &[CombiningElement<'_, T>],
        _parameters: &[CombinerParameter],
    ) -> Result<EvaluationResult, EvaluationError> {
        let mut selected = None;
        for element in elements {
            let applicability = element.element().evaluate_match(context);
            match applicability.code() {
                MatchCode::NoMatch => {}
                MatchCode::Indeterminate => {
                    return Ok(EvaluationResult::indeterminate(applicability.status().clone()));
                }
                MatchCode::Match if selected.is_some() => {
                    return Ok(EvaluationResult::indeterminate(Status::processing_error(
                        MULTIPLE_APPLICABLE_MESSAGE,
                    )));
                }
                MatchCode::Match => selected = Some(element),
            }
        }
        match selected {
            Some(element) => element.evaluate(context),
            None => Ok(EvaluationResult::not_applicable()),
        }
    }
}

// ============================================================================
// DENY-UNLESS-PERMIT / PERMIT-UNLESS-DENY
// ============================================================================

/// deny-unless-permit: Permit if any child permits, otherwise Deny
#[derive(Debug, Clone)]
pub struct DenyUnlessPermit {
    id: Identifier,
}

impl DenyUnlessPermit {
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self { id: id.into() }
    }
}

impl<T: Evaluatable> CombiningAlgorithm<T> for DenyUnlessPermit {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn combine(
        &self,
        context: &dyn EvaluationContext,
        elements: &[CombiningElement<'_, T>],
        _parameters: &[CombinerParameter],
    ) -> Result<EvaluationResult, EvaluationError> {
        let mut accumulator = DecisionAccumulator::default();
        for element in elements {
            let result = element.evaluate(context)?;
            let decision = result.decision();
            accumulator.record(result);
            if decision == Decision::Permit {
                return Ok(accumulator.decide(Decision::Permit));
            }
        }
        Ok(accumulator.decide(Decision::Deny))
    }
}

/// permit-unless-deny: Deny if any child denies, otherwise Permit
#[derive(Debug, Clone)]
pub struct PermitUnlessDeny {
    id: Identifier,
}

impl PermitUnlessDeny {
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self { id: id.into() }
    }
}

impl<T: Evaluatable> CombiningAlgorithm<T> for PermitUnlessDeny {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn combine(
        &self,
        context: &dyn EvaluationContext,
        elements: &[CombiningElement<'_, T>],
        _parameters: &[CombinerParameter],
    ) -> Result<EvaluationResult, EvaluationError> {
        let mut accumulator = DecisionAccumulator::default();
        for element in elements {
            let result = element.evaluate(context)?;
            let decision = result.decision();
            accumulator.record(result);
            if decision == Decision::Deny {
                return Ok(accumulator.decide(Decision::Deny));
            }
        }
        Ok(accumulator.decide(Decision::Permit))
    }
}
