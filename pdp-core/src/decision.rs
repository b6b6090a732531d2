//! Decisions and evaluation results
//!
//! `Decision` is produced only by Rule, Policy and PolicySet evaluation. The
//! accompanying [`EvaluationResult`] carries the status, the obligations and
//! advice (kept only for Permit/Deny), the XACML 3.0 extended Indeterminate
//! kind, and the identifiers of the applicable policies.

use crate::obligation::{Advice, Obligation};
use crate::status::Status;
use crate::version::IdReference;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authorization decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Permit,
    Deny,
    NotApplicable,
    Indeterminate,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Decision::Permit => "Permit",
            Decision::Deny => "Deny",
            Decision::NotApplicable => "NotApplicable",
            Decision::Indeterminate => "Indeterminate",
        };
        f.write_str(label)
    }
}

/// Rule effect, each variant carrying its Decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleEffect {
    Permit,
    Deny,
}

impl RuleEffect {
    pub const fn decision(self) -> Decision {
        match self {
            RuleEffect::Permit => Decision::Permit,
            RuleEffect::Deny => Decision::Deny,
        }
    }

    pub const fn indeterminate_kind(self) -> IndeterminateKind {
        match self {
            RuleEffect::Permit => IndeterminateKind::Permit,
            RuleEffect::Deny => IndeterminateKind::Deny,
        }
    }
}

/// Which decision an Indeterminate result could have produced
///
/// Combining algorithms use this to apply the XACML 3.0 precedence tables.
/// It has no meaning unless the decision is Indeterminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IndeterminateKind {
    Deny,
    Permit,
    #[default]
    DenyPermit,
}

/// Result of evaluating a Rule, Policy or PolicySet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    decision: Decision,
    status: Status,

    #[serde(default)]
    indeterminate_kind: IndeterminateKind,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    obligations: Vec<Obligation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    advice: Vec<Advice>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    policy_identifiers: Vec<IdReference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    policy_set_identifiers: Vec<IdReference>,
}

impl EvaluationResult {
    fn bare(decision: Decision, status: Status) -> Self {
        Self {
            decision,
            status,
            indeterminate_kind: IndeterminateKind::DenyPermit,
            obligations: Vec::new(),
            advice: Vec::new(),
            policy_identifiers: Vec::new(),
            policy_set_identifiers: Vec::new(),
        }
    }

    pub fn permit() -> Self {
        Self::bare(Decision::Permit, Status::OK)
    }

    pub fn deny() -> Self {
        Self::bare(Decision::Deny, Status::OK)
    }

    pub fn not_applicable() -> Self {
        Self::bare(Decision::NotApplicable, Status::OK)
    }

    /// Indeterminate{DP} with the given status
    pub fn indeterminate(status: Status) -> Self {
        Self::bare(Decision::Indeterminate, status)
    }

    pub fn indeterminate_with_kind(status: Status, kind: IndeterminateKind) -> Self {
        let mut result = Self::bare(Decision::Indeterminate, status);
        result.indeterminate_kind = kind;
        result
    }

    /// Permit/Deny result carrying obligations and advice
    ///
    /// Obligations and advice are dropped if `decision` is neither Permit nor
    /// Deny.
    pub fn with_effect(decision: Decision, obligations: Vec<Obligation>, advice: Vec<Advice>) -> Self {
        let mut result = Self::bare(decision, Status::OK);
        result.add_obligations(obligations);
        result.add_advice(advice);
        result
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn indeterminate_kind(&self) -> IndeterminateKind {
        self.indeterminate_kind
    }

    pub fn obligations(&self) -> &[Obligation] {
        &self.obligations
    }

    pub fn advice(&self) -> &[Advice] {
        &self.advice
    }

    pub fn policy_identifiers(&self) -> &[IdReference] {
        &self.policy_identifiers
    }

    pub fn policy_set_identifiers(&self) -> &[IdReference] {
        &self.policy_set_identifiers
    }

    /// True for Permit and Deny
    pub fn is_applicable(&self) -> bool {
        matches!(self.decision, Decision::Permit | Decision::Deny)
    }

    pub fn add_obligations(&mut self, obligations: impl IntoIterator<Item = Obligation>) {
        if self.is_applicable() {
            self.obligations.extend(obligations);
        }
    }

    pub fn add_advice(&mut self, advice: impl IntoIterator<Item = Advice>) {
        if self.is_applicable() {
            self.advice.extend(advice);
        }
    }

    pub fn add_policy_identifier(&mut self, reference: IdReference) {
        if !self.policy_identifiers.contains(&reference) {
            self.policy_identifiers.push(reference);
        }
    }

    pub fn add_policy_set_identifier(&mut self, reference: IdReference) {
        if !self.policy_set_identifiers.contains(&reference) {
            self.policy_set_identifiers.push(reference);
        }
    }

    /// Copy the applicable-policy identifiers of `other` into this result
    pub fn merge_identifiers(&mut self, other: &EvaluationResult) {
        for reference in &other.policy_identifiers {
            self.add_policy_identifier(reference.clone());
        }
        for reference in &other.policy_set_identifiers {
            self.add_policy_set_identifier(reference.clone());
        }
    }

    /// Split into obligations and advice, discarding the rest
    pub fn into_obligations_and_advice(self) -> (Vec<Obligation>, Vec<Advice>) {
        (self.obligations, self.advice)
    }
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.decision, self.status)
    }
}
