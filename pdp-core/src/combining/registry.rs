// Combining algorithm registry
//
// Loaders resolve RuleCombiningAlgId / PolicyCombiningAlgId through this
// factory. The legacy 1.0 / 1.1 rule overrides identifiers map onto the
// XACML 3.0 implementations; the policy ones use the 1.0 tables.

use crate::combining::{
    CombiningAlgorithm, DenyOverrides, DenyUnlessPermit, FirstApplicable, LegacyDenyOverrides, LegacyPermitOverrides,
    OnlyOneApplicable, PermitOverrides, PermitUnlessDeny,
};
use crate::identifier::{algorithm, Identifier};
use crate::tree::{PolicySetChild, Rule};
use std::collections::HashMap;
use std::sync::Arc;

type RuleAlgorithm = Arc<dyn CombiningAlgorithm<Rule>>;
type PolicyAlgorithm = Arc<dyn CombiningAlgorithm<PolicySetChild>>;

/// Algorithms by identifier, one table per child type
#[derive(Debug, Clone)]
pub struct CombiningAlgorithmFactory {
    rule_algorithms: HashMap<Identifier, RuleAlgorithm>,
    policy_algorithms: HashMap<Identifier, PolicyAlgorithm>,
}

impl CombiningAlgorithmFactory {
    /// Factory with nothing registered
    pub fn empty() -> Self {
        Self {
            rule_algorithms: HashMap::new(),
            policy_algorithms: HashMap::new(),
        }
    }

    pub fn register_rule_algorithm(&mut self, algorithm: RuleAlgorithm) {
        self.rule_algorithms.insert(algorithm.id().clone(), algorithm);
    }

    pub fn register_policy_algorithm(&mut self, algorithm: PolicyAlgorithm) {
        self.policy_algorithms.insert(algorithm.id().clone(), algorithm);
    }

    pub fn rule_combining_algorithm(&self, id: &Identifier) -> Option<RuleAlgorithm> {
        self.rule_algorithms.get(id).cloned()
    }

    pub fn policy_combining_algorithm(&self, id: &Identifier) -> Option<PolicyAlgorithm> {
        self.policy_algorithms.get(id).cloned()
    }
}

impl Default for CombiningAlgorithmFactory {
    /// All standard algorithms
    fn default() -> Self {
        let mut factory = Self::empty();

        for id in [
            algorithm::RULE_DENY_OVERRIDES,
            algorithm::RULE_ORDERED_DENY_OVERRIDES,
            algorithm::LEGACY_RULE_DENY_OVERRIDES,
            algorithm::LEGACY_RULE_ORDERED_DENY_OVERRIDES,
        ] {
            factory.register_rule_algorithm(Arc::new(DenyOverrides::new(id)));
        }
        for id in [
            algorithm::RULE_PERMIT_OVERRIDES,
            algorithm::RULE_ORDERED_PERMIT_OVERRIDES,
            algorithm::LEGACY_RULE_PERMIT_OVERRIDES,
            algorithm::LEGACY_RULE_ORDERED_PERMIT_OVERRIDES,
        ] {
            factory.register_rule_algorithm(Arc::new(PermitOverrides::new(id)));
        }
        factory.register_rule_algorithm(Arc::new(FirstApplicable::new(algorithm::RULE_FIRST_APPLICABLE)));
        factory.register_rule_algorithm(Arc::new(DenyUnlessPermit::new(algorithm::RULE_DENY_UNLESS_PERMIT)));
        factory.register_rule_algorithm(Arc::new(PermitUnlessDeny::new(algorithm::RULE_PERMIT_UNLESS_DENY)));

        for id in [algorithm::POLICY_DENY_OVERRIDES, algorithm::POLICY_ORDERED_DENY_OVERRIDES] {
            factory.register_policy_algorithm(Arc::new(DenyOverrides::new(id)));
        }
        for id in [algorithm::POLICY_PERMIT_OVERRIDES, algorithm::POLICY_ORDERED_PERMIT_OVERRIDES] {
            factory.register_policy_algorithm(Arc::new(PermitOverrides::new(id)));
        }
        for id in [
            algorithm::LEGACY_POLICY_DENY_OVERRIDES,
            algorithm::LEGACY_POLICY_ORDERED_DENY_OVERRIDES,
        ] {
            factory.register_policy_algorithm(Arc::new(LegacyDenyOverrides::new(id)));
        }
        for id in [
            algorithm::LEGACY_POLICY_PERMIT_OVERRIDES,
            algorithm::LEGACY_POLICY_ORDERED_PERMIT_OVERRIDES,
        ] {
            factory.register_policy_algorithm(Arc::new(LegacyPermitOverrides::new(id)));
        }
        factory.register_policy_algorithm(Arc::new(FirstApplicable::new(algorithm::POLICY_FIRST_APPLICABLE)));
        factory.register_policy_algorithm(Arc::new(OnlyOneApplicable::new(algorithm::POLICY_ONLY_ONE_APPLICABLE)));
        factory.register_policy_algorithm(Arc::new(DenyUnlessPermit::new(algorithm::POLICY_DENY_UNLESS_PERMIT)));
        factory.register_policy_algorithm(Arc::new(PermitUnlessDeny::new(algorithm::POLICY_PERMIT_UNLESS_DENY)));

        factory
    }
}
