//! Concurrent Evaluation Tests
//!
//! One policy tree is shared by many threads, each deciding requests in its
//! own context. These tests verify that:
//! - Decisions are identical to single-threaded evaluation
//! - Repeated evaluation of the same request is idempotent
//! - Lazily resolved references settle on a single cached referencee

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use xacml_pdp_core::identifier::{algorithm, category, datatype, function};
use xacml_pdp_core::{
    AllOf, AnyOf, AttributeAssignmentExpression, AttributeDesignator, AttributeValue, CombiningAlgorithmFactory,
    Decision, Evaluatable, EvaluationContext, IdReferenceMatch, Identifier, Match, ObligationExpression, PdpEngine,
    Policy, PolicyDef, PolicyFinder, PolicyFinderResult, PolicyIdReference, PolicySet, PolicySetChild, Request,
    RootPolicy, Rule, RuleEffect, StdEvaluationContext, StdFunctionDefinitionFactory, StdPolicyFinder, Target,
};

const ROLE: &str = "urn:example:attribute:role";
const THREADS: usize = 8;
const REQUESTS_PER_THREAD: usize = 50;

fn role_target(role: &str) -> Target {
    let designator = AttributeDesignator::new(category::ACCESS_SUBJECT, ROLE, datatype::STRING, false);
    let role_match = Match::new(function::STRING_EQUAL, AttributeValue::string(role), Arc::new(designator));
    Target::empty().with_any_of(AnyOf::new(vec![AllOf::new(vec![role_match])]))
}

fn access_policy() -> Arc<Policy> {
    let algorithm = CombiningAlgorithmFactory::default()
        .rule_combining_algorithm(&Identifier::from(algorithm::RULE_DENY_OVERRIDES))
        .unwrap();
    let roles = AttributeDesignator::new(category::ACCESS_SUBJECT, ROLE, datatype::STRING, false);
    Policy::builder(PolicyDef::new("urn:example:policy:access", "1.0".parse().unwrap()))
        .rule_combining_algorithm(algorithm)
        .rule(Rule::new("urn:example:rule:blocked", RuleEffect::Deny).with_target(role_target("blocked")))
        .rule(
            Rule::new("urn:example:rule:admin", RuleEffect::Permit)
                .with_target(role_target("admin"))
                .with_obligation_expression(
                    ObligationExpression::new("urn:example:obligation:audit", RuleEffect::Permit)
                        .with_assignment(AttributeAssignmentExpression::new(ROLE, Arc::new(roles))),
                ),
        )
        .build()
}

fn request_for(roles: &[&str]) -> Request {
    roles.iter().fold(Request::new(), |request, role| {
        request.with_attribute(category::ACCESS_SUBJECT, ROLE, AttributeValue::string(*role))
    })
}

fn expected_decision(roles: &[&str]) -> Decision {
    if roles.contains(&"blocked") {
        Decision::Deny
    } else if roles.contains(&"admin") {
        Decision::Permit
    } else {
        Decision::NotApplicable
    }
}

const ROLE_SETS: &[&[&str]] = &[&["admin"], &["guest"], &["admin", "blocked"], &[], &["guest", "admin"]];

#[test]
fn test_shared_engine_across_threads() {
    let finder = StdPolicyFinder::new(Some(RootPolicy::Policy(access_policy())));
    let engine = PdpEngine::new(Arc::new(finder));

    thread::scope(|scope| {
        for worker in 0..THREADS {
            let engine = &engine;
            scope.spawn(move || {
                for index in 0..REQUESTS_PER_THREAD {
                    let roles = ROLE_SETS[(worker + index) % ROLE_SETS.len()];
                    let result = engine.decide(request_for(roles));
                    assert_eq!(result.decision(), expected_decision(roles), "roles {:?}", roles);
                }
            });
        }
    });
}

#[test]
fn test_evaluation_is_idempotent() {
    let policy = access_policy();
    let functions = Arc::new(StdFunctionDefinitionFactory::default());
    let finder: Arc<dyn PolicyFinder> = Arc::new(StdPolicyFinder::default());

    for roles in ROLE_SETS {
        let first = StdEvaluationContext::new(request_for(roles), finder.clone(), functions.clone());
        let second = StdEvaluationContext::new(request_for(roles), finder.clone(), functions.clone());
        assert_eq!(policy.evaluate(&first).unwrap(), policy.evaluate(&second).unwrap());
    }

    let admin = StdEvaluationContext::new(request_for(&["admin"]), finder, functions);
    let result = policy.evaluate(&admin).unwrap();
    assert_eq!(result.obligations().len(), 1);
    assert_eq!(result.obligations()[0].attribute_assignments().len(), 1);
}

/// Store wrapper counting Policy lookups
struct CountingFinder {
    inner: StdPolicyFinder,
    lookups: AtomicUsize,
}

impl PolicyFinder for CountingFinder {
    fn get_root_policy_def(&self, context: &dyn EvaluationContext) -> PolicyFinderResult<RootPolicy> {
        self.inner.get_root_policy_def(context)
    }

    fn get_policy(&self, id_reference_match: &IdReferenceMatch) -> PolicyFinderResult<Arc<Policy>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_policy(id_reference_match)
    }

    fn get_policy_set(&self, id_reference_match: &IdReferenceMatch) -> PolicyFinderResult<Arc<PolicySet>> {
        self.inner.get_policy_set(id_reference_match)
    }
}

#[test]
fn test_concurrent_reference_resolution_settles() {
    let algorithm = CombiningAlgorithmFactory::default()
        .policy_combining_algorithm(&Identifier::from(algorithm::POLICY_DENY_OVERRIDES))
        .unwrap();
    let root = PolicySet::builder(PolicyDef::new("urn:example:policyset:root", "1.0".parse().unwrap()))
        .policy_combining_algorithm(algorithm)
        .child(PolicyIdReference::new(IdReferenceMatch::new("urn:example:policy:access")))
        .build();
    let finder = Arc::new(CountingFinder {
        inner: StdPolicyFinder::default().with_policy(access_policy()),
        lookups: AtomicUsize::new(0),
    });
    let functions = Arc::new(StdFunctionDefinitionFactory::default());

    thread::scope(|scope| {
        for _ in 0..THREADS {
            let root = &root;
            let finder = finder.clone();
            let functions = functions.clone();
            scope.spawn(move || {
                let context = StdEvaluationContext::new(request_for(&["admin"]), finder, functions);
                assert_eq!(root.evaluate(&context).unwrap().decision(), Decision::Permit);
            });
        }
    });

    let settled = finder.lookups.load(Ordering::SeqCst);
    assert!((1..=THREADS).contains(&settled));

    // Once cached, no further lookups happen
    let context = StdEvaluationContext::new(request_for(&["guest"]), finder.clone(), functions);
    assert_eq!(root.evaluate(&context).unwrap().decision(), Decision::NotApplicable);
    assert_eq!(finder.lookups.load(Ordering::SeqCst), settled);

    let PolicySetChild::PolicyIdReference(reference) = &root.children()[0] else {
        panic!("expected a PolicyIdReference child");
    };
    assert!(reference.referencee().is_some());
}
