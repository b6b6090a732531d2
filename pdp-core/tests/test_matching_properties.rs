//! Matching Property Tests
//!
//! Property-based checks of the tri-state matching laws:
//! - AllOf stops at the first NoMatch and otherwise defers Indeterminate
//! - AnyOf stops at the first Match and otherwise defers Indeterminate
//! - Target stops at the first non-Match child
//! - A bag Match holds iff some value matches, regardless of order

use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use xacml_pdp_core::identifier::function;
use xacml_pdp_core::{
    AllOf, AnyOf, AttributeRetrieval, AttributeValue, Bag, EvaluationContext, Expression, ExpressionResult, Match,
    MatchCode, MatchResult, PolicyDefaults, Request, Status, StdEvaluationContext, StdFunctionDefinitionFactory,
    StdPolicyFinder, Target,
};

/// Retrieval returning a fixed result and counting calls
#[derive(Debug)]
struct ScriptedRetrieval {
    result: ExpressionResult,
    calls: AtomicUsize,
}

impl ScriptedRetrieval {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Expression for ScriptedRetrieval {
    fn evaluate(&self, _context: &dyn EvaluationContext, _defaults: &PolicyDefaults) -> ExpressionResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

impl AttributeRetrieval for ScriptedRetrieval {
    fn must_be_present(&self) -> bool {
        false
    }
}

fn context() -> StdEvaluationContext {
    StdEvaluationContext::new(
        Request::new(),
        Arc::new(StdPolicyFinder::default()),
        Arc::new(StdFunctionDefinitionFactory::default()),
    )
}

fn failure_message(index: usize) -> String {
    format!("scripted failure {}", index)
}

fn match_over(result: ExpressionResult) -> (Match, Arc<ScriptedRetrieval>) {
    let retrieval = Arc::new(ScriptedRetrieval {
        result,
        calls: AtomicUsize::new(0),
    });
    let node = Match::new(function::STRING_EQUAL, AttributeValue::string("x"), retrieval.clone());
    (node, retrieval)
}

/// Match child producing `code`; Indeterminate carries the child's index
fn scripted(code: MatchCode, index: usize) -> (Match, Arc<ScriptedRetrieval>) {
    let result = match code {
        MatchCode::Match => ExpressionResult::ok_bag(vec![AttributeValue::string("x")].into()),
        MatchCode::NoMatch => ExpressionResult::ok_bag(vec![AttributeValue::string("y")].into()),
        MatchCode::Indeterminate => ExpressionResult::error(Status::processing_error(failure_message(index))),
    };
    match_over(result)
}

fn match_code() -> impl Strategy<Value = MatchCode> {
    prop_oneof![
        Just(MatchCode::Match),
        Just(MatchCode::NoMatch),
        Just(MatchCode::Indeterminate),
    ]
}

/// Expected result for a short-circuit on `stop_at`, deferring Indeterminate
fn deferring_model(codes: &[MatchCode], stop_at: MatchCode, otherwise: MatchCode) -> (MatchCode, Option<usize>, usize) {
    if let Some(index) = codes.iter().position(|code| *code == stop_at) {
        return (stop_at, None, index + 1);
    }
    match codes.iter().position(|code| *code == MatchCode::Indeterminate) {
        Some(index) => (MatchCode::Indeterminate, Some(index), codes.len()),
        None => (otherwise, None, codes.len()),
    }
}

fn check_result(
    result: &MatchResult,
    probes: &[Arc<ScriptedRetrieval>],
    expected: (MatchCode, Option<usize>, usize),
) -> Result<(), TestCaseError> {
    let (code, failing_index, evaluated) = expected;
    prop_assert_eq!(result.code(), code);
    if let Some(index) = failing_index {
        let message = failure_message(index);
        prop_assert_eq!(result.status().message(), Some(message.as_str()));
    }
    for (index, probe) in probes.iter().enumerate() {
        let expected_calls = if index < evaluated { 1 } else { 0 };
        prop_assert_eq!(probe.calls(), expected_calls, "child {}", index);
    }
    Ok(())
}

#[derive(Debug, Clone)]
enum BagItem {
    Text(&'static str),
    Number(i64),
}

fn bag_item() -> impl Strategy<Value = BagItem> {
    prop_oneof![
        Just(BagItem::Text("x")),
        Just(BagItem::Text("y")),
        Just(BagItem::Text("z")),
        (0i64..100).prop_map(BagItem::Number),
    ]
}

fn to_bag(items: &[BagItem]) -> Bag {
    items
        .iter()
        .map(|item| match item {
            BagItem::Text(text) => AttributeValue::string(*text),
            BagItem::Number(number) => AttributeValue::integer(*number),
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: AllOf returns the first NoMatch, else the first Indeterminate, else Match
    #[test]
    fn prop_all_of_short_circuits_on_no_match(codes in prop::collection::vec(match_code(), 1..8)) {
        let (matches, probes): (Vec<_>, Vec<_>) =
            codes.iter().enumerate().map(|(index, code)| scripted(*code, index)).unzip();
        let result = AllOf::new(matches).evaluate_match(&context(), &PolicyDefaults::default());

        check_result(&result, &probes, deferring_model(&codes, MatchCode::NoMatch, MatchCode::Match))?;
    }

    /// Property: AnyOf returns the first Match, else the first Indeterminate, else NoMatch
    #[test]
    fn prop_any_of_short_circuits_on_match(codes in prop::collection::vec(match_code(), 1..8)) {
        let (all_ofs, probes): (Vec<_>, Vec<_>) = codes
            .iter()
            .enumerate()
            .map(|(index, code)| {
                let (node, probe) = scripted(*code, index);
                (AllOf::new(vec![node]), probe)
            })
            .unzip();
        let result = AnyOf::new(all_ofs).evaluate_match(&context(), &PolicyDefaults::default());

        check_result(&result, &probes, deferring_model(&codes, MatchCode::Match, MatchCode::NoMatch))?;
    }

    /// Property: Target returns its first non-Match child unchanged
    #[test]
    fn prop_target_returns_first_non_match(codes in prop::collection::vec(match_code(), 0..8)) {
        let (any_ofs, probes): (Vec<_>, Vec<_>) = codes
            .iter()
            .enumerate()
            .map(|(index, code)| {
                let (node, probe) = scripted(*code, index);
                (AnyOf::new(vec![AllOf::new(vec![node])]), probe)
            })
            .unzip();
        let result = Target::new(any_ofs).evaluate_match(&context(), &PolicyDefaults::default());

        let expected = match codes.iter().position(|code| *code != MatchCode::Match) {
            Some(index) if codes[index] == MatchCode::Indeterminate => (MatchCode::Indeterminate, Some(index), index + 1),
            Some(index) => (MatchCode::NoMatch, None, index + 1),
            None => (MatchCode::Match, None, codes.len()),
        };
        check_result(&result, &probes, expected)?;
    }

    /// Property: a bag matches iff some value matches, independent of order
    #[test]
    fn prop_bag_match_is_existential(items in prop::collection::vec(bag_item(), 0..10)) {
        let matches_x = items.iter().any(|item| matches!(item, BagItem::Text("x")));
        let has_mistyped = items.iter().any(|item| matches!(item, BagItem::Number(_)));
        let expected = if matches_x {
            MatchCode::Match
        } else if has_mistyped {
            MatchCode::Indeterminate
        } else {
            MatchCode::NoMatch
        };

        let (forward, _) = match_over(ExpressionResult::ok_bag(to_bag(&items)));
        let reversed_items: Vec<BagItem> = items.iter().rev().cloned().collect();
        let (backward, _) = match_over(ExpressionResult::ok_bag(to_bag(&reversed_items)));
        let context = context();
        let defaults = PolicyDefaults::default();

        prop_assert_eq!(forward.evaluate_match(&context, &defaults).code(), expected);
        prop_assert_eq!(backward.evaluate_match(&context, &defaults).code(), expected);
    }
}

#[test]
fn test_empty_target_matches_without_evaluation() {
    assert_eq!(
        Target::empty().evaluate_match(&context(), &PolicyDefaults::default()),
        MatchResult::MATCH
    );
}

#[test]
fn test_empty_bag_is_no_match() {
    let (node, probe) = match_over(ExpressionResult::empty_bag());
    let result = node.evaluate_match(&context(), &PolicyDefaults::default());

    assert_eq!(result.code(), MatchCode::NoMatch);
    assert_eq!(probe.calls(), 1);
}
