// AllOf: conjunction of Match elements

use crate::context::EvaluationContext;
use crate::target::{Match, MatchCode, MatchResult};
use crate::tree::PolicyDefaults;
use crate::validation::ValidationError;

/// `<AllOf>`: matches when every Match matches
#[derive(Debug, Default)]
pub struct AllOf {
    matches: Vec<Match>,
}

impl AllOf {
    pub fn new(matches: Vec<Match>) -> Self {
        Self { matches }
    }

    pub fn with_match(mut self, attribute_match: Match) -> Self {
        self.matches.push(attribute_match);
        self
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.matches.is_empty() {
            Err(ValidationError::EmptyAllOf)
        } else {
            Ok(())
        }
    }

    pub fn evaluate_match(&self, context: &dyn EvaluationContext, defaults: &PolicyDefaults) -> MatchResult {
        if let Err(error) = self.validate() {
            return MatchResult::indeterminate(error.into());
        }
        let mut first_indeterminate = None;
        for attribute_match in &self.matches {
            let result = attribute_match.evaluate_match(context, defaults);
            match result.code() {
                MatchCode::NoMatch => return result,
                MatchCode::Match => {}
                MatchCode::Indeterminate => {
                    first_indeterminate.get_or_insert(result);
                }
            }
        }
        first_indeterminate.unwrap_or(MatchResult::MATCH)
    }
}
