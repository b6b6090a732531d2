// AnyOf: disjunction of AllOf elements

use crate::context::EvaluationContext;
use crate::target::{AllOf, MatchCode, MatchResult};
use crate::tree::PolicyDefaults;
use crate::validation::ValidationError;

/// `<AnyOf>`: matches when some AllOf matches
#[derive(Debug, Default)]
pub struct AnyOf {
    all_ofs: Vec<AllOf>,
}

impl AnyOf {
    pub fn new(all_ofs: Vec<AllOf>) -> Self {
        Self { all_ofs }
    }

    pub fn with_all_of(mut self, all_of: AllOf) -> Self {
        self.all_ofs.push(all_of);
        self
    }

    pub fn all_ofs(&self) -> &[AllOf] {
        &self.all_ofs
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.all_ofs.is_empty() {
            Err(ValidationError::EmptyAnyOf)
        } else {
            Ok(())
        }
    }

    pub fn evaluate_match(&self, context: &dyn EvaluationContext, defaults: &PolicyDefaults) -> MatchResult {
        if let Err(error) = self.validate() {
            return MatchResult::indeterminate(error.into());
        }
        let mut first_indeterminate = None;
        for all_of in &self.all_ofs {
            let result = all_of.evaluate_match(context, defaults);
            match result.code() {
                MatchCode::Match => return result,
                MatchCode::NoMatch => {}
                MatchCode::Indeterminate => {
                    first_indeterminate.get_or_insert(result);
                }
            }
        }
        first_indeterminate.unwrap_or(MatchResult::NO_MATCH)
    }
}
