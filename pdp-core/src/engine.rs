// PDP engine
//
// Thin façade over the evaluation tree: one StdEvaluationContext per
// request, root policy lookup through the context's finder, and degradation of hard
// faults to Indeterminate so callers always receive a well-formed result.

use crate::config::PdpConfig;
use crate::context::{EvaluationContext, StdEvaluationContext};
use crate::decision::EvaluationResult;
use crate::finder::{PolicyFinder, RootPolicy};
use crate::function::{FunctionDefinitionFactory, StdFunctionDefinitionFactory};
use crate::request::Request;
use crate::status::Status;
use crate::tree::Evaluatable;
use std::sync::Arc;

/// Decides requests against the finder's root policy
pub struct PdpEngine {
    finder: Arc<dyn PolicyFinder>,
    functions: Arc<dyn FunctionDefinitionFactory>,
    config: PdpConfig,
}

impl PdpEngine {
    /// Engine with the standard function library and default config
    pub fn new(finder: Arc<dyn PolicyFinder>) -> Self {
        Self {
            finder,
            functions: Arc::new(StdFunctionDefinitionFactory::default()),
            config: PdpConfig::default(),
        }
    }

    pub fn with_functions(mut self, functions: Arc<dyn FunctionDefinitionFactory>) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_config(mut self, config: PdpConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PdpConfig {
        &self.config
    }

    /// Fresh context for one request
    pub fn context_for(&self, request: Request) -> StdEvaluationContext {
        StdEvaluationContext::new(request, Arc::clone(&self.finder), Arc::clone(&self.functions))
            .with_tracing(self.config.trace_enabled)
            .with_max_reference_depth(self.config.max_reference_depth)
    }

    /// Evaluate `request` in a new context
    pub fn decide(&self, request: Request) -> EvaluationResult {
        let context = self.context_for(request);
        let result = self.decide_in(&context);
        tracing::debug!(
            request_id = %context.request_id(),
            decision = %result.decision(),
            status = %result.status(),
            "request decided"
        );
        result
    }

    /// Evaluate the root policy in an existing context
    ///
    /// The root comes from the context's finder, the same one its references
    /// resolve through. Never fails: a missing root or a hard evaluation fault yields
    /// Indeterminate with a processing-error status.
    pub fn decide_in(&self, context: &dyn EvaluationContext) -> EvaluationResult {
        let found = context.get_root_policy_def();
        let status = found.status().clone();
        let Some(root) = found.into_policy_def() else {
            let status = if status.is_ok() {
                Status::processing_error("No root policy found")
            } else {
                status
            };
            return EvaluationResult::indeterminate(status);
        };

        let outcome = match &root {
            RootPolicy::Policy(policy) => policy.evaluate(context),
            RootPolicy::PolicySet(policy_set) => policy_set.evaluate(context),
        };
        match outcome {
            Ok(result) => result,
            Err(error) => {
                tracing::error!(error = %error, "policy evaluation aborted");
                EvaluationResult::indeterminate(Status::processing_error(error.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Decision;
    use crate::finder::StdPolicyFinder;
    use crate::status::StatusCode;

    #[test]
    fn test_missing_root_is_indeterminate() {
        let engine = PdpEngine::new(Arc::new(StdPolicyFinder::default()));
        let result = engine.decide(Request::new());
        assert_eq!(result.decision(), Decision::Indeterminate);
        assert_eq!(result.status().code(), StatusCode::ProcessingError);
        assert_eq!(result.status().message(), Some("No root policy found"));
    }

    #[test]
    fn test_context_follows_config() {
        let config = PdpConfig {
            trace_enabled: true,
            max_reference_depth: 3,
        };
        let engine = PdpEngine::new(Arc::new(StdPolicyFinder::default())).with_config(config);
        assert!(engine.context_for(Request::new()).is_tracing());
    }

    #[test]
    fn test_decide_in_uses_the_contexts_finder() {
        use crate::combining::DenyOverrides;
        use crate::decision::RuleEffect;
        use crate::identifier::algorithm;
        use crate::tree::{Policy, PolicyDef, Rule};

        let policy = Policy::builder(PolicyDef::new("urn:example:policy", "1.0".parse().unwrap()))
            .rule_combining_algorithm(Arc::new(DenyOverrides::new(algorithm::RULE_DENY_OVERRIDES)))
            .rule(Rule::new("urn:example:rule", RuleEffect::Permit))
            .build();
        let populated = Arc::new(StdPolicyFinder::new(Some(RootPolicy::Policy(policy))));
        let engine = PdpEngine::new(Arc::new(StdPolicyFinder::default()));
        let context = StdEvaluationContext::new(
            Request::new(),
            populated,
            Arc::new(StdFunctionDefinitionFactory::default()),
        );

        assert_eq!(engine.decide_in(&context).decision(), Decision::Permit);
        assert_eq!(engine.decide(Request::new()).decision(), Decision::Indeterminate);
    }
}
