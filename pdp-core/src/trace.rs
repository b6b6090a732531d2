//! Evaluation tracing
//!
//! Tree nodes implement [`Traceable`] so that an audit chain can be built from
//! a leaf Rule up through its owning Policy and PolicySets. When the context
//! reports `is_tracing()`, nodes emit a [`TraceEvent`] at each decision point.

use crate::condition::ConditionResult;
use crate::decision::EvaluationResult;
use crate::target::MatchResult;
use std::sync::Arc;

/// A node that can identify itself and its parent in a trace
pub trait Traceable: Send + Sync {
    fn trace_id(&self) -> String;

    fn cause(&self) -> Option<Arc<dyn Traceable>>;
}

/// Value recorded by a trace event
#[derive(Debug, Clone, PartialEq)]
pub enum TraceValue {
    Match(MatchResult),
    Condition(ConditionResult),
    Result(EvaluationResult),
}

/// One recorded evaluation step
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEvent {
    message: String,
    source: String,
    cause_chain: Vec<String>,
    value: TraceValue,
}

impl TraceEvent {
    /// Build an event, walking `source`'s cause links up to the root
    pub fn new(message: impl Into<String>, source: &dyn Traceable, value: TraceValue) -> Self {
        let mut cause_chain = Vec::new();
        let mut next = source.cause();
        while let Some(cause) = next {
            cause_chain.push(cause.trace_id());
            next = cause.cause();
        }
        Self {
            message: message.into(),
            source: source.trace_id(),
            cause_chain,
            value,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Trace ids of the ancestors, nearest first
    pub fn cause_chain(&self) -> &[String] {
        &self.cause_chain
    }

    pub fn value(&self) -> &TraceValue {
        &self.value
    }
}
