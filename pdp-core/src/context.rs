//! Evaluation context
//!
//! One [`EvaluationContext`] is built per decision request. It gives tree nodes
//! access to the request attributes, the function library, the policy finder
//! and the trace sink. The policy tree itself is shared across requests; all
//! per-request mutable state lives here.

use crate::finder::{PolicyFinder, PolicyFinderResult, RootPolicy};
use crate::function::FunctionDefinitionFactory;
use crate::request::{AttributeQuery, Request};
use crate::status::Status;
use crate::trace::TraceEvent;
use crate::tree::{Policy, PolicySet};
use crate::value::Bag;
use crate::version::IdReferenceMatch;
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

/// Default bound on nested id-reference resolution
pub const DEFAULT_MAX_REFERENCE_DEPTH: usize = 32;

/// Capabilities the evaluation tree needs from the request-handling layer
pub trait EvaluationContext {
    fn function_definition_factory(&self) -> &dyn FunctionDefinitionFactory;

    /// Bag of request (or PIP-supplied) values for the query
    ///
    /// `Err` means retrieval itself failed; a missing attribute is an empty
    /// bag.
    fn get_attributes(&self, query: &AttributeQuery) -> Result<Bag, Status>;

    /// Root policy of the finder this context resolves references through
    fn get_root_policy_def(&self) -> PolicyFinderResult<RootPolicy>;

    fn get_policy(&self, id_reference_match: &IdReferenceMatch) -> PolicyFinderResult<Arc<Policy>>;

    fn get_policy_set(&self, id_reference_match: &IdReferenceMatch) -> PolicyFinderResult<Arc<PolicySet>>;

    fn is_tracing(&self) -> bool {
        false
    }

    fn trace(&self, _event: TraceEvent) {}

    /// Called before an id-reference delegates to its referencee
    fn enter_reference(&self, _id_reference_match: &IdReferenceMatch) -> Result<(), Status> {
        Ok(())
    }

    /// Balances a successful [`enter_reference`](Self::enter_reference)
    fn exit_reference(&self) {}
}

/// Standard context backed by an in-memory [`Request`]
pub struct StdEvaluationContext {
    request_id: Uuid,
    request: Request,
    finder: Arc<dyn PolicyFinder>,
    functions: Arc<dyn FunctionDefinitionFactory>,
    tracing: bool,
    max_reference_depth: usize,
    trace_events: Mutex<Vec<TraceEvent>>,
    reference_stack: Mutex<Vec<IdReferenceMatch>>,
}

impl StdEvaluationContext {
    pub fn new(
        request: Request,
        finder: Arc<dyn PolicyFinder>,
        functions: Arc<dyn FunctionDefinitionFactory>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            request,
            finder,
            functions,
            tracing: false,
            max_reference_depth: DEFAULT_MAX_REFERENCE_DEPTH,
            trace_events: Mutex::new(Vec::new()),
            reference_stack: Mutex::new(Vec::new()),
        }
    }

    pub fn with_tracing(mut self, tracing: bool) -> Self {
        self.tracing = tracing;
        self
    }

    pub fn with_max_reference_depth(mut self, depth: usize) -> Self {
        self.max_reference_depth = depth;
        self
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn finder(&self) -> &Arc<dyn PolicyFinder> {
        &self.finder
    }

    /// Trace events recorded so far
    pub fn trace_events(&self) -> Vec<TraceEvent> {
        self.trace_events.lock().clone()
    }
}

impl EvaluationContext for StdEvaluationContext {
    fn function_definition_factory(&self) -> &dyn FunctionDefinitionFactory {
        self.functions.as_ref()
    }

    fn get_attributes(&self, query: &AttributeQuery) -> Result<Bag, Status> {
        Ok(self.request.lookup(query))
    }

    fn get_root_policy_def(&self) -> PolicyFinderResult<RootPolicy> {
        self.finder.get_root_policy_def(self)
    }

    fn get_policy(&self, id_reference_match: &IdReferenceMatch) -> PolicyFinderResult<Arc<Policy>> {
        self.finder.get_policy(id_reference_match)
    }

    fn get_policy_set(&self, id_reference_match: &IdReferenceMatch) -> PolicyFinderResult<Arc<PolicySet>> {
        self.finder.get_policy_set(id_reference_match)
    }

    fn is_tracing(&self) -> bool {
        self.tracing
    }

    fn trace(&self, event: TraceEvent) {
        tracing::trace!(
            request_id = %self.request_id,
            source = event.source(),
            message = event.message(),
            "evaluation trace"
        );
        self.trace_events.lock().push(event);
    }

    fn enter_reference(&self, id_reference_match: &IdReferenceMatch) -> Result<(), Status> {
        let mut stack = self.reference_stack.lock();
        if stack.contains(id_reference_match) {
            return Err(Status::processing_error(format!(
                "Circular policy reference to {}",
                id_reference_match
            )));
        }
        if stack.len() >= self.max_reference_depth {
            return Err(Status::processing_error(format!(
                "Policy reference depth {} exceeded at {}",
                self.max_reference_depth, id_reference_match
            )));
        }
        stack.push(id_reference_match.clone());
        Ok(())
    }

    fn exit_reference(&self) {
        self.reference_stack.lock().pop();
    }
}
