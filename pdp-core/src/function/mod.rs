//! Function definitions
//!
//! The function library itself is an external collaborator; this module
//! defines the capability the evaluation core consumes, a registry-backed
//! factory, and the equality predicates that Match elements use most.

use crate::context::EvaluationContext;
use crate::expression::{ExpressionResult, ExpressionValue};
use crate::identifier::Identifier;
use crate::status::Status;
use crate::value::{AttributeValue, Bag};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

pub mod equality;

pub use equality::EqualityFunction;

static OK_STATUS: Status = Status::OK;

/// Argument passed to a function: an error, a single value, or a bag
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionArgument {
    Error(Status),
    Value(AttributeValue),
    Bag(Bag),
}

impl FunctionArgument {
    pub fn is_ok(&self) -> bool {
        !matches!(self, FunctionArgument::Error(_))
    }

    pub fn status(&self) -> &Status {
        match self {
            FunctionArgument::Error(status) => status,
            _ => &OK_STATUS,
        }
    }

    pub fn value(&self) -> Option<&AttributeValue> {
        match self {
            FunctionArgument::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn bag(&self) -> Option<&Bag> {
        match self {
            FunctionArgument::Bag(bag) => Some(bag),
            _ => None,
        }
    }
}

impl From<ExpressionResult> for FunctionArgument {
    fn from(result: ExpressionResult) -> Self {
        let (status, value) = result.into_parts();
        if !status.is_ok() {
            return FunctionArgument::Error(status);
        }
        match value {
            ExpressionValue::Value(value) => FunctionArgument::Value(value),
            ExpressionValue::Bag(bag) => FunctionArgument::Bag(bag),
            ExpressionValue::None => {
                FunctionArgument::Error(Status::processing_error("Expression produced no value"))
            }
        }
    }
}

/// A callable XACML function
pub trait FunctionDefinition: fmt::Debug + Send + Sync {
    fn id(&self) -> &Identifier;

    /// Datatype of the returned value(s)
    fn data_type_id(&self) -> &Identifier;

    fn returns_bag(&self) -> bool;

    fn evaluate(&self, context: &dyn EvaluationContext, arguments: &[FunctionArgument]) -> ExpressionResult;
}

/// Locates function definitions by identifier
pub trait FunctionDefinitionFactory: Send + Sync {
    fn get_function_definition(&self, id: &Identifier) -> Option<Arc<dyn FunctionDefinition>>;
}

/// Write-once cache of a resolved function
///
/// Only successful lookups are published; a miss is retried on the next call.
#[derive(Debug, Default)]
pub(crate) struct FunctionCache(OnceLock<Arc<dyn FunctionDefinition>>);

impl FunctionCache {
    pub(crate) fn resolve(
        &self,
        context: &dyn EvaluationContext,
        id: &Identifier,
    ) -> Result<Arc<dyn FunctionDefinition>, Status> {
        if let Some(function) = self.0.get() {
            return Ok(Arc::clone(function));
        }
        let function = context
            .function_definition_factory()
            .get_function_definition(id)
            .ok_or_else(|| Status::processing_error(format!("Unknown Function \"{}\"", id)))?;
        Ok(Arc::clone(self.0.get_or_init(|| function)))
    }
}

/// Registry-backed factory
///
/// `StdFunctionDefinitionFactory::default()` registers the equality family;
/// further functions are added with [`register`](Self::register).
#[derive(Debug, Clone)]
pub struct StdFunctionDefinitionFactory {
    functions: HashMap<Identifier, Arc<dyn FunctionDefinition>>,
}

impl StdFunctionDefinitionFactory {
    /// Factory with no functions registered
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Register (or replace) a function under its own identifier
    pub fn register(&mut self, function: Arc<dyn FunctionDefinition>) {
        self.functions.insert(function.id().clone(), function);
    }

    pub fn with(mut self, function: Arc<dyn FunctionDefinition>) -> Self {
        self.register(function);
        self
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for StdFunctionDefinitionFactory {
    fn default() -> Self {
        let mut factory = Self::empty();
        for function in EqualityFunction::standard() {
            factory.register(Arc::new(function));
        }
        factory
    }
}

impl FunctionDefinitionFactory for StdFunctionDefinitionFactory {
    fn get_function_definition(&self, id: &Identifier) -> Option<Arc<dyn FunctionDefinition>> {
        self.functions.get(id).cloned()
    }
}
