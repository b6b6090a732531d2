// Variable definitions and references
//
// A Policy owns a VariableMap. References are bound to their definition when
// constructed, so the map must be populated before the expressions that use
// it are built.

use crate::context::EvaluationContext;
use crate::expression::{Expression, ExpressionResult};
use crate::identifier::Identifier;
use crate::status::Status;
use crate::tree::PolicyDefaults;
use crate::validation::ValidationError;
use std::collections::HashMap;
use std::sync::Arc;

/// `<VariableDefinition>`: a named expression
#[derive(Debug)]
pub struct VariableDefinition {
    id: Identifier,
    expression: Arc<dyn Expression>,
}

impl VariableDefinition {
    pub fn new(id: impl Into<Identifier>, expression: Arc<dyn Expression>) -> Self {
        Self {
            id: id.into(),
            expression,
        }
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn expression(&self) -> &Arc<dyn Expression> {
        &self.expression
    }
}

/// Variable definitions of one Policy, by id and in declaration order
#[derive(Debug, Default)]
pub struct VariableMap {
    by_id: HashMap<Identifier, Arc<VariableDefinition>>,
    ordered: Vec<Arc<VariableDefinition>>,
}

impl VariableMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition; ids must be unique within the map
    pub fn add(&mut self, definition: VariableDefinition) -> Result<Arc<VariableDefinition>, ValidationError> {
        if self.by_id.contains_key(definition.id()) {
            return Err(ValidationError::DuplicateVariableId(definition.id().clone()));
        }
        let definition = Arc::new(definition);
        self.by_id.insert(definition.id().clone(), Arc::clone(&definition));
        self.ordered.push(Arc::clone(&definition));
        Ok(definition)
    }

    pub fn get(&self, id: &Identifier) -> Option<&Arc<VariableDefinition>> {
        self.by_id.get(id)
    }

    /// Definitions in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<VariableDefinition>> {
        self.ordered.iter()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

/// `<VariableReference>`: evaluates the referenced definition
#[derive(Debug)]
pub struct VariableReference {
    variable_id: Identifier,
    definition: Option<Arc<VariableDefinition>>,
}

impl VariableReference {
    pub fn new(variable_id: impl Into<Identifier>, variables: &VariableMap) -> Self {
        let variable_id = variable_id.into();
        let definition = variables.get(&variable_id).cloned();
        Self {
            variable_id,
            definition,
        }
    }

    pub fn variable_id(&self) -> &Identifier {
        &self.variable_id
    }

    pub fn is_bound(&self) -> bool {
        self.definition.is_some()
    }
}

impl Expression for VariableReference {
    fn evaluate(&self, context: &dyn EvaluationContext, defaults: &PolicyDefaults) -> ExpressionResult {
        match &self.definition {
            Some(definition) => definition.expression().evaluate(context, defaults),
            None => ExpressionResult::error(Status::processing_error(format!(
                "No VariableDefinition found for \"{}\"",
                self.variable_id
            ))),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match &self.definition {
            Some(_) => Ok(()),
            None => Err(ValidationError::UnknownVariable(self.variable_id.clone())),
        }
    }
}
