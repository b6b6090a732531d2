// Combiner parameters
//
// Targeted parameters name the Rule / Policy / PolicySet they apply to. The
// map binds each name to child positions on first use and keeps the binding;
// children of a built node never change.

use crate::combining::CombiningElement;
use crate::error::EvaluationError;
use crate::identifier::Identifier;
use crate::validation::ValidationError;
use crate::value::AttributeValue;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::OnceLock;

/// `<CombinerParameter>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinerParameter {
    name: String,
    value: AttributeValue,
}

impl CombinerParameter {
    pub fn new(name: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &AttributeValue {
        &self.value
    }
}

/// `<RuleCombinerParameters>` / `<PolicyCombinerParameters>` entry
#[derive(Debug, Clone, PartialEq)]
pub struct TargetedCombinerParameter {
    parameter: CombinerParameter,
    target_id: Identifier,
}

impl TargetedCombinerParameter {
    pub fn new(parameter: CombinerParameter, target_id: impl Into<Identifier>) -> Self {
        Self {
            parameter,
            target_id: target_id.into(),
        }
    }

    pub fn parameter(&self) -> &CombinerParameter {
        &self.parameter
    }

    pub fn target_id(&self) -> &Identifier {
        &self.target_id
    }
}

/// Children that targeted parameters can be bound to
pub trait CombinerTarget {
    fn combiner_target_id(&self) -> Option<&Identifier>;
}

#[derive(Debug, Clone, PartialEq)]
struct UnresolvedParameter {
    name: String,
    target_id: Identifier,
}

impl UnresolvedParameter {
    fn into_evaluation_error(self) -> EvaluationError {
        EvaluationError::UnresolvedCombinerParameter {
            name: self.name,
            target_id: self.target_id,
        }
    }

    fn into_validation_error(self) -> ValidationError {
        ValidationError::UnresolvedCombinerParameter {
            name: self.name,
            target_id: self.target_id,
        }
    }
}

type Bindings = Result<Vec<Vec<CombinerParameter>>, UnresolvedParameter>;

/// Targeted parameters of one Policy (`T = Rule`) or PolicySet
#[derive(Debug)]
pub struct TargetedCombinerParameterMap<T> {
    parameters: Vec<TargetedCombinerParameter>,
    bindings: OnceLock<Bindings>,
    _target: PhantomData<fn() -> T>,
}

impl<T> Default for TargetedCombinerParameterMap<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> TargetedCombinerParameterMap<T> {
    pub fn new(parameters: Vec<TargetedCombinerParameter>) -> Self {
        Self {
            parameters,
            bindings: OnceLock::new(),
            _target: PhantomData,
        }
    }

    pub fn parameters(&self) -> &[TargetedCombinerParameter] {
        &self.parameters
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

impl<T: CombinerTarget> TargetedCombinerParameterMap<T> {
    /// Pair each target with the parameters naming it
    ///
    /// Fails if some parameter names no target.
    pub fn elements<'a, I>(&self, targets: I) -> Result<Vec<CombiningElement<'a, T>>, EvaluationError>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let targets: Vec<&'a T> = targets.into_iter().collect();
        let bound = self
            .bindings
            .get_or_init(|| bind(&self.parameters, &targets))
            .as_ref()
            .map_err(|error| error.clone().into_evaluation_error())?;
        Ok(targets
            .into_iter()
            .enumerate()
            .map(|(index, target)| CombiningElement::new(target, bound.get(index).cloned().unwrap_or_default()))
            .collect())
    }

    /// Load-time check that every parameter binds to some target
    pub fn check<'a, I>(&self, targets: I) -> Result<(), ValidationError>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let targets: Vec<&'a T> = targets.into_iter().collect();
        bind(&self.parameters, &targets)
            .map(|_| ())
            .map_err(UnresolvedParameter::into_validation_error)
    }
}

fn bind<T: CombinerTarget>(parameters: &[TargetedCombinerParameter], targets: &[&T]) -> Bindings {
    let mut bound = vec![Vec::new(); targets.len()];
    for targeted in parameters {
        let mut resolved = false;
        for (index, target) in targets.iter().enumerate() {
            if target.combiner_target_id() == Some(&targeted.target_id) {
                bound[index].push(targeted.parameter.clone());
                resolved = true;
            }
        }
        if !resolved {
            return Err(UnresolvedParameter {
                name: targeted.parameter.name.clone(),
                target_id: targeted.target_id.clone(),
            });
        }
    }
    Ok(bound)
}
