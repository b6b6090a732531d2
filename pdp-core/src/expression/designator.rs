// Attribute designators
//
// The lookup mechanism itself (request attributes, PIP fetches) is behind
// EvaluationContext::get_attributes. The designator turns its outcome into an
// ExpressionResult and enforces MustBePresent.

use crate::context::EvaluationContext;
use crate::expression::{AttributeRetrieval, Expression, ExpressionResult};
use crate::identifier::Identifier;
use crate::request::AttributeQuery;
use crate::status::Status;
use crate::tree::PolicyDefaults;

/// `<AttributeDesignator>`: fetch a bag of request attribute values
#[derive(Debug, Clone)]
pub struct AttributeDesignator {
    query: AttributeQuery,
    must_be_present: bool,
}

impl AttributeDesignator {
    pub fn new(
        category: impl Into<Identifier>,
        attribute_id: impl Into<Identifier>,
        data_type_id: impl Into<Identifier>,
        must_be_present: bool,
    ) -> Self {
        Self {
            query: AttributeQuery::new(category, attribute_id, data_type_id),
            must_be_present,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.query = self.query.with_issuer(issuer);
        self
    }

    pub fn query(&self) -> &AttributeQuery {
        &self.query
    }
}

impl Expression for AttributeDesignator {
    fn evaluate(&self, context: &dyn EvaluationContext, _defaults: &PolicyDefaults) -> ExpressionResult {
        match context.get_attributes(&self.query) {
            Err(status) => ExpressionResult::error(status),
            Ok(bag) if bag.is_empty() && self.must_be_present => {
                ExpressionResult::error(Status::missing_attribute(format!(
                    "Missing required attribute {} in category {}",
                    self.query.attribute_id, self.query.category
                )))
            }
            Ok(bag) => ExpressionResult::ok_bag(bag),
        }
    }
}

impl AttributeRetrieval for AttributeDesignator {
    fn must_be_present(&self) -> bool {
        self.must_be_present
    }
}
