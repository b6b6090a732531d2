//! In-memory request attributes
//!
//! Request wire formats are out of scope; a loader (or a test) fills a
//! [`Request`] with the attributes of one decision request and the standard
//! context serves designator lookups from it.

use crate::identifier::Identifier;
use crate::value::{AttributeValue, Bag};
use std::collections::HashMap;

/// Attribute lookup key used by designators
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeQuery {
    pub category: Identifier,
    pub attribute_id: Identifier,
    pub data_type_id: Identifier,
    pub issuer: Option<String>,
}

impl AttributeQuery {
    pub fn new(
        category: impl Into<Identifier>,
        attribute_id: impl Into<Identifier>,
        data_type_id: impl Into<Identifier>,
    ) -> Self {
        Self {
            category: category.into(),
            attribute_id: attribute_id.into(),
            data_type_id: data_type_id.into(),
            issuer: None,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }
}

#[derive(Debug, Clone)]
struct RequestAttribute {
    issuer: Option<String>,
    value: AttributeValue,
}

/// Attributes of one decision request, grouped by category and attribute id
#[derive(Debug, Clone, Default)]
pub struct Request {
    attributes: HashMap<(Identifier, Identifier), Vec<RequestAttribute>>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(
        self,
        category: impl Into<Identifier>,
        attribute_id: impl Into<Identifier>,
        value: AttributeValue,
    ) -> Self {
        self.with_issued_attribute(category, attribute_id, None, value)
    }

    pub fn with_issued_attribute(
        mut self,
        category: impl Into<Identifier>,
        attribute_id: impl Into<Identifier>,
        issuer: Option<String>,
        value: AttributeValue,
    ) -> Self {
        self.attributes
            .entry((category.into(), attribute_id.into()))
            .or_default()
            .push(RequestAttribute { issuer, value });
        self
    }

    /// Values matching the query's datatype (and issuer, when given)
    pub fn lookup(&self, query: &AttributeQuery) -> Bag {
        let key = (query.category.clone(), query.attribute_id.clone());
        let Some(attributes) = self.attributes.get(&key) else {
            return Bag::new();
        };
        attributes
            .iter()
            .filter(|attribute| attribute.value.data_type_id() == &query.data_type_id)
            .filter(|attribute| match &query.issuer {
                Some(issuer) => attribute.issuer.as_deref() == Some(issuer.as_str()),
                None => true,
            })
            .map(|attribute| attribute.value.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::{category, datatype};

    #[test]
    fn test_lookup_filters_by_datatype_and_issuer() {
        let request = Request::new()
            .with_attribute(category::ACTION, "urn:action-id", AttributeValue::string("read"))
            .with_attribute(category::ACTION, "urn:action-id", AttributeValue::integer(7))
            .with_issued_attribute(
                category::ACTION,
                "urn:action-id",
                Some("hr".to_string()),
                AttributeValue::string("write"),
            );

        let strings = AttributeQuery::new(category::ACTION, "urn:action-id", datatype::STRING);
        assert_eq!(request.lookup(&strings).len(), 2);

        let issued = strings.clone().with_issuer("hr");
        let bag = request.lookup(&issued);
        assert_eq!(bag.values(), &[AttributeValue::string("write")]);

        let missing = AttributeQuery::new(category::RESOURCE, "urn:action-id", datatype::STRING);
        assert!(request.lookup(&missing).is_empty());
    }
}
