//! Attribute values and bags
//!
//! Values are carried as a datatype identifier plus a JSON payload. The
//! datatype-specific semantics (comparison, arithmetic) belong to the function
//! library; the evaluation core only needs to recognise booleans.

use crate::identifier::{datatype, Identifier};
use serde::{Deserialize, Serialize};

/// A single typed attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeValue {
    data_type_id: Identifier,
    value: serde_json::Value,
}

impl AttributeValue {
    pub fn new(data_type_id: impl Into<Identifier>, value: serde_json::Value) -> Self {
        Self {
            data_type_id: data_type_id.into(),
            value,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(datatype::STRING, serde_json::Value::String(value.into()))
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(datatype::BOOLEAN, serde_json::Value::Bool(value))
    }

    pub fn integer(value: i64) -> Self {
        Self::new(datatype::INTEGER, serde_json::Value::from(value))
    }

    pub fn double(value: f64) -> Self {
        Self::new(datatype::DOUBLE, serde_json::Value::from(value))
    }

    pub fn data_type_id(&self) -> &Identifier {
        &self.data_type_id
    }

    pub fn value(&self) -> &serde_json::Value {
        &self.value
    }

    /// Boolean payload, only when the datatype is `xs:boolean`
    pub fn as_bool(&self) -> Option<bool> {
        if self.data_type_id == datatype::BOOLEAN {
            self.value.as_bool()
        } else {
            None
        }
    }
}

/// Ordered multi-valued container for one attribute
///
/// A bag is homogeneous with respect to the attribute it was retrieved for,
/// not necessarily with respect to datatype.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bag {
    values: Vec<AttributeValue>,
}

/// The shared empty bag
pub const EMPTY_BAG: Bag = Bag { values: Vec::new() };

impl Bag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: AttributeValue) {
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AttributeValue> {
        self.values.iter()
    }

    pub fn values(&self) -> &[AttributeValue] {
        &self.values
    }
}

impl From<Vec<AttributeValue>> for Bag {
    fn from(values: Vec<AttributeValue>) -> Self {
        Self { values }
    }
}

impl FromIterator<AttributeValue> for Bag {
    fn from_iter<I: IntoIterator<Item = AttributeValue>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Bag {
    type Item = &'a AttributeValue;
    type IntoIter = std::slice::Iter<'a, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl IntoIterator for Bag {
    type Item = AttributeValue;
    type IntoIter = std::vec::IntoIter<AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
