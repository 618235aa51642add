use std::collections::HashMap;
use std::fmt;

use super::Value;

/// Declared type of a feature attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Int,
    /// Floating-point; integer literals are accepted as well.
    Float,
    Bool,
    String,
}

impl AttributeType {
    /// Whether a literal of this value's type can be compared with the attribute.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (AttributeType::Int, Value::Int(_))
                | (AttributeType::Float, Value::Int(_) | Value::Float(_))
                | (AttributeType::Bool, Value::Bool(_))
                | (AttributeType::String, Value::String(_))
        )
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeType::Int => "int",
            AttributeType::Float => "float",
            AttributeType::Bool => "bool",
            AttributeType::String => "string",
        };
        write!(f, "{name}")
    }
}

/// The target feature type predicates are simplified against.
///
/// Maps attribute names to their declared [`AttributeType`].
#[derive(Debug, Clone, Default)]
pub struct Schema {
    attributes: HashMap<String, AttributeType>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an attribute. Re-declaring a name replaces its type.
    #[must_use]
    pub fn attribute(mut self, name: &str, ty: AttributeType) -> Self {
        self.attributes.insert(name.to_owned(), ty);
        self
    }

    /// Look up the declared type of an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<AttributeType> {
        self.attributes.get(name).copied()
    }

    /// The number of declared attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Iterate over all declared (name, type) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, AttributeType)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
