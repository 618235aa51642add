use std::collections::HashMap;

use super::{PseudoClass, Value};

/// A point of the styling domain: a scale denominator, a pseudo-class state
/// and a set of attribute values.
///
/// Compilation never looks at features. They exist to check compiled output
/// against the source rules by brute-force evaluation.
#[derive(Debug, Clone, Default)]
pub struct Feature {
    scale: f64,
    state: PseudoClass,
    attributes: HashMap<String, Value>,
}

impl Feature {
    /// A feature at the given scale, in the root state, with no attributes.
    #[must_use]
    pub fn new(scale: f64) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    /// Set an attribute value.
    #[must_use]
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value.into());
        self
    }

    /// Put the feature in the given pseudo-class state.
    #[must_use]
    pub fn in_state(mut self, state: PseudoClass) -> Self {
        self.state = state;
        self
    }

    pub fn insert(&mut self, name: &str, value: Value) {
        self.attributes.insert(name.to_owned(), value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[must_use]
    pub fn state(&self) -> &PseudoClass {
        &self.state
    }
}
