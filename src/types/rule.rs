use std::borrow::Cow;
use std::fmt;

use super::{CompileError, Conjunction, PseudoClass, Selector, Value};
use crate::{DomainCoverage, Simplifier};

/// A named style property.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Property {
    pub name: String,
    pub value: Value,
}

impl Property {
    #[must_use]
    pub fn new(name: &str, value: impl Into<Value>) -> Self {
        Self {
            name: name.to_owned(),
            value: value.into(),
        }
    }
}

/// Properties bucketed by pseudo-class, in insertion order.
///
/// Within a bucket names are unique: inserting a property whose name is
/// already present replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Properties {
    buckets: Vec<(PseudoClass, Vec<Property>)>,
}

impl Properties {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, state: &PseudoClass, property: Property) {
        let bucket = self.bucket_mut(state);
        match bucket.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => *existing = property,
            None => bucket.push(property),
        }
    }

    fn bucket_mut(&mut self, state: &PseudoClass) -> &mut Vec<Property> {
        let idx = match self.buckets.iter().position(|(pc, _)| pc == state) {
            Some(idx) => idx,
            None => {
                self.buckets.push((state.clone(), Vec::new()));
                self.buckets.len() - 1
            }
        };
        &mut self.buckets[idx].1
    }

    #[must_use]
    pub fn get(&self, state: &PseudoClass) -> Option<&[Property]> {
        self.buckets
            .iter()
            .find(|(pc, _)| pc == state)
            .map(|(_, props)| props.as_slice())
    }

    /// Properties of the root state.
    #[must_use]
    pub fn root(&self) -> Option<&[Property]> {
        self.get(&PseudoClass::root())
    }

    /// Look up a single property value.
    #[must_use]
    pub fn value(&self, state: &PseudoClass, name: &str) -> Option<&Value> {
        self.get(state)?
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PseudoClass, &[Property])> {
        self.buckets
            .iter()
            .map(|(pc, props)| (pc, props.as_slice()))
    }

    pub fn pseudo_classes(&self) -> impl Iterator<Item = &PseudoClass> {
        self.buckets.iter().map(|(pc, _)| pc)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|(_, props)| props.is_empty())
    }
}

/// A style rule: a selector guarding per-pseudo-class properties.
///
/// Rules produced by the compiler record the indices of the source rules
/// they were combined from in `ancestry`; source rules leave it empty.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rule {
    pub selector: Selector,
    pub properties: Properties,
    pub ancestry: Vec<usize>,
    pub comment: Option<String>,
}

impl Rule {
    #[must_use]
    pub fn new(selector: impl Into<Selector>) -> Self {
        Self {
            selector: selector.into(),
            properties: Properties::new(),
            ancestry: Vec::new(),
            comment: None,
        }
    }

    /// Add a root-state property.
    #[must_use]
    pub fn property(self, name: &str, value: impl Into<Value>) -> Self {
        self.pseudo_property(&PseudoClass::root(), name, value)
    }

    /// Add a property to the given pseudo-class bucket.
    #[must_use]
    pub fn pseudo_property(mut self, state: &PseudoClass, name: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(state, Property::new(name, value));
        self
    }

    #[must_use]
    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_owned());
        self
    }

    /// A copy of this rule guarded by a different selector.
    #[must_use]
    pub fn with_selector(&self, selector: Selector) -> Self {
        Self {
            selector,
            properties: self.properties.clone(),
            ancestry: self.ancestry.clone(),
            comment: self.comment.clone(),
        }
    }

    #[must_use]
    pub fn has_root_properties(&self) -> bool {
        self.properties.root().is_some_and(|props| !props.is_empty())
    }

    /// Move the selector's pseudo-class into the property buckets.
    ///
    /// A rule guarded by `:selected` becomes a rule over the same scale and
    /// filter domain whose root properties sit in the `selected` bucket. A
    /// bucket nested in the guard keeps its place, and a bucket unrelated to
    /// it is dropped since no feature can be in both states. Rules without
    /// pseudo-class terms come back borrowed.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::NestedOr`] for unflattened selectors and
    /// [`CompileError::MixedPseudoClasses`] when the `Or` branches of the
    /// selector guard different states.
    pub fn lift_pseudo_class(&self) -> Result<Cow<'_, Rule>, CompileError> {
        self.selector.check_flattened()?;
        if !self.selector.has_pseudo_class() {
            return Ok(Cow::Borrowed(self));
        }

        let branches = self.selector.branches();
        let state = match branches.split_first() {
            Some((first, rest)) => {
                if rest.iter().any(|b| b.state != first.state) {
                    return Err(CompileError::MixedPseudoClasses {
                        selector: self.selector.to_string(),
                    });
                }
                first.state.clone()
            }
            None => PseudoClass::root(),
        };
        let selector = Selector::or(branches.into_iter().map(|branch| {
            Conjunction {
                state: PseudoClass::root(),
                ..branch
            }
            .into_selector()
        }));

        let mut properties = Properties::new();
        for (bucket, props) in self.properties.iter() {
            let Some(target) = state.narrowest(bucket) else {
                continue;
            };
            for property in props {
                properties.insert(target, property.clone());
            }
        }
        Ok(Cow::Owned(Rule {
            selector,
            properties,
            ancestry: self.ancestry.clone(),
            comment: self.comment.clone(),
        }))
    }

    /// Whether this rule makes `other` redundant: `other`'s scale/filter
    /// domain lies inside this rule's domain and every source rule that
    /// contributed to `other` also contributed to this one. Both rules are
    /// compared after [`lift_pseudo_class`](Self::lift_pseudo_class).
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] for malformed selectors or simplifier failures.
    pub fn covers<S: Simplifier + ?Sized>(
        &self,
        other: &Rule,
        simplifier: &S,
    ) -> Result<bool, CompileError> {
        if !other.ancestry.iter().all(|idx| self.ancestry.contains(idx)) {
            return Ok(false);
        }
        let this = self.lift_pseudo_class()?;
        let other = other.lift_pseudo_class()?;
        let mut domain = DomainCoverage::new(simplifier);
        domain.add_selector(&this.selector)?;
        Ok(domain.uncovered(&other.selector)?.is_empty())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(comment) = &self.comment {
            writeln!(f, "/* {comment} */")?;
        }
        write!(f, "{} {{", self.selector)?;
        for (state, props) in self.properties.iter() {
            if state.is_root() {
                for p in props {
                    write!(f, " {}: {};", p.name, p.value)?;
                }
            } else {
                write!(f, " {state} {{")?;
                for p in props {
                    write!(f, " {}: {};", p.name, p.value)?;
                }
                write!(f, " }}")?;
            }
        }
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DefaultSimplifier, ScaleRange, attr};

    #[test]
    fn insert_replaces_in_place() {
        let mut props = Properties::new();
        let root = PseudoClass::root();
        props.insert(&root, Property::new("stroke", "red"));
        props.insert(&root, Property::new("stroke-width", 1_i64));
        props.insert(&root, Property::new("stroke", "blue"));
        let names: Vec<&str> = props.root().unwrap().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["stroke", "stroke-width"]);
        assert_eq!(props.value(&root, "stroke"), Some(&Value::from("blue")));
    }

    #[test]
    fn buckets_keep_insertion_order() {
        let selected = PseudoClass::new("selected");
        let rule = Rule::new(Selector::Accept)
            .pseudo_property(&selected, "fill", "yellow")
            .property("fill", "gray");
        let states: Vec<&PseudoClass> = rule.properties.pseudo_classes().collect();
        assert_eq!(states, vec![&selected, &PseudoClass::root()]);
        assert!(!rule.properties.is_empty());
        assert!(Properties::new().is_empty());
    }

    #[test]
    fn display() {
        let rule = Rule::new(attr("kind").eq("road"))
            .property("stroke", "black")
            .pseudo_property(&PseudoClass::new("selected"), "stroke", "yellow")
            .comment("roads");
        assert_eq!(
            rule.to_string(),
            "/* roads */\n[kind = 'road'] { stroke: 'black'; :selected { stroke: 'yellow'; } }"
        );
    }

    #[test]
    fn covers_requires_domain_containment() {
        let simplifier = DefaultSimplifier::new();
        let mut wide = Rule::new(ScaleRange::below(200.0)).property("stroke", "red");
        wide.ancestry = vec![0];
        let mut narrow = Rule::new(ScaleRange::below(100.0)).property("stroke", "red");
        narrow.ancestry = vec![0];
        assert!(wide.covers(&narrow, &simplifier).unwrap());
        assert!(!narrow.covers(&wide, &simplifier).unwrap());
    }

    #[test]
    fn lift_moves_guard_state_into_buckets() {
        let selected = PseudoClass::new("selected");
        let hover = selected.clone().child("hover");
        let rule = Rule::new(Selector::And(vec![
            Selector::filter(attr("kind").eq("road")),
            Selector::pseudo_class(selected.clone()),
        ]))
        .property("stroke", "yellow")
        .pseudo_property(&hover, "stroke", "orange")
        .pseudo_property(&PseudoClass::new("focus"), "stroke", "blue");

        let lifted = rule.lift_pseudo_class().unwrap();
        assert_eq!(lifted.selector, Selector::filter(attr("kind").eq("road")));
        assert!(!lifted.has_root_properties());
        assert_eq!(lifted.properties.value(&selected, "stroke"), Some(&Value::from("yellow")));
        assert_eq!(lifted.properties.value(&hover, "stroke"), Some(&Value::from("orange")));
        let states: Vec<&PseudoClass> = lifted.properties.pseudo_classes().collect();
        assert_eq!(states, vec![&selected, &hover]);
    }

    #[test]
    fn lift_borrows_rules_without_pseudo_classes() {
        let rule = Rule::new(attr("kind").eq("road")).property("stroke", "black");
        assert!(matches!(rule.lift_pseudo_class().unwrap(), Cow::Borrowed(_)));
        assert!(rule.has_root_properties());
    }

    #[test]
    fn lift_rejects_mixed_branch_states() {
        let rule = Rule::new(Selector::Or(vec![
            Selector::And(vec![
                Selector::filter(attr("a").eq(1_i64)),
                Selector::pseudo_class(PseudoClass::new("selected")),
            ]),
            Selector::filter(attr("b").eq(2_i64)),
        ]))
        .property("stroke", "red");
        assert!(matches!(
            rule.lift_pseudo_class(),
            Err(CompileError::MixedPseudoClasses { .. })
        ));
    }

    #[test]
    fn covers_compares_lifted_domains() {
        let simplifier = DefaultSimplifier::new();
        let mut selected = Rule::new(PseudoClass::new("selected"))
            .pseudo_property(&PseudoClass::new("selected"), "stroke", "yellow");
        selected.ancestry = vec![0, 1];
        let mut plain = Rule::new(Selector::Accept).property("stroke", "gray");
        plain.ancestry = vec![0];
        assert!(selected.covers(&plain, &simplifier).unwrap());
        assert!(!plain.covers(&selected, &simplifier).unwrap());
    }

    #[test]
    fn covers_requires_ancestry_superset() {
        let simplifier = DefaultSimplifier::new();
        let mut combined = Rule::new(attr("kind").eq("road")).property("stroke", "red");
        combined.ancestry = vec![0, 1];
        let mut single = Rule::new(attr("kind").eq("road")).property("stroke", "red");
        single.ancestry = vec![1];
        assert!(combined.covers(&single, &simplifier).unwrap());
        assert!(!single.covers(&combined, &simplifier).unwrap());
    }
}
