use std::fmt;

use super::{CompileError, CompileReport, Feature, Property, Rule};
use crate::Simplifier;
use crate::power_set::{DEFAULT_MAX_RULES, RulePowerSet};

/// Builder for compiling a rule list into a [`CompiledStyle`].
///
/// The simplifier is injected once and shared by every stage.
///
/// # Example
///
/// ```
/// use rulecascade::{DefaultSimplifier, Rule, ScaleRange, Selector, StyleCompiler, attr};
///
/// let simplifier = DefaultSimplifier::new();
/// let rules = vec![
///     Rule::new(Selector::Accept).property("stroke", "gray"),
///     Rule::new(attr("kind").eq("road")).property("stroke", "black"),
///     Rule::new(ScaleRange::below(5000.0)).property("stroke-width", 2_i64),
/// ];
/// let style = StyleCompiler::new(&simplifier)
///     .max_rules(10)
///     .compile(&rules)
///     .unwrap();
/// assert!(!style.is_empty());
/// ```
pub struct StyleCompiler<'s, S: Simplifier + ?Sized> {
    simplifier: &'s S,
    max_rules: usize,
}

impl<'s, S: Simplifier + ?Sized> StyleCompiler<'s, S> {
    #[must_use]
    pub fn new(simplifier: &'s S) -> Self {
        Self {
            simplifier,
            max_rules: DEFAULT_MAX_RULES,
        }
    }

    /// Largest rule list the power set will accept. Defaults to 20.
    #[must_use]
    pub fn max_rules(mut self, max_rules: usize) -> Self {
        self.max_rules = max_rules;
        self
    }

    /// Cascade every combinable subset of `rules` and return flat,
    /// non-overlapping rules.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] for unflattened selectors, selectors guarding
    /// different pseudo-classes per branch, rule lists above the ceiling, or
    /// simplifier failures.
    pub fn compile(&self, rules: &[Rule]) -> Result<CompiledStyle, CompileError> {
        crate::compile::compile(rules, self.simplifier, self.max_rules)
    }

    /// Restrict each rule to the part of the domain earlier rules left free.
    /// No cascading: the first rule to claim a region wins it.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] for malformed selectors or simplifier failures.
    pub fn flatten(&self, rules: &[Rule]) -> Result<CompiledStyle, CompileError> {
        crate::compile::flatten(rules, self.simplifier)
    }

    /// The post-filtered composite rules, ordered by descending specificity.
    ///
    /// # Errors
    ///
    /// Same as [`compile()`](Self::compile).
    pub fn power_set(&self, rules: &[Rule]) -> Result<Vec<Rule>, CompileError> {
        RulePowerSet::new(rules, self.simplifier)?
            .max_rules(self.max_rules)
            .build()
    }
}

impl<S: Simplifier + ?Sized> fmt::Debug for StyleCompiler<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleCompiler")
            .field("max_rules", &self.max_rules)
            .finish_non_exhaustive()
    }
}

/// Flat, non-overlapping rules produced by a [`StyleCompiler`].
/// Immutable and safe to share across threads.
#[derive(Debug, Clone)]
pub struct CompiledStyle {
    pub(crate) rules: Vec<Rule>,
    pub(crate) report: CompileReport,
}

impl CompiledStyle {
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }

    #[must_use]
    pub fn report(&self) -> &CompileReport {
        &self.report
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The rule applying to a point of the domain, if any.
    #[must_use]
    pub fn first_match(&self, feature: &Feature) -> Option<&Rule> {
        self.rules.iter().find(|r| r.selector.matches(feature))
    }

    /// The matching rule's properties for the feature's own state.
    #[must_use]
    pub fn properties_for(&self, feature: &Feature) -> Option<&[Property]> {
        self.first_match(feature)?.properties.get(feature.state())
    }
}

impl fmt::Display for CompiledStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{rule}")?;
        }
        write!(f, "-- {}", self.report)
    }
}
