//! Incremental partition of the scale × filter domain.
//!
//! [`DomainCoverage`] remembers which regions earlier rules have claimed and
//! restricts every new rule to what is still free, so the emitted rules never
//! overlap. Pseudo-class terms play no part in the domain: rules have them
//! lifted into property buckets before they are claimed.

use std::fmt;

use crate::types::Conjunction;
use crate::{
    CompileError, Feature, Predicate, PseudoClass, Rule, ScaleRange, Selector, Simplifier,
    SimplifyError,
};

/// One claimed region: a scale range paired with an attribute filter.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainElement {
    pub scale_range: ScaleRange,
    pub filter: Predicate,
}

impl DomainElement {
    #[must_use]
    pub fn new(scale_range: ScaleRange, filter: Predicate) -> Self {
        Self {
            scale_range,
            filter,
        }
    }

    /// The parts of this region outside `other`: the scale pieces `other`
    /// does not reach with the original filter, plus the shared scale range
    /// restricted to `self.filter AND NOT other.filter` when that can match.
    fn difference<S: Simplifier + ?Sized>(
        &self,
        other: &DomainElement,
        simplifier: &S,
    ) -> Result<Vec<DomainElement>, SimplifyError> {
        let mut out: Vec<DomainElement> = self
            .scale_range
            .subtract(&other.scale_range)
            .into_iter()
            .map(|range| DomainElement::new(range, self.filter.clone()))
            .collect();
        if let Some(overlap) = self.scale_range.intersect(&other.scale_range) {
            let rest = match &other.filter {
                Predicate::Include => Predicate::Exclude,
                Predicate::Exclude => self.filter.clone(),
                filter => {
                    simplifier.simplify(&Predicate::all([self.filter.clone(), !filter.clone()]))?
                }
            };
            if !rest.is_exclude() {
                out.push(DomainElement::new(overlap, rest));
            }
        }
        Ok(out)
    }

    /// Whether some point may lie in both regions.
    ///
    /// # Errors
    ///
    /// Propagates [`SimplifyError`] from the simplifier.
    pub fn overlaps<S: Simplifier + ?Sized>(
        &self,
        other: &DomainElement,
        simplifier: &S,
    ) -> Result<bool, SimplifyError> {
        if self.scale_range.intersect(&other.scale_range).is_none() {
            return Ok(false);
        }
        let both = simplifier.simplify(&Predicate::all([self.filter.clone(), other.filter.clone()]))?;
        Ok(!both.is_exclude())
    }

    #[must_use]
    pub fn matches(&self, feature: &Feature) -> bool {
        self.scale_range.contains(feature.scale()) && self.filter.matches(feature)
    }

    #[must_use]
    pub fn to_selector(&self) -> Selector {
        Conjunction {
            scale: self.scale_range,
            filter: self.filter.clone(),
            state: PseudoClass::root(),
        }
        .into_selector()
    }
}

impl fmt::Display for DomainElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[@scale in {}] [{}]", self.scale_range, self.filter)
    }
}

/// The regions of the scale × filter domain claimed so far.
///
/// Lives for one compilation. After every [`add_rule`](Self::add_rule) the
/// elements cover exactly the union of the rules added, and no two of them
/// overlap.
pub struct DomainCoverage<'s, S: Simplifier + ?Sized> {
    simplifier: &'s S,
    elements: Vec<DomainElement>,
}

impl<'s, S: Simplifier + ?Sized> DomainCoverage<'s, S> {
    #[must_use]
    pub fn new(simplifier: &'s S) -> Self {
        Self {
            simplifier,
            elements: Vec::new(),
        }
    }

    /// Claim the part of `rule`'s domain not yet covered.
    ///
    /// Returns one derived rule per newly claimed region, each carrying the
    /// rule's properties after [`Rule::lift_pseudo_class`]. The first rule
    /// into an empty coverage comes back otherwise unchanged. A rule whose
    /// domain is already fully covered yields nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::NestedOr`] for unflattened selectors,
    /// [`CompileError::MixedPseudoClasses`] for selectors guarding different
    /// states per branch, and propagates simplifier failures.
    pub fn add_rule(&mut self, rule: &Rule) -> Result<Vec<Rule>, CompileError> {
        let rule = rule.lift_pseudo_class()?;
        let pairs = self.decompose(&rule.selector)?;
        if pairs.is_empty() {
            tracing::debug!(selector = %rule.selector, "rule selects nothing");
            return Ok(Vec::new());
        }
        if self.elements.is_empty() {
            self.claim(pairs);
            return Ok(vec![rule.into_owned()]);
        }

        let survivors = self.subtract_covered(pairs)?;
        if survivors.is_empty() {
            tracing::debug!(selector = %rule.selector, "rule fully shadowed by earlier rules");
            return Ok(Vec::new());
        }
        let derived = survivors
            .iter()
            .map(|element| rule.with_selector(element.to_selector()))
            .collect();
        self.claim(survivors);
        Ok(derived)
    }

    /// Claim a selector's domain without producing rules.
    ///
    /// # Errors
    ///
    /// Same as [`add_rule`](Self::add_rule).
    pub fn add_selector(&mut self, selector: &Selector) -> Result<(), CompileError> {
        let pairs = self.decompose(selector)?;
        let survivors = self.subtract_covered(pairs)?;
        self.claim(survivors);
        Ok(())
    }

    /// The regions of `selector`'s domain not covered yet. Empty when the
    /// selector is fully covered.
    ///
    /// # Errors
    ///
    /// Same as [`add_rule`](Self::add_rule).
    pub fn uncovered(&self, selector: &Selector) -> Result<Vec<DomainElement>, CompileError> {
        let pairs = self.decompose(selector)?;
        Ok(self.subtract_covered(pairs)?)
    }

    /// Claimed regions, ordered by lower scale bound.
    #[must_use]
    pub fn elements(&self) -> &[DomainElement] {
        &self.elements
    }

    /// Pairwise check that no two claimed regions overlap.
    ///
    /// # Errors
    ///
    /// Propagates [`SimplifyError`] from the simplifier.
    pub fn is_mutually_exclusive(&self) -> Result<bool, SimplifyError> {
        for (i, a) in self.elements.iter().enumerate() {
            for b in &self.elements[i + 1..] {
                if a.overlaps(b, self.simplifier)? {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Whether a point of the domain has been claimed.
    #[must_use]
    pub fn covers(&self, feature: &Feature) -> bool {
        self.elements.iter().any(|e| e.matches(feature))
    }

    fn claim(&mut self, elements: Vec<DomainElement>) {
        self.elements.extend(elements);
        self.elements
            .sort_by(|a, b| a.scale_range.compare_lower_bound(&b.scale_range));
    }

    /// Split a selector into pairwise disjoint (scale, filter) regions, one
    /// per `Or` branch, merging branches that share a scale range.
    fn decompose(&self, selector: &Selector) -> Result<Vec<DomainElement>, CompileError> {
        selector.check_flattened()?;
        let mut pairs: Vec<DomainElement> = Vec::new();
        for branch in selector.branches() {
            let filter = if branch.filter.is_include() {
                branch.filter
            } else {
                self.simplifier.simplify(&branch.filter)?
            };
            if filter.is_exclude() {
                continue;
            }
            match pairs.iter_mut().find(|p| p.scale_range == branch.scale) {
                Some(existing) => {
                    existing.filter = self
                        .simplifier
                        .simplify(&Predicate::any([existing.filter.clone(), filter]))?;
                }
                None => pairs.push(DomainElement::new(branch.scale, filter)),
            }
        }

        let mut disjoint: Vec<DomainElement> = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let rest = subtract_all(vec![pair], &disjoint, self.simplifier)?;
            disjoint.extend(rest);
        }
        Ok(disjoint)
    }

    fn subtract_covered(
        &self,
        candidates: Vec<DomainElement>,
    ) -> Result<Vec<DomainElement>, SimplifyError> {
        subtract_all(candidates, &self.elements, self.simplifier)
    }
}

fn subtract_all<S: Simplifier + ?Sized>(
    candidates: Vec<DomainElement>,
    covered: &[DomainElement],
    simplifier: &S,
) -> Result<Vec<DomainElement>, SimplifyError> {
    let mut reduced = candidates;
    for element in covered {
        if reduced.is_empty() {
            break;
        }
        let mut next = Vec::with_capacity(reduced.len());
        for candidate in &reduced {
            next.extend(candidate.difference(element, simplifier)?);
        }
        reduced = next;
    }
    Ok(reduced)
}

impl<S: Simplifier + ?Sized> fmt::Debug for DomainCoverage<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainCoverage")
            .field("elements", &self.elements)
            .finish_non_exhaustive()
    }
}

impl<S: Simplifier + ?Sized> fmt::Display for DomainCoverage<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{element}")?;
        }
        Ok(())
    }
}
