use std::fmt;

use super::{CompileError, Feature, Predicate, PseudoClass, ScaleRange, SimplifyError, Specificity};
use crate::Simplifier;

/// Rule guard: a boolean combination of scale ranges, attribute predicates
/// and pseudo-class states.
///
/// `Reject` absorbs under [`Selector::and`] and `Accept` is its identity.
/// Selectors reaching the compiler must be flattened: an `Or` never has
/// another `Or` as a direct child.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Selector {
    /// Matches everything.
    Accept,
    /// Matches nothing.
    Reject,
    Scale(ScaleRange),
    Filter(Predicate),
    PseudoClass(PseudoClass),
    And(Vec<Selector>),
    Or(Vec<Selector>),
}

/// One `Or` branch of a selector, taken apart into its three components.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Conjunction {
    pub(crate) scale: ScaleRange,
    pub(crate) filter: Predicate,
    pub(crate) state: PseudoClass,
}

impl Conjunction {
    fn accept() -> Self {
        Self {
            scale: ScaleRange::universal(),
            filter: Predicate::Include,
            state: PseudoClass::root(),
        }
    }

    /// Structural conjunction; `None` when scales or states cannot overlap.
    fn meet(&self, other: &Conjunction) -> Option<Conjunction> {
        let scale = self.scale.intersect(&other.scale)?;
        let state = self.state.narrowest(&other.state)?.clone();
        let filter = match (&self.filter, &other.filter) {
            (Predicate::Include, f) | (f, Predicate::Include) => f.clone(),
            (a, b) => Predicate::all([a.clone(), b.clone()]),
        };
        Some(Conjunction {
            scale,
            filter,
            state,
        })
    }

    fn simplify<S: Simplifier + ?Sized>(
        mut self,
        simplifier: &S,
    ) -> Result<Option<Conjunction>, SimplifyError> {
        if !self.filter.is_include() {
            self.filter = simplifier.simplify(&self.filter)?;
        }
        Ok((!self.filter.is_exclude()).then_some(self))
    }

    pub(crate) fn into_selector(self) -> Selector {
        let mut parts = Vec::with_capacity(3);
        if !self.scale.is_universal() {
            parts.push(Selector::Scale(self.scale));
        }
        if !self.filter.is_include() {
            parts.push(Selector::Filter(self.filter));
        }
        if !self.state.is_root() {
            parts.push(Selector::PseudoClass(self.state));
        }
        match parts.len() {
            0 => Selector::Accept,
            1 => parts.remove(0),
            _ => Selector::And(parts),
        }
    }
}

impl Selector {
    #[must_use]
    pub fn scale(range: ScaleRange) -> Self {
        Selector::Scale(range)
    }

    #[must_use]
    pub fn filter(predicate: Predicate) -> Self {
        Selector::Filter(predicate)
    }

    #[must_use]
    pub fn pseudo_class(state: PseudoClass) -> Self {
        Selector::PseudoClass(state)
    }

    #[must_use]
    pub fn is_reject(&self) -> bool {
        matches!(self, Selector::Reject)
    }

    #[must_use]
    pub fn is_accept(&self) -> bool {
        matches!(self, Selector::Accept)
    }

    /// Disjunction of the children: nested `Or`s are flattened, `Reject`
    /// children dropped, and any `Accept` child makes the whole thing `Accept`.
    #[must_use]
    pub fn or(children: impl IntoIterator<Item = Selector>) -> Selector {
        let mut flat: Vec<Selector> = Vec::new();
        for child in children {
            match child {
                Selector::Reject => {}
                Selector::Accept => return Selector::Accept,
                Selector::Or(nested) => {
                    for n in nested {
                        if n.is_accept() {
                            return Selector::Accept;
                        }
                        if !n.is_reject() && !flat.contains(&n) {
                            flat.push(n);
                        }
                    }
                }
                other => {
                    if !flat.contains(&other) {
                        flat.push(other);
                    }
                }
            }
        }
        match flat.len() {
            0 => Selector::Reject,
            1 => flat.remove(0),
            _ => Selector::Or(flat),
        }
    }

    /// Conjunction of two selectors, simplified.
    ///
    /// Distributes over `Or`, intersects scale ranges, keeps the narrower of
    /// two nested pseudo-classes and conjoins filters through the simplifier.
    /// Any branch that is provably empty is dropped; the result is `Reject`
    /// when none survive.
    ///
    /// # Errors
    ///
    /// Propagates [`SimplifyError`] from the simplifier.
    pub fn and<S: Simplifier + ?Sized>(
        a: &Selector,
        b: &Selector,
        simplifier: &S,
    ) -> Result<Selector, SimplifyError> {
        if a.is_reject() || b.is_reject() {
            return Ok(Selector::Reject);
        }
        let left = a.branches();
        let right = b.branches();
        let mut out = Vec::new();
        for l in &left {
            for r in &right {
                if let Some(c) = l.meet(r)
                    && let Some(c) = c.simplify(simplifier)?
                {
                    out.push(c.into_selector());
                }
            }
        }
        Ok(Selector::or(out))
    }

    /// The selector as a list of independent conjunctions, one per `Or`
    /// branch after distributing any `Or` nested under an `And`.
    /// Branches with an empty scale range or incompatible states are dropped.
    pub(crate) fn branches(&self) -> Vec<Conjunction> {
        match self {
            Selector::Accept => vec![Conjunction::accept()],
            Selector::Reject => Vec::new(),
            Selector::Scale(range) => {
                if range.is_empty() {
                    Vec::new()
                } else {
                    vec![Conjunction {
                        scale: *range,
                        ..Conjunction::accept()
                    }]
                }
            }
            Selector::Filter(predicate) => {
                if predicate.is_exclude() {
                    Vec::new()
                } else {
                    vec![Conjunction {
                        filter: predicate.clone(),
                        ..Conjunction::accept()
                    }]
                }
            }
            Selector::PseudoClass(state) => vec![Conjunction {
                state: state.clone(),
                ..Conjunction::accept()
            }],
            Selector::Or(children) => children.iter().flat_map(Selector::branches).collect(),
            Selector::And(children) => {
                let mut acc = vec![Conjunction::accept()];
                for child in children {
                    let child_branches = child.branches();
                    acc = acc
                        .iter()
                        .flat_map(|a| child_branches.iter().filter_map(move |b| a.meet(b)))
                        .collect();
                    if acc.is_empty() {
                        break;
                    }
                }
                acc
            }
        }
    }

    /// Reject an `Or` nested directly inside another `Or`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::NestedOr`] naming the offending selector.
    pub fn check_flattened(&self) -> Result<(), CompileError> {
        match self {
            Selector::Or(children) => {
                for child in children {
                    if matches!(child, Selector::Or(_)) {
                        return Err(CompileError::NestedOr {
                            selector: self.to_string(),
                        });
                    }
                    child.check_flattened()?;
                }
                Ok(())
            }
            Selector::And(children) => children.iter().try_for_each(Selector::check_flattened),
            _ => Ok(()),
        }
    }

    /// Whether any term guards a state narrower than the root.
    #[must_use]
    pub fn has_pseudo_class(&self) -> bool {
        match self {
            Selector::PseudoClass(state) => !state.is_root(),
            Selector::And(children) | Selector::Or(children) => {
                children.iter().any(Selector::has_pseudo_class)
            }
            _ => false,
        }
    }

    /// Evaluate against a single point of the domain.
    #[must_use]
    pub fn matches(&self, feature: &Feature) -> bool {
        crate::evaluate::eval_selector(self, feature)
    }

    #[must_use]
    pub fn specificity(&self) -> Specificity {
        Specificity::of(self)
    }

    /// The scale values this selector can match, as a single range: the
    /// intersection across `And`, the hull across `Or`. `None` when no
    /// scale can match.
    #[must_use]
    pub fn scale_extent(&self) -> Option<ScaleRange> {
        match self {
            Selector::Reject => None,
            Selector::Scale(range) => (!range.is_empty()).then_some(*range),
            Selector::Accept | Selector::Filter(_) | Selector::PseudoClass(_) => {
                Some(ScaleRange::universal())
            }
            Selector::And(children) => {
                let mut extent = ScaleRange::universal();
                for child in children {
                    extent = extent.intersect(&child.scale_extent()?)?;
                }
                Some(extent)
            }
            Selector::Or(children) => children
                .iter()
                .filter_map(Selector::scale_extent)
                .reduce(|a, b| a.hull(&b)),
        }
    }
}

impl From<ScaleRange> for Selector {
    fn from(range: ScaleRange) -> Self {
        Selector::Scale(range)
    }
}

impl From<Predicate> for Selector {
    fn from(predicate: Predicate) -> Self {
        Selector::Filter(predicate)
    }
}

impl From<PseudoClass> for Selector {
    fn from(state: PseudoClass) -> Self {
        Selector::PseudoClass(state)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Accept => write!(f, "*"),
            Selector::Reject => write!(f, "REJECT"),
            Selector::Scale(range) => write!(f, "[@scale in {range}]"),
            Selector::Filter(predicate) => write!(f, "[{predicate}]"),
            Selector::PseudoClass(state) => write!(f, "{state}"),
            Selector::And(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{child}")?;
                }
                Ok(())
            }
            Selector::Or(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{child}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DefaultSimplifier, attr};

    fn and(a: &Selector, b: &Selector) -> Selector {
        Selector::and(a, b, &DefaultSimplifier::new()).unwrap()
    }

    #[test]
    fn reject_absorbs_accept_is_identity() {
        let s = Selector::filter(attr("kind").eq("road"));
        assert_eq!(and(&s, &Selector::Reject), Selector::Reject);
        assert_eq!(and(&Selector::Reject, &s), Selector::Reject);
        assert_eq!(and(&Selector::Accept, &s), s);
        assert_eq!(and(&Selector::Accept, &Selector::Accept), Selector::Accept);
    }

    #[test]
    fn and_intersects_scale_ranges() {
        let a = Selector::scale(ScaleRange::below(200.0));
        let b = Selector::scale(ScaleRange::new(100.0, 300.0));
        assert_eq!(and(&a, &b), Selector::scale(ScaleRange::new(100.0, 200.0)));

        let disjoint = Selector::scale(ScaleRange::at_least(500.0));
        assert_eq!(and(&a, &disjoint), Selector::Reject);
    }

    #[test]
    fn and_detects_contradicting_filters() {
        let a = Selector::filter(attr("kind").eq("road"));
        let b = Selector::filter(attr("kind").eq("river"));
        assert_eq!(and(&a, &b), Selector::Reject);
    }

    #[test]
    fn and_builds_canonical_conjunction() {
        let a = Selector::And(vec![
            Selector::scale(ScaleRange::below(100.0)),
            Selector::filter(attr("kind").eq("road")),
        ]);
        let b = Selector::pseudo_class(PseudoClass::new("selected"));
        assert_eq!(
            and(&a, &b),
            Selector::And(vec![
                Selector::scale(ScaleRange::below(100.0)),
                Selector::filter(attr("kind").eq("road")),
                Selector::pseudo_class(PseudoClass::new("selected")),
            ])
        );
    }

    #[test]
    fn and_distributes_over_or() {
        let a = Selector::Or(vec![
            Selector::filter(attr("kind").eq("road")),
            Selector::filter(attr("kind").eq("river")),
        ]);
        let b = Selector::filter(attr("kind").eq("road"));
        assert_eq!(and(&a, &b), Selector::filter(attr("kind").eq("road")));
    }

    #[test]
    fn unrelated_pseudo_classes_reject() {
        let a = Selector::pseudo_class(PseudoClass::new("selected"));
        let b = Selector::pseudo_class(PseudoClass::new("hover"));
        assert_eq!(and(&a, &b), Selector::Reject);

        let nested = Selector::pseudo_class(PseudoClass::new("selected").child("hover"));
        assert_eq!(and(&a, &nested), nested);
    }

    #[test]
    fn or_flattens_and_absorbs() {
        let a = Selector::filter(attr("a").eq(1_i64));
        let b = Selector::filter(attr("b").eq(2_i64));
        let nested = Selector::or([a.clone(), Selector::Or(vec![b.clone(), Selector::Reject])]);
        assert_eq!(nested, Selector::Or(vec![a.clone(), b.clone()]));
        assert_eq!(Selector::or([a.clone(), Selector::Accept]), Selector::Accept);
        assert_eq!(Selector::or([Selector::Reject]), Selector::Reject);
        assert_eq!(Selector::or([a.clone(), a.clone()]), a);
    }

    #[test]
    fn check_flattened_rejects_nested_or() {
        let flat = Selector::Or(vec![
            Selector::filter(attr("a").eq(1_i64)),
            Selector::And(vec![Selector::Accept]),
        ]);
        assert!(flat.check_flattened().is_ok());

        let nested = Selector::Or(vec![
            Selector::filter(attr("a").eq(1_i64)),
            Selector::Or(vec![Selector::Accept]),
        ]);
        assert!(matches!(
            nested.check_flattened(),
            Err(CompileError::NestedOr { .. })
        ));
    }

    #[test]
    fn branches_distribute_nested_or_under_and() {
        let s = Selector::And(vec![
            Selector::scale(ScaleRange::below(100.0)),
            Selector::Or(vec![
                Selector::filter(attr("a").eq(1_i64)),
                Selector::scale(ScaleRange::at_least(500.0)),
            ]),
        ]);
        let branches = s.branches();
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].scale, ScaleRange::below(100.0));
        assert_eq!(branches[0].filter, attr("a").eq(1_i64));
    }

    #[test]
    fn has_pseudo_class_ignores_root_state() {
        let guarded = Selector::And(vec![
            Selector::filter(attr("a").eq(1_i64)),
            Selector::pseudo_class(PseudoClass::new("selected")),
        ]);
        assert!(guarded.has_pseudo_class());
        assert!(Selector::Or(vec![Selector::Reject, guarded]).has_pseudo_class());
        assert!(!Selector::pseudo_class(PseudoClass::root()).has_pseudo_class());
        assert!(!Selector::filter(attr("a").eq(1_i64)).has_pseudo_class());
    }

    #[test]
    fn scale_extent() {
        let s = Selector::Or(vec![
            Selector::scale(ScaleRange::new(0.0, 100.0)),
            Selector::scale(ScaleRange::new(500.0, 1000.0)),
        ]);
        assert_eq!(s.scale_extent(), Some(ScaleRange::new(0.0, 1000.0)));
        assert_eq!(Selector::Accept.scale_extent(), Some(ScaleRange::universal()));
        assert_eq!(Selector::Reject.scale_extent(), None);
    }

    #[test]
    fn display() {
        let s = Selector::And(vec![
            Selector::scale(ScaleRange::below(100.0)),
            Selector::filter(attr("kind").eq("road")),
        ]);
        assert_eq!(s.to_string(), "[@scale in [0, 100)] [kind = 'road']");
        assert_eq!(Selector::Accept.to_string(), "*");
    }
}
