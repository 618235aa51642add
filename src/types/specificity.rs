use std::cmp::Ordering;

use super::{Predicate, Rule, Selector};

/// Ordinal measure of how narrow a selector is.
///
/// Ordered by the number of distinct attribute-predicate conjuncts (more is
/// more specific), then by scale extent: a smaller width is more specific,
/// and at equal width a larger lower bound is. Ties are left to the caller's
/// stable sort, which keeps declaration order.
#[derive(Debug, Clone, Copy)]
pub struct Specificity {
    conjuncts: usize,
    width: f64,
    min: f64,
}

impl Specificity {
    #[must_use]
    pub fn of(selector: &Selector) -> Self {
        let (width, min) = match selector.scale_extent() {
            Some(extent) => (extent.width(), extent.min()),
            None => (0.0, f64::INFINITY),
        };
        Self {
            conjuncts: count_conjuncts(selector),
            width,
            min,
        }
    }

    #[must_use]
    pub fn conjuncts(&self) -> usize {
        self.conjuncts
    }
}

fn count_conjuncts(selector: &Selector) -> usize {
    match selector {
        Selector::Filter(predicate) => predicate.conjunct_count(),
        Selector::And(_) => {
            let mut distinct = Vec::new();
            let mut alternatives = 0;
            collect_and(selector, &mut distinct, &mut alternatives);
            distinct.len() + alternatives
        }
        Selector::Or(children) => children.iter().map(count_conjuncts).max().unwrap_or(0),
        Selector::Accept | Selector::Reject | Selector::Scale(_) | Selector::PseudoClass(_) => 0,
    }
}

/// Distinct filter conjuncts across an `And`, nested `And`s included. An
/// `Or` child adds its own count on top.
fn collect_and<'a>(
    selector: &'a Selector,
    distinct: &mut Vec<&'a Predicate>,
    alternatives: &mut usize,
) {
    match selector {
        Selector::Filter(predicate) => predicate.collect_conjuncts(distinct),
        Selector::And(children) => {
            for child in children {
                collect_and(child, distinct, alternatives);
            }
        }
        Selector::Or(_) => *alternatives += count_conjuncts(selector),
        Selector::Accept | Selector::Reject | Selector::Scale(_) | Selector::PseudoClass(_) => {}
    }
}

impl Ord for Specificity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.conjuncts
            .cmp(&other.conjuncts)
            .then_with(|| other.width.total_cmp(&self.width))
            .then_with(|| self.min.total_cmp(&other.min))
    }
}

impl PartialOrd for Specificity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Specificity {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Specificity {}

/// Orders two rules by ascending selector specificity.
#[must_use]
pub fn compare_rules(a: &Rule, b: &Rule) -> Ordering {
    a.selector.specificity().cmp(&b.selector.specificity())
}
