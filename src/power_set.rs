//! Combinatorial cascade: every subset of rules that can match together
//! becomes one composite rule.

use std::borrow::Cow;
use std::fmt;

use crate::{
    CompileError, Properties, PseudoClass, Rule, Selector, Signature, Simplifier, compare_rules,
};

/// Rule count above which enumeration refuses to start.
pub const DEFAULT_MAX_RULES: usize = 20;

/// Counters from one power-set run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerSetStats {
    /// Composite rules materialised.
    pub combinations: usize,
    /// Subsets proven unsatisfiable by the simplifier.
    pub rejected: usize,
    /// Subsets skipped because they contain a rejected one.
    pub pruned: usize,
    /// Composite rules removed by [`RulePowerSet::post_filter`].
    pub folded: usize,
}

/// Enumerates the combinable subsets of a rule list.
///
/// Subsets are walked depth-first in lexicographic signature order, deciding
/// rule `k` at depth `k` and trying "without" before "with". The running
/// conjunction of the members chosen so far is carried down, so subsets that
/// share a prefix share its combined selector, and a prefix whose
/// conjunction is `Reject` is never extended. Rejected signatures are kept
/// and prune later supersets without touching the simplifier.
///
/// Selector pseudo-classes are lifted into property buckets up front, so
/// composites are keyed on the scale × filter domain alone.
pub struct RulePowerSet<'a, S: Simplifier + ?Sized> {
    rules: Cow<'a, [Rule]>,
    simplifier: &'a S,
    max_rules: usize,
    stats: PowerSetStats,
}

impl<'a, S: Simplifier + ?Sized> RulePowerSet<'a, S> {
    /// # Errors
    ///
    /// Returns [`CompileError::NestedOr`] if a rule selector is not flattened
    /// and [`CompileError::MixedPseudoClasses`] if its branches guard
    /// different states.
    pub fn new(rules: &'a [Rule], simplifier: &'a S) -> Result<Self, CompileError> {
        Ok(Self {
            rules: crate::compile::lift_pseudo_classes(rules)?,
            simplifier,
            max_rules: DEFAULT_MAX_RULES,
            stats: PowerSetStats::default(),
        })
    }

    #[must_use]
    pub fn max_rules(mut self, max_rules: usize) -> Self {
        self.max_rules = max_rules;
        self
    }

    #[must_use]
    pub fn stats(&self) -> PowerSetStats {
        self.stats
    }

    /// Enumerate and post-filter.
    ///
    /// # Errors
    ///
    /// See [`enumerate`](Self::enumerate) and [`post_filter`](Self::post_filter).
    pub fn build(&mut self) -> Result<Vec<Rule>, CompileError> {
        let composites = self.enumerate()?;
        self.post_filter(composites)
    }

    /// One composite rule per non-empty subset whose combined selector is not
    /// provably empty, in enumeration order.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::TooManyRules`] above the rule ceiling and
    /// propagates simplifier failures.
    pub fn enumerate(&mut self) -> Result<Vec<Rule>, CompileError> {
        crate::compile::check_rule_count(&self.rules, self.max_rules)?;
        let n = self.rules.len();
        let mut walk = Walk {
            signature: Signature::new(n),
            rejected: vec![Vec::new(); n],
            pruned: 0,
            out: Vec::new(),
        };
        self.descend(0, &Selector::Accept, &mut walk)?;

        self.stats.combinations += walk.out.len();
        self.stats.pruned += walk.pruned;
        self.stats.rejected += walk.rejected.iter().map(Vec::len).sum::<usize>();
        tracing::debug!(
            rules = n,
            combinations = walk.out.len(),
            rejected = self.stats.rejected,
            pruned = self.stats.pruned,
            "enumerated rule power set"
        );
        Ok(walk.out)
    }

    fn descend(
        &self,
        depth: usize,
        combined: &Selector,
        walk: &mut Walk,
    ) -> Result<(), CompileError> {
        if depth == self.rules.len() {
            if walk.signature.count_ones() > 0 {
                let composite = self.materialize(&walk.signature, combined);
                walk.out.push(composite);
            }
            return Ok(());
        }

        self.descend(depth + 1, combined, walk)?;

        let rule = &self.rules[depth];
        if rule.selector.is_reject() {
            return Ok(());
        }
        walk.signature.set(depth, true);
        let known_empty = walk.rejected[depth]
            .iter()
            .any(|r| walk.signature.contains(r, depth + 1));
        if known_empty {
            walk.pruned += 1;
        } else {
            let next = Selector::and(combined, &rule.selector, self.simplifier)?;
            if next.is_reject() {
                tracing::trace!(signature = %walk.signature, "combination can never match");
                let rejected = walk.signature.clone();
                walk.rejected[depth].push(rejected);
            } else {
                self.descend(depth + 1, &next, walk)?;
            }
        }
        walk.signature.set(depth, false);
        Ok(())
    }

    /// Cascade the members of a subset into a single rule.
    fn materialize(&self, signature: &Signature, combined: &Selector) -> Rule {
        let ancestry: Vec<usize> = signature.ones().collect();
        let comments: Vec<&str> = ancestry
            .iter()
            .filter_map(|&idx| self.rules[idx].comment.as_deref())
            .collect();

        let mut cascade = ancestry.clone();
        cascade.sort_by(|&a, &b| compare_rules(&self.rules[a], &self.rules[b]));
        let mut properties = Properties::new();
        for &idx in &cascade {
            apply_cascade(&mut properties, &self.rules[idx].properties);
        }

        Rule {
            selector: combined.clone(),
            properties,
            ancestry,
            comment: (!comments.is_empty()).then(|| comments.join("\n")),
        }
    }

    /// Drop composites without root properties, sort by descending
    /// specificity and fold rules covered by a neighbour, until nothing
    /// else folds.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Rule::covers`].
    pub fn post_filter(&mut self, rules: Vec<Rule>) -> Result<Vec<Rule>, CompileError> {
        let before = rules.len();
        let mut filtered: Vec<Rule> = rules
            .into_iter()
            .filter(Rule::has_root_properties)
            .collect();
        loop {
            filtered.sort_by(|a, b| compare_rules(b, a));
            let len = filtered.len();
            filtered = self.fold(filtered)?;
            if filtered.len() == len {
                break;
            }
        }
        self.stats.folded += before - filtered.len();
        Ok(filtered)
    }

    fn fold(&self, rules: Vec<Rule>) -> Result<Vec<Rule>, CompileError> {
        let mut iter = rules.into_iter();
        let Some(mut prev) = iter.next() else {
            return Ok(Vec::new());
        };
        let mut folded = Vec::new();
        for curr in iter {
            if curr.covers(&prev, self.simplifier)? {
                prev = curr;
            } else if prev.covers(&curr, self.simplifier)? {
                // subsumed
            } else {
                folded.push(std::mem::replace(&mut prev, curr));
            }
        }
        folded.push(prev);
        Ok(folded)
    }
}

struct Walk {
    signature: Signature,
    /// Rejected signatures, bucketed by their highest member.
    rejected: Vec<Vec<Signature>>,
    pruned: usize,
    out: Vec<Rule>,
}

/// Overwrite same-named properties bucket by bucket. A property set on a
/// non-root pseudo-class also overwrites the buckets it contains that are
/// already present; buckets created later are not back-filled.
fn apply_cascade(acc: &mut Properties, incoming: &Properties) {
    for (state, props) in incoming.iter() {
        for property in props {
            acc.insert(state, property.clone());
        }
        if state.is_root() {
            continue;
        }
        let contained: Vec<PseudoClass> = acc
            .pseudo_classes()
            .filter(|pc| *pc != state && state.contains(pc))
            .cloned()
            .collect();
        for pc in &contained {
            for property in props {
                acc.insert(pc, property.clone());
            }
        }
    }
}

impl<S: Simplifier + ?Sized> fmt::Debug for RulePowerSet<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RulePowerSet")
            .field("rules", &self.rules.len())
            .field("max_rules", &self.max_rules)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
