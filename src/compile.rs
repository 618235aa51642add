use std::borrow::Cow;
use std::time::Instant;

use crate::{
    CompileError, CompileReport, CompiledStyle, DomainCoverage, Rule, RulePowerSet, Simplifier,
};

/// Full pipeline: power set, post-filter, then every composite through a
/// fresh coverage tracker.
pub(crate) fn compile<S: Simplifier + ?Sized>(
    rules: &[Rule],
    simplifier: &S,
    max_rules: usize,
) -> Result<CompiledStyle, CompileError> {
    let start = Instant::now();
    let mut power_set = RulePowerSet::new(rules, simplifier)?.max_rules(max_rules);
    let mut composites = power_set.build()?;
    order_for_coverage(&mut composites);

    let (flat, dead_rules) = claim_domain(&composites, simplifier)?;
    let stats = power_set.stats();
    let report = CompileReport {
        input_rules: rules.len(),
        combinations: stats.combinations,
        rejected: stats.rejected,
        folded: stats.folded,
        dead_rules,
        emitted: flat.len(),
        duration: start.elapsed(),
    };
    tracing::debug!(%report, "compiled style");
    Ok(CompiledStyle {
        rules: flat,
        report,
    })
}

/// Coverage tracker only, rules taken in list order. Rules left without
/// root properties once their pseudo-class is lifted claim nothing.
pub(crate) fn flatten<S: Simplifier + ?Sized>(
    rules: &[Rule],
    simplifier: &S,
) -> Result<CompiledStyle, CompileError> {
    let start = Instant::now();
    let lifted = lift_pseudo_classes(rules)?;
    let visible = lifted.iter().filter(|r| r.has_root_properties());

    let (flat, dead_rules) = claim_domain(visible, simplifier)?;
    let report = CompileReport {
        input_rules: rules.len(),
        dead_rules,
        emitted: flat.len(),
        duration: start.elapsed(),
        ..CompileReport::default()
    };
    tracing::debug!(%report, "flattened rules");
    Ok(CompiledStyle {
        rules: flat,
        report,
    })
}

/// Every rule through [`Rule::lift_pseudo_class`]. Borrows the input when
/// no selector carries a pseudo-class.
pub(crate) fn lift_pseudo_classes(rules: &[Rule]) -> Result<Cow<'_, [Rule]>, CompileError> {
    let mut lifted: Option<Vec<Rule>> = None;
    for (idx, rule) in rules.iter().enumerate() {
        match rule.lift_pseudo_class()? {
            Cow::Owned(rule) => lifted.get_or_insert_with(|| rules[..idx].to_vec()).push(rule),
            Cow::Borrowed(rule) => {
                if let Some(out) = &mut lifted {
                    out.push(rule.clone());
                }
            }
        }
    }
    Ok(lifted.map_or(Cow::Borrowed(rules), Cow::Owned))
}

pub(crate) fn check_rule_count(rules: &[Rule], limit: usize) -> Result<(), CompileError> {
    if rules.len() > limit {
        return Err(CompileError::TooManyRules {
            count: rules.len(),
            limit,
        });
    }
    Ok(())
}

/// Composites with more contributors first, specificity order otherwise.
/// A point matched by a set of source rules is then claimed by the
/// composite cascading all of them before any of its sub-combinations.
fn order_for_coverage(composites: &mut [Rule]) {
    composites.sort_by(|a, b| b.ancestry.len().cmp(&a.ancestry.len()));
}

fn claim_domain<'r, S: Simplifier + ?Sized>(
    rules: impl IntoIterator<Item = &'r Rule>,
    simplifier: &S,
) -> Result<(Vec<Rule>, usize), CompileError> {
    let mut coverage = DomainCoverage::new(simplifier);
    let mut flat = Vec::new();
    let mut dead = 0;
    for rule in rules {
        let derived = coverage.add_rule(rule)?;
        if derived.is_empty() {
            dead += 1;
        }
        flat.extend(derived);
    }
    Ok((flat, dead))
}
