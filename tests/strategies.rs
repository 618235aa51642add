#![allow(dead_code)]

use proptest::prelude::*;
use rulecascade::{
    AttributeType, Feature, Predicate, Properties, PseudoClass, Rule, ScaleRange, Schema,
    Selector, Value, attr, compare_rules,
};

// --- Fixed attribute schema ---
// kind  : string, one of {"road", "river", "park"}
// lanes : int (0..=5)
// lit   : bool
//
// Scales live on a fixed grid so that generated ranges share bounds.
// States: root, :selected, :selected:hover and :hover.

pub const KINDS: &[&str] = &["road", "river", "park"];
pub const GRID: &[f64] = &[0.0, 100.0, 500.0, 1000.0, 5000.0, f64::INFINITY];
/// Sample points: every grid bound plus one value inside each interval.
pub const SCALES: &[f64] = &[
    0.0, 50.0, 100.0, 300.0, 500.0, 750.0, 1000.0, 3000.0, 5000.0, 1e6,
];
const STROKES: &[&str] = &["black", "red", "blue", "gray"];

pub fn states() -> Vec<PseudoClass> {
    let selected = PseudoClass::new("selected");
    vec![
        PseudoClass::root(),
        selected.clone().child("hover"),
        selected,
        PseudoClass::new("hover"),
    ]
}

pub fn schema() -> Schema {
    Schema::new()
        .attribute("kind", AttributeType::String)
        .attribute("lanes", AttributeType::Int)
        .attribute("lit", AttributeType::Bool)
}

/// Every combination of attribute values (each possibly absent) at every
/// sample scale, in every state.
pub fn all_features() -> Vec<Feature> {
    let kinds: Vec<Option<&str>> = std::iter::once(None)
        .chain(KINDS.iter().copied().map(Some))
        .collect();
    let lanes: Vec<Option<i64>> = std::iter::once(None).chain((0..=5).map(Some)).collect();
    let lits = [None, Some(true), Some(false)];

    let mut out = Vec::new();
    for state in states() {
        for &scale in SCALES {
            for kind in &kinds {
                for lane in &lanes {
                    for lit in &lits {
                        let mut feature = Feature::new(scale).in_state(state.clone());
                        if let Some(k) = kind {
                            feature.insert("kind", Value::from(*k));
                        }
                        if let Some(l) = lane {
                            feature.insert("lanes", Value::from(*l));
                        }
                        if let Some(b) = lit {
                            feature.insert("lit", Value::from(*b));
                        }
                        out.push(feature);
                    }
                }
            }
        }
    }
    out
}

/// A leaf comparison on a random attribute from the schema.
pub fn arb_leaf() -> impl Strategy<Value = Predicate> {
    prop_oneof![
        (prop::sample::select(KINDS), any::<bool>()).prop_map(|(kind, is_eq)| {
            if is_eq {
                attr("kind").eq(kind)
            } else {
                attr("kind").neq(kind)
            }
        }),
        (0_i64..=5, 0_u8..6).prop_map(|(val, op)| {
            let a = attr("lanes");
            match op {
                0 => a.eq(val),
                1 => a.neq(val),
                2 => a.gt(val),
                3 => a.gte(val),
                4 => a.lt(val),
                _ => a.lte(val),
            }
        }),
        any::<bool>().prop_map(|val| attr("lit").eq(val)),
    ]
}

/// A predicate tree (AND, OR, NOT of leaves) of bounded depth.
pub fn arb_predicate(max_depth: u32) -> impl Strategy<Value = Predicate> {
    arb_leaf().prop_recursive(max_depth, 12, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.and(b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.or(b)),
            inner.prop_map(|p| !p),
        ]
    })
}

pub fn arb_scale_range() -> impl Strategy<Value = ScaleRange> {
    (0..GRID.len() - 1, 1..GRID.len()).prop_map(|(a, b)| {
        let (lo, hi) = if a < b { (a, b) } else { (b, (a + 1).min(GRID.len() - 1)) };
        ScaleRange::new(GRID[lo], GRID[hi])
    })
}

/// One `Or`-free selector: any mix of a scale range and a filter.
fn arb_conjunction(depth: u32) -> impl Strategy<Value = Selector> {
    prop_oneof![
        1 => Just(Selector::Accept),
        2 => arb_scale_range().prop_map(Selector::scale),
        3 => arb_predicate(depth).prop_map(Selector::filter),
        3 => (arb_scale_range(), arb_predicate(depth)).prop_map(|(range, p)| {
            Selector::And(vec![Selector::scale(range), Selector::filter(p)])
        }),
    ]
}

/// No guard most of the time, otherwise one of the non-root states.
fn arb_guard() -> impl Strategy<Value = Option<PseudoClass>> {
    prop_oneof![
        3 => Just(None),
        1 => prop::sample::select(states()[1..].to_vec()).prop_map(Some),
    ]
}

fn guard(selector: Selector, state: &PseudoClass) -> Selector {
    let term = Selector::pseudo_class(state.clone());
    match selector {
        Selector::Accept => term,
        Selector::And(mut children) => {
            children.push(term);
            Selector::And(children)
        }
        other => Selector::And(vec![other, term]),
    }
}

/// A flattened selector: a conjunction, or an `Or` of two of them. A guard
/// state, when drawn, is added to every branch.
pub fn arb_selector(depth: u32) -> impl Strategy<Value = Selector> {
    let body = prop_oneof![
        4 => arb_conjunction(depth),
        1 => (arb_conjunction(depth), arb_conjunction(depth))
            .prop_map(|(a, b)| Selector::Or(vec![a, b])),
    ];
    (body, arb_guard()).prop_map(|(selector, state)| match (selector, state) {
        (selector, None) => selector,
        (Selector::Or(children), Some(state)) => {
            Selector::Or(children.into_iter().map(|c| guard(c, &state)).collect())
        }
        (selector, Some(state)) => guard(selector, &state),
    })
}

/// Up to `max` rules, each with a `stroke` and a `z` property naming its
/// position in the list, and sometimes a `:selected` stroke override.
pub fn arb_rules(max: usize, depth: u32) -> impl Strategy<Value = Vec<Rule>> {
    let spec = (
        arb_selector(depth),
        prop::sample::select(STROKES),
        prop::option::weighted(0.3, prop::sample::select(STROKES)),
    );
    prop::collection::vec(spec, 1..=max).prop_map(|specs| {
        let selected = PseudoClass::new("selected");
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (selector, stroke, picked))| {
                let rule = Rule::new(selector)
                    .property("stroke", stroke)
                    .property("z", i64::try_from(i).unwrap_or(i64::MAX));
                match picked {
                    Some(picked) => rule.pseudo_property(&selected, "stroke", picked),
                    None => rule,
                }
            })
            .collect()
    })
}

/// Rules with their guard states moved into property buckets.
pub fn lift_all(rules: &[Rule]) -> Vec<Rule> {
    rules
        .iter()
        .map(|r| r.lift_pseudo_class().unwrap().into_owned())
        .collect()
}

/// Brute-force cascade over lifted rules: apply every rule whose domain
/// holds `feature` in ascending specificity, declaration order breaking
/// ties. `None` when no such rule has root properties.
pub fn expected_properties(lifted: &[Rule], feature: &Feature) -> Option<Properties> {
    let mut matching: Vec<&Rule> = lifted.iter().filter(|r| r.selector.matches(feature)).collect();
    if !matching.iter().any(|r| r.has_root_properties()) {
        return None;
    }
    matching.sort_by(|a, b| compare_rules(a, b));
    let mut acc = Properties::new();
    for rule in matching {
        for (state, props) in rule.properties.iter() {
            for p in props {
                acc.insert(state, p.clone());
            }
            if state.is_root() {
                continue;
            }
            let nested: Vec<PseudoClass> = acc
                .pseudo_classes()
                .filter(|pc| *pc != state && state.contains(pc))
                .cloned()
                .collect();
            for pc in &nested {
                for p in props {
                    acc.insert(pc, p.clone());
                }
            }
        }
    }
    Some(acc)
}
