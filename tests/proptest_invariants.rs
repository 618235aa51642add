mod strategies;

use proptest::prelude::*;
use rulecascade::{
    DefaultSimplifier, DomainCoverage, Predicate, Rule, RulePowerSet, Signature, Simplifier,
    StyleCompiler,
};
use strategies::{all_features, arb_predicate, arb_rules, expected_properties, lift_all, schema};

// ---------------------------------------------------------------------------
// Invariant 1: Simplification preserves meaning
//
// The simplified predicate matches exactly the features the original does,
// so in particular it is only `Exclude` for unsatisfiable input.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn simplify_preserves_semantics(p in arb_predicate(3)) {
        let simplifier = DefaultSimplifier::with_schema(schema());
        let simplified = simplifier.simplify(&p).unwrap();
        for feature in all_features() {
            prop_assert_eq!(
                p.matches(&feature),
                simplified.matches(&feature),
                "{} simplified to {} disagrees on {:?}", p, simplified, feature
            );
        }
    }

    #[test]
    fn simplify_decides_sentinels(p in arb_predicate(2)) {
        let simplifier = DefaultSimplifier::new();
        let features = all_features();
        let simplified = simplifier.simplify(&p).unwrap();
        if simplified == Predicate::Exclude {
            prop_assert!(features.iter().all(|f| !p.matches(f)));
        }
        if simplified == Predicate::Include {
            prop_assert!(features.iter().all(|f| p.matches(f)));
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant 2: Domain coverage is complete and exclusive
//
// After every add_rule the claimed elements cover exactly the union of the
// scale × filter domains added so far, and no point lies in two elements.
// Guard states do not narrow the domain.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn coverage_complete_and_exclusive(rules in arb_rules(5, 2)) {
        let simplifier = DefaultSimplifier::new();
        let mut coverage = DomainCoverage::new(&simplifier);
        let features = all_features();
        let lifted = lift_all(&rules);
        for (n, rule) in rules.iter().enumerate() {
            coverage.add_rule(rule).unwrap();
            for feature in &features {
                let expected = lifted[..=n].iter().any(|r| r.selector.matches(feature));
                prop_assert_eq!(coverage.covers(feature), expected);
                let claimed = coverage.elements().iter().filter(|e| e.matches(feature)).count();
                prop_assert!(claimed <= 1, "{} elements claim {:?}", claimed, feature);
            }
        }
    }

    #[test]
    fn derived_rules_partition_new_area(rules in arb_rules(4, 1)) {
        let simplifier = DefaultSimplifier::new();
        let mut coverage = DomainCoverage::new(&simplifier);
        let features = all_features();
        let lifted = lift_all(&rules);
        for (n, rule) in rules.iter().enumerate() {
            let derived = coverage.add_rule(rule).unwrap();
            for feature in &features {
                let earlier = lifted[..n].iter().any(|r| r.selector.matches(feature));
                let fresh = lifted[n].selector.matches(feature) && !earlier;
                let hits = derived.iter().filter(|d| d.selector.matches(feature)).count();
                prop_assert_eq!(hits, usize::from(fresh));
            }
        }
    }

    #[test]
    fn re_added_rule_is_dead(rules in arb_rules(3, 1)) {
        let simplifier = DefaultSimplifier::new();
        let mut coverage = DomainCoverage::new(&simplifier);
        for rule in &rules {
            coverage.add_rule(rule).unwrap();
        }
        for rule in &rules {
            prop_assert!(coverage.add_rule(rule).unwrap().is_empty());
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant 3: Power-set soundness and completeness
//
// Every composite can match something, and every set of rules whose
// domains hold a point together shows up as a composite keyed on that
// domain alone.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn power_set_sound_and_complete(rules in arb_rules(5, 1)) {
        let simplifier = DefaultSimplifier::new();
        let composites = RulePowerSet::new(&rules, &simplifier).unwrap().enumerate().unwrap();
        for composite in &composites {
            prop_assert!(!composite.selector.is_reject());
            prop_assert!(!composite.selector.has_pseudo_class());
        }
        let lifted = lift_all(&rules);
        for feature in all_features() {
            let matching: Vec<usize> = lifted
                .iter()
                .enumerate()
                .filter(|(_, r)| r.selector.matches(&feature))
                .map(|(i, _)| i)
                .collect();
            if matching.is_empty() {
                continue;
            }
            let composite = composites.iter().find(|c| c.ancestry == matching);
            prop_assert!(composite.is_some(), "no composite for {:?}", matching);
            if let Some(composite) = composite {
                prop_assert!(composite.selector.matches(&feature));
            }
        }
    }

    #[test]
    fn post_filter_is_idempotent(rules in arb_rules(4, 1)) {
        let simplifier = DefaultSimplifier::new();
        let mut power_set = RulePowerSet::new(&rules, &simplifier).unwrap();
        let once = power_set.build().unwrap();
        let twice = power_set.post_filter(once.clone()).unwrap();
        prop_assert_eq!(once, twice);
    }
}

// ---------------------------------------------------------------------------
// Invariant 4: Compiled output resolves the cascade
//
// At most one compiled rule matches any point, and its property buckets are
// what applying every source rule whose domain holds the point, in
// specificity order, gives.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn compiled_first_match_resolves_cascade(rules in arb_rules(4, 1)) {
        let simplifier = DefaultSimplifier::new();
        let style = StyleCompiler::new(&simplifier).compile(&rules).unwrap();
        let lifted = lift_all(&rules);
        for feature in all_features() {
            let hits = style.rules().iter().filter(|r| r.selector.matches(&feature)).count();
            prop_assert!(hits <= 1, "{} compiled rules match {:?}", hits, feature);
            let expected = expected_properties(&lifted, &feature);
            let actual = style.first_match(&feature).map(|r| r.properties.clone());
            prop_assert_eq!(
                style.properties_for(&feature),
                expected.as_ref().and_then(|p| p.get(feature.state()))
            );
            prop_assert_eq!(actual, expected);
        }
    }

    #[test]
    fn flatten_is_first_match_of_input(rules in arb_rules(5, 1)) {
        let simplifier = DefaultSimplifier::new();
        let style = StyleCompiler::new(&simplifier).flatten(&rules).unwrap();
        let lifted = lift_all(&rules);
        for feature in all_features() {
            let expected = lifted
                .iter()
                .find(|r| r.has_root_properties() && r.selector.matches(&feature))
                .map(|r| r.properties.clone());
            let actual = style.first_match(&feature).map(|r| r.properties.clone());
            prop_assert_eq!(actual, expected);
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant 5: Signature enumeration
//
// Counting visits every non-empty subset exactly once.
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn increment_visits_every_subset(n in 1_usize..=8) {
        let mut signature = Signature::new(n);
        let mut seen = std::collections::HashSet::new();
        while signature.increment() {
            prop_assert!(seen.insert(signature.clone()));
        }
        prop_assert_eq!(seen.len(), (1_usize << n) - 1);
    }

    #[test]
    fn contains_matches_subset_relation(a in prop::collection::vec(any::<bool>(), 6), b in prop::collection::vec(any::<bool>(), 6)) {
        let sa = Signature::from_indices(6, (0..6).filter(|&i| a[i]));
        let sb = Signature::from_indices(6, (0..6).filter(|&i| b[i]));
        let subset = (0..6).all(|i| !b[i] || a[i]);
        let nonempty = b.iter().any(|&x| x);
        prop_assert_eq!(sa.contains(&sb, 6), subset && nonempty);
    }
}

#[test]
fn compiled_rules_keep_ancestry_of_input_rules() {
    let simplifier = DefaultSimplifier::new();
    let rules = vec![
        Rule::new(rulecascade::attr("kind").eq("road")).property("stroke", "black"),
        Rule::new(rulecascade::attr("lit").eq(true)).property("stroke", "yellow"),
    ];
    let style = StyleCompiler::new(&simplifier).compile(&rules).unwrap();
    for rule in style.rules() {
        assert!(!rule.ancestry.is_empty());
        assert!(rule.ancestry.iter().all(|&i| i < rules.len()));
    }
}
