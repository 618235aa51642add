use rulecascade::{DefaultSimplifier, Rule, RulePowerSet, ScaleRange, attr};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let rules = vec![
        Rule::new(ScaleRange::below(10_000.0)).property("stroke-width", 1_i64),
        Rule::new(ScaleRange::at_least(10_000.0)).property("stroke-width", 0.5),
        Rule::new(attr("kind").eq("road")).property("stroke", "black"),
        Rule::new(attr("kind").eq("river")).property("stroke", "blue"),
        Rule::new(attr("bridge").eq(true)).property("stroke-dash", "4 2"),
    ];

    let simplifier = DefaultSimplifier::new();
    let mut power_set = RulePowerSet::new(&rules, &simplifier).expect("invalid rule list");

    let composites = power_set.enumerate().expect("enumeration failed");
    println!("{} combinable subsets", composites.len());
    for rule in &composites {
        println!("  {:?} {rule}", rule.ancestry);
    }

    let kept = power_set
        .post_filter(composites)
        .expect("post-filter failed");
    let stats = power_set.stats();
    println!();
    println!(
        "kept {} after folding {}; {} subsets rejected, {} pruned",
        kept.len(),
        stats.folded,
        stats.rejected,
        stats.pruned
    );
}
