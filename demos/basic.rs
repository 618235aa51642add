use rulecascade::{
    DefaultSimplifier, Feature, PseudoClass, Rule, ScaleRange, Selector, StyleCompiler, attr,
};
use tracing_subscriber::EnvFilter;

fn main() {
    // RUST_LOG=rulecascade=debug shows the compile report as it is produced.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let selected = PseudoClass::new("selected");
    let rules = vec![
        Rule::new(Selector::Accept)
            .property("stroke", "gray")
            .property("stroke-width", 1_i64)
            .comment("base"),
        Rule::new(attr("kind").eq("road"))
            .property("stroke", "black")
            .pseudo_property(&selected, "stroke", "orange")
            .comment("roads"),
        Rule::new(Selector::And(vec![
            Selector::scale(ScaleRange::below(5000.0)),
            Selector::filter(attr("lanes").gte(4_i64)),
        ]))
        .property("stroke-width", 3_i64)
        .comment("wide roads up close"),
        Rule::new(Selector::And(vec![
            Selector::filter(attr("lit").eq(true)),
            Selector::pseudo_class(selected.clone()),
        ]))
        .property("stroke", "yellow")
        .comment("lit and selected"),
    ];

    let simplifier = DefaultSimplifier::new();
    let style = StyleCompiler::new(&simplifier)
        .compile(&rules)
        .expect("failed to compile stylesheet");

    println!("{style}");
    println!();

    let features = [
        Feature::new(1000.0).set("kind", "road").set("lanes", 4_i64),
        Feature::new(20_000.0).set("kind", "road").set("lanes", 4_i64),
        Feature::new(1000.0).set("kind", "river"),
    ];
    for feature in &features {
        match style.first_match(feature) {
            Some(rule) => println!("{feature:?}\n  -> {rule}"),
            None => println!("{feature:?}\n  -> no rule"),
        }
    }

    let picked = Feature::new(1000.0)
        .set("kind", "road")
        .set("lit", true)
        .in_state(selected);
    println!("{picked:?}\n  -> {:?}", style.properties_for(&picked));
}
