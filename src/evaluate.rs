use crate::{Feature, Predicate, Selector, Value};

pub(crate) fn eval_selector(selector: &Selector, feature: &Feature) -> bool {
    match selector {
        Selector::Accept => true,
        Selector::Reject => false,
        Selector::Scale(range) => range.contains(feature.scale()),
        Selector::Filter(predicate) => eval_predicate(predicate, feature),
        Selector::PseudoClass(state) => state.contains(feature.state()),
        Selector::And(children) => children.iter().all(|c| eval_selector(c, feature)),
        Selector::Or(children) => children.iter().any(|c| eval_selector(c, feature)),
    }
}

/// A comparison on a missing attribute, or between incompatible types, is false.
pub(crate) fn eval_predicate(predicate: &Predicate, feature: &Feature) -> bool {
    match predicate {
        Predicate::Include => true,
        Predicate::Exclude => false,
        Predicate::Compare {
            attribute,
            op,
            value,
        } => feature
            .get(attribute)
            .and_then(|actual: &Value| actual.compare(*op, value))
            .unwrap_or(false),
        Predicate::And(children) => children.iter().all(|c| eval_predicate(c, feature)),
        Predicate::Or(children) => children.iter().any(|c| eval_predicate(c, feature)),
        Predicate::Not(inner) => !eval_predicate(inner, feature),
    }
}
