mod compile;
mod coverage;
mod evaluate;
mod power_set;
mod simplify;
mod types;

pub use coverage::{DomainCoverage, DomainElement};
pub use power_set::{DEFAULT_MAX_RULES, PowerSetStats, RulePowerSet};
pub use simplify::{DEFAULT_MAX_CLAUSES, DefaultSimplifier, Simplifier};
pub use types::{
    AttrExpr, AttributeType, CompareOp, CompileError, CompileReport, CompiledStyle, Feature,
    Predicate, Properties, Property, PseudoClass, Rule, ScaleRange, Schema, Selector, Signature,
    SimplifyError, Specificity, StyleCompiler, Value, attr, compare_rules,
};
