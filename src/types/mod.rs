mod compiler;
mod error;
mod feature;
mod predicate;
mod pseudo_class;
mod report;
mod rule;
mod scale_range;
mod schema;
mod selector;
mod signature;
mod specificity;
mod value;

pub use compiler::{CompiledStyle, StyleCompiler};
pub use error::{CompileError, SimplifyError};
pub use feature::Feature;
pub use predicate::{AttrExpr, Predicate, attr};
pub use pseudo_class::PseudoClass;
pub use report::CompileReport;
pub use rule::{Properties, Property, Rule};
pub use scale_range::ScaleRange;
pub use schema::{AttributeType, Schema};
pub use selector::Selector;
pub(crate) use selector::Conjunction;
pub use signature::Signature;
pub use specificity::{Specificity, compare_rules};
pub use value::{CompareOp, Value};
