use thiserror::Error;

/// Errors reported by a [`Simplifier`](crate::Simplifier).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimplifyError {
    #[error("attribute '{attribute}' is not part of the target schema")]
    UnknownAttribute { attribute: String },

    #[error("attribute '{attribute}' is declared as {expected} but compared with a {found} value")]
    TypeMismatch {
        attribute: String,
        expected: String,
        found: String,
    },

    #[error("predicate simplification failed: {reason}")]
    Failed { reason: String },
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("unexpected or selector nested inside another one: {selector}")]
    NestedOr { selector: String },

    #[error("selector guards different pseudo-classes in its branches: {selector}")]
    MixedPseudoClasses { selector: String },

    #[error("too many rules to combine: {count} exceeds the limit of {limit}")]
    TooManyRules { count: usize, limit: usize },

    #[error(transparent)]
    Simplify(#[from] SimplifyError),
}
