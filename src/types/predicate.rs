use std::fmt;
use std::ops::Not;

use super::{CompareOp, Feature, Value};

/// Attribute filter predicate.
///
/// Builders only assemble the tree (nested `And`/`Or` are flattened); they
/// never simplify. Reasoning about satisfiability is the job of a
/// [`Simplifier`](crate::Simplifier).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Predicate {
    /// Always true.
    Include,
    /// Always false.
    Exclude,
    Compare {
        attribute: String,
        op: CompareOp,
        value: Value,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    #[must_use]
    pub fn is_include(&self) -> bool {
        matches!(self, Predicate::Include)
    }

    #[must_use]
    pub fn is_exclude(&self) -> bool {
        matches!(self, Predicate::Exclude)
    }

    #[must_use]
    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::all([self, other])
    }

    #[must_use]
    pub fn or(self, other: Predicate) -> Predicate {
        Predicate::any([self, other])
    }

    /// Conjunction of all the given predicates, flattening nested `And`s.
    #[must_use]
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
        let mut children = Vec::new();
        for p in predicates {
            match p {
                Predicate::And(nested) => children.extend(nested),
                other => children.push(other),
            }
        }
        Predicate::And(children)
    }

    /// Disjunction of all the given predicates, flattening nested `Or`s.
    #[must_use]
    pub fn any(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
        let mut children = Vec::new();
        for p in predicates {
            match p {
                Predicate::Or(nested) => children.extend(nested),
                other => children.push(other),
            }
        }
        Predicate::Or(children)
    }

    /// Evaluate against a feature's attributes.
    #[must_use]
    pub fn matches(&self, feature: &Feature) -> bool {
        crate::evaluate::eval_predicate(self, feature)
    }

    /// Number of distinct top-level conjuncts, the predicate part of
    /// [`Specificity`](crate::Specificity).
    #[must_use]
    pub fn conjunct_count(&self) -> usize {
        let mut distinct = Vec::new();
        self.collect_conjuncts(&mut distinct);
        distinct.len()
    }

    /// Push the top-level conjuncts not already in `distinct`.
    pub(crate) fn collect_conjuncts<'a>(&'a self, distinct: &mut Vec<&'a Predicate>) {
        match self {
            Predicate::Include => {}
            Predicate::And(children) => {
                for child in children {
                    child.collect_conjuncts(distinct);
                }
            }
            other => {
                if !distinct.contains(&other) {
                    distinct.push(other);
                }
            }
        }
    }

    /// Visit every attribute comparison in the tree.
    pub(crate) fn for_each_compare<E>(
        &self,
        f: &mut impl FnMut(&str, CompareOp, &Value) -> Result<(), E>,
    ) -> Result<(), E> {
        match self {
            Predicate::Include | Predicate::Exclude => Ok(()),
            Predicate::Compare {
                attribute,
                op,
                value,
            } => f(attribute, *op, value),
            Predicate::And(children) | Predicate::Or(children) => {
                for child in children {
                    child.for_each_compare(f)?;
                }
                Ok(())
            }
            Predicate::Not(inner) => inner.for_each_compare(f),
        }
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Include => write!(f, "INCLUDE"),
            Predicate::Exclude => write!(f, "EXCLUDE"),
            Predicate::Compare {
                attribute,
                op,
                value,
            } => write!(f, "{attribute} {op} {value}"),
            Predicate::And(children) => write_joined(f, children, " AND "),
            Predicate::Or(children) => write_joined(f, children, " OR "),
            Predicate::Not(inner) => write!(f, "NOT ({inner})"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[Predicate], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{child}")?;
    }
    write!(f, ")")
}

/// Intermediate builder for attribute comparisons.
/// Created by [`attr()`]; requires a comparison method to produce a [`Predicate`].
#[derive(Debug, Clone)]
pub struct AttrExpr {
    name: String,
}

impl AttrExpr {
    fn compare(self, op: CompareOp, value: impl Into<Value>) -> Predicate {
        Predicate::Compare {
            attribute: self.name,
            op,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn eq(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Eq, value)
    }

    #[must_use]
    pub fn neq(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Neq, value)
    }

    #[must_use]
    pub fn gt(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Gt, value)
    }

    #[must_use]
    pub fn gte(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Gte, value)
    }

    #[must_use]
    pub fn lt(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Lt, value)
    }

    #[must_use]
    pub fn lte(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Lte, value)
    }
}

#[must_use]
pub fn attr(name: &str) -> AttrExpr {
    AttrExpr {
        name: name.to_owned(),
    }
}
