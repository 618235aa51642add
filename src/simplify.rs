//! Static predicate simplification.
//!
//! The compiler never evaluates predicates against data. Everything it knows
//! about whether a combination of filters can match comes from a
//! [`Simplifier`]: a predicate simplified to [`Predicate::Exclude`] is
//! unsatisfiable, anything else is assumed to match something.

use std::cmp::Ordering;

use crate::{CompareOp, Predicate, Schema, SimplifyError, Value};

/// Predicate simplification service, keyed to a target schema.
///
/// Implementations must be sound: `simplify` may only return
/// [`Predicate::Exclude`] for predicates that match no feature, and its
/// result must match exactly the features the input matches.
pub trait Simplifier {
    /// # Errors
    ///
    /// Returns [`SimplifyError`] when the predicate cannot be simplified,
    /// e.g. it references attributes outside the target schema.
    fn simplify(&self, predicate: &Predicate) -> Result<Predicate, SimplifyError>;
}

/// Clause ceiling used by [`DefaultSimplifier::new`].
pub const DEFAULT_MAX_CLAUSES: usize = 256;

/// Disjunctive-normal-form simplifier.
///
/// Pushes negations down to comparisons, expands to a disjunction of
/// conjunctive clauses, drops clauses that are statically contradictory and
/// merges what is left. Predicates whose normal form would exceed the clause
/// ceiling only get a structural cleanup.
#[derive(Debug, Clone)]
pub struct DefaultSimplifier {
    schema: Option<Schema>,
    max_clauses: usize,
}

impl Default for DefaultSimplifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultSimplifier {
    /// A simplifier with no schema: any attribute and literal type is accepted.
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema: None,
            max_clauses: DEFAULT_MAX_CLAUSES,
        }
    }

    /// A simplifier that validates attribute names and literal types.
    #[must_use]
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema: Some(schema),
            ..Self::new()
        }
    }

    /// Override the clause ceiling.
    #[must_use]
    pub fn max_clauses(mut self, max_clauses: usize) -> Self {
        self.max_clauses = max_clauses.max(1);
        self
    }

    fn validate(&self, predicate: &Predicate) -> Result<(), SimplifyError> {
        let Some(schema) = &self.schema else {
            return Ok(());
        };
        predicate.for_each_compare(&mut |attribute, _op, value| match schema.get(attribute) {
            None => Err(SimplifyError::UnknownAttribute {
                attribute: attribute.to_owned(),
            }),
            Some(ty) if !ty.accepts(value) => Err(SimplifyError::TypeMismatch {
                attribute: attribute.to_owned(),
                expected: ty.to_string(),
                found: value.type_name().to_owned(),
            }),
            Some(_) => Ok(()),
        })
    }

    /// Disjunctive normal form of `predicate` (negated when `positive` is
    /// false), with contradictory clauses dropped. `None` on overflow.
    fn dnf<'a>(&self, predicate: &'a Predicate, positive: bool) -> Option<Vec<Clause<'a>>> {
        match (predicate, positive) {
            (Predicate::Include, true) | (Predicate::Exclude, false) => Some(vec![Vec::new()]),
            (Predicate::Include, false) | (Predicate::Exclude, true) => Some(Vec::new()),
            (
                Predicate::Compare {
                    attribute,
                    op,
                    value,
                },
                positive,
            ) => Some(vec![vec![Literal {
                positive,
                attribute,
                op: *op,
                value,
            }]]),
            (Predicate::Not(inner), positive) => self.dnf(inner, !positive),
            (Predicate::And(children), true) | (Predicate::Or(children), false) => {
                self.conjunction(children, positive)
            }
            (Predicate::Or(children), true) | (Predicate::And(children), false) => {
                let mut clauses = Vec::new();
                for child in children {
                    clauses.extend(self.dnf(child, positive)?);
                    if clauses.len() > self.max_clauses {
                        return None;
                    }
                }
                Some(clauses)
            }
        }
    }

    fn conjunction<'a>(&self, children: &'a [Predicate], positive: bool) -> Option<Vec<Clause<'a>>> {
        let mut acc: Vec<Clause<'a>> = vec![Vec::new()];
        for child in children {
            let child_clauses = self.dnf(child, positive)?;
            let mut next = Vec::new();
            for a in &acc {
                for b in &child_clauses {
                    let mut clause = a.clone();
                    for literal in b {
                        if !clause.contains(literal) {
                            clause.push(literal.clone());
                        }
                    }
                    if is_satisfiable(&clause) {
                        next.push(clause);
                        if next.len() > self.max_clauses {
                            return None;
                        }
                    }
                }
            }
            acc = next;
            if acc.is_empty() {
                break;
            }
        }
        Some(acc)
    }
}

impl Simplifier for DefaultSimplifier {
    fn simplify(&self, predicate: &Predicate) -> Result<Predicate, SimplifyError> {
        self.validate(predicate)?;
        let Some(clauses) = self.dnf(predicate, true) else {
            tracing::trace!("normal form exceeds {} clauses, simplifying structurally", self.max_clauses);
            return Ok(structural(predicate));
        };
        let clauses: Vec<Clause<'_>> = clauses
            .into_iter()
            .filter(|c| is_satisfiable(c))
            .map(pin_equalities)
            .collect();
        Ok(rebuild(merge_clauses(clauses)))
    }
}

/// A comparison or its negation.
#[derive(Debug, Clone, PartialEq)]
struct Literal<'a> {
    positive: bool,
    attribute: &'a str,
    op: CompareOp,
    value: &'a Value,
}

impl Literal<'_> {
    fn is_complement_of(&self, other: &Literal<'_>) -> bool {
        self.positive != other.positive
            && self.attribute == other.attribute
            && self.op == other.op
            && self.value == other.value
    }

    fn to_predicate(&self) -> Predicate {
        let compare = Predicate::Compare {
            attribute: self.attribute.to_owned(),
            op: self.op,
            value: self.value.clone(),
        };
        if self.positive { compare } else { !compare }
    }
}

type Clause<'a> = Vec<Literal<'a>>;

/// Whether a conjunction of literals can hold for some feature.
///
/// Positive literals require the attribute to be present with a compatible
/// value; negative ones hold when it is absent. Only contradictions that are
/// certain are reported.
fn is_satisfiable(clause: &[Literal<'_>]) -> bool {
    for (i, literal) in clause.iter().enumerate() {
        for other in &clause[i + 1..] {
            if literal.attribute != other.attribute {
                continue;
            }
            if literal.is_complement_of(other) {
                return false;
            }
            if literal.positive
                && other.positive
                && literal.value.partial_cmp_value(other.value).is_none()
            {
                return false;
            }
        }
    }

    for pin in clause.iter().filter(|l| l.positive && l.op == CompareOp::Eq) {
        for other in clause.iter().filter(|l| l.attribute == pin.attribute) {
            let holds = pin.value.compare(other.op, other.value);
            if other.positive && holds != Some(true) {
                return false;
            }
            if !other.positive && holds == Some(true) {
                return false;
            }
        }
    }

    let positives = || clause.iter().filter(|l| l.positive);
    for lower in positives().filter(|l| l.op.is_lower_bound()) {
        for upper in positives().filter(|l| l.op.is_upper_bound() && l.attribute == lower.attribute) {
            match lower.value.partial_cmp_value(upper.value) {
                None | Some(Ordering::Greater) => return false,
                Some(Ordering::Equal) if lower.op == CompareOp::Gt || upper.op == CompareOp::Lt => {
                    return false;
                }
                _ => {}
            }
        }
    }
    true
}

/// In a satisfiable clause, an equality decides every other literal on the
/// same attribute, so those can go.
fn pin_equalities(clause: Clause<'_>) -> Clause<'_> {
    let pinned: Vec<&str> = clause
        .iter()
        .filter(|l| l.positive && l.op == CompareOp::Eq)
        .map(|l| l.attribute)
        .collect();
    if pinned.is_empty() {
        return clause;
    }
    let mut kept: Clause<'_> = Vec::with_capacity(clause.len());
    for literal in clause {
        if !pinned.contains(&literal.attribute) {
            kept.push(literal);
        } else if literal.positive
            && literal.op == CompareOp::Eq
            && !kept.iter().any(|k| k.attribute == literal.attribute)
        {
            kept.push(literal);
        }
    }
    kept
}

fn subsumes(small: &[Literal<'_>], big: &[Literal<'_>]) -> bool {
    small.iter().all(|l| big.contains(l))
}

/// Drop clauses implied by a smaller one, including duplicates.
fn absorb(clauses: Vec<Clause<'_>>) -> Vec<Clause<'_>> {
    let mut kept: Vec<Clause<'_>> = Vec::with_capacity(clauses.len());
    for clause in clauses {
        if kept.iter().any(|k| subsumes(k, &clause)) {
            continue;
        }
        kept.retain(|k| !subsumes(&clause, k));
        kept.push(clause);
    }
    kept
}

/// Repeatedly replace `(A AND x) OR (A AND NOT x)` with `A`.
fn merge_clauses(clauses: Vec<Clause<'_>>) -> Vec<Clause<'_>> {
    let mut clauses = absorb(clauses);
    'outer: loop {
        for i in 0..clauses.len() {
            for j in i + 1..clauses.len() {
                if let Some(merged) = resolve(&clauses[i], &clauses[j]) {
                    clauses.remove(j);
                    clauses[i] = merged;
                    clauses = absorb(clauses);
                    continue 'outer;
                }
            }
        }
        return clauses;
    }
}

fn resolve<'a>(a: &Clause<'a>, b: &Clause<'a>) -> Option<Clause<'a>> {
    if a.len() != b.len() {
        return None;
    }
    let mut pivot = None;
    for (idx, literal) in a.iter().enumerate() {
        if b.contains(literal) {
            continue;
        }
        if pivot.is_some() || !b.iter().any(|other| other.is_complement_of(literal)) {
            return None;
        }
        pivot = Some(idx);
    }
    let pivot = pivot?;
    let mut merged = a.clone();
    merged.remove(pivot);
    Some(merged)
}

fn rebuild(clauses: Vec<Clause<'_>>) -> Predicate {
    if clauses.iter().any(Vec::is_empty) {
        return Predicate::Include;
    }
    let mut disjuncts: Vec<Predicate> = clauses
        .iter()
        .map(|clause| {
            let mut conjuncts: Vec<Predicate> = clause.iter().map(Literal::to_predicate).collect();
            if conjuncts.len() == 1 {
                conjuncts.remove(0)
            } else {
                Predicate::And(conjuncts)
            }
        })
        .collect();
    match disjuncts.len() {
        0 => Predicate::Exclude,
        1 => disjuncts.remove(0),
        _ => Predicate::Or(disjuncts),
    }
}

/// Flattening, sentinel absorption and double negation only. Never decides
/// satisfiability beyond what is syntactically obvious.
fn structural(predicate: &Predicate) -> Predicate {
    match predicate {
        Predicate::Not(inner) => match structural(inner) {
            Predicate::Include => Predicate::Exclude,
            Predicate::Exclude => Predicate::Include,
            Predicate::Not(x) => *x,
            other => !other,
        },
        Predicate::And(children) => {
            let mut flat = Vec::with_capacity(children.len());
            for child in children.iter().map(structural) {
                match child {
                    Predicate::Include => {}
                    Predicate::Exclude => return Predicate::Exclude,
                    Predicate::And(nested) => flat.extend(nested),
                    other => flat.push(other),
                }
            }
            match flat.len() {
                0 => Predicate::Include,
                1 => flat.remove(0),
                _ => Predicate::And(flat),
            }
        }
        Predicate::Or(children) => {
            let mut flat = Vec::with_capacity(children.len());
            for child in children.iter().map(structural) {
                match child {
                    Predicate::Exclude => {}
                    Predicate::Include => return Predicate::Include,
                    Predicate::Or(nested) => flat.extend(nested),
                    other => flat.push(other),
                }
            }
            match flat.len() {
                0 => Predicate::Exclude,
                1 => flat.remove(0),
                _ => Predicate::Or(flat),
            }
        }
        leaf => leaf.clone(),
    }
}
