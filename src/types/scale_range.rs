use std::cmp::Ordering;
use std::fmt;

/// A continuous interval of scale denominators with independently inclusive
/// bounds.
///
/// The universal range is `[0, +inf)`. An infinite upper bound is always
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScaleRange {
    min: f64,
    min_included: bool,
    max: f64,
    max_included: bool,
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self::universal()
    }
}

impl ScaleRange {
    /// `[0, +inf)`
    #[must_use]
    pub const fn universal() -> Self {
        Self {
            min: 0.0,
            min_included: true,
            max: f64::INFINITY,
            max_included: false,
        }
    }

    /// `[min, max)`
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self::with_bounds(min, true, max, false)
    }

    #[must_use]
    pub fn with_bounds(min: f64, min_included: bool, max: f64, max_included: bool) -> Self {
        Self {
            min,
            min_included,
            max,
            max_included: max_included && max.is_finite(),
        }
    }

    /// `[0, max)`
    #[must_use]
    pub fn below(max: f64) -> Self {
        Self::new(0.0, max)
    }

    /// `[min, +inf)`
    #[must_use]
    pub fn at_least(min: f64) -> Self {
        Self::new(min, f64::INFINITY)
    }

    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    #[must_use]
    pub fn is_min_included(&self) -> bool {
        self.min_included
    }

    #[must_use]
    pub fn is_max_included(&self) -> bool {
        self.max_included
    }

    #[must_use]
    pub fn is_universal(&self) -> bool {
        *self == Self::universal()
    }

    /// True when no scale value lies in the range. NaN bounds count as empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self.min.partial_cmp(&self.max) {
            Some(Ordering::Less) => false,
            Some(Ordering::Equal) => !(self.min_included && self.max_included),
            _ => true,
        }
    }

    #[must_use]
    pub fn contains(&self, scale: f64) -> bool {
        let above_min = scale > self.min || (self.min_included && scale == self.min);
        let below_max = scale < self.max || (self.max_included && scale == self.max);
        above_min && below_max
    }

    /// Distance between the bounds; infinite for open-ended ranges.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// The overlap of two ranges, or `None` when they are disjoint
    /// (touching exclusive bounds included).
    #[must_use]
    pub fn intersect(&self, other: &ScaleRange) -> Option<ScaleRange> {
        let (min, min_included) = match self.min.partial_cmp(&other.min) {
            Some(Ordering::Greater) => (self.min, self.min_included),
            Some(Ordering::Less) => (other.min, other.min_included),
            _ => (self.min, self.min_included && other.min_included),
        };
        let (max, max_included) = match self.max.partial_cmp(&other.max) {
            Some(Ordering::Less) => (self.max, self.max_included),
            Some(Ordering::Greater) => (other.max, other.max_included),
            _ => (self.max, self.max_included && other.max_included),
        };
        let range = Self::with_bounds(min, min_included, max, max_included);
        (!range.is_empty()).then_some(range)
    }

    /// The parts of this range outside `other`: zero, one or two ranges whose
    /// union is exactly `self \ other`. An empty result means `other`
    /// contains this range.
    #[must_use]
    pub fn subtract(&self, other: &ScaleRange) -> Vec<ScaleRange> {
        if self.is_empty() {
            return Vec::new();
        }
        let Some(common) = self.intersect(other) else {
            return vec![*self];
        };

        let mut parts = Vec::with_capacity(2);
        let below = Self::with_bounds(self.min, self.min_included, common.min, !common.min_included);
        if !below.is_empty() {
            parts.push(below);
        }
        let above = Self::with_bounds(common.max, !common.max_included, self.max, self.max_included);
        if !above.is_empty() {
            parts.push(above);
        }
        parts
    }

    /// Smallest range containing both.
    #[must_use]
    pub fn hull(&self, other: &ScaleRange) -> ScaleRange {
        let (min, min_included) = match self.min.partial_cmp(&other.min) {
            Some(Ordering::Less) => (self.min, self.min_included),
            Some(Ordering::Greater) => (other.min, other.min_included),
            _ => (self.min, self.min_included || other.min_included),
        };
        let (max, max_included) = match self.max.partial_cmp(&other.max) {
            Some(Ordering::Greater) => (self.max, self.max_included),
            Some(Ordering::Less) => (other.max, other.max_included),
            _ => (self.max, self.max_included || other.max_included),
        };
        Self::with_bounds(min, min_included, max, max_included)
    }

    /// Orders by lower bound value, then inclusive before exclusive.
    #[must_use]
    pub fn compare_lower_bound(&self, other: &ScaleRange) -> Ordering {
        self.min
            .total_cmp(&other.min)
            .then_with(|| other.min_included.cmp(&self.min_included))
    }
}

impl fmt::Display for ScaleRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.min_included { '[' } else { '(' };
        let close = if self.max_included { ']' } else { ')' };
        write!(f, "{open}{}, {}{close}", self.min, self.max)
    }
}
