use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A named sub-state of a feature, e.g. `selected` or `selected:hover`.
///
/// Pseudo-classes form a containment tree rooted at [`PseudoClass::root`]: a
/// state contains every state that extends its path.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PseudoClass {
    path: Vec<String>,
}

impl PseudoClass {
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// A top-level state.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self::root().child(name)
    }

    /// A narrower state nested inside this one.
    #[must_use]
    pub fn child(mut self, name: &str) -> Self {
        self.path.push(name.to_owned());
        self
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// True if `other` is this state or one nested inside it.
    #[must_use]
    pub fn contains(&self, other: &PseudoClass) -> bool {
        other.path.starts_with(&self.path)
    }

    /// The narrower of two states when one contains the other, `None` when
    /// they are unrelated.
    #[must_use]
    pub fn narrowest<'a>(&'a self, other: &'a PseudoClass) -> Option<&'a PseudoClass> {
        if self.contains(other) {
            Some(other)
        } else if other.contains(self) {
            Some(self)
        } else {
            None
        }
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}

impl FromStr for PseudoClass {
    type Err = Infallible;

    /// Parses `selected:hover` (a leading `:` is allowed). Empty input is the root.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            path: s
                .split(':')
                .filter(|segment| !segment.is_empty())
                .map(str::to_owned)
                .collect(),
        })
    }
}

impl fmt::Display for PseudoClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, ":root");
        }
        for segment in &self.path {
            write!(f, ":{segment}")?;
        }
        Ok(())
    }
}
