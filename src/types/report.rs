use std::fmt;
use std::time::Duration;

/// Counters collected while compiling a rule list.
///
/// Returned inside [`CompiledStyle`](super::CompiledStyle) by
/// [`StyleCompiler::compile()`](super::StyleCompiler::compile).
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use]
pub struct CompileReport {
    pub(crate) input_rules: usize,
    pub(crate) combinations: usize,
    pub(crate) rejected: usize,
    pub(crate) folded: usize,
    pub(crate) dead_rules: usize,
    pub(crate) emitted: usize,
    pub(crate) duration: Duration,
}

impl CompileReport {
    /// Number of source rules.
    #[must_use]
    pub fn input_rules(&self) -> usize {
        self.input_rules
    }

    /// Rule subsets that survived pruning and were merged into composite rules.
    #[must_use]
    pub fn combinations(&self) -> usize {
        self.combinations
    }

    /// Subsets recorded as never satisfiable during enumeration.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Composite rules dropped by the post-filter pass.
    #[must_use]
    pub fn folded(&self) -> usize {
        self.folded
    }

    /// Composite rules fully shadowed by more specific ones.
    #[must_use]
    pub fn dead_rules(&self) -> usize {
        self.dead_rules
    }

    /// Flat rules in the output.
    #[must_use]
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Wall-clock duration of the compilation.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for CompileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rules -> {} combinations ({} rejected, {} folded) -> {} emitted",
            self.input_rules, self.combinations, self.rejected, self.folded, self.emitted
        )?;
        if self.dead_rules > 0 {
            write!(f, ", {} dead", self.dead_rules)?;
        }
        write!(f, ", duration: {:?}", self.duration)
    }
}
