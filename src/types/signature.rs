use std::fmt;

const WORD_BITS: usize = 64;

/// Fixed-size bit vector naming a subset of an input rule list.
///
/// Bit `i` set means rule `i` is a member of the subset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    words: Vec<u64>,
    len: usize,
}

impl Signature {
    /// The empty subset of a list of `len` rules.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(WORD_BITS)],
            len,
        }
    }

    /// A subset with the given members.
    ///
    /// # Panics
    ///
    /// Panics if an index is not below `len`.
    #[must_use]
    pub fn from_indices(len: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        let mut signature = Self::new(len);
        for idx in indices {
            signature.set(idx, true);
        }
        signature
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-width signature. See [`count_ones`](Self::count_ones)
    /// for the empty subset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether bit `idx` is set; false past the end.
    #[must_use]
    pub fn get(&self, idx: usize) -> bool {
        idx < self.len && self.words[idx / WORD_BITS] & (1_u64 << (idx % WORD_BITS)) != 0
    }

    /// # Panics
    ///
    /// Panics if `idx` is not below [`len`](Self::len).
    pub fn set(&mut self, idx: usize, value: bool) {
        assert!(idx < self.len, "bit {idx} out of range for signature of {} bits", self.len);
        let mask = 1_u64 << (idx % WORD_BITS);
        if value {
            self.words[idx / WORD_BITS] |= mask;
        } else {
            self.words[idx / WORD_BITS] &= !mask;
        }
    }

    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Indices of the set bits, ascending.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(|&i| self.get(i))
    }

    /// Advance to the next subset in binary counting order, bit 0 being the
    /// least significant. Returns `false` when the counter wraps back to the
    /// empty subset.
    pub fn increment(&mut self) -> bool {
        for i in 0..self.len {
            if self.get(i) {
                self.set(i, false);
            } else {
                self.set(i, true);
                return true;
            }
        }
        false
    }

    /// Whether this subset includes every member of `other` among the first
    /// `k` bits. An `other` with no member in that window is contained by
    /// nothing.
    #[must_use]
    pub fn contains(&self, other: &Signature, k: usize) -> bool {
        let window = k.min(self.len).min(other.len);
        let mut found = false;
        for i in 0..window {
            let theirs = other.get(i);
            if theirs && !self.get(i) {
                return false;
            }
            found |= theirs;
        }
        found
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.len {
            write!(f, "{}", if self.get(i) { '1' } else { '0' })?;
        }
        Ok(())
    }
}
