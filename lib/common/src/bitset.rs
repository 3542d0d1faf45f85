use crate::error::{UniverseError, UniverseResult};
use crate::words::{self, Ones};
use std::fmt::{Debug, Formatter};

/// The number of bits stored in a single word of a bit set.
pub const WORD_BITS: usize = u64::BITS as usize;

/// A fixed-width set of indices into a universe.
///
/// The width of a [BitSet] is the size of the universe it was built for. Binary operations on
/// sets with different widths panic, as mixing universes is a programming error that would
/// otherwise silently truncate or extend one of the operands. Use [BitSet::check_width] at API
/// boundaries to report such mismatches as an error instead.
///
/// The ordering of bit sets is arbitrary but total. It is only used to obtain a deterministic
/// order of search results.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BitSet {
    width: usize,
    words: Vec<u64>,
}

impl BitSet {
    /// Creates an empty [BitSet] for a universe of `width` elements.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            words: vec![0; words::words_for(width)],
        }
    }

    /// Creates a [BitSet] that contains every element of a universe of `width` elements.
    pub fn full(width: usize) -> Self {
        let mut words = vec![u64::MAX; words::words_for(width)];
        if let Some(last) = words.last_mut() {
            *last &= words::last_word_mask(width);
        }
        Self { width, words }
    }

    /// Creates a [BitSet] of the given `width` that contains `indices`.
    pub fn from_indices(width: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        let mut result = Self::new(width);
        for index in indices {
            result.insert(index);
        }
        result
    }

    /// Creates a [BitSet] from a single word. The `width` must not exceed [WORD_BITS].
    pub fn from_word(width: usize, word: u64) -> Self {
        assert!(width <= WORD_BITS, "A single word holds at most {WORD_BITS} bits.");
        assert_eq!(
            word & !words::last_word_mask(width),
            0,
            "The word has bits beyond the width of the set."
        );
        Self {
            width,
            words: if width == 0 { Vec::new() } else { vec![word] },
        }
    }

    pub(crate) fn from_words(width: usize, words: Vec<u64>) -> Self {
        debug_assert_eq!(words.len(), words::words_for(width), "Invalid number of words.");
        Self { width, words }
    }

    /// Returns the set as a single word, if the universe fits into one.
    pub fn to_word(&self) -> Option<u64> {
        match self.words.as_slice() {
            [] => Some(0),
            [word] => Some(*word),
            _ => None,
        }
    }

    /// The size of the universe this set was built for.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The number of elements in the set.
    pub fn cardinality(&self) -> usize {
        words::count_ones(&self.words)
    }

    pub fn is_empty(&self) -> bool {
        words::is_empty(&self.words)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.assert_in_range(index);
        words::contains(&self.words, index)
    }

    /// Inserts `index` and returns whether it was not part of the set before.
    pub fn insert(&mut self, index: usize) -> bool {
        self.assert_in_range(index);
        words::insert(&mut self.words, index)
    }

    /// Removes `index` and returns whether it was part of the set before.
    pub fn remove(&mut self, index: usize) -> bool {
        self.assert_in_range(index);
        words::remove(&mut self.words, index)
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    pub fn union_with(&mut self, other: &BitSet) {
        self.assert_same_width(other);
        words::union_with(&mut self.words, &other.words);
    }

    pub fn intersect_with(&mut self, other: &BitSet) {
        self.assert_same_width(other);
        words::intersect_with(&mut self.words, &other.words);
    }

    pub fn difference_with(&mut self, other: &BitSet) {
        self.assert_same_width(other);
        words::difference_with(&mut self.words, &other.words);
    }

    #[must_use]
    pub fn union(&self, other: &BitSet) -> BitSet {
        let mut result = self.clone();
        result.union_with(other);
        result
    }

    #[must_use]
    pub fn intersection(&self, other: &BitSet) -> BitSet {
        let mut result = self.clone();
        result.intersect_with(other);
        result
    }

    #[must_use]
    pub fn difference(&self, other: &BitSet) -> BitSet {
        let mut result = self.clone();
        result.difference_with(other);
        result
    }

    pub fn intersects(&self, other: &BitSet) -> bool {
        self.assert_same_width(other);
        words::intersects(&self.words, &other.words)
    }

    /// Returns true if every element of `self` is also part of `other`.
    pub fn is_subset(&self, other: &BitSet) -> bool {
        self.assert_same_width(other);
        words::is_subset(&self.words, &other.words)
    }

    /// Returns true if every element of `other` is also part of `self`.
    pub fn is_superset(&self, other: &BitSet) -> bool {
        other.is_subset(self)
    }

    /// Iterates over the elements in ascending order.
    pub fn iter(&self) -> Ones<'_> {
        Ones::new(&self.words)
    }

    /// Returns the smallest element of the set.
    pub fn first(&self) -> Option<usize> {
        self.iter().next()
    }

    pub fn as_words(&self) -> &[u64] {
        &self.words
    }

    /// Returns a copy of this set for a universe that has grown to `width` elements.
    ///
    /// Universes are append-only, so shrinking a set is not supported.
    #[must_use]
    pub fn resized(&self, width: usize) -> BitSet {
        assert!(
            width >= self.width,
            "Universes only grow: cannot resize a set of width {} to {width}.",
            self.width
        );
        let mut words = self.words.clone();
        words.resize(words::words_for(width), 0);
        Self { width, words }
    }

    /// Checks that this set was built for a universe of `width` elements.
    pub fn check_width(&self, width: usize) -> UniverseResult<()> {
        UniverseError::check_width(width, self.width)
    }

    fn assert_in_range(&self, index: usize) {
        assert!(
            index < self.width,
            "Index {index} is out of range for a universe of {} elements.",
            self.width
        );
    }

    fn assert_same_width(&self, other: &BitSet) {
        assert_eq!(
            self.width, other.width,
            "Bit sets of different universes cannot be combined."
        );
    }
}

impl Debug for BitSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a BitSet {
    type Item = usize;
    type IntoIter = Ones<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
