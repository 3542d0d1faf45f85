//! Word-level kernels shared by [BitSet](crate::BitSet) and the segments of an
//! [AlignedBitSet](crate::AlignedBitSet).
//!
//! All binary kernels expect slices of equal length. Bits beyond the logical width of a set are
//! always zero, so the kernels can operate on whole words.

use crate::bitset::WORD_BITS;

pub(crate) fn words_for(bits: usize) -> usize {
    bits.div_ceil(WORD_BITS)
}

/// A mask that keeps the valid bits of the last word of a set with `bits` bits.
pub(crate) fn last_word_mask(bits: usize) -> u64 {
    match bits % WORD_BITS {
        0 => u64::MAX,
        rest => (1_u64 << rest) - 1,
    }
}

pub(crate) fn contains(words: &[u64], bit: usize) -> bool {
    words[bit / WORD_BITS] & (1_u64 << (bit % WORD_BITS)) != 0
}

pub(crate) fn insert(words: &mut [u64], bit: usize) -> bool {
    let mask = 1_u64 << (bit % WORD_BITS);
    let word = &mut words[bit / WORD_BITS];
    let inserted = *word & mask == 0;
    *word |= mask;
    inserted
}

pub(crate) fn remove(words: &mut [u64], bit: usize) -> bool {
    let mask = 1_u64 << (bit % WORD_BITS);
    let word = &mut words[bit / WORD_BITS];
    let removed = *word & mask != 0;
    *word &= !mask;
    removed
}

pub(crate) fn union_with(dst: &mut [u64], src: &[u64]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d |= *s;
    }
}

pub(crate) fn intersect_with(dst: &mut [u64], src: &[u64]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d &= *s;
    }
}

pub(crate) fn difference_with(dst: &mut [u64], src: &[u64]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d &= !*s;
    }
}

pub(crate) fn intersects(lhs: &[u64], rhs: &[u64]) -> bool {
    lhs.iter().zip(rhs).any(|(l, r)| l & r != 0)
}

/// Returns true if `lhs` is a subset of `rhs`.
pub(crate) fn is_subset(lhs: &[u64], rhs: &[u64]) -> bool {
    lhs.iter().zip(rhs).all(|(l, r)| l & !r == 0)
}

pub(crate) fn is_empty(words: &[u64]) -> bool {
    words.iter().all(|w| *w == 0)
}

pub(crate) fn count_ones(words: &[u64]) -> usize {
    words.iter().map(|w| w.count_ones() as usize).sum()
}

/// Iterates over the indices of the set bits in ascending order.
#[derive(Clone, Debug)]
pub struct Ones<'a> {
    words: &'a [u64],
    next_word: usize,
    base: usize,
    current: u64,
}

impl<'a> Ones<'a> {
    pub(crate) fn new(words: &'a [u64]) -> Self {
        Self {
            words,
            next_word: 0,
            base: 0,
            current: 0,
        }
    }
}

impl Iterator for Ones<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current != 0 {
                let offset = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some(self.base + offset);
            }

            let word = *self.words.get(self.next_word)?;
            self.base = self.next_word * WORD_BITS;
            self.next_word += 1;
            self.current = word;
        }
    }
}
