use crate::words::{self, Ones};
use crate::BitSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Segment {
    word_offset: usize,
    word_count: usize,
    width: usize,
}

/// Describes how several logical bit sets are packed into a single [AlignedBitSet].
///
/// Every segment starts at a word boundary, so operations on a segment never have to shift bits.
/// Segments are addressed by their position in the list of widths passed to
/// [SegmentLayout::new].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentLayout {
    segments: Vec<Segment>,
    total_words: usize,
}

impl SegmentLayout {
    /// Creates a layout with one segment per entry in `widths`.
    pub fn new(widths: &[usize]) -> Self {
        let mut segments = Vec::with_capacity(widths.len());
        let mut word_offset = 0;
        for &width in widths {
            let word_count = words::words_for(width);
            segments.push(Segment {
                word_offset,
                word_count,
                width,
            });
            word_offset += word_count;
        }

        Self {
            segments,
            total_words: word_offset,
        }
    }

    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// The number of bits in `segment`.
    pub fn segment_width(&self, segment: usize) -> usize {
        self.segments[segment].width
    }

    /// The number of words of a bit set with this layout.
    pub fn total_words(&self) -> usize {
        self.total_words
    }

    /// Creates a bit set with this layout where all segments are empty.
    pub fn create(&self) -> AlignedBitSet {
        AlignedBitSet {
            words: vec![0; self.total_words].into_boxed_slice(),
        }
    }
}

/// Multiple bit sets packed into one contiguous buffer according to a [SegmentLayout].
///
/// The layout is not stored in the set itself, as many sets usually share the same layout.
/// Accessing a set with a layout of a different size panics.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AlignedBitSet {
    words: Box<[u64]>,
}

impl AlignedBitSet {
    /// Returns a read-only view on `segment`.
    pub fn segment<'set>(&'set self, layout: &SegmentLayout, segment: usize) -> SegmentRef<'set> {
        self.assert_layout(layout);
        let Segment {
            word_offset,
            word_count,
            width,
        } = layout.segments[segment];
        SegmentRef {
            words: &self.words[word_offset..word_offset + word_count],
            width,
        }
    }

    /// Returns a mutable view on `segment`.
    pub fn segment_mut<'set>(
        &'set mut self,
        layout: &SegmentLayout,
        segment: usize,
    ) -> SegmentMut<'set> {
        self.assert_layout(layout);
        let Segment {
            word_offset,
            word_count,
            width,
        } = layout.segments[segment];
        SegmentMut {
            words: &mut self.words[word_offset..word_offset + word_count],
            width,
        }
    }

    fn assert_layout(&self, layout: &SegmentLayout) {
        assert_eq!(
            self.words.len(),
            layout.total_words,
            "The aligned bit set was created for another layout."
        );
    }
}

/// A read-only view on a single segment of an [AlignedBitSet].
#[derive(Clone, Copy, Debug)]
pub struct SegmentRef<'set> {
    words: &'set [u64],
    width: usize,
}

impl<'set> SegmentRef<'set> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn contains(&self, index: usize) -> bool {
        assert!(index < self.width, "Index {index} is out of range for the segment.");
        words::contains(self.words, index)
    }

    pub fn is_empty(&self) -> bool {
        words::is_empty(self.words)
    }

    pub fn cardinality(&self) -> usize {
        words::count_ones(self.words)
    }

    pub fn iter(&self) -> Ones<'set> {
        Ones::new(self.words)
    }

    pub fn intersects(&self, other: &BitSet) -> bool {
        self.assert_same_width(other);
        words::intersects(self.words, other.as_words())
    }

    /// Returns true if every element of this segment is part of `other`.
    pub fn is_subset(&self, other: &BitSet) -> bool {
        self.assert_same_width(other);
        words::is_subset(self.words, other.as_words())
    }

    /// Returns true if every element of `other` is part of this segment.
    pub fn is_superset(&self, other: &BitSet) -> bool {
        self.assert_same_width(other);
        words::is_subset(other.as_words(), self.words)
    }

    /// Returns true if this segment contains exactly the elements of `other`.
    pub fn equals(&self, other: &BitSet) -> bool {
        self.assert_same_width(other);
        self.words == other.as_words()
    }

    /// Copies the segment into a standalone [BitSet].
    pub fn to_bit_set(&self) -> BitSet {
        BitSet::from_words(self.width, self.words.to_vec())
    }

    fn assert_same_width(&self, other: &BitSet) {
        assert_eq!(
            self.width,
            other.width(),
            "Segment and bit set belong to different universes."
        );
    }
}

/// A mutable view on a single segment of an [AlignedBitSet].
#[derive(Debug)]
pub struct SegmentMut<'set> {
    words: &'set mut [u64],
    width: usize,
}

impl SegmentMut<'_> {
    pub fn as_segment_ref(&self) -> SegmentRef<'_> {
        SegmentRef {
            words: self.words,
            width: self.width,
        }
    }

    pub fn insert(&mut self, index: usize) -> bool {
        assert!(index < self.width, "Index {index} is out of range for the segment.");
        words::insert(self.words, index)
    }

    pub fn remove(&mut self, index: usize) -> bool {
        assert!(index < self.width, "Index {index} is out of range for the segment.");
        words::remove(self.words, index)
    }

    pub fn union_with(&mut self, other: &BitSet) {
        self.assert_same_width(other);
        words::union_with(self.words, other.as_words());
    }

    pub fn difference_with(&mut self, other: &BitSet) {
        self.assert_same_width(other);
        words::difference_with(self.words, other.as_words());
    }

    /// Replaces the content of the segment with `other`.
    pub fn assign(&mut self, other: &BitSet) {
        self.assert_same_width(other);
        self.words.copy_from_slice(other.as_words());
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    fn assert_same_width(&self, other: &BitSet) {
        assert_eq!(
            self.width,
            other.width(),
            "Segment and bit set belong to different universes."
        );
    }
}
