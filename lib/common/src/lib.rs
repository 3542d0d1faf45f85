mod aligned;
mod bitset;
pub mod error;
mod indexed;
mod words;

pub use aligned::{AlignedBitSet, SegmentLayout, SegmentMut, SegmentRef};
pub use bitset::{BitSet, WORD_BITS};
pub use error::{UniverseError, UniverseResult};
pub use indexed::IndexedSet;
pub use words::Ones;
