use thiserror::Error;

/// A result whose error is a [UniverseError].
pub type UniverseResult<T> = Result<T, UniverseError>;

/// An error that indicates that a bit set or an element does not belong to a universe.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum UniverseError {
    /// A bit set built against one universe was used with a universe of a different size.
    #[error("Bit set of width {actual} used with a universe of {expected} elements.")]
    WidthMismatch { expected: usize, actual: usize },
    /// An element was looked up that is not part of the universe.
    #[error("Element is not part of the universe: {0}")]
    UnknownElement(String),
}

impl UniverseError {
    /// Returns a [UniverseError::WidthMismatch] if `expected` and `actual` differ.
    pub fn check_width(expected: usize, actual: usize) -> UniverseResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(UniverseError::WidthMismatch { expected, actual })
        }
    }
}
