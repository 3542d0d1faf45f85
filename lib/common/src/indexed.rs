use crate::{BitSet, UniverseError, UniverseResult};
use rustc_hash::FxHashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::ops::Index;

/// An ordered, append-only set that assigns a dense index to each element.
///
/// The index of an element is its insertion position and never changes. This allows
/// representing subsets of the elements as [BitSet]s of width [IndexedSet::len].
#[derive(Clone, Debug)]
pub struct IndexedSet<T> {
    elements: Vec<T>,
    indices: FxHashMap<T, usize>,
}

impl<T: Clone + Eq + Hash> IndexedSet<T> {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            indices: FxHashMap::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.elements.get(index)
    }

    pub fn index_of(&self, element: &T) -> Option<usize> {
        self.indices.get(element).copied()
    }

    pub fn contains(&self, element: &T) -> bool {
        self.indices.contains_key(element)
    }

    /// Appends `element` and returns its index.
    ///
    /// If the element is already part of the set, the existing index is returned and the set is
    /// not modified.
    pub fn push(&mut self, element: T) -> usize {
        if let Some(index) = self.indices.get(&element) {
            return *index;
        }

        let index = self.elements.len();
        self.indices.insert(element.clone(), index);
        self.elements.push(element);
        index
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elements.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    /// An empty subset of this universe.
    pub fn empty_subset(&self) -> BitSet {
        BitSet::new(self.len())
    }

    /// A subset of this universe that contains every element.
    pub fn full_subset(&self) -> BitSet {
        BitSet::full(self.len())
    }

    /// Creates the subset of this universe that contains `elements`.
    pub fn subset<'item>(
        &self,
        elements: impl IntoIterator<Item = &'item T>,
    ) -> UniverseResult<BitSet>
    where
        T: Display + 'item,
    {
        let mut result = self.empty_subset();
        for element in elements {
            let index = self
                .index_of(element)
                .ok_or_else(|| UniverseError::UnknownElement(element.to_string()))?;
            result.insert(index);
        }
        Ok(result)
    }

    /// Resolves the elements contained in `subset`.
    pub fn elements_of<'set>(
        &'set self,
        subset: &'set BitSet,
    ) -> UniverseResult<impl Iterator<Item = &'set T> + 'set> {
        subset.check_width(self.len())?;
        Ok(subset.iter().map(|index| &self.elements[index]))
    }
}

impl<T: Clone + Eq + Hash> Default for IndexedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Eq + Hash> FromIterator<T> for IndexedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut result = Self::new();
        for element in iter {
            result.push(element);
        }
        result
    }
}

impl<T> Index<usize> for IndexedSet<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.elements[index]
    }
}

impl<'set, T: Clone + Eq + Hash> IntoIterator for &'set IndexedSet<T> {
    type Item = &'set T;
    type IntoIter = std::slice::Iter<'set, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for IndexedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl<T: Eq> Eq for IndexedSet<T> {}
