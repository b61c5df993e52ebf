//! Ordered collections keyed by a stable identity
//!
//! [`IdentifiedVec`] keeps elements in insertion order and never holds two
//! elements with the same [`Identifiable::Id`]. Replacing an element keeps its
//! position, which is what lets a list of child states be updated by id
//! without reordering rows.
//!
//! ```
//! use reflux_core::{Identifiable, IdentifiedVec};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Row {
//!     id: i64,
//!     label: &'static str,
//! }
//!
//! impl Identifiable for Row {
//!     type Id = i64;
//!
//!     fn id(&self) -> i64 {
//!         self.id
//!     }
//! }
//!
//! let mut rows = IdentifiedVec::new();
//! rows.insert_or_replace(Row { id: 7, label: "a" });
//! rows.insert_or_replace(Row { id: 9, label: "b" });
//! rows.insert_or_replace(Row { id: 7, label: "c" });
//!
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows.index_of(&7), Some(0));
//! assert_eq!(rows.get(&7).map(|row| row.label), Some("c"));
//! ```

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// A value with a stable identity
pub trait Identifiable {
    /// The identity type; unique within an [`IdentifiedVec`]
    type Id: Eq + Hash + Clone + Debug;

    /// This value's identity
    fn id(&self) -> Self::Id;
}

/// An ordered collection of [`Identifiable`] elements with unique ids
///
/// Lookups by id are `O(1)`. Removal is `O(n)` because positions after the
/// removed element shift down.
#[derive(Clone, Debug)]
pub struct IdentifiedVec<T: Identifiable> {
    elements: Vec<T>,
    index: HashMap<T::Id, usize>,
}

impl<T: Identifiable> IdentifiedVec<T> {
    /// Create an empty collection
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the collection is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether an element with `id` is present
    #[must_use]
    pub fn contains(&self, id: &T::Id) -> bool {
        self.index.contains_key(id)
    }

    /// Insert `element`, replacing the element with the same id in place
    ///
    /// A new id is appended at the end. Returns the replaced element, if any.
    pub fn insert_or_replace(&mut self, element: T) -> Option<T> {
        let id = element.id();
        if let Some(&position) = self.index.get(&id) {
            return Some(std::mem::replace(&mut self.elements[position], element));
        }

        self.index.insert(id, self.elements.len());
        self.elements.push(element);
        None
    }

    /// Remove the element with `id`; a missing id is a no-op
    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        let position = self.index.remove(id)?;
        let removed = self.elements.remove(position);

        for element in &self.elements[position..] {
            if let Some(slot) = self.index.get_mut(&element.id()) {
                *slot -= 1;
            }
        }

        Some(removed)
    }

    /// Remove every element
    pub fn clear(&mut self) {
        self.elements.clear();
        self.index.clear();
    }

    /// The element with `id`
    #[must_use]
    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.index.get(id).map(|&position| &self.elements[position])
    }

    /// Mutable access to the element with `id`
    ///
    /// The caller must not change the element's id through this reference.
    pub fn get_mut(&mut self, id: &T::Id) -> Option<&mut T> {
        let position = *self.index.get(id)?;
        self.elements.get_mut(position)
    }

    /// The element at `position` in insertion order
    #[must_use]
    pub fn get_index(&self, position: usize) -> Option<&T> {
        self.elements.get(position)
    }

    /// Position of the element with `id`
    #[must_use]
    pub fn index_of(&self, id: &T::Id) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = T::Id> + '_ {
        self.elements.iter().map(Identifiable::id)
    }

    /// Elements in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elements.iter()
    }

    /// Elements as a slice, in insertion order
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    /// Transform every element, keeping order
    ///
    /// The transformed elements must still have unique ids. Producing a
    /// duplicate is a caller bug, caught by a debug assertion.
    pub fn map<U, F>(&self, mut f: F) -> IdentifiedVec<U>
    where
        U: Identifiable,
        F: FnMut(&T) -> U,
    {
        let mut mapped = IdentifiedVec::new();
        for element in &self.elements {
            let replaced = mapped.insert_or_replace(f(element));
            debug_assert!(
                replaced.is_none(),
                "IdentifiedVec::map produced a duplicate id"
            );
        }
        mapped
    }

    /// Consume the collection into its elements, in order
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.elements
    }
}

impl<T: Identifiable> Default for IdentifiedVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PartialEq for IdentifiedVec<T>
where
    T: Identifiable + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl<T> Eq for IdentifiedVec<T> where T: Identifiable + Eq {}

impl<T: Identifiable> FromIterator<T> for IdentifiedVec<T> {
    /// Later elements replace earlier ones with the same id, in place
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut collection = Self::new();
        collection.extend(iter);
        collection
    }
}

impl<T: Identifiable> Extend<T> for IdentifiedVec<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for element in iter {
            self.insert_or_replace(element);
        }
    }
}

impl<T: Identifiable> IntoIterator for IdentifiedVec<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a, T: Identifiable> IntoIterator for &'a IdentifiedVec<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<T> Serialize for IdentifiedVec<T>
where
    T: Identifiable + Serialize,
{
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        serializer.collect_seq(&self.elements)
    }
}

impl<'de, T> Deserialize<'de> for IdentifiedVec<T>
where
    T: Identifiable + Deserialize<'de>,
{
    /// Fails on a repeated id instead of dropping either element
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut collection = Self::new();

        for element in Vec::<T>::deserialize(deserializer)? {
            let id = element.id();
            if collection.insert_or_replace(element).is_some() {
                return Err(de::Error::custom(format!("duplicate id {id:?}")));
            }
        }

        Ok(collection)
    }
}
