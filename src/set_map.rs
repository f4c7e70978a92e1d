use std::hash::Hash;

use ahash::AHashSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Serialize, Deserialize, Error, PartialEq, Eq)]
pub enum SetMapError {
    #[error("Image of the inner map is not contained in the domain of the outer map")]
    NotComposable,
}

/// A finite function between sets of handles.
///
/// The mapping keeps insertion order, so iteration (and anything derived from
/// it, such as folding order) is deterministic. Equality is equality of
/// functions: two maps are equal when they have the same key/value pairs,
/// regardless of insertion order.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize + Hash + Eq, V: Serialize",
    deserialize = "K: Deserialize<'de> + Hash + Eq, V: Deserialize<'de>"
))]
pub struct SetMap<K, V> {
    map: IndexMap<K, V, ahash::RandomState>,
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for SetMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<K: Hash + Eq, V: Eq> Eq for SetMap<K, V> {}

impl<K, V> Default for SetMap<K, V> {
    fn default() -> Self {
        SetMap {
            map: IndexMap::with_hasher(ahash::RandomState::new()),
        }
    }
}

impl<K: Copy + Hash + Eq, V: Clone> SetMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.map.insert(key, value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.map.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.map.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.map.values()
    }

    /// The set of keys the map is defined on.
    pub fn domain(&self) -> AHashSet<K> {
        self.map.keys().copied().collect()
    }

    /// The restriction of the map to the keys satisfying `keep`.
    pub fn restriction(&self, keep: impl Fn(&K) -> bool) -> Self {
        SetMap {
            map: self
                .map
                .iter()
                .filter(|(k, _)| keep(k))
                .map(|(k, v)| (*k, v.clone()))
                .collect(),
        }
    }
}

impl<K: Copy + Hash + Eq, V: Copy + Hash + Eq> SetMap<K, V> {
    /// The set of values attained by the map.
    pub fn image(&self) -> AHashSet<V> {
        self.map.values().copied().collect()
    }

    /// Whether every value lies in the set described by `contains`.
    pub fn maps_into(&self, contains: impl Fn(&V) -> bool) -> bool {
        self.map.values().all(contains)
    }

    /// The image of the subset of keys satisfying `within`.
    pub fn image_of(&self, within: impl Fn(&K) -> bool) -> AHashSet<V> {
        self.map
            .iter()
            .filter(|(k, _)| within(k))
            .map(|(_, v)| *v)
            .collect()
    }

    /// All keys sent to `value`, in insertion order.
    pub fn preimage(&self, value: &V) -> Vec<K> {
        self.map
            .iter()
            .filter(|(_, v)| *v == value)
            .map(|(k, _)| *k)
            .collect()
    }

    /// The composite `outer ∘ inner`.
    pub fn compose<W: Copy>(
        outer: &SetMap<V, W>,
        inner: &SetMap<K, V>,
    ) -> Result<SetMap<K, W>, SetMapError> {
        inner
            .map
            .iter()
            .map(|(k, v)| {
                outer
                    .get(v)
                    .map(|w| (*k, *w))
                    .ok_or(SetMapError::NotComposable)
            })
            .collect()
    }
}

impl<K: Copy + Hash + Eq, V> std::ops::Index<&K> for SetMap<K, V> {
    type Output = V;
    fn index(&self, index: &K) -> &Self::Output {
        &self.map[index]
    }
}

impl<K: Copy + Hash + Eq, V> FromIterator<(K, V)> for SetMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        SetMap {
            map: iter.into_iter().collect(),
        }
    }
}

impl<K: Copy + Hash + Eq, V> Extend<(K, V)> for SetMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.map.extend(iter)
    }
}

impl<'a, K, V> IntoIterator for &'a SetMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = indexmap::map::Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}
