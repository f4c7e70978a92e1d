//! # Cellfold
//!
//! Cellfold is a Rust library for combinatorial 2-dimensional CW-complexes:
//! graphs with discs glued along closed boundary cycles.
//!
//! It provides the small category of labelled graphs and 2-complexes with
//! their structure-preserving morphisms, Stallings-style folding which factors
//! any morphism as a quotient followed by an immersion, and a bounded
//! facial-tree search that grows immersed sub-diagrams of a fixed complex one
//! disc at a time while repairing free faces.
//!
//! The typical entry point is a [`presentation::Presentation`], whose
//! presentation complex is searched with [`resolver::resolve_free_faces`] or
//! sampled with [`miner::mine`].

pub mod complex;
pub mod face;
pub mod facial_tree;
pub mod folding;
pub mod graph;
pub mod miner;
pub mod presentation;
pub mod resolver;
pub mod set_map;

/// Defines an arena handle new-type together with a vector new-type that can
/// only be indexed by that handle.
#[macro_export]
macro_rules! define_indexed_vec {
    (
        $(#[$idx_meta:meta])*
        $idx_vis:vis struct $Idx:ident ;

        $(#[$vec_meta:meta])*
        $vec_vis:vis struct $Vec:ident ;
    ) => {
        /* ——————————————————— index new‑type ——————————————————— */

        $(#[$idx_meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(serde::Serialize, serde::Deserialize, derive_more::From, derive_more::Into)]
        $idx_vis struct $Idx(pub usize);

        impl ::std::fmt::Display for $Idx {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        /* ——————————————————— vector new‑type ——————————————————— */

        $(#[$vec_meta])*
        #[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
        #[derive(serde::Serialize, serde::Deserialize)]
        $vec_vis struct $Vec<T>(::std::vec::Vec<T>);

        impl<T> ::std::ops::Index<$Idx> for $Vec<T> {
            type Output = T;
            #[inline] fn index(&self, i: $Idx) -> &Self::Output { &self.0[i.0] }
        }
        impl<T> ::std::ops::IndexMut<$Idx> for $Vec<T> {
            #[inline] fn index_mut(&mut self, i: $Idx) -> &mut Self::Output { &mut self.0[i.0] }
        }

        impl<T> $Vec<T> {
            #[inline] pub fn new() -> Self { Self(::std::vec::Vec::new()) }
            #[inline] pub fn with_capacity(c: usize) -> Self { Self(::std::vec::Vec::with_capacity(c)) }

            #[inline] pub fn len(&self) -> usize { self.0.len() }
            #[inline] pub fn is_empty(&self) -> bool { self.0.is_empty() }

            /// Pushes a value and returns the handle it was stored under.
            #[inline] pub fn push(&mut self, value: T) -> $Idx {
                let idx = $Idx(self.0.len());
                self.0.push(value);
                idx
            }

            #[inline] pub fn get(&self, idx: $Idx) -> Option<&T> { self.0.get(idx.0) }
            #[inline] pub fn get_mut(&mut self, idx: $Idx) -> Option<&mut T> { self.0.get_mut(idx.0) }

            #[inline] pub fn iter<'a>(&'a self) -> ::std::iter::Map<std::iter::Enumerate<std::slice::Iter<'a, T>>, fn((usize, &T)) -> ($Idx, &T)> { self.0.iter().enumerate().map(|(u, t)| ($Idx(u), t)) }
            #[inline] pub fn iter_mut<'a>(&'a mut self) -> ::std::iter::Map<
                std::iter::Enumerate<std::slice::IterMut<'a, T>>,
                fn((usize, &mut T)) -> ($Idx, &mut T),
            > { self.0.iter_mut().enumerate().map(|(u, t)| ($Idx(u), t)) }

            #[inline] pub fn raw(&self) -> &::std::vec::Vec<T> { &self.0 }
        }

        impl<T: Clone> $Vec<T> {
            /// Grows the vector with `fill` until `idx` is a valid handle.
            pub fn ensure(&mut self, idx: $Idx, fill: T) {
                if self.0.len() <= idx.0 {
                    self.0.resize(idx.0 + 1, fill);
                }
            }
        }

        impl<T> ::std::iter::FromIterator<T> for $Vec<T> {
            #[inline] fn from_iter<I: ::std::iter::IntoIterator<Item = T>>(it: I) -> Self {
                Self(::std::vec::Vec::from_iter(it))
            }
        }

        impl<T> ::std::convert::From<::std::vec::Vec<T>> for $Vec<T> {
            #[inline] fn from(v: ::std::vec::Vec<T>) -> Self { Self(v) }
        }
        impl<T> ::std::iter::IntoIterator for $Vec<T> {
            type Item = ($Idx,T);
            type IntoIter =  ::std::iter::Map<std::iter::Enumerate<std::vec::IntoIter<T>>, fn((usize, T)) -> ($Idx, T)>;
            #[inline] fn into_iter(self) -> Self::IntoIter { self.0.into_iter().enumerate().map(|(u, t)| ($Idx(u), t)) }
        }
        impl<'a, T> ::std::iter::IntoIterator for &'a $Vec<T> {
            type Item = ($Idx, &'a T);
            type IntoIter = std::iter::Map<
                std::iter::Enumerate<std::slice::Iter<'a, T>>,
                fn((usize, &T)) -> ($Idx, &T),
            >;
            fn into_iter(self) -> Self::IntoIter {
                self.0.iter().enumerate().map(|(u, t)| ($Idx(u), t))
            }
        }
    };
}
