use std::hash::{Hash, Hasher};
use std::ops::{Index, Mul, Neg};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::define_indexed_vec;
use crate::graph::{Edge, Graph, GraphMorphism, MorphismError, Vertex};
use crate::set_map::SetMap;

define_indexed_vec!(
    /// Handle of a 2-cell. Identity is independent of the boundary word: two
    /// faces with the same boundary are still distinct cells.
    pub struct Face;

    pub struct FaceVec;
);

#[derive(Clone, Debug, Serialize, Deserialize, Error, PartialEq, Eq)]
pub enum FaceMapError {
    #[error("Face maps must be coverings: origin length {origin} is not a multiple of target length {target}")]
    NotACovering { origin: usize, target: usize },
    #[error("Tried composing two incomposable face maps")]
    NotComposable,
    #[error("Boundary is not a closed edge cycle of the graph")]
    NotACycle,
    #[error("MorphismError: {0}")]
    Morphism(#[from] MorphismError),
}

/// Direction in which one boundary cycle runs along another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Positive,
    Negative,
}

impl Orientation {
    pub fn sign(self) -> i64 {
        match self {
            Orientation::Positive => 1,
            Orientation::Negative => -1,
        }
    }

    pub fn from_sign(sign: i64) -> Option<Self> {
        match sign {
            1 => Some(Orientation::Positive),
            -1 => Some(Orientation::Negative),
            _ => None,
        }
    }

    pub const BOTH: [Orientation; 2] = [Orientation::Positive, Orientation::Negative];
}

impl Neg for Orientation {
    type Output = Orientation;

    fn neg(self) -> Self::Output {
        match self {
            Orientation::Positive => Orientation::Negative,
            Orientation::Negative => Orientation::Positive,
        }
    }
}

impl Mul for Orientation {
    type Output = Orientation;

    fn mul(self, rhs: Self) -> Self::Output {
        if self == rhs {
            Orientation::Positive
        } else {
            Orientation::Negative
        }
    }
}

impl From<Orientation> for i64 {
    fn from(value: Orientation) -> Self {
        value.sign()
    }
}

/// Checks whether two cyclic words agree up to rotation and reflection.
///
/// Returns `(offset, orientation)` such that for every `i`
/// - `a[i] == b[(i + offset) % n]` when the orientation is positive,
/// - `a[i] == reverse(&b[(offset - 1 - i) mod n])` when it is negative.
///
/// `reverse` gives the letter read backwards, e.g. the bar of an edge. The
/// offset is the position in `b` of the vertex at which `a` starts, which is
/// the `start_index` convention of [`FaceMap`]. Positive matches and smaller
/// offsets are preferred.
pub fn offset_equal<T: PartialEq>(
    a: &[T],
    b: &[T],
    reverse: impl Fn(&T) -> T,
) -> Option<(usize, Orientation)> {
    let n = a.len();
    if n != b.len() {
        return None;
    }
    if n == 0 {
        return Some((0, Orientation::Positive));
    }

    for offset in 0..n {
        if (0..n).all(|i| a[i] == b[(i + offset) % n]) {
            return Some((offset, Orientation::Positive));
        }
        if (0..n).all(|i| a[i] == reverse(&b[(offset + 2 * n - 1 - i) % n])) {
            return Some((offset, Orientation::Negative));
        }
    }
    None
}

/// Whether `boundary` is a non-empty closed edge path in `graph`.
pub fn is_closed_cycle(graph: &Graph, boundary: &[Edge]) -> bool {
    if boundary.is_empty() || boundary.iter().any(|e| !graph.contains_edge(*e)) {
        return false;
    }
    boundary
        .iter()
        .zip(boundary.iter().cycle().skip(1))
        .all(|(e, next)| graph.terminal(*e) == graph.initial(*next))
}

/// The canonical morphism from the `n`-cycle onto the closed path `boundary`
/// of `graph`, together with the cycle vertex sent to the start of the path.
///
/// This is how a face becomes a disc-attaching map.
pub fn boundary_map(
    graph: &Arc<Graph>,
    boundary: &[Edge],
) -> Result<(Vertex, GraphMorphism), FaceMapError> {
    if !is_closed_cycle(graph, boundary) {
        return Err(FaceMapError::NotACycle);
    }
    let cycle = Arc::new(Graph::cycle(boundary.len()));

    let mut vertex_map = SetMap::new();
    let mut edge_map = SetMap::new();
    let start = cycle
        .vertices()
        .next()
        .ok_or(FaceMapError::NotACycle)?;
    let mut v = start;
    for e in boundary {
        let step = cycle
            .out_edges(v)
            .into_iter()
            .next()
            .ok_or(FaceMapError::NotACycle)?;
        vertex_map.insert(v, graph.initial(*e));
        edge_map.insert(step, *e);
        v = cycle.terminal(step);
    }

    let f = GraphMorphism::new(cycle, graph.clone(), vertex_map, edge_map)?;
    Ok((start, f))
}

/// A covering of the boundary cycle of `origin` onto that of `target`.
///
/// Walking `origin` from `origin_start_index`, the image advances around
/// `target` by one step per edge in the direction given by `orientation`,
/// starting at the vertex `start_index`. With negative orientation origin
/// edges map to bars of target edges.
///
/// Two face maps are equal when they are the same map, however their
/// rotation data was presented.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FaceMap {
    origin: Face,
    target: Face,
    origin_len: usize,
    target_len: usize,
    start_index: usize,
    orientation: Orientation,
    origin_start_index: usize,
    index_map: Vec<usize>,
}

impl FaceMap {
    pub fn new(
        origin: Face,
        origin_len: usize,
        target: Face,
        target_len: usize,
        start_index: usize,
        orientation: Orientation,
    ) -> Result<Self, FaceMapError> {
        Self::with_origin_start(
            origin,
            origin_len,
            target,
            target_len,
            start_index,
            orientation,
            0,
        )
    }

    pub fn with_origin_start(
        origin: Face,
        origin_len: usize,
        target: Face,
        target_len: usize,
        start_index: usize,
        orientation: Orientation,
        origin_start_index: usize,
    ) -> Result<Self, FaceMapError> {
        if target_len == 0 || origin_len % target_len != 0 {
            return Err(FaceMapError::NotACovering {
                origin: origin_len,
                target: target_len,
            });
        }
        let start_index = start_index % target_len;
        let origin_start_index = if origin_len == 0 {
            0
        } else {
            origin_start_index % origin_len
        };

        let m = target_len as i64;
        let first = match orientation {
            Orientation::Positive => 0,
            Orientation::Negative => -1,
        };
        let mut index_map = vec![0; origin_len];
        for d in 0..origin_len {
            let image = first + orientation.sign() * d as i64 + start_index as i64;
            index_map[(d + origin_start_index) % origin_len] = image.rem_euclid(m) as usize;
        }

        Ok(FaceMap {
            origin,
            target,
            origin_len,
            target_len,
            start_index,
            orientation,
            origin_start_index,
            index_map,
        })
    }

    pub fn origin(&self) -> Face {
        self.origin
    }

    pub fn target(&self) -> Face {
        self.target
    }

    pub fn origin_len(&self) -> usize {
        self.origin_len
    }

    pub fn target_len(&self) -> usize {
        self.target_len
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn origin_start_index(&self) -> usize {
        self.origin_start_index
    }

    pub fn index_map(&self) -> &[usize] {
        &self.index_map
    }

    /// The composite `f ∘ g`.
    pub fn compose(f: &FaceMap, g: &FaceMap) -> Result<FaceMap, FaceMapError> {
        if g.target != f.origin || g.target_len != f.origin_len {
            return Err(FaceMapError::NotComposable);
        }
        let start_index = f.initial(g.initial(g.origin_start_index));
        FaceMap::with_origin_start(
            g.origin,
            g.origin_len,
            f.target,
            f.target_len,
            start_index,
            f.orientation * g.orientation,
            g.origin_start_index,
        )
    }

    /// The image in `graph` of edge `i` of the origin, where `target_boundary`
    /// is the boundary of the target face.
    pub fn eval(&self, graph: &Graph, target_boundary: &[Edge], i: usize) -> Edge {
        let e = target_boundary[self.index_map[i]];
        match self.orientation {
            Orientation::Positive => e,
            Orientation::Negative => graph.bar(e),
        }
    }

    /// Position on the target of the initial vertex of the image of origin edge `i`.
    pub fn initial(&self, i: usize) -> usize {
        let j = self.index_map[i];
        match self.orientation {
            Orientation::Positive => j % self.target_len,
            Orientation::Negative => (j + 1) % self.target_len,
        }
    }

    /// Position on the target of the terminal vertex of the image of origin edge `i`.
    pub fn terminal(&self, i: usize) -> usize {
        let j = self.index_map[i];
        match self.orientation {
            Orientation::Positive => (j + 1) % self.target_len,
            Orientation::Negative => j % self.target_len,
        }
    }

    /// How many times the origin wraps around the target.
    pub fn degree(&self) -> usize {
        self.origin_len / self.target_len
    }
}

impl FaceMap {
    fn key(&self) -> (Face, Face, usize, usize, Orientation, &[usize]) {
        (
            self.origin,
            self.target,
            self.origin_len,
            self.target_len,
            self.orientation,
            &self.index_map,
        )
    }
}

impl PartialEq for FaceMap {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for FaceMap {}

impl Hash for FaceMap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state)
    }
}

impl Index<usize> for FaceMap {
    type Output = usize;
    fn index(&self, index: usize) -> &Self::Output {
        &self.index_map[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_equal_is_reflexive() {
        let word = [3, 1, 4, 1, 5];
        assert_eq!(
            offset_equal(&word, &word, |x| *x),
            Some((0, Orientation::Positive))
        );
    }

    #[test]
    fn offset_equal_finds_rotation() {
        let a = ['a', 'b', 'c', 'd'];
        let b = ['c', 'd', 'a', 'b'];
        assert_eq!(offset_equal(&a, &b, |x| *x), Some((2, Orientation::Positive)));
        assert_eq!(offset_equal(&a, &['a', 'b', 'c'], |x| *x), None);
    }

    #[test]
    fn offset_equal_finds_reflection() {
        // Letters are (name, exponent); reversing flips the exponent.
        let a = [('a', 1), ('b', 1), ('c', 1)];
        let b = [('c', -1), ('b', -1), ('a', -1)];
        let rev = |x: &(char, i32)| (x.0, -x.1);

        let (offset, orientation) = offset_equal(&a, &b, rev).unwrap();
        assert_eq!(orientation, Orientation::Negative);
        for i in 0..3 {
            assert_eq!(a[i], rev(&b[(offset + 6 - 1 - i) % 3]));
        }
        assert_eq!(offset_equal(&a, &[('a', 1), ('c', 1), ('b', 1)], rev), None);
    }

    #[test]
    fn face_map_covering_condition() {
        assert_eq!(
            FaceMap::new(Face(0), 5, Face(1), 2, 0, Orientation::Positive),
            Err(FaceMapError::NotACovering {
                origin: 5,
                target: 2
            })
        );
        let fm = FaceMap::new(Face(0), 6, Face(1), 3, 1, Orientation::Positive).unwrap();
        assert_eq!(fm.degree(), 2);
        assert_eq!(fm.index_map(), &[1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn negative_face_map_runs_backwards() {
        let fm = FaceMap::new(Face(0), 3, Face(1), 3, 0, Orientation::Negative).unwrap();
        assert_eq!(fm.index_map(), &[2, 1, 0]);
        assert_eq!(fm.initial(0), 0);
        assert_eq!(fm.terminal(0), 2);
        assert_eq!(fm.initial(1), fm.terminal(0));
    }

    #[test]
    fn compose_face_maps() {
        let g = FaceMap::new(Face(0), 4, Face(1), 4, 1, Orientation::Negative).unwrap();
        let f = FaceMap::new(Face(1), 4, Face(2), 2, 1, Orientation::Negative).unwrap();
        let h = FaceMap::compose(&f, &g).unwrap();

        assert_eq!(h.orientation(), Orientation::Positive);
        for i in 0..4 {
            assert_eq!(h[i], f[g[i]]);
        }
        assert_eq!(
            FaceMap::compose(&g, &f),
            Err(FaceMapError::NotComposable)
        );
    }

    #[test]
    fn boundary_map_wraps_cycle() {
        let graph = Arc::new(Graph::cycle(3));
        let boundary: Vec<_> = graph.orientation().collect();
        let (start, f) = boundary_map(&graph, &boundary).unwrap();
        assert_eq!(f.vertex(start), graph.initial(boundary[0]));
        assert!(f.is_immersion());

        let broken = [boundary[0], boundary[2]];
        assert_eq!(
            boundary_map(&graph, &broken).map(|_| ()),
            Err(FaceMapError::NotACycle)
        );
    }
}
