use std::fmt::Display;
use std::ops::Index;
use std::sync::Arc;

use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::face::{boundary_map, is_closed_cycle, Face, FaceMap, FaceMapError, FaceVec, Orientation};
use crate::graph::{Edge, Graph, GraphError, GraphMorphism, MorphismError, Relabeling, Vertex};
use crate::set_map::SetMap;

pub mod json;
pub mod morphism;

pub use morphism::ComplexMorphism;

#[derive(Clone, Debug, Serialize, Deserialize, Error, PartialEq, Eq)]
pub enum ComplexError {
    #[error("All faces must map to 1-skeleton: face {0} uses an edge outside it")]
    FaceOutsideSkeleton(Face),
    #[error("Boundary of face {0} is not a closed edge cycle")]
    NotAClosedCycle(Face),
    #[error("Face {0} does not belong to the complex")]
    NoFace(Face),
    #[error("Face map was not given for each face in domain")]
    FaceMapDomain,
    #[error("Face map of face {0} does not map to a face of the codomain")]
    FaceMapTarget(Face),
    #[error("Face map of face {0} is not indexed by its origin")]
    FaceMapOrigin(Face),
    #[error("Skeleta map does not have right domain or codomain")]
    SkeletonMismatch,
    #[error("Face map of face {face} does not commute with the skeleta map at index {index}")]
    NotCommuting { face: Face, index: usize },
    #[error("Morphisms must agree at wedge vertices to factor through wedge")]
    WedgeBasepoint,
    #[error("Morphisms must have the same codomain")]
    CodomainMismatch,
    #[error("Trying to compose morphisms without compatible domain/codomain")]
    NotComposable,
    #[error("Malformed complex json: {0}")]
    Json(String),
    #[error("Relator uses {0}, which is not a generator")]
    UnknownGenerator(String),
    #[error("GraphError: {0}")]
    Graph(#[from] GraphError),
    #[error("MorphismError: {0}")]
    Morphism(#[from] MorphismError),
    #[error("FaceMapError: {0}")]
    FaceMap(#[from] FaceMapError),
}

/// A 2-complex: a 1-skeleton together with discs attached along closed edge
/// cycles of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Complex {
    skeleton: Arc<Graph>,
    faces: FaceVec<Vec<Edge>>,
}

pub(crate) fn same_complex(a: &Arc<Complex>, b: &Arc<Complex>) -> bool {
    Arc::ptr_eq(a, b) || a == b
}

impl Complex {
    pub fn new(skeleton: Arc<Graph>, faces: Vec<Vec<Edge>>) -> Result<Self, ComplexError> {
        let faces: FaceVec<_> = faces.into();
        for (face, boundary) in &faces {
            if boundary.iter().any(|e| !skeleton.contains_edge(*e)) {
                return Err(ComplexError::FaceOutsideSkeleton(face));
            }
            if !is_closed_cycle(&skeleton, boundary) {
                return Err(ComplexError::NotAClosedCycle(face));
            }
        }
        Ok(Complex { skeleton, faces })
    }

    /// The disc with an `n`-cycle as boundary.
    pub fn disc(n: usize) -> Result<Self, ComplexError> {
        let cycle = Graph::cycle(n);
        let mut boundary = Vec::with_capacity(n);
        let mut current = cycle.orientation().next();
        for _ in 0..n {
            let Some(e) = current else { break };
            boundary.push(e);
            current = cycle.out_edges(cycle.terminal(e)).into_iter().next();
        }
        Complex::new(Arc::new(cycle), vec![boundary])
    }

    /// The morphism from `disc(len(face))` onto `face` of `x`, running around
    /// the face in the given orientation.
    pub fn disc_diagram(
        x: &Arc<Complex>,
        face: Face,
        orientation: Orientation,
    ) -> Result<ComplexMorphism, ComplexError> {
        let boundary = x.boundary(face)?;
        let n = boundary.len();
        let disc = Arc::new(Complex::disc(n)?);
        let disc_face = Face(0);
        let fm = FaceMap::new(disc_face, n, face, n, 0, orientation)?;

        let mut vertex_map = SetMap::new();
        let mut edge_map = SetMap::new();
        for (i, e) in disc[disc_face].iter().enumerate() {
            let image = fm.eval(&x.skeleton, boundary, i);
            vertex_map.insert(disc.skeleton.initial(*e), x.skeleton.initial(image));
            edge_map.insert(*e, image);
        }
        let skeleton = GraphMorphism::new(
            disc.skeleton.clone(),
            x.skeleton.clone(),
            vertex_map,
            edge_map,
        )?;

        ComplexMorphism::new(
            disc,
            x.clone(),
            skeleton,
            [(disc_face, fm)].into_iter().collect(),
        )
    }

    pub fn skeleton(&self) -> &Arc<Graph> {
        &self.skeleton
    }

    pub fn faces(&self) -> impl Iterator<Item = Face> + '_ {
        self.faces.iter().map(|(f, _)| f)
    }

    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn boundary(&self, face: Face) -> Result<&[Edge], ComplexError> {
        self.faces
            .get(face)
            .map(Vec::as_slice)
            .ok_or(ComplexError::NoFace(face))
    }

    /// Euler characteristic `|V| - |E|/2 + |F|`.
    pub fn chi(&self) -> i64 {
        self.skeleton.chi() + self.faces.len() as i64
    }

    /// The disjoint union of the boundary cycles of all faces mapped onto the
    /// skeleton, with the start vertex of every face's cycle.
    pub fn attaching_map(&self) -> Result<(GraphMorphism, SetMap<Face, Vertex>), ComplexError> {
        let mut w = GraphMorphism::new(
            Arc::new(Graph::empty()),
            self.skeleton.clone(),
            SetMap::new(),
            SetMap::new(),
        )?;
        let mut start_vertices = SetMap::new();
        for (face, boundary) in &self.faces {
            let (start, f) = boundary_map(&self.skeleton, boundary)?;
            let offset = w.domain().vertices().count();
            w = GraphMorphism::disjoint_union(&w, &f)?;
            // The disjoint union appends the cycle after the existing vertices.
            start_vertices.insert(face, Vertex(offset + start.0));
        }
        Ok((w, start_vertices))
    }

    pub fn copy(&self) -> Complex {
        self.copy_with_maps().0
    }

    /// Copies the skeleton into a fresh arena and carries the faces along.
    /// Face handles are preserved.
    pub fn copy_with_maps(&self) -> (Complex, Relabeling) {
        let (skeleton, relabeling) = self.skeleton.copy_with_maps();
        let faces = self
            .faces
            .iter()
            .map(|(_, boundary)| boundary.iter().map(|e| relabeling.edges[e]).collect())
            .collect();
        (
            Complex {
                skeleton: Arc::new(skeleton),
                faces,
            },
            relabeling,
        )
    }

    /// Glues `x1` and `x2` along `v1` and `v2`. Faces of `x1` come first,
    /// followed by those of `x2`.
    pub fn wedge(
        x1: &Complex,
        v1: Vertex,
        x2: &Complex,
        v2: Vertex,
    ) -> Result<(Complex, Relabeling, Relabeling), ComplexError> {
        let (skeleton, r1, r2) = Graph::wedge(&x1.skeleton, v1, &x2.skeleton, v2)?;
        let faces = x1
            .faces
            .iter()
            .map(|(_, b)| b.iter().map(|e| r1.edges[e]).collect())
            .chain(
                x2.faces
                    .iter()
                    .map(|(_, b)| b.iter().map(|e| r2.edges[e]).collect()),
            )
            .collect();
        let x = Complex::new(Arc::new(skeleton), faces)?;
        Ok((x, r1, r2))
    }

    /// [`Complex::wedge`] returning the two inclusion morphisms.
    pub fn wedge_inclusions(
        x1: &Arc<Complex>,
        v1: Vertex,
        x2: &Arc<Complex>,
        v2: Vertex,
    ) -> Result<(Arc<Complex>, ComplexMorphism, ComplexMorphism), ComplexError> {
        let (x, r1, r2) = Complex::wedge(x1, v1, x2, v2)?;
        let x = Arc::new(x);
        let shift = x1.n_faces();
        let incl1 = Complex::inclusion(x1, &x, r1, 0)?;
        let incl2 = Complex::inclusion(x2, &x, r2, shift)?;
        Ok((x, incl1, incl2))
    }

    fn inclusion(
        part: &Arc<Complex>,
        whole: &Arc<Complex>,
        relabeling: Relabeling,
        face_shift: usize,
    ) -> Result<ComplexMorphism, ComplexError> {
        let skeleton = GraphMorphism::new(
            part.skeleton.clone(),
            whole.skeleton.clone(),
            relabeling.vertices,
            relabeling.edges,
        )?;
        let face_maps = part
            .faces
            .iter()
            .map(|(face, b)| {
                FaceMap::new(
                    face,
                    b.len(),
                    Face(face.0 + face_shift),
                    b.len(),
                    0,
                    Orientation::Positive,
                )
                .map(|fm| (face, fm))
            })
            .collect::<Result<SetMap<_, _>, _>>()?;
        ComplexMorphism::new(part.clone(), whole.clone(), skeleton, face_maps)
    }

    /// Edges occurring exactly once, in either orientation, across all face
    /// boundaries, with the face they occur in.
    ///
    /// Edges are reported by their oriented representative, in order of first
    /// occurrence.
    pub fn free_faces(&self) -> Vec<(Edge, Face)> {
        let mut counts: IndexMap<Edge, (usize, Face)> = IndexMap::new();
        for (face, boundary) in &self.faces {
            for e in boundary {
                let entry = counts
                    .entry(self.skeleton.oriented(*e))
                    .or_insert((0, face));
                entry.0 += 1;
                entry.1 = face;
            }
        }
        counts
            .into_iter()
            .filter(|(_, (count, _))| *count == 1)
            .map(|(e, (_, face))| (e, face))
            .collect()
    }

    pub fn is_free_face(&self, e: Edge) -> bool {
        if !self.skeleton.contains_edge(e) {
            return false;
        }
        let e = self.skeleton.oriented(e);
        self.free_faces().iter().any(|(f, _)| *f == e)
    }

    pub fn has_free_faces(&self) -> bool {
        !self.free_faces().is_empty()
    }
}

impl Index<Face> for Complex {
    type Output = Vec<Edge>;
    fn index(&self, index: Face) -> &Self::Output {
        &self.faces[index]
    }
}

impl Display for Complex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "1-skeleton:\n{}", self.skeleton)?;
        write!(
            f,
            "Faces: [{}]",
            self.faces
                .iter()
                .map(|(_, b)| format!(
                    "[{}]",
                    b.iter().map(|e| &self.skeleton[*e].label).join(", ")
                ))
                .join(", ")
        )
    }
}

#[cfg(test)]
mod tests;
