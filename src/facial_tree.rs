//! One-step expansion of immersed sub-diagrams of a fixed complex.
//!
//! A piece `P -> X` is grown by wedging a disc diagram of some face of `X`
//! onto it at a vertex pair with common image and folding the result. Only
//! attachments that add exactly one face survive.

use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;

use crate::complex::{Complex, ComplexError, ComplexMorphism};
use crate::face::Orientation;
use crate::folding::fold_complex_morphism;
use crate::graph::Vertex;
use crate::set_map::SetMap;

/// A facially reduced attachment onto a piece.
#[derive(Clone, Debug)]
pub struct Child {
    /// The folded piece with one more face, immersed into the ambient complex.
    pub immersion: ComplexMorphism,
    /// How the parent piece sits inside the new one.
    pub inclusion: ComplexMorphism,
}

/// Groups the domain vertices of a map by their image, keeping first-seen order.
pub fn image_sort(vertices: impl IntoIterator<Item = Vertex>, map: &SetMap<Vertex, Vertex>) -> IndexMap<Vertex, Vec<Vertex>> {
    let mut sorted: IndexMap<Vertex, Vec<Vertex>> = IndexMap::new();
    for v in vertices {
        if let Some(image) = map.get(&v) {
            sorted.entry(*image).or_default().push(v);
        }
    }
    sorted
}

/// Every facially reduced attachment of a disc of `x` onto `piece`.
///
/// Each face of `x` is tried in both orientations, at every pair of a piece
/// vertex and a disc vertex with the same image.
pub fn get_children(
    x: &Arc<Complex>,
    piece: &ComplexMorphism,
) -> Result<Vec<ComplexMorphism>, ComplexError> {
    Ok(children_where(x, piece, |_| true)?
        .into_iter()
        .map(|child| child.immersion)
        .collect())
}

/// [`get_children`] restricted to attachments at `vertex` of the piece.
pub fn get_children_at_vertex(
    x: &Arc<Complex>,
    piece: &ComplexMorphism,
    vertex: Vertex,
) -> Result<Vec<Child>, ComplexError> {
    children_where(x, piece, |v| v == vertex)
}

fn children_where(
    x: &Arc<Complex>,
    piece: &ComplexMorphism,
    at: impl Fn(Vertex) -> bool,
) -> Result<Vec<Child>, ComplexError> {
    let target_faces = piece.domain().n_faces() + 1;
    let piece_sorted = image_sort(
        piece.domain().skeleton().vertices().filter(|v| at(*v)),
        piece.skeleton().vertex_map(),
    );

    let mut children = Vec::new();
    for face in x.faces() {
        for orientation in Orientation::BOTH {
            let disc = Complex::disc_diagram(x, face, orientation)?;
            let disc_sorted = image_sort(
                disc.domain().skeleton().vertices(),
                disc.skeleton().vertex_map(),
            );

            for (image, piece_vertices) in &piece_sorted {
                let Some(disc_vertices) = disc_sorted.get(image) else {
                    continue;
                };
                for (v1, v2) in itertools::iproduct!(piece_vertices, disc_vertices) {
                    let (wedge, incl, _) =
                        ComplexMorphism::wedge_with_inclusions(piece, *v1, &disc, *v2)?;
                    let (proj, imm) = fold_complex_morphism(&wedge)?;
                    if imm.domain().n_faces() != target_faces {
                        continue;
                    }
                    debug!(
                        "child from face {face} ({orientation:?}) at {v1}~{v2}: chi {}",
                        imm.domain().chi()
                    );
                    children.push(Child {
                        inclusion: ComplexMorphism::compose(&proj, &incl)?,
                        immersion: imm,
                    });
                }
            }
        }
    }
    Ok(children)
}
