//! Stallings folding of graph and complex morphisms.
//!
//! Every morphism `f : A -> B` factors as a quotient `proj : A -> C` followed
//! by an immersion `imm : C -> B`. Graphs are folded one admissible pair at a
//! time; each quotient is built in a fresh arena, so no graph referenced by an
//! existing morphism is ever mutated.

use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::complex::{Complex, ComplexError, ComplexMorphism};
use crate::face::{offset_equal, Face, FaceMap, Orientation};
use crate::graph::{Edge, Graph, GraphMorphism, MorphismError};
use crate::set_map::SetMap;

/// The canonical quotient map `G -> G/[e1 = e2]` identifying two edges with
/// a common initial vertex, together with their terminal vertices.
pub fn fold_admissible_pair_graph(
    graph: &Arc<Graph>,
    e1: Edge,
    e2: Edge,
) -> Result<GraphMorphism, MorphismError> {
    graph.edge(e1)?;
    graph.edge(e2)?;
    if e1 == e2 || e1 == graph.bar(e2) || graph.initial(e1) != graph.initial(e2) {
        return Err(MorphismError::NotAdmissible(e1, e2));
    }

    let (v, w) = (graph.terminal(e1), graph.terminal(e2));
    let (mut quotient, copy) = graph.copy_with_maps();
    let (vp, wp) = (copy.vertices[&v], copy.vertices[&w]);
    let (e1p, e2p) = (copy.edges[&e1], copy.edges[&e2]);
    let (e1p_bar, e2p_bar) = (quotient.bar(e1p), quotient.bar(e2p));

    if wp != vp {
        quotient.detach_vertex(wp);
    }
    quotient.remove_edge(e2p);
    if wp != vp {
        quotient.redirect(wp, vp);
    }

    let (quotient, compact) = quotient.copy_with_maps();
    let vertex_map = graph
        .vertices()
        .map(|x| {
            let xp = copy.vertices[&x];
            let xp = if xp == wp { vp } else { xp };
            (x, compact.vertices[&xp])
        })
        .collect();
    let edge_map = graph
        .edges()
        .map(|e| {
            let ep = match copy.edges[&e] {
                ep if ep == e2p => e1p,
                ep if ep == e2p_bar => e1p_bar,
                ep => ep,
            };
            (e, compact.edges[&ep])
        })
        .collect();

    GraphMorphism::new(graph.clone(), Arc::new(quotient), vertex_map, edge_map)
}

/// Factors `f` through `G/[e1 = e2]`, returning the quotient map and the
/// induced map out of the quotient.
pub fn fold_admissible_pair(
    f: &GraphMorphism,
    e1: Edge,
    e2: Edge,
) -> Result<(GraphMorphism, GraphMorphism), MorphismError> {
    f.domain().edge(e1)?;
    f.domain().edge(e2)?;
    if f.edge(e1) != f.edge(e2) {
        return Err(MorphismError::NotAdmissible(e1, e2));
    }
    let proj = fold_admissible_pair_graph(f.domain(), e1, e2)?;

    let mut vertex_map = SetMap::new();
    for (v, w) in f.vertex_map() {
        vertex_map.insert(proj.vertex(*v), *w);
    }
    let mut edge_map = SetMap::new();
    for (e, d) in f.edge_map() {
        edge_map.insert(proj.edge(*e), *d);
    }
    let g = GraphMorphism::new(
        proj.codomain().clone(),
        f.codomain().clone(),
        vertex_map,
        edge_map,
    )?;
    Ok((proj, g))
}

/// Folds `f : G -> H` until no admissible pair remains.
///
/// Returns `(proj, g)` with `g` an immersion and `f = g ∘ proj`. Every fold
/// removes at least one edge pair, so this takes at most `|E(G)|/2` steps.
pub fn fold_graph_morphism(
    f: &GraphMorphism,
) -> Result<(GraphMorphism, GraphMorphism), MorphismError> {
    let mut proj = GraphMorphism::identity(f.domain());
    let mut current = f.clone();
    let mut steps = 0usize;

    while let Some((e1, e2)) = current.admissible_pair() {
        trace!("folding admissible pair {e1}, {e2}");
        let (step, g) = fold_admissible_pair(&current, e1, e2)?;
        proj = GraphMorphism::compose(&step, &proj)?;
        current = g;
        steps += 1;
    }

    debug!(
        "folded graph morphism in {steps} steps: {} -> {} vertices",
        f.domain().n_vertices(),
        current.domain().n_vertices()
    );
    Ok((proj, current))
}

/// Folds a complex morphism `f : A -> B` into `proj : A -> C` and
/// `imm : C -> B` with `f = imm ∘ proj`.
///
/// The skeleton map is folded first. Every face of `A` is then pushed to the
/// folded skeleton; within each group of faces sharing a target face in `B`,
/// faces whose pushed boundaries agree up to rotation and reflection, letter
/// by letter together with the target position of each letter, are merged.
/// Faces are processed in order and each merges into the earliest surviving
/// face it matches.
pub fn fold_complex_morphism(
    f: &ComplexMorphism,
) -> Result<(ComplexMorphism, ComplexMorphism), ComplexError> {
    let a = f.domain();
    let b = f.codomain();
    let (proj_skeleton, g) = fold_graph_morphism(f.skeleton())?;
    let c_skeleton = g.domain().clone();

    let mut groups: IndexMap<Face, Vec<Face>> = IndexMap::new();
    let mut c_letters: Vec<Vec<(Edge, usize)>> = Vec::new();
    let mut c_to_b = SetMap::new();
    let mut a_to_c = SetMap::new();

    for (face, fm) in f.face_maps() {
        let letters: Vec<(Edge, usize)> = a[*face]
            .iter()
            .enumerate()
            .map(|(i, e)| (proj_skeleton.edge(*e), fm[i]))
            .collect();

        let group = groups.entry(fm.target()).or_default();
        let matched = group.iter().find_map(|c| {
            offset_equal(&letters, &c_letters[c.0], |(e, j)| (c_skeleton.bar(*e), *j))
                .map(|(offset, orientation)| (*c, offset, orientation))
        });

        let (c_face, offset, orientation) = match matched {
            Some(m) => {
                trace!("face {face} merges into {}", m.0);
                m
            }
            None => {
                let c_face = Face(c_letters.len());
                c_to_b.insert(
                    c_face,
                    FaceMap::with_origin_start(
                        c_face,
                        letters.len(),
                        fm.target(),
                        fm.target_len(),
                        fm.start_index(),
                        fm.orientation(),
                        fm.origin_start_index(),
                    )?,
                );
                c_letters.push(letters);
                group.push(c_face);
                (c_face, 0, Orientation::Positive)
            }
        };

        let n = a[*face].len();
        a_to_c.insert(
            *face,
            FaceMap::new(*face, n, c_face, c_letters[c_face.0].len(), offset, orientation)?,
        );
    }

    let c_faces = c_letters
        .into_iter()
        .map(|letters| letters.into_iter().map(|(e, _)| e).collect())
        .collect();
    let c = Arc::new(Complex::new(c_skeleton, c_faces)?);
    debug!(
        "folded complex morphism: {} -> {} faces",
        a.n_faces(),
        c.n_faces()
    );

    let imm = ComplexMorphism::new(c.clone(), b.clone(), g, c_to_b)?;
    let proj = ComplexMorphism::new(a.clone(), c, proj_skeleton, a_to_c)?;
    Ok((proj, imm))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use super::*;
    use crate::graph::builder::GraphBuilder;
    use crate::presentation::Presentation;

    /// A rose with `gens` petals and a random graph mapping into it.
    fn random_map_into_rose(
        gens: usize,
        n_vertices: usize,
        edges: Vec<(usize, usize, usize)>,
    ) -> GraphMorphism {
        let mut rose = GraphBuilder::new();
        let base = rose.add_vertex("v");
        let petals: Vec<_> = (0..gens)
            .map(|i| rose.add_edge(base, base, format!("x{i}")))
            .collect();
        let rose = Arc::new(rose.build());

        let mut builder = GraphBuilder::new();
        let vertices: Vec<_> = (0..n_vertices)
            .map(|i| builder.add_vertex(i.to_string()))
            .collect();
        let mut edge_map = SetMap::new();
        for (i, t, label) in edges {
            let e = builder.add_edge(vertices[i % n_vertices], vertices[t % n_vertices], "");
            edge_map.insert(e, petals[label % gens]);
        }
        let graph = Arc::new(builder.build());
        let vertex_map = graph.vertices().map(|v| (v, base)).collect();
        GraphMorphism::new(graph, rose, vertex_map, edge_map).unwrap()
    }

    #[test]
    fn folding_two_edges_onto_one() {
        let f = random_map_into_rose(1, 3, vec![(0, 1, 0), (0, 2, 0)]);
        let (proj, g) = fold_graph_morphism(&f).unwrap();

        assert!(g.is_immersion());
        assert_eq!(g.domain().n_vertices(), 2);
        assert_eq!(g.domain().n_oriented(), 1);
        assert_eq!(GraphMorphism::compose(&g, &proj).unwrap(), f);
    }

    #[test]
    fn folding_pair_with_equal_terminals() {
        // Two parallel edges 0 -> 1 with the same label fold to one edge.
        let f = random_map_into_rose(1, 2, vec![(0, 1, 0), (0, 1, 0)]);
        let (proj, g) = fold_graph_morphism(&f).unwrap();
        assert_eq!(g.domain().n_vertices(), 2);
        assert_eq!(g.domain().n_oriented(), 1);
        assert_eq!(proj.codomain(), g.domain());
    }

    #[test]
    fn non_admissible_pairs_are_rejected() {
        let f = random_map_into_rose(2, 3, vec![(0, 1, 0), (2, 1, 0), (0, 2, 1)]);
        let graph = f.domain();
        let edges: Vec<_> = graph.orientation().collect();

        assert_eq!(
            fold_admissible_pair_graph(graph, edges[0], edges[1]).map(|_| ()),
            Err(MorphismError::NotAdmissible(edges[0], edges[1]))
        );
        assert!(fold_admissible_pair_graph(graph, edges[0], edges[2]).is_ok());
        assert_eq!(
            fold_admissible_pair(&f, edges[0], edges[2]).map(|_| ()),
            Err(MorphismError::NotAdmissible(edges[0], edges[2]))
        );
    }

    #[test]
    fn folding_an_immersion_is_trivial() {
        let f = random_map_into_rose(2, 2, vec![(0, 1, 0), (1, 0, 1)]);
        assert!(f.is_immersion());
        let (proj, g) = fold_graph_morphism(&f).unwrap();
        assert_eq!(proj, GraphMorphism::identity(f.domain()));
        assert_eq!(g, f);
    }

    #[test]
    fn folding_disc_of_trivial_relator() {
        let x = Arc::new(Presentation::from_strings(&["a"], &["aA"]).complex().unwrap());
        assert_eq!(x.chi(), 1);

        let disc = Complex::disc_diagram(&x, Face(0), Orientation::Positive).unwrap();
        let (proj, imm) = fold_complex_morphism(&disc).unwrap();

        // The boundary a a⁻¹ folds onto a single edge.
        assert_eq!(imm.domain().skeleton().n_oriented(), 1);
        assert_eq!(imm.domain().n_faces(), 1);
        assert!(imm.skeleton().is_immersion());
        assert_eq!(ComplexMorphism::compose(&imm, &proj).unwrap(), disc);

        // Folding again changes nothing.
        let (proj2, imm2) = fold_complex_morphism(&imm).unwrap();
        assert_eq!(proj2, ComplexMorphism::identity(imm.domain()).unwrap());
        assert_eq!(imm2, imm);
    }

    #[test]
    fn duplicate_faces_merge() {
        // Two discs glued along a common vertex that both read `ab` fold into one.
        let x = Arc::new(Presentation::from_strings(&["a", "b"], &["ab"]).complex().unwrap());
        let d = Complex::disc_diagram(&x, Face(0), Orientation::Positive).unwrap();
        let v = d.domain().skeleton().vertices().next().unwrap();
        let w = ComplexMorphism::wedge(&d, v, &d, v).unwrap();
        assert_eq!(w.domain().n_faces(), 2);

        let (proj, imm) = fold_complex_morphism(&w).unwrap();
        assert_eq!(imm.domain().n_faces(), 1);
        assert!(imm.is_immersion());
        assert_eq!(ComplexMorphism::compose(&imm, &proj).unwrap(), w);
    }

    #[test]
    fn reversed_duplicate_faces_merge() {
        let x = Arc::new(Presentation::from_strings(&["a", "b"], &["abAB"]).complex().unwrap());
        let pos = Complex::disc_diagram(&x, Face(0), Orientation::Positive).unwrap();
        let neg = Complex::disc_diagram(&x, Face(0), Orientation::Negative).unwrap();
        let v = pos.domain().skeleton().vertices().next().unwrap();
        let w = neg.domain().skeleton().vertices().next().unwrap();
        let wedge = ComplexMorphism::wedge(&pos, v, &neg, w).unwrap();

        let (proj, imm) = fold_complex_morphism(&wedge).unwrap();
        assert_eq!(imm.domain().n_faces(), 1);
        assert_eq!(
            proj.face_map(Face(1)).orientation(),
            Orientation::Negative
        );
        assert_eq!(ComplexMorphism::compose(&imm, &proj).unwrap(), wedge);
    }

    proptest! {
        #[test]
        fn fold_factors_morphism(
            n_vertices in 1usize..6,
            edges in prop::collection::vec((0usize..6, 0usize..6, 0usize..2), 0..8),
        ) {
            let f = random_map_into_rose(2, n_vertices, edges);
            let (proj, g) = fold_graph_morphism(&f).unwrap();
            prop_assert!(g.is_immersion());
            prop_assert!(g.domain().n_vertices() <= f.domain().n_vertices());
            prop_assert_eq!(GraphMorphism::compose(&g, &proj).unwrap(), f);
        }

        #[test]
        fn fold_factors_complex_morphism(
            relator in "[aAbB]{1,6}",
            orientation in prop::bool::ANY,
        ) {
            let x = Presentation::from_strings(&["a", "b"], &[relator.as_str()]).complex().unwrap();
            let x = Arc::new(x);
            let orientation = if orientation { Orientation::Positive } else { Orientation::Negative };
            let disc = Complex::disc_diagram(&x, Face(0), orientation).unwrap();
            let v = disc.domain().skeleton().vertices().next().unwrap();
            let wedge = ComplexMorphism::wedge(&disc, v, &disc, v).unwrap();

            let (proj, imm) = fold_complex_morphism(&wedge).unwrap();
            prop_assert!(imm.skeleton().is_immersion());
            prop_assert!(imm.domain().n_faces() <= wedge.domain().n_faces());
            prop_assert_eq!(ComplexMorphism::compose(&imm, &proj).unwrap(), wedge);
        }
    }
}
