use similar_asserts::assert_eq;

use super::*;
use crate::folding::fold_complex_morphism;
use crate::presentation::Presentation;

fn presentation_complex(generators: &[&str], relators: &[&str]) -> Arc<Complex> {
    Arc::new(
        Presentation::from_strings(generators, relators)
            .complex()
            .unwrap(),
    )
}

#[test]
fn disc_three() {
    let d = Complex::disc(3).unwrap();
    assert_eq!(d.skeleton().n_vertices(), 3);
    assert_eq!(d.skeleton().n_oriented(), 3);
    assert_eq!(d.n_faces(), 1);
    assert_eq!(d.chi(), 1);
    assert_eq!(d[Face(0)], vec![Edge(0), Edge(2), Edge(4)]);
}

#[test]
fn faces_must_be_closed_cycles() {
    let cycle = Arc::new(Graph::cycle(3));
    assert_eq!(
        Complex::new(cycle.clone(), vec![vec![Edge(0), Edge(2)]]),
        Err(ComplexError::NotAClosedCycle(Face(0)))
    );
    assert_eq!(
        Complex::new(cycle.clone(), vec![vec![Edge(9)]]),
        Err(ComplexError::FaceOutsideSkeleton(Face(0)))
    );
    // Running backwards along bars is fine.
    assert!(Complex::new(cycle, vec![vec![Edge(5), Edge(3), Edge(1)]]).is_ok());
}

#[test]
fn free_faces_of_disc() {
    let d = Complex::disc(3).unwrap();
    assert_eq!(
        d.free_faces(),
        vec![(Edge(0), Face(0)), (Edge(2), Face(0)), (Edge(4), Face(0))]
    );
    assert!(d.is_free_face(Edge(1)));
    assert!(!d.is_free_face(Edge(17)));
}

#[test]
fn edges_read_twice_are_not_free() {
    let x = presentation_complex(&["a"], &["aA"]);
    assert_eq!(x.chi(), 1);
    assert!(!x.has_free_faces());

    let y = presentation_complex(&["a", "b"], &["ab", "b"]);
    let a = y.skeleton().orientation().next().unwrap();
    assert_eq!(y.free_faces(), vec![(a, Face(0))]);
}

#[test]
fn attaching_map_starts_at_first_edge() {
    let x = presentation_complex(&["a", "b"], &["abAB", "ab"]);
    let (w, starts) = x.attaching_map().unwrap();
    assert_eq!(w.domain().n_vertices(), 6);
    assert_eq!(w.domain().n_oriented(), 6);
    assert!(w.domain().is_open_linear());
    for face in x.faces() {
        let start = starts[&face];
        let first = x[face][0];
        assert!(w
            .domain()
            .out_edges(start)
            .iter()
            .any(|e| w.edge(*e) == first));
    }
}

#[test]
fn wedge_shifts_second_faces() {
    let d3 = Arc::new(Complex::disc(3).unwrap());
    let d2 = Arc::new(Complex::disc(2).unwrap());
    let (w, incl1, incl2) = Complex::wedge_inclusions(&d3, Vertex(0), &d2, Vertex(1)).unwrap();

    assert_eq!(w.n_faces(), 2);
    assert_eq!(w.skeleton().n_vertices(), 4);
    assert_eq!(w.chi(), d3.chi() + d2.chi() - 1);
    assert_eq!(incl1.face_map(Face(0)).target(), Face(0));
    assert_eq!(incl2.face_map(Face(0)).target(), Face(1));
    assert!(incl1.is_immersion());
    assert!(incl2.is_immersion());
}

#[test]
fn copy_preserves_faces() {
    let x = presentation_complex(&["a", "b"], &["abAB"]);
    let (copy, relabeling) = x.copy_with_maps();
    assert_eq!(copy.n_faces(), 1);
    assert_eq!(
        copy[Face(0)],
        x[Face(0)].iter().map(|e| relabeling.edges[e]).collect::<Vec<_>>()
    );
    assert_eq!(copy.chi(), x.chi());
}

#[test]
fn disc_diagram_commutes() {
    let x = presentation_complex(&["a", "b"], &["abAB"]);
    for orientation in Orientation::BOTH {
        let f = Complex::disc_diagram(&x, Face(0), orientation).unwrap();
        assert_eq!(f.domain().n_faces(), 1);
        assert_eq!(f.face_map(Face(0)).orientation(), orientation);
        assert!(f.is_immersion());
    }
    assert_eq!(
        Complex::disc_diagram(&x, Face(3), Orientation::Positive).map(|_| ()),
        Err(ComplexError::NoFace(Face(3)))
    );
}

#[test]
fn degree_two_is_branched_only() {
    let x = presentation_complex(&["a"], &["a"]);
    let d = Arc::new(Complex::disc(2).unwrap());
    let a = x.skeleton().orientation().next().unwrap();
    let skeleton = GraphMorphism::new(
        d.skeleton().clone(),
        x.skeleton().clone(),
        d.skeleton().vertices().map(|v| (v, Vertex(0))).collect(),
        d.skeleton().orientation().map(|e| (e, a)).collect(),
    )
    .unwrap();
    let fm = FaceMap::new(Face(0), 2, Face(0), 1, 0, Orientation::Positive).unwrap();
    let f = ComplexMorphism::new(d, x, skeleton, [(Face(0), fm)].into_iter().collect()).unwrap();

    assert_eq!(f.face_map(Face(0)).degree(), 2);
    assert!(f.skeleton().is_immersion());
    assert!(!f.is_immersion());
    assert!(f.is_branched_immersion());
}

#[test]
fn colliding_corners_are_not_branched() {
    // Two faces of the domain both cover the single face of x the same way.
    let x = presentation_complex(&["a"], &["a"]);
    let y = presentation_complex(&["a"], &["a", "a"]);
    let skeleton = GraphMorphism::identity(x.skeleton());
    let skeleton = GraphMorphism::new(
        y.skeleton().clone(),
        x.skeleton().clone(),
        skeleton.vertex_map().clone(),
        skeleton.edge_map().clone(),
    )
    .unwrap();
    let face_maps = y
        .faces()
        .map(|face| {
            (
                face,
                FaceMap::new(face, 1, Face(0), 1, 0, Orientation::Positive).unwrap(),
            )
        })
        .collect();
    let f = ComplexMorphism::new(y, x, skeleton, face_maps).unwrap();
    assert!(f.is_immersion());
    assert!(!f.is_branched_immersion());
}

#[test]
fn morphism_validation() {
    let x = presentation_complex(&["a", "b"], &["ab"]);
    let d = Complex::disc_diagram(&x, Face(0), Orientation::Positive).unwrap();

    assert_eq!(
        ComplexMorphism::new(
            d.domain().clone(),
            x.clone(),
            d.skeleton().clone(),
            SetMap::new()
        )
        .map(|_| ()),
        Err(ComplexError::FaceMapDomain)
    );

    // Rotating the face map by one breaks commutativity with the skeleton.
    let rotated = FaceMap::new(Face(0), 2, Face(0), 2, 1, Orientation::Positive).unwrap();
    assert_eq!(
        ComplexMorphism::new(
            d.domain().clone(),
            x.clone(),
            d.skeleton().clone(),
            [(Face(0), rotated)].into_iter().collect()
        )
        .map(|_| ()),
        Err(ComplexError::NotCommuting {
            face: Face(0),
            index: 0
        })
    );

    let elsewhere = FaceMap::new(Face(0), 2, Face(4), 2, 0, Orientation::Positive).unwrap();
    assert_eq!(
        ComplexMorphism::new(
            d.domain().clone(),
            x.clone(),
            d.skeleton().clone(),
            [(Face(0), elsewhere)].into_iter().collect()
        )
        .map(|_| ()),
        Err(ComplexError::FaceMapTarget(Face(0)))
    );
}

#[test]
fn identity_and_composition() {
    let x = presentation_complex(&["a", "b"], &["abAB"]);
    let f = Complex::disc_diagram(&x, Face(0), Orientation::Negative).unwrap();
    let id_x = ComplexMorphism::identity(&x).unwrap();
    let id_d = ComplexMorphism::identity(f.domain()).unwrap();

    assert_eq!(ComplexMorphism::compose(&id_x, &f).unwrap(), f);
    assert_eq!(ComplexMorphism::compose(&f, &id_d).unwrap(), f);
    assert_eq!(
        ComplexMorphism::compose(&f, &f).map(|_| ()),
        Err(ComplexError::NotComposable)
    );
}

#[test]
fn wedge_of_morphisms() {
    let x = presentation_complex(&["a", "b"], &["abAB"]);
    let f = Complex::disc_diagram(&x, Face(0), Orientation::Positive).unwrap();
    let g = Complex::disc_diagram(&x, Face(0), Orientation::Negative).unwrap();

    let (w, incl1, incl2) = ComplexMorphism::wedge_with_inclusions(&f, Vertex(0), &g, Vertex(0)).unwrap();
    assert_eq!(w.domain().n_faces(), 2);
    assert_eq!(ComplexMorphism::compose(&w, &incl1).unwrap(), f);
    assert_eq!(ComplexMorphism::compose(&w, &incl2).unwrap(), g);

    assert_eq!(
        ComplexMorphism::wedge(&f, Vertex(7), &g, Vertex(0)).map(|_| ()),
        Err(ComplexError::WedgeBasepoint)
    );
    let other = presentation_complex(&["a", "b"], &["abAB", "ab"]);
    let h = Complex::disc_diagram(&other, Face(0), Orientation::Positive).unwrap();
    assert_eq!(
        ComplexMorphism::wedge(&f, Vertex(0), &h, Vertex(0)).map(|_| ()),
        Err(ComplexError::CodomainMismatch)
    );
}

#[test]
fn folded_disc_of_trivial_relator_is_immersed() {
    let x = presentation_complex(&["a"], &["aA"]);
    let d = Complex::disc_diagram(&x, Face(0), Orientation::Positive).unwrap();
    let (_, imm) = fold_complex_morphism(&d).unwrap();
    assert_eq!(imm.skeleton().admissible_pair(), None);
    assert!(imm.is_immersion());
    assert!(imm.is_branched_immersion());
}

#[test]
fn json_round_trip() {
    let x = presentation_complex(&["a", "b"], &["abAB", "aB"]);
    let x_json = x.json().unwrap();
    assert_eq!(Complex::load_json(&x_json).unwrap(), *x);

    let f = Complex::disc_diagram(&x, Face(1), Orientation::Negative).unwrap();
    let loaded = ComplexMorphism::load_json(&f.json().unwrap()).unwrap();
    assert_eq!(loaded, f);
    assert_eq!(loaded.face_map(Face(0)), f.face_map(Face(0)));

    let mut data = f.json_data();
    data.face_maps[0].index_map.reverse();
    assert!(matches!(
        ComplexMorphism::from_json_data(&data),
        Err(ComplexError::Json(_))
    ));

    for sign in [0, 7, -2] {
        let mut data = f.json_data();
        data.face_maps[0].orientation = sign;
        assert!(matches!(
            ComplexMorphism::from_json_data(&data),
            Err(ComplexError::Json(_))
        ));
    }
}

#[test]
fn display_lists_face_labels() {
    let x = presentation_complex(&["a"], &["aA"]);
    let shown = x.to_string();
    assert!(shown.ends_with("Faces: [[a, a⁻¹]]"));
}
