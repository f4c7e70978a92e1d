use std::sync::Arc;

use cellfold::complex::{Complex, ComplexMorphism};
use cellfold::face::{Face, FaceMap, Orientation};
use cellfold::folding::fold_complex_morphism;
use cellfold::graph::builder::GraphBuilder;
use cellfold::graph::{Edge, GraphMorphism};
use cellfold::presentation::Presentation;
use cellfold::set_map::SetMap;

/// A six-face complex with chi 2 immersing into the presentation complex of
/// `<a, b | abbaB, baBAA>`.
fn counterexample() -> ComplexMorphism {
    let x = Arc::new(
        Presentation::from_strings(&["a", "b"], &["abbaB", "baBAA"])
            .complex()
            .unwrap(),
    );
    let skeleton = x.skeleton();
    let v = skeleton.vertices().next().unwrap();
    let (a, b) = {
        let mut petals = skeleton.orientation();
        (petals.next().unwrap(), petals.next().unwrap())
    };
    let (ai, bi) = (skeleton.bar(a), skeleton.bar(b));
    let (alpha, beta) = (Face(0), Face(1));

    let mut builder = GraphBuilder::new();
    let v0 = builder.add_vertex("0");
    let v1 = builder.add_vertex("1");
    let v2 = builder.add_vertex("2");
    let v3 = builder.add_vertex("3");
    let e1 = builder.add_edge(v0, v2, "e1");
    let e2 = builder.add_edge(v1, v2, "e2");
    let e3 = builder.add_edge(v3, v1, "e3");
    let e4 = builder.add_edge(v3, v0, "e4");
    let e5 = builder.add_edge(v1, v0, "e5");
    let e6 = builder.add_edge(v2, v2, "e6");
    let e7 = builder.add_edge(v3, v1, "e7");
    let e8 = builder.add_edge(v0, v3, "e8");
    let y_skeleton = Arc::new(builder.build());
    let bar = |e: Edge| y_skeleton.bar(e);

    let faces = vec![
        vec![bar(e1), bar(e4), e3, e2, e6],
        vec![e5, e8, e4, e1, bar(e2)],
        vec![e8, e3, e5, e8, e4],
        vec![e2, bar(e6), bar(e6), bar(e1), bar(e5)],
        vec![e7, e2, bar(e6), bar(e2), bar(e3)],
        vec![e7, e5, bar(e4), e7, bar(e3)],
    ];
    let y = Arc::new(Complex::new(y_skeleton.clone(), faces).unwrap());

    let targets = [
        (alpha, Orientation::Positive),
        (beta, Orientation::Positive),
        (alpha, Orientation::Positive),
        (alpha, Orientation::Positive),
        (beta, Orientation::Negative),
        (alpha, Orientation::Positive),
    ];
    let face_maps: SetMap<Face, FaceMap> = y
        .faces()
        .zip(targets)
        .map(|(face, (target, orientation))| {
            let fm = FaceMap::new(face, y[face].len(), target, x[target].len(), 0, orientation);
            (face, fm.unwrap())
        })
        .collect();

    let vertex_map = y_skeleton.vertices().map(|w| (w, v)).collect();
    let edge_map = [
        (e1, ai),
        (e2, a),
        (e3, b),
        (e4, bi),
        (e5, b),
        (e6, bi),
        (e7, a),
        (e8, a),
    ]
    .into_iter()
    .collect();
    let f = GraphMorphism::new(y_skeleton.clone(), skeleton.clone(), vertex_map, edge_map).unwrap();

    ComplexMorphism::new(y, x.clone(), f, face_maps).unwrap()
}

#[test]
fn chi_two_immersion() {
    let imm = counterexample();
    assert_eq!(imm.domain().chi(), 2);
    assert_eq!(imm.codomain().chi(), 1);
    assert!(imm.is_immersion());
}

#[test]
fn folding_leaves_it_unchanged() {
    let imm = counterexample();
    let (proj, folded) = fold_complex_morphism(&imm).unwrap();
    assert_eq!(folded.domain().n_faces(), 6);
    assert_eq!(proj, ComplexMorphism::identity(imm.domain()).unwrap());
    assert_eq!(folded, imm);
}

#[test]
fn survives_json() {
    let imm = counterexample();
    let json = imm.json().unwrap();
    let loaded = ComplexMorphism::load_json(&json).unwrap();
    assert_eq!(loaded, imm);
    assert!(loaded.is_immersion());
}
