use std::sync::Arc;

use ahash::AHashSet;

use crate::face::{Face, FaceMap, Orientation};
use crate::graph::{morphism::same_graph, Edge, GraphMorphism, Vertex};
use crate::set_map::SetMap;

use super::{same_complex, Complex, ComplexError};

/// A morphism of 2-complexes: a map of 1-skeleta together with a covering
/// face map for every face of the domain, commuting with the skeleton map.
#[derive(Clone, Debug)]
pub struct ComplexMorphism {
    domain: Arc<Complex>,
    codomain: Arc<Complex>,
    skeleton: GraphMorphism,
    face_maps: SetMap<Face, FaceMap>,
}

impl ComplexMorphism {
    pub fn new(
        domain: Arc<Complex>,
        codomain: Arc<Complex>,
        skeleton: GraphMorphism,
        face_maps: SetMap<Face, FaceMap>,
    ) -> Result<Self, ComplexError> {
        let domain_faces: AHashSet<_> = domain.faces().collect();
        if face_maps.domain() != domain_faces {
            return Err(ComplexError::FaceMapDomain);
        }
        if !(same_graph(skeleton.domain(), domain.skeleton())
            && same_graph(skeleton.codomain(), codomain.skeleton()))
        {
            return Err(ComplexError::SkeletonMismatch);
        }

        for (face, fm) in &face_maps {
            let origin = domain.boundary(*face)?;
            if fm.origin() != *face || fm.origin_len() != origin.len() {
                return Err(ComplexError::FaceMapOrigin(*face));
            }
            let target = codomain
                .boundary(fm.target())
                .map_err(|_| ComplexError::FaceMapTarget(*face))?;
            if fm.target_len() != target.len() {
                return Err(ComplexError::FaceMapTarget(*face));
            }

            for (index, e) in origin.iter().enumerate() {
                if skeleton.edge(*e) != fm.eval(codomain.skeleton(), target, index) {
                    return Err(ComplexError::NotCommuting { face: *face, index });
                }
            }
        }

        Ok(ComplexMorphism {
            domain,
            codomain,
            skeleton,
            face_maps,
        })
    }

    pub fn domain(&self) -> &Arc<Complex> {
        &self.domain
    }

    pub fn codomain(&self) -> &Arc<Complex> {
        &self.codomain
    }

    pub fn skeleton(&self) -> &GraphMorphism {
        &self.skeleton
    }

    pub fn face_maps(&self) -> &SetMap<Face, FaceMap> {
        &self.face_maps
    }

    /// # Panics
    /// If `face` is not a face of the domain.
    pub fn face_map(&self, face: Face) -> &FaceMap {
        &self.face_maps[&face]
    }

    /// The skeleton map is an immersion and no face wraps more than once
    /// around its image.
    pub fn is_immersion(&self) -> bool {
        self.skeleton.is_immersion() && self.face_maps.values().all(|fm| fm.degree() == 1)
    }

    /// The skeleton map is an immersion and no two corners of attached discs
    /// collide locally, i.e. the map from boundary edge occurrences to
    /// `(image face, index, orientation)` is injective, reading every
    /// occurrence in both directions.
    pub fn is_branched_immersion(&self) -> bool {
        if !self.skeleton.is_immersion() {
            return false;
        }

        let mut seen: AHashSet<(Edge, Face, usize, Orientation)> = AHashSet::new();
        for (face, fm) in &self.face_maps {
            for (i, e) in self.domain[*face].iter().enumerate() {
                let forward = (*e, fm.target(), fm[i], fm.orientation());
                let backward = (
                    self.domain.skeleton().bar(*e),
                    fm.target(),
                    fm[i],
                    -fm.orientation(),
                );
                if !seen.insert(forward) || !seen.insert(backward) {
                    return false;
                }
            }
        }
        true
    }

    /// Factors `f1` and `f2` through the wedge of their domains at `v1` and
    /// `v2`. Both must send the basepoints to the same vertex of a common
    /// codomain.
    pub fn wedge(
        f1: &ComplexMorphism,
        v1: Vertex,
        f2: &ComplexMorphism,
        v2: Vertex,
    ) -> Result<ComplexMorphism, ComplexError> {
        Ok(ComplexMorphism::wedge_with_inclusions(f1, v1, f2, v2)?.0)
    }

    /// [`ComplexMorphism::wedge`] also returning the inclusions of both
    /// domains into the wedge.
    pub fn wedge_with_inclusions(
        f1: &ComplexMorphism,
        v1: Vertex,
        f2: &ComplexMorphism,
        v2: Vertex,
    ) -> Result<(ComplexMorphism, ComplexMorphism, ComplexMorphism), ComplexError> {
        if !(f1.domain.skeleton().contains_vertex(v1) && f2.domain.skeleton().contains_vertex(v2))
        {
            return Err(ComplexError::WedgeBasepoint);
        }
        if f1.skeleton.vertex(v1) != f2.skeleton.vertex(v2) {
            return Err(ComplexError::WedgeBasepoint);
        }
        if !same_complex(&f1.codomain, &f2.codomain) {
            return Err(ComplexError::CodomainMismatch);
        }

        let (x, incl1, incl2) = Complex::wedge_inclusions(&f1.domain, v1, &f2.domain, v2)?;

        let mut vertex_map = SetMap::new();
        let mut edge_map = SetMap::new();
        let mut face_maps = SetMap::new();
        for (f, incl) in [(f1, &incl1), (f2, &incl2)] {
            vertex_map.extend(
                f.skeleton
                    .vertex_map()
                    .iter()
                    .map(|(v, w)| (incl.skeleton.vertex(*v), *w)),
            );
            edge_map.extend(
                f.skeleton
                    .edge_map()
                    .iter()
                    .map(|(e, d)| (incl.skeleton.edge(*e), *d)),
            );
            for (face, fm) in &f.face_maps {
                let wedge_face = incl.face_map(*face).target();
                face_maps.insert(
                    wedge_face,
                    FaceMap::with_origin_start(
                        wedge_face,
                        fm.origin_len(),
                        fm.target(),
                        fm.target_len(),
                        fm.start_index(),
                        fm.orientation(),
                        fm.origin_start_index(),
                    )?,
                );
            }
        }

        let skeleton = GraphMorphism::new(
            x.skeleton().clone(),
            f1.codomain.skeleton().clone(),
            vertex_map,
            edge_map,
        )?;
        let f = ComplexMorphism::new(x, f1.codomain.clone(), skeleton, face_maps)?;
        Ok((f, incl1, incl2))
    }

    /// The composite `f ∘ g`.
    pub fn compose(f: &ComplexMorphism, g: &ComplexMorphism) -> Result<ComplexMorphism, ComplexError> {
        if !same_complex(&g.codomain, &f.domain) {
            return Err(ComplexError::NotComposable);
        }
        let face_maps = g
            .face_maps
            .iter()
            .map(|(face, g_map)| {
                let f_map = f
                    .face_maps
                    .get(&g_map.target())
                    .ok_or(ComplexError::NotComposable)?;
                Ok((*face, FaceMap::compose(f_map, g_map)?))
            })
            .collect::<Result<SetMap<_, _>, ComplexError>>()?;
        ComplexMorphism::new(
            g.domain.clone(),
            f.codomain.clone(),
            GraphMorphism::compose(&f.skeleton, &g.skeleton)?,
            face_maps,
        )
    }

    pub fn identity(x: &Arc<Complex>) -> Result<ComplexMorphism, ComplexError> {
        let face_maps = x
            .faces()
            .map(|face| {
                let n = x[face].len();
                Ok((face, FaceMap::new(face, n, face, n, 0, Orientation::Positive)?))
            })
            .collect::<Result<SetMap<_, _>, ComplexError>>()?;
        ComplexMorphism::new(
            x.clone(),
            x.clone(),
            GraphMorphism::identity(x.skeleton()),
            face_maps,
        )
    }
}

impl PartialEq for ComplexMorphism {
    fn eq(&self, other: &Self) -> bool {
        same_complex(&self.domain, &other.domain)
            && same_complex(&self.codomain, &other.codomain)
            && self.skeleton == other.skeleton
            && self.face_maps == other.face_maps
    }
}
