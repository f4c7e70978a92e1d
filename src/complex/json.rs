use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::face::{Face, FaceMap, Orientation};
use crate::graph::{json::GraphJson, Edge, Graph, GraphMorphism, Vertex};

use super::{Complex, ComplexError, ComplexMorphism};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexJson {
    pub skeleton: GraphJson,
    pub faces: Vec<Vec<usize>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceMapJson {
    pub origin: usize,
    pub target: usize,
    pub start_index: usize,
    pub orientation: i64,
    pub origin_start_index: usize,
    pub index_map: Vec<usize>,
}

/// Structural json form of a [`ComplexMorphism`], sufficient to rebuild an
/// identical morphism.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexMorphismJson {
    pub domain: ComplexJson,
    pub codomain: ComplexJson,
    pub vertex_map: BTreeMap<usize, usize>,
    pub edge_map: BTreeMap<usize, usize>,
    pub face_maps: Vec<FaceMapJson>,
}

impl Complex {
    pub fn json_data(&self) -> ComplexJson {
        ComplexJson {
            skeleton: self.skeleton.json_data(),
            faces: self
                .faces
                .iter()
                .map(|(_, b)| b.iter().map(|e| e.0).collect())
                .collect(),
        }
    }

    pub fn from_json_data(data: &ComplexJson) -> Result<Complex, ComplexError> {
        let skeleton = Graph::from_json_data(&data.skeleton)?;
        let faces = data
            .faces
            .iter()
            .map(|b| b.iter().map(|e| Edge(*e)).collect())
            .collect();
        Complex::new(Arc::new(skeleton), faces)
    }

    pub fn json(&self) -> Result<String, ComplexError> {
        serde_json::to_string(&self.json_data()).map_err(|e| ComplexError::Json(e.to_string()))
    }

    pub fn load_json(json: &str) -> Result<Complex, ComplexError> {
        let data: ComplexJson =
            serde_json::from_str(json).map_err(|e| ComplexError::Json(e.to_string()))?;
        Complex::from_json_data(&data)
    }
}

impl ComplexMorphism {
    pub fn json_data(&self) -> ComplexMorphismJson {
        ComplexMorphismJson {
            domain: self.domain().json_data(),
            codomain: self.codomain().json_data(),
            vertex_map: self
                .skeleton()
                .vertex_map()
                .iter()
                .map(|(v, w)| (v.0, w.0))
                .collect(),
            edge_map: self
                .skeleton()
                .edge_map()
                .iter()
                .map(|(e, d)| (e.0, d.0))
                .collect(),
            face_maps: self
                .face_maps()
                .values()
                .map(|fm| FaceMapJson {
                    origin: fm.origin().0,
                    target: fm.target().0,
                    start_index: fm.start_index(),
                    orientation: fm.orientation().sign(),
                    origin_start_index: fm.origin_start_index(),
                    index_map: fm.index_map().to_vec(),
                })
                .collect(),
        }
    }

    /// Rebuilds the morphism, revalidating every invariant.
    pub fn from_json_data(data: &ComplexMorphismJson) -> Result<ComplexMorphism, ComplexError> {
        let domain = Arc::new(Complex::from_json_data(&data.domain)?);
        let codomain = Arc::new(Complex::from_json_data(&data.codomain)?);

        let skeleton = GraphMorphism::new(
            domain.skeleton().clone(),
            codomain.skeleton().clone(),
            data.vertex_map
                .iter()
                .map(|(v, w)| (Vertex(*v), Vertex(*w)))
                .collect(),
            data.edge_map
                .iter()
                .map(|(e, d)| (Edge(*e), Edge(*d)))
                .collect(),
        )?;

        let mut face_maps = crate::set_map::SetMap::new();
        for fm in &data.face_maps {
            let (origin, target) = (Face(fm.origin), Face(fm.target));
            let orientation = Orientation::from_sign(fm.orientation).ok_or_else(|| {
                ComplexError::Json(format!(
                    "face {origin} has orientation {}, expected 1 or -1",
                    fm.orientation
                ))
            })?;
            let face_map = FaceMap::with_origin_start(
                origin,
                domain.boundary(origin)?.len(),
                target,
                codomain.boundary(target)?.len(),
                fm.start_index,
                orientation,
                fm.origin_start_index,
            )?;
            if face_map.index_map() != fm.index_map.as_slice() {
                return Err(ComplexError::Json(format!(
                    "index map of face {origin} does not match its rotation data"
                )));
            }
            face_maps.insert(origin, face_map);
        }

        ComplexMorphism::new(domain, codomain, skeleton, face_maps)
    }

    pub fn json(&self) -> Result<String, ComplexError> {
        serde_json::to_string(&self.json_data()).map_err(|e| ComplexError::Json(e.to_string()))
    }

    /// The exact inverse of [`ComplexMorphism::json`].
    pub fn load_json(json: &str) -> Result<ComplexMorphism, ComplexError> {
        let data: ComplexMorphismJson =
            serde_json::from_str(json).map_err(|e| ComplexError::Json(e.to_string()))?;
        ComplexMorphism::from_json_data(&data)
    }
}
