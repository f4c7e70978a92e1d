use std::sync::Arc;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::set_map::{SetMap, SetMapError};

use super::{Edge, Graph, GraphError, Vertex};

#[derive(Clone, Debug, Serialize, Deserialize, Error, PartialEq, Eq)]
pub enum MorphismError {
    #[error("Vertex map is not defined on exactly the vertices of the domain")]
    VertexDomain,
    #[error("Vertex map does not land in the vertices of the codomain")]
    VertexCodomain,
    #[error("Edge map is not defined on exactly the edges of the domain")]
    EdgeDomain,
    #[error("Edge map does not land in the edges of the codomain")]
    EdgeCodomain,
    #[error("Edge map does not commute with the edge involution at edge {0}")]
    Involution(Edge),
    #[error("Morphism does not respect the incidence of edge {0}")]
    Incidence(Edge),
    #[error("Can't compose morphisms of graphs without matching domain/codomain")]
    NotComposable,
    #[error("Disjoint unions of maps must have equal codomain")]
    CodomainMismatch,
    #[error("Edges {0} and {1} do not form an admissible pair")]
    NotAdmissible(Edge, Edge),
    #[error("GraphError: {0}")]
    Graph(#[from] GraphError),
    #[error("SetMapError: {0}")]
    SetMap(#[from] SetMapError),
}

/// A map of graphs commuting with incidence and with the bar involution.
///
/// Domain and codomain are shared and never mutated through the morphism.
#[derive(Clone, Debug)]
pub struct GraphMorphism {
    domain: Arc<Graph>,
    codomain: Arc<Graph>,
    vertex_map: SetMap<Vertex, Vertex>,
    edge_map: SetMap<Edge, Edge>,
}

pub(crate) fn same_graph(a: &Arc<Graph>, b: &Arc<Graph>) -> bool {
    Arc::ptr_eq(a, b) || a == b
}

impl GraphMorphism {
    /// Validates and builds a morphism.
    ///
    /// If `edge_map` is defined exactly on the orientation of the domain it is
    /// extended to the bar edges before validation.
    pub fn new(
        domain: Arc<Graph>,
        codomain: Arc<Graph>,
        vertex_map: SetMap<Vertex, Vertex>,
        mut edge_map: SetMap<Edge, Edge>,
    ) -> Result<Self, MorphismError> {
        let domain_vertices: AHashSet<_> = domain.vertices().collect();
        if vertex_map.domain() != domain_vertices {
            return Err(MorphismError::VertexDomain);
        }
        if !vertex_map.maps_into(|v| codomain.contains_vertex(*v)) {
            return Err(MorphismError::VertexCodomain);
        }
        if !edge_map.maps_into(|e| codomain.contains_edge(*e)) {
            return Err(MorphismError::EdgeCodomain);
        }

        let orientation: AHashSet<_> = domain.orientation().collect();
        if edge_map.domain() == orientation {
            for e in domain.orientation() {
                let image = codomain.bar(edge_map[&e]);
                edge_map.insert(domain.bar(e), image);
            }
        }

        let domain_edges: AHashSet<_> = domain.edges().collect();
        if edge_map.domain() != domain_edges {
            return Err(MorphismError::EdgeDomain);
        }

        for e in domain.edges() {
            if edge_map[&domain.bar(e)] != codomain.bar(edge_map[&e]) {
                return Err(MorphismError::Involution(e));
            }
        }

        for e in domain.edges() {
            let image = edge_map[&e];
            if vertex_map.get(&domain.initial(e)) != Some(&codomain.initial(image))
                || vertex_map.get(&domain.terminal(e)) != Some(&codomain.terminal(image))
            {
                return Err(MorphismError::Incidence(e));
            }
        }

        Ok(GraphMorphism {
            domain,
            codomain,
            vertex_map,
            edge_map,
        })
    }

    pub fn domain(&self) -> &Arc<Graph> {
        &self.domain
    }

    pub fn codomain(&self) -> &Arc<Graph> {
        &self.codomain
    }

    pub fn vertex_map(&self) -> &SetMap<Vertex, Vertex> {
        &self.vertex_map
    }

    pub fn edge_map(&self) -> &SetMap<Edge, Edge> {
        &self.edge_map
    }

    /// Image of a vertex.
    ///
    /// # Panics
    /// If `v` is not a vertex of the domain.
    pub fn vertex(&self, v: Vertex) -> Vertex {
        self.vertex_map[&v]
    }

    /// Image of an edge.
    ///
    /// # Panics
    /// If `e` is not an edge of the domain.
    pub fn edge(&self, e: Edge) -> Edge {
        self.edge_map[&e]
    }

    /// Two distinct edges leaving a common vertex with the same image, if any.
    pub fn admissible_pair(&self) -> Option<(Edge, Edge)> {
        for v in self.domain.vertices() {
            let mut seen = ahash::AHashMap::new();
            for e in self.domain.neighborhood(v) {
                if let Some(first) = seen.insert(self.edge(e), e) {
                    return Some((first, e));
                }
            }
        }
        None
    }

    /// Whether the morphism is locally injective at every vertex.
    pub fn is_immersion(&self) -> bool {
        self.admissible_pair().is_none()
    }

    /// The composite `f ∘ g`.
    pub fn compose(f: &GraphMorphism, g: &GraphMorphism) -> Result<GraphMorphism, MorphismError> {
        if !same_graph(&g.codomain, &f.domain) {
            return Err(MorphismError::NotComposable);
        }
        GraphMorphism::new(
            g.domain.clone(),
            f.codomain.clone(),
            SetMap::compose(&f.vertex_map, &g.vertex_map)?,
            SetMap::compose(&f.edge_map, &g.edge_map)?,
        )
    }

    pub fn identity(graph: &Arc<Graph>) -> GraphMorphism {
        GraphMorphism {
            domain: graph.clone(),
            codomain: graph.clone(),
            vertex_map: graph.vertices().map(|v| (v, v)).collect(),
            edge_map: graph.edges().map(|e| (e, e)).collect(),
        }
    }

    /// Given `f1 : G1 -> H` and `f2 : G2 -> H`, the induced morphism from the
    /// disjoint union of `G1` and `G2` to `H`.
    pub fn disjoint_union(
        f1: &GraphMorphism,
        f2: &GraphMorphism,
    ) -> Result<GraphMorphism, MorphismError> {
        if !same_graph(&f1.codomain, &f2.codomain) {
            return Err(MorphismError::CodomainMismatch);
        }
        let (g, incl1, incl2) = Graph::disjoint_union_inclusions(&f1.domain, &f2.domain)?;
        let vertex_map = f1
            .vertex_map
            .iter()
            .map(|(v, w)| (incl1.vertex(*v), *w))
            .chain(f2.vertex_map.iter().map(|(v, w)| (incl2.vertex(*v), *w)))
            .collect();
        let edge_map = f1
            .edge_map
            .iter()
            .map(|(e, d)| (incl1.edge(*e), *d))
            .chain(f2.edge_map.iter().map(|(e, d)| (incl2.edge(*e), *d)))
            .collect();
        GraphMorphism::new(g, f1.codomain.clone(), vertex_map, edge_map)
    }
}

impl PartialEq for GraphMorphism {
    fn eq(&self, other: &Self) -> bool {
        same_graph(&self.domain, &other.domain)
            && same_graph(&self.codomain, &other.codomain)
            && self.vertex_map == other.vertex_map
            && self.edge_map == other.edge_map
    }
}
