use std::collections::VecDeque;
use std::fmt::Display;
use std::hash::Hash;
use std::ops::Index;
use std::sync::Arc;

use ahash::AHashSet;
use bitvec::vec::BitVec;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::define_indexed_vec;
use crate::set_map::SetMap;

pub mod builder;
pub mod json;
pub mod morphism;

use builder::GraphBuilder;
pub use morphism::{GraphMorphism, MorphismError};

define_indexed_vec!(
    /// Handle of a 0-cell. Handles are only meaningful relative to the graph
    /// that allocated them.
    pub struct Vertex;

    pub struct VertexVec;
);

define_indexed_vec!(
    /// Handle of a directed 1-cell. Every edge has a distinct reverse, its bar.
    pub struct Edge;

    pub struct EdgeVec;
);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexData {
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeData {
    pub label: String,
    pub initial: Vertex,
    pub terminal: Vertex,
    /// The reverse edge. `bar(bar(e)) == e` and `bar(e) != e`.
    pub bar: Edge,
    /// Whether this edge is the chosen representative of its bar pair.
    pub oriented: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("Vertex {0} does not belong to the graph")]
    NoVertex(Vertex),
    #[error("Edge {0} does not belong to the graph")]
    NoEdge(Edge),
    #[error("Edge endpoint {0} is not among the listed vertices")]
    UnknownEndpoint(String),
    #[error("Subgraph with {vertices} vertices and {oriented_edges} edges is not a tree")]
    NotATree {
        vertices: usize,
        oriented_edges: usize,
    },
    #[error("Malformed graph json: {0}")]
    Json(String),
}

/// The induced renaming of vertices and edges produced when a graph is copied
/// into a new arena. Edge renamings cover both members of every bar pair.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Relabeling {
    pub vertices: SetMap<Vertex, Vertex>,
    pub edges: SetMap<Edge, Edge>,
}

impl Relabeling {
    /// The composite renaming `outer ∘ self`, defined where both are.
    pub fn then(&self, outer: &Relabeling) -> Relabeling {
        Relabeling {
            vertices: self
                .vertices
                .iter()
                .filter_map(|(k, v)| outer.vertices.get(v).map(|w| (*k, *w)))
                .collect(),
            edges: self
                .edges
                .iter()
                .filter_map(|(k, v)| outer.edges.get(v).map(|w| (*k, *w)))
                .collect(),
        }
    }
}

/// A 1-dimensional cell complex with directed edges closed under the bar
/// involution.
///
/// Vertices and edges live in arenas indexed by [`Vertex`] and [`Edge`].
/// Removed elements leave tombstones so that the surviving handles stay valid;
/// [`Graph::copy`] produces a compacted arena.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    vertices: VertexVec<Option<VertexData>>,
    edges: EdgeVec<Option<EdgeData>>,
}

impl Graph {
    pub fn empty() -> Self {
        Graph::default()
    }

    /// The cycle on `n` vertices `0 -> 1 -> ... -> n-1 -> 0`, each edge oriented forwards.
    pub fn cycle(n: usize) -> Self {
        let mut builder = GraphBuilder::new();
        let vertices: Vec<_> = (0..n).map(|i| builder.add_vertex(i.to_string())).collect();
        for i in 0..n {
            builder.add_edge(vertices[i], vertices[(i + 1) % n], "");
        }
        builder.build()
    }

    /// Builds a graph from labelled vertices and `(initial, terminal, label)`
    /// triples, one per bar pair.
    ///
    /// With `infer_vertices` endpoints missing from `vertices` are added,
    /// otherwise they are an error. Returns the handle of every vertex label.
    pub fn from_edge_list<L: Hash + Eq + Clone + Display>(
        vertices: impl IntoIterator<Item = L>,
        edges: impl IntoIterator<Item = (L, L, String)>,
        infer_vertices: bool,
    ) -> Result<(Self, IndexMap<L, Vertex>), GraphError> {
        let mut builder = GraphBuilder::new();
        let mut handles = IndexMap::new();
        for l in vertices {
            if !handles.contains_key(&l) {
                let v = builder.add_vertex(l.to_string());
                handles.insert(l, v);
            }
        }

        for (i, t, label) in edges {
            let mut endpoint = |l: L| -> Result<Vertex, GraphError> {
                if let Some(v) = handles.get(&l) {
                    Ok(*v)
                } else if infer_vertices {
                    let v = builder.add_vertex(l.to_string());
                    handles.insert(l, v);
                    Ok(v)
                } else {
                    Err(GraphError::UnknownEndpoint(l.to_string()))
                }
            };
            let i = endpoint(i)?;
            let t = endpoint(t)?;
            builder.add_edge(i, t, label);
        }

        Ok((builder.build(), handles))
    }

    pub(crate) fn push_vertex(&mut self, label: String) -> Vertex {
        self.vertices.push(Some(VertexData { label }))
    }

    pub(crate) fn push_edge_pair(
        &mut self,
        initial: Vertex,
        terminal: Vertex,
        label: String,
        bar_label: String,
    ) -> Edge {
        let e = Edge(self.edges.len());
        let e_bar = Edge(e.0 + 1);
        self.edges.push(Some(EdgeData {
            label,
            initial,
            terminal,
            bar: e_bar,
            oriented: true,
        }));
        self.edges.push(Some(EdgeData {
            label: bar_label,
            initial: terminal,
            terminal: initial,
            bar: e,
            oriented: false,
        }));
        e
    }

    /// Live vertices in handle order.
    pub fn vertices(&self) -> impl Iterator<Item = Vertex> + '_ {
        self.vertices
            .iter()
            .filter_map(|(v, d)| d.as_ref().map(|_| v))
    }

    /// Live edges (both members of every bar pair) in handle order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges.iter().filter_map(|(e, d)| d.as_ref().map(|_| e))
    }

    /// The chosen representative of every bar pair.
    pub fn orientation(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges
            .iter()
            .filter_map(|(e, d)| d.as_ref().filter(|d| d.oriented).map(|_| e))
    }

    pub fn n_vertices(&self) -> usize {
        self.vertices().count()
    }

    /// Number of directed edges, twice the number of geometric edges.
    pub fn n_edges(&self) -> usize {
        self.edges().count()
    }

    pub fn n_oriented(&self) -> usize {
        self.orientation().count()
    }

    pub fn contains_vertex(&self, v: Vertex) -> bool {
        matches!(self.vertices.get(v), Some(Some(_)))
    }

    pub fn contains_edge(&self, e: Edge) -> bool {
        matches!(self.edges.get(e), Some(Some(_)))
    }

    pub fn vertex(&self, v: Vertex) -> Result<&VertexData, GraphError> {
        self.vertices
            .get(v)
            .and_then(Option::as_ref)
            .ok_or(GraphError::NoVertex(v))
    }

    pub fn edge(&self, e: Edge) -> Result<&EdgeData, GraphError> {
        self.edges
            .get(e)
            .and_then(Option::as_ref)
            .ok_or(GraphError::NoEdge(e))
    }

    /// Euler characteristic `|V| - |E|/2`.
    pub fn chi(&self) -> i64 {
        self.n_vertices() as i64 - self.n_oriented() as i64
    }

    /// Gives the reverse of an edge.
    ///
    /// # Panics
    /// If `e` is not an edge of the graph.
    pub fn bar(&self, e: Edge) -> Edge {
        self[e].bar
    }

    pub fn initial(&self, e: Edge) -> Vertex {
        self[e].initial
    }

    pub fn terminal(&self, e: Edge) -> Vertex {
        self[e].terminal
    }

    pub fn is_oriented(&self, e: Edge) -> bool {
        self[e].oriented
    }

    /// The representative of the bar pair of `e` lying in the orientation.
    pub fn oriented(&self, e: Edge) -> Edge {
        if self.is_oriented(e) {
            e
        } else {
            self.bar(e)
        }
    }

    /// Removes a vertex with every edge incident to it. Does nothing if the
    /// vertex is absent.
    pub fn remove_vertex(&mut self, v: Vertex) {
        if !self.contains_vertex(v) {
            return;
        }
        let incident: Vec<_> = self
            .edges()
            .filter(|e| self[*e].initial == v || self[*e].terminal == v)
            .collect();
        for e in incident {
            self.remove_edge(e);
        }
        self.vertices[v] = None;
    }

    /// Removes a vertex but leaves its incident edges dangling until they are
    /// redirected.
    pub(crate) fn detach_vertex(&mut self, v: Vertex) {
        if self.contains_vertex(v) {
            self.vertices[v] = None;
        }
    }

    /// Removes an edge together with its bar. Does nothing if the edge is absent.
    pub fn remove_edge(&mut self, e: Edge) {
        if !self.contains_edge(e) {
            return;
        }
        let e_bar = self.bar(e);
        self.edges[e] = None;
        self.edges[e_bar] = None;
    }

    /// Moves every edge endpoint at `from` onto `to`.
    pub(crate) fn redirect(&mut self, from: Vertex, to: Vertex) {
        for (_, data) in self.edges.iter_mut() {
            if let Some(data) = data {
                if data.initial == from {
                    data.initial = to;
                }
                if data.terminal == from {
                    data.terminal = to;
                }
            }
        }
    }

    /// The edges with initial vertex `v`, in both orientations.
    pub fn neighborhood(&self, v: Vertex) -> Vec<Edge> {
        self.edges().filter(|e| self[*e].initial == v).collect()
    }

    /// Edges leaving `v` with respect to the orientation.
    pub fn out_edges(&self, v: Vertex) -> Vec<Edge> {
        self.edges()
            .filter(|e| self[*e].initial == v && self[*e].oriented)
            .collect()
    }

    /// Edges entering `v` with respect to the orientation, given as the bars
    /// starting at `v`.
    pub fn in_edges(&self, v: Vertex) -> Vec<Edge> {
        self.edges()
            .filter(|e| self[*e].initial == v && !self[*e].oriented)
            .collect()
    }

    /// Whether the graph is a disjoint union of cycles.
    pub fn is_open_linear(&self) -> bool {
        self.vertices().all(|v| self.neighborhood(v).len() == 2)
    }

    pub fn copy(&self) -> Graph {
        self.copy_with_maps().0
    }

    /// Copies into a fresh compacted arena and returns the renaming of every
    /// live vertex and edge.
    pub fn copy_with_maps(&self) -> (Graph, Relabeling) {
        let mut builder = GraphBuilder::new();
        let relabeling = builder.append(self, &SetMap::new());
        (builder.build(), relabeling)
    }

    /// Glues `g1` and `g2` along `v1 ∈ g1` and `v2 ∈ g2`.
    pub fn wedge(
        g1: &Graph,
        v1: Vertex,
        g2: &Graph,
        v2: Vertex,
    ) -> Result<(Graph, Relabeling, Relabeling), GraphError> {
        let base = g1.vertex(v1)?.label.clone();
        g2.vertex(v2)?;

        let mut builder = GraphBuilder::new();
        let w = builder.add_vertex(base);
        let r1 = builder.append(g1, &[(v1, w)].into_iter().collect());
        let r2 = builder.append(g2, &[(v2, w)].into_iter().collect());
        Ok((builder.build(), r1, r2))
    }

    /// [`Graph::wedge`] returning the two inclusion morphisms.
    pub fn wedge_inclusions(
        g1: &Arc<Graph>,
        v1: Vertex,
        g2: &Arc<Graph>,
        v2: Vertex,
    ) -> Result<(Arc<Graph>, GraphMorphism, GraphMorphism), MorphismError> {
        let (g, r1, r2) = Graph::wedge(g1, v1, g2, v2)?;
        let g = Arc::new(g);
        let incl1 = GraphMorphism::new(g1.clone(), g.clone(), r1.vertices, r1.edges)?;
        let incl2 = GraphMorphism::new(g2.clone(), g.clone(), r2.vertices, r2.edges)?;
        Ok((g, incl1, incl2))
    }

    pub fn disjoint_union(g1: &Graph, g2: &Graph) -> (Graph, Relabeling, Relabeling) {
        let mut builder = GraphBuilder::new();
        let r1 = builder.append(g1, &SetMap::new());
        let r2 = builder.append(g2, &SetMap::new());
        (builder.build(), r1, r2)
    }

    /// [`Graph::disjoint_union`] returning the two inclusion morphisms.
    pub fn disjoint_union_inclusions(
        g1: &Arc<Graph>,
        g2: &Arc<Graph>,
    ) -> Result<(Arc<Graph>, GraphMorphism, GraphMorphism), MorphismError> {
        let (g, r1, r2) = Graph::disjoint_union(g1, g2);
        let g = Arc::new(g);
        let incl1 = GraphMorphism::new(g1.clone(), g.clone(), r1.vertices, r1.edges)?;
        let incl2 = GraphMorphism::new(g2.clone(), g.clone(), r2.vertices, r2.edges)?;
        Ok((g, incl1, incl2))
    }

    /// Breadth-first spanning tree grown from `root`.
    ///
    /// The result is a subgraph sharing this graph's handles: all vertices are
    /// kept, edges not in the tree are removed. Fails when the subgraph is not
    /// a tree, i.e. when the graph is disconnected.
    pub fn spanning_tree(&self, root: Vertex) -> Result<Graph, GraphError> {
        self.vertex(root)?;
        let mut seen: BitVec = BitVec::repeat(false, self.vertices.len());
        let mut tree_edges = AHashSet::new();
        let mut queue = VecDeque::from([root]);
        seen.set(root.0, true);

        while let Some(v) = queue.pop_front() {
            for e in self.neighborhood(v) {
                let w = self.terminal(e);
                if !seen[w.0] {
                    seen.set(w.0, true);
                    tree_edges.insert(self.oriented(e));
                    queue.push_back(w);
                }
            }
        }

        let mut tree = self.clone();
        for e in self.orientation() {
            if !tree_edges.contains(&e) {
                tree.remove_edge(e);
            }
        }

        let (vertices, oriented_edges) = (tree.n_vertices(), tree.n_oriented());
        if vertices as i64 - oriented_edges as i64 != 1 {
            return Err(GraphError::NotATree {
                vertices,
                oriented_edges,
            });
        }
        Ok(tree)
    }

    /// Graphviz rendering of the oriented edges.
    pub fn dot(&self) -> String {
        self.dot_with(|v| self[v].label.clone(), |e| self[e].label.clone())
    }

    pub fn dot_with(
        &self,
        vertex_label: impl Fn(Vertex) -> String,
        edge_label: impl Fn(Edge) -> String,
    ) -> String {
        let mut out = String::from("digraph {\n");
        for v in self.vertices() {
            out.push_str(&format!("  {} [label=\"{}\"];\n", v, vertex_label(v)));
        }
        for e in self.orientation() {
            out.push_str(&format!(
                "  {} -> {} [label=\"{}\"];\n",
                self.initial(e),
                self.terminal(e),
                edge_label(e)
            ));
        }
        out.push('}');
        out
    }
}

impl Index<Vertex> for Graph {
    type Output = VertexData;
    fn index(&self, index: Vertex) -> &Self::Output {
        match self.vertices.get(index) {
            Some(Some(d)) => d,
            _ => panic!("vertex {index} is not in the graph"),
        }
    }
}

impl Index<Edge> for Graph {
    type Output = EdgeData;
    fn index(&self, index: Edge) -> &Self::Output {
        match self.edges.get(index) {
            Some(Some(d)) => d,
            _ => panic!("edge {index} is not in the graph"),
        }
    }
}

impl Display for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Vertices: [{}]",
            self.vertices().map(|v| &self[v].label).join(", ")
        )?;
        write!(
            f,
            "Orientation: [{}]",
            self.orientation()
                .map(|e| format!(
                    "{}({} -> {})",
                    self[e].label,
                    self[self.initial(e)].label,
                    self[self.terminal(e)].label
                ))
                .join(", ")
        )
    }
}
