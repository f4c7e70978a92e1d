use crate::set_map::SetMap;

use super::{Edge, Graph, Relabeling, Vertex};

/// Incrementally allocates vertices and bar pairs of edges.
#[derive(Clone, Debug, Default)]
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    pub fn new() -> Self {
        GraphBuilder {
            graph: Graph::empty(),
        }
    }

    pub fn build(self) -> Graph {
        self.graph
    }

    pub fn add_vertex(&mut self, label: impl Into<String>) -> Vertex {
        self.graph.push_vertex(label.into())
    }

    /// Adds an oriented edge and its bar, returning the oriented one.
    /// The bar of an edge labelled `a` is labelled `a⁻¹`.
    pub fn add_edge(&mut self, initial: Vertex, terminal: Vertex, label: impl Into<String>) -> Edge {
        let label = label.into();
        let bar_label = if label.is_empty() {
            String::new()
        } else {
            format!("{label}⁻¹")
        };
        self.graph.push_edge_pair(initial, terminal, label, bar_label)
    }

    pub fn add_edge_labelled(
        &mut self,
        initial: Vertex,
        terminal: Vertex,
        label: impl Into<String>,
        bar_label: impl Into<String>,
    ) -> Edge {
        self.graph
            .push_edge_pair(initial, terminal, label.into(), bar_label.into())
    }

    /// Copies every live vertex and edge of `other` into this builder.
    ///
    /// Vertices listed in `identify` are not copied but sent to the given
    /// vertex of the builder instead. Orientation and labels are preserved.
    pub fn append(&mut self, other: &Graph, identify: &SetMap<Vertex, Vertex>) -> Relabeling {
        let mut relabeling = Relabeling::default();
        for v in other.vertices() {
            let new_v = match identify.get(&v) {
                Some(w) => *w,
                None => self.add_vertex(other[v].label.clone()),
            };
            relabeling.vertices.insert(v, new_v);
        }

        for e in other.orientation() {
            let data = &other[e];
            let e_bar = data.bar;
            let new_e = self.add_edge_labelled(
                relabeling.vertices[&data.initial],
                relabeling.vertices[&data.terminal],
                data.label.clone(),
                other[e_bar].label.clone(),
            );
            relabeling.edges.insert(e, new_e);
            relabeling.edges.insert(e_bar, self.graph.bar(new_e));
        }
        relabeling
    }
}
