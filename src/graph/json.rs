use std::collections::BTreeMap;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use super::{Edge, EdgeData, Graph, GraphError, Vertex, VertexData};

/// Structural json form of a [`Graph`], keyed by handle ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphJson {
    pub vertices: BTreeMap<usize, String>,
    /// `{id: [initial, terminal]}` for every directed edge.
    pub edges: BTreeMap<usize, [usize; 2]>,
    pub edge_labels: BTreeMap<usize, String>,
    pub bar: BTreeMap<usize, usize>,
    pub orientation: Vec<usize>,
    /// Arena sizes, so that trailing tombstones survive a round trip.
    #[serde(default)]
    pub slots: [usize; 2],
}

impl Graph {
    pub fn json_data(&self) -> GraphJson {
        GraphJson {
            vertices: self
                .vertices()
                .map(|v| (v.0, self[v].label.clone()))
                .collect(),
            edges: self
                .edges()
                .map(|e| (e.0, [self.initial(e).0, self.terminal(e).0]))
                .collect(),
            edge_labels: self
                .edges()
                .map(|e| (e.0, self[e].label.clone()))
                .collect(),
            bar: self.edges().map(|e| (e.0, self.bar(e).0)).collect(),
            orientation: self.orientation().map(|e| e.0).collect(),
            slots: [self.vertices.len(), self.edges.len()],
        }
    }

    pub fn json(&self) -> Result<String, GraphError> {
        serde_json::to_string(&self.json_data()).map_err(|e| GraphError::Json(e.to_string()))
    }

    /// Rebuilds a graph with exactly the handles recorded in `data`,
    /// validating the involution and incidence invariants.
    pub fn from_json_data(data: &GraphJson) -> Result<Graph, GraphError> {
        let mut graph = Graph::empty();
        let [vertex_slots, edge_slots] = data.slots;
        let vertex_slots = arena_len("vertex", vertex_slots, data.vertices.keys())?;
        let edge_slots = arena_len("edge", edge_slots, data.edges.keys())?;
        if vertex_slots > 0 {
            graph.vertices.ensure(Vertex(vertex_slots - 1), None);
        }
        if edge_slots > 0 {
            graph.edges.ensure(Edge(edge_slots - 1), None);
        }
        for (id, label) in &data.vertices {
            graph.vertices[Vertex(*id)] = Some(VertexData {
                label: label.clone(),
            });
        }

        let oriented: AHashSet<usize> = data.orientation.iter().copied().collect();
        for (id, [initial, terminal]) in &data.edges {
            let e = Edge(*id);
            let (initial, terminal) = (Vertex(*initial), Vertex(*terminal));
            if !graph.contains_vertex(initial) || !graph.contains_vertex(terminal) {
                return Err(GraphError::Json(format!("edge {id} has a missing endpoint")));
            }
            let bar = *data
                .bar
                .get(id)
                .ok_or_else(|| GraphError::Json(format!("edge {id} has no bar")))?;
            graph.edges[e] = Some(EdgeData {
                label: data.edge_labels.get(id).cloned().unwrap_or_default(),
                initial,
                terminal,
                bar: Edge(bar),
                oriented: oriented.contains(id),
            });
        }

        for e in graph.edges().collect::<Vec<_>>() {
            let data = &graph[e];
            let bar = data.bar;
            if bar == e || !graph.contains_edge(bar) || graph[bar].bar != e {
                return Err(GraphError::Json(format!("bar of edge {e} is not an involution")));
            }
            if graph[bar].initial != data.terminal || graph[bar].terminal != data.initial {
                return Err(GraphError::Json(format!("bar of edge {e} is not its reverse")));
            }
            if graph[bar].oriented == data.oriented {
                return Err(GraphError::Json(format!(
                    "exactly one of edge {e} and its bar must be oriented"
                )));
            }
        }
        if oriented.iter().any(|id| !graph.contains_edge(Edge(*id))) {
            return Err(GraphError::Json("orientation lists an unknown edge".into()));
        }

        Ok(graph)
    }

    /// The exact inverse of [`Graph::json`].
    pub fn load_json(json: &str) -> Result<Graph, GraphError> {
        let data: GraphJson =
            serde_json::from_str(json).map_err(|e| GraphError::Json(e.to_string()))?;
        Graph::from_json_data(&data)
    }
}

/// The arena length for the recorded `ids`. Every id must lie below the
/// declared `slots` (or, when none are declared, below the largest id plus
/// one), and the arena may hold at most as many tombstones as live entries
/// plus one bar pair.
fn arena_len<'a>(
    kind: &str,
    slots: usize,
    ids: impl ExactSizeIterator<Item = &'a usize>,
) -> Result<usize, GraphError> {
    let recorded = ids.len();
    let mut required = 0;
    for id in ids {
        let end = id
            .checked_add(1)
            .ok_or_else(|| GraphError::Json(format!("{kind} id {id} is out of range")))?;
        required = required.max(end);
    }
    let len = if slots == 0 { required } else { slots };
    if required > len {
        return Err(GraphError::Json(format!(
            "{kind} ids reach {required} but only {len} slots are declared"
        )));
    }
    let limit = recorded.saturating_add(1).saturating_mul(2);
    if len > limit {
        return Err(GraphError::Json(format!(
            "{len} {kind} slots for {recorded} recorded entries"
        )));
    }
    Ok(len)
}
