use std::collections::HashMap;

use eframe::egui::Vec2;
use log::debug;

use super::snapshot::GraphSnapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Concept,
    Note,
}

impl NodeKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "concept" => Self::Concept,
            _ => Self::Note,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Concept => "concept",
            Self::Note => "note",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationKind {
    Requires,
    Contains,
    LeadsTo,
    Related,
}

impl RelationKind {
    /// Unknown relation strings fall back to the undirected default.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "requires" => Self::Requires,
            "contains" => Self::Contains,
            "leads-to" | "leads_to" => Self::LeadsTo,
            _ => Self::Related,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Requires => "requires",
            Self::Contains => "contains",
            Self::LeadsTo => "leads-to",
            Self::Related => "related",
        }
    }

    pub fn is_directed(self) -> bool {
        !matches!(self, Self::Related)
    }
}

#[derive(Clone, Debug)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub position: Vec2,
    pub velocity: Vec2,
}

/// Edge endpoints are indices into the node vector, resolved at load time.
#[derive(Clone, Copy, Debug)]
pub struct GraphEdge {
    pub source: usize,
    pub target: usize,
    pub relation: RelationKind,
    pub weight: f32,
}

/// The live node/edge collection. Replaced wholesale on every refresh; only
/// the layout controller mutates it between replacements.
#[derive(Default)]
pub struct ConceptGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    index_by_id: HashMap<String, usize>,
}

impl ConceptGraph {
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        let mut nodes = Vec::with_capacity(snapshot.nodes.len());
        let mut index_by_id = HashMap::with_capacity(snapshot.nodes.len());

        let mut dropped_nodes = 0usize;
        for raw in snapshot.nodes {
            if raw.id.is_empty() || index_by_id.contains_key(&raw.id) {
                dropped_nodes += 1;
                continue;
            }

            index_by_id.insert(raw.id.clone(), nodes.len());
            nodes.push(GraphNode {
                label: if raw.label.is_empty() {
                    raw.id.clone()
                } else {
                    raw.label
                },
                id: raw.id,
                kind: NodeKind::parse(&raw.kind),
                position: Vec2::ZERO,
                velocity: Vec2::ZERO,
            });
        }

        // Edges to ids outside the delivered node set are expected (servers
        // may cut the graph at a depth/limit) and dropped without error.
        let mut dropped_edges = 0usize;
        let mut edges = Vec::with_capacity(snapshot.edges.len());
        for raw in snapshot.edges {
            let (Some(&source), Some(&target)) =
                (index_by_id.get(&raw.source), index_by_id.get(&raw.target))
            else {
                dropped_edges += 1;
                continue;
            };
            if source == target {
                dropped_edges += 1;
                continue;
            }

            edges.push(GraphEdge {
                source,
                target,
                relation: RelationKind::parse(&raw.relation),
                weight: raw.weight.filter(|weight| *weight > 0.0).unwrap_or(1.0),
            });
        }

        if dropped_nodes > 0 || dropped_edges > 0 {
            debug!(
                "snapshot load dropped {dropped_nodes} duplicate/empty nodes and {dropped_edges} dangling edges"
            );
        }

        Self {
            nodes,
            edges,
            index_by_id,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = (usize, RelationKind)> + '_ {
        self.edges.iter().filter_map(move |edge| {
            if edge.source == index {
                Some((edge.target, edge.relation))
            } else if edge.target == index {
                Some((edge.source, edge.relation))
            } else {
                None
            }
        })
    }

    /// Split borrow for the simulation tick: positions/velocities are the
    /// only node fields it writes, edges stay read-only.
    pub(crate) fn parts_mut(&mut self) -> (&mut [GraphNode], &[GraphEdge]) {
        (&mut self.nodes, &self.edges)
    }
}
