use anyhow::{Context, Result};
use serde::Deserialize;

/// Full-graph fetch result, as delivered by the notes service.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<SnapshotNode>,
    #[serde(default)]
    pub edges: Vec<SnapshotEdge>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SnapshotNode {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub kind: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SnapshotEdge {
    pub source: String,
    pub target: String,
    #[serde(default, rename = "type")]
    pub relation: String,
    #[serde(default)]
    pub weight: Option<f32>,
}

/// Focused fetch result: a center concept plus its connected entries.
#[derive(Clone, Debug, Deserialize)]
pub struct ConceptSubgraph {
    pub center: SubgraphCenter,
    #[serde(default)]
    pub connected: Vec<SubgraphLink>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SubgraphCenter {
    pub label: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SubgraphLink {
    pub concept: String,
    #[serde(default)]
    pub relation: String,
    #[serde(default)]
    pub depth: u32,
}

impl ConceptSubgraph {
    /// Translates the subgraph into a regular snapshot: one synthesized
    /// center node plus a node and an edge per connected entry. Duplicate
    /// connected concepts collapse onto a single node.
    pub fn into_snapshot(self) -> GraphSnapshot {
        let center_id = concept_id(&self.center.label);
        let mut connected = self.connected;
        // Nearer entries first, so a duplicate concept keeps its closest label.
        connected.sort_by_key(|link| link.depth);
        let mut nodes = vec![SnapshotNode {
            id: center_id.clone(),
            label: self.center.label,
            kind: "concept".to_owned(),
        }];
        let mut edges = Vec::with_capacity(connected.len());

        for link in connected {
            if link.concept.is_empty() {
                continue;
            }

            let id = concept_id(&link.concept);
            if id != center_id && !nodes.iter().any(|node| node.id == id) {
                nodes.push(SnapshotNode {
                    id: id.clone(),
                    label: link.concept,
                    kind: "concept".to_owned(),
                });
            }

            edges.push(SnapshotEdge {
                source: center_id.clone(),
                target: id,
                relation: link.relation,
                weight: None,
            });
        }

        GraphSnapshot { nodes, edges }
    }
}

fn concept_id(label: &str) -> String {
    format!("concept:{}", label.trim().to_lowercase())
}

pub fn parse_snapshot(raw: &str) -> Result<GraphSnapshot> {
    serde_json::from_str(raw).context("invalid graph snapshot JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_snapshot_with_optional_fields() {
        let snapshot = parse_snapshot(
            r#"{
                "nodes": [
                    {"id": "c1", "label": "Calculus", "kind": "concept"},
                    {"id": "n1", "label": "Lecture 3"}
                ],
                "edges": [
                    {"source": "c1", "target": "n1", "type": "contains", "weight": 2.5},
                    {"source": "n1", "target": "c1"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.nodes[1].kind, "");
        assert_eq!(snapshot.edges[0].weight, Some(2.5));
        assert_eq!(snapshot.edges[1].relation, "");
        assert_eq!(snapshot.edges[1].weight, None);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(parse_snapshot("{nodes: oops").is_err());
    }

    #[test]
    fn subgraph_translates_to_center_plus_links() {
        let subgraph = ConceptSubgraph {
            center: SubgraphCenter {
                label: "Linear Algebra".to_owned(),
            },
            connected: vec![
                SubgraphLink {
                    concept: "Matrices".to_owned(),
                    relation: "contains".to_owned(),
                    depth: 1,
                },
                SubgraphLink {
                    concept: "Matrices".to_owned(),
                    relation: "related".to_owned(),
                    depth: 2,
                },
                SubgraphLink {
                    concept: "Calculus".to_owned(),
                    relation: "requires".to_owned(),
                    depth: 1,
                },
            ],
        };

        let snapshot = subgraph.into_snapshot();
        // Center + two distinct concepts; the duplicate collapses.
        assert_eq!(snapshot.nodes.len(), 3);
        assert_eq!(snapshot.edges.len(), 3);
        assert!(snapshot.nodes.iter().all(|node| node.kind == "concept"));
        assert_eq!(snapshot.edges[0].source, "concept:linear algebra");
        assert_eq!(snapshot.edges[0].relation, "contains");
    }
}
