use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use anyhow::{Context, Result};

use super::snapshot::{
    ConceptSubgraph, GraphSnapshot, SnapshotEdge, SnapshotNode, SubgraphCenter, SubgraphLink,
    parse_snapshot,
};

/// The seam to the remote notes service. Implementations are called on
/// background threads; results are applied back on the UI thread.
pub trait GraphSource: Send + Sync {
    fn fetch_graph(&self) -> Result<GraphSnapshot>;
    fn fetch_concept_subgraph(&self, label: &str) -> Result<ConceptSubgraph>;
    fn describe(&self) -> String;
}

pub type FetchResult = Result<GraphSnapshot, String>;

/// Runs a fetch off the UI thread and hands the result back over a channel.
/// Errors are flattened to strings at the boundary; the caller only retains
/// or displays them.
pub fn spawn_fetch<F>(job: F) -> Receiver<FetchResult>
where
    F: FnOnce() -> Result<GraphSnapshot> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let _ = tx.send(job().map_err(|error| format!("{error:#}")));
    });

    rx
}

/// A graph snapshot stored as a JSON file. Focused sub-graphs are derived
/// from the snapshot itself (the depth-1 neighborhood of the label).
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl GraphSource for SnapshotFile {
    fn fetch_graph(&self) -> Result<GraphSnapshot> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        parse_snapshot(&raw)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    fn fetch_concept_subgraph(&self, label: &str) -> Result<ConceptSubgraph> {
        neighborhood(&self.fetch_graph()?, label)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Built-in deterministic sample graph for running without a snapshot file.
pub struct DemoGraph;

impl DemoGraph {
    fn snapshot() -> GraphSnapshot {
        const CONCEPTS: [&str; 8] = [
            "Calculus",
            "Limits",
            "Derivatives",
            "Integrals",
            "Linear Algebra",
            "Matrices",
            "Vectors",
            "Differential Equations",
        ];
        const NOTES: [(&str, &str); 5] = [
            ("Lecture 1: limits intro", "Limits"),
            ("Lecture 4: chain rule", "Derivatives"),
            ("Problem set 2", "Integrals"),
            ("Matrix inversion cheatsheet", "Matrices"),
            ("ODE worked examples", "Differential Equations"),
        ];
        const RELATIONS: [(&str, &str, &str); 8] = [
            ("Calculus", "Limits", "contains"),
            ("Calculus", "Derivatives", "contains"),
            ("Calculus", "Integrals", "contains"),
            ("Derivatives", "Limits", "requires"),
            ("Integrals", "Derivatives", "requires"),
            ("Differential Equations", "Integrals", "requires"),
            ("Linear Algebra", "Matrices", "contains"),
            ("Matrices", "Vectors", "related"),
        ];

        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        for label in CONCEPTS {
            nodes.push(SnapshotNode {
                id: format!("concept:{}", label.to_lowercase()),
                label: label.to_owned(),
                kind: "concept".to_owned(),
            });
        }

        for (index, (label, concept)) in NOTES.iter().enumerate() {
            let id = format!("note:{index}");
            nodes.push(SnapshotNode {
                id: id.clone(),
                label: (*label).to_owned(),
                kind: "note".to_owned(),
            });
            edges.push(SnapshotEdge {
                source: format!("concept:{}", concept.to_lowercase()),
                target: id,
                relation: "contains".to_owned(),
                weight: None,
            });
        }

        for (source, target, relation) in RELATIONS {
            edges.push(SnapshotEdge {
                source: format!("concept:{}", source.to_lowercase()),
                target: format!("concept:{}", target.to_lowercase()),
                relation: relation.to_owned(),
                weight: None,
            });
        }

        GraphSnapshot { nodes, edges }
    }
}

impl GraphSource for DemoGraph {
    fn fetch_graph(&self) -> Result<GraphSnapshot> {
        Ok(Self::snapshot())
    }

    fn fetch_concept_subgraph(&self, label: &str) -> Result<ConceptSubgraph> {
        neighborhood(&Self::snapshot(), label)
    }

    fn describe(&self) -> String {
        "built-in demo graph".to_owned()
    }
}

/// Depth-1 neighborhood of a labelled node, in the shape the focused
/// endpoint of the real service returns.
fn neighborhood(snapshot: &GraphSnapshot, label: &str) -> Result<ConceptSubgraph> {
    let center = snapshot
        .nodes
        .iter()
        .find(|node| node.label.eq_ignore_ascii_case(label))
        .with_context(|| format!("no node labelled {label:?} in the snapshot"))?;

    let label_by_id = snapshot
        .nodes
        .iter()
        .map(|node| (node.id.as_str(), node.label.as_str()))
        .collect::<HashMap<_, _>>();

    let mut connected = Vec::new();
    for edge in &snapshot.edges {
        let other = if edge.source == center.id {
            &edge.target
        } else if edge.target == center.id {
            &edge.source
        } else {
            continue;
        };

        if let Some(other_label) = label_by_id.get(other.as_str()) {
            connected.push(SubgraphLink {
                concept: (*other_label).to_owned(),
                relation: edge.relation.clone(),
                depth: 1,
            });
        }
    }

    Ok(ConceptSubgraph {
        center: SubgraphCenter {
            label: center.label.clone(),
        },
        connected,
    })
}
