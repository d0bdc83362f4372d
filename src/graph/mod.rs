mod model;
mod snapshot;
mod source;

pub use model::{ConceptGraph, GraphEdge, GraphNode, NodeKind, RelationKind};
pub use snapshot::{ConceptSubgraph, GraphSnapshot};
pub use source::{DemoGraph, FetchResult, GraphSource, SnapshotFile, spawn_fetch};
