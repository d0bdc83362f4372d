use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};

use log::{debug, warn};

use crate::graph::{
    ConceptGraph, FetchResult, GraphEdge, GraphNode, GraphSnapshot, GraphSource, NodeKind,
    spawn_fetch,
};

use super::simulation::{SimState, Simulation};
use super::view::ViewTransform;

/// Zoom level a focus animation settles at.
pub const FOCUS_SCALE: f32 = 1.5;

/// Owns the live graph, the simulation driver, the view transform, and the
/// selection. All mutation happens here, on the UI thread; background
/// fetches only hand completed snapshots back through `poll_fetches`.
pub struct LayoutController {
    source: Arc<dyn GraphSource>,
    graph: ConceptGraph,
    simulation: Simulation,
    view: ViewTransform,
    selected: Option<String>,
    fetch_error: Option<String>,
    pending_fetches: Vec<Receiver<FetchResult>>,
}

impl LayoutController {
    pub fn new(source: Arc<dyn GraphSource>) -> Self {
        Self {
            source,
            graph: ConceptGraph::default(),
            simulation: Simulation::default(),
            view: ViewTransform::default(),
            selected: None,
            fetch_error: None,
            pending_fetches: Vec::new(),
        }
    }

    /// Replaces the graph wholesale and re-seeds positions. Does not start
    /// the simulation; the caller decides. Selection survives when the
    /// selected id is still present.
    pub fn load(&mut self, snapshot: GraphSnapshot) {
        self.graph = ConceptGraph::from_snapshot(snapshot);
        if let Some(selected) = &self.selected
            && self.graph.index_of(selected).is_none()
        {
            self.selected = None;
        }

        let (nodes, _) = self.graph.parts_mut();
        self.simulation.seed_positions(nodes);
        self.fetch_error = None;

        debug!(
            "loaded graph: {} nodes, {} edges",
            self.graph.node_count(),
            self.graph.edge_count()
        );
    }

    /// Toggle semantics: selecting the already-selected node clears the
    /// selection. Unknown ids are ignored.
    pub fn select(&mut self, id: Option<&str>) {
        match id {
            None => self.selected = None,
            Some(id) if self.selected.as_deref() == Some(id) => self.selected = None,
            Some(id) => {
                if self.graph.index_of(id).is_some() {
                    self.selected = Some(id.to_owned());
                }
            }
        }
    }

    /// Selects the node and animates the view onto its current position
    /// immediately; whether the secondary fetch succeeds later does not move
    /// the camera again. Concepts additionally refresh the graph with their
    /// centered sub-graph.
    pub fn focus(&mut self, id: &str) {
        let Some(node) = self.graph.node(id) else {
            warn!("focus requested for unknown node {id:?}");
            return;
        };

        self.selected = Some(id.to_owned());
        self.view
            .animate_to(FOCUS_SCALE, -node.position * FOCUS_SCALE);

        if node.kind == NodeKind::Concept {
            let source = Arc::clone(&self.source);
            let label = node.label.clone();
            self.pending_fetches.push(spawn_fetch(move || {
                source
                    .fetch_concept_subgraph(&label)
                    .map(|subgraph| subgraph.into_snapshot())
            }));
        }
    }

    /// Clears selection, resets the view, and re-fetches the full graph.
    pub fn reset(&mut self) {
        self.selected = None;
        self.view.reset();
        self.refresh();
    }

    /// Best-effort full-graph refresh on a background thread.
    pub fn refresh(&mut self) {
        let source = Arc::clone(&self.source);
        self.pending_fetches
            .push(spawn_fetch(move || source.fetch_graph()));
    }

    /// Re-seeds positions for the current collection without refetching.
    pub fn reseed(&mut self) {
        let (nodes, _) = self.graph.parts_mut();
        self.simulation.seed_positions(nodes);
    }

    pub fn start_simulation(&mut self) {
        // Degenerate graphs never run; see the driver's tick guard.
        if self.graph.node_count() >= 2 {
            self.simulation.start();
        }
    }

    pub fn stop_simulation(&mut self) {
        self.simulation.stop();
    }

    /// Applies completed fetches on the UI thread. Completions land in
    /// registration order within a frame; across frames the latest
    /// completion simply issues the latest `load` (last writer wins, no
    /// sequencing guard). A failed fetch leaves the displayed graph and
    /// transform untouched and only raises the error flag.
    pub fn poll_fetches(&mut self) {
        let mut completed = Vec::new();
        self.pending_fetches.retain(|rx| match rx.try_recv() {
            Ok(result) => {
                completed.push(result);
                false
            }
            Err(TryRecvError::Empty) => true,
            Err(TryRecvError::Disconnected) => {
                completed.push(Err("graph fetch worker disconnected".to_owned()));
                false
            }
        });

        for result in completed {
            match result {
                Ok(snapshot) => {
                    self.load(snapshot);
                    self.start_simulation();
                }
                Err(error) => {
                    warn!("graph fetch failed, keeping last-good graph: {error}");
                    self.fetch_error = Some(error);
                }
            }
        }
    }

    /// Per-frame entry point: drains fetches, steps the simulation by the
    /// elapsed wall time, advances the view animation. Returns whether
    /// another frame is needed soon.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.poll_fetches();

        let (nodes, edges) = self.graph.parts_mut();
        let simulating = self.simulation.advance(nodes, edges, dt);
        let animating = self.view.advance(dt);

        simulating || animating || !self.pending_fetches.is_empty()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        self.graph.nodes()
    }

    pub fn edges(&self) -> &[GraphEdge] {
        self.graph.edges()
    }

    pub fn graph(&self) -> &ConceptGraph {
        &self.graph
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
            .as_deref()
            .and_then(|id| self.graph.index_of(id))
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    /// Gesture entry point for the rendering layer.
    pub fn view_mut(&mut self) -> &mut ViewTransform {
        &mut self.view
    }

    pub fn sim_state(&self) -> SimState {
        self.simulation.state()
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.simulation
    }

    pub fn is_fetching(&self) -> bool {
        !self.pending_fetches.is_empty()
    }

    pub fn fetch_error(&self) -> Option<&str> {
        self.fetch_error.as_deref()
    }

    pub fn clear_fetch_error(&mut self) {
        self.fetch_error = None;
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    #[cfg(test)]
    fn inject_fetch(&mut self, rx: Receiver<FetchResult>) {
        self.pending_fetches.push(rx);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use anyhow::{Result, bail};

    use super::*;
    use crate::graph::{ConceptSubgraph, DemoGraph};

    struct FailingSource;

    impl GraphSource for FailingSource {
        fn fetch_graph(&self) -> Result<GraphSnapshot> {
            bail!("service unavailable")
        }

        fn fetch_concept_subgraph(&self, _label: &str) -> Result<ConceptSubgraph> {
            bail!("service unavailable")
        }

        fn describe(&self) -> String {
            "failing source".to_owned()
        }
    }

    fn demo_controller() -> LayoutController {
        let mut controller = LayoutController::new(Arc::new(DemoGraph));
        controller.load(DemoGraph.fetch_graph().unwrap());
        controller
    }

    fn drain_fetches(controller: &mut LayoutController) {
        let mut polls = 0;
        while controller.is_fetching() {
            controller.poll_fetches();
            std::thread::sleep(std::time::Duration::from_millis(1));
            polls += 1;
            assert!(polls < 5_000, "fetch never completed");
        }
    }

    #[test]
    fn selection_toggles() {
        let mut controller = demo_controller();

        controller.select(Some("concept:calculus"));
        assert_eq!(controller.selected(), Some("concept:calculus"));

        controller.select(Some("concept:calculus"));
        assert_eq!(controller.selected(), None);
    }

    #[test]
    fn selecting_an_unknown_id_changes_nothing() {
        let mut controller = demo_controller();
        controller.select(Some("concept:calculus"));
        controller.select(Some("no-such-node"));
        assert_eq!(controller.selected(), Some("concept:calculus"));
    }

    #[test]
    fn load_does_not_start_the_simulation() {
        let controller = demo_controller();
        assert_eq!(controller.sim_state(), SimState::Idle);
        assert!(controller.nodes().len() > 2);
    }

    #[test]
    fn start_is_a_no_op_for_degenerate_graphs() {
        let mut controller = LayoutController::new(Arc::new(DemoGraph));
        controller.load(GraphSnapshot::default());
        controller.start_simulation();
        assert_eq!(controller.sim_state(), SimState::Idle);
    }

    #[test]
    fn focus_on_a_note_animates_without_fetching() {
        let mut controller = demo_controller();
        let position = controller.graph().node("note:0").unwrap().position;

        controller.focus("note:0");
        assert_eq!(controller.selected(), Some("note:0"));
        assert!(!controller.is_fetching());
        assert!(controller.view().is_animating());

        while controller.advance(1.0 / 60.0) {}
        assert_eq!(controller.view().scale(), FOCUS_SCALE);
        assert_eq!(controller.view().offset(), -position * FOCUS_SCALE);
    }

    #[test]
    fn focus_on_a_concept_fetches_and_keeps_the_pre_refresh_target() {
        let mut controller = demo_controller();
        let position = controller.graph().node("concept:calculus").unwrap().position;

        controller.focus("concept:calculus");
        assert!(controller.is_fetching());

        // The sub-graph load replaces every position, but the camera target
        // was fixed at focus time.
        while controller.advance(1.0 / 60.0) {}
        assert_eq!(controller.view().offset(), -position * FOCUS_SCALE);

        // The replacement graph is the calculus neighborhood.
        assert!(controller.graph().node("concept:calculus").is_some());
        assert!(controller.graph().node("concept:matrices").is_none());
        assert_eq!(controller.selected(), Some("concept:calculus"));
    }

    #[test]
    fn failed_fetch_keeps_the_last_good_graph() {
        let mut controller = LayoutController::new(Arc::new(FailingSource));
        controller.load(DemoGraph.fetch_graph().unwrap());
        controller.select(Some("concept:limits"));
        let node_count = controller.nodes().len();

        controller.refresh();
        drain_fetches(&mut controller);

        assert_eq!(controller.nodes().len(), node_count);
        assert_eq!(controller.selected(), Some("concept:limits"));
        assert!(controller.fetch_error().is_some());

        controller.clear_fetch_error();
        assert!(controller.fetch_error().is_none());
    }

    #[test]
    fn reset_clears_selection_and_transform_and_refetches() {
        let mut controller = demo_controller();
        controller.select(Some("concept:vectors"));
        controller.view_mut().zoom_by(2.0);
        controller.view_mut().pan_by(eframe::egui::vec2(40.0, 40.0));

        controller.reset();
        assert_eq!(controller.selected(), None);
        assert_eq!(controller.view().scale(), 1.0);
        assert_eq!(controller.view().offset(), eframe::egui::Vec2::ZERO);
        assert!(controller.is_fetching());

        drain_fetches(&mut controller);
        assert!(controller.nodes().len() > 2);
        assert_eq!(controller.sim_state(), SimState::Running);
    }

    #[test]
    fn later_completion_wins_between_racing_fetches() {
        let mut controller = demo_controller();

        let snapshot_a = serde_json::from_str::<GraphSnapshot>(
            r#"{"nodes": [{"id": "a", "label": "A", "kind": "concept"}], "edges": []}"#,
        )
        .unwrap();
        let snapshot_b = serde_json::from_str::<GraphSnapshot>(
            r#"{"nodes": [{"id": "b", "label": "B", "kind": "concept"}], "edges": []}"#,
        )
        .unwrap();

        let (tx_a, rx_a) = mpsc::channel();
        let (tx_b, rx_b) = mpsc::channel();
        controller.inject_fetch(rx_a);
        controller.inject_fetch(rx_b);

        // Both complete before the next poll; the later one issues the
        // later load and therefore wins.
        tx_a.send(Ok(snapshot_a)).unwrap();
        tx_b.send(Ok(snapshot_b)).unwrap();
        controller.poll_fetches();

        assert!(controller.graph().node("b").is_some());
        assert!(controller.graph().node("a").is_none());
    }

    #[test]
    fn selection_is_dropped_when_the_node_leaves_the_graph() {
        let mut controller = demo_controller();
        controller.select(Some("note:0"));

        controller.load(
            serde_json::from_str(
                r#"{"nodes": [{"id": "x", "label": "X", "kind": "note"}], "edges": []}"#,
            )
            .unwrap(),
        );
        assert_eq!(controller.selected(), None);
    }
}
