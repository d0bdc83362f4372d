use eframe::egui::{Vec2, vec2};

use crate::graph::{GraphEdge, GraphNode};
use crate::util::stable_pair;

use super::forces::{ForceParams, accumulate_forces};

pub const DAMPING: f32 = 0.9;
pub const CONVERGENCE_THRESHOLD: f32 = 0.1;
pub const TICK_RATE_HZ: f32 = 60.0;
pub const SEED_RADIUS: f32 = 150.0;
pub const SEED_JITTER: f32 = 20.0;

/// Upper bound on catch-up ticks per frame; a long stall drops its backlog
/// instead of spiraling.
const MAX_TICKS_PER_FRAME: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimState {
    Idle,
    Running,
}

/// Fixed-step accumulator: converts wall-clock deltas into whole virtual
/// ticks so frame jitter never changes the physics of an individual tick.
/// Accumulates in f64: f32 residuals sit one ulp short of the interval and
/// drop carried ticks at frame boundaries.
#[derive(Debug)]
pub struct TickClock {
    interval: f64,
    accumulator: f64,
}

impl TickClock {
    pub fn new(rate_hz: f32) -> Self {
        Self {
            interval: 1.0 / f64::from(rate_hz),
            accumulator: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    pub fn ticks(&mut self, delta_seconds: f32) -> usize {
        self.accumulator += f64::from(delta_seconds.max(0.0));

        let mut ticks = 0;
        while self.accumulator >= self.interval && ticks < MAX_TICKS_PER_FRAME {
            self.accumulator -= self.interval;
            ticks += 1;
        }

        if ticks == MAX_TICKS_PER_FRAME {
            self.accumulator = 0.0;
        }
        ticks
    }
}

/// The stepper: accumulates forces, integrates with damping, and halts
/// itself once aggregate movement falls below the convergence threshold.
pub struct Simulation {
    state: SimState,
    params: ForceParams,
    clock: TickClock,
    force_scratch: Vec<Vec2>,
    last_movement: f32,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(ForceParams::default())
    }
}

impl Simulation {
    pub fn new(params: ForceParams) -> Self {
        Self {
            state: SimState::Idle,
            params,
            clock: TickClock::new(TICK_RATE_HZ),
            force_scratch: Vec::new(),
            last_movement: 0.0,
        }
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SimState::Running
    }

    pub fn params(&self) -> &ForceParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ForceParams {
        &mut self.params
    }

    /// Aggregate movement of the most recent tick.
    pub fn last_movement(&self) -> f32 {
        self.last_movement
    }

    /// Idle -> Running. No-op when already running: there is at most one
    /// active clock and a restart must not discard its accumulator.
    pub fn start(&mut self) {
        if self.state == SimState::Idle {
            self.state = SimState::Running;
            self.clock.reset();
        }
    }

    /// Running -> Idle, idempotent. No tick runs after this returns.
    pub fn stop(&mut self) {
        self.state = SimState::Idle;
    }

    /// Places nodes evenly on a circle around the canvas center with a small
    /// deterministic per-node jitter, so repulsion never cancels exactly
    /// along the circle. Velocities reset to zero; the driver goes Idle and
    /// waits for an explicit start.
    pub fn seed_positions(&mut self, nodes: &mut [GraphNode]) {
        self.state = SimState::Idle;
        self.clock.reset();
        self.last_movement = 0.0;

        let count = nodes.len().max(1) as f32;
        for (index, node) in nodes.iter_mut().enumerate() {
            let angle = (index as f32 / count) * std::f32::consts::TAU;
            let (jx, jy) = stable_pair(&node.id);
            node.position = self.params.center
                + vec2(angle.cos(), angle.sin()) * SEED_RADIUS
                + vec2(jx, jy) * SEED_JITTER;
            node.velocity = Vec2::ZERO;
        }
    }

    /// One fixed virtual step. Returns whether the simulation is still
    /// running afterwards.
    pub fn tick(&mut self, nodes: &mut [GraphNode], edges: &[GraphEdge]) -> bool {
        if self.state != SimState::Running {
            return false;
        }

        // Degenerate graphs have no meaningful forces; the driver parks
        // itself rather than erroring.
        if nodes.len() < 2 {
            self.state = SimState::Idle;
            return false;
        }

        accumulate_forces(nodes, edges, &self.params, &mut self.force_scratch);

        let mut total_movement = 0.0;
        for (node, force) in nodes.iter_mut().zip(&self.force_scratch) {
            node.velocity = (node.velocity + *force) * DAMPING;
            node.position += node.velocity;
            total_movement += node.velocity.x.abs() + node.velocity.y.abs();
        }

        self.last_movement = total_movement;
        if total_movement < CONVERGENCE_THRESHOLD {
            self.state = SimState::Idle;
            return false;
        }
        true
    }

    /// Wall-clock entry point: runs however many whole ticks the elapsed
    /// time covers. Returns whether the simulation is still running.
    pub fn advance(&mut self, nodes: &mut [GraphNode], edges: &[GraphEdge], dt: f32) -> bool {
        if self.state != SimState::Running {
            return false;
        }

        for _ in 0..self.clock.ticks(dt) {
            if !self.tick(nodes, edges) {
                return false;
            }
        }
        self.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeKind, RelationKind};

    fn node(id: &str) -> GraphNode {
        GraphNode {
            id: id.to_owned(),
            label: id.to_owned(),
            kind: NodeKind::Concept,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
        }
    }

    fn edge(source: usize, target: usize) -> GraphEdge {
        GraphEdge {
            source,
            target,
            relation: RelationKind::Related,
            weight: 1.0,
        }
    }

    fn run_until_idle(sim: &mut Simulation, nodes: &mut [GraphNode], edges: &[GraphEdge]) -> usize {
        let mut ticks = 0;
        while sim.tick(nodes, edges) {
            ticks += 1;
            assert!(ticks < 20_000, "simulation failed to converge");
        }
        ticks
    }

    #[test]
    fn tick_clock_converts_elapsed_time_into_whole_ticks() {
        let mut clock = TickClock::new(60.0);
        assert_eq!(clock.ticks(3.5 / 60.0), 3);
        // The half-interval remainder carries over.
        assert_eq!(clock.ticks(0.5 / 60.0), 1);
        assert_eq!(clock.ticks(0.0), 0);
    }

    #[test]
    fn tick_clock_never_loses_carried_ticks_to_rounding() {
        // Half-interval deltas must pair up into exactly one tick each, for
        // as long as the clock runs.
        let mut clock = TickClock::new(60.0);
        let mut ticks = 0;
        for _ in 0..120 {
            ticks += clock.ticks(0.5 / 60.0);
        }
        assert_eq!(ticks, 60);
    }

    #[test]
    fn tick_clock_caps_catch_up_after_a_stall() {
        let mut clock = TickClock::new(60.0);
        assert_eq!(clock.ticks(2.0), MAX_TICKS_PER_FRAME);
        // Backlog was dropped, not carried.
        assert_eq!(clock.ticks(0.0), 0);
    }

    #[test]
    fn seeding_is_deterministic_and_finite() {
        let mut sim = Simulation::default();
        let mut first = vec![node("a"), node("b"), node("c"), node("d")];
        let mut second = first.clone();

        sim.seed_positions(&mut first);
        sim.seed_positions(&mut second);

        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.position, b.position);
            assert!(a.position.x.is_finite() && a.position.y.is_finite());
            assert_eq!(a.velocity, Vec2::ZERO);

            let radius = (a.position - sim.params().center).length();
            assert!(radius >= SEED_RADIUS - 2.0 * SEED_JITTER);
            assert!(radius <= SEED_RADIUS + 2.0 * SEED_JITTER);
        }
    }

    #[test]
    fn stop_is_idempotent_including_before_start() {
        let mut sim = Simulation::default();
        sim.stop();
        assert_eq!(sim.state(), SimState::Idle);

        sim.start();
        sim.stop();
        sim.stop();
        assert_eq!(sim.state(), SimState::Idle);

        let mut nodes = vec![node("a"), node("b")];
        assert!(!sim.tick(&mut nodes, &[]));
    }

    #[test]
    fn start_is_a_no_op_while_running() {
        let mut sim = Simulation::default();
        sim.start();
        assert!(sim.is_running());
        sim.start();
        assert!(sim.is_running());
    }

    #[test]
    fn degenerate_graphs_never_run() {
        let mut sim = Simulation::default();

        let mut empty: Vec<GraphNode> = Vec::new();
        sim.start();
        assert!(!sim.tick(&mut empty, &[]));
        assert_eq!(sim.state(), SimState::Idle);

        let mut single = vec![node("only")];
        sim.seed_positions(&mut single);
        let seeded = single[0].position;
        sim.start();
        assert!(!sim.tick(&mut single, &[]));
        assert_eq!(sim.state(), SimState::Idle);
        assert_eq!(single[0].position, seeded);
    }

    #[test]
    fn static_graph_converges_and_stays_idle() {
        let mut sim = Simulation::default();
        let mut nodes = vec![node("a"), node("b"), node("c"), node("d")];
        let edges = vec![edge(0, 1), edge(1, 2)];

        sim.seed_positions(&mut nodes);
        sim.start();
        run_until_idle(&mut sim, &mut nodes, &edges);

        assert_eq!(sim.state(), SimState::Idle);
        assert!(sim.last_movement() < CONVERGENCE_THRESHOLD);

        // Idle is sticky: further ticks change nothing.
        let frozen = nodes.iter().map(|n| n.position).collect::<Vec<_>>();
        assert!(!sim.tick(&mut nodes, &edges));
        for (node, position) in nodes.iter().zip(frozen) {
            assert_eq!(node.position, position);
        }
    }

    #[test]
    fn triangle_scenario_separates_linked_pair_and_recenters_loner() {
        let mut sim = Simulation::default();
        let mut nodes = vec![node("a"), node("b"), node("c")];
        let edges = vec![edge(0, 1)];

        sim.seed_positions(&mut nodes);
        let initial_ab = (nodes[0].position - nodes[1].position).length();
        let initial_c = (nodes[2].position - sim.params().center).length();

        sim.start();
        run_until_idle(&mut sim, &mut nodes, &edges);

        let target = sim.params().target_distance();
        let final_ab = (nodes[0].position - nodes[1].position).length();
        assert!(
            (final_ab - target).abs() < (initial_ab - target).abs(),
            "edge ab should settle nearer the {target} rest length: {initial_ab} -> {final_ab}"
        );

        // The edgeless node drifts toward the center but never reaches it;
        // repulsion from the pair holds it off.
        let final_c = (nodes[2].position - sim.params().center).length();
        assert!(final_c < initial_c);
        assert!(final_c > 1.0);
    }

    #[test]
    fn advance_runs_fixed_steps_and_reports_running_state() {
        let mut sim = Simulation::default();
        let mut nodes = vec![node("a"), node("b"), node("c")];
        let edges = vec![edge(0, 1)];

        sim.seed_positions(&mut nodes);
        assert!(!sim.advance(&mut nodes, &edges, 1.0), "idle until started");

        sim.start();
        let before = nodes[0].position;
        assert!(sim.advance(&mut nodes, &edges, 2.5 / 60.0));
        assert_ne!(nodes[0].position, before);

        // Sub-interval deltas accumulate instead of ticking early.
        let held = nodes[0].position;
        sim.advance(&mut nodes, &edges, 0.25 / 60.0);
        assert_eq!(nodes[0].position, held);
    }
}
