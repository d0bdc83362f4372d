use eframe::egui::{Vec2, vec2};

use crate::graph::{GraphEdge, GraphNode};

/// Tuning knobs for one tick of force accumulation. `center` is the fixed
/// canvas-space point disconnected components are pulled toward.
#[derive(Clone, Copy, Debug)]
pub struct ForceParams {
    pub repulsion_strength: f32,
    pub attraction_strength: f32,
    pub min_distance: f32,
    pub center_strength: f32,
    pub center: Vec2,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            repulsion_strength: 5000.0,
            attraction_strength: 0.01,
            min_distance: 100.0,
            center_strength: 0.005,
            center: Vec2::ZERO,
        }
    }
}

impl ForceParams {
    /// Rest length of every edge spring.
    pub fn target_distance(&self) -> f32 {
        self.min_distance * 1.5
    }
}

fn separation(a: Vec2, b: Vec2, index_a: usize, index_b: usize) -> (Vec2, f32) {
    let delta = a - b;
    let distance = delta.length();
    if distance > 0.0001 {
        (delta / distance, distance)
    } else {
        // Coincident nodes get a deterministic push direction so the pair
        // still separates instead of dividing by zero.
        let angle =
            ((index_a as f32) * 0.618_034 + (index_b as f32) * 0.414_214) * std::f32::consts::TAU;
        (vec2(angle.cos(), angle.sin()), 0.0)
    }
}

/// Net per-node force for one tick: pairwise repulsion, per-edge spring
/// attraction, and a weak pull toward the canvas center. Pure in the node
/// and edge state; writes into the caller's reusable scratch buffer.
pub fn accumulate_forces(
    nodes: &[GraphNode],
    edges: &[GraphEdge],
    params: &ForceParams,
    forces: &mut Vec<Vec2>,
) {
    forces.clear();
    forces.resize(nodes.len(), Vec2::ZERO);

    // Repulsion over all unordered pairs; distance floored at one unit so
    // coincident nodes cannot produce a singular force.
    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            let (direction, distance) = separation(nodes[i].position, nodes[j].position, i, j);
            let distance = distance.max(1.0);
            let push = direction * (params.repulsion_strength / (distance * distance));
            forces[i] += push;
            forces[j] -= push;
        }
    }

    // Edge springs: pull when stretched past the rest length, push back when
    // compressed below it.
    let target_distance = params.target_distance();
    for edge in edges {
        if edge.source >= nodes.len() || edge.target >= nodes.len() {
            continue;
        }

        let (direction, distance) = separation(
            nodes[edge.target].position,
            nodes[edge.source].position,
            edge.target,
            edge.source,
        );
        let magnitude = (distance - target_distance) * params.attraction_strength * edge.weight;
        forces[edge.source] += direction * magnitude;
        forces[edge.target] -= direction * magnitude;
    }

    // Center gravity keeps disconnected components on canvas.
    for (node, force) in nodes.iter().zip(forces.iter_mut()) {
        *force += (params.center - node.position) * params.center_strength;
    }
}
