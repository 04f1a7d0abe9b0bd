//! Mass-spring relaxation run once per frame.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::model::KnowledgeTree;

const DEFAULT_SEED: u64 = 0x6b74_7265_65;

/// Tuning for initial placement and for the spring step.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutParameters {
	/// Force per unit of stretch.
	pub spring_constant: f32,
	/// Velocity multiplier applied every frame, below 1.
	pub damping: f32,
	/// Largest per-axis random force on uncategorized nodes.
	pub jitter: f32,
	/// Vertical distance between layers.
	pub level_height: f32,
	/// Horizontal distance between siblings.
	pub sibling_spread: f32,
	/// Depth distance between layers.
	pub layer_depth: f32,
}

impl Default for LayoutParameters {
	fn default() -> Self {
		Self {
			spring_constant: 0.5,
			damping: 0.95,
			jitter: 0.5,
			level_height: 100.0,
			sibling_spread: 80.0,
			layer_depth: 40.0,
		}
	}
}

/// Force on `source` from a spring to `target`. The target feels the
/// negation. `None` for coincident endpoints, which have no direction.
pub fn spring_force(source: Vec3, target: Vec3, rest_length: f32, stiffness: f32) -> Option<Vec3> {
	let delta = target - source;
	let distance = delta.length();
	if distance <= 0.0 {
		return None;
	}
	let displacement = distance - rest_length;
	Some(delta / distance * stiffness * displacement)
}

/// Owns the scratch buffers and the jitter source; the tree owns the state.
#[derive(Clone, Debug)]
pub struct SpringLayout {
	params: LayoutParameters,
	rng: SmallRng,
	forces: Vec<Vec3>,
}

impl SpringLayout {
	/// A layout with a fixed default jitter seed.
	pub fn new(params: LayoutParameters) -> Self {
		Self::with_seed(params, DEFAULT_SEED)
	}

	/// A layout whose jitter comes from `seed`.
	pub fn with_seed(params: LayoutParameters, seed: u64) -> Self {
		Self {
			params,
			rng: SmallRng::seed_from_u64(seed),
			forces: Vec::new(),
		}
	}

	/// Parameters the layout was built with.
	pub fn params(&self) -> &LayoutParameters {
		&self.params
	}

	/// Forces accumulated during the last step, by node index.
	pub fn forces(&self) -> &[Vec3] {
		&self.forces
	}

	/// Advances every node that is not being dragged by `dt`.
	pub fn step(&mut self, tree: &mut KnowledgeTree, dt: f32) {
		self.forces.clear();
		self.forces.resize(tree.len(), Vec3::ZERO);

		for (edge, source, target) in tree.edge_segments() {
			let Some(force) =
				spring_force(source, target, edge.rest_length(), self.params.spring_constant)
			else {
				continue;
			};
			self.forces[edge.source.index()] += force;
			self.forces[edge.target.index()] -= force;
		}

		let jitter = self.params.jitter;
		for (idx, node) in tree.nodes() {
			if node.uncategorized && jitter > 0.0 {
				self.forces[idx.index()] += Vec3::new(
					self.rng.gen_range(-jitter..=jitter),
					self.rng.gen_range(-jitter..=jitter),
					self.rng.gen_range(-jitter..=jitter),
				);
			}
		}

		let damping = self.params.damping;
		for (node, force) in tree.nodes_mut().iter_mut().zip(&self.forces) {
			if node.dragging {
				continue;
			}
			let acceleration = *force / node.mass;
			node.velocity += acceleration * dt;
			node.velocity *= damping;
			node.position += node.velocity * dt;
		}
	}
}
