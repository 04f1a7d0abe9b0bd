use std::collections::HashSet;

use glam::Vec3;
use log::{debug, info};

use super::camera::{Camera, Projected};
use super::types::{
	ACTIVE_COLOR, HIGHLIGHT_COLOR, INACTIVE_COLOR, PATH_COLOR, PLAYER_COLOR, TARGET_COLOR, TreeMode,
	Tooltip,
};
use crate::config::detail_page;
use crate::racer::{Controls, Race, RaceParameters, RaceStats};
use crate::tree::{KnowledgeTree, LayoutParameters, NodeIdx, NodeKind, SpringLayout};

/// World-space radius of the largest sphere.
pub const NODE_SIZE: f64 = 5.0;
/// Minimum on-screen pick radius in pixels.
pub const HIT_RADIUS: f64 = 8.0;
/// Pointer travel, in pixels, past which a press counts as a drag.
const CLICK_SLOP: f64 = 3.0;

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<NodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start: Vec3,
	pub depth: f32,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct OrbitState {
	pub active: bool,
	pub last_x: f64,
	pub last_y: f64,
	pub moved: bool,
}

/// Outcome of a click on the canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickAction {
	Navigate(String),
	StartSelected(NodeIdx),
	Nothing,
}

pub struct TreeViewState {
	pub tree: KnowledgeTree,
	pub layout: SpringLayout,
	pub camera: Camera,
	pub race: Race,
	pub mode: TreeMode,
	pub drag: DragState,
	pub orbit: OrbitState,
	pub hover: Option<NodeIdx>,
	pub pointer: (f64, f64),
	/// `KeyboardEvent.code` of every key held down.
	pub keys: HashSet<String>,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
}

impl TreeViewState {
	pub fn new(tree: KnowledgeTree, mode: TreeMode, width: f64, height: f64) -> Self {
		Self {
			tree,
			layout: SpringLayout::new(LayoutParameters::default()),
			camera: Camera::default(),
			race: Race::new(RaceParameters::default(), js_seed()),
			mode,
			drag: DragState::default(),
			orbit: OrbitState::default(),
			hover: None,
			pointer: (0.0, 0.0),
			keys: HashSet::new(),
			width,
			height,
			animation_running: true,
		}
	}

	/// Swaps in a freshly loaded tree and forgets everything tied to the old one.
	pub fn replace_tree(&mut self, tree: KnowledgeTree) {
		info!("Scene holds {} nodes", tree.len());
		self.tree = tree;
		self.race = Race::new(RaceParameters::default(), js_seed());
		self.drag = DragState::default();
		self.hover = None;
	}

	pub fn racing(&self) -> bool {
		self.mode == TreeMode::Racer && self.race.started()
	}

	pub fn project(&self, point: Vec3) -> Option<Projected> {
		self.camera.project(point, self.width, self.height)
	}

	/// Nearest node under the pointer, front-most on ties.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<NodeIdx> {
		let mut found: Option<(NodeIdx, f32)> = None;
		for (idx, node) in self.tree.nodes() {
			let Some(p) = self.project(node.position) else {
				continue;
			};
			let radius = (node_radius(node.kind) * p.scale).max(HIT_RADIUS);
			let (dx, dy) = (p.x - sx, p.y - sy);
			if (dx * dx + dy * dy).sqrt() < radius && found.is_none_or(|(_, depth)| p.depth < depth) {
				found = Some((idx, p.depth));
			}
		}
		found.map(|(idx, _)| idx)
	}

	pub fn set_hover(&mut self, node: Option<NodeIdx>) {
		if self.hover != node {
			self.hover = node;
		}
	}

	pub fn tooltip(&self) -> Option<Tooltip> {
		let idx = self.hover?;
		Some(Tooltip {
			text: self.tree.node(idx).name.clone(),
			x: self.pointer.0,
			y: self.pointer.1,
		})
	}

	pub fn press(&mut self, x: f64, y: f64) {
		self.pointer = (x, y);
		if self.racing() {
			return;
		}
		if let Some(idx) = self.node_at_position(x, y) {
			let node = self.tree.node(idx);
			let depth = self.project(node.position).map_or(self.camera.distance, |p| p.depth);
			self.drag = DragState {
				active: true,
				node_idx: Some(idx),
				start_x: x,
				start_y: y,
				node_start: node.position,
				depth,
				moved: false,
			};
			self.tree.begin_drag(idx);
		} else {
			self.orbit = OrbitState {
				active: true,
				last_x: x,
				last_y: y,
				moved: false,
			};
		}
	}

	pub fn move_pointer(&mut self, x: f64, y: f64) {
		self.pointer = (x, y);
		if self.racing() {
			self.set_hover(None);
			return;
		}
		if !self.drag.active {
			let hovered = self.node_at_position(x, y);
			self.set_hover(hovered);
		}

		if self.drag.active {
			if let Some(idx) = self.drag.node_idx {
				let (dx, dy) = (x - self.drag.start_x, y - self.drag.start_y);
				if dx.hypot(dy) > CLICK_SLOP {
					self.drag.moved = true;
				}
				let offset = self.camera.screen_to_world(dx, dy, self.drag.depth);
				self.tree.drag_to(idx, self.drag.node_start + offset);
			}
		} else if self.orbit.active {
			let (dx, dy) = (x - self.orbit.last_x, y - self.orbit.last_y);
			if dx.hypot(dy) > 0.0 {
				self.orbit.moved = true;
			}
			self.camera.orbit(dx, dy);
			self.orbit.last_x = x;
			self.orbit.last_y = y;
		}
	}

	/// Ends any drag. Returns true when the press moved enough that the
	/// following click should be ignored.
	pub fn release(&mut self) -> bool {
		let moved = self.drag.moved || self.orbit.moved;
		if let Some(idx) = self.drag.node_idx.take() {
			self.tree.end_drag(idx);
		}
		self.drag.active = false;
		self.orbit.active = false;
		moved
	}

	pub fn leave(&mut self) {
		self.release();
		self.set_hover(None);
	}

	/// Resolves a click: navigation in explore mode, start selection in
	/// racer mode.
	pub fn click(&mut self, x: f64, y: f64) -> ClickAction {
		if self.racing() {
			return ClickAction::Nothing;
		}
		let Some(idx) = self.node_at_position(x, y) else {
			return ClickAction::Nothing;
		};
		match self.mode {
			TreeMode::Explore => detail_page(self.tree.node(idx))
				.map_or(ClickAction::Nothing, ClickAction::Navigate),
			TreeMode::Racer => match self.race.select_start(&self.tree, idx) {
				Ok(()) => ClickAction::StartSelected(idx),
				Err(err) => {
					debug!("Ignoring click on {}: {err}", self.tree.node(idx).name);
					ClickAction::Nothing
				}
			},
		}
	}

	/// Space jumps ahead to the next topic while racing.
	pub fn key_up(&mut self, code: &str) {
		self.keys.remove(code);
		if code == "Space" && self.racing() {
			self.race.jump_to_next_topic(&self.tree);
		}
	}

	pub fn key_down(&mut self, code: &str) {
		self.keys.insert(code.to_owned());
	}

	pub fn race_stats(&self) -> RaceStats {
		self.race.stats(&self.tree)
	}

	pub fn tick(&mut self, dt: f32) {
		self.layout.step(&mut self.tree, dt);
		if self.racing() {
			let controls = Controls::from_keys(self.keys.iter().map(String::as_str));
			self.race.tick(&self.tree, controls);
			if let Some(player) = self.race.player() {
				self.camera.follow(player);
			}
		}
	}

	/// Fill color of a node this frame.
	pub fn node_color(&self, idx: NodeIdx) -> &'static str {
		if self.mode == TreeMode::Racer {
			if self.race.current() == Some(idx) {
				return PLAYER_COLOR;
			}
			if self.race.target() == Some(idx) {
				return TARGET_COLOR;
			}
			if self.race.path().contains(&idx) {
				return PATH_COLOR;
			}
		}
		if self.hover == Some(idx) {
			return HIGHLIGHT_COLOR;
		}
		if self.tree.node(idx).active {
			ACTIVE_COLOR
		} else {
			INACTIVE_COLOR
		}
	}

	/// Whether an edge joins two consecutive nodes of the race route.
	pub fn on_route(&self, a: NodeIdx, b: NodeIdx) -> bool {
		self.mode == TreeMode::Racer
			&& self
				.race
				.path()
				.windows(2)
				.any(|w| (w[0] == a && w[1] == b) || (w[0] == b && w[1] == a))
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

/// World-space radius of a node; deeper layers are smaller, problems are
/// drawn as squares of three node sizes.
pub fn node_radius(kind: NodeKind) -> f64 {
	match kind {
		NodeKind::Problem => NODE_SIZE * 1.5,
		_ => NODE_SIZE - kind.depth() as f64,
	}
}

#[cfg(target_arch = "wasm32")]
fn js_seed() -> u64 {
	(js_sys::Math::random() * u64::MAX as f64) as u64
}

#[cfg(not(target_arch = "wasm32"))]
fn js_seed() -> u64 {
	0
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tree::{TreeSnapshot, build_tree};

	const W: f64 = 800.0;
	const H: f64 = 600.0;

	fn state(mode: TreeMode) -> TreeViewState {
		let snapshot = TreeSnapshot::from_json(
			r#"{"units": [{"unit_id": "u1", "unit_number": 1, "unit_name": "Exploring Data", "topics": [
				{"topic_id": "t1", "topic_number": "1.1", "topic_name": "A", "has_problems": true,
				 "problems": [{"problem_id": "p1", "display_name": "P1", "filename": "p1.png"}]},
				{"topic_id": "t2", "topic_number": "1.2", "topic_name": "B",
				 "problems": [{"problem_id": "p2", "display_name": "P2", "filename": "p2.png"}]}]}]}"#,
		)
		.unwrap();
		let tree = build_tree(&snapshot, &LayoutParameters::default()).unwrap();
		TreeViewState::new(tree, mode, W, H)
	}

	fn screen(state: &TreeViewState, kind: NodeKind, id: &str) -> (NodeIdx, f64, f64) {
		let idx = state.tree.find(kind, id).unwrap();
		let p = state.project(state.tree.node(idx).position).unwrap();
		(idx, p.x, p.y)
	}

	#[test]
	fn hover_picks_the_node_under_the_pointer() {
		let mut s = state(TreeMode::Explore);
		let (t1, x, y) = screen(&s, NodeKind::Topic, "t1");
		s.move_pointer(x + 1.0, y);
		assert_eq!(s.hover, Some(t1));
		assert_eq!(s.tooltip().unwrap().text, "1.1 A");
		assert_eq!(s.node_color(t1), HIGHLIGHT_COLOR);

		s.move_pointer(1.0, 1.0);
		assert_eq!(s.hover, None);
		assert!(s.tooltip().is_none());
	}

	#[test]
	fn explore_clicks_navigate() {
		let mut s = state(TreeMode::Explore);
		let (_, x, y) = screen(&s, NodeKind::Problem, "p2");
		assert_eq!(s.click(x, y), ClickAction::Navigate("/problem/p2.png".into()));
		let (_, x, y) = screen(&s, NodeKind::Topic, "t1");
		assert_eq!(s.click(x, y), ClickAction::Navigate("/topic/t1".into()));
		let (_, x, y) = screen(&s, NodeKind::Unit, "u1");
		assert_eq!(s.click(x, y), ClickAction::Nothing);
	}

	#[test]
	fn racer_clicks_select_a_start() {
		let mut s = state(TreeMode::Racer);
		let (p1, x, y) = screen(&s, NodeKind::Problem, "p1");
		assert_eq!(s.click(x, y), ClickAction::StartSelected(p1));
		assert_eq!(s.node_color(p1), PLAYER_COLOR);
		let p2 = s.tree.find(NodeKind::Problem, "p2").unwrap();
		assert_eq!(s.node_color(p2), TARGET_COLOR);
		let t1 = s.tree.find(NodeKind::Topic, "t1").unwrap();
		assert_eq!(s.node_color(t1), PATH_COLOR);
		assert!(s.on_route(t1, p1));
	}

	#[test]
	fn dragging_moves_the_node_and_release_stills_it() {
		let mut s = state(TreeMode::Explore);
		let (t2, x, y) = screen(&s, NodeKind::Topic, "t2");
		let before = s.tree.node(t2).position;

		s.press(x, y);
		assert!(s.tree.node(t2).dragging);
		s.move_pointer(x + 40.0, y);
		s.tick(0.016);
		let offset = s.camera.screen_to_world(40.0, 0.0, s.drag.depth);
		assert_eq!(s.tree.node(t2).position, s.drag.node_start + offset);
		assert_ne!(s.tree.node(t2).position, before);

		assert!(s.release());
		assert!(!s.tree.node(t2).dragging);
		assert_eq!(s.tree.node(t2).velocity, Vec3::ZERO);
	}

	#[test]
	fn background_drag_orbits_the_camera() {
		let mut s = state(TreeMode::Explore);
		let yaw = s.camera.yaw;
		s.press(2.0, 2.0);
		s.move_pointer(50.0, 2.0);
		assert!(s.release());
		assert_ne!(s.camera.yaw, yaw);
	}

	#[test]
	fn racing_follows_the_player_and_space_jumps() {
		let mut s = state(TreeMode::Racer);
		let (_, x, y) = screen(&s, NodeKind::Problem, "p1");
		s.click(x, y);
		s.race.start(&s.tree).unwrap();

		s.key_down("KeyW");
		s.tick(0.016);
		let player = s.race.player().unwrap().clone();
		assert_eq!(s.camera.target, player.position);
		assert!(player.speed > 0.0);

		s.key_up("Space");
		let t1 = s.tree.find(NodeKind::Topic, "t1").unwrap();
		assert_eq!(s.race.current(), Some(t1));
		assert!(!s.keys.contains("Space"));
	}
}
