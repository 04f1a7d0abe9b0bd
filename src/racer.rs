//! Rules of the racing minigame: drive from problem to problem along the
//! shortest route through the tree.

use std::collections::HashSet;

use glam::Vec3;
use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::tree::{KnowledgeTree, NodeIdx, NodeKind, shortest_path};

/// Tuning of the player's car and the scoring.
#[derive(Clone, Debug, PartialEq)]
pub struct RaceParameters {
	/// Top speed, world units per frame.
	pub max_speed: f32,
	/// Speed gained per frame while accelerating.
	pub acceleration: f32,
	/// Speed lost per frame with no throttle input.
	pub deceleration: f32,
	/// Radians per frame.
	pub rotation_speed: f32,
	/// Distance at which the player touches a node.
	pub collision_radius: f32,
	/// Height above the start node the player spawns at.
	pub hover_height: f32,
	/// Points for reaching the target.
	pub target_reward: u32,
	/// Points for touching a node on the route.
	pub waypoint_reward: u32,
	/// Points a topic jump costs.
	pub jump_penalty: u32,
}

impl Default for RaceParameters {
	fn default() -> Self {
		Self {
			max_speed: 2.0,
			acceleration: 0.05,
			deceleration: 0.03,
			rotation_speed: 0.05,
			collision_radius: 10.0,
			hover_height: 5.0,
			target_reward: 100,
			waypoint_reward: 10,
			jump_penalty: 5,
		}
	}
}

/// Throttle and steering held down this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Controls {
	/// W or Up.
	pub accelerate: bool,
	/// S or Down.
	pub brake: bool,
	/// A or Left.
	pub left: bool,
	/// D or Right.
	pub right: bool,
}

impl Controls {
	/// Maps `KeyboardEvent.code` values to controls.
	pub fn from_keys<'a>(pressed: impl IntoIterator<Item = &'a str>) -> Self {
		let mut controls = Self::default();
		for code in pressed {
			match code {
				"KeyW" | "ArrowUp" => controls.accelerate = true,
				"KeyS" | "ArrowDown" => controls.brake = true,
				"KeyA" | "ArrowLeft" => controls.left = true,
				"KeyD" | "ArrowRight" => controls.right = true,
				_ => {}
			}
		}
		controls
	}
}

/// Why a race could not begin.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RaceError {
	/// Start pressed before a problem was picked.
	#[error("select a starting problem first")]
	NoStart,
	/// The picked node is a unit, topic or the root.
	#[error("only problems can be chosen as the starting point")]
	NotAProblem,
	/// Start pressed a second time.
	#[error("the race is already running")]
	AlreadyStarted,
}

/// Something the player ran into this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaceEvent {
	/// The player reached the target problem.
	ReachedTarget(NodeIdx),
	/// The player touched a node on the route.
	ReachedWaypoint(NodeIdx),
}

/// The car the player drives.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Player {
	/// World-space position.
	pub position: Vec3,
	/// Signed; negative is reverse.
	pub speed: f32,
	/// Yaw in radians; zero faces −Z.
	pub heading: f32,
}

impl Player {
	/// Unit vector the player faces, in the ground plane.
	pub fn direction(&self) -> Vec3 {
		Vec3::new(-self.heading.sin(), 0.0, -self.heading.cos())
	}
}

/// What the info panel shows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RaceStats {
	/// Points so far.
	pub score: u32,
	/// Distinct problems reached.
	pub visited: usize,
	/// Problems in the tree.
	pub total: usize,
	/// Name of the node the player last reached.
	pub current: Option<String>,
	/// Name of the target problem.
	pub target: Option<String>,
	/// Whether the player has spawned.
	pub started: bool,
}

/// One game: start, target, route, player and score.
#[derive(Clone, Debug)]
pub struct Race {
	params: RaceParameters,
	rng: SmallRng,
	player: Option<Player>,
	current: Option<NodeIdx>,
	target: Option<NodeIdx>,
	path: Vec<NodeIdx>,
	score: u32,
	visited: HashSet<NodeIdx>,
}

impl Race {
	/// An idle race; `seed` drives target selection.
	pub fn new(params: RaceParameters, seed: u64) -> Self {
		Self {
			params,
			rng: SmallRng::seed_from_u64(seed),
			player: None,
			current: None,
			target: None,
			path: Vec::new(),
			score: 0,
			visited: HashSet::new(),
		}
	}

	/// Whether the player has spawned.
	pub fn started(&self) -> bool {
		self.player.is_some()
	}

	/// The player, once started.
	pub fn player(&self) -> Option<&Player> {
		self.player.as_ref()
	}

	/// Mutable access to the player.
	pub fn player_mut(&mut self) -> Option<&mut Player> {
		self.player.as_mut()
	}

	/// Node the player last reached, or the selected start.
	pub fn current(&self) -> Option<NodeIdx> {
		self.current
	}

	/// Problem the player is racing to.
	pub fn target(&self) -> Option<NodeIdx> {
		self.target
	}

	/// Route from the current node to the target, both included. Empty when
	/// there is no target or it is unreachable.
	pub fn path(&self) -> &[NodeIdx] {
		&self.path
	}

	/// Points so far.
	pub fn score(&self) -> u32 {
		self.score
	}

	/// Picks the starting problem and a random target to race to.
	pub fn select_start(&mut self, tree: &KnowledgeTree, idx: NodeIdx) -> Result<(), RaceError> {
		if self.started() {
			return Err(RaceError::AlreadyStarted);
		}
		if tree.node(idx).kind != NodeKind::Problem {
			return Err(RaceError::NotAProblem);
		}
		self.current = Some(idx);
		self.pick_target(tree);
		Ok(())
	}

	/// Spawns the player above the starting problem.
	pub fn start(&mut self, tree: &KnowledgeTree) -> Result<(), RaceError> {
		if self.started() {
			return Err(RaceError::AlreadyStarted);
		}
		let current = self.current.ok_or(RaceError::NoStart)?;
		self.player = Some(Player {
			position: tree.node(current).position + Vec3::Y * self.params.hover_height,
			..Player::default()
		});
		info!("Race started from {}", tree.node(current).name);
		Ok(())
	}

	/// Advances the player one frame and resolves collisions.
	pub fn tick(&mut self, tree: &KnowledgeTree, controls: Controls) -> Option<RaceEvent> {
		let params = &self.params;
		let player = self.player.as_mut()?;

		if controls.accelerate {
			player.speed = (player.speed + params.acceleration).min(params.max_speed);
		} else if controls.brake {
			player.speed = (player.speed - params.acceleration).max(-params.max_speed / 2.0);
		} else if player.speed > 0.0 {
			player.speed = (player.speed - params.deceleration).max(0.0);
		} else if player.speed < 0.0 {
			player.speed = (player.speed + params.deceleration).min(0.0);
		}

		if controls.left {
			player.heading += params.rotation_speed;
		} else if controls.right {
			player.heading -= params.rotation_speed;
		}

		let step = player.direction() * player.speed;
		player.position += step;

		self.collide(tree)
	}

	fn collide(&mut self, tree: &KnowledgeTree) -> Option<RaceEvent> {
		let position = self.player.as_ref()?.position;
		let (hit, _) = tree.nodes().find(|(idx, node)| {
			Some(*idx) != self.current
				&& node.position.distance(position) < self.params.collision_radius
		})?;

		if Some(hit) == self.target {
			self.score += self.params.target_reward;
			self.arrive(tree, hit);
			info!("Reached target {} (score {})", tree.node(hit).name, self.score);
			self.pick_target(tree);
			Some(RaceEvent::ReachedTarget(hit))
		} else if self.path.contains(&hit) {
			self.score += self.params.waypoint_reward;
			self.arrive(tree, hit);
			debug!("Passed waypoint {}", tree.node(hit).name);
			self.route(tree);
			Some(RaceEvent::ReachedWaypoint(hit))
		} else {
			None
		}
	}

	fn arrive(&mut self, tree: &KnowledgeTree, idx: NodeIdx) {
		if tree.node(idx).kind == NodeKind::Problem {
			self.visited.insert(idx);
		}
		self.current = Some(idx);
	}

	/// Teleports to the next topic on the route at the cost of a few points.
	/// Returns false when the route has no topic ahead.
	pub fn jump_to_next_topic(&mut self, tree: &KnowledgeTree) -> bool {
		if self.player.is_none() || self.target.is_none() || self.path.len() <= 1 {
			return false;
		}
		let Some(&topic) = self.path[1..]
			.iter()
			.find(|&&idx| tree.node(idx).kind == NodeKind::Topic)
		else {
			return false;
		};

		if let Some(player) = self.player.as_mut() {
			player.position = tree.node(topic).position;
		}
		self.current = Some(topic);
		self.route(tree);
		self.score = self.score.saturating_sub(self.params.jump_penalty);
		debug!("Jumped to {}", tree.node(topic).name);
		true
	}

	fn pick_target(&mut self, tree: &KnowledgeTree) {
		let candidates: Vec<NodeIdx> = tree
			.problems()
			.into_iter()
			.filter(|&idx| Some(idx) != self.current)
			.collect();
		self.target = if candidates.is_empty() {
			None
		} else {
			Some(candidates[self.rng.gen_range(0..candidates.len())])
		};
		self.route(tree);
	}

	fn route(&mut self, tree: &KnowledgeTree) {
		self.path.clear();
		let (Some(current), Some(target)) = (self.current, self.target) else {
			return;
		};
		match shortest_path(tree, current, target) {
			Some(path) => self.path = path,
			None => warn!(
				"{} is unreachable from {}",
				tree.node(target).name,
				tree.node(current).name
			),
		}
	}

	/// Snapshot for the info panel.
	pub fn stats(&self, tree: &KnowledgeTree) -> RaceStats {
		let name = |idx: Option<NodeIdx>| idx.map(|i| tree.node(i).name.clone());
		RaceStats {
			score: self.score,
			visited: self.visited.len(),
			total: tree.problems().len(),
			current: name(self.current),
			target: name(self.target),
			started: self.started(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tree::{LayoutParameters, TreeSnapshot, build_tree};

	fn two_topics() -> KnowledgeTree {
		let snapshot = TreeSnapshot::from_json(
			r#"{"units": [{"unit_id": "u1", "unit_number": 1, "unit_name": "Exploring Data", "topics": [
				{"topic_id": "t1", "topic_number": "1.1", "topic_name": "A",
				 "problems": [{"problem_id": "p1", "display_name": "P1", "filename": "p1.png"}]},
				{"topic_id": "t2", "topic_number": "1.2", "topic_name": "B",
				 "problems": [{"problem_id": "p2", "display_name": "P2", "filename": "p2.png"}]}]}]}"#,
		)
		.unwrap();
		build_tree(&snapshot, &LayoutParameters::default()).unwrap()
	}

	fn idx(tree: &KnowledgeTree, kind: NodeKind, id: &str) -> NodeIdx {
		tree.find(kind, id).unwrap()
	}

	fn started_race(tree: &KnowledgeTree) -> Race {
		let mut race = Race::new(RaceParameters::default(), 1);
		race.select_start(tree, idx(tree, NodeKind::Problem, "p1")).unwrap();
		race.start(tree).unwrap();
		race
	}

	#[test]
	fn start_requires_a_problem() {
		let tree = two_topics();
		let mut race = Race::new(RaceParameters::default(), 1);
		assert_eq!(race.start(&tree), Err(RaceError::NoStart));
		assert_eq!(
			race.select_start(&tree, idx(&tree, NodeKind::Topic, "t1")),
			Err(RaceError::NotAProblem)
		);
		assert!(!race.started());
	}

	#[test]
	fn selecting_a_start_routes_to_the_other_problem() {
		let tree = two_topics();
		let mut race = Race::new(RaceParameters::default(), 1);
		race.select_start(&tree, idx(&tree, NodeKind::Problem, "p1")).unwrap();

		let expected: Vec<NodeIdx> = [
			(NodeKind::Problem, "p1"),
			(NodeKind::Topic, "t1"),
			(NodeKind::Unit, "u1"),
			(NodeKind::Topic, "t2"),
			(NodeKind::Problem, "p2"),
		]
		.iter()
		.map(|&(kind, id)| idx(&tree, kind, id))
		.collect();
		assert_eq!(race.target(), Some(idx(&tree, NodeKind::Problem, "p2")));
		assert_eq!(race.path(), expected.as_slice());
	}

	#[test]
	fn player_spawns_above_the_start() {
		let tree = two_topics();
		let race = started_race(&tree);
		let p1 = tree.node(idx(&tree, NodeKind::Problem, "p1")).position;
		assert_eq!(race.player().unwrap().position, p1 + Vec3::new(0.0, 5.0, 0.0));
	}

	#[test]
	fn reaching_the_target_scores_and_retargets() {
		let tree = two_topics();
		let mut race = started_race(&tree);
		let p1 = idx(&tree, NodeKind::Problem, "p1");
		let p2 = idx(&tree, NodeKind::Problem, "p2");

		race.player_mut().unwrap().position = tree.node(p2).position;
		assert_eq!(
			race.tick(&tree, Controls::default()),
			Some(RaceEvent::ReachedTarget(p2))
		);
		assert_eq!(race.score(), 100);
		assert_eq!(race.current(), Some(p2));
		assert_eq!(race.target(), Some(p1));

		let stats = race.stats(&tree);
		assert_eq!((stats.visited, stats.total), (1, 2));
		assert_eq!(stats.current.as_deref(), Some("P2"));
		assert_eq!(stats.target.as_deref(), Some("P1"));
	}

	#[test]
	fn waypoints_on_the_route_score_and_reroute() {
		let tree = two_topics();
		let mut race = started_race(&tree);
		let t1 = idx(&tree, NodeKind::Topic, "t1");

		race.player_mut().unwrap().position = tree.node(t1).position;
		assert_eq!(
			race.tick(&tree, Controls::default()),
			Some(RaceEvent::ReachedWaypoint(t1))
		);
		assert_eq!(race.score(), 10);
		assert_eq!(race.path().first(), Some(&t1));
		assert_eq!(race.path().len(), 4);
		assert_eq!(race.stats(&tree).visited, 0);
	}

	#[test]
	fn resting_on_the_current_node_scores_nothing() {
		let tree = two_topics();
		let mut race = started_race(&tree);
		for _ in 0..10 {
			assert_eq!(race.tick(&tree, Controls::default()), None);
		}
		assert_eq!(race.score(), 0);
	}

	#[test]
	fn topic_jump_costs_points_but_never_goes_negative() {
		let tree = two_topics();
		let mut race = started_race(&tree);
		let t1 = idx(&tree, NodeKind::Topic, "t1");
		let t2 = idx(&tree, NodeKind::Topic, "t2");

		assert!(race.jump_to_next_topic(&tree));
		assert_eq!(race.current(), Some(t1));
		assert_eq!(race.score(), 0);
		assert_eq!(race.player().unwrap().position, tree.node(t1).position);

		race.player_mut().unwrap().position = tree.node(idx(&tree, NodeKind::Unit, "u1")).position;
		race.tick(&tree, Controls::default());
		assert_eq!(race.score(), 10);

		assert!(race.jump_to_next_topic(&tree));
		assert_eq!(race.current(), Some(t2));
		assert_eq!(race.score(), 5);
	}

	#[test]
	fn throttle_is_capped_and_decays() {
		let tree = two_topics();
		let mut race = started_race(&tree);
		let forward = Controls::from_keys(["KeyW"]);
		for _ in 0..100 {
			race.tick(&tree, forward);
		}
		assert_eq!(race.player().unwrap().speed, 2.0);

		let reverse = Controls::from_keys(["ArrowDown"]);
		for _ in 0..200 {
			race.tick(&tree, reverse);
		}
		assert_eq!(race.player().unwrap().speed, -1.0);

		for _ in 0..100 {
			race.tick(&tree, Controls::default());
		}
		assert_eq!(race.player().unwrap().speed, 0.0);
	}

	#[test]
	fn keys_map_to_controls() {
		let controls = Controls::from_keys(["ArrowLeft", "KeyD", "Space"]);
		assert_eq!(
			controls,
			Controls {
				accelerate: false,
				brake: false,
				left: true,
				right: true,
			}
		);
	}
}
