//! Single build pass from a snapshot to a laid-out [`KnowledgeTree`].

use glam::Vec3;
use log::{debug, info, warn};

use super::error::TreeError;
use super::layout::LayoutParameters;
use super::model::{EdgeKind, KnowledgeTree, Node, NodeIdx, NodeKind};
use super::snapshot::{ProblemRecord, TreeSnapshot};

/// Snapshot id given to the synthesized root.
pub const ROOT_ID: &str = "root";
/// Label of the root node.
pub const ROOT_NAME: &str = "AP Statistics";

/// Builds the tree, places every node, and wires springs and topic links.
pub fn build_tree(
	snapshot: &TreeSnapshot,
	params: &LayoutParameters,
) -> Result<KnowledgeTree, TreeError> {
	let units = match snapshot.units.as_deref() {
		Some(units) if !units.is_empty() => units,
		_ => {
			warn!("Tree snapshot has no units, leaving the tree empty");
			return Err(TreeError::NoUnits);
		}
	};

	let mut tree = KnowledgeTree::default();
	let mut branches: Vec<(NodeIdx, NodeIdx)> = Vec::new();
	let mut shared: Vec<NodeIdx> = Vec::new();

	let root = tree.add_node(Node::new(NodeKind::Root, ROOT_ID, ROOT_NAME, Vec3::ZERO));

	for (i, unit) in units.iter().enumerate() {
		let position = child_slot(params, Vec3::ZERO, i, units.len(), NodeKind::Unit);
		let mut node = Node::new(
			NodeKind::Unit,
			unit.unit_id.as_str(),
			format!("Unit {}: {}", unit.unit_number, unit.unit_name),
			position,
		);
		node.active = unit.has_problems;
		node.parents.push(root);
		let unit_idx = tree.add_node(node);
		branches.push((root, unit_idx));

		for (j, topic) in unit.topics.iter().enumerate() {
			let position = child_slot(params, position, j, unit.topics.len(), NodeKind::Topic);
			let mut node = Node::new(
				NodeKind::Topic,
				topic.topic_id.as_str(),
				format!("{} {}", topic.topic_number, topic.topic_name),
				position,
			);
			node.active = topic.has_problems;
			node.parents.push(unit_idx);
			let topic_idx = tree.add_node(node);
			branches.push((unit_idx, topic_idx));

			for (k, problem) in topic.problems.iter().enumerate() {
				let slot = child_slot(params, position, k, topic.problems.len(), NodeKind::Problem);
				let problem_idx = match tree.find(NodeKind::Problem, &problem.problem_id) {
					Some(existing) => existing,
					None => tree.add_node(problem_node(problem, slot)),
				};
				let parents = &mut tree.node_mut(problem_idx).parents;
				if parents.contains(&topic_idx) {
					debug!(
						"Problem {} listed twice under topic {}",
						problem.problem_id, topic.topic_id
					);
					continue;
				}
				parents.push(topic_idx);
				if parents.len() == 2 {
					shared.push(problem_idx);
				}
				branches.push((topic_idx, problem_idx));
			}
		}
	}

	for &idx in &shared {
		let parents = tree.node(idx).parents.clone();
		let centroid = parents
			.iter()
			.map(|&p| tree.node(p).position)
			.sum::<Vec3>()
			/ parents.len() as f32;
		tree.node_mut(idx).position = centroid + layer_step(params);
	}

	propagate_activity(&mut tree);

	for (source, target) in branches {
		let active = tree.node(target).active;
		tree.add_edge(source, target, EdgeKind::Branch, active);
	}

	place_uncategorized(&mut tree, &snapshot.uncategorized_problems, params);
	let links = synthesize_topic_links(&mut tree);

	info!(
		"Built knowledge tree: {} nodes ({} unrooted), {} branches, {} topic links",
		tree.len(),
		tree.unrooted_node_count(),
		tree.structural_edge_count(),
		links
	);
	Ok(tree)
}

/// Evenly spaced slot centered on the parent's X, one layer further down.
fn child_slot(
	params: &LayoutParameters,
	parent: Vec3,
	index: usize,
	count: usize,
	kind: NodeKind,
) -> Vec3 {
	let offset = (index as f32 - (count as f32 - 1.0) / 2.0) * params.sibling_spread;
	let depth = kind.depth() as f32;
	Vec3::new(
		parent.x + offset,
		-params.level_height * depth,
		-params.layer_depth * depth,
	)
}

fn layer_step(params: &LayoutParameters) -> Vec3 {
	Vec3::new(0.0, -params.level_height, -params.layer_depth)
}

fn problem_node(problem: &ProblemRecord, position: Vec3) -> Node {
	let mut node = Node::new(
		NodeKind::Problem,
		problem.problem_id.as_str(),
		problem.display_name.as_str(),
		position,
	);
	node.active = true;
	node.filename = Some(problem.filename.clone()).filter(|f| !f.is_empty());
	node
}

/// Marks every ancestor of a problem as active.
fn propagate_activity(tree: &mut KnowledgeTree) {
	for kind in [NodeKind::Problem, NodeKind::Topic, NodeKind::Unit] {
		let parents: Vec<NodeIdx> = tree
			.nodes()
			.filter(|(_, n)| n.kind == kind && n.active)
			.flat_map(|(_, n)| n.parents.iter().copied())
			.collect();
		for idx in parents {
			tree.node_mut(idx).active = true;
		}
	}
}

/// Lays unrooted problems out in a row to the right of the tree.
fn place_uncategorized(
	tree: &mut KnowledgeTree,
	problems: &[ProblemRecord],
	params: &LayoutParameters,
) {
	let right_edge = tree
		.nodes()
		.map(|(_, n)| n.position.x)
		.fold(0.0_f32, f32::max);
	let depth = NodeKind::Problem.depth() as f32;

	let mut column = 0;
	for problem in problems {
		if tree.find(NodeKind::Problem, &problem.problem_id).is_some() {
			debug!(
				"Uncategorized problem {} also appears under a topic",
				problem.problem_id
			);
			continue;
		}
		column += 1;
		let position = Vec3::new(
			right_edge + params.sibling_spread * column as f32,
			-params.level_height * depth,
			-params.layer_depth * depth,
		);
		let mut node = problem_node(problem, position);
		node.uncategorized = true;
		tree.add_node(node);
	}
}

/// Links every pair of topics that share a problem. Returns how many links
/// were added.
pub(crate) fn synthesize_topic_links(tree: &mut KnowledgeTree) -> usize {
	let mut pairs = Vec::new();
	for (_, node) in tree.nodes() {
		if node.kind != NodeKind::Problem || node.parents.len() < 2 {
			continue;
		}
		for (i, &a) in node.parents.iter().enumerate() {
			for &b in &node.parents[i + 1..] {
				pairs.push((a, b));
			}
		}
	}

	let mut added = 0;
	for (a, b) in pairs {
		if !tree.are_adjacent(a, b) {
			tree.add_edge(a, b, EdgeKind::TopicLink, true);
			added += 1;
		}
	}
	added
}
