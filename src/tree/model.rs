//! Arena-backed registry of tree nodes and the springs between them.
//!
//! Nodes are addressed by [`NodeIdx`], a stable index into the arena. A node
//! shared by several parents (a problem listed under more than one topic) is
//! stored once and referenced by index from each parent's adjacency list, so
//! there is never a question of which parent owns it.

use std::collections::HashMap;

use glam::Vec3;

/// Mass every node is created with.
pub const NODE_MASS: f32 = 1.0;

/// Stable handle to a node inside a [`KnowledgeTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(usize);

impl NodeIdx {
	/// Position of the node in the arena.
	pub fn index(self) -> usize {
		self.0
	}
}

/// Stable handle to an edge inside a [`KnowledgeTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeIdx(usize);

impl EdgeIdx {
	/// Position of the edge in the arena.
	pub fn index(self) -> usize {
		self.0
	}
}

/// Layer a node belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
	/// The single curriculum root.
	Root,
	/// A unit of the curriculum.
	Unit,
	/// A topic inside a unit.
	Topic,
	/// A problem, attached to zero or more topics.
	Problem,
}

impl NodeKind {
	/// Depth of the layer, root being 0.
	pub fn depth(self) -> u8 {
		match self {
			NodeKind::Root => 0,
			NodeKind::Unit => 1,
			NodeKind::Topic => 2,
			NodeKind::Problem => 3,
		}
	}
}

/// Whether an edge comes from the tree structure or was synthesized between
/// topics that share a problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
	/// Parent to child link.
	Branch,
	/// Topic to topic link through a shared problem.
	TopicLink,
}

/// Plain simulation entity. Rendering mirrors `position` every frame and
/// owns nothing here.
#[derive(Clone, Debug)]
pub struct Node {
	/// Identifier from the snapshot, unique within its kind.
	pub id: String,
	/// Display name, also used as tooltip text.
	pub name: String,
	/// Layer of the tree.
	pub kind: NodeKind,
	/// Has at least one descendant problem.
	pub active: bool,
	/// Image file for problem nodes.
	pub filename: Option<String>,
	/// Problem without a topic; carries no edges and only jitters.
	pub uncategorized: bool,
	/// World-space position.
	pub position: Vec3,
	/// World units per second.
	pub velocity: Vec3,
	/// Divides the net force in the integration step.
	pub mass: f32,
	/// Position is driven by the pointer rather than the simulation.
	pub dragging: bool,
	/// Parents in the order they were linked; several for a shared problem.
	pub parents: Vec<NodeIdx>,
	/// Edges that end at this node.
	pub incoming: Vec<EdgeIdx>,
}

impl Node {
	/// A node at rest at `position`.
	pub fn new(kind: NodeKind, id: impl Into<String>, name: impl Into<String>, position: Vec3) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			kind,
			active: false,
			filename: None,
			uncategorized: false,
			position,
			velocity: Vec3::ZERO,
			mass: NODE_MASS,
			dragging: false,
			parents: Vec::new(),
			incoming: Vec::new(),
		}
	}

	/// Kinetic energy, ½·m·|v|².
	pub fn kinetic_energy(&self) -> f32 {
		0.5 * self.mass * self.velocity.length_squared()
	}
}

/// A spring between two nodes.
#[derive(Clone, Debug)]
pub struct Edge {
	/// Parent end, or the first topic of a topic link.
	pub source: NodeIdx,
	/// Child end.
	pub target: NodeIdx,
	/// Branch or topic link.
	pub kind: EdgeKind,
	/// Drawn highlighted; the child end has problems below it.
	pub active: bool,
	rest_length: f32,
}

impl Edge {
	/// Endpoint separation at creation time.
	pub fn rest_length(&self) -> f32 {
		self.rest_length
	}
}

/// The simulation context: every node, every edge, and the undirected
/// adjacency used for routing.
#[derive(Clone, Debug, Default)]
pub struct KnowledgeTree {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	index: HashMap<(NodeKind, String), NodeIdx>,
	adjacency: Vec<Vec<NodeIdx>>,
	root: Option<NodeIdx>,
}

impl KnowledgeTree {
	pub(crate) fn add_node(&mut self, node: Node) -> NodeIdx {
		let idx = NodeIdx(self.nodes.len());
		if node.kind == NodeKind::Root {
			self.root = Some(idx);
		}
		self.index.insert((node.kind, node.id.clone()), idx);
		self.nodes.push(node);
		self.adjacency.push(Vec::new());
		idx
	}

	/// Adds a spring whose rest length is the current endpoint distance.
	pub(crate) fn add_edge(
		&mut self,
		source: NodeIdx,
		target: NodeIdx,
		kind: EdgeKind,
		active: bool,
	) -> EdgeIdx {
		let idx = EdgeIdx(self.edges.len());
		let rest_length = self.nodes[source.0]
			.position
			.distance(self.nodes[target.0].position);
		self.edges.push(Edge {
			source,
			target,
			kind,
			active,
			rest_length,
		});
		self.nodes[target.0].incoming.push(idx);
		self.link(source, target);
		idx
	}

	fn link(&mut self, a: NodeIdx, b: NodeIdx) {
		if !self.adjacency[a.0].contains(&b) {
			self.adjacency[a.0].push(b);
		}
		if !self.adjacency[b.0].contains(&a) {
			self.adjacency[b.0].push(a);
		}
	}

	/// The curriculum root, absent on an empty tree.
	pub fn root(&self) -> Option<NodeIdx> {
		self.root
	}

	/// Number of nodes, loose problems included.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Whether the tree holds no nodes at all.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Looks a node up by its snapshot identifier.
	pub fn find(&self, kind: NodeKind, id: &str) -> Option<NodeIdx> {
		self.index.get(&(kind, id.to_owned())).copied()
	}

	/// Panics on an index from another tree.
	pub fn node(&self, idx: NodeIdx) -> &Node {
		&self.nodes[idx.0]
	}

	/// Mutable access to a node.
	pub fn node_mut(&mut self, idx: NodeIdx) -> &mut Node {
		&mut self.nodes[idx.0]
	}

	/// Every node with its index, in insertion order.
	pub fn nodes(&self) -> impl Iterator<Item = (NodeIdx, &Node)> + '_ {
		self.nodes.iter().enumerate().map(|(i, n)| (NodeIdx(i), n))
	}

	pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
		&mut self.nodes
	}

	/// Every edge, in insertion order.
	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	/// Edge behind an index.
	pub fn edge(&self, idx: EdgeIdx) -> &Edge {
		&self.edges[idx.0]
	}

	/// Neighbors in insertion order: tree links first, topic links last.
	pub fn neighbors(&self, idx: NodeIdx) -> &[NodeIdx] {
		&self.adjacency[idx.0]
	}

	/// Whether any edge joins `a` and `b`, in either direction.
	pub fn are_adjacent(&self, a: NodeIdx, b: NodeIdx) -> bool {
		self.adjacency[a.0].contains(&b)
	}

	/// Nodes that belong to the rooted tree.
	pub fn structural_node_count(&self) -> usize {
		self.nodes.iter().filter(|n| !n.uncategorized).count()
	}

	/// Loose problems outside the rooted tree.
	pub fn unrooted_node_count(&self) -> usize {
		self.nodes.iter().filter(|n| n.uncategorized).count()
	}

	/// Parent to child edges, excluding synthesized topic links.
	pub fn structural_edge_count(&self) -> usize {
		self.edges
			.iter()
			.filter(|e| e.kind == EdgeKind::Branch)
			.count()
	}

	/// Every problem node, categorized or not.
	pub fn problems(&self) -> Vec<NodeIdx> {
		self.nodes()
			.filter(|(_, n)| n.kind == NodeKind::Problem)
			.map(|(idx, _)| idx)
			.collect()
	}

	/// Current endpoint positions for every edge.
	pub fn edge_segments(&self) -> impl Iterator<Item = (&Edge, Vec3, Vec3)> + '_ {
		self.edges.iter().map(|e| {
			(
				e,
				self.nodes[e.source.0].position,
				self.nodes[e.target.0].position,
			)
		})
	}

	/// Hands the node over to the pointer; the simulation stops moving it.
	pub fn begin_drag(&mut self, idx: NodeIdx) {
		self.nodes[idx.0].dragging = true;
	}

	/// Moves a dragged node. Ignored when the node is not being dragged.
	pub fn drag_to(&mut self, idx: NodeIdx, position: Vec3) {
		let node = &mut self.nodes[idx.0];
		if node.dragging {
			node.position = position;
		}
	}

	/// Releases a dragged node. Velocity is zeroed so it does not fly off.
	pub fn end_drag(&mut self, idx: NodeIdx) {
		let node = &mut self.nodes[idx.0];
		node.dragging = false;
		node.velocity = Vec3::ZERO;
	}

	/// Total kinetic energy of all nodes.
	pub fn kinetic_energy(&self) -> f32 {
		self.nodes.iter().map(Node::kinetic_energy).sum()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn pair(distance: f32) -> (KnowledgeTree, NodeIdx, NodeIdx) {
		let mut tree = KnowledgeTree::default();
		let a = tree.add_node(Node::new(NodeKind::Root, "root", "Root", Vec3::ZERO));
		let b = tree.add_node(Node::new(
			NodeKind::Unit,
			"1",
			"Unit 1",
			Vec3::new(distance, 0.0, 0.0),
		));
		(tree, a, b)
	}

	#[test]
	fn rest_length_is_fixed_at_creation() {
		let (mut tree, a, b) = pair(30.0);
		let edge = tree.add_edge(a, b, EdgeKind::Branch, true);
		tree.node_mut(b).position = Vec3::new(90.0, 0.0, 0.0);
		assert_eq!(tree.edge(edge).rest_length(), 30.0);
		assert_eq!(tree.node(b).incoming, vec![edge]);
	}

	#[test]
	fn adjacency_is_undirected_and_deduplicated() {
		let (mut tree, a, b) = pair(10.0);
		tree.add_edge(a, b, EdgeKind::Branch, true);
		tree.add_edge(b, a, EdgeKind::TopicLink, true);
		assert_eq!(tree.neighbors(a), &[b]);
		assert_eq!(tree.neighbors(b), &[a]);
	}

	#[test]
	fn ids_are_scoped_by_kind() {
		let mut tree = KnowledgeTree::default();
		let unit = tree.add_node(Node::new(NodeKind::Unit, "1", "Unit 1", Vec3::ZERO));
		let topic = tree.add_node(Node::new(NodeKind::Topic, "1", "1.1 Topic", Vec3::ZERO));
		assert_eq!(tree.find(NodeKind::Unit, "1"), Some(unit));
		assert_eq!(tree.find(NodeKind::Topic, "1"), Some(topic));
		assert_eq!(tree.find(NodeKind::Problem, "1"), None);
	}

	#[test]
	fn drag_only_moves_dragged_nodes_and_release_stops_them() {
		let (mut tree, _, b) = pair(10.0);
		tree.drag_to(b, Vec3::ONE);
		assert_eq!(tree.node(b).position, Vec3::new(10.0, 0.0, 0.0));

		tree.begin_drag(b);
		tree.node_mut(b).velocity = Vec3::new(3.0, 4.0, 0.0);
		tree.drag_to(b, Vec3::ONE);
		assert_eq!(tree.node(b).position, Vec3::ONE);

		tree.end_drag(b);
		assert!(!tree.node(b).dragging);
		assert_eq!(tree.node(b).velocity, Vec3::ZERO);
	}

	#[test]
	fn kinetic_energy_sums_over_nodes() {
		let (mut tree, a, b) = pair(10.0);
		tree.node_mut(a).velocity = Vec3::new(2.0, 0.0, 0.0);
		tree.node_mut(b).velocity = Vec3::new(0.0, 0.0, 1.0);
		assert_eq!(tree.kinetic_energy(), 2.5);
	}
}
