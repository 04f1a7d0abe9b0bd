//! Breadth-first routing over the tree's undirected adjacency.

use std::collections::VecDeque;

use super::model::{KnowledgeTree, NodeIdx};

/// Fewest-edge path from `start` to `target`, both included.
///
/// Routes over tree links and synthesized topic links alike. Among equally
/// short paths the first one discovered wins, which follows neighbor
/// insertion order; callers should not rely on which one that is. `None`
/// means the target cannot be reached from `start`.
pub fn shortest_path(tree: &KnowledgeTree, start: NodeIdx, target: NodeIdx) -> Option<Vec<NodeIdx>> {
	let mut previous: Vec<Option<NodeIdx>> = vec![None; tree.len()];
	let mut visited = vec![false; tree.len()];
	let mut queue = VecDeque::from([start]);
	visited[start.index()] = true;

	while let Some(node) = queue.pop_front() {
		if node == target {
			let mut path = vec![node];
			let mut cursor = node;
			while let Some(prev) = previous[cursor.index()] {
				path.push(prev);
				cursor = prev;
			}
			path.reverse();
			return Some(path);
		}
		for &next in tree.neighbors(node) {
			if !visited[next.index()] {
				visited[next.index()] = true;
				previous[next.index()] = Some(node);
				queue.push_back(next);
			}
		}
	}
	None
}

#[cfg(test)]
mod tests {
	use glam::Vec3;

	use super::*;
	use crate::tree::model::{EdgeKind, Node, NodeKind};

	/// Builds an arbitrary undirected graph on `n` nodes.
	fn graph(n: usize, links: &[(usize, usize)]) -> (KnowledgeTree, Vec<NodeIdx>) {
		let mut tree = KnowledgeTree::default();
		let nodes: Vec<NodeIdx> = (0..n)
			.map(|i| {
				tree.add_node(Node::new(
					NodeKind::Topic,
					i.to_string(),
					format!("T{i}"),
					Vec3::new(i as f32, 0.0, 0.0),
				))
			})
			.collect();
		for &(a, b) in links {
			tree.add_edge(nodes[a], nodes[b], EdgeKind::Branch, true);
		}
		(tree, nodes)
	}

	/// Floyd-Warshall distances in edge counts.
	fn all_pairs(n: usize, links: &[(usize, usize)]) -> Vec<Vec<Option<usize>>> {
		let mut dist = vec![vec![None; n]; n];
		for (i, row) in dist.iter_mut().enumerate() {
			row[i] = Some(0);
		}
		for &(a, b) in links {
			dist[a][b] = Some(1);
			dist[b][a] = Some(1);
		}
		for k in 0..n {
			for i in 0..n {
				for j in 0..n {
					if let (Some(ik), Some(kj)) = (dist[i][k], dist[k][j]) {
						if dist[i][j].is_none_or(|ij| ik + kj < ij) {
							dist[i][j] = Some(ik + kj);
						}
					}
				}
			}
		}
		dist
	}

	#[test]
	fn path_to_self_has_no_edges() {
		let (tree, nodes) = graph(3, &[(0, 1), (1, 2)]);
		for &n in &nodes {
			assert_eq!(shortest_path(&tree, n, n), Some(vec![n]));
		}
	}

	#[test]
	fn unreachable_target_yields_none() {
		let (tree, nodes) = graph(4, &[(0, 1), (2, 3)]);
		assert_eq!(shortest_path(&tree, nodes[0], nodes[3]), None);
	}

	#[test]
	fn paths_are_minimal_on_fixture_graphs() {
		let fixtures: &[(usize, &[(usize, usize)])] = &[
			(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (0, 5)]),
			(7, &[(0, 1), (0, 2), (1, 3), (1, 4), (2, 5), (2, 6), (4, 5)]),
			(6, &[(0, 1), (1, 2), (0, 3), (3, 4), (4, 2), (2, 5), (5, 0)]),
			(5, &[(0, 1), (1, 2), (3, 4)]),
		];
		for &(n, links) in fixtures {
			let (tree, nodes) = graph(n, links);
			let expected = all_pairs(n, links);
			for i in 0..n {
				for j in 0..n {
					let path = shortest_path(&tree, nodes[i], nodes[j]);
					match expected[i][j] {
						None => assert!(path.is_none()),
						Some(len) => {
							let path = path.unwrap();
							assert_eq!(path.len() - 1, len, "{i} -> {j}");
							assert_eq!(path.first(), Some(&nodes[i]));
							assert_eq!(path.last(), Some(&nodes[j]));
							for w in path.windows(2) {
								assert!(tree.are_adjacent(w[0], w[1]));
							}
						}
					}
				}
			}
		}
	}
}
