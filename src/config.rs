//! Fixed endpoints and page routes. The viewer reads no environment.

use crate::tree::{Node, NodeKind};

/// Snapshot of units, topics and problems.
pub const TREE_DATA_ENDPOINT: &str = "/api/knowledge_tree_data";
/// Prefix problem image filenames are served under.
pub const IMAGE_PATH_PREFIX: &str = "/images/";

/// URL of a problem's image.
pub fn image_url(filename: &str) -> String {
	format!("{IMAGE_PATH_PREFIX}{filename}")
}

/// Page a click on `node` leads to, if any. Only topics that have problems
/// and problems with a file are clickable.
pub fn detail_page(node: &Node) -> Option<String> {
	match node.kind {
		NodeKind::Topic if node.active => Some(format!("/topic/{}", node.id)),
		NodeKind::Problem => node
			.filename
			.as_deref()
			.map(|filename| format!("/problem/{filename}")),
		_ => None,
	}
}
