/// Which variant of the tree view a canvas runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TreeMode {
	/// Hover for details, click to open a topic or problem.
	#[default]
	Explore,
	/// Click a problem to start from, then drive to the highlighted target.
	Racer,
}

/// Text shown next to the pointer while hovering a node.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
	pub text: String,
	pub x: f64,
	pub y: f64,
}

pub const ACTIVE_COLOR: &str = "#00aa00";
pub const INACTIVE_COLOR: &str = "#aaaaaa";
pub const HIGHLIGHT_COLOR: &str = "#ff9900";
pub const PLAYER_COLOR: &str = "#0066ff";
pub const TARGET_COLOR: &str = "#ff0000";
pub const PATH_COLOR: &str = "#ffcc00";
