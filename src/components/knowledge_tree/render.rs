use std::collections::HashMap;
use std::f64::consts::PI;

use glam::Vec3;
use log::warn;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use super::state::{NODE_SIZE, TreeViewState, node_radius};
use super::types::{ACTIVE_COLOR, INACTIVE_COLOR, PATH_COLOR, PLAYER_COLOR};
use crate::config::image_url;
use crate::tree::{KnowledgeTree, NodeIdx, NodeKind};

const BACKGROUND: &str = "#000033";
const GRID_COLOR: &str = "rgba(68, 68, 68, 0.35)";

/// Problem images, drawn once loaded. A node whose image is missing, still
/// loading, or failed gets a solid placeholder instead.
#[derive(Default)]
pub struct ProblemImages {
	images: HashMap<NodeIdx, HtmlImageElement>,
}

impl ProblemImages {
	pub fn load(tree: &KnowledgeTree) -> Self {
		let mut images = HashMap::new();
		for idx in tree.problems() {
			let Some(filename) = tree.node(idx).filename.as_deref() else {
				continue;
			};
			match HtmlImageElement::new() {
				Ok(img) => {
					img.set_src(&image_url(filename));
					images.insert(idx, img);
				}
				Err(err) => warn!("Could not create image for {filename}: {err:?}"),
			}
		}
		Self { images }
	}

	fn ready(&self, idx: NodeIdx) -> Option<&HtmlImageElement> {
		self.images
			.get(&idx)
			.filter(|img| img.complete() && img.natural_width() > 0)
	}
}

pub fn render(state: &TreeViewState, images: &ProblemImages, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	draw_grid(state, ctx);
	draw_edges(state, ctx);
	draw_nodes(state, images, ctx);
	if state.racing() {
		draw_player(state, ctx);
	}
}

/// Floor grid a little below the problem layer, for depth cues.
fn draw_grid(state: &TreeViewState, ctx: &CanvasRenderingContext2d) {
	let floor = -(NODE_SIZE as f32) * 70.0;
	let (extent, step) = (1000.0_f32, 100.0_f32);
	ctx.set_stroke_style_str(GRID_COLOR);
	ctx.set_line_width(1.0);
	let mut offset = -extent;
	while offset <= extent {
		for (a, b) in [
			(Vec3::new(offset, floor, -extent), Vec3::new(offset, floor, extent)),
			(Vec3::new(-extent, floor, offset), Vec3::new(extent, floor, offset)),
		] {
			if let (Some(pa), Some(pb)) = (state.project(a), state.project(b)) {
				ctx.begin_path();
				ctx.move_to(pa.x, pa.y);
				ctx.line_to(pb.x, pb.y);
				ctx.stroke();
			}
		}
		offset += step;
	}
}

fn draw_edges(state: &TreeViewState, ctx: &CanvasRenderingContext2d) {
	for (edge, a, b) in state.tree.edge_segments() {
		let (Some(pa), Some(pb)) = (state.project(a), state.project(b)) else {
			continue;
		};
		let (color, width) = if state.on_route(edge.source, edge.target) {
			(PATH_COLOR, 3.0)
		} else if edge.active {
			(ACTIVE_COLOR, 2.0)
		} else {
			(INACTIVE_COLOR, 1.0)
		};
		ctx.set_stroke_style_str(color);
		ctx.set_line_width(width);
		ctx.begin_path();
		ctx.move_to(pa.x, pa.y);
		ctx.line_to(pb.x, pb.y);
		ctx.stroke();
	}
}

fn draw_nodes(state: &TreeViewState, images: &ProblemImages, ctx: &CanvasRenderingContext2d) {
	// Painter's order: far nodes first.
	let mut visible: Vec<_> = state
		.tree
		.nodes()
		.filter_map(|(idx, node)| state.project(node.position).map(|p| (idx, node, p)))
		.collect();
	visible.sort_by(|a, b| b.2.depth.total_cmp(&a.2.depth));

	for (idx, node, p) in visible {
		let color = state.node_color(idx);
		let radius = node_radius(node.kind) * p.scale;

		if node.kind == NodeKind::Problem {
			let (x, y, side) = (p.x - radius, p.y - radius, radius * 2.0);
			match images.ready(idx) {
				Some(img) => {
					let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(img, x, y, side, side);
					if color != ACTIVE_COLOR {
						ctx.set_stroke_style_str(color);
						ctx.set_line_width(2.0);
						ctx.stroke_rect(x, y, side, side);
					}
				}
				None => {
					ctx.set_fill_style_str(color);
					ctx.fill_rect(x, y, side, side);
				}
			}
		} else {
			ctx.begin_path();
			let _ = ctx.arc(p.x, p.y, radius.max(1.0), 0.0, 2.0 * PI);
			ctx.set_fill_style_str(color);
			ctx.fill();
		}

		if node.kind != NodeKind::Problem && p.scale > 0.6 {
			ctx.set_fill_style_str("rgba(255, 255, 255, 0.8)");
			ctx.set_font(&format!("{}px sans-serif", (10.0 * p.scale).clamp(8.0, 16.0)));
			let _ = ctx.fill_text(&node.name, p.x + radius + 3.0, p.y + 3.0);
		}
	}
}

/// Cone seen from behind: a triangle pointing along the heading.
fn draw_player(state: &TreeViewState, ctx: &CanvasRenderingContext2d) {
	let Some(player) = state.race.player() else {
		return;
	};
	let tip = player.position + player.direction() * 4.0;
	let tail = player.position - player.direction() * 4.0;
	let side = Vec3::new(player.direction().z, 0.0, -player.direction().x) * 2.0;
	let corners = [tip, tail + side, tail - side].map(|c| state.project(c));
	let [Some(a), Some(b), Some(c)] = corners else {
		return;
	};
	ctx.set_fill_style_str(PLAYER_COLOR);
	ctx.begin_path();
	ctx.move_to(a.x, a.y);
	ctx.line_to(b.x, b.y);
	ctx.line_to(c.x, c.y);
	ctx.close_path();
	ctx.fill();
}
