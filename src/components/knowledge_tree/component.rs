use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window,
};

use super::render::{self, ProblemImages};
use super::state::{ClickAction, TreeViewState};
use super::types::{Tooltip, TreeMode};
use crate::api::{LoadedScene, load_tree};
use crate::racer::RaceStats;
use crate::tree::{KnowledgeTree, LayoutParameters};

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;
type KeyCallback = Rc<RefCell<Option<Closure<dyn FnMut(KeyboardEvent)>>>>;

#[component]
pub fn KnowledgeTreeCanvas(
	#[prop(into)] endpoint: String,
	#[prop(default = TreeMode::Explore)] mode: TreeMode,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Rc<RefCell<Option<TreeViewState>>> = Rc::new(RefCell::new(None));
	let images: Rc<RefCell<ProblemImages>> = Rc::new(RefCell::new(ProblemImages::default()));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let resize_cb: FrameCallback = Rc::new(RefCell::new(None));
	let key_down: KeyCallback = Rc::new(RefCell::new(None));
	let key_up: KeyCallback = Rc::new(RefCell::new(None));
	let suppress_click = Rc::new(Cell::new(false));

	let tooltip = RwSignal::new(None::<Tooltip>);
	let notice = RwSignal::new(None::<String>);
	let stats = RwSignal::new(RaceStats::default());

	let (state_init, images_init, animate_init, resize_cb_init) =
		(state.clone(), images.clone(), animate.clone(), resize_cb.clone());
	let (key_down_init, key_up_init) = (key_down.clone(), key_up.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			error!("Canvas has no 2d context");
			return;
		};
		*state_init.borrow_mut() = Some(TreeViewState::new(KnowledgeTree::default(), mode, w, h));

		let (state_load, images_load, endpoint) =
			(state_init.clone(), images_init.clone(), endpoint.clone());
		wasm_bindgen_futures::spawn_local(async move {
			let result = load_tree(&endpoint, &LayoutParameters::default()).await;
			let scene = LoadedScene::from(result);
			notice.set(scene.notice);
			*images_load.borrow_mut() = ProblemImages::load(&scene.tree);
			if let Some(ref mut s) = *state_load.borrow_mut() {
				s.replace_tree(scene.tree);
				stats.set(s.race_stats());
			}
		});

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = window_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		if mode == TreeMode::Racer {
			let state_kd = state_init.clone();
			*key_down_init.borrow_mut() = Some(Closure::new(move |ev: KeyboardEvent| {
				if let Some(ref mut s) = *state_kd.borrow_mut() {
					s.key_down(&ev.code());
				}
			}));
			let state_ku = state_init.clone();
			*key_up_init.borrow_mut() = Some(Closure::new(move |ev: KeyboardEvent| {
				if let Some(ref mut s) = *state_ku.borrow_mut() {
					s.key_up(&ev.code());
				}
			}));
			for (event, cb) in [("keydown", &key_down_init), ("keyup", &key_up_init)] {
				if let Some(ref cb) = *cb.borrow() {
					let _ = window.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref());
				}
			}
		}

		let (state_anim, images_anim, animate_inner) =
			(state_init.clone(), images_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				if s.animation_running {
					s.tick(0.016);
				}
				render::render(s, &images_anim.borrow(), &ctx);
				if mode == TreeMode::Racer {
					let latest = s.race_stats();
					if stats.with_untracked(|current| *current != latest) {
						stats.set(latest);
					}
				}
			}
			if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.press(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.move_pointer(x, y);
			let next = s.tooltip();
			if tooltip.with_untracked(|current| *current != next) {
				tooltip.set(next);
			}
		}
	};

	let (state_mu, suppress_mu) = (state.clone(), suppress_click.clone());
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			suppress_mu.set(s.release());
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.leave();
		}
		tooltip.set(None);
	};

	let (state_cl, suppress_cl) = (state.clone(), suppress_click.clone());
	let on_click = move |ev: MouseEvent| {
		if suppress_cl.replace(false) {
			return;
		}
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		let action = match *state_cl.borrow_mut() {
			Some(ref mut s) => {
				let action = s.click(x, y);
				if let ClickAction::StartSelected(_) = action {
					stats.set(s.race_stats());
					notice.set(None);
				}
				action
			}
			None => ClickAction::Nothing,
		};
		if let ClickAction::Navigate(url) = action {
			navigate(&url);
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			if !s.racing() {
				s.camera.zoom(if ev.delta_y() > 0.0 { 1.1 } else { 0.9 });
			}
		}
	};

	let state_start = state.clone();
	let on_start = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_start.borrow_mut() {
			match s.race.start(&s.tree) {
				Ok(()) => {
					notice.set(None);
					stats.set(s.race_stats());
				}
				Err(err) => notice.set(Some(err.to_string())),
			}
		}
	};

	view! {
		<div class="knowledge-tree" style="position: relative;">
			<canvas
				node_ref=canvas_ref
				class="knowledge-tree-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:click=on_click
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			{move || {
				tooltip
					.get()
					.map(|t| {
						view! {
							<div
								class="tooltip"
								style=format!(
									"position: absolute; left: {}px; top: {}px; pointer-events: none;",
									t.x + 10.0,
									t.y + 10.0,
								)
							>
								{t.text}
							</div>
						}
					})
			}}
			{move || notice.get().map(|msg| view! { <div class="notice">{msg}</div> })}
			{(mode == TreeMode::Racer)
				.then(move || {
					view! {
						<div class="info-panel">
							<h3>"AP Stats Knowledge Racer"</h3>
							<p>"Score: " {move || stats.get().score}</p>
							<p>
								"Problems Visited: " {move || stats.get().visited} "/"
								{move || stats.get().total}
							</p>
							<p>
								"Current Node: "
								{move || stats.get().current.unwrap_or_else(|| "None".into())}
							</p>
							<p>
								"Target Node: "
								{move || stats.get().target.unwrap_or_else(|| "None".into())}
							</p>
							<div class="controls">
								<h4>"Controls:"</h4>
								<p>"W/Up Arrow: Accelerate"</p>
								<p>"S/Down Arrow: Brake/Reverse"</p>
								<p>"A/Left Arrow: Turn Left"</p>
								<p>"D/Right Arrow: Turn Right"</p>
								<p>"Space: Jump to Next Topic"</p>
							</div>
							<button on:click=on_start prop:disabled=move || stats.get().started>
								{move || {
									if stats.get().started { "Game Started!" } else { "Start Game" }
								}}
							</button>
						</div>
					}
				})}
		</div>
	}
}

fn window_size(window: &Window) -> (f64, f64) {
	(
		window
			.inner_width()
			.ok()
			.and_then(|v| v.as_f64())
			.unwrap_or(800.0),
		window
			.inner_height()
			.ok()
			.and_then(|v| v.as_f64())
			.unwrap_or(600.0),
	)
}

/// Pointer position relative to the canvas' top-left corner.
fn canvas_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn navigate(url: &str) {
	let Some(window) = web_sys::window() else {
		return;
	};
	if let Err(err) = window.location().set_href(url) {
		error!("Navigation to {url} failed: {err:?}");
	}
}
