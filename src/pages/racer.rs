use leptos::prelude::*;

use crate::components::knowledge_tree::{KnowledgeTreeCanvas, TreeMode};
use crate::config::TREE_DATA_ENDPOINT;

/// Racing game over the knowledge tree.
#[component]
pub fn Racer() -> impl IntoView {
	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"The racer crashed!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph" id="tree-container">
				<KnowledgeTreeCanvas endpoint=TREE_DATA_ENDPOINT mode=TreeMode::Racer fullscreen=true />
				<div class="graph-overlay">
					<p class="subtitle">
						"Click a problem to start from, then press Start Game and drive to the red target."
					</p>
					<a href="/">"Back to the knowledge tree"</a>
				</div>
			</div>
		</ErrorBoundary>
	}
}
