use leptos::prelude::*;

use crate::components::knowledge_tree::KnowledgeTreeCanvas;
use crate::config::TREE_DATA_ENDPOINT;

/// Knowledge tree explorer.
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

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
				<KnowledgeTreeCanvas endpoint=TREE_DATA_ENDPOINT fullscreen=true />
				<div class="graph-overlay">
					<h1>"AP Statistics Knowledge Tree"</h1>
					<p class="subtitle">
						"Hover a node for details. Click a topic or problem to open it. Drag nodes to pull them around, drag the background to orbit, scroll to zoom."
					</p>
					<a href="/racer">"Play the Knowledge Racer"</a>
				</div>
			</div>
		</ErrorBoundary>
	}
}
