//! Startup fetch of the tree snapshot.

use gloo_net::http::Request;
use log::{error, info};
use thiserror::Error;

use crate::tree::{KnowledgeTree, LayoutParameters, TreeError, TreeSnapshot, build_tree};

/// Why the tree could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
	/// The request never produced a response.
	#[error("request failed: {0}")]
	Network(String),
	/// The server answered with a non-success status.
	#[error("server answered {status} {status_text}")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Reason phrase.
		status_text: String,
	},
	/// The body was not a tree snapshot.
	#[error("malformed tree data: {0}")]
	Decode(#[from] serde_json::Error),
	/// The snapshot decoded but could not be built.
	#[error(transparent)]
	Tree(#[from] TreeError),
}

impl From<gloo_net::Error> for LoadError {
	fn from(err: gloo_net::Error) -> Self {
		LoadError::Network(err.to_string())
	}
}

/// Fetches and builds the tree. No timeout or cancellation.
pub async fn load_tree(endpoint: &str, params: &LayoutParameters) -> Result<KnowledgeTree, LoadError> {
	info!("Fetching knowledge tree from {endpoint}");
	let response = Request::get(endpoint).send().await?;
	if !response.ok() {
		return Err(LoadError::Status {
			status: response.status(),
			status_text: response.status_text(),
		});
	}
	let text = response.text().await?;
	tree_from_json(&text, params)
}

/// Decodes a snapshot and builds the tree from it.
pub fn tree_from_json(text: &str, params: &LayoutParameters) -> Result<KnowledgeTree, LoadError> {
	let snapshot = TreeSnapshot::from_json(text)?;
	Ok(build_tree(&snapshot, params)?)
}

/// What the scene shows once loading settles: a tree, or an empty scene and
/// a notice explaining why.
#[derive(Debug)]
pub struct LoadedScene {
	/// Empty when loading failed.
	pub tree: KnowledgeTree,
	/// Message for the user, if any.
	pub notice: Option<String>,
}

impl From<Result<KnowledgeTree, LoadError>> for LoadedScene {
	fn from(result: Result<KnowledgeTree, LoadError>) -> Self {
		match result {
			Ok(tree) => Self { tree, notice: None },
			Err(err) => {
				error!("Error loading knowledge tree data: {err}");
				Self {
					tree: KnowledgeTree::default(),
					notice: Some(format!("Could not load the knowledge tree ({err}).")),
				}
			}
		}
	}
}
