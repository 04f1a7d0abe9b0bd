use thiserror::Error;

/// Reasons a snapshot cannot be turned into a tree.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TreeError {
	/// The snapshot carried no `units`, or an empty list of them.
	#[error("tree snapshot contains no units")]
	NoUnits,
}
