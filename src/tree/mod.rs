//! Headless knowledge tree: data model, build pass, spring layout and routing.

mod builder;
mod error;
mod layout;
mod model;
mod path;
mod snapshot;

pub use builder::{ROOT_ID, ROOT_NAME, build_tree};
pub use error::TreeError;
pub use layout::{LayoutParameters, SpringLayout, spring_force};
pub use model::{Edge, EdgeIdx, EdgeKind, KnowledgeTree, NODE_MASS, Node, NodeIdx, NodeKind};
pub use path::shortest_path;
pub use snapshot::{ProblemRecord, TopicRecord, TreeSnapshot, UnitRecord};
