mod camera;
mod component;
mod render;
mod state;
mod types;

pub use component::KnowledgeTreeCanvas;
pub use types::TreeMode;
