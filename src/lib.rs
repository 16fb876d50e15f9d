pub mod canvas;
pub mod config;
pub mod errors;
pub mod generate;
pub mod history;
pub mod layout;
pub mod model;
pub mod source;
pub mod store;
pub mod tree;

// Terminal viewer
pub mod actions;
pub mod app;
pub mod event;
pub mod ui;

// Re-export commonly used types
pub use crate::app::{AppMode, AppState};
pub use crate::canvas::MindmapCanvas;
pub use crate::config::AppConfig;
pub use crate::layout::{layout_mindmap, layout_with_report, LayoutSettings};
pub use crate::model::{Edge, MindmapLayout, MindmapNode, NodeId, PositionedNode, Side};
