#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod pipeline;
pub mod render;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{
    Config, LayoutConfig, LayoutMode, OutputFormat, RenderConfig, load_config, load_config_for_mode,
};
pub use error::{ConsistencyError, ExtractionError, GraphError, RenderError, ValidationError};
pub use fallback::build_fallback_roadmap;
pub use ir::{Cluster, Edge, Node, NodeKind, Roadmap};
pub use layout::{LayoutPlan, plan_layout};
pub use pipeline::{generate, resolve_roadmap};
pub use render::{render_roadmap, to_dot, write_dot};
