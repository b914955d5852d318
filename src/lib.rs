#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod document;
pub mod layout;
pub mod normalize;
pub mod parser;
pub mod plan;
pub mod render;
pub mod theme;
pub mod validate;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig, load_config};
pub use document::{Document, synthesize};
pub use layout::{Layout, compute_layout};
pub use normalize::normalize;
pub use parser::{PlanParseError, parse_plan};
pub use plan::{LayoutMode, Plan, RawPlan};
pub use render::{render_svg, write_output_svg};
pub use theme::Palette;
pub use validate::{ValidationReport, validate};
