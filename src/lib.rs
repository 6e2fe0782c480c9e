#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod graph;
pub mod handlers;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, load_config};
pub use convert::{Converted, convert};
pub use error::ConvertError;
pub use handlers::builtin::default_registry;
pub use handlers::{HandlerRegistry, ResourceHandler, Scene};
pub use ir::Resource;
pub use layout::Diagram;
pub use theme::Theme;
