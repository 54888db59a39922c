pub mod app;
pub mod cli;
pub mod logging;
pub mod output;

pub use app::{App, AppError, Capabilities, Report, build_registry, load_config};
pub use cli::{Cli, Command, RsuCommand};
