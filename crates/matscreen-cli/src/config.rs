mod builder;
mod defaults;
mod file;
mod models;

pub use builder::{build_generate_config, build_screen_config};
pub use models::{GenerateAppConfig, OutputOptions, ScreenAppConfig};
