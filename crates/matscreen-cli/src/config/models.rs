use matscreen::engine::config as core_config;
use std::path::PathBuf;

pub struct OutputOptions {
    pub results_dir: PathBuf,
    pub plot: bool,
}

pub struct ScreenAppConfig {
    pub core_config: core_config::ScreenConfig,
    pub output: OutputOptions,
}

pub struct GenerateAppConfig {
    pub core_config: core_config::GenerateConfig,
    pub output: OutputOptions,
}
