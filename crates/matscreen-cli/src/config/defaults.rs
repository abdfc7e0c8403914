use matscreen::core::io::reference::IONIC_RADIUS;
use matscreen::engine::config::{HUME_ROTHERY_PERCENT, RatioSource, ToleranceBound};
use std::path::PathBuf;

pub struct DefaultsConfig {
    pub reference_table: String,
    pub ratio_source: RatioSource,
    pub order_sensitive: bool,
    pub match_coordination: bool,
    pub property: String,
    pub percent: f64,
    pub bound: ToleranceBound,
    pub include_rejected: bool,
    pub results_dir: PathBuf,
    pub plot: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            reference_table: "shannon".to_string(),
            ratio_source: RatioSource::Builtin,
            order_sensitive: true,
            match_coordination: true,
            property: IONIC_RADIUS.to_string(),
            percent: HUME_ROTHERY_PERCENT,
            bound: ToleranceBound::Inclusive,
            include_rejected: false,
            results_dir: PathBuf::from("Results"),
            plot: true,
        }
    }
}
