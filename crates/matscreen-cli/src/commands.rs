pub mod data;
pub mod generate;
pub mod screen;

use matscreen::core::io::plot::write_synthesis_pie;
use matscreen::core::io::results::ResultWriter;
use matscreen::engine::matching::SynthesisSummary;
use tracing::{info, warn};

/// Draws the synthesis pie next to the result table. A failed plot is logged and
/// never fails the run.
fn write_synthesis_plot(
    writer: &ResultWriter,
    table_name: &str,
    filter_name: &str,
    synthesis: Option<&SynthesisSummary>,
) {
    let Some(synthesis) = synthesis.filter(|s| s.total > 0) else {
        info!("No synthesis statistics to plot.");
        return;
    };
    let path = writer.output_path(table_name, filter_name, "_pie_chart.svg");
    match write_synthesis_pie(&path, synthesis.true_positive, synthesis.false_positive) {
        Ok(()) => println!("  Synthesis chart: {}", path.display()),
        Err(e) => warn!("Could not draw synthesis chart: {}", e),
    }
}

fn format_rate(synthesis: &SynthesisSummary) -> String {
    match synthesis.synthesis_rate {
        Some(rate) => format!("{:.2}%", rate),
        None => "n/a".to_string(),
    }
}
