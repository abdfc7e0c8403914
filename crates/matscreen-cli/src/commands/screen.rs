use super::{format_rate, write_synthesis_plot};
use crate::cli::{ConfigArgs, ScreenArgs};
use crate::config::build_screen_config;
use crate::data::DataManager;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use matscreen::core::io::results::ResultWriter;
use matscreen::engine::progress::ProgressReporter;
use matscreen::workflows::screen::{self, FILTER_NAME, TABLE_NAME};
use tracing::{info, warn};

pub fn run(args: ScreenArgs, options: &ConfigArgs) -> Result<()> {
    info!("Initializing data manager...");
    let data_manager = DataManager::new()?;

    info!("Merging configuration from file and CLI arguments...");
    let app_config = build_screen_config(options, &args, &data_manager)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Screening candidates from {}...", args.input.display());
    info!("Invoking the core screening workflow...");
    let result = screen::run(&app_config.core_config, &reporter)?;

    let summary = result.summary(app_config.core_config.stoichiometry);
    if summary.matched == 0 {
        warn!("Screening finished without any stoichiometry match.");
    }

    let writer = ResultWriter::new(&app_config.output.results_dir);
    info!(
        "Writing results to {:?} (run {})",
        writer.results_dir(),
        writer.timestamp()
    );
    let table_path = writer.write_table(TABLE_NAME, FILTER_NAME, &result.records())?;
    let summary_path = writer.write_summary(TABLE_NAME, FILTER_NAME, &summary)?;

    println!(
        "Screened {} row(s): {} matched, {} novel, {} skipped ({} known ratio(s)).",
        summary.scanned, summary.matched, summary.novel, summary.skipped, summary.ratio_count
    );
    if let Some(synthesis) = &summary.synthesis {
        println!(
            "Synthesis rate: {} ({} of {} matched candidate(s) reported in ICSD)",
            format_rate(synthesis),
            synthesis.true_positive,
            synthesis.total
        );
    }
    println!("  Results: {}", table_path.display());
    println!("  Summary: {}", summary_path.display());

    if app_config.output.plot {
        write_synthesis_plot(&writer, TABLE_NAME, FILTER_NAME, summary.synthesis.as_ref());
    }

    Ok(())
}
