use super::{format_rate, write_synthesis_plot};
use crate::cli::{ConfigArgs, GenerateArgs};
use crate::config::build_generate_config;
use crate::data::DataManager;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use matscreen::core::io::results::ResultWriter;
use matscreen::engine::progress::ProgressReporter;
use matscreen::workflows::generate::{self, FILTER_NAME, TABLE_NAME};
use tracing::{info, warn};

pub fn run(args: GenerateArgs, options: &ConfigArgs) -> Result<()> {
    info!("Initializing data manager...");
    let data_manager = DataManager::new()?;

    info!("Merging configuration from file and CLI arguments...");
    let app_config = build_generate_config(options, &args, &data_manager)?;
    let criteria = &app_config.core_config.criteria;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Generating isovalent substitutions...");
    info!("Invoking the core generation workflow...");
    let result = generate::run(&app_config.core_config, &reporter)?;

    let summary = result.summary(criteria);
    if summary.valid == 0 {
        warn!("Generation finished without any valid substitution.");
        println!("Warning: no substitute satisfied the selection criteria.");
    }

    let writer = ResultWriter::new(&app_config.output.results_dir);
    info!(
        "Writing results to {:?} (run {})",
        writer.results_dir(),
        writer.timestamp()
    );
    let records = result.records();
    let table_path = writer.write_table(TABLE_NAME, FILTER_NAME, &records)?;
    let summary_path = writer.write_summary(TABLE_NAME, FILTER_NAME, &summary)?;

    for record in records.iter().filter(|r| r.valid) {
        println!(
            "  {} -> {} ({} for {}, {} {:.3} vs {:.3})",
            record.seed,
            record.novel_material,
            record.substitute,
            record.site,
            criteria.property,
            record.substitute_value,
            record.target_value
        );
    }
    println!(
        "Processed {} seed(s): {} substitution(s), {} valid, {} seed(s) skipped.",
        summary.seeds, summary.generated, summary.valid, summary.skipped_seeds
    );
    if let Some(synthesis) = &summary.synthesis {
        println!(
            "Synthesis rate: {} ({} of {} valid material(s) reported in ICSD)",
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
