use crate::cli::{DataArgs, DataCommands};
use crate::data::{DataManager, TableStatus};
use crate::error::{CliError, Result};
use std::path::PathBuf;
use tracing::info;

pub fn run(args: DataArgs) -> Result<()> {
    match args.command {
        DataCommands::Path => handle_path(),
        DataCommands::SetPath { path } => handle_set_path(path),
        DataCommands::ResetPath => handle_reset_path(),
        DataCommands::Check => handle_check(),
    }
}

fn handle_path() -> Result<()> {
    let manager = DataManager::new()?;
    println!("{}", manager.get_data_path().display());
    Ok(())
}

fn handle_set_path(path: PathBuf) -> Result<()> {
    let absolute_path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()?.join(path)
    };
    if !absolute_path.is_dir() {
        return Err(CliError::Argument(format!(
            "Data path is not a directory: {}",
            absolute_path.display()
        )));
    }
    DataManager::set_custom_path(&absolute_path)?;
    info!("Data path set to {:?}", absolute_path);
    println!("✓ Data path set to: {}", absolute_path.display());
    Ok(())
}

fn handle_reset_path() -> Result<()> {
    DataManager::reset_path()?;
    let manager = DataManager::new()?;
    println!(
        "✓ Data path reset to default: {}",
        manager.get_data_path().display()
    );
    Ok(())
}

fn handle_check() -> Result<()> {
    let manager = DataManager::new()?;
    println!("Checking data tables in {}", manager.get_data_path().display());

    let reports = manager.check();
    for report in &reports {
        match &report.status {
            TableStatus::Loaded { rows } => {
                println!("  ✓ {:<10} {} row(s)  {}", report.name, rows, report.path.display())
            }
            TableStatus::Missing => {
                println!("  - {:<10} missing  {}", report.name, report.path.display())
            }
            TableStatus::Invalid { message } => {
                println!("  ✗ {:<10} invalid  {}: {}", report.name, report.path.display(), message)
            }
        }
    }

    if reports
        .iter()
        .any(|r| matches!(r.status, TableStatus::Invalid { .. }))
    {
        return Err(CliError::Data(
            "One or more data tables failed to load.".to_string(),
        ));
    }
    Ok(())
}
