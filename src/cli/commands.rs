//! Command implementations for the VDF converter CLI
//!
//! Contains the command execution logic, logging setup, and summary
//! reporting for the CLI interface.

use crate::app::models::Diagnostics;
use crate::app::services::converter::VdfConverter;
use crate::app::services::units::registry::UnitRegistry;
use crate::cli::args::{Args, Commands, ConvertArgs, UnitsArgs};
use crate::config::MappingConfig;
use crate::{Error, Result};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};

/// Batch statistics for reporting
#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    /// Number of files successfully converted
    pub files_converted: usize,
    /// Number of files that failed
    pub files_failed: usize,
    /// Warnings accumulated across all files
    pub total_warnings: usize,
    /// Total wall-clock time
    pub processing_time: std::time::Duration,
}

/// Main command runner.
///
/// Dispatches to the requested subcommand. The caller has already ensured
/// a subcommand is present.
pub fn run(args: Args) -> Result<BatchStats> {
    match args.command {
        Some(Commands::Convert(convert_args)) => run_convert(convert_args),
        Some(Commands::Units(units_args)) => run_units(units_args),
        None => Err(Error::configuration("no command provided".to_string())),
    }
}

/// Convert each input file independently; one failure does not stop the
/// batch. The run fails only when every file failed.
fn run_convert(args: ConvertArgs) -> Result<BatchStats> {
    let start_time = Instant::now();

    setup_logging(args.get_log_level());
    debug!("Command line arguments: {:?}", args);
    args.validate()?;

    let registry = load_registry(args.units_file.as_deref())?;
    info!("Loaded unit table with {} entries", registry.len());

    let mut diagnostics = Diagnostics::new();
    let config = MappingConfig::load(&args.config_file, &mut diagnostics)?;
    info!(
        "Loaded mapping document from {}",
        args.config_file.display()
    );

    let mut stats = BatchStats::default();
    for input in &args.inputs {
        info!("Converting {}", input.display());
        match VdfConverter::new(input.clone(), &config, &registry).convert() {
            Ok(report) => {
                stats.files_converted += 1;
                stats.total_warnings += report.warnings.len();
                println!("{}", report.summary());
            }
            Err(e) => {
                stats.files_failed += 1;
                error!("Failed to convert {}: {}", input.display(), e);
            }
        }
    }
    stats.processing_time = start_time.elapsed();

    if stats.files_converted == 0 && stats.files_failed > 0 {
        return Err(Error::conversion(format!(
            "all {} input files failed to convert",
            stats.files_failed
        )));
    }

    info!(
        "Converted {} of {} files in {:.2?} ({} warnings)",
        stats.files_converted,
        args.inputs.len(),
        stats.processing_time,
        stats.total_warnings
    );
    Ok(stats)
}

/// List the canonical unit table
fn run_units(args: UnitsArgs) -> Result<BatchStats> {
    setup_logging("info");

    let registry = load_registry(args.units_file.as_deref())?;
    println!("{:<20} {:<10} {}", "Key", "Symbol", "Name");
    for entry in registry.entries() {
        println!("{:<20} {:<10} {}", entry.key, entry.symbol, entry.name);
    }
    Ok(BatchStats::default())
}

fn load_registry(units_file: Option<&Path>) -> Result<UnitRegistry> {
    match units_file {
        Some(path) => UnitRegistry::from_path(path),
        None => UnitRegistry::embedded(),
    }
}

fn setup_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    // A second invocation in the same process keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_convert_batch_is_best_effort() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.csv");
        let bad = dir.path().join("bad.parquet");
        let config = dir.path().join("mapping.yaml");
        fs::write(&good, "Test Time,Current(A),Voltage(V)\n0,1.5,3.7\n").unwrap();
        fs::write(&bad, "not tabular").unwrap();
        fs::write(
            &config,
            "metadata:\n  \"Start Time\": x\n  Timezone: America/Los_Angeles\n",
        )
        .unwrap();

        let stats = run_convert(ConvertArgs {
            inputs: vec![good, bad],
            config_file: config,
            units_file: None,
            verbose: 0,
        })
        .unwrap();

        assert_eq!(stats.files_converted, 1);
        assert_eq!(stats.files_failed, 1);
    }

    #[test]
    fn test_convert_fails_when_every_file_fails() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("bad.parquet");
        let config = dir.path().join("mapping.yaml");
        fs::write(&bad, "not tabular").unwrap();
        fs::write(&config, "metadata: {}\n").unwrap();

        let result = run_convert(ConvertArgs {
            inputs: vec![bad],
            config_file: config,
            units_file: None,
            verbose: 0,
        });
        assert!(matches!(result, Err(Error::Conversion { .. })));
    }

    #[test]
    fn test_units_command_uses_embedded_table() {
        let stats = run_units(UnitsArgs { units_file: None }).unwrap();
        assert_eq!(stats.files_converted, 0);
    }
}
