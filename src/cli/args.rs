//! Command-line argument definitions for the VDF converter
//!
//! The complete CLI surface, defined with the clap derive API.

use crate::{Error, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the VDF converter
///
/// Converts vendor battery-test data files (CSV, RTF, Excel) into the
/// standardized tab-delimited VDF format using a YAML mapping document.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "vdf-converter",
    version,
    about = "Convert vendor battery-test data files to standardized VDF format",
    long_about = "Converts raw cycler exports (CSV, RTF, Excel) into standardized VDF files. \
                  A YAML mapping document describes the vendor format: column renames, units, \
                  timestamp handling and header metadata. Output lands in a VDF/ subdirectory \
                  beside each input file."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Convert one or more data files to VDF format (main command)
    Convert(ConvertArgs),
    /// List the canonical units accepted in VDF output
    Units(UnitsArgs),
}

/// Arguments for the convert command
#[derive(Debug, Clone, Parser)]
pub struct ConvertArgs {
    /// Input data files to convert
    ///
    /// Each file is converted independently; a failure in one file does not
    /// stop the others. Supported extensions: csv, rtf, xls, xlsx.
    #[arg(
        value_name = "FILE",
        required = true,
        help = "Input data files (csv, rtf, xls, xlsx)"
    )]
    pub inputs: Vec<PathBuf>,

    /// Path to the YAML mapping document
    ///
    /// Describes the vendor format: column renames and units, rows to skip,
    /// timestamp format, and header metadata.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to the YAML mapping document"
    )]
    pub config_file: PathBuf,

    /// Path to a custom unit definition table
    ///
    /// Semicolon-delimited table with Key, Symbol and Name columns. If not
    /// specified, the built-in unit table is used.
    #[arg(
        long = "units",
        value_name = "FILE",
        help = "Path to a custom unit definition table (built-in table if omitted)"
    )]
    pub units_file: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: debug, -vv: trace)"
    )]
    pub verbose: u8,
}

/// Arguments for the units command
#[derive(Debug, Clone, Parser)]
pub struct UnitsArgs {
    /// Path to a custom unit definition table
    ///
    /// If not specified, lists the built-in unit table.
    #[arg(
        long = "units",
        value_name = "FILE",
        help = "Path to a custom unit definition table (built-in table if omitted)"
    )]
    pub units_file: Option<PathBuf>,
}

impl ConvertArgs {
    /// Validate the convert command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        for input in &self.inputs {
            if !input.exists() {
                return Err(Error::configuration(format!(
                    "Input file does not exist: {}",
                    input.display()
                )));
            }
        }

        if !self.config_file.exists() {
            return Err(Error::configuration(format!(
                "Config file does not exist: {}",
                self.config_file.display()
            )));
        }

        if let Some(units_file) = &self.units_file {
            if !units_file.exists() {
                return Err(Error::configuration(format!(
                    "Units file does not exist: {}",
                    units_file.display()
                )));
            }
        }

        Ok(())
    }

    /// Determine the appropriate log level based on the verbosity flag
    pub fn get_log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
