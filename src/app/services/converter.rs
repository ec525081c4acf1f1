//! Conversion orchestration
//!
//! Drives one input file through the linear pipeline: read, format, header
//! finalization, unit inference, validation, write. Fatal errors abort the
//! file; everything else accumulates in the report's warning list.

use crate::app::models::{Diagnostics, HeaderBlock, Table};
use crate::app::services::formatter::{FinishHook, Formatter};
use crate::app::services::units::inference::infer_units;
use crate::app::services::units::registry::UnitRegistry;
use crate::app::services::{reader, validator, writer};
use crate::config::MappingConfig;
use crate::constants::{
    DEFAULT_START_TIME, DEFAULT_TIMEZONE, START_TIME_KEY, TIMEZONE_KEY, columns,
};
use crate::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

/// Outcome of a single conversion run
#[derive(Debug, Clone)]
pub struct ConversionReport {
    /// Path of the written VDF file
    pub output_path: PathBuf,
    /// Data rows in the raw table
    pub rows_read: usize,
    /// Data rows in the formatted output (units row excluded)
    pub rows_written: usize,
    /// Columns in the formatted output
    pub columns: usize,
    /// Non-fatal findings collected across the run
    pub warnings: Vec<String>,
}

impl ConversionReport {
    /// One-line human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "{}: {} columns, {} data rows ({} read), {} warnings",
            self.output_path.display(),
            self.columns,
            self.rows_written,
            self.rows_read,
            self.warnings.len()
        )
    }
}

/// Converts one vendor data file to VDF format
pub struct VdfConverter<'a> {
    input_path: PathBuf,
    config: &'a MappingConfig,
    registry: &'a UnitRegistry,
    finish_hook: Option<FinishHook>,
}

impl<'a> VdfConverter<'a> {
    pub fn new(input_path: PathBuf, config: &'a MappingConfig, registry: &'a UnitRegistry) -> Self {
        Self {
            input_path,
            config,
            registry,
            finish_hook: None,
        }
    }

    /// Install a formatter finishing hook for specialized vendor formats
    pub fn with_finish_hook(mut self, hook: FinishHook) -> Self {
        self.finish_hook = Some(hook);
        self
    }

    /// Run the full pipeline for this input file
    pub fn convert(self) -> Result<ConversionReport> {
        let mut diagnostics = Diagnostics::new();

        info!("Reading in data from {}", self.input_path.display());
        let raw = reader::read(&self.input_path, self.config)?;
        let rows_read = raw.row_count();

        info!("Formatting data...");
        let mut unit_map = self.config.unit_map.clone();
        let mut formatter = Formatter::new(self.config);
        if let Some(hook) = self.finish_hook {
            formatter = formatter.with_finish_hook(hook);
        }
        let formatted = formatter.format(raw, &mut unit_map, &mut diagnostics);

        info!("Updating header dictionary...");
        let header = build_header(self.config, &formatted, &mut diagnostics);

        info!("Adding units...");
        infer_units(
            formatted.columns(),
            &mut unit_map,
            self.registry,
            &mut diagnostics,
        );
        let units_row = units_row_for(&formatted, &unit_map);

        for warning in validator::validate(&formatted, &units_row, &header, self.registry) {
            diagnostics.warn(warning);
        }

        let output_path = writer::write(&formatted, &units_row, &header, &self.input_path)?;

        Ok(ConversionReport {
            output_path,
            rows_read,
            rows_written: formatted.row_count(),
            columns: formatted.width(),
            warnings: diagnostics.into_warnings(),
        })
    }
}

/// Finalize the header block: config metadata plus defaulted Start Time and
/// Timezone. Start Time comes from the first Timestamp value when available.
fn build_header(
    config: &MappingConfig,
    formatted: &Table,
    diagnostics: &mut Diagnostics,
) -> HeaderBlock {
    let mut header = HeaderBlock::from_pairs(config.metadata.clone());

    if !header.has_value(START_TIME_KEY) {
        // The first Timestamp cell may itself be empty (payload rows without
        // a timestamp survive pruning), so both absences take the default.
        let first_timestamp = formatted
            .column_values(columns::TIMESTAMP)
            .and_then(|values| values.first().copied().flatten().map(str::to_string));
        let start_time = match first_timestamp {
            Some(value) => value,
            None => {
                diagnostics.warn(
                    "Could not obtain a start time for the test: defaulted to 0 ms (epoch)",
                );
                DEFAULT_START_TIME.to_string()
            }
        };
        header.set(START_TIME_KEY, start_time);
    }

    if !header.has_value(TIMEZONE_KEY) {
        diagnostics.warn("Timezone was not defined: defaulted to PST");
        header.set(TIMEZONE_KEY, DEFAULT_TIMEZONE);
    }

    header
}

/// Synthetic units row aligned with the table columns
fn units_row_for(table: &Table, unit_map: &HashMap<String, String>) -> Vec<Option<String>> {
    table
        .columns()
        .iter()
        .map(|column| unit_map.get(column).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_from(yaml: &str) -> MappingConfig {
        let mut diagnostics = Diagnostics::new();
        MappingConfig::from_yaml(yaml, &mut diagnostics).unwrap()
    }

    fn registry() -> UnitRegistry {
        UnitRegistry::embedded().unwrap()
    }

    fn write_input(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_rename_carries_unit_and_drops_old_column() {
        let dir = TempDir::new().unwrap();
        let input = write_input(
            &dir,
            "cell.csv",
            "Time(s),Current(A),Voltage(V)\n0,1.5,3.7\n30,1.6,3.8\n",
        );
        let config = config_from(
            r#"
columns:
  "Time(s)":
    rename: "Test Time"
    unit: second
metadata:
  Timezone: America/Los_Angeles
"#,
        );

        let registry = registry();
        let report = VdfConverter::new(input, &config, &registry)
            .convert()
            .unwrap();

        let content = fs::read_to_string(&report.output_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        let header_row = lines
            .iter()
            .position(|l| *l == "[DATA START]")
            .map(|i| lines[i + 1])
            .unwrap();
        assert_eq!(header_row, "Test Time\tCurrent(A)\tVoltage(V)");
        assert!(!content.contains("Time(s)"));

        let units_row = lines[lines.iter().position(|l| *l == "[DATA START]").unwrap() + 2];
        assert_eq!(units_row, "second\tamp\tvolt");
    }

    #[test]
    fn test_missing_timezone_defaults_with_warning_but_writes() {
        let dir = TempDir::new().unwrap();
        let input = write_input(
            &dir,
            "cell.csv",
            "Test Time,Current(A),Voltage(V)\n0,1.5,3.7\n",
        );
        let config = config_from("metadata:\n  \"Start Time\": 2021-06-01 08:30:00\n");

        let registry = registry();
        let report = VdfConverter::new(input, &config, &registry)
            .convert()
            .unwrap();

        assert!(report.output_path.exists());
        assert!(
            report
                .warnings
                .iter()
                .any(|w| w.contains("Timezone was not defined"))
        );
        let content = fs::read_to_string(&report.output_path).unwrap();
        assert!(content.contains("Timezone:America/Los_Angeles"));
    }

    #[test]
    fn test_unresolvable_unit_hint_warns_once() {
        let dir = TempDir::new().unwrap();
        let input = write_input(
            &dir,
            "cell.csv",
            "Test Time,Current(A),Pressure(furlongs),Back Pressure(furlongs)\n0,1.5,7,8\n",
        );
        let config = config_from("metadata: {}\n");

        let registry = registry();
        let report = VdfConverter::new(input, &config, &registry)
            .convert()
            .unwrap();

        let hint_warnings: Vec<&String> = report
            .warnings
            .iter()
            .filter(|w| w.contains("Could not convert unit furlongs"))
            .collect();
        assert_eq!(hint_warnings.len(), 1);

        // unresolved columns carry no unit in the units row
        let content = fs::read_to_string(&report.output_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        let units_row = lines[lines.iter().position(|l| *l == "[DATA START]").unwrap() + 2];
        assert_eq!(units_row, "\tamp\t\t");
    }

    #[test]
    fn test_start_time_from_first_timestamp() {
        let dir = TempDir::new().unwrap();
        let input = write_input(
            &dir,
            "cell.csv",
            "Timestamp,Current(A),Voltage(V)\n2021-06-01 08:30:00,1.5,3.7\n2021-06-01 08:30:30,1.6,3.8\n",
        );
        let config = config_from("metadata: {}\n");

        let registry = registry();
        let report = VdfConverter::new(input, &config, &registry)
            .convert()
            .unwrap();

        let content = fs::read_to_string(&report.output_path).unwrap();
        assert!(content.contains("Start Time:2021-06-01 08:30:00"));

        // derived Test Time lands as the last column, starting at zero
        let lines: Vec<&str> = content.lines().collect();
        let data_start = lines.iter().position(|l| *l == "[DATA START]").unwrap();
        assert_eq!(
            lines[data_start + 1],
            "Timestamp\tCurrent(A)\tVoltage(V)\tTest Time"
        );
        assert!(lines[data_start + 3].ends_with("\t0"));
        assert!(lines[data_start + 4].ends_with("\t30"));
    }

    #[test]
    fn test_start_time_defaults_when_first_timestamp_cell_is_empty() {
        let dir = TempDir::new().unwrap();
        let input = write_input(
            &dir,
            "cell.csv",
            "Timestamp,Current(A),Voltage(V)\n,1.5,3.7\n2021-06-01 08:30:30,1.6,3.8\n",
        );
        let config = config_from("metadata:\n  Timezone: America/Los_Angeles\n");

        let registry = registry();
        let report = VdfConverter::new(input, &config, &registry)
            .convert()
            .unwrap();

        assert!(
            report
                .warnings
                .iter()
                .any(|w| w.contains("Could not obtain a start time"))
        );

        let content = fs::read_to_string(&report.output_path).unwrap();
        let start_line = content
            .lines()
            .find(|l| l.starts_with("Start Time:"))
            .unwrap();
        assert_eq!(start_line, "Start Time:0");
        // a populated Start Time passes the metadata check
        assert!(
            !report
                .warnings
                .iter()
                .any(|w| w.contains("missing required value 'Start Time'"))
        );
    }

    #[test]
    fn test_report_summary_counts() {
        let dir = TempDir::new().unwrap();
        let input = write_input(
            &dir,
            "cell.csv",
            "Test Time,Current(A),Voltage(V)\n0,1.5,3.7\n1,,\n2,1.6,3.8\n",
        );
        let config = config_from(
            "metadata:\n  \"Start Time\": x\n  Timezone: America/Los_Angeles\n",
        );

        let registry = registry();
        let report = VdfConverter::new(input, &config, &registry)
            .convert()
            .unwrap();

        assert_eq!(report.rows_read, 3);
        // the all-null payload row is pruned
        assert_eq!(report.rows_written, 2);
        assert_eq!(report.columns, 3);
        assert!(report.summary().contains("2 data rows"));
    }
}
