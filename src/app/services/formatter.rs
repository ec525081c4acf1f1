//! Table reshaping: the densest stage of the pipeline
//!
//! Applies the mapping document to the raw table in a fixed order: column
//! duplication, bulk rename, all-null row pruning, literal column creation,
//! timestamp normalization, Test Time derivation, and finally an overridable
//! finishing hook. Every step is independently skippable when its
//! precondition is unmet, and no per-value failure aborts the run.

use crate::app::models::{Diagnostics, Table};
use crate::config::{EpochUnit, MappingConfig, yaml_scalar_to_string};
use crate::constants::{
    FLEXIBLE_DATE_FORMATS, FLEXIBLE_DATETIME_FORMATS, TIME_COLUMNS, VDF_TIMESTAMP_FORMAT, columns,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use tracing::debug;

/// Extension point applied after the standard steps (default: identity).
///
/// Specialized vendor formats install a closure here instead of subclassing
/// the formatter.
pub type FinishHook = Box<dyn Fn(Table, &mut Diagnostics) -> Table>;

/// Applies the mapping document's reshaping directives to a raw table
pub struct Formatter<'a> {
    config: &'a MappingConfig,
    finish: Option<FinishHook>,
}

impl<'a> Formatter<'a> {
    pub fn new(config: &'a MappingConfig) -> Self {
        Self {
            config,
            finish: None,
        }
    }

    /// Install a finishing hook run after the standard steps
    pub fn with_finish_hook(mut self, hook: FinishHook) -> Self {
        self.finish = Some(hook);
        self
    }

    /// Produce the formatted table.
    ///
    /// `unit_map` picks up the `second` unit when a Test Time column is
    /// derived here.
    pub fn format(
        &self,
        mut table: Table,
        unit_map: &mut HashMap<String, String>,
        diagnostics: &mut Diagnostics,
    ) -> Table {
        // 1. Duplicate columns per new_col_map
        for (src, dst) in &self.config.new_col_map {
            if !table.duplicate_column(src, dst) {
                diagnostics.warn(format!(
                    "Warning: Did not create new column from {}, did not exist.",
                    src
                ));
            }
        }

        // 2. Bulk rename; entries for absent columns are silently ignored
        table.rename_columns(&self.config.rename_map);

        // 3. Drop rows that carry nothing but time padding
        drop_all_null_rows(&mut table);

        // 4. Broadcast literal values into created columns
        for (name, value) in &self.config.create_col_map {
            match yaml_scalar_to_string(value) {
                Some(literal) => {
                    let cell = if literal.is_empty() {
                        None
                    } else {
                        Some(literal)
                    };
                    table.set_column_literal(name, cell);
                }
                None => diagnostics.warn(format!(
                    "Warning: Could not create column {} with value {:?}.",
                    name, value
                )),
            }
        }

        // 5. Normalize every Timestamp value (best effort, per value)
        let parsed_timestamps = self.normalize_timestamp_column(&mut table, diagnostics);

        // 6. Derive Test Time from Timestamp when absent
        if !table.has_column(columns::TEST_TIME) {
            if table.has_column(columns::TIMESTAMP) {
                self.derive_test_time(&mut table, &parsed_timestamps, unit_map, diagnostics);
            } else {
                diagnostics.warn(
                    "Could not create a Test Time column - no Timestamp column could be found",
                );
            }
        }

        // 7. Finishing hook
        if let Some(hook) = &self.finish {
            table = hook(table, diagnostics);
        }

        table
    }

    /// Step 5. Returns the parsed datetimes aligned with the table rows so
    /// step 6 can derive elapsed time without reparsing.
    fn normalize_timestamp_column(
        &self,
        table: &mut Table,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Option<NaiveDateTime>> {
        let Some(idx) = table.column_index(columns::TIMESTAMP) else {
            return Vec::new();
        };

        let mut parsed = Vec::with_capacity(table.row_count());
        let mut normalized = Vec::with_capacity(table.row_count());
        for row in table.rows() {
            match row[idx].as_deref() {
                Some(raw) => {
                    let outcome = normalize_timestamp(
                        raw,
                        self.config.time_format.as_deref(),
                        self.config.epoch_unit,
                        diagnostics,
                    );
                    normalized.push(Some(outcome.text));
                    parsed.push(outcome.parsed);
                }
                None => {
                    normalized.push(None);
                    parsed.push(None);
                }
            }
        }
        table.set_column_values(columns::TIMESTAMP, normalized);
        parsed
    }

    /// Step 6. Elapsed seconds since the first row; first row is always 0.
    fn derive_test_time(
        &self,
        table: &mut Table,
        parsed: &[Option<NaiveDateTime>],
        unit_map: &mut HashMap<String, String>,
        diagnostics: &mut Diagnostics,
    ) {
        let ts_idx = table.column_index(columns::TIMESTAMP);
        let baseline = parsed.first().copied().flatten();
        let derivable = baseline.is_some()
            && ts_idx.is_some_and(|idx| {
                table
                    .rows()
                    .iter()
                    .zip(parsed)
                    .all(|(row, parsed)| row[idx].is_none() || parsed.is_some())
            });
        let Some(baseline) = baseline.filter(|_| derivable) else {
            diagnostics.warn("Could not create Test Time column from Timestamp.");
            return;
        };

        let values = parsed
            .iter()
            .map(|ts| {
                ts.map(|t| {
                    let seconds = (t - baseline).num_milliseconds() as f64 / 1000.0;
                    format!("{}", seconds)
                })
            })
            .collect();
        table.set_column_values(columns::TEST_TIME, values);
        unit_map.insert(
            columns::TEST_TIME.to_string(),
            crate::constants::TEST_TIME_UNIT.to_string(),
        );
        debug!("Derived Test Time from Timestamp ({} rows)", parsed.len());
    }
}

/// Step 3. A row survives when at least one non-time column holds a value.
fn drop_all_null_rows(table: &mut Table) {
    let payload_columns: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| !TIME_COLUMNS.contains(&name.as_str()))
        .map(|(idx, _)| idx)
        .collect();
    if payload_columns.is_empty() {
        return;
    }
    table.retain_rows(|row| payload_columns.iter().any(|&idx| row[idx].is_some()));
}

/// Result of normalizing one timestamp value
struct TimestampOutcome {
    /// Rendered text placed back in the table (original on total failure)
    text: String,
    /// Parsed value, absent when the escape hatch kept the original
    parsed: Option<NaiveDateTime>,
}

impl TimestampOutcome {
    fn converted(dt: NaiveDateTime) -> Self {
        Self {
            text: dt.format(VDF_TIMESTAMP_FORMAT).to_string(),
            parsed: Some(dt),
        }
    }
}

/// Per-value best-effort conversion cascade; no error escapes.
///
/// Order: explicit configured format, flexible format table, numeric epoch
/// offset, and finally the escape hatch that keeps the original text (which
/// permits partially-converted columns).
fn normalize_timestamp(
    raw: &str,
    time_format: Option<&str>,
    epoch_unit: EpochUnit,
    diagnostics: &mut Diagnostics,
) -> TimestampOutcome {
    let trimmed = raw.trim();

    if let Some(format) = time_format {
        if let Some(dt) = parse_with_format(trimmed, format) {
            return TimestampOutcome::converted(dt);
        }
        diagnostics.warn(format!(
            "Could not convert timestamp {} using the provided time_format {} - time format not used",
            raw, format
        ));
    }

    if let Some(dt) = parse_flexible(trimmed) {
        return TimestampOutcome::converted(dt);
    }

    if let Some(dt) = parse_epoch(trimmed, epoch_unit) {
        return TimestampOutcome::converted(dt);
    }

    diagnostics.warn(format!(
        "Could not convert timestamp {}, keeping original value",
        raw
    ));
    TimestampOutcome {
        text: raw.to_string(),
        parsed: None,
    }
}

/// Strict parse against one strptime pattern (datetime, then date-only)
fn parse_with_format(value: &str, format: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, format)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// General-purpose parse over the flexible format tables
fn parse_flexible(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for format in FLEXIBLE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    for format in FLEXIBLE_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, format) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Interpret the value as a numeric epoch offset in the configured unit
fn parse_epoch(value: &str, unit: EpochUnit) -> Option<NaiveDateTime> {
    let offset: f64 = value.parse().ok()?;
    if !offset.is_finite() {
        return None;
    }
    let nanos = offset * unit.nanos_per_tick();
    if nanos.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(DateTime::from_timestamp_nanos(nanos as i64).naive_utc())
}
