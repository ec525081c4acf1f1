//! Raw table loading with extension dispatch
//!
//! `.csv` and `.rtf` inputs go through the delimited reader; `.xls`/`.xlsx`
//! through the spreadsheet reader with tab selection. Both honor the
//! configured skip-rows, and the skip-column list is applied before the
//! table is returned. Any other extension is fatal for the file.

use crate::app::models::Table;
use crate::config::{MappingConfig, SheetSelector};
use crate::{Error, Result};
use calamine::{Data, Reader as _, open_workbook_auto};
use std::path::Path;
use tracing::{debug, info};

/// Read a raw table from `path`, dispatching on the file extension
pub fn read(path: &Path, config: &MappingConfig) -> Result<Table> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let mut table = match extension.as_str() {
        "csv" | "rtf" => read_delimited(path, config.skiprows)?,
        "xls" | "xlsx" => read_spreadsheet(path, config)?,
        _ => {
            return Err(Error::unsupported_format(
                path.display().to_string(),
                extension,
            ));
        }
    };

    if !config.skip_columns.is_empty() {
        table.drop_columns(&config.skip_columns);
    }

    info!(
        "Read {} rows x {} columns from {}",
        table.row_count(),
        table.width(),
        path.display()
    );
    Ok(table)
}

/// Empty fields become `None`; everything else is kept verbatim
fn field_to_cell(field: &str) -> Option<String> {
    if field.is_empty() {
        None
    } else {
        Some(field.to_string())
    }
}

fn read_delimited(path: &Path, skiprows: usize) -> Result<Table> {
    let file_name = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| Error::csv_parsing(&file_name, "Failed to open file", Some(e)))?;

    let mut table: Option<Table> = None;
    for (index, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| Error::csv_parsing(&file_name, "Failed to read record", Some(e)))?;
        if index < skiprows {
            continue;
        }
        match table.as_mut() {
            None => {
                let columns = record.iter().map(|f| f.to_string()).collect();
                table = Some(Table::new(columns));
            }
            Some(table) => {
                table.push_row(record.iter().map(field_to_cell).collect());
            }
        }
    }

    table.ok_or_else(|| {
        Error::csv_parsing(
            &file_name,
            format!("no header row found after skipping {} rows", skiprows),
            None,
        )
    })
}

/// Render a spreadsheet cell as text; whole floats drop the trailing `.0`
fn data_to_cell(data: &Data) -> Option<String> {
    match data {
        Data::Empty => None,
        Data::String(s) => field_to_cell(s),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                Some(format!("{}", *f as i64))
            } else {
                Some(f.to_string())
            }
        }
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|ndt| ndt.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => field_to_cell(s),
        Data::Error(_) => None,
    }
}

fn read_spreadsheet(path: &Path, config: &MappingConfig) -> Result<Table> {
    let file_name = path.display().to_string();
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| Error::spreadsheet(&file_name, "Failed to open workbook", Some(e)))?;

    let sheet_names = workbook.sheet_names().to_owned();
    let sheet_name = match &config.time_data_tab {
        Some(SheetSelector::Name(name)) => name.clone(),
        Some(SheetSelector::Index(index)) => {
            sheet_names.get(*index).cloned().ok_or_else(|| {
                Error::spreadsheet(
                    &file_name,
                    format!(
                        "tab index {} out of range ({} sheets)",
                        index,
                        sheet_names.len()
                    ),
                    None,
                )
            })?
        }
        None => {
            // Without a selector the workbook must resolve to a single table
            if sheet_names.len() != 1 {
                return Err(Error::ambiguous_sheet(
                    &file_name,
                    format!(
                        "workbook has {} sheets and no time_data_tab was configured",
                        sheet_names.len()
                    ),
                ));
            }
            sheet_names[0].clone()
        }
    };
    debug!("Reading sheet '{}' from {}", sheet_name, file_name);

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| Error::spreadsheet(&file_name, format!("sheet '{}'", sheet_name), Some(e)))?;

    let mut rows = range.rows().skip(config.skiprows);
    let header = rows.next().ok_or_else(|| {
        Error::spreadsheet(
            &file_name,
            format!(
                "no header row found after skipping {} rows",
                config.skiprows
            ),
            None,
        )
    })?;

    let columns = header
        .iter()
        .map(|cell| data_to_cell(cell).unwrap_or_default())
        .collect();
    let mut table = Table::new(columns);
    for row in rows {
        table.push_row(row.iter().map(data_to_cell).collect());
    }
    Ok(table)
}
