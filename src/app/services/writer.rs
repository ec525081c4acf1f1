//! VDF serialization
//!
//! Writes the header block as `key:value` lines, the `[DATA START]`
//! sentinel, then the tab-delimited data block: column names, the synthetic
//! units row, and the data rows. The output lands in a `VDF/` subdirectory
//! beside the input file, named `<input_basename>_VDF.csv`.

use crate::app::models::{HeaderBlock, Table};
use crate::constants::{DATA_START_MARKER, VDF_DELIMITER, VDF_DIR_NAME, VDF_FILE_SUFFIX};
use crate::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Deterministic output path for an input file:
/// `<input_dir>/VDF/<input_basename>_VDF.csv`
pub fn output_path_for(input_path: &Path) -> PathBuf {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    input_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(VDF_DIR_NAME)
        .join(format!("{}{}", stem, VDF_FILE_SUFFIX))
}

/// Serialize the conversion result, creating the output directory if absent.
///
/// Returns the path of the written file.
pub fn write(
    table: &Table,
    units_row: &[Option<String>],
    header: &HeaderBlock,
    input_path: &Path,
) -> Result<PathBuf> {
    let output_path = output_path_for(input_path);
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            Error::io(
                format!("could not create output directory '{}'", parent.display()),
                e,
            )
        })?;
    }

    let file = fs::File::create(&output_path).map_err(|e| {
        Error::io(
            format!("could not create output file '{}'", output_path.display()),
            e,
        )
    })?;
    let mut buffered = std::io::BufWriter::new(file);

    for (key, value) in header.iter() {
        writeln!(buffered, "{}:{}", key, value)?;
    }
    writeln!(buffered, "{}", DATA_START_MARKER)?;

    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(VDF_DELIMITER)
        .from_writer(buffered);
    csv_writer.write_record(table.columns())?;
    csv_writer.write_record(units_row.iter().map(|unit| unit.as_deref().unwrap_or("")))?;
    for row in table.rows() {
        csv_writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
    }
    csv_writer.flush()?;

    info!(
        "Completed generation of VDF file at path: {}",
        output_path.display()
    );
    Ok(output_path)
}
