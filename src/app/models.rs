//! Core data structures for VDF conversion
//!
//! Defines the in-memory `Table` produced by the reader and reshaped by the
//! formatter, the ordered `HeaderBlock` of VDF metadata, and the
//! `Diagnostics` collector backing the non-fatal warning policy.

use std::collections::HashMap;
use tracing::warn;

/// An ordered, rectangular table of optional string cells.
///
/// Cells are `None` when the source field was missing or empty. Rows shorter
/// than the column list are padded with `None` on insertion; longer rows are
/// truncated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    /// Create an empty table with the given column names
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Column names, in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows, in order
    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by exact name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Append a row, padding or truncating it to the table width
    pub fn push_row(&mut self, mut cells: Vec<Option<String>>) {
        cells.resize(self.columns.len(), None);
        self.rows.push(cells);
    }

    /// Cell value at (row, column index)
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// All values of a named column, `None` if the column is absent
    pub fn column_values(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_deref()).collect())
    }

    /// Duplicate the `src` column under the name `dst`.
    ///
    /// Overwrites `dst` if it already exists. Returns false (and leaves the
    /// table unchanged) when `src` is absent.
    pub fn duplicate_column(&mut self, src: &str, dst: &str) -> bool {
        let Some(src_idx) = self.column_index(src) else {
            return false;
        };
        match self.column_index(dst) {
            Some(dst_idx) => {
                for row in &mut self.rows {
                    row[dst_idx] = row[src_idx].clone();
                }
            }
            None => {
                self.columns.push(dst.to_string());
                for row in &mut self.rows {
                    let value = row[src_idx].clone();
                    row.push(value);
                }
            }
        }
        true
    }

    /// Bulk-rename columns; map entries for absent columns are ignored
    pub fn rename_columns(&mut self, renames: &HashMap<String, String>) {
        for column in &mut self.columns {
            if let Some(new_name) = renames.get(column) {
                *column = new_name.clone();
            }
        }
    }

    /// Drop the named columns; absent names are ignored
    pub fn drop_columns(&mut self, names: &[String]) {
        let drop: Vec<usize> = names
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();
        if drop.is_empty() {
            return;
        }
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|i| !drop.contains(i))
            .collect();
        self.columns = keep.iter().map(|&i| self.columns[i].clone()).collect();
        for row in &mut self.rows {
            *row = keep.iter().map(|&i| row[i].take()).collect();
        }
    }

    /// Keep only rows matching the predicate
    pub fn retain_rows<F>(&mut self, mut predicate: F)
    where
        F: FnMut(&[Option<String>]) -> bool,
    {
        self.rows.retain(|row| predicate(row));
    }

    /// Broadcast a single literal value into a (new or existing) column
    pub fn set_column_literal(&mut self, name: &str, value: Option<String>) {
        match self.column_index(name) {
            Some(idx) => {
                for row in &mut self.rows {
                    row[idx] = value.clone();
                }
            }
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(value.clone());
                }
            }
        }
    }

    /// Replace the values of an existing column, or append it as new.
    /// `values` must match the row count.
    pub fn set_column_values(&mut self, name: &str, values: Vec<Option<String>>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }
}

/// Ordered key/value metadata written above the `[DATA START]` sentinel.
///
/// Insertion order is preserved; setting an existing key updates it in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderBlock {
    entries: Vec<(String, String)>,
}

impl HeaderBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from ordered pairs (e.g. the mapping document's `metadata` section)
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { entries: pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set or update a key, preserving its original position when updating
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// True when the key is present with a non-empty value
    pub fn has_value(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collector for non-fatal findings.
///
/// The converter is a best-effort bulk tool: everything short of an
/// unreadable input is recorded here and logged, and the run continues.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and log a warning
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.warnings.push(message);
    }

    /// Record a warning unless an identical one was already recorded
    pub fn warn_once(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.warnings.iter().any(|w| *w == message) {
            self.warn(message);
        }
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Consume the collector, returning the recorded warnings
    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }
}
