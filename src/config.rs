//! Mapping-document parsing and derived column/unit directives.
//!
//! The converter is driven entirely by a small YAML document. This module
//! deserializes it and flattens the per-column directives into the rename,
//! new-column, create-column, unit and skip maps consumed by the pipeline.
//! The resulting `MappingConfig` is immutable for the rest of the run.

use crate::app::models::Diagnostics;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

/// Directive for one source column of the input file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColumnDirective {
    /// Canonical unit key (or symbol/name resolvable by the registry)
    pub unit: Option<String>,

    /// Rename the column; the unit, if any, follows the new name
    pub rename: Option<String>,

    /// Duplicate the column under a new name; the unit follows the copy
    pub new_name: Option<String>,

    /// Drop the column entirely before formatting
    #[serde(default)]
    pub skip: bool,
}

/// Directive creating a column from a literal value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateColumnDirective {
    pub value: Option<serde_yaml::Value>,
    pub unit: Option<String>,
}

/// Epoch offset unit for numeric timestamp interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpochUnit {
    Seconds,
    #[default]
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl EpochUnit {
    /// Parse the mapping document's `epoch unit` value
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "second" | "seconds" => Some(Self::Seconds),
            "ms" | "millisecond" | "milliseconds" => Some(Self::Milliseconds),
            "us" | "microsecond" | "microseconds" => Some(Self::Microseconds),
            "ns" | "nanosecond" | "nanoseconds" => Some(Self::Nanoseconds),
            _ => None,
        }
    }

    /// Nanoseconds per tick of this unit
    pub fn nanos_per_tick(self) -> f64 {
        match self {
            Self::Seconds => 1e9,
            Self::Milliseconds => 1e6,
            Self::Microseconds => 1e3,
            Self::Nanoseconds => 1.0,
        }
    }
}

/// Sheet selection for multi-tab workbooks: a name or a zero-based index
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SheetSelector {
    Index(usize),
    Name(String),
}

/// Raw shape of the YAML mapping document
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    columns: BTreeMap<String, ColumnDirective>,

    #[serde(default)]
    create_columns: BTreeMap<String, CreateColumnDirective>,

    #[serde(default, rename = "time format")]
    time_format: Option<String>,

    #[serde(default)]
    metadata: serde_yaml::Mapping,

    #[serde(default, rename = "epoch unit")]
    epoch_unit: Option<String>,

    #[serde(default)]
    skiprows: Option<usize>,

    #[serde(default)]
    time_data_tab: Option<SheetSelector>,
}

/// Parsed mapping document with the flattened directive maps.
///
/// Loaded once per run and passed by reference to every downstream stage.
#[derive(Debug, Clone, Default)]
pub struct MappingConfig {
    /// Explicit strptime pattern tried first by timestamp normalization
    pub time_format: Option<String>,

    /// Unit for numeric epoch offsets (default milliseconds)
    pub epoch_unit: EpochUnit,

    /// Leading records to skip before the header row
    pub skiprows: usize,

    /// Workbook tab holding the timeseries data
    pub time_data_tab: Option<SheetSelector>,

    /// Static header key/value pairs, in document order
    pub metadata: Vec<(String, String)>,

    /// Final column name -> unit key
    pub unit_map: HashMap<String, String>,

    /// Source column name -> new name
    pub rename_map: HashMap<String, String>,

    /// Source column name -> duplicated column name
    pub new_col_map: BTreeMap<String, String>,

    /// Created column name -> literal value
    pub create_col_map: BTreeMap<String, serde_yaml::Value>,

    /// Source columns dropped on read
    pub skip_columns: Vec<String>,
}

impl MappingConfig {
    /// Load and flatten a mapping document.
    ///
    /// Fails when the file is absent or not valid YAML. A `create_columns`
    /// entry without a `value` field is a non-fatal policy error: the column
    /// is skipped with a warning.
    pub fn load(path: &Path, diagnostics: &mut Diagnostics) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!(
                "could not read mapping document '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::from_yaml(&text, diagnostics)?;
        debug!(
            "Loaded mapping document '{}': {} column directives, {} created columns, {} skipped",
            path.display(),
            config.rename_map.len() + config.unit_map.len(),
            config.create_col_map.len(),
            config.skip_columns.len()
        );
        Ok(config)
    }

    /// Parse a mapping document from YAML text
    pub fn from_yaml(text: &str, diagnostics: &mut Diagnostics) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(text)?;
        let mut config = MappingConfig {
            time_format: raw.time_format,
            skiprows: raw.skiprows.unwrap_or(0),
            time_data_tab: raw.time_data_tab,
            ..Default::default()
        };

        if let Some(unit) = raw.epoch_unit.as_deref() {
            match EpochUnit::parse(unit) {
                Some(parsed) => config.epoch_unit = parsed,
                None => diagnostics.warn(format!(
                    "Unrecognized epoch unit '{}', defaulting to ms",
                    unit
                )),
            }
        }

        for (key, value) in raw.metadata {
            let key = yaml_scalar_to_string(&key).unwrap_or_default();
            let value = yaml_scalar_to_string(&value).unwrap_or_default();
            config.metadata.push((key, value));
        }

        for (name, directive) in raw.columns {
            if let Some(unit) = &directive.unit {
                config.unit_map.insert(name.clone(), unit.clone());
            }
            if let Some(rename) = &directive.rename {
                config.rename_map.insert(name.clone(), rename.clone());
                if let Some(unit) = &directive.unit {
                    config.unit_map.insert(rename.clone(), unit.clone());
                }
            }
            if let Some(new_name) = &directive.new_name {
                config.new_col_map.insert(name.clone(), new_name.clone());
                if let Some(unit) = &directive.unit {
                    config.unit_map.insert(new_name.clone(), unit.clone());
                }
            }
            if directive.skip {
                config.skip_columns.push(name.clone());
            }
        }

        for (name, directive) in raw.create_columns {
            match directive.value {
                Some(value) if !value.is_null() => {
                    config.create_col_map.insert(name.clone(), value);
                    if let Some(unit) = &directive.unit {
                        config.unit_map.insert(name.clone(), unit.clone());
                    }
                }
                _ => diagnostics.warn(format!(
                    "Warning: Will not create column {}, no value was given.",
                    name
                )),
            }
        }

        Ok(config)
    }
}

/// Render a YAML scalar the way it appears in the document
pub fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Null => Some(String::new()),
        _ => None,
    }
}
