//! VDF Converter Library
//!
//! A Rust library for converting vendor-specific battery-test data files
//! (CSV, RTF, Excel) into the standardized tab-delimited VDF format consumed
//! by downstream analysis tools.
//!
//! This library provides tools for:
//! - Parsing YAML mapping documents into column/unit directives
//! - Reading delimited and spreadsheet input with skip-row and tab selection
//! - Reshaping tables: renames, derived columns, NaN-row pruning, timestamp
//!   normalization and Test Time derivation
//! - Inferring physical units from parenthesized column-name hints
//! - Validating structural invariants on the result (diagnostic only)
//! - Writing the VDF header block, sentinel line and unit-augmented data

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod converter;
        pub mod formatter;
        pub mod reader;
        pub mod units;
        pub mod validator;
        pub mod writer;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{Diagnostics, HeaderBlock, Table};
pub use app::services::converter::{ConversionReport, VdfConverter};
pub use app::services::units::registry::UnitRegistry;
pub use config::MappingConfig;

/// Result type alias for the VDF converter
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for VDF conversion operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing error
    #[error("CSV parsing error in file '{file}': {message}")]
    CsvParsing {
        file: String,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// Spreadsheet reading error
    #[error("Spreadsheet error in file '{file}': {message}")]
    Spreadsheet {
        file: String,
        message: String,
        #[source]
        source: Option<calamine::Error>,
    },

    /// Configuration error (missing or invalid mapping document)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Unrecognized input file extension
    #[error("Could not read in file '{file}': unrecognized file format '{extension}'")]
    UnsupportedFormat { file: String, extension: String },

    /// Workbook resolved to multiple tables with no tab selector
    #[error("Ambiguous sheet selection in file '{file}': {message}")]
    AmbiguousSheet { file: String, message: String },

    /// Unit registry error (unreadable or malformed unit reference dataset)
    #[error("Unit registry error: {message}")]
    UnitRegistry { message: String },

    /// Unit lookup failure
    #[error("Could not convert unit {unit}")]
    UnitResolution { unit: String },

    /// Conversion run failure
    #[error("Conversion error: {message}")]
    Conversion { message: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a CSV parsing error with context
    pub fn csv_parsing(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::CsvParsing {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a spreadsheet error with context
    pub fn spreadsheet(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<calamine::Error>,
    ) -> Self {
        Self::Spreadsheet {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an unsupported-format error
    pub fn unsupported_format(file: impl Into<String>, extension: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            file: file.into(),
            extension: extension.into(),
        }
    }

    /// Create an ambiguous-sheet error
    pub fn ambiguous_sheet(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AmbiguousSheet {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a unit registry error
    pub fn unit_registry(message: impl Into<String>) -> Self {
        Self::UnitRegistry {
            message: message.into(),
        }
    }

    /// Create a unit resolution error
    pub fn unit_resolution(unit: impl Into<String>) -> Self {
        Self::UnitResolution { unit: unit.into() }
    }

    /// Create a conversion error
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::CsvParsing {
            file: "unknown".to_string(),
            message: "CSV parsing failed".to_string(),
            source: Some(error),
        }
    }
}

impl From<calamine::Error> for Error {
    fn from(error: calamine::Error) -> Self {
        Self::Spreadsheet {
            file: "unknown".to_string(),
            message: "Spreadsheet reading failed".to_string(),
            source: Some(error),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Configuration {
            message: format!("Invalid mapping document: {}", error),
        }
    }
}
