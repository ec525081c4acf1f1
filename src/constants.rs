//! Application constants for the VDF converter
//!
//! This module contains column-name constants, output layout markers,
//! default values, and the timestamp format tables used by the
//! best-effort normalization cascade.

// =============================================================================
// VDF Column Names
// =============================================================================

/// Standard column names in VDF data
pub mod columns {
    /// Elapsed test time, required in valid VDF output
    pub const TEST_TIME: &str = "Test Time";

    /// Wall-clock timestamp column (source for derived Test Time)
    pub const TIMESTAMP: &str = "Timestamp";

    /// Required measurement column
    pub const CURRENT: &str = "Current";

    /// Accepted voltage column names (either satisfies the requirement)
    pub const VOLTAGE: &str = "Voltage";
    pub const POTENTIAL: &str = "Potential";

    /// Optional cycle counter, non-decreasing when present
    pub const CYCLE_NUMBER: &str = "Cycle Number";
}

/// Columns excluded from the all-null row prune: a row whose only content is
/// time padding carries no measurement and is dropped.
pub const TIME_COLUMNS: &[&str] = &[columns::TEST_TIME, columns::TIMESTAMP];

// =============================================================================
// Header Metadata
// =============================================================================

/// Required metadata keys in the VDF header block
pub const START_TIME_KEY: &str = "Start Time";
pub const TIMEZONE_KEY: &str = "Timezone";

/// Timezone applied when the mapping document supplies none
pub const DEFAULT_TIMEZONE: &str = "America/Los_Angeles";

/// Start Time applied when no Timestamp column exists (epoch origin)
pub const DEFAULT_START_TIME: &str = "0";

// =============================================================================
// Output Layout
// =============================================================================

/// Sentinel line separating the header block from the data block
pub const DATA_START_MARKER: &str = "[DATA START]";

/// Output subdirectory created beside the input file
pub const VDF_DIR_NAME: &str = "VDF";

/// Suffix appended to the input base name for the output file
pub const VDF_FILE_SUFFIX: &str = "_VDF.csv";

/// Field delimiter of the VDF data block
pub const VDF_DELIMITER: u8 = b'\t';

// =============================================================================
// Units
// =============================================================================

/// Delimiter of the unit reference dataset (Key;Symbol;Name)
pub const UNIT_TABLE_DELIMITER: u8 = b';';

/// Canonical unit recorded for a derived Test Time column
pub const TEST_TIME_UNIT: &str = "second";

// =============================================================================
// Timestamp Formats
// =============================================================================

/// Render format for normalized timestamps (fraction printed only when non-zero)
pub const VDF_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Datetime formats tried by the flexible parsing cascade, in order
pub const FLEXIBLE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%y %H:%M:%S%.f",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
    "%d-%b-%Y %H:%M:%S",
];

/// Date-only formats tried after the datetime formats (time defaults to midnight)
pub const FLEXIBLE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%b-%Y"];
