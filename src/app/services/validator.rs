//! Structural verification of the conversion result
//!
//! Diagnostic only: every finding is a warning and the run always proceeds
//! to write the output. Checks column presence, unit validity, duplicate
//! column keys, and the ordering invariants on Test Time and Cycle Number.

use crate::app::models::{HeaderBlock, Table};
use crate::app::services::units::registry::UnitRegistry;
use crate::constants::{START_TIME_KEY, TIMEZONE_KEY, columns};
use std::collections::HashSet;

/// Verify the formatted table, its units row and the header block.
///
/// Returns the findings; the caller decides how to report them.
pub fn validate(
    table: &Table,
    units_row: &[Option<String>],
    header: &HeaderBlock,
    registry: &UnitRegistry,
) -> Vec<String> {
    let mut warnings = Vec::new();
    verify_time_data(table, units_row, registry, &mut warnings);
    verify_metadata(header, &mut warnings);
    warnings
}

fn verify_time_data(
    table: &Table,
    units_row: &[Option<String>],
    registry: &UnitRegistry,
    warnings: &mut Vec<String>,
) {
    // Required columns
    if !table.has_column(columns::TEST_TIME) {
        warnings.push(format!(
            "Verification Warning: data is missing required column '{}'",
            columns::TEST_TIME
        ));
    }
    if !table.has_column(columns::CURRENT) {
        warnings.push(format!(
            "Verification Warning: data is missing required column '{}'",
            columns::CURRENT
        ));
    }
    if !table.has_column(columns::VOLTAGE) && !table.has_column(columns::POTENTIAL) {
        warnings.push(format!(
            "Verification Warning: data is missing required column '{}'/'{}'",
            columns::VOLTAGE,
            columns::POTENTIAL
        ));
    }

    // Units row exists and every unit is a known canonical key or empty
    if units_row.len() != table.width() {
        warnings.push(
            "Verification Warning: units row does not match the column count.".to_string(),
        );
    }
    for (column, unit) in table.columns().iter().zip(units_row) {
        if let Some(unit) = unit {
            if !registry.is_known_key(unit) {
                warnings.push(format!(
                    "Verification Warning: Unit '{}' for column '{}' is not valid.",
                    unit, column
                ));
            }
        }
    }

    // Duplicate column keys (lower-cased name + unit). Known limitation:
    // the key reflects the final names only, so a collision introduced by a
    // later effective-key change is not re-checked.
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for (column, unit) in table.columns().iter().zip(units_row) {
        let key = format!(
            "{}_{}",
            column.to_lowercase(),
            unit.as_deref().unwrap_or("None")
        );
        if !seen.insert(key.clone()) && reported.insert(key.clone()) {
            warnings.push(format!(
                "Verification Warning: Found duplicate column key {} - make sure column names are unique.",
                key
            ));
        }
    }

    // Ordering invariants
    if let Some(values) = table.column_values(columns::TEST_TIME) {
        if !is_monotonic_after_dedup(&values) {
            warnings.push(
                "Verification Warning: Test Time is not in ascending order. Check that it is not getting reset during the test."
                    .to_string(),
            );
        }
    }
    if let Some(values) = table.column_values(columns::CYCLE_NUMBER) {
        if !is_monotonic_after_dedup(&values) {
            warnings.push(
                "Verification Warning: Cycle Number is not in ascending order.".to_string(),
            );
        }
    }
}

fn verify_metadata(header: &HeaderBlock, warnings: &mut Vec<String>) {
    if !header.has_value(START_TIME_KEY) {
        warnings.push(format!(
            "Verification Warning: metadata is missing required value '{}'",
            START_TIME_KEY
        ));
    }
    if !header.has_value(TIMEZONE_KEY) {
        warnings.push(format!(
            "Verification Warning: metadata is missing required value '{}'",
            TIMEZONE_KEY
        ));
    }
}

/// Non-decreasing check after dropping repeated values (first occurrence
/// kept). Values compare numerically when every present value parses as a
/// number, lexicographically otherwise.
fn is_monotonic_after_dedup(values: &[Option<&str>]) -> bool {
    let present: Vec<&str> = values.iter().flatten().copied().collect();
    let mut seen = HashSet::new();
    let deduped: Vec<&str> = present
        .into_iter()
        .filter(|v| seen.insert(v.to_string()))
        .collect();

    let numeric: Option<Vec<f64>> = deduped.iter().map(|v| v.parse::<f64>().ok()).collect();
    match numeric {
        Some(numbers) => numbers.windows(2).all(|pair| pair[0] <= pair[1]),
        None => deduped.windows(2).all(|pair| pair[0] <= pair[1]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<Option<String>> {
        values
            .iter()
            .map(|v| {
                if v.is_empty() {
                    None
                } else {
                    Some(v.to_string())
                }
            })
            .collect()
    }

    fn registry() -> UnitRegistry {
        UnitRegistry::embedded().unwrap()
    }

    fn valid_header() -> HeaderBlock {
        let mut header = HeaderBlock::new();
        header.set("Start Time", "2021-06-01 08:30:00");
        header.set("Timezone", "America/Los_Angeles");
        header
    }

    fn vdf_table() -> (Table, Vec<Option<String>>) {
        let mut table = Table::new(vec![
            "Test Time".into(),
            "Current".into(),
            "Voltage".into(),
        ]);
        table.push_row(cells(&["0", "1.5", "3.7"]));
        table.push_row(cells(&["30", "1.6", "3.8"]));
        let units = vec![
            Some("second".to_string()),
            Some("amp".to_string()),
            Some("volt".to_string()),
        ];
        (table, units)
    }

    #[test]
    fn test_valid_table_produces_no_warnings() {
        let (table, units) = vdf_table();
        let warnings = validate(&table, &units, &valid_header(), &registry());
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    }

    #[test]
    fn test_missing_required_columns() {
        let table = Table::new(vec!["Potential".into()]);
        let units = vec![None];
        let warnings = validate(&table, &units, &valid_header(), &registry());

        assert!(warnings.iter().any(|w| w.contains("'Test Time'")));
        assert!(warnings.iter().any(|w| w.contains("'Current'")));
        // Potential satisfies the voltage requirement
        assert!(!warnings.iter().any(|w| w.contains("'Voltage'/'Potential'")));
    }

    #[test]
    fn test_unknown_unit_is_flagged() {
        let (table, mut units) = vdf_table();
        units[2] = Some("flux".to_string());
        let warnings = validate(&table, &units, &valid_header(), &registry());

        assert!(
            warnings
                .iter()
                .any(|w| w.contains("Unit 'flux' for column 'Voltage' is not valid."))
        );
    }

    #[test]
    fn test_duplicate_column_keys() {
        let mut table = Table::new(vec![
            "Test Time".into(),
            "Current".into(),
            "Voltage".into(),
            "voltage".into(),
        ]);
        table.push_row(cells(&["0", "1.5", "3.7", "3.7"]));
        let units = vec![
            Some("second".to_string()),
            Some("amp".to_string()),
            Some("volt".to_string()),
            Some("volt".to_string()),
        ];

        let warnings = validate(&table, &units, &valid_header(), &registry());
        assert!(
            warnings
                .iter()
                .any(|w| w.contains("duplicate column key voltage_volt"))
        );
    }

    #[test]
    fn test_test_time_reset_is_flagged() {
        let mut table = Table::new(vec![
            "Test Time".into(),
            "Current".into(),
            "Voltage".into(),
        ]);
        table.push_row(cells(&["0", "1.5", "3.7"]));
        table.push_row(cells(&["30", "1.6", "3.8"]));
        table.push_row(cells(&["5", "1.7", "3.9"]));
        let units = vec![Some("second".to_string()), None, None];

        let warnings = validate(&table, &units, &valid_header(), &registry());
        assert!(
            warnings
                .iter()
                .any(|w| w.contains("Test Time is not in ascending order"))
        );
    }

    #[test]
    fn test_repeated_test_time_values_are_allowed() {
        let mut table = Table::new(vec![
            "Test Time".into(),
            "Current".into(),
            "Voltage".into(),
        ]);
        table.push_row(cells(&["0", "1.5", "3.7"]));
        table.push_row(cells(&["0", "1.6", "3.8"]));
        table.push_row(cells(&["30", "1.7", "3.9"]));
        let units = vec![Some("second".to_string()), None, None];

        let warnings = validate(&table, &units, &valid_header(), &registry());
        assert!(
            !warnings
                .iter()
                .any(|w| w.contains("Test Time is not in ascending order"))
        );
    }

    #[test]
    fn test_cycle_number_ordering() {
        let mut table = Table::new(vec![
            "Test Time".into(),
            "Current".into(),
            "Voltage".into(),
            "Cycle Number".into(),
        ]);
        table.push_row(cells(&["0", "1.5", "3.7", "2"]));
        table.push_row(cells(&["30", "1.6", "3.8", "1"]));
        let units = vec![Some("second".to_string()), None, None, None];

        let warnings = validate(&table, &units, &valid_header(), &registry());
        assert!(
            warnings
                .iter()
                .any(|w| w.contains("Cycle Number is not in ascending order."))
        );
    }

    #[test]
    fn test_missing_metadata_values() {
        let (table, units) = vdf_table();
        let mut header = HeaderBlock::new();
        header.set("Start Time", "");

        let warnings = validate(&table, &units, &header, &registry());
        assert!(warnings.iter().any(|w| w.contains("'Start Time'")));
        assert!(warnings.iter().any(|w| w.contains("'Timezone'")));
    }
}
