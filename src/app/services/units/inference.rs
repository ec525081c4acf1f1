//! Unit inference from column names
//!
//! Vendor files routinely encode the unit in the column name, e.g.
//! `Current(A)` or `Cell Temperature(degC)`. For every column the mapping
//! document left unmapped, the trailing parenthesized hint is resolved
//! against the registry. Unresolvable hints never fail the run; each
//! distinct failure is reported once.

use super::registry::UnitRegistry;
use crate::app::models::Diagnostics;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

/// Matches `<label>(<unit-hint>)` at the end of a column name
static UNIT_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*\((?P<unit>.+)\)$").unwrap());

/// Augment `unit_map` with units inferred from column names.
///
/// Columns already present in the map keep their explicit unit. Failure
/// messages are deduplicated: many columns sharing one bad hint produce a
/// single warning.
pub fn infer_units(
    columns: &[String],
    unit_map: &mut HashMap<String, String>,
    registry: &UnitRegistry,
    diagnostics: &mut Diagnostics,
) {
    for column in columns {
        if unit_map.contains_key(column) {
            continue;
        }
        let Some(captures) = UNIT_HINT.captures(column) else {
            continue;
        };
        let hint = &captures["unit"];
        match registry.resolve(hint) {
            Ok(key) => {
                debug!("Inferred unit '{}' for column '{}'", key, column);
                unit_map.insert(column.clone(), key.to_string());
            }
            Err(e) => diagnostics.warn_once(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (UnitRegistry, HashMap<String, String>, Diagnostics) {
        (
            UnitRegistry::embedded().unwrap(),
            HashMap::new(),
            Diagnostics::new(),
        )
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_infers_units_from_trailing_hint() {
        let (registry, mut unit_map, mut diagnostics) = setup();
        infer_units(
            &columns(&["Current(A)", "Voltage(V)", "Cell Temperature(degC)"]),
            &mut unit_map,
            &registry,
            &mut diagnostics,
        );

        assert_eq!(unit_map.get("Current(A)"), Some(&"amp".to_string()));
        assert_eq!(unit_map.get("Voltage(V)"), Some(&"volt".to_string()));
        assert_eq!(
            unit_map.get("Cell Temperature(degC)"),
            Some(&"degree_celsius".to_string())
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_existing_mapping_is_not_overwritten() {
        let (registry, mut unit_map, mut diagnostics) = setup();
        unit_map.insert("Current(A)".to_string(), "milliamp".to_string());

        infer_units(
            &columns(&["Current(A)"]),
            &mut unit_map,
            &registry,
            &mut diagnostics,
        );
        assert_eq!(unit_map.get("Current(A)"), Some(&"milliamp".to_string()));
    }

    #[test]
    fn test_columns_without_hint_are_ignored() {
        let (registry, mut unit_map, mut diagnostics) = setup();
        infer_units(
            &columns(&["Step Index", "Notes (see appendix) extra"]),
            &mut unit_map,
            &registry,
            &mut diagnostics,
        );
        assert!(unit_map.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unresolvable_hint_warns_once() {
        let (registry, mut unit_map, mut diagnostics) = setup();
        infer_units(
            &columns(&["Pressure(furlongs)", "Back Pressure(furlongs)"]),
            &mut unit_map,
            &registry,
            &mut diagnostics,
        );

        assert!(!unit_map.contains_key("Pressure(furlongs)"));
        assert!(!unit_map.contains_key("Back Pressure(furlongs)"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics.warnings()[0],
            "Could not convert unit furlongs"
        );
    }

    #[test]
    fn test_nested_parentheses_use_outermost_close() {
        let (registry, mut unit_map, mut diagnostics) = setup();
        // greedy prefix leaves the innermost parenthesized group as the hint
        infer_units(
            &columns(&["Energy (cumulative)(Wh)"]),
            &mut unit_map,
            &registry,
            &mut diagnostics,
        );
        assert_eq!(
            unit_map.get("Energy (cumulative)(Wh)"),
            Some(&"watt_hour".to_string())
        );
    }
}
