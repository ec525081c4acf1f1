//! Canonical unit registry
//!
//! Loads the semicolon-delimited unit reference dataset (`Key;Symbol;Name`)
//! once at startup and answers pure lookups for the rest of the run. Lookup
//! order is exact canonical key, then exact symbol, then case-insensitive
//! human-readable name.

use crate::constants::UNIT_TABLE_DELIMITER;
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Unit table shipped with the binary, used when no dataset path is given
const DEFAULT_UNIT_TABLE: &str = include_str!("default_units.csv");

/// One row of the unit reference dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitEntry {
    /// Canonical unit key, e.g. `volt`
    pub key: String,
    /// Short symbol, e.g. `V`
    pub symbol: String,
    /// Human-readable name, e.g. `Volt`
    pub name: String,
}

/// Static lookup table from unit keys, symbols and names to canonical keys
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    entries: Vec<UnitEntry>,
    keys: HashSet<String>,
    symbol_to_key: HashMap<String, String>,
    // lower-cased name -> key
    name_to_key: HashMap<String, String>,
}

impl UnitRegistry {
    /// Load the registry from a unit reference dataset on disk
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            Error::unit_registry(format!(
                "could not open unit dataset '{}': {}",
                path.display(),
                e
            ))
        })?;
        let registry = Self::from_reader(file)?;
        debug!(
            "Loaded {} units from '{}'",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Load the embedded default unit table
    pub fn embedded() -> Result<Self> {
        Self::from_reader(DEFAULT_UNIT_TABLE.as_bytes())
    }

    fn from_reader(reader: impl Read) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(UNIT_TABLE_DELIMITER)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| Error::unit_registry(format!("unreadable unit dataset header: {}", e)))?
            .clone();
        let column = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    Error::unit_registry(format!("unit dataset is missing column '{}'", name))
                })
        };
        let key_idx = column("Key")?;
        let symbol_idx = column("Symbol")?;
        let name_idx = column("Name")?;

        let mut entries = Vec::new();
        for record in csv_reader.records() {
            let record = record
                .map_err(|e| Error::unit_registry(format!("malformed unit dataset row: {}", e)))?;
            let field = |idx: usize| record.get(idx).unwrap_or("").to_string();
            let entry = UnitEntry {
                key: field(key_idx),
                symbol: field(symbol_idx),
                name: field(name_idx),
            };
            if entry.key.is_empty() {
                continue;
            }
            entries.push(entry);
        }

        let keys = entries.iter().map(|e| e.key.clone()).collect();
        let symbol_to_key = entries
            .iter()
            .filter(|e| !e.symbol.is_empty())
            .map(|e| (e.symbol.clone(), e.key.clone()))
            .collect();
        let name_to_key = entries
            .iter()
            .filter(|e| !e.name.is_empty())
            .map(|e| (e.name.to_lowercase(), e.key.clone()))
            .collect();

        Ok(Self {
            entries,
            keys,
            symbol_to_key,
            name_to_key,
        })
    }

    /// Resolve a unit key, symbol or name to its canonical key.
    ///
    /// Keys and symbols match case-sensitively; names case-insensitively.
    pub fn resolve(&self, unit: &str) -> Result<&str> {
        if let Some(key) = self.keys.get(unit) {
            return Ok(key.as_str());
        }
        if let Some(key) = self.symbol_to_key.get(unit) {
            return Ok(key.as_str());
        }
        if let Some(key) = self.name_to_key.get(&unit.to_lowercase()) {
            return Ok(key.as_str());
        }
        Err(Error::unit_resolution(unit))
    }

    /// True when the value is already a canonical unit key
    pub fn is_known_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// All entries, in dataset order
    pub fn entries(&self) -> &[UnitEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_embedded_table_loads() {
        let registry = UnitRegistry::embedded().unwrap();
        assert!(!registry.is_empty());
        assert!(registry.is_known_key("second"));
        assert!(registry.is_known_key("volt"));
        assert!(registry.is_known_key("amp"));
    }

    #[test]
    fn test_lookup_order_key_symbol_name() {
        let registry = UnitRegistry::embedded().unwrap();
        assert_eq!(registry.resolve("volt").unwrap(), "volt");
        assert_eq!(registry.resolve("V").unwrap(), "volt");
        assert_eq!(registry.resolve("Volt").unwrap(), "volt");
    }

    #[test]
    fn test_symbols_case_sensitive_names_case_insensitive() {
        let registry = UnitRegistry::embedded().unwrap();
        // "V" is the volt symbol; lower-case "v" matches nothing
        assert_eq!(registry.resolve("V").unwrap(), "volt");
        assert!(registry.resolve("v").is_err());
        // names agree regardless of case
        assert_eq!(
            registry.resolve("Volt").unwrap(),
            registry.resolve("volt").unwrap()
        );
        assert_eq!(registry.resolve("DEGREE CELSIUS").unwrap(), "degree_celsius");
    }

    #[test]
    fn test_unresolvable_unit_message() {
        let registry = UnitRegistry::embedded().unwrap();
        let error = registry.resolve("furlongs").unwrap_err();
        assert_eq!(error.to_string(), "Could not convert unit furlongs");
    }

    #[test]
    fn test_from_path_with_custom_dataset() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"Key; Symbol; Name\nfurlong; fur; Furlong\n")
            .unwrap();

        let registry = UnitRegistry::from_path(file.path()).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve("fur").unwrap(), "furlong");
        assert_eq!(registry.resolve("FURLONG").unwrap(), "furlong");
    }

    #[test]
    fn test_missing_columns_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"Key; Abbrev\nvolt; V\n").unwrap();

        let result = UnitRegistry::from_path(file.path());
        assert!(matches!(result, Err(Error::UnitRegistry { .. })));
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = UnitRegistry::from_path(Path::new("/nonexistent/units.csv"));
        assert!(matches!(result, Err(Error::UnitRegistry { .. })));
    }
}
