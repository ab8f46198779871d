//! Country code directory: display names and approximate centroids.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error_handling::InitializationError;

const BUILTIN_TABLE: &str = include_str!("../../assets/countries.json");

/// Resolves ISO 3166-1 alpha-2 codes to display names and centroid coordinates.
pub trait CountryDirectory: Send + Sync {
    /// Display name for `code`, if known. Blank codes resolve to `None`.
    fn name(&self, code: &str) -> Option<String>;

    /// Approximate `(latitude, longitude)` of the country's centroid.
    fn centroid(&self, code: &str) -> Option<(f64, f64)>;
}

#[derive(Debug, Clone, Deserialize)]
struct CountryEntry {
    name: String,
    lat: f64,
    lon: f64,
}

/// Table-backed [`CountryDirectory`].
///
/// Lookups are case-insensitive; the table is keyed by upper-case codes.
#[derive(Debug, Clone)]
pub struct CountryTable {
    entries: HashMap<String, CountryEntry>,
}

impl CountryTable {
    /// The table compiled into the binary.
    pub fn builtin() -> Result<Self, InitializationError> {
        Self::from_json(BUILTIN_TABLE)
    }

    /// Loads a replacement table from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, InitializationError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            InitializationError::CountryTableError(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, InitializationError> {
        let parsed: HashMap<String, CountryEntry> = serde_json::from_str(raw)
            .map_err(|e| InitializationError::CountryTableError(e.to_string()))?;
        let entries = parsed
            .into_iter()
            .map(|(code, entry)| (code.trim().to_ascii_uppercase(), entry))
            .collect();
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, code: &str) -> Option<&CountryEntry> {
        let code = code.trim();
        if code.is_empty() {
            return None;
        }
        self.entries.get(&code.to_ascii_uppercase())
    }
}

impl CountryDirectory for CountryTable {
    fn name(&self, code: &str) -> Option<String> {
        self.entry(code).map(|e| e.name.clone())
    }

    fn centroid(&self, code: &str) -> Option<(f64, f64)> {
        self.entry(code).map(|e| (e.lat, e.lon))
    }
}
