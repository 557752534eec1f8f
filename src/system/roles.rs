//! Role tables: a pinned unit expression per role and unit system.
//!
//! As CSV, the header row names the systems and the first column the role:
//!
//! ```text
//! role,metric,US
//! widget_length,mm,in
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::DefinitionError;

/// `{role: {system: unit_expression}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleTable {
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl RoleTable {
    /// Create an empty role table
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin `unit` to `role` in `system`, replacing any previous pin
    pub fn insert(&mut self, role: impl Into<String>, system: impl Into<String>, unit: impl Into<String>) {
        self.entries
            .entry(role.into())
            .or_default()
            .insert(system.into(), unit.into());
    }

    /// Unit pinned to `role` in `system`
    pub fn get(&self, role: &str, system: &str) -> Option<&str> {
        self.entries
            .get(role)
            .and_then(|pins| pins.get(system))
            .map(String::as_str)
    }

    /// Names of every role in the table
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Every `(role, system, unit)` entry.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.entries.iter().flat_map(|(role, pins)| {
            pins.iter()
                .map(move |(system, unit)| (role.as_str(), system.as_str(), unit.as_str()))
        })
    }

    /// Number of roles
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse `{role: {system: unit}}` JSON
    pub fn from_json_str(json: &str) -> Result<Self, DefinitionError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a CSV whose header is `role` followed by system names
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DefinitionError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let systems: Vec<String> = csv_reader
            .headers()?
            .iter()
            .skip(1)
            .map(str::to_string)
            .collect();
        if systems.is_empty() || systems.iter().any(String::is_empty) {
            return Err(DefinitionError::InvalidFormat(
                "role table header must name each unit system".to_string(),
            ));
        }

        let mut table = RoleTable::new();
        for record in csv_reader.records() {
            let record = record?;
            let role = match record.get(0) {
                Some(role) if !role.is_empty() => role,
                _ => continue,
            };
            for (system, unit) in systems.iter().zip(record.iter().skip(1)) {
                if !unit.is_empty() {
                    table.insert(role, system.as_str(), unit);
                }
            }
        }
        Ok(table)
    }

    /// Parse role CSV text
    pub fn from_csv_str(text: &str) -> Result<Self, DefinitionError> {
        Self::from_csv_reader(text.as_bytes())
    }

    /// Load a role CSV file
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, DefinitionError> {
        let file = File::open(path)?;
        Self::from_csv_reader(file)
    }
}
