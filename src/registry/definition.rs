//! Declarative unit definitions, read from JSON or TOML documents.
//!
//! ```toml
//! base_types = ["length", "mass", "time"]
//!
//! [length]
//! _base = "m"
//! m = [1.0, "length", "meter", { SI_prefixes = ["k", "m"] }]
//! in = [25.4, "mm", "inch"]
//! ```
//!
//! Groups and the units inside them are processed in document order, so a
//! unit may derive from any unit defined before it.

use indexmap::IndexMap;
use serde::Deserialize;

use super::Registry;
use crate::types::{DefinitionError, Result, UnitError};

const BUILTIN_UNITS: &str = include_str!("../../data/units.toml");

/// A parsed unit definition document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawDefinition")]
pub struct UnitDefinition {
    pub base_types: Vec<String>,
    pub groups: Vec<DimensionGroup>,
}

/// Units sharing a dimension type, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionGroup {
    pub name: String,
    pub base: Option<BaseSpec>,
    pub units: Vec<UnitEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitEntry {
    pub abbreviation: String,
    pub multiplier: f64,
    pub derivation: Derivation,
    pub name: String,
    pub si_prefixes: Vec<String>,
}

/// The unit(s) a definition is a multiple of.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Derivation {
    Single(String),
    Product(Vec<String>),
}

impl Derivation {
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            Derivation::Single(token) => vec![token.as_str()],
            Derivation::Product(tokens) => tokens.iter().map(String::as_str).collect(),
        }
    }
}

/// The `_base` entry of a group. Both forms only designate an already
/// defined unit; the multiplier and name of the long form are informational.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BaseSpec {
    Abbreviation(String),
    Full(f64, String, String),
}

impl BaseSpec {
    pub fn abbreviation(&self) -> &str {
        match self {
            BaseSpec::Abbreviation(abbreviation) => abbreviation,
            BaseSpec::Full(_, abbreviation, _) => abbreviation,
        }
    }
}

#[derive(Deserialize)]
struct UnitOptions {
    #[serde(rename = "SI_prefixes", default)]
    si_prefixes: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawUnitEntry {
    WithOptions(f64, Derivation, String, UnitOptions),
    Plain(f64, Derivation, String),
}

impl RawUnitEntry {
    fn into_entry(self, abbreviation: String) -> UnitEntry {
        let (multiplier, derivation, name, si_prefixes) = match self {
            RawUnitEntry::WithOptions(m, d, n, options) => (m, d, n, options.si_prefixes),
            RawUnitEntry::Plain(m, d, n) => (m, d, n, Vec::new()),
        };
        UnitEntry {
            abbreviation,
            multiplier,
            derivation,
            name,
            si_prefixes,
        }
    }
}

#[derive(Deserialize)]
struct RawGroup {
    #[serde(rename = "_base", default)]
    base: Option<BaseSpec>,
    #[serde(flatten)]
    units: IndexMap<String, RawUnitEntry>,
}

#[derive(Deserialize)]
struct RawDefinition {
    #[serde(default)]
    base_types: Vec<String>,
    #[serde(flatten)]
    groups: IndexMap<String, RawGroup>,
}

impl From<RawDefinition> for UnitDefinition {
    fn from(raw: RawDefinition) -> Self {
        let groups = raw
            .groups
            .into_iter()
            .map(|(name, group)| DimensionGroup {
                name,
                base: group.base,
                units: group
                    .units
                    .into_iter()
                    .map(|(abbreviation, entry)| entry.into_entry(abbreviation))
                    .collect(),
            })
            .collect();
        UnitDefinition {
            base_types: raw.base_types,
            groups,
        }
    }
}

impl UnitDefinition {
    pub fn from_json_str(json: &str) -> std::result::Result<Self, DefinitionError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_toml_str(toml: &str) -> std::result::Result<Self, DefinitionError> {
        Ok(toml::from_str(toml)?)
    }
}

impl Registry {
    /// Build a registry from a parsed definition.
    ///
    /// Groups not listed in `base_types` become derived dimension types.
    /// Fails with `IncompleteSpecification` if any type ends up without units.
    pub fn from_definition(definition: &UnitDefinition) -> Result<Self> {
        if definition.base_types.is_empty() {
            return Err(UnitError::IncompleteSpecification("base_types".to_string()));
        }
        let mut registry = Registry::new();
        registry.register_dimension_types(&definition.base_types)?;

        for group in &definition.groups {
            if registry.dimension_type_id(&group.name).is_err() {
                registry.register_derived_type(&group.name)?;
            }
            for entry in &group.units {
                let prefixes: Vec<&str> = entry.si_prefixes.iter().map(String::as_str).collect();
                registry.define_unit(
                    &group.name,
                    &entry.abbreviation,
                    entry.multiplier,
                    &entry.derivation.tokens(),
                    &entry.name,
                    &prefixes,
                )?;
            }
            if let Some(base) = &group.base {
                registry.designate_base(&group.name, base.abbreviation())?;
            }
        }

        registry.verify_complete()?;
        tracing::info!(
            units = registry.len(),
            base_types = registry.dimension_count(),
            derived_types = registry.derived_type_ids().len(),
            "unit registry loaded"
        );
        Ok(registry)
    }

    pub fn from_json_str(json: &str) -> std::result::Result<Self, DefinitionError> {
        let definition = UnitDefinition::from_json_str(json)?;
        Ok(Self::from_definition(&definition)?)
    }

    pub fn from_toml_str(toml: &str) -> std::result::Result<Self, DefinitionError> {
        let definition = UnitDefinition::from_toml_str(toml)?;
        Ok(Self::from_definition(&definition)?)
    }

    /// The bundled SI and US customary units.
    pub fn builtin() -> std::result::Result<Self, DefinitionError> {
        Self::from_toml_str(BUILTIN_UNITS)
    }
}
