use indexmap::IndexMap;
use serde::Deserialize;

use crate::types::DefinitionError;

const BUILTIN_SYSTEMS: &str = include_str!("../../data/systems.toml");

/// One presentation candidate: a unit, or `[n, unit]` to score the unit as
/// `n` of itself while still presenting in it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CandidateSpec {
    Unit(String),
    Multiple(f64, String),
}

impl CandidateSpec {
    pub fn abbreviation(&self) -> &str {
        match self {
            CandidateSpec::Unit(abbreviation) => abbreviation,
            CandidateSpec::Multiple(_, abbreviation) => abbreviation,
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            CandidateSpec::Unit(_) => 1.0,
            CandidateSpec::Multiple(n, _) => *n,
        }
    }
}

/// `{system: {dimension_type: [candidate, ...]}}`, in document order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct SystemsDefinition {
    pub systems: IndexMap<String, IndexMap<String, Vec<CandidateSpec>>>,
}

impl SystemsDefinition {
    pub fn from_json_str(json: &str) -> Result<Self, DefinitionError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self, DefinitionError> {
        Ok(toml::from_str(toml)?)
    }

    pub fn builtin() -> Result<Self, DefinitionError> {
        Self::from_toml_str(BUILTIN_SYSTEMS)
    }
}
