use crate::types::DimensionVector;

/// Errors raised by the registry, the quantity algebra and the system engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitError {
    #[error("Unit or dimension type '{0}' is already defined")]
    DuplicateDefinition(String),

    #[error("Dimension type '{0}' is missing from the unit specification")]
    IncompleteSpecification(String),

    #[error("Unit '{0}' not recognised")]
    UnitNotFound(String),

    #[error("Unknown unit system: {0}")]
    UnknownSystem(String),

    #[error("No unit pinned for role: {0}")]
    UnknownRole(String),

    #[error("Unknown unit group: {0}")]
    UnknownGroup(String),

    #[error("Unknown SI prefix '{prefix}' requested for unit '{unit}'")]
    UnknownPrefix { prefix: String, unit: String },

    #[error("Incompatible dimensions: {left} vs {right}")]
    IncompatibleDimensions {
        left: DimensionVector,
        right: DimensionVector,
    },

    #[error("Unit string \"{input}\" invalid: {reason} (at \"{fragment}\")")]
    ParseError {
        input: String,
        fragment: String,
        reason: &'static str,
    },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("No unit system is loaded")]
    NoActiveSystem,
}

impl UnitError {
    pub(crate) fn parse(input: &str, fragment: &str, reason: &'static str) -> Self {
        UnitError::ParseError {
            input: input.to_string(),
            fragment: fragment.to_string(),
            reason,
        }
    }

    pub(crate) fn incompatible(left: &DimensionVector, right: &DimensionVector) -> Self {
        UnitError::IncompatibleDimensions {
            left: left.clone(),
            right: right.clone(),
        }
    }
}

/// Errors raised while reading declarative unit, system or role definitions.
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid definition: {0}")]
    InvalidFormat(String),

    #[error(transparent)]
    Unit(#[from] UnitError),
}
