mod dimension;
mod error;
mod magnitude;

pub use dimension::DimensionVector;
pub use error::{DefinitionError, UnitError};
pub use magnitude::Magnitude;

/// Signed unit identifier. A negative id denotes division by the unit with
/// the matching positive id.
pub type UnitId = i32;

/// Ordered symbolic decomposition of a quantity into signed unit ids.
pub type Spec = Vec<UnitId>;

pub type Result<T> = std::result::Result<T, UnitError>;
