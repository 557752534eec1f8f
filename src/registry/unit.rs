use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{DimensionVector, Magnitude, Spec, UnitId};

/// A named unit owned by a [`Registry`](super::Registry).
///
/// `value` is the size of one of this unit in base-dimension terms. Every
/// unit `u` has a registered inverse `-u` with reciprocal value and negated
/// vector and spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub(crate) id: UnitId,
    pub(crate) abbreviation: String,
    pub(crate) name: String,
    pub(crate) value: f64,
    pub(crate) spec: Spec,
    pub(crate) vector: DimensionVector,
    pub(crate) dimension_type: Option<UnitId>,
}

impl Unit {
    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn abbreviation(&self) -> &str {
        &self.abbreviation
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn spec(&self) -> &[UnitId] {
        &self.spec
    }

    pub fn vector(&self) -> &DimensionVector {
        &self.vector
    }

    /// Signed dimension-type id, negative for inverse units. `None` for
    /// compound units synthesized from expressions.
    pub fn dimension_type(&self) -> Option<UnitId> {
        self.dimension_type
    }

    pub fn is_inverse(&self) -> bool {
        self.id < 0
    }

    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.vector == other.vector
    }

    /// Express a base-dimension magnitude as a count of this unit.
    pub fn convert_to_scalar(&self, value: f64) -> f64 {
        value / self.value
    }

    /// Array-capable form of [`Unit::convert_to_scalar`].
    pub fn convert_magnitude(&self, value: &Magnitude) -> Magnitude {
        value.map(|v| v / self.value)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation)
    }
}
