//! Quantities: a magnitude in base-dimension terms plus its symbolic spec and
//! dimension vector.

mod ops;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::registry::Unit;
use crate::types::{DimensionVector, Magnitude, Result, Spec, UnitError, UnitId};

/// A physical quantity.
///
/// `value` is always held in base-dimension terms; the spec only records how
/// the quantity was composed and is used to choose presentation units.
/// Arithmetic never mutates its operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    value: Magnitude,
    spec: Spec,
    vector: DimensionVector,
    abbreviation: Option<String>,
    name: Option<String>,
    role: Option<String>,
}

impl Quantity {
    /// Create a quantity from a base-dimension value, spec and vector
    pub fn new(value: impl Into<Magnitude>, spec: Spec, vector: DimensionVector) -> Self {
        Self {
            value: value.into(),
            spec,
            vector,
            abbreviation: None,
            name: None,
            role: None,
        }
    }

    /// A pure number over `dimensions` base dimensions.
    pub fn dimensionless(value: impl Into<Magnitude>, dimensions: usize) -> Self {
        Self::new(value, Spec::new(), DimensionVector::zeros(dimensions))
    }

    /// Attach `unit` to a bare number: `value * unit.value` with the unit's
    /// spec and vector.
    pub fn quantify(value: impl Into<Magnitude>, unit: &Unit) -> Self {
        Self::new(
            value.into().scale(unit.value()),
            unit.spec().to_vec(),
            unit.vector().clone(),
        )
    }

    /// Express a base-dimension magnitude as a count of `unit`.
    pub fn convert_to_scalar(value: impl Into<Magnitude>, unit: &Quantity) -> Magnitude {
        value.into().div(&unit.value)
    }

    /// Value in base dimensions
    pub fn value(&self) -> &Magnitude {
        &self.value
    }

    /// Signed unit ids the quantity was built from
    pub fn spec(&self) -> &[UnitId] {
        &self.spec
    }

    /// Dimension exponents
    pub fn vector(&self) -> &DimensionVector {
        &self.vector
    }

    /// Display unit set by [`Quantity::set_display_unit`]
    pub fn abbreviation(&self) -> Option<&str> {
        self.abbreviation.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Role used to pin a presentation unit
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Tag the quantity with a role
    pub fn set_role(&mut self, role: impl Into<String>) {
        self.role = Some(role.into());
    }

    /// Remove the role tag
    pub fn clear_role(&mut self) {
        self.role = None;
    }

    /// Builder form of [`Quantity::set_role`]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.set_role(role);
        self
    }

    /// Check if both quantities have the same dimensions
    pub fn is_compatible(&self, other: &Quantity) -> bool {
        self.vector == other.vector
    }

    /// Product of two quantities; specs concatenate and vectors add
    pub fn multiply(&self, other: &Quantity) -> Quantity {
        let mut spec = self.spec.clone();
        spec.extend_from_slice(&other.spec);
        Quantity::new(self.value.mul(&other.value), spec, &self.vector + &other.vector)
    }

    /// Quotient of two quantities; the divisor spec is negated
    pub fn divide(&self, other: &Quantity) -> Quantity {
        let mut spec = self.spec.clone();
        spec.extend(other.spec.iter().map(|id| -id));
        Quantity::new(self.value.div(&other.value), spec, &self.vector - &other.vector)
    }

    /// `1 / self`, inverting spec and vector.
    pub fn reciprocal(&self) -> Quantity {
        Quantity::new(
            self.value.map(|v| 1.0 / v),
            self.spec.iter().map(|id| -id).collect(),
            -&self.vector,
        )
    }

    /// Integer power by repeated multiplication. `pow(0)` is a dimensionless
    /// one and negative powers are reciprocals.
    pub fn pow(&self, n: i32) -> Quantity {
        if n == 0 {
            return Quantity::new(self.value.filled(1.0), Spec::new(), DimensionVector::zeros(self.vector.len()));
        }
        let mut result = self.clone_bare();
        for _ in 1..n.unsigned_abs() {
            result = result.multiply(self);
        }
        if n < 0 { result.reciprocal() } else { result }
    }

    /// [`Quantity::pow`] for a float exponent, which must be integral.
    pub fn powf(&self, n: f64) -> Result<Quantity> {
        if n.fract() != 0.0 || !n.is_finite() || n.abs() > i32::MAX as f64 {
            return Err(UnitError::InvalidOperation(format!(
                "exponent {n} is not an integer"
            )));
        }
        Ok(self.pow(n as i32))
    }

    /// Sum of two quantities with equal dimensions, keeping the left display metadata
    pub fn add(&self, other: &Quantity) -> Result<Quantity> {
        self.check_compatible(other)?;
        Ok(self.with_value(self.value.add(&other.value)))
    }

    /// Difference of two quantities with equal dimensions
    pub fn subtract(&self, other: &Quantity) -> Result<Quantity> {
        self.check_compatible(other)?;
        Ok(self.with_value(self.value.sub(&other.value)))
    }

    /// Multiply the value by a plain number
    pub fn scale(&self, factor: f64) -> Quantity {
        self.with_value(self.value.scale(factor))
    }

    /// Divide the value by a plain number
    pub fn divide_scalar(&self, divisor: f64) -> Quantity {
        self.with_value(self.value.map(|v| v / divisor))
    }

    /// `scalar / self`.
    pub fn reciprocal_scaled(&self, scalar: f64) -> Quantity {
        self.reciprocal().scale(scalar)
    }

    /// Present this quantity in `unit` from now on. The value is not
    /// rescaled; it stays in base-dimension terms.
    pub fn set_display_unit(&mut self, unit: &Unit) -> Result<()> {
        if self.vector != *unit.vector() {
            return Err(UnitError::incompatible(&self.vector, unit.vector()));
        }
        self.spec = unit.spec().to_vec();
        self.abbreviation = Some(unit.abbreviation().to_string());
        self.name = Some(unit.name().to_string());
        Ok(())
    }

    pub(crate) fn check_compatible(&self, other: &Quantity) -> Result<()> {
        if self.vector != other.vector {
            return Err(UnitError::incompatible(&self.vector, &other.vector));
        }
        Ok(())
    }

    fn with_value(&self, value: Magnitude) -> Quantity {
        Quantity {
            value,
            ..self.clone()
        }
    }

    fn clone_bare(&self) -> Quantity {
        Quantity::new(self.value.clone(), self.spec.clone(), self.vector.clone())
    }
}

impl From<&Unit> for Quantity {
    fn from(unit: &Unit) -> Self {
        Quantity {
            value: Magnitude::Scalar(unit.value()),
            spec: unit.spec().to_vec(),
            vector: unit.vector().clone(),
            abbreviation: Some(unit.abbreviation().to_string()),
            name: Some(unit.name().to_string()),
            role: None,
        }
    }
}

impl From<Unit> for Quantity {
    fn from(unit: Unit) -> Self {
        Quantity::from(&unit)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.vector)
    }
}
