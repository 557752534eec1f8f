//! Dimension vectors: one integer exponent per registered base dimension type.

use std::fmt;
use std::ops::{Add, Neg, Sub};

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Exponents over the base dimension types of a registry, in registration order.
///
/// Two quantities are dimensionally compatible iff their vectors are equal
/// element-wise. Vectors of different lengths (e.g. from different registries)
/// are zero-padded for arithmetic and never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionVector(DVector<i32>);

impl DimensionVector {
    /// All-zero vector over `len` base dimensions.
    pub fn zeros(len: usize) -> Self {
        DimensionVector(DVector::zeros(len))
    }

    /// One-hot vector with a 1 in slot `index`.
    pub fn unit(len: usize, index: usize) -> Self {
        let mut v = DVector::zeros(len);
        v[index] = 1;
        DimensionVector(v)
    }

    pub fn from_exponents(exponents: &[i32]) -> Self {
        DimensionVector(DVector::from_column_slice(exponents))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn exponents(&self) -> &[i32] {
        self.0.as_slice()
    }

    /// True when every exponent is zero.
    pub fn is_dimensionless(&self) -> bool {
        self.0.iter().all(|&e| e == 0)
    }

    pub fn is_compatible(&self, other: &DimensionVector) -> bool {
        self == other
    }

    pub fn scale(&self, factor: i32) -> Self {
        DimensionVector(&self.0 * factor)
    }

    fn padded(&self, len: usize) -> DVector<i32> {
        if self.0.len() == len {
            self.0.clone()
        } else {
            self.0.clone().resize_vertically(len, 0)
        }
    }

    fn combine(&self, other: &DimensionVector, sign: i32) -> Self {
        let len = self.len().max(other.len());
        DimensionVector(self.padded(len) + other.padded(len) * sign)
    }
}

impl Add for &DimensionVector {
    type Output = DimensionVector;

    fn add(self, rhs: &DimensionVector) -> DimensionVector {
        self.combine(rhs, 1)
    }
}

impl Sub for &DimensionVector {
    type Output = DimensionVector;

    fn sub(self, rhs: &DimensionVector) -> DimensionVector {
        self.combine(rhs, -1)
    }
}

impl Neg for &DimensionVector {
    type Output = DimensionVector;

    fn neg(self) -> DimensionVector {
        DimensionVector(-&self.0)
    }
}

impl fmt::Display for DimensionVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}
