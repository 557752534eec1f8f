//! Numeric magnitudes carried by quantities: a scalar or a column of values.

use std::fmt;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// The numeric part of a quantity, always expressed in base-dimension terms.
///
/// Binary operations broadcast a scalar over an array.
///
/// # Panics
/// Elementwise operations between two arrays of different lengths panic,
/// as the underlying `nalgebra` operations do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Magnitude {
    Scalar(f64),
    Array(DVector<f64>),
}

impl Magnitude {
    pub fn array(values: &[f64]) -> Self {
        Magnitude::Array(DVector::from_column_slice(values))
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Magnitude::Scalar(v) => Some(*v),
            Magnitude::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&DVector<f64>> {
        match self {
            Magnitude::Scalar(_) => None,
            Magnitude::Array(a) => Some(a),
        }
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        match self {
            Magnitude::Scalar(v) => Magnitude::Scalar(f(*v)),
            Magnitude::Array(a) => Magnitude::Array(a.map(f)),
        }
    }

    fn zip_with(&self, other: &Magnitude, f: impl Fn(f64, f64) -> f64) -> Self {
        match (self, other) {
            (Magnitude::Scalar(a), Magnitude::Scalar(b)) => Magnitude::Scalar(f(*a, *b)),
            (Magnitude::Scalar(a), Magnitude::Array(b)) => Magnitude::Array(b.map(|x| f(*a, x))),
            (Magnitude::Array(a), Magnitude::Scalar(b)) => Magnitude::Array(a.map(|x| f(x, *b))),
            (Magnitude::Array(a), Magnitude::Array(b)) => Magnitude::Array(a.zip_map(b, f)),
        }
    }

    pub fn mul(&self, other: &Magnitude) -> Self {
        self.zip_with(other, |a, b| a * b)
    }

    pub fn div(&self, other: &Magnitude) -> Self {
        self.zip_with(other, |a, b| a / b)
    }

    pub fn add(&self, other: &Magnitude) -> Self {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Magnitude) -> Self {
        self.zip_with(other, |a, b| a - b)
    }

    pub fn scale(&self, factor: f64) -> Self {
        self.map(|v| v * factor)
    }

    /// Same shape as `self`, every element set to `value`.
    pub fn filled(&self, value: f64) -> Self {
        self.map(|_| value)
    }

    /// Mean of `f` applied to every element (the element itself for scalars).
    pub fn mean_of(&self, f: impl Fn(f64) -> f64) -> f64 {
        match self {
            Magnitude::Scalar(v) => f(*v),
            Magnitude::Array(a) if a.is_empty() => f64::NAN,
            Magnitude::Array(a) => a.iter().map(|&x| f(x)).sum::<f64>() / a.len() as f64,
        }
    }
}

impl From<f64> for Magnitude {
    fn from(value: f64) -> Self {
        Magnitude::Scalar(value)
    }
}

impl From<DVector<f64>> for Magnitude {
    fn from(value: DVector<f64>) -> Self {
        Magnitude::Array(value)
    }
}

impl From<Vec<f64>> for Magnitude {
    fn from(value: Vec<f64>) -> Self {
        Magnitude::Array(DVector::from_vec(value))
    }
}

impl fmt::Display for Magnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Magnitude::Scalar(v) => write!(f, "{}", crate::display::format_significant(*v, 6)),
            Magnitude::Array(a) => {
                let parts: Vec<String> = a
                    .iter()
                    .map(|v| crate::display::format_significant(*v, 6))
                    .collect();
                write!(f, "[{}]", parts.join(" "))
            }
        }
    }
}
