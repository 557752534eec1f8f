//! Operator sugar over the named [`Quantity`] methods.
//!
//! `*` and `/` between quantities and units build compound quantities,
//! `scalar << &unit` attaches a unit to a number and `scalar >> &unit`
//! expresses a base magnitude in a unit. Addition is fallible and so only
//! available through [`Quantity::add`] and [`Quantity::subtract`].

use std::ops::{Div, Mul, Shl, Shr};

use super::Quantity;
use crate::registry::Unit;
use crate::types::Magnitude;

macro_rules! compound_ops {
    ($($lhs:ty, $rhs:ty);* $(;)?) => {$(
        impl Mul<$rhs> for $lhs {
            type Output = Quantity;

            fn mul(self, rhs: $rhs) -> Quantity {
                Quantity::from(self).multiply(&Quantity::from(rhs))
            }
        }

        impl Div<$rhs> for $lhs {
            type Output = Quantity;

            fn div(self, rhs: $rhs) -> Quantity {
                Quantity::from(self).divide(&Quantity::from(rhs))
            }
        }
    )*};
}

impl From<&Quantity> for Quantity {
    fn from(q: &Quantity) -> Self {
        q.clone()
    }
}

compound_ops! {
    &Quantity, &Quantity;
    Quantity, Quantity;
    Quantity, &Quantity;
    &Quantity, &Unit;
    Quantity, &Unit;
    &Unit, &Quantity;
    &Unit, &Unit;
}

macro_rules! scalar_ops {
    ($($target:ty),*) => {$(
        impl Mul<f64> for $target {
            type Output = Quantity;

            fn mul(self, rhs: f64) -> Quantity {
                Quantity::from(self).scale(rhs)
            }
        }

        impl Mul<$target> for f64 {
            type Output = Quantity;

            fn mul(self, rhs: $target) -> Quantity {
                Quantity::from(rhs).scale(self)
            }
        }

        impl Div<f64> for $target {
            type Output = Quantity;

            fn div(self, rhs: f64) -> Quantity {
                Quantity::from(self).divide_scalar(rhs)
            }
        }

        impl Div<$target> for f64 {
            type Output = Quantity;

            fn div(self, rhs: $target) -> Quantity {
                Quantity::from(rhs).reciprocal_scaled(self)
            }
        }
    )*};
}

scalar_ops!(&Quantity, Quantity, &Unit);

impl Shl<&Unit> for f64 {
    type Output = Quantity;

    fn shl(self, unit: &Unit) -> Quantity {
        Quantity::quantify(self, unit)
    }
}

impl Shl<&Unit> for Magnitude {
    type Output = Quantity;

    fn shl(self, unit: &Unit) -> Quantity {
        Quantity::quantify(self, unit)
    }
}

impl Shl<&Quantity> for f64 {
    type Output = Quantity;

    fn shl(self, unit: &Quantity) -> Quantity {
        Quantity::new(unit.value().scale(self), unit.spec().to_vec(), unit.vector().clone())
    }
}

impl Shr<&Unit> for f64 {
    type Output = f64;

    fn shr(self, unit: &Unit) -> f64 {
        unit.convert_to_scalar(self)
    }
}

impl Shr<&Quantity> for f64 {
    type Output = Magnitude;

    fn shr(self, unit: &Quantity) -> Magnitude {
        Quantity::convert_to_scalar(self, unit)
    }
}
