//! Bridges between [`uom`] SI quantities and registry quantities.

use uom::si::area::square_meter;
use uom::si::energy::joule;
use uom::si::f64::{Area, Energy, Force, Length, Mass, Power, Pressure, Time, Velocity};
use uom::si::force::newton;
use uom::si::length::meter;
use uom::si::mass::kilogram;
use uom::si::power::watt;
use uom::si::pressure::pascal;
use uom::si::time::second;
use uom::si::velocity::meter_per_second;

use crate::context::UnitContext;
use crate::quantity::Quantity;
use crate::types::{Result, UnitError};

/// A statically typed SI quantity with a matching registry unit expression.
pub trait SiQuantity: Sized {
    /// Registry expression for the coherent SI unit of this quantity.
    const SI_UNIT: &'static str;

    fn si_value(&self) -> f64;

    fn from_si_value(value: f64) -> Self;
}

macro_rules! si_quantity {
    ($($quantity:ty => $unit:ty, $expr:literal;)*) => {$(
        impl SiQuantity for $quantity {
            const SI_UNIT: &'static str = $expr;

            fn si_value(&self) -> f64 {
                self.get::<$unit>()
            }

            fn from_si_value(value: f64) -> Self {
                <$quantity>::new::<$unit>(value)
            }
        }
    )*};
}

si_quantity! {
    Length => meter, "m";
    Mass => kilogram, "kg";
    Time => second, "s";
    Force => newton, "N";
    Pressure => pascal, "Pa";
    Velocity => meter_per_second, "m/s";
    Area => square_meter, "m2";
    Energy => joule, "J";
    Power => watt, "W";
}

impl UnitContext {
    /// Quantify a `uom` value through its SI unit.
    pub fn from_si<Q: SiQuantity>(&mut self, quantity: &Q) -> Result<Quantity> {
        self.quantify(quantity.si_value(), Q::SI_UNIT)
    }

    /// Convert a scalar quantity into a `uom` value, checking dimensions.
    pub fn to_si<Q: SiQuantity>(&mut self, quantity: &Quantity) -> Result<Q> {
        let unit = self.unit(Q::SI_UNIT)?;
        if unit.vector() != quantity.vector() {
            return Err(UnitError::incompatible(quantity.vector(), unit.vector()));
        }
        let value = quantity.value().as_scalar().ok_or_else(|| {
            UnitError::InvalidOperation("array quantities have no single SI value".to_string())
        })?;
        Ok(Q::from_si_value(unit.convert_to_scalar(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use uom::si::force::kilonewton;
    use uom::si::length::{foot, millimeter};
    use uom::si::pressure::pound_force_per_square_inch as psi;

    #[test]
    fn test_from_si_length() {
        let mut ctx = UnitContext::builtin().unwrap();
        let q = ctx.from_si(&Length::new::<foot>(10.0)).unwrap();
        let rendered = ctx.in_unit_str(&q, "ft").unwrap();
        assert_relative_eq!(rendered.scalar().unwrap(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_to_si_force() {
        let mut ctx = UnitContext::builtin().unwrap();
        let q = ctx.quantify(2.5, "kN").unwrap();
        let force: Force = ctx.to_si(&q).unwrap();
        assert_relative_eq!(force.get::<kilonewton>(), 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_pressure_round_trip() {
        let mut ctx = UnitContext::builtin().unwrap();
        let q = ctx.quantify(1.0, "psi").unwrap();
        let pressure: Pressure = ctx.to_si(&q).unwrap();
        assert_relative_eq!(pressure.get::<psi>(), 1.0, max_relative = 1e-9);
    }

    #[test]
    fn test_to_si_rejects_wrong_dimension() {
        let mut ctx = UnitContext::builtin().unwrap();
        let q = ctx.quantify(3.0, "kg").unwrap();
        let err = ctx.to_si::<Length>(&q).unwrap_err();
        assert!(matches!(err, UnitError::IncompatibleDimensions { .. }));
    }

    #[test]
    fn test_to_si_rejects_arrays() {
        let mut ctx = UnitContext::builtin().unwrap();
        let q = ctx.quantify(vec![1.0, 2.0], "mm").unwrap();
        assert!(matches!(
            ctx.to_si::<Length>(&q),
            Err(UnitError::InvalidOperation(_))
        ));
        let one = ctx.from_si(&Length::new::<millimeter>(1.0)).unwrap();
        assert_relative_eq!(one.value().as_scalar().unwrap(), 0.001, epsilon = 1e-15);
    }
}
