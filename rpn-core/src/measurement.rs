//! A number paired with a unit expression
//!
//! Only the purely algebraic operations live here. Anything that needs a
//! conversion factor (add, subtract, convert) goes through the unit system.

use crate::{Number, RpnError, UnitAlgebra, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value with units: `3 foot`, `9.81 meter/second^2`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: Number,
    pub units: UnitAlgebra,
}

impl Measurement {
    pub fn new(value: Number, units: UnitAlgebra) -> Self {
        Self { value, units }
    }

    /// `value` of a single named unit
    pub fn of_unit(value: Number, unit: &str) -> Self {
        Self::new(value, UnitAlgebra::unit(unit))
    }

    /// Collapse to a plain scalar when no units remain
    pub fn into_value(self) -> Value {
        if self.units.is_empty() {
            Value::Scalar(self.value)
        } else {
            Value::Measurement(self)
        }
    }

    /// Units compose, no conversion involved
    pub fn multiply(&self, other: &Self) -> Self {
        Self::new(self.value.mul(&other.value), self.units.multiply(&other.units))
    }

    pub fn divide(&self, other: &Self) -> Result<Self, RpnError> {
        Ok(Self::new(self.value.checked_div(&other.value)?, self.units.divide(&other.units)))
    }

    pub fn scale(&self, factor: &Number) -> Self {
        Self::new(self.value.mul(factor), self.units.clone())
    }

    pub fn negate(&self) -> Self {
        Self::new(self.value.neg(), self.units.clone())
    }

    pub fn reciprocal(&self) -> Result<Self, RpnError> {
        Ok(Self::new(Number::from_i64(1).checked_div(&self.value)?, self.units.invert()))
    }

    /// Raise to an integer power: every exponent is multiplied by `k`
    pub fn exponentiate(&self, k: i32) -> Result<Self, RpnError> {
        Ok(Self::new(self.value.pow(k)?, self.units.power(k)))
    }

    /// k-th root: every unit exponent must be divisible by `k`
    pub fn root(&self, k: u32, precision: u32) -> Result<Self, RpnError> {
        let units = self.units.root(k)?;
        Ok(Self::new(self.value.nth_root(k as i64, precision)?, units))
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.units)
    }
}
