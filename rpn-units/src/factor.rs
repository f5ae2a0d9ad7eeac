//! Exact conversion factors
//!
//! Factors are rationals so that reciprocals and transitive compositions
//! are exact: `inch -> foot` is exactly 1/12, never 0.08333...

use rpn_core::big::{IBig, RBig, UBig};
use rpn_core::{Number, RpnError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Multiplier taking a value in one unit to a value in another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FactorRepr", into = "FactorRepr")]
pub struct ConversionFactor(RBig);

#[derive(Serialize, Deserialize)]
struct FactorRepr {
    num: String,
    den: String,
}

impl ConversionFactor {
    pub fn one() -> Self {
        Self(RBig::ONE)
    }

    pub fn from_integer(n: i64) -> Self {
        Self(RBig::from(IBig::from(n)))
    }

    /// `10^power`, negative powers included
    pub fn power_of_ten(power: i32) -> Self {
        Self::power_of(10, power)
    }

    /// `2^power`
    pub fn power_of_two(power: i32) -> Self {
        Self::power_of(2, power)
    }

    fn power_of(base: u8, power: i32) -> Self {
        let magnitude = UBig::from(base).pow(power.unsigned_abs() as usize);
        if power >= 0 {
            Self(RBig::from(IBig::from(magnitude)))
        } else {
            Self(RBig::from_parts(IBig::ONE, magnitude))
        }
    }

    /// Parse an exact decimal, scientific or ratio literal:
    /// `"0.0254"`, `"1.602176634e-19"`, `"5/9"`
    pub fn parse(text: &str) -> Result<Self, RpnError> {
        let text = text.trim();
        if let Some((num, den)) = text.split_once('/') {
            return Self::parse(num)?.checked_div(&Self::parse(den)?);
        }

        let invalid = || RpnError::UnitBuild(format!("invalid conversion factor '{}'", text));

        let lower = text.to_lowercase();
        let (mantissa, exponent) = match lower.split_once('e') {
            Some((m, e)) => (m, e.parse::<i32>().map_err(|_| invalid())?),
            None => (lower.as_str(), 0),
        };
        let (negative, mantissa) = match mantissa.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, mantissa),
        };
        let (integer, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        let digits = format!("{}{}", integer, fraction);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let significand: IBig = digits.parse().map_err(|_| invalid())?;
        let significand = if negative { -significand } else { significand };
        let scale = Self::power_of_ten(exponent - fraction.len() as i32);
        Ok(Self(RBig::from(significand)).mul(&scale))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == RBig::ZERO
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self(&self.0 * &other.0)
    }

    pub fn checked_div(&self, other: &Self) -> Result<Self, RpnError> {
        if other.is_zero() {
            return Err(RpnError::DivisionByZero);
        }
        Ok(Self(&self.0 / &other.0))
    }

    /// Reciprocal; zero factors never make it into a graph
    pub fn inverse(&self) -> Result<Self, RpnError> {
        Self::one().checked_div(self)
    }

    pub fn pow(&self, exponent: i32) -> Result<Self, RpnError> {
        let mut result = Self::one();
        for _ in 0..exponent.unsigned_abs() {
            result = result.mul(self);
        }
        if exponent < 0 {
            result.inverse()
        } else {
            Ok(result)
        }
    }

    /// Apply to a number: `value * factor`
    pub fn apply(&self, value: &Number) -> Number {
        value.scale(&self.0)
    }

    pub fn to_number(&self) -> Number {
        Number::from_rational(&self.0)
    }
}

impl fmt::Display for ConversionFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.denominator() == &UBig::ONE {
            write!(f, "{}", self.0.numerator())
        } else {
            write!(f, "{}/{}", self.0.numerator(), self.0.denominator())
        }
    }
}

impl From<ConversionFactor> for FactorRepr {
    fn from(factor: ConversionFactor) -> Self {
        FactorRepr {
            num: factor.0.numerator().to_string(),
            den: factor.0.denominator().to_string(),
        }
    }
}

impl TryFrom<FactorRepr> for ConversionFactor {
    type Error = String;

    fn try_from(repr: FactorRepr) -> Result<Self, Self::Error> {
        let num: IBig = repr.num.parse().map_err(|_| format!("bad numerator '{}'", repr.num))?;
        let den: UBig = repr.den.parse().map_err(|_| format!("bad denominator '{}'", repr.den))?;
        if den == UBig::ZERO {
            return Err("zero denominator".to_string());
        }
        Ok(Self(RBig::from_parts(num, den)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal() {
        let inch = ConversionFactor::parse("0.0254").unwrap();
        assert_eq!(inch, ConversionFactor::parse("254/10000").unwrap());
        assert_eq!(inch.to_string(), "127/5000");
    }

    #[test]
    fn test_parse_scientific_and_ratio() {
        assert_eq!(ConversionFactor::parse("1.5e3").unwrap(), ConversionFactor::from_integer(1500));
        assert_eq!(ConversionFactor::parse("1e-3").unwrap(), ConversionFactor::power_of_ten(-3));
        assert_eq!(ConversionFactor::parse("5/9").unwrap().to_string(), "5/9");
        assert!(ConversionFactor::parse("abc").is_err());
        assert!(ConversionFactor::parse("1/0").is_err());
    }

    #[test]
    fn test_inverse_is_exact() {
        let twelve = ConversionFactor::from_integer(12);
        let inverse = twelve.inverse().unwrap();
        assert_eq!(inverse.mul(&twelve), ConversionFactor::one());
        assert_eq!(inverse.apply(&Number::from_i64(36)), Number::from_i64(3));
    }

    #[test]
    fn test_powers() {
        assert_eq!(ConversionFactor::power_of_two(10), ConversionFactor::from_integer(1024));
        let cubed = ConversionFactor::from_integer(3).pow(3).unwrap();
        assert_eq!(cubed, ConversionFactor::from_integer(27));
        assert_eq!(ConversionFactor::from_integer(2).pow(-1).unwrap().to_string(), "1/2");
    }

    #[test]
    fn test_serde_round_trip() {
        let factor = ConversionFactor::parse("0.45359237").unwrap();
        let json = serde_json::to_string(&factor).unwrap();
        let back: ConversionFactor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, factor);
    }
}
