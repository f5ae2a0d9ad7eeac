//! Unit expressions as a multiplicative group
//!
//! A `UnitAlgebra` maps unit names to integer exponents. Zero exponents
//! are pruned on every mutation, so two algebras describing the same
//! product always compare equal.

use crate::RpnError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Product of named units raised to integer powers: `meter*kilogram/second^2`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitAlgebra {
    exponents: BTreeMap<String, i32>,
}

impl UnitAlgebra {
    /// The identity algebra (no units)
    pub fn new() -> Self {
        Self::default()
    }

    /// A single unit with exponent 1
    pub fn unit(name: impl Into<String>) -> Self {
        Self::from_pairs([(name.into(), 1)])
    }

    /// Build from (unit, exponent) pairs; repeated names accumulate
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, i32)>,
        S: Into<String>,
    {
        let mut algebra = Self::new();
        for (name, exponent) in pairs {
            algebra.adjust(name.into(), exponent);
        }
        algebra
    }

    fn adjust(&mut self, name: String, delta: i32) {
        let exponent = self.exponents.entry(name).or_insert(0);
        *exponent += delta;
        self.prune();
    }

    fn prune(&mut self) {
        self.exponents.retain(|_, exponent| *exponent != 0);
    }

    pub fn is_empty(&self) -> bool {
        self.exponents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.exponents.len()
    }

    /// Exponent of a unit (0 when absent)
    pub fn exponent(&self, name: &str) -> i32 {
        self.exponents.get(name).copied().unwrap_or(0)
    }

    /// Units with their exponents, in lexicographic order
    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.exponents.iter().map(|(name, exponent)| (name.as_str(), *exponent))
    }

    /// The unit name when this algebra is exactly one unit to the first power
    pub fn single_unit(&self) -> Option<&str> {
        match self.exponents.iter().next() {
            Some((name, 1)) if self.exponents.len() == 1 => Some(name.as_str()),
            _ => None,
        }
    }

    // ========== Group Operations ==========

    /// Add exponents
    pub fn multiply(&self, other: &Self) -> Self {
        let mut result = self.clone();
        for (name, exponent) in &other.exponents {
            *result.exponents.entry(name.clone()).or_insert(0) += exponent;
        }
        result.prune();
        result
    }

    /// Subtract exponents
    pub fn divide(&self, other: &Self) -> Self {
        self.multiply(&other.invert())
    }

    /// Negate every exponent
    pub fn invert(&self) -> Self {
        self.power(-1)
    }

    /// Multiply every exponent by `k`
    pub fn power(&self, k: i32) -> Self {
        let mut result = Self {
            exponents: self.exponents.iter()
                .map(|(name, exponent)| (name.clone(), exponent * k))
                .collect(),
        };
        result.prune();
        result
    }

    /// Divide every exponent by `k`; each must be divisible
    pub fn root(&self, k: u32) -> Result<Self, RpnError> {
        if k == 0 {
            return Err(RpnError::domain("zeroth root"));
        }
        let divisor = i32::try_from(k).map_err(|_| RpnError::Overflow)?;
        let mut exponents = BTreeMap::new();
        for (name, exponent) in &self.exponents {
            if exponent % divisor != 0 {
                return Err(RpnError::FractionalUnitExponent { unit: name.clone(), degree: k });
            }
            exponents.insert(name.clone(), exponent / divisor);
        }
        Ok(Self { exponents })
    }

    // ========== Canonical Form ==========

    /// Positive exponents first (`*`-joined, `^n` above 1), then `/` and the
    /// negative exponents the same way. Empty numerators render as `1`.
    pub fn to_canonical_string(&self) -> String {
        fn join<'a>(parts: impl Iterator<Item = (&'a String, i32)>) -> String {
            parts
                .map(|(name, exponent)| {
                    if exponent > 1 {
                        format!("{}^{}", name, exponent)
                    } else {
                        name.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join("*")
        }

        let numerator = join(self.exponents.iter()
            .filter(|(_, e)| **e > 0)
            .map(|(n, e)| (n, *e)));
        let denominator = join(self.exponents.iter()
            .filter(|(_, e)| **e < 0)
            .map(|(n, e)| (n, -*e)));

        match (numerator.is_empty(), denominator.is_empty()) {
            (_, true) => numerator,
            (true, false) => format!("1/{}", denominator),
            (false, false) => format!("{}/{}", numerator, denominator),
        }
    }

    /// Parse a canonical string, resolving every unit name through `resolve`
    /// (which maps names and aliases to catalog names).
    pub fn parse_with<F>(text: &str, resolve: F) -> Result<Self, RpnError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::new());
        }

        let mut sides = text.split('/');
        let numerator = sides.next().unwrap_or_default();
        let denominator = sides.next();
        if sides.next().is_some() {
            return Err(RpnError::Parse(format!("only one '/' is allowed in units: '{}'", text)));
        }

        let mut algebra = Self::new();
        Self::parse_product(numerator, 1, &resolve, &mut algebra)?;
        if let Some(denominator) = denominator {
            Self::parse_product(denominator, -1, &resolve, &mut algebra)?;
        }
        Ok(algebra)
    }

    fn parse_product<F>(text: &str, sign: i32, resolve: &F, algebra: &mut Self) -> Result<(), RpnError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for factor in text.split('*').map(str::trim).filter(|f| !f.is_empty()) {
            if factor == "1" {
                continue;
            }
            let (name, exponent) = match factor.split_once('^') {
                Some((name, exponent)) => {
                    let exponent: i32 = exponent.trim().parse()
                        .map_err(|_| RpnError::Parse(format!("invalid unit exponent in '{}'", factor)))?;
                    (name.trim(), exponent)
                }
                None => (factor, 1),
            };
            let canonical = resolve(name)
                .ok_or_else(|| RpnError::UndefinedUnit(name.to_string()))?;
            algebra.adjust(canonical, sign * exponent);
        }
        Ok(())
    }
}

impl fmt::Display for UnitAlgebra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str) -> Option<String> {
        Some(name.to_string())
    }

    fn force() -> UnitAlgebra {
        UnitAlgebra::from_pairs([("kilogram", 1), ("meter", 1), ("second", -2)])
    }

    #[test]
    fn test_zero_exponents_are_pruned() {
        let a = UnitAlgebra::from_pairs([("meter", 2), ("meter", -2), ("second", 1)]);
        assert_eq!(a.len(), 1);
        assert_eq!(a.exponent("meter"), 0);
    }

    #[test]
    fn test_multiply_by_inverse_is_identity() {
        let a = force();
        assert!(a.multiply(&a.invert()).is_empty());
        assert_eq!(a.divide(&a), UnitAlgebra::new());
    }

    #[test]
    fn test_canonical_string() {
        assert_eq!(force().to_canonical_string(), "kilogram*meter/second^2");
        assert_eq!(UnitAlgebra::from_pairs([("second", -1)]).to_canonical_string(), "1/second");
        assert_eq!(UnitAlgebra::new().to_canonical_string(), "");
        assert_eq!(UnitAlgebra::from_pairs([("meter", 3)]).to_string(), "meter^3");
    }

    #[test]
    fn test_parse_round_trip() {
        for algebra in [
            force(),
            UnitAlgebra::from_pairs([("second", -1)]),
            UnitAlgebra::from_pairs([("foot", 2), ("pound", 1), ("hour", -3), ("ampere", -1)]),
            UnitAlgebra::new(),
        ] {
            let text = algebra.to_canonical_string();
            assert_eq!(UnitAlgebra::parse_with(&text, identity).unwrap(), algebra);
        }
    }

    #[test]
    fn test_parse_resolves_aliases() {
        let resolve = |name: &str| match name {
            "m" | "meter" => Some("meter".to_string()),
            "s" | "second" => Some("second".to_string()),
            _ => None,
        };
        let parsed = UnitAlgebra::parse_with("m/s^2", resolve).unwrap();
        assert_eq!(parsed, UnitAlgebra::from_pairs([("meter", 1), ("second", -2)]));

        let err = UnitAlgebra::parse_with("m/furlong", resolve).unwrap_err();
        assert_eq!(err, RpnError::UndefinedUnit("furlong".to_string()));
    }

    #[test]
    fn test_parse_rejects_two_slashes() {
        assert!(UnitAlgebra::parse_with("meter/second/second", identity).is_err());
    }

    #[test]
    fn test_root_requires_divisible_exponents() {
        let area = UnitAlgebra::from_pairs([("meter", 2)]);
        assert_eq!(area.root(2).unwrap(), UnitAlgebra::unit("meter"));

        let err = force().root(2).unwrap_err();
        assert_eq!(err.to_string(), "cannot take the square root of 'kilogram'");
        let err = area.root(3).unwrap_err();
        assert_eq!(err.to_string(), "cannot take the cube root of 'meter'");
    }

    #[test]
    fn test_single_unit() {
        assert_eq!(UnitAlgebra::unit("foot").single_unit(), Some("foot"));
        assert_eq!(UnitAlgebra::from_pairs([("foot", 2)]).single_unit(), None);
        assert_eq!(force().single_unit(), None);
    }
}
