//! Unit-aware operations over a built conversion graph

use crate::{seed, ConversionFactor, ConversionGraph, DimensionRegistry, UnitCatalog};
use rpn_core::{Measurement, Number, RpnError, UnitAlgebra, Value};
use std::sync::{Arc, LazyLock};

/// Dimensions, catalog and graph, frozen after the build
#[derive(Debug, Clone)]
pub struct UnitSystem {
    dimensions: DimensionRegistry,
    catalog: UnitCatalog,
    graph: ConversionGraph,
}

/// Standard unit system, built once per process on first use
pub static STANDARD_UNITS: LazyLock<Result<Arc<UnitSystem>, RpnError>> =
    LazyLock::new(|| UnitSystem::standard().map(Arc::new));

impl UnitSystem {
    pub fn from_parts(dimensions: DimensionRegistry, catalog: UnitCatalog, graph: ConversionGraph) -> Self {
        Self { dimensions, catalog, graph }
    }

    /// Build from the compiled-in seed tables
    pub fn standard() -> Result<Self, RpnError> {
        seed::standard_builder()?.build()
    }

    pub fn dimensions(&self) -> &DimensionRegistry {
        &self.dimensions
    }

    pub fn catalog(&self) -> &UnitCatalog {
        &self.catalog
    }

    pub fn graph(&self) -> &ConversionGraph {
        &self.graph
    }

    // ========== Lookup ==========

    /// Catalog name for a unit term (name, plural, abbreviation or alias)
    pub fn resolve_unit(&self, term: &str) -> Option<&str> {
        self.catalog.resolve(term)
    }

    /// Parse a unit expression such as `"ft"`, `"meter/second^2"`, `"m/s"`
    pub fn parse_units(&self, text: &str) -> Result<UnitAlgebra, RpnError> {
        if let Some(name) = self.catalog.resolve(text.trim()) {
            return Ok(UnitAlgebra::unit(name));
        }
        UnitAlgebra::parse_with(text, |name| self.catalog.resolve(name).map(str::to_string))
    }

    pub fn dimension_of(&self, unit: &str) -> Result<&str, RpnError> {
        self.catalog.dimension_of(unit)
            .ok_or_else(|| RpnError::UndefinedUnit(unit.to_string()))
    }

    fn base_unit_of(&self, unit: &str) -> Result<&str, RpnError> {
        let dimension = self.dimension_of(unit)?;
        self.dimensions.base_unit(dimension)
            .ok_or_else(|| RpnError::UnitBuild(format!("dimension '{}' is not registered", dimension)))
    }

    /// Exponents over primitive dimensions
    pub fn signature(&self, units: &UnitAlgebra) -> Result<UnitAlgebra, RpnError> {
        let mut signature = UnitAlgebra::new();
        for (unit, exponent) in units.iter() {
            let dimension = self.dimension_of(unit)?;
            let unit_signature = self.dimensions.signature(dimension)
                .ok_or_else(|| RpnError::UnitBuild(format!("dimension '{}' is not registered", dimension)))?;
            signature = signature.multiply(&unit_signature.power(exponent));
        }
        Ok(signature)
    }

    /// Dimension name for messages: the registered name when one matches,
    /// the signature otherwise
    pub fn describe_dimension(&self, units: &UnitAlgebra) -> Result<String, RpnError> {
        let signature = self.signature(units)?;
        if signature.is_empty() {
            return Ok("constant".to_string());
        }
        let named = self.dimensions.iter()
            .find(|(_, def)| def.signature == signature)
            .map(|(name, _)| name.to_string());
        Ok(named.unwrap_or_else(|| signature.to_canonical_string()))
    }

    pub fn compatible(&self, left: &UnitAlgebra, right: &UnitAlgebra) -> Result<bool, RpnError> {
        Ok(self.signature(left)? == self.signature(right)?)
    }

    // ========== Conversion ==========

    fn convert_single(&self, value: &Number, from: &str, to: &str, precision: u32) -> Result<Number, RpnError> {
        if let Some(result) = self.graph.step(value, from, to, precision) {
            return result;
        }

        // one hop through the base unit covers units outside the closure
        let base = self.base_unit_of(from)?;
        if base != from && base != to {
            if let Some(via) = self.graph.step(value, from, base, precision) {
                let via = via?;
                if let Some(result) = self.graph.step(&via, base, to, precision) {
                    return result;
                }
            }
        }
        Err(RpnError::no_known_conversion(from, to))
    }

    /// Product of each unit's factor to its dimension's base unit
    fn factor_to_base(&self, units: &UnitAlgebra) -> Result<ConversionFactor, RpnError> {
        let mut total = ConversionFactor::one();
        for (unit, exponent) in units.iter() {
            let base = self.base_unit_of(unit)?;
            if unit == base {
                continue;
            }
            let factor = self.graph.factor(unit, base)
                .ok_or_else(|| RpnError::no_known_conversion(unit, base))?;
            total = total.mul(&factor.pow(exponent)?);
        }
        Ok(total)
    }

    /// Re-express `value` given in `from` units in `to` units
    pub fn convert_value(&self, value: &Number, from: &UnitAlgebra, to: &UnitAlgebra, precision: u32) -> Result<Number, RpnError> {
        if from == to {
            return Ok(value.clone());
        }
        if !self.compatible(from, to)? {
            return Err(RpnError::incompatible_units(
                self.describe_dimension(from)?,
                self.describe_dimension(to)?,
            ));
        }

        if let (Some(a), Some(b)) = (from.single_unit(), to.single_unit()) {
            match self.convert_single(value, a, b, precision) {
                Err(RpnError::NoKnownConversion { .. }) => {}
                result => return result,
            }
        }

        let factor = self.factor_to_base(from)?.checked_div(&self.factor_to_base(to)?)?;
        Ok(factor.apply(value))
    }

    pub fn convert(&self, measurement: &Measurement, to: &UnitAlgebra, precision: u32) -> Result<Measurement, RpnError> {
        let value = self.convert_value(&measurement.value, &measurement.units, to, precision)?;
        Ok(Measurement::new(value, to.clone()))
    }

    /// Sum in the left operand's units
    pub fn add(&self, left: &Measurement, right: &Measurement, precision: u32) -> Result<Measurement, RpnError> {
        let right = self.convert_value(&right.value, &right.units, &left.units, precision)?;
        Ok(Measurement::new(left.value.add(&right), left.units.clone()))
    }

    /// Difference in the left operand's units
    pub fn subtract(&self, left: &Measurement, right: &Measurement, precision: u32) -> Result<Measurement, RpnError> {
        let right = self.convert_value(&right.value, &right.units, &left.units, precision)?;
        Ok(Measurement::new(left.value.sub(&right), left.units.clone()))
    }

    /// Attach a unit to a number. Units of the constant dimension
    /// (`dozen`, `percent`) collapse straight to a scalar.
    pub fn attach(&self, value: &Number, unit: &str) -> Result<Value, RpnError> {
        let name = self.resolve_unit(unit)
            .ok_or_else(|| RpnError::UndefinedUnit(unit.to_string()))?;
        if self.dimension_of(name)? == "constant" {
            let base = self.base_unit_of(name)?;
            if name == base {
                return Ok(Value::Scalar(value.clone()));
            }
            let factor = self.graph.factor(name, base)
                .ok_or_else(|| RpnError::no_known_conversion(name, base))?;
            return Ok(Value::Scalar(factor.apply(value)));
        }
        Ok(Value::Measurement(Measurement::of_unit(value.clone(), name)))
    }

    // ========== Display ==========

    /// `4 feet`, `1 foot`, `9.81 meter/second^2`
    pub fn describe(&self, measurement: &Measurement) -> String {
        let singular = measurement.value == Number::from_i64(1);
        if let Some(unit) = measurement.units.single_unit() {
            if let Some(def) = self.catalog.get(unit) {
                return format!("{} {}", measurement.value, def.display(!singular));
            }
        }
        measurement.to_string()
    }

    /// Render any value, measurements with their display names
    pub fn render(&self, value: &Value) -> String {
        match value {
            Value::Measurement(m) => self.describe(m),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| self.render(v)).collect();
                format!("[ {} ]", parts.join(", "))
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units() -> Arc<UnitSystem> {
        match &*STANDARD_UNITS {
            Ok(system) => Arc::clone(system),
            Err(e) => panic!("standard units failed to build: {}", e),
        }
    }

    fn measure(value: &str, unit: &str) -> Measurement {
        Measurement::of_unit(Number::from_str(value).unwrap(), unit)
    }

    #[test]
    fn test_feet_plus_inches() {
        let units = units();
        let sum = units.add(&measure("3", "foot"), &measure("12", "inch"), 50).unwrap();
        assert_eq!(sum, measure("4", "foot"));
        assert_eq!(units.describe(&sum), "4 feet");
    }

    #[test]
    fn test_round_trip_same_dimension() {
        let units = units();
        for (a, b) in [("mile", "kilometer"), ("gallon", "liter"), ("pound", "gram"), ("day", "millisecond")] {
            let there = units.convert(&measure("1", a), &UnitAlgebra::unit(b), 50).unwrap();
            let back = units.convert(&there, &UnitAlgebra::unit(a), 50).unwrap();
            assert_eq!(back.value, Number::from_i64(1), "{} -> {} -> {}", a, b, a);
        }
    }

    #[test]
    fn test_incompatible_units() {
        let units = units();
        let result = units.add(&measure("1", "meter"), &measure("1", "second"), 50);
        assert_eq!(result, Err(RpnError::incompatible_units("length", "time")));
    }

    #[test]
    fn test_prefix_factor() {
        let units = units();
        let km = units.convert(&measure("1", "kilometer"), &UnitAlgebra::unit("meter"), 50).unwrap();
        assert_eq!(km.value, Number::from_i64(1000));
        let kib = units.convert(&measure("1", "kibibyte"), &UnitAlgebra::unit("bit"), 50).unwrap();
        assert_eq!(kib.value, Number::from_i64(8192));
        assert_eq!(units.resolve_unit("kilohm"), Some("kilohm"));
        assert_eq!(units.resolve_unit("kiloohm"), Some("kilohm"));
        assert_eq!(units.resolve_unit("hectare"), Some("hectare"));
    }

    #[test]
    fn test_compound_conversion() {
        let units = units();
        let speed = Measurement::new(Number::from_i64(1), units.parse_units("meter/second").unwrap());
        let mph = units.convert(&speed, &units.parse_units("mile/hour").unwrap(), 50).unwrap();
        assert!((mph.value.to_f64().unwrap() - 2.236936292).abs() < 1e-9);

        let named = units.convert(&speed, &UnitAlgebra::unit("kilometer_per_hour"), 50).unwrap();
        assert_eq!(named.value, Number::from_str("3.6").unwrap());
    }

    #[test]
    fn test_area_units() {
        let units = units();
        let acre = units.convert(&measure("1", "acre"), &UnitAlgebra::unit("square_foot"), 50).unwrap();
        assert_eq!(acre.value, Number::from_i64(43560));
        let hectare = units.convert(&measure("1", "hectare"), &units.parse_units("meter^2").unwrap(), 50).unwrap();
        assert_eq!(hectare.value, Number::from_i64(10000));
    }

    #[test]
    fn test_temperature() {
        let units = units();
        let boiling = units.convert(&measure("100", "celsius"), &UnitAlgebra::unit("fahrenheit"), 50).unwrap();
        assert_eq!(boiling.value, Number::from_i64(212));
        // through the base unit: millikelvin -> kelvin -> celsius
        let freezing = units.convert(&measure("273150", "millikelvin"), &UnitAlgebra::unit("celsius"), 50).unwrap();
        assert_eq!(freezing.value, Number::from_i64(0));

        let compound = Measurement::new(Number::from_i64(1), units.parse_units("celsius/second").unwrap());
        let result = units.convert(&compound, &units.parse_units("kelvin/second").unwrap(), 50);
        assert!(matches!(result, Err(RpnError::NoKnownConversion { .. })));
    }

    #[test]
    fn test_attach_constant_collapses() {
        let units = units();
        assert_eq!(units.attach(&Number::from_i64(3), "dozen").unwrap(), Value::from(36));
        assert_eq!(units.attach(&Number::from_i64(50), "percent").unwrap(), Value::Scalar(Number::from_str("0.5").unwrap()));
        assert_eq!(units.attach(&Number::from_i64(2), "ft").unwrap(), Value::Measurement(measure("2", "foot")));
        assert!(matches!(units.attach(&Number::from_i64(1), "blorf"), Err(RpnError::UndefinedUnit(_))));
    }

    #[test]
    fn test_signature_and_dimension_names() {
        let units = units();
        let force = units.parse_units("kilogram*meter/second^2").unwrap();
        assert_eq!(units.describe_dimension(&force).unwrap(), "force");
        assert!(units.compatible(&force, &UnitAlgebra::unit("newton")).unwrap());
        assert!(matches!(units.parse_units("meter/blorf"), Err(RpnError::UndefinedUnit(_))));
    }

    #[test]
    fn test_describe_singular() {
        let units = units();
        assert_eq!(units.describe(&measure("1", "foot")), "1 foot");
        assert_eq!(units.describe(&measure("2.5", "inch")), "2.5 inches");
    }
}
