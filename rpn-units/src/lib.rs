//! RPN Units - dimensional analysis and unit conversion
//!
//! Units form an algebra of named exponents. Each unit belongs to a
//! dimension whose signature over the primitive dimensions decides
//! additive compatibility. Conversion factors live in a graph that is
//! built once from sparse seed tables:
//!
//! - reciprocal closure and a transitive fixpoint per signature
//! - `square_`/`cubic_` units for every length unit
//! - SI prefixes (and binary prefixes for information units)
//! - declared nonlinear conversions (temperature scales, dBm)
//!
//! The built system can be persisted as a versioned artifact and
//! reloaded on the next start.

mod artifact;
mod builder;
mod dimension;
mod factor;
mod graph;
mod seed;
mod system;
mod unit;

pub use artifact::FORMAT_VERSION;
pub use builder::{prefixed_name, ConversionGraphBuilder, Prefix, BINARY_PREFIXES, METRIC_PREFIXES};
pub use dimension::{DimensionDefinition, DimensionRegistry};
pub use factor::ConversionFactor;
pub use graph::{ConversionGraph, NonlinearFn};
pub use seed::{standard_builder, standard_nonlinear};
pub use system::{UnitSystem, STANDARD_UNITS};
pub use unit::{PrefixSet, UnitCatalog, UnitDefinition};

#[cfg(test)]
mod tests {
    use super::*;
    use rpn_core::{Measurement, Number, UnitAlgebra};

    fn standard() -> std::sync::Arc<UnitSystem> {
        match &*STANDARD_UNITS {
            Ok(system) => std::sync::Arc::clone(system),
            Err(e) => panic!("standard units failed to build: {}", e),
        }
    }

    #[test]
    fn test_every_prefix_converts_to_its_base() {
        let units = standard();
        for base in ["meter", "gram", "second", "liter", "watt", "joule"] {
            for prefix in METRIC_PREFIXES {
                let name = prefixed_name(prefix.name, base);
                let resolved = units.resolve_unit(&name)
                    .unwrap_or_else(|| panic!("{} is not in the catalog", name));
                let one = Measurement::of_unit(Number::from_i64(1), resolved);
                let converted = units.convert(&one, &UnitAlgebra::unit(base), 50).unwrap();
                assert_eq!(converted.value, ConversionFactor::power_of_ten(prefix.power).to_number(), "{}", name);
            }
        }
    }

    #[test]
    fn test_every_base_unit_is_cataloged() {
        let units = standard();
        for (name, def) in units.dimensions().iter() {
            assert!(units.catalog().contains(&def.base_unit), "{} base {}", name, def.base_unit);
        }
    }

    #[test]
    fn test_closure_is_complete_for_seed_paths() {
        let units = standard();
        let graph = units.graph();
        // seed paths of length up to three and beyond
        for (a, b) in [("league", "inch"), ("furlong", "meter"), ("acre", "hectare"), ("teaspoon", "liter"), ("gross", "unity")] {
            assert!(graph.factor(a, b).is_some(), "{} -> {}", a, b);
            assert!(graph.factor(b, a).is_some(), "{} -> {}", b, a);
        }
    }

    #[test]
    fn test_standard_build_is_deterministic() {
        let first = UnitSystem::standard().unwrap();
        let units = standard();
        assert_eq!(first.catalog(), units.catalog());
        let left: Vec<_> = first.graph().edges().collect();
        let right: Vec<_> = units.graph().edges().collect();
        assert_eq!(left, right);
    }
}
