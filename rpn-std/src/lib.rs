//! RPN Standard Library
//!
//! Operator bodies grouped by concern. Each module exposes a `register`
//! function; `load_standard_library` chains them all.

mod args;
pub mod arithmetic;
pub mod constants;
pub mod factor;
pub mod functions;
pub mod generators;
pub mod lists;
pub mod math;
pub mod modifiers;
pub mod units;

pub use factor::{in_memory_factor_cache, open_factor_cache, FACTOR_CACHE_VERSION};

use rpn_plugin::OperatorRegistry;

/// Load standard library into registry
pub fn load_standard_library(registry: OperatorRegistry) -> OperatorRegistry {
    let registry = modifiers::register(registry);
    let registry = arithmetic::register(registry);
    let registry = constants::register(registry);
    let registry = math::register(registry);
    let registry = factor::register(registry);
    let registry = units::register(registry);
    let registry = lists::register(registry);
    let registry = functions::register(registry);
    generators::register(registry)
}

/// Create registry with standard library
pub fn standard_registry() -> OperatorRegistry {
    load_standard_library(OperatorRegistry::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpn_plugin::OperatorKind;

    #[test]
    fn test_standard_registry_contents() {
        let registry = standard_registry();
        for name in ["add", "+", "sqrt", "pi", "factor", "convert", "sum", "eval", "take", "[", "dup_term", "set"] {
            assert!(registry.contains(name), "missing operator {}", name);
        }
        assert_eq!(registry.get("*").map(|d| d.name), Some("multiply"));
    }

    #[test]
    fn test_kinds_and_arities() {
        let registry = standard_registry();
        let kind = |name: &str| registry.get(name).map(|d| (d.kind(), d.arity()));
        assert_eq!(kind("add"), Some((OperatorKind::Regular, 2)));
        assert_eq!(kind("sum"), Some((OperatorKind::List, 1)));
        assert_eq!(kind("eval3"), Some((OperatorKind::Regular, 4)));
        assert_eq!(kind("recurrence"), Some((OperatorKind::List, 3)));
        assert_eq!(kind("pi"), Some((OperatorKind::Regular, 0)));
        assert_eq!(kind("]"), Some((OperatorKind::Modifier, 0)));
    }

    #[test]
    fn test_function_consumers() {
        let registry = standard_registry();
        let consumers: Vec<&str> = registry.names().into_iter()
            .filter(|name| registry.get(name).is_some_and(|d| d.takes_function))
            .collect();
        assert_eq!(consumers, vec![
            "eval", "eval2", "eval3", "filter", "filter_by_index", "recurrence", "unfilter", "unfilter_by_index",
        ]);
    }
}
