//! Integer factorization with a persisted memo
//!
//! Factors are found by trial division. Results for inputs above
//! `PERSIST_THRESHOLD` are worth keeping between sessions, so the memo
//! only writes those back to disk.

use crate::args::number;
use rpn_core::big::IBig;
use rpn_core::{Number, PersistentCache, RpnError, Value};
use rpn_plugin::{FactorCache, OperatorContext, OperatorDescriptor, OperatorRegistry};
use std::path::Path;

/// Version tag written into `factors.json`
pub const FACTOR_CACHE_VERSION: &str = "rpn-factors-1";

/// Smallest input whose factorization is persisted
pub const PERSIST_THRESHOLD: u64 = 1_000_000;

const INTERRUPT_INTERVAL: u64 = 4096;

pub fn register(registry: OperatorRegistry) -> OperatorRegistry {
    registry.with_operator(
        OperatorDescriptor::unary("factor", factor)
            .category("number_theory")
            .describe("Prime factors in ascending order; -1 leads for negative input"),
    )
}

fn should_persist(key: &String, _factors: &Vec<String>) -> bool {
    // keys too large for u64 are always worth keeping
    key.trim_start_matches('-').parse::<u64>().map_or(true, |n| n > PERSIST_THRESHOLD)
}

/// Factor memo backed by `path`
pub fn open_factor_cache(path: &Path) -> FactorCache {
    PersistentCache::open(path, FACTOR_CACHE_VERSION, should_persist)
}

pub fn in_memory_factor_cache() -> FactorCache {
    PersistentCache::in_memory(should_persist)
}

fn factor(a: &Value, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let n = number("factor", a)?;
    let n = n.to_ibig()
        .ok_or_else(|| RpnError::arg_type("factor", "an integer", "a fraction"))?;
    if n == IBig::ZERO {
        return Err(RpnError::domain("cannot factor zero"));
    }

    let key = n.to_string();
    let factors = match ctx.factor_cache() {
        Some(cache) => cache.get_or_try_insert_with(&key, || trial_division(n, ctx))?,
        None => trial_division(n, ctx)?,
    };

    factors.iter()
        .map(|f| Ok(Value::Scalar(Number::from_str(f)?)))
        .collect::<Result<Vec<_>, RpnError>>()
        .map(Value::List)
}

fn trial_division(n: IBig, ctx: &OperatorContext<'_>) -> Result<Vec<String>, RpnError> {
    let mut factors = Vec::new();
    let mut n = n;
    if n < IBig::ZERO {
        factors.push("-1".to_string());
        n = -n;
    }
    if n == IBig::ONE {
        factors.push("1".to_string());
        return Ok(factors);
    }

    let mut divisor = IBig::from(2u8);
    let mut steps: u64 = 0;
    while &divisor * &divisor <= n {
        steps += 1;
        if steps % INTERRUPT_INTERVAL == 0 {
            ctx.check_interrupt()?;
        }
        if (&n % &divisor) == IBig::ZERO {
            factors.push(divisor.to_string());
            n = &n / &divisor;
        } else if divisor == IBig::from(2u8) {
            divisor = IBig::from(3u8);
        } else {
            divisor += IBig::from(2u8);
        }
    }
    if n > IBig::ONE {
        factors.push(n.to_string());
    }
    Ok(factors)
}
