//! Argument extraction shared by operator bodies

use rpn_core::{Number, RpnError, Value};
use rpn_plugin::OperatorContext;

/// Generators longer than this are refused when materialized
pub const MAX_MATERIALIZE: usize = 1_000_000;

pub fn number<'v>(operator: &str, value: &'v Value) -> Result<&'v Number, RpnError> {
    value.as_number()
        .ok_or_else(|| RpnError::arg_type(operator, "a number", value.type_name()))
}

pub fn integer(operator: &str, value: &Value) -> Result<i64, RpnError> {
    let n = number(operator, value)?;
    if !n.is_integer() {
        return Err(RpnError::arg_type(operator, "an integer", "a fraction"));
    }
    n.to_i64().ok_or(RpnError::Overflow)
}

/// Non-negative integer (counts, indices)
pub fn count(operator: &str, value: &Value) -> Result<usize, RpnError> {
    let n = integer(operator, value)?;
    usize::try_from(n)
        .map_err(|_| RpnError::domain(format!("'{}' expects a non-negative integer, got {}", operator, n)))
}

/// A count that sizes a result list: at most `MAX_MATERIALIZE`
pub fn length(operator: &str, value: &Value) -> Result<usize, RpnError> {
    let n = count(operator, value)?;
    within_limit(operator, n)
}

pub fn within_limit(operator: &str, n: usize) -> Result<usize, RpnError> {
    if n > MAX_MATERIALIZE {
        return Err(RpnError::domain(format!(
            "'{}' would produce {} values, the limit is {}", operator, n, MAX_MATERIALIZE
        )));
    }
    Ok(n)
}

pub fn exponent(operator: &str, value: &Value) -> Result<i32, RpnError> {
    i32::try_from(integer(operator, value)?).map_err(|_| RpnError::Overflow)
}

/// List contents; a lone value counts as a one-element list
pub fn items(value: &Value) -> &[Value] {
    match value {
        Value::List(items) => items,
        other => std::slice::from_ref(other),
    }
}

/// Elements of a list or a finite generator
pub fn materialize(operator: &str, value: &Value, ctx: &OperatorContext<'_>) -> Result<Vec<Value>, RpnError> {
    match value {
        Value::Generator(generator) if generator.is_finite() => {
            let mut values = Vec::new();
            for item in generator.iter() {
                if values.len() >= MAX_MATERIALIZE {
                    return Err(RpnError::domain(format!("'{}': generator is too long", operator)));
                }
                if values.len() % 1024 == 0 {
                    ctx.check_interrupt()?;
                }
                values.push(item);
            }
            Ok(values)
        }
        Value::Generator(generator) => Err(RpnError::domain(format!(
            "'{}' cannot consume the infinite generator '{}'; use 'take'",
            operator,
            generator.label()
        ))),
        other => Ok(items(other).to_vec()),
    }
}

pub fn boolean(flag: bool) -> Value {
    Value::from(if flag { 1 } else { 0 })
}
