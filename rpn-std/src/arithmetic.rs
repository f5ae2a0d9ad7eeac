//! Unit-aware arithmetic
//!
//! Measurements add and subtract through the conversion graph (the result
//! keeps the left operand's units) and multiply or divide by composing
//! units. Datetimes shift by time measurements; two datetimes subtract to
//! seconds.

use crate::args::{exponent, number};
use rpn_core::{DateTimeValue, Measurement, Number, RpnError, UnitAlgebra, Value};
use rpn_plugin::{OperatorContext, OperatorDescriptor, OperatorRegistry};

pub fn register(registry: OperatorRegistry) -> OperatorRegistry {
    registry
        .with_operator(OperatorDescriptor::binary("add", add).aliases(&["+", "plus"]).category("arithmetic")
            .describe("Sum; measurements are converted to the left operand's units"))
        .with_operator(OperatorDescriptor::binary("subtract", subtract).aliases(&["-", "minus"]).category("arithmetic")
            .describe("Difference; two datetimes give seconds"))
        .with_operator(OperatorDescriptor::binary("multiply", multiply).aliases(&["*", "times"]).category("arithmetic")
            .describe("Product; units compose"))
        .with_operator(OperatorDescriptor::binary("divide", divide).aliases(&["/"]).category("arithmetic")
            .describe("Quotient; units compose"))
        .with_operator(OperatorDescriptor::binary("power", power).aliases(&["**", "^"]).category("arithmetic")
            .describe("Raise to a power; measurements need an integer exponent"))
        .with_operator(OperatorDescriptor::binary("root", root).category("arithmetic")
            .describe("k-th root; unit exponents must divide by k"))
        .with_operator(OperatorDescriptor::unary("square_root", square_root).aliases(&["sqrt"]).category("arithmetic"))
        .with_operator(OperatorDescriptor::unary("negative", negative).aliases(&["neg"]).category("arithmetic"))
        .with_operator(OperatorDescriptor::unary("reciprocal", reciprocal).aliases(&["inverse"]).category("arithmetic"))
        .with_operator(OperatorDescriptor::unary("abs", abs).category("arithmetic"))
        .with_operator(OperatorDescriptor::unary("floor", floor).category("arithmetic"))
        .with_operator(OperatorDescriptor::unary("ceiling", ceiling).aliases(&["ceil"]).category("arithmetic"))
        .with_operator(OperatorDescriptor::unary("round", round).category("arithmetic"))
        .with_operator(OperatorDescriptor::binary("modulo", modulo).aliases(&["mod"]).category("arithmetic"))
}

fn seconds(measurement: &Measurement, ctx: &OperatorContext<'_>) -> Result<Number, RpnError> {
    ctx.units()?.convert_value(&measurement.value, &measurement.units, &UnitAlgebra::unit("second"), ctx.precision)
}

fn shift(datetime: &DateTimeValue, offset: &Measurement, sign: i64, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let secs = seconds(offset, ctx)?.mul(&Number::from_i64(sign));
    Ok(Value::DateTime(datetime.add_seconds(&secs)?))
}

pub fn add(a: &Value, b: &Value, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    match (a, b) {
        (Value::Scalar(x), Value::Scalar(y)) => Ok(Value::Scalar(x.add(y))),
        (Value::Measurement(x), Value::Measurement(y)) => Ok(Value::from(ctx.units()?.add(x, y, ctx.precision)?)),
        // a bare number takes the measurement's units
        (Value::Measurement(m), Value::Scalar(n)) | (Value::Scalar(n), Value::Measurement(m)) => {
            Ok(Value::from(Measurement::new(m.value.add(n), m.units.clone())))
        }
        (Value::DateTime(dt), Value::Measurement(m)) | (Value::Measurement(m), Value::DateTime(dt)) => {
            shift(dt, m, 1, ctx)
        }
        (x, y) => Err(RpnError::type_mismatch(format!(
            "cannot add {} and {}", x.type_name(), y.type_name()
        ))),
    }
}

pub fn subtract(a: &Value, b: &Value, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    match (a, b) {
        (Value::Scalar(x), Value::Scalar(y)) => Ok(Value::Scalar(x.sub(y))),
        (Value::Measurement(x), Value::Measurement(y)) => Ok(Value::from(ctx.units()?.subtract(x, y, ctx.precision)?)),
        (Value::Measurement(m), Value::Scalar(n)) => Ok(Value::from(Measurement::new(m.value.sub(n), m.units.clone()))),
        (Value::Scalar(n), Value::Measurement(m)) => Ok(Value::from(Measurement::new(n.sub(&m.value), m.units.clone()))),
        (Value::DateTime(dt), Value::Measurement(m)) => shift(dt, m, -1, ctx),
        (Value::DateTime(later), Value::DateTime(earlier)) => {
            Ok(Value::Measurement(Measurement::of_unit(later.seconds_since(earlier), "second")))
        }
        (x, y) => Err(RpnError::type_mismatch(format!(
            "cannot subtract {} from {}", y.type_name(), x.type_name()
        ))),
    }
}

pub fn multiply(a: &Value, b: &Value, _ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    match (a, b) {
        (Value::Scalar(x), Value::Scalar(y)) => Ok(Value::Scalar(x.mul(y))),
        (Value::Measurement(x), Value::Measurement(y)) => Ok(Value::from(x.multiply(y))),
        (Value::Measurement(m), Value::Scalar(n)) | (Value::Scalar(n), Value::Measurement(m)) => {
            Ok(Value::from(m.scale(n)))
        }
        (x, y) => Err(RpnError::type_mismatch(format!(
            "cannot multiply {} by {}", x.type_name(), y.type_name()
        ))),
    }
}

pub fn divide(a: &Value, b: &Value, _ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    match (a, b) {
        (Value::Scalar(x), Value::Scalar(y)) => Ok(Value::Scalar(x.checked_div(y)?)),
        (Value::Measurement(x), Value::Measurement(y)) => Ok(Value::from(x.divide(y)?)),
        (Value::Measurement(m), Value::Scalar(n)) => {
            Ok(Value::from(Measurement::new(m.value.checked_div(n)?, m.units.clone())))
        }
        (Value::Scalar(n), Value::Measurement(m)) => {
            Ok(Value::from(Measurement::new(n.checked_div(&m.value)?, m.units.invert())))
        }
        (x, y) => Err(RpnError::type_mismatch(format!(
            "cannot divide {} by {}", x.type_name(), y.type_name()
        ))),
    }
}

pub fn power(a: &Value, b: &Value, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let k = number("power", b)?;
    match a {
        Value::Scalar(base) if k.is_integer() => Ok(Value::Scalar(base.pow(exponent("power", b)?)?)),
        Value::Scalar(base) => Ok(Value::Scalar(base.pow_real(k, ctx.precision)?)),
        Value::Measurement(m) if k.is_integer() => Ok(Value::from(m.exponentiate(exponent("power", b)?)?)),
        Value::Measurement(_) => Err(RpnError::type_mismatch("a measurement can only be raised to an integer power")),
        other => Err(RpnError::arg_type("power", "a number or measurement", other.type_name())),
    }
}

pub fn root(a: &Value, b: &Value, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let k = exponent("root", b)?;
    match a {
        Value::Scalar(n) => Ok(Value::Scalar(n.nth_root(i64::from(k), ctx.precision)?)),
        Value::Measurement(m) => {
            let k = u32::try_from(k).map_err(|_| RpnError::domain("measurement roots need a positive degree"))?;
            Ok(Value::from(m.root(k, ctx.precision)?))
        }
        other => Err(RpnError::arg_type("root", "a number or measurement", other.type_name())),
    }
}

pub fn square_root(a: &Value, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    root(a, &Value::from(2), ctx)
}

/// Apply `op` to a scalar, or to a measurement's magnitude keeping its units
fn on_magnitude(
    operator: &str,
    value: &Value,
    op: impl Fn(&Number) -> Result<Number, RpnError>,
) -> Result<Value, RpnError> {
    match value {
        Value::Scalar(n) => Ok(Value::Scalar(op(n)?)),
        Value::Measurement(m) => Ok(Value::from(Measurement::new(op(&m.value)?, m.units.clone()))),
        other => Err(RpnError::arg_type(operator, "a number or measurement", other.type_name())),
    }
}

pub fn negative(a: &Value, _ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    on_magnitude("negative", a, |n| Ok(n.neg()))
}

pub fn reciprocal(a: &Value, _ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    match a {
        Value::Scalar(n) => Ok(Value::Scalar(Number::from_i64(1).checked_div(n)?)),
        Value::Measurement(m) => Ok(Value::from(m.reciprocal()?)),
        other => Err(RpnError::arg_type("reciprocal", "a number or measurement", other.type_name())),
    }
}

pub fn abs(a: &Value, _ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    on_magnitude("abs", a, |n| Ok(n.abs()))
}

pub fn floor(a: &Value, _ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    on_magnitude("floor", a, |n| Ok(n.floor()))
}

pub fn ceiling(a: &Value, _ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    on_magnitude("ceiling", a, |n| Ok(n.ceil()))
}

pub fn round(a: &Value, _ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    on_magnitude("round", a, |n| Ok(n.round()))
}

pub fn modulo(a: &Value, b: &Value, _ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let divisor = number("modulo", b)?;
    on_magnitude("modulo", a, |n| Ok(n.modulo(divisor)?))
}
