//! Unit operators: conversion and unit inspection

use rpn_core::{Measurement, Number, RpnError, UnitAlgebra, Value};
use rpn_plugin::{OperatorContext, OperatorDescriptor, OperatorRegistry};

pub fn register(registry: OperatorRegistry) -> OperatorRegistry {
    registry
        .with_operator(OperatorDescriptor::list("convert", 2, convert).category("units")
            .describe("Convert to the target's units; a list of targets gives a mixed-unit breakdown"))
        .with_operator(OperatorDescriptor::unary("value", value).category("units")
            .describe("Magnitude without units"))
        .with_operator(OperatorDescriptor::unary("units", units).category("units")
            .describe("One of the measurement's units"))
        .with_operator(OperatorDescriptor::unary("dimensions", dimensions).aliases(&["primitive_units"]).category("units")
            .describe("Re-express in primitive base units"))
        .with_operator(OperatorDescriptor::unary("invert_units", invert_units).aliases(&["invert"]).category("units")
            .describe("Keep the magnitude, invert the units"))
}

fn measurement<'v>(operator: &str, value: &'v Value) -> Result<&'v Measurement, RpnError> {
    value.as_measurement()
        .ok_or_else(|| RpnError::arg_type(operator, "a measurement", value.type_name()))
}

fn convert(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let targets: Vec<&UnitAlgebra> = match &args[1] {
        Value::List(items) => items.iter()
            .map(|item| measurement("convert", item).map(|m| &m.units))
            .collect::<Result<_, _>>()?,
        other => vec![&measurement("convert", other)?.units],
    };
    if targets.is_empty() {
        return Err(RpnError::type_mismatch("'convert' needs at least one target unit"));
    }
    convert_each(&args[0], &targets, ctx)
}

fn convert_each(source: &Value, targets: &[&UnitAlgebra], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    match source {
        Value::List(items) => items.iter()
            .map(|item| {
                ctx.check_interrupt()?;
                convert_each(item, targets, ctx)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        other => {
            let m = measurement("convert", other)?;
            match targets {
                [single] => Ok(Value::from(ctx.units()?.convert(m, single, ctx.precision)?)),
                _ => breakdown(m, targets, ctx),
            }
        }
    }
}

/// Split a measurement across several units, largest first:
/// `100 inch` over `[foot, inch]` is `[8 foot, 4 inch]`
fn breakdown(source: &Measurement, targets: &[&UnitAlgebra], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let system = ctx.units()?;
    let mut remaining = source.clone();
    let mut parts = Vec::with_capacity(targets.len());

    let (last, leading) = match targets.split_last() {
        Some(split) => split,
        None => return Ok(Value::List(parts)),
    };
    for target in leading {
        let converted = system.convert_value(&remaining.value, &remaining.units, target, ctx.precision)?;
        let whole = if converted.is_negative() { converted.ceil() } else { converted.floor() };
        // subtract in the source units so exact inputs stay exact
        let used = system.convert_value(&whole, target, &remaining.units, ctx.precision)?;
        remaining = Measurement::new(remaining.value.sub(&used), remaining.units.clone());
        parts.push(Value::Measurement(Measurement::new(whole, (*target).clone())));
    }
    parts.push(Value::Measurement(system.convert(&remaining, last, ctx.precision)?));
    Ok(Value::List(parts))
}

fn value(a: &Value, _ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    match a {
        Value::Measurement(m) => Ok(Value::Scalar(m.value.clone())),
        Value::Scalar(_) => Ok(a.clone()),
        other => Err(RpnError::arg_type("value", "a number or measurement", other.type_name())),
    }
}

fn units(a: &Value, _ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let m = measurement("units", a)?;
    Ok(Value::Measurement(Measurement::new(Number::from_i64(1), m.units.clone())))
}

fn dimensions(a: &Value, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let m = measurement("dimensions", a)?;
    let system = ctx.units()?;
    let signature = system.signature(&m.units)?;
    let base = signature.iter()
        .map(|(dimension, exponent)| {
            system.dimensions().base_unit(dimension)
                .map(|unit| (unit.to_string(), exponent))
                .ok_or_else(|| RpnError::UnitBuild(format!("dimension '{}' has no base unit", dimension)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let target = UnitAlgebra::from_pairs(base);
    Ok(Value::from(system.convert(m, &target, ctx.precision)?))
}

fn invert_units(a: &Value, _ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let m = measurement("invert_units", a)?;
    Ok(Value::Measurement(Measurement::new(m.value.clone(), m.units.invert())))
}
