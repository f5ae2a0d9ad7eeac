//! Operator application with list broadcasting
//!
//! - arity 0: called once
//! - arity 1: lists are mapped recursively, so nested lists broadcast fully
//! - arity 2: two lists zip to the shorter length, a list and a scalar
//!   broadcast the scalar; elements recurse
//! - arity 3 to 5: Cartesian product over the list arguments (scalars are
//!   singletons), first argument varying fastest, flattened into one list
//! - list operators receive their operands untouched

use crate::{BinaryFn, Handler, OperatorContext, OperatorDescriptor, UnaryFn};
use rpn_core::{RpnError, Value};

/// Apply `descriptor` to `args` given in declared order
pub fn apply(descriptor: &OperatorDescriptor, args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    if args.len() != descriptor.arity() {
        return Err(RpnError::insufficient_operands(descriptor.name, descriptor.arity()));
    }

    match descriptor.handler {
        Handler::Nullary(body) => body(ctx),
        Handler::Unary(body) => broadcast_unary(body, &args[0], ctx),
        Handler::Binary(body) => broadcast_binary(body, &args[0], &args[1], ctx),
        Handler::Ternary(body) => cartesian(args, ctx, |a| body(&a[0], &a[1], &a[2], ctx)),
        Handler::Quaternary(body) => cartesian(args, ctx, |a| body(&a[0], &a[1], &a[2], &a[3], ctx)),
        Handler::Quinary(body) => cartesian(args, ctx, |a| body(&a[0], &a[1], &a[2], &a[3], &a[4], ctx)),
        Handler::List { body, .. } => body(args, ctx),
        Handler::Modifier(_) => Err(RpnError::type_mismatch(format!(
            "'{}' modifies the evaluation state and cannot be applied to values",
            descriptor.name
        ))),
    }
}

fn broadcast_unary(body: UnaryFn, arg: &Value, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    match arg {
        Value::List(items) => items.iter()
            .map(|item| {
                ctx.check_interrupt()?;
                broadcast_unary(body, item, ctx)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        other => body(other, ctx),
    }
}

fn broadcast_binary(body: BinaryFn, left: &Value, right: &Value, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let results = match (left, right) {
        (Value::List(a), Value::List(b)) => a.iter().zip(b)
            .map(|(x, y)| {
                ctx.check_interrupt()?;
                broadcast_binary(body, x, y, ctx)
            })
            .collect::<Result<Vec<_>, _>>()?,
        (Value::List(a), scalar) => a.iter()
            .map(|x| {
                ctx.check_interrupt()?;
                broadcast_binary(body, x, scalar, ctx)
            })
            .collect::<Result<Vec<_>, _>>()?,
        (scalar, Value::List(b)) => b.iter()
            .map(|y| {
                ctx.check_interrupt()?;
                broadcast_binary(body, scalar, y, ctx)
            })
            .collect::<Result<Vec<_>, _>>()?,
        (x, y) => return body(x, y, ctx),
    };
    Ok(Value::List(results))
}

/// One call per combination of list elements, first argument fastest
fn cartesian(
    args: &[Value],
    ctx: &OperatorContext<'_>,
    call: impl Fn(&[Value]) -> Result<Value, RpnError>,
) -> Result<Value, RpnError> {
    if !args.iter().any(Value::is_list) {
        return call(args);
    }

    let axes: Vec<&[Value]> = args.iter()
        .map(|arg| match arg {
            Value::List(items) => items.as_slice(),
            other => std::slice::from_ref(other),
        })
        .collect();
    if axes.iter().any(|axis| axis.is_empty()) {
        return Ok(Value::List(Vec::new()));
    }

    let mut odometer = vec![0usize; axes.len()];
    let mut results = Vec::new();
    loop {
        ctx.check_interrupt()?;
        let combination: Vec<Value> = odometer.iter()
            .zip(&axes)
            .map(|(&i, axis)| axis[i].clone())
            .collect();
        results.push(call(&combination)?);

        let mut position = 0;
        loop {
            if position == axes.len() {
                return Ok(Value::List(results));
            }
            odometer[position] += 1;
            if odometer[position] < axes[position].len() {
                break;
            }
            odometer[position] = 0;
            position += 1;
        }
    }
}

/// A one-element list result stands for its element
pub fn unwrap_single(value: Value) -> Value {
    match value {
        Value::List(mut items) if items.len() == 1 => items.remove(0),
        other => other,
    }
}
