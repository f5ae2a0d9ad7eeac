//! Higher-order operators
//!
//! Each one consumes a function captured with `x`, `y` or `z` and replays
//! it through the context's applier, in a fresh evaluation per call.

use crate::args::{count, length, materialize};
use rpn_core::{RpnError, Value};
use rpn_plugin::{OperatorContext, OperatorDescriptor, OperatorRegistry};

pub fn register(registry: OperatorRegistry) -> OperatorRegistry {
    registry
        .with_operator(OperatorDescriptor::binary("eval", eval).consumes_function().category("functions")
            .describe("Apply a one-parameter function"))
        .with_operator(OperatorDescriptor::ternary("eval2", eval2).consumes_function().category("functions")
            .describe("Apply a two-parameter function"))
        .with_operator(OperatorDescriptor::quaternary("eval3", eval3).consumes_function().category("functions")
            .describe("Apply a three-parameter function"))
        .with_operator(OperatorDescriptor::list("filter", 2, filter).consumes_function().category("functions")
            .describe("Elements for which the function is nonzero"))
        .with_operator(OperatorDescriptor::list("unfilter", 2, unfilter).consumes_function().category("functions")
            .describe("Elements for which the function is zero"))
        .with_operator(OperatorDescriptor::list("filter_by_index", 2, filter_by_index).consumes_function()
            .category("functions").describe("Elements whose 0-based index makes the function nonzero"))
        .with_operator(OperatorDescriptor::list("unfilter_by_index", 2, unfilter_by_index).consumes_function()
            .category("functions").describe("Elements whose 0-based index makes the function zero"))
        .with_operator(OperatorDescriptor::list("recurrence", 3, recurrence).consumes_function().category("functions")
            .describe("start, f(start), f(f(start)), ... for count terms"))
}

fn eval(a: &Value, function: &Value, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    ctx.apply_function(function, std::slice::from_ref(a))
}

fn eval2(a: &Value, b: &Value, function: &Value, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    ctx.apply_function(function, &[a.clone(), b.clone()])
}

fn eval3(a: &Value, b: &Value, c: &Value, function: &Value, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    ctx.apply_function(function, &[a.clone(), b.clone(), c.clone()])
}

/// Keep the elements whose test result has truthiness `keep`
fn select(
    operator: &str,
    args: &[Value],
    ctx: &OperatorContext<'_>,
    keep: bool,
    by_index: bool,
) -> Result<Value, RpnError> {
    let values = materialize(operator, &args[0], ctx)?;
    let function = &args[1];
    let mut selected = Vec::new();
    for (index, value) in values.into_iter().enumerate() {
        let probe = if by_index { Value::from(index as i64) } else { value.clone() };
        let verdict = ctx.apply_function(function, std::slice::from_ref(&probe))?;
        if verdict.is_truthy() == keep {
            selected.push(value);
        }
    }
    Ok(Value::List(selected))
}

fn filter(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    select("filter", args, ctx, true, false)
}

fn unfilter(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    select("unfilter", args, ctx, false, false)
}

fn filter_by_index(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    select("filter_by_index", args, ctx, true, true)
}

fn unfilter_by_index(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    select("unfilter_by_index", args, ctx, false, true)
}

fn recurrence(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let n = length("recurrence", &args[1])?;
    let function = &args[2];
    let mut terms = Vec::new();
    let mut current = args[0].clone();
    for i in 0..n {
        ctx.check_interrupt()?;
        if i > 0 {
            current = ctx.apply_function(function, std::slice::from_ref(&current))?;
        }
        terms.push(current.clone());
    }
    Ok(Value::List(terms))
}
