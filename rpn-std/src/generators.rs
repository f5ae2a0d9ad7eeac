//! Lazy sequences and their materialization

use crate::args::{length, materialize, number};
use rpn_core::{GeneratorValue, Number, RpnError, Value};
use rpn_plugin::{OperatorContext, OperatorDescriptor, OperatorRegistry};

pub fn register(registry: OperatorRegistry) -> OperatorRegistry {
    registry
        .with_operator(OperatorDescriptor::binary("sequence", sequence).category("generators")
            .describe("start, start + step, ... without end"))
        .with_operator(OperatorDescriptor::ternary("lazy_range", lazy_range).category("generators")
            .describe("start to end inclusive by step, produced on demand"))
        .with_operator(OperatorDescriptor::list("take", 2, take).category("generators")
            .describe("First n elements of a generator or list"))
        .with_operator(OperatorDescriptor::list("collect", 1, collect).category("generators")
            .describe("All elements of a finite generator"))
}

fn arithmetic_progression(start: Number, step: Number) -> impl Iterator<Item = Number> {
    std::iter::successors(Some(start), move |current| Some(current.add(&step)))
}

fn sequence(a: &Value, b: &Value, _ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let start = number("sequence", a)?.clone();
    let step = number("sequence", b)?.clone();
    let label = format!("sequence {} {}", start, step);
    Ok(Value::Generator(GeneratorValue::new(label, false, move || {
        Box::new(arithmetic_progression(start.clone(), step.clone()).map(Value::Scalar))
    })))
}

fn lazy_range(a: &Value, b: &Value, c: &Value, _ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let start = number("lazy_range", a)?.clone();
    let end = number("lazy_range", b)?.clone();
    let step = number("lazy_range", c)?.clone();
    if step.is_zero() {
        return Err(RpnError::domain("'lazy_range' step cannot be zero"));
    }
    let label = format!("lazy_range {} {} {}", start, end, step);
    Ok(Value::Generator(GeneratorValue::new(label, true, move || {
        let end = end.clone();
        let ascending = !step.is_negative();
        Box::new(
            arithmetic_progression(start.clone(), step.clone())
                .take_while(move |current| if ascending { *current <= end } else { *current >= end })
                .map(Value::Scalar),
        )
    })))
}

fn take(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let n = length("take", &args[1])?;
    match &args[0] {
        Value::Generator(generator) => {
            let mut values = Vec::with_capacity(n);
            for value in generator.iter().take(n) {
                if values.len() % 1024 == 0 {
                    ctx.check_interrupt()?;
                }
                values.push(value);
            }
            Ok(Value::List(values))
        }
        other => Ok(Value::List(materialize("take", other, ctx)?.into_iter().take(n).collect())),
    }
}

fn collect(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    materialize("collect", &args[0], ctx).map(Value::List)
}
