//! Nullary operators: mathematical constants and the clock

use rpn_core::{DateTimeValue, Number, RpnError, Value};
use rpn_plugin::{OperatorContext, OperatorDescriptor, OperatorRegistry};

pub fn register(registry: OperatorRegistry) -> OperatorRegistry {
    registry
        .with_operator(OperatorDescriptor::nullary("pi", pi).category("constants")
            .describe("Ratio of a circle's circumference to its diameter"))
        .with_operator(OperatorDescriptor::nullary("e", e).category("constants")
            .describe("Base of the natural logarithm"))
        .with_operator(OperatorDescriptor::nullary("phi", phi).category("constants")
            .describe("Golden ratio (1 + sqrt 5) / 2"))
        .with_operator(OperatorDescriptor::nullary("now", now).category("constants")
            .describe("Current local date and time"))
}

fn pi(ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    Ok(Value::Scalar(Number::pi(ctx.precision)))
}

fn e(ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    Ok(Value::Scalar(Number::e(ctx.precision)))
}

fn phi(ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    Ok(Value::Scalar(Number::phi(ctx.precision)))
}

fn now(_ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    Ok(Value::DateTime(DateTimeValue::new(chrono::Local::now().naive_local())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpn_plugin::{InterruptFlag, NoFunctions};

    #[test]
    fn test_constants() {
        let interrupt = InterruptFlag::new();
        let ctx = OperatorContext::new(&NoFunctions, &interrupt);
        assert!(pi(&ctx).unwrap().to_string().starts_with("3.14159265358979"));
        assert!(e(&ctx).unwrap().to_string().starts_with("2.71828182845904"));
        assert!(phi(&ctx).unwrap().to_string().starts_with("1.61803398874989"));
        assert!(matches!(now(&ctx).unwrap(), Value::DateTime(_)));
    }
}
