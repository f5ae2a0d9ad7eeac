//! Transcendental and integer functions
//!
//! Thin delegations to `Number`. Trigonometric functions accept plain
//! radians or any angle measurement.

use crate::args::{count, number};
use rpn_core::big::IBig;
use rpn_core::{Number, RpnError, UnitAlgebra, Value};
use rpn_plugin::{OperatorContext, OperatorDescriptor, OperatorRegistry};

/// Largest argument `factorial` accepts
const MAX_FACTORIAL: usize = 100_000;

pub fn register(registry: OperatorRegistry) -> OperatorRegistry {
    registry
        .with_operator(OperatorDescriptor::unary("ln", ln).category("math").describe("Natural logarithm"))
        .with_operator(OperatorDescriptor::unary("log10", log10).aliases(&["log"]).category("math"))
        .with_operator(OperatorDescriptor::unary("exp", exp).category("math").describe("e raised to a power"))
        .with_operator(OperatorDescriptor::unary("sin", sin).category("trigonometry"))
        .with_operator(OperatorDescriptor::unary("cos", cos).category("trigonometry"))
        .with_operator(OperatorDescriptor::unary("tan", tan).category("trigonometry"))
        .with_operator(OperatorDescriptor::unary("factorial", factorial).aliases(&["!"]).category("number_theory"))
}

fn ln(a: &Value, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    Ok(Value::Scalar(number("ln", a)?.ln(ctx.precision)?))
}

fn log10(a: &Value, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    Ok(Value::Scalar(number("log10", a)?.log10(ctx.precision)?))
}

fn exp(a: &Value, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    Ok(Value::Scalar(number("exp", a)?.exp(ctx.precision)))
}

/// Angle in radians from a number or an angle measurement
fn radians(operator: &str, value: &Value, ctx: &OperatorContext<'_>) -> Result<Number, RpnError> {
    match value {
        Value::Scalar(n) => Ok(n.clone()),
        Value::Measurement(m) => {
            ctx.units()?.convert_value(&m.value, &m.units, &UnitAlgebra::unit("radian"), ctx.precision)
        }
        other => Err(RpnError::arg_type(operator, "an angle", other.type_name())),
    }
}

fn sin(a: &Value, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    Ok(Value::Scalar(radians("sin", a, ctx)?.sin(ctx.precision)))
}

fn cos(a: &Value, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    Ok(Value::Scalar(radians("cos", a, ctx)?.cos(ctx.precision)))
}

fn tan(a: &Value, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    Ok(Value::Scalar(radians("tan", a, ctx)?.tan(ctx.precision)?))
}

fn factorial(a: &Value, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let n = count("factorial", a)?;
    if n > MAX_FACTORIAL {
        return Err(RpnError::domain(format!("factorial argument {} is too large", n)));
    }
    let mut product = IBig::from(1u8);
    for i in 2..=n {
        if i % 1000 == 0 {
            ctx.check_interrupt()?;
        }
        product *= IBig::from(i);
    }
    Ok(Value::Scalar(Number::from_ibig(product)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpn_core::Measurement;
    use rpn_plugin::{InterruptFlag, NoFunctions};
    use rpn_units::STANDARD_UNITS;

    fn run<T>(body: impl FnOnce(&OperatorContext<'_>) -> T) -> T {
        let units = STANDARD_UNITS.as_ref().ok().map(|system| system.as_ref());
        let interrupt = InterruptFlag::new();
        let ctx = OperatorContext::new(&NoFunctions, &interrupt).with_units(units);
        body(&ctx)
    }

    #[test]
    fn test_factorial() {
        run(|ctx| {
            assert_eq!(factorial(&Value::from(0), ctx).unwrap(), Value::from(1));
            assert_eq!(factorial(&Value::from(10), ctx).unwrap(), Value::from(3628800));
            let big = factorial(&Value::from(25), ctx).unwrap();
            assert_eq!(big.to_string(), "15511210043330985984000000");
            assert!(factorial(&Value::from(-1), ctx).is_err());
        });
    }

    #[test]
    fn test_trig_accepts_angle_units() {
        run(|ctx| {
            let right = Value::Measurement(Measurement::of_unit(Number::from_i64(90), "degree"));
            let s = sin(&right, ctx).unwrap();
            let s = s.as_number().unwrap().to_f64().unwrap();
            assert!((s - 1.0).abs() < 1e-12);

            let thirty = Value::Measurement(Measurement::of_unit(Number::from_i64(30), "degree"));
            let half = sin(&thirty, ctx).unwrap().as_number().unwrap().to_f64().unwrap();
            assert!((half - 0.5).abs() < 1e-12);

            let wide = sin(&Value::from(100), ctx).unwrap().as_number().unwrap().to_f64().unwrap();
            assert!((wide + 0.506_365_641_109_758_8).abs() < 1e-12);

            let c = cos(&Value::from(0), ctx).unwrap();
            assert_eq!(c, Value::from(1));

            let length = Value::Measurement(Measurement::of_unit(Number::from_i64(1), "foot"));
            assert!(matches!(sin(&length, ctx), Err(RpnError::IncompatibleUnits { .. })));
        });
    }

    #[test]
    fn test_logarithms() {
        run(|ctx| {
            let l = log10(&Value::from(1000), ctx).unwrap();
            assert!((l.as_number().unwrap().to_f64().unwrap() - 3.0).abs() < 1e-12);
            assert!(ln(&Value::from(-1), ctx).is_err());
        });
    }
}
