//! RPN Core - Fundamental types
//!
//! This crate provides the core types used throughout the calculator:
//! - `Number`: Arbitrary precision decimal numbers
//! - `UnitAlgebra`: Unit expressions as name -> exponent maps
//! - `Measurement`: A number with units
//! - `Value`: Runtime stack values (scalars, measurements, lists, functions, ...)
//! - `RpnError`: Structured errors with machine-readable codes
//! - `PersistentCache`: Memo caches persisted with atomic writes

mod number;
mod algebra;
mod measurement;
mod datetime;
mod value;
mod error;
mod persist;

pub use number::{Number, NumberError, DEFAULT_PRECISION};
pub use algebra::UnitAlgebra;
pub use measurement::Measurement;
pub use datetime::DateTimeValue;
pub use value::{Value, FunctionValue, GeneratorValue};
pub use error::{RpnError, TermError, codes};
pub use persist::{write_atomic, PersistentCache};

/// Re-exports of the raw big-number types used by conversion factors
pub mod big {
    pub use dashu_int::{IBig, UBig};
    pub use dashu_ratio::RBig;
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Number, Value, Measurement, UnitAlgebra, RpnError};
    pub use crate::error::codes;
}

#[cfg(test)]
mod tests {
    use super::*;

    mod number_tests {
        use super::*;

        #[test]
        fn test_from_i64() {
            let n = Number::from_i64(42);
            assert_eq!(n.to_i64(), Some(42));
        }

        #[test]
        fn test_from_str_decimal() {
            let n = Number::from_str("3.14").unwrap();
            assert!(!n.is_integer());
            assert_eq!(n.to_string(), "3.14");
        }

        #[test]
        fn test_from_str_fraction() {
            let n = Number::from_str("1/4").unwrap();
            assert_eq!(n, Number::from_str("0.25").unwrap());
        }

        #[test]
        fn test_from_str_scientific() {
            let n = Number::from_str("1.5e2").unwrap();
            assert_eq!(n.to_i64(), Some(150));

            let avogadro = Number::from_str("602214076e15").unwrap();
            assert_eq!(avogadro, Number::from_str("602214076000000000000000").unwrap());
        }

        #[test]
        fn test_from_str_radix() {
            assert_eq!(Number::from_str_radix("ff", 16).unwrap().to_i64(), Some(255));
            assert_eq!(Number::from_str_radix("-101", 2).unwrap().to_i64(), Some(-5));
            assert_eq!(Number::from_str_radix("0.1", 2).unwrap(), Number::from_str("0.5").unwrap());
            assert!(Number::from_str_radix("19", 8).is_err());
            assert!(Number::from_str_radix("1", 40).is_err());
        }

        #[test]
        fn test_large_integer_exact() {
            let big = Number::from_str_radix("ffffffffffffffffffff", 16).unwrap();
            assert_eq!(big.to_string(), "1208925819614629174706175");
            assert_eq!(big.to_i64(), None);
            assert!(big.to_ibig().is_some());
        }

        #[test]
        fn test_arithmetic() {
            let a = Number::from_i64(84);
            let b = Number::from_i64(2);
            assert_eq!(a.checked_div(&b).unwrap().to_i64(), Some(42));
            assert_eq!(a.sub(&b).add(&b), a);
            assert_eq!(b.mul(&b).to_i64(), Some(4));
            assert!(a.checked_div(&Number::from_i64(0)).is_err());
        }

        #[test]
        fn test_pow() {
            assert_eq!(Number::from_i64(2).pow(10).unwrap().to_i64(), Some(1024));
            assert_eq!(Number::from_i64(2).pow(-2).unwrap(), Number::from_str("0.25").unwrap());
            let grown = Number::from_str("1.003").unwrap().pow(300).unwrap();
            assert!(grown.to_string().starts_with("2.4"));
            assert_eq!(Number::from_i64(0).pow(0).unwrap(), Number::from_i64(1));
            assert_eq!(Number::from_i64(0).pow(-1), Err(NumberError::DivisionByZero));
            let half = Number::from_ratio(-1, 2);
            assert_eq!(Number::from_i64(0).pow_real(&half, 50), Err(NumberError::DivisionByZero));
        }

        #[test]
        fn test_nth_root() {
            assert_eq!(Number::from_i64(27).nth_root(3, 50).unwrap(), Number::from_i64(3));
            assert_eq!(Number::from_i64(-32).nth_root(5, 50).unwrap(), Number::from_i64(-2));
            assert!(Number::from_i64(-4).nth_root(2, 50).is_err());
            let root2 = Number::from_i64(2).nth_root(2, 50).unwrap();
            assert!(root2.to_string().starts_with("1.41421356"));
        }

        #[test]
        fn test_scale_is_exact() {
            let twelfth = dashu_ratio::RBig::from_parts(1.into(), 12u8.into());
            assert_eq!(Number::from_i64(12).scale(&twelfth), Number::from_i64(1));
            assert_eq!(Number::from_i64(48).scale(&twelfth), Number::from_i64(4));
        }

        #[test]
        fn test_modulo_and_round() {
            assert_eq!(Number::from_i64(7).modulo(&Number::from_i64(3)).unwrap(), Number::from_i64(1));
            assert_eq!(Number::from_i64(-7).modulo(&Number::from_i64(3)).unwrap(), Number::from_i64(2));
            assert_eq!(Number::from_str("2.5").unwrap().round(), Number::from_i64(3));
            assert_eq!(Number::from_str("-2.5").unwrap().round(), Number::from_i64(-3));
        }

        #[test]
        fn test_ln_exp() {
            let ln_10 = Number::from_i64(10).ln(50).unwrap();
            assert!(ln_10.to_string().starts_with("2.302585"));
            let back = ln_10.exp(50);
            assert!((back.to_f64().unwrap() - 10.0).abs() < 1e-9);
            assert!(Number::from_i64(0).ln(50).is_err());
        }

        #[test]
        fn test_trig_reduces_large_angles() {
            let close = |n: Number, expected: f64| (n.to_f64().unwrap() - expected).abs() < 1e-12;
            assert!(close(Number::from_i64(10).sin(50), -0.544_021_110_889_369_8));
            assert!(close(Number::from_i64(100).sin(50), -0.506_365_641_109_758_8));
            assert!(close(Number::from_i64(-100).sin(50), 0.506_365_641_109_758_8));
            assert!(close(Number::from_i64(100).cos(50), 0.862_318_872_287_683_9));
            assert!(close(Number::from_i64(1_000_000).sin(50), -0.349_993_502_171_292_5));
            assert!(Number::from_i64(10).sin(50).to_string().starts_with("-0.5440211108893698134"));
            assert!(close(Number::from_i64(10).tan(50).unwrap(), 0.648_360_827_459_086_7));
            assert_eq!(Number::from_i64(0).sin(50), Number::from_i64(0));
        }

        #[test]
        fn test_display_trims() {
            assert_eq!(Number::from_ratio(1, 4).to_string(), "0.25");
            assert_eq!(Number::from_i64(-17).to_string(), "-17");
        }
    }

    mod value_tests {
        use super::*;

        #[test]
        fn test_unitless_measurement_collapses() {
            let m = Measurement::new(Number::from_i64(5), UnitAlgebra::new());
            assert_eq!(Value::from(m), Value::Scalar(Number::from_i64(5)));
        }

        #[test]
        fn test_list_display() {
            let list = Value::List(vec![
                Value::from(1),
                Value::List(vec![Value::from(2), Value::from(3)]),
            ]);
            assert_eq!(list.to_string(), "[ 1, [ 2, 3 ] ]");
        }

        #[test]
        fn test_function_parameters() {
            let f = FunctionValue::new(vec!["x".into(), "y".into(), "+".into()]);
            assert_eq!(f.parameter_count(), 2);
            assert_eq!(FunctionValue::new(vec!["2".into()]).parameter_count(), 0);
        }

        #[test]
        fn test_generator_restarts() {
            let g = GeneratorValue::new("naturals", false, || {
                Box::new((1..).map(Value::from))
            });
            let first: Vec<Value> = g.iter().take(3).collect();
            let again: Vec<Value> = g.iter().take(3).collect();
            assert_eq!(first, again);
            assert_eq!(first, vec![Value::from(1), Value::from(2), Value::from(3)]);
        }

        #[test]
        fn test_truthiness() {
            assert!(!Value::from(0).is_truthy());
            assert!(Value::from(3).is_truthy());
        }
    }

    mod error_tests {
        use super::*;

        #[test]
        fn test_error_codes() {
            assert_eq!(RpnError::NegativeListDepth.code(), codes::NEGATIVE_LIST_DEPTH);
            assert_eq!(RpnError::from(NumberError::DivisionByZero), RpnError::DivisionByZero);
        }

        #[test]
        fn test_messages() {
            let err = RpnError::insufficient_operands("add", 2);
            assert_eq!(err.to_string(), "'add' requires 2 arguments");

            let err = TermError::new(3, "]", RpnError::NegativeListDepth);
            assert_eq!(err.to_string(), "error in term 3 (']'): negative list level (too many ']'s)");
            assert_eq!(err.code(), codes::NEGATIVE_LIST_DEPTH);

            assert_eq!(RpnError::UnclosedList(1).to_string(), "1 unclosed list");
            assert_eq!(RpnError::UnclosedList(3).to_string(), "3 unclosed lists");
        }
    }
}
