//! Runtime values on the evaluation stack
//!
//! Values are scalars, measurements, datetimes, (nested) lists, captured
//! functions, lazy generators, or unbound variable names.

use crate::{DateTimeValue, Measurement, Number};
use std::fmt;
use std::sync::Arc;

/// A captured term sequence replayed by higher-order operators.
/// `x`, `y` and `z` inside the body are bound at application time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionValue {
    pub terms: Vec<String>,
}

impl FunctionValue {
    pub fn new(terms: Vec<String>) -> Self {
        Self { terms }
    }

    /// Number of distinct parameters referenced (x, y, z)
    pub fn parameter_count(&self) -> usize {
        ["z", "y", "x"].iter()
            .position(|p| self.terms.iter().any(|t| t == p))
            .map(|i| 3 - i)
            .unwrap_or(0)
    }
}

impl fmt::Display for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.terms.join(" "))
    }
}

type GeneratorFactory = dyn Fn() -> Box<dyn Iterator<Item = Value>> + Send + Sync;

/// A lazy, possibly infinite sequence. Each call to `iter` restarts it.
#[derive(Clone)]
pub struct GeneratorValue {
    label: String,
    finite: bool,
    factory: Arc<GeneratorFactory>,
}

impl GeneratorValue {
    pub fn new<F>(label: impl Into<String>, finite: bool, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Iterator<Item = Value>> + Send + Sync + 'static,
    {
        Self { label: label.into(), finite, factory: Arc::new(factory) }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = Value>> {
        (self.factory)()
    }

    pub fn is_finite(&self) -> bool {
        self.finite
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for GeneratorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorValue")
            .field("label", &self.label)
            .field("finite", &self.finite)
            .finish()
    }
}

impl PartialEq for GeneratorValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.factory, &other.factory)
    }
}

/// Runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Number),
    Measurement(Measurement),
    DateTime(DateTimeValue),
    List(Vec<Value>),
    Function(FunctionValue),
    Generator(GeneratorValue),
    /// Placeholder for an unbound `$name`
    Name(String),
}

impl Value {
    // ========== Safe Accessors (never panic) ==========

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Scalar(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_measurement(&self) -> Option<&Measurement> {
        match self {
            Value::Measurement(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTimeValue> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionValue> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Truthiness used by filters: non-zero scalars and measurements
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Scalar(n) => !n.is_zero(),
            Value::Measurement(m) => !m.value.is_zero(),
            Value::List(items) => !items.is_empty(),
            _ => true,
        }
    }

    /// Type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "number",
            Value::Measurement(_) => "measurement",
            Value::DateTime(_) => "datetime",
            Value::List(_) => "list",
            Value::Function(_) => "function",
            Value::Generator(_) => "generator",
            Value::Name(_) => "variable name",
        }
    }

    /// Measurement constructor that collapses unitless results to scalars
    pub fn measurement(measurement: Measurement) -> Self {
        measurement.into_value()
    }

    /// Integer argument (counts, indices, exponents)
    pub fn to_integer(&self) -> Option<i64> {
        self.as_number().and_then(Number::to_i64)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(n) => write!(f, "{}", n),
            Value::Measurement(m) => write!(f, "{}", m),
            Value::DateTime(dt) => write!(f, "{}", dt),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[ {} ]", parts.join(", "))
            }
            Value::Function(func) => write!(f, "{}", func),
            Value::Generator(g) => write!(f, "<generator {}>", g.label()),
            Value::Name(name) => write!(f, "${}", name),
        }
    }
}

// ========== Conversions ==========

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Scalar(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Scalar(Number::from_i64(n))
    }
}

impl From<Measurement> for Value {
    fn from(m: Measurement) -> Self {
        m.into_value()
    }
}

impl From<DateTimeValue> for Value {
    fn from(dt: DateTimeValue) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}
