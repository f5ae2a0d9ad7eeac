//! Structured evaluation errors
//!
//! Every failure carries a machine-readable code. An error aborts the
//! current expression only; the caller decides whether to keep going.

use crate::NumberError;
use thiserror::Error;

/// Standard error codes (machine-readable)
pub mod codes {
    pub const INSUFFICIENT_OPERANDS: &str = "INSUFFICIENT_OPERANDS";
    pub const TYPE_MISMATCH: &str = "TYPE_MISMATCH";
    pub const UNDEFINED_UNIT: &str = "UNDEFINED_UNIT";
    pub const INCOMPATIBLE_UNITS: &str = "INCOMPATIBLE_UNITS";
    pub const FRACTIONAL_UNIT_EXPONENT: &str = "FRACTIONAL_UNIT_EXPONENT";
    pub const NO_KNOWN_CONVERSION: &str = "NO_KNOWN_CONVERSION";
    pub const NEGATIVE_LIST_DEPTH: &str = "NEGATIVE_LIST_DEPTH";
    pub const NESTED_OPERATOR_LIST: &str = "NESTED_OPERATOR_LIST";
    pub const MISMATCHED_OPERATOR_LIST: &str = "MISMATCHED_OPERATOR_LIST";
    pub const UNCLOSED_LIST: &str = "UNCLOSED_LIST";
    pub const OUT_OF_RANGE_HISTORY_INDEX: &str = "OUT_OF_RANGE_HISTORY_INDEX";
    pub const DIV_ZERO: &str = "DIV_ZERO";
    pub const INTERRUPTED: &str = "INTERRUPTED";
    pub const UNKNOWN_TERM: &str = "UNKNOWN_TERM";
    pub const DOMAIN_ERROR: &str = "DOMAIN_ERROR";
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const OVERFLOW: &str = "OVERFLOW";
    pub const UNIT_BUILD: &str = "UNIT_BUILD";
    pub const UNITS_UNAVAILABLE: &str = "UNITS_UNAVAILABLE";
    pub const ARTIFACT: &str = "ARTIFACT";
}

/// Name used for a root degree in error messages
fn root_name(degree: &u32) -> String {
    match degree {
        2 => "square".to_string(),
        3 => "cube".to_string(),
        n => format!("{}th", n),
    }
}

fn plural(count: &usize) -> &'static str {
    if *count == 1 { "" } else { "s" }
}

fn suggestion_suffix(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (similar: {})", suggestions.join(", "))
    }
}

/// Errors raised while evaluating terms, building units or persisting caches
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RpnError {
    #[error("'{operator}' requires {needed} argument{}", plural(.needed))]
    InsufficientOperands { operator: String, needed: usize },

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("undefined unit '{0}'")]
    UndefinedUnit(String),

    #[error("incompatible units: '{left}' and '{right}'")]
    IncompatibleUnits { left: String, right: String },

    #[error("cannot take the {} root of '{unit}'", root_name(.degree))]
    FractionalUnitExponent { unit: String, degree: u32 },

    #[error("no known conversion from '{from}' to '{to}'")]
    NoKnownConversion { from: String, to: String },

    #[error("negative list level (too many ']'s)")]
    NegativeListDepth,

    #[error("nested operator lists are not supported")]
    NestedOperatorList,

    #[error("mismatched operator list ending")]
    MismatchedOperatorList,

    #[error("{n} unclosed list{s}", n = .0, s = plural(.0))]
    UnclosedList(usize),

    #[error("result history index {index} is out of range (1..={available})")]
    OutOfRangeHistoryIndex { index: usize, available: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("evaluation interrupted")]
    InterruptedEvaluation,

    #[error("unrecognized term '{term}'{}", suggestion_suffix(.suggestions))]
    UnknownTerm { term: String, suggestions: Vec<String> },

    #[error("domain error: {0}")]
    Domain(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("numeric overflow")]
    Overflow,

    #[error("unit table build failed: {0}")]
    UnitBuild(String),

    #[error("unit conversion is unavailable")]
    UnitsUnavailable,

    #[error("artifact error: {0}")]
    Artifact(String),
}

impl RpnError {
    /// Machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            RpnError::InsufficientOperands { .. } => codes::INSUFFICIENT_OPERANDS,
            RpnError::TypeMismatch(_) => codes::TYPE_MISMATCH,
            RpnError::UndefinedUnit(_) => codes::UNDEFINED_UNIT,
            RpnError::IncompatibleUnits { .. } => codes::INCOMPATIBLE_UNITS,
            RpnError::FractionalUnitExponent { .. } => codes::FRACTIONAL_UNIT_EXPONENT,
            RpnError::NoKnownConversion { .. } => codes::NO_KNOWN_CONVERSION,
            RpnError::NegativeListDepth => codes::NEGATIVE_LIST_DEPTH,
            RpnError::NestedOperatorList => codes::NESTED_OPERATOR_LIST,
            RpnError::MismatchedOperatorList => codes::MISMATCHED_OPERATOR_LIST,
            RpnError::UnclosedList(_) => codes::UNCLOSED_LIST,
            RpnError::OutOfRangeHistoryIndex { .. } => codes::OUT_OF_RANGE_HISTORY_INDEX,
            RpnError::DivisionByZero => codes::DIV_ZERO,
            RpnError::InterruptedEvaluation => codes::INTERRUPTED,
            RpnError::UnknownTerm { .. } => codes::UNKNOWN_TERM,
            RpnError::Domain(_) => codes::DOMAIN_ERROR,
            RpnError::Parse(_) => codes::PARSE_ERROR,
            RpnError::Overflow => codes::OVERFLOW,
            RpnError::UnitBuild(_) => codes::UNIT_BUILD,
            RpnError::UnitsUnavailable => codes::UNITS_UNAVAILABLE,
            RpnError::Artifact(_) => codes::ARTIFACT,
        }
    }

    // ========== Common Error Constructors ==========

    pub fn insufficient_operands(operator: &str, needed: usize) -> Self {
        RpnError::InsufficientOperands { operator: operator.to_string(), needed }
    }

    pub fn type_mismatch(context: impl Into<String>) -> Self {
        RpnError::TypeMismatch(context.into())
    }

    /// Argument of the wrong kind for an operator
    pub fn arg_type(operator: &str, expected: &str, got: &str) -> Self {
        RpnError::TypeMismatch(format!("'{}' expects {}, got {}", operator, expected, got))
    }

    pub fn incompatible_units(left: impl Into<String>, right: impl Into<String>) -> Self {
        RpnError::IncompatibleUnits { left: left.into(), right: right.into() }
    }

    pub fn no_known_conversion(from: impl Into<String>, to: impl Into<String>) -> Self {
        RpnError::NoKnownConversion { from: from.into(), to: to.into() }
    }

    pub fn domain(details: impl Into<String>) -> Self {
        RpnError::Domain(details.into())
    }
}

impl From<NumberError> for RpnError {
    fn from(err: NumberError) -> Self {
        match err {
            NumberError::ParseError(s) => RpnError::Parse(s),
            NumberError::DivisionByZero => RpnError::DivisionByZero,
            NumberError::DomainError(s) => RpnError::Domain(s),
            NumberError::Overflow => RpnError::Overflow,
        }
    }
}

/// An error pinned to the term that raised it
#[derive(Debug, Clone, PartialEq, Error)]
#[error("error in term {index} ('{term}'): {source}")]
pub struct TermError {
    /// 1-based position of the failing term
    pub index: usize,
    pub term: String,
    #[source]
    pub source: RpnError,
}

impl TermError {
    pub fn new(index: usize, term: impl Into<String>, source: RpnError) -> Self {
        Self { index, term: term.into(), source }
    }

    pub fn code(&self) -> &'static str {
        self.source.code()
    }
}
