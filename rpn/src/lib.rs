//! RPN - arbitrary precision postfix calculator
//!
//! `Calculator` owns the operator registry, the unit system and the
//! session state (variables and result history). Each call to `evaluate`
//! runs one expression in a fresh `EvaluationContext` and commits the
//! session state only when the expression succeeds.

mod config;
mod evaluator;
mod literal;

pub use config::CalculatorConfig;
pub use evaluator::TermEvaluator;
pub use literal::parse_literal;

use rpn_core::{RpnError, TermError, Value};
use rpn_plugin::{EvaluationContext, FactorCache, InterruptFlag, OperatorRegistry};
use rpn_units::{UnitSystem, STANDARD_UNITS};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Main calculator engine
pub struct Calculator {
    registry: OperatorRegistry,
    config: CalculatorConfig,
    units: Option<Arc<UnitSystem>>,
    factors: FactorCache,
    interrupt: InterruptFlag,
    variables: Arc<HashMap<String, Value>>,
    history: Arc<Vec<Value>>,
}

impl Calculator {
    pub fn new(config: CalculatorConfig) -> Self {
        Self::with_registry(rpn_std::standard_registry(), config)
    }

    pub fn with_registry(registry: OperatorRegistry, config: CalculatorConfig) -> Self {
        let units = load_units(&config);
        let factors = match config.factors_path() {
            Some(path) => rpn_std::open_factor_cache(&path),
            None => rpn_std::in_memory_factor_cache(),
        };
        info!(operators = registry.len(), units = units.is_some(), "calculator ready");
        Self {
            registry,
            config,
            units,
            factors,
            interrupt: InterruptFlag::new(),
            variables: Arc::default(),
            history: Arc::default(),
        }
    }

    pub fn with_standard_library() -> Self {
        Self::new(CalculatorConfig::default())
    }

    /// Evaluate one pre-tokenized expression and return its final stack.
    /// On failure (including an interrupt) variables and history are left
    /// exactly as they were.
    pub fn evaluate<S: AsRef<str>>(&mut self, terms: &[S]) -> Result<Vec<Value>, TermError> {
        let mut ctx = EvaluationContext::new()
            .with_variables(Arc::clone(&self.variables))
            .with_history(Arc::clone(&self.history));

        let result = TermEvaluator::new(&self.registry, &self.interrupt)
            .with_units(self.units.as_deref())
            .with_factor_cache(Some(&self.factors))
            .with_precision(self.config.precision)
            .with_input_radix(self.config.input_radix)
            .evaluate(terms, &mut ctx);
        self.interrupt.clear();

        let stack = result?;
        // the context held the only other references, so neither map is copied
        let staged = ctx.into_staged_variables();
        if !staged.is_empty() {
            Arc::make_mut(&mut self.variables).extend(staged);
        }
        if let Some(entry) = history_entry(&stack) {
            Arc::make_mut(&mut self.history).push(entry);
        }
        debug!(terms = terms.len(), results = stack.len(), "expression evaluated");
        Ok(stack)
    }

    /// Render a value, measurements with their display names
    pub fn render(&self, value: &Value) -> String {
        match &self.units {
            Some(units) => units.render(value),
            None => value.to_string(),
        }
    }

    /// Handle for aborting the expression in flight from another thread
    pub fn interrupt_flag(&self) -> InterruptFlag {
        self.interrupt.clone()
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    pub fn units(&self) -> Option<&UnitSystem> {
        self.units.as_deref()
    }

    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    pub fn history(&self) -> &[Value] {
        &self.history
    }

    /// Persist the qualifying factorization memo entries
    pub fn flush_caches(&self) -> Result<usize, RpnError> {
        self.factors.flush()
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::with_standard_library()
    }
}

/// One history entry per expression: the lone result, or the whole stack
fn history_entry(stack: &[Value]) -> Option<Value> {
    match stack {
        [] => None,
        [single] => Some(single.clone()),
        many => Some(Value::List(many.to_vec())),
    }
}

fn load_units(config: &CalculatorConfig) -> Option<Arc<UnitSystem>> {
    if !config.units {
        warn!("unit system disabled, unit terms are unavailable");
        return None;
    }
    let loaded = match config.units_path() {
        Some(path) => UnitSystem::load_or_build(&path).map(Arc::new),
        None => STANDARD_UNITS.as_ref().map(Arc::clone).map_err(Clone::clone),
    };
    match loaded {
        Ok(units) => Some(units),
        Err(e) => {
            warn!(error = %e, "unit system unavailable, continuing without unit conversion");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpn_core::{Measurement, Number, UnitAlgebra};

    fn calculator() -> Calculator {
        Calculator::with_standard_library()
    }

    fn eval(calc: &mut Calculator, line: &str) -> Result<Vec<Value>, TermError> {
        let terms: Vec<&str> = line.split_whitespace().collect();
        calc.evaluate(&terms)
    }

    fn n(value: i64) -> Value {
        Value::from(value)
    }

    fn list(values: &[i64]) -> Value {
        Value::List(values.iter().map(|&v| n(v)).collect())
    }

    fn m(value: i64, unit: &str) -> Value {
        Value::Measurement(Measurement::of_unit(Number::from_i64(value), unit))
    }

    #[test]
    fn test_arithmetic() {
        let mut calc = calculator();
        assert_eq!(eval(&mut calc, "2 3 +").unwrap(), vec![n(5)]);
        assert_eq!(eval(&mut calc, "2 3 4 * +").unwrap(), vec![n(14)]);
        assert_eq!(eval(&mut calc, "1 2 3").unwrap(), vec![n(1), n(2), n(3)]);
    }

    #[test]
    fn test_feet_plus_inches() {
        let mut calc = calculator();
        let stack = calc.evaluate(&["3", "foot", "12", "inch", "+"]).unwrap();
        assert_eq!(stack, vec![m(4, "foot")]);
        assert_eq!(calc.render(&stack[0]), "4 feet");

        let inches = eval(&mut calc, "3 foot 12 inch + inch convert").unwrap();
        assert_eq!(inches, vec![m(48, "inch")]);
    }

    #[test]
    fn test_unit_terms() {
        let mut calc = calculator();
        // abbreviations and plurals resolve
        assert_eq!(eval(&mut calc, "2 ft").unwrap(), vec![m(2, "foot")]);
        assert_eq!(eval(&mut calc, "2 feet").unwrap(), vec![m(2, "foot")]);
        // a list of numbers takes the unit elementwise
        assert_eq!(eval(&mut calc, "[ 1 2 ] foot").unwrap(), vec![Value::List(vec![m(1, "foot"), m(2, "foot")])]);
        // constant units collapse
        assert_eq!(eval(&mut calc, "2 dozen").unwrap(), vec![n(24)]);
        // compound units
        let speed = eval(&mut calc, "10 meter/second").unwrap();
        let expected = Measurement::new(
            Number::from_i64(10),
            UnitAlgebra::from_pairs([("meter", 1), ("second", -1)]),
        );
        assert_eq!(speed, vec![Value::Measurement(expected)]);
    }

    #[test]
    fn test_broadcast() {
        let mut calc = calculator();
        assert_eq!(eval(&mut calc, "[ 2 3 ] 4 +").unwrap(), vec![list(&[6, 7])]);
        assert_eq!(eval(&mut calc, "[ 1 2 3 ] [ 10 20 30 ] +").unwrap(), vec![list(&[11, 22, 33])]);
        assert_eq!(eval(&mut calc, "[ 1 2 ] [ 1 2 3 ] +").unwrap(), vec![list(&[2, 4])]);
    }

    #[test]
    fn test_nested_lists() {
        let mut calc = calculator();
        let stack = eval(&mut calc, "[ [ 1 2 ] [ 3 4 ] ]").unwrap();
        assert_eq!(stack, vec![Value::List(vec![list(&[1, 2]), list(&[3, 4])])]);

        let err = eval(&mut calc, "1 ]").unwrap_err();
        assert_eq!(err.index, 2);
        assert_eq!(err.source, RpnError::NegativeListDepth);

        let err = eval(&mut calc, "[ 1 2").unwrap_err();
        assert_eq!(err.source, RpnError::UnclosedList(1));
    }

    #[test]
    fn test_operator_lists() {
        let mut calc = calculator();
        assert_eq!(eval(&mut calc, "{ 2 3 + 2 3 * }").unwrap(), vec![list(&[5, 6])]);
        assert_eq!(eval(&mut calc, "2 3 { + * - }").unwrap(), vec![list(&[5, 6, -1])]);
        assert_eq!(eval(&mut calc, "{ { }").unwrap_err().source, RpnError::NestedOperatorList);
        assert_eq!(eval(&mut calc, "1 }").unwrap_err().source, RpnError::MismatchedOperatorList);
    }

    #[test]
    fn test_duplication() {
        let mut calc = calculator();
        assert_eq!(eval(&mut calc, "5 3 dup_term").unwrap(), vec![n(5), n(5), n(5)]);
        assert_eq!(eval(&mut calc, "1 2 3 dup_operator +").unwrap(), vec![n(7)]);
        assert_eq!(eval(&mut calc, "2 3 0 dup_operator +").unwrap(), vec![n(2), n(3)]);
        assert!(matches!(
            eval(&mut calc, "1 2 dup_operator 2 dup_operator +").unwrap_err().source,
            RpnError::TypeMismatch(_)
        ));
    }

    #[test]
    fn test_functions() {
        let mut calc = calculator();
        assert_eq!(eval(&mut calc, "5 x 2 * eval").unwrap(), vec![n(10)]);
        assert_eq!(eval(&mut calc, "[ 1 2 3 ] x x * eval").unwrap(), vec![list(&[1, 4, 9])]);
        assert_eq!(eval(&mut calc, "3 4 x y + eval2").unwrap(), vec![n(7)]);
        assert_eq!(eval(&mut calc, "1 10 range x 3 modulo filter").unwrap(), vec![list(&[1, 2, 4, 5, 7, 8, 10])]);
        assert_eq!(eval(&mut calc, "1 5 x 2 * recurrence").unwrap(), vec![list(&[1, 2, 4, 8, 16])]);

        let err = eval(&mut calc, "5 x 2 eval").unwrap_err();
        assert!(matches!(err.source, RpnError::TypeMismatch(_)));

        // an unfinished capture is left on the stack
        let stack = eval(&mut calc, "x 1 +").unwrap();
        assert!(matches!(stack[0], Value::Function(_)));
    }

    #[test]
    fn test_variables_and_history() {
        let mut calc = calculator();
        assert_eq!(eval(&mut calc, "$rate 3 set").unwrap(), vec![n(3)]);
        assert_eq!(eval(&mut calc, "$rate 2 *").unwrap(), vec![n(6)]);
        assert_eq!(eval(&mut calc, "$unbound").unwrap(), vec![Value::Name("unbound".into())]);

        assert_eq!(eval(&mut calc, "$2 $1 +").unwrap(), vec![n(9)]);
        let err = eval(&mut calc, "$99").unwrap_err();
        assert!(matches!(err.source, RpnError::OutOfRangeHistoryIndex { index: 99, .. }));
    }

    #[test]
    fn test_bindings_accumulate_across_expressions() {
        let mut calc = calculator();
        eval(&mut calc, "$a 1 set").unwrap();
        eval(&mut calc, "$b 2 set").unwrap();
        eval(&mut calc, "$a 10 set").unwrap();
        assert_eq!(calc.variables().get("a"), Some(&n(10)));
        assert_eq!(calc.variables().get("b"), Some(&n(2)));
        assert_eq!(eval(&mut calc, "$a $b +").unwrap(), vec![n(12)]);
        assert_eq!(calc.history(), &[n(1), n(2), n(10), n(12)]);
    }

    #[test]
    fn test_zero_to_negative_power() {
        let mut calc = calculator();
        assert_eq!(eval(&mut calc, "0 -1 power").unwrap_err().source, RpnError::DivisionByZero);
        assert_eq!(eval(&mut calc, "0 -0.5 power").unwrap_err().source, RpnError::DivisionByZero);
        assert_eq!(eval(&mut calc, "0 2 power").unwrap(), vec![n(0)]);
    }

    #[test]
    fn test_trig_of_large_angles() {
        let mut calc = calculator();
        let mut close = |line: &str, expected: f64| {
            let stack = eval(&mut calc, line).unwrap();
            match &stack[..] {
                [Value::Scalar(x)] => assert!((x.to_f64().unwrap() - expected).abs() < 1e-12, "{} gave {}", line, x),
                other => panic!("{} gave {:?}", line, other),
            }
        };
        close("10 sin", -0.5440211108893698);
        close("100 sin", -0.5063656411097588);
        close("30 degree sin", 0.5);
    }

    #[test]
    fn test_oversized_results_are_rejected() {
        let mut calc = calculator();
        let err = eval(&mut calc, "1 1000000000000000000 x 2 * recurrence").unwrap_err();
        assert!(matches!(err.source, RpnError::Domain(_)));
        let err = eval(&mut calc, "7 1000000000000 dup_term").unwrap_err();
        assert!(matches!(err.source, RpnError::Domain(_)));
        assert!(calc.history().is_empty());
    }

    #[test]
    fn test_failed_expression_commits_nothing() {
        let mut calc = calculator();
        eval(&mut calc, "$a 1 set").unwrap();
        let history = calc.history().len();

        let err = eval(&mut calc, "$a 2 set 1 0 /").unwrap_err();
        assert_eq!(err.index, 6);
        assert_eq!(err.source, RpnError::DivisionByZero);
        assert_eq!(calc.variables().get("a"), Some(&n(1)));
        assert_eq!(calc.history().len(), history);
    }

    #[test]
    fn test_interrupt() {
        let mut calc = calculator();
        calc.interrupt_flag().raise();
        let err = eval(&mut calc, "1 2 +").unwrap_err();
        assert_eq!(err.source, RpnError::InterruptedEvaluation);
        assert_eq!(err.index, 1);
        assert!(calc.history().is_empty());
        // the flag is cleared for the next expression
        assert_eq!(eval(&mut calc, "1 2 +").unwrap(), vec![n(3)]);
    }

    #[test]
    fn test_unknown_terms() {
        let mut calc = calculator();
        match eval(&mut calc, "2 sqrtt").unwrap_err().source {
            RpnError::UnknownTerm { term, suggestions } => {
                assert_eq!(term, "sqrtt");
                assert!(suggestions.contains(&"square_root".to_string()) || suggestions.contains(&"sqrt".to_string()));
            }
            other => panic!("unexpected error {:?}", other),
        }
        let err = eval(&mut calc, "+").unwrap_err();
        assert_eq!(err.source, RpnError::insufficient_operands("add", 2));
    }

    #[test]
    fn test_degraded_mode() {
        let mut calc = Calculator::new(CalculatorConfig::default().with_units(false));
        assert!(calc.units().is_none());
        assert_eq!(eval(&mut calc, "2 3 +").unwrap(), vec![n(5)]);
        assert_eq!(eval(&mut calc, "3 foot").unwrap_err().source, RpnError::UnitsUnavailable);
    }

    #[test]
    fn test_persisted_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let config = CalculatorConfig::default().with_data_dir(dir.path());

        let mut calc = Calculator::new(config.clone());
        assert!(dir.path().join("units.json").exists());
        eval(&mut calc, "2000006 factor").unwrap();
        assert_eq!(calc.flush_caches().unwrap(), 1);
        assert!(dir.path().join("factors.json").exists());

        let mut reloaded = Calculator::new(config);
        assert_eq!(eval(&mut reloaded, "1 mile foot convert").unwrap(), vec![m(5280, "foot")]);
    }

    #[test]
    fn test_generators_and_lists() {
        let mut calc = calculator();
        assert_eq!(eval(&mut calc, "1 2 sequence 4 take").unwrap(), vec![list(&[1, 3, 5, 7])]);
        assert_eq!(eval(&mut calc, "1 4 range sum").unwrap(), vec![n(10)]);
        assert_eq!(eval(&mut calc, "[ 3 1 2 ] sort").unwrap(), vec![list(&[1, 2, 3])]);
        assert_eq!(eval(&mut calc, "[ 1 2 ] unlist").unwrap(), vec![n(1), n(2)]);
    }
}
