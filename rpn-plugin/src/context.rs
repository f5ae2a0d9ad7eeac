//! Evaluation Context
//!
//! `EvaluationContext` holds the mutable state of one expression: the
//! nested list frames, the operator-list capture, a pending duplicate
//! count, a function being recorded and the parameter bindings of a
//! function replay. Variable bindings and result history are shared
//! snapshots of the session; new bindings are staged in the context and go
//! back out only when the expression succeeds.
//!
//! `OperatorContext` is the read-only environment operator bodies see.

use rpn_core::{FunctionValue, Number, PersistentCache, RpnError, Value, DEFAULT_PRECISION};
use rpn_units::UnitSystem;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Factorization memo: decimal integer -> decimal prime factors
pub type FactorCache = PersistentCache<String, Vec<String>>;

/// Shared cancellation flag, raised from outside the evaluation
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), RpnError> {
        if self.is_raised() {
            Err(RpnError::InterruptedEvaluation)
        } else {
            Ok(())
        }
    }
}

/// Replays a captured function. Implemented by the term evaluator, which
/// evaluates the body in a fresh `EvaluationContext`.
pub trait FunctionApplier {
    fn apply(&self, function: &FunctionValue, args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError>;
}

/// Applier for contexts that never replay functions
pub struct NoFunctions;

impl FunctionApplier for NoFunctions {
    fn apply(&self, _function: &FunctionValue, _args: &[Value], _ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
        Err(RpnError::type_mismatch("function application is not available here"))
    }
}

/// Environment passed to operator bodies
pub struct OperatorContext<'a> {
    pub precision: u32,
    units: Option<&'a UnitSystem>,
    applier: &'a dyn FunctionApplier,
    interrupt: &'a InterruptFlag,
    factors: Option<&'a FactorCache>,
}

impl<'a> OperatorContext<'a> {
    pub fn new(applier: &'a dyn FunctionApplier, interrupt: &'a InterruptFlag) -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            units: None,
            applier,
            interrupt,
            factors: None,
        }
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_units(mut self, units: Option<&'a UnitSystem>) -> Self {
        self.units = units;
        self
    }

    pub fn with_factor_cache(mut self, factors: Option<&'a FactorCache>) -> Self {
        self.factors = factors;
        self
    }

    /// The unit system, or `UnitsUnavailable` in degraded mode
    pub fn units(&self) -> Result<&'a UnitSystem, RpnError> {
        self.units.ok_or(RpnError::UnitsUnavailable)
    }

    pub fn has_units(&self) -> bool {
        self.units.is_some()
    }

    pub fn factor_cache(&self) -> Option<&'a FactorCache> {
        self.factors
    }

    pub fn interrupt(&self) -> &'a InterruptFlag {
        self.interrupt
    }

    pub fn check_interrupt(&self) -> Result<(), RpnError> {
        self.interrupt.check()
    }

    /// Replay `function` with `args` bound to x, y, z
    pub fn apply_function(&self, function: &Value, args: &[Value]) -> Result<Value, RpnError> {
        self.check_interrupt()?;
        let function = function.as_function().ok_or_else(|| {
            RpnError::type_mismatch(format!("expected a function, got {}", function.type_name()))
        })?;
        self.applier.apply(function, args, self)
    }
}

/// Coarse state of the term state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationState {
    Idle,
    ListOpen(usize),
    OperatorListCapture,
}

#[derive(Debug)]
struct OperatorListCapture {
    /// List depth where `{` appeared
    depth: usize,
    /// Stack length at `{`
    start: usize,
    /// How far below `start` operators have reached for operands
    reach: usize,
    results: Vec<Value>,
}

/// Mutable state of one top-level expression (or one function replay)
#[derive(Debug)]
pub struct EvaluationContext {
    frames: Vec<Vec<Value>>,
    capture: Option<OperatorListCapture>,
    pending_duplicates: Option<usize>,
    function: Option<Vec<String>>,
    bindings: Option<Vec<Value>>,
    variables: Arc<HashMap<String, Value>>,
    staged: HashMap<String, Value>,
    history: Arc<Vec<Value>>,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self {
            frames: vec![Vec::new()],
            capture: None,
            pending_duplicates: None,
            function: None,
            bindings: None,
            variables: Arc::default(),
            staged: HashMap::new(),
            history: Arc::default(),
        }
    }

    /// Fresh context for replaying a function body
    pub fn for_function(args: &[Value]) -> Self {
        let mut ctx = Self::new();
        ctx.bindings = Some(args.to_vec());
        ctx
    }

    pub fn with_variables(mut self, variables: impl Into<Arc<HashMap<String, Value>>>) -> Self {
        self.variables = variables.into();
        self
    }

    pub fn with_history(mut self, history: impl Into<Arc<Vec<Value>>>) -> Self {
        self.history = history.into();
        self
    }

    pub fn state(&self) -> EvaluationState {
        if self.capture.is_some() {
            EvaluationState::OperatorListCapture
        } else if self.depth() > 0 {
            EvaluationState::ListOpen(self.depth())
        } else {
            EvaluationState::Idle
        }
    }

    // ========== Stack ==========

    /// Current list nesting depth
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    fn frame(&self) -> &Vec<Value> {
        &self.frames[self.frames.len() - 1]
    }

    fn frame_mut(&mut self) -> &mut Vec<Value> {
        let top = self.frames.len() - 1;
        &mut self.frames[top]
    }

    /// Values of the innermost open list (the main stack at depth 0)
    pub fn stack(&self) -> &[Value] {
        self.frame()
    }

    pub fn len(&self) -> usize {
        self.frame().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame().is_empty()
    }

    pub fn top(&self) -> Option<&Value> {
        self.frame().last()
    }

    pub fn push(&mut self, value: Value) {
        self.frame_mut().push(value);
    }

    pub fn extend(&mut self, values: impl IntoIterator<Item = Value>) {
        self.frame_mut().extend(values);
    }

    /// Fail unless at least `needed` values are on the stack
    pub fn require(&self, operator: &str, needed: usize) -> Result<(), RpnError> {
        if self.len() < needed {
            Err(RpnError::insufficient_operands(operator, needed))
        } else {
            Ok(())
        }
    }

    pub fn pop(&mut self, operator: &str) -> Result<Value, RpnError> {
        self.frame_mut().pop()
            .ok_or_else(|| RpnError::insufficient_operands(operator, 1))
    }

    /// Copies of the top `count` values, bottom first
    pub fn peek(&self, count: usize) -> Vec<Value> {
        let frame = self.frame();
        frame[frame.len().saturating_sub(count)..].to_vec()
    }

    /// Operands for one operator application, in declared order. Inside an
    /// operator list they are read, not removed; `}` removes them.
    pub fn take_operands(&mut self, operator: &str, arity: usize) -> Result<Vec<Value>, RpnError> {
        self.require(operator, arity)?;
        let depth = self.depth();
        let len = self.len();
        let shared = match &mut self.capture {
            Some(capture) if capture.depth == depth => {
                let inside = len.saturating_sub(capture.start);
                capture.reach = capture.reach.max(arity.saturating_sub(inside));
                true
            }
            _ => false,
        };
        if shared {
            Ok(self.peek(arity))
        } else {
            Ok(self.frame_mut().split_off(len - arity))
        }
    }

    /// Push an operator's result; inside an operator list it is collected
    pub fn push_result(&mut self, value: Value) {
        let depth = self.depth();
        if let Some(capture) = self.capture.as_mut().filter(|capture| capture.depth == depth) {
            capture.results.push(value);
            return;
        }
        self.push(value);
    }

    // ========== Lists ==========

    pub fn open_list(&mut self) {
        self.frames.push(Vec::new());
    }

    pub fn close_list(&mut self) -> Result<(), RpnError> {
        if self.frames.len() == 1 {
            return Err(RpnError::NegativeListDepth);
        }
        if matches!(&self.capture, Some(capture) if capture.depth == self.depth()) {
            return Err(RpnError::MismatchedOperatorList);
        }
        let items = self.frames.pop().unwrap_or_default();
        self.push(Value::List(items));
        Ok(())
    }

    // ========== Operator Lists ==========

    pub fn begin_operator_list(&mut self) -> Result<(), RpnError> {
        if self.capture.is_some() {
            return Err(RpnError::NestedOperatorList);
        }
        self.capture = Some(OperatorListCapture {
            depth: self.depth(),
            start: self.len(),
            reach: 0,
            results: Vec::new(),
        });
        Ok(())
    }

    /// Drop every operand the captured operators used and push their
    /// results as one list, in application order
    pub fn end_operator_list(&mut self) -> Result<(), RpnError> {
        let capture = match self.capture.take() {
            Some(capture) if capture.depth == self.depth() => capture,
            Some(capture) => {
                self.capture = Some(capture);
                return Err(RpnError::MismatchedOperatorList);
            }
            None => return Err(RpnError::MismatchedOperatorList),
        };
        let keep = capture.start.saturating_sub(capture.reach);
        self.frame_mut().truncate(keep);
        self.push(Value::List(capture.results));
        Ok(())
    }

    // ========== Duplication ==========

    pub fn set_pending_duplicates(&mut self, count: usize) -> Result<(), RpnError> {
        if self.pending_duplicates.is_some() {
            return Err(RpnError::type_mismatch("'dup_operator' must be followed by another operator"));
        }
        self.pending_duplicates = Some(count);
        Ok(())
    }

    pub fn take_pending_duplicates(&mut self) -> Option<usize> {
        self.pending_duplicates.take()
    }

    // ========== Functions ==========

    /// Start recording a function body with its first term
    pub fn begin_function(&mut self, first: &str) {
        self.function = Some(vec![first.to_string()]);
    }

    pub fn is_recording_function(&self) -> bool {
        self.function.is_some()
    }

    pub fn record_term(&mut self, term: &str) {
        if let Some(terms) = &mut self.function {
            terms.push(term.to_string());
        }
    }

    pub fn finish_function(&mut self) -> Option<FunctionValue> {
        self.function.take().map(FunctionValue::new)
    }

    /// Bound value of `x`, `y` or `z` during a replay. Parameters past the
    /// supplied arguments are zero.
    pub fn parameter(&self, name: &str) -> Option<Value> {
        let bindings = self.bindings.as_ref()?;
        let index = match name {
            "x" => 0,
            "y" => 1,
            "z" => 2,
            _ => return None,
        };
        Some(bindings.get(index).cloned().unwrap_or_else(|| Value::Scalar(Number::from_i64(0))))
    }

    // ========== Variables and History ==========

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.staged.get(name).or_else(|| self.variables.get(name))
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.staged.insert(name.into(), value);
    }

    /// Bindings made by this expression, not yet in the session
    pub fn staged_variables(&self) -> &HashMap<String, Value> {
        &self.staged
    }

    pub fn into_staged_variables(self) -> HashMap<String, Value> {
        self.staged
    }

    /// 1-based history lookup
    pub fn history_entry(&self, index: usize) -> Result<Value, RpnError> {
        index.checked_sub(1)
            .and_then(|i| self.history.get(i))
            .cloned()
            .ok_or(RpnError::OutOfRangeHistoryIndex { index, available: self.history.len() })
    }

    // ========== Completion ==========

    /// Take the final stack. Open lists and an open operator list are
    /// errors; a function still being recorded is pushed as a value.
    pub fn finish(&mut self) -> Result<Vec<Value>, RpnError> {
        if self.depth() > 0 {
            return Err(RpnError::UnclosedList(self.depth()));
        }
        if self.capture.is_some() {
            return Err(RpnError::MismatchedOperatorList);
        }
        if let Some(function) = self.finish_function() {
            self.push(Value::Function(function));
        }
        Ok(std::mem::take(self.frame_mut()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(value: i64) -> Value {
        Value::from(value)
    }

    #[test]
    fn test_nested_lists() {
        let mut ctx = EvaluationContext::new();
        ctx.open_list();
        ctx.open_list();
        ctx.push(n(1));
        ctx.push(n(2));
        ctx.close_list().unwrap();
        assert_eq!(ctx.state(), EvaluationState::ListOpen(1));
        ctx.open_list();
        ctx.push(n(3));
        ctx.close_list().unwrap();
        ctx.close_list().unwrap();

        let stack = ctx.finish().unwrap();
        assert_eq!(stack, vec![Value::List(vec![
            Value::List(vec![n(1), n(2)]),
            Value::List(vec![n(3)]),
        ])]);
    }

    #[test]
    fn test_unmatched_close_is_an_error() {
        let mut ctx = EvaluationContext::new();
        assert_eq!(ctx.close_list(), Err(RpnError::NegativeListDepth));

        ctx.open_list();
        assert_eq!(ctx.finish(), Err(RpnError::UnclosedList(1)));
    }

    #[test]
    fn test_operator_list_reads_shared_operands() {
        let mut ctx = EvaluationContext::new();
        ctx.push(n(2));
        ctx.push(n(3));
        ctx.begin_operator_list().unwrap();
        assert_eq!(ctx.state(), EvaluationState::OperatorListCapture);

        let first = ctx.take_operands("add", 2).unwrap();
        assert_eq!(first, vec![n(2), n(3)]);
        ctx.push_result(n(5));
        let second = ctx.take_operands("multiply", 2).unwrap();
        assert_eq!(second, vec![n(2), n(3)]);
        ctx.push_result(n(6));

        ctx.end_operator_list().unwrap();
        assert_eq!(ctx.finish().unwrap(), vec![Value::List(vec![n(5), n(6)])]);
    }

    #[test]
    fn test_operator_list_errors() {
        let mut ctx = EvaluationContext::new();
        assert_eq!(ctx.end_operator_list(), Err(RpnError::MismatchedOperatorList));
        ctx.begin_operator_list().unwrap();
        assert_eq!(ctx.begin_operator_list(), Err(RpnError::NestedOperatorList));
        assert_eq!(ctx.finish(), Err(RpnError::MismatchedOperatorList));
    }

    #[test]
    fn test_take_operands_pops_in_order() {
        let mut ctx = EvaluationContext::new();
        ctx.extend([n(1), n(2), n(3)]);
        assert_eq!(ctx.take_operands("subtract", 2).unwrap(), vec![n(2), n(3)]);
        assert_eq!(ctx.stack(), &[n(1)]);
        assert_eq!(
            ctx.take_operands("subtract", 2),
            Err(RpnError::insufficient_operands("subtract", 2))
        );
    }

    #[test]
    fn test_pending_duplicates() {
        let mut ctx = EvaluationContext::new();
        ctx.set_pending_duplicates(3).unwrap();
        assert!(ctx.set_pending_duplicates(2).is_err());
        assert_eq!(ctx.take_pending_duplicates(), Some(3));
        assert_eq!(ctx.take_pending_duplicates(), None);
    }

    #[test]
    fn test_function_bindings() {
        let ctx = EvaluationContext::for_function(&[n(7)]);
        assert_eq!(ctx.parameter("x"), Some(n(7)));
        assert_eq!(ctx.parameter("y"), Some(n(0)));
        assert_eq!(EvaluationContext::new().parameter("x"), None);
    }

    #[test]
    fn test_unfinished_function_is_pushed() {
        let mut ctx = EvaluationContext::new();
        ctx.begin_function("x");
        ctx.record_term("2");
        ctx.record_term("*");
        let stack = ctx.finish().unwrap();
        assert_eq!(stack, vec![Value::Function(FunctionValue::new(vec!["x".into(), "2".into(), "*".into()]))]);
    }

    #[test]
    fn test_history_is_one_based() {
        let ctx = EvaluationContext::new().with_history(vec![n(10), n(20)]);
        assert_eq!(ctx.history_entry(1).unwrap(), n(10));
        assert_eq!(ctx.history_entry(2).unwrap(), n(20));
        assert_eq!(ctx.history_entry(0), Err(RpnError::OutOfRangeHistoryIndex { index: 0, available: 2 }));
        assert!(ctx.history_entry(3).is_err());
    }

    #[test]
    fn test_session_state_is_shared_not_copied() {
        let history = Arc::new(vec![n(1), n(2)]);
        let variables = Arc::new(HashMap::from([("a".to_string(), n(1))]));
        let mut ctx = EvaluationContext::new()
            .with_variables(Arc::clone(&variables))
            .with_history(Arc::clone(&history));
        assert_eq!(Arc::strong_count(&history), 2);
        assert_eq!(Arc::strong_count(&variables), 2);

        ctx.set_variable("a", n(5));
        ctx.set_variable("b", n(6));
        assert_eq!(ctx.variable("a"), Some(&n(5)));
        assert_eq!(ctx.variable("b"), Some(&n(6)));
        assert_eq!(variables.get("a"), Some(&n(1)));

        let staged = ctx.into_staged_variables();
        assert_eq!(staged.len(), 2);
        assert_eq!(Arc::strong_count(&history), 1);
    }

    #[test]
    fn test_interrupt_flag() {
        let flag = InterruptFlag::new();
        let shared = flag.clone();
        assert!(flag.check().is_ok());
        shared.raise();
        assert_eq!(flag.check(), Err(RpnError::InterruptedEvaluation));
        flag.clear();
        assert!(!shared.is_raised());
    }
}
