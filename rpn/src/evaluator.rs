//! Term evaluator
//!
//! Each term is resolved in this order:
//! 1. while a function is being captured, every term is recorded until one
//!    names a function-consuming operator
//! 2. `$name` variables and `$N` history references
//! 3. modifiers (`[`, `{`, `dup_term`, `x`, ...)
//! 4. unit names, abbreviations and aliases, then compound units (`m/s`)
//! 5. regular and list operators, aliases included
//! 6. literals

use crate::literal::parse_literal;
use rpn_core::{FunctionValue, Measurement, Number, RpnError, TermError, UnitAlgebra, Value};
use rpn_plugin::dispatch;
use rpn_plugin::{
    EvaluationContext, FactorCache, FunctionApplier, Handler, InterruptFlag, OperatorContext, OperatorDescriptor,
    OperatorKind, OperatorRegistry,
};
use rpn_units::UnitSystem;
use tracing::trace;

/// Evaluates term sequences against a registry and an optional unit system
pub struct TermEvaluator<'a> {
    registry: &'a OperatorRegistry,
    interrupt: &'a InterruptFlag,
    units: Option<&'a UnitSystem>,
    factors: Option<&'a FactorCache>,
    precision: u32,
    input_radix: u32,
}

impl<'a> TermEvaluator<'a> {
    pub fn new(registry: &'a OperatorRegistry, interrupt: &'a InterruptFlag) -> Self {
        Self {
            registry,
            interrupt,
            units: None,
            factors: None,
            precision: rpn_core::DEFAULT_PRECISION,
            input_radix: 10,
        }
    }

    pub fn with_units(mut self, units: Option<&'a UnitSystem>) -> Self {
        self.units = units;
        self
    }

    pub fn with_factor_cache(mut self, factors: Option<&'a FactorCache>) -> Self {
        self.factors = factors;
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_input_radix(mut self, radix: u32) -> Self {
        self.input_radix = radix;
        self
    }

    fn operator_context(&self) -> OperatorContext<'_> {
        OperatorContext::new(self, self.interrupt)
            .with_precision(self.precision)
            .with_units(self.units)
            .with_factor_cache(self.factors)
    }

    /// Evaluate `terms` in `ctx` and return the final stack. Failures carry
    /// the 1-based index of the offending term.
    pub fn evaluate<S: AsRef<str>>(&self, terms: &[S], ctx: &mut EvaluationContext) -> Result<Vec<Value>, TermError> {
        for (i, term) in terms.iter().enumerate() {
            let term = term.as_ref();
            self.interrupt.check()
                .and_then(|_| self.evaluate_term(term, ctx))
                .map_err(|e| TermError::new(i + 1, term, e))?;
        }
        ctx.finish().map_err(|e| {
            let last = terms.last().map_or("", |t| t.as_ref());
            TermError::new(terms.len(), last, e)
        })
    }

    /// Apply one term to the evaluation state
    pub fn evaluate_term(&self, term: &str, ctx: &mut EvaluationContext) -> Result<(), RpnError> {
        trace!(term, depth = ctx.depth(), stack = ctx.len(), "term");
        let descriptor = self.registry.get(term);

        if ctx.is_recording_function() {
            match descriptor {
                Some(d) if d.takes_function => {
                    if let Some(function) = ctx.finish_function() {
                        ctx.push(Value::Function(function));
                    }
                }
                _ => {
                    ctx.record_term(term);
                    return Ok(());
                }
            }
        }

        if let Some(reference) = term.strip_prefix('$').filter(|r| !r.is_empty()) {
            return self.reference(reference, ctx);
        }

        if let Some(d) = descriptor {
            if let Handler::Modifier(body) = d.handler {
                return body(ctx);
            }
        }

        if let Some(units) = self.unit_term(term)? {
            return self.apply_unit(&units, ctx);
        }

        if let Some(d) = descriptor {
            return self.apply_operator(d, ctx);
        }

        match parse_literal(term, self.input_radix) {
            Ok(value) => {
                ctx.push(value);
                Ok(())
            }
            Err(_) if self.units.is_none() && looks_like_unit(term) => Err(RpnError::UnitsUnavailable),
            Err(_) => Err(self.registry.unknown_term(term)),
        }
    }

    fn reference(&self, reference: &str, ctx: &mut EvaluationContext) -> Result<(), RpnError> {
        if reference.chars().all(|c| c.is_ascii_digit()) {
            let index = reference.parse::<usize>().map_err(|_| RpnError::Overflow)?;
            let value = ctx.history_entry(index)?;
            ctx.push(value);
            return Ok(());
        }
        let value = ctx.variable(reference)
            .cloned()
            .unwrap_or_else(|| Value::Name(reference.to_string()));
        ctx.push(value);
        Ok(())
    }

    // ========== Units ==========

    /// Units named by `term`: a single unit by name, abbreviation or alias,
    /// or a compound expression such as `meter/second^2`
    fn unit_term(&self, term: &str) -> Result<Option<UnitAlgebra>, RpnError> {
        let Some(units) = self.units else {
            return Ok(None);
        };
        if let Some(name) = units.resolve_unit(term) {
            return Ok(Some(UnitAlgebra::unit(name)));
        }
        let compound = term.contains(['/', '*', '^']) && term.chars().any(|c| c.is_ascii_alphabetic());
        if compound && !self.registry.contains(term) {
            if let Ok(algebra) = units.parse_units(term) {
                return Ok(Some(algebra));
            }
        }
        Ok(None)
    }

    fn attach(&self, value: &Number, units: &UnitAlgebra) -> Result<Value, RpnError> {
        let system = self.units.ok_or(RpnError::UnitsUnavailable)?;
        match units.single_unit() {
            Some(name) => system.attach(value, name),
            None => Ok(Value::from(Measurement::new(value.clone(), units.clone()))),
        }
    }

    /// A number on top takes the unit; otherwise a bare unit of magnitude 1
    /// is pushed so it can serve as a conversion target or a factor
    fn apply_unit(&self, units: &UnitAlgebra, ctx: &mut EvaluationContext) -> Result<(), RpnError> {
        let one = Number::from_i64(1);
        match ctx.top() {
            None | Some(Value::Measurement(_)) | Some(Value::DateTime(_)) => {
                let bare = self.attach(&one, units)?;
                ctx.push(bare);
            }
            Some(Value::Scalar(n)) => {
                let attached = self.attach(n, units)?;
                ctx.pop("unit")?;
                ctx.push(attached);
            }
            Some(Value::List(items)) if items.iter().all(|v| matches!(v, Value::Measurement(_))) => {
                let bare = self.attach(&one, units)?;
                ctx.push(bare);
            }
            Some(Value::List(items)) if items.iter().all(|v| matches!(v, Value::Scalar(_))) => {
                let attached = items.iter()
                    .filter_map(Value::as_number)
                    .map(|n| self.attach(n, units))
                    .collect::<Result<Vec<_>, _>>()?;
                ctx.pop("unit")?;
                ctx.push(Value::List(attached));
            }
            Some(other) => {
                return Err(RpnError::type_mismatch(format!(
                    "a unit cannot be applied to {}", other.type_name()
                )));
            }
        }
        Ok(())
    }

    // ========== Operators ==========

    fn apply_operator(&self, descriptor: &OperatorDescriptor, ctx: &mut EvaluationContext) -> Result<(), RpnError> {
        let Some(repeats) = ctx.take_pending_duplicates() else {
            return self.apply_once(descriptor, ctx);
        };

        let arity = descriptor.arity();
        ctx.require(descriptor.name, arity)?;
        // every repetition after the first gets the same trailing operands
        let resupplied = ctx.peek(arity.saturating_sub(1));
        for i in 0..repeats {
            if i > 0 {
                ctx.extend(resupplied.iter().cloned());
            }
            self.apply_once(descriptor, ctx)?;
        }
        Ok(())
    }

    fn apply_once(&self, descriptor: &OperatorDescriptor, ctx: &mut EvaluationContext) -> Result<(), RpnError> {
        let args = ctx.take_operands(descriptor.name, descriptor.arity())?;
        let result = dispatch::apply(descriptor, &args, &self.operator_context())?;
        let result = match descriptor.kind() {
            OperatorKind::Regular => dispatch::unwrap_single(result),
            _ => result,
        };
        ctx.push_result(result);
        Ok(())
    }
}

impl FunctionApplier for TermEvaluator<'_> {
    /// Replay a captured function in a fresh context with `args` bound to
    /// x, y and z. The body must leave exactly one value.
    fn apply(&self, function: &FunctionValue, args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
        let mut inner = EvaluationContext::for_function(args);
        for term in &function.terms {
            ctx.check_interrupt()?;
            self.evaluate_term(term, &mut inner)?;
        }
        let mut stack = inner.finish()?;
        match stack.len() {
            1 => Ok(stack.remove(0)),
            _ => Err(RpnError::type_mismatch("incompletely specified function")),
        }
    }
}

/// Alphabetic identifiers are unit candidates when no unit system is loaded
fn looks_like_unit(term: &str) -> bool {
    term.chars().all(|c| c.is_alphabetic() || c == '_' || c == '/' || c == '^' || c == '*')
        && term.chars().any(char::is_alphabetic)
}
