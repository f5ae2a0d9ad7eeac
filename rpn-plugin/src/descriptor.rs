//! Operator descriptors
//!
//! Each operator is a name, a fixed arity and a typed handler. The handler
//! variant fixes the arity for regular operators, so a descriptor can never
//! disagree with its body about how many operands it takes.

use crate::{EvaluationContext, OperatorContext};
use rpn_core::{RpnError, Value};

pub type NullaryFn = fn(&OperatorContext<'_>) -> Result<Value, RpnError>;
pub type UnaryFn = fn(&Value, &OperatorContext<'_>) -> Result<Value, RpnError>;
pub type BinaryFn = fn(&Value, &Value, &OperatorContext<'_>) -> Result<Value, RpnError>;
pub type TernaryFn = fn(&Value, &Value, &Value, &OperatorContext<'_>) -> Result<Value, RpnError>;
pub type QuaternaryFn = fn(&Value, &Value, &Value, &Value, &OperatorContext<'_>) -> Result<Value, RpnError>;
pub type QuinaryFn =
    fn(&Value, &Value, &Value, &Value, &Value, &OperatorContext<'_>) -> Result<Value, RpnError>;

/// Receives its operands raw, in declared order; no broadcasting
pub type ListFn = fn(&[Value], &OperatorContext<'_>) -> Result<Value, RpnError>;

/// Works on the evaluation state directly
pub type ModifierFn = fn(&mut EvaluationContext) -> Result<(), RpnError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Modifier,
    Regular,
    List,
}

#[derive(Clone, Copy)]
pub enum Handler {
    Nullary(NullaryFn),
    Unary(UnaryFn),
    Binary(BinaryFn),
    Ternary(TernaryFn),
    Quaternary(QuaternaryFn),
    Quinary(QuinaryFn),
    List { arity: usize, body: ListFn },
    Modifier(ModifierFn),
}

impl Handler {
    pub fn arity(&self) -> usize {
        match self {
            Handler::Nullary(_) | Handler::Modifier(_) => 0,
            Handler::Unary(_) => 1,
            Handler::Binary(_) => 2,
            Handler::Ternary(_) => 3,
            Handler::Quaternary(_) => 4,
            Handler::Quinary(_) => 5,
            Handler::List { arity, .. } => *arity,
        }
    }

    pub fn kind(&self) -> OperatorKind {
        match self {
            Handler::Modifier(_) => OperatorKind::Modifier,
            Handler::List { .. } => OperatorKind::List,
            _ => OperatorKind::Regular,
        }
    }
}

/// Immutable description of one operator
#[derive(Clone)]
pub struct OperatorDescriptor {
    pub name: &'static str,
    pub handler: Handler,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub category: &'static str,
    /// Ends a function capture started by `x`, `y` or `z`
    pub takes_function: bool,
}

impl OperatorDescriptor {
    fn with_handler(name: &'static str, handler: Handler) -> Self {
        Self {
            name,
            handler,
            aliases: &[],
            description: "",
            category: "general",
            takes_function: false,
        }
    }

    pub fn nullary(name: &'static str, body: NullaryFn) -> Self {
        Self::with_handler(name, Handler::Nullary(body))
    }

    pub fn unary(name: &'static str, body: UnaryFn) -> Self {
        Self::with_handler(name, Handler::Unary(body))
    }

    pub fn binary(name: &'static str, body: BinaryFn) -> Self {
        Self::with_handler(name, Handler::Binary(body))
    }

    pub fn ternary(name: &'static str, body: TernaryFn) -> Self {
        Self::with_handler(name, Handler::Ternary(body))
    }

    pub fn quaternary(name: &'static str, body: QuaternaryFn) -> Self {
        Self::with_handler(name, Handler::Quaternary(body))
    }

    pub fn quinary(name: &'static str, body: QuinaryFn) -> Self {
        Self::with_handler(name, Handler::Quinary(body))
    }

    /// List operator taking `arity` raw operands (at most 5)
    pub fn list(name: &'static str, arity: usize, body: ListFn) -> Self {
        Self::with_handler(name, Handler::List { arity: arity.min(5), body })
    }

    pub fn modifier(name: &'static str, body: ModifierFn) -> Self {
        Self::with_handler(name, Handler::Modifier(body))
    }

    // ========== Builder Methods ==========

    pub fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn category(mut self, category: &'static str) -> Self {
        self.category = category;
        self
    }

    pub fn consumes_function(mut self) -> Self {
        self.takes_function = true;
        self
    }

    // ========== Accessors ==========

    pub fn arity(&self) -> usize {
        self.handler.arity()
    }

    pub fn kind(&self) -> OperatorKind {
        self.handler.kind()
    }
}

impl std::fmt::Debug for OperatorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorDescriptor")
            .field("name", &self.name)
            .field("arity", &self.arity())
            .field("kind", &self.kind())
            .field("category", &self.category)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn negate(value: &Value, _ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
        Ok(value.clone())
    }

    fn count(args: &[Value], _ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
        Ok(Value::from(args.len() as i64))
    }

    fn noop(_ctx: &mut EvaluationContext) -> Result<(), RpnError> {
        Ok(())
    }

    #[test]
    fn test_arity_follows_handler() {
        let unary = OperatorDescriptor::unary("negative", negate).aliases(&["neg"]);
        assert_eq!(unary.arity(), 1);
        assert_eq!(unary.kind(), OperatorKind::Regular);
        assert_eq!(unary.aliases, &["neg"]);

        let list = OperatorDescriptor::list("count", 1, count);
        assert_eq!(list.arity(), 1);
        assert_eq!(list.kind(), OperatorKind::List);

        let modifier = OperatorDescriptor::modifier("previous", noop);
        assert_eq!(modifier.arity(), 0);
        assert_eq!(modifier.kind(), OperatorKind::Modifier);
    }

    #[test]
    fn test_list_arity_is_capped() {
        assert_eq!(OperatorDescriptor::list("many", 9, count).arity(), 5);
    }
}
