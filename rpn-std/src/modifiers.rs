//! Modifiers: terms that act on the evaluation state instead of values

use crate::args::{count, within_limit};
use rpn_core::{RpnError, Value};
use rpn_plugin::{EvaluationContext, OperatorDescriptor, OperatorRegistry};

pub fn register(registry: OperatorRegistry) -> OperatorRegistry {
    registry
        .with_operator(OperatorDescriptor::modifier("[", open_list).category("modifiers").describe("Begin a list"))
        .with_operator(OperatorDescriptor::modifier("]", close_list).category("modifiers").describe("End a list"))
        .with_operator(OperatorDescriptor::modifier("{", open_operator_list).category("modifiers")
            .describe("Begin an operator list: operators share operands, results are collected"))
        .with_operator(OperatorDescriptor::modifier("}", close_operator_list).category("modifiers")
            .describe("End an operator list"))
        .with_operator(OperatorDescriptor::modifier("dup_term", dup_term).aliases(&["dup"]).category("modifiers")
            .describe("value n: push value n times"))
        .with_operator(OperatorDescriptor::modifier("dup_operator", dup_operator).aliases(&["dupop"]).category("modifiers")
            .describe("n: apply the next operator n times"))
        .with_operator(OperatorDescriptor::modifier("unlist", unlist).category("modifiers")
            .describe("Replace a list with its elements"))
        .with_operator(OperatorDescriptor::modifier("previous", previous).category("modifiers")
            .describe("Push a copy of the top value"))
        .with_operator(OperatorDescriptor::modifier("x", parameter_x).category("functions")
            .describe("Start a function of x, or x itself inside one"))
        .with_operator(OperatorDescriptor::modifier("y", parameter_y).category("functions"))
        .with_operator(OperatorDescriptor::modifier("z", parameter_z).category("functions"))
        .with_operator(OperatorDescriptor::modifier("set", set).category("modifiers")
            .describe("$name value set: bind a variable"))
}

fn open_list(ctx: &mut EvaluationContext) -> Result<(), RpnError> {
    ctx.open_list();
    Ok(())
}

fn close_list(ctx: &mut EvaluationContext) -> Result<(), RpnError> {
    ctx.close_list()
}

fn open_operator_list(ctx: &mut EvaluationContext) -> Result<(), RpnError> {
    ctx.begin_operator_list()
}

fn close_operator_list(ctx: &mut EvaluationContext) -> Result<(), RpnError> {
    ctx.end_operator_list()
}

fn dup_term(ctx: &mut EvaluationContext) -> Result<(), RpnError> {
    ctx.require("dup_term", 2)?;
    let n = count("dup_term", &ctx.pop("dup_term")?)?;
    let value = ctx.pop("dup_term")?;
    let unit: Vec<Value> = match value {
        Value::List(items) => items,
        other => vec![other],
    };
    within_limit("dup_term", n.saturating_mul(unit.len().max(1)))?;
    for _ in 0..n {
        ctx.extend(unit.iter().cloned());
    }
    Ok(())
}

fn dup_operator(ctx: &mut EvaluationContext) -> Result<(), RpnError> {
    let n = count("dup_operator", &ctx.pop("dup_operator")?)?;
    ctx.set_pending_duplicates(n)
}

fn unlist(ctx: &mut EvaluationContext) -> Result<(), RpnError> {
    match ctx.pop("unlist")? {
        Value::List(items) => ctx.extend(items),
        other => ctx.push(other),
    }
    Ok(())
}

fn previous(ctx: &mut EvaluationContext) -> Result<(), RpnError> {
    let top = ctx.top().cloned()
        .ok_or_else(|| RpnError::insufficient_operands("previous", 1))?;
    ctx.push(top);
    Ok(())
}

/// Inside a replay the parameter's value; otherwise the start of a capture
fn parameter(ctx: &mut EvaluationContext, name: &str) -> Result<(), RpnError> {
    match ctx.parameter(name) {
        Some(value) => ctx.push(value),
        None => ctx.begin_function(name),
    }
    Ok(())
}

fn parameter_x(ctx: &mut EvaluationContext) -> Result<(), RpnError> {
    parameter(ctx, "x")
}

fn parameter_y(ctx: &mut EvaluationContext) -> Result<(), RpnError> {
    parameter(ctx, "y")
}

fn parameter_z(ctx: &mut EvaluationContext) -> Result<(), RpnError> {
    parameter(ctx, "z")
}

fn set(ctx: &mut EvaluationContext) -> Result<(), RpnError> {
    ctx.require("set", 2)?;
    let value = ctx.pop("set")?;
    match ctx.pop("set")? {
        Value::Name(name) => {
            ctx.set_variable(name, value.clone());
            ctx.push(value);
            Ok(())
        }
        other => Err(RpnError::type_mismatch(format!("variable name expected, got {}", other.type_name()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpn_plugin::EvaluationState;

    fn n(value: i64) -> Value {
        Value::from(value)
    }

    #[test]
    fn test_dup_term_rejects_huge_counts() {
        let mut ctx = EvaluationContext::new();
        ctx.push(n(5));
        ctx.push(n(1_000_000_000_000));
        assert!(matches!(dup_term(&mut ctx), Err(RpnError::Domain(_))));

        let mut ctx = EvaluationContext::new();
        ctx.push(Value::List((0..1000).map(n).collect()));
        ctx.push(n(2000));
        assert!(matches!(dup_term(&mut ctx), Err(RpnError::Domain(_))));
    }

    #[test]
    fn test_dup_term() {
        let mut ctx = EvaluationContext::new();
        ctx.push(n(5));
        ctx.push(n(3));
        dup_term(&mut ctx).unwrap();
        assert_eq!(ctx.stack(), &[n(5), n(5), n(5)]);

        let mut ctx = EvaluationContext::new();
        ctx.push(Value::List(vec![n(1), n(2)]));
        ctx.push(n(2));
        dup_term(&mut ctx).unwrap();
        assert_eq!(ctx.stack(), &[n(1), n(2), n(1), n(2)]);

        let mut ctx = EvaluationContext::new();
        ctx.push(n(5));
        ctx.push(n(-1));
        assert!(dup_term(&mut ctx).is_err());
    }

    #[test]
    fn test_dup_operator_rejects_second_pending_count() {
        let mut ctx = EvaluationContext::new();
        ctx.push(n(2));
        dup_operator(&mut ctx).unwrap();
        ctx.push(n(3));
        assert!(matches!(dup_operator(&mut ctx), Err(RpnError::TypeMismatch(_))));
        assert_eq!(ctx.take_pending_duplicates(), Some(2));

        let mut ctx = EvaluationContext::new();
        ctx.push(Value::List(vec![n(2)]));
        assert!(matches!(dup_operator(&mut ctx), Err(RpnError::TypeMismatch(_))));
    }

    #[test]
    fn test_lists() {
        let mut ctx = EvaluationContext::new();
        open_list(&mut ctx).unwrap();
        ctx.push(n(1));
        assert_eq!(ctx.state(), EvaluationState::ListOpen(1));
        close_list(&mut ctx).unwrap();
        unlist(&mut ctx).unwrap();
        assert_eq!(ctx.stack(), &[n(1)]);
        assert_eq!(close_list(&mut ctx), Err(RpnError::NegativeListDepth));
    }

    #[test]
    fn test_previous() {
        let mut ctx = EvaluationContext::new();
        assert!(previous(&mut ctx).is_err());
        ctx.push(n(7));
        previous(&mut ctx).unwrap();
        assert_eq!(ctx.stack(), &[n(7), n(7)]);
    }

    #[test]
    fn test_parameters() {
        let mut ctx = EvaluationContext::for_function(&[n(4)]);
        parameter_x(&mut ctx).unwrap();
        parameter_y(&mut ctx).unwrap();
        assert_eq!(ctx.stack(), &[n(4), n(0)]);

        let mut ctx = EvaluationContext::new();
        parameter_x(&mut ctx).unwrap();
        assert!(ctx.is_recording_function());
    }

    #[test]
    fn test_set() {
        let mut ctx = EvaluationContext::new();
        ctx.push(Value::Name("rate".into()));
        ctx.push(n(3));
        set(&mut ctx).unwrap();
        assert_eq!(ctx.variable("rate"), Some(&n(3)));
        assert_eq!(ctx.stack(), &[n(3)]);

        ctx.push(n(4));
        assert!(matches!(set(&mut ctx), Err(RpnError::TypeMismatch(_))));
    }
}
