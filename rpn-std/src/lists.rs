//! List operators
//!
//! These receive their arguments without broadcasting. Finite generators
//! are accepted wherever a list is, and a lone value counts as a
//! one-element list. Aggregates and sorts applied to a list of lists work
//! on each inner list.

use crate::args::{count, integer, materialize, MAX_MATERIALIZE};
use crate::arithmetic;
use rpn_core::{Number, RpnError, Value};
use rpn_plugin::{OperatorContext, OperatorDescriptor, OperatorRegistry};
use std::cmp::Ordering;

pub fn register(registry: OperatorRegistry) -> OperatorRegistry {
    registry
        // aggregates
        .with_operator(OperatorDescriptor::list("sum", 1, sum).category("lists"))
        .with_operator(OperatorDescriptor::list("product", 1, product).category("lists"))
        .with_operator(OperatorDescriptor::list("mean", 1, mean).aliases(&["average", "avg"]).category("lists"))
        .with_operator(OperatorDescriptor::list("max", 1, max).aliases(&["maximum"]).category("lists"))
        .with_operator(OperatorDescriptor::list("min", 1, min).aliases(&["minimum"]).category("lists"))
        .with_operator(OperatorDescriptor::list("count", 1, count_items).category("lists"))
        // ordering
        .with_operator(OperatorDescriptor::list("sort", 1, sort).category("lists"))
        .with_operator(OperatorDescriptor::list("sort_descending", 1, sort_descending).category("lists"))
        .with_operator(OperatorDescriptor::list("reverse", 1, reverse).category("lists"))
        .with_operator(OperatorDescriptor::list("unique", 1, unique).category("lists"))
        // structure
        .with_operator(OperatorDescriptor::list("flatten", 1, flatten).category("lists"))
        .with_operator(OperatorDescriptor::list("append", 2, append).category("lists"))
        .with_operator(OperatorDescriptor::list("interleave", 2, interleave).category("lists"))
        .with_operator(OperatorDescriptor::list("union", 2, union).category("lists"))
        .with_operator(OperatorDescriptor::list("intersection", 2, intersection).category("lists"))
        // access
        .with_operator(OperatorDescriptor::list("element", 2, element).aliases(&["get"]).category("lists")
            .describe("Element at a 0-based index; a list of indices selects several"))
        .with_operator(OperatorDescriptor::list("left", 2, left).category("lists"))
        .with_operator(OperatorDescriptor::list("right", 2, right).category("lists"))
        .with_operator(OperatorDescriptor::list("slice", 3, slice).category("lists")
            .describe("Elements from start up to (not including) end; negative indices count from the end"))
        .with_operator(OperatorDescriptor::list("sublist", 3, sublist).category("lists")
            .describe("count elements starting at a 0-based index"))
        // numeric
        .with_operator(OperatorDescriptor::binary("range", range).category("lists")
            .describe("Inclusive integer range, counting down when start > end"))
        .with_operator(OperatorDescriptor::list("diffs", 1, diffs).category("lists"))
        // index
        .with_operator(OperatorDescriptor::list("zero", 1, zero).category("lists")
            .describe("Indices of the zero elements"))
        .with_operator(OperatorDescriptor::list("nonzero", 1, nonzero).category("lists")
            .describe("Indices of the nonzero elements"))
}

/// Apply `op` to each inner list when every element is a list
fn per_sublist(
    operator: &str,
    arg: &Value,
    ctx: &OperatorContext<'_>,
    op: fn(Vec<Value>, &OperatorContext<'_>) -> Result<Value, RpnError>,
) -> Result<Value, RpnError> {
    let values = materialize(operator, arg, ctx)?;
    if !values.is_empty() && values.iter().all(Value::is_list) {
        return values.into_iter()
            .map(|inner| op(materialize(operator, &inner, ctx)?, ctx))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List);
    }
    op(values, ctx)
}

/// Order two values; measurements compare after conversion
pub fn compare(a: &Value, b: &Value, ctx: &OperatorContext<'_>) -> Result<Ordering, RpnError> {
    match (a, b) {
        (Value::Scalar(x), Value::Scalar(y)) => Ok(x.cmp(y)),
        (Value::Measurement(x), Value::Measurement(y)) => {
            let y = ctx.units()?.convert_value(&y.value, &y.units, &x.units, ctx.precision)?;
            Ok(x.value.cmp(&y))
        }
        (Value::DateTime(x), Value::DateTime(y)) => Ok(x.cmp(y)),
        (x, y) => Err(RpnError::type_mismatch(format!(
            "cannot compare {} with {}", x.type_name(), y.type_name()
        ))),
    }
}

// ========== Aggregates ==========

fn fold(
    values: Vec<Value>,
    initial: Value,
    ctx: &OperatorContext<'_>,
    step: fn(&Value, &Value, &OperatorContext<'_>) -> Result<Value, RpnError>,
) -> Result<Value, RpnError> {
    let mut values = values.into_iter();
    let mut total = match values.next() {
        Some(first) => first,
        None => return Ok(initial),
    };
    for value in values {
        ctx.check_interrupt()?;
        total = step(&total, &value, ctx)?;
    }
    Ok(total)
}

fn sum(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    per_sublist("sum", &args[0], ctx, |values, ctx| fold(values, Value::from(0), ctx, arithmetic::add))
}

fn product(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    per_sublist("product", &args[0], ctx, |values, ctx| fold(values, Value::from(1), ctx, arithmetic::multiply))
}

fn mean(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    per_sublist("mean", &args[0], ctx, |values, ctx| {
        if values.is_empty() {
            return Err(RpnError::domain("'mean' of an empty list"));
        }
        let n = Value::from(values.len() as i64);
        let total = fold(values, Value::from(0), ctx, arithmetic::add)?;
        arithmetic::divide(&total, &n, ctx)
    })
}

fn extreme(operator: &str, values: Vec<Value>, wanted: Ordering, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let mut values = values.into_iter();
    let mut best = values.next()
        .ok_or_else(|| RpnError::domain(format!("'{}' of an empty list", operator)))?;
    for value in values {
        if compare(&value, &best, ctx)? == wanted {
            best = value;
        }
    }
    Ok(best)
}

fn max(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    per_sublist("max", &args[0], ctx, |values, ctx| extreme("max", values, Ordering::Greater, ctx))
}

fn min(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    per_sublist("min", &args[0], ctx, |values, ctx| extreme("min", values, Ordering::Less, ctx))
}

fn count_items(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    Ok(Value::from(materialize("count", &args[0], ctx)?.len() as i64))
}

// ========== Ordering ==========

fn sorted(mut values: Vec<Value>, ctx: &OperatorContext<'_>) -> Result<Vec<Value>, RpnError> {
    // sort_by cannot fail, so surface the first comparison error afterwards
    let mut failure = None;
    values.sort_by(|a, b| match compare(a, b, ctx) {
        Ok(ordering) => ordering,
        Err(e) => {
            failure.get_or_insert(e);
            Ordering::Equal
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(values),
    }
}

fn sort(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    per_sublist("sort", &args[0], ctx, |values, ctx| sorted(values, ctx).map(Value::List))
}

fn sort_descending(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    per_sublist("sort_descending", &args[0], ctx, |values, ctx| {
        let mut values = sorted(values, ctx)?;
        values.reverse();
        Ok(Value::List(values))
    })
}

fn reverse(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let mut values = materialize("reverse", &args[0], ctx)?;
    values.reverse();
    Ok(Value::List(values))
}

fn dedup(values: impl IntoIterator<Item = Value>) -> Vec<Value> {
    let mut seen: Vec<Value> = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

fn unique(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    Ok(Value::List(dedup(materialize("unique", &args[0], ctx)?)))
}

// ========== Structure ==========

fn flatten_into(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::List(items) => items.into_iter().for_each(|item| flatten_into(item, out)),
        other => out.push(other),
    }
}

fn flatten(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let mut out = Vec::new();
    for value in materialize("flatten", &args[0], ctx)? {
        flatten_into(value, &mut out);
    }
    Ok(Value::List(out))
}

fn append(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let mut values = materialize("append", &args[0], ctx)?;
    values.extend(materialize("append", &args[1], ctx)?);
    Ok(Value::List(values))
}

/// Alternate elements; the longer list's tail follows
fn interleave(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let a = materialize("interleave", &args[0], ctx)?;
    let b = materialize("interleave", &args[1], ctx)?;
    let mut out = Vec::with_capacity(a.len() + b.len());
    let mut a = a.into_iter();
    let mut b = b.into_iter();
    loop {
        match (a.next(), b.next()) {
            (None, None) => break,
            (x, y) => out.extend(x.into_iter().chain(y)),
        }
    }
    Ok(Value::List(out))
}

fn union(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let a = materialize("union", &args[0], ctx)?;
    let b = materialize("union", &args[1], ctx)?;
    Ok(Value::List(dedup(a.into_iter().chain(b))))
}

fn intersection(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let a = materialize("intersection", &args[0], ctx)?;
    let b = materialize("intersection", &args[1], ctx)?;
    Ok(Value::List(dedup(a.into_iter().filter(|value| b.contains(value)))))
}

// ========== Access ==========

fn index_into(operator: &str, values: &[Value], index: &Value) -> Result<Value, RpnError> {
    if let Value::List(indices) = index {
        return indices.iter()
            .map(|i| index_into(operator, values, i))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List);
    }
    let i = count(operator, index)?;
    values.get(i).cloned().ok_or_else(|| {
        RpnError::domain(format!("'{}': index {} is out of range for {} elements", operator, i, values.len()))
    })
}

fn element(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let values = materialize("element", &args[0], ctx)?;
    index_into("element", &values, &args[1])
}

fn left(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let mut values = materialize("left", &args[0], ctx)?;
    values.truncate(count("left", &args[1])?);
    Ok(Value::List(values))
}

fn right(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let mut values = materialize("right", &args[0], ctx)?;
    let n = count("right", &args[1])?;
    let drop = values.len().saturating_sub(n);
    Ok(Value::List(values.split_off(drop)))
}

/// Signed index: negative counts from the end, clamped to the list
fn position(operator: &str, index: &Value, len: usize) -> Result<usize, RpnError> {
    let i = integer(operator, index)?;
    let len = len as i64;
    let resolved = if i < 0 { len + i } else { i };
    Ok(resolved.clamp(0, len) as usize)
}

fn slice(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let values = materialize("slice", &args[0], ctx)?;
    let start = position("slice", &args[1], values.len())?;
    let end = position("slice", &args[2], values.len())?;
    Ok(Value::List(values.get(start..end).map(<[Value]>::to_vec).unwrap_or_default()))
}

fn sublist(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let values = materialize("sublist", &args[0], ctx)?;
    let start = count("sublist", &args[1])?;
    let n = count("sublist", &args[2])?;
    Ok(Value::List(values.into_iter().skip(start).take(n).collect()))
}

// ========== Numeric ==========

fn range(a: &Value, b: &Value, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let start = integer("range", a)?;
    let end = integer("range", b)?;
    let span = start.abs_diff(end) as usize;
    if span >= MAX_MATERIALIZE {
        return Err(RpnError::domain(format!("'range' of {} elements is too long; use 'lazy_range'", span + 1)));
    }
    let mut values = Vec::with_capacity(span + 1);
    let step = if start <= end { 1 } else { -1 };
    let mut current = start;
    loop {
        if values.len() % 4096 == 0 {
            ctx.check_interrupt()?;
        }
        values.push(Value::from(current));
        if current == end {
            break;
        }
        current += step;
    }
    Ok(Value::List(values))
}

fn diffs(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let values = materialize("diffs", &args[0], ctx)?;
    values.windows(2)
        .map(|pair| arithmetic::subtract(&pair[1], &pair[0], ctx))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

// ========== Index ==========

fn is_zero(value: &Value) -> Result<bool, RpnError> {
    match value {
        Value::Scalar(n) => Ok(n.is_zero()),
        Value::Measurement(m) => Ok(m.value.is_zero()),
        other => Err(RpnError::arg_type("zero", "numbers", other.type_name())),
    }
}

fn indices_where(operator: &str, arg: &Value, wanted: bool, ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    let mut indices = Vec::new();
    for (i, value) in materialize(operator, arg, ctx)?.iter().enumerate() {
        if is_zero(value)? == wanted {
            indices.push(Value::Scalar(Number::from_i64(i as i64)));
        }
    }
    Ok(Value::List(indices))
}

fn zero(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    indices_where("zero", &args[0], true, ctx)
}

fn nonzero(args: &[Value], ctx: &OperatorContext<'_>) -> Result<Value, RpnError> {
    indices_where("nonzero", &args[0], false, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpn_core::Measurement;
    use rpn_plugin::{InterruptFlag, NoFunctions};
    use rpn_units::STANDARD_UNITS;

    fn n(value: i64) -> Value {
        Value::from(value)
    }

    fn list(values: &[i64]) -> Value {
        Value::List(values.iter().map(|&v| n(v)).collect())
    }

    fn m(value: i64, unit: &str) -> Value {
        Value::Measurement(Measurement::of_unit(Number::from_i64(value), unit))
    }

    fn run<T>(body: impl FnOnce(&OperatorContext<'_>) -> T) -> T {
        let units = STANDARD_UNITS.as_ref().ok().map(|system| system.as_ref());
        let interrupt = InterruptFlag::new();
        let ctx = OperatorContext::new(&NoFunctions, &interrupt).with_units(units);
        body(&ctx)
    }

    #[test]
    fn test_aggregates() {
        run(|ctx| {
            assert_eq!(sum(&[list(&[1, 2, 3, 4])], ctx).unwrap(), n(10));
            assert_eq!(sum(&[list(&[])], ctx).unwrap(), n(0));
            assert_eq!(product(&[list(&[2, 3, 4])], ctx).unwrap(), n(24));
            assert_eq!(mean(&[list(&[2, 4, 9])], ctx).unwrap(), n(5));
            assert!(mean(&[list(&[])], ctx).is_err());
            assert_eq!(max(&[list(&[3, 9, 2])], ctx).unwrap(), n(9));
            assert_eq!(min(&[list(&[3, 9, 2])], ctx).unwrap(), n(2));
            assert_eq!(count_items(&[list(&[3, 9, 2])], ctx).unwrap(), n(3));
        });
    }

    #[test]
    fn test_aggregates_per_inner_list() {
        run(|ctx| {
            let nested = Value::List(vec![list(&[1, 2]), list(&[3, 4])]);
            assert_eq!(sum(&[nested.clone()], ctx).unwrap(), list(&[3, 7]));
            assert_eq!(max(&[nested], ctx).unwrap(), list(&[2, 4]));
        });
    }

    #[test]
    fn test_aggregates_with_units() {
        run(|ctx| {
            let lengths = Value::List(vec![m(1, "foot"), m(12, "inch"), m(1, "yard")]);
            assert_eq!(sum(&[lengths.clone()], ctx).unwrap(), m(5, "foot"));
            assert_eq!(max(&[lengths], ctx).unwrap(), m(1, "yard"));
        });
    }

    #[test]
    fn test_ordering() {
        run(|ctx| {
            assert_eq!(sort(&[list(&[3, 1, 2])], ctx).unwrap(), list(&[1, 2, 3]));
            assert_eq!(sort_descending(&[list(&[3, 1, 2])], ctx).unwrap(), list(&[3, 2, 1]));
            assert_eq!(reverse(&[list(&[1, 2, 3])], ctx).unwrap(), list(&[3, 2, 1]));
            assert_eq!(unique(&[list(&[1, 2, 1, 3, 2])], ctx).unwrap(), list(&[1, 2, 3]));
            let mixed = Value::List(vec![n(1), m(1, "foot")]);
            assert!(sort(&[mixed], ctx).is_err());
        });
    }

    #[test]
    fn test_structure() {
        run(|ctx| {
            let nested = Value::List(vec![n(1), Value::List(vec![n(2), list(&[3])])]);
            assert_eq!(flatten(&[nested], ctx).unwrap(), list(&[1, 2, 3]));
            assert_eq!(append(&[list(&[1]), n(2)], ctx).unwrap(), list(&[1, 2]));
            assert_eq!(interleave(&[list(&[1, 3, 5, 7]), list(&[2, 4])], ctx).unwrap(), list(&[1, 2, 3, 4, 5, 7]));
            assert_eq!(union(&[list(&[1, 2]), list(&[2, 3])], ctx).unwrap(), list(&[1, 2, 3]));
            assert_eq!(intersection(&[list(&[1, 2, 3]), list(&[3, 2, 5])], ctx).unwrap(), list(&[2, 3]));
        });
    }

    #[test]
    fn test_access() {
        run(|ctx| {
            let values = list(&[10, 20, 30, 40, 50]);
            assert_eq!(element(&[values.clone(), n(1)], ctx).unwrap(), n(20));
            assert_eq!(element(&[values.clone(), list(&[0, 4])], ctx).unwrap(), list(&[10, 50]));
            assert!(element(&[values.clone(), n(5)], ctx).is_err());
            assert_eq!(left(&[values.clone(), n(2)], ctx).unwrap(), list(&[10, 20]));
            assert_eq!(right(&[values.clone(), n(2)], ctx).unwrap(), list(&[40, 50]));
            assert_eq!(right(&[values.clone(), n(9)], ctx).unwrap(), values);
            assert_eq!(slice(&[values.clone(), n(1), n(-1)], ctx).unwrap(), list(&[20, 30, 40]));
            assert_eq!(slice(&[values.clone(), n(3), n(1)], ctx).unwrap(), list(&[]));
            assert_eq!(sublist(&[values, n(1), n(3)], ctx).unwrap(), list(&[20, 30, 40]));
        });
    }

    #[test]
    fn test_range_and_diffs() {
        run(|ctx| {
            assert_eq!(range(&n(1), &n(5), ctx).unwrap(), list(&[1, 2, 3, 4, 5]));
            assert_eq!(range(&n(3), &n(1), ctx).unwrap(), list(&[3, 2, 1]));
            assert_eq!(range(&n(4), &n(4), ctx).unwrap(), list(&[4]));
            assert_eq!(diffs(&[list(&[1, 4, 9, 16])], ctx).unwrap(), list(&[3, 5, 7]));
        });
    }

    #[test]
    fn test_zero_indices() {
        run(|ctx| {
            let values = list(&[0, 3, 0, 5]);
            assert_eq!(zero(&[values.clone()], ctx).unwrap(), list(&[0, 2]));
            assert_eq!(nonzero(&[values], ctx).unwrap(), list(&[1, 3]));
        });
    }
}
