//! The immutable conversion graph
//!
//! Direct factors say `value_in_to = value_in_from * factor`. Nonlinear
//! conversions (temperature scales, dBm) are plain functions declared in
//! both directions; closure never derives them.

use crate::ConversionFactor;
use rpn_core::{Number, RpnError};
use std::collections::BTreeMap;
use std::fmt;

/// A conversion that is not a pure multiplication
pub type NonlinearFn = fn(&Number, u32) -> Result<Number, RpnError>;

pub(crate) type EdgeMap = BTreeMap<(String, String), ConversionFactor>;

#[derive(Clone, Default)]
pub struct ConversionGraph {
    direct: EdgeMap,
    nonlinear: BTreeMap<(String, String), NonlinearFn>,
}

impl ConversionGraph {
    pub(crate) fn new(direct: EdgeMap, nonlinear: BTreeMap<(String, String), NonlinearFn>) -> Self {
        Self { direct, nonlinear }
    }

    /// Direct factor from `from` to `to`, if the closure produced one
    pub fn factor(&self, from: &str, to: &str) -> Option<&ConversionFactor> {
        self.direct.get(&(from.to_string(), to.to_string()))
    }

    pub fn nonlinear(&self, from: &str, to: &str) -> Option<NonlinearFn> {
        self.nonlinear.get(&(from.to_string(), to.to_string())).copied()
    }

    /// Whether `unit` takes part in any nonlinear conversion
    pub fn is_nonlinear(&self, unit: &str) -> bool {
        self.nonlinear.keys().any(|(from, to)| from == unit || to == unit)
    }

    /// Convert along a single known edge, linear or not
    pub fn step(&self, value: &Number, from: &str, to: &str, precision: u32) -> Option<Result<Number, RpnError>> {
        if from == to {
            return Some(Ok(value.clone()));
        }
        if let Some(factor) = self.factor(from, to) {
            return Some(Ok(factor.apply(value)));
        }
        self.nonlinear(from, to).map(|convert| convert(value, precision))
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &ConversionFactor)> {
        self.direct.iter().map(|((from, to), factor)| (from.as_str(), to.as_str(), factor))
    }

    pub(crate) fn direct_factors(&self) -> &EdgeMap {
        &self.direct
    }

    pub(crate) fn nonlinear_table(&self) -> &BTreeMap<(String, String), NonlinearFn> {
        &self.nonlinear
    }

    pub fn edge_count(&self) -> usize {
        self.direct.len()
    }

    pub fn nonlinear_count(&self) -> usize {
        self.nonlinear.len()
    }
}

impl fmt::Debug for ConversionGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionGraph")
            .field("edges", &self.direct.len())
            .field("nonlinear", &self.nonlinear.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double(value: &Number, _precision: u32) -> Result<Number, RpnError> {
        Ok(value.mul(&Number::from_i64(2)))
    }

    fn graph() -> ConversionGraph {
        let mut direct = EdgeMap::new();
        direct.insert(("foot".into(), "inch".into()), ConversionFactor::from_integer(12));
        let mut nonlinear: BTreeMap<(String, String), NonlinearFn> = BTreeMap::new();
        nonlinear.insert(("a".into(), "b".into()), double);
        ConversionGraph::new(direct, nonlinear)
    }

    #[test]
    fn test_step_linear_and_nonlinear() {
        let graph = graph();
        let three = Number::from_i64(3);
        assert_eq!(graph.step(&three, "foot", "inch", 50).unwrap().unwrap(), Number::from_i64(36));
        assert_eq!(graph.step(&three, "a", "b", 50).unwrap().unwrap(), Number::from_i64(6));
        assert_eq!(graph.step(&three, "foot", "foot", 50).unwrap().unwrap(), three);
        assert!(graph.step(&three, "inch", "foot", 50).is_none());
    }

    #[test]
    fn test_nonlinear_membership() {
        let graph = graph();
        assert!(graph.is_nonlinear("a"));
        assert!(graph.is_nonlinear("b"));
        assert!(!graph.is_nonlinear("foot"));
        assert_eq!(graph.edge_count(), 1);
    }
}
