//! Dimension registry
//!
//! Every dimension has a signature over the primitive dimensions
//! (`force` is `length*mass/time^2`) and a base unit. Primitive dimensions
//! have themselves as their signature; `constant` has the empty signature.

use rpn_core::{RpnError, UnitAlgebra};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Definition of one physical quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionDefinition {
    /// Exponents over primitive dimension names
    pub signature: UnitAlgebra,
    /// Unit every other unit of this dimension converts through
    pub base_unit: String,
}

impl DimensionDefinition {
    pub fn new(signature: UnitAlgebra, base_unit: impl Into<String>) -> Self {
        Self { signature, base_unit: base_unit.into() }
    }
}

/// All known dimensions, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionRegistry {
    dimensions: BTreeMap<String, DimensionDefinition>,
}

impl DimensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A primitive dimension: its signature is itself
    pub fn register_primitive(&mut self, name: &str, base_unit: &str) {
        self.dimensions.insert(
            name.to_string(),
            DimensionDefinition::new(UnitAlgebra::unit(name), base_unit),
        );
    }

    /// A derived dimension; `signature` is written over primitive names,
    /// e.g. `"length^2*mass/time^3"`. An empty signature is dimensionless.
    pub fn register_derived(&mut self, name: &str, signature: &str, base_unit: &str) -> Result<(), RpnError> {
        let signature = UnitAlgebra::parse_with(signature, |dim| {
            self.is_primitive(dim).then(|| dim.to_string())
        }).map_err(|e| RpnError::UnitBuild(format!("dimension '{}': {}", name, e)))?;

        self.dimensions.insert(name.to_string(), DimensionDefinition::new(signature, base_unit));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&DimensionDefinition> {
        self.dimensions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dimensions.contains_key(name)
    }

    pub fn is_primitive(&self, name: &str) -> bool {
        self.dimensions.get(name)
            .map(|def| def.signature == UnitAlgebra::unit(name))
            .unwrap_or(false)
    }

    pub fn signature(&self, name: &str) -> Option<&UnitAlgebra> {
        self.dimensions.get(name).map(|def| &def.signature)
    }

    pub fn base_unit(&self, name: &str) -> Option<&str> {
        self.dimensions.get(name).map(|def| def.base_unit.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dimensions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DimensionDefinition)> {
        self.dimensions.iter().map(|(name, def)| (name.as_str(), def))
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }
}
