//! Offline construction of the conversion graph
//!
//! From a catalog and a sparse table of seed factors the builder derives
//! every implied factor:
//!
//! 1. `square_`/`cubic_` units for every plain length unit
//! 2. reciprocals of every seed
//! 3. squared and cubed factors for seeds between length units
//! 4. a transitive-closure fixpoint within each dimension signature
//! 5. prefixed units (SI, and binary for information) composed with every
//!    edge already known from their base unit
//!
//! Seeds are applied in order; a later seed for the same pair replaces an
//! earlier one. Derived edges never replace an existing edge.

use crate::graph::EdgeMap;
use crate::unit::{PrefixSet, UnitDefinition};
use crate::{ConversionFactor, ConversionGraph, DimensionRegistry, NonlinearFn, UnitCatalog, UnitSystem};
use rpn_core::{RpnError, UnitAlgebra};
use std::collections::BTreeMap;
use tracing::debug;

/// A unit prefix: `kilo` is `10^3`, `kibi` is `2^10`
#[derive(Debug, Clone, Copy)]
pub struct Prefix {
    pub name: &'static str,
    pub abbreviation: &'static str,
    radix: u8,
    pub power: i32,
}

impl Prefix {
    const fn decimal(name: &'static str, abbreviation: &'static str, power: i32) -> Self {
        Self { name, abbreviation, radix: 10, power }
    }

    const fn binary(name: &'static str, abbreviation: &'static str, power: i32) -> Self {
        Self { name, abbreviation, radix: 2, power }
    }

    /// How many base units one prefixed unit holds
    pub fn factor(&self) -> ConversionFactor {
        if self.radix == 2 {
            ConversionFactor::power_of_two(self.power)
        } else {
            ConversionFactor::power_of_ten(self.power)
        }
    }
}

pub const METRIC_PREFIXES: [Prefix; 20] = [
    Prefix::decimal("yotta", "Y", 24),
    Prefix::decimal("zetta", "Z", 21),
    Prefix::decimal("exa", "E", 18),
    Prefix::decimal("peta", "P", 15),
    Prefix::decimal("tera", "T", 12),
    Prefix::decimal("giga", "G", 9),
    Prefix::decimal("mega", "M", 6),
    Prefix::decimal("kilo", "k", 3),
    Prefix::decimal("hecto", "h", 2),
    Prefix::decimal("deca", "da", 1),
    Prefix::decimal("deci", "d", -1),
    Prefix::decimal("centi", "c", -2),
    Prefix::decimal("milli", "m", -3),
    Prefix::decimal("micro", "u", -6),
    Prefix::decimal("nano", "n", -9),
    Prefix::decimal("pico", "p", -12),
    Prefix::decimal("femto", "f", -15),
    Prefix::decimal("atto", "a", -18),
    Prefix::decimal("zepto", "z", -21),
    Prefix::decimal("yocto", "y", -24),
];

pub const BINARY_PREFIXES: [Prefix; 8] = [
    Prefix::binary("yobi", "Yi", 80),
    Prefix::binary("zebi", "Zi", 70),
    Prefix::binary("exbi", "Ei", 60),
    Prefix::binary("pebi", "Pi", 50),
    Prefix::binary("tebi", "Ti", 40),
    Prefix::binary("gibi", "Gi", 30),
    Prefix::binary("mebi", "Mi", 20),
    Prefix::binary("kibi", "Ki", 10),
];

/// Join a prefix and a unit name, eliding the prefix's last letter where
/// the traditional spelling does (`kilohm`, `hectare`, `decare`).
pub fn prefixed_name(prefix: &str, unit: &str) -> String {
    // the standard keeps the vowel here
    if prefix == "giga" && unit.starts_with("ohm") {
        return format!("{}{}", prefix, unit);
    }

    let elide = match unit.chars().next() {
        Some('o') => prefix.ends_with('o') || prefix.ends_with('a'),
        Some('a') => prefix.ends_with('a') || prefix.ends_with("cto"),
        _ => false,
    };
    if elide {
        format!("{}{}", &prefix[..prefix.len() - 1], unit)
    } else {
        format!("{}{}", prefix, unit)
    }
}

fn key(from: &str, to: &str) -> (String, String) {
    (from.to_string(), to.to_string())
}

/// Insert `from -> to` and its reciprocal unless already known
fn insert_derived(edges: &mut EdgeMap, from: &str, to: &str, factor: ConversionFactor) -> Result<bool, RpnError> {
    if from == to || edges.contains_key(&key(from, to)) {
        return Ok(false);
    }
    let inverse = factor.inverse()?;
    edges.insert(key(from, to), factor);
    edges.entry(key(to, from)).or_insert(inverse);
    Ok(true)
}

/// Connect `unit` (worth `factor` of `base`) to `base` and to everything
/// `base` already reaches
fn attach(edges: &mut EdgeMap, unit: &str, base: &str, factor: &ConversionFactor) -> Result<usize, RpnError> {
    let reachable: Vec<(String, ConversionFactor)> = edges
        .range(key(base, "")..)
        .take_while(|((from, _), _)| from == base)
        .filter(|((_, to), _)| to != unit)
        .map(|((_, to), f)| (to.clone(), f.clone()))
        .collect();

    let mut added = usize::from(insert_derived(edges, unit, base, factor.clone())?);
    for (target, base_to_target) in reachable {
        if insert_derived(edges, unit, &target, factor.mul(&base_to_target))? {
            added += 1;
        }
    }
    Ok(added)
}

/// `square_<unit>` / `cubic_<unit>` definition derived from a length unit
fn power_unit(name: &str, def: &UnitDefinition, power: i32) -> (String, UnitDefinition) {
    let (word, abbrev, dimension) = if power == 2 {
        ("square", "sq", "area")
    } else {
        ("cubic", "cu", "volume")
    };

    let derived_name = format!("{}_{}", word, name);
    let mut derived = UnitDefinition::new(&derived_name, dimension)
        .plural(&format!("{}_{}", word, def.plural));
    derived.categories = def.categories.clone();
    derived.aliases.push(format!("{}^{}", name, power));
    derived.aliases.push(format!("{}^{}", def.plural, power));
    if !def.abbreviation.is_empty() {
        derived.abbreviation = format!("{}{}", abbrev, def.abbreviation);
        derived.aliases.push(format!("{}^{}", def.abbreviation, power));
    }
    for alias in &def.aliases {
        derived.aliases.push(format!("{}_{}", word, alias));
    }
    (derived_name, derived)
}

/// Accumulates seeds, then derives the full graph in `build`
pub struct ConversionGraphBuilder {
    dimensions: DimensionRegistry,
    catalog: UnitCatalog,
    seeds: Vec<(String, String, String)>,
    nonlinear: Vec<(String, String, NonlinearFn)>,
}

impl ConversionGraphBuilder {
    pub fn new(dimensions: DimensionRegistry, catalog: UnitCatalog) -> Self {
        Self { dimensions, catalog, seeds: Vec::new(), nonlinear: Vec::new() }
    }

    /// One `from` is worth `factor` of `to`; `factor` is an exact decimal,
    /// scientific or ratio literal
    pub fn seed(&mut self, from: &str, to: &str, factor: &str) -> &mut Self {
        self.seeds.push((from.to_string(), to.to_string(), factor.to_string()));
        self
    }

    /// Declare a nonlinear conversion (one direction)
    pub fn nonlinear(&mut self, from: &str, to: &str, convert: NonlinearFn) -> &mut Self {
        self.nonlinear.push((from.to_string(), to.to_string(), convert));
        self
    }

    pub fn seed_count(&self) -> usize {
        self.seeds.len()
    }

    fn signature_of(&self, unit: &str) -> Result<&UnitAlgebra, RpnError> {
        let dimension = self.catalog.dimension_of(unit)
            .ok_or_else(|| RpnError::UnitBuild(format!("unknown unit '{}'", unit)))?;
        self.dimensions.signature(dimension)
            .ok_or_else(|| RpnError::UnitBuild(format!("unit '{}' has unknown dimension '{}'", unit, dimension)))
    }

    fn validate_catalog(&self) -> Result<(), RpnError> {
        for (name, def) in self.catalog.iter() {
            if !self.dimensions.contains(&def.dimension) {
                return Err(RpnError::UnitBuild(format!(
                    "unit '{}' has unknown dimension '{}'", name, def.dimension
                )));
            }
        }
        for (name, def) in self.dimensions.iter() {
            if !self.catalog.contains(&def.base_unit) {
                return Err(RpnError::UnitBuild(format!(
                    "dimension '{}' has unknown base unit '{}'", name, def.base_unit
                )));
            }
        }
        Ok(())
    }

    fn is_length(&self, unit: &str) -> bool {
        self.catalog.dimension_of(unit) == Some("length")
    }

    /// Step 1: area and volume units for every length unit
    fn synthesize_powers(&mut self) -> usize {
        let lengths: Vec<(String, UnitDefinition)> = self.catalog.iter()
            .filter(|(_, def)| def.dimension == "length")
            .map(|(name, def)| (name.to_string(), def.clone()))
            .collect();

        let mut created = 0;
        for (name, def) in &lengths {
            for power in [2, 3] {
                let (derived_name, derived) = power_unit(name, def, power);
                if self.catalog.insert(&derived_name, derived) {
                    created += 1;
                }
            }
        }
        created
    }

    /// Step 2: seeds and their reciprocals
    fn seed_edges(&self) -> Result<(Vec<(String, String, ConversionFactor)>, EdgeMap), RpnError> {
        let mut parsed = Vec::with_capacity(self.seeds.len());
        let mut edges = EdgeMap::new();

        for (from, to, text) in &self.seeds {
            let factor = ConversionFactor::parse(text)?;
            if factor.is_zero() {
                return Err(RpnError::UnitBuild(format!("zero factor from '{}' to '{}'", from, to)));
            }
            let (from_sig, to_sig) = (self.signature_of(from)?, self.signature_of(to)?);
            if from_sig != to_sig {
                return Err(RpnError::UnitBuild(format!(
                    "seed '{}' -> '{}' joins '{}' and '{}'", from, to, from_sig, to_sig
                )));
            }

            edges.insert(key(to, from), factor.inverse()?);
            edges.insert(key(from, to), factor.clone());
            parsed.push((from.clone(), to.clone(), factor));
        }
        Ok((parsed, edges))
    }

    /// Step 3: squared and cubed seeds between length units
    fn propagate_powers(&self, seeds: &[(String, String, ConversionFactor)], edges: &mut EdgeMap) -> Result<usize, RpnError> {
        let mut added = 0;
        for (from, to, factor) in seeds {
            if !(self.is_length(from) && self.is_length(to)) {
                continue;
            }
            for (word, power) in [("square", 2), ("cubic", 3)] {
                let (from_power, to_power) = (format!("{}_{}", word, from), format!("{}_{}", word, to));
                if insert_derived(edges, &from_power, &to_power, factor.pow(power)?)? {
                    added += 1;
                }
            }
        }
        Ok(added)
    }

    /// Step 4: fixpoint closure inside each group of equal signatures
    fn close(&self, edges: &mut EdgeMap) -> Result<usize, RpnError> {
        let mut groups: BTreeMap<UnitAlgebra, Vec<String>> = BTreeMap::new();
        let connected: Vec<String> = edges.keys()
            .map(|(from, _)| from.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        for unit in connected {
            let signature = self.signature_of(&unit)?.clone();
            groups.entry(signature).or_default().push(unit);
        }

        let mut total = 0;
        let mut passes = 0;
        loop {
            passes += 1;
            let mut added = 0;
            for units in groups.values() {
                for (i, a) in units.iter().enumerate() {
                    for b in &units[i + 1..] {
                        let Some(a_to_b) = edges.get(&key(a, b)).cloned() else {
                            continue;
                        };
                        for c in units {
                            if c == a || c == b {
                                continue;
                            }
                            let a_to_c = edges.get(&key(a, c)).cloned();
                            let b_to_c = edges.get(&key(b, c)).cloned();
                            let derived = match (a_to_c, b_to_c) {
                                (None, Some(b_to_c)) => insert_derived(edges, a, c, a_to_b.mul(&b_to_c))?,
                                (Some(a_to_c), None) => insert_derived(edges, b, c, a_to_c.checked_div(&a_to_b)?)?,
                                _ => false,
                            };
                            if derived {
                                added += 1;
                            }
                        }
                    }
                }
            }
            total += added;
            if added == 0 {
                break;
            }
        }
        debug!(groups = groups.len(), passes, derived = total, "transitive closure");
        Ok(total)
    }

    /// Step 5: prefixed units
    fn expand_prefixes(&mut self, edges: &mut EdgeMap) -> Result<(usize, usize), RpnError> {
        let candidates: Vec<(String, UnitDefinition)> = self.catalog.iter()
            .filter(|(_, def)| def.prefixes != PrefixSet::None)
            .map(|(name, def)| (name.to_string(), def.clone()))
            .collect();

        let (mut units, mut added) = (0, 0);
        for (base, def) in &candidates {
            let prefixes: Vec<Prefix> = match def.prefixes {
                PrefixSet::Metric => METRIC_PREFIXES.to_vec(),
                PrefixSet::Data => METRIC_PREFIXES.iter()
                    .filter(|p| p.power > 0)
                    .chain(BINARY_PREFIXES.iter())
                    .copied()
                    .collect(),
                PrefixSet::None => Vec::new(),
            };

            for prefix in prefixes {
                let name = prefixed_name(prefix.name, base);
                let mut derived = UnitDefinition::new(&name, &def.dimension)
                    .plural(&prefixed_name(prefix.name, &def.plural));
                derived.categories = def.categories.clone();
                if !def.abbreviation.is_empty() {
                    derived.abbreviation = format!("{}{}", prefix.abbreviation, def.abbreviation);
                }
                let plain = format!("{}{}", prefix.name, base);
                if plain != name {
                    derived.aliases.push(plain);
                }
                derived.aliases.extend(def.aliases.iter().map(|a| format!("{}{}", prefix.name, a)));

                let length = def.dimension == "length";
                if self.catalog.insert(&name, derived.clone()) {
                    units += 1;
                }
                let factor = prefix.factor();
                added += attach(edges, &name, base, &factor)?;

                if length {
                    for (word, power) in [("square", 2), ("cubic", 3)] {
                        let (power_name, power_def) = power_unit(&name, &derived, power);
                        if self.catalog.insert(&power_name, power_def) {
                            units += 1;
                        }
                        let base_power = format!("{}_{}", word, base);
                        added += attach(edges, &power_name, &base_power, &factor.pow(power)?)?;
                    }
                }
            }
        }
        Ok((units, added))
    }

    /// Run every step and freeze the result
    pub fn build(mut self) -> Result<UnitSystem, RpnError> {
        let synthesized = self.synthesize_powers();
        self.validate_catalog()?;
        debug!(units = self.catalog.len(), synthesized, "derived area and volume units");

        let (seeds, mut edges) = self.seed_edges()?;
        debug!(seeds = seeds.len(), edges = edges.len(), "reciprocal closure");

        let propagated = self.propagate_powers(&seeds, &mut edges)?;
        debug!(propagated, "power propagation");

        self.close(&mut edges)?;

        let (prefixed, prefix_edges) = self.expand_prefixes(&mut edges)?;
        debug!(prefixed, edges = prefix_edges, "prefix expansion");

        let mut nonlinear = BTreeMap::new();
        for (from, to, convert) in &self.nonlinear {
            if self.signature_of(from)? != self.signature_of(to)? {
                return Err(RpnError::UnitBuild(format!(
                    "nonlinear conversion '{}' -> '{}' crosses dimensions", from, to
                )));
            }
            nonlinear.insert(key(from, to), *convert);
        }

        debug!(
            dimensions = self.dimensions.len(),
            units = self.catalog.len(),
            aliases = self.catalog.alias_count(),
            edges = edges.len(),
            nonlinear = nonlinear.len(),
            "conversion graph built"
        );
        Ok(UnitSystem::from_parts(self.dimensions, self.catalog, ConversionGraph::new(edges, nonlinear)))
    }
}
