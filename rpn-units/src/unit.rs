//! Unit definitions and the alias-aware catalog

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which prefixes the builder expands a unit with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrefixSet {
    #[default]
    None,
    /// All twenty SI prefixes, yotta through yocto
    Metric,
    /// Positive SI prefixes plus the binary kibi..yobi
    Data,
}

/// An immutable unit description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDefinition {
    pub dimension: String,
    /// Display form used in output
    pub representation: String,
    pub plural: String,
    pub abbreviation: String,
    pub aliases: Vec<String>,
    pub categories: Vec<String>,
    #[serde(default)]
    pub prefixes: PrefixSet,
}

impl UnitDefinition {
    /// A unit whose display form is its name and whose plural adds "s"
    pub fn new(name: &str, dimension: &str) -> Self {
        Self {
            dimension: dimension.to_string(),
            representation: name.to_string(),
            plural: format!("{}s", name),
            abbreviation: String::new(),
            aliases: Vec::new(),
            categories: Vec::new(),
            prefixes: PrefixSet::None,
        }
    }

    pub fn plural(mut self, plural: &str) -> Self {
        self.plural = plural.to_string();
        self
    }

    pub fn abbrev(mut self, abbreviation: &str) -> Self {
        self.abbreviation = abbreviation.to_string();
        self
    }

    pub fn aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases.extend(aliases.iter().map(|a| a.to_string()));
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.categories.push(category.to_string());
        self
    }

    pub fn metric(mut self) -> Self {
        self.prefixes = PrefixSet::Metric;
        self
    }

    pub fn data(mut self) -> Self {
        self.prefixes = PrefixSet::Data;
        self
    }

    /// Singular or plural display form
    pub fn display(&self, plural: bool) -> &str {
        if plural { &self.plural } else { &self.representation }
    }
}

/// Named units plus the alias table that maps plurals, abbreviations and
/// alternate spellings back to unit names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitCatalog {
    units: BTreeMap<String, UnitDefinition>,
    aliases: BTreeMap<String, String>,
}

impl UnitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit and its aliases. An existing unit of the same name
    /// wins and `false` is returned.
    pub fn insert(&mut self, name: &str, definition: UnitDefinition) -> bool {
        if self.units.contains_key(name) {
            return false;
        }

        let mut alternates = vec![definition.plural.clone(), definition.abbreviation.clone()];
        alternates.extend(definition.aliases.iter().cloned());
        self.units.insert(name.to_string(), definition);
        for alias in alternates {
            self.alias(&alias, name);
        }
        true
    }

    /// Map `alias` to `name`. First registration wins; unit names are
    /// never shadowed by aliases.
    pub fn alias(&mut self, alias: &str, name: &str) {
        if alias.is_empty() || alias == name || self.units.contains_key(alias) {
            return;
        }
        self.aliases.entry(alias.to_string()).or_insert_with(|| name.to_string());
    }

    /// Resolve a unit name or alias to the catalog name
    pub fn resolve(&self, term: &str) -> Option<&str> {
        if let Some((name, _)) = self.units.get_key_value(term) {
            return Some(name.as_str());
        }
        self.aliases.get(term).map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&UnitDefinition> {
        self.units.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    pub fn dimension_of(&self, name: &str) -> Option<&str> {
        self.units.get(name).map(|def| def.dimension.as_str())
    }

    /// Unit names in a dimension, sorted
    pub fn units_in(&self, dimension: &str) -> Vec<&str> {
        self.units.iter()
            .filter(|(_, def)| def.dimension == dimension)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UnitDefinition)> {
        self.units.iter().map(|(name, def)| (name.as_str(), def))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> UnitCatalog {
        let mut catalog = UnitCatalog::new();
        catalog.insert("foot", UnitDefinition::new("foot", "length").plural("feet").abbrev("ft"));
        catalog.insert("meter", UnitDefinition::new("meter", "length").abbrev("m").aliases(&["metre"]).metric());
        catalog
    }

    #[test]
    fn test_resolve_names_and_aliases() {
        let catalog = catalog();
        assert_eq!(catalog.resolve("foot"), Some("foot"));
        assert_eq!(catalog.resolve("feet"), Some("foot"));
        assert_eq!(catalog.resolve("ft"), Some("foot"));
        assert_eq!(catalog.resolve("metre"), Some("meter"));
        assert_eq!(catalog.resolve("meters"), Some("meter"));
        assert_eq!(catalog.resolve("furlong"), None);
    }

    #[test]
    fn test_existing_unit_wins() {
        let mut catalog = catalog();
        assert!(!catalog.insert("foot", UnitDefinition::new("foot", "time")));
        assert_eq!(catalog.dimension_of("foot"), Some("length"));
    }

    #[test]
    fn test_first_alias_wins() {
        let mut catalog = catalog();
        catalog.insert("fathom", UnitDefinition::new("fathom", "length").abbrev("ft"));
        assert_eq!(catalog.resolve("ft"), Some("foot"));
    }

    #[test]
    fn test_units_in_dimension_sorted() {
        let catalog = catalog();
        assert_eq!(catalog.units_in("length"), vec!["foot", "meter"]);
        assert!(catalog.units_in("mass").is_empty());
    }

    #[test]
    fn test_display_forms() {
        let catalog = catalog();
        let foot = catalog.get("foot").unwrap();
        assert_eq!(foot.display(false), "foot");
        assert_eq!(foot.display(true), "feet");
        assert_eq!(catalog.get("meter").unwrap().prefixes, PrefixSet::Metric);
    }
}
