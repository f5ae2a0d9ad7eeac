//! Operator Registry

use crate::{OperatorDescriptor, OperatorKind};
use rpn_core::RpnError;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Name and alias lookup over every known operator, modifiers included
#[derive(Debug, Default)]
pub struct OperatorRegistry {
    operators: HashMap<&'static str, OperatorDescriptor>,
    aliases: HashMap<&'static str, &'static str>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operator and its aliases. A later registration of the
    /// same name replaces the earlier one.
    pub fn with_operator(mut self, descriptor: OperatorDescriptor) -> Self {
        for &alias in descriptor.aliases {
            if let Some(previous) = self.aliases.insert(alias, descriptor.name) {
                if previous != descriptor.name {
                    warn!(alias, previous, current = descriptor.name, "operator alias reassigned");
                }
            }
        }
        if self.operators.insert(descriptor.name, descriptor.clone()).is_some() {
            warn!(name = descriptor.name, "operator registered twice");
        }
        self
    }

    /// Exact name first, then alias
    pub fn get(&self, name: &str) -> Option<&OperatorDescriptor> {
        self.operators.get(name).or_else(|| {
            self.aliases.get(name).and_then(|target| self.operators.get(target))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Operator names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.operators.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn by_kind(&self, kind: OperatorKind) -> Vec<&OperatorDescriptor> {
        let mut found: Vec<_> = self.operators.values().filter(|d| d.kind() == kind).collect();
        found.sort_by_key(|d| d.name);
        found
    }

    pub fn by_category(&self, category: &str) -> Vec<&OperatorDescriptor> {
        let mut found: Vec<_> = self.operators.values().filter(|d| d.category == category).collect();
        found.sort_by_key(|d| d.name);
        found
    }

    /// `UnknownTerm` carrying up to five similar operator names
    pub fn unknown_term(&self, term: &str) -> RpnError {
        RpnError::UnknownTerm {
            term: term.to_string(),
            suggestions: self.find_similar(term).into_iter().take(5).collect(),
        }
    }

    /// Operator names similar to `name`, best first
    pub fn find_similar(&self, name: &str) -> Vec<String> {
        let query = name.to_lowercase();
        let mut matches: Vec<(&str, usize)> = self.operators.keys()
            .filter_map(|candidate| {
                let score = Self::similarity_score(&query, candidate);
                (score > 0).then_some((*candidate, score))
            })
            .collect();

        matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        matches.into_iter().map(|(name, _)| name.to_string()).collect()
    }

    fn similarity_score(query: &str, candidate: &str) -> usize {
        if query.is_empty() {
            return 0;
        }
        let mut score = 0;

        if candidate.starts_with(query) {
            score += 100;
        } else if candidate.contains(query) {
            score += 50;
        } else if query.contains(candidate) {
            score += 30;
        }

        let query_chars: HashSet<char> = query.chars().collect();
        let candidate_chars: HashSet<char> = candidate.chars().collect();
        let common = query_chars.intersection(&candidate_chars).count();
        // a single shared letter is noise
        if score == 0 && common < 2 {
            return 0;
        }
        score += common * 2;

        let len_diff = query.len().abs_diff(candidate.len());
        if len_diff < 5 && score > 0 {
            score += 5 - len_diff;
        }
        score
    }
}
