//! Dependency tracking between computed fields

use ahash::{AHashMap, AHashSet};
use lazy_regex::regex;

/// Variable names referenced by a formula, in order of first appearance
pub fn variable_references(formula: &str) -> Vec<String> {
    let mut seen = AHashSet::new();
    regex!(r"\{d\.([^}]+)\}")
        .captures_iter(formula)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Dependency graph over field ids
///
/// Only edges between computed fields are tracked; a reference to plain
/// form data is not a dependency.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Field → fields that depend on it (dependents)
    dependents: AHashMap<String, AHashSet<String>>,
    /// Field → fields it depends on (precedents)
    precedents: AHashMap<String, AHashSet<String>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for `(id, formula)` pairs
    pub fn from_formulas<'a>(formulas: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let formulas: Vec<_> = formulas.into_iter().collect();
        let ids: AHashSet<&str> = formulas.iter().map(|(id, _)| *id).collect();

        let mut graph = Self::new();
        for (id, formula) in &formulas {
            for name in variable_references(formula) {
                if ids.contains(name.as_str()) {
                    graph.add_dependency(&name, id);
                }
            }
        }
        graph
    }

    /// Add a dependency: dependent depends on precedent
    pub fn add_dependency(&mut self, precedent: &str, dependent: &str) {
        self.dependents
            .entry(precedent.to_string())
            .or_default()
            .insert(dependent.to_string());
        self.precedents
            .entry(dependent.to_string())
            .or_default()
            .insert(precedent.to_string());
    }

    /// Fields that depend on the given field
    pub fn get_dependents<'g>(&'g self, field: &str) -> impl Iterator<Item = &'g str> + 'g {
        self.dependents
            .get(field)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Fields the given field depends on
    pub fn get_precedents<'g>(&'g self, field: &str) -> impl Iterator<Item = &'g str> + 'g {
        self.precedents
            .get(field)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Detect circular references involving a field
    pub fn has_circular_reference(&self, field: &str) -> bool {
        let mut visited = AHashSet::new();
        self.detect_cycle(field, field, &mut visited)
    }

    /// Every field that sits on a cycle, sorted
    pub fn circular_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = self
            .precedents
            .keys()
            .filter(|field| self.has_circular_reference(field))
            .cloned()
            .collect();
        fields.sort();
        fields
    }

    /// A cycle through `field` exists when it is reachable from its own precedents
    fn detect_cycle<'g>(
        &'g self,
        target: &str,
        field: &'g str,
        visited: &mut AHashSet<&'g str>,
    ) -> bool {
        if !visited.insert(field) {
            return false;
        }

        self.get_precedents(field)
            .any(|precedent| precedent == target || self.detect_cycle(target, precedent, visited))
    }

    pub fn is_empty(&self) -> bool {
        self.precedents.is_empty()
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_variable_references() {
        assert_eq!(
            variable_references("{d.a} + {d.b} * {d.a} + sum({d.c})"),
            vec!["a", "b", "c"]
        );
        assert!(variable_references("2 + 3").is_empty());
    }

    #[test]
    fn test_add_dependency() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("total", "words");

        assert!(graph.get_dependents("total").any(|f| f == "words"));
        assert!(graph.get_precedents("words").any(|f| f == "total"));
        assert!(!graph.has_circular_reference("total"));
    }

    #[test]
    fn test_from_formulas_ignores_plain_data() {
        let graph = DependencyGraph::from_formulas([
            ("wages", "{d.unpaidHours}*{d.hourlyRate}"),
            ("words", "amountToWords({d.wages})"),
        ]);
        assert_eq!(graph.get_precedents("words").collect::<Vec<_>>(), vec!["wages"]);
        assert_eq!(graph.get_precedents("wages").count(), 0);
        assert!(graph.circular_fields().is_empty());
    }

    #[test]
    fn test_circular_reference() {
        // a -> b -> c -> a, plus d depending on the cycle
        let graph = DependencyGraph::from_formulas([
            ("a", "{d.c} + 1"),
            ("b", "{d.a} + 1"),
            ("c", "{d.b} + 1"),
            ("d", "{d.a} * 2"),
            ("e", "{d.e}"),
        ]);

        assert!(graph.has_circular_reference("a"));
        assert!(graph.has_circular_reference("b"));
        assert!(graph.has_circular_reference("c"));
        assert!(!graph.has_circular_reference("d"));
        assert_eq!(graph.circular_fields(), vec!["a", "b", "c", "e"]);
    }
}
