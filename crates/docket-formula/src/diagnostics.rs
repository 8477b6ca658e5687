//! Structured warnings raised while evaluating formulas
//!
//! Evaluation never fails outward. Everything that was absorbed into a zero or
//! empty result is recorded here and logged, so strict callers can reject a
//! formula without changing the default behaviour.

use crate::error::FormulaError;

/// Ordered collection of absorbed evaluation errors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    items: Vec<FormulaError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an absorbed error and log it
    pub fn push(&mut self, error: FormulaError) {
        match &error {
            FormulaError::UnresolvedVariable(name) => {
                tracing::debug!(variable = %name, "unresolved variable, substituting 0");
            }
            FormulaError::NonConvergent { passes } => {
                tracing::warn!(passes, "computed fields did not reach a fixed point");
            }
            other => tracing::warn!("{other}"),
        }
        self.items.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormulaError> {
        self.items.iter()
    }

    /// First recorded error, if any
    pub fn first(&self) -> Option<&FormulaError> {
        self.items.first()
    }

    /// Move all items from `other` into `self` without logging them again
    pub fn append(&mut self, other: &mut Diagnostics) {
        self.items.append(&mut other.items);
    }

    pub fn into_vec(self) -> Vec<FormulaError> {
        self.items
    }
}

impl IntoIterator for Diagnostics {
    type Item = FormulaError;
    type IntoIter = std::vec::IntoIter<FormulaError>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
