//! Form field descriptors

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a form field. Only computed fields carry formulas the resolver
/// evaluates; every other kind is passed over.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum FieldKind {
    Computed,
    Other(String),
}

impl From<String> for FieldKind {
    fn from(kind: String) -> Self {
        if kind == "computed" {
            FieldKind::Computed
        } else {
            FieldKind::Other(kind)
        }
    }
}

impl From<&str> for FieldKind {
    fn from(kind: &str) -> Self {
        FieldKind::from(kind.to_string())
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Computed => "computed".to_string(),
            FieldKind::Other(kind) => kind,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Computed => f.write_str("computed"),
            FieldKind::Other(kind) => f.write_str(kind),
        }
    }
}

/// A form field as configured by the form layer
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldDescriptor {
    /// Field id; computed results are published under it
    pub id: String,
    #[cfg_attr(feature = "serde", serde(rename = "type", alias = "kind"))]
    pub kind: FieldKind,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub formula: Option<String>,
}

impl FieldDescriptor {
    /// A computed field
    pub fn computed(id: impl Into<String>, formula: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: FieldKind::Computed,
            formula: Some(formula.into()),
        }
    }

    /// A field of any other kind, without a formula
    pub fn other(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: FieldKind::Other(kind.into()),
            formula: None,
        }
    }

    /// The formula to evaluate, when this is a computed field with a
    /// non-blank formula
    pub fn computed_formula(&self) -> Option<&str> {
        match (&self.kind, &self.formula) {
            (FieldKind::Computed, Some(formula)) if !formula.trim().is_empty() => Some(formula),
            _ => None,
        }
    }
}
