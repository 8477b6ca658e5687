//! Computed-field resolution
//!
//! Computed fields may reference each other through the same `{d.<id>}`
//! tokens used for form data. Resolution evaluates every computed field in
//! declaration order, pass after pass, with earlier results layered over the
//! form data, until a pass changes nothing or the pass cap is reached.
//!
//! # Example
//!
//! ```rust
//! use docket::{DataContext, Engine, FieldDescriptor, Value};
//!
//! let fields = vec![
//!     FieldDescriptor::computed("a", "{d.b}+1"),
//!     FieldDescriptor::computed("b", "5"),
//! ];
//! let report = Engine::new().resolve(&fields, &DataContext::new());
//! assert!(report.converged);
//! assert_eq!(report.values["a"], Value::from(6.0));
//! ```

use crate::{
    DataContext, DependencyGraph, Diagnostics, Engine, FieldDescriptor, FormulaError,
    FormulaResult, ResultMapping,
};

/// Outcome of resolving a batch of computed fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionReport {
    /// Field id → value after the last completed pass
    pub values: ResultMapping,
    /// Number of passes performed
    pub passes: u32,
    /// Whether the last pass changed nothing
    pub converged: bool,
    /// Computed fields that reference themselves through other computed fields
    pub circular_fields: Vec<String>,
}

impl Engine {
    /// Evaluate a batch of fields, returning computed values by field id.
    ///
    /// Fields that are not computed, or have a blank formula, are skipped.
    /// A cycle that never settles yields the values from the last pass.
    pub fn evaluate_batch(
        &self,
        fields: &[FieldDescriptor],
        base: &DataContext,
    ) -> ResultMapping {
        self.resolve(fields, base).values
    }

    /// Like [`evaluate_batch`](Self::evaluate_batch), failing on the first
    /// problem absorbed during the final pass, or with
    /// [`FormulaError::NonConvergent`] when the pass cap was hit.
    pub fn try_evaluate_batch(
        &self,
        fields: &[FieldDescriptor],
        base: &DataContext,
    ) -> FormulaResult<ResultMapping> {
        let (report, diagnostics) = self.resolve_with_diagnostics(fields, base);
        match diagnostics.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(report.values),
        }
    }

    /// Resolve a batch of fields and report how resolution went
    pub fn resolve(&self, fields: &[FieldDescriptor], base: &DataContext) -> ResolutionReport {
        self.resolve_with_diagnostics(fields, base).0
    }

    /// Resolve a batch of fields. Diagnostics cover the final pass only, since
    /// earlier passes routinely see references that are not computed yet.
    pub fn resolve_with_diagnostics(
        &self,
        fields: &[FieldDescriptor],
        base: &DataContext,
    ) -> (ResolutionReport, Diagnostics) {
        let computed: Vec<(&str, &str)> = fields
            .iter()
            .filter_map(|field| {
                field
                    .computed_formula()
                    .map(|formula| (field.id.as_str(), formula))
            })
            .collect();

        let graph = DependencyGraph::from_formulas(computed.iter().copied());
        let mut report = ResolutionReport {
            circular_fields: graph.circular_fields(),
            ..Default::default()
        };
        if !report.circular_fields.is_empty() {
            tracing::debug!(
                fields = ?report.circular_fields,
                "computed fields reference each other in a cycle"
            );
        }

        let evaluator = self.evaluator();
        let mut diagnostics = Diagnostics::new();

        if computed.is_empty() {
            report.converged = true;
            return (report, diagnostics);
        }

        while report.passes < self.options().max_passes {
            report.passes += 1;

            let mut pass_diagnostics = Diagnostics::new();
            let mut ctx = base.overlay(&report.values);
            let mut changed = false;

            for &(id, formula) in &computed {
                let value = evaluator.evaluate(formula, &ctx, &mut pass_diagnostics);
                if report.values.get(id) != Some(&value) {
                    ctx.insert(id, value.clone());
                    report.values.insert(id.to_string(), value);
                    changed = true;
                }
            }

            tracing::trace!(pass = report.passes, changed, "resolver pass complete");
            diagnostics = pass_diagnostics;

            if !changed {
                report.converged = true;
                break;
            }
        }

        if !report.converged {
            diagnostics.push(FormulaError::NonConvergent {
                passes: report.passes,
            });
        }

        (report, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EngineOptions, Value};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolves_forward_reference() {
        let fields = vec![
            FieldDescriptor::computed("a", "{d.b}+1"),
            FieldDescriptor::computed("b", "5"),
        ];
        let report = Engine::new().resolve(&fields, &DataContext::new());

        assert_eq!(report.values.get("a"), Some(&Value::from(6.0)));
        assert_eq!(report.values.get("b"), Some(&Value::from(5.0)));
        assert_eq!(report.passes, 3);
        assert!(report.converged);
        assert!(report.circular_fields.is_empty());
    }

    #[test]
    fn test_self_reference_stops_at_cap() {
        let fields = vec![FieldDescriptor::computed("a", "{d.a}+1")];
        let engine = Engine::new();
        let (report, diagnostics) = engine.resolve_with_diagnostics(&fields, &DataContext::new());

        assert_eq!(report.values.get("a"), Some(&Value::from(5.0)));
        assert_eq!(report.passes, 5);
        assert!(!report.converged);
        assert_eq!(report.circular_fields, vec!["a"]);
        assert_eq!(
            diagnostics.iter().last(),
            Some(&FormulaError::NonConvergent { passes: 5 })
        );
        assert_eq!(
            engine.try_evaluate_batch(&fields, &DataContext::new()),
            Err(FormulaError::NonConvergent { passes: 5 })
        );
    }

    #[test]
    fn test_pass_cap_is_configurable() {
        let fields = vec![FieldDescriptor::computed("a", "{d.a}+1")];
        let engine = Engine::with_options(EngineOptions {
            max_passes: 2,
            ..Default::default()
        });
        let report = engine.resolve(&fields, &DataContext::new());
        assert_eq!(report.passes, 2);
        assert_eq!(report.values.get("a"), Some(&Value::from(2.0)));
    }

    #[test]
    fn test_non_computed_fields_are_skipped() {
        let fields = vec![
            FieldDescriptor::other("name", "text"),
            FieldDescriptor::computed("blank", "   "),
            FieldDescriptor::computed("wages", "{d.unpaidHours}*{d.hourlyRate}"),
        ];
        let base = DataContext::new().with("unpaidHours", 300).with("hourlyRate", 25);
        let values = Engine::new().evaluate_batch(&fields, &base);

        assert_eq!(values.len(), 1);
        assert_eq!(values.get("wages"), Some(&Value::from(7500.0)));
    }

    #[test]
    fn test_strict_batch_ignores_early_pass_gaps() {
        let fields = vec![
            FieldDescriptor::computed("words", "amountToWords({d.wages})"),
            FieldDescriptor::computed("wages", "{d.hours}*10"),
        ];
        let base = DataContext::new().with("hours", 12);
        let values = Engine::new().try_evaluate_batch(&fields, &base).unwrap();
        assert_eq!(values.get("words"), Some(&Value::from("ONE HUNDRED TWENTY")));
    }

    #[test]
    fn test_empty_batch() {
        let report = Engine::new().resolve(&[], &DataContext::new());
        assert!(report.values.is_empty());
        assert_eq!(report.passes, 0);
        assert!(report.converged);
    }
}
