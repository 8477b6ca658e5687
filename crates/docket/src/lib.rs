//! # docket
//!
//! Formula engine for computed fields in legal document forms.
//!
//! Form fields carry small formulas over the values a user has entered:
//! `{d.unpaidHours}*{d.hourlyRate}`, `dateDiff({d.hired}, {d.fired}, "weeks")`,
//! `if({d.weeklyHours}>40,"Unpaid","N/A")`. The engine evaluates them with
//! loose, forgiving coercion; a malformed formula yields `0` rather than an
//! error, and the problem is reported through [`Diagnostics`].
//!
//! ## Features
//!
//! - Single-formula evaluation with literals, variables, function calls,
//!   arithmetic, comparisons and logic
//! - Built-in date, math, text and list functions
//! - Batch resolution of computed fields that reference each other
//! - Optional strict entry points that fail on the first absorbed problem
//! - `serde` support for field descriptors (feature `serde`)
//!
//! ## Example
//!
//! ```rust
//! use docket::prelude::*;
//!
//! let engine = Engine::new();
//! let ctx = DataContext::new()
//!     .with("hourlyRate", 25)
//!     .with("unpaidHours", 300);
//!
//! let fields = vec![
//!     FieldDescriptor::computed("wages", "{d.unpaidHours}*{d.hourlyRate}"),
//!     FieldDescriptor::computed("wagesInWords", "amountToWords({d.wages})"),
//! ];
//!
//! let values = engine.evaluate_batch(&fields, &ctx);
//! assert_eq!(values["wages"], Value::from(7500.0));
//! assert_eq!(values["wagesInWords"], Value::from("SEVEN THOUSAND FIVE HUNDRED"));
//! ```

pub mod calculation;
pub mod engine;
pub mod prelude;

pub use calculation::ResolutionReport;
pub use engine::{Engine, EngineOptions};

// Re-export formula types
pub use docket_formula::{
    evaluate, variable_references, Clock, DataContext, DependencyGraph, Diagnostics, Evaluator,
    FieldDescriptor, FieldKind, FixedClock, FormulaError, FormulaResult, FunctionDef,
    FunctionRegistry, ResultMapping, SystemClock, Value,
};
