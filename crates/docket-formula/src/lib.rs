//! # docket-formula
//!
//! Formula evaluation for computed form fields.
//!
//! This crate provides:
//! - Loose value coercion over form data
//! - Date arithmetic and legal-style date formatting
//! - Built-in functions (`if`, `sum`, `dateDiff`, `amountToWords`, ...)
//! - An arithmetic parser (text → AST) and tree-walking evaluation
//! - Reference tracking between computed fields
//!
//! ## Example
//!
//! ```rust
//! use docket_formula::{evaluate, DataContext, FunctionRegistry, SystemClock, Value};
//!
//! let registry = FunctionRegistry::new();
//! let ctx = DataContext::new().with("unpaidHours", 300).with("hourlyRate", 25);
//! let wages = evaluate("{d.unpaidHours}*{d.hourlyRate}", &ctx, &registry, &SystemClock);
//! assert_eq!(wages, Value::Number(7500.0));
//! ```

pub mod ast;
pub mod clock;
pub mod date;
pub mod dependency;
pub mod diagnostics;
pub mod error;
pub mod evaluator;
pub mod field;
pub mod functions;
pub mod parser;
pub mod value;

pub use ast::{BinaryOperator, FormulaExpr, UnaryOperator};
pub use clock::{Clock, FixedClock, SystemClock};
pub use dependency::{variable_references, DependencyGraph};
pub use diagnostics::Diagnostics;
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, evaluate_with_diagnostics, Evaluator};
pub use field::{FieldDescriptor, FieldKind};
pub use functions::{FunctionDef, FunctionRegistry};
pub use parser::{parse_arithmetic, parse_arithmetic_with_depth};
pub use value::{DataContext, ResultMapping, Value};
