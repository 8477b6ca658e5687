//! Prelude module - common imports for docket users
//!
//! ```rust
//! use docket::prelude::*;
//! ```

pub use crate::{
    // Data types
    DataContext,
    Diagnostics,
    // Main types
    Engine,
    EngineOptions,
    FieldDescriptor,
    FieldKind,
    // Clocks
    FixedClock,
    FormulaError,
    FormulaResult,
    ResolutionReport,
    ResultMapping,
    SystemClock,
    Value,
};
