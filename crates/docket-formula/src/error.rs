//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
///
/// The public evaluation entry points never return these directly; they are
/// absorbed into a neutral value and recorded as diagnostics. Strict callers
/// can surface them through the `try_*` entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Arithmetic text could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Formula evaluation error
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Unknown function
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Variable token with no value in the data context
    #[error("Unresolved variable: {0}")]
    UnresolvedVariable(String),

    /// Function-call rewriting did not settle
    #[error("Function call resolution exceeded {0} rewrites")]
    CallDepthExceeded(usize),

    /// Expression nested past the configured bound
    #[error("Expression nested deeper than {0} levels")]
    NestingTooDeep(usize),

    /// Computed fields still changing when the pass cap was reached
    #[error("Computed fields did not converge after {passes} passes")]
    NonConvergent { passes: u32 },
}
