//! The evaluation engine
//!
//! An [`Engine`] bundles the function table, the clock and the options. It
//! is cheap to clone and can be shared between threads; evaluation never
//! mutates it.

use crate::{
    Clock, DataContext, Diagnostics, Evaluator, FormulaResult, FunctionRegistry, SystemClock, Value,
};
use std::fmt;
use std::sync::Arc;

/// Options for evaluation and field resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Maximum resolver passes over the computed fields (default: 5)
    pub max_passes: u32,
    /// Maximum function-call rewrites within one formula (default: 256)
    pub max_call_rewrites: usize,
    /// Maximum nesting of parentheses, operators and sub-expressions (default: 256)
    pub max_nesting_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_passes: 5,
            max_call_rewrites: docket_formula::evaluator::DEFAULT_MAX_CALL_REWRITES,
            max_nesting_depth: docket_formula::parser::DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

/// Formula engine
#[derive(Clone)]
pub struct Engine {
    registry: Arc<FunctionRegistry>,
    clock: Arc<dyn Clock>,
    options: EngineOptions,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("functions", &self.registry.len())
            .field("today", &self.clock.today())
            .field("options", &self.options)
            .finish()
    }
}

impl Engine {
    /// Engine with the built-in functions, the system clock and default options
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    /// Engine with custom options
    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            registry: Arc::new(FunctionRegistry::new()),
            clock: Arc::new(SystemClock),
            options,
        }
    }

    /// Replace the clock used by `today()`
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the function table
    pub fn with_registry(mut self, registry: Arc<FunctionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub(crate) fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(&self.registry, self.clock.as_ref())
            .with_max_call_rewrites(self.options.max_call_rewrites)
            .with_max_nesting_depth(self.options.max_nesting_depth)
    }

    /// Evaluate one formula. Never fails; problems evaluate to `0`.
    ///
    /// # Example
    /// ```rust
    /// use docket::{DataContext, Engine, Value};
    ///
    /// let engine = Engine::new();
    /// let ctx = DataContext::new().with("weeklyHours", 45);
    /// let status = engine.evaluate(r#"if({d.weeklyHours}>40,"Unpaid","N/A")"#, &ctx);
    /// assert_eq!(status, Value::from("Unpaid"));
    /// ```
    pub fn evaluate(&self, formula: &str, ctx: &DataContext) -> Value {
        self.evaluate_with_diagnostics(formula, ctx).0
    }

    /// Evaluate one formula and report what was absorbed on the way
    pub fn evaluate_with_diagnostics(
        &self,
        formula: &str,
        ctx: &DataContext,
    ) -> (Value, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let value = self.evaluator().evaluate(formula, ctx, &mut diagnostics);
        (value, diagnostics)
    }

    /// Evaluate one formula, failing on the first absorbed problem
    pub fn try_evaluate(&self, formula: &str, ctx: &DataContext) -> FormulaResult<Value> {
        let (value, diagnostics) = self.evaluate_with_diagnostics(formula, ctx);
        match diagnostics.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FixedClock, FormulaError};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_options() {
        let options = EngineOptions::default();
        assert_eq!(options.max_passes, 5);
        assert_eq!(options.max_call_rewrites, 256);
    }

    #[test]
    fn test_clock_is_injected() {
        let leap_day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let engine = Engine::new().with_clock(FixedClock(leap_day));
        assert_eq!(
            engine.evaluate("today()", &DataContext::new()),
            Value::from("2024-02-29")
        );
        assert_eq!(
            engine.evaluate("formatDate(today())", &DataContext::new()),
            Value::from("February 29, 2024")
        );
    }

    #[test]
    fn test_try_evaluate() {
        let engine = Engine::new();
        let ctx = DataContext::new().with("a", 2);
        assert_eq!(engine.try_evaluate("{d.a}*3", &ctx), Ok(Value::from(6.0)));
        assert_eq!(
            engine.try_evaluate("{d.b}*3", &ctx),
            Err(FormulaError::UnresolvedVariable("b".into()))
        );
        assert_eq!(
            engine.try_evaluate("bogus(1)", &ctx),
            Err(FormulaError::UnknownFunction("bogus".into()))
        );
    }

    #[test]
    fn test_custom_registry() {
        let engine = Engine::new().with_registry(Arc::new(FunctionRegistry::empty()));
        let (value, diagnostics) =
            engine.evaluate_with_diagnostics("sum(1, 2)", &DataContext::new());
        assert_eq!(value, Value::from(0.0));
        assert_eq!(diagnostics.len(), 1);
    }
}
