//! Built-in formula functions

pub mod collection;
pub mod date;
pub mod logical;
pub mod math;
pub mod text;

use crate::clock::Clock;
use crate::error::FormulaResult;
use crate::value::Value;
use ahash::AHashMap;

/// What a function can see besides its arguments
pub struct CallContext<'a> {
    pub clock: &'a dyn Clock,
}

/// Function implementation signature
///
/// Arguments arrive already evaluated. Errors are absorbed by the evaluator
/// (logged, result `0`), so implementations may return them freely.
pub type FunctionImpl = fn(&[Value], &CallContext) -> FormulaResult<Value>;

/// Function definition
pub struct FunctionDef {
    /// Function name (case-sensitive)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
    /// Result depends on the clock
    pub volatile: bool,
}

/// Function registry
///
/// Built once and shared read-only by every evaluation.
pub struct FunctionRegistry {
    functions: AHashMap<&'static str, FunctionDef>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry.register_logical_functions();
        registry.register_math_functions();
        registry.register_date_functions();
        registry.register_text_functions();
        registry.register_collection_functions();

        registry
    }

    /// A registry with no functions at all
    pub fn empty() -> Self {
        Self {
            functions: AHashMap::new(),
        }
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }

    /// Register a function, replacing any previous one with the same name
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name, def);
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// All definitions, sorted by name
    pub fn definitions(&self) -> Vec<&FunctionDef> {
        let mut defs: Vec<_> = self.functions.values().collect();
        defs.sort_by_key(|def| def.name);
        defs
    }

    fn add(
        &mut self,
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        implementation: FunctionImpl,
    ) {
        self.register(FunctionDef {
            name,
            min_args,
            max_args,
            implementation,
            volatile: false,
        });
    }

    fn register_logical_functions(&mut self) {
        self.add("if", 2, Some(3), logical::fn_if);
    }

    fn register_math_functions(&mut self) {
        self.add("sum", 0, None, math::fn_sum);
        self.add("max", 0, None, math::fn_max);
        self.add("min", 0, None, math::fn_min);
        self.add("round", 1, Some(2), math::fn_round);
        self.add("ceil", 1, Some(1), math::fn_ceil);
        self.add("floor", 1, Some(1), math::fn_floor);
        self.add("abs", 1, Some(1), math::fn_abs);
    }

    fn register_date_functions(&mut self) {
        self.add("dateDiff", 2, Some(3), date::fn_date_diff);
        self.add("dateAdd", 2, Some(3), date::fn_date_add);
        self.add("dateSubtract", 2, Some(3), date::fn_date_subtract);
        self.add("weeksBetween", 2, Some(2), date::fn_weeks_between);
        self.add("monthsBetween", 2, Some(2), date::fn_months_between);
        self.add("yearsBetween", 2, Some(2), date::fn_years_between);
        self.add("formatDate", 1, Some(2), date::fn_format_date);

        // TODAY (volatile)
        self.register(FunctionDef {
            name: "today",
            min_args: 0,
            max_args: Some(0),
            implementation: date::fn_today,
            volatile: true,
        });
    }

    fn register_text_functions(&mut self) {
        self.add("concat", 0, None, text::fn_concat);
        self.add("pluralize", 3, Some(3), text::fn_pluralize);
        self.add("amountToWords", 1, Some(1), text::fn_amount_to_words);
        self.add("causeOrdinal", 1, Some(1), text::fn_cause_ordinal);
    }

    fn register_collection_functions(&mut self) {
        self.add("count", 1, Some(1), collection::fn_count);
        self.add("generateCauseNumbers", 1, Some(1), collection::fn_generate_cause_numbers);
        self.add("isEmpty", 1, Some(1), collection::fn_is_empty);
        self.add("isNotEmpty", 1, Some(1), collection::fn_is_not_empty);
    }
}

static EMPTY: Value = Value::Empty;

/// Argument `index`, or [`Value::Empty`] when it was not supplied
pub(crate) fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&EMPTY)
}

/// Numeric view of an argument where falsy values count as zero
pub(crate) fn loose_number(v: &Value) -> f64 {
    if v.is_truthy() {
        v.to_number()
    } else {
        0.0
    }
}
