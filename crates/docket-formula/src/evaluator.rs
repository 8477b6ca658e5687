//! Formula evaluator
//!
//! Evaluation is staged over the formula text:
//!
//! 1. literals (`"text"`, `'text'`, `12.5`, `true`) are returned as-is
//! 2. `{d.name}` tokens are replaced by their substitution text
//! 3. function calls are resolved, each call being replaced by its result
//!    written back as a literal
//! 4. what remains is either pure arithmetic (parsed into an AST and walked)
//!    or a comparison/logical expression over literals
//!
//! Nothing here fails outward: every absorbed problem is pushed to the
//! caller's [`Diagnostics`] and the offending piece evaluates to `0`.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::clock::Clock;
use crate::diagnostics::Diagnostics;
use crate::error::{FormulaError, FormulaResult};
use crate::functions::{CallContext, FunctionRegistry};
use crate::parser::{parse_arithmetic_with_depth, DEFAULT_MAX_NESTING_DEPTH};
use crate::value::{substitution_text, DataContext, Value};
use lazy_regex::{regex, regex_captures, regex_is_match};
use regex::Captures;

/// Default bound on function-call rewrites within one formula
pub const DEFAULT_MAX_CALL_REWRITES: usize = 256;

const COMPARISON_OPERATORS: [&str; 6] = [">=", "<=", ">", "<", "==", "!="];

/// Evaluates formula text against a data context
pub struct Evaluator<'a> {
    registry: &'a FunctionRegistry,
    clock: &'a dyn Clock,
    max_call_rewrites: usize,
    max_nesting_depth: usize,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator over a function table and a clock
    pub fn new(registry: &'a FunctionRegistry, clock: &'a dyn Clock) -> Self {
        Self {
            registry,
            clock,
            max_call_rewrites: DEFAULT_MAX_CALL_REWRITES,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }

    /// Override the bound on function-call rewrites
    pub fn with_max_call_rewrites(mut self, max: usize) -> Self {
        self.max_call_rewrites = max;
        self
    }

    /// Override the bound on how deeply sub-expressions may nest
    pub fn with_max_nesting_depth(mut self, max: usize) -> Self {
        self.max_nesting_depth = max;
        self
    }

    /// Evaluate one formula. A blank formula yields empty text.
    pub fn evaluate(
        &self,
        formula: &str,
        ctx: &DataContext,
        diagnostics: &mut Diagnostics,
    ) -> Value {
        if formula.trim().is_empty() {
            return Value::Text(String::new());
        }
        self.evaluate_expression(formula, ctx, diagnostics, 0)
    }

    fn evaluate_expression(
        &self,
        expression: &str,
        ctx: &DataContext,
        diagnostics: &mut Diagnostics,
        depth: usize,
    ) -> Value {
        if depth > self.max_nesting_depth {
            diagnostics.push(FormulaError::NestingTooDeep(self.max_nesting_depth));
            return Value::Number(0.0);
        }

        let expression = expression.trim();
        if expression.is_empty() {
            return Value::Number(0.0);
        }

        if let Some(value) = parse_literal(expression) {
            return value;
        }

        let substituted = substitute_variables(expression, ctx, diagnostics);

        let resolved = match self.resolve_calls(&substituted, ctx, diagnostics, depth) {
            Ok(text) => text,
            Err(e) => {
                diagnostics.push(e);
                return Value::Number(0.0);
            }
        };

        let resolved = resolved.trim();
        if let Some(value) = parse_literal(resolved) {
            return value;
        }

        if resolved.chars().all(is_arithmetic_char) {
            evaluate_arithmetic(resolved, self.max_nesting_depth, diagnostics)
        } else {
            self.evaluate_fallback(resolved, ctx, diagnostics, depth)
        }
    }

    /// Replace `name(args)` groups until no call is left.
    ///
    /// Arguments may hold one level of plain parentheses, which is how
    /// negative results come back (`(-3)`); calls nested deeper inside an
    /// argument resolve when that argument is evaluated.
    fn resolve_calls(
        &self,
        text: &str,
        ctx: &DataContext,
        diagnostics: &mut Diagnostics,
        depth: usize,
    ) -> FormulaResult<String> {
        let call = regex!(r"(\w+)\(((?:[^()]|\([^()]*\))*)\)");
        let mut expression = text.to_string();
        let mut rewrites = 0;

        while expression.contains('(') {
            let (range, name, args) = match call.captures(&expression) {
                Some(caps) => match (caps.get(0), caps.get(1), caps.get(2)) {
                    (Some(whole), Some(name), Some(args)) => (
                        whole.range(),
                        name.as_str().to_string(),
                        args.as_str().to_string(),
                    ),
                    _ => break,
                },
                None => break,
            };

            rewrites += 1;
            if rewrites > self.max_call_rewrites {
                return Err(FormulaError::CallDepthExceeded(self.max_call_rewrites));
            }

            let result = self.evaluate_function(&name, &args, ctx, diagnostics, depth);
            expression.replace_range(range, &result.to_literal());
        }

        Ok(expression)
    }

    /// Evaluate a function call
    fn evaluate_function(
        &self,
        name: &str,
        args_text: &str,
        ctx: &DataContext,
        diagnostics: &mut Diagnostics,
        depth: usize,
    ) -> Value {
        let func = match self.registry.get(name) {
            Some(func) => func,
            None => {
                diagnostics.push(FormulaError::UnknownFunction(name.to_string()));
                return Value::Number(0.0);
            }
        };

        let raw_args = split_arguments(args_text);

        // Check argument count
        let too_many = func.max_args.is_some_and(|max| raw_args.len() > max);
        if raw_args.len() < func.min_args || too_many {
            let expected = match func.max_args {
                Some(max) if max == func.min_args => format!("{}", max),
                Some(max) => format!("{} to {}", func.min_args, max),
                None => format!("at least {}", func.min_args),
            };
            diagnostics.push(FormulaError::ArgumentCount {
                function: name.to_string(),
                expected,
                actual: raw_args.len(),
            });
            return Value::Number(0.0);
        }

        // Evaluate arguments
        let args: Vec<Value> = raw_args
            .iter()
            .map(|arg| self.evaluate_argument(arg, ctx, diagnostics, depth + 1))
            .collect();

        // Call the function
        let call_ctx = CallContext { clock: self.clock };
        match (func.implementation)(&args, &call_ctx) {
            Ok(Value::Number(n)) if !n.is_finite() => {
                diagnostics.push(FormulaError::Evaluation(format!(
                    "{}() produced a non-numeric result",
                    name
                )));
                Value::Number(0.0)
            }
            Ok(value) => value,
            Err(e) => {
                diagnostics.push(FormulaError::Evaluation(format!("{}() failed: {}", name, e)));
                Value::Number(0.0)
            }
        }
    }

    /// A bare `{d.name}` argument left in place by substitution carries the
    /// context value itself; anything else is a nested expression.
    fn evaluate_argument(
        &self,
        text: &str,
        ctx: &DataContext,
        diagnostics: &mut Diagnostics,
        depth: usize,
    ) -> Value {
        if let Some((_, name)) = regex_captures!(r"^\{d\.([^}]+)\}$", text) {
            return ctx.get(name).cloned().unwrap_or_default();
        }
        self.evaluate_expression(text, ctx, diagnostics, depth)
    }

    /// Logical and comparison evaluation for text that is not pure arithmetic
    fn evaluate_fallback(
        &self,
        text: &str,
        ctx: &DataContext,
        diagnostics: &mut Diagnostics,
        depth: usize,
    ) -> Value {
        let depth = depth + 1;

        if find_outside_quotes(text, "||").is_some() {
            let any = split_outside_quotes(text, "||")
                .into_iter()
                .any(|part| self.evaluate_expression(part, ctx, diagnostics, depth).is_truthy());
            return Value::Boolean(any);
        }

        if find_outside_quotes(text, "&&").is_some() {
            let all = split_outside_quotes(text, "&&")
                .into_iter()
                .all(|part| self.evaluate_expression(part, ctx, diagnostics, depth).is_truthy());
            return Value::Boolean(all);
        }

        for op in COMPARISON_OPERATORS {
            if let Some(at) = find_outside_quotes(text, op) {
                let left = self.evaluate_expression(&text[..at], ctx, diagnostics, depth);
                let rest = &text[at + op.len()..];
                let right = self.evaluate_expression(rest, ctx, diagnostics, depth);
                return Value::Boolean(compare(op, &left, &right));
            }
        }

        diagnostics.push(FormulaError::Evaluation(format!(
            "unrecognized expression '{}'",
            text
        )));
        Value::Number(0.0)
    }
}

/// Evaluate a formula against a data context
pub fn evaluate(
    formula: &str,
    ctx: &DataContext,
    registry: &FunctionRegistry,
    clock: &dyn Clock,
) -> Value {
    evaluate_with_diagnostics(formula, ctx, registry, clock).0
}

/// Evaluate a formula, also returning everything that was absorbed on the way
pub fn evaluate_with_diagnostics(
    formula: &str,
    ctx: &DataContext,
    registry: &FunctionRegistry,
    clock: &dyn Clock,
) -> (Value, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let value = Evaluator::new(registry, clock).evaluate(formula, ctx, &mut diagnostics);
    (value, diagnostics)
}

fn compare(op: &str, left: &Value, right: &Value) -> bool {
    let (l, r) = (left.to_number(), right.to_number());
    match op {
        ">=" => l >= r,
        "<=" => l <= r,
        ">" => l > r,
        "<" => l < r,
        "==" => left.loose_eq(right),
        _ => !left.loose_eq(right),
    }
}

/// Literal text: a single quoted string, plain signed decimal, `true` or `false`
fn parse_literal(text: &str) -> Option<Value> {
    if let Some((_, inner)) = regex_captures!(r#"^"([^"]*)"$"#, text) {
        return Some(Value::Text(inner.to_string()));
    }
    if let Some((_, inner)) = regex_captures!(r"^'([^']*)'$", text) {
        return Some(Value::Text(inner.to_string()));
    }

    if regex_is_match!(r"^-?\d+(\.\d+)?$", text) {
        return text.parse().ok().map(Value::Number);
    }

    match text {
        "true" => Some(Value::Boolean(true)),
        "false" => Some(Value::Boolean(false)),
        _ => None,
    }
}

/// Replace every `{d.name}` token with its substitution text.
///
/// A token that is a whole function argument and holds a list or a date keeps
/// its place so the function receives the typed value.
fn substitute_variables(
    expression: &str,
    ctx: &DataContext,
    diagnostics: &mut Diagnostics,
) -> String {
    regex!(r"\{d\.([^}]+)\}")
        .replace_all(expression, |caps: &Captures| {
            let name = &caps[1];
            let value = ctx.get(name);
            if value.is_none() {
                diagnostics.push(FormulaError::UnresolvedVariable(name.to_string()));
            }

            let typed = value.is_some_and(|v| matches!(v, Value::List(_)) || v.is_date_like());
            let whole_argument = caps
                .get(0)
                .is_some_and(|m| is_call_argument(expression, m.start(), m.end()));

            if typed && whole_argument {
                caps[0].to_string()
            } else {
                substitution_text(value)
            }
        })
        .into_owned()
}

/// Whether `text[start..end]` is an entire argument of a function call
fn is_call_argument(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].trim_end();
    let after = text[end..].trim_start();

    (before.ends_with('(') || before.ends_with(','))
        && (after.starts_with(',') || after.starts_with(')'))
        && innermost_paren_is_call(before)
}

fn innermost_paren_is_call(prefix: &str) -> bool {
    let mut stack = Vec::new();
    let mut quote: Option<char> = None;
    let mut prev: Option<char> = None;

    for c in prefix.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '(' => stack.push(prev.is_some_and(is_word_char)),
                ')' => {
                    stack.pop();
                }
                _ => {}
            },
        }
        prev = Some(c);
    }

    stack.last().copied().unwrap_or(false)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Split call arguments on top-level commas.
///
/// Commas inside nested parentheses or quoted strings do not split. A blank
/// trailing argument is dropped; blank arguments elsewhere are kept.
fn split_arguments(args: &str) -> Vec<&str> {
    if args.trim().is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in args.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '(' => depth += 1,
                ')' => depth -= 1,
                ',' if depth == 0 => {
                    parts.push(args[start..i].trim());
                    start = i + 1;
                }
                _ => {}
            },
        }
    }

    let last = args[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

/// Byte offset of the first `pattern` outside quoted strings
fn find_outside_quotes(text: &str, pattern: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if text[i..].starts_with(pattern) => return Some(i),
            None => {}
        }
    }
    None
}

fn split_outside_quotes<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    let mut parts = Vec::new();
    let mut rest = text;
    while let Some(at) = find_outside_quotes(rest, separator) {
        parts.push(&rest[..at]);
        rest = &rest[at + separator.len()..];
    }
    parts.push(rest);
    parts
}

fn is_arithmetic_char(c: char) -> bool {
    c.is_ascii_digit() || "+-*/.()<>=!&|eE".contains(c) || c.is_whitespace()
}

/// Insert `0` between adjacent operators (`5*-3` → `5*0-3`) until none remain
fn repair_adjacent_operators(text: &str) -> String {
    let adjacent = regex!(r"([+\-*/])\s*([+\-*/])");
    let mut repaired = text.to_string();
    while adjacent.is_match(&repaired) {
        repaired = adjacent.replace_all(&repaired, "${1}0${2}").into_owned();
    }
    repaired
}

/// Parse and walk pure arithmetic text. Parse failures and non-finite
/// results become `0`.
fn evaluate_arithmetic(text: &str, max_depth: usize, diagnostics: &mut Diagnostics) -> Value {
    let repaired = repair_adjacent_operators(text);
    let ast = match parse_arithmetic_with_depth(&repaired, max_depth) {
        Ok(ast) => ast,
        Err(e) => {
            diagnostics.push(e);
            return Value::Number(0.0);
        }
    };

    match evaluate_ast(&ast) {
        Value::Number(n) if !n.is_finite() => {
            diagnostics.push(FormulaError::Evaluation(format!(
                "'{}' has no finite value",
                text
            )));
            Value::Number(0.0)
        }
        value => value,
    }
}

/// Evaluate an arithmetic AST
pub fn evaluate_ast(expr: &FormulaExpr) -> Value {
    match expr {
        FormulaExpr::Number(n) => Value::Number(*n),

        FormulaExpr::UnaryOp { op, operand } => {
            let value = evaluate_ast(operand);
            match op {
                UnaryOperator::Negate => Value::Number(-value.to_number()),
                UnaryOperator::Plus => Value::Number(value.to_number()),
                UnaryOperator::Not => Value::Boolean(!value.is_truthy()),
            }
        }

        // Logical operators short-circuit and yield an operand
        FormulaExpr::BinaryOp {
            op: BinaryOperator::And,
            left,
            right,
        } => {
            let left = evaluate_ast(left);
            if left.is_truthy() {
                evaluate_ast(right)
            } else {
                left
            }
        }
        FormulaExpr::BinaryOp {
            op: BinaryOperator::Or,
            left,
            right,
        } => {
            let left = evaluate_ast(left);
            if left.is_truthy() {
                left
            } else {
                evaluate_ast(right)
            }
        }

        FormulaExpr::BinaryOp { op, left, right } => {
            evaluate_binary_op(*op, &evaluate_ast(left), &evaluate_ast(right))
        }
    }
}

/// Evaluate a binary operation over evaluated operands
fn evaluate_binary_op(op: BinaryOperator, left: &Value, right: &Value) -> Value {
    let (l, r) = (left.to_number(), right.to_number());
    match op {
        BinaryOperator::Add => Value::Number(l + r),
        BinaryOperator::Subtract => Value::Number(l - r),
        BinaryOperator::Multiply => Value::Number(l * r),
        BinaryOperator::Divide => Value::Number(l / r),

        BinaryOperator::Equal => Value::Boolean(l == r),
        BinaryOperator::NotEqual => Value::Boolean(l != r),
        BinaryOperator::LessThan => Value::Boolean(l < r),
        BinaryOperator::LessEqual => Value::Boolean(l <= r),
        BinaryOperator::GreaterThan => Value::Boolean(l > r),
        BinaryOperator::GreaterEqual => Value::Boolean(l >= r),

        BinaryOperator::And => {
            if left.is_truthy() {
                right.clone()
            } else {
                left.clone()
            }
        }
        BinaryOperator::Or => {
            if left.is_truthy() {
                left.clone()
            } else {
                right.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn eval_with(formula: &str, ctx: &DataContext) -> (Value, Diagnostics) {
        let registry = FunctionRegistry::new();
        let clock = FixedClock(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());
        let evaluator = Evaluator::new(&registry, &clock);
        let mut diagnostics = Diagnostics::new();
        let value = evaluator.evaluate(formula, ctx, &mut diagnostics);
        (value, diagnostics)
    }

    fn eval(formula: &str) -> Value {
        eval_with(formula, &DataContext::new()).0
    }

    #[test]
    fn test_evaluate_literals() {
        assert_eq!(eval("  \"Hello, world\" "), Value::from("Hello, world"));
        assert_eq!(eval("'single'"), Value::from("single"));
        assert_eq!(eval("42"), Value::from(42.0));
        assert_eq!(eval("-3.5"), Value::from(-3.5));
        assert_eq!(eval("true"), Value::from(true));
        assert_eq!(eval("false"), Value::from(false));
        assert_eq!(eval(""), Value::from(""));
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("2+3*4"), Value::from(14.0));
        assert_eq!(eval("(2+3)*4"), Value::from(20.0));
        assert_eq!(eval("10 / 4"), Value::from(2.5));
        assert_eq!(eval("-5 + 2"), Value::from(-3.0));
        assert_eq!(eval("10/0"), Value::from(0.0));
        assert_eq!(eval("0/0"), Value::from(0.0));
    }

    #[test]
    fn test_evaluate_comparison_in_arithmetic_path() {
        assert_eq!(eval("45>40"), Value::from(true));
        assert_eq!(eval("2 >= 3"), Value::from(false));
        assert_eq!(eval("1 == 1 && 2 != 3"), Value::from(true));
        assert_eq!(eval("0 || 7"), Value::from(7.0));
        assert_eq!(eval("!0"), Value::from(true));
    }

    #[test]
    fn test_adjacent_operator_repair() {
        assert_eq!(repair_adjacent_operators("5*-3"), "5*0-3");
        assert_eq!(repair_adjacent_operators("1+--2"), "1+0-0-2");
        assert_eq!(repair_adjacent_operators("1 + 2"), "1 + 2");
        assert_eq!(eval("5*-3"), Value::from(-3.0));
    }

    #[test]
    fn test_variable_substitution() {
        let ctx = DataContext::new().with("hourlyRate", 25).with("unpaidHours", 300);
        let (value, diagnostics) = eval_with("{d.unpaidHours}*{d.hourlyRate}", &ctx);
        assert_eq!(value, Value::from(7500.0));
        assert!(diagnostics.is_empty());

        let ctx = DataContext::new().with("rate", " 12.5 ").with("flag", true);
        assert_eq!(eval_with("{d.rate}*2+{d.flag}", &ctx).0, Value::from(26.0));
    }

    #[test]
    fn test_missing_variable_is_zero_and_reported() {
        let (value, diagnostics) = eval_with("{d.missing}+1", &DataContext::new());
        assert_eq!(value, Value::from(1.0));
        assert_eq!(
            diagnostics.first(),
            Some(&FormulaError::UnresolvedVariable("missing".into()))
        );
    }

    #[test]
    fn test_function_returning_text() {
        let ctx = DataContext::new().with("weeklyHours", 45);
        assert_eq!(
            eval_with("if({d.weeklyHours}>40,\"Unpaid\",\"N/A\")", &ctx).0,
            Value::from("Unpaid")
        );
        let ctx = DataContext::new().with("weeklyHours", 38);
        assert_eq!(
            eval_with("if({d.weeklyHours}>40,\"Unpaid\",\"N/A\")", &ctx).0,
            Value::from("N/A")
        );
    }

    #[test]
    fn test_nested_functions() {
        assert_eq!(eval("round(max(1.234, 2.345) * 2, 1)"), Value::from(4.7));
        assert_eq!(eval("sum(1, 2, 3) * 2"), Value::from(12.0));
        assert_eq!(eval("2*(max(1,2)+1)"), Value::from(6.0));
        assert_eq!(
            eval("formatDate(dateAdd(\"2024-01-31\", 1, \"months\"), \"legal\")"),
            Value::from("March 2, 2024")
        );
        assert_eq!(eval("concat(\"Total: \", sum(2, 3))"), Value::from("Total: 5"));
        assert_eq!(eval("5-min(-3, 0)"), Value::from(8.0));
        assert_eq!(eval("abs(min(-3, 0))"), Value::from(3.0));
        assert_eq!(eval("min(-3, 0)"), Value::from(-3.0));
    }

    #[test]
    fn test_argument_splitting() {
        assert_eq!(split_arguments(""), Vec::<&str>::new());
        assert_eq!(split_arguments("1, 2"), vec!["1", "2"]);
        assert_eq!(split_arguments("\"a,b\", 'c,d'"), vec!["\"a,b\"", "'c,d'"]);
        assert_eq!(split_arguments("f(1,2), 3"), vec!["f(1,2)", "3"]);
        assert_eq!(split_arguments("1,,2"), vec!["1", "", "2"]);
        assert_eq!(split_arguments("1,"), vec!["1"]);
    }

    #[test]
    fn test_date_functions_with_literals() {
        assert_eq!(
            eval("dateDiff(\"2024-01-01\",\"2024-01-10\",\"days\")"),
            Value::from(9.0)
        );
        assert_eq!(
            eval("monthsBetween(\"2024-01-31\",\"2024-03-01\")"),
            Value::from(2.0)
        );
        assert_eq!(eval("today()"), Value::from("2025-06-15"));
    }

    #[test]
    fn test_typed_arguments_from_context() {
        let ctx = DataContext::new()
            .with("plaintiffs", vec!["Ann", "", "Bo"])
            .with("filed", "2025-06-15")
            .with("hired", "2022-01-10");
        assert_eq!(eval_with("count({d.plaintiffs})", &ctx).0, Value::from(2.0));
        assert_eq!(eval_with("{d.plaintiffs}", &ctx).0, Value::from(3.0));
        assert_eq!(
            eval_with("formatDate({d.filed})", &ctx).0,
            Value::from("June 15, 2025")
        );
        assert_eq!(
            eval_with("yearsBetween({d.hired}, {d.filed})", &ctx).0,
            Value::from(3.0)
        );
        assert_eq!(
            eval_with("pluralize(count({d.plaintiffs}), \"Plaintiff\", \"Plaintiffs\")", &ctx).0,
            Value::from("Plaintiffs")
        );
        // not a whole argument: numeric substitution applies
        assert_eq!(eval_with("sum({d.plaintiffs}+1)", &ctx).0, Value::from(4.0));
    }

    #[test]
    fn test_list_arguments_count_their_entries() {
        let ctx = DataContext::new()
            .with("names", vec!["Ann", "Bo"])
            .with("none", Vec::<String>::new());
        assert_eq!(eval_with("sum({d.names}, 1)", &ctx).0, Value::from(3.0));
        assert_eq!(eval_with("max({d.names}, 1)", &ctx).0, Value::from(2.0));
        assert_eq!(eval_with("{d.names}+1", &ctx).0, Value::from(3.0));
        assert_eq!(
            eval_with("pluralize({d.names}, \"Plaintiff\", \"Plaintiffs\")", &ctx).0,
            Value::from("Plaintiffs")
        );
        assert_eq!(eval_with("if({d.none}, \"y\", \"n\")", &ctx).0, Value::from("n"));
        assert_eq!(eval_with("if({d.names}, \"y\", \"n\")", &ctx).0, Value::from("y"));
    }

    #[test]
    fn test_numeric_text_keeps_its_spelling() {
        let ctx = DataContext::new().with("big", "1e3").with("rate", " 1.50 ");
        assert_eq!(eval_with("{d.big}+1", &ctx).0, Value::from(1001.0));
        assert_eq!(eval_with("{d.rate}*2", &ctx).0, Value::from(3.0));
        assert_eq!(eval_with("{d.big}", &ctx).0, Value::from(1000.0));
    }

    #[test]
    fn test_deep_nesting_is_zero() {
        let too_deep = |diagnostics: &Diagnostics| {
            diagnostics
                .iter()
                .any(|e| *e == FormulaError::NestingTooDeep(DEFAULT_MAX_NESTING_DEPTH))
        };

        for formula in [
            format!("{}0", "!".repeat(10_000)),
            format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000)),
        ] {
            let (value, diagnostics) = eval_with(&formula, &DataContext::new());
            assert_eq!(value, Value::from(0.0));
            assert!(too_deep(&diagnostics));
        }

        // the innermost comparison gives up; the ones around it still compare
        let chain = vec!["\"a\""; 10_000].join("==");
        let (value, diagnostics) = eval_with(&chain, &DataContext::new());
        assert_eq!(value, Value::from(false));
        assert!(too_deep(&diagnostics));
    }

    #[test]
    fn test_nesting_bound_is_configurable() {
        let registry = FunctionRegistry::new();
        let clock = FixedClock(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());
        let evaluator = Evaluator::new(&registry, &clock).with_max_nesting_depth(2);

        let mut diagnostics = Diagnostics::new();
        let value = evaluator.evaluate("((1+2))", &DataContext::new(), &mut diagnostics);
        assert_eq!(value, Value::from(3.0));
        assert!(diagnostics.is_empty());

        let value = evaluator.evaluate("(((1+2)))", &DataContext::new(), &mut diagnostics);
        assert_eq!(value, Value::from(0.0));
        assert_eq!(diagnostics.first(), Some(&FormulaError::NestingTooDeep(2)));
    }

    #[test]
    fn test_call_argument_detection() {
        let text = "f({d.a}, g({d.b}), ({d.c}), {d.d}+1)";
        let at = |token: &str| {
            let start = text.find(token).unwrap();
            is_call_argument(text, start, start + token.len())
        };
        assert!(at("{d.a}"));
        assert!(at("{d.b}"));
        assert!(!at("{d.c}"));
        assert!(!at("{d.d}"));
    }

    #[test]
    fn test_fallback_comparisons() {
        assert_eq!(eval("\"abc\" == \"abc\""), Value::from(true));
        assert_eq!(eval("\"abc\" != \"abd\""), Value::from(true));
        assert_eq!(eval("\"10\" == 10"), Value::from(true));
        assert_eq!(eval("\"a\" == \"a\" && \"b\" == \"c\""), Value::from(false));
        assert_eq!(eval("\"a\" == \"b\" || \"b\" == \"b\""), Value::from(true));
        assert_eq!(eval("\"a>b\" == \"a>b\""), Value::from(true));
    }

    #[test]
    fn test_unknown_function_is_zero() {
        let (value, diagnostics) = eval_with("nope(1) + 2", &DataContext::new());
        assert_eq!(value, Value::from(2.0));
        assert_eq!(
            diagnostics.first(),
            Some(&FormulaError::UnknownFunction("nope".into()))
        );
    }

    #[test]
    fn test_argument_count_is_checked() {
        let (value, diagnostics) = eval_with("abs(1, 2)", &DataContext::new());
        assert_eq!(value, Value::from(0.0));
        assert!(matches!(
            diagnostics.first(),
            Some(FormulaError::ArgumentCount { actual: 2, .. })
        ));
    }

    #[test]
    fn test_malformed_formulas_do_not_panic() {
        let formulas = [
            "(1+2", "1+2)", "sum(1,", "))((", "{d.", "\"", "1 = 2", "hello world", "max()",
        ];
        for formula in formulas {
            let value = eval(formula);
            assert!(
                matches!(value, Value::Number(_) | Value::Text(_) | Value::Boolean(_)),
                "{formula}: {value:?}"
            );
        }
        assert_eq!(eval("(1+2"), Value::from(0.0));
        assert_eq!(eval("hello world"), Value::from(0.0));
    }

    #[test]
    fn test_call_rewrite_bound() {
        let registry = FunctionRegistry::new();
        let clock = FixedClock(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());
        let evaluator = Evaluator::new(&registry, &clock).with_max_call_rewrites(1);
        let mut diagnostics = Diagnostics::new();
        let value = evaluator.evaluate("abs(abs(abs(-1)))", &DataContext::new(), &mut diagnostics);
        assert_eq!(value, Value::from(0.0));
        assert_eq!(diagnostics.first(), Some(&FormulaError::CallDepthExceeded(1)));
    }
}
