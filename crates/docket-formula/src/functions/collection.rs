//! Collection functions

use super::{arg, CallContext};
use crate::error::{FormulaError, FormulaResult};
use crate::value::Value;

/// Upper bound for `generateCauseNumbers`
const MAX_CAUSES: f64 = 1000.0;

fn is_blank(item: &str) -> bool {
    item.trim().is_empty()
}

/// count(list) - number of non-blank entries; `0` for anything but a list
pub fn fn_count(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    let count = match arg(args, 0) {
        Value::List(items) => items.iter().filter(|item| !is_blank(item)).count(),
        _ => 0,
    };
    Ok(Value::Number(count as f64))
}

/// generateCauseNumbers(n) - `C-1, C-2, ..., C-n`
pub fn fn_generate_cause_numbers(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    let n = arg(args, 0).to_number().trunc();
    if !(n >= 1.0) {
        return Ok(Value::Text(String::new()));
    }
    if n > MAX_CAUSES {
        return Err(FormulaError::Argument(format!(
            "generateCauseNumbers supports at most {MAX_CAUSES} causes, got {n}"
        )));
    }

    let numbers: Vec<String> = (1..=n as u32).map(|i| format!("C-{i}")).collect();
    Ok(Value::Text(numbers.join(", ")))
}

fn is_empty_value(v: &Value) -> bool {
    match v {
        Value::List(items) => items.iter().all(|item| is_blank(item)),
        other => !other.is_truthy(),
    }
}

/// isEmpty(value) - falsy, or a list whose entries are all blank
pub fn fn_is_empty(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    Ok(Value::Boolean(is_empty_value(arg(args, 0))))
}

/// isNotEmpty(value)
pub fn fn_is_not_empty(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    Ok(Value::Boolean(!is_empty_value(arg(args, 0))))
}
