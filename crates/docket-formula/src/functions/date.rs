//! Date functions
//!
//! Thin wrappers over [`crate::date`]. A blank or unparsable date yields `0`
//! for differences and `""` for anything producing a date.

use super::{arg, CallContext};
use crate::date::{self as cal, DateStyle, DateUnit};
use crate::error::{FormulaError, FormulaResult};
use crate::value::Value;
use chrono::{NaiveDateTime, NaiveTime};

/// Date-time carried by an argument: date-like text, or epoch milliseconds
fn to_date(v: &Value) -> Option<NaiveDateTime> {
    if !v.is_truthy() {
        return None;
    }
    match v {
        Value::Text(s) => cal::parse_date(s),
        Value::Number(ms) => cal::from_epoch_millis(*ms),
        _ => None,
    }
}

fn unit_or_days(v: &Value) -> DateUnit {
    match v {
        Value::Text(s) => DateUnit::parse(s).unwrap_or(DateUnit::Days),
        _ => DateUnit::Days,
    }
}

fn diff(args: &[Value], unit: DateUnit) -> Value {
    match (to_date(arg(args, 0)), to_date(arg(args, 1))) {
        (Some(a), Some(b)) => Value::Number(cal::date_diff(a, b, unit) as f64),
        _ => Value::Number(0.0),
    }
}

fn shift(args: &[Value], sign: f64) -> FormulaResult<Value> {
    let date = match to_date(arg(args, 0)) {
        Some(date) => date,
        None => return Ok(Value::Text(String::new())),
    };

    let amount = arg(args, 1).to_number_or_zero() * sign;
    if !amount.is_finite() {
        return Err(FormulaError::Argument(format!("date offset {amount} is not finite")));
    }

    let shifted = match arg(args, 2) {
        Value::Empty => cal::date_add(date, amount.trunc() as i64, DateUnit::Days),
        Value::Text(s) => match DateUnit::parse(s) {
            Some(unit) => cal::date_add(date, amount.trunc() as i64, unit),
            None => Some(date),
        },
        _ => Some(date),
    };

    shifted
        .map(|d| Value::Text(cal::iso_date(d)))
        .ok_or_else(|| FormulaError::Argument(format!("date offset {amount} out of range")))
}

/// dateDiff(date1, date2, [unit])
pub fn fn_date_diff(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    Ok(diff(args, unit_or_days(arg(args, 2))))
}

/// dateAdd(date, amount, [unit])
pub fn fn_date_add(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    shift(args, 1.0)
}

/// dateSubtract(date, amount, [unit])
pub fn fn_date_subtract(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    shift(args, -1.0)
}

/// weeksBetween(date1, date2)
pub fn fn_weeks_between(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    Ok(diff(args, DateUnit::Weeks))
}

/// monthsBetween(date1, date2)
pub fn fn_months_between(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    Ok(diff(args, DateUnit::Months))
}

/// yearsBetween(date1, date2)
pub fn fn_years_between(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    Ok(diff(args, DateUnit::Years))
}

/// today()
pub fn fn_today(_args: &[Value], ctx: &CallContext) -> FormulaResult<Value> {
    let today = ctx.clock.today().and_time(NaiveTime::MIN);
    Ok(Value::Text(cal::iso_date(today)))
}

/// formatDate(date, [style])
pub fn fn_format_date(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    let style = match arg(args, 1) {
        Value::Text(s) => DateStyle::parse(s),
        _ => DateStyle::Legal,
    };
    Ok(Value::Text(
        to_date(arg(args, 0))
            .map(|d| cal::format_date(d, style))
            .unwrap_or_default(),
    ))
}
