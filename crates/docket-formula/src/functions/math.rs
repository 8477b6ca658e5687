//! Math and aggregate functions
//!
//! Blank arguments count as zero; text that is not a number poisons the
//! result with NaN, which the evaluator turns into `0`.

use super::{arg, loose_number, CallContext};
use crate::error::FormulaResult;
use crate::value::Value;

/// sum(values...)
pub fn fn_sum(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    Ok(Value::Number(args.iter().map(loose_number).sum()))
}

/// max(values...)
pub fn fn_max(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    Ok(Value::Number(fold_extreme(args, f64::NEG_INFINITY, f64::max)))
}

/// min(values...)
pub fn fn_min(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    Ok(Value::Number(fold_extreme(args, f64::INFINITY, f64::min)))
}

fn fold_extreme(args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    args.iter().map(loose_number).fold(init, |acc, n| {
        if acc.is_nan() || n.is_nan() {
            f64::NAN
        } else {
            pick(acc, n)
        }
    })
}

/// round(value, [decimals])
pub fn fn_round(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    let value = loose_number(arg(args, 0));
    let decimals = match args.get(1) {
        Some(d) => d.to_number(),
        None => 0.0,
    };
    let factor = 10f64.powf(decimals);
    Ok(Value::Number(round_half_up(value * factor) / factor))
}

/// Round to the nearest integer, halves toward positive infinity
pub(crate) fn round_half_up(x: f64) -> f64 {
    let rounded = x.round();
    if x < 0.0 && (x - x.trunc()).abs() == 0.5 {
        rounded + 1.0
    } else {
        rounded
    }
}

/// ceil(value)
pub fn fn_ceil(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    Ok(Value::Number(loose_number(arg(args, 0)).ceil()))
}

/// floor(value)
pub fn fn_floor(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    Ok(Value::Number(loose_number(arg(args, 0)).floor()))
}

/// abs(value)
pub fn fn_abs(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    Ok(Value::Number(loose_number(arg(args, 0)).abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;

    fn call(f: crate::functions::FunctionImpl, args: &[Value]) -> f64 {
        let ctx = CallContext { clock: &SystemClock };
        match f(args, &ctx).unwrap() {
            Value::Number(n) => n,
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn test_sum() {
        assert_eq!(call(fn_sum, &[1.0.into(), "2".into(), Value::Empty, true.into()]), 4.0);
        assert_eq!(call(fn_sum, &[]), 0.0);
        assert!(call(fn_sum, &["abc".into()]).is_nan());
    }

    #[test]
    fn test_min_max() {
        let args: [Value; 3] = [3.0.into(), "7".into(), (-1.0).into()];
        assert_eq!(call(fn_max, &args), 7.0);
        assert_eq!(call(fn_min, &args), -1.0);
        assert_eq!(call(fn_max, &[]), f64::NEG_INFINITY);
        assert!(call(fn_max, &[1.0.into(), "x".into()]).is_nan());
    }

    #[test]
    fn test_round() {
        assert_eq!(call(fn_round, &[2.5.into()]), 3.0);
        assert_eq!(call(fn_round, &[(-2.5).into()]), -2.0);
        assert_eq!(call(fn_round, &[1234.5678.into(), 2.0.into()]), 1234.57);
        assert_eq!(call(fn_round, &[1250.0.into(), (-2.0).into()]), 1300.0);
    }

    #[test]
    fn test_ceil_floor_abs() {
        assert_eq!(call(fn_ceil, &[1.2.into()]), 2.0);
        assert_eq!(call(fn_floor, &[1.8.into()]), 1.0);
        assert_eq!(call(fn_abs, &[(-4.0).into()]), 4.0);
        assert_eq!(call(fn_abs, &[Value::Empty]), 0.0);
    }
}
