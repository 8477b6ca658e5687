//! Conditional functions

use super::{arg, CallContext};
use crate::error::FormulaResult;
use crate::value::Value;

/// if(condition, when_true, [when_false])
pub fn fn_if(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    if arg(args, 0).is_truthy() {
        Ok(arg(args, 1).clone())
    } else {
        Ok(arg(args, 2).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;

    #[test]
    fn test_if() {
        let ctx = CallContext { clock: &SystemClock };
        let pick = |cond: Value| fn_if(&[cond, "yes".into(), "no".into()], &ctx).unwrap();
        assert_eq!(pick(true.into()), Value::from("yes"));
        assert_eq!(pick(0.0.into()), Value::from("no"));
        assert_eq!(pick("".into()), Value::from("no"));
        assert_eq!(pick("x".into()), Value::from("yes"));
        assert_eq!(fn_if(&[false.into(), 1.0.into()], &ctx).unwrap(), Value::Empty);
    }
}
