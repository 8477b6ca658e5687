//! Text functions

use super::{arg, CallContext};
use crate::error::{FormulaError, FormulaResult};
use crate::value::{format_number, Value};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

const ONES: [&str; 20] = [
    "", "ONE", "TWO", "THREE", "FOUR", "FIVE", "SIX", "SEVEN", "EIGHT", "NINE", "TEN", "ELEVEN",
    "TWELVE", "THIRTEEN", "FOURTEEN", "FIFTEEN", "SIXTEEN", "SEVENTEEN", "EIGHTEEN", "NINETEEN",
];

const TENS: [&str; 10] = [
    "", "", "TWENTY", "THIRTY", "FORTY", "FIFTY", "SIXTY", "SEVENTY", "EIGHTY", "NINETY",
];

const SCALES: [&str; 5] = ["", "THOUSAND", "MILLION", "BILLION", "TRILLION"];

const CAUSE_ORDINALS: [&str; 8] = [
    "FIRST", "SECOND", "THIRD", "FOURTH", "FIFTH", "SIXTH", "SEVENTH", "EIGHTH",
];

/// concat(values...) - empty arguments are skipped
pub fn fn_concat(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    Ok(Value::Text(
        args.iter()
            .filter(|v| !v.is_empty())
            .map(Value::to_display_text)
            .collect(),
    ))
}

/// pluralize(count, singular, plural)
pub fn fn_pluralize(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    if arg(args, 0).to_number() > 1.0 {
        Ok(arg(args, 2).clone())
    } else {
        Ok(arg(args, 1).clone())
    }
}

/// amountToWords(amount) - `1234.5` → `ONE THOUSAND TWO HUNDRED THIRTY-FOUR AND FIFTY CENTS`
///
/// Cents are truncated, not rounded. A zero or blank amount gives `""`.
pub fn fn_amount_to_words(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    let amount = arg(args, 0);
    if !amount.is_truthy() {
        return Ok(Value::Text(String::new()));
    }

    let text = match amount {
        Value::Number(n) => format_number(*n),
        Value::Text(s) => s.trim().to_string(),
        _ => return Ok(Value::Text(String::new())),
    };
    let decimal = match Decimal::from_str(&text) {
        Ok(d) => d.abs(),
        Err(_) => return Ok(Value::Text(String::new())),
    };
    if decimal.is_zero() {
        return Ok(Value::Text(String::new()));
    }

    let whole = decimal
        .trunc()
        .to_u64()
        .ok_or_else(|| FormulaError::Argument(format!("amount {text} too large")))?;
    if whole == 0 {
        return Ok(Value::Text("ZERO".to_string()));
    }

    let mut words = whole_to_words(whole)?;
    let cents = ((decimal - decimal.trunc()) * Decimal::ONE_HUNDRED)
        .trunc()
        .to_u64()
        .unwrap_or(0);
    if cents > 0 {
        words.push_str(" AND ");
        words.push_str(&hundreds_to_words(cents));
        words.push_str(" CENTS");
    }
    Ok(Value::Text(words))
}

fn whole_to_words(mut whole: u64) -> FormulaResult<String> {
    let mut chunks = Vec::new();
    let mut scale = 0;
    while whole > 0 {
        let chunk = whole % 1000;
        if chunk != 0 {
            let name = SCALES.get(scale).ok_or_else(|| {
                FormulaError::Argument("amount beyond trillions".to_string())
            })?;
            let mut words = hundreds_to_words(chunk);
            if !name.is_empty() {
                words.push(' ');
                words.push_str(name);
            }
            chunks.push(words);
        }
        whole /= 1000;
        scale += 1;
    }
    chunks.reverse();
    Ok(chunks.join(" "))
}

/// Words for 1..=999
fn hundreds_to_words(mut n: u64) -> String {
    let mut result = String::new();

    if n >= 100 {
        result.push_str(ONES[(n / 100) as usize]);
        result.push_str(" HUNDRED");
        n %= 100;
        if n > 0 {
            result.push(' ');
        }
    }

    if n >= 20 {
        result.push_str(TENS[(n / 10) as usize]);
        n %= 10;
        if n > 0 {
            result.push('-');
            result.push_str(ONES[n as usize]);
        }
    } else if n > 0 {
        result.push_str(ONES[n as usize]);
    }

    result
}

/// causeOrdinal(index) - 0 → `FIRST`, 1 → `SECOND`, ...; out of range → `FIRST`
pub fn fn_cause_ordinal(args: &[Value], _ctx: &CallContext) -> FormulaResult<Value> {
    let index = arg(args, 0).to_number();
    let ordinal = if index.fract() == 0.0 && index >= 0.0 {
        CAUSE_ORDINALS.get(index as usize).copied()
    } else {
        None
    };
    Ok(Value::Text(ordinal.unwrap_or(CAUSE_ORDINALS[0]).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::functions::FunctionImpl;
    use pretty_assertions::assert_eq;

    fn call(f: FunctionImpl, args: &[Value]) -> Value {
        f(args, &CallContext { clock: &SystemClock }).unwrap()
    }

    #[test]
    fn test_concat_skips_empty() {
        assert_eq!(
            call(fn_concat, &["Case ".into(), Value::Empty, 12.0.into(), true.into()]),
            Value::from("Case 12true")
        );
        assert_eq!(call(fn_concat, &[]), Value::from(""));
    }

    #[test]
    fn test_pluralize() {
        let forms = |n: Value| call(fn_pluralize, &[n, "Plaintiff".into(), "Plaintiffs".into()]);
        assert_eq!(forms(1.0.into()), Value::from("Plaintiff"));
        assert_eq!(forms(2.0.into()), Value::from("Plaintiffs"));
        assert_eq!(forms("3".into()), Value::from("Plaintiffs"));
        assert_eq!(forms(0.0.into()), Value::from("Plaintiff"));
    }

    #[test]
    fn test_amount_to_words() {
        assert_eq!(
            call(fn_amount_to_words, &[1234.5.into()]),
            Value::from("ONE THOUSAND TWO HUNDRED THIRTY-FOUR AND FIFTY CENTS")
        );
        assert_eq!(
            call(fn_amount_to_words, &[2_000_015.0.into()]),
            Value::from("TWO MILLION FIFTEEN")
        );
        assert_eq!(
            call(fn_amount_to_words, &["7500".into()]),
            Value::from("SEVEN THOUSAND FIVE HUNDRED")
        );
        assert_eq!(call(fn_amount_to_words, &[0.25.into()]), Value::from("ZERO"));
        assert_eq!(call(fn_amount_to_words, &[0.0.into()]), Value::from(""));
        assert_eq!(call(fn_amount_to_words, &["lots".into()]), Value::from(""));
    }

    #[test]
    fn test_cause_ordinal() {
        assert_eq!(call(fn_cause_ordinal, &[0.0.into()]), Value::from("FIRST"));
        assert_eq!(call(fn_cause_ordinal, &[2.0.into()]), Value::from("THIRD"));
        assert_eq!(call(fn_cause_ordinal, &[99.0.into()]), Value::from("FIRST"));
        assert_eq!(call(fn_cause_ordinal, &[1.5.into()]), Value::from("FIRST"));
    }
}
