//! Values flowing through formula evaluation
//!
//! Form data arrives loosely typed: numbers typed into text boxes, checkboxes,
//! multi-line name lists, date pickers. Everything here follows the same loose
//! conversion rules so that arithmetic over half-filled forms degrades to zero
//! instead of failing.

use ahash::AHashMap;
use lazy_regex::regex_is_match;

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Missing or never supplied
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    /// Ordered list of text entries (e.g. one name per line)
    List(Vec<String>),
}

impl Value {
    /// Loose numeric conversion. Text that is not a plain decimal number
    /// converts to NaN; callers decide whether NaN collapses to zero. A list
    /// counts as its number of entries, the same as its substitution text.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Empty => 0.0,
            Value::Number(n) => *n,
            Value::Boolean(true) => 1.0,
            Value::Boolean(false) => 0.0,
            Value::Text(s) => parse_numeric_text(s).unwrap_or(f64::NAN),
            Value::List(items) => items.len() as f64,
        }
    }

    /// Numeric conversion where anything unconvertible counts as zero
    pub fn to_number_or_zero(&self) -> f64 {
        let n = self.to_number();
        if n.is_nan() {
            0.0
        } else {
            n
        }
    }

    /// Truthiness: empty, zero, NaN, empty text, an empty list and `false`
    /// are false
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Empty => false,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
            Value::Boolean(b) => *b,
            Value::List(items) => !items.is_empty(),
        }
    }

    /// Display text, as used by `concat` and for output
    pub fn to_display_text(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
            Value::List(items) => items.join(","),
        }
    }

    /// Text inlined into a formula in place of a resolved function call.
    ///
    /// Text results are re-quoted so they evaluate back to the same text.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Empty => "\"\"".to_string(),
            Value::Number(n) if n.is_finite() && *n < 0.0 => format!("({})", format_number(*n)),
            Value::Number(n) if n.is_finite() => format_number(*n),
            Value::Number(_) => "0".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Text(s) => quote(s),
            Value::List(items) => quote(&items.join(",")),
        }
    }

    /// Loose equality: text compares as text, a text/number pair compares
    /// numerically, and `Empty` only equals `Empty`.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Empty, Value::Empty) => true,
            (Value::Empty, _) | (_, Value::Empty) => false,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(_), Value::Text(_) | Value::List(_))
            | (Value::Text(_), Value::List(_)) => self.to_display_text() == other.to_display_text(),
            _ => self.to_number() == other.to_number(),
        }
    }

    /// Whether this is text that parses as a calendar date
    pub fn is_date_like(&self) -> bool {
        match self {
            Value::Text(s) => crate::date::parse_date(s).is_some(),
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::List(items.into_iter().map(str::to_string).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Empty)
    }
}

/// Text substituted for a `{d.name}` token.
///
/// | input | text |
/// |---|---|
/// | absent | `0` |
/// | empty or non-numeric text | `0` |
/// | numeric text | the trimmed text |
/// | boolean | `1` / `0` |
/// | list | element count |
/// | number | its value, `0` when not finite |
pub fn substitution_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Empty) => "0".to_string(),
        Some(Value::Text(s)) => match s.trim() {
            "" => "0".to_string(),
            trimmed if is_numeric_text(trimmed) => trimmed.to_string(),
            _ => "0".to_string(),
        },
        Some(Value::Boolean(true)) => "1".to_string(),
        Some(Value::Boolean(false)) => "0".to_string(),
        Some(Value::List(items)) => items.len().to_string(),
        Some(Value::Number(n)) if n.is_finite() => format_number(*n),
        Some(Value::Number(_)) => "0".to_string(),
    }
}

/// Whether trimmed text is a plain decimal number (optional sign and exponent)
pub fn is_numeric_text(text: &str) -> bool {
    regex_is_match!(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$", text)
}

/// Parse text as a number. Blank text is zero.
pub fn parse_numeric_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    if is_numeric_text(trimmed) {
        trimmed.parse().ok()
    } else {
        None
    }
}

/// Shortest decimal text for a number, without a trailing `.0`
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        "0".to_string()
    } else if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else {
        format!("{}", n)
    }
}

fn quote(s: &str) -> String {
    if s.contains('"') && !s.contains('\'') {
        format!("'{}'", s)
    } else {
        format!("\"{}\"", s)
    }
}

/// Variable values available to a formula
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataContext {
    values: AHashMap<String, Value>,
}

/// Computed field id → value
pub type ResultMapping = AHashMap<String, Value>;

impl DataContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a variable
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Set a variable, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// A new context with `results` layered over this one; results win.
    pub fn overlay(&self, results: &ResultMapping) -> DataContext {
        let mut values = self.values.clone();
        values.extend(results.iter().map(|(k, v)| (k.clone(), v.clone())));
        DataContext { values }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for DataContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = DataContext::new();
        ctx.extend(iter);
        ctx
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for DataContext {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}
