//! Calendar arithmetic for date fields
//!
//! Dates are handled as naive date-times; no time zone is ever applied.
//!
//! Differences come in two families that do not agree with each other:
//! - days and weeks are elapsed time, rounded up to whole units
//! - months and years subtract calendar components and ignore the day of month
//!
//! So `2024-01-31` to `2024-03-01` is 31 days (5 weeks) but 2 months.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

const MS_PER_DAY: f64 = 86_400_000.0;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Unit for date differences and offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateUnit {
    Days,
    Weeks,
    Months,
    Years,
}

impl DateUnit {
    /// Parse a unit name (`days`, `weeks`, `months`, `years`)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "days" | "day" => Some(DateUnit::Days),
            "weeks" | "week" => Some(DateUnit::Weeks),
            "months" | "month" => Some(DateUnit::Months),
            "years" | "year" => Some(DateUnit::Years),
            _ => None,
        }
    }
}

/// Output style for [`format_date`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateStyle {
    /// `June 15, 2025`
    #[default]
    Legal,
    /// `2025-06-15`
    Standard,
    /// `6/15/2025`
    Short,
}

impl DateStyle {
    /// Parse a style name; unknown names fall back to [`DateStyle::Legal`]
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "standard" => DateStyle::Standard,
            "short" => DateStyle::Short,
            _ => DateStyle::Legal,
        }
    }
}

/// Parse date-like text.
///
/// Accepts ISO dates and date-times (with or without offset), `YYYY/MM/DD`,
/// US `M/D/YYYY`, and long-form `June 15, 2025` / `Jun 15, 2025`.
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    const DATE_TIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
    ];
    for fmt in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }

    const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y"];
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Interpret milliseconds since the Unix epoch as a date-time
pub fn from_epoch_millis(ms: f64) -> Option<NaiveDateTime> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms.trunc() as i64).map(|dt| dt.naive_utc())
}

/// Absolute difference between two dates in `unit`
pub fn date_diff(a: NaiveDateTime, b: NaiveDateTime, unit: DateUnit) -> i64 {
    match unit {
        DateUnit::Days => elapsed_units(a, b, 1.0),
        DateUnit::Weeks => elapsed_units(a, b, 7.0),
        DateUnit::Months => {
            let years = i64::from(b.year()) - i64::from(a.year());
            let months = i64::from(b.month()) - i64::from(a.month());
            (years * 12 + months).abs()
        }
        DateUnit::Years => (i64::from(b.year()) - i64::from(a.year())).abs(),
    }
}

fn elapsed_units(a: NaiveDateTime, b: NaiveDateTime, days_per_unit: f64) -> i64 {
    let ms = (b - a).num_milliseconds().unsigned_abs() as f64;
    (ms / (MS_PER_DAY * days_per_unit)).ceil() as i64
}

/// Shift a date by `amount` units.
///
/// Month and year shifts keep the day of month and roll any overflow into the
/// following month, so January 31 plus one month lands in early March.
pub fn date_add(date: NaiveDateTime, amount: i64, unit: DateUnit) -> Option<NaiveDateTime> {
    match unit {
        DateUnit::Days => date.checked_add_signed(Duration::try_days(amount)?),
        DateUnit::Weeks => date.checked_add_signed(Duration::try_days(amount.checked_mul(7)?)?),
        DateUnit::Months => add_months_rolling(date, amount),
        DateUnit::Years => add_months_rolling(date, amount.checked_mul(12)?),
    }
}

fn add_months_rolling(date: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let total = i64::from(date.year())
        .checked_mul(12)?
        .checked_add(i64::from(date.month0()))?
        .checked_add(months)?;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = total.rem_euclid(12) as u32 + 1;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let day = first.checked_add_signed(Duration::try_days(i64::from(date.day0()))?)?;
    Some(day.and_time(date.time()))
}

/// ISO calendar date (`YYYY-MM-DD`)
pub fn iso_date(date: NaiveDateTime) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a date for a document
pub fn format_date(date: NaiveDateTime, style: DateStyle) -> String {
    match style {
        DateStyle::Legal => format!(
            "{} {}, {}",
            MONTH_NAMES[date.month0() as usize],
            date.day(),
            date.year()
        ),
        DateStyle::Standard => iso_date(date),
        DateStyle::Short => format!("{}/{}/{}", date.month(), date.day(), date.year()),
    }
}
