//! Value normalizers for numbers, amounts and dates found in document text.

use std::str::FromStr;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Transform;

lazy_static! {
    // First number-shaped run, with an optional sign or accounting parentheses
    static ref AMOUNT_RUN: Regex = Regex::new(
        r"(?P<open>\()?\s*[$€£]?\s*(?P<minus>-)?\s*[$€£]?\s*(?P<number>\d+(?:[ \u{00a0},.]\d{3})*(?:[.,]\d+)?)(?P<close>\s*\))?"
    ).unwrap();

    // "Jan 5, 2024", "January 5, 24", "Sept. 5, 2024"
    static ref DATE_MONTH_NAME: Regex = Regex::new(
        r"(?i)\b(Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|June?|July?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)\.?\s+(\d{1,2}),?\s+(\d{4}|\d{2})\b"
    ).unwrap();

    static ref DATE_ISO: Regex = Regex::new(
        r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b"
    ).unwrap();

    static ref DATE_DOTTED: Regex = Regex::new(
        r"\b(\d{1,2})\.(\d{1,2})\.(\d{4})\b"
    ).unwrap();

    static ref DATE_SLASHED: Regex = Regex::new(
        r"\b(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})\b"
    ).unwrap();
}

/// Two-digit years from here up are read as 19xx, below as 20xx.
const CENTURY_PIVOT: i32 = 70;

/// Drop `.`, `,` and `$` and read the rest as an integer.
///
/// `"$1,234.50"` becomes `123450`, i.e. an amount in cents when the source
/// always prints two decimals.
pub fn strip_number(value: &str) -> Option<i64> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | '$'))
        .collect();
    cleaned.parse().ok()
}

/// Parse the first amount in `value`, written with either `,` or `.` as the
/// decimal separator and spaces, commas or dots as thousands separators.
///
/// The amount is negative when it carries a leading `-` or is wrapped in
/// parentheses. Text around it is ignored.
pub fn parse_amount(value: &str) -> Option<Decimal> {
    let caps = AMOUNT_RUN.captures(value)?;
    let negative =
        caps.name("minus").is_some() || (caps.name("open").is_some() && caps.name("close").is_some());
    let cleaned: String = caps["number"]
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        // A lone comma followed by exactly two digits is a decimal comma.
        (Some(c), None) if cleaned.len() - c == 3 && cleaned.matches(',').count() == 1 => {
            cleaned.replace(',', ".")
        }
        (Some(_), None) => cleaned.replace(',', ""),
        (None, Some(_)) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned,
    };

    let amount = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -amount } else { amount })
}

/// Find and parse the first date in `value`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Some(caps) = DATE_MONTH_NAME.captures(value) {
        let month = month_number(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        let year = expand_year(&caps[3])?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = DATE_ISO.captures(value) {
        return NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?);
    }

    if let Some(caps) = DATE_DOTTED.captures(value) {
        return NaiveDate::from_ymd_opt(caps[3].parse().ok()?, caps[2].parse().ok()?, caps[1].parse().ok()?);
    }

    // Slashed dates are read month first.
    if let Some(caps) = DATE_SLASHED.captures(value) {
        let year = expand_year(&caps[3])?;
        return NaiveDate::from_ymd_opt(year, caps[1].parse().ok()?, caps[2].parse().ok()?);
    }

    None
}

fn month_number(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?.to_ascii_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn expand_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    Some(match s.len() {
        2 if year >= CENTURY_PIVOT => 1900 + year,
        2 => 2000 + year,
        _ => year,
    })
}

/// Named transforms usable from profile files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinTransform {
    /// Trim surrounding whitespace.
    Trim,
    Lowercase,
    Uppercase,
    /// Integer from [`strip_number`].
    StripNumber,
    /// Decimal amount from [`parse_amount`], kept as a string.
    Decimal,
    /// ISO `YYYY-MM-DD` date from [`parse_date`]. Two-digit years of 70 and
    /// above land in the 1900s.
    Date,
}

impl BuiltinTransform {
    pub fn name(self) -> &'static str {
        match self {
            BuiltinTransform::Trim => "trim",
            BuiltinTransform::Lowercase => "lowercase",
            BuiltinTransform::Uppercase => "uppercase",
            BuiltinTransform::StripNumber => "strip_number",
            BuiltinTransform::Decimal => "decimal",
            BuiltinTransform::Date => "date",
        }
    }

    /// Transform applying this normalizer to present values.
    pub fn transform(self) -> Transform {
        Transform::map(self.name(), move |value| {
            let text = as_text(&value);
            match self {
                BuiltinTransform::Trim => Ok(Value::String(text.trim().to_string())),
                BuiltinTransform::Lowercase => Ok(Value::String(text.to_lowercase())),
                BuiltinTransform::Uppercase => Ok(Value::String(text.to_uppercase())),
                BuiltinTransform::StripNumber => strip_number(&text)
                    .map(Value::from)
                    .ok_or_else(|| format!("{text:?} is not a number")),
                BuiltinTransform::Decimal => parse_amount(&text)
                    .map(|amount| Value::String(amount.to_string()))
                    .ok_or_else(|| format!("{text:?} is not an amount")),
                BuiltinTransform::Date => parse_date(&text)
                    .map(|date| Value::String(date.format("%Y-%m-%d").to_string()))
                    .ok_or_else(|| format!("{text:?} is not a date")),
            }
        })
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
