//! Total accessors over raw JSON rows. Every function returns a default
//! instead of failing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

static NULL: Value = Value::Null;

pub fn field<'a>(row: &'a Value, key: &str) -> &'a Value {
    row.get(key).unwrap_or(&NULL)
}

/// First present, non-null field among `keys`.
pub fn first<'a>(row: &'a Value, keys: &[&str]) -> &'a Value {
    keys.iter()
        .map(|key| field(row, key))
        .find(|value| !value.is_null())
        .unwrap_or(&NULL)
}

pub fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

pub fn opt_text(value: &Value) -> Option<String> {
    let s = text(value);
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Numbers may arrive as JSON numbers or numeric strings ("1,500,000" too).
pub fn opt_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

pub fn number(value: &Value) -> f64 {
    opt_number(value).unwrap_or(0.0)
}

/// Non-negative number; negatives collapse to zero.
pub fn amount(value: &Value) -> f64 {
    number(value).max(0.0)
}

pub fn count(value: &Value) -> u64 {
    // Saturating float-to-int cast; fractional counts truncate.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let n = amount(value).round() as u64;
    n
}

pub fn count_u32(value: &Value) -> u32 {
    u32::try_from(count(value)).unwrap_or(u32::MAX)
}

pub fn opt_count_u32(value: &Value) -> Option<u32> {
    opt_number(value).map(|_| count_u32(value))
}

/// Integer clamped into `[min, max]`.
pub fn bounded(value: &Value, min: u8, max: u8) -> u8 {
    let n = count(value).clamp(u64::from(min), u64::from(max));
    u8::try_from(n).unwrap_or(max)
}

pub fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(opt_text).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

pub fn date(value: &Value) -> Option<NaiveDate> {
    let raw = value.as_str()?.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    timestamp(value).map(|ts| ts.date_naive())
}

pub fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
