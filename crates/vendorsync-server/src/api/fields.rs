//! Lenient parsing of vendor-supplied JSON fields.
//!
//! Vendors send ids as numbers, numeric strings, or GraphQL global ids, and
//! prices and quantities as numbers or strings. Batch elements and their
//! fields stay raw [`Value`]s until validation, so a malformed element fails
//! only its own entry instead of rejecting the whole request body.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use vendorsync_shopify::types::parse_gid;

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    })
}

fn missing(field: &str) -> String {
    format!("missing required field: {field}")
}

/// A positive Shopify id given as a number, a numeric string, or a
/// `gid://shopify/{resource}/N` global id.
pub(super) fn required_id(value: Option<&Value>, field: &str, resource: &str) -> Result<u64, String> {
    let value = present(value).ok_or_else(|| missing(field))?;
    let id = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| parse_gid(resource, s))
        }
        _ => None,
    };
    id.filter(|id| *id > 0).ok_or_else(|| {
        format!("{field} must be a positive numeric id or gid://shopify/{resource}/<id>")
    })
}

/// A whole number given as a JSON integer or an integer string.
pub(super) fn required_integer(value: Option<&Value>, field: &str) -> Result<i64, String> {
    let value = present(value).ok_or_else(|| missing(field))?;
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| format!("{field} must be a whole number"))
}

/// A non-negative decimal amount given as a number or a string.
pub(super) fn required_price(value: Option<&Value>, field: &str) -> Result<Decimal, String> {
    let value = present(value).ok_or_else(|| missing(field))?;
    let parsed = match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    };
    match parsed {
        Some(price) if price.is_sign_negative() => Err(format!("{field} must not be negative")),
        Some(price) => Ok(price),
        None => Err(format!("{field} must be a decimal amount")),
    }
}

/// Like [`required_price`], but absent, `null` and `""` mean "no value".
pub(super) fn optional_price(value: Option<&Value>, field: &str) -> Result<Option<Decimal>, String> {
    match present(value) {
        None => Ok(None),
        Some(v) => required_price(Some(v), field).map(Some),
    }
}

/// A non-blank string, trimmed.
pub(super) fn required_text(value: Option<&Value>, field: &str) -> Result<String, String> {
    match present(value).ok_or_else(|| missing(field))? {
        Value::String(s) => Ok(s.trim().to_owned()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(format!("{field} must be a string")),
    }
}

pub(super) fn optional_text(value: Option<&Value>) -> Option<String> {
    match present(value)? {
        Value::String(s) => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Tags as an array of strings or a comma-separated string.
pub(super) fn tag_list(value: Option<&Value>) -> Option<Vec<String>> {
    match present(value)? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|t| t.as_str())
                .map(|t| t.trim().to_owned())
                .filter(|t| !t.is_empty())
                .collect(),
        ),
        Value::String(s) => Some(vendorsync_shopify::normalize::split_tags(Some(s))),
        _ => None,
    }
}

/// A `?limit=` query value: absent means `default`, anything else must be
/// a whole number in 1..=250.
pub(super) fn page_limit(raw: Option<&str>, default: u32) -> Result<u32, String> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|limit| (1..=250).contains(limit))
            .ok_or_else(|| "limit must be a whole number between 1 and 250".to_owned()),
    }
}

/// Joins the messages of every failed check.
pub(super) fn collect_errors<const N: usize>(checks: [Option<String>; N]) -> String {
    checks.into_iter().flatten().collect::<Vec<_>>().join("; ")
}

/// Echoes the named fields back in a batch entry so callers can match it to
/// their record. Absent fields are skipped.
pub(super) fn identity(fields: &[(&str, Option<&Value>)]) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|(name, value)| value.map(|v| ((*name).to_owned(), v.clone())))
        .collect()
}
