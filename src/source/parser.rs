//! Inventory API response parsing.
//!
//! Missing fields default to zero/empty so that upstream schema drift degrades
//! to "nothing new" instead of a failing cycle. Only a body that is not a JSON
//! object is rejected.

use serde_json::Value;

use crate::models::{Item, Snapshot, attr};
use crate::utils::error::{AppError, Result};

/// Builds the public listing URL for an identifier.
pub type LinkBuilder<'a> = &'a dyn Fn(&str) -> String;

pub fn parse_snapshot(body: &str, link_for: LinkBuilder<'_>) -> Result<Snapshot> {
    let root: Value = serde_json::from_str(body)
        .map_err(|e| AppError::parse(format!("response is not valid JSON: {}", e)))?;

    if !root.is_object() {
        return Err(AppError::parse("response root is not a JSON object"));
    }

    let total_count = parse_count(&root["total_matches_found"]);
    let results = collect_results(&root["results"]);

    let items: Vec<Item> = results
        .into_iter()
        .map(|raw| parse_item(raw, link_for))
        .collect();

    tracing::debug!("Parsed snapshot: total={}, page={}", total_count, items.len());
    Ok(Snapshot::new(total_count, items))
}

/// The count arrives as a number or as a numeric string.
fn parse_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// `results` is either a flat array or `{ exact: [...], approximate: [...] }`.
fn collect_results(results: &Value) -> Vec<&Value> {
    match results {
        Value::Array(items) => items.iter().collect(),
        Value::Object(groups) => ["exact", "approximate"]
            .iter()
            .filter_map(|key| groups.get(*key).and_then(Value::as_array))
            .flatten()
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_item(raw: &Value, link_for: LinkBuilder<'_>) -> Item {
    let id = text(&raw["VIN"]);
    let mut item = Item::new(id.clone());

    item.set_attribute(attr::MODEL, text(&raw["Model"]));
    item.set_attribute(attr::TRIM, text(&raw["TrimName"]));
    item.set_attribute(attr::YEAR, text(&raw["Year"]));
    item.set_attribute(attr::PRICE, text(&raw["Price"]));
    item.set_attribute(attr::CURRENCY, text(&raw["CurrencyCode"]));
    item.set_attribute(attr::PAINT, first_text(&raw["PAINT"]));
    item.set_attribute(attr::INTERIOR, first_text(&raw["INTERIOR"]));

    if !id.is_empty() {
        item.set_attribute(attr::LINK, link_for(&id));
    }
    item
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn first_text(value: &Value) -> String {
    value
        .as_array()
        .and_then(|values| values.first())
        .map(text)
        .unwrap_or_default()
}
