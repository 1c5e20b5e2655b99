//! Human-readable message bodies for every notification the watcher sends.

use std::time::Duration;

use crate::models::{Item, attr};
use crate::plugins::traits::Notification;

pub fn started(interval: Duration) -> Notification {
    Notification::info(
        "Inventory Watcher Started",
        format!(
            "🚀 Inventory watcher is running and will check every {}.",
            format_interval(interval)
        ),
    )
}

pub fn stopped() -> Notification {
    Notification::info("Inventory Watcher Stopped", "🛑 Inventory watcher stopped.")
}

pub fn startup_failed(error: &str) -> Notification {
    Notification::error(
        "Inventory Watcher Startup Failed",
        format!("❌ The watcher could not start: {}", error),
    )
}

pub fn initial_summary(total: u64) -> Notification {
    Notification::inventory_update(
        "Inventory Status",
        format!("📊 {} {} found in inventory", total, plural(total)),
    )
}

pub fn arrivals_summary(delta: u64, total: u64) -> Notification {
    Notification::inventory_update(
        "Inventory Update",
        format!(
            "🎉 {} new {} found in inventory!\nTotal: {} {}",
            delta,
            plural(delta),
            total,
            plural(total)
        ),
    )
}

pub fn removals_summary(removed: u64, total: u64) -> Notification {
    Notification::inventory_update(
        "Inventory Update",
        format!(
            "📉 {} {} no longer listed.\nTotal: {} {}",
            removed,
            plural(removed),
            total,
            plural(total)
        ),
    )
}

/// One message per newly seen listing.
pub fn item_details(item: &Item) -> Notification {
    let mut body = String::new();

    let heading: Vec<&str> = [attr::YEAR, attr::MODEL, attr::TRIM]
        .iter()
        .filter_map(|key| item.attribute(key))
        .collect();
    if !heading.is_empty() {
        body.push_str(&heading.join(" "));
        body.push('\n');
    }

    if let Some(price) = item.attribute(attr::PRICE) {
        match item.attribute(attr::CURRENCY) {
            Some(currency) => body.push_str(&format!("Price: {} {}\n", price, currency)),
            None => body.push_str(&format!("Price: {}\n", price)),
        }
    }
    body.push_str(&format!("ID: {}\n", item.id));
    if let Some(paint) = item.attribute(attr::PAINT) {
        body.push_str(&format!("Color: {}\n", paint));
    }
    if let Some(interior) = item.attribute(attr::INTERIOR) {
        body.push_str(&format!("Interior: {}\n", interior));
    }
    if let Some(link) = item.attribute(attr::LINK) {
        body.push_str(&format!("\nView listing: {}", link));
    }

    Notification::new_item("🚗 New Listing", body.trim_end().to_string())
}

pub fn first_failure(error: &str) -> Notification {
    Notification::error(
        "Inventory Check Failed",
        format!("❌ Could not reach the inventory API: {}", error),
    )
}

pub fn still_failing(error: &str, repeat_interval: chrono::Duration) -> Notification {
    Notification::error(
        "Inventory Check Still Failing",
        format!(
            "⚠️ The inventory API has been failing for over {} minutes: {}",
            repeat_interval.num_minutes(),
            error
        ),
    )
}

pub fn recovered() -> Notification {
    Notification::info(
        "Inventory Check Recovered",
        "✅ The inventory API is responding again.",
    )
}

fn plural(count: u64) -> &'static str {
    if count == 1 { "listing" } else { "listings" }
}

fn format_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs % 60 == 0 && secs >= 60 {
        let mins = secs / 60;
        format!("{} minute{}", mins, if mins == 1 { "" } else { "s" })
    } else {
        format!("{} second{}", secs, if secs == 1 { "" } else { "s" })
    }
}
