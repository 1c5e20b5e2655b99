use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute keys filled in by the inventory source.
pub mod attr {
    pub const MODEL: &str = "model";
    pub const TRIM: &str = "trim";
    pub const YEAR: &str = "year";
    pub const PRICE: &str = "price";
    pub const CURRENCY: &str = "currency";
    pub const PAINT: &str = "paint";
    pub const INTERIOR: &str = "interior";
    pub const LINK: &str = "link";
}

/// A single listing. Identity is `id`; attributes may change between polls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub attributes: BTreeMap<String, String>,
}

impl Item {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Sets an attribute, ignoring empty values so templates can skip absent fields.
    pub fn set_attribute(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if !value.trim().is_empty() {
            self.attributes.insert(key.to_string(), value);
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// One successful poll: the authoritative total plus the items on the returned page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub total_count: u64,
    pub items: Vec<Item>,
}

impl Snapshot {
    pub fn new(total_count: u64, items: Vec<Item>) -> Self {
        Self { total_count, items }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}
