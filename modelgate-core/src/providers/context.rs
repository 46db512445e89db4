//! Per-instance context store
//!
//! Labelled JSON values attached to every call made through a provider
//! instance. Entries keep insertion order and are never deduplicated.

use crate::protocol::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// First line of the injected context message
pub const CONTEXT_HEADER: &str = "Context:";

/// A labelled context value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub label: String,
    pub value: Value,
}

/// Ordered collection of context entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextStore {
    entries: Vec<ContextEntry>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    pub fn add(&mut self, label: impl Into<String>, value: Value) -> &mut Self {
        self.entries.push(ContextEntry {
            label: label.into(),
            value,
        });
        self
    }

    /// All entries, or only those carrying `label`
    pub fn get(&self, label: Option<&str>) -> Vec<&ContextEntry> {
        self.entries
            .iter()
            .filter(|entry| label.map_or(true, |l| entry.label == l))
            .collect()
    }

    /// Remove all entries, or only those carrying `label`
    pub fn clear(&mut self, label: Option<&str>) -> &mut Self {
        match label {
            Some(label) => self.entries.retain(|entry| entry.label != label),
            None => self.entries.clear(),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContextEntry> {
        self.entries.iter()
    }

    /// Labels in first-appearance order. A label added once maps to its
    /// value; a label added more than once maps to an array of its values in
    /// arrival order.
    pub fn grouped(&self) -> Map<String, Value> {
        let mut groups: Vec<(&str, Vec<&Value>)> = Vec::new();
        for entry in &self.entries {
            match groups.iter_mut().find(|(label, _)| *label == entry.label) {
                Some((_, values)) => values.push(&entry.value),
                None => groups.push((entry.label.as_str(), vec![&entry.value])),
            }
        }

        groups
            .into_iter()
            .map(|(label, values)| {
                let value = match values.as_slice() {
                    [single] => (*single).clone(),
                    _ => Value::Array(values.into_iter().cloned().collect()),
                };
                (label.to_string(), value)
            })
            .collect()
    }

    /// Text of the injected context message, `None` when empty
    pub fn render(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }

        let grouped = Value::Object(self.grouped());
        let body = serde_json::to_string_pretty(&grouped).unwrap_or_else(|_| grouped.to_string());
        Some(format!("{}\n{}", CONTEXT_HEADER, body))
    }

    /// The synthetic user message carrying all context, `None` when empty
    pub fn to_message(&self) -> Option<Message> {
        self.render().map(Message::user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_add_is_chainable_and_ordered() {
        let mut store = ContextStore::new();
        store.add("product", json!({"sku": "A1"})).add("notes", json!("fragile"));

        let labels: Vec<_> = store.get(None).iter().map(|e| e.label.clone()).collect();
        assert_eq!(labels, vec!["product", "notes"]);
    }

    #[test]
    fn test_get_and_clear_by_label() {
        let mut store = ContextStore::new();
        store.add("a", json!(1)).add("b", json!(2)).add("a", json!(3));

        assert_eq!(store.get(Some("a")).len(), 2);

        store.clear(Some("a"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(None)[0].label, "b");
    }

    #[test]
    fn test_duplicate_labels_group_in_arrival_order() {
        let mut store = ContextStore::new();
        store.add("x", json!("first")).add("y", json!(true)).add("x", json!("second"));

        let grouped = store.grouped();
        let keys: Vec<_> = grouped.keys().cloned().collect();
        assert_eq!(keys, vec!["x", "y"]);
        assert_eq!(grouped["x"], json!(["first", "second"]));
        assert_eq!(grouped["y"], json!(true));
    }

    #[test]
    fn test_single_array_value_is_not_wrapped() {
        let mut store = ContextStore::new();
        store.add("list", json!([1, 2]));
        assert_eq!(store.grouped()["list"], json!([1, 2]));
    }

    #[test]
    fn test_empty_store_renders_nothing() {
        assert!(ContextStore::new().to_message().is_none());
    }

    #[test]
    fn test_render_starts_with_header() {
        let mut store = ContextStore::new();
        store.add("k", json!("v"));
        let text = store.render().unwrap();
        assert!(text.starts_with(CONTEXT_HEADER));
        let body: Value = serde_json::from_str(text.trim_start_matches(CONTEXT_HEADER)).unwrap();
        assert_eq!(body, json!({"k": "v"}));
    }

    proptest! {
        #[test]
        fn prop_grouping_preserves_arrival_order(
            entries in proptest::collection::vec((0usize..4, any::<i64>()), 0..24)
        ) {
            let labels = ["alpha", "beta", "gamma", "delta"];
            let mut store = ContextStore::new();
            for (label, value) in &entries {
                store.add(labels[*label], json!(value));
            }

            let grouped = store.grouped();

            let mut first_seen: Vec<&str> = Vec::new();
            for (label, _) in &entries {
                if !first_seen.contains(&labels[*label]) {
                    first_seen.push(labels[*label]);
                }
            }
            let keys: Vec<&str> = grouped.keys().map(String::as_str).collect();
            prop_assert_eq!(keys, first_seen);

            for (key, value) in &grouped {
                let expected: Vec<Value> = entries
                    .iter()
                    .filter(|(label, _)| labels[*label] == key.as_str())
                    .map(|(_, v)| json!(v))
                    .collect();
                if expected.len() == 1 {
                    prop_assert_eq!(value, &expected[0]);
                } else {
                    prop_assert_eq!(value, &Value::Array(expected));
                }
            }
        }
    }
}
