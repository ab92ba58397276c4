//! Upstream record shapes before mapping.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One upstream record as returned by an API or scraped from a page.
///
/// Field names differ per source; only the matching mapper reads them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawItem(Map<String, Value>);

impl RawItem {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert of a string field.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_string(), Value::String(value.into()));
        self
    }

    /// Text of a field. Numbers are rendered, blanks and nulls are `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        let text = match self.0.get(key)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    /// Text of a field, or an empty string.
    pub fn text_or_default(&self, key: &str) -> String {
        self.text(key).unwrap_or_default()
    }

    /// Raw string value without trimming, for fields that must pass through unchanged.
    pub fn raw_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for RawItem {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Coerce an upstream "items" value into a sequence of records.
///
/// Upstreams return a list when there are several results, a bare object
/// when there is exactly one, and an empty string or null when there are
/// none. Non-object list members are dropped.
pub fn coerce_items(value: Option<&Value>) -> Vec<RawItem> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_object().cloned().map(RawItem::from))
            .collect(),
        Some(Value::Object(item)) => vec![RawItem::from(item.clone())],
        _ => Vec::new(),
    }
}

/// Follow a path of object keys into a JSON document.
pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_single_object() {
        let value = json!({"pblancId": "A1"});
        let items = coerce_items(Some(&value));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text("pblancId").as_deref(), Some("A1"));
    }

    #[test]
    fn test_coerce_list_and_empty_shapes() {
        let list = json!([{"a": 1}, {"a": 2}, "junk"]);
        assert_eq!(coerce_items(Some(&list)).len(), 2);
        assert!(coerce_items(Some(&json!(""))).is_empty());
        assert!(coerce_items(Some(&Value::Null)).is_empty());
        assert!(coerce_items(None).is_empty());
    }

    #[test]
    fn test_text_accessor() {
        let item: RawItem = json!({"seq": 1024, "name": "  지원사업  ", "blank": " ", "none": null})
            .as_object()
            .cloned()
            .map(RawItem::from)
            .unwrap();

        assert_eq!(item.text("seq").as_deref(), Some("1024"));
        assert_eq!(item.text("name").as_deref(), Some("지원사업"));
        assert_eq!(item.text("blank"), None);
        assert_eq!(item.text("none"), None);
        assert_eq!(item.text_or_default("missing"), "");
    }

    #[test]
    fn test_lookup_nested() {
        let doc = json!({"response": {"body": {"items": {"item": []}}}});
        assert!(lookup(&doc, &["response", "body", "items", "item"]).is_some());
        assert!(lookup(&doc, &["response", "header"]).is_none());
    }
}
