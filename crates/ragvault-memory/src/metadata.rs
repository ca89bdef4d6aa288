use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Metadata attached to a stored document.
///
/// Values are always strings. Callers hand in arbitrary JSON scalars and
/// [`Metadata::coerce`] flattens them once, at the store boundary; a number or
/// boolean comes back as its text form on retrieval, never as the original
/// type.
///
/// Coercion rules:
/// - strings are kept verbatim (no surrounding quotes),
/// - numbers, booleans and `null` use their JSON text (`42`, `2.5`, `true`, `null`),
/// - arrays and objects become their compact JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, String>);

impl Metadata {
    /// An empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Coerce every value of a JSON object to its string form.
    pub fn coerce(raw: &Map<String, Value>) -> Self {
        Self(
            raw.iter()
                .map(|(key, value)| (key.clone(), coerce_value(value)))
                .collect(),
        )
    }

    /// Insert (or replace) an already-stringified value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up the string value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// String form of a single JSON value, see [`Metadata`].
pub fn coerce_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn test_coerce_scalars() {
        let md = Metadata::coerce(&object(json!({
            "topic": "fruit",
            "count": 12,
            "ratio": 0.5,
            "fresh": true,
            "missing": null,
        })));
        assert_eq!(md.get("topic"), Some("fruit"));
        assert_eq!(md.get("count"), Some("12"));
        assert_eq!(md.get("ratio"), Some("0.5"));
        assert_eq!(md.get("fresh"), Some("true"));
        assert_eq!(md.get("missing"), Some("null"));
        assert_eq!(md.len(), 5);
    }

    #[test]
    fn test_coerce_nested_values_to_json_text() {
        let md = Metadata::coerce(&object(json!({
            "tags": ["a", "b"],
            "origin": {"shelf": 3},
        })));
        assert_eq!(md.get("tags"), Some(r#"["a","b"]"#));
        assert_eq!(md.get("origin"), Some(r#"{"shelf":3}"#));
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let md: Metadata = [("topic", "tools"), ("aisle", "7")].into_iter().collect();
        let text = serde_json::to_string(&md).unwrap();
        assert_eq!(text, r#"{"aisle":"7","topic":"tools"}"#);
        let back: Metadata = serde_json::from_str(&text).unwrap();
        assert_eq!(back, md);
    }

    #[test]
    fn test_iter_in_key_order() {
        let mut md = Metadata::new();
        assert!(md.is_empty());
        md.insert("b", "2");
        md.insert("a", "1");
        let keys: Vec<&str> = md.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
