//! Nested JSON payload built from bracketed field names.
//!
//! `fields[name]=Ada` and `options[slug]=post` become
//! `{"fields": {"name": "Ada"}, "options": {"slug": "post"}}`. Names without
//! a `[` are kept verbatim as top-level keys. Every leaf is a string and
//! repeated paths overwrite; there is no array form.

use serde::Serialize;
use serde_json::{Map, Value};

use commentkit_dom::FormDataEntry;

/// Split a field name into its path segments.
///
/// Names without `[` are a single segment. Otherwise the name is split on
/// both brackets and empty segments are dropped, so `a[]` is `["a"]` and
/// `[]` has no path at all.
pub fn key_path(name: &str) -> Vec<&str> {
    if !name.contains('[') {
        return vec![name];
    }
    name.split(['[', ']']).filter(|s| !s.is_empty()).collect()
}

/// Store `value` at `path` inside `tree`, creating intermediate objects.
/// A non-object value found on the way is replaced by an object.
pub fn set_path(tree: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut node = tree;
    for segment in parents {
        let slot = node.entry(segment.to_string()).or_insert(Value::Null);
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(map) = slot else {
            return;
        };
        node = map;
    }
    node.insert(last.to_string(), value);
}

/// The JSON body of a comment submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a payload from form entries, in order.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a FormDataEntry>,
    {
        let mut payload = Self::new();
        for entry in entries {
            payload.insert(&entry.name, &entry.value);
        }
        payload
    }

    /// Add one field. Returns false when the name has no usable path.
    pub fn insert(&mut self, name: &str, value: &str) -> bool {
        let path = key_path(name);
        if path.is_empty() {
            return false;
        }
        set_path(&mut self.0, &path, Value::String(value.to_string()));
        true
    }

    /// Look up a string leaf by path.
    pub fn get(&self, path: &[&str]) -> Option<&str> {
        let (last, parents) = path.split_last()?;
        let mut node = &self.0;
        for segment in parents {
            node = node.get(*segment)?.as_object()?;
        }
        node.get(*last)?.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(fields: &[(&str, &str)]) -> Payload {
        let entries: Vec<FormDataEntry> = fields
            .iter()
            .map(|(n, v)| FormDataEntry::new(*n, *v))
            .collect();
        Payload::from_entries(&entries)
    }

    #[test]
    fn test_key_path() {
        assert_eq!(key_path("email"), vec!["email"]);
        assert_eq!(key_path("fields[name]"), vec!["fields", "name"]);
        assert_eq!(key_path("a[b][c]"), vec!["a", "b", "c"]);
        assert_eq!(key_path("a[]"), vec!["a"]);
        assert_eq!(key_path("a[][b]"), vec!["a", "b"]);
        assert!(key_path("[]").is_empty());
        // no opening bracket, so no splitting
        assert_eq!(key_path("odd]name"), vec!["odd]name"]);
    }

    #[test]
    fn test_flat_names() {
        let payload = build(&[("name", "Ada"), ("email", "ada@example.com")]);
        assert_eq!(
            payload.into_value(),
            json!({"name": "Ada", "email": "ada@example.com"})
        );
    }

    #[test]
    fn test_nested_names() {
        let payload = build(&[
            ("options[slug]", "hello-world"),
            ("fields[name]", "Ada"),
            ("fields[message]", "Hi"),
            ("a[b][c]", "deep"),
        ]);
        assert_eq!(payload.get(&["a", "b", "c"]), Some("deep"));
        assert_eq!(
            payload.into_value(),
            json!({
                "options": {"slug": "hello-world"},
                "fields": {"name": "Ada", "message": "Hi"},
                "a": {"b": {"c": "deep"}}
            })
        );
    }

    #[test]
    fn test_last_write_wins() {
        let payload = build(&[("a[b]", "1"), ("a[b]", "2")]);
        assert_eq!(payload.get(&["a", "b"]), Some("2"));

        let payload = build(&[("tags[]", "rust"), ("tags[]", "web")]);
        assert_eq!(payload.into_value(), json!({"tags": "web"}));
    }

    #[test]
    fn test_string_replaced_by_object() {
        let payload = build(&[("a", "flat"), ("a[b]", "nested")]);
        assert_eq!(payload.into_value(), json!({"a": {"b": "nested"}}));

        let payload = build(&[("a[b]", "nested"), ("a", "flat")]);
        assert_eq!(payload.into_value(), json!({"a": "flat"}));
    }

    #[test]
    fn test_unusable_name_skipped() {
        let mut payload = Payload::new();
        assert!(!payload.insert("[]", "x"));
        assert!(!payload.insert("[][]", "x"));
        assert!(payload.is_empty());
    }

    #[test]
    fn test_arbitrary_depth() {
        let name: String = std::iter::once("root".to_string())
            .chain((0..64).map(|i| format!("[l{}]", i)))
            .collect();
        let payload = build(&[(name.as_str(), "leaf")]);

        let path = key_path(&name);
        assert_eq!(path.len(), 65);
        assert_eq!(payload.get(&path), Some("leaf"));
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let payload = build(&[("fields[name]", "Ada")]);
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"fields":{"name":"Ada"}}"#
        );
    }
}
