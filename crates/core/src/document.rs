//! Document model
//!
//! A [`Document`] is a schemaless record: a JSON object body tagged with the
//! [`TypeName`] it was declared under. Callers address documents by string id;
//! the id itself lives inside the body, in whichever field the type's
//! descriptor declares as the identity field.
//!
//! Path mutation ([`Document::set_at_path`]) navigates nested object fields
//! and default-constructs any absent or null intermediate container, so a
//! deep write never aborts halfway through a hole in the document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{Error, Result};

/// Name of a registered document type
///
/// Interned as a plain string; cheap to clone, hashable, and used as the
/// key for every metadata lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeName(String);

impl TypeName {
    /// View as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeName {
    fn from(s: &str) -> Self {
        TypeName(s.to_string())
    }
}

impl From<String> for TypeName {
    fn from(s: String) -> Self {
        TypeName(s)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A typed, schemaless document
///
/// The body is always a JSON object. Once saved into a collection the
/// collection owns its own clone; the caller's copy does not alias it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    kind: TypeName,
    body: Value,
}

impl Document {
    /// Create a document of the given type from a JSON object body
    ///
    /// Returns `Error::Configuration` when the body is not a JSON object;
    /// every field operation below assumes object shape.
    pub fn new(kind: impl Into<TypeName>, body: Value) -> Result<Self> {
        if !body.is_object() {
            return Err(Error::configuration(format!(
                "document body must be a JSON object, got {}",
                value_type_name(&body)
            )));
        }
        Ok(Document {
            kind: kind.into(),
            body,
        })
    }

    /// The declared type of this document
    pub fn kind(&self) -> &TypeName {
        &self.kind
    }

    /// Borrow the JSON body
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Consume into the JSON body
    pub fn into_body(self) -> Value {
        self.body
    }

    /// Read a top-level field, `None` if absent
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.body.as_object().and_then(|obj| obj.get(name))
    }

    /// Write a top-level field, replacing any prior value
    pub fn set_field(&mut self, name: &str, value: Value) {
        if let Some(obj) = self.body.as_object_mut() {
            obj.insert(name.to_string(), value);
        }
    }

    /// Read a nested field by path, `None` if any step is absent
    pub fn field_at_path(&self, path: &[&str]) -> Option<&Value> {
        let mut current = &self.body;
        for segment in path {
            current = current.as_object()?.get(*segment)?;
        }
        Some(current)
    }

    /// Set `leaf` to `value` inside the container reached by walking `path`
    ///
    /// Intermediate fields that are absent or null are replaced with a fresh
    /// empty object and traversal continues; traversal only fails when an
    /// intermediate holds a non-object, non-null value (a scalar cannot be
    /// descended through).
    pub fn set_at_path(&mut self, path: &[&str], leaf: &str, value: Value) -> Result<()> {
        let mut current = &mut self.body;

        for segment in path {
            if !current.is_object() {
                return Err(Error::configuration(format!(
                    "cannot traverse '{segment}': expected object, got {}",
                    value_type_name(current)
                )));
            }
            let obj = current.as_object_mut().unwrap();

            let slot = obj
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if slot.is_null() {
                *slot = Value::Object(Map::new());
            }
            current = slot;
        }

        if !current.is_object() {
            return Err(Error::configuration(format!(
                "cannot set '{leaf}': expected object container, got {}",
                value_type_name(current)
            )));
        }
        current
            .as_object_mut()
            .unwrap()
            .insert(leaf.to_string(), value);
        Ok(())
    }
}

/// Human-readable name of a JSON value's type, for error messages
pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user() -> Document {
        Document::new(
            "user",
            json!({
                "UserId": "user1",
                "Name": "Alice",
                "Student": { "StudentId": "student1", "School": "MIT" }
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_non_object_body() {
        let err = Document::new("user", json!("just a string")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_field_access() {
        let doc = user();
        assert_eq!(doc.field("Name"), Some(&json!("Alice")));
        assert_eq!(doc.field("Missing"), None);
    }

    #[test]
    fn test_set_field_replaces() {
        let mut doc = user();
        doc.set_field("Name", json!("Bob"));
        assert_eq!(doc.field("Name"), Some(&json!("Bob")));
    }

    #[test]
    fn test_field_at_path() {
        let doc = user();
        assert_eq!(
            doc.field_at_path(&["Student", "School"]),
            Some(&json!("MIT"))
        );
        assert_eq!(doc.field_at_path(&["Student", "Nope"]), None);
    }

    #[test]
    fn test_set_at_path_existing_container() {
        let mut doc = user();
        doc.set_at_path(&["Student"], "School", json!("Stanford"))
            .unwrap();
        assert_eq!(
            doc.field_at_path(&["Student", "School"]),
            Some(&json!("Stanford"))
        );
        // Sibling field untouched
        assert_eq!(
            doc.field_at_path(&["Student", "StudentId"]),
            Some(&json!("student1"))
        );
    }

    #[test]
    fn test_set_at_path_creates_missing_intermediates() {
        let mut doc = Document::new("user", json!({ "UserId": "user1" })).unwrap();
        doc.set_at_path(&["Student", "Address"], "City", json!("Boston"))
            .unwrap();
        assert_eq!(
            doc.field_at_path(&["Student", "Address", "City"]),
            Some(&json!("Boston"))
        );
    }

    #[test]
    fn test_set_at_path_replaces_null_intermediate() {
        let mut doc = Document::new("user", json!({ "Student": null })).unwrap();
        doc.set_at_path(&["Student"], "StudentId", json!("student_new"))
            .unwrap();
        assert_eq!(
            doc.field_at_path(&["Student", "StudentId"]),
            Some(&json!("student_new"))
        );
    }

    #[test]
    fn test_set_at_path_scalar_intermediate_fails() {
        let mut doc = Document::new("user", json!({ "Student": 42 })).unwrap();
        let err = doc
            .set_at_path(&["Student"], "StudentId", json!("x"))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_set_at_path_empty_path_sets_top_level() {
        let mut doc = user();
        doc.set_at_path(&[], "Name", json!("Carol")).unwrap();
        assert_eq!(doc.field("Name"), Some(&json!("Carol")));
    }
}
