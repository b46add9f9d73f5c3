//! A parsed document and the location it was loaded from

use serde_json::Value;

/// A tagged tree together with its canonical location
///
/// Created by the loader on first fetch, or directly for cache injection.
/// Shared as `Arc<Document>` between the cache and live references; the
/// tree is never mutated after parsing.
#[derive(Debug)]
pub struct Document {
    location: String,
    root: Value,
}

impl Document {
    pub fn new(location: impl Into<String>, root: Value) -> Document {
        Document {
            location: location.into(),
            root,
        }
    }

    /// Canonical location string this document was loaded from
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Root node of the parsed tree
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// The `$id` self-identifier declared at the document's top level, if any
    pub fn declared_id(&self) -> Option<&str> {
        self.root
            .as_object()
            .and_then(|object| object.get("$id"))
            .and_then(Value::as_str)
    }
}
