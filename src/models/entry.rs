use crate::models::attribute::{AttrValue, IndexAttribute};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A document submitted for indexing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// System-assigned unique identifier
    #[serde(default = "new_uid")]
    pub uid: String,

    /// Caller-supplied key, used as the engine document id
    pub reference: String,

    /// Attributes keyed by name
    #[serde(default)]
    pub attrs: BTreeMap<String, IndexAttribute>,
}

fn new_uid() -> String {
    Uuid::new_v4().to_string()
}

impl IndexEntry {
    /// Create an entry with a fresh uid
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            uid: new_uid(),
            reference: reference.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Create an entry with a known uid, as when rebuilding from a stored document
    pub fn with_uid(uid: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            reference: reference.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Add or replace an attribute
    pub fn add_attr(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> &mut Self {
        let attr = IndexAttribute::new(name, value);
        self.attrs.insert(attr.name.clone(), attr);
        self
    }

    /// Add or replace a free-text attribute
    pub fn add_text_attr(&mut self, name: impl Into<String>, text: impl Into<String>) -> &mut Self {
        let attr = IndexAttribute::text(name, text);
        self.attrs.insert(attr.name.clone(), attr);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name).map(|attr| &attr.attr_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entries_get_distinct_uids() {
        let a = IndexEntry::new("1");
        let b = IndexEntry::new("1");
        assert_ne!(a.uid, b.uid);
        assert_eq!(a.reference, "1");
    }

    #[test]
    fn test_last_attribute_write_wins() {
        let mut entry = IndexEntry::new("1");
        entry.add_attr("ident", "1234").add_text_attr("ident", "6789");

        assert_eq!(entry.attrs.len(), 1);
        assert_eq!(entry.attr("ident"), Some(&AttrValue::Text("6789".into())));
        assert!(entry.attrs["ident"].is_text_indexed);
    }

    #[test]
    fn test_deserialize_assigns_uid() {
        let entry: IndexEntry = serde_json::from_str(r#"{"reference":"9"}"#).unwrap();
        assert!(!entry.uid.is_empty());
        assert!(entry.attrs.is_empty());
    }
}
