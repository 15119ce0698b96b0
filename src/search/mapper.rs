//! Conversion between index entries and stored engine documents

use crate::engine::{Document, Hit};
use crate::models::{AttrValue, IndexEntry, SearchResultItem};
use tracing::warn;

/// Stored field holding the entry uid
pub const ID_FIELD: &str = "id";

/// Stored field holding the entry reference
pub const REFERENCE_FIELD: &str = "reference";

/// Engine document for an entry: the reserved fields plus one field per
/// attribute
pub fn to_document(entry: &IndexEntry) -> Document {
    let mut doc = Document::new();
    doc.insert(ID_FIELD.to_string(), entry.uid.clone().into());
    doc.insert(REFERENCE_FIELD.to_string(), entry.reference.clone().into());

    for (name, attr) in &entry.attrs {
        if name == ID_FIELD || name == REFERENCE_FIELD {
            warn!(reference = %entry.reference, attribute = %name, "Attribute shadows a reserved field and is not stored");
            continue;
        }
        doc.insert(name.clone(), attr.attr_value.to_json());
    }

    doc
}

/// Rebuild the entry stored in a hit
pub fn to_result_item(hit: &Hit) -> SearchResultItem {
    let reference = hit
        .source
        .get(REFERENCE_FIELD)
        .map(|value| AttrValue::from_json(value).to_string())
        .unwrap_or_else(|| hit.id.clone());

    let uid = match hit.source.get(ID_FIELD) {
        Some(value) => AttrValue::from_json(value).to_string(),
        None => {
            warn!(reference = %reference, "Stored document has no uid");
            String::new()
        }
    };

    let mut entry = IndexEntry::with_uid(uid, reference);
    for (name, value) in &hit.source {
        if name == ID_FIELD || name == REFERENCE_FIELD {
            continue;
        }
        entry.add_attr(name.clone(), AttrValue::from_json(value));
    }

    SearchResultItem {
        score: hit.score,
        index_entry: entry,
    }
}
