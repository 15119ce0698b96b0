//! Engine-neutral search query

use crate::models::attribute::{AttributePattern, SearchAttribute};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Default number of results requested by a query
pub const DEFAULT_LIMIT: usize = 10;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Order results by a stored field instead of relevance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }
}

/// An ordered set of attribute matchers plus pagination.
///
/// Attributes are OR-combined by the compiler; a document matching any of
/// them is a candidate. Every `with`/`and` call appends one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Attribute matchers, in the order they were added
    #[serde(default)]
    pub attributes: Vec<SearchAttribute>,

    /// Number of results wanted
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Offset of the first result
    #[serde(default)]
    pub from: usize,

    /// Continuation token for cursor-style paging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_key: Option<String>,

    /// Optional field ordering; relevance when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            attributes: Vec::new(),
            limit: DEFAULT_LIMIT,
            from: 0,
            last_key: None,
            sort: None,
        }
    }
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute whose match type is inferred from the value
    pub fn with(self, name: impl Into<String>, value: impl Into<AttributePattern>) -> Self {
        self.and(name, value)
    }

    /// Append an attribute whose match type is inferred from the value
    pub fn and(mut self, name: impl Into<String>, value: impl Into<AttributePattern>) -> Self {
        self.attributes.push(SearchAttribute::inferred(name, value));
        self
    }

    /// Append a fully specified attribute
    pub fn with_attribute(mut self, attribute: SearchAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn from(mut self, from: usize) -> Self {
        self.from = from;
        self
    }

    pub fn last_key(mut self, key: impl Into<String>) -> Self {
        self.last_key = Some(key.into());
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attribute::{AttrValue, MatchType};

    #[test]
    fn test_query_defaults() {
        let query = SearchQuery::new();
        assert_eq!(query.limit, 10);
        assert_eq!(query.from, 0);
        assert!(query.attributes.is_empty());
        assert!(query.last_key.is_none());
    }

    #[test]
    fn test_attributes_accumulate() {
        let query = SearchQuery::new()
            .limit(5)
            .and("name", "nut butter")
            .and("name", "dog")
            .with("somenumber", 57);

        assert_eq!(query.attributes.len(), 3);
        assert_eq!(query.attributes[0].match_type, MatchType::Fuzzy);
        assert_eq!(query.attributes[1].name, "name");
        assert_eq!(query.attributes[2].match_type, MatchType::Eq);
        assert_eq!(
            query.attributes[2].pattern,
            AttributePattern::Value(AttrValue::Integer(57))
        );
    }

    #[test]
    fn test_query_deserializes_with_defaults() {
        let query: SearchQuery = serde_json::from_str(
            r#"{"attributes":[{"name":"age","pattern":[18,30],"match_type":"BETWEEN"}]}"#,
        )
        .unwrap();

        assert_eq!(query.limit, DEFAULT_LIMIT);
        assert_eq!(query.attributes[0].pattern, AttributePattern::Range(18, 30));
    }

    #[test]
    fn test_sort_direction_parsing() {
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert_eq!(Sort::asc("age").direction, SortDirection::Asc);
    }
}
