use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};

/// Attribute name that expands to every configured wildcard field
pub const WILDCARD_FIELD: &str = "*";

/// A single indexed or queried value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Integer(i64),
    Text(String),
}

impl AttrValue {
    /// Numeric view of the value, coercing text that parses as an integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Integer(n) => Some(*n),
            AttrValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, AttrValue::Integer(_))
    }

    /// Convert to a JSON value for storage in an engine document
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttrValue::Integer(n) => serde_json::Value::from(*n),
            AttrValue::Text(s) => serde_json::Value::from(s.as_str()),
        }
    }

    /// Rebuild a value from a stored JSON value.
    ///
    /// Integral numbers come back as `Integer`; everything else is kept as its
    /// textual form.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) if n.is_i64() => {
                AttrValue::Integer(n.as_i64().unwrap_or_default())
            }
            serde_json::Value::String(s) => AttrValue::Text(s.clone()),
            other => AttrValue::Text(other.to_string()),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Integer(n) => write!(f, "{}", n),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Integer(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Integer(i64::from(value))
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::Integer(i64::from(value))
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

/// Comparison semantics applied to one query attribute
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum MatchType {
    /// Exact term match
    Eq,
    /// Approximate text match with automatic edit distance
    Fuzzy,
    /// Inclusive lower bound
    Gte,
    /// Inclusive upper bound
    Lte,
    /// Inclusive lower and upper bound
    Between,
}

/// The value an attribute is matched against
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributePattern {
    Value(AttrValue),
    /// (low, high) bounds for `Between`
    Range(i64, i64),
}

impl AttributePattern {
    /// Match type picked for this pattern when the caller does not name one
    pub fn inferred_match_type(&self) -> MatchType {
        match self {
            AttributePattern::Value(AttrValue::Integer(_)) => MatchType::Eq,
            AttributePattern::Value(AttrValue::Text(_)) => MatchType::Fuzzy,
            AttributePattern::Range(..) => MatchType::Between,
        }
    }
}

impl fmt::Display for AttributePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributePattern::Value(v) => write!(f, "{}", v),
            AttributePattern::Range(low, high) => write!(f, "{}..{}", low, high),
        }
    }
}

impl From<AttrValue> for AttributePattern {
    fn from(value: AttrValue) -> Self {
        AttributePattern::Value(value)
    }
}

impl From<i64> for AttributePattern {
    fn from(value: i64) -> Self {
        AttributePattern::Value(value.into())
    }
}

impl From<i32> for AttributePattern {
    fn from(value: i32) -> Self {
        AttributePattern::Value(value.into())
    }
}

impl From<u32> for AttributePattern {
    fn from(value: u32) -> Self {
        AttributePattern::Value(value.into())
    }
}

impl From<&str> for AttributePattern {
    fn from(value: &str) -> Self {
        AttributePattern::Value(value.into())
    }
}

impl From<String> for AttributePattern {
    fn from(value: String) -> Self {
        AttributePattern::Value(value.into())
    }
}

impl From<(i64, i64)> for AttributePattern {
    fn from((low, high): (i64, i64)) -> Self {
        AttributePattern::Range(low.min(high), low.max(high))
    }
}

/// A named matcher inside a [`SearchQuery`](crate::models::SearchQuery)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchAttribute {
    /// Field name, or [`WILDCARD_FIELD`] to search every wildcard field
    pub name: String,

    /// Value or bounds to match
    pub pattern: AttributePattern,

    /// Comparison semantics, fixed at construction
    pub match_type: MatchType,
}

impl SearchAttribute {
    /// Create an attribute with an explicit match type
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<AttributePattern>,
        match_type: MatchType,
    ) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            match_type,
        }
    }

    /// Create an attribute whose match type follows the value: integers match
    /// exactly, text matches fuzzily and bound pairs match as a range
    pub fn inferred(name: impl Into<String>, pattern: impl Into<AttributePattern>) -> Self {
        let pattern = pattern.into();
        let match_type = pattern.inferred_match_type();
        Self::new(name, pattern, match_type)
    }

    pub fn exact(name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Self::new(name, AttributePattern::Value(value.into()), MatchType::Eq)
    }

    pub fn fuzzy(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, AttrValue::Text(text.into()), MatchType::Fuzzy)
    }

    pub fn gte(name: impl Into<String>, bound: impl Into<AttrValue>) -> Self {
        Self::new(name, AttributePattern::Value(bound.into()), MatchType::Gte)
    }

    pub fn lte(name: impl Into<String>, bound: impl Into<AttrValue>) -> Self {
        Self::new(name, AttributePattern::Value(bound.into()), MatchType::Lte)
    }

    /// Inclusive range; bounds given in the wrong order are swapped
    pub fn between(name: impl Into<String>, low: i64, high: i64) -> Self {
        Self::new(name, (low, high), MatchType::Between)
    }

    /// Attribute matched against every configured wildcard field
    pub fn wildcard(pattern: impl Into<AttributePattern>) -> Self {
        Self::inferred(WILDCARD_FIELD, pattern)
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD_FIELD
    }

    /// Same pattern and match type, aimed at another field
    pub fn retarget(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: self.pattern.clone(),
            match_type: self.match_type,
        }
    }
}

/// A named value stored with an [`IndexEntry`](crate::models::IndexEntry)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexAttribute {
    pub name: String,

    pub attr_value: AttrValue,

    /// Hint that the value is free text rather than an exact token
    #[serde(default)]
    pub is_text_indexed: bool,
}

impl IndexAttribute {
    pub fn new(name: impl Into<String>, attr_value: impl Into<AttrValue>) -> Self {
        Self {
            name: name.into(),
            attr_value: attr_value.into(),
            is_text_indexed: false,
        }
    }

    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attr_value: AttrValue::Text(text.into()),
            is_text_indexed: true,
        }
    }
}
