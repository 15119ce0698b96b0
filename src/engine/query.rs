//! Engine query tree produced by the query compiler

use crate::models::AttrValue;
use serde::{Deserialize, Serialize};

/// Edit-distance tolerance for approximate text matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fuzziness {
    /// Distance grows with token length: 0 up to 2 chars, 1 up to 5, else 2
    Auto,
    Fixed(u8),
}

impl Fuzziness {
    /// Maximum edit distance allowed for `token`
    pub fn distance(&self, token: &str) -> u8 {
        match self {
            Fuzziness::Auto => match token.chars().count() {
                0..=2 => 0,
                3..=5 => 1,
                _ => 2,
            },
            Fuzziness::Fixed(distance) => (*distance).min(2),
        }
    }
}

/// OR-combination of sub-queries; any match makes the document eligible and
/// scores add up
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoolQuery {
    pub should: Vec<EngineQuery>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should(&mut self, query: EngineQuery) -> &mut Self {
        self.should.push(query);
        self
    }
}

/// Inclusive bounds on a field; a missing side is open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeQuery {
    pub field: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<AttrValue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<AttrValue>,
}

impl RangeQuery {
    /// Whether an integer value falls inside the bounds. Text bounds that do
    /// not parse as integers never match.
    pub fn contains(&self, value: i64) -> bool {
        let above = match &self.gte {
            Some(bound) => bound.as_i64().map_or(false, |low| value >= low),
            None => true,
        };
        let below = match &self.lte {
            Some(bound) => bound.as_i64().map_or(false, |high| value <= high),
            None => true,
        };
        above && below
    }
}

/// Backend-neutral query tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineQuery {
    Bool(BoolQuery),

    /// Exact, unanalyzed term
    Term { field: String, value: AttrValue },

    /// Analyzed text match with per-token fuzziness
    Match {
        field: String,
        query: String,
        fuzziness: Fuzziness,
    },

    Range(RangeQuery),

    /// Free text over every searchable field, using the engine's own syntax
    SimpleQueryString { query: String },
}

impl EngineQuery {
    pub fn term(field: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        EngineQuery::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn fuzzy_match(field: impl Into<String>, query: impl Into<String>) -> Self {
        EngineQuery::Match {
            field: field.into(),
            query: query.into(),
            fuzziness: Fuzziness::Auto,
        }
    }

    pub fn range(field: impl Into<String>, gte: Option<AttrValue>, lte: Option<AttrValue>) -> Self {
        EngineQuery::Range(RangeQuery {
            field: field.into(),
            gte,
            lte,
        })
    }

    pub fn simple_query_string(query: impl Into<String>) -> Self {
        EngineQuery::SimpleQueryString {
            query: query.into(),
        }
    }

    /// Top-level OR clauses, empty for non-boolean queries
    pub fn should_clauses(&self) -> &[EngineQuery] {
        match self {
            EngineQuery::Bool(bool_query) => &bool_query.should,
            _ => &[],
        }
    }
}

impl From<BoolQuery> for EngineQuery {
    fn from(query: BoolQuery) -> Self {
        EngineQuery::Bool(query)
    }
}
