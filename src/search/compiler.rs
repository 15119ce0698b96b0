//! Translation of [`SearchQuery`] into engine queries

use crate::engine::{BoolQuery, EngineQuery, SearchRequest};
use crate::error::{IndexError, Result};
use crate::models::{AttrValue, AttributePattern, MatchType, SearchAttribute, SearchQuery};

/// Hits scoring below this are dropped by the engine
pub const MIN_SCORE: f32 = 0.30;

/// Candidates requested per wanted result
pub const OVER_FETCH_FACTOR: usize = 2;

/// Compiles attribute matchers into a single OR query
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    wildcard_fields: Vec<String>,
}

impl QueryCompiler {
    pub fn new(wildcard_fields: Vec<String>) -> Self {
        Self { wildcard_fields }
    }

    pub fn wildcard_fields(&self) -> &[String] {
        &self.wildcard_fields
    }

    /// Compile every attribute, in order, into one should-clause each.
    /// A wildcard attribute contributes one clause per wildcard field.
    pub fn compile(&self, query: &SearchQuery) -> Result<EngineQuery> {
        let mut bool_query = BoolQuery::new();

        for attribute in &query.attributes {
            if attribute.is_wildcard() {
                for field in &self.wildcard_fields {
                    bool_query.should(Self::compile_attribute(&attribute.retarget(field))?);
                }
            } else {
                bool_query.should(Self::compile_attribute(attribute)?);
            }
        }

        Ok(bool_query.into())
    }

    /// Search request for `query`: over-fetches by [`OVER_FETCH_FACTOR`] and
    /// applies the [`MIN_SCORE`] floor
    pub fn to_search_request(&self, index: &str, query: &SearchQuery) -> Result<SearchRequest> {
        let compiled = self.compile(query)?;

        Ok(SearchRequest::new(index, compiled)
            .size(query.limit.saturating_mul(OVER_FETCH_FACTOR))
            .from(query.from)
            .min_score(MIN_SCORE)
            .sort(query.sort.clone()))
    }

    fn compile_attribute(attribute: &SearchAttribute) -> Result<EngineQuery> {
        let name = attribute.name.as_str();

        match (attribute.match_type, &attribute.pattern) {
            (MatchType::Eq, AttributePattern::Value(value)) => {
                Ok(EngineQuery::term(name, value.clone()))
            }
            (MatchType::Fuzzy, AttributePattern::Value(value)) => {
                Ok(EngineQuery::fuzzy_match(name, value.to_string()))
            }
            (MatchType::Gte, AttributePattern::Value(value)) => {
                Ok(EngineQuery::range(name, Some(value.clone()), None))
            }
            (MatchType::Lte, AttributePattern::Value(value)) => {
                Ok(EngineQuery::range(name, None, Some(value.clone())))
            }
            (MatchType::Between, AttributePattern::Range(low, high)) => Ok(EngineQuery::range(
                name,
                Some(AttrValue::Integer(*low.min(high))),
                Some(AttrValue::Integer(*low.max(high))),
            )),
            (match_type, pattern) => Err(IndexError::UnsupportedAttributeType(format!(
                "{} cannot be applied to {} on attribute {}",
                match_type, pattern, name
            ))),
        }
    }
}
