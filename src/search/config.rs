//! Index facade configuration

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Settings for one [`EngineIndex`](crate::search::EngineIndex)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct IndexSettings {
    /// Engine index name
    #[validate(length(min = 1))]
    pub name: String,

    /// Fields searched by the `*` attribute
    #[serde(default)]
    pub wildcard_fields: Vec<String>,

    /// Operations per bulk write; zero or negative means unbounded
    #[serde(default)]
    pub max_batch_size: i64,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            name: "entries".to_string(),
            wildcard_fields: Vec::new(),
            max_batch_size: 0,
        }
    }
}

impl IndexSettings {
    /// Batch size limit, if any
    pub fn batch_limit(&self) -> Option<usize> {
        usize::try_from(self.max_batch_size).ok().filter(|max| *max > 0)
    }
}

/// Builder for IndexSettings
pub struct IndexSettingsBuilder {
    settings: IndexSettings,
}

impl IndexSettingsBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            settings: IndexSettings {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    pub fn wildcard_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.wildcard_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_batch_size(mut self, max: i64) -> Self {
        self.settings.max_batch_size = max;
        self
    }

    pub fn build(self) -> IndexSettings {
        self.settings
    }
}
