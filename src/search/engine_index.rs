//! [`Index`] implementation over an [`EngineClient`]

use crate::engine::{EngineClient, EngineQuery, SearchRequest, SearchResponse, UpdateRequest};
use crate::error::{IndexError, Result};
use crate::models::{IndexEntry, IndexMetrics, SearchQuery, SearchResult};
use crate::search::batch::BatchCoordinator;
use crate::search::compiler::QueryCompiler;
use crate::search::config::IndexSettings;
use crate::search::{mapper, Index};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};
use validator::Validate;

/// Index facade backed by a search engine
pub struct EngineIndex<C> {
    client: Arc<C>,
    settings: IndexSettings,
    compiler: QueryCompiler,
    batch: BatchCoordinator<C>,
}

impl<C: EngineClient> EngineIndex<C> {
    /// Create a facade over `client`, validating the settings
    pub fn new(client: Arc<C>, settings: IndexSettings) -> Result<Self> {
        settings.validate()?;

        let compiler = QueryCompiler::new(settings.wildcard_fields.clone());
        let batch = BatchCoordinator::new(client.clone(), &settings.name, settings.batch_limit());

        info!(
            index = %settings.name,
            wildcard_fields = settings.wildcard_fields.len(),
            max_batch_size = ?settings.batch_limit(),
            "Index facade ready"
        );

        Ok(Self {
            client,
            settings,
            compiler,
            batch,
        })
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn compiler(&self) -> &QueryCompiler {
        &self.compiler
    }

    async fn execute(&self, request: SearchRequest) -> Result<SearchResponse> {
        self.client.search(request).await.map_err(|e| {
            error!(index = %self.settings.name, error = %e, "Search failed");
            IndexError::from(e)
        })
    }
}

#[async_trait]
impl<C: EngineClient + 'static> Index for EngineIndex<C> {
    async fn submit_single_entry(&self, entry: &IndexEntry) -> Result<()> {
        let request = UpdateRequest::upsert(
            &self.settings.name,
            &entry.reference,
            mapper::to_document(entry),
        );

        self.client.update(request).await.map_err(|e| {
            error!(
                index = %self.settings.name,
                reference = %entry.reference,
                error = %e,
                "Failed to index entry"
            );
            IndexError::from(e)
        })?;

        debug!(index = %self.settings.name, reference = %entry.reference, "Indexed entry");
        Ok(())
    }

    async fn begin_batch(&self) -> Result<()> {
        self.batch.begin().await
    }

    async fn submit_batch_entry(&self, entry: &IndexEntry) -> Result<()> {
        self.batch.submit(entry).await
    }

    async fn end_batch(&self) -> Result<()> {
        self.batch.end().await
    }

    async fn search_text(&self, text: &str, max_results: usize) -> Result<SearchResult> {
        let request = SearchRequest::new(&self.settings.name, EngineQuery::simple_query_string(text))
            .size(max_results);
        let response = self.execute(request).await?;

        let matches: Vec<_> = response.hits.iter().map(mapper::to_result_item).collect();
        let last_index = matches.len();

        Ok(SearchResult {
            matches,
            last_index,
        })
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResult> {
        let request = self.compiler.to_search_request(&self.settings.name, query)?;
        let response = self.execute(request).await?;

        debug!(
            index = %self.settings.name,
            hits = response.hits.len(),
            total_hits = response.total_hits,
            took_ms = response.took_ms,
            "Query executed"
        );

        let matches: Vec<_> = response.hits.iter().map(mapper::to_result_item).collect();
        let last_index = matches.len() + query.from;

        Ok(SearchResult {
            matches,
            last_index,
        })
    }

    async fn fetch_metrics(&self) -> Result<IndexMetrics> {
        let stats = self.client.stats(&self.settings.name).await?;

        Ok(IndexMetrics {
            document_count: stats.as_ref().map(|s| s.document_count),
            segment_count: stats.as_ref().map(|s| s.segment_count),
            pending_batch_operations: Some(self.batch.pending_operations()),
            failed_bulk_operations: Some(self.batch.failed_operations()),
        })
    }

    async fn clear_index(&self) -> Result<()> {
        self.client.clear(&self.settings.name).await?;
        info!(index = %self.settings.name, "Index cleared");
        Ok(())
    }
}
