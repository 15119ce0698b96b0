//! Tantivy-backed engine
//!
//! Each index name maps to its own Tantivy index. Documents are stored whole as
//! JSON under a reserved `_source` field and keyed by a reserved `_id` field;
//! mapped fields are indexed alongside for querying.
//!
//! ```text
//!   UpdateRequest ──► merge with stored _source ──► delete _id term + add doc ──► commit ──► reload
//!   SearchRequest ──► EngineQuery → Tantivy query ──► score floor ──► sort/page ──► hits from _source
//! ```

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::query::{EngineQuery, Fuzziness, RangeQuery as RangeBounds};
use crate::engine::request::{
    BulkItemResponse, BulkRequest, BulkResponse, Document, EngineStats, Hit, SearchRequest,
    SearchResponse, UpdateRequest,
};
use crate::engine::EngineClient;
use crate::models::{AttrValue, Sort, SortDirection};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::ops::Bound;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{
    BooleanQuery, EmptyQuery, FuzzyTermQuery, Occur, Query, QueryParser, RangeQuery, TermQuery,
};
use tantivy::schema::{
    Field, FieldEntry, FieldType, IndexRecordOption, Schema, Value, FAST, INDEXED, STORED, STRING,
    TEXT,
};
use tantivy::tokenizer::TokenStream;
use tantivy::{DocAddress, Index, IndexReader, IndexWriter, ReloadPolicy, Score, Searcher};
use tantivy::{TantivyDocument, Term};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Reserved field holding the engine document id
pub const ID_FIELD: &str = "_id";

/// Reserved field holding the full stored document as JSON
pub const SOURCE_FIELD: &str = "_source";

/// How a mapped field is indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Tokenized full text
    Text,
    /// Whole value as a single token
    Keyword,
    /// Signed 64-bit integer, usable in range queries
    Integer,
}

/// A searchable field of every index created by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldMapping {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn keyword(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Keyword)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }
}

/// Tantivy engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TantivyEngineConfig {
    /// Directory holding one sub-directory per index; indexes live in memory
    /// when unset
    #[serde(default)]
    pub index_dir: Option<PathBuf>,

    /// Index writer heap size in bytes (default: 50MB)
    #[serde(default = "default_writer_heap_size")]
    pub writer_heap_size: usize,

    /// Searchable fields. Unmapped fields are stored but not searchable.
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
}

fn default_writer_heap_size() -> usize {
    50_000_000
}

impl Default for TantivyEngineConfig {
    fn default() -> Self {
        Self {
            index_dir: None,
            writer_heap_size: default_writer_heap_size(),
            fields: Vec::new(),
        }
    }
}

impl TantivyEngineConfig {
    pub fn in_memory(fields: Vec<FieldMapping>) -> Self {
        Self {
            fields,
            ..Default::default()
        }
    }

    pub fn in_dir(index_dir: impl Into<PathBuf>, fields: Vec<FieldMapping>) -> Self {
        Self {
            index_dir: Some(index_dir.into()),
            fields,
            ..Default::default()
        }
    }
}

/// Build the schema shared by every index of the engine
pub fn build_schema(fields: &[FieldMapping]) -> EngineResult<Schema> {
    let mut schema_builder = Schema::builder();
    let mut seen = HashSet::new();

    // Reserved fields
    schema_builder.add_text_field(ID_FIELD, STRING | STORED);
    schema_builder.add_text_field(SOURCE_FIELD, STORED);

    for mapping in fields {
        if mapping.name == ID_FIELD || mapping.name == SOURCE_FIELD {
            return Err(EngineError::IndexInitFailed(format!(
                "Field name {} is reserved",
                mapping.name
            )));
        }
        if !seen.insert(mapping.name.as_str()) {
            return Err(EngineError::IndexInitFailed(format!(
                "Field {} is mapped more than once",
                mapping.name
            )));
        }

        match mapping.kind {
            FieldKind::Text => schema_builder.add_text_field(&mapping.name, TEXT),
            FieldKind::Keyword => schema_builder.add_text_field(&mapping.name, STRING),
            FieldKind::Integer => schema_builder.add_i64_field(&mapping.name, INDEXED | FAST),
        };
    }

    Ok(schema_builder.build())
}

/// Kind of a schema field, read back from the schema itself so that indexes
/// opened from disk keep the mapping they were created with
fn field_kind(entry: &FieldEntry) -> Option<FieldKind> {
    match entry.field_type() {
        FieldType::Str(options) => match options.get_indexing_options() {
            Some(indexing) if indexing.tokenizer() == "raw" => Some(FieldKind::Keyword),
            Some(_) => Some(FieldKind::Text),
            None => None,
        },
        FieldType::I64(_) => Some(FieldKind::Integer),
        _ => None,
    }
}

fn json_to_i64(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Order two stored values for a field sort. Missing values always sort last.
fn compare_sort_values(
    a: Option<&serde_json::Value>,
    b: Option<&serde_json::Value>,
    direction: SortDirection,
) -> Ordering {
    let ordered = |ordering: Ordering| match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    };

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => ordered(x.partial_cmp(&y).unwrap_or(Ordering::Equal)),
            _ => ordered(json_to_text(a).cmp(&json_to_text(b))),
        },
    }
}

/// One open Tantivy index
struct IndexHandle {
    name: String,
    index: Index,
    id_field: Field,
    source_field: Field,
    fields: HashMap<String, (Field, FieldKind)>,
    writer: RwLock<IndexWriter>,
    reader: IndexReader,
}

impl IndexHandle {
    fn open(name: &str, config: &TantivyEngineConfig) -> EngineResult<Self> {
        let schema = build_schema(&config.fields)?;

        let index = match &config.index_dir {
            Some(dir) => {
                let path = dir.join(name);
                std::fs::create_dir_all(&path).map_err(|e| {
                    EngineError::IndexInitFailed(format!(
                        "Failed to create index directory: {}",
                        e
                    ))
                })?;

                if path.join("meta.json").exists() {
                    Index::open_in_dir(&path).map_err(|e| {
                        EngineError::IndexInitFailed(format!(
                            "Failed to open existing index: {}",
                            e
                        ))
                    })?
                } else {
                    Index::create_in_dir(&path, schema).map_err(|e| {
                        EngineError::IndexInitFailed(format!("Failed to create new index: {}", e))
                    })?
                }
            }
            None => Index::create_in_ram(schema),
        };

        let schema = index.schema();
        let reserved = |field_name: &str| {
            schema.get_field(field_name).map_err(|_| {
                EngineError::IndexInitFailed(format!(
                    "Index {} is missing reserved field {}",
                    name, field_name
                ))
            })
        };
        let id_field = reserved(ID_FIELD)?;
        let source_field = reserved(SOURCE_FIELD)?;

        let fields = schema
            .fields()
            .filter(|(field, _)| *field != id_field && *field != source_field)
            .filter_map(|(field, entry)| {
                field_kind(entry).map(|kind| (entry.name().to_string(), (field, kind)))
            })
            .collect();

        let writer = index
            .writer_with_num_threads(1, config.writer_heap_size)
            .map_err(|e| EngineError::IndexInitFailed(format!("Failed to create writer: {}", e)))?;

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| EngineError::IndexInitFailed(format!("Failed to create reader: {}", e)))?;

        Ok(Self {
            name: name.to_string(),
            index,
            id_field,
            source_field,
            fields,
            writer: RwLock::new(writer),
            reader,
        })
    }

    fn source_of(&self, doc: &TantivyDocument) -> EngineResult<Document> {
        let raw = doc
            .get_first(self.source_field)
            .and_then(|v| v.as_str())
            .unwrap_or("{}");
        Ok(serde_json::from_str(raw)?)
    }

    fn id_of(&self, doc: &TantivyDocument) -> String {
        doc.get_first(self.id_field)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_default()
    }

    /// Stored document for `id` as of the last commit
    fn load_source(&self, searcher: &Searcher, id: &str) -> EngineResult<Option<Document>> {
        let query = TermQuery::new(
            Term::from_field_text(self.id_field, id),
            IndexRecordOption::Basic,
        );
        let top_docs = searcher.search(&query, &TopDocs::with_limit(1))?;

        match top_docs.first() {
            Some((_, address)) => {
                let doc: TantivyDocument = searcher.doc(*address)?;
                Ok(Some(self.source_of(&doc)?))
            }
            None => Ok(None),
        }
    }

    /// Convert a stored document into a Tantivy document.
    ///
    /// Fails with a reason when a mapped integer field holds a value that does
    /// not coerce to an integer.
    fn to_tantivy_doc(&self, id: &str, source: &Document) -> Result<TantivyDocument, String> {
        let mut doc = TantivyDocument::new();
        doc.add_text(self.id_field, id);
        doc.add_text(
            self.source_field,
            serde_json::to_string(source).map_err(|e| e.to_string())?,
        );

        for (name, value) in source {
            let Some(&(field, kind)) = self.fields.get(name) else {
                continue;
            };
            if value.is_null() {
                continue;
            }

            match kind {
                FieldKind::Text | FieldKind::Keyword => doc.add_text(field, json_to_text(value)),
                FieldKind::Integer => {
                    let n = json_to_i64(value).ok_or_else(|| {
                        format!("field [{}] expects an integer, found {}", name, value)
                    })?;
                    doc.add_i64(field, n);
                }
            }
        }

        Ok(doc)
    }

    /// Stage one update in the writer. `staged` holds documents written
    /// earlier in the same commit, which the searcher cannot see yet.
    fn stage_update(
        &self,
        writer: &IndexWriter,
        searcher: &Searcher,
        staged: &mut HashMap<String, Document>,
        request: &UpdateRequest,
    ) -> Result<(), String> {
        let existing = match staged.get(&request.id) {
            Some(doc) => Some(doc.clone()),
            None => self
                .load_source(searcher, &request.id)
                .map_err(|e| e.to_string())?,
        };

        let merged = match existing {
            Some(mut doc) => {
                for (key, value) in &request.doc {
                    doc.insert(key.clone(), value.clone());
                }
                doc
            }
            None if request.doc_as_upsert => request.doc.clone(),
            None => return Err(format!("document [{}] missing", request.id)),
        };

        let tantivy_doc = self.to_tantivy_doc(&request.id, &merged)?;

        writer.delete_term(Term::from_field_text(self.id_field, &request.id));
        writer
            .add_document(tantivy_doc)
            .map_err(|e| format!("Failed to add document: {}", e))?;

        staged.insert(request.id.clone(), merged);
        Ok(())
    }

    fn commit(&self, writer: &mut IndexWriter) -> EngineResult<()> {
        writer
            .commit()
            .map_err(|e| EngineError::IndexingFailed(format!("Failed to commit: {}", e)))?;
        self.reader
            .reload()
            .map_err(|e| EngineError::IndexingFailed(format!("Failed to reload reader: {}", e)))?;
        Ok(())
    }

    async fn update(&self, request: &UpdateRequest) -> EngineResult<()> {
        let mut writer = self.writer.write().await;
        let searcher = self.reader.searcher();
        let mut staged = HashMap::new();

        self.stage_update(&writer, &searcher, &mut staged, request)
            .map_err(|reason| EngineError::DocumentRejected {
                id: request.id.clone(),
                reason,
            })?;

        self.commit(&mut writer)
    }

    /// Apply updates in order, returning one outcome per update
    async fn bulk(&self, requests: &[&UpdateRequest]) -> EngineResult<Vec<BulkItemResponse>> {
        let mut writer = self.writer.write().await;
        let searcher = self.reader.searcher();
        let mut staged = HashMap::new();
        let mut items = Vec::with_capacity(requests.len());

        for request in requests {
            match self.stage_update(&writer, &searcher, &mut staged, request) {
                Ok(()) => items.push(BulkItemResponse::ok(&request.id)),
                Err(reason) => {
                    debug!(index = %self.name, id = %request.id, %reason, "Bulk item rejected");
                    items.push(BulkItemResponse::failed(&request.id, reason));
                }
            }
        }

        if !staged.is_empty() {
            self.commit(&mut writer)?;
        }

        Ok(items)
    }

    async fn clear(&self) -> EngineResult<()> {
        let mut writer = self.writer.write().await;
        writer
            .delete_all_documents()
            .map_err(|e| EngineError::IndexingFailed(format!("Failed to clear index: {}", e)))?;
        self.commit(&mut writer)
    }

    fn stats(&self) -> EngineStats {
        let searcher = self.reader.searcher();
        EngineStats {
            document_count: searcher.num_docs(),
            segment_count: searcher.segment_readers().len(),
        }
    }

    fn build_query(&self, query: &EngineQuery) -> EngineResult<Box<dyn Query>> {
        match query {
            EngineQuery::Bool(bool_query) => {
                let clauses = bool_query
                    .should
                    .iter()
                    .map(|sub| Ok((Occur::Should, self.build_query(sub)?)))
                    .collect::<EngineResult<Vec<_>>>()?;
                Ok(Self::disjunction(clauses))
            }
            EngineQuery::Term { field, value } => Ok(self.term_query(field, value)),
            EngineQuery::Match {
                field,
                query,
                fuzziness,
            } => self.match_query(field, query, *fuzziness),
            EngineQuery::Range(bounds) => Ok(self.range_query(bounds)),
            EngineQuery::SimpleQueryString { query } => Ok(self.simple_query(query)),
        }
    }

    fn disjunction(clauses: Vec<(Occur, Box<dyn Query>)>) -> Box<dyn Query> {
        match clauses.len() {
            0 => Box::new(EmptyQuery),
            _ => Box::new(BooleanQuery::new(clauses)),
        }
    }

    fn mapped(&self, name: &str) -> Option<(Field, FieldKind)> {
        let mapped = self.fields.get(name).copied();
        if mapped.is_none() {
            debug!(index = %self.name, field = name, "Query on unmapped field matches nothing");
        }
        mapped
    }

    /// Integer equality as a single-point range, which scores like the other
    /// range clauses
    fn integer_equals(field_name: &str, value: i64) -> Box<dyn Query> {
        Box::new(RangeQuery::new_i64_bounds(
            field_name.to_string(),
            Bound::Included(value),
            Bound::Included(value),
        ))
    }

    fn term_query(&self, field_name: &str, value: &AttrValue) -> Box<dyn Query> {
        let Some((field, kind)) = self.mapped(field_name) else {
            return Box::new(EmptyQuery);
        };

        match kind {
            FieldKind::Integer => match value.as_i64() {
                Some(n) => Self::integer_equals(field_name, n),
                None => Box::new(EmptyQuery),
            },
            FieldKind::Text => Box::new(TermQuery::new(
                Term::from_field_text(field, &value.to_string()),
                IndexRecordOption::WithFreqs,
            )),
            FieldKind::Keyword => Box::new(TermQuery::new(
                Term::from_field_text(field, &value.to_string()),
                IndexRecordOption::Basic,
            )),
        }
    }

    fn match_query(
        &self,
        field_name: &str,
        text: &str,
        fuzziness: Fuzziness,
    ) -> EngineResult<Box<dyn Query>> {
        let Some((field, kind)) = self.mapped(field_name) else {
            return Ok(Box::new(EmptyQuery));
        };

        if kind == FieldKind::Integer {
            return Ok(match text.trim().parse::<i64>() {
                Ok(n) => Self::integer_equals(field_name, n),
                Err(_) => Box::new(EmptyQuery),
            });
        }

        let mut analyzer = self.index.tokenizer_for_field(field)?;
        let mut tokens: Vec<String> = Vec::new();
        let mut stream = analyzer.token_stream(text);
        while stream.advance() {
            let token = &stream.token().text;
            if !tokens.contains(token) {
                tokens.push(token.clone());
            }
        }

        let clauses = tokens
            .iter()
            .map(|token| {
                let query: Box<dyn Query> = Box::new(FuzzyTermQuery::new(
                    Term::from_field_text(field, token),
                    fuzziness.distance(token),
                    true,
                ));
                (Occur::Should, query)
            })
            .collect();

        Ok(Self::disjunction(clauses))
    }

    fn range_query(&self, bounds: &RangeBounds) -> Box<dyn Query> {
        let Some((_, kind)) = self.mapped(&bounds.field) else {
            return Box::new(EmptyQuery);
        };
        if kind != FieldKind::Integer {
            debug!(index = %self.name, field = %bounds.field, "Range on non-integer field matches nothing");
            return Box::new(EmptyQuery);
        }

        let bound = |value: &Option<AttrValue>| match value {
            None => Some(Bound::Unbounded),
            Some(v) => v.as_i64().map(Bound::Included),
        };

        match (bound(&bounds.gte), bound(&bounds.lte)) {
            (Some(lower), Some(upper)) => Box::new(RangeQuery::new_i64_bounds(
                bounds.field.clone(),
                lower,
                upper,
            )),
            _ => Box::new(EmptyQuery),
        }
    }

    fn simple_query(&self, text: &str) -> Box<dyn Query> {
        let default_fields: Vec<Field> = self
            .fields
            .values()
            .filter(|(_, kind)| *kind != FieldKind::Integer)
            .map(|(field, _)| *field)
            .collect();

        let query_parser = QueryParser::for_index(&self.index, default_fields);
        let (query, errors) = query_parser.parse_query_lenient(text);
        if !errors.is_empty() {
            debug!(index = %self.name, errors = errors.len(), "Query text parsed leniently");
        }
        query
    }

    fn hit(&self, searcher: &Searcher, score: Score, address: DocAddress) -> EngineResult<Hit> {
        let doc: TantivyDocument = searcher
            .doc(address)
            .map_err(|e| EngineError::SearchFailed(format!("Failed to retrieve doc: {}", e)))?;

        Ok(Hit {
            id: self.id_of(&doc),
            score,
            source: self.source_of(&doc)?,
        })
    }

    fn search(&self, request: &SearchRequest) -> EngineResult<SearchResponse> {
        let start_time = Instant::now();
        let query = self.build_query(&request.query)?;
        let searcher = self.reader.searcher();

        let matched = searcher
            .search(&*query, &Count)
            .map_err(|e| EngineError::SearchFailed(format!("Failed to count matches: {}", e)))?;

        let (hits, total_hits) = if request.min_score.is_none() && request.sort.is_none() {
            // The collector preallocates its limit, so size it to what can be returned
            let wanted = request.size.min(matched.saturating_sub(request.from));
            let hits = if wanted == 0 {
                Vec::new()
            } else {
                let collector = TopDocs::with_limit(wanted).and_offset(request.from);
                searcher
                    .search(&*query, &collector)
                    .map_err(|e| EngineError::SearchFailed(format!("Search execution failed: {}", e)))?
                    .into_iter()
                    .map(|(score, address)| self.hit(&searcher, score, address))
                    .collect::<EngineResult<Vec<_>>>()?
            };
            (hits, matched)
        } else {
            self.search_all_candidates(&searcher, &*query, matched, request)?
        };

        Ok(SearchResponse {
            hits,
            total_hits,
            took_ms: start_time.elapsed().as_millis() as u64,
        })
    }

    /// Score every match so the floor applies before paging, then sort and
    /// page the qualifying hits
    fn search_all_candidates(
        &self,
        searcher: &Searcher,
        query: &dyn Query,
        matched: usize,
        request: &SearchRequest,
    ) -> EngineResult<(Vec<Hit>, usize)> {
        if matched == 0 {
            return Ok((Vec::new(), 0));
        }

        let min_score = request.min_score.unwrap_or(Score::MIN);
        let candidates: Vec<(Score, DocAddress)> = searcher
            .search(query, &TopDocs::with_limit(matched))
            .map_err(|e| EngineError::SearchFailed(format!("Search execution failed: {}", e)))?
            .into_iter()
            .filter(|(score, _)| *score >= min_score)
            .collect();
        let total_hits = candidates.len();

        let hits = match &request.sort {
            Some(Sort { field, direction }) => {
                let mut hits = candidates
                    .into_iter()
                    .map(|(score, address)| self.hit(searcher, score, address))
                    .collect::<EngineResult<Vec<_>>>()?;
                hits.sort_by(|a, b| {
                    compare_sort_values(a.source.get(field), b.source.get(field), *direction)
                });
                hits.into_iter().skip(request.from).take(request.size).collect()
            }
            None => candidates
                .into_iter()
                .skip(request.from)
                .take(request.size)
                .map(|(score, address)| self.hit(searcher, score, address))
                .collect::<EngineResult<Vec<_>>>()?,
        };

        Ok((hits, total_hits))
    }
}

/// Full-text engine over local Tantivy indexes
pub struct TantivyEngine {
    config: TantivyEngineConfig,
    indices: DashMap<String, Arc<IndexHandle>>,
}

impl TantivyEngine {
    pub fn new(config: TantivyEngineConfig) -> Self {
        Self {
            config,
            indices: DashMap::new(),
        }
    }

    pub fn in_memory(fields: Vec<FieldMapping>) -> Self {
        Self::new(TantivyEngineConfig::in_memory(fields))
    }

    pub fn config(&self) -> &TantivyEngineConfig {
        &self.config
    }

    /// Open or create the named index ahead of first use
    pub fn ensure_index(&self, name: &str) -> EngineResult<()> {
        self.handle(name).map(|_| ())
    }

    fn handle(&self, name: &str) -> EngineResult<Arc<IndexHandle>> {
        if let Some(handle) = self.indices.get(name) {
            return Ok(handle.value().clone());
        }

        match self.indices.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let handle = Arc::new(IndexHandle::open(name, &self.config)?);
                info!(
                    index = name,
                    fields = handle.fields.len(),
                    persistent = self.config.index_dir.is_some(),
                    "Opened search index"
                );
                entry.insert(handle.clone());
                Ok(handle)
            }
        }
    }
}

#[async_trait]
impl EngineClient for TantivyEngine {
    async fn update(&self, request: UpdateRequest) -> EngineResult<()> {
        let handle = self.handle(&request.index)?;
        handle.update(&request).await
    }

    async fn bulk(&self, request: BulkRequest) -> EngineResult<BulkResponse> {
        let start_time = Instant::now();
        let operations = request.into_operations();

        // Group by index, remembering each operation's position
        let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
        for (position, operation) in operations.iter().enumerate() {
            match groups.iter_mut().find(|(index, _)| *index == operation.index) {
                Some((_, positions)) => positions.push(position),
                None => groups.push((operation.index.clone(), vec![position])),
            }
        }

        let mut items: Vec<Option<BulkItemResponse>> = vec![None; operations.len()];
        for (index, positions) in groups {
            let handle = self.handle(&index)?;
            let requests: Vec<&UpdateRequest> =
                positions.iter().map(|&position| &operations[position]).collect();
            let outcomes = handle.bulk(&requests).await?;

            for (position, outcome) in positions.into_iter().zip(outcomes) {
                items[position] = Some(outcome);
            }
        }

        let response = BulkResponse {
            items: items.into_iter().flatten().collect(),
            took_ms: start_time.elapsed().as_millis() as u64,
        };
        if response.has_failures() {
            warn!(
                failed = response.failures().count(),
                total = response.items.len(),
                "Bulk request applied with item failures"
            );
        }
        Ok(response)
    }

    async fn search(&self, request: SearchRequest) -> EngineResult<SearchResponse> {
        let handle = self.handle(&request.index)?;
        handle.search(&request)
    }

    async fn stats(&self, index: &str) -> EngineResult<Option<EngineStats>> {
        Ok(Some(self.handle(index)?.stats()))
    }

    async fn clear(&self, index: &str) -> EngineResult<()> {
        self.handle(index)?.clear().await
    }
}
