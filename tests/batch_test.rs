//! Batching and request-shaping tests against a recording engine

mod common;

use common::*;
use search_proxy::engine::{EngineQuery, Hit};
use search_proxy::error::IndexError;
use search_proxy::models::{IndexEntry, SearchQuery};
use search_proxy::search::{Index, MIN_SCORE};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn numbered_entry(i: usize) -> IndexEntry {
    let mut entry = IndexEntry::new(format!("ref-{}", i));
    entry.add_attr("somenumber", i as i64);
    entry
}

fn hit(reference: &str) -> Hit {
    Hit {
        id: reference.to_string(),
        score: 1.0,
        source: json!({"id": format!("uid-{}", reference), "reference": reference, "name": "dog"})
            .as_object()
            .cloned()
            .unwrap(),
    }
}

#[tokio::test]
async fn test_flush_count_is_ceiling_of_batch_size() {
    let (engine, index) = recording_index(10);

    assert_ok!(index.begin_batch().await);
    for i in 0..25 {
        assert_ok!(index.submit_batch_entry(&numbered_entry(i)).await);
    }
    assert_ok!(index.end_batch().await);

    assert_eq!(engine.bulk_sizes(), vec![10, 10, 5]);

    let ids = engine.bulk_ids();
    let expected: Vec<String> = (0..25).map(|i| format!("ref-{}", i)).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_unbounded_batch_flushes_once() {
    let (engine, index) = recording_index(-1);

    index.begin_batch().await.unwrap();
    for i in 0..100 {
        index.submit_batch_entry(&numbered_entry(i)).await.unwrap();
    }
    assert!(engine.bulks.lock().is_empty());
    index.end_batch().await.unwrap();

    assert_eq!(engine.bulk_sizes(), vec![100]);
}

#[tokio::test]
async fn test_batch_operations_are_upserts_keyed_by_reference() {
    let (engine, index) = recording_index(0);
    let entry = numbered_entry(7);

    index.begin_batch().await.unwrap();
    index.submit_batch_entry(&entry).await.unwrap();
    index.end_batch().await.unwrap();

    let bulks = engine.bulks.lock();
    let op = &bulks[0].operations()[0];
    assert_eq!(op.index, INDEX_NAME);
    assert_eq!(op.id, "ref-7");
    assert!(op.doc_as_upsert);
    assert_eq!(op.doc["id"], entry.uid.as_str());
    assert_eq!(op.doc["reference"], "ref-7");
    assert_eq!(op.doc["somenumber"], 7);
}

#[tokio::test]
async fn test_submit_outside_batch_fails() {
    let (engine, index) = recording_index(10);

    let result = index.submit_batch_entry(&numbered_entry(1)).await;
    assert!(matches!(result, Err(IndexError::NoActiveBatch)));

    index.begin_batch().await.unwrap();
    index.end_batch().await.unwrap();
    let result = index.submit_batch_entry(&numbered_entry(2)).await;
    assert!(matches!(result, Err(IndexError::NoActiveBatch)));

    assert!(engine.bulks.lock().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submitters_lose_nothing() {
    let (engine, index) = recording_index(16);
    let index = Arc::new(index);

    index.begin_batch().await.unwrap();

    let mut handles = Vec::new();
    for task in 0..8 {
        let index = index.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..50 {
                index
                    .submit_batch_entry(&numbered_entry(task * 50 + i))
                    .await
                    .unwrap();
            }
        }));
    }
    futures::future::try_join_all(handles).await.unwrap();
    index.end_batch().await.unwrap();

    let sizes = engine.bulk_sizes();
    assert_eq!(sizes.len(), 25);
    assert!(sizes.iter().all(|size| *size == 16));

    let ids = engine.bulk_ids();
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(ids.len(), 400);
    assert_eq!(unique.len(), 400);
}

#[tokio::test]
async fn test_partial_bulk_failure_is_not_raised() {
    let (engine, index) = recording_index(0);
    engine.reject("ref-2");

    index.begin_batch().await.unwrap();
    for i in 1..=3 {
        index.submit_batch_entry(&numbered_entry(i)).await.unwrap();
    }
    assert_ok!(index.end_batch().await);

    let metrics = index.fetch_metrics().await.unwrap();
    assert_eq!(metrics.failed_bulk_operations, Some(1));
    assert_eq!(metrics.document_count, None);
}

#[tokio::test]
async fn test_engine_failure_propagates() {
    let (engine, index) = recording_index(0);
    engine.set_unavailable(true);

    let result = index.submit_single_entry(&numbered_entry(1)).await;
    assert!(matches!(result, Err(IndexError::EngineCommunication(_))));

    index.begin_batch().await.unwrap();
    index.submit_batch_entry(&numbered_entry(1)).await.unwrap();
    assert_err!(index.end_batch().await);

    let result = index.search(&SearchQuery::new().and("ident", 6789)).await;
    assert!(matches!(result, Err(IndexError::EngineCommunication(_))));
}

#[tokio::test]
async fn test_single_submit_bypasses_batch() {
    let (engine, index) = recording_index(10);

    index.begin_batch().await.unwrap();
    index.submit_single_entry(&numbered_entry(1)).await.unwrap();

    assert_eq!(engine.updates.lock().len(), 1);
    assert_eq!(engine.updates.lock()[0].id, "ref-1");
    assert_eq!(index.fetch_metrics().await.unwrap().pending_batch_operations, Some(0));
}

#[tokio::test]
async fn test_search_over_fetches_with_score_floor() {
    let (engine, index) = recording_index(0);
    engine.set_hits(vec![hit("1"), hit("2"), hit("3")]);

    let query = SearchQuery::new().with("*", "dog").limit(5).from(4);
    let result = index.search(&query).await.unwrap();

    let request = engine.last_search().unwrap();
    assert_eq!(request.index, INDEX_NAME);
    assert_eq!(request.size, 10);
    assert_eq!(request.from, 4);
    assert_eq!(request.min_score, Some(MIN_SCORE));
    assert_eq!(request.query.should_clauses().len(), 3);

    // Hits are not truncated to the limit
    assert_eq!(result.len(), 3);
    assert_eq!(result.last_index, 7);
    assert_eq!(result.matches[0].index_entry.uid, "uid-1");
    assert_eq!(result.references(), vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_free_text_has_no_floor() {
    let (engine, index) = recording_index(0);
    engine.set_hits(vec![hit("9")]);

    let result = index.search_text("dog AND bog", 25).await.unwrap();

    let request = engine.last_search().unwrap();
    assert_eq!(request.size, 25);
    assert_eq!(request.min_score, None);
    assert_eq!(request.query, EngineQuery::simple_query_string("dog AND bog"));
    assert_eq!(result.last_index, 1);
}

#[tokio::test]
async fn test_unsupported_attribute_never_reaches_engine() {
    use search_proxy::models::{MatchType, SearchAttribute};

    let (engine, index) = recording_index(0);
    let query = SearchQuery::new().with_attribute(SearchAttribute::new("n", 5, MatchType::Between));

    let result = index.search(&query).await;

    assert!(matches!(result, Err(IndexError::UnsupportedAttributeType(_))));
    assert!(engine.searches.lock().is_empty());
}

#[tokio::test]
async fn test_clear_without_engine_support_is_noop() {
    let (_engine, index) = recording_index(0);
    assert_ok!(index.clear_index().await);
}
