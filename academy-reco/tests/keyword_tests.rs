//! Keyword recommendations and cleanup of their temporary anchor points.

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use academy_reco::{ContentPoint, ContentType, InMemoryVectorIndex, RecoError, RecommenderConfig, VectorSpace};
use common::{Fault, FaultyIndex, TableEncoder, payload, recommender, remaining_ephemeral_points};

const PYTHON: [f32; 3] = [1.0, 0.0, 0.0];
const JAVA: [f32; 3] = [0.0, 1.0, 0.0];

fn catalogue() -> Arc<InMemoryVectorIndex> {
    Arc::new(InMemoryVectorIndex::with_points([
        // cos(PYTHON) ~ 0.95, cos(JAVA) ~ 0.31
        ContentPoint::new("py-chunk", payload("python-course", ContentType::Text, "Programming"))
            .with_vector(VectorSpace::Text, vec![0.95, 0.3122, 0.0]),
        // cos(PYTHON) ~ 0.1, cos(JAVA) = 0
        ContentPoint::new("garden-chunk", payload("gardening", ContentType::Text, "Hobbies"))
            .with_vector(VectorSpace::Text, vec![0.1, 0.0, 0.995]),
        ContentPoint::new("jvm-chunk", payload("jvm-internals", ContentType::VideoChunk, "Programming"))
            .with_vector(VectorSpace::Text, vec![0.0, 0.98, 0.2]),
    ]))
}

fn encoder() -> TableEncoder {
    TableEncoder::new(&[("Python", PYTHON.to_vec()), ("Java", JAVA.to_vec())])
}

fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[tokio::test]
async fn python_keyword_surfaces_the_python_course_first() {
    let index = catalogue();
    let (engine, _) = recommender(index.clone(), Arc::new(encoder()), RecommenderConfig::default());

    let results = engine.get_recommendations_for_keywords(&keywords(&["Python"]), 5, 10).await.unwrap();
    assert_eq!(results[0].source_key, "python-course");
    assert_eq!(results[0].keyword.as_deref(), Some("Python"));
    assert!((results[0].similarity_score - 0.95).abs() < 1e-3);
    assert!(results.iter().all(|c| c.keyword.as_deref() == Some("Python")));
    assert!(remaining_ephemeral_points(&index).await.is_empty());
    assert_eq!(index.len().await, 3);
}

#[tokio::test]
async fn keywords_merge_into_one_entry_per_document() {
    let index = catalogue();
    let (engine, _) = recommender(index.clone(), Arc::new(encoder()), RecommenderConfig::default());

    let results =
        engine.get_recommendations_for_keywords(&keywords(&["Python", "Java"]), 5, 10).await.unwrap();
    let keys: Vec<&str> = results.iter().map(|c| c.source_key.as_str()).collect();
    assert_eq!(keys.iter().collect::<HashSet<_>>().len(), keys.len());
    assert_eq!(keys[0], "jvm-internals");
    assert_eq!(results[0].keyword.as_deref(), Some("Java"));

    let python = results.iter().find(|c| c.source_key == "python-course").unwrap();
    assert_eq!(python.keyword.as_deref(), Some("Python"));
    for pair in results.windows(2) {
        assert!(pair[0].similarity_score >= pair[1].similarity_score);
    }
}

#[tokio::test]
async fn final_limit_truncates_merged_results() {
    let index = catalogue();
    let (engine, _) = recommender(index, Arc::new(encoder()), RecommenderConfig::default());

    let results =
        engine.get_recommendations_for_keywords(&keywords(&["Python", "Java"]), 5, 1).await.unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn failing_search_for_one_keyword_still_cleans_up_every_anchor() {
    let inner = catalogue();
    let index = Arc::new(FaultyIndex::new(inner.clone()).fault_on_query(JAVA.to_vec(), Fault::Error));
    let (engine, _) = recommender(index.clone(), Arc::new(encoder()), RecommenderConfig::default());

    let results =
        engine.get_recommendations_for_keywords(&keywords(&["Python", "Java"]), 5, 10).await.unwrap();
    assert!(!results.is_empty());
    assert!(results.iter().all(|c| c.keyword.as_deref() == Some("Python")));
    assert_eq!(index.deletes.load(Ordering::SeqCst), 2);
    assert!(remaining_ephemeral_points(&inner).await.is_empty());
}

#[tokio::test]
async fn unencodable_keywords_are_skipped() {
    let index = catalogue();
    let encoder = encoder().failing_on("Java");
    let (engine, _) = recommender(index.clone(), Arc::new(encoder), RecommenderConfig::default());

    // "Cobol" encodes to an empty vector, "Java" errors.
    let results = engine
        .get_recommendations_for_keywords(&keywords(&["Cobol", "Java", "Python"]), 5, 10)
        .await
        .unwrap();
    assert!(!results.is_empty());
    assert!(results.iter().all(|c| c.keyword.as_deref() == Some("Python")));
    assert!(remaining_ephemeral_points(&index).await.is_empty());
}

#[tokio::test]
async fn failed_anchor_insert_skips_the_keyword() {
    let inner = catalogue();
    let index = Arc::new(FaultyIndex::new(inner.clone()).failing_inserts());
    let (engine, _) = recommender(index.clone(), Arc::new(encoder()), RecommenderConfig::default());

    let results = engine.get_recommendations_for_keywords(&keywords(&["Python"]), 5, 10).await.unwrap();
    assert!(results.is_empty());
    // The attempted id is still released in case the write landed.
    assert_eq!(index.deletes.load(Ordering::SeqCst), 1);
    assert!(remaining_ephemeral_points(&inner).await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn timeout_during_an_unacknowledged_insert_still_deletes_the_anchor() {
    let inner = catalogue();
    let index = Arc::new(FaultyIndex::new(inner.clone()).slow_insert_ack(Duration::from_secs(5)));
    let config = RecommenderConfig::builder().request_timeout(Duration::from_millis(100)).build().unwrap();
    let (engine, _) = recommender(index.clone(), Arc::new(encoder()), config);

    let err = engine.get_recommendations_for_keywords(&keywords(&["Python"]), 5, 10).await.unwrap_err();
    assert!(matches!(err, RecoError::Timeout { timeout_ms: 100, .. }));
    assert_eq!(index.deletes.load(Ordering::SeqCst), 1);
    assert!(remaining_ephemeral_points(&inner).await.is_empty());
    assert_eq!(inner.len().await, 3);
}

#[tokio::test]
async fn cleanup_failures_are_not_fatal_and_anchors_never_surface() {
    let inner = catalogue();
    let index = Arc::new(FaultyIndex::new(inner.clone()).failing_deletes());
    let (engine, _) = recommender(index.clone(), Arc::new(encoder()), RecommenderConfig::default());

    let results =
        engine.get_recommendations_for_keywords(&keywords(&["Python", "Java"]), 5, 10).await.unwrap();
    assert!(!results.is_empty());

    let orphans: HashSet<String> = remaining_ephemeral_points(&inner).await.into_iter().collect();
    assert_eq!(orphans.len(), 2);
    assert_eq!(index.deletes.load(Ordering::SeqCst), 2);
    for candidate in &results {
        assert!(!orphans.contains(&candidate.point_id));
        assert!(!candidate.best_matching_chunk_payload.is_ephemeral());
    }
}

#[tokio::test]
async fn empty_keyword_list_returns_nothing() {
    let index = catalogue();
    let (engine, _) = recommender(index.clone(), Arc::new(encoder()), RecommenderConfig::default());

    assert!(engine.get_recommendations_for_keywords(&[], 5, 10).await.unwrap().is_empty());
    assert!(engine.get_recommendations_for_keywords(&keywords(&["Python"]), 0, 10).await.unwrap().is_empty());
    assert_eq!(index.len().await, 3);
}

#[tokio::test]
async fn out_of_range_limits_are_rejected_before_touching_the_index() {
    let inner = catalogue();
    let index = Arc::new(FaultyIndex::new(inner.clone()));
    let (engine, _) = recommender(index.clone(), Arc::new(encoder()), RecommenderConfig::default());

    let err = engine.get_recommendations_for_keywords(&keywords(&["Python"]), 5, 101).await.unwrap_err();
    assert!(matches!(err, RecoError::InvalidRequest(_)));
    let err = engine.get_recommendations_for_keywords(&keywords(&["Python"]), 500, 10).await.unwrap_err();
    assert!(matches!(err, RecoError::InvalidRequest(_)));
    assert_eq!(inner.len().await, 3);
}

#[tokio::test(start_paused = true)]
async fn timeout_still_deletes_the_anchors() {
    let inner = catalogue();
    let index = Arc::new(FaultyIndex::new(inner.clone()).fault_on_query(JAVA.to_vec(), Fault::Hang));
    let config = RecommenderConfig::builder().request_timeout(Duration::from_millis(500)).build().unwrap();
    let (engine, _) = recommender(index.clone(), Arc::new(encoder()), config);

    let err = engine
        .get_recommendations_for_keywords(&keywords(&["Python", "Java"]), 5, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, RecoError::Timeout { timeout_ms: 500, .. }));
    assert_eq!(index.deletes.load(Ordering::SeqCst), 2);
    assert!(remaining_ephemeral_points(&inner).await.is_empty());
}

#[tokio::test]
async fn cancelled_request_deletes_anchors_in_the_background() {
    let inner = catalogue();
    let index = Arc::new(FaultyIndex::new(inner.clone()).fault_on_query(PYTHON.to_vec(), Fault::Hang));
    let (engine, _) = recommender(index.clone(), Arc::new(encoder()), RecommenderConfig::default());
    let engine = Arc::new(engine);

    let request = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.get_recommendations_for_keywords(&keywords(&["Python"]), 5, 10).await }
    });

    tokio::time::timeout(Duration::from_secs(5), async {
        while remaining_ephemeral_points(&inner).await.is_empty() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("anchor was never inserted");

    request.abort();
    assert!(request.await.unwrap_err().is_cancelled());

    tokio::time::timeout(Duration::from_secs(5), async {
        while !remaining_ephemeral_points(&inner).await.is_empty() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("anchor was never deleted");
    assert_eq!(index.deletes.load(Ordering::SeqCst), 1);
}
