use async_trait::async_trait;
use serde_json::{json, Value};
use socialpedia_cache::EmbeddingCache;
use socialpedia_core::{Collection, MemoryStore, ProjectionMode, Record, RecordStore, SearchConfig};
use socialpedia_semantic::{
    CachedProvider, EmbeddingProvider, FastEmbedProvider, RankingEngine, Result, SemanticError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Deterministic stand-in for a sentence embedding model.
///
/// Each known word adds weight to one concept axis, so texts about the same
/// concepts point the same way. Unknown words are ignored.
struct ConceptProvider;

const AXES: &[&[&str]] = &[
    &["student", "students", "learner", "learners"],
    &["programming", "coding", "code", "hackathon", "challenge", "rust"],
    &["events", "event", "night", "meetup", "workshop"],
    &["music", "karaoke", "live", "concert", "singing"],
    &["cooking", "recipes", "chef", "baking"],
];

impl ConceptProvider {
    fn vectorize(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; AXES.len()];
        for word in text.split(|c: char| !c.is_alphanumeric()) {
            let word = word.to_lowercase();
            for (axis, words) in AXES.iter().enumerate() {
                if words.contains(&word.as_str()) {
                    vector[axis] += 1.0;
                }
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for ConceptProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vectorize(text))
    }
}

/// Wraps a provider with per-text latency and call accounting
struct SlowProvider<P> {
    inner: P,
    delay: fn(&str) -> Duration,
    started: AtomicUsize,
    completed: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl<P> SlowProvider<P> {
    fn new(inner: P, delay: fn(&str) -> Duration) -> Self {
        Self {
            inner,
            delay,
            started: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for SlowProvider<P> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep((self.delay)(text)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text).await
    }
}

fn record(value: Value) -> Record {
    Record::try_from(value).unwrap()
}

fn event(id: &str, description: &str) -> Record {
    record(json!({"_id": id, "type": "event", "description": description}))
}

fn user(id: &str, first: &str, bio: &str, occupation: &str) -> Record {
    record(json!({"_id": id, "firstName": first, "bio": bio, "occupation": occupation}))
}

fn ids(results: &[socialpedia_semantic::ScoredRecord]) -> Vec<String> {
    results
        .iter()
        .map(|r| r.record().get_str("_id").unwrap_or_default().to_string())
        .collect()
}

fn concept_engine(config: SearchConfig) -> RankingEngine {
    RankingEngine::new(Arc::new(ConceptProvider), config).unwrap()
}

fn mixed_posts() -> Vec<Record> {
    vec![
        event("karaoke", "Live karaoke night with music"),
        event("hack", "A 24-hour coding challenge for students"),
        record(json!({"_id": "blank", "type": "event", "title": "Mystery"})),
        event("rust", "Rust workshop for student learners"),
        event("cook", "Baking recipes with a chef"),
        record(json!({"_id": "post", "type": "post", "firstName": "Sam", "bio": "student coding"})),
    ]
}

#[tokio::test]
async fn test_scenario_a_coding_challenge_ranks_first() {
    let engine = concept_engine(SearchConfig::default());
    let records = vec![
        event("hack", "A 24-hour coding challenge for students"),
        event("karaoke", "Live karaoke night with music"),
    ];

    let results = engine
        .search("student interested in programming events", &records)
        .await
        .unwrap();

    assert_eq!(results[0].record().get_str("_id"), Some("hack"));
    if let Some(karaoke) = results.get(1) {
        assert!(results[0].similarity() > karaoke.similarity());
    }
}

#[tokio::test]
async fn test_scenario_b_no_records() {
    let engine = concept_engine(SearchConfig::default());
    let outcome = engine.rank("anything", &[]).await.unwrap();

    assert!(outcome.results.is_empty());
    assert!(outcome.warning.is_none());
}

#[tokio::test]
async fn test_scenario_c_event_without_text_excluded() {
    let config = SearchConfig {
        threshold: -1.0,
        ..Default::default()
    };
    let engine = concept_engine(config);

    let records = vec![
        record(json!({"_id": "bare", "type": "event", "title": "Coding night", "firstName": "Coding"})),
        event("hack", "coding night"),
    ];
    let outcome = engine.rank("coding night", &records).await.unwrap();

    assert_eq!(ids(&outcome.results), vec!["hack"]);
    assert_eq!(outcome.stats.skipped_empty, 1);
}

#[tokio::test]
async fn test_scenario_d_empty_query_rejected() {
    let provider = Arc::new(SlowProvider::new(ConceptProvider, |_| Duration::ZERO));
    let engine = RankingEngine::new(provider.clone(), SearchConfig::default()).unwrap();

    let err = engine.rank("  \t ", &mixed_posts()).await.unwrap_err();

    assert!(matches!(err, SemanticError::InvalidInput(_)));
    assert_eq!(provider.started.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_scenario_e_identical_text_keeps_input_order() {
    let engine = concept_engine(SearchConfig::default());
    let records = vec![
        event("first", "coding hackathon"),
        event("other", "music concert"),
        event("second", "coding hackathon"),
        event("third", "coding hackathon"),
    ];

    let results = engine.search("coding", &records).await.unwrap();

    assert_eq!(ids(&results), vec!["first", "second", "third"]);
    assert_eq!(results[0].similarity(), results[1].similarity());
    assert_eq!(results[1].similarity(), results[2].similarity());
}

#[tokio::test]
async fn test_deterministic_across_calls() {
    let engine = concept_engine(SearchConfig::default());
    let records = mixed_posts();

    let first = engine.search("student coding events", &records).await.unwrap();
    let second = engine.search("student coding events", &records).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_threshold_monotonicity() {
    let records = mixed_posts();
    let query = "student coding events";
    let thresholds = [-1.0, 0.0, 0.2, 0.4, 0.6, 0.8, 1.0];

    let mut previous: Option<Vec<String>> = None;
    for threshold in thresholds {
        let config = SearchConfig {
            threshold,
            ..Default::default()
        };
        let current = ids(&concept_engine(config).search(query, &records).await.unwrap());

        if let Some(lower) = &previous {
            assert!(
                current.iter().all(|id| lower.contains(id)),
                "{:?} at {} is not a subset of {:?}",
                current,
                threshold,
                lower
            );
        }
        previous = Some(current);
    }
}

#[tokio::test]
async fn test_sorted_descending() {
    let config = SearchConfig {
        threshold: -1.0,
        ..Default::default()
    };
    let results = concept_engine(config)
        .search("student coding events", &mixed_posts())
        .await
        .unwrap();

    assert!(results.len() > 2);
    for pair in results.windows(2) {
        assert!(pair[0].similarity() >= pair[1].similarity());
    }
}

#[tokio::test]
async fn test_input_records_unchanged() {
    let records = mixed_posts();
    let snapshot = records.clone();

    let results = concept_engine(SearchConfig::default())
        .search("student coding", &records)
        .await
        .unwrap();

    assert!(!results.is_empty());
    assert_eq!(records, snapshot);
    assert!(records.iter().all(|r| !r.contains("similarity")));
    assert!(results.iter().all(|r| r.record().contains("similarity")));
}

#[tokio::test]
async fn test_users_ranked_by_profile_fields() {
    let users = vec![
        user("chef", "Gordon", "Loves baking and recipes", "Chef"),
        user("dev", "Grace", "Student into coding", "Programming tutor"),
        record(json!({"_id": "ghost", "email": "no-profile@example.com"})),
    ];

    let outcome = concept_engine(SearchConfig::default())
        .rank("student programming", &users)
        .await
        .unwrap();

    assert_eq!(ids(&outcome.results), vec!["dev"]);
    assert_eq!(outcome.stats.skipped_empty, 1);
}

#[tokio::test]
async fn test_flat_projection() {
    let config = SearchConfig {
        projection: ProjectionMode::Flat,
        ..Default::default()
    };
    let records = vec![
        record(json!({"_id": "a", "title": "Karaoke", "description": "live music"})),
        record(json!({"_id": "b", "title": "Hackathon", "description": "coding for students"})),
        record(json!({"_id": "c", "about": "coding", "whatYoullLearn": "coding"})),
    ];

    let outcome = concept_engine(config).rank("coding", &records).await.unwrap();

    assert_eq!(ids(&outcome.results), vec!["b"]);
    assert_eq!(outcome.stats.skipped_empty, 1);
}

#[tokio::test]
async fn test_order_stable_under_concurrent_completion() {
    // Earlier records take longer, so completion order is reversed
    let provider = Arc::new(SlowProvider::new(ConceptProvider, |text| {
        let ms = match text {
            t if t.starts_with("coding 1") => 40,
            t if t.starts_with("coding 2") => 20,
            _ => 1,
        };
        Duration::from_millis(ms)
    }));
    let config = SearchConfig {
        concurrency: 3,
        ..Default::default()
    };
    let engine = RankingEngine::new(provider.clone(), config).unwrap();

    let records = vec![
        event("one", "coding 1"),
        event("two", "coding 2"),
        event("three", "coding 3"),
    ];
    let results = engine.search("coding", &records).await.unwrap();

    assert_eq!(ids(&results), vec!["one", "two", "three"]);
    assert!(provider.max_in_flight.load(Ordering::SeqCst) <= 3);
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let provider = Arc::new(SlowProvider::new(ConceptProvider, |_| {
        Duration::from_millis(5)
    }));
    let config = SearchConfig {
        concurrency: 2,
        ..Default::default()
    };
    let engine = RankingEngine::new(provider.clone(), config).unwrap();

    let records: Vec<Record> = (0..8)
        .map(|i| event(&format!("e{}", i), "coding workshop"))
        .collect();
    let results = engine.search("coding", &records).await.unwrap();

    assert_eq!(results.len(), 8);
    assert_eq!(provider.completed.load(Ordering::SeqCst), 9);
    assert!(provider.max_in_flight.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_dropping_search_cancels_embedding_work() {
    let provider = Arc::new(SlowProvider::new(ConceptProvider, |_| {
        Duration::from_millis(200)
    }));
    let engine = RankingEngine::new(provider.clone(), SearchConfig::default()).unwrap();
    let records = mixed_posts();

    let timed_out =
        tokio::time::timeout(Duration::from_millis(50), engine.rank("coding", &records)).await;
    assert!(timed_out.is_err());

    tokio::time::sleep(Duration::from_millis(300)).await;
    // Only the query embedding ever started, and it never finished
    assert_eq!(provider.started.load(Ordering::SeqCst), 1);
    assert_eq!(provider.completed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cached_provider_skips_repeat_embeddings() {
    let counted = SlowProvider::new(ConceptProvider, |_| Duration::ZERO);
    let cache = EmbeddingCache::open_in_memory(1_000).unwrap();
    let provider = Arc::new(CachedProvider::new(counted, cache, "concepts"));
    let engine = RankingEngine::new(provider.clone(), SearchConfig::default()).unwrap();
    let records = mixed_posts();

    let first = engine.search("student coding", &records).await.unwrap();
    let calls_after_first = provider.inner().completed.load(Ordering::SeqCst);
    let second = engine.search("student coding", &records).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        provider.inner().completed.load(Ordering::SeqCst),
        calls_after_first
    );
}

#[tokio::test]
async fn test_store_to_engine_flow() {
    let store = MemoryStore::new().with_collection(Collection::Posts, mixed_posts());
    let posts = store.fetch_all(Collection::Posts).await.unwrap();

    let outcome = concept_engine(SearchConfig::default())
        .rank("coding challenge", &posts)
        .await
        .unwrap();

    assert_eq!(outcome.stats.total, posts.len());
    assert_eq!(outcome.results[0].record().get_str("_id"), Some("hack"));
}

#[tokio::test]
#[ignore = "downloads the embedding model"]
async fn test_scenario_a_with_real_model() {
    let provider = Arc::new(FastEmbedProvider::new(
        "sentence-transformers/all-MiniLM-L6-v2".to_string(),
    ));
    provider.initialize().await.unwrap();
    let engine = RankingEngine::new(provider, SearchConfig::default()).unwrap();

    let records = vec![
        event("karaoke", "Live karaoke night with music"),
        event("hack", "A 24-hour coding challenge for students"),
    ];
    let results = engine
        .search("student interested in programming events", &records)
        .await
        .unwrap();

    assert_eq!(results[0].record().get_str("_id"), Some("hack"));
    if let Some(karaoke) = results.get(1) {
        assert!(results[0].similarity() > karaoke.similarity());
    }
}
