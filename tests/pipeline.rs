//! End-to-end retrieval against a throwaway SQLite index.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use scripture_harness::config::{parse_config, Config};
use scripture_harness::db;
use scripture_harness::migrate::create_schema;
use scripture_harness::overlay::{Overlay, ESV_COPYRIGHT};
use scripture_harness::service::{
    ContextOptions, RetrievalMode, ScriptureService, TranslationPreferences,
};
use scripture_harness::sqlite_store::SqliteStore;

use scripture_core::context::FALLBACK_CONTEXT;
use scripture_core::embedding::{vec_to_blob, EmbeddingProvider};
use scripture_core::error::RetrievalError;
use scripture_core::models::{ScoredVerse, VerseRecord};
use scripture_core::overlay::PassageFetcher;
use scripture_core::store::VerseStore;

/// Maps a few keywords onto fixed axes so rankings are predictable.
struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn model_name(&self) -> &str {
        "keyword-test"
    }
    fn dims(&self) -> usize {
        3
    }
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let t = text.to_lowercase();
        Ok(if t.contains("hezekiah") {
            vec![-1.0, -1.0, -1.0]
        } else if t.contains("love") {
            vec![1.0, 0.0, 0.0]
        } else if t.contains("good") || t.contains("romans") {
            vec![0.0, 1.0, 0.0]
        } else {
            vec![0.0, 0.0, 1.0]
        })
    }
}

struct FailingFetcher;

#[async_trait]
impl PassageFetcher for FailingFetcher {
    async fn fetch_passage(&self, _reference: &str) -> Result<Option<String>> {
        anyhow::bail!("network unreachable")
    }
}

struct EchoFetcher;

#[async_trait]
impl PassageFetcher for EchoFetcher {
    async fn fetch_passage(&self, reference: &str) -> Result<Option<String>> {
        Ok(Some(format!("overlay text for {}", reference)))
    }
}

struct Fixture {
    _tmp: TempDir,
    config: Config,
    store: Arc<SqliteStore>,
}

async fn insert(store: &SqliteStore, record: VerseRecord, vector: Option<[f32; 3]>) {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO verses (translation, book, book_alt, chapter, verse, text, reference, reference_alt)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&record.translation)
    .bind(&record.book)
    .bind(&record.book_alt)
    .bind(record.chapter)
    .bind(record.verse)
    .bind(&record.text)
    .bind(&record.reference)
    .bind(&record.reference_alt)
    .fetch_one(store.pool())
    .await
    .unwrap();

    if let Some(v) = vector {
        sqlx::query("INSERT INTO verse_vectors (verse_id, model, dims, embedding) VALUES (?, ?, 3, ?)")
            .bind(id)
            .bind("keyword-test")
            .bind(vec_to_blob(&v))
            .execute(store.pool())
            .await
            .unwrap();
    }
}

async fn fixture() -> Fixture {
    let tmp = TempDir::new().unwrap();
    let config = parse_config(&format!(
        "[db]\npath = \"{}\"\n",
        tmp.path().join("scripture.sqlite").display()
    ))
    .unwrap();
    let pool = db::connect(&config).await.unwrap();
    create_schema(&pool).await.unwrap();
    let store = Arc::new(SqliteStore::new(pool));

    // John 3 holds only 16 verses here.
    for v in 1..=16 {
        let vector = if v == 16 { [1.0, 0.0, 0.0] } else { [0.0, 0.0, 1.0] };
        insert(
            &store,
            VerseRecord::new("John", 3, v, "KJV", format!("John three {}", v)),
            Some(vector),
        )
        .await;
    }
    for v in 26..=30 {
        let text = if v == 28 {
            "And we know that all things work together for good to them that love God".to_string()
        } else {
            format!("Romans eight {}", v)
        };
        let vector = if v == 28 { [0.0, 1.0, 0.0] } else { [0.0, 0.0, 1.0] };
        insert(&store, VerseRecord::new("Romans", 8, v, "KJV", text), Some(vector)).await;
    }
    insert(
        &store,
        VerseRecord::new("Romans", 8, 28, "개역한글", "우리가 알거니와 하나님을 사랑하는 자"),
        Some([0.0, 1.0, 0.1]),
    )
    .await;
    for v in 1..=6 {
        insert(
            &store,
            VerseRecord::new("Psalms", 23, v, "개역한글", format!("시편 이십삼 {}", v)),
            None,
        )
        .await;
    }

    Fixture {
        _tmp: tmp,
        config,
        store,
    }
}

fn overlay_with(fetcher: Arc<dyn PassageFetcher>) -> Overlay {
    Overlay {
        fetcher,
        translation: "ESV".to_string(),
        replaces: "KJV".to_string(),
        attribution: ESV_COPYRIGHT.to_string(),
        per_fetch_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_secs(5),
    }
}

fn service(f: &Fixture, overlay: Option<Overlay>) -> ScriptureService {
    ScriptureService::new(
        f.store.clone(),
        Arc::new(KeywordEmbedder),
        overlay,
        &f.config,
    )
}

fn john_3_16() -> Vec<ScoredVerse> {
    vec![ScoredVerse::new(
        VerseRecord::new("John", 3, 16, "KJV", "John three 16"),
        0.9,
    )]
}

#[tokio::test]
async fn test_exact_reference_is_grounded_and_marked_direct() {
    let f = fixture().await;
    let svc = service(&f, None);

    let prepared = svc.prepare("Romans 8:28", None).await.unwrap();
    assert_eq!(prepared.mode, RetrievalMode::Grounded);

    let top = &prepared.context.sources[0];
    assert_eq!(top.record.reference, "Romans 8:28");
    assert_eq!(top.similarity, 1.0);
    assert!(prepared.context.text.contains(
        "★ v28: \"And we know that all things work together for good to them that love God\"  [Romans 8:28 / 로마서 8:28]"
    ));
    assert!(prepared.context.sources.len() <= 5);
}

#[tokio::test]
async fn test_each_reference_appears_once_across_translations() {
    let f = fixture().await;
    let svc = service(&f, None);

    let results = svc.search("Romans 8:28 good", 8, None).await.unwrap();
    let hits = results
        .iter()
        .filter(|v| v.record.reference == "Romans 8:28")
        .count();
    assert_eq!(hits, 1);
    assert_eq!(results[0].record.translation, "KJV");
}

#[tokio::test]
async fn test_unknown_book_falls_back_without_citation() {
    let f = fixture().await;
    let svc = service(&f, None);

    let prepared = svc
        .prepare("What does Hezekiah 4:12 say?", None)
        .await
        .unwrap();
    assert_eq!(prepared.mode, RetrievalMode::Unmatched);
    assert_eq!(prepared.context.text, FALLBACK_CONTEXT);
    assert!(prepared.context.sources.is_empty());
    assert!(!prepared.context.text.contains("Hezekiah"));
}

#[tokio::test]
async fn test_window_stops_at_end_of_chapter() {
    let f = fixture().await;
    let svc = service(&f, None);
    let opts = ContextOptions {
        expand_top_n: 1,
        window: 2,
        ..ContextOptions::from_config(svc.retrieval())
    };

    let ctx = svc
        .build_context("John 3:16", Some(john_3_16()), &opts)
        .await
        .unwrap();
    assert!(ctx.text.contains("· v14:"));
    assert!(ctx.text.contains("· v15:"));
    assert!(ctx.text.contains("★ v16:"));
    assert!(!ctx.text.contains("v17:"));
    assert!(!ctx.text.contains("v13:"));
}

#[tokio::test]
async fn test_failing_overlay_matches_plain_output() {
    let f = fixture().await;
    let plain = service(&f, None);
    let failing = service(&f, Some(overlay_with(Arc::new(FailingFetcher))));
    let opts = ContextOptions {
        prefer_overlay: true,
        ..ContextOptions::from_config(plain.retrieval())
    };

    let a = plain
        .build_context("John 3:16", Some(john_3_16()), &opts)
        .await
        .unwrap();
    let b = failing
        .build_context("John 3:16", Some(john_3_16()), &opts)
        .await
        .unwrap();
    assert_eq!(a.text, b.text);
    assert_eq!(b.overlay_translation, None);
    assert!(!b.text.contains("Copyright"));
}

#[tokio::test]
async fn test_overlay_section_and_attribution() {
    let f = fixture().await;
    let svc = service(&f, Some(overlay_with(Arc::new(EchoFetcher))));
    let prefs = TranslationPreferences {
        primary: Some("ESV".to_string()),
        secondary: Some("개역한글".to_string()),
    };

    let prepared = svc.prepare("Romans 8:28", Some(&prefs)).await.unwrap();
    assert!(prepared.translation.prefer_overlay);
    assert_eq!(prepared.translation.filter.as_deref(), Some("KJV"));

    let text = &prepared.context.text;
    assert!(text.contains("--- ESV Translation"));
    assert!(text.contains("  Romans 8:26-30 (ESV):"));
    assert!(text.contains("overlay text for Romans 8:26-30"));
    assert!(text.contains(ESV_COPYRIGHT));
    // Stored text is still shown.
    assert!(text.contains("--- Romans 8 / 로마서 8장 (KJV) ---"));
    assert_eq!(prepared.context.overlay_translation.as_deref(), Some("ESV"));

    // The index never receives overlay text.
    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM verses WHERE text LIKE 'overlay%'")
        .fetch_one(f.store.pool())
        .await
        .unwrap();
    assert_eq!(rows, 0);
}

#[tokio::test]
async fn test_chapter_by_korean_name() {
    let f = fixture().await;
    let svc = service(&f, None);

    let verses = svc.get_chapter("시편", 23, None).await.unwrap();
    let numbers: Vec<u32> = verses.iter().map(|v| v.verse).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
    assert!(verses.iter().all(|v| v.translation == "개역한글"));

    assert!(svc.get_chapter("Hezekiah", 1, None).await.unwrap().is_empty());
    assert!(svc.get_chapter("John", 99, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stats_counts_embeddings() {
    let f = fixture().await;
    let stats = f.store.stats().await.unwrap();
    let kjv = stats.iter().find(|s| s.translation == "KJV").unwrap();
    assert_eq!(kjv.verses, 21);
    assert_eq!(kjv.embedded, 21);
    let krv = stats.iter().find(|s| s.translation == "개역한글").unwrap();
    assert_eq!(krv.verses, 7);
    assert_eq!(krv.embedded, 1);
}

#[tokio::test]
async fn test_closed_index_is_a_hard_failure() {
    let f = fixture().await;
    let svc = service(&f, None);
    f.store.pool().close().await;

    let err = svc.search("love", 8, None).await.unwrap_err();
    assert!(matches!(err, RetrievalError::IndexUnavailable(_)));
}
