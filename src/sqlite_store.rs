//! SQLite-backed [`VerseStore`] implementation.
//!
//! Maps each [`VerseStore`] operation onto the `verses` / `verse_vectors`
//! schema created by [`crate::migrate`]. Vector search is a brute-force
//! cosine scan over `verse_vectors`, which is fast enough for a single
//! Bible (~31k verses per translation).

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use scripture_core::embedding::{blob_to_vec, cosine_similarity};
use scripture_core::models::{canonical_order, ReferenceKey, VerseRecord};
use scripture_core::store::{TranslationStats, VerseCandidate, VerseStore};

const VERSE_COLUMNS: &str =
    "v.translation, v.book, v.book_alt, v.chapter, v.verse, v.text, v.reference, v.reference_alt";

/// SQLite implementation of the [`VerseStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_record(row: &SqliteRow) -> Result<VerseRecord> {
    Ok(VerseRecord {
        text: row.try_get("text")?,
        translation: row.try_get("translation")?,
        book: row.try_get("book")?,
        book_alt: row.try_get("book_alt")?,
        chapter: row.try_get("chapter")?,
        verse: row.try_get("verse")?,
        reference: row.try_get("reference")?,
        reference_alt: row.try_get("reference_alt")?,
    })
}

fn rows_to_records(rows: &[SqliteRow]) -> Result<Vec<VerseRecord>> {
    rows.iter().map(row_to_record).collect()
}

#[async_trait]
impl VerseStore for SqliteStore {
    async fn vector_search(
        &self,
        query_vec: &[f32],
        limit: usize,
        translation: Option<&str>,
    ) -> Result<Vec<VerseCandidate>> {
        let sql = format!(
            r#"
            SELECT {VERSE_COLUMNS}, vv.embedding
            FROM verse_vectors vv
            JOIN verses v ON v.id = vv.verse_id
            WHERE (?1 IS NULL OR v.translation = ?1)
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(translation)
            .fetch_all(&self.pool)
            .await?;

        let mut candidates = Vec::with_capacity(rows.len());
        for row in &rows {
            let blob: Vec<u8> = row.try_get("embedding")?;
            let similarity = cosine_similarity(query_vec, &blob_to_vec(&blob)) as f64;
            candidates.push(VerseCandidate {
                record: row_to_record(row)?,
                distance: 1.0 - similarity,
            });
        }

        candidates.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| canonical_order(&a.record, &b.record))
        });
        candidates.truncate(limit);

        Ok(candidates)
    }

    async fn get_by_keys(
        &self,
        keys: &[ReferenceKey],
        translation: Option<&str>,
    ) -> Result<Vec<VerseRecord>> {
        let sql = format!(
            r#"
            SELECT {VERSE_COLUMNS}
            FROM verses v
            WHERE v.book = ?1 AND v.chapter = ?2 AND v.verse = ?3
              AND (?4 IS NULL OR v.translation = ?4)
            ORDER BY v.translation
            "#
        );

        let mut records = Vec::new();
        for key in keys {
            let rows = sqlx::query(&sql)
                .bind(&key.book)
                .bind(key.chapter)
                .bind(key.verse)
                .bind(translation)
                .fetch_all(&self.pool)
                .await?;
            records.extend(rows_to_records(&rows)?);
        }
        records.sort_by(canonical_order);
        Ok(records)
    }

    async fn get_by_range(
        &self,
        book: &str,
        chapter: u32,
        verse_min: u32,
        verse_max: u32,
        translation: &str,
    ) -> Result<Vec<VerseRecord>> {
        let sql = format!(
            r#"
            SELECT {VERSE_COLUMNS}
            FROM verses v
            WHERE v.book = ? AND v.chapter = ? AND v.translation = ?
              AND v.verse BETWEEN ? AND ?
            ORDER BY v.verse ASC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(book)
            .bind(chapter)
            .bind(translation)
            .bind(verse_min)
            .bind(verse_max)
            .fetch_all(&self.pool)
            .await?;
        rows_to_records(&rows)
    }

    async fn get_chapter(
        &self,
        book: &str,
        chapter: u32,
        translation: &str,
    ) -> Result<Vec<VerseRecord>> {
        let sql = format!(
            r#"
            SELECT {VERSE_COLUMNS}
            FROM verses v
            WHERE v.book = ? AND v.chapter = ? AND v.translation = ?
            ORDER BY v.verse ASC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(book)
            .bind(chapter)
            .bind(translation)
            .fetch_all(&self.pool)
            .await?;
        rows_to_records(&rows)
    }

    async fn stats(&self) -> Result<Vec<TranslationStats>> {
        let rows = sqlx::query(
            r#"
            SELECT v.translation,
                   COUNT(*) AS verses,
                   COUNT(vv.verse_id) AS embedded
            FROM verses v
            LEFT JOIN verse_vectors vv ON vv.verse_id = v.id
            GROUP BY v.translation
            ORDER BY v.translation
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(TranslationStats {
                    translation: row.try_get("translation")?,
                    verses: row.try_get("verses")?,
                    embedded: row.try_get("embedded")?,
                })
            })
            .collect()
    }
}
