//! Read-only index abstraction for Scripture Harness.
//!
//! The [`VerseStore`] trait is the only way the retrieval pipeline touches
//! the verse index, enabling pluggable backends (SQLite in the app crate,
//! in-memory for tests). There is deliberately no write method: the index
//! is populated by an external ingestion step and is read-only here.
//!
//! Implementations must be `Send + Sync` so a single instance can be
//! shared across concurrent requests.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::models::{ReferenceKey, VerseRecord};

/// A vector-search hit with its raw cosine distance in `[0.0, 2.0]`.
#[derive(Debug, Clone)]
pub struct VerseCandidate {
    pub record: VerseRecord,
    /// `1 - cosine_similarity`; smaller is closer.
    pub distance: f64,
}

/// Per-translation row counts for `scx stats`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TranslationStats {
    pub translation: String,
    pub verses: i64,
    pub embedded: i64,
}

/// Abstract read-only verse index.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`vector_search`](VerseStore::vector_search) | Nearest verses to a query embedding |
/// | [`get_by_keys`](VerseStore::get_by_keys) | Equality lookup on `(book, chapter, verse)` |
/// | [`get_by_range`](VerseStore::get_by_range) | Verses `min..=max` of one chapter and translation |
/// | [`get_chapter`](VerseStore::get_chapter) | A whole chapter in verse order |
/// | [`stats`](VerseStore::stats) | Row counts per translation |
///
/// An `Err` from any method means the index itself is unavailable.
/// Absence of data is always `Ok` with an empty result.
#[async_trait]
pub trait VerseStore: Send + Sync {
    /// The `limit` verses closest to `query_vec` by cosine distance,
    /// nearest first, optionally restricted to one translation.
    async fn vector_search(
        &self,
        query_vec: &[f32],
        limit: usize,
        translation: Option<&str>,
    ) -> Result<Vec<VerseCandidate>>;

    /// All records matching any of `keys`, optionally restricted to one
    /// translation.
    async fn get_by_keys(
        &self,
        keys: &[ReferenceKey],
        translation: Option<&str>,
    ) -> Result<Vec<VerseRecord>>;

    /// Verses `verse_min..=verse_max` of one chapter, in verse order.
    async fn get_by_range(
        &self,
        book: &str,
        chapter: u32,
        verse_min: u32,
        verse_max: u32,
        translation: &str,
    ) -> Result<Vec<VerseRecord>>;

    /// Every verse of one chapter, in verse order.
    async fn get_chapter(
        &self,
        book: &str,
        chapter: u32,
        translation: &str,
    ) -> Result<Vec<VerseRecord>>;

    /// Verse and embedding counts per translation, sorted by translation.
    async fn stats(&self) -> Result<Vec<TranslationStats>>;
}
