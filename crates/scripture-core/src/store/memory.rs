//! In-memory [`VerseStore`] implementation for tests and embedded use.
//!
//! Records live in a `Vec` behind `std::sync::RwLock`. Vector search is
//! brute-force cosine distance over every record that has a vector.

use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::{canonical_order, ReferenceKey, VerseRecord};

use super::{TranslationStats, VerseCandidate, VerseStore};

struct StoredVerse {
    record: VerseRecord,
    vector: Option<Vec<f32>>,
}

/// In-memory verse index.
pub struct InMemoryStore {
    verses: RwLock<Vec<StoredVerse>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            verses: RwLock::new(Vec::new()),
        }
    }

    /// Load a record, replacing any existing record with the same
    /// `(book, chapter, verse, translation)`.
    pub fn insert(&self, record: VerseRecord, vector: Option<Vec<f32>>) {
        let mut verses = self.verses.write().unwrap_or_else(|e| e.into_inner());
        verses.retain(|sv| {
            !(sv.record.key() == record.key() && sv.record.translation == record.translation)
        });
        verses.push(StoredVerse { record, vector });
    }

    pub fn len(&self) -> usize {
        self.verses.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<StoredVerse>>> {
        self.verses
            .read()
            .map_err(|_| anyhow!("in-memory verse store lock poisoned"))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn translation_matches(record: &VerseRecord, translation: Option<&str>) -> bool {
    translation.map_or(true, |t| record.translation == t)
}

fn sorted_by_verse(mut records: Vec<VerseRecord>) -> Vec<VerseRecord> {
    records.sort_by(canonical_order);
    records
}

#[async_trait]
impl VerseStore for InMemoryStore {
    async fn vector_search(
        &self,
        query_vec: &[f32],
        limit: usize,
        translation: Option<&str>,
    ) -> Result<Vec<VerseCandidate>> {
        let verses = self.read()?;
        let mut candidates: Vec<VerseCandidate> = verses
            .iter()
            .filter(|sv| translation_matches(&sv.record, translation))
            .filter_map(|sv| {
                let vector = sv.vector.as_ref()?;
                let sim = cosine_similarity(query_vec, vector) as f64;
                Some(VerseCandidate {
                    record: sv.record.clone(),
                    distance: 1.0 - sim,
                })
            })
            .collect();
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
        let wanted: HashSet<&ReferenceKey> = keys.iter().collect();
        let verses = self.read()?;
        let found = verses
            .iter()
            .filter(|sv| translation_matches(&sv.record, translation))
            .filter(|sv| wanted.contains(&sv.record.key()))
            .map(|sv| sv.record.clone())
            .collect();
        Ok(sorted_by_verse(found))
    }

    async fn get_by_range(
        &self,
        book: &str,
        chapter: u32,
        verse_min: u32,
        verse_max: u32,
        translation: &str,
    ) -> Result<Vec<VerseRecord>> {
        let verses = self.read()?;
        let found = verses
            .iter()
            .map(|sv| &sv.record)
            .filter(|r| r.book == book && r.chapter == chapter && r.translation == translation)
            .filter(|r| (verse_min..=verse_max).contains(&r.verse))
            .cloned()
            .collect();
        Ok(sorted_by_verse(found))
    }

    async fn get_chapter(
        &self,
        book: &str,
        chapter: u32,
        translation: &str,
    ) -> Result<Vec<VerseRecord>> {
        self.get_by_range(book, chapter, 1, u32::MAX, translation)
            .await
    }

    async fn stats(&self) -> Result<Vec<TranslationStats>> {
        let verses = self.read()?;
        let mut counts: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
        for sv in verses.iter() {
            let entry = counts.entry(sv.record.translation.as_str()).or_default();
            entry.0 += 1;
            if sv.vector.is_some() {
                entry.1 += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(translation, (verses, embedded))| TranslationStats {
                translation: translation.to_string(),
                verses,
                embedded,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
        for v in 1..=5 {
            store.insert(
                VerseRecord::new("John", 3, v, "KJV", format!("kjv {}", v)),
                Some(vec![1.0, v as f32]),
            );
        }
        store.insert(VerseRecord::new("John", 3, 1, "개역한글", "krv 1"), None);
        store
    }

    #[tokio::test]
    async fn test_range_is_inclusive_and_ordered() {
        let s = store();
        let got = s.get_by_range("John", 3, 2, 4, "KJV").await.unwrap();
        let verses: Vec<u32> = got.iter().map(|r| r.verse).collect();
        assert_eq!(verses, vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn test_range_past_chapter_end_is_empty_not_error() {
        let s = store();
        let got = s.get_by_range("John", 3, 6, 9, "KJV").await.unwrap();
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn test_get_by_keys_translation_filter() {
        let s = store();
        let keys = vec![ReferenceKey::new("John", 3, 1)];
        assert_eq!(s.get_by_keys(&keys, None).await.unwrap().len(), 2);
        let kjv = s.get_by_keys(&keys, Some("KJV")).await.unwrap();
        assert_eq!(kjv.len(), 1);
        assert_eq!(kjv[0].translation, "KJV");
    }

    #[tokio::test]
    async fn test_vector_search_skips_unembedded_and_orders_by_distance() {
        let s = store();
        let hits = s.vector_search(&[1.0, 5.0], 3, None).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].record.verse, 5);
        assert!(hits[0].distance <= hits[1].distance);
        assert!(hits.iter().all(|h| h.record.translation == "KJV"));
    }

    #[tokio::test]
    async fn test_insert_replaces_same_identity() {
        let s = store();
        s.insert(VerseRecord::new("John", 3, 1, "KJV", "replaced"), None);
        assert_eq!(s.len(), 6);
        let stats = s.stats().await.unwrap();
        let kjv = stats.iter().find(|t| t.translation == "KJV").unwrap();
        assert_eq!(kjv.verses, 5);
        assert_eq!(kjv.embedded, 4);
    }
}
