//! Core data types that flow through the retrieval pipeline.
//!
//! [`VerseRecord`] is the persisted unit. Everything else is built per
//! request and dropped once the grounding document is rendered.
//! Licensed overlay text lives in [`crate::overlay::OverlayPassage`], a
//! separate type that no store method accepts.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::canon;

/// Canonical `(book, chapter, verse)` identity of a verse, independent of
/// the script or translation it was cited or stored in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceKey {
    /// Canonical primary-script book name.
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
}

impl ReferenceKey {
    pub fn new(book: impl Into<String>, chapter: u32, verse: u32) -> Self {
        Self {
            book: book.into(),
            chapter,
            verse,
        }
    }

    /// Ordering by canon position, then chapter, then verse.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        canon::order_of(&self.book)
            .cmp(&canon::order_of(&other.book))
            .then_with(|| self.book.cmp(&other.book))
            .then(self.chapter.cmp(&other.chapter))
            .then(self.verse.cmp(&other.verse))
    }
}

impl std::fmt::Display for ReferenceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}:{}", self.book, self.chapter, self.verse)
    }
}

/// A single verse of one translation, as stored in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseRecord {
    pub text: String,
    /// Translation code, e.g. `"KJV"`.
    pub translation: String,
    pub book: String,
    pub book_alt: String,
    pub chapter: u32,
    pub verse: u32,
    /// `"Book Chapter:Verse"` in the primary script.
    pub reference: String,
    /// Same reference in the secondary script.
    pub reference_alt: String,
}

impl VerseRecord {
    /// Build a record, deriving both reference strings and, for canonical
    /// books, the secondary-script book name.
    pub fn new(
        book: &str,
        chapter: u32,
        verse: u32,
        translation: &str,
        text: impl Into<String>,
    ) -> Self {
        let book_alt = canon::alt_name(book).to_string();
        Self {
            text: text.into(),
            translation: translation.to_string(),
            reference: format!("{} {}:{}", book, chapter, verse),
            reference_alt: format!("{} {}:{}", book_alt, chapter, verse),
            book: book.to_string(),
            book_alt,
            chapter,
            verse,
        }
    }

    pub fn key(&self) -> ReferenceKey {
        ReferenceKey::new(self.book.clone(), self.chapter, self.verse)
    }
}

/// A verse with its relevance for the current request.
///
/// `similarity` is in `[0.0, 1.0]`; exactly `1.0` is reserved for
/// exact-reference matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredVerse {
    #[serde(flatten)]
    pub record: VerseRecord,
    pub similarity: f64,
}

impl ScoredVerse {
    pub fn new(record: VerseRecord, similarity: f64) -> Self {
        Self { record, similarity }
    }

    pub fn key(&self) -> ReferenceKey {
        self.record.key()
    }
}

/// Whether a verse in the grounding document answers the query directly
/// or only supplies surrounding context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerseRole {
    Direct,
    Supporting,
}

impl VerseRole {
    pub fn marker(self) -> &'static str {
        match self {
            VerseRole::Direct => "★",
            VerseRole::Supporting => "·",
        }
    }
}

/// A verse emitted by the neighbor expander.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedVerse {
    pub verse: ScoredVerse,
    pub role: VerseRole,
}

/// Total display order: canon position, chapter, verse, then translation.
pub fn canonical_order(a: &VerseRecord, b: &VerseRecord) -> Ordering {
    canon::order_of(&a.book)
        .cmp(&canon::order_of(&b.book))
        .then_with(|| a.book.cmp(&b.book))
        .then(a.chapter.cmp(&b.chapter))
        .then(a.verse.cmp(&b.verse))
        .then_with(|| a.translation.cmp(&b.translation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_derives_references() {
        let r = VerseRecord::new("Romans", 8, 28, "KJV", "And we know...");
        assert_eq!(r.reference, "Romans 8:28");
        assert_eq!(r.book_alt, "로마서");
        assert_eq!(r.reference_alt, "로마서 8:28");
        assert_eq!(r.key(), ReferenceKey::new("Romans", 8, 28));
    }

    #[test]
    fn test_canonical_order_uses_canon_not_alphabet() {
        let gen = VerseRecord::new("Genesis", 1, 1, "KJV", "");
        let acts = VerseRecord::new("Acts", 1, 1, "KJV", "");
        assert_eq!(canonical_order(&gen, &acts), Ordering::Less);

        let j3 = ReferenceKey::new("John", 3, 16);
        let j10 = ReferenceKey::new("John", 10, 1);
        assert_eq!(j3.canonical_cmp(&j10), Ordering::Less);
    }

    #[test]
    fn test_scored_verse_serializes_flat() {
        let v = ScoredVerse::new(VerseRecord::new("John", 3, 16, "KJV", "For God"), 1.0);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["reference"], "John 3:16");
        assert_eq!(json["similarity"], 1.0);
    }
}
