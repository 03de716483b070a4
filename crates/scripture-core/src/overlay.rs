//! Display-time translation overlay.
//!
//! Some translations may only be shown, never stored. Their text is fetched
//! per request through a [`PassageFetcher`] and carried in
//! [`OverlayPassage`], a type that shares nothing with
//! [`VerseRecord`](crate::models::VerseRecord) and that no
//! [`VerseStore`](crate::store::VerseStore) method accepts.
//!
//! This module only plans which ranges to fetch and models the results.
//! Concurrency and timeouts belong to the caller's runtime.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::models::ExpandedVerse;
use crate::reference::format_range;

/// Source of overlay text for one passage reference.
///
/// `Ok(None)` means the source had no text for the reference. Callers treat
/// `Err` and `None` alike: the stored translation is displayed instead.
#[async_trait]
pub trait PassageFetcher: Send + Sync {
    /// Fetch the text of `reference` (e.g. `"John 3:14-18"`).
    async fn fetch_passage(&self, reference: &str) -> Result<Option<String>>;
}

/// A contiguous verse range of one chapter to request from the overlay
/// source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OverlayRange {
    pub book: String,
    pub chapter: u32,
    pub verse_start: u32,
    pub verse_end: u32,
}

impl OverlayRange {
    /// `"Book C:S-E"`, or `"Book C:S"` for a single verse.
    pub fn reference(&self) -> String {
        format_range(&self.book, self.chapter, self.verse_start, self.verse_end)
    }
}

/// Overlay text fetched for one range. Lives for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayPassage {
    pub book: String,
    pub chapter: u32,
    pub verse_start: u32,
    pub verse_end: u32,
    pub text: String,
}

impl OverlayPassage {
    pub fn new(range: OverlayRange, text: impl Into<String>) -> Self {
        Self {
            book: range.book,
            chapter: range.chapter,
            verse_start: range.verse_start,
            verse_end: range.verse_end,
            text: text.into(),
        }
    }

    pub fn reference(&self) -> String {
        format_range(&self.book, self.chapter, self.verse_start, self.verse_end)
    }
}

/// Everything the formatter needs to render an overlay section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayBlock {
    /// Display translation, e.g. `"ESV"`.
    pub translation: String,
    /// Passages in canonical order.
    pub passages: Vec<OverlayPassage>,
    /// Fixed attribution that must accompany the text.
    pub attribution: String,
}

impl OverlayBlock {
    /// `None` when nothing was fetched, so no attribution is emitted
    /// without overlay text.
    pub fn new(
        translation: impl Into<String>,
        passages: Vec<OverlayPassage>,
        attribution: impl Into<String>,
    ) -> Option<Self> {
        if passages.is_empty() {
            return None;
        }
        Some(Self {
            translation: translation.into(),
            passages,
            attribution: attribution.into(),
        })
    }
}

/// Group the `replaces`-translation verses of the (canonically sorted)
/// expansion output into one minimal range per `(book, chapter)` run.
pub fn plan_overlay_ranges(expanded: &[ExpandedVerse], replaces: &str) -> Vec<OverlayRange> {
    let mut ranges: Vec<OverlayRange> = Vec::new();
    for e in expanded {
        let r = &e.verse.record;
        if r.translation != replaces {
            continue;
        }
        match ranges.last_mut() {
            Some(last) if last.book == r.book && last.chapter == r.chapter => {
                last.verse_start = last.verse_start.min(r.verse);
                last.verse_end = last.verse_end.max(r.verse);
            }
            _ => ranges.push(OverlayRange {
                book: r.book.clone(),
                chapter: r.chapter,
                verse_start: r.verse,
                verse_end: r.verse,
            }),
        }
    }
    ranges
}
