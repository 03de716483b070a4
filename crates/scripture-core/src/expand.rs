//! Neighbor-window expansion around the top-ranked verses.
//!
//! For each of the first `expand_top_n` relevant verses, every verse of the
//! same chapter and translation within `window` verses on either side is
//! pulled in as supporting context. The lower bound clamps at verse 1; the
//! upper bound is left to the index, which simply has no row past the end
//! of a chapter.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::RetrievalError;
use crate::models::{canonical_order, ExpandedVerse, ReferenceKey, ScoredVerse, VerseRole};
use crate::store::VerseStore;

/// Expansion parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpandOptions {
    /// How many of the top relevant verses get a window.
    pub expand_top_n: usize,
    /// Verses before and after each expanded verse.
    pub window: u32,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            expand_top_n: 2,
            window: 2,
        }
    }
}

/// Inclusive verse range `[verse - window, verse + window]`, clamped at 1.
pub fn window_bounds(verse: u32, window: u32) -> (u32, u32) {
    (
        verse.saturating_sub(window).max(1),
        verse.saturating_add(window),
    )
}

/// Expand `relevant` (ranked, threshold-passing) into the display set.
///
/// The output holds each canonical reference once, sorted by canon order,
/// chapter and verse. Verses from `relevant` are tagged
/// [`VerseRole::Direct`] and keep their similarity; pulled-in neighbors are
/// [`VerseRole::Supporting`] with similarity `0.0`.
pub async fn expand_neighbors<S>(
    store: &S,
    relevant: &[ScoredVerse],
    opts: ExpandOptions,
) -> Result<Vec<ExpandedVerse>, RetrievalError>
where
    S: VerseStore + ?Sized,
{
    let direct: HashSet<ReferenceKey> = relevant.iter().map(|v| v.key()).collect();

    let mut by_key: HashMap<ReferenceKey, ScoredVerse> = HashMap::new();
    for v in relevant {
        by_key.entry(v.key()).or_insert_with(|| v.clone());
    }

    let mut fetched = 0usize;
    for anchor in relevant.iter().take(opts.expand_top_n) {
        let r = &anchor.record;
        let (lo, hi) = window_bounds(r.verse, opts.window);
        let neighbors = store
            .get_by_range(&r.book, r.chapter, lo, hi, &r.translation)
            .await
            .map_err(RetrievalError::index)?;
        fetched += neighbors.len();
        for record in neighbors {
            if record.verse < 1 {
                continue;
            }
            by_key
                .entry(record.key())
                .or_insert_with(|| ScoredVerse::new(record, 0.0));
        }
    }

    let mut expanded: Vec<ExpandedVerse> = by_key
        .into_values()
        .map(|verse| {
            let role = if direct.contains(&verse.key()) {
                VerseRole::Direct
            } else {
                VerseRole::Supporting
            };
            ExpandedVerse { verse, role }
        })
        .collect();
    expanded.sort_by(|a, b| canonical_order(&a.verse.record, &b.verse.record));

    debug!(
        relevant = relevant.len(),
        fetched,
        emitted = expanded.len(),
        "neighbor expansion"
    );
    Ok(expanded)
}
