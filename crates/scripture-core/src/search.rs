//! Hybrid verse retrieval: exact citation lookup plus vector similarity.
//!
//! The algorithm operates entirely through the [`VerseStore`] and
//! [`EmbeddingProvider`] traits, with no database or configuration
//! dependencies.
//!
//! # Hybrid Algorithm
//!
//! 1. Parse citations out of the query ([`crate::reference`]).
//! 2. Exact lookup of each parsed key; hits get `similarity = 1.0`.
//! 3. Embed the query and fetch the `K` nearest verses, skipping any
//!    reference already found by exact lookup.
//! 4. Map cosine distance to `similarity = 1 - distance / 2`.
//! 5. Merge: sort by similarity (desc), canon order, chapter, verse,
//!    translation; keep the first record per canonical reference.
//!
//! Whether the result is relevant enough to ground a response is the
//! caller's decision; [`max_similarity`] exposes what it needs.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::debug;

use crate::embedding::{distance_to_similarity, EmbeddingProvider};
use crate::error::RetrievalError;
use crate::models::{canonical_order, ReferenceKey, ScoredVerse};
use crate::reference::parse_references;
use crate::store::VerseStore;

/// Similarity assigned to verses found by exact citation lookup.
pub const EXACT_MATCH_SIMILARITY: f64 = 1.0;

/// Inputs for one hybrid search.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    /// Free-form query text.
    pub query: &'a str,
    /// Number of vector-search results (`K`).
    pub limit: usize,
    /// Restrict both lookups to one translation.
    pub translation: Option<&'a str>,
}

/// Run exact + vector retrieval and return the merged ranking.
pub async fn hybrid_search<S, E>(
    store: &S,
    embedder: &E,
    req: &SearchRequest<'_>,
) -> Result<Vec<ScoredVerse>, RetrievalError>
where
    S: VerseStore + ?Sized,
    E: EmbeddingProvider + ?Sized,
{
    if req.query.trim().is_empty() {
        return Ok(Vec::new());
    }

    let keys = parse_references(req.query);
    let exact = exact_lookup(store, &keys, req.translation).await?;
    let exclude: HashSet<ReferenceKey> = exact.iter().map(|v| v.key()).collect();

    let vector = vector_search(
        store,
        embedder,
        req.query,
        req.limit,
        req.translation,
        &exclude,
    )
    .await?;

    debug!(
        parsed = keys.len(),
        exact = exact.len(),
        vector = vector.len(),
        "hybrid search candidates"
    );

    Ok(merge_results(exact, vector))
}

/// Resolve parsed citations by direct key lookup.
///
/// Keys with no record in the index simply produce nothing, which is how
/// invented citations are ignored rather than answered.
pub async fn exact_lookup<S>(
    store: &S,
    keys: &[ReferenceKey],
    translation: Option<&str>,
) -> Result<Vec<ScoredVerse>, RetrievalError>
where
    S: VerseStore + ?Sized,
{
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    let records = store
        .get_by_keys(keys, translation)
        .await
        .map_err(RetrievalError::index)?;
    Ok(records
        .into_iter()
        .map(|r| ScoredVerse::new(r, EXACT_MATCH_SIMILARITY))
        .collect())
}

/// Embed `query` and return up to `limit` nearest verses not in `exclude`.
pub async fn vector_search<S, E>(
    store: &S,
    embedder: &E,
    query: &str,
    limit: usize,
    translation: Option<&str>,
    exclude: &HashSet<ReferenceKey>,
) -> Result<Vec<ScoredVerse>, RetrievalError>
where
    S: VerseStore + ?Sized,
    E: EmbeddingProvider + ?Sized,
{
    if limit == 0 {
        return Ok(Vec::new());
    }

    let query_vec = embedder
        .embed(query)
        .await
        .map_err(RetrievalError::embedding)?;
    if query_vec.is_empty() {
        return Err(RetrievalError::embedding(anyhow::anyhow!(
            "empty embedding returned by {}",
            embedder.model_name()
        )));
    }

    // An excluded reference may be stored in several translations, so widen
    // the fetch until `limit` survivors remain or the index is exhausted.
    let mut fetch = limit.saturating_add(exclude.len());
    loop {
        let candidates = store
            .vector_search(&query_vec, fetch, translation)
            .await
            .map_err(RetrievalError::index)?;
        let exhausted = candidates.len() < fetch;

        let mut results: Vec<ScoredVerse> = candidates
            .into_iter()
            .filter(|c| !exclude.contains(&c.record.key()))
            .map(|c| ScoredVerse::new(c.record, distance_to_similarity(c.distance)))
            .collect();

        if results.len() >= limit || exhausted || fetch == usize::MAX {
            results.truncate(limit);
            return Ok(results);
        }
        debug!(fetch, kept = results.len(), "widening vector search");
        fetch = fetch.saturating_mul(2);
    }
}

/// Ranking order: similarity (desc), then canon order, chapter, verse,
/// translation.
pub fn rank_order(a: &ScoredVerse, b: &ScoredVerse) -> Ordering {
    b.similarity
        .partial_cmp(&a.similarity)
        .unwrap_or(Ordering::Equal)
        .then_with(|| canonical_order(&a.record, &b.record))
}

/// Concatenate exact and vector hits, rank them, and keep one record per
/// canonical reference.
pub fn merge_results(exact: Vec<ScoredVerse>, vector: Vec<ScoredVerse>) -> Vec<ScoredVerse> {
    let mut merged: Vec<ScoredVerse> = exact.into_iter().chain(vector).collect();
    merged.sort_by(rank_order);

    let mut seen = HashSet::new();
    merged.retain(|v| seen.insert(v.key()));
    merged
}

/// Highest similarity in a ranked list, `0.0` when empty.
pub fn max_similarity(results: &[ScoredVerse]) -> f64 {
    results
        .iter()
        .map(|v| v.similarity)
        .fold(0.0, f64::max)
}
