//! Retrieval orchestration.
//!
//! [`ScriptureService`] wires a [`VerseStore`], an [`EmbeddingProvider`]
//! and an optional [`Overlay`] into the request-level operations:
//!
//! | Operation | Purpose |
//! |-----------|---------|
//! | [`search`](ScriptureService::search) | Hybrid ranked list |
//! | [`build_context`](ScriptureService::build_context) | Threshold, expand, overlay, format |
//! | [`prepare`](ScriptureService::prepare) | Preference resolution + mode decision + context |
//! | [`get_chapter`](ScriptureService::get_chapter) | A whole chapter, book in either script |
//!
//! The service holds no mutable state; one instance can serve concurrent
//! requests.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use scripture_core::canon;
use scripture_core::context::{source_list, ContextBundle, FALLBACK_CONTEXT};
use scripture_core::embedding::EmbeddingProvider;
use scripture_core::error::RetrievalError;
use scripture_core::expand::{expand_neighbors, ExpandOptions};
use scripture_core::models::{ExpandedVerse, ScoredVerse, VerseRecord};
use scripture_core::overlay::{plan_overlay_ranges, OverlayBlock};
use scripture_core::search::{hybrid_search, max_similarity, SearchRequest};
use scripture_core::store::VerseStore;

use crate::config::{Config, OverlayConfig, RetrievalConfig, TranslationsConfig};
use crate::db;
use crate::embedding::create_provider;
use crate::overlay::{create_overlay, fetch_overlays, Overlay};
use crate::sqlite_store::SqliteStore;

/// Script of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Latin-script (English) query.
    Primary,
    /// Hangul (Korean) query.
    Secondary,
}

fn is_hangul(c: char) -> bool {
    matches!(c, '\u{AC00}'..='\u{D7A3}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}')
}

/// Secondary when Hangul makes up at least a third of the alphabetic
/// characters, primary otherwise (including text with no letters).
pub fn detect_language(text: &str) -> Language {
    let (mut hangul, mut alpha) = (0usize, 0usize);
    for c in text.chars().filter(|c| c.is_alphabetic()) {
        alpha += 1;
        if is_hangul(c) {
            hangul += 1;
        }
    }
    if hangul > 0 && hangul * 3 >= alpha {
        Language::Secondary
    } else {
        Language::Primary
    }
}

/// Caller's preferred display translation per language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationPreferences {
    pub primary: Option<String>,
    pub secondary: Option<String>,
}

/// Outcome of preference resolution for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTranslation {
    pub language: Language,
    /// Stored translation to filter retrieval by.
    pub filter: Option<String>,
    /// Whether to fetch the overlay translation for display.
    pub prefer_overlay: bool,
}

/// Map preferences onto a stored-translation filter.
///
/// A primary preference naming the overlay translation filters by the
/// translation the overlay replaces and requests the overlay.
pub fn resolve_translation(
    query: &str,
    prefs: Option<&TranslationPreferences>,
    overlay: &OverlayConfig,
) -> ResolvedTranslation {
    let language = detect_language(query);
    let Some(prefs) = prefs else {
        return ResolvedTranslation {
            language,
            filter: None,
            prefer_overlay: false,
        };
    };

    match language {
        Language::Secondary => ResolvedTranslation {
            language,
            filter: prefs.secondary.clone(),
            prefer_overlay: false,
        },
        Language::Primary => match prefs.primary.as_deref() {
            Some(p) if p.eq_ignore_ascii_case(&overlay.translation) => ResolvedTranslation {
                language,
                filter: Some(overlay.replaces.clone()),
                prefer_overlay: true,
            },
            other => ResolvedTranslation {
                language,
                filter: other.map(str::to_string),
                prefer_overlay: false,
            },
        },
    }
}

/// Whether retrieval found anything worth grounding on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    Grounded,
    Unmatched,
}

/// `Grounded` when the best similarity reaches `threshold`.
pub fn decide_mode(results: &[ScoredVerse], threshold: f64) -> RetrievalMode {
    if !results.is_empty() && max_similarity(results) >= threshold {
        RetrievalMode::Grounded
    } else {
        RetrievalMode::Unmatched
    }
}

/// Per-call knobs for [`ScriptureService::build_context`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContextOptions {
    pub similarity_threshold: f64,
    pub expand_top_n: usize,
    pub window: u32,
    pub prefer_overlay: bool,
    /// Stored-translation filter when the service runs its own search.
    pub translation: Option<String>,
    pub n_results: usize,
    pub max_sources: usize,
}

impl ContextOptions {
    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            expand_top_n: config.expand_top_n,
            window: config.context_window,
            prefer_overlay: false,
            translation: None,
            n_results: config.n_results,
            max_sources: config.max_sources,
        }
    }
}

/// Grounding text plus the citable sources behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroundingContext {
    pub text: String,
    pub sources: Vec<ScoredVerse>,
    /// Display translation of the overlay section, when one was rendered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay_translation: Option<String>,
}

impl GroundingContext {
    fn fallback() -> Self {
        Self {
            text: FALLBACK_CONTEXT.to_string(),
            sources: Vec::new(),
            overlay_translation: None,
        }
    }
}

/// Result of [`ScriptureService::prepare`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedContext {
    pub mode: RetrievalMode,
    pub translation: ResolvedTranslation,
    #[serde(flatten)]
    pub context: GroundingContext,
}

pub struct ScriptureService {
    store: Arc<dyn VerseStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    overlay: Option<Overlay>,
    retrieval: RetrievalConfig,
    translations: TranslationsConfig,
    overlay_config: OverlayConfig,
}

impl ScriptureService {
    pub fn new(
        store: Arc<dyn VerseStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        overlay: Option<Overlay>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            embedder,
            overlay,
            retrieval: config.retrieval.clone(),
            translations: config.translations.clone(),
            overlay_config: config.overlay.clone(),
        }
    }

    /// SQLite store, configured embedder and overlay.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        let store: Arc<dyn VerseStore> = Arc::new(SqliteStore::new(pool));
        let embedder: Arc<dyn EmbeddingProvider> = Arc::from(create_provider(&config.embedding)?);
        let overlay = create_overlay(&config.overlay)?;
        Ok(Self::new(store, embedder, overlay, config))
    }

    pub fn retrieval(&self) -> &RetrievalConfig {
        &self.retrieval
    }

    /// Hybrid ranked list for `query`.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        translation: Option<&str>,
    ) -> Result<Vec<ScoredVerse>, RetrievalError> {
        let req = SearchRequest {
            query,
            limit,
            translation,
        };
        hybrid_search(self.store.as_ref(), self.embedder.as_ref(), &req).await
    }

    /// Build the grounding document for `query`.
    ///
    /// `prior_results` skips the search when the caller already ran one.
    /// Verses below `similarity_threshold` are dropped; if none remain the
    /// fixed fallback text is returned with no sources.
    pub async fn build_context(
        &self,
        query: &str,
        prior_results: Option<Vec<ScoredVerse>>,
        opts: &ContextOptions,
    ) -> Result<GroundingContext, RetrievalError> {
        let results = match prior_results {
            Some(results) => results,
            None => {
                self.search(query, opts.n_results, opts.translation.as_deref())
                    .await?
            }
        };

        let relevant: Vec<ScoredVerse> = results
            .into_iter()
            .filter(|v| v.similarity >= opts.similarity_threshold)
            .collect();
        if relevant.is_empty() {
            debug!("no verse passed the similarity threshold");
            return Ok(GroundingContext::fallback());
        }

        let expanded = expand_neighbors(
            self.store.as_ref(),
            &relevant,
            ExpandOptions {
                expand_top_n: opts.expand_top_n,
                window: opts.window,
            },
        )
        .await?;

        let overlay = if opts.prefer_overlay {
            self.fetch_overlay(&expanded).await
        } else {
            None
        };
        let overlay_translation = overlay.as_ref().map(|b| b.translation.clone());

        let bundle = ContextBundle::assemble(expanded, overlay);
        Ok(GroundingContext {
            text: bundle.render(),
            sources: source_list(&relevant, opts.max_sources),
            overlay_translation,
        })
    }

    /// Overlay block for the expansion output, or `None` when no overlay
    /// is configured, nothing is overlaid, or every fetch failed.
    async fn fetch_overlay(&self, expanded: &[ExpandedVerse]) -> Option<OverlayBlock> {
        let overlay = self.overlay.as_ref()?;
        if overlay.translation == overlay.replaces {
            return None;
        }
        let ranges = plan_overlay_ranges(expanded, &overlay.replaces);
        if ranges.is_empty() {
            return None;
        }
        let requested = ranges.len();
        let passages = fetch_overlays(
            Arc::clone(&overlay.fetcher),
            ranges,
            overlay.per_fetch_timeout,
            overlay.request_timeout,
        )
        .await;
        info!(requested, fetched = passages.len(), "overlay passages");
        OverlayBlock::new(&overlay.translation, passages, &overlay.attribution)
    }

    /// One request end to end: resolve the translation, search once,
    /// decide the mode, and build the context from the same results.
    pub async fn prepare(
        &self,
        query: &str,
        prefs: Option<&TranslationPreferences>,
    ) -> Result<PreparedContext, RetrievalError> {
        let translation = resolve_translation(query, prefs, &self.overlay_config);
        let results = self
            .search(query, self.retrieval.n_results, translation.filter.as_deref())
            .await?;

        let mode = decide_mode(&results, self.retrieval.relevance_threshold);
        debug!(?mode, best = max_similarity(&results), "retrieval mode");

        let context = match mode {
            RetrievalMode::Unmatched => GroundingContext::fallback(),
            RetrievalMode::Grounded => {
                let opts = ContextOptions {
                    prefer_overlay: translation.prefer_overlay,
                    translation: translation.filter.clone(),
                    ..ContextOptions::from_config(&self.retrieval)
                };
                self.build_context(query, Some(results), &opts).await?
            }
        };

        Ok(PreparedContext {
            mode,
            translation,
            context,
        })
    }

    /// All verses of a chapter in verse order.
    ///
    /// `book` may be in either script. Without an explicit translation, a
    /// secondary-script book name reads the secondary translation. An
    /// unknown book yields an empty list.
    pub async fn get_chapter(
        &self,
        book: &str,
        chapter: u32,
        translation: Option<&str>,
    ) -> Result<Vec<VerseRecord>, RetrievalError> {
        let Some(entry) = canon::resolve(book) else {
            debug!(book, "unknown book");
            return Ok(Vec::new());
        };
        let translation = match translation {
            Some(t) => t.to_string(),
            None if detect_language(book) == Language::Secondary => {
                self.translations.secondary.clone()
            }
            None => self.translations.primary.clone(),
        };
        self.store
            .get_chapter(entry.name, chapter, &translation)
            .await
            .map_err(RetrievalError::index)
    }
}
