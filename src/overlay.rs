//! Overlay translation fetching.
//!
//! [`EsvClient`] fetches display-only ESV text from the ESV API.
//! [`fetch_overlays`] runs every range fetch of one request concurrently,
//! each under its own timeout, and abandons whatever is still pending when
//! the request deadline passes. Any range that did not come back with text
//! is simply absent from the result; the formatter then shows the stored
//! translation alone for it.
//!
//! Nothing fetched here is ever written to the index.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

use scripture_core::canon;
use scripture_core::overlay::{OverlayPassage, OverlayRange, PassageFetcher};

use crate::config::OverlayConfig;

/// Attribution that must accompany any ESV text.
pub const ESV_COPYRIGHT: &str = "Scripture quotations are from the ESV Bible (The Holy Bible, \
English Standard Version), copyright 2001 by Crossway, a publishing ministry of Good News \
Publishers. ESV Text Edition: 2025. Used by permission. All rights reserved.";

/// Client for the ESV passage text endpoint.
pub struct EsvClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl EsvClient {
    pub fn new(config: &OverlayConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl PassageFetcher for EsvClient {
    async fn fetch_passage(&self, reference: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(&self.url)
            .header("Authorization", format!("Token {}", self.api_key))
            .query(&[
                ("q", reference),
                ("include-headings", "false"),
                ("include-footnotes", "false"),
                ("include-verse-numbers", "true"),
                ("include-short-copyright", "false"),
                ("include-passage-references", "false"),
                ("indent-paragraphs", "0"),
            ])
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("ESV API rejected {}", reference))?;

        let json: serde_json::Value = response.json().await?;
        Ok(parse_passages(&json))
    }
}

/// First non-empty entry of `passages`, trimmed.
fn parse_passages(json: &serde_json::Value) -> Option<String> {
    json.get("passages")?
        .as_array()?
        .first()?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A configured overlay: the fetcher plus what is needed to apply it.
#[derive(Clone)]
pub struct Overlay {
    pub fetcher: Arc<dyn PassageFetcher>,
    /// Display translation, e.g. `"ESV"`.
    pub translation: String,
    /// Stored translation it is displayed over.
    pub replaces: String,
    pub attribution: String,
    pub per_fetch_timeout: Duration,
    pub request_timeout: Duration,
}

/// Build the configured overlay, or `None` when overlay is disabled or its
/// API key is missing.
pub fn create_overlay(config: &OverlayConfig) -> Result<Option<Overlay>> {
    match config.provider.as_str() {
        "disabled" => Ok(None),
        "esv" => {
            let api_key = match std::env::var(&config.api_key_env) {
                Ok(key) if !key.trim().is_empty() => key,
                _ => {
                    info!(
                        env = %config.api_key_env,
                        "overlay API key not set; overlay translation disabled"
                    );
                    return Ok(None);
                }
            };
            let client = EsvClient::new(config, api_key)?;
            Ok(Some(Overlay {
                fetcher: Arc::new(client),
                translation: config.translation.clone(),
                replaces: config.replaces.clone(),
                attribution: ESV_COPYRIGHT.to_string(),
                per_fetch_timeout: Duration::from_secs(config.timeout_secs),
                request_timeout: Duration::from_secs(config.request_timeout_secs),
            }))
        }
        other => anyhow::bail!("Unknown overlay provider: {}", other),
    }
}

/// Fetch every range concurrently and return the passages that arrived,
/// in canonical order.
///
/// Each fetch is bounded by `per_fetch_timeout`; the whole batch by
/// `deadline`, after which pending fetches are aborted. Failures, empty
/// responses and timeouts are logged and skipped.
pub async fn fetch_overlays(
    fetcher: Arc<dyn PassageFetcher>,
    ranges: Vec<OverlayRange>,
    per_fetch_timeout: Duration,
    deadline: Duration,
) -> Vec<OverlayPassage> {
    let deadline_at = Instant::now() + deadline;
    let mut set = JoinSet::new();

    for range in ranges {
        let fetcher = Arc::clone(&fetcher);
        set.spawn(async move {
            let reference = range.reference();
            let outcome = timeout(per_fetch_timeout, fetcher.fetch_passage(&reference)).await;
            (range, reference, outcome)
        });
    }

    let mut passages = Vec::new();
    loop {
        match timeout_at(deadline_at, set.join_next()).await {
            Ok(Some(Ok((range, reference, outcome)))) => match outcome {
                Ok(Ok(Some(text))) if !text.trim().is_empty() => {
                    debug!(%reference, "overlay passage fetched");
                    passages.push(OverlayPassage::new(range, text));
                }
                Ok(Ok(_)) => warn!(%reference, "overlay source returned no text"),
                Ok(Err(e)) => warn!(%reference, error = %e, "overlay fetch failed"),
                Err(_) => warn!(%reference, "overlay fetch timed out"),
            },
            Ok(Some(Err(e))) => warn!(error = %e, "overlay fetch task failed"),
            Ok(None) => break,
            Err(_) => {
                warn!(pending = set.len(), "overlay deadline reached; aborting pending fetches");
                set.abort_all();
                break;
            }
        }
    }

    passages.sort_by(|a, b| {
        canon::order_of(&a.book)
            .cmp(&canon::order_of(&b.book))
            .then_with(|| a.book.cmp(&b.book))
            .then(a.chapter.cmp(&b.chapter))
            .then(a.verse_start.cmp(&b.verse_start))
    });
    passages
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Returns canned text, optionally after a per-reference delay.
    struct CannedFetcher {
        texts: HashMap<String, String>,
        delays: HashMap<String, Duration>,
    }

    #[async_trait]
    impl PassageFetcher for CannedFetcher {
        async fn fetch_passage(&self, reference: &str) -> Result<Option<String>> {
            if let Some(delay) = self.delays.get(reference) {
                tokio::time::sleep(*delay).await;
            }
            match self.texts.get(reference) {
                Some(t) if t == "ERR" => anyhow::bail!("boom"),
                Some(t) => Ok(Some(t.clone())),
                None => Ok(None),
            }
        }
    }

    fn range(book: &str, chapter: u32, start: u32, end: u32) -> OverlayRange {
        OverlayRange {
            book: book.to_string(),
            chapter,
            verse_start: start,
            verse_end: end,
        }
    }

    fn fetcher(texts: &[(&str, &str)], delays: &[(&str, u64)]) -> Arc<dyn PassageFetcher> {
        Arc::new(CannedFetcher {
            texts: texts
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            delays: delays
                .iter()
                .map(|(k, ms)| (k.to_string(), Duration::from_millis(*ms)))
                .collect(),
        })
    }

    #[test]
    fn test_parse_passages() {
        let json = serde_json::json!({ "passages": ["  [16] For God so loved the world \n"] });
        assert_eq!(
            parse_passages(&json).as_deref(),
            Some("[16] For God so loved the world")
        );
        assert_eq!(parse_passages(&serde_json::json!({ "passages": [] })), None);
        assert_eq!(parse_passages(&serde_json::json!({ "passages": ["   "] })), None);
        assert_eq!(parse_passages(&serde_json::json!({})), None);
    }

    #[test]
    fn test_disabled_overlay_builds_nothing() {
        assert!(create_overlay(&OverlayConfig::default()).unwrap().is_none());
    }

    #[test]
    fn test_missing_api_key_disables_overlay() {
        let config = OverlayConfig {
            provider: "esv".to_string(),
            api_key_env: "SCX_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..OverlayConfig::default()
        };
        assert!(create_overlay(&config).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_results_are_canonical_regardless_of_completion_order() {
        let f = fetcher(
            &[("Genesis 1:1-3", "gen"), ("Romans 8:27-29", "rom")],
            &[("Genesis 1:1-3", 50)],
        );
        let got = fetch_overlays(
            f,
            vec![range("Romans", 8, 27, 29), range("Genesis", 1, 1, 3)],
            Duration::from_secs(2),
            Duration::from_secs(5),
        )
        .await;
        let refs: Vec<String> = got.iter().map(OverlayPassage::reference).collect();
        assert_eq!(refs, vec!["Genesis 1:1-3", "Romans 8:27-29"]);
    }

    #[tokio::test]
    async fn test_failures_and_empty_results_are_skipped() {
        let f = fetcher(&[("John 3:16", "ERR"), ("John 4:1", "ok")], &[]);
        let got = fetch_overlays(
            f,
            vec![
                range("John", 3, 16, 16),
                range("John", 4, 1, 1),
                range("John", 5, 1, 1),
            ],
            Duration::from_secs(2),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].text, "ok");
    }

    #[tokio::test]
    async fn test_slow_fetch_times_out_individually() {
        let f = fetcher(
            &[("Psalms 23:1", "fast"), ("Psalms 24:1", "slow")],
            &[("Psalms 24:1", 2_000)],
        );
        let got = fetch_overlays(
            f,
            vec![range("Psalms", 23, 1, 1), range("Psalms", 24, 1, 1)],
            Duration::from_millis(100),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].text, "fast");
    }

    #[tokio::test]
    async fn test_deadline_aborts_pending_fetches() {
        let f = fetcher(
            &[("Psalms 23:1", "fast"), ("Psalms 24:1", "slow")],
            &[("Psalms 24:1", 5_000)],
        );
        let started = std::time::Instant::now();
        let got = fetch_overlays(
            f,
            vec![range("Psalms", 23, 1, 1), range("Psalms", 24, 1, 1)],
            Duration::from_secs(10),
            Duration::from_millis(200),
        )
        .await;
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].text, "fast");
    }
}
