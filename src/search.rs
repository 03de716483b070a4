//! CLI front-ends for retrieval: `scx refs`, `scx search`, `scx context`.
//!
//! Each `run_*` function builds what it needs from the config, calls into
//! [`ScriptureService`], and prints to stdout.

use anyhow::Result;

use scripture_core::canon;
use scripture_core::reference::parse_references;

use crate::config::Config;
use crate::service::{ScriptureService, TranslationPreferences};

/// Print the canonical references found in `text`. Needs no database.
pub fn run_refs(text: &str) {
    let keys = parse_references(text);
    if keys.is_empty() {
        println!("No references found.");
        return;
    }
    for key in keys {
        println!(
            "{}  /  {} {}:{}",
            key,
            canon::alt_name(&key.book),
            key.chapter,
            key.verse
        );
    }
}

/// Run the hybrid search and print the ranked list.
pub async fn run_search(
    config: &Config,
    query: &str,
    limit: Option<usize>,
    translation: Option<String>,
) -> Result<()> {
    let service = ScriptureService::from_config(config).await?;
    let limit = limit.unwrap_or(config.retrieval.n_results);
    let results = service
        .search(query, limit, translation.as_deref())
        .await?;

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, v) in results.iter().enumerate() {
        let r = &v.record;
        println!(
            "{}. [{:.4}] {} / {} ({})",
            i + 1,
            v.similarity,
            r.reference,
            r.reference_alt,
            r.translation
        );
        println!("    \"{}\"", r.text);
    }

    Ok(())
}

/// Build the grounding document for `query` and print it.
///
/// `--overlay` asks for the overlay translation as the primary display
/// translation; `--translation` pins the stored translation otherwise.
pub async fn run_context(
    config: &Config,
    query: &str,
    translation: Option<String>,
    overlay: bool,
    json: bool,
) -> Result<()> {
    let service = ScriptureService::from_config(config).await?;

    let prefs = if overlay || translation.is_some() {
        Some(TranslationPreferences {
            primary: if overlay {
                Some(config.overlay.translation.clone())
            } else {
                translation.clone()
            },
            secondary: translation
                .clone()
                .or_else(|| Some(config.translations.secondary.clone())),
        })
    } else {
        None
    };

    let prepared = service.prepare(query, prefs.as_ref()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prepared)?);
        return Ok(());
    }

    println!("{}", prepared.context.text);
    println!();
    if prepared.context.sources.is_empty() {
        println!("Sources: none");
    } else {
        println!("Sources:");
        for v in &prepared.context.sources {
            println!(
                "  [{:.4}] {} / {} ({})",
                v.similarity, v.record.reference, v.record.reference_alt, v.record.translation
            );
        }
    }

    Ok(())
}
