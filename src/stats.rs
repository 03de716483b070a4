//! Index statistics.
//!
//! Summarizes what the verse index holds: verse counts and embedding
//! coverage per translation. Read-only; used by `scx stats` to confirm an
//! ingestion run produced what retrieval expects.

use anyhow::Result;

use scripture_core::store::{TranslationStats, VerseStore};

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// Run the stats command: query the index and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let stats = store.stats().await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Scripture Harness — Index Stats");
    println!("===============================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));

    let (verses, embedded) = totals(&stats);
    println!();
    println!("  Verses:      {}", verses);
    println!(
        "  Embedded:    {} / {} ({}%)",
        embedded,
        verses,
        coverage_pct(embedded, verses)
    );

    if !stats.is_empty() {
        println!();
        println!("  By translation:");
        println!(
            "  {:<16} {:>8} {:>10} {:>6}",
            "TRANSLATION", "VERSES", "EMBEDDED", "COVER"
        );
        println!("  {}", "-".repeat(44));
        for s in &stats {
            println!(
                "  {:<16} {:>8} {:>10} {:>5}%",
                s.translation,
                s.verses,
                s.embedded,
                coverage_pct(s.embedded, s.verses)
            );
        }
    }

    println!();

    store.pool().close().await;
    Ok(())
}

fn totals(stats: &[TranslationStats]) -> (i64, i64) {
    stats
        .iter()
        .fold((0, 0), |(v, e), s| (v + s.verses, e + s.embedded))
}

fn coverage_pct(embedded: i64, total: i64) -> i64 {
    if total > 0 {
        (embedded * 100) / total
    } else {
        0
    }
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
