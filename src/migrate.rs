//! Verse index schema.
//!
//! The ingestion collaborator populates these tables; `scx` only reads
//! them. `scx init` creates them so both sides agree on the layout.
//!
//! | Table | Contents |
//! |-------|----------|
//! | `verses` | One row per `(book, chapter, verse, translation)` |
//! | `verse_vectors` | One embedding per verse, little-endian `f32` BLOB |

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    create_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create all tables and indexes. Idempotent.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS verses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            translation TEXT NOT NULL,
            book TEXT NOT NULL,
            book_alt TEXT NOT NULL,
            chapter INTEGER NOT NULL CHECK (chapter >= 1),
            verse INTEGER NOT NULL CHECK (verse >= 1),
            text TEXT NOT NULL,
            reference TEXT NOT NULL,
            reference_alt TEXT NOT NULL,
            UNIQUE(book, chapter, verse, translation)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS verse_vectors (
            verse_id INTEGER PRIMARY KEY,
            model TEXT NOT NULL,
            dims INTEGER NOT NULL,
            embedding BLOB NOT NULL,
            FOREIGN KEY (verse_id) REFERENCES verses(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_verses_chapter ON verses(book, chapter, translation, verse)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_verses_translation ON verses(translation)")
        .execute(pool)
        .await?;

    Ok(())
}
