//! `scx chapter`: print one chapter for reading.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::service::ScriptureService;

pub async fn run_chapter(
    config: &Config,
    book: &str,
    chapter: u32,
    translation: Option<String>,
) -> Result<()> {
    let service = ScriptureService::from_config(config).await?;
    let verses = service
        .get_chapter(book, chapter, translation.as_deref())
        .await?;

    let Some(first) = verses.first() else {
        bail!("Chapter not found: {} {}", book, chapter);
    };

    println!(
        "{} {} / {} {}장 ({})",
        first.book, first.chapter, first.book_alt, first.chapter, first.translation
    );
    println!();
    for v in &verses {
        println!("{:>3}  {}", v.verse, v.text);
    }

    Ok(())
}
