//! Citation detection in free text.
//!
//! Each grammar is an independent pure function returning
//! [`ReferenceKey`]s; [`parse_references`] runs every registered parser
//! and unions the results. Supporting another script means adding a
//! parser to [`PARSERS`], not branching an existing one.
//!
//! Parsing never fails: book tokens that do not resolve against the canon
//! table and numerals that do not fit a positive `u32` are dropped, so an
//! ambiguous query simply degrades to vector search.

use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::canon;
use crate::models::ReferenceKey;

/// A citation grammar.
pub type ReferenceParser = fn(&str) -> Vec<ReferenceKey>;

/// All grammars applied by [`parse_references`], in output order.
pub const PARSERS: &[ReferenceParser] = &[parse_latin, parse_hangul, parse_hangul_jang_jeol];

/// `Romans 8:28`, `1 John 3:16`, `song of solomon 2:1`, `1john 4:8`.
///
/// Captures up to three words before the numerals; the book is the
/// longest trailing run of those words that resolves in the canon.
static LATIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b((?:[1-3]\s*)?[a-z]+(?:\s+[a-z]+){0,2})\s+(\d+)\s*:\s*(\d+)")
        .expect("static regex")
});

/// `로마서 8:28`, `요한복음3:16`.
static HANGUL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([가-힣]+)\s*(\d+)\s*:\s*(\d+)").expect("static regex"));

/// `로마서 8장 28절`.
static HANGUL_JANG_JEOL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([가-힣]+?)\s*(\d+)\s*장\s*(\d+)\s*절").expect("static regex")
});

/// Parse every citation in `text`, deduplicated, in first-seen order.
pub fn parse_references(text: &str) -> Vec<ReferenceKey> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for parser in PARSERS {
        for key in parser(text) {
            if seen.insert(key.clone()) {
                keys.push(key);
            }
        }
    }
    keys
}

/// Latin-script grammar: `<BookName> <chapter>:<verse>`, case-insensitive.
pub fn parse_latin(text: &str) -> Vec<ReferenceKey> {
    LATIN_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let book = resolve_trailing_book(&caps[1])?;
            to_key(book.name, &caps)
        })
        .collect()
}

/// `"meaning of Romans"` → Romans, `"Song of Solomon"` → Song of Solomon.
fn resolve_trailing_book(raw: &str) -> Option<&'static canon::Book> {
    let words: Vec<&str> = raw.split_whitespace().collect();
    (0..words.len()).find_map(|start| {
        let candidate = normalize_numbered_book(&words[start..].join(" "));
        canon::lookup(&candidate)
    })
}

/// Secondary-script grammar: `<BookName><chapter>:<verse>`, whitespace optional.
pub fn parse_hangul(text: &str) -> Vec<ReferenceKey> {
    HANGUL_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let book = canon::lookup_alt(&caps[1])?;
            to_key(book.name, &caps)
        })
        .collect()
}

/// Secondary-script chapter/verse counter form: `<BookName> <n>장 <m>절`.
pub fn parse_hangul_jang_jeol(text: &str) -> Vec<ReferenceKey> {
    HANGUL_JANG_JEOL_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let book = canon::lookup_alt(&caps[1])?;
            to_key(book.name, &caps)
        })
        .collect()
}

fn to_key(book: &str, caps: &Captures<'_>) -> Option<ReferenceKey> {
    let chapter = parse_positive(&caps[2])?;
    let verse = parse_positive(&caps[3])?;
    Some(ReferenceKey::new(book, chapter, verse))
}

fn parse_positive(raw: &str) -> Option<u32> {
    raw.parse::<u32>().ok().filter(|n| *n > 0)
}

/// `1john` → `1 john`; leaves other tokens alone.
fn normalize_numbered_book(raw: &str) -> String {
    let raw = raw.trim();
    let mut chars = raw.chars();
    match chars.next() {
        Some(d) if d.is_ascii_digit() => {
            let rest = chars.as_str().trim_start();
            format!("{} {}", d, rest)
        }
        _ => raw.to_string(),
    }
}

/// Render `"Book Chapter:Start-End"`, collapsing single-verse ranges.
pub fn format_range(book: &str, chapter: u32, start: u32, end: u32) -> String {
    if start == end {
        format!("{} {}:{}", book, chapter, start)
    } else {
        format!("{} {}:{}-{}", book, chapter, start, end)
    }
}
