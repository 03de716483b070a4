//! Canonical book table for the 66-book Protestant canon.
//!
//! Each entry carries the primary-script (English) name and the
//! secondary-script (Korean) name. The table's order *is* the canonical
//! book order used for tie-breaking and display sorting, so it never
//! depends on insertion order of any map.
//!
//! Lookups in both directions go through indexes built once on first use.

use std::collections::HashMap;
use std::sync::LazyLock;

/// A book of the canon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Book {
    /// Canonical name in the primary script (e.g. `"1 Corinthians"`).
    pub name: &'static str,
    /// Canonical name in the secondary script (e.g. `"고린도전서"`).
    pub name_alt: &'static str,
    /// Zero-based position in canonical order (Genesis = 0).
    pub order: usize,
}

static BOOK_NAMES: [(&str, &str); 66] = [
    ("Genesis", "창세기"),
    ("Exodus", "출애굽기"),
    ("Leviticus", "레위기"),
    ("Numbers", "민수기"),
    ("Deuteronomy", "신명기"),
    ("Joshua", "여호수아"),
    ("Judges", "사사기"),
    ("Ruth", "룻기"),
    ("1 Samuel", "사무엘상"),
    ("2 Samuel", "사무엘하"),
    ("1 Kings", "열왕기상"),
    ("2 Kings", "열왕기하"),
    ("1 Chronicles", "역대상"),
    ("2 Chronicles", "역대하"),
    ("Ezra", "에스라"),
    ("Nehemiah", "느헤미야"),
    ("Esther", "에스더"),
    ("Job", "욥기"),
    ("Psalms", "시편"),
    ("Proverbs", "잠언"),
    ("Ecclesiastes", "전도서"),
    ("Song of Solomon", "아가"),
    ("Isaiah", "이사야"),
    ("Jeremiah", "예레미야"),
    ("Lamentations", "예레미야애가"),
    ("Ezekiel", "에스겔"),
    ("Daniel", "다니엘"),
    ("Hosea", "호세아"),
    ("Joel", "요엘"),
    ("Amos", "아모스"),
    ("Obadiah", "오바댜"),
    ("Jonah", "요나"),
    ("Micah", "미가"),
    ("Nahum", "나훔"),
    ("Habakkuk", "하박국"),
    ("Zephaniah", "스바냐"),
    ("Haggai", "학개"),
    ("Zechariah", "스가랴"),
    ("Malachi", "말라기"),
    ("Matthew", "마태복음"),
    ("Mark", "마가복음"),
    ("Luke", "누가복음"),
    ("John", "요한복음"),
    ("Acts", "사도행전"),
    ("Romans", "로마서"),
    ("1 Corinthians", "고린도전서"),
    ("2 Corinthians", "고린도후서"),
    ("Galatians", "갈라디아서"),
    ("Ephesians", "에베소서"),
    ("Philippians", "빌립보서"),
    ("Colossians", "골로새서"),
    ("1 Thessalonians", "데살로니가전서"),
    ("2 Thessalonians", "데살로니가후서"),
    ("1 Timothy", "디모데전서"),
    ("2 Timothy", "디모데후서"),
    ("Titus", "디도서"),
    ("Philemon", "빌레몬서"),
    ("Hebrews", "히브리서"),
    ("James", "야고보서"),
    ("1 Peter", "베드로전서"),
    ("2 Peter", "베드로후서"),
    ("1 John", "요한일서"),
    ("2 John", "요한이서"),
    ("3 John", "요한삼서"),
    ("Jude", "유다서"),
    ("Revelation", "요한계시록"),
];

static BOOKS: LazyLock<Vec<Book>> = LazyLock::new(|| {
    BOOK_NAMES
        .iter()
        .enumerate()
        .map(|(order, &(name, name_alt))| Book {
            name,
            name_alt,
            order,
        })
        .collect()
});

/// Lowercased, whitespace-collapsed primary name → index.
static BY_NAME: LazyLock<HashMap<String, usize>> = LazyLock::new(|| {
    BOOK_NAMES
        .iter()
        .enumerate()
        .map(|(i, (name, _))| (normalize_name(name), i))
        .collect()
});

/// Secondary-script name → index (the reverse table).
static BY_ALT_NAME: LazyLock<HashMap<&'static str, usize>> = LazyLock::new(|| {
    BOOK_NAMES
        .iter()
        .enumerate()
        .map(|(i, &(_, alt))| (alt, i))
        .collect()
});

fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// All books in canonical order.
pub fn books() -> &'static [Book] {
    &BOOKS
}

/// Resolve a primary-script book name, case-insensitively.
///
/// Internal whitespace is collapsed, so `"1  john"` resolves to `1 John`.
pub fn lookup(name: &str) -> Option<&'static Book> {
    BY_NAME.get(&normalize_name(name)).map(|&i| &BOOKS[i])
}

/// Resolve a secondary-script book name (exact match).
pub fn lookup_alt(name: &str) -> Option<&'static Book> {
    BY_ALT_NAME.get(name.trim()).map(|&i| &BOOKS[i])
}

/// Resolve a book name given in either script.
pub fn resolve(name: &str) -> Option<&'static Book> {
    lookup(name).or_else(|| lookup_alt(name))
}

/// Canonical position of a primary-script book name.
///
/// Unknown names sort after every canonical book.
pub fn order_of(book: &str) -> usize {
    lookup(book).map(|b| b.order).unwrap_or(usize::MAX)
}

/// Secondary-script name for a primary-script book, falling back to the
/// input when the book is not in the canon.
pub fn alt_name(book: &str) -> &str {
    lookup(book).map(|b| b.name_alt).unwrap_or(book)
}
