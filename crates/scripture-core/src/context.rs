//! Grounding-document assembly.
//!
//! Turns the expansion output (plus an optional overlay block) into the
//! text handed to the generation caller, and the ranked relevant verses
//! into a capped source list.
//!
//! # Layout
//!
//! ```text
//! === RETRIEVED BIBLE PASSAGES (with surrounding context) ===
//!
//! --- John 3 / 요한복음 3장 (KJV) ---
//!   · v15: "..."  [John 3:15 / 요한복음 3:15]
//!   ★ v16: "..."  [John 3:16 / 요한복음 3:16]
//!
//! --- ESV Translation (fetched at request time for display) ---   ┐
//!   John 3:15-16 (ESV):                                          │ overlay
//!   "..."                                                        │ section
//!                                                                │ (optional)
//!   [ESV Copyright: ...]                                         ┘
//!
//! === END OF RETRIEVED PASSAGES ===
//!
//! INSTRUCTIONS:
//! - ...
//! ```
//!
//! The overlay section is purely additive: every other line is the same
//! whether or not it is present.

use std::cmp::Ordering;

use serde::Serialize;

use crate::canon;
use crate::models::{ExpandedVerse, ScoredVerse};
use crate::overlay::OverlayBlock;

/// Grounding text used when no verse passed the relevance threshold.
pub const FALLBACK_CONTEXT: &str = "No direct Bible text found via search. The user may be \
asking a general conversational question, requesting a QT recommendation, or discussing \
something not tied to a specific verse. Use your general biblical knowledge to guide them. \
You may suggest specific books or passages commonly relevant to their topic. If they asked \
about a specific passage, say plainly that it was not found rather than quoting from memory.";

const HEADER: &str = "=== RETRIEVED BIBLE PASSAGES (with surrounding context) ===";
const FOOTER: &str = "=== END OF RETRIEVED PASSAGES ===";

const INSTRUCTIONS: &[&str] = &[
    "INSTRUCTIONS:",
    "- Use the passages above to ground your response.",
    "- ★ = directly relevant verses; · = surrounding context for narrative understanding.",
    "- Cite using format: [Bible, Reference, Translation]",
    "- If an overlay translation section is provided and the user speaks English, prefer quoting it.",
    "- If quoting overlay text, include its copyright notice at the end of your response.",
    "- Use surrounding context to explain the passage's meaning, not just the single verse.",
    "- If no passage is relevant to the user's actual question, say so honestly.",
];

/// Verses of one `(book, chapter, translation)`, in verse order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayGroup {
    pub book: String,
    pub book_alt: String,
    pub chapter: u32,
    pub translation: String,
    pub verses: Vec<ExpandedVerse>,
}

impl DisplayGroup {
    fn heading(&self) -> String {
        format!(
            "--- {} {} / {} {}장 ({}) ---",
            self.book, self.chapter, self.book_alt, self.chapter, self.translation
        )
    }

    fn matches(&self, e: &ExpandedVerse) -> bool {
        let r = &e.verse.record;
        self.book == r.book && self.chapter == r.chapter && self.translation == r.translation
    }
}

/// Formatter output before rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextBundle {
    pub groups: Vec<DisplayGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<OverlayBlock>,
}

fn display_order(a: &ExpandedVerse, b: &ExpandedVerse) -> Ordering {
    let (a, b) = (&a.verse.record, &b.verse.record);
    canon::order_of(&a.book)
        .cmp(&canon::order_of(&b.book))
        .then_with(|| a.book.cmp(&b.book))
        .then(a.chapter.cmp(&b.chapter))
        .then_with(|| a.translation.cmp(&b.translation))
        .then(a.verse.cmp(&b.verse))
}

impl ContextBundle {
    /// Group expansion output by `(book, chapter, translation)`.
    ///
    /// Groups follow canon order then chapter; within a chapter, groups of
    /// different translations are ordered by translation name.
    pub fn assemble(mut expanded: Vec<ExpandedVerse>, overlay: Option<OverlayBlock>) -> Self {
        expanded.sort_by(display_order);

        let mut groups: Vec<DisplayGroup> = Vec::new();
        for e in expanded {
            match groups.last_mut() {
                Some(g) if g.matches(&e) => g.verses.push(e),
                _ => {
                    let r = &e.verse.record;
                    groups.push(DisplayGroup {
                        book: r.book.clone(),
                        book_alt: r.book_alt.clone(),
                        chapter: r.chapter,
                        translation: r.translation.clone(),
                        verses: vec![e],
                    });
                }
            }
        }
        Self { groups, overlay }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Render the grounding document. An empty bundle renders
    /// [`FALLBACK_CONTEXT`].
    pub fn render(&self) -> String {
        if self.is_empty() {
            return FALLBACK_CONTEXT.to_string();
        }

        let mut lines: Vec<String> = vec![HEADER.to_string(), String::new()];

        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                lines.push(String::new());
            }
            lines.push(group.heading());
            for e in &group.verses {
                let r = &e.verse.record;
                lines.push(format!(
                    "  {} v{}: \"{}\"  [{} / {}]",
                    e.role.marker(),
                    r.verse,
                    r.text,
                    r.reference,
                    r.reference_alt
                ));
            }
        }

        if let Some(block) = &self.overlay {
            lines.push(String::new());
            lines.push(format!(
                "--- {} Translation (fetched at request time for display) ---",
                block.translation
            ));
            for p in &block.passages {
                lines.push(format!("  {} ({}):", p.reference(), block.translation));
                lines.push(format!("  \"{}\"", p.text));
                lines.push(String::new());
            }
            lines.push(format!(
                "  [{} Copyright: {}]",
                block.translation, block.attribution
            ));
        }

        lines.push(String::new());
        lines.push(FOOTER.to_string());
        lines.push(String::new());
        lines.extend(INSTRUCTIONS.iter().map(|s| s.to_string()));

        lines.join("\n")
    }
}

/// The first `max` relevant verses, in ranked order, as citable sources.
pub fn source_list(relevant: &[ScoredVerse], max: usize) -> Vec<ScoredVerse> {
    relevant.iter().take(max).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{VerseRecord, VerseRole};
    use crate::overlay::{OverlayPassage, OverlayRange};

    fn ev(book: &str, ch: u32, v: u32, tr: &str, text: &str, role: VerseRole) -> ExpandedVerse {
        ExpandedVerse {
            verse: ScoredVerse::new(VerseRecord::new(book, ch, v, tr, text), 0.0),
            role,
        }
    }

    fn romans() -> Vec<ExpandedVerse> {
        vec![
            ev("Romans", 8, 27, "KJV", "And he that searcheth", VerseRole::Supporting),
            ev(
                "Romans",
                8,
                28,
                "KJV",
                "And we know that all things work together for good",
                VerseRole::Direct,
            ),
        ]
    }

    fn esv_block() -> OverlayBlock {
        let range = OverlayRange {
            book: "Romans".into(),
            chapter: 8,
            verse_start: 27,
            verse_end: 28,
        };
        OverlayBlock::new(
            "ESV",
            vec![OverlayPassage::new(range, "[27] And he who searches")],
            "Used by permission.",
        )
        .unwrap()
    }

    #[test]
    fn test_direct_verse_marked_with_both_references() {
        let text = ContextBundle::assemble(romans(), None).render();
        assert!(text.starts_with(HEADER));
        assert!(text.contains("--- Romans 8 / 로마서 8장 (KJV) ---"));
        assert!(text.contains(
            "  ★ v28: \"And we know that all things work together for good\"  [Romans 8:28 / 로마서 8:28]"
        ));
        assert!(text.contains("  · v27: \"And he that searcheth\""));
        assert!(text.contains(FOOTER));
    }

    #[test]
    fn test_groups_split_by_translation_and_follow_canon() {
        let expanded = vec![
            ev("John", 3, 16, "개역한글", "하나님이", VerseRole::Direct),
            ev("Genesis", 1, 1, "KJV", "In the beginning", VerseRole::Direct),
            ev("John", 3, 17, "KJV", "For God sent", VerseRole::Supporting),
        ];
        let bundle = ContextBundle::assemble(expanded, None);
        let keys: Vec<(&str, &str)> = bundle
            .groups
            .iter()
            .map(|g| (g.book.as_str(), g.translation.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![("Genesis", "KJV"), ("John", "KJV"), ("John", "개역한글")]
        );
    }

    #[test]
    fn test_overlay_section_is_purely_additive() {
        let plain = ContextBundle::assemble(romans(), None).render();
        let overlaid = ContextBundle::assemble(romans(), Some(esv_block())).render();

        assert!(overlaid.contains("  Romans 8:27-28 (ESV):"));
        assert!(overlaid.contains("  [ESV Copyright: Used by permission.]"));
        assert!(!plain.contains("Copyright"));

        let start = overlaid
            .find("\n\n--- ESV Translation")
            .unwrap();
        let end = overlaid.find("Used by permission.]").unwrap() + "Used by permission.]".len();
        let stripped = format!("{}{}", &overlaid[..start], &overlaid[end..]);
        assert_eq!(stripped, plain);
    }

    #[test]
    fn test_empty_bundle_renders_fallback() {
        let bundle = ContextBundle::assemble(vec![], None);
        assert_eq!(bundle.render(), FALLBACK_CONTEXT);
    }

    #[test]
    fn test_source_list_is_capped_in_rank_order() {
        let relevant: Vec<ScoredVerse> = (1..=7)
            .map(|v| ScoredVerse::new(VerseRecord::new("Psalms", 23, v, "KJV", ""), 1.0 - v as f64 / 10.0))
            .collect();
        let sources = source_list(&relevant, 5);
        assert_eq!(sources.len(), 5);
        assert_eq!(sources[0].record.verse, 1);
        assert_eq!(sources[4].record.verse, 5);
    }
}
