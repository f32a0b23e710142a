//! Stage 3: line-oriented block classification.
//!
//! This is deliberately not a Markdown parser. Each physical line is
//! classified on its own, with no lookahead and no inline formatting:
//!
//! | Pattern | Block |
//! |---------|-------|
//! | `^(#{1,6})\s+(.*)$` | [`Block::Heading`] at level `min(depth, 3)` |
//! | `^\s*[-*+]\s+(.*)$` | [`Block::Bullet`] |
//! | whitespace only | [`Block::Blank`] |
//! | anything else | [`Block::Paragraph`] |
//!
//! Lines over the configured length guard are not classified at all; they
//! are reported as [`LineError::TooLong`] in [`Document::skipped`].

use crate::error::LineError;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").unwrap());
static BULLET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[-*+]\s+(.*)$").unwrap());

/// Deepest heading level that gets its own size.
pub const MAX_HEADING_LEVEL: u8 = 3;

/// One classified unit of content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Bullet { text: String },
    Paragraph { text: String },
    Blank,
}

/// A block together with the 1-based line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    pub number: usize,
    pub block: Block,
}

/// Ordered blocks plus the lines the length guard rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub lines: Vec<ClassifiedLine>,
    pub skipped: Vec<LineError>,
    /// Physical lines seen, classified or not.
    pub total_lines: usize,
}

/// Characters that end a line. `\r\n` counts as one terminator.
pub const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\x0b', '\x0c', '\x1c', '\x1d', '\x1e', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Split into lines on every character in [`LINE_BREAKS`].
///
/// A terminator ends a line rather than starting a new one, so trailing
/// text without a terminator is the last line and a final terminator adds
/// nothing. Empty text has no lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while let Some(idx) = rest.find(LINE_BREAKS) {
        lines.push(&rest[..idx]);
        let skip = if rest[idx..].starts_with("\r\n") {
            2
        } else {
            rest[idx..].chars().next().map_or(1, char::len_utf8)
        };
        rest = &rest[idx + skip..];
    }
    if !rest.is_empty() {
        lines.push(rest);
    }
    lines
}

/// Classify a single line, already right-trimmed.
pub fn classify_line(line: &str, max_title_chars: usize) -> Block {
    if let Some(caps) = HEADING_RE.captures(line) {
        let depth = caps[1].len() as u8;
        let title: String = caps[2].chars().take(max_title_chars).collect();
        return Block::Heading {
            level: depth.min(MAX_HEADING_LEVEL),
            text: title,
        };
    }
    if let Some(caps) = BULLET_RE.captures(line) {
        return Block::Bullet {
            text: caps[1].to_string(),
        };
    }
    if line.trim().is_empty() {
        return Block::Blank;
    }
    Block::Paragraph {
        text: line.to_string(),
    }
}

/// Classify every line of `text`.
pub fn classify(text: &str, max_line_chars: usize, max_title_chars: usize) -> Document {
    let physical = split_lines(text);
    let mut doc = Document {
        lines: Vec::with_capacity(physical.len()),
        skipped: Vec::new(),
        total_lines: physical.len(),
    };

    for (idx, raw) in physical.into_iter().enumerate() {
        let number = idx + 1;
        let line = raw.trim_end();
        let chars = line.chars().count();
        if chars > max_line_chars {
            warn!(
                "Skipping line {}: {} characters exceeds the {}-character limit",
                number, chars, max_line_chars
            );
            doc.skipped.push(LineError::TooLong {
                line: number,
                chars,
                limit: max_line_chars,
            });
            continue;
        }
        doc.lines.push(ClassifiedLine {
            number,
            block: classify_line(line, max_title_chars),
        });
    }

    debug!(
        "Classified {} of {} lines ({} skipped)",
        doc.lines.len(),
        doc.total_lines,
        doc.skipped.len()
    );
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(text: &str) -> Vec<Block> {
        classify(text, 10_000, 200)
            .lines
            .into_iter()
            .map(|l| l.block)
            .collect()
    }

    #[test]
    fn headings_cap_at_level_three() {
        assert_eq!(
            classify_line("# One", 200),
            Block::Heading {
                level: 1,
                text: "One".into()
            }
        );
        assert_eq!(
            classify_line("###### Six", 200),
            Block::Heading {
                level: 3,
                text: "Six".into()
            }
        );
    }

    #[test]
    fn hash_without_space_is_paragraph() {
        assert_eq!(
            classify_line("#hashtag", 200),
            Block::Paragraph {
                text: "#hashtag".into()
            }
        );
        assert!(matches!(
            classify_line("####### seven", 200),
            Block::Paragraph { .. }
        ));
    }

    #[test]
    fn heading_title_is_truncated() {
        let line = format!("## {}", "x".repeat(500));
        match classify_line(&line, 200) {
            Block::Heading { text, .. } => assert_eq!(text.chars().count(), 200),
            other => panic!("expected heading, got {other:?}"),
        }
    }

    #[test]
    fn bullets_accept_all_markers_and_indent() {
        for line in ["- a", "* a", "+ a", "    - a"] {
            assert_eq!(
                classify_line(line, 200),
                Block::Bullet { text: "a".into() },
                "{line:?}"
            );
        }
        assert!(matches!(classify_line("-a", 200), Block::Paragraph { .. }));
    }

    #[test]
    fn whitespace_only_is_blank() {
        assert_eq!(classify_line("", 200), Block::Blank);
        assert_eq!(classify_line(" \t ", 200), Block::Blank);
    }

    #[test]
    fn splits_all_line_endings() {
        assert_eq!(split_lines("a\nb\r\nc\rd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\n"), vec!["a"]);
        assert_eq!(split_lines("a\n\n"), vec!["a", ""]);
        assert_eq!(split_lines("\n"), vec![""]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn splits_on_latin1_separators() {
        assert_eq!(
            split_lines("a\x0bb\x0cc\x1cd\x1de\x1ef\u{85}g"),
            vec!["a", "b", "c", "d", "e", "f", "g"]
        );
        assert_eq!(split_lines("a\u{2028}b\u{2029}"), vec!["a", "b"]);
    }

    #[test]
    fn form_feed_separates_headings() {
        let doc = classify("# A\x0c# B", 10_000, 200);
        assert_eq!(doc.total_lines, 2);
        assert_eq!(
            doc.lines.iter().map(|l| l.block.clone()).collect::<Vec<_>>(),
            vec![
                Block::Heading { level: 1, text: "A".into() },
                Block::Heading { level: 1, text: "B".into() },
            ]
        );
    }

    #[test]
    fn trailing_newline_adds_no_blank_line() {
        let doc = classify("# T\n\nbody\n", 10_000, 200);
        assert_eq!(doc.total_lines, 3);
        assert_ne!(doc.lines.last().map(|l| &l.block), Some(&Block::Blank));
    }

    #[test]
    fn trailing_whitespace_is_trimmed() {
        assert_eq!(
            blocks("para   \t"),
            vec![Block::Paragraph {
                text: "para".into()
            }]
        );
    }

    #[test]
    fn document_keeps_line_numbers() {
        let doc = classify("# T\n\n- b\ntext", 10_000, 200);
        let numbers: Vec<_> = doc.lines.iter().map(|l| l.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(doc.total_lines, 4);
        assert_eq!(doc.lines[1].block, Block::Blank);
    }

    #[test]
    fn overlong_lines_are_skipped_with_error() {
        let text = format!("ok\n{}\nafter", "y".repeat(20));
        let doc = classify(&text, 10, 200);
        assert_eq!(doc.lines.len(), 2);
        assert_eq!(
            doc.skipped,
            vec![LineError::TooLong {
                line: 2,
                chars: 20,
                limit: 10
            }]
        );
        assert_eq!(doc.lines[1].number, 3);
    }
}
