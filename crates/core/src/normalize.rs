//! Markup normalization for replacement text.
//!
//! Replacement bodies may use a small markdown-like grammar: numbered items
//! (`1. `), bullet items (`- ` or `* `) and `**bold**` spans. This module
//! strips the markup and records what it meant, so the request builder can
//! re-apply it as native list bullets and bold styling.

use crate::types::utf16_len;
use regex::Regex;
use std::sync::LazyLock;

/// Regex matching a numbered list marker at the start of a trimmed line.
static NUMBERED_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s+").unwrap());

/// Regex matching a bullet list marker at the start of a trimmed line.
static BULLET_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*]\s+").unwrap());

/// Regex matching a `**bold**` span. Non-greedy, never crosses a newline.
static BOLD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

/// List role of a single line of replacement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// A numbered item, or a wrapped continuation of one.
    Numbered,
    /// A bullet item.
    Bulleted,
    /// Anything else, including blank lines.
    Plain,
}

/// One line after list markers have been stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedLine {
    pub kind: LineKind,
    pub text: String,
}

impl FormattedLine {
    fn new(kind: LineKind, indent: usize, text: &str) -> Self {
        Self {
            kind,
            text: format!("{}{}", " ".repeat(indent), text),
        }
    }

    fn verbatim(line: &str) -> Self {
        Self {
            kind: LineKind::Plain,
            text: line.to_string(),
        }
    }
}

/// A half-open range of bold text, in UTF-16 code units of the stripped text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoldSpan {
    pub start: usize,
    pub end: usize,
}

impl BoldSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Width of the leading whitespace of a line, in characters.
fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Classify every line and strip its list marker in a single pass.
///
/// Both the classification and the normalized text are read from the
/// returned lines, so they can never disagree on line count or order.
///
/// A numbered item opens a list at its indentation. Following non-blank
/// lines indented at least that far, which are not bullet items themselves,
/// continue the item and are re-indented to the list's indentation. Blank
/// lines are `Plain` and leave the continuation state as it was. Bullet items
/// and plain lines end the numbered list.
pub fn tokenize_lines(text: &str) -> Vec<FormattedLine> {
    let mut lines = Vec::new();
    let mut in_numbered_list = false;
    let mut list_indent = 0;

    for line in text.split('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            lines.push(FormattedLine::verbatim(line));
            continue;
        }

        let indent = leading_whitespace(line);
        let bullet = BULLET_MARKER_REGEX.find(trimmed);

        if let Some(marker) = NUMBERED_MARKER_REGEX.find(trimmed) {
            in_numbered_list = true;
            list_indent = indent;
            lines.push(FormattedLine::new(
                LineKind::Numbered,
                indent,
                &trimmed[marker.end()..],
            ));
        } else if in_numbered_list && indent >= list_indent && bullet.is_none() {
            lines.push(FormattedLine::new(LineKind::Numbered, list_indent, trimmed));
        } else if let Some(marker) = bullet {
            in_numbered_list = false;
            lines.push(FormattedLine::new(
                LineKind::Bulleted,
                indent,
                &trimmed[marker.end()..],
            ));
        } else {
            in_numbered_list = false;
            lines.push(FormattedLine::verbatim(line));
        }
    }

    lines
}

/// Per-line list classification of `text`.
pub fn classify_lines(text: &str) -> Vec<LineKind> {
    tokenize_lines(text).into_iter().map(|line| line.kind).collect()
}

/// `text` with list markers removed and indentation preserved.
pub fn normalize_lists(text: &str) -> String {
    tokenize_lines(text)
        .into_iter()
        .map(|line| line.text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remove `**` delimiters, returning the stripped text and the bold spans.
///
/// Unpaired asterisks are kept literally. Nested markers are not special:
/// the first closing pair ends the span.
pub fn extract_bold(text: &str) -> (String, Vec<BoldSpan>) {
    let mut output = String::with_capacity(text.len());
    let mut spans = Vec::new();
    let mut output_len = 0;
    let mut last = 0;

    for caps in BOLD_REGEX.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        let before = &text[last..whole.start()];
        output.push_str(before);
        output_len += utf16_len(before);

        let start = output_len;
        output.push_str(inner.as_str());
        output_len += utf16_len(inner.as_str());
        spans.push(BoldSpan::new(start, output_len));

        last = whole.end();
    }

    output.push_str(&text[last..]);
    (output, spans)
}

/// A replacement body with all markup resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedBody {
    /// Final text, free of list and bold markers.
    pub text: String,
    /// List role of each line of `text`.
    pub line_kinds: Vec<LineKind>,
    /// Bold spans relative to the start of `text`.
    pub bold_spans: Vec<BoldSpan>,
}

impl FormattedBody {
    /// Resolve list and bold markup in a replacement body.
    pub fn parse(body: &str) -> Self {
        let lines = tokenize_lines(body);
        let line_kinds = lines.iter().map(|line| line.kind).collect();
        let normalized = lines
            .into_iter()
            .map(|line| line.text)
            .collect::<Vec<_>>()
            .join("\n");
        let (text, bold_spans) = extract_bold(&normalized);

        Self {
            text,
            line_kinds,
            bold_spans,
        }
    }

    /// Lines of the final text paired with their list role.
    ///
    /// Bold markers never span lines, so stripping them keeps the line count
    /// of the list-normalized text.
    pub fn lines(&self) -> impl Iterator<Item = (&str, LineKind)> {
        self.text.split('\n').zip(self.line_kinds.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::LineKind::{Bulleted, Numbered, Plain};

    /// Put `**` back around every span.
    fn reinsert_bold(text: &str, spans: &[BoldSpan]) -> String {
        let units: Vec<u16> = text.encode_utf16().collect();
        let mut out = Vec::new();
        let mut last = 0;
        for span in spans {
            out.extend_from_slice(&units[last..span.start]);
            out.extend("**".encode_utf16());
            out.extend_from_slice(&units[span.start..span.end]);
            out.extend("**".encode_utf16());
            last = span.end;
        }
        out.extend_from_slice(&units[last..]);
        String::from_utf16(&out).unwrap()
    }

    #[test]
    fn test_numbered_list() {
        let text = "1. First\n2. Second";

        assert_eq!(classify_lines(text), vec![Numbered, Numbered]);
        assert_eq!(normalize_lists(text), "First\nSecond");
    }

    #[test]
    fn test_bullet_does_not_continue() {
        let text = "- a\n  continued\n- b";

        assert_eq!(classify_lines(text), vec![Bulleted, Plain, Bulleted]);
        assert_eq!(normalize_lists(text), "a\n  continued\nb");
    }

    #[test]
    fn test_star_bullets_keep_indentation() {
        let text = "* top\n    * nested";

        assert_eq!(classify_lines(text), vec![Bulleted, Bulleted]);
        assert_eq!(normalize_lists(text), "top\n    nested");
    }

    #[test]
    fn test_numbered_continuation_reindents() {
        let text = "  1. Item one\n      wraps here\n  2. Item two";

        assert_eq!(classify_lines(text), vec![Numbered, Numbered, Numbered]);
        assert_eq!(
            normalize_lists(text),
            "  Item one\n  wraps here\n  Item two"
        );
    }

    #[test]
    fn test_equal_indentation_continues() {
        let text = "1. Item\nsame level";

        assert_eq!(classify_lines(text), vec![Numbered, Numbered]);
        assert_eq!(normalize_lists(text), "Item\nsame level");
    }

    #[test]
    fn test_smaller_indentation_ends_list() {
        let text = "   1. Item\n after";

        assert_eq!(classify_lines(text), vec![Numbered, Plain]);
        assert_eq!(normalize_lists(text), "   Item\n after");
    }

    #[test]
    fn test_bullet_inside_numbered_list_is_bulleted() {
        let text = "1. Step\n   - detail\n   more";

        assert_eq!(classify_lines(text), vec![Numbered, Bulleted, Plain]);
        assert_eq!(normalize_lists(text), "Step\n   detail\n   more");
    }

    #[test]
    fn test_blank_line_keeps_numbered_state() {
        let text = "1. One\n\n   still one\n\nIntro";

        assert_eq!(
            classify_lines(text),
            vec![Numbered, Plain, Numbered, Plain, Numbered]
        );
        assert_eq!(normalize_lists(text), "One\n\nstill one\n\nIntro");
    }

    #[test]
    fn test_plain_text_ends_list() {
        let text = "Heading\n1. One\n  x\nTail\n  indented";

        assert_eq!(
            classify_lines(text),
            vec![Plain, Numbered, Numbered, Numbered, Numbered]
        );

        let text = "Heading\n  1. One\nTail\n  indented";
        assert_eq!(classify_lines(text), vec![Plain, Numbered, Plain, Plain]);
    }

    #[test]
    fn test_marker_requires_trailing_whitespace() {
        let text = "1.5 percent\n-dash\n*star";

        assert_eq!(classify_lines(text), vec![Plain, Plain, Plain]);
        assert_eq!(normalize_lists(text), text);
    }

    #[test]
    fn test_line_count_preserved() {
        let samples = [
            "",
            "\n",
            "1. a\n\n\n2. b",
            "- a\n* b\n\n  c\n",
            "plain\r\nwindows",
            "1. x\n   y\n   - z\n\nend",
        ];

        for sample in samples {
            let expected = sample.split('\n').count();
            assert_eq!(classify_lines(sample).len(), expected, "{sample:?}");
            assert_eq!(
                normalize_lists(sample).split('\n').count(),
                expected,
                "{sample:?}"
            );
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "1. First\n2. Second",
            "- a\n  continued\n- b",
            "  1. Item one\n      wraps here\n  2. Item two",
            "Intro\n\n* one\n* two\n\nOutro",
        ];

        for sample in samples {
            let once = normalize_lists(sample);
            assert_eq!(normalize_lists(&once), once, "{sample:?}");
        }
    }

    #[test]
    fn test_extract_bold() {
        let (text, spans) = extract_bold("**bold** normal **also bold**");

        assert_eq!(text, "bold normal also bold");
        assert_eq!(spans, vec![BoldSpan::new(0, 4), BoldSpan::new(12, 21)]);
    }

    #[test]
    fn test_extract_bold_leaves_unpaired_asterisks() {
        let (text, spans) = extract_bold("a * b ** c");

        assert_eq!(text, "a * b ** c");
        assert!(spans.is_empty());
    }

    #[test]
    fn test_extract_bold_first_closing_pair_wins() {
        let (text, spans) = extract_bold("**a **b** c**");

        assert_eq!(text, "a b c");
        assert_eq!(spans, vec![BoldSpan::new(0, 2), BoldSpan::new(3, 5)]);
    }

    #[test]
    fn test_extract_bold_does_not_cross_lines() {
        let (text, spans) = extract_bold("**open\nclose**");

        assert_eq!(text, "**open\nclose**");
        assert!(spans.is_empty());
    }

    #[test]
    fn test_extract_bold_counts_utf16_units() {
        let (text, spans) = extract_bold("😀 **é😀**!");

        assert_eq!(text, "😀 é😀!");
        assert_eq!(spans, vec![BoldSpan::new(3, 6)]);
    }

    #[test]
    fn test_bold_round_trip() {
        let samples = [
            "**bold** normal **also bold**",
            "no markers at all",
            "***x***",
            "😀 **é😀** and **more** text",
            "**a **b** c**",
            "line **one**\nline **two**",
        ];

        for sample in samples {
            let (text, spans) = extract_bold(sample);
            assert_eq!(reinsert_bold(&text, &spans), sample);
        }
    }

    #[test]
    fn test_formatted_body() {
        let body = FormattedBody::parse("Intro **now**\n1. **Fast** start\n- tail");

        assert_eq!(body.text, "Intro now\nFast start\ntail");
        assert_eq!(body.line_kinds, vec![Plain, Numbered, Bulleted]);
        assert_eq!(body.bold_spans, vec![BoldSpan::new(6, 9), BoldSpan::new(10, 14)]);

        let lines: Vec<_> = body.lines().collect();
        assert_eq!(
            lines,
            vec![
                ("Intro now", Plain),
                ("Fast start", Numbered),
                ("tail", Bulleted)
            ]
        );
    }
}
