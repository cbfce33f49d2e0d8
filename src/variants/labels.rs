//! Markers recognized inside a backend blob.
//!
//! Label patterns live in one table so another locale or spelling is a new
//! row, not a new branch in the scanner.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::variants::model::OptionSlot;

/// Substrings that mark the whole blob as a backend error message.
pub const ERROR_MARKERS: &[&str] = &["錯誤:"];

/// Instruction echoes that sometimes leak into the blob.
pub const META_PHRASES: &[&str] = &["Instructions", "Analyze"];

/// `選項N` or `Option N`, optional space before the digit, optional `**`
/// emphasis and a half- or full-width colon after it. The `digit` group
/// marks where the option number ends.
const LABEL_PATTERNS: [(&str, OptionSlot); 3] = [
    (r"(?:選項|(?i:option))[ \t]*(?P<digit>1)(?:[ \t]*[*_]*[ \t]*[:：])?", OptionSlot::First),
    (r"(?:選項|(?i:option))[ \t]*(?P<digit>2)(?:[ \t]*[*_]*[ \t]*[:：])?", OptionSlot::Second),
    (r"(?:選項|(?i:option))[ \t]*(?P<digit>3)(?:[ \t]*[*_]*[ \t]*[:：])?", OptionSlot::Third),
];

/// Digits followed by a period, enumeration comma, full-width comma, colon or whitespace.
static NUMBERED_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+[.、，:：\s]").expect("numbered separator pattern is valid"));

pub struct LabelRule {
    pub slot: OptionSlot,
    marker: Regex,
}

/// Byte range of one label occurrence within a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelSpan {
    pub start: usize,
    pub end: usize,
}

impl LabelRule {
    /// Last label occurrence in `line`. An occurrence whose digit continues
    /// into a longer number (`選項12`) is skipped; digits after the colon
    /// belong to the text.
    pub fn find_last(&self, line: &str) -> Option<LabelSpan> {
        self.marker
            .captures_iter(line)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let digit = caps.name("digit")?;
                let longer_number = line[digit.end()..].starts_with(|c: char| c.is_ascii_digit());
                (!longer_number).then_some(LabelSpan { start: whole.start(), end: whole.end() })
            })
            .last()
    }
}

pub static LABEL_TABLE: Lazy<Vec<LabelRule>> = Lazy::new(|| {
    LABEL_PATTERNS
        .iter()
        .map(|(pattern, slot)| LabelRule {
            slot: *slot,
            marker: Regex::new(pattern).expect("label pattern is valid"),
        })
        .collect()
});

/// A label hit: which slot, and the text left after the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelMatch<'a> {
    pub slot: OptionSlot,
    pub residual: &'a str,
}

/// Tests option 1, then 2, then 3; the first rule that matches wins.
pub fn match_label(line: &str) -> Option<LabelMatch<'_>> {
    LABEL_TABLE.iter().find_map(|rule| {
        rule.find_last(line).map(|span| LabelMatch {
            slot: rule.slot,
            residual: residual_after(line, span),
        })
    })
}

/// Text after the label. Emphasis markers right after it are dropped only
/// when they close an emphasis opened just before the label (`**Option 1:** x`).
fn residual_after(line: &str, span: LabelSpan) -> &str {
    let rest = &line[span.end..];
    let opened = line[..span.start].trim_end().ends_with(['*', '_']);
    let rest = if opened { rest.trim_start().trim_start_matches(['*', '_']) } else { rest };
    rest.trim()
}

pub fn contains_error_marker(blob: &str) -> bool {
    ERROR_MARKERS.iter().any(|marker| blob.contains(marker))
}

pub fn is_meta_line(line: &str) -> bool {
    META_PHRASES.iter().any(|phrase| line.contains(phrase))
}

pub fn numbered_segments(blob: &str) -> Vec<&str> {
    NUMBERED_SEPARATOR
        .split(blob)
        .filter(|segment| !segment.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chinese_label_with_full_width_colon() {
        let hit = match_label("選項1：你好嗎").unwrap();
        assert_eq!(hit.slot, OptionSlot::First);
        assert_eq!(hit.residual, "你好嗎");
    }

    #[test]
    fn label_with_space_and_no_colon() {
        let hit = match_label("選項 2 第二個").unwrap();
        assert_eq!(hit.slot, OptionSlot::Second);
        assert_eq!(hit.residual, "第二個");
    }

    #[test]
    fn english_label_is_case_insensitive() {
        let hit = match_label("OPTION 3: Hey").unwrap();
        assert_eq!(hit.slot, OptionSlot::Third);
        assert_eq!(hit.residual, "Hey");
    }

    #[test]
    fn markdown_emphasis_around_label_is_stripped() {
        let hit = match_label("**選項1**：你好").unwrap();
        assert_eq!(hit.residual, "你好");

        let bare = match_label("**Option 2**").unwrap();
        assert_eq!(bare.slot, OptionSlot::Second);
        assert_eq!(bare.residual, "");
    }

    #[test]
    fn emphasis_inside_the_text_is_kept() {
        let hit = match_label("Option 1:**Hi** there").unwrap();
        assert_eq!(hit.residual, "**Hi** there");

        let closed = match_label("**Option 1:** Hi").unwrap();
        assert_eq!(closed.residual, "Hi");
    }

    #[test]
    fn digits_after_the_colon_belong_to_the_text() {
        let hit = match_label("選項1：3點見").unwrap();
        assert_eq!(hit.slot, OptionSlot::First);
        assert_eq!(hit.residual, "3點見");

        let hit = match_label("Option 1:2 cats").unwrap();
        assert_eq!(hit.residual, "2 cats");
    }

    #[test]
    fn longer_number_is_not_a_label() {
        assert!(match_label("選項12 不是標籤").is_none());
        assert!(match_label("Option 10").is_none());
    }

    #[test]
    fn prefix_is_stripped_through_the_last_label() {
        let hit = match_label("以下是 選項1: 選項1: 內容").unwrap();
        assert_eq!(hit.residual, "內容");
    }

    #[test]
    fn numbered_segments_drop_blank_fragments() {
        let segments = numbered_segments("1. a\n2、b\n3：c");
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].trim(), "a");
        assert_eq!(segments[1].trim(), "b");
        assert_eq!(segments[2].trim(), "c");
    }

    #[test]
    fn error_marker_needs_half_width_colon() {
        assert!(contains_error_marker("錯誤: API 回應為空"));
        assert!(!contains_error_marker("沒有錯誤"));
    }
}
