//! Recovers three rewrite variants from the backend's free-form blob.
//!
//! The tiers run in order: error short-circuit, labeled-section scan,
//! numbered-segment split, raw passthrough. Whatever tier wins, the
//! result goes through [`finalize`] so every slot holds display text.

use tracing::debug;

use crate::variants::labels::{self, LabelMatch};
use crate::variants::model::{
    OptionSlot, ParseOutcome, ParseTier, ParsedVariants, GENERATION_ERROR_PLACEHOLDER,
    SECOND_UNPARSED_PLACEHOLDER, THIRD_UNPARSED_PLACEHOLDER,
};

/// Which option the labeled scan is currently filling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    None,
    Option1,
    Option2,
    Option3,
}

/// How a single line of the blob is treated by the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Label(LabelMatch<'a>),
    Blank,
    Meta,
    Content(&'a str),
}

impl ScanState {
    /// Only a label line moves the scan; every other line keeps the current state.
    pub fn next(self, line: &LineKind<'_>) -> ScanState {
        match line {
            LineKind::Label(hit) => match hit.slot {
                OptionSlot::First => ScanState::Option1,
                OptionSlot::Second => ScanState::Option2,
                OptionSlot::Third => ScanState::Option3,
            },
            LineKind::Blank | LineKind::Meta | LineKind::Content(_) => self,
        }
    }

    pub fn active_slot(self) -> Option<OptionSlot> {
        match self {
            ScanState::None => None,
            ScanState::Option1 => Some(OptionSlot::First),
            ScanState::Option2 => Some(OptionSlot::Second),
            ScanState::Option3 => Some(OptionSlot::Third),
        }
    }
}

/// Label test runs before the meta test, so a label line that also
/// mentions a meta phrase still counts as a label.
pub fn classify(line: &str) -> LineKind<'_> {
    if let Some(hit) = labels::match_label(line) {
        LineKind::Label(hit)
    } else if line.trim().is_empty() {
        LineKind::Blank
    } else if labels::is_meta_line(line) {
        LineKind::Meta
    } else {
        LineKind::Content(line)
    }
}

pub fn parse(blob: &str) -> ParsedVariants {
    parse_with_tier(blob).variants
}

pub fn parse_with_tier(blob: &str) -> ParseOutcome {
    if labels::contains_error_marker(blob) {
        debug!("blob carries an error marker, repeating it in every slot");
        let same = blob.to_string();
        return ParseOutcome {
            variants: ParsedVariants::from_finalized([same.clone(), same.clone(), same]),
            tier: ParseTier::ErrorShortCircuit,
        };
    }

    let (raw, tier) = if let Some(raw) = scan_labeled(blob) {
        (raw, ParseTier::Labeled)
    } else if let Some(raw) = split_numbered(blob) {
        (raw, ParseTier::Numbered)
    } else {
        (passthrough(blob), ParseTier::Passthrough)
    };
    debug!(?tier, "parsed backend blob");

    ParseOutcome {
        variants: finalize(raw),
        tier,
    }
}

/// Walks the blob line by line and accumulates text under the most recent
/// label. `None` when no slot received any text.
pub fn scan_labeled(blob: &str) -> Option<[String; 3]> {
    let mut slots: [String; 3] = Default::default();
    let mut state = ScanState::None;

    for line in blob.lines() {
        let kind = classify(line);
        state = state.next(&kind);
        match kind {
            LineKind::Label(hit) => {
                if !hit.residual.is_empty() {
                    let slot = &mut slots[hit.slot.index()];
                    slot.push_str(hit.residual);
                    slot.push('\n');
                }
            }
            LineKind::Content(text) => {
                if let Some(active) = state.active_slot() {
                    let slot = &mut slots[active.index()];
                    slot.push_str(text);
                    slot.push('\n');
                }
            }
            LineKind::Blank | LineKind::Meta => {}
        }
    }

    if slots.iter().all(String::is_empty) {
        None
    } else {
        Some(slots)
    }
}

/// Splits on `N.`-style enumerators and keeps the first three pieces.
pub fn split_numbered(blob: &str) -> Option<[String; 3]> {
    match labels::numbered_segments(blob).as_slice() {
        [first, second, third, ..] => Some([
            first.to_string(),
            second.to_string(),
            third.to_string(),
        ]),
        _ => None,
    }
}

pub fn passthrough(blob: &str) -> [String; 3] {
    [
        blob.to_string(),
        SECOND_UNPARSED_PLACEHOLDER.to_string(),
        THIRD_UNPARSED_PLACEHOLDER.to_string(),
    ]
}

pub fn finalize(raw: [String; 3]) -> ParsedVariants {
    ParsedVariants::from_finalized(raw.map(|text| {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            GENERATION_ERROR_PLACEHOLDER.to_string()
        } else {
            trimmed.to_string()
        }
    }))
}
