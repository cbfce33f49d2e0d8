//! Copying a rendered variant to the system clipboard.
//!
//! The platform clipboard is tried first when the surface has one; any
//! failure there falls through to an external copy command.

pub mod command;

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use crate::state::{Alert, AppState};
use crate::variants::OptionSlot;

pub use command::CommandClipboard;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("copy command `{command}` failed: {reason}")]
    Command { command: String, reason: String },

    #[error("x11 clipboard request failed: {0}")]
    X11(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Anything that can take ownership of a piece of text for pasting elsewhere.
pub trait ClipboardSink {
    fn name(&self) -> &str;
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPath {
    Platform,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied(CopyPath),
    /// Output section is hidden; there is no rendered text to copy.
    NothingToCopy,
    Failed,
}

/// Copies the text shown for `slot`. On success the slot's copy control is
/// acknowledged until `now + feedback`; on failure the user gets an alert.
pub fn copy_output(
    state: &mut AppState,
    slot: OptionSlot,
    primary: Option<&mut dyn ClipboardSink>,
    fallback: &mut dyn ClipboardSink,
    feedback: Duration,
    now: Instant,
) -> CopyOutcome {
    let Some(text) = state.revealed_variants().map(|v| v.get(slot).to_string()) else {
        return CopyOutcome::NothingToCopy;
    };

    let mut path = None;
    if let Some(primary) = primary {
        match primary.write_text(&text) {
            Ok(()) => path = Some(CopyPath::Platform),
            Err(err) => warn!(sink = primary.name(), %err, "platform clipboard failed, using fallback"),
        }
    }
    if path.is_none() {
        match fallback.write_text(&text) {
            Ok(()) => path = Some(CopyPath::Fallback),
            Err(err) => warn!(sink = fallback.name(), %err, "fallback copy failed"),
        }
    }

    match path {
        Some(path) => {
            info!(%slot, ?path, chars = text.chars().count(), "copied variant");
            state.acknowledge_copy(slot, now + feedback);
            CopyOutcome::Copied(path)
        }
        None => {
            state.raise(Alert::CopyFailed);
            CopyOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator;
    use crate::request::{FormInput, ProcessResponse};

    #[derive(Default)]
    struct FakeSink {
        fail: bool,
        written: Vec<String>,
    }

    impl ClipboardSink for FakeSink {
        fn name(&self) -> &str {
            "fake"
        }

        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.fail {
                return Err(ClipboardError::Unavailable("fake".to_string()));
            }
            self.written.push(text.to_string());
            Ok(())
        }
    }

    fn revealed() -> AppState {
        let mut state = AppState::new();
        coordinator::begin_submission(&mut state, &FormInput::new("x", "溫暖", "英文")).unwrap();
        coordinator::complete_submission(
            &mut state,
            Ok(ProcessResponse::Success { result: "選項1：你好嗎\n選項2：你好\n選項3：安安".to_string() }),
        );
        state
    }

    const FEEDBACK: Duration = Duration::from_millis(2000);

    #[test]
    fn platform_path_wins_when_it_works() {
        let mut state = revealed();
        let mut primary = FakeSink::default();
        let mut fallback = FakeSink::default();
        let now = Instant::now();
        let outcome = copy_output(&mut state, OptionSlot::Second, Some(&mut primary), &mut fallback, FEEDBACK, now);
        assert_eq!(outcome, CopyOutcome::Copied(CopyPath::Platform));
        assert_eq!(primary.written, vec!["你好"]);
        assert!(fallback.written.is_empty());
        let feedback = state.copy_feedback().unwrap();
        assert_eq!(feedback.slot, OptionSlot::Second);
        assert_eq!(feedback.until, now + FEEDBACK);
    }

    #[test]
    fn rejected_platform_copy_falls_back() {
        let mut state = revealed();
        let mut primary = FakeSink { fail: true, ..FakeSink::default() };
        let mut fallback = FakeSink::default();
        let outcome = copy_output(&mut state, OptionSlot::Third, Some(&mut primary), &mut fallback, FEEDBACK, Instant::now());
        assert_eq!(outcome, CopyOutcome::Copied(CopyPath::Fallback));
        assert_eq!(fallback.written, vec!["安安"]);
    }

    #[test]
    fn total_failure_alerts_and_keeps_output() {
        let mut state = revealed();
        let mut fallback = FakeSink { fail: true, ..FakeSink::default() };
        let outcome = copy_output(&mut state, OptionSlot::First, None, &mut fallback, FEEDBACK, Instant::now());
        assert_eq!(outcome, CopyOutcome::Failed);
        assert_eq!(state.alert(), Some(&Alert::CopyFailed));
        assert!(state.copy_feedback().is_none());
        assert_eq!(state.revealed_variants().unwrap().get(OptionSlot::First), "你好嗎");
    }

    #[test]
    fn hidden_output_copies_nothing() {
        let mut state = AppState::new();
        let mut fallback = FakeSink::default();
        let outcome = copy_output(&mut state, OptionSlot::First, None, &mut fallback, FEEDBACK, Instant::now());
        assert_eq!(outcome, CopyOutcome::NothingToCopy);
        assert!(fallback.written.is_empty());
    }
}
