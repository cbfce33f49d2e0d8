use std::time::Instant;

use crate::request::{RewriteRequest, ValidationIssue};
use crate::variants::{OptionSlot, ParsedVariants};

pub const GENERIC_PROCESSING_ERROR: &str = "處理時發生錯誤";
pub const NETWORK_ERROR: &str = "網路錯誤，請稍後再試";
pub const COPY_FAILED: &str = "複製失敗，請手動選取文字";
pub const BUSY_NOTICE: &str = "正在處理中，請稍候";

/// `Idle -> Busy -> Revealed | Idle`; the next submission goes back to `Busy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presentation {
    #[default]
    Idle,
    Busy,
    Revealed,
}

/// A blocking notice for the user. The surface shows it until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    Validation(ValidationIssue),
    Busy,
    Server(Option<String>),
    Network,
    CopyFailed,
}

impl Alert {
    pub fn message(&self) -> &str {
        match self {
            Alert::Validation(issue) => issue.message(),
            Alert::Busy => BUSY_NOTICE,
            Alert::Server(Some(message)) => message,
            Alert::Server(None) => GENERIC_PROCESSING_ERROR,
            Alert::Network => NETWORK_ERROR,
            Alert::CopyFailed => COPY_FAILED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyFeedback {
    pub slot: OptionSlot,
    pub until: Instant,
}

/// Everything the view needs to draw a frame.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    presentation: Presentation,
    variants: Option<ParsedVariants>,
    alert: Option<Alert>,
    copy_feedback: Option<CopyFeedback>,
    in_flight: Option<RewriteRequest>,
    last_request: Option<RewriteRequest>,
    submissions: u64,
    reveals: u64,
    frame: u64,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    pub fn is_busy(&self) -> bool {
        self.presentation == Presentation::Busy
    }

    /// Variants currently on screen, `None` while the output section is hidden.
    pub fn revealed_variants(&self) -> Option<&ParsedVariants> {
        match self.presentation {
            Presentation::Revealed => self.variants.as_ref(),
            Presentation::Idle | Presentation::Busy => None,
        }
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn copy_feedback(&self) -> Option<CopyFeedback> {
        self.copy_feedback
    }

    pub fn in_flight(&self) -> Option<&RewriteRequest> {
        self.in_flight.as_ref()
    }

    /// Request behind the variants on screen.
    pub fn last_request(&self) -> Option<&RewriteRequest> {
        self.last_request.as_ref()
    }

    /// Number of submissions that reached `Busy`.
    pub fn submission_count(&self) -> u64 {
        self.submissions
    }

    /// Number of variant sets stored; tells a repeated reveal from a new one.
    pub fn reveal_count(&self) -> u64 {
        self.reveals
    }

    /// Bumped on every change; surfaces use it to skip redundant redraws.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub(crate) fn enter_busy(&mut self, request: RewriteRequest) {
        self.presentation = Presentation::Busy;
        self.in_flight = Some(request);
        self.submissions += 1;
        self.copy_feedback = None;
        self.touch();
    }

    pub(crate) fn store_variants(&mut self, variants: ParsedVariants) {
        self.variants = Some(variants);
        self.last_request = self.in_flight.clone();
        self.reveals += 1;
        self.touch();
    }

    /// Leaves `Busy` for `next`. Runs last on every completion path.
    pub(crate) fn settle(&mut self, next: Presentation) {
        debug_assert_ne!(next, Presentation::Busy);
        self.presentation = next;
        self.in_flight = None;
        self.touch();
    }

    pub fn raise(&mut self, alert: Alert) {
        self.alert = Some(alert);
        self.touch();
    }

    pub fn dismiss_alert(&mut self) -> bool {
        let had = self.alert.take().is_some();
        if had {
            self.touch();
        }
        had
    }

    pub(crate) fn acknowledge_copy(&mut self, slot: OptionSlot, until: Instant) {
        self.copy_feedback = Some(CopyFeedback { slot, until });
        self.touch();
    }

    /// Drops copy feedback whose deadline has passed. Returns whether anything changed.
    pub fn expire_feedback(&mut self, now: Instant) -> bool {
        match self.copy_feedback {
            Some(feedback) if now >= feedback.until => {
                self.copy_feedback = None;
                self.touch();
                true
            }
            _ => false,
        }
    }

    fn touch(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }
}
