use std::io::{self, Stderr, Stdout, Write};

use crate::clipboard::ClipboardSink;
use crate::state::{Alert, AppState, CopyFeedback, Presentation};
use crate::surface::{Surface, SurfaceError, SurfaceEvent};
use crate::view::{COPIED_LABEL, LOADING_TEXT};

/// Line-oriented surface for headless runs. Prints only what changed since
/// the last present: alerts to `err`, everything else to `out`. Submissions
/// and reveals are tracked by count, so one that started and finished
/// between two presents is still printed.
pub struct TerminalSurface<O: Write = Stdout, E: Write = Stderr> {
    out: O,
    err: E,
    submissions: u64,
    reveals: u64,
    alert: Option<Alert>,
    feedback: Option<CopyFeedback>,
}

impl TerminalSurface {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> TerminalSurface<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            submissions: 0,
            reveals: 0,
            alert: None,
            feedback: None,
        }
    }

    fn print_variants(&mut self, state: &AppState) -> io::Result<()> {
        let Some(variants) = state.revealed_variants() else {
            return Ok(());
        };
        for (slot, text) in variants.iter() {
            writeln!(self.out, "── 選項 {} ──", slot.number())?;
            writeln!(self.out, "{text}")?;
        }
        writeln!(self.out, "（輸入 :copy 1、:copy 2 或 :copy 3 複製）")
    }
}

impl<O: Write, E: Write> Surface for TerminalSurface<O, E> {
    fn present(&mut self, state: &AppState) -> Result<(), SurfaceError> {
        if state.submission_count() != self.submissions {
            if state.presentation() == Presentation::Busy {
                writeln!(self.out, "{LOADING_TEXT}")?;
            }
            self.submissions = state.submission_count();
        }

        if state.presentation() == Presentation::Revealed && state.reveal_count() != self.reveals {
            self.print_variants(state)?;
            self.reveals = state.reveal_count();
        }

        let feedback = state.copy_feedback();
        if feedback != self.feedback {
            if let Some(feedback) = feedback {
                writeln!(self.out, "選項 {} {COPIED_LABEL}", feedback.slot.number())?;
            }
            self.feedback = feedback;
        }

        let alert = state.alert().cloned();
        if alert != self.alert {
            if let Some(alert) = &alert {
                writeln!(self.err, "[!] {}", alert.message())?;
            }
            self.alert = alert;
        }

        self.out.flush()?;
        self.err.flush()?;
        Ok(())
    }

    fn poll_events(&mut self) -> Result<Vec<SurfaceEvent>, SurfaceError> {
        Ok(Vec::new())
    }

    fn clipboard(&mut self) -> Option<&mut dyn ClipboardSink> {
        None
    }

    fn modal_alerts(&self) -> bool {
        false
    }
}
