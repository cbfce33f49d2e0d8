//! Where the app state gets shown and where clicks come from.

pub mod terminal;

use thiserror::Error;

use crate::clipboard::ClipboardSink;
use crate::dsl::validator::ValidationError;
use crate::state::AppState;
use crate::view::Control;
use crate::x11::backend::RenderError;

pub use terminal::TerminalSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    Control(Control),
    CloseRequested,
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("surface output failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame dump failed: {0}")]
    Dump(String),
}

pub trait Surface {
    /// Shows `state`. Called only when its frame counter moved.
    fn present(&mut self, state: &AppState) -> Result<(), SurfaceError>;

    fn poll_events(&mut self) -> Result<Vec<SurfaceEvent>, SurfaceError>;

    /// Platform clipboard owned by this surface, if any.
    fn clipboard(&mut self) -> Option<&mut dyn ClipboardSink>;

    /// Whether alerts stay up until the user dismisses them here.
    fn modal_alerts(&self) -> bool;
}
