use std::path::{Path, PathBuf};

use image::RgbaImage;
use tracing::{debug, info, warn};
use x11rb::protocol::xproto::Timestamp;
use x11rb::CURRENT_TIME;

use crate::clipboard::{ClipboardError, ClipboardSink};
use crate::config::UiConfig;
use crate::dsl::model::RenderEnvelope;
use crate::dsl::validator::validate_render;
use crate::state::{AppState, HitTestIndex};
use crate::surface::{Surface, SurfaceError, SurfaceEvent};
use crate::view::{self, Layout};
use crate::x11::backend::{load_fonts, X11Backend};
use crate::x11::events::{poll_event, WindowEvent};
use crate::x11::renderer::{render_frame, render_to_buffer, Frame};
use crate::x11::selection::SelectionOwner;

const DEBUG_DIR: &str = "debug_out";

/// The X11 window: software-rendered frames, click hit-testing, and
/// ownership of the `CLIPBOARD` selection.
pub struct X11Surface {
    backend: X11Backend,
    layout: Layout,
    hit_test: HitTestIndex,
    selection: SelectionOwner,
    last_event_time: Timestamp,
    last_frame: Option<Frame>,
    debug_dir: Option<PathBuf>,
}

impl X11Surface {
    pub fn open(ui: &UiConfig, debug: bool) -> Result<Self, SurfaceError> {
        let (primary, emoji) = load_fonts(ui)?;
        let backend = X11Backend::connect(ui, primary, emoji)?;
        let debug_dir = if debug {
            std::fs::create_dir_all(DEBUG_DIR)?;
            info!(dir = DEBUG_DIR, "dumping presented frames");
            Some(PathBuf::from(DEBUG_DIR))
        } else {
            None
        };
        Ok(Self {
            backend,
            layout: Layout::from_config(ui),
            hit_test: HitTestIndex::new(),
            selection: SelectionOwner::new(),
            last_event_time: CURRENT_TIME,
            last_frame: None,
            debug_dir,
        })
    }

    fn repaint(&self) -> Result<(), SurfaceError> {
        if let Some(frame) = &self.last_frame {
            render_frame(&self.backend, frame)?;
        }
        Ok(())
    }
}

impl Surface for X11Surface {
    fn present(&mut self, state: &AppState) -> Result<(), SurfaceError> {
        let envelope = view::render(state, &self.layout);
        validate_render(&envelope)?;
        let frame = render_to_buffer(
            &envelope,
            self.backend.font_primary(),
            self.backend.font_emoji(),
            self.backend.font_size(),
        )?;
        render_frame(&self.backend, &frame)?;
        self.hit_test.rebuild(&envelope);
        debug!(seq = envelope.seq, targets = self.hit_test.len(), "frame presented");

        if let Some(dir) = &self.debug_dir {
            if let Err(err) = dump_frame(dir, &envelope, &frame) {
                warn!(%err, "could not write debug frame");
            }
        }
        self.last_frame = Some(frame);
        Ok(())
    }

    fn poll_events(&mut self) -> Result<Vec<SurfaceEvent>, SurfaceError> {
        let mut events = Vec::new();
        while let Some(event) = poll_event(&self.backend)? {
            match event {
                WindowEvent::Click { x, y, time } => {
                    self.last_event_time = time;
                    if let Some(control) = self.hit_test.hit(x, y) {
                        debug!(x, y, control = %control.id(), "click");
                        events.push(SurfaceEvent::Control(control));
                    }
                }
                WindowEvent::Exposed => self.repaint()?,
                WindowEvent::SelectionRequest(request) => {
                    debug!(owned = self.selection.owns(), requestor = request.requestor, "paste request");
                    self.selection.serve(&self.backend, &request)?;
                }
                WindowEvent::SelectionLost => self.selection.release(),
                WindowEvent::CloseRequested => events.push(SurfaceEvent::CloseRequested),
            }
        }
        Ok(events)
    }

    fn clipboard(&mut self) -> Option<&mut dyn ClipboardSink> {
        Some(self)
    }

    fn modal_alerts(&self) -> bool {
        true
    }
}

impl ClipboardSink for X11Surface {
    fn name(&self) -> &str {
        "x11-clipboard"
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.selection.claim(&self.backend, text, self.last_event_time)
    }
}

fn dump_frame(dir: &Path, envelope: &RenderEnvelope, frame: &Frame) -> Result<(), SurfaceError> {
    let stem = dir.join(format!("frame_{:05}", envelope.seq));
    let json = serde_json::to_string_pretty(envelope).map_err(|e| SurfaceError::Dump(e.to_string()))?;
    std::fs::write(stem.with_extension("json"), json)?;

    let image = RgbaImage::from_raw(frame.width as u32, frame.height as u32, frame.to_rgba())
        .ok_or_else(|| SurfaceError::Dump("pixel buffer does not match frame size".to_string()))?;
    image
        .save(stem.with_extension("png"))
        .map_err(|e| SurfaceError::Dump(e.to_string()))
}
