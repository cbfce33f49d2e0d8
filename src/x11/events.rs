use x11rb::connection::Connection;
use x11rb::protocol::xproto::{SelectionRequestEvent, Timestamp};
use x11rb::protocol::Event;

use crate::x11::backend::{RenderError, X11Backend};

const LEFT_BUTTON: u8 = 1;

pub enum WindowEvent {
    Click { x: i32, y: i32, time: Timestamp },
    Exposed,
    SelectionRequest(SelectionRequestEvent),
    SelectionLost,
    CloseRequested,
}

/// Next event the app cares about, skipping everything else. Never blocks.
pub fn poll_event(backend: &X11Backend) -> Result<Option<WindowEvent>, RenderError> {
    let conn = backend.connection();
    let atoms = backend.atoms();
    while let Some(event) = conn.poll_for_event()? {
        let mapped = match event {
            Event::ButtonRelease(ev) if ev.detail == LEFT_BUTTON => Some(WindowEvent::Click {
                x: ev.event_x.into(),
                y: ev.event_y.into(),
                time: ev.time,
            }),
            Event::Expose(ev) if ev.count == 0 => Some(WindowEvent::Exposed),
            Event::SelectionRequest(ev) => Some(WindowEvent::SelectionRequest(ev)),
            Event::SelectionClear(ev) if ev.selection == atoms.clipboard => Some(WindowEvent::SelectionLost),
            Event::ClientMessage(ev)
                if ev.format == 32
                    && ev.type_ == atoms.wm_protocols
                    && ev.data.as_data32()[0] == atoms.wm_delete_window =>
            {
                Some(WindowEvent::CloseRequested)
            }
            _ => None,
        };
        if mapped.is_some() {
            return Ok(mapped);
        }
    }
    Ok(None)
}
