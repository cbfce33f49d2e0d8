//! `CLIPBOARD` selection ownership.
//!
//! Owning the selection means other clients ask us for the text through
//! `SelectionRequest` events, so the window loop must keep serving them
//! for as long as we hold it.

use tracing::{debug, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ConnectionExt, EventMask, PropMode, SelectionNotifyEvent, SelectionRequestEvent, Timestamp,
    SELECTION_NOTIFY_EVENT,
};
use x11rb::wrapper::ConnectionExt as WrapperConnectionExt;
use x11rb::NONE;

use crate::clipboard::ClipboardError;
use crate::x11::backend::{RenderError, X11Backend};

#[derive(Debug, Default)]
pub struct SelectionOwner {
    text: Option<Vec<u8>>,
}

impl SelectionOwner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owns(&self) -> bool {
        self.text.is_some()
    }

    /// Takes the `CLIPBOARD` selection with `text` as its contents.
    pub fn claim(&mut self, backend: &X11Backend, text: &str, time: Timestamp) -> Result<(), ClipboardError> {
        let conn = backend.connection();
        let clipboard = backend.atoms().clipboard;
        let x11 = |err: &dyn std::fmt::Display| ClipboardError::X11(err.to_string());

        conn.set_selection_owner(backend.window(), clipboard, time).map_err(|e| x11(&e))?;
        let owner = conn
            .get_selection_owner(clipboard)
            .map_err(|e| x11(&e))?
            .reply()
            .map_err(|e| x11(&e))?
            .owner;
        if owner != backend.window() {
            self.text = None;
            return Err(ClipboardError::X11("another client kept the clipboard".to_string()));
        }

        self.text = Some(text.as_bytes().to_vec());
        debug!(bytes = text.len(), "claimed CLIPBOARD selection");
        Ok(())
    }

    pub fn release(&mut self) {
        if self.text.take().is_some() {
            debug!("CLIPBOARD selection taken by another client");
        }
    }

    /// Answers a paste request from another client.
    pub fn serve(&self, backend: &X11Backend, request: &SelectionRequestEvent) -> Result<(), RenderError> {
        let conn = backend.connection();
        let atoms = backend.atoms();
        let property = if request.property == NONE { request.target } else { request.property };
        let string: Atom = AtomEnum::STRING.into();

        let answered = match &self.text {
            Some(_) if request.selection != atoms.clipboard => None,
            Some(_) if request.target == atoms.targets => {
                conn.change_property32(
                    PropMode::REPLACE,
                    request.requestor,
                    property,
                    AtomEnum::ATOM,
                    &[atoms.targets, atoms.utf8_string, string],
                )?;
                Some(property)
            }
            Some(text) if request.target == atoms.utf8_string || request.target == string => {
                conn.change_property8(PropMode::REPLACE, request.requestor, property, request.target, text)?;
                Some(property)
            }
            _ => None,
        };
        if answered.is_none() {
            warn!(requested = request.target, "refusing selection request");
        }

        let notify = SelectionNotifyEvent {
            response_type: SELECTION_NOTIFY_EVENT,
            sequence: 0,
            time: request.time,
            requestor: request.requestor,
            selection: request.selection,
            target: request.target,
            property: answered.unwrap_or(NONE),
        };
        conn.send_event(false, request.requestor, EventMask::NO_EVENT, notify)?;
        conn.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_without_ownership_and_release_is_idempotent() {
        let mut owner = SelectionOwner::new();
        assert!(!owner.owns());
        owner.release();
        owner.release();
        assert!(!owner.owns());
    }
}
