use fontdue::Font;
use thiserror::Error;
use tracing::{debug, warn};
use x11rb::connection::Connection;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ChangeWindowAttributesAux, ConnectionExt, CreateGCAux, CreateWindowAux, EventMask, PropMode,
    WindowClass,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as WrapperConnectionExt;

use crate::config::UiConfig;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot connect to X server: {0}")]
    Connect(#[from] ConnectError),

    #[error("X11 connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("X11 request failed: {0}")]
    Reply(#[from] ReplyError),

    #[error("X11 id allocation failed: {0}")]
    ReplyOrId(#[from] ReplyOrIdError),

    #[error("invalid color {0:?}")]
    Color(String),

    #[error("no usable font found")]
    NoFont,
}

/// Atoms interned once per connection.
#[derive(Debug, Clone, Copy)]
pub struct Atoms {
    pub wm_protocols: Atom,
    pub wm_delete_window: Atom,
    pub net_wm_name: Atom,
    pub clipboard: Atom,
    pub utf8_string: Atom,
    pub targets: Atom,
}

impl Atoms {
    fn intern(conn: &RustConnection) -> Result<Self, RenderError> {
        let intern = |name: &[u8]| -> Result<Atom, RenderError> { Ok(conn.intern_atom(false, name)?.reply()?.atom) };
        Ok(Self {
            wm_protocols: intern(b"WM_PROTOCOLS")?,
            wm_delete_window: intern(b"WM_DELETE_WINDOW")?,
            net_wm_name: intern(b"_NET_WM_NAME")?,
            clipboard: intern(b"CLIPBOARD")?,
            utf8_string: intern(b"UTF8_STRING")?,
            targets: intern(b"TARGETS")?,
        })
    }
}

pub struct X11Backend {
    conn: RustConnection,
    window: u32,
    gc: u32,
    _cursor: u32,
    depth: u8,
    atoms: Atoms,
    width: u16,
    height: u16,
    font_size: f32,
    font_primary: Font,
    font_emoji: Option<Font>,
}

impl X11Backend {
    pub fn connect(ui: &UiConfig, font_primary: Font, font_emoji: Option<Font>) -> Result<Self, RenderError> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let screen = &conn.setup().roots[screen_num];
        let width = u16::try_from(ui.width).unwrap_or(u16::MAX);
        let height = u16::try_from(ui.height).unwrap_or(u16::MAX);

        let window = conn.generate_id()?;
        let gc = conn.generate_id()?;

        let aux = CreateWindowAux::new()
            .background_pixel(screen.white_pixel)
            .event_mask(EventMask::EXPOSURE | EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE);

        conn.create_window(
            screen.root_depth,
            window,
            screen.root,
            0,
            0,
            width,
            height,
            0,
            WindowClass::INPUT_OUTPUT,
            0,
            &aux,
        )?;

        conn.create_gc(gc, window, &CreateGCAux::new())?;
        let atoms = Atoms::intern(&conn)?;
        conn.change_property8(PropMode::REPLACE, window, AtomEnum::WM_NAME, AtomEnum::STRING, ui.title.as_bytes())?;
        conn.change_property8(PropMode::REPLACE, window, atoms.net_wm_name, atoms.utf8_string, ui.title.as_bytes())?;
        conn.change_property32(PropMode::REPLACE, window, atoms.wm_protocols, AtomEnum::ATOM, &[atoms.wm_delete_window])?;
        let cursor = create_default_cursor(&conn, window)?;
        let depth = screen.root_depth;
        conn.map_window(window)?;
        conn.flush()?;
        debug!(width, height, depth, "x11 window mapped");

        Ok(Self {
            conn,
            window,
            gc,
            _cursor: cursor,
            depth,
            atoms,
            width,
            height,
            font_size: ui.font_size,
            font_primary,
            font_emoji,
        })
    }

    pub fn connection(&self) -> &RustConnection {
        &self.conn
    }

    pub fn window(&self) -> u32 {
        self.window
    }

    pub fn gc(&self) -> u32 {
        self.gc
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn atoms(&self) -> &Atoms {
        &self.atoms
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn font_primary(&self) -> &Font {
        &self.font_primary
    }

    pub fn font_emoji(&self) -> Option<&Font> {
        self.font_emoji.as_ref()
    }
}

fn create_default_cursor(conn: &RustConnection, window: u32) -> Result<u32, RenderError> {
    let font = conn.generate_id()?;
    conn.open_font(font, b"cursor")?;
    let cursor = conn.generate_id()?;
    conn.create_glyph_cursor(cursor, font, font, 68, 69, 0, 0, 0, 0xffff, 0xffff, 0xffff)?;
    conn.close_font(font)?;
    conn.change_window_attributes(window, &ChangeWindowAttributesAux::new().cursor(cursor))?;
    Ok(cursor)
}

const PRIMARY_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/usr/share/fonts/wenquanyi/wqy-microhei/wqy-microhei.ttc",
    "/usr/share/fonts/truetype/arphic/uming.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
];

const EMOJI_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/noto/NotoColorEmoji.ttf",
    "/usr/share/fonts/noto/NotoEmoji-Regular.ttf",
];

/// Configured paths first, then common CJK-capable system fonts.
pub fn load_fonts(ui: &UiConfig) -> Result<(Font, Option<Font>), RenderError> {
    let primary = ui
        .font_path
        .as_deref()
        .into_iter()
        .chain(PRIMARY_FONT_CANDIDATES.iter().copied())
        .find_map(load_font_from_path)
        .ok_or(RenderError::NoFont)?;

    let emoji = ui
        .emoji_font_path
        .as_deref()
        .into_iter()
        .chain(EMOJI_FONT_CANDIDATES.iter().copied())
        .find_map(load_font_from_path);

    Ok((primary, emoji))
}

fn load_font_from_path(path: &str) -> Option<Font> {
    let bytes = std::fs::read(path).ok()?;
    match Font::from_bytes(bytes, fontdue::FontSettings::default()) {
        Ok(font) => {
            debug!(path, "loaded font");
            Some(font)
        }
        Err(err) => {
            warn!(path, err, "font file is not usable");
            None
        }
    }
}
