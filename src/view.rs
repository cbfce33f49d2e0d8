//! Pure layout: turns an [`AppState`] into a render envelope.
//!
//! Nothing here touches the window. The surface calls [`render`] at its sync
//! points and paints whatever comes back.

use unicode_width::UnicodeWidthChar;

use crate::config::UiConfig;
use crate::dsl::model::{Command, RenderEnvelope, WindowSpec, RENDER_VERSION};
use crate::state::{AppState, Presentation};
use crate::variants::OptionSlot;

const BACKGROUND: &str = "#F5F5F7";
const PANEL: &str = "#FFFFFF";
const BORDER: &str = "#D2D2D7";
const TEXT: &str = "#1D1D1F";
const MUTED: &str = "#6E6E73";
const ACCENT: &str = "#007AFF";
const SUCCESS: &str = "#34C759";
const DANGER: &str = "#FF3B30";

const MARGIN: i32 = 24;
const PADDING: i32 = 12;
const GAP: i32 = 12;
const BUTTON_WIDTH: u32 = 104;

pub const COPY_LABEL: &str = "複製";
pub const COPIED_LABEL: &str = "已複製!";
pub const DISMISS_LABEL: &str = "確定";
pub const LOADING_TEXT: &str = "處理中，請稍候...";
pub const IDLE_HINT: &str = "在終端輸入段落、語調和語言以開始";

/// Something the user can click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Copy(OptionSlot),
    DismissAlert,
}

impl Control {
    pub fn id(self) -> String {
        match self {
            Control::Copy(slot) => format!("copy-{}", slot.output_id()),
            Control::DismissAlert => "alert-dismiss".to_string(),
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        if id == "alert-dismiss" {
            return Some(Control::DismissAlert);
        }
        let number = id.strip_prefix("copy-output")?.parse().ok()?;
        OptionSlot::from_number(number).map(Control::Copy)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub font_size: f32,
}

impl Layout {
    pub fn from_config(ui: &UiConfig) -> Self {
        Self {
            width: ui.width,
            height: ui.height,
            title: ui.title.clone(),
            font_size: ui.font_size,
        }
    }

    fn line_height(&self) -> i32 {
        (self.font_size * 1.5).ceil() as i32
    }

    /// Columns of half-width glyphs that fit in `pixels`.
    fn columns(&self, pixels: i32) -> usize {
        ((pixels.max(0) as f32) / (self.font_size * 0.5)).floor().max(1.0) as usize
    }
}

pub fn render(state: &AppState, layout: &Layout) -> RenderEnvelope {
    let mut commands = vec![Command::Clear { color: BACKGROUND.to_string() }];
    let lh = layout.line_height();
    let width = layout.width as i32;
    let modal = state.alert().is_some();

    commands.push(text(MARGIN, 16, &layout.title, ACCENT));
    let summary = state.in_flight().or(state.last_request()).map(|request| {
        format!("語調：{}    語言：{}", request.tone, request.language)
    });
    if let Some(summary) = summary {
        commands.push(text(MARGIN, 16 + lh, &summary, MUTED));
    }
    let top = 16 + lh * 2 + 8;
    commands.push(Command::Line {
        x1: MARGIN,
        y1: top,
        x2: width - MARGIN,
        y2: top,
        color: Some(BORDER.to_string()),
        width: Some(1),
    });

    let content_top = top + GAP;
    match state.presentation() {
        Presentation::Busy => {
            commands.push(text(MARGIN, content_top + lh, LOADING_TEXT, ACCENT));
        }
        Presentation::Revealed => {
            if let Some(variants) = state.revealed_variants() {
                let bottom = layout.height as i32 - MARGIN;
                let panel_h = ((bottom - content_top - GAP * 2) / 3).max(lh * 2);
                for (slot, body) in variants.iter() {
                    let y = content_top + slot.index() as i32 * (panel_h + GAP);
                    let copied = state.copy_feedback().is_some_and(|f| f.slot == slot);
                    push_panel(&mut commands, layout, slot, body, y, panel_h, copied, !modal);
                }
            }
        }
        Presentation::Idle => {
            commands.push(text(MARGIN, content_top + lh, IDLE_HINT, MUTED));
        }
    }

    if let Some(alert) = state.alert() {
        push_alert(&mut commands, layout, alert.message());
    }

    RenderEnvelope {
        version: RENDER_VERSION.to_string(),
        render_type: "render".to_string(),
        seq: state.frame(),
        window: WindowSpec {
            width: layout.width,
            height: layout.height,
            title: layout.title.clone(),
        },
        commands,
    }
}

#[allow(clippy::too_many_arguments)]
fn push_panel(
    commands: &mut Vec<Command>,
    layout: &Layout,
    slot: OptionSlot,
    body: &str,
    y: i32,
    h: i32,
    copied: bool,
    clickable: bool,
) {
    let lh = layout.line_height();
    let w = layout.width as i32 - MARGIN * 2;
    commands.push(rect(None, MARGIN, y, w, h, PANEL, Some(BORDER), false));
    commands.push(text(MARGIN + PADDING, y + 8, &format!("選項 {}", slot.number()), ACCENT));

    let button_x = MARGIN + w - BUTTON_WIDTH as i32 - PADDING;
    let (fill, stroke, label, label_color) = if copied {
        (SUCCESS, SUCCESS, COPIED_LABEL, PANEL)
    } else {
        (PANEL, ACCENT, COPY_LABEL, ACCENT)
    };
    commands.push(rect(
        Some(Control::Copy(slot)),
        button_x,
        y + 6,
        BUTTON_WIDTH as i32,
        lh + 4,
        fill,
        Some(stroke),
        clickable,
    ));
    commands.push(text(button_x + PADDING, y + 8, label, label_color));

    let body_top = y + 8 + lh + 6;
    let max_lines = ((h - (body_top - y) - 8) / lh).max(1) as usize;
    let lines = clip_lines(wrap_text(body, layout.columns(w - PADDING * 2)), max_lines);
    for (i, line) in lines.iter().enumerate() {
        commands.push(text(MARGIN + PADDING, body_top + i as i32 * lh, line, TEXT));
    }
}

fn push_alert(commands: &mut Vec<Command>, layout: &Layout, message: &str) {
    let lh = layout.line_height();
    let w = (layout.width as i32 - MARGIN * 2).min(560);
    let lines = wrap_text(message, layout.columns(w - PADDING * 2));
    let h = PADDING * 2 + lines.len() as i32 * lh + GAP + lh + 4 + PADDING;
    let x = (layout.width as i32 - w) / 2;
    let y = ((layout.height as i32 - h) / 2).max(0);

    commands.push(rect(None, x, y, w, h, PANEL, Some(DANGER), false));
    for (i, line) in lines.iter().enumerate() {
        commands.push(text(x + PADDING, y + PADDING + i as i32 * lh, line, TEXT));
    }
    let button_y = y + h - PADDING - lh - 4;
    let button_x = x + w - BUTTON_WIDTH as i32 - PADDING;
    commands.push(rect(
        Some(Control::DismissAlert),
        button_x,
        button_y,
        BUTTON_WIDTH as i32,
        lh + 4,
        ACCENT,
        Some(ACCENT),
        true,
    ));
    commands.push(text(button_x + PADDING, button_y + 2, DISMISS_LABEL, PANEL));
}

#[allow(clippy::too_many_arguments)]
fn rect(
    control: Option<Control>,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    fill: &str,
    stroke: Option<&str>,
    clickable: bool,
) -> Command {
    Command::Rect {
        id: control.map(Control::id),
        x,
        y,
        w: w.max(1) as u32,
        h: h.max(1) as u32,
        fill: Some(fill.to_string()),
        stroke: stroke.map(str::to_string),
        stroke_width: stroke.map(|_| 1),
        clickable,
    }
}

fn text(x: i32, y: i32, content: &str, color: &str) -> Command {
    Command::Text {
        x,
        y,
        text: content.to_string(),
        color: Some(color.to_string()),
        bg: None,
    }
}

/// Greedy wrap by display width; wide (CJK) glyphs count as two columns.
pub fn wrap_text(content: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(2);
    let mut lines = Vec::new();
    for source in content.lines() {
        let mut line = String::new();
        let mut used = 0;
        for ch in source.chars() {
            let w = ch.width().unwrap_or(0);
            if used + w > columns && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                used = 0;
            }
            line.push(ch);
            used += w;
        }
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn clip_lines(mut lines: Vec<String>, max_lines: usize) -> Vec<String> {
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            last.push('…');
        }
    }
    lines
}
