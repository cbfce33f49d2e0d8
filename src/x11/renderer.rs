use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::xproto::{ConnectionExt, ImageFormat};

use crate::dsl::model::{Command, RenderEnvelope};
use crate::x11::backend::{RenderError, X11Backend};

/// A frame rasterized into BGRX pixels, four bytes per pixel.
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl Frame {
    /// Opaque RGBA copy of the pixels, for writing image files.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixels
            .chunks_exact(4)
            .flat_map(|px| [px[2], px[1], px[0], 255])
            .collect()
    }
}

/// Paints one frame into the window.
pub fn render_frame(backend: &X11Backend, frame: &Frame) -> Result<(), RenderError> {
    let conn = backend.connection();
    let row_bytes = frame.width * 4;
    if row_bytes == 0 || frame.height == 0 {
        return Ok(());
    }

    // Large frames exceed the request size limit; send them in horizontal strips.
    let budget = conn.maximum_request_bytes().saturating_sub(64);
    let rows_per_strip = (budget / row_bytes).clamp(1, frame.height);

    for (strip, chunk) in frame.pixels.chunks(rows_per_strip * row_bytes).enumerate() {
        let rows = chunk.len() / row_bytes;
        conn.put_image(
            ImageFormat::Z_PIXMAP,
            backend.window(),
            backend.gc(),
            frame.width as u16,
            rows as u16,
            0,
            (strip * rows_per_strip) as i16,
            0,
            backend.depth(),
            chunk,
        )?;
    }

    conn.flush()?;
    Ok(())
}

/// Rasterizes all commands, in order, into a pixel buffer.
pub fn render_to_buffer(
    render: &RenderEnvelope,
    primary: &fontdue::Font,
    emoji: Option<&fontdue::Font>,
    font_size: f32,
) -> Result<Frame, RenderError> {
    let width = render.window.width as usize;
    let height = render.window.height as usize;
    let mut pixels = vec![0u8; width * height * 4];

    fill_rect(&mut pixels, width, height, 0, 0, width as u32, height as u32, (255, 255, 255));

    for command in &render.commands {
        match command {
            Command::Clear { color } => {
                let rgb = parse_rgb(color)?;
                fill_rect(&mut pixels, width, height, 0, 0, width as u32, height as u32, rgb);
            }
            Command::Rect { x, y, w, h, fill, stroke, stroke_width, .. } => {
                if let Some(fill_color) = fill {
                    fill_rect(&mut pixels, width, height, *x, *y, *w, *h, parse_rgb(fill_color)?);
                }
                if let Some(stroke_color) = stroke {
                    let thickness = stroke_width.unwrap_or(1);
                    draw_rect_outline(&mut pixels, width, height, *x, *y, *w, *h, parse_rgb(stroke_color)?, thickness);
                }
            }
            Command::Text { x, y, text, color, bg } => {
                let fg = parse_rgb(color.as_deref().unwrap_or("#000000"))?;
                let bg = bg.as_deref().map(parse_rgb).transpose()?;
                let pen = Pen { fg, bg, primary, emoji, size: font_size };
                draw_text(&mut pixels, width, height, *x, *y, text, &pen);
            }
            Command::Line { x1, y1, x2, y2, color, width: line_width } => {
                let rgb = parse_rgb(color.as_deref().unwrap_or("#000000"))?;
                draw_line(&mut pixels, width, height, *x1, *y1, *x2, *y2, rgb, line_width.unwrap_or(1));
            }
        }
    }

    Ok(Frame { width, height, pixels })
}

#[allow(clippy::too_many_arguments)]
fn fill_rect(p: &mut [u8], pw: usize, ph: usize, x: i32, y: i32, w: u32, h: u32, rgb: (u8, u8, u8)) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + w as i32).min(pw as i32);
    let y1 = (y + h as i32).min(ph as i32);
    for iy in y0..y1 {
        for ix in x0..x1 {
            let idx = (iy as usize * pw + ix as usize) * 4;
            p[idx] = rgb.2;
            p[idx + 1] = rgb.1;
            p[idx + 2] = rgb.0;
            p[idx + 3] = 0;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_rect_outline(p: &mut [u8], pw: usize, ph: usize, x: i32, y: i32, w: u32, h: u32, rgb: (u8, u8, u8), t: u32) {
    let right = x + w as i32 - 1;
    let bottom = y + h as i32 - 1;
    for i in 0..t as i32 {
        draw_line(p, pw, ph, x, y + i, right, y + i, rgb, 1);
        draw_line(p, pw, ph, x, bottom - i, right, bottom - i, rgb, 1);
        draw_line(p, pw, ph, x + i, y, x + i, bottom, rgb, 1);
        draw_line(p, pw, ph, right - i, y, right - i, bottom, rgb, 1);
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_line(p: &mut [u8], pw: usize, ph: usize, x1: i32, y1: i32, x2: i32, y2: i32, rgb: (u8, u8, u8), t: u32) {
    let thickness = t.max(1) as i32;
    let half = thickness / 2;
    let mut x = x1;
    let mut y = y1;
    let dx = (x2 - x1).abs();
    let dy = -(y2 - y1).abs();
    let sx = if x1 < x2 { 1 } else { -1 };
    let sy = if y1 < y2 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        fill_rect(p, pw, ph, x - half, y - half, thickness as u32, thickness as u32, rgb);
        if x == x2 && y == y2 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

struct Pen<'a> {
    fg: (u8, u8, u8),
    bg: Option<(u8, u8, u8)>,
    primary: &'a fontdue::Font,
    emoji: Option<&'a fontdue::Font>,
    size: f32,
}

fn draw_text(p: &mut [u8], pw: usize, ph: usize, x: i32, y: i32, text: &str, pen: &Pen<'_>) {
    let line_height = line_height_px(pen.primary, pen.size);
    let metrics = pen.primary.horizontal_line_metrics(pen.size).unwrap_or(fontdue::LineMetrics {
        ascent: pen.size,
        descent: 0.0,
        line_gap: 0.0,
        new_line_size: pen.size * 1.2,
    });

    for (line_index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let baseline_y = (y + line_index as i32 * line_height) as f32 + metrics.ascent;
        let mut cursor_x = x as f32;

        for ch in line.chars() {
            let font = match pen.emoji {
                Some(emoji) if pen.primary.lookup_glyph_index(ch) == 0 => emoji,
                _ => pen.primary,
            };
            let (g_metrics, bitmap) = font.rasterize(ch, pen.size);
            let gx = cursor_x as i32 + g_metrics.xmin;
            let gy = baseline_y as i32 - (g_metrics.ymin + g_metrics.height as i32);

            for by in 0..g_metrics.height {
                for bx in 0..g_metrics.width {
                    let alpha = bitmap[by * g_metrics.width + bx];
                    if alpha == 0 && pen.bg.is_none() {
                        continue;
                    }
                    let px = gx + bx as i32;
                    let py = gy + by as i32;
                    if px < 0 || px >= pw as i32 || py < 0 || py >= ph as i32 {
                        continue;
                    }
                    let idx = (py as usize * pw + px as usize) * 4;
                    let under = pen.bg.unwrap_or((p[idx + 2], p[idx + 1], p[idx]));
                    let a = alpha as u16;
                    let inv = 255 - a;
                    p[idx] = ((pen.fg.2 as u16 * a + under.2 as u16 * inv) / 255) as u8;
                    p[idx + 1] = ((pen.fg.1 as u16 * a + under.1 as u16 * inv) / 255) as u8;
                    p[idx + 2] = ((pen.fg.0 as u16 * a + under.0 as u16 * inv) / 255) as u8;
                    p[idx + 3] = 0;
                }
            }
            cursor_x += g_metrics.advance_width;
        }
    }
}

fn parse_rgb(value: &str) -> Result<(u8, u8, u8), RenderError> {
    let hex = value
        .strip_prefix('#')
        .filter(|hex| hex.len() == 6)
        .ok_or_else(|| RenderError::Color(value.to_string()))?;
    let pixel = u32::from_str_radix(hex, 16).map_err(|_| RenderError::Color(value.to_string()))?;
    Ok((((pixel >> 16) & 0xff) as u8, ((pixel >> 8) & 0xff) as u8, (pixel & 0xff) as u8))
}

fn line_height_px(font: &fontdue::Font, size: f32) -> i32 {
    if let Some(m) = font.horizontal_line_metrics(size) {
        ((m.ascent + m.descent.abs() + m.line_gap) * 1.2) as i32
    } else {
        (size * 1.5) as i32
    }
}
