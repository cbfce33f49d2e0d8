use std::collections::HashSet;

use thiserror::Error;

use crate::dsl::model::{Command, RenderEnvelope};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid render envelope: {0}")]
pub struct ValidationError(String);

fn invalid(reason: impl Into<String>) -> ValidationError {
    ValidationError(reason.into())
}

/// Checks what can vary from frame to frame: control ids, colors and
/// stroke widths. Version, window and command order come from the view.
pub fn validate_render(render: &RenderEnvelope) -> Result<(), ValidationError> {
    let mut ids = HashSet::new();
    for command in &render.commands {
        match command {
            Command::Clear { color } => validate_color(color, "clear.color")?,
            Command::Rect { id, clickable, .. } => {
                match id {
                    Some(id) if id.trim().is_empty() => return Err(invalid("id must not be empty")),
                    Some(id) => {
                        if !ids.insert(id.as_str()) {
                            return Err(invalid(format!("duplicate id {id}")));
                        }
                    }
                    None if *clickable => return Err(invalid("clickable rect requires id")),
                    None => {}
                }
                validate_rect(command)?;
            }
            Command::Text { color, bg, .. } => {
                if let Some(color) = color {
                    validate_color(color, "text.color")?;
                }
                if let Some(bg) = bg {
                    validate_color(bg, "text.bg")?;
                }
            }
            Command::Line { color, width, .. } => {
                if let Some(color) = color {
                    validate_color(color, "line.color")?;
                }
                if *width == Some(0) {
                    return Err(invalid("line.width must be positive"));
                }
            }
        }
    }

    Ok(())
}

fn validate_rect(command: &Command) -> Result<(), ValidationError> {
    if let Command::Rect { fill, stroke, stroke_width, .. } = command {
        if let Some(fill) = fill {
            validate_color(fill, "rect.fill")?;
        }
        if let Some(stroke) = stroke {
            validate_color(stroke, "rect.stroke")?;
        }
        if *stroke_width == Some(0) {
            return Err(invalid("rect.stroke_width must be positive"));
        }
    }
    Ok(())
}

fn validate_color(value: &str, field: &str) -> Result<(), ValidationError> {
    if is_hex_color(value) {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be #RRGGBB")))
    }
}

fn is_hex_color(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 7 && bytes[0] == b'#' && bytes[1..].iter().all(u8::is_ascii_hexdigit)
}
