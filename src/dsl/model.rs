use serde::{Deserialize, Serialize};

pub const RENDER_VERSION: &str = "TONE/1";

/// One frame: a window spec plus the drawing commands, painted in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderEnvelope {
    pub version: String,
    #[serde(rename = "type")]
    pub render_type: String,
    pub seq: u64,
    pub window: WindowSpec,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd")]
pub enum Command {
    #[serde(rename = "clear")]
    Clear { color: String },
    #[serde(rename = "rect")]
    Rect {
        id: Option<String>,
        x: i32,
        y: i32,
        w: u32,
        h: u32,
        fill: Option<String>,
        stroke: Option<String>,
        stroke_width: Option<u32>,
        #[serde(default)]
        clickable: bool,
    },
    #[serde(rename = "text")]
    Text {
        x: i32,
        y: i32,
        text: String,
        color: Option<String>,
        bg: Option<String>,
    },
    #[serde(rename = "line")]
    Line {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        color: Option<String>,
        width: Option<u32>,
    },
}

impl Command {
    pub fn clickable_id(&self) -> Option<&str> {
        match self {
            Command::Rect { id: Some(id), clickable: true, .. } => Some(id),
            _ => None,
        }
    }
}
