use crate::plan::NodeType;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Threshold used by synthesis and rendering when picking a text color.
pub const TEXT_LUMINANCE_THRESHOLD: f32 = 0.5;
/// Slightly stricter threshold used by the validator's contrast check.
pub const CONTRAST_LUMINANCE_THRESHOLD: f32 = 0.45;

pub const LIGHT_TEXT: &str = "#ffffff";
pub const DARK_TEXT: &str = "#1a1a1a";

static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap());
static BARE_HEX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{6}$").unwrap());

/// Color scheme for one architecture lane: node fill/stroke, the translucent
/// band behind the lane, and the header text color.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneColors {
    pub name: String,
    pub fill: String,
    pub stroke: String,
    pub band: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeColors {
    pub node_type: NodeType,
    pub fill: String,
    pub stroke: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Palette {
    pub lane_colors: Vec<LaneColors>,
    pub external: LaneColors,
    pub type_colors: Vec<TypeColors>,
    pub default_type: TypeColors,
    pub title_color: String,
    pub caption_color: String,
    pub edge_stroke: String,
    pub group_stroke: String,
    pub background: String,
}

fn lane(name: &str, fill: &str, stroke: &str, band: &str) -> LaneColors {
    LaneColors {
        name: name.to_string(),
        fill: fill.to_string(),
        stroke: stroke.to_string(),
        band: band.to_string(),
        text: LIGHT_TEXT.to_string(),
    }
}

fn type_color(node_type: NodeType, fill: &str, stroke: &str) -> TypeColors {
    TypeColors {
        node_type,
        fill: fill.to_string(),
        stroke: stroke.to_string(),
    }
}

impl Palette {
    pub fn architect_default() -> Self {
        Self {
            lane_colors: vec![
                lane("Experience", "#0a6ed1", "#0858a8", "#e8f4fd"),
                lane("Application", "#148080", "#0f6666", "#e6f5f5"),
                lane("Integration", "#f39c12", "#c77d0e", "#fef5e6"),
                lane("Data", "#6c5ce7", "#5649b9", "#f0eef9"),
                lane("Platform & Security", "#2c3e50", "#1a252f", "#ebeff2"),
            ],
            external: lane("External", "#95a5a6", "#7f8c8d", "#f4f6f6"),
            type_colors: vec![
                type_color(NodeType::App, "#4A90D9", "#3A7AC9"),
                type_color(NodeType::Service, "#5AAA8D", "#4A9A7D"),
                type_color(NodeType::Integration, "#E5A84B", "#D59A3B"),
                type_color(NodeType::Data, "#6F5BC0", "#5F4BB0"),
                type_color(NodeType::Security, "#5C6B7A", "#4C5B6A"),
                type_color(NodeType::External, "#8FA3B0", "#7F939F"),
                type_color(NodeType::Process, "#4CA6A8", "#3C9698"),
                type_color(NodeType::Network, "#5E6F81", "#4E5F71"),
                type_color(NodeType::Input, "#6FB1E8", "#5FA1D8"),
                type_color(NodeType::Output, "#C97B54", "#B96B44"),
                type_color(NodeType::Storage, "#8A77D1", "#7A67C1"),
                type_color(NodeType::Model, "#A55BAD", "#954B9D"),
            ],
            default_type: type_color(NodeType::Default, "#5A6A80", "#4A5A70"),
            title_color: DARK_TEXT.to_string(),
            caption_color: "#666666".to_string(),
            edge_stroke: "#333333".to_string(),
            group_stroke: "#666666".to_string(),
            background: "#ffffff".to_string(),
        }
    }

    /// Lane lookup by display name; unknown lanes get the external scheme.
    pub fn lane_colors(&self, lane: &str) -> &LaneColors {
        self.lane_colors
            .iter()
            .find(|entry| entry.name == lane)
            .unwrap_or(&self.external)
    }

    pub fn type_colors(&self, node_type: NodeType) -> &TypeColors {
        self.type_colors
            .iter()
            .find(|entry| entry.node_type == node_type)
            .unwrap_or(&self.default_type)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::architect_default()
    }
}

/// Linear-space approximation of relative luminance on 0-255 channels.
/// Returns None for anything that is not a `#rrggbb` color.
pub fn relative_luminance(color: &str) -> Option<f32> {
    if !HEX_COLOR_RE.is_match(color) {
        return None;
    }
    let r = u8::from_str_radix(&color[1..3], 16).ok()? as f32 / 255.0;
    let g = u8::from_str_radix(&color[3..5], 16).ok()? as f32 / 255.0;
    let b = u8::from_str_radix(&color[5..7], 16).ok()? as f32 / 255.0;
    Some(0.2126 * r + 0.7152 * g + 0.0722 * b)
}

/// Invalid and `none` colors count as light, matching the defaulted dark
/// text they will be paired with.
pub fn is_dark(color: &str, threshold: f32) -> bool {
    relative_luminance(color).is_some_and(|lum| lum < threshold)
}

/// The one contrast rule, shared by synthesis, rendering, and validation so
/// a document renders identically everywhere.
pub fn contrast_text_color(fill: &str) -> &'static str {
    if is_dark(fill, TEXT_LUMINANCE_THRESHOLD) {
        LIGHT_TEXT
    } else {
        DARK_TEXT
    }
}

/// Normalize loose color values (bare hex, a few named colors) to `#rrggbb`.
pub fn normalize_color(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return default.to_string();
    }
    if trimmed.starts_with('#') {
        return trimmed.to_string();
    }
    if BARE_HEX_RE.is_match(trimmed) {
        return format!("#{trimmed}");
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "white" => "#ffffff".to_string(),
        "black" => "#000000".to_string(),
        "red" => "#ff0000".to_string(),
        "green" => "#00ff00".to_string(),
        "blue" => "#0000ff".to_string(),
        "gray" | "grey" => "#888888".to_string(),
        "none" => "none".to_string(),
        _ => default.to_string(),
    }
}
