use std::collections::BTreeMap;
use std::fmt::Write as _;

use thiserror::Error;

use crate::config::LayoutConfig;
use crate::layout::{Layout, Rect, resolve_lane_index};
use crate::plan::{GroupStyle, LayoutMode, Node, NodeType, Plan};
use crate::theme::{Palette, contrast_text_color};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    Cylinder,
    Hexagon,
    Text,
}

/// Z-order classification, derived from a shape's own style attributes so
/// that any consumer of the document layers it the same way regardless of
/// emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ZLayer {
    Background,
    Group,
    Label,
    Node,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub id: String,
    pub kind: ShapeKind,
    pub rect: Rect,
    pub text: String,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub font_color: Option<String>,
    pub font_size: u32,
    pub bold: bool,
    pub dashed: bool,
    pub rounded: bool,
    pub opacity: Option<u8>,
    pub fill_opacity: Option<u8>,
    pub shadow: bool,
}

impl Shape {
    fn text_shape(id: &str, rect: Rect, text: &str, font_size: u32, color: &str, bold: bool) -> Self {
        Self {
            id: id.to_string(),
            kind: ShapeKind::Text,
            rect,
            text: text.to_string(),
            fill: None,
            stroke: None,
            font_color: Some(color.to_string()),
            font_size,
            bold,
            dashed: false,
            rounded: false,
            opacity: None,
            fill_opacity: None,
            shadow: false,
        }
    }

    pub fn z_layer(&self) -> ZLayer {
        if self.opacity.unwrap_or(100) < 100 || self.fill_opacity.unwrap_or(100) < 100 {
            ZLayer::Background
        } else if self.dashed {
            ZLayer::Group
        } else if self.kind == ShapeKind::Text {
            ZLayer::Label
        } else {
            ZLayer::Node
        }
    }

    /// A proper diagram node: opaque, not a dashed container, not a label,
    /// and carrying display text. Lane bands, group boxes, and legend
    /// swatches all fail one of those tests.
    pub fn is_node_like(&self) -> bool {
        self.z_layer() == ZLayer::Node && !self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeCell {
    pub id: String,
    pub source: String,
    pub target: String,
    pub stroke: String,
    pub stroke_width: f32,
    pub end_arrow: String,
}

/// The stable boundary artifact between synthesis and rendering/validation.
/// Fully self-describing: consumers never reach back into the plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub width: f32,
    pub height: f32,
    pub shapes: Vec<Shape>,
    pub edges: Vec<EdgeCell>,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document parse error: {0}")]
    Parse(String),
    #[error("unsupported document root `{0}`")]
    UnexpectedRoot(String),
}

/// Walk the laid-out plan and emit the diagram document. Pure function of
/// its inputs; every shape id derives from the source node/group/edge id so
/// regenerating the same plan yields a diffable document.
pub fn synthesize(plan: &Plan, layout: &Layout, palette: &Palette, config: &LayoutConfig) -> Document {
    let mut shapes = Vec::new();
    let mut edges = Vec::new();

    let margin = match plan.mode {
        LayoutMode::Swimlane => config.swimlane.margin,
        LayoutMode::Flow => config.flow.margin,
    };

    shapes.push(Shape::text_shape(
        "title",
        Rect::new(margin, margin, 400.0, 30.0),
        &plan.title,
        18,
        &palette.title_color,
        true,
    ));

    for (index, lane) in layout.lanes.iter().enumerate() {
        let colors = palette.lane_colors(&lane.name);
        shapes.push(Shape {
            id: format!("lane_{index}"),
            kind: ShapeKind::Rectangle,
            rect: lane.rect,
            text: String::new(),
            fill: Some(colors.band.clone()),
            stroke: Some("#e0e0e0".to_string()),
            font_color: None,
            font_size: 12,
            bold: false,
            dashed: false,
            rounded: false,
            opacity: Some(50),
            fill_opacity: None,
            shadow: false,
        });
        shapes.push(Shape::text_shape(
            &format!("lanelabel_{index}"),
            Rect::new(lane.rect.x + 8.0, lane.rect.y + 6.0, 160.0, 24.0),
            &lane.name,
            13,
            &colors.fill,
            true,
        ));
    }

    for group_box in &layout.groups {
        let Some(group) = plan.groups.iter().find(|g| g.id == group_box.id) else {
            continue;
        };
        shapes.push(Shape {
            id: format!("g_{}", group.id),
            kind: ShapeKind::Rectangle,
            rect: group_box.rect,
            text: group.name.clone(),
            fill: Some("#ffffff".to_string()),
            stroke: Some(palette.group_stroke.clone()),
            font_color: Some(palette.caption_color.clone()),
            font_size: 11,
            bold: true,
            dashed: group.style == GroupStyle::Dashed,
            rounded: true,
            opacity: None,
            fill_opacity: Some(60),
            shadow: false,
        });
    }

    for node in &plan.nodes {
        let Some(rect) = layout.nodes.get(&node.id) else {
            continue;
        };
        let (fill, stroke) = node_colors(plan, node, palette, config);
        let kind = match node.node_type {
            NodeType::Data | NodeType::Storage => ShapeKind::Cylinder,
            NodeType::Security => ShapeKind::Hexagon,
            _ => ShapeKind::Rectangle,
        };
        shapes.push(Shape {
            id: format!("n_{}", node.id),
            kind,
            rect: *rect,
            text: node.name.clone(),
            font_color: Some(contrast_text_color(&fill).to_string()),
            fill: Some(fill),
            stroke: Some(stroke),
            font_size: 12,
            bold: true,
            dashed: false,
            rounded: true,
            opacity: None,
            fill_opacity: None,
            shadow: true,
        });
    }

    for edge in &plan.edges {
        let (Some(from), Some(to)) = (layout.nodes.get(&edge.from), layout.nodes.get(&edge.to))
        else {
            continue;
        };
        edges.push(EdgeCell {
            id: format!("e_{}_{}", edge.from, edge.to),
            source: format!("n_{}", edge.from),
            target: format!("n_{}", edge.to),
            stroke: palette.edge_stroke.clone(),
            stroke_width: 2.0,
            end_arrow: "blockThin".to_string(),
        });

        if let Some(label) = edge.label.as_deref() {
            let (fx, fy) = from.center();
            let (tx, ty) = to.center();
            let mid_x = (fx + tx) / 2.0;
            let mid_y = (fy + ty) / 2.0;
            // Lift the label off the connector line.
            shapes.push(Shape::text_shape(
                &format!("l_{}_{}", edge.from, edge.to),
                Rect::new(mid_x - 50.0, mid_y - 25.0, 100.0, 20.0),
                label,
                10,
                &palette.edge_stroke,
                false,
            ));
        }
    }

    if plan.legend {
        push_legend(&mut shapes, plan, layout, palette, margin);
    }

    Document {
        width: layout.width,
        height: layout.height,
        shapes,
        edges,
    }
}

fn node_colors(plan: &Plan, node: &Node, palette: &Palette, config: &LayoutConfig) -> (String, String) {
    if node.external {
        return (palette.external.fill.clone(), palette.external.stroke.clone());
    }
    match plan.mode {
        LayoutMode::Swimlane => {
            let index = resolve_lane_index(node.lane.as_deref(), &plan.lanes, &config.fallback_lane);
            let name = plan.lanes.get(index).map(String::as_str).unwrap_or("");
            let colors = palette.lane_colors(name);
            (colors.fill.clone(), colors.stroke.clone())
        }
        LayoutMode::Flow => {
            let colors = palette.type_colors(node.node_type);
            (colors.fill.clone(), colors.stroke.clone())
        }
    }
}

/// Legend strip: a single row of swatch+caption pairs for the first four
/// lanes. Swimlane mode keeps it in the title band (nodes never reach that
/// high); flow mode parks it in the bottom margin below the last row.
fn push_legend(shapes: &mut Vec<Shape>, plan: &Plan, layout: &Layout, palette: &Palette, margin: f32) {
    let entries: Vec<&String> = plan.lanes.iter().take(4).collect();
    if entries.is_empty() {
        return;
    }
    let entry_width = 120.0;
    let (mut x, y) = match plan.mode {
        LayoutMode::Swimlane => {
            let strip = 60.0 + entries.len() as f32 * entry_width;
            (layout.width - margin - strip, margin + 5.0)
        }
        LayoutMode::Flow => (margin, layout.height - margin + 6.0),
    };

    shapes.push(Shape::text_shape(
        "legend",
        Rect::new(x, y, 60.0, 16.0),
        "Legend",
        11,
        &palette.caption_color,
        true,
    ));
    x += 60.0;

    for lane in entries {
        let colors = palette.lane_colors(lane);
        shapes.push(Shape {
            id: format!("leg_{lane}"),
            kind: ShapeKind::Rectangle,
            rect: Rect::new(x, y, 16.0, 16.0),
            text: String::new(),
            fill: Some(colors.fill.clone()),
            stroke: Some(colors.stroke.clone()),
            font_color: None,
            font_size: 9,
            bold: false,
            dashed: false,
            rounded: true,
            opacity: None,
            fill_opacity: None,
            shadow: false,
        });
        shapes.push(Shape::text_shape(
            &format!("legl_{lane}"),
            Rect::new(x + 22.0, y, entry_width - 26.0, 16.0),
            lane,
            9,
            &palette.caption_color,
            false,
        ));
        x += entry_width;
    }
}

impl Document {
    /// Serialize to draw.io-compatible mxGraphModel XML: one root, the two
    /// conventional placeholder cells, then every shape and edge as a flat
    /// child list with semicolon-delimited style strings.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "<mxGraphModel dx=\"{w}\" dy=\"{h}\" grid=\"1\" gridSize=\"10\" guides=\"1\" tooltips=\"1\" connect=\"1\" arrows=\"1\" fold=\"1\" page=\"1\" pageScale=\"1\" pageWidth=\"{w}\" pageHeight=\"{h}\" math=\"0\" shadow=\"1\">\n",
            w = self.width,
            h = self.height
        );
        out.push_str("  <root>\n");
        out.push_str("    <mxCell id=\"0\" />\n");
        out.push_str("    <mxCell id=\"1\" parent=\"0\" />\n");

        for shape in &self.shapes {
            let _ = write!(
                out,
                "    <mxCell id=\"{}\" value=\"{}\" style=\"{}\" vertex=\"1\" parent=\"1\">\n",
                escape_xml(&shape.id),
                escape_xml(&shape.text),
                escape_xml(&shape.style_string())
            );
            let _ = write!(
                out,
                "      <mxGeometry x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" as=\"geometry\" />\n",
                shape.rect.x, shape.rect.y, shape.rect.width, shape.rect.height
            );
            out.push_str("    </mxCell>\n");
        }

        for edge in &self.edges {
            let style = format!(
                "edgeStyle=orthogonalEdgeStyle;rounded=1;orthogonalLoop=1;jettySize=auto;html=1;strokeColor={};strokeWidth={};endArrow={};endFill=1;endSize=8;",
                edge.stroke, edge.stroke_width, edge.end_arrow
            );
            let _ = write!(
                out,
                "    <mxCell id=\"{}\" style=\"{}\" edge=\"1\" parent=\"1\" source=\"{}\" target=\"{}\">\n",
                escape_xml(&edge.id),
                escape_xml(&style),
                escape_xml(&edge.source),
                escape_xml(&edge.target)
            );
            out.push_str("      <mxGeometry relative=\"1\" as=\"geometry\" />\n");
            out.push_str("    </mxCell>\n");
        }

        out.push_str("  </root>\n");
        out.push_str("</mxGraphModel>\n");
        out
    }

    /// Parse a document back from XML. Tolerant of foreign attributes and
    /// style keys; vertices without a geometry block are dropped, edge cells
    /// keep whatever endpoints they declare.
    pub fn from_xml(xml: &str) -> Result<Self, DocumentError> {
        let doc =
            roxmltree::Document::parse(xml).map_err(|e| DocumentError::Parse(e.to_string()))?;
        let root = doc.root_element();
        if root.tag_name().name() != "mxGraphModel" {
            return Err(DocumentError::UnexpectedRoot(root.tag_name().name().to_string()));
        }

        let width = parse_f32(root.attribute("pageWidth")).unwrap_or(0.0);
        let height = parse_f32(root.attribute("pageHeight")).unwrap_or(0.0);

        let mut shapes = Vec::new();
        let mut edges = Vec::new();

        for cell in root.descendants().filter(|n| n.has_tag_name("mxCell")) {
            let id = cell.attribute("id").unwrap_or_default().to_string();
            let style = parse_style(cell.attribute("style").unwrap_or_default());

            if cell.attribute("vertex") == Some("1") {
                let Some(geometry) = cell.children().find(|n| n.has_tag_name("mxGeometry")) else {
                    continue;
                };
                let rect = Rect::new(
                    parse_f32(geometry.attribute("x")).unwrap_or(0.0),
                    parse_f32(geometry.attribute("y")).unwrap_or(0.0),
                    parse_f32(geometry.attribute("width")).unwrap_or(120.0),
                    parse_f32(geometry.attribute("height")).unwrap_or(60.0),
                );
                shapes.push(shape_from_style(
                    id,
                    rect,
                    cell.attribute("value").unwrap_or_default(),
                    &style,
                ));
            } else if cell.attribute("edge") == Some("1") {
                edges.push(EdgeCell {
                    id,
                    source: cell.attribute("source").unwrap_or_default().to_string(),
                    target: cell.attribute("target").unwrap_or_default().to_string(),
                    stroke: style.get("strokeColor").cloned().unwrap_or_else(|| "#333333".to_string()),
                    stroke_width: style
                        .get("strokeWidth")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(1.0),
                    end_arrow: style.get("endArrow").cloned().unwrap_or_default(),
                });
            }
        }

        Ok(Self {
            width,
            height,
            shapes,
            edges,
        })
    }
}

impl Shape {
    fn style_string(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        match self.kind {
            ShapeKind::Text => {
                parts.push("text".to_string());
                parts.push("html=1".to_string());
                parts.push("strokeColor=none".to_string());
                parts.push("fillColor=none".to_string());
            }
            ShapeKind::Rectangle => {
                parts.push(format!("rounded={}", if self.rounded { 1 } else { 0 }));
                parts.push("whiteSpace=wrap".to_string());
                parts.push("html=1".to_string());
                if self.rounded {
                    parts.push("arcSize=20".to_string());
                }
            }
            ShapeKind::Cylinder => {
                parts.push("shape=cylinder3".to_string());
                parts.push("whiteSpace=wrap".to_string());
                parts.push("html=1".to_string());
                parts.push("boundedLbl=1".to_string());
                parts.push("backgroundOutline=1".to_string());
                parts.push("size=15".to_string());
            }
            ShapeKind::Hexagon => {
                parts.push("shape=hexagon".to_string());
                parts.push("perimeter=hexagonPerimeter2".to_string());
                parts.push("whiteSpace=wrap".to_string());
                parts.push("html=1".to_string());
                parts.push("fixedSize=1".to_string());
                parts.push("size=20".to_string());
            }
        }
        if self.kind != ShapeKind::Text {
            if let Some(fill) = &self.fill {
                parts.push(format!("fillColor={fill}"));
            }
            if let Some(stroke) = &self.stroke {
                parts.push(format!("strokeColor={stroke}"));
            }
            parts.push("strokeWidth=2".to_string());
        }
        if self.dashed {
            parts.push("dashed=1".to_string());
            parts.push("dashPattern=8 4".to_string());
        }
        if let Some(opacity) = self.opacity {
            parts.push(format!("opacity={opacity}"));
        }
        if let Some(fill_opacity) = self.fill_opacity {
            parts.push(format!("fillOpacity={fill_opacity}"));
        }
        if let Some(font_color) = &self.font_color {
            parts.push(format!("fontColor={font_color}"));
        }
        parts.push(format!("fontSize={}", self.font_size));
        if self.bold {
            parts.push("fontStyle=1".to_string());
        }
        if self.shadow {
            parts.push("shadow=1".to_string());
        }
        let mut style = parts.join(";");
        style.push(';');
        style
    }
}

fn shape_from_style(id: String, rect: Rect, value: &str, style: &BTreeMap<String, String>) -> Shape {
    let shape_token = style.get("shape").map(String::as_str).unwrap_or("");
    let kind = if style.contains_key("text") || style.get("strokeColor").map(String::as_str) == Some("none")
    {
        ShapeKind::Text
    } else if shape_token.contains("cylinder") {
        ShapeKind::Cylinder
    } else if shape_token.contains("hexagon") {
        ShapeKind::Hexagon
    } else {
        ShapeKind::Rectangle
    };

    let color = |key: &str| -> Option<String> {
        style.get(key).filter(|v| v.as_str() != "none").cloned()
    };
    Shape {
        id,
        kind,
        rect,
        text: value.to_string(),
        fill: color("fillColor"),
        stroke: color("strokeColor"),
        font_color: color("fontColor"),
        font_size: style.get("fontSize").and_then(|v| v.parse().ok()).unwrap_or(12),
        bold: style.get("fontStyle").map(String::as_str) == Some("1"),
        dashed: style.get("dashed").map(String::as_str) == Some("1"),
        rounded: style.get("rounded").map(String::as_str) == Some("1"),
        opacity: style.get("opacity").and_then(|v| v.parse().ok()),
        fill_opacity: style.get("fillOpacity").and_then(|v| v.parse().ok()),
        shadow: style.get("shadow").map(String::as_str) == Some("1"),
    }
}

/// Parse a semicolon-delimited style string; bare flags become `key=1`.
pub fn parse_style(style: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for part in style.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.split_once('=') {
            Some((key, value)) => {
                out.insert(key.trim().to_string(), value.trim().to_string());
            }
            None => {
                out.insert(part.to_string(), "1".to_string());
            }
        }
    }
    out
}

fn parse_f32(value: Option<&str>) -> Option<f32> {
    value.and_then(|v| v.trim().parse().ok())
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::compute_layout;
    use crate::normalize::normalize;
    use crate::plan::{RawEdge, RawNode, RawPlan};

    fn scenario_plan(mode: LayoutMode) -> (Plan, Layout) {
        let raw = RawPlan {
            nodes: vec![
                RawNode {
                    id: Some("a".to_string()),
                    name: Some("API Gateway".to_string()),
                    node_type: Some("integration".to_string()),
                    ..RawNode::default()
                },
                RawNode {
                    id: Some("b".to_string()),
                    name: Some("DB".to_string()),
                    node_type: Some("data".to_string()),
                    ..RawNode::default()
                },
            ],
            edges: vec![RawEdge {
                from: Some("a".to_string()),
                to: Some("b".to_string()),
                label: Some("SQL".to_string()),
            }],
            ..RawPlan::default()
        };
        let config = LayoutConfig::default();
        let plan = normalize(raw, "api goal", mode, &config);
        let layout = compute_layout(&plan, &config);
        (plan, layout)
    }

    fn synthesize_scenario(mode: LayoutMode) -> Document {
        let (plan, layout) = scenario_plan(mode);
        synthesize(&plan, &layout, &Palette::architect_default(), &LayoutConfig::default())
    }

    #[test]
    fn emits_nodes_edge_and_edge_label() {
        let doc = synthesize_scenario(LayoutMode::Flow);
        let node_ids: Vec<&str> = doc
            .shapes
            .iter()
            .filter(|s| s.is_node_like())
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(node_ids, vec!["n_a", "n_b"]);
        assert_eq!(doc.edges.len(), 1);
        assert_eq!(doc.edges[0].source, "n_a");
        assert_eq!(doc.edges[0].target, "n_b");
        assert!(doc.shapes.iter().any(|s| s.id == "l_a_b" && s.text == "SQL"));
    }

    #[test]
    fn data_nodes_become_cylinders() {
        let doc = synthesize_scenario(LayoutMode::Flow);
        let db = doc.shapes.iter().find(|s| s.id == "n_b").unwrap();
        assert_eq!(db.kind, ShapeKind::Cylinder);
    }

    #[test]
    fn node_font_color_follows_contrast_rule() {
        let doc = synthesize_scenario(LayoutMode::Swimlane);
        for shape in doc.shapes.iter().filter(|s| s.is_node_like()) {
            let fill = shape.fill.as_deref().unwrap();
            assert_eq!(
                shape.font_color.as_deref(),
                Some(contrast_text_color(fill)),
                "bad font color on {}",
                shape.id
            );
        }
    }

    #[test]
    fn lane_bands_classify_as_background() {
        let doc = synthesize_scenario(LayoutMode::Swimlane);
        let band = doc.shapes.iter().find(|s| s.id == "lane_0").unwrap();
        assert_eq!(band.z_layer(), ZLayer::Background);
        assert!(!band.is_node_like());
        let title = doc.shapes.iter().find(|s| s.id == "title").unwrap();
        assert_eq!(title.z_layer(), ZLayer::Label);
    }

    #[test]
    fn legend_lists_first_four_lanes() {
        let doc = synthesize_scenario(LayoutMode::Swimlane);
        let swatches: Vec<&Shape> =
            doc.shapes.iter().filter(|s| s.id.starts_with("leg_")).collect();
        assert_eq!(swatches.len(), 4);
        for swatch in swatches {
            assert!(!swatch.is_node_like());
        }
    }

    #[test]
    fn legend_never_overlaps_nodes() {
        for mode in [LayoutMode::Swimlane, LayoutMode::Flow] {
            let doc = synthesize_scenario(mode);
            let nodes: Vec<&Shape> = doc.shapes.iter().filter(|s| s.is_node_like()).collect();
            for swatch in doc.shapes.iter().filter(|s| s.id.starts_with("leg_")) {
                for node in &nodes {
                    assert!(!swatch.rect.intersects(&node.rect));
                }
            }
        }
    }

    #[test]
    fn external_nodes_get_the_gray_palette() {
        let raw = RawPlan {
            nodes: vec![RawNode {
                id: Some("crm".to_string()),
                name: Some("CRM".to_string()),
                scope: Some("external".to_string()),
                ..RawNode::default()
            }],
            ..RawPlan::default()
        };
        let config = LayoutConfig::default();
        let plan = normalize(raw, "", LayoutMode::Swimlane, &config);
        let layout = compute_layout(&plan, &config);
        let doc = synthesize(&plan, &layout, &Palette::architect_default(), &config);
        let node = doc.shapes.iter().find(|s| s.id == "n_crm").unwrap();
        assert_eq!(node.fill.as_deref(), Some("#95a5a6"));
    }

    #[test]
    fn xml_round_trip_preserves_shapes_and_edges() {
        let doc = synthesize_scenario(LayoutMode::Swimlane);
        let xml = doc.to_xml();
        assert!(xml.contains("<mxCell id=\"0\" />"));
        assert!(xml.contains("<mxCell id=\"1\" parent=\"0\" />"));

        let parsed = Document::from_xml(&xml).unwrap();
        assert_eq!(parsed.shapes.len(), doc.shapes.len());
        assert_eq!(parsed.edges.len(), doc.edges.len());
        for (a, b) in doc.shapes.iter().zip(&parsed.shapes) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.kind, b.kind, "kind drift on {}", a.id);
            assert_eq!(a.rect, b.rect);
            assert_eq!(a.fill, b.fill);
            assert_eq!(a.z_layer(), b.z_layer());
        }
        assert_eq!(parsed.edges[0].end_arrow, "blockThin");
    }

    #[test]
    fn round_trip_survives_markup_in_names() {
        let raw = RawPlan {
            nodes: vec![RawNode {
                id: Some("q".to_string()),
                name: Some("Q <fast & loose>".to_string()),
                ..RawNode::default()
            }],
            ..RawPlan::default()
        };
        let config = LayoutConfig::default();
        let plan = normalize(raw, "", LayoutMode::Flow, &config);
        let layout = compute_layout(&plan, &config);
        let doc = synthesize(&plan, &layout, &Palette::architect_default(), &config);
        let parsed = Document::from_xml(&doc.to_xml()).unwrap();
        let node = parsed.shapes.iter().find(|s| s.id == "n_q").unwrap();
        assert_eq!(node.text, "Q <fast & loose>");
    }

    #[test]
    fn style_string_round_trips_flags() {
        let style = parse_style("rounded=1;whiteSpace=wrap;html=1;dashed=1;shadow;fillColor=#fff;");
        assert_eq!(style.get("rounded").map(String::as_str), Some("1"));
        assert_eq!(style.get("shadow").map(String::as_str), Some("1"));
        assert_eq!(style.get("fillColor").map(String::as_str), Some("#fff"));
    }

    #[test]
    fn foreign_root_is_rejected() {
        let err = Document::from_xml("<svg></svg>").unwrap_err();
        assert!(matches!(err, DocumentError::UnexpectedRoot(_)));
        assert!(Document::from_xml("<<<").is_err());
    }
}
