use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

use crate::config::RenderConfig;
use crate::document::{Document, Shape, ShapeKind, escape_xml};
use crate::theme::{contrast_text_color, normalize_color};

/// Render a serialized diagram document to a standalone SVG.
///
/// Never fails: a document that does not parse yields a minimal valid SVG
/// carrying the error message, so a broken render cannot abort a generation
/// loop. Geometry is re-derived from the shapes alone; the document's stored
/// canvas size is never trusted.
pub fn render_svg(xml: &str, config: &RenderConfig) -> String {
    match Document::from_xml(xml) {
        Ok(doc) => render_document(&doc, config),
        Err(err) => error_svg(&err.to_string()),
    }
}

pub fn render_document(doc: &Document, config: &RenderConfig) -> String {
    if doc.shapes.is_empty() {
        return "<svg xmlns='http://www.w3.org/2000/svg' width='400' height='200'><text x='20' y='100' fill='#666'>No diagram elements</text></svg>".to_string();
    }

    let min_x = doc.shapes.iter().map(|s| s.rect.x).fold(f32::MAX, f32::min);
    let min_y = doc.shapes.iter().map(|s| s.rect.y).fold(f32::MAX, f32::min);
    let max_x = doc.shapes.iter().map(|s| s.rect.right()).fold(f32::MIN, f32::max);
    let max_y = doc.shapes.iter().map(|s| s.rect.bottom()).fold(f32::MIN, f32::max);

    let margin = config.margin;
    let width = (max_x - min_x + margin * 2.0).max(config.min_width);
    let height = (max_y - min_y + margin * 2.0).max(config.min_height);

    let tx = |x: f32| x - min_x + margin;
    let ty = |y: f32| y - min_y + margin;

    let mut svg = String::new();
    let _ = write!(
        svg,
        "<svg xmlns='http://www.w3.org/2000/svg' width='{width:.0}' height='{height:.0}' viewBox='0 0 {width:.0} {height:.0}'>\n"
    );
    svg.push_str("  <defs>\n");
    svg.push_str("    <style>\n");
    svg.push_str("      .node-text { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; font-weight: 600; }\n");
    svg.push_str("      .lane-text { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; }\n");
    svg.push_str("    </style>\n");
    svg.push_str("    <marker id=\"arrow\" markerWidth=\"12\" markerHeight=\"8\" refX=\"10\" refY=\"4\" orient=\"auto\" markerUnits=\"strokeWidth\">\n");
    svg.push_str("      <path d=\"M0,0 L12,4 L0,8 L3,4 Z\" fill=\"#333\" />\n");
    svg.push_str("    </marker>\n");
    svg.push_str("    <filter id=\"shadow\" x=\"-20%\" y=\"-20%\" width=\"140%\" height=\"140%\">\n");
    svg.push_str("      <feDropShadow dx=\"2\" dy=\"2\" stdDeviation=\"2\" flood-opacity=\"0.15\"/>\n");
    svg.push_str("    </filter>\n");
    svg.push_str("  </defs>\n");
    let _ = write!(
        svg,
        "  <rect width='{width:.0}' height='{height:.0}' fill='{}'/>\n",
        config.background
    );

    // Edges go down first so translucent backgrounds never hide an arrowhead
    // while nodes still paint on top of the connector lines.
    let by_id: HashMap<&str, &Shape> = doc.shapes.iter().map(|s| (s.id.as_str(), s)).collect();
    for edge in &doc.edges {
        let (Some(source), Some(target)) =
            (by_id.get(edge.source.as_str()), by_id.get(edge.target.as_str()))
        else {
            continue;
        };
        let ((x1, y1), (x2, y2)) = anchor_points(source, target);
        let stroke = normalize_color(&edge.stroke, "#333333");
        let _ = write!(
            svg,
            "  <line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}' stroke='{}' stroke-width='{}' marker-end='url(#arrow)'/>\n",
            tx(x1),
            ty(y1),
            tx(x2),
            ty(y2),
            stroke,
            edge.stroke_width
        );
    }

    // Stable z-sort re-derived from style attributes alone, independent of
    // the order the synthesizer happened to emit.
    let mut ordered: Vec<&Shape> = doc.shapes.iter().collect();
    ordered.sort_by_key(|shape| shape.z_layer());

    for shape in ordered {
        draw_shape(&mut svg, shape, &tx, &ty);
    }

    svg.push_str("</svg>\n");
    svg
}

/// Pick side anchors from the dominant axis of displacement between the two
/// centers: mostly-horizontal edges leave/enter through left/right mid-sides,
/// mostly-vertical ones through top/bottom.
fn anchor_points(source: &Shape, target: &Shape) -> ((f32, f32), (f32, f32)) {
    let (scx, scy) = source.rect.center();
    let (tcx, tcy) = target.rect.center();
    let dx = tcx - scx;
    let dy = tcy - scy;
    if dx.abs() >= dy.abs() {
        if dx >= 0.0 {
            ((source.rect.right(), scy), (target.rect.x, tcy))
        } else {
            ((source.rect.x, scy), (target.rect.right(), tcy))
        }
    } else if dy >= 0.0 {
        ((scx, source.rect.bottom()), (tcx, target.rect.y))
    } else {
        ((scx, source.rect.y), (tcx, target.rect.bottom()))
    }
}

fn draw_shape(svg: &mut String, shape: &Shape, tx: &dyn Fn(f32) -> f32, ty: &dyn Fn(f32) -> f32) {
    let x = tx(shape.rect.x);
    let y = ty(shape.rect.y);
    let w = shape.rect.width;
    let h = shape.rect.height;

    if shape.kind == ShapeKind::Text {
        if shape.text.is_empty() {
            return;
        }
        let font_color = shape
            .font_color
            .as_deref()
            .map(|c| normalize_color(c, "#333333"))
            .unwrap_or_else(|| "#333333".to_string());
        let weight = if shape.bold { 700 } else { 400 };
        let _ = write!(
            svg,
            "  <text x='{:.1}' y='{:.1}' fill='{}' font-size='{}' font-weight='{}' class='lane-text'>{}</text>\n",
            x + 4.0,
            y + shape.font_size as f32 + 4.0,
            font_color,
            shape.font_size,
            weight,
            escape_xml(&shape.text)
        );
        return;
    }

    let fill = normalize_color(shape.fill.as_deref().unwrap_or("#f5f5f5"), "#f5f5f5");
    let stroke = normalize_color(shape.stroke.as_deref().unwrap_or("#333333"), "#333333");
    let opacity = shape.opacity.unwrap_or(100) as f32 / 100.0;
    let fill_opacity = shape.fill_opacity.unwrap_or(100) as f32 / 100.0;

    match shape.kind {
        ShapeKind::Cylinder => {
            let _ = write!(
                svg,
                "  <rect x='{x:.1}' y='{:.1}' width='{w:.1}' height='{:.1}' fill='{fill}' stroke='{stroke}' stroke-width='2' rx='3' opacity='{opacity}' fill-opacity='{fill_opacity}'/>\n",
                y + 10.0,
                h - 10.0
            );
            let _ = write!(
                svg,
                "  <ellipse cx='{:.1}' cy='{:.1}' rx='{:.1}' ry='10' fill='{fill}' stroke='{stroke}' stroke-width='2' opacity='{opacity}' fill-opacity='{fill_opacity}'/>\n",
                x + w / 2.0,
                y + 12.0,
                w / 2.0
            );
        }
        ShapeKind::Hexagon => {
            let points = [
                (x + w * 0.25, y),
                (x + w * 0.75, y),
                (x + w, y + h / 2.0),
                (x + w * 0.75, y + h),
                (x + w * 0.25, y + h),
                (x, y + h / 2.0),
            ];
            let list = points
                .iter()
                .map(|(px, py)| format!("{px:.1},{py:.1}"))
                .collect::<Vec<_>>()
                .join(" ");
            let _ = write!(
                svg,
                "  <polygon points='{list}' fill='{fill}' stroke='{stroke}' stroke-width='2' opacity='{opacity}' fill-opacity='{fill_opacity}'/>\n"
            );
        }
        _ => {
            let rx = if shape.rounded { 8 } else { 3 };
            let dash = if shape.dashed { " stroke-dasharray='8 4'" } else { "" };
            let filter = if opacity < 0.8 { "" } else { " filter='url(#shadow)'" };
            let _ = write!(
                svg,
                "  <rect x='{x:.1}' y='{y:.1}' width='{w:.1}' height='{h:.1}' rx='{rx}' ry='{rx}' fill='{fill}' stroke='{stroke}' stroke-width='2' opacity='{opacity}' fill-opacity='{fill_opacity}'{dash}{filter}/>\n"
            );
        }
    }

    // Labels on heavily translucent shapes read as smudges; skip them.
    if shape.text.is_empty() || fill_opacity <= 0.3 {
        return;
    }
    let font_color = shape
        .font_color
        .as_deref()
        .map(|c| normalize_color(c, "#333333"))
        .unwrap_or_else(|| contrast_text_color(&fill).to_string());
    let display = if shape.text.chars().count() <= 25 {
        shape.text.clone()
    } else {
        let cut: String = shape.text.chars().take(22).collect();
        format!("{cut}...")
    };
    let _ = write!(
        svg,
        "  <text x='{:.1}' y='{:.1}' fill='{}' font-size='{}' text-anchor='middle' class='node-text'>{}</text>\n",
        x + w / 2.0,
        y + h / 2.0 + shape.font_size as f32 / 3.0,
        font_color,
        shape.font_size,
        escape_xml(&display)
    );
}

fn error_svg(message: &str) -> String {
    format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='400' height='100'><text x='20' y='50' fill='red'>{}</text></svg>",
        escape_xml(message)
    )
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path) -> Result<()> {
    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}
