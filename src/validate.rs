use serde::Serialize;

use crate::document::{Document, DocumentError, Shape, ShapeKind};
use crate::theme::{CONTRAST_LUMINANCE_THRESHOLD, is_dark};

const RECOGNIZED_ARROWHEADS: [&str; 4] = ["block", "classic", "open", "blockThin"];
const DARK_FONTS: [&str; 8] = [
    "#000", "#000000", "#111", "#111111", "#1a1a1a", "#222", "#333", "#333333",
];
const LIGHT_FONTS: [&str; 2] = ["#fff", "#ffffff"];

/// Goal trigger words and the substring a diagram must mention to cover them.
const GOAL_PROBES: [(&str, &str, &str); 4] = [
    ("event", "event", "Missing Events label or node"),
    ("api", "api", "Missing API label or node"),
    ("monitor", "monitor", "Missing Monitoring node or label"),
    ("security", "secur", "Missing Security boundary or label"),
];

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub issues: Vec<String>,
}

impl ValidationReport {
    fn failed(issue: String) -> Self {
        Self {
            ok: false,
            issues: vec![issue],
        }
    }
}

/// Local, syntactic validation of a diagram document against the original
/// goal text. Never fails; every problem lands in the issue list, which is
/// shaped for feeding back into an upstream repair loop.
pub fn validate(xml: &str, goal: &str) -> ValidationReport {
    let doc = match Document::from_xml(xml) {
        Ok(doc) => doc,
        Err(DocumentError::UnexpectedRoot(root)) => {
            return ValidationReport::failed(format!("Root is not mxGraphModel (found `{root}`)"));
        }
        Err(err) => return ValidationReport::failed(format!("Document parse error: {err}")),
    };

    let mut issues = Vec::new();
    let nodes: Vec<&Shape> = doc.shapes.iter().filter(|s| s.is_node_like()).collect();

    if nodes.is_empty() {
        issues.push("No nodes found".to_string());
    }
    if doc.edges.is_empty() {
        issues.push("No edges found".to_string());
    } else {
        for edge in &doc.edges {
            if !RECOGNIZED_ARROWHEADS.contains(&edge.end_arrow.as_str()) {
                issues.push(format!("Edge {} missing a recognized arrowhead", edge.id));
            }
        }
    }

    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            if nodes[i].rect.intersects(&nodes[j].rect) {
                issues.push(format!("Overlap: {} with {}", nodes[i].id, nodes[j].id));
            }
        }
    }

    for node in &nodes {
        let Some(fill) = node.fill.as_deref() else {
            issues.push(format!("Node {} missing fillColor", node.id));
            continue;
        };
        let font = node.font_color.as_deref().map(str::to_ascii_lowercase);
        let dark_fill = is_dark(fill, CONTRAST_LUMINANCE_THRESHOLD);
        if dark_fill && font.as_deref().is_some_and(|f| DARK_FONTS.contains(&f)) {
            issues.push(format!("Low contrast text on {} (dark fill + dark font)", node.id));
        }
        if !dark_fill && font.as_deref().is_some_and(|f| LIGHT_FONTS.contains(&f)) {
            issues.push(format!("Low contrast text on {} (light fill + light font)", node.id));
        }
    }

    let goal_lower = goal.to_lowercase();
    let mut labels: Vec<String> = nodes.iter().map(|n| n.text.to_lowercase()).collect();
    // The title echoes the goal text, so counting it would satisfy every
    // probe by construction.
    labels.extend(
        doc.shapes
            .iter()
            .filter(|s| s.kind == ShapeKind::Text && s.id != "title")
            .map(|s| s.text.to_lowercase()),
    );
    for (trigger, probe, message) in GOAL_PROBES {
        if goal_lower.contains(trigger) && !labels.iter().any(|label| label.contains(probe)) {
            issues.push(message.to_string());
        }
    }

    ValidationReport {
        ok: issues.is_empty(),
        issues,
    }
}
