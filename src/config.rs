use crate::theme::{LaneColors, Palette};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Swimlane-mode geometry. Lanes stack top to bottom in fixed-height bands;
/// nodes pack left to right after a reserved label column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwimlaneConfig {
    pub lane_height: f32,
    pub lane_gap: f32,
    pub lane_label_width: f32,
    pub node_width: f32,
    pub node_height: f32,
    pub node_spacing_x: f32,
    pub node_y_inset: f32,
    pub group_padding: f32,
    pub group_fallback_width: f32,
    pub margin: f32,
    pub title_height: f32,
    pub min_width: f32,
    pub legend_width: f32,
    pub legend_lane_count: usize,
    pub name_limit: usize,
    pub label_limit: usize,
}

impl Default for SwimlaneConfig {
    fn default() -> Self {
        Self {
            lane_height: 130.0,
            lane_gap: 20.0,
            lane_label_width: 180.0,
            node_width: 160.0,
            node_height: 60.0,
            node_spacing_x: 200.0,
            node_y_inset: 35.0,
            group_padding: 30.0,
            group_fallback_width: 400.0,
            margin: 40.0,
            title_height: 40.0,
            min_width: 1200.0,
            legend_width: 200.0,
            legend_lane_count: 4,
            name_limit: 20,
            label_limit: 15,
        }
    }
}

/// Flow-mode geometry. Rows are BFS layers, centered as horizontal blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    pub node_width: f32,
    pub node_height: f32,
    pub node_gap_x: f32,
    pub row_gap: f32,
    pub group_padding: f32,
    pub margin: f32,
    pub title_height: f32,
    pub min_width: f32,
    pub min_height: f32,
    pub max_nodes: usize,
    pub name_limit: usize,
    pub label_limit: usize,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            node_width: 160.0,
            node_height: 60.0,
            node_gap_x: 40.0,
            row_gap: 90.0,
            group_padding: 30.0,
            margin: 40.0,
            title_height: 60.0,
            min_width: 400.0,
            min_height: 300.0,
            max_nodes: 8,
            name_limit: 18,
            label_limit: 15,
        }
    }
}

/// A goal-keyword rule that inserts a well-known auxiliary group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalGroupRule {
    pub keywords: Vec<String>,
    pub id: String,
    pub name: String,
    pub lane: String,
    pub solid: bool,
}

/// A goal-keyword rule that inserts a well-known auxiliary node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalNodeRule {
    pub keywords: Vec<String>,
    pub id: String,
    pub name: String,
    pub lane: String,
    pub node_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    /// Infrastructure-container vocabulary; a node whose id or name contains
    /// one of these words is demoted to a group.
    pub container_keywords: Vec<String>,
    pub group_rules: Vec<GoalGroupRule>,
    pub node_rules: Vec<GoalNodeRule>,
}

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            container_keywords: words(&[
                "vpc",
                "subnet",
                "cluster",
                "network",
                "region",
                "zone",
                "namespace",
                "environment",
                "boundary",
                "perimeter",
            ]),
            group_rules: vec![
                GoalGroupRule {
                    keywords: words(&["security", "secure", "zero trust"]),
                    id: "security_zone".to_string(),
                    name: "Security Boundary".to_string(),
                    lane: "Platform & Security".to_string(),
                    solid: false,
                },
                GoalGroupRule {
                    keywords: words(&["hybrid", "on-prem", "on premise"]),
                    id: "on_prem".to_string(),
                    name: "On-Premise".to_string(),
                    lane: "Application".to_string(),
                    solid: true,
                },
                GoalGroupRule {
                    keywords: words(&["partner", "third party", "external"]),
                    id: "partner_zone".to_string(),
                    name: "Partner Zone".to_string(),
                    lane: "Integration".to_string(),
                    solid: false,
                },
            ],
            node_rules: vec![
                GoalNodeRule {
                    keywords: words(&["event", "async", "message"]),
                    id: "event_bus".to_string(),
                    name: "Event Bus".to_string(),
                    lane: "Integration".to_string(),
                    node_type: "integration".to_string(),
                },
                GoalNodeRule {
                    keywords: words(&["api", "rest", "gateway"]),
                    id: "api_gateway".to_string(),
                    name: "API Gateway".to_string(),
                    lane: "Integration".to_string(),
                    node_type: "integration".to_string(),
                },
                GoalNodeRule {
                    keywords: words(&["monitor"]),
                    id: "monitoring".to_string(),
                    name: "Monitoring".to_string(),
                    lane: "Platform & Security".to_string(),
                    node_type: "service".to_string(),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub swimlane: SwimlaneConfig,
    pub flow: FlowConfig,
    pub keywords: KeywordConfig,
    /// Substituted when a plan arrives with no lanes at all.
    pub default_lanes: Vec<String>,
    /// Lane nodes fall back to when theirs cannot be resolved.
    pub fallback_lane: String,
    pub title_limit: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            swimlane: SwimlaneConfig::default(),
            flow: FlowConfig::default(),
            keywords: KeywordConfig::default(),
            default_lanes: words(&[
                "Experience",
                "Application",
                "Integration",
                "Data",
                "Platform & Security",
            ]),
            fallback_lane: "Application".to_string(),
            title_limit: 48,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub margin: f32,
    pub min_width: f32,
    pub min_height: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            margin: 30.0,
            min_width: 400.0,
            min_height: 300.0,
            background: "#ffffff".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub palette: Palette,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    lane_colors: Option<Vec<LaneColors>>,
    #[serde(default)]
    container_keywords: Option<Vec<String>>,
    #[serde(default)]
    default_lanes: Option<Vec<String>>,
    #[serde(default)]
    max_nodes: Option<usize>,
    #[serde(default)]
    background: Option<String>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;

    if let Some(lanes) = parsed.lane_colors {
        config.palette.lane_colors = lanes;
    }
    if let Some(keywords) = parsed.container_keywords {
        config.layout.keywords.container_keywords = keywords;
    }
    if let Some(lanes) = parsed.default_lanes {
        config.layout.default_lanes = lanes;
    }
    if let Some(max_nodes) = parsed.max_nodes {
        config.layout.flow.max_nodes = max_nodes.max(1);
    }
    if let Some(background) = parsed.background {
        config.render.background = background.clone();
        config.palette.background = background;
    }

    Ok(config)
}
