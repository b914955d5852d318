use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LayoutMode {
    Swimlane,
    Flow,
}

impl LayoutMode {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "swimlane" | "lanes" => Some(Self::Swimlane),
            "flow" | "flowchart" => Some(Self::Flow),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    App,
    Service,
    Integration,
    Data,
    Security,
    External,
    Process,
    Network,
    Input,
    Output,
    Storage,
    Model,
    Default,
}

impl NodeType {
    /// Unknown type tokens fall back to the default style rather than erroring;
    /// plans come from a generator that invents types freely.
    pub fn from_token(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "app" => Self::App,
            "service" => Self::Service,
            "integration" => Self::Integration,
            "data" | "database" | "db" => Self::Data,
            "security" => Self::Security,
            "external" => Self::External,
            "process" => Self::Process,
            "network" => Self::Network,
            "input" => Self::Input,
            "output" => Self::Output,
            "storage" => Self::Storage,
            "model" => Self::Model,
            _ => Self::Default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupStyle {
    Dashed,
    Solid,
}

impl GroupStyle {
    pub fn from_token(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "solid" => Self::Solid,
            _ => Self::Dashed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub lane: Option<String>,
    pub node_type: NodeType,
    pub group: Option<String>,
    pub external: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub lane: Option<String>,
    pub style: GroupStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
}

/// Canonical, invariant-satisfying plan. Only the normalizer constructs
/// these; everything downstream (layout, synthesis) can rely on unique ids,
/// resolved edge endpoints, and bounded string lengths.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub title: String,
    pub mode: LayoutMode,
    pub lanes: Vec<String>,
    pub groups: Vec<Group>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub legend: bool,
}

/// Untrusted plan as recovered from model output. Every field is optional
/// and list fields degrade leniently: a wrong-typed value becomes an empty
/// list, a malformed element is skipped. The only hard failure lives one
/// level up, when the top-level value is not an object at all.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPlan {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub lanes: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub groups: Vec<RawGroup>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub nodes: Vec<RawNode>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub edges: Vec<RawEdge>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub legend: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawNode {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub lane: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub node_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub group: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawGroup {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub lane: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub style: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawEdge {
    #[serde(default, deserialize_with = "lenient_string")]
    pub from: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub to: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub label: Option<String>,
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer).unwrap_or(Value::Null);
    Ok(scalar_to_string(&value).filter(|s| !s.trim().is_empty()))
}

fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer).unwrap_or(Value::Null);
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .iter()
        .filter_map(scalar_to_string)
        .filter(|s| !s.trim().is_empty())
        .collect())
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer).unwrap_or(Value::Null);
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer).unwrap_or(Value::Null);
    Ok(match value {
        Value::Bool(b) => Some(b),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}
