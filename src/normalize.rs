use crate::config::LayoutConfig;
use crate::plan::{Edge, Group, GroupStyle, LayoutMode, Node, NodeType, Plan, RawPlan};
use std::collections::HashSet;

pub const ELLIPSIS: char = '…';

/// Repair an untrusted plan into the canonical, renderable form.
///
/// Never fails: missing or wrong-typed fields were already defaulted during
/// deserialization, and everything else (duplicate ids, dangling edges,
/// container nodes, oversize strings, oversize node sets) is silently
/// repaired here. Plans come from a non-deterministic generator; aborting on
/// partial malformation would abort the whole generation loop.
pub fn normalize(raw: RawPlan, goal: &str, mode: LayoutMode, config: &LayoutConfig) -> Plan {
    let title = raw
        .title
        .clone()
        .unwrap_or_else(|| derive_title(goal, config.title_limit));

    let mut groups = collect_groups(&raw);
    let mut nodes = collect_nodes(&raw);
    demote_container_nodes(&mut nodes, &mut groups, &config.keywords.container_keywords);

    let mut edges = prune_edges(&raw, &nodes, mode);

    if mode == LayoutMode::Flow && nodes.len() > config.flow.max_nodes {
        cap_nodes(&mut nodes, &edges, config.flow.max_nodes);
        let survivors: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        edges.retain(|e| survivors.contains(e.from.as_str()) && survivors.contains(e.to.as_str()));
    }

    let (name_limit, label_limit) = match mode {
        LayoutMode::Swimlane => (config.swimlane.name_limit, config.swimlane.label_limit),
        LayoutMode::Flow => (config.flow.name_limit, config.flow.label_limit),
    };
    for node in &mut nodes {
        node.name = truncate(&node.name, name_limit);
    }
    for group in &mut groups {
        group.name = truncate(&group.name, name_limit);
    }
    for edge in &mut edges {
        edge.label = edge.label.as_deref().map(|label| truncate(label, label_limit));
    }

    if mode == LayoutMode::Swimlane {
        enrich_from_goal(goal, &mut nodes, &mut groups, config);
    }

    let mut lanes: Vec<String> = Vec::new();
    for lane in &raw.lanes {
        if !lanes.iter().any(|existing| existing == lane) {
            lanes.push(lane.clone());
        }
    }
    if lanes.is_empty() {
        lanes = config.default_lanes.clone();
    }

    Plan {
        title,
        mode,
        lanes,
        groups,
        nodes,
        edges,
        legend: raw.legend.unwrap_or(true),
    }
}

fn derive_title(goal: &str, limit: usize) -> String {
    let trimmed = goal.trim();
    if trimmed.is_empty() {
        return "Architecture Diagram".to_string();
    }
    truncate(trimmed, limit)
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit).collect();
    cut.push(ELLIPSIS);
    cut
}

fn collect_groups(raw: &RawPlan) -> Vec<Group> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut groups = Vec::new();
    for group in &raw.groups {
        let Some(id) = group.id.clone() else {
            continue;
        };
        if !seen.insert(id.clone()) {
            continue;
        }
        groups.push(Group {
            name: group.name.clone().unwrap_or_else(|| id.clone()),
            id,
            lane: group.lane.clone(),
            style: group
                .style
                .as_deref()
                .map(GroupStyle::from_token)
                .unwrap_or(GroupStyle::Dashed),
        });
    }
    groups
}

fn collect_nodes(raw: &RawPlan) -> Vec<Node> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut nodes = Vec::new();
    for node in &raw.nodes {
        let Some(id) = node.id.clone() else {
            continue;
        };
        if !seen.insert(id.clone()) {
            continue;
        }
        let node_type = node
            .node_type
            .as_deref()
            .map(NodeType::from_token)
            .unwrap_or(NodeType::App);
        let external = node_type == NodeType::External
            || node
                .scope
                .as_deref()
                .is_some_and(|scope| scope.eq_ignore_ascii_case("external"));
        nodes.push(Node {
            name: node.name.clone().unwrap_or_else(|| id.clone()),
            id,
            lane: node.lane.clone(),
            node_type,
            group: node.group.clone(),
            external,
        });
    }
    nodes
}

/// Nodes named after infrastructure containers (VPCs, clusters, zones) were
/// meant to be drawn around other nodes, not as boxes of their own. Convert
/// them to groups, keeping the first definition when the id is already taken.
fn demote_container_nodes(nodes: &mut Vec<Node>, groups: &mut Vec<Group>, keywords: &[String]) {
    let mut kept = Vec::with_capacity(nodes.len());
    for node in nodes.drain(..) {
        if !matches_container_keyword(&node, keywords) {
            kept.push(node);
            continue;
        }
        if !groups.iter().any(|group| group.id == node.id) {
            groups.push(Group {
                id: node.id.clone(),
                name: node.name.clone(),
                lane: node.lane.clone(),
                style: GroupStyle::Dashed,
            });
        }
    }
    *nodes = kept;
}

fn matches_container_keyword(node: &Node, keywords: &[String]) -> bool {
    let haystack = format!("{} {}", node.id, node.name).to_lowercase();
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .any(|token| keywords.iter().any(|keyword| keyword == token))
}

/// Drop edges with a missing endpoint and deduplicate. Swimlane mode keys on
/// (from, to, label) so differently-labelled parallel edges survive; flow
/// mode keys on (from, to) alone.
fn prune_edges(raw: &RawPlan, nodes: &[Node], mode: LayoutMode) -> Vec<Edge> {
    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let mut seen: HashSet<(String, String, Option<String>)> = HashSet::new();
    let mut edges = Vec::new();
    for edge in &raw.edges {
        let (Some(from), Some(to)) = (edge.from.clone(), edge.to.clone()) else {
            continue;
        };
        if !ids.contains(from.as_str()) || !ids.contains(to.as_str()) {
            continue;
        }
        let label = edge
            .label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string);
        let key = match mode {
            LayoutMode::Swimlane => (from.clone(), to.clone(), label.clone()),
            LayoutMode::Flow => (from.clone(), to.clone(), None),
        };
        if !seen.insert(key) {
            continue;
        }
        edges.push(Edge { from, to, label });
    }
    edges
}

/// Keep the `max` highest-connectivity nodes; ties resolve to whichever came
/// first in the plan, and the survivors keep their original relative order.
fn cap_nodes(nodes: &mut Vec<Node>, edges: &[Edge], max: usize) {
    let mut ranked: Vec<(usize, usize)> = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let degree = edges
                .iter()
                .filter(|e| e.from == node.id || e.to == node.id)
                .count();
            (index, degree)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let keep: HashSet<usize> = ranked.iter().take(max).map(|(index, _)| *index).collect();

    let mut index = 0;
    nodes.retain(|_| {
        let kept = keep.contains(&index);
        index += 1;
        kept
    });
}

/// Best-effort augmentation from the goal text. Each rule inserts a
/// well-known auxiliary group or node, skipped whenever the id is already
/// taken so uniqueness invariants hold and re-normalization is a no-op.
fn enrich_from_goal(goal: &str, nodes: &mut Vec<Node>, groups: &mut Vec<Group>, config: &LayoutConfig) {
    let goal_lower = goal.to_lowercase();

    for rule in &config.keywords.group_rules {
        if !rule.keywords.iter().any(|kw| goal_lower.contains(kw.as_str())) {
            continue;
        }
        if groups.iter().any(|group| group.id == rule.id) {
            continue;
        }
        groups.push(Group {
            id: rule.id.clone(),
            name: rule.name.clone(),
            lane: Some(rule.lane.clone()),
            style: if rule.solid { GroupStyle::Solid } else { GroupStyle::Dashed },
        });
    }

    for rule in &config.keywords.node_rules {
        if !rule.keywords.iter().any(|kw| goal_lower.contains(kw.as_str())) {
            continue;
        }
        if nodes.iter().any(|node| node.id == rule.id) {
            continue;
        }
        nodes.push(Node {
            id: rule.id.clone(),
            name: rule.name.clone(),
            lane: Some(rule.lane.clone()),
            node_type: NodeType::from_token(&rule.node_type),
            group: None,
            external: false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{RawEdge, RawNode};

    fn raw_node(id: &str, name: &str) -> RawNode {
        RawNode {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            ..RawNode::default()
        }
    }

    fn raw_edge(from: &str, to: &str, label: Option<&str>) -> RawEdge {
        RawEdge {
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            label: label.map(str::to_string),
        }
    }

    fn config() -> LayoutConfig {
        LayoutConfig::default()
    }

    /// Round-trip a canonical plan back through the raw shape so idempotence
    /// can be checked against the same entry point callers use.
    fn to_raw(plan: &Plan) -> RawPlan {
        RawPlan {
            title: Some(plan.title.clone()),
            lanes: plan.lanes.clone(),
            groups: plan
                .groups
                .iter()
                .map(|g| crate::plan::RawGroup {
                    id: Some(g.id.clone()),
                    name: Some(g.name.clone()),
                    lane: g.lane.clone(),
                    style: Some(match g.style {
                        GroupStyle::Dashed => "dashed".to_string(),
                        GroupStyle::Solid => "solid".to_string(),
                    }),
                })
                .collect(),
            nodes: plan
                .nodes
                .iter()
                .map(|n| RawNode {
                    id: Some(n.id.clone()),
                    name: Some(n.name.clone()),
                    lane: n.lane.clone(),
                    node_type: Some(format!("{:?}", n.node_type).to_lowercase()),
                    group: n.group.clone(),
                    scope: n.external.then(|| "external".to_string()),
                })
                .collect(),
            edges: plan
                .edges
                .iter()
                .map(|e| raw_edge(&e.from, &e.to, e.label.as_deref()))
                .collect(),
            legend: Some(plan.legend),
        }
    }

    #[test]
    fn container_nodes_demote_to_groups() {
        let raw = RawPlan {
            nodes: vec![raw_node("x", "VPC Cluster")],
            ..RawPlan::default()
        };
        let plan = normalize(raw, "goal", LayoutMode::Swimlane, &config());
        assert!(plan.nodes.is_empty());
        assert_eq!(plan.groups.len(), 1);
        assert_eq!(plan.groups[0].id, "x");
        assert_eq!(plan.groups[0].name, "VPC Cluster");
    }

    #[test]
    fn demotion_does_not_clobber_existing_group() {
        let raw = RawPlan {
            groups: vec![crate::plan::RawGroup {
                id: Some("net".to_string()),
                name: Some("Original".to_string()),
                ..crate::plan::RawGroup::default()
            }],
            nodes: vec![raw_node("net", "Network Edge")],
            ..RawPlan::default()
        };
        let plan = normalize(raw, "", LayoutMode::Flow, &config());
        assert_eq!(plan.groups.len(), 1);
        assert_eq!(plan.groups[0].name, "Original");
        assert!(plan.nodes.is_empty());
    }

    #[test]
    fn dangling_edges_are_dropped() {
        let raw = RawPlan {
            nodes: vec![raw_node("a", "A")],
            edges: vec![raw_edge("a", "ghost", None), raw_edge("ghost", "a", None)],
            ..RawPlan::default()
        };
        let plan = normalize(raw, "", LayoutMode::Swimlane, &config());
        assert!(plan.edges.is_empty());
    }

    #[test]
    fn edge_dedup_is_label_sensitive_only_in_swimlane_mode() {
        let raw = RawPlan {
            nodes: vec![raw_node("a", "A"), raw_node("b", "B")],
            edges: vec![
                raw_edge("a", "b", Some("REST")),
                raw_edge("a", "b", Some("Events")),
                raw_edge("a", "b", Some("REST")),
            ],
            ..RawPlan::default()
        };
        let swim = normalize(raw.clone(), "", LayoutMode::Swimlane, &config());
        assert_eq!(swim.edges.len(), 2);
        let flow = normalize(raw, "", LayoutMode::Flow, &config());
        assert_eq!(flow.edges.len(), 1);
    }

    #[test]
    fn flow_mode_caps_nodes_by_connectivity() {
        let mut raw = RawPlan::default();
        for i in 0..50 {
            raw.nodes.push(raw_node(&format!("n{i}"), &format!("Node {i}")));
        }
        // n40..n47 each carry an edge; everything else is isolated.
        for i in 40..48 {
            raw.edges.push(raw_edge(&format!("n{i}"), &format!("n{}", (i + 1) % 48), None));
        }
        let plan = normalize(raw, "", LayoutMode::Flow, &config());
        assert_eq!(plan.nodes.len(), 8);
        for node in &plan.nodes {
            let index: usize = node.id[1..].parse().unwrap();
            assert!(
                (40..48).contains(&index) || index == 0,
                "unexpected survivor {}",
                node.id
            );
        }
    }

    #[test]
    fn cap_ties_break_by_original_order() {
        let mut raw = RawPlan::default();
        for i in 0..12 {
            raw.nodes.push(raw_node(&format!("n{i}"), "N"));
        }
        let plan = normalize(raw, "", LayoutMode::Flow, &config());
        let ids: Vec<_> = plan.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n0", "n1", "n2", "n3", "n4", "n5", "n6", "n7"]);
    }

    #[test]
    fn long_names_truncate_with_ellipsis() {
        let raw = RawPlan {
            nodes: vec![raw_node("a", "An Extremely Verbose Component Name")],
            ..RawPlan::default()
        };
        let plan = normalize(raw, "", LayoutMode::Flow, &config());
        assert_eq!(plan.nodes[0].name.chars().count(), 19);
        assert!(plan.nodes[0].name.ends_with(ELLIPSIS));
    }

    #[test]
    fn goal_enrichment_inserts_security_group_once() {
        let raw = RawPlan {
            nodes: vec![raw_node("a", "A")],
            ..RawPlan::default()
        };
        let plan = normalize(raw, "a secure event-driven api", LayoutMode::Swimlane, &config());
        assert!(plan.groups.iter().any(|g| g.id == "security_zone"));
        assert!(plan.nodes.iter().any(|n| n.id == "event_bus"));
        assert!(plan.nodes.iter().any(|n| n.id == "api_gateway"));

        let again = normalize(
            to_raw(&plan),
            "a secure event-driven api",
            LayoutMode::Swimlane,
            &config(),
        );
        assert_eq!(again.groups.len(), plan.groups.len());
        assert_eq!(again.nodes.len(), plan.nodes.len());
    }

    #[test]
    fn flow_mode_skips_goal_enrichment() {
        let raw = RawPlan {
            nodes: vec![raw_node("a", "A")],
            ..RawPlan::default()
        };
        let plan = normalize(raw, "a secure api", LayoutMode::Flow, &config());
        assert_eq!(plan.nodes.len(), 1);
        assert!(plan.groups.is_empty());
    }

    #[test]
    fn title_defaults_from_goal() {
        let plan = normalize(RawPlan::default(), "Order processing", LayoutMode::Swimlane, &config());
        assert_eq!(plan.title, "Order processing");

        let long_goal = "g".repeat(80);
        let plan = normalize(RawPlan::default(), &long_goal, LayoutMode::Swimlane, &config());
        assert_eq!(plan.title.chars().count(), 49);
        assert!(plan.title.ends_with(ELLIPSIS));
    }

    #[test]
    fn lanes_default_when_missing() {
        let plan = normalize(RawPlan::default(), "", LayoutMode::Swimlane, &config());
        assert_eq!(plan.lanes.len(), 5);
        assert!(plan.legend);
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw = RawPlan {
            title: Some("Shop".to_string()),
            nodes: vec![
                raw_node("gw", "A Very Long API Gateway Name Indeed"),
                raw_node("db", "DB"),
                raw_node("vpc1", "Main VPC"),
            ],
            edges: vec![
                raw_edge("gw", "db", Some("SQL over a long protocol label")),
                raw_edge("gw", "db", Some("SQL over a long protocol label")),
            ],
            ..RawPlan::default()
        };
        let once = normalize(raw, "secure shop", LayoutMode::Swimlane, &config());
        let twice = normalize(to_raw(&once), "secure shop", LayoutMode::Swimlane, &config());
        assert_eq!(once, twice);
    }
}
