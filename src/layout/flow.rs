use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::config::LayoutConfig;
use crate::plan::Plan;

use super::{GroupBox, Layout, Rect, member_bounds};

/// Flowchart strategy: nodes and edges form a directed graph; a node's row is
/// its BFS distance from the root set (nodes with no incoming edge, or the
/// first node when every node has one). Rows stack top to bottom and center
/// horizontally as blocks. Placement is discrete and bounded by the node
/// count; no iterative refinement, so it always terminates and never jitters.
pub(super) fn compute_flow_layout(plan: &Plan, config: &LayoutConfig) -> Layout {
    let cfg = &config.flow;

    let order: HashMap<&str, usize> = plan
        .nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id.as_str(), index))
        .collect();

    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut incoming: HashMap<&str, usize> = HashMap::new();
    for edge in &plan.edges {
        outgoing.entry(edge.from.as_str()).or_default().push(edge.to.as_str());
        *incoming.entry(edge.to.as_str()).or_default() += 1;
    }

    let mut roots: Vec<&str> = plan
        .nodes
        .iter()
        .map(|node| node.id.as_str())
        .filter(|id| incoming.get(id).copied().unwrap_or(0) == 0)
        .collect();
    if roots.is_empty()
        && let Some(first) = plan.nodes.first()
    {
        roots.push(first.id.as_str());
    }

    let mut layer_of: HashMap<&str, usize> = HashMap::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    for &root in &roots {
        layer_of.insert(root, 0);
        queue.push_back(root);
    }
    while let Some(id) = queue.pop_front() {
        let layer = layer_of[id];
        let Some(next) = outgoing.get(id) else {
            continue;
        };
        for &target in next {
            if layer_of.contains_key(target) {
                continue;
            }
            layer_of.insert(target, layer + 1);
            queue.push_back(target);
        }
    }

    // Cycle remnants and disconnected components still deserve a spot: each
    // leftover node gets its own trailing row, in plan order.
    let mut next_layer = layer_of.values().copied().max().map_or(0, |max| max + 1);
    for node in &plan.nodes {
        if !layer_of.contains_key(node.id.as_str()) {
            layer_of.insert(node.id.as_str(), next_layer);
            next_layer += 1;
        }
    }

    let row_count = layer_of.values().copied().max().map_or(0, |max| max + 1);
    let mut rows: Vec<Vec<&str>> = vec![Vec::new(); row_count];
    for (&id, &layer) in &layer_of {
        rows[layer].push(id);
    }
    for row in &mut rows {
        row.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));
    }

    let row_width = |count: usize| -> f32 {
        if count == 0 {
            0.0
        } else {
            count as f32 * cfg.node_width + (count as f32 - 1.0) * cfg.node_gap_x
        }
    };
    let content_width = rows.iter().map(|row| row_width(row.len())).fold(0.0_f32, f32::max);
    let width = (content_width + cfg.margin * 2.0).max(cfg.min_width);

    let mut nodes: BTreeMap<String, Rect> = BTreeMap::new();
    let top = cfg.margin + cfg.title_height;
    for (layer, row) in rows.iter().enumerate() {
        let y = top + layer as f32 * (cfg.node_height + cfg.row_gap);
        let mut x = (width - row_width(row.len())) / 2.0;
        for id in row {
            nodes.insert(id.to_string(), Rect::new(x, y, cfg.node_width, cfg.node_height));
            x += cfg.node_width + cfg.node_gap_x;
        }
    }

    let max_bottom = nodes.values().map(Rect::bottom).fold(0.0_f32, f32::max);
    let height = (max_bottom + cfg.margin).max(cfg.min_height);

    let mut groups = Vec::new();
    for group in &plan.groups {
        let members: Vec<Rect> = plan
            .nodes
            .iter()
            .filter(|node| node.group.as_deref() == Some(group.id.as_str()))
            .filter_map(|node| nodes.get(&node.id))
            .copied()
            .collect();
        if let Some(rect) = member_bounds(&members, cfg.group_padding) {
            groups.push(GroupBox {
                id: group.id.clone(),
                rect,
            });
        }
    }

    Layout {
        mode: plan.mode,
        lanes: Vec::new(),
        groups,
        nodes,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::plan::{LayoutMode, RawEdge, RawNode, RawPlan};

    fn node(id: &str) -> RawNode {
        RawNode {
            id: Some(id.to_string()),
            name: Some(id.to_uppercase()),
            ..RawNode::default()
        }
    }

    fn edge(from: &str, to: &str) -> RawEdge {
        RawEdge {
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            label: None,
        }
    }

    fn plan_with(nodes: Vec<RawNode>, edges: Vec<RawEdge>) -> Plan {
        let raw = RawPlan {
            nodes,
            edges,
            ..RawPlan::default()
        };
        normalize(raw, "", LayoutMode::Flow, &LayoutConfig::default())
    }

    #[test]
    fn layers_follow_bfs_depth() {
        let plan = plan_with(
            vec![node("a"), node("b"), node("c")],
            vec![edge("a", "b"), edge("b", "c")],
        );
        let layout = compute_flow_layout(&plan, &LayoutConfig::default());
        assert!(layout.nodes["a"].y < layout.nodes["b"].y);
        assert!(layout.nodes["b"].y < layout.nodes["c"].y);
    }

    #[test]
    fn siblings_share_a_row_without_overlap() {
        let plan = plan_with(
            vec![node("a"), node("b"), node("c")],
            vec![edge("a", "b"), edge("a", "c")],
        );
        let layout = compute_flow_layout(&plan, &LayoutConfig::default());
        let b = layout.nodes["b"];
        let c = layout.nodes["c"];
        assert_eq!(b.y, c.y);
        assert!(!b.intersects(&c));
    }

    #[test]
    fn cycles_still_place_every_node() {
        let plan = plan_with(
            vec![node("a"), node("b"), node("c")],
            vec![edge("a", "b"), edge("b", "a"), edge("c", "c")],
        );
        let layout = compute_flow_layout(&plan, &LayoutConfig::default());
        assert_eq!(layout.nodes.len(), 3);
        let rects: Vec<Rect> = layout.nodes.values().copied().collect();
        for i in 0..rects.len() {
            for j in (i + 1)..rects.len() {
                assert!(!rects[i].intersects(&rects[j]));
            }
        }
    }

    #[test]
    fn isolated_nodes_join_the_root_row() {
        let plan = plan_with(
            vec![node("a"), node("b"), node("island")],
            vec![edge("a", "b")],
        );
        let layout = compute_flow_layout(&plan, &LayoutConfig::default());
        assert_eq!(layout.nodes["island"].y, layout.nodes["a"].y);
        assert!(layout.nodes["b"].y > layout.nodes["a"].y);
    }

    #[test]
    fn unreachable_cycle_members_get_trailing_rows() {
        let plan = plan_with(
            vec![node("a"), node("b"), node("c"), node("d")],
            vec![edge("a", "b"), edge("c", "d"), edge("d", "c")],
        );
        let layout = compute_flow_layout(&plan, &LayoutConfig::default());
        // c and d feed each other, so neither is a root; each lands in its
        // own trailing row below the reachable graph.
        assert!(layout.nodes["c"].y > layout.nodes["b"].y);
        assert!(layout.nodes["d"].y > layout.nodes["c"].y);
    }

    #[test]
    fn empty_plan_keeps_minimum_canvas() {
        let plan = plan_with(vec![], vec![]);
        let layout = compute_flow_layout(&plan, &LayoutConfig::default());
        assert_eq!(layout.width, 400.0);
        assert_eq!(layout.height, 300.0);
    }

    #[test]
    fn rows_are_centered_blocks() {
        let plan = plan_with(
            vec![node("a"), node("b"), node("c")],
            vec![edge("a", "b"), edge("a", "c")],
        );
        let layout = compute_flow_layout(&plan, &LayoutConfig::default());
        let a = layout.nodes["a"];
        let (center, _) = a.center();
        assert!((center - layout.width / 2.0).abs() < 0.5);
    }

    #[test]
    fn group_wraps_members_in_flow_mode() {
        let config = LayoutConfig::default();
        let raw = RawPlan {
            groups: vec![crate::plan::RawGroup {
                id: Some("pair".to_string()),
                ..crate::plan::RawGroup::default()
            }],
            nodes: vec![
                RawNode {
                    group: Some("pair".to_string()),
                    ..node("a")
                },
                RawNode {
                    group: Some("pair".to_string()),
                    ..node("b")
                },
            ],
            edges: vec![edge("a", "b")],
            ..RawPlan::default()
        };
        let plan = normalize(raw, "", LayoutMode::Flow, &config);
        let layout = compute_flow_layout(&plan, &config);
        let group = &layout.groups[0];
        for id in ["a", "b"] {
            assert!(group.rect.contains(&layout.nodes[id].expand(config.flow.group_padding)));
        }
    }
}
