use std::collections::BTreeMap;

use crate::config::LayoutConfig;
use crate::plan::Plan;

use super::{GroupBox, LaneBand, Layout, Rect, member_bounds, resolve_lane_index};

/// Swimlane strategy: lanes stack top to bottom in list order as fixed-height
/// bands spanning the full width. Within a lane, nodes cluster by group
/// (ungrouped nodes last) and pack left to right after the reserved lane
/// label column. Group boxes wrap their members, clamped to the lane bands
/// the members actually sit in.
pub(super) fn compute_swimlane_layout(plan: &Plan, config: &LayoutConfig) -> Layout {
    let cfg = &config.swimlane;
    let top = cfg.margin + cfg.title_height;

    let mut bands: Vec<Rect> = Vec::with_capacity(plan.lanes.len());
    for index in 0..plan.lanes.len() {
        let y = top + index as f32 * (cfg.lane_height + cfg.lane_gap);
        bands.push(Rect::new(cfg.margin, y, 0.0, cfg.lane_height));
    }

    // Bucket nodes into resolved lanes, clustering by group within each lane.
    let mut by_lane: Vec<Vec<usize>> = vec![Vec::new(); plan.lanes.len().max(1)];
    for (index, node) in plan.nodes.iter().enumerate() {
        let lane = resolve_lane_index(node.lane.as_deref(), &plan.lanes, &config.fallback_lane);
        let bucket_idx = lane.min(by_lane.len() - 1);
        by_lane[bucket_idx].push(index);
    }
    for bucket in &mut by_lane {
        bucket.sort_by(|&a, &b| {
            let na = &plan.nodes[a];
            let nb = &plan.nodes[b];
            (na.group.is_none(), na.group.as_deref(), &na.id)
                .cmp(&(nb.group.is_none(), nb.group.as_deref(), &nb.id))
        });
    }

    let mut nodes: BTreeMap<String, Rect> = BTreeMap::new();
    let mut node_band: BTreeMap<String, usize> = BTreeMap::new();
    for (lane_index, bucket) in by_lane.iter().enumerate() {
        let Some(band) = bands.get(lane_index).copied() else {
            continue;
        };
        let mut x = cfg.margin + cfg.lane_label_width;
        for &node_index in bucket {
            let node = &plan.nodes[node_index];
            let rect = Rect::new(x, band.y + cfg.node_y_inset, cfg.node_width, cfg.node_height);
            nodes.insert(node.id.clone(), rect);
            node_band.insert(node.id.clone(), lane_index);
            x += cfg.node_spacing_x;
        }
    }

    let max_right = nodes.values().map(Rect::right).fold(0.0_f32, f32::max);
    let width = (max_right + cfg.margin).max(cfg.min_width);
    let height = cfg.margin * 2.0
        + cfg.title_height
        + plan.lanes.len() as f32 * (cfg.lane_height + cfg.lane_gap);

    let lane_width = width - cfg.margin * 2.0;
    let lanes: Vec<LaneBand> = plan
        .lanes
        .iter()
        .zip(&bands)
        .map(|(name, band)| LaneBand {
            name: name.clone(),
            rect: Rect::new(band.x, band.y, lane_width, band.height),
        })
        .collect();

    let mut groups = Vec::with_capacity(plan.groups.len());
    for group in &plan.groups {
        let members: Vec<Rect> = plan
            .nodes
            .iter()
            .filter(|node| node.group.as_deref() == Some(group.id.as_str()))
            .filter_map(|node| nodes.get(&node.id))
            .copied()
            .collect();

        let rect = match member_bounds(&members, cfg.group_padding) {
            Some(bounds) => {
                // Clamp the vertical extent to the bands the members occupy
                // so group boxes never bleed into a neighboring lane.
                let band_indices: Vec<usize> = plan
                    .nodes
                    .iter()
                    .filter(|node| node.group.as_deref() == Some(group.id.as_str()))
                    .filter_map(|node| node_band.get(&node.id))
                    .copied()
                    .collect();
                clamp_to_bands(bounds, &band_indices, &bands)
            }
            None => {
                let lane =
                    resolve_lane_index(group.lane.as_deref(), &plan.lanes, &config.fallback_lane);
                let band = bands
                    .get(lane)
                    .copied()
                    .unwrap_or_else(|| Rect::new(cfg.margin, top, 0.0, cfg.lane_height));
                Rect::new(
                    cfg.margin + cfg.lane_label_width - cfg.group_padding,
                    band.y + 5.0,
                    cfg.group_fallback_width,
                    cfg.lane_height - 10.0,
                )
            }
        };
        groups.push(GroupBox {
            id: group.id.clone(),
            rect,
        });
    }

    Layout {
        mode: plan.mode,
        lanes,
        groups,
        nodes,
        width,
        height,
    }
}

fn clamp_to_bands(bounds: Rect, band_indices: &[usize], bands: &[Rect]) -> Rect {
    let mut top = f32::MAX;
    let mut bottom = f32::MIN;
    for &index in band_indices {
        if let Some(band) = bands.get(index) {
            top = top.min(band.y);
            bottom = bottom.max(band.bottom());
        }
    }
    if top > bottom {
        return bounds;
    }
    let y = bounds.y.max(top);
    let end = bounds.bottom().min(bottom);
    Rect::new(bounds.x, y, bounds.width, end - y)
}
