//! Spiral layout: nodes wound around a cylinder centred on the user
//!
//! Nodes are taken in rank order and placed on a gentle helix, so the
//! lowest rank starts straight ahead and each revolution rises one band.

use std::f32::consts::{FRAC_PI_2, TAU};

use crate::graph::GraphModel;
use crate::math::Vec3;
use crate::settings::Stage;

/// Nodes per band before another row is added
const NODES_PER_ROW: usize = 35;

/// Height gained over one full revolution
const ROW_SPACING: f32 = 0.5;

/// Number of helix rows for `count` nodes
pub fn row_count(count: usize) -> usize {
    1 + count.div_ceil(NODES_PER_ROW)
}

/// Positions for `count` nodes in rank order
pub fn positions(count: usize, stage: &Stage) -> Vec<Vec3> {
    if count == 0 {
        return Vec::new();
    }
    let rows = row_count(count);
    let row_size = count.div_ceil(rows).max(1) as f32;
    let radius = stage.size / 2.0;
    let base_height = stage.user_height / 2.0;

    (0..count)
        .map(|i| {
            let i = i as f32;
            let theta = -FRAC_PI_2 + i * (TAU / row_size);
            [
                theta.cos() * radius,
                base_height + (i / row_size) * ROW_SPACING,
                theta.sin() * radius,
            ]
        })
        .collect()
}

/// Write spiral positions into `pos` of every node
pub fn arrange(graph: &mut GraphModel, stage: &Stage) {
    let order = graph.indices_by_rank();
    let placed = positions(order.len(), stage);
    let nodes = graph.nodes_mut();
    for (index, pos) in order.into_iter().zip(placed) {
        nodes[index].pos = pos;
    }
}
