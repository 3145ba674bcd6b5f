//! Grid layout: a flat wall of nodes in front of the user
//!
//! Rank order fills the grid row by row from the top left. Row spacing
//! shrinks as rows are added so the whole grid stays within reach.

use crate::graph::GraphModel;
use crate::math::Vec3;
use crate::settings::Stage;

/// Default number of columns
pub const COLUMNS: usize = 10;

/// Positions for `count` nodes in rank order
pub fn positions(count: usize, stage: &Stage) -> Vec<Vec3> {
    positions_with_columns(count, COLUMNS, stage)
}

pub fn positions_with_columns(count: usize, columns: usize, stage: &Stage) -> Vec<Vec3> {
    if count == 0 {
        return Vec::new();
    }
    let columns = columns.max(1);
    let rows = count.div_ceil(columns);
    let column_spacing = stage.size / columns as f32;
    let center_column = (columns - 1) as f32 / 2.0;
    let top = stage.user_height * 1.75;
    let row_step = (stage.user_height * 1.5) / rows as f32;
    let depth = -stage.size / 2.0;

    (0..count)
        .map(|i| {
            let column = (i % columns) as f32;
            let row = (i / columns) as f32;
            [
                (column - center_column) * column_spacing,
                top - row * row_step,
                depth,
            ]
        })
        .collect()
}

/// Write grid positions into `pos` of every node
pub fn arrange(graph: &mut GraphModel, stage: &Stage) {
    let order = graph.indices_by_rank();
    let placed = positions(order.len(), stage);
    let nodes = graph.nodes_mut();
    for (index, pos) in order.into_iter().zip(placed) {
        nodes[index].pos = pos;
    }
}
