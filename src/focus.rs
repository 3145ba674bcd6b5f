//! Focus controller: what a fused target does
//!
//! Fusing a node pulls it toward the user, arranges its neighbours on a
//! ring around it and pushes every other node out to the periphery.
//! Buttons and intro controls map to layout commands; [`decide`] turns a
//! fused target into a [`FocusCommand`] and the world carries it out.

use std::f32::consts::TAU;

use tracing::info;

use crate::graph::{DEFAULT_NAME_OFFSET, GraphModel, NodeStatus};
use crate::layout::LayoutKind;
use crate::math::{Vec3, add, scale};
use crate::scene::{ButtonAction, HitTarget, IntroControl};
use crate::settings::Stage;

/// Distance from the stage axis the focused node moves to
pub const FOCUS_RADIUS: f32 = 2.0;
const RING_BASE: f32 = 0.8;
const RING_GROWTH: f32 = 0.05;
/// Unrelated nodes are pushed out to this fraction of the stage size
const PERIPHERY: f32 = 0.75;
const LABEL_SPREAD: f32 = 0.15;
const LABEL_LIFT: f32 = 0.1;

/// Radius of the neighbour ring for `count` neighbours
pub fn ring_radius(count: usize) -> f32 {
    RING_BASE + RING_GROWTH * count.max(1) as f32
}

/// Angle of `v` around the vertical axis, measured from +X toward +Z
fn azimuth(v: Vec3) -> f32 {
    v[2].atan2(v[0])
}

/// Rearrange the graph around the node at `index`.
///
/// Returns false when `index` is out of range.
pub fn focus_node(graph: &mut GraphModel, index: usize, stage: &Stage) -> bool {
    if index >= graph.nodes().len() {
        return false;
    }
    let neighbors = graph.neighbor_indices(index);

    for node in graph.nodes_mut() {
        if !node.shifted {
            node.last_pos = node.pos;
        }
    }

    let current = graph.nodes()[index].pos;
    let alpha = azimuth(current);
    let (sin_a, cos_a) = alpha.sin_cos();
    let center = [
        cos_a * FOCUS_RADIUS,
        (current[1] + stage.user_height) / 2.0,
        sin_a * FOCUS_RADIUS,
    ];
    let outward = [cos_a, 0.0, sin_a];
    let tangent = [-sin_a, 0.0, cos_a];

    let count = neighbors.len().max(1);
    let phi = TAU / count as f32;
    let radius = ring_radius(count);
    let periphery = PERIPHERY * stage.size;

    for node in graph.nodes_mut() {
        let theta = azimuth(node.last_pos);
        node.pos = [
            theta.cos() * periphery,
            node.last_pos[1],
            theta.sin() * periphery,
        ];
        node.status = NodeStatus::None;
        node.name_offset = DEFAULT_NAME_OFFSET;
        node.shifted = true;
    }

    for (j, &neighbor) in neighbors.iter().enumerate() {
        let beta = j as f32 * phi;
        let (sin_b, cos_b) = beta.sin_cos();
        let offset = add(scale(tangent, radius * cos_b), scale(outward, radius * sin_b));
        let lift = if j % 2 == 0 { LABEL_LIFT } else { -LABEL_LIFT };
        let node = &mut graph.nodes_mut()[neighbor];
        node.pos = add(center, offset);
        node.status = NodeStatus::Adjacent;
        node.name_offset = [LABEL_SPREAD * cos_b, lift];
    }

    let focused = &mut graph.nodes_mut()[index];
    focused.pos = center;
    focused.status = NodeStatus::Center;

    graph.set_link_statuses(Some(index));
    graph.sync_link_endpoints();

    info!(
        node = %graph.nodes()[index].name,
        neighbors = neighbors.len(),
        "focused node"
    );
    true
}

/// Action requested by a fused target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusCommand {
    Focus(usize),
    Layout(LayoutKind),
    /// Restore the last committed layout
    Reset,
    ShowIntro,
    DismissIntro,
}

pub fn decide(target: HitTarget) -> FocusCommand {
    match target {
        HitTarget::Node(index) => FocusCommand::Focus(index),
        HitTarget::Button(ButtonAction::Layout(kind)) => FocusCommand::Layout(kind),
        HitTarget::Button(ButtonAction::Reset) => FocusCommand::Reset,
        HitTarget::Button(ButtonAction::Info) => FocusCommand::ShowIntro,
        HitTarget::Intro(IntroControl::GotIt | IntroControl::Explore) => FocusCommand::DismissIntro,
    }
}
