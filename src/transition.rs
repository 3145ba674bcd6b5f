//! Per-frame easing of nodes toward their layout positions
//!
//! Every frame each node covers a fixed fraction of the remaining distance
//! to its target, so motion slows down as it arrives. While any node is
//! moving the graph counts as transitioning: links are hidden and gaze
//! targeting is paused. On the first quiet frame the link curves are
//! rebuilt for the new endpoints and label overlap is resolved once.

use tracing::debug;

use crate::curve::LinkCurve;
use crate::graph::GraphModel;
use crate::math::{Ray, Vec3, distance, lerp, lerp3};
use crate::scene::Scene;
use crate::settings::Stage;

/// Distance under which a node or link endpoint counts as arrived
pub const EPSILON: f32 = 0.01;

/// Fraction of the remaining distance covered per frame
pub const BLEND: f32 = 0.1;

/// Link arc lift as a fraction of the user's height
pub const LIFT_FRACTION: f32 = 0.25;

/// What one transition step did
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameReport {
    pub transitioning: bool,
    /// The "layout settled" signal fired on this frame
    pub settled: bool,
    pub rebuilt_links: usize,
    pub labels_updated: bool,
}

#[derive(Debug, Clone)]
pub struct TransitionController {
    /// Height the link arcs' control points are raised by
    lift: f32,
    transitioning: bool,
    labels_dirty: bool,
    settle_pending: bool,
}

impl TransitionController {
    pub fn new(stage: &Stage) -> Self {
        Self {
            lift: stage.user_height * LIFT_FRACTION,
            transitioning: false,
            labels_dirty: true,
            settle_pending: false,
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    /// Fire the settled signal on the next quiet frame
    pub fn expect_settle(&mut self) {
        self.settle_pending = true;
    }

    pub fn step(&mut self, scene: &mut Scene, graph: &GraphModel, eye: Vec3) -> FrameReport {
        let moving = ease_nodes(scene);
        self.transitioning = moving > 0;

        let mut report = FrameReport {
            transitioning: self.transitioning,
            ..FrameReport::default()
        };

        if self.transitioning {
            for link in scene.links_mut() {
                link.visible = false;
            }
            self.labels_dirty = true;
            return report;
        }

        report.rebuilt_links = refresh_links(scene, self.lift);

        if self.labels_dirty {
            update_label_visibility(scene, graph, eye);
            self.labels_dirty = false;
            report.labels_updated = true;
        }

        if self.settle_pending {
            self.settle_pending = false;
            report.settled = true;
        }
        report
    }
}

/// Move every node one blend step; returns how many are still moving
fn ease_nodes(scene: &mut Scene) -> usize {
    let mut moving = 0;
    for node in scene.nodes_mut() {
        if distance(node.position, node.next_pos) > EPSILON {
            node.position = lerp3(node.position, node.next_pos, BLEND);
            moving += 1;
        }
        if (node.scale - node.target_scale).abs() > EPSILON {
            node.scale = lerp(node.scale, node.target_scale, BLEND);
        } else {
            node.scale = node.target_scale;
        }
    }
    moving
}

/// Show all links and rebuild those whose endpoints moved
fn refresh_links(scene: &mut Scene, lift: f32) -> usize {
    let mut rebuilt = 0;
    for link in scene.links_mut() {
        link.visible = true;
        let moved = distance(link.spos, link.next_spos) > EPSILON
            || distance(link.tpos, link.next_tpos) > EPSILON;
        if !moved && link.geometry().is_some() {
            continue;
        }
        link.spos = link.next_spos;
        link.tpos = link.next_tpos;
        let curve = LinkCurve::build(link.spos, link.tpos, link.value, lift);
        // the old geometry is released here
        drop(link.replace_geometry(curve));
        rebuilt += 1;
    }
    rebuilt
}

/// Hide labels that would overlap along the same line of sight.
///
/// For each node a ray from `eye` to the node is tested against every node
/// sphere. When it passes through nodes with different names only the
/// nearest keeps its label.
pub fn update_label_visibility(scene: &mut Scene, graph: &GraphModel, eye: Vec3) {
    let names: Vec<&str> = graph.nodes().iter().map(|n| n.name.as_str()).collect();
    let mut visible = vec![true; scene.nodes().len()];

    for node in scene.nodes() {
        let ray = Ray::towards(eye, node.position);
        let mut hits: Vec<(usize, f32)> = scene
            .nodes()
            .iter()
            .enumerate()
            .filter_map(|(j, other)| {
                ray.intersect_sphere(other.position, other.radius())
                    .map(|d| (j, d))
            })
            .collect();
        if hits.len() < 2 {
            continue;
        }
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));

        let nearest = hits[0].0;
        let distinct = hits
            .iter()
            .any(|&(j, _)| names.get(j) != names.get(nearest));
        if distinct {
            for &(j, _) in &hits[1..] {
                visible[j] = false;
            }
        }
    }

    let hidden = visible.iter().filter(|v| !**v).count();
    for (node, show) in scene.nodes_mut().iter_mut().zip(visible) {
        node.label_visible = show;
    }
    debug!(hidden, "label occlusion pass");
}
