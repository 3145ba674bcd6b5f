//! Render-facing world state
//!
//! [`Scene`] holds what a renderer draws each frame: the animated node
//! transforms and materials, link geometry and visibility, and the UI
//! panels. It is also where gaze rays are tested against those objects.
//! Layout and focus never touch it directly; they write the graph model
//! and [`Scene::update_network`] carries the result across.

mod controls;

pub use controls::{
    ACTIVE_OPACITY, Button, ButtonAction, ButtonPanel, HOVER_OPACITY, INACTIVE_OPACITY,
    IntroControl, IntroOverlay,
};

use serde::Serialize;

use crate::curve::LinkCurve;
use crate::graph::{GraphModel, LinkStatus, NodeStatus};
use crate::math::{Quad, Ray, Vec3, add, cross, normalize, scale, sub};

/// Sphere radius of a node at scale 1
pub const NODE_RADIUS: f32 = 0.1;

/// Labels float this far in front of their node, toward the viewer
const LABEL_DEPTH: f32 = 0.15;
const LABEL_HALF_WIDTH: f32 = 0.3;
const LABEL_HALF_HEIGHT: f32 = 0.06;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeMaterial {
    Basic,
    Adjacent,
    /// The focused node
    Selected,
    /// Provisional gaze highlight
    Highlight,
}

impl NodeMaterial {
    pub fn for_status(status: NodeStatus) -> Self {
        match status {
            NodeStatus::None => NodeMaterial::Basic,
            NodeStatus::Adjacent => NodeMaterial::Adjacent,
            NodeStatus::Center => NodeMaterial::Selected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMaterial {
    Basic,
    HighlightIn,
    HighlightOut,
}

impl LinkMaterial {
    pub fn for_status(status: LinkStatus) -> Self {
        match status {
            LinkStatus::None => LinkMaterial::Basic,
            LinkStatus::In => LinkMaterial::HighlightIn,
            LinkStatus::Out => LinkMaterial::HighlightOut,
        }
    }
}

/// Animated state of one node
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView {
    /// Rendered position, eased toward `next_pos` by the transition step
    pub position: Vec3,
    pub next_pos: Vec3,
    pub scale: f32,
    pub target_scale: f32,
    pub material: NodeMaterial,
    pub name_offset: [f32; 2],
    pub label_visible: bool,
    /// Material to fall back to when the gaze highlight is removed
    status_material: NodeMaterial,
}

impl NodeView {
    fn new(pos: Vec3, name_offset: [f32; 2]) -> Self {
        Self {
            position: pos,
            next_pos: pos,
            scale: 1.0,
            target_scale: 1.0,
            material: NodeMaterial::Basic,
            name_offset,
            label_visible: true,
            status_material: NodeMaterial::Basic,
        }
    }

    pub fn is_highlighted(&self) -> bool {
        self.material == NodeMaterial::Highlight
    }

    /// Apply the gaze highlight and grow toward `scale`
    pub fn highlight(&mut self, scale: f32) {
        self.material = NodeMaterial::Highlight;
        self.target_scale = scale;
    }

    pub fn clear_highlight(&mut self) {
        self.material = self.status_material;
        self.target_scale = 1.0;
    }

    fn set_status_material(&mut self, material: NodeMaterial) {
        self.status_material = material;
        if !self.is_highlighted() {
            self.material = material;
        }
    }

    /// Radius of the hit sphere at the current scale
    pub fn radius(&self) -> f32 {
        NODE_RADIUS * self.scale
    }

    /// Label rectangle facing `eye`
    pub fn label_quad(&self, eye: Vec3) -> Quad {
        let toward = normalize(sub(eye, self.position));
        let right = normalize(cross([0.0, 1.0, 0.0], toward));
        let up = cross(toward, right);
        let s = self.scale;
        let center = add(
            self.position,
            add(
                scale(toward, LABEL_DEPTH * s),
                add(
                    scale(right, self.name_offset[0] * s),
                    scale(up, self.name_offset[1] * s),
                ),
            ),
        );
        Quad {
            center,
            right,
            up,
            half_width: LABEL_HALF_WIDTH * s,
            half_height: LABEL_HALF_HEIGHT * s,
        }
    }
}

/// Renderable state of one link
#[derive(Debug, Clone, PartialEq)]
pub struct LinkView {
    /// Endpoints the current geometry was built from
    pub spos: Vec3,
    pub tpos: Vec3,
    /// Endpoints the geometry should follow once the graph settles
    pub next_spos: Vec3,
    pub next_tpos: Vec3,
    pub value: f32,
    pub material: LinkMaterial,
    pub visible: bool,
    geometry: Option<LinkCurve>,
    revision: u64,
}

impl LinkView {
    pub fn geometry(&self) -> Option<&LinkCurve> {
        self.geometry.as_ref()
    }

    /// Number of times the geometry has been rebuilt
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Install new geometry, handing back the one it replaces
    pub fn replace_geometry(&mut self, curve: LinkCurve) -> Option<LinkCurve> {
        self.revision += 1;
        std::mem::replace(&mut self.geometry, Some(curve))
    }
}

/// What a gaze ray can land on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HitTarget {
    /// Node by index into the graph
    Node(usize),
    Button(ButtonAction),
    Intro(IntroControl),
}

impl HitTarget {
    pub fn kind_name(&self) -> &'static str {
        match self {
            HitTarget::Node(_) => "node",
            HitTarget::Button(_) => "button",
            HitTarget::Intro(_) => "intro",
        }
    }
}

/// Which part of a target was hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HitKind {
    /// Node body
    Sphere,
    /// Node label
    Text,
    /// Button or intro control surface
    Button,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Intersection {
    pub target: HitTarget,
    pub kind: HitKind,
    pub distance: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: Vec<NodeView>,
    links: Vec<LinkView>,
    pub buttons: ButtonPanel,
    pub intro: IntroOverlay,
}

impl Scene {
    /// Create views for every node and link, placed at their current `pos`
    pub fn build(graph: &GraphModel) -> Self {
        let nodes = graph
            .nodes()
            .iter()
            .map(|n| NodeView::new(n.pos, n.name_offset))
            .collect();
        let links = graph
            .links()
            .iter()
            .map(|l| LinkView {
                spos: l.spos,
                tpos: l.tpos,
                next_spos: l.spos,
                next_tpos: l.tpos,
                value: l.value,
                material: LinkMaterial::Basic,
                visible: false,
                geometry: None,
                revision: 0,
            })
            .collect();
        let mut scene = Self {
            nodes,
            links,
            buttons: ButtonPanel::new(),
            intro: IntroOverlay::new(),
        };
        scene.update_network(graph);
        scene
    }

    pub fn nodes(&self) -> &[NodeView] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [NodeView] {
        &mut self.nodes
    }

    pub fn links(&self) -> &[LinkView] {
        &self.links
    }

    pub fn links_mut(&mut self) -> &mut [LinkView] {
        &mut self.links
    }

    /// Push positions, label offsets and materials from the graph
    pub fn update_network(&mut self, graph: &GraphModel) {
        for (view, node) in self.nodes.iter_mut().zip(graph.nodes()) {
            view.next_pos = node.pos;
            view.name_offset = node.name_offset;
            view.set_status_material(NodeMaterial::for_status(node.status));
        }
        self.sync_link_materials(graph);
        for (view, link) in self.links.iter_mut().zip(graph.links()) {
            view.next_spos = graph.nodes()[link.source_index()].pos;
            view.next_tpos = graph.nodes()[link.target_index()].pos;
        }
    }

    /// Copy link statuses from the graph into link materials
    pub fn sync_link_materials(&mut self, graph: &GraphModel) {
        for (view, link) in self.links.iter_mut().zip(graph.links()) {
            view.material = LinkMaterial::for_status(link.status);
        }
    }

    /// Neutral material on every link, hidden until the next settle
    pub fn reset_links(&mut self) {
        for view in &mut self.links {
            view.material = LinkMaterial::Basic;
            view.visible = false;
        }
    }

    /// Re-anchor the panels to the user rig
    pub fn place_panels(&mut self, rig: Vec3, stage_size: f32) {
        self.buttons.place(rig);
        self.intro.place(rig, stage_size);
    }

    /// Whether `target` still exists and can be looked at
    pub fn is_valid(&self, target: &HitTarget) -> bool {
        match target {
            HitTarget::Node(index) => !self.intro.active && *index < self.nodes.len(),
            HitTarget::Button(action) => !self.intro.active && self.buttons.is_visible(*action),
            HitTarget::Intro(_) => self.intro.active,
        }
    }

    /// Everything `ray` passes through, nearest first.
    ///
    /// While the intro overlay is up only its controls are candidates.
    pub fn intersect(&self, ray: &Ray) -> Vec<Intersection> {
        let mut hits = Vec::new();
        if self.intro.active {
            self.intro.intersect(ray, &mut hits);
        } else {
            for (index, node) in self.nodes.iter().enumerate() {
                if let Some(distance) = ray.intersect_sphere(node.position, node.radius()) {
                    hits.push(Intersection {
                        target: HitTarget::Node(index),
                        kind: HitKind::Sphere,
                        distance,
                    });
                }
                if let Some(distance) = ray.intersect_quad(&node.label_quad(ray.origin)) {
                    hits.push(Intersection {
                        target: HitTarget::Node(index),
                        kind: HitKind::Text,
                        distance,
                    });
                }
            }
            self.buttons.intersect(ray, &mut hits);
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}
