//! Normalized graph model
//!
//! The model owns every node and link. Links refer to their endpoints by id
//! (with the resolved index cached alongside), so positions live in exactly
//! one place: the node's `pos`.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dataset::{Dataset, NodeId, RawLink, RawNode};
use crate::math::{ORIGIN, Vec3};
use crate::settings::ColorMap;

/// Label offset assigned to every node by the base layouts
pub const DEFAULT_NAME_OFFSET: [f32; 2] = [0.0, -0.15];

/// Focus state of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    None,
    /// The focused node
    Center,
    /// Directly connected to the focused node
    Adjacent,
}

/// Direction of a link relative to the focused or gazed node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    #[default]
    None,
    /// The link points at the focused node
    In,
    /// The link leaves the focused node
    Out,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub rank: i64,
    /// Normalized category key (see [`ColorMap::resolve`])
    pub category: String,
    pub link_count: usize,
    /// Target position set by the active layout or by a focus shift
    pub pos: Vec3,
    /// Position before the most recent focus shift
    pub last_pos: Vec3,
    pub name_offset: [f32; 2],
    pub status: NodeStatus,
    /// Moved by the focus algorithm rather than by the base layout
    pub shifted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub value: f32,
    /// Endpoint positions as of the last layout or focus write
    pub spos: Vec3,
    pub tpos: Vec3,
    pub status: LinkStatus,
    pub(crate) source: usize,
    pub(crate) target: usize,
}

impl Link {
    pub fn source_index(&self) -> usize {
        self.source
    }

    pub fn target_index(&self) -> usize {
        self.target
    }

    pub fn touches(&self, index: usize) -> bool {
        self.source == index || self.target == index
    }

    /// Status of this link as seen from the node at `index`
    pub fn status_relative_to(&self, index: usize) -> LinkStatus {
        if self.source == index {
            LinkStatus::Out
        } else if self.target == index {
            LinkStatus::In
        } else {
            LinkStatus::None
        }
    }
}

/// Saved per-node layout state
#[derive(Debug, Clone, PartialEq)]
pub struct NodeState {
    pub pos: Vec3,
    pub last_pos: Vec3,
    pub name_offset: [f32; 2],
    pub status: NodeStatus,
    pub shifted: bool,
}

/// Saved per-link layout state
#[derive(Debug, Clone, PartialEq)]
pub struct LinkState {
    pub spos: Vec3,
    pub tpos: Vec3,
    pub status: LinkStatus,
}

/// Deep copy of every position and status in the graph
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeState>,
    pub links: Vec<LinkState>,
}

#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    nodes: Vec<Node>,
    links: Vec<Link>,
    index_by_id: HashMap<NodeId, usize>,
}

impl GraphModel {
    /// Normalize raw nodes and links.
    ///
    /// Duplicate node ids keep their first occurrence, links with a missing
    /// endpoint are dropped, and nodes left without any link are excluded.
    /// Empty input yields an empty graph.
    pub fn build(raw_nodes: &[RawNode], raw_links: &[RawLink], color_map: &ColorMap) -> Self {
        let mut seen = HashSet::new();
        let unique: Vec<&RawNode> = raw_nodes
            .iter()
            .filter(|n| {
                let fresh = seen.insert(n.id.clone());
                if !fresh {
                    warn!(id = %n.id, "dropping duplicate node id");
                }
                fresh
            })
            .collect();

        let valid_links: Vec<&RawLink> = raw_links
            .iter()
            .filter(|l| {
                let known = seen.contains(&l.source) && seen.contains(&l.target);
                if !known {
                    warn!(from = %l.source, to = %l.target, "dropping link with unknown endpoint");
                }
                known
            })
            .collect();

        let mut link_counts: HashMap<&NodeId, usize> = HashMap::new();
        for link in &valid_links {
            *link_counts.entry(&link.source).or_default() += 1;
            if link.target != link.source {
                *link_counts.entry(&link.target).or_default() += 1;
            }
        }

        let nodes: Vec<Node> = unique
            .into_iter()
            .filter_map(|raw| {
                let link_count = link_counts.get(&raw.id).copied().unwrap_or(0);
                if link_count == 0 {
                    debug!(id = %raw.id, "excluding unlinked node");
                    return None;
                }
                Some(Node {
                    id: raw.id.clone(),
                    name: raw.name.clone().unwrap_or_else(|| raw.id.to_string()),
                    rank: raw.rank,
                    category: color_map.resolve(raw.category.as_deref()),
                    link_count,
                    pos: ORIGIN,
                    last_pos: ORIGIN,
                    name_offset: DEFAULT_NAME_OFFSET,
                    status: NodeStatus::None,
                    shifted: false,
                })
            })
            .collect();

        let index_by_id: HashMap<NodeId, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();

        let links = valid_links
            .into_iter()
            .filter_map(|raw| {
                let source = *index_by_id.get(&raw.source)?;
                let target = *index_by_id.get(&raw.target)?;
                Some(Link {
                    source_id: raw.source.clone(),
                    target_id: raw.target.clone(),
                    value: raw.value,
                    spos: ORIGIN,
                    tpos: ORIGIN,
                    status: LinkStatus::None,
                    source,
                    target,
                })
            })
            .collect();

        Self {
            nodes,
            links,
            index_by_id,
        }
    }

    /// Build straight from a dataset document
    pub fn from_dataset(dataset: &Dataset, color_map: &ColorMap) -> Self {
        Self::build(&dataset.nodes, &dataset.links, color_map)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn links_mut(&mut self) -> &mut [Link] {
        &mut self.links
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    /// Index of the first node with the given rank
    pub fn index_of_rank(&self, rank: i64) -> Option<usize> {
        self.nodes.iter().position(|n| n.rank == rank)
    }

    /// Index of the focused node, if any
    pub fn center(&self) -> Option<usize> {
        self.nodes.iter().position(|n| n.status == NodeStatus::Center)
    }

    /// Node indices sorted ascending by rank (stable for equal ranks)
    pub fn indices_by_rank(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.nodes.len()).collect();
        order.sort_by_key(|&i| self.nodes[i].rank);
        order
    }

    /// Ids of every node linked to `id` in either direction
    pub fn neighbors_of(&self, id: &NodeId) -> HashSet<NodeId> {
        self.index_of(id)
            .map(|index| {
                self.neighbor_indices(index)
                    .into_iter()
                    .map(|i| self.nodes[i].id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Neighbor indices of `index`, deduplicated and ordered by rank
    pub fn neighbor_indices(&self, index: usize) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut neighbors: Vec<usize> = self
            .links
            .iter()
            .filter_map(|l| {
                if l.source == index {
                    Some(l.target)
                } else if l.target == index {
                    Some(l.source)
                } else {
                    None
                }
            })
            .filter(|&other| other != index && seen.insert(other))
            .collect();
        neighbors.sort_by_key(|&i| self.nodes[i].rank);
        neighbors
    }

    /// Point every link's endpoints at the current `pos` of its nodes
    pub fn sync_link_endpoints(&mut self) {
        for link in &mut self.links {
            link.spos = self.nodes[link.source].pos;
            link.tpos = self.nodes[link.target].pos;
        }
    }

    /// Set every link's status relative to the node at `index` (or clear all)
    pub fn set_link_statuses(&mut self, index: Option<usize>) {
        for link in &mut self.links {
            link.status = match index {
                Some(i) => link.status_relative_to(i),
                None => LinkStatus::None,
            };
        }
    }

    pub fn clone_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self
                .nodes
                .iter()
                .map(|n| NodeState {
                    pos: n.pos,
                    last_pos: n.last_pos,
                    name_offset: n.name_offset,
                    status: n.status,
                    shifted: n.shifted,
                })
                .collect(),
            links: self
                .links
                .iter()
                .map(|l| LinkState {
                    spos: l.spos,
                    tpos: l.tpos,
                    status: l.status,
                })
                .collect(),
        }
    }

    /// Restore a snapshot taken from this graph.
    ///
    /// Returns false (leaving the graph untouched) when the snapshot was taken
    /// from a graph of a different shape.
    pub fn restore_snapshot(&mut self, snapshot: &GraphSnapshot) -> bool {
        if snapshot.nodes.len() != self.nodes.len() || snapshot.links.len() != self.links.len() {
            warn!(
                nodes = self.nodes.len(),
                snapshot_nodes = snapshot.nodes.len(),
                "ignoring snapshot from a different graph"
            );
            return false;
        }
        for (node, state) in self.nodes.iter_mut().zip(&snapshot.nodes) {
            node.pos = state.pos;
            node.last_pos = state.last_pos;
            node.name_offset = state.name_offset;
            node.status = state.status;
            node.shifted = state.shifted;
        }
        for (link, state) in self.links.iter_mut().zip(&snapshot.links) {
            link.spos = state.spos;
            link.tpos = state.tpos;
            link.status = state.status;
        }
        true
    }
}
