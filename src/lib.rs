//! gazegraph - layout and gaze interaction core for immersive 3D network views.
//!
//! This crate decides what the world looks like and how it changes: it lays
//! out a ranked, weighted graph (spiral, grid or force-directed), eases nodes
//! between layouts frame by frame, and turns a head-mounted gaze cursor into
//! dwell-and-fuse selections that focus the graph around a node. Rendering,
//! VR sessions and asset loading belong to the host.
//!
//! [`world::WorldState`] is the entry point; it owns every other component.

pub mod camera;
pub mod curve;
pub mod dataset;
pub mod events;
pub mod focus;
pub mod gaze;
pub mod graph;
pub mod layout;
pub mod math;
pub mod scene;
pub mod settings;
pub mod transition;
pub mod world;

pub use dataset::{Dataset, DatasetError};
pub use layout::{LayoutError, LayoutKind};
pub use settings::Settings;
pub use world::WorldState;
