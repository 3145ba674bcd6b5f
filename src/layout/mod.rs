//! Layout engine: spiral, grid and force-directed placement
//!
//! Spiral and grid are pure functions of rank order and run synchronously.
//! The force layout hands the topology to a [`ForceSolver`] on a worker
//! thread and is applied when [`LayoutEngine::poll`] sees the result. Every
//! request bumps a generation counter; solver results tagged with an older
//! generation are discarded, so a late simulation can never overwrite a
//! newer layout.
//!
//! Whatever the algorithm, a commit ends the same way: statuses cleared,
//! link endpoints synced and a fresh baseline snapshot stored for reset.

pub mod force;
pub mod grid;
pub mod simulation;
pub mod spiral;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::graph::{DEFAULT_NAME_OFFSET, GraphModel, GraphSnapshot, NodeStatus};
use crate::math::{self, Vec3};
use crate::settings::Stage;

pub use simulation::{CpuForceSolver, ForceSolver, SolverInput};

/// The interchangeable layout algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    Spiral,
    Grid,
    Simulation,
}

impl LayoutKind {
    pub const ALL: [LayoutKind; 3] =
        [LayoutKind::Spiral, LayoutKind::Grid, LayoutKind::Simulation];

    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutKind::Spiral => "spiral",
            LayoutKind::Grid => "grid",
            LayoutKind::Simulation => "simulation",
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutKind {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spiral" | "radial" => Ok(LayoutKind::Spiral),
            "grid" => Ok(LayoutKind::Grid),
            "simulation" | "force" => Ok(LayoutKind::Simulation),
            other => Err(LayoutError::UnknownKind(other.to_string())),
        }
    }
}

/// Errors produced while computing a layout
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("unknown layout algorithm: {0}")]
    UnknownKind(String),

    /// The solver thread went away without sending a result
    #[error("force solver stopped before producing a layout")]
    SolverDisconnected,

    #[error("force solver produced a non-finite position for node {index}")]
    NonFiniteOutput { index: usize },

    #[error("force solver returned {actual} positions for {expected} nodes")]
    NodeCountMismatch { expected: usize, actual: usize },
}

/// Result of a layout request or of polling for one
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutOutcome {
    /// Positions are written and the baseline is stored
    Committed(LayoutKind),
    /// The force solver is running; the result arrives through `poll`
    Pending { generation: u64 },
    /// The request failed and the previous layout was kept
    Failed(LayoutError),
}

type SolverResult = Result<Vec<Vec3>, LayoutError>;

struct PendingSimulation {
    generation: u64,
    node_count: usize,
    rx: Receiver<SolverResult>,
}

pub struct LayoutEngine {
    stage: Stage,
    solver: Arc<dyn ForceSolver>,
    generation: u64,
    pending: Vec<PendingSimulation>,
    baseline: Option<GraphSnapshot>,
    active: Option<LayoutKind>,
}

impl LayoutEngine {
    /// Engine backed by the built-in force simulation
    pub fn new(stage: Stage) -> Self {
        Self::with_solver(stage, Arc::new(CpuForceSolver::default()))
    }

    pub fn with_solver(stage: Stage, solver: Arc<dyn ForceSolver>) -> Self {
        Self {
            stage,
            solver,
            generation: 0,
            pending: Vec::new(),
            baseline: None,
            active: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Generation of the most recent request
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The algorithm behind the current baseline
    pub fn active(&self) -> Option<LayoutKind> {
        self.active
    }

    pub fn baseline(&self) -> Option<&GraphSnapshot> {
        self.baseline.as_ref()
    }

    /// Whether the latest request is still waiting on the solver
    pub fn is_pending(&self) -> bool {
        self.pending.iter().any(|p| p.generation == self.generation)
    }

    /// Run `kind` against `graph`.
    ///
    /// Spiral and grid commit immediately. Simulation starts the solver and
    /// returns [`LayoutOutcome::Pending`]; an empty graph commits at once.
    pub fn request(&mut self, kind: LayoutKind, graph: &mut GraphModel) -> LayoutOutcome {
        self.generation += 1;
        match kind {
            LayoutKind::Spiral => {
                spiral::arrange(graph, &self.stage);
                self.commit(kind, graph);
                LayoutOutcome::Committed(kind)
            }
            LayoutKind::Grid => {
                grid::arrange(graph, &self.stage);
                self.commit(kind, graph);
                LayoutOutcome::Committed(kind)
            }
            LayoutKind::Simulation if graph.is_empty() => {
                self.commit(kind, graph);
                LayoutOutcome::Committed(kind)
            }
            LayoutKind::Simulation => self.spawn_simulation(graph),
        }
    }

    fn spawn_simulation(&mut self, graph: &GraphModel) -> LayoutOutcome {
        let input = SolverInput {
            node_count: graph.nodes().len(),
            links: graph
                .links()
                .iter()
                .map(|l| (l.source_index(), l.target_index()))
                .collect(),
        };
        let generation = self.generation;
        let node_count = input.node_count;
        let solver = Arc::clone(&self.solver);
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = solver.solve(&input);
            // The engine may have been dropped in the meantime
            let _ = tx.send(result);
        });

        debug!(generation, nodes = node_count, "force solver started");
        self.pending.push(PendingSimulation {
            generation,
            node_count,
            rx,
        });
        LayoutOutcome::Pending { generation }
    }

    /// Check for finished solver runs without blocking.
    ///
    /// Returns the outcome of the current request once its result arrives.
    /// Results from superseded requests are dropped.
    pub fn poll(&mut self, graph: &mut GraphModel) -> Option<LayoutOutcome> {
        let mut finished = None;
        let current = self.generation;

        self.pending.retain(|task| match task.rx.try_recv() {
            Ok(result) => {
                if task.generation == current {
                    finished = Some((task.node_count, Some(result)));
                } else {
                    debug!(
                        generation = task.generation,
                        current, "discarding stale force layout"
                    );
                }
                false
            }
            Err(TryRecvError::Empty) => true,
            Err(TryRecvError::Disconnected) => {
                if task.generation == current {
                    finished = Some((task.node_count, None));
                }
                false
            }
        });

        let (node_count, result) = finished?;
        let result = result.unwrap_or(Err(LayoutError::SolverDisconnected));
        Some(self.apply_solver_result(node_count, result, graph))
    }

    /// Block until the current simulation finishes or `timeout` elapses
    pub fn wait(&mut self, graph: &mut GraphModel, timeout: Duration) -> Option<LayoutOutcome> {
        let current = self.generation;
        let position = self.pending.iter().position(|p| p.generation == current)?;
        let received = self.pending[position].rx.recv_timeout(timeout);
        let result = match received {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => Err(LayoutError::SolverDisconnected),
        };
        let task = self.pending.remove(position);
        // Anything older is stale by definition
        self.pending.retain(|p| p.generation > current);
        Some(self.apply_solver_result(task.node_count, result, graph))
    }

    fn apply_solver_result(
        &mut self,
        node_count: usize,
        result: SolverResult,
        graph: &mut GraphModel,
    ) -> LayoutOutcome {
        match self.apply_positions(node_count, result, graph) {
            Ok(()) => {
                self.commit(LayoutKind::Simulation, graph);
                LayoutOutcome::Committed(LayoutKind::Simulation)
            }
            Err(err) => {
                warn!(error = %err, "force layout failed, keeping previous layout");
                LayoutOutcome::Failed(err)
            }
        }
    }

    fn apply_positions(
        &self,
        node_count: usize,
        result: SolverResult,
        graph: &mut GraphModel,
    ) -> Result<(), LayoutError> {
        let raw = result?;
        let expected = graph.nodes().len();
        if raw.len() != expected || node_count != expected {
            return Err(LayoutError::NodeCountMismatch {
                expected,
                actual: raw.len(),
            });
        }
        if let Some(index) = raw.iter().position(|p| !math::is_finite(*p)) {
            return Err(LayoutError::NonFiniteOutput { index });
        }

        let mapped = force::map_to_stage(&raw, &self.stage);
        for (node, pos) in graph.nodes_mut().iter_mut().zip(mapped) {
            node.pos = pos;
        }
        Ok(())
    }

    /// Finish a base layout: clear focus state, sync links, store baseline
    fn commit(&mut self, kind: LayoutKind, graph: &mut GraphModel) {
        for node in graph.nodes_mut() {
            node.status = NodeStatus::None;
            node.shifted = false;
            node.last_pos = node.pos;
            node.name_offset = DEFAULT_NAME_OFFSET;
        }
        graph.sync_link_endpoints();
        graph.set_link_statuses(None);
        self.baseline = Some(graph.clone_snapshot());
        self.active = Some(kind);
        info!(layout = %kind, nodes = graph.nodes().len(), "layout committed");
    }

    /// Put the graph back to the last committed baseline.
    ///
    /// Counts as a new request, so a running simulation is superseded.
    pub fn restore_baseline(&mut self, graph: &mut GraphModel) -> bool {
        self.generation += 1;
        match &self.baseline {
            Some(snapshot) => graph.restore_snapshot(snapshot),
            None => false,
        }
    }

    /// Forget the baseline and supersede any running solver.
    ///
    /// Called when the graph is rebuilt from new data.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.pending.clear();
        self.baseline = None;
        self.active = None;
    }
}

impl fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("stage", &self.stage)
            .field("generation", &self.generation)
            .field("pending", &self.pending.len())
            .field("active", &self.active)
            .finish()
    }
}
