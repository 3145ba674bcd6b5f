//! 3D force simulation used as the default force-layout solver
//!
//! The layout engine treats the solver as a black box: it hands over node
//! count and link pairs and gets raw coordinates back once the simulation
//! has cooled down. Output is in solver space; mapping into the stage is the
//! caller's job.

use std::f32::consts::TAU;

use crate::layout::LayoutError;
use crate::math::{Vec3, add, dot, scale, sub};

/// Topology handed to a solver
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverInput {
    pub node_count: usize,
    /// Link endpoints as node indices
    pub links: Vec<(usize, usize)>,
}

/// An iterative layout solver that runs to convergence
pub trait ForceSolver: Send + Sync {
    /// Compute one position per node, in node order
    fn solve(&self, input: &SolverInput) -> Result<Vec<Vec3>, LayoutError>;
}

/// Radius of the sphere nodes start on
const SEED_RADIUS: f32 = 100.0;

/// A simulated body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub pos: Vec3,
    pub vel: Vec3,
}

impl Body {
    /// Start position on a Fibonacci sphere, so seeding needs no randomness
    pub fn seeded(index: usize, total: usize) -> Self {
        let golden = (1.0 + 5.0_f32.sqrt()) / 2.0;
        let i = index as f32;
        let azimuth = TAU * i / golden;
        let polar = (1.0 - 2.0 * (i + 0.5) / total.max(1) as f32).acos();
        let (sin_p, cos_p) = polar.sin_cos();
        Self {
            pos: scale([sin_p * azimuth.cos(), sin_p * azimuth.sin(), cos_p], SEED_RADIUS),
            vel: [0.0; 3],
        }
    }
}

/// Force strengths and the cooling schedule
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Pairwise charge; negative repels
    pub charge: f32,
    /// Rest length of a link
    pub link_distance: f32,
    pub link_strength: f32,
    /// Pull toward the origin
    pub center_strength: f32,
    /// Fraction of velocity kept each tick
    pub velocity_decay: f32,
    pub alpha_start: f32,
    /// The simulation stops once alpha falls below this
    pub alpha_min: f32,
    pub alpha_decay: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            charge: -50.0,
            link_distance: 60.0,
            link_strength: 1.0,
            center_strength: 0.08,
            velocity_decay: 0.6,
            alpha_start: 1.0,
            alpha_min: 0.001,
            // reaches alpha_min after about 300 ticks
            alpha_decay: 1.0 - 0.001_f32.powf(1.0 / 300.0),
        }
    }
}

/// Charge, link and centering forces on a cooling schedule
#[derive(Debug, Clone)]
pub struct Simulation3D {
    bodies: Vec<Body>,
    links: Vec<(usize, usize)>,
    config: SimulationConfig,
    alpha: f32,
}

impl Simulation3D {
    /// Seed bodies for `input`; links to missing nodes and self links are ignored
    pub fn new(input: &SolverInput, config: SimulationConfig) -> Self {
        let total = input.node_count;
        let links = input
            .links
            .iter()
            .copied()
            .filter(|&(s, t)| s < total && t < total && s != t)
            .collect();
        Self {
            bodies: (0..total).map(|i| Body::seeded(i, total)).collect(),
            links,
            alpha: config.alpha_start,
            config,
        }
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn links(&self) -> &[(usize, usize)] {
        &self.links
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_running(&self) -> bool {
        self.alpha > self.config.alpha_min
    }

    pub fn tick(&mut self) {
        if !self.is_running() || self.bodies.is_empty() {
            return;
        }

        self.repel();
        self.attract_links();
        self.center();

        for body in &mut self.bodies {
            body.vel = scale(body.vel, self.config.velocity_decay);
            body.pos = add(body.pos, scale(body.vel, self.alpha));
        }
        self.alpha *= 1.0 - self.config.alpha_decay;
    }

    /// Inverse-square repulsion between every pair
    fn repel(&mut self) {
        let n = self.bodies.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let delta = sub(self.bodies[j].pos, self.bodies[i].pos);
                let dist_sq = dot(delta, delta).max(1.0);
                let push = scale(delta, self.config.charge / (dist_sq * dist_sq.sqrt()));
                self.bodies[i].vel = add(self.bodies[i].vel, push);
                self.bodies[j].vel = sub(self.bodies[j].vel, push);
            }
        }
    }

    /// Springs pulling linked bodies toward the rest length
    fn attract_links(&mut self) {
        for &(source, target) in &self.links {
            let delta = sub(self.bodies[target].pos, self.bodies[source].pos);
            let dist = dot(delta, delta).sqrt().max(1.0);
            let stretch = (dist - self.config.link_distance) / dist;
            let pull = scale(delta, self.config.link_strength * stretch * 0.5);
            self.bodies[source].vel = add(self.bodies[source].vel, pull);
            self.bodies[target].vel = sub(self.bodies[target].vel, pull);
        }
    }

    fn center(&mut self) {
        let strength = self.config.center_strength;
        for body in &mut self.bodies {
            body.vel = sub(body.vel, scale(body.pos, strength));
        }
    }

    /// Tick until cool or until `max_iterations` ticks have run
    pub fn run_to_convergence(&mut self, max_iterations: usize) {
        for _ in 0..max_iterations {
            if !self.is_running() {
                break;
            }
            self.tick();
        }
    }

    pub fn positions(&self) -> Vec<Vec3> {
        self.bodies.iter().map(|b| b.pos).collect()
    }
}

/// The built-in solver: a fresh [`Simulation3D`] per request
#[derive(Debug, Clone)]
pub struct CpuForceSolver {
    pub config: SimulationConfig,
    pub max_iterations: usize,
}

impl Default for CpuForceSolver {
    fn default() -> Self {
        Self {
            config: SimulationConfig::default(),
            max_iterations: 500,
        }
    }
}

impl ForceSolver for CpuForceSolver {
    fn solve(&self, input: &SolverInput) -> Result<Vec<Vec3>, LayoutError> {
        let mut sim = Simulation3D::new(input, self.config.clone());
        sim.run_to_convergence(self.max_iterations);
        Ok(sim.positions())
    }
}
