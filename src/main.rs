use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use gazegraph::graph::{LinkStatus, NodeStatus};
use gazegraph::math::Vec3;
use gazegraph::scene::{ButtonAction, HitTarget, IntroControl};
use gazegraph::{Dataset, LayoutKind, Settings, WorldState};

/// Frame length used when driving the world from the command line
const FRAME: Duration = Duration::from_millis(16);
const MAX_SETTLE_FRAMES: usize = 5000;
const SOLVER_TIMEOUT: Duration = Duration::from_secs(60);

/// Gaze-driven layout and interaction core for 3D network visualizations.
#[derive(Parser)]
#[command(name = "gazegraph")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lay out a dataset and print node positions as JSON
    Layout {
        /// Dataset file (.json, .yaml or .yml)
        #[arg(short, long)]
        input: PathBuf,

        /// Layout algorithm: spiral, grid or simulation
        #[arg(short, long, default_value = "spiral")]
        algorithm: LayoutKind,

        /// Settings file (.json, .yaml or .yml)
        #[arg(short, long)]
        settings: Option<PathBuf>,
    },
    /// Gaze at the node of a given rank and print the resulting statuses
    Simulate {
        /// Dataset file (.json, .yaml or .yml)
        #[arg(short, long)]
        input: PathBuf,

        /// Layout algorithm to apply before gazing
        #[arg(short, long, default_value = "grid")]
        algorithm: LayoutKind,

        /// Rank of the node to gaze at
        #[arg(short, long, default_value = "1")]
        rank: i64,

        /// How long to hold the gaze (defaults to the fuse duration)
        #[arg(short, long)]
        duration_ms: Option<u64>,

        /// Settings file (.json, .yaml or .yml)
        #[arg(short, long)]
        settings: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct NodePosition<'a> {
    id: &'a str,
    name: &'a str,
    rank: i64,
    pos: Vec3,
}

#[derive(Serialize)]
struct LayoutReport<'a> {
    layout: LayoutKind,
    nodes: Vec<NodePosition<'a>>,
}

#[derive(Serialize)]
struct NodeReport<'a> {
    id: &'a str,
    rank: i64,
    status: NodeStatus,
}

#[derive(Serialize)]
struct LinkReport<'a> {
    source: &'a str,
    target: &'a str,
    status: LinkStatus,
}

#[derive(Serialize)]
struct SimulationReport<'a> {
    focused: Option<&'a str>,
    nodes: Vec<NodeReport<'a>>,
    links: Vec<LinkReport<'a>>,
}

fn load(input: &Path, settings: Option<&Path>) -> anyhow::Result<(Dataset, Settings)> {
    let dataset = Dataset::from_path(input)
        .with_context(|| format!("failed to load dataset {}", input.display()))?;
    let settings = match settings {
        Some(path) => Settings::from_path(path)
            .with_context(|| format!("failed to load settings {}", path.display()))?,
        None => Settings::default(),
    };
    Ok((dataset, settings))
}

/// Dismiss the intro, apply `algorithm` and let everything come to rest
fn prepare(world: &mut WorldState, algorithm: LayoutKind) -> anyhow::Result<()> {
    world.select(HitTarget::Intro(IntroControl::GotIt));
    // look away from the scene so nothing fuses while settling
    world.camera_mut().set_orientation(0.0, 1.4);
    world
        .settle(MAX_SETTLE_FRAMES, FRAME)
        .context("intro did not settle")?;

    world.select(HitTarget::Button(ButtonAction::Layout(algorithm)));
    if world.layout().is_pending() && world.wait_for_layout(SOLVER_TIMEOUT).is_none() {
        bail!("force layout did not finish within {SOLVER_TIMEOUT:?}");
    }
    world
        .settle(MAX_SETTLE_FRAMES, FRAME)
        .context("layout did not settle")?;
    Ok(())
}

fn layout(input: &Path, algorithm: LayoutKind, settings: Option<&Path>) -> anyhow::Result<()> {
    let (dataset, settings) = load(input, settings)?;
    let mut world = WorldState::new(&dataset, settings);
    prepare(&mut world, algorithm)?;

    let graph = world.graph();
    let report = LayoutReport {
        layout: algorithm,
        nodes: graph
            .indices_by_rank()
            .into_iter()
            .map(|i| {
                let node = &graph.nodes()[i];
                NodePosition {
                    id: node.id.as_str(),
                    name: &node.name,
                    rank: node.rank,
                    pos: node.pos,
                }
            })
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn simulate(
    input: &Path,
    algorithm: LayoutKind,
    rank: i64,
    duration_ms: Option<u64>,
    settings: Option<&Path>,
) -> anyhow::Result<()> {
    let (dataset, settings) = load(input, settings)?;
    let duration = Duration::from_millis(duration_ms.unwrap_or(settings.fuse_duration_ms));
    let mut world = WorldState::new(&dataset, settings);
    prepare(&mut world, algorithm)?;

    let index = world
        .graph()
        .index_of_rank(rank)
        .with_context(|| format!("no node with rank {rank}"))?;

    // one frame to acquire, then hold for the full duration
    let frames = duration.as_millis().div_ceil(FRAME.as_millis()) + 1;
    for _ in 0..frames {
        let pos = world.scene().nodes()[index].position;
        world.camera_mut().look_at(pos);
        if world.tick(FRAME).gaze.and_then(|g| g.fused).is_some() {
            break;
        }
    }

    let graph = world.graph();
    let report = SimulationReport {
        focused: graph.center().map(|i| graph.nodes()[i].id.as_str()),
        nodes: graph
            .nodes()
            .iter()
            .map(|n| NodeReport {
                id: n.id.as_str(),
                rank: n.rank,
                status: n.status,
            })
            .collect(),
        links: graph
            .links()
            .iter()
            .map(|l| LinkReport {
                source: l.source_id.as_str(),
                target: l.target_id.as_str(),
                status: l.status,
            })
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gazegraph=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Layout {
            input,
            algorithm,
            settings,
        } => layout(&input, algorithm, settings.as_deref()),
        Commands::Simulate {
            input,
            algorithm,
            rank,
            duration_ms,
            settings,
        } => simulate(&input, algorithm, rank, duration_ms, settings.as_deref()),
    }
}
