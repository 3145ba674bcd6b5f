//! End-to-end interaction scenario driven through `WorldState`.
//!
//! A 50 node / 80 link graph is laid out as a grid, the user gazes at the
//! rank 1 node for the fuse duration, and the focus statuses are checked.

use std::collections::HashSet;
use std::time::Duration;

use gazegraph::dataset::{NodeId, RawLink, RawNode};
use gazegraph::graph::{GraphModel, LinkStatus, NodeStatus};
use gazegraph::scene::{ButtonAction, HitTarget, IntroControl};
use gazegraph::{Dataset, LayoutKind, Settings, WorldState};

const FRAME: Duration = Duration::from_millis(16);

/// Ring of 50 nodes plus 30 chords
fn dataset() -> Dataset {
    let nodes = (0..50u64)
        .map(|i| RawNode {
            id: NodeId::from(i + 100),
            name: Some(format!("Entity {i}")),
            rank: i as i64 + 1,
            category: None,
        })
        .collect();

    let mut pairs = Vec::new();
    let mut seen = HashSet::new();
    for i in 0..50u64 {
        let pair = (i, (i + 1) % 50);
        seen.insert(pair);
        pairs.push(pair);
    }
    let mut step = 0u64;
    while pairs.len() < 80 {
        let source = (step * 7 + 3) % 50;
        let target = (step * 13 + 11) % 50;
        step += 1;
        if source != target && seen.insert((source, target)) {
            pairs.push((source, target));
        }
    }

    let links = pairs
        .into_iter()
        .map(|(s, t)| RawLink {
            source: NodeId::from(s + 100),
            target: NodeId::from(t + 100),
            value: ((s * t) % 100) as f32 + 1.0,
        })
        .collect();

    Dataset {
        nodes,
        links,
        categories: Vec::new(),
    }
}

fn center_count(graph: &GraphModel) -> usize {
    graph
        .nodes()
        .iter()
        .filter(|n| n.status == NodeStatus::Center)
        .count()
}

fn tick_checked(world: &mut WorldState) -> gazegraph::world::TickReport {
    let report = world.tick(FRAME);
    assert!(center_count(world.graph()) <= 1, "more than one focused node");
    report
}

#[test]
fn gaze_fuse_on_rank_one_focuses_it() {
    let settings = Settings::default();
    let fuse = settings.fuse_duration();
    let mut world = WorldState::new(&dataset(), settings);
    assert_eq!(world.graph().nodes().len(), 50);
    assert_eq!(world.graph().links().len(), 80);

    // leave the intro and let the zoom finish while looking at the sky
    world.select(HitTarget::Intro(IntroControl::GotIt));
    world.camera_mut().set_orientation(0.0, 1.4);
    world.settle(2000, FRAME).expect("intro settles");

    world.select(HitTarget::Button(ButtonAction::Layout(LayoutKind::Grid)));
    assert_eq!(world.layout().active(), Some(LayoutKind::Grid));
    world.settle(2000, FRAME).expect("grid settles");

    let index = world.graph().index_of_rank(1).unwrap();
    let target = world.scene().nodes()[index].position;
    world.camera_mut().look_at(target);

    let first = tick_checked(&mut world).gaze.expect("gaze runs on quiet frames");
    assert_eq!(first.acquired.map(|a| a.target), Some(HitTarget::Node(index)));

    let mut held = Duration::ZERO;
    let mut fused = false;
    while held < fuse + FRAME * 4 {
        let report = tick_checked(&mut world);
        held += FRAME;
        if let Some(gaze) = report.gaze {
            if gaze.fused.is_some() {
                assert_eq!(gaze.fused, Some(HitTarget::Node(index)));
                fused = true;
                break;
            }
        }
    }
    assert!(fused, "no fuse after {held:?}");
    assert!(held >= fuse);

    let graph = world.graph();
    let neighbors: HashSet<usize> = graph.neighbor_indices(index).into_iter().collect();
    assert!(!neighbors.is_empty());
    for (i, node) in graph.nodes().iter().enumerate() {
        let expected = if i == index {
            NodeStatus::Center
        } else if neighbors.contains(&i) {
            NodeStatus::Adjacent
        } else {
            NodeStatus::None
        };
        assert_eq!(node.status, expected, "node {i}");
    }
    for link in graph.links() {
        if link.touches(index) {
            assert!(matches!(link.status, LinkStatus::In | LinkStatus::Out));
        } else {
            assert_eq!(link.status, LinkStatus::None);
        }
    }

    // the focus transition runs to completion with a single centre throughout
    for _ in 0..300 {
        world.camera_mut().set_orientation(0.0, 1.4);
        tick_checked(&mut world);
    }
    assert_eq!(world.graph().center(), Some(index));
}

#[test]
fn reset_after_focus_returns_to_grid() {
    let mut world = WorldState::new(&dataset(), Settings::default());
    world.select(HitTarget::Intro(IntroControl::GotIt));
    world.camera_mut().set_orientation(0.0, 1.4);
    world.select(HitTarget::Button(ButtonAction::Layout(LayoutKind::Grid)));
    world.settle(2000, FRAME).expect("grid settles");
    let grid: Vec<_> = world.graph().nodes().iter().map(|n| n.pos).collect();

    world.select(HitTarget::Node(0));
    world.settle(2000, FRAME).expect("focus settles");
    world.select(HitTarget::Button(ButtonAction::Reset));
    world.settle(2000, FRAME).expect("reset settles");

    let restored: Vec<_> = world.graph().nodes().iter().map(|n| n.pos).collect();
    assert_eq!(restored, grid);
    assert_eq!(world.graph().center(), None);
    for (view, pos) in world.scene().nodes().iter().zip(&grid) {
        assert!(gazegraph::math::distance(view.position, *pos) <= 0.01);
    }
    assert!(world.scene().buttons.is_visible(ButtonAction::Reset));
}
