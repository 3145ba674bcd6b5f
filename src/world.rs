//! The world: every component behind one owner
//!
//! [`WorldState`] owns the graph, the scene, the layout engine, the camera
//! and the gaze and transition controllers. Hosts drive it with
//! [`WorldState::tick`] once per animation frame and may call
//! [`WorldState::select`] directly for pointer clicks; a gaze fuse goes
//! through the same entry point.
//!
//! Within a tick the order is fixed: finished layouts are applied and
//! committed first, then the camera and panels move, then the transition
//! step runs, and gaze targeting runs last (and only on quiet frames).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::camera::GazeCamera;
use crate::dataset::Dataset;
use crate::events::{EventSink, InteractionEvent, InteractionKind};
use crate::focus::{self, FocusCommand};
use crate::gaze::{GazeStep, GazeTargeting};
use crate::graph::GraphModel;
use crate::layout::{CpuForceSolver, ForceSolver, LayoutEngine, LayoutKind, LayoutOutcome};
use crate::math::ORIGIN;
use crate::scene::{HitTarget, Scene};
use crate::settings::{ColorMap, Settings, Stage};
use crate::transition::{FrameReport, TransitionController};

/// The rig starts this fraction of the stage size behind the origin
const INTRO_DISTANCE: f32 = 0.75;

/// What happened during one tick
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickReport {
    /// A force layout finished on this tick
    pub layout: Option<LayoutOutcome>,
    pub frame: FrameReport,
    /// `None` while nodes are moving and gaze is paused
    pub gaze: Option<GazeStep>,
}

pub struct WorldState {
    settings: Settings,
    stage: Stage,
    color_map: ColorMap,
    graph: GraphModel,
    scene: Scene,
    layout: LayoutEngine,
    camera: GazeCamera,
    gaze: GazeTargeting,
    transition: TransitionController,
    sink: Option<Box<dyn EventSink>>,
}

impl WorldState {
    pub fn new(dataset: &Dataset, settings: Settings) -> Self {
        Self::with_solver(dataset, settings, Arc::new(CpuForceSolver::default()))
    }

    /// Build the world with a custom force solver.
    ///
    /// The graph is laid out as a spiral straight away and the intro
    /// overlay is showing.
    pub fn with_solver(
        dataset: &Dataset,
        settings: Settings,
        solver: Arc<dyn ForceSolver>,
    ) -> Self {
        let stage = settings.stage();
        let color_map = ColorMap::from_settings(&settings, &dataset.categories);
        let mut graph = GraphModel::from_dataset(dataset, &color_map);
        let mut layout = LayoutEngine::with_solver(stage, solver);
        layout.request(LayoutKind::Spiral, &mut graph);

        let camera = GazeCamera::new([0.0, 0.0, INTRO_DISTANCE * stage.size], stage.user_height);
        let mut scene = Scene::build(&graph);
        scene.buttons.set_active(layout.active());
        scene.place_panels(camera.rig, stage.size);

        let mut transition = TransitionController::new(&stage);
        transition.expect_settle();

        Self {
            gaze: GazeTargeting::new(settings.fuse_duration(), stage.size),
            settings,
            stage,
            color_map,
            graph,
            scene,
            layout,
            camera,
            transition,
            sink: None,
        }
    }

    /// Receive acquire and fuse notifications
    pub fn set_event_sink(&mut self, sink: impl EventSink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    /// Replace the dataset, keeping camera and intro state.
    ///
    /// Any running simulation is abandoned and the new graph starts out as
    /// a spiral.
    pub fn update_data(&mut self, dataset: &Dataset) {
        self.release_gaze();
        self.color_map = ColorMap::from_settings(&self.settings, &dataset.categories);
        self.graph = GraphModel::from_dataset(dataset, &self.color_map);
        self.layout.invalidate();
        self.layout.request(LayoutKind::Spiral, &mut self.graph);

        let intro = std::mem::take(&mut self.scene.intro);
        self.scene = Scene::build(&self.graph);
        self.scene.intro = intro;
        self.scene.buttons.set_active(self.layout.active());
        self.scene.place_panels(self.camera.rig, self.stage.size);
        self.transition.expect_settle();
        info!(
            nodes = self.graph.nodes().len(),
            links = self.graph.links().len(),
            "dataset replaced"
        );
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn color_map(&self) -> &ColorMap {
        &self.color_map
    }

    pub fn graph(&self) -> &GraphModel {
        &self.graph
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    pub fn camera(&self) -> &GazeCamera {
        &self.camera
    }

    /// Head tracking writes orientation here
    pub fn camera_mut(&mut self) -> &mut GazeCamera {
        &mut self.camera
    }

    pub fn gaze(&self) -> &GazeTargeting {
        &self.gaze
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_transitioning()
    }

    /// Advance one animation frame of `dt` wall-clock time
    pub fn tick(&mut self, dt: Duration) -> TickReport {
        let layout = self.layout.poll(&mut self.graph);
        if let Some(outcome) = &layout {
            self.after_layout(outcome);
        }

        self.camera.update_animation();
        self.scene.place_panels(self.camera.rig, self.stage.size);

        let frame = self
            .transition
            .step(&mut self.scene, &self.graph, self.camera.eye());
        if frame.settled {
            self.scene.buttons.show_buttons();
        }

        let gaze = if frame.transitioning {
            self.gaze.reset_timer();
            None
        } else {
            let hits = self.scene.intersect(&self.camera.ray());
            let scene = &self.scene;
            let step = self.gaze.update(&hits, dt, |target| scene.is_valid(target));
            self.apply_gaze(step);
            Some(step)
        };

        TickReport {
            layout,
            frame,
            gaze,
        }
    }

    /// Carry out the action behind `target`
    pub fn select(&mut self, target: HitTarget) {
        match focus::decide(target) {
            FocusCommand::Focus(index) => {
                if focus::focus_node(&mut self.graph, index, &self.stage) {
                    self.scene.update_network(&self.graph);
                    self.transition.expect_settle();
                }
            }
            FocusCommand::Layout(kind) => {
                self.prepare_layout_change();
                let outcome = self.layout.request(kind, &mut self.graph);
                self.after_layout(&outcome);
            }
            FocusCommand::Reset => {
                self.prepare_layout_change();
                if !self.layout.restore_baseline(&mut self.graph) {
                    debug!("no baseline to restore");
                }
                self.scene.update_network(&self.graph);
                self.scene.buttons.set_active(self.layout.active());
                self.transition.expect_settle();
            }
            FocusCommand::ShowIntro => {
                self.release_gaze();
                self.scene.intro.open();
            }
            FocusCommand::DismissIntro => {
                self.release_gaze();
                if self.scene.intro.dismiss() {
                    self.camera.move_rig_to(ORIGIN);
                    let outcome = self.layout.request(LayoutKind::Spiral, &mut self.graph);
                    self.after_layout(&outcome);
                }
            }
        }
    }

    /// Block until the running simulation finishes and apply it
    pub fn wait_for_layout(&mut self, timeout: Duration) -> Option<LayoutOutcome> {
        let outcome = self.layout.wait(&mut self.graph, timeout)?;
        self.after_layout(&outcome);
        Some(outcome)
    }

    /// Tick until nothing moves and no layout is pending.
    ///
    /// Returns the number of ticks run, or `None` if the world was still
    /// busy after `max_frames`.
    pub fn settle(&mut self, max_frames: usize, dt: Duration) -> Option<usize> {
        for frame in 1..=max_frames {
            let report = self.tick(dt);
            let busy = report.frame.transitioning
                || self.layout.is_pending()
                || self.camera.is_animating;
            if !busy {
                return Some(frame);
            }
        }
        None
    }

    fn after_layout(&mut self, outcome: &LayoutOutcome) {
        match outcome {
            LayoutOutcome::Committed(kind) => {
                self.scene.update_network(&self.graph);
                self.scene.buttons.set_active(Some(*kind));
                self.transition.expect_settle();
            }
            LayoutOutcome::Failed(_) => self.transition.expect_settle(),
            LayoutOutcome::Pending { .. } => {}
        }
    }

    /// Button press housekeeping before a layout change or reset
    fn prepare_layout_change(&mut self) {
        self.scene.buttons.show_working();
        self.scene.buttons.clear_hover();
        self.gaze.reset_timer();
        self.graph.set_link_statuses(None);
        self.scene.reset_links();
    }

    fn apply_gaze(&mut self, step: GazeStep) {
        if let Some(dropped) = step.dropped {
            self.release(dropped);
        }
        if let Some(acquired) = step.acquired {
            if let Some(previous) = acquired.previous {
                self.release(previous);
            }
            self.engage(acquired.target, acquired.distance);
            self.emit(InteractionKind::Acquire, acquired.target);
        }
        if step.idle {
            self.scene.buttons.clear_hover();
        } else if step.fused.is_none() {
            // a panel reset or an idle frame may have dropped the hover
            if let Some(HitTarget::Button(action)) = self.gaze.current() {
                self.scene.buttons.hover(action);
            }
        }
        if let Some(target) = step.fused {
            info!(hit = ?target, "gaze fused");
            self.emit(InteractionKind::Fuse, target);
            self.select(target);
        }
    }

    /// Provisional highlight for a newly acquired target
    fn engage(&mut self, target: HitTarget, distance: f32) {
        match target {
            HitTarget::Node(index) => {
                let scale = (distance / 2.0).ceil().max(1.0);
                if let Some(node) = self.scene.nodes_mut().get_mut(index) {
                    node.highlight(scale);
                }
                self.graph.set_link_statuses(Some(index));
                self.scene.sync_link_materials(&self.graph);
            }
            HitTarget::Button(action) => self.scene.buttons.hover(action),
            HitTarget::Intro(_) => {}
        }
    }

    /// Undo the provisional highlight of a target the gaze left
    fn release(&mut self, target: HitTarget) {
        match target {
            HitTarget::Node(index) => {
                if let Some(node) = self.scene.nodes_mut().get_mut(index) {
                    node.clear_highlight();
                }
                self.graph.set_link_statuses(self.graph.center());
                self.scene.sync_link_materials(&self.graph);
            }
            HitTarget::Button(_) => self.scene.buttons.clear_hover(),
            HitTarget::Intro(_) => {}
        }
    }

    fn release_gaze(&mut self) {
        if let Some(target) = self.gaze.clear() {
            self.release(target);
        }
    }

    fn emit(&mut self, kind: InteractionKind, target: HitTarget) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let label = match target {
            HitTarget::Node(index) => self
                .graph
                .nodes()
                .get(index)
                .map(|n| n.name.clone())
                .unwrap_or_default(),
            HitTarget::Button(action) => action.label().to_string(),
            HitTarget::Intro(control) => control.label().to_string(),
        };
        sink.emit(&InteractionEvent {
            kind,
            target: target.kind_name(),
            label,
        });
    }
}

impl fmt::Debug for WorldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldState")
            .field("nodes", &self.graph.nodes().len())
            .field("links", &self.graph.links().len())
            .field("layout", &self.layout)
            .field("camera", &self.camera)
            .field("gaze", &self.gaze)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::dataset::{NodeId, RawLink, RawNode};
    use crate::events::EventLog;
    use crate::graph::NodeStatus;
    use crate::scene::{ButtonAction, HOVER_OPACITY, IntroControl, NodeMaterial};

    const FRAME: Duration = Duration::from_millis(16);

    fn dataset() -> Dataset {
        let node = |id: u64, rank: i64| RawNode {
            id: NodeId::from(id),
            name: Some(format!("Node {id}")),
            rank,
            category: None,
        };
        let link = |source: u64, target: u64| RawLink {
            source: NodeId::from(source),
            target: NodeId::from(target),
            value: 10.0,
        };
        Dataset {
            nodes: (1..=6).map(|i| node(i, i as i64)).collect(),
            links: vec![link(1, 2), link(1, 3), link(2, 4), link(5, 1), link(6, 5)],
            categories: Vec::new(),
        }
    }

    /// World past the intro, settled, looking at the sky
    fn explored_world() -> WorldState {
        let mut world = WorldState::new(&dataset(), Settings::default());
        world.select(HitTarget::Intro(IntroControl::GotIt));
        world.camera_mut().set_orientation(0.0, 1.4);
        world.settle(1000, FRAME).unwrap();
        world
    }

    fn look_at_node(world: &mut WorldState, index: usize) {
        let pos = world.scene().nodes()[index].position;
        world.camera_mut().look_at(pos);
    }

    #[test]
    fn starts_with_intro_and_spiral() {
        let world = WorldState::new(&dataset(), Settings::default());

        assert!(world.scene().intro.active);
        assert_eq!(world.layout().active(), Some(LayoutKind::Spiral));
        assert_eq!(world.camera().rig, [0.0, 0.0, 7.5]);
        assert!(world.layout().baseline().is_some());
    }

    #[test]
    fn gazing_at_intro_control_dismisses_it() {
        let mut world = WorldState::new(&dataset(), Settings::default());
        let (_, quad) = world.scene().intro.controls()[0];
        world.camera_mut().look_at(quad.center);

        let mut fused = false;
        for _ in 0..200 {
            let report = world.tick(FRAME);
            if report.gaze.and_then(|g| g.fused).is_some() {
                fused = true;
                break;
            }
        }

        assert!(fused);
        assert!(!world.scene().intro.active);
        assert!(world.camera().is_animating);
    }

    #[test]
    fn nodes_are_not_targets_during_intro() {
        let mut world = WorldState::new(&dataset(), Settings::default());
        look_at_node(&mut world, 0);

        let report = world.tick(FRAME);

        assert!(report.gaze.unwrap().acquired.is_none());
    }

    #[test]
    fn acquiring_a_node_highlights_it_and_its_links() {
        let mut world = explored_world();
        look_at_node(&mut world, 0);

        let step = world.tick(FRAME).gaze.unwrap();

        assert_eq!(step.acquired.unwrap().target, HitTarget::Node(0));
        let node = &world.scene().nodes()[0];
        assert_eq!(node.material, NodeMaterial::Highlight);
        assert!(node.target_scale >= 1.0);
        assert_eq!(world.graph().center(), None);
        assert!(world.graph().links().iter().filter(|l| l.touches(0)).all(|l| {
            l.status != crate::graph::LinkStatus::None
        }));
    }

    #[test]
    fn fuse_focuses_node_and_reports_events() {
        let mut world = explored_world();
        let log = Rc::new(RefCell::new(EventLog::default()));
        let sink = Rc::clone(&log);
        world.set_event_sink(move |event: &InteractionEvent| sink.borrow_mut().emit(event));
        look_at_node(&mut world, 0);

        let mut fused = None;
        for _ in 0..200 {
            if let Some(target) = world.tick(FRAME).gaze.and_then(|g| g.fused) {
                fused = Some(target);
                break;
            }
        }

        assert_eq!(fused, Some(HitTarget::Node(0)));
        assert_eq!(world.graph().center(), Some(0));
        assert_eq!(world.graph().nodes()[1].status, NodeStatus::Adjacent);
        let log = log.borrow();
        assert_eq!(log.fuses().count(), 1);
        assert_eq!(log.events()[0].kind, InteractionKind::Acquire);
        assert_eq!(log.events()[0].label, "Node 1");
    }

    fn look_at_button(world: &mut WorldState, action: ButtonAction) {
        let center = world.scene().buttons.button(action).unwrap().quad.center;
        world.camera_mut().look_at(center);
    }

    #[test]
    fn looking_away_restores_button_opacity() {
        let mut world = explored_world();
        let resting = world.scene().buttons.button(ButtonAction::Reset).unwrap().opacity;
        look_at_button(&mut world, ButtonAction::Reset);

        let step = world.tick(FRAME).gaze.unwrap();
        assert_eq!(
            step.acquired.map(|a| a.target),
            Some(HitTarget::Button(ButtonAction::Reset))
        );
        assert_eq!(world.scene().buttons.hovered(), Some(ButtonAction::Reset));
        assert_eq!(
            world.scene().buttons.button(ButtonAction::Reset).unwrap().opacity,
            HOVER_OPACITY
        );

        world.camera_mut().set_orientation(0.0, 1.4);
        let fuse_frames = world.gaze().fuse_duration().as_millis() / FRAME.as_millis() + 5;
        for _ in 0..fuse_frames {
            let step = world.tick(FRAME).gaze.unwrap();
            assert!(step.idle);
            assert!(step.fused.is_none());
        }

        assert_eq!(world.scene().buttons.hovered(), None);
        assert_eq!(
            world.scene().buttons.button(ButtonAction::Reset).unwrap().opacity,
            resting
        );
        assert!(world.gaze().timer().is_none());
        assert!(world.gaze().progress().is_empty());
    }

    #[test]
    fn glancing_back_at_a_button_hovers_it_again() {
        let mut world = explored_world();
        look_at_button(&mut world, ButtonAction::Reset);
        world.tick(FRAME);
        world.camera_mut().set_orientation(0.0, 1.4);
        world.tick(FRAME);
        assert_eq!(world.scene().buttons.hovered(), None);

        look_at_button(&mut world, ButtonAction::Reset);
        world.tick(FRAME);

        assert_eq!(world.scene().buttons.hovered(), Some(ButtonAction::Reset));
    }

    #[test]
    fn fused_layout_button_stays_hovered_after_settling() {
        let mut world = explored_world();
        let grid = ButtonAction::Layout(LayoutKind::Grid);
        look_at_button(&mut world, grid);

        let mut fused = false;
        for _ in 0..200 {
            if world.tick(FRAME).gaze.and_then(|g| g.fused) == Some(HitTarget::Button(grid)) {
                fused = true;
                break;
            }
        }
        assert!(fused);
        assert!(world.scene().buttons.is_working());

        let mut settled = false;
        for _ in 0..500 {
            if world.tick(FRAME).frame.settled {
                settled = true;
                break;
            }
        }

        assert!(settled);
        assert_eq!(world.scene().buttons.active(), Some(LayoutKind::Grid));
        assert_eq!(world.scene().buttons.hovered(), Some(grid));
        assert_eq!(world.scene().buttons.button(grid).unwrap().opacity, HOVER_OPACITY);
    }

    #[test]
    fn gaze_pauses_while_nodes_move() {
        let mut world = explored_world();
        world.select(HitTarget::Node(2));

        let report = world.tick(FRAME);

        assert!(report.frame.transitioning);
        assert!(report.gaze.is_none());
        assert!(world.scene().links().iter().all(|l| !l.visible));
    }

    #[test]
    fn layout_button_hides_panel_until_settled() {
        let mut world = explored_world();
        assert!(world.scene().buttons.is_visible(ButtonAction::Reset));

        world.select(HitTarget::Button(ButtonAction::Layout(LayoutKind::Grid)));

        assert!(world.scene().buttons.is_working());
        assert!(!world.scene().buttons.is_visible(ButtonAction::Reset));
        assert_eq!(world.layout().active(), Some(LayoutKind::Grid));

        let mut settled = false;
        for _ in 0..500 {
            if world.tick(FRAME).frame.settled {
                settled = true;
                break;
            }
        }
        assert!(settled);
        assert!(!world.scene().buttons.is_working());
        assert_eq!(world.scene().buttons.active(), Some(LayoutKind::Grid));
    }

    #[test]
    fn reset_restores_the_committed_layout() {
        let mut world = explored_world();
        let baseline: Vec<_> = world.graph().nodes().iter().map(|n| n.pos).collect();
        world.select(HitTarget::Node(0));
        assert_eq!(world.graph().center(), Some(0));

        world.select(HitTarget::Button(ButtonAction::Reset));

        let restored: Vec<_> = world.graph().nodes().iter().map(|n| n.pos).collect();
        assert_eq!(restored, baseline);
        assert_eq!(world.graph().center(), None);
        assert!(world.graph().nodes().iter().all(|n| !n.shifted));
    }

    #[test]
    fn info_button_reopens_intro_without_second_zoom() {
        let mut world = explored_world();
        world.select(HitTarget::Button(ButtonAction::Info));
        assert!(world.scene().intro.active);

        world.select(HitTarget::Intro(IntroControl::Explore));

        assert!(!world.scene().intro.active);
        assert!(!world.camera().is_animating);
    }

    #[test]
    fn simulation_layout_applies_after_wait() {
        let mut world = explored_world();
        world.select(HitTarget::Button(ButtonAction::Layout(LayoutKind::Simulation)));
        assert!(world.layout().is_pending());

        let outcome = world.wait_for_layout(Duration::from_secs(30));

        assert_eq!(outcome, Some(LayoutOutcome::Committed(LayoutKind::Simulation)));
        assert_eq!(world.scene().buttons.active(), Some(LayoutKind::Simulation));
        world.settle(1000, FRAME).unwrap();
        for (view, node) in world.scene().nodes().iter().zip(world.graph().nodes()) {
            assert!(crate::math::distance(view.position, node.pos) <= 0.01);
        }
    }

    #[test]
    fn update_data_rebuilds_everything() {
        let mut world = explored_world();
        world.select(HitTarget::Node(0));
        let mut smaller = dataset();
        smaller.links.truncate(2);

        world.update_data(&smaller);

        assert_eq!(world.graph().nodes().len(), 3);
        assert_eq!(world.scene().nodes().len(), 3);
        assert_eq!(world.graph().center(), None);
        assert!(!world.scene().intro.active);
    }

    #[test]
    fn at_most_one_center_across_interactions() {
        let mut world = explored_world();
        for index in [0, 3, 1, 0] {
            world.select(HitTarget::Node(index));
            for _ in 0..20 {
                world.tick(FRAME);
                let centers = world
                    .graph()
                    .nodes()
                    .iter()
                    .filter(|n| n.status == NodeStatus::Center)
                    .count();
                assert!(centers <= 1);
            }
        }
    }
}
