//! Layout buttons and the intro overlay
//!
//! Both are flat panels anchored to the user rig so they follow the user
//! through the intro zoom. Their hit regions are recomputed by `place`.

use std::f32::consts::FRAC_1_SQRT_2;

use serde::Serialize;

use crate::layout::LayoutKind;
use crate::math::{Quad, Ray, Vec3, add, scale};

use super::{HitKind, HitTarget, Intersection};

pub const ACTIVE_OPACITY: f32 = 0.2;
pub const INACTIVE_OPACITY: f32 = 0.1;
pub const HOVER_OPACITY: f32 = 0.5;

/// Panel origin relative to the rig (right, low, in front)
const PANEL_OFFSET: Vec3 = [0.45, 0.65, -0.867];
/// Panel axes after tilting 45 degrees back toward the user
const PANEL_RIGHT: Vec3 = [1.0, 0.0, 0.0];
const PANEL_UP: Vec3 = [0.0, FRAC_1_SQRT_2, -FRAC_1_SQRT_2];
const BUTTON_X: f32 = -0.025;
const BUTTON_SPACING: f32 = 0.175;
const BUTTON_HALF_WIDTH: f32 = 0.3;
const BUTTON_HALF_HEIGHT: f32 = 0.075;

/// What a layout panel button does when fused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonAction {
    Layout(LayoutKind),
    Reset,
    /// Re-open the intro overlay
    Info,
}

impl ButtonAction {
    pub fn label(&self) -> &'static str {
        match self {
            ButtonAction::Layout(LayoutKind::Spiral) => "Spiral",
            ButtonAction::Layout(LayoutKind::Grid) => "Grid",
            ButtonAction::Layout(LayoutKind::Simulation) => "Simulation",
            ButtonAction::Reset => "Reset",
            ButtonAction::Info => "Info",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub action: ButtonAction,
    pub quad: Quad,
    pub opacity: f32,
    pub visible: bool,
    row: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Hover {
    action: ButtonAction,
    restore: f32,
}

/// The layout switcher with its "working" indicator
#[derive(Debug, Clone)]
pub struct ButtonPanel {
    buttons: Vec<Button>,
    hover: Option<Hover>,
    active: Option<LayoutKind>,
    working: bool,
}

impl Default for ButtonPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonPanel {
    pub fn new() -> Self {
        let actions = [
            ButtonAction::Layout(LayoutKind::Spiral),
            ButtonAction::Layout(LayoutKind::Grid),
            ButtonAction::Layout(LayoutKind::Simulation),
            ButtonAction::Reset,
            ButtonAction::Info,
        ];
        let buttons = actions
            .into_iter()
            .enumerate()
            .map(|(row, action)| Button {
                action,
                quad: Quad {
                    center: [0.0; 3],
                    right: PANEL_RIGHT,
                    up: PANEL_UP,
                    half_width: BUTTON_HALF_WIDTH,
                    half_height: BUTTON_HALF_HEIGHT,
                },
                opacity: INACTIVE_OPACITY,
                visible: false,
                row,
            })
            .collect();
        let mut panel = Self {
            buttons,
            hover: None,
            active: None,
            working: false,
        };
        panel.place([0.0; 3]);
        panel
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    pub fn button(&self, action: ButtonAction) -> Option<&Button> {
        self.buttons.iter().find(|b| b.action == action)
    }

    fn button_mut(&mut self, action: ButtonAction) -> Option<&mut Button> {
        self.buttons.iter_mut().find(|b| b.action == action)
    }

    /// Whether the "working" indicator is showing
    pub fn is_working(&self) -> bool {
        self.working
    }

    pub fn active(&self) -> Option<LayoutKind> {
        self.active
    }

    pub fn hovered(&self) -> Option<ButtonAction> {
        self.hover.map(|h| h.action)
    }

    /// Re-anchor the hit regions to the rig
    pub fn place(&mut self, rig: Vec3) {
        let origin = add(rig, PANEL_OFFSET);
        for button in &mut self.buttons {
            let local_y = -(button.row as f32) * BUTTON_SPACING;
            button.quad.center = add(
                origin,
                add(scale(PANEL_RIGHT, BUTTON_X), scale(PANEL_UP, local_y)),
            );
        }
    }

    /// Hide the buttons behind the "working" indicator
    pub fn show_working(&mut self) {
        self.working = true;
        for button in &mut self.buttons {
            button.visible = false;
        }
    }

    pub fn show_buttons(&mut self) {
        self.working = false;
        for button in &mut self.buttons {
            button.visible = true;
        }
    }

    /// Mark the layout whose button shows as selected
    pub fn set_active(&mut self, active: Option<LayoutKind>) {
        self.active = active;
        for button in &mut self.buttons {
            let opacity = match button.action {
                ButtonAction::Layout(kind) if Some(kind) == active => ACTIVE_OPACITY,
                _ => INACTIVE_OPACITY,
            };
            button.opacity = opacity;
        }
        if let Some(hover) = &mut self.hover {
            hover.restore = self
                .buttons
                .iter()
                .find(|b| b.action == hover.action)
                .map_or(INACTIVE_OPACITY, |b| b.opacity);
            if let Some(button) = self.buttons.iter_mut().find(|b| b.action == hover.action) {
                button.opacity = HOVER_OPACITY;
            }
        }
    }

    /// Brighten `action`, remembering its current opacity
    pub fn hover(&mut self, action: ButtonAction) {
        if self.hovered() == Some(action) {
            return;
        }
        self.clear_hover();
        if let Some(button) = self.button_mut(action) {
            let restore = button.opacity;
            button.opacity = HOVER_OPACITY;
            self.hover = Some(Hover { action, restore });
        }
    }

    /// Put the hovered button back to its pre-hover opacity
    pub fn clear_hover(&mut self) {
        if let Some(hover) = self.hover.take() {
            if let Some(button) = self.button_mut(hover.action) {
                button.opacity = hover.restore;
            }
        }
    }

    pub fn is_visible(&self, action: ButtonAction) -> bool {
        self.button(action).is_some_and(|b| b.visible)
    }

    pub fn intersect(&self, ray: &Ray, hits: &mut Vec<Intersection>) {
        for button in self.buttons.iter().filter(|b| b.visible) {
            if let Some(distance) = ray.intersect_quad(&button.quad) {
                hits.push(Intersection {
                    target: HitTarget::Button(button.action),
                    kind: HitKind::Button,
                    distance,
                });
            }
        }
    }
}

/// Controls that dismiss the intro overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntroControl {
    GotIt,
    Explore,
}

impl IntroControl {
    pub fn label(&self) -> &'static str {
        match self {
            IntroControl::GotIt => "GOT IT",
            IntroControl::Explore => "Explore",
        }
    }
}

const INTRO_HEIGHT: f32 = 1.5;
const INTRO_HALF_WIDTH: f32 = 1.5;
const INTRO_HALF_HEIGHT: f32 = 0.2;
const INTRO_ROWS: [(IntroControl, f32); 2] =
    [(IntroControl::GotIt, -0.6), (IntroControl::Explore, -1.1)];

/// Onboarding overlay shown before the graph is explored
#[derive(Debug, Clone)]
pub struct IntroOverlay {
    pub active: bool,
    dismissed_once: bool,
    controls: Vec<(IntroControl, Quad)>,
}

impl IntroOverlay {
    pub fn new() -> Self {
        let controls = INTRO_ROWS
            .iter()
            .map(|&(control, _)| {
                (
                    control,
                    Quad {
                        center: [0.0; 3],
                        right: [1.0, 0.0, 0.0],
                        up: [0.0, 1.0, 0.0],
                        half_width: INTRO_HALF_WIDTH,
                        half_height: INTRO_HALF_HEIGHT,
                    },
                )
            })
            .collect();
        Self {
            active: true,
            dismissed_once: false,
            controls,
        }
    }

    pub fn controls(&self) -> &[(IntroControl, Quad)] {
        &self.controls
    }

    /// Anchor the overlay half a stage in front of the rig
    pub fn place(&mut self, rig: Vec3, stage_size: f32) {
        let panel = add(rig, [0.0, INTRO_HEIGHT, -stage_size / 2.0]);
        for ((_, quad), (_, offset)) in self.controls.iter_mut().zip(INTRO_ROWS) {
            quad.center = add(panel, [0.0, offset, 0.0]);
        }
    }

    /// Hide the overlay; true the first time it is dismissed
    pub fn dismiss(&mut self) -> bool {
        self.active = false;
        !std::mem::replace(&mut self.dismissed_once, true)
    }

    pub fn open(&mut self) {
        self.active = true;
    }

    pub fn intersect(&self, ray: &Ray, hits: &mut Vec<Intersection>) {
        if !self.active {
            return;
        }
        for (control, quad) in &self.controls {
            if let Some(distance) = ray.intersect_quad(quad) {
                hits.push(Intersection {
                    target: HitTarget::Intro(*control),
                    kind: HitKind::Button,
                    distance,
                });
            }
        }
    }
}

impl Default for IntroOverlay {
    fn default() -> Self {
        Self::new()
    }
}
