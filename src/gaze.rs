//! Gaze targeting: eligibility, sticky retention and the dwell/fuse timer
//!
//! [`GazeTargeting::update`] runs once per frame with the ray intersections
//! of that frame. It decides the target and advances the dwell timer but
//! performs no side effects itself; the caller applies highlights and runs
//! the fused action from the returned [`GazeStep`].
//!
//! Retention rule: while the current target is still under the ray it is
//! kept, even if something else is now nearer. A new target is picked
//! only once the ray has left the current one.

use std::f32::consts::TAU;
use std::time::Duration;

use tracing::debug;

use crate::scene::{HitKind, HitTarget, Intersection};

/// Cursor fill state: arc start and sweep in radians
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressRing {
    pub theta_start: f32,
    pub theta_length: f32,
}

impl ProgressRing {
    pub const EMPTY: ProgressRing = ProgressRing {
        theta_start: 0.0,
        theta_length: 0.0,
    };

    /// Ring filled to `fraction` of a full turn
    pub fn filled(fraction: f32) -> Self {
        let sweep = TAU * fraction.clamp(0.0, 1.0);
        Self {
            theta_start: -sweep,
            theta_length: sweep,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.theta_length == 0.0
    }
}

/// A newly acquired target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acquisition {
    pub target: HitTarget,
    /// Target that lost focus to this one
    pub previous: Option<HitTarget>,
    pub distance: f32,
}

/// What happened during one gaze update
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GazeStep {
    /// The previous target vanished from the candidate set
    pub dropped: Option<HitTarget>,
    pub acquired: Option<Acquisition>,
    /// Dwell completed on this target
    pub fused: Option<HitTarget>,
    /// Nothing eligible was under the ray
    pub idle: bool,
}

#[derive(Debug, Clone)]
pub struct GazeTargeting {
    current: Option<HitTarget>,
    timer: Option<Duration>,
    fuse_duration: Duration,
    /// Labels nearer than this cannot take the gaze
    text_threshold: f32,
    progress: ProgressRing,
}

impl GazeTargeting {
    pub fn new(fuse_duration: Duration, stage_size: f32) -> Self {
        Self {
            current: None,
            timer: None,
            fuse_duration,
            text_threshold: stage_size / 2.0,
            progress: ProgressRing::EMPTY,
        }
    }

    pub fn current(&self) -> Option<HitTarget> {
        self.current
    }

    /// Dwell time on the current target, `None` when not counting
    pub fn timer(&self) -> Option<Duration> {
        self.timer
    }

    pub fn fuse_duration(&self) -> Duration {
        self.fuse_duration
    }

    pub fn progress(&self) -> ProgressRing {
        self.progress
    }

    /// Whether a hit may take or keep the gaze
    pub fn is_eligible(&self, hit: &Intersection) -> bool {
        match hit.kind {
            HitKind::Sphere | HitKind::Button => true,
            HitKind::Text => hit.distance > self.text_threshold,
        }
    }

    /// Stop counting and empty the progress ring
    pub fn reset_timer(&mut self) {
        self.timer = None;
        self.progress = ProgressRing::EMPTY;
    }

    /// Forget the current target entirely
    pub fn clear(&mut self) -> Option<HitTarget> {
        self.reset_timer();
        self.current.take()
    }

    /// Advance one frame.
    ///
    /// `hits` must be sorted nearest first. `is_valid` reports whether a
    /// target still exists; a stale current target is dropped before
    /// anything else happens.
    pub fn update(
        &mut self,
        hits: &[Intersection],
        dt: Duration,
        is_valid: impl Fn(&HitTarget) -> bool,
    ) -> GazeStep {
        let mut step = GazeStep::default();

        if self.current.is_some_and(|current| !is_valid(&current)) {
            debug!(hit = ?self.current, "dropping stale gaze target");
            step.dropped = self.clear();
        }

        let eligible: Vec<&Intersection> = hits
            .iter()
            .filter(|h| self.is_eligible(h) && is_valid(&h.target))
            .collect();

        if eligible.is_empty() {
            self.reset_timer();
            step.idle = true;
            return step;
        }

        // A label hit alone never keeps the dwell timer running
        let found_current = eligible
            .iter()
            .any(|h| Some(h.target) == self.current && h.kind != HitKind::Text);

        if !found_current {
            let next = eligible.iter().find(|h| Some(h.target) != self.current);
            match next {
                Some(hit) => {
                    let previous = self.current.replace(hit.target);
                    self.timer = Some(Duration::ZERO);
                    self.progress = ProgressRing::EMPTY;
                    debug!(hit = ?hit.target, distance = hit.distance, "gaze acquired");
                    step.acquired = Some(Acquisition {
                        target: hit.target,
                        previous,
                        distance: hit.distance,
                    });
                }
                None => self.reset_timer(),
            }
            return step;
        }

        let elapsed = match self.timer {
            Some(timer) => timer.saturating_add(dt),
            None => Duration::ZERO,
        };

        if elapsed >= self.fuse_duration {
            step.fused = self.current;
            self.reset_timer();
        } else {
            self.timer = Some(elapsed);
            self.progress = ProgressRing::filled(self.fraction(elapsed));
        }
        step
    }

    fn fraction(&self, elapsed: Duration) -> f32 {
        if self.fuse_duration.is_zero() {
            1.0
        } else {
            elapsed.as_secs_f32() / self.fuse_duration.as_secs_f32()
        }
    }
}
