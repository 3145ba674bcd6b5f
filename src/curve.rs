//! Curved link geometry
//!
//! Links are drawn as quadratic Bézier arcs whose control point sits
//! straight above the chord midpoint. The same endpoints always give the
//! same geometry.

use crate::math::{Domain, Vec3, add, lerp3, scale, to_range};

/// Segments per curve; the tessellation has one more vertex than this
pub const SEGMENTS: usize = 18;

const VALUE_DOMAIN: Domain = Domain::new(1.0, 100.0);
const THICKNESS_RANGE: Domain = Domain::new(1.0, 3.0);

/// Line thickness for a link value
pub fn thickness(value: f32) -> f32 {
    to_range(value, VALUE_DOMAIN, THICKNESS_RANGE)
}

/// Control point: the chord midpoint raised by `lift`
pub fn control_point(start: Vec3, end: Vec3, lift: f32) -> Vec3 {
    let mid = lerp3(start, end, 0.5);
    [mid[0], mid[1] + lift, mid[2]]
}

/// Point on the quadratic Bézier `start, control, end` at `t` in `[0, 1]`
pub fn quadratic_point(start: Vec3, control: Vec3, end: Vec3, t: f32) -> Vec3 {
    let u = 1.0 - t;
    add(
        add(scale(start, u * u), scale(control, 2.0 * u * t)),
        scale(end, t * t),
    )
}

/// Tessellated geometry for one link
#[derive(Debug, Clone, PartialEq)]
pub struct LinkCurve {
    points: Vec<Vec3>,
    thickness: f32,
}

impl LinkCurve {
    /// Build the arc between `start` and `end`.
    ///
    /// `lift` raises the control point above the chord.
    pub fn build(start: Vec3, end: Vec3, value: f32, lift: f32) -> Self {
        let control = control_point(start, end, lift);
        let points = (0..=SEGMENTS)
            .map(|i| quadratic_point(start, control, end, i as f32 / SEGMENTS as f32))
            .collect();
        Self {
            points,
            thickness: thickness(value),
        }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn thickness(&self) -> f32 {
        self.thickness
    }

    pub fn start(&self) -> Option<Vec3> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Vec3> {
        self.points.last().copied()
    }
}
