//! Head camera and user rig
//!
//! The rig is where the user stands; the camera sits at eye height above it
//! and is steered by head orientation (yaw and pitch). The gaze ray always
//! leaves the centre of the view. The rig can be animated toward a new spot
//! with the same per-frame easing used for graph transitions.

use crate::math::{Ray, Vec3, add, length, lerp, sub};

/// Fraction of the remaining distance the rig covers per frame
const RIG_LERP: f32 = 0.05;
const RIG_EPSILON: f32 = 0.001;
/// Keeps the view direction away from straight up or down
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

#[derive(Debug, Clone)]
pub struct GazeCamera {
    /// Rig (floor) position in world space
    pub rig: Vec3,
    /// Eye height above the rig
    pub eye_height: f32,
    /// Rotation about Y in radians; 0 looks down -Z
    pub yaw: f32,
    /// Elevation in radians; positive looks up
    pub pitch: f32,

    target_rig: Vec3,

    /// Whether the rig is still moving toward its target
    pub is_animating: bool,
}

impl GazeCamera {
    pub fn new(rig: Vec3, eye_height: f32) -> Self {
        Self {
            rig,
            eye_height,
            yaw: 0.0,
            pitch: 0.0,
            target_rig: rig,
            is_animating: false,
        }
    }

    /// Eye position in world space
    pub fn eye(&self) -> Vec3 {
        add(self.rig, [0.0, self.eye_height, 0.0])
    }

    /// Unit view direction
    pub fn forward(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        [-sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch]
    }

    /// Ray through the centre of the view
    pub fn ray(&self) -> Ray {
        Ray::new(self.eye(), self.forward())
    }

    pub fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Turn the head by the given deltas
    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.set_orientation(self.yaw + delta_yaw, self.pitch + delta_pitch);
    }

    /// Orient the head so the view centre passes through `point`
    pub fn look_at(&mut self, point: Vec3) {
        let d = sub(point, self.eye());
        let len = length(d);
        if len <= f32::EPSILON {
            return;
        }
        let yaw = (-d[0]).atan2(-d[2]);
        let pitch = (d[1] / len).asin();
        self.set_orientation(yaw, pitch);
    }

    /// Start easing the rig toward `target`
    pub fn move_rig_to(&mut self, target: Vec3) {
        self.target_rig = target;
        self.is_animating = true;
    }

    /// Ease the rig one frame toward its target.
    ///
    /// Axes within reach snap onto the target; false once the rig has arrived.
    pub fn update_animation(&mut self) -> bool {
        let mut moving = false;
        for (axis, target) in self.rig.iter_mut().zip(self.target_rig) {
            if (*axis - target).abs() > RIG_EPSILON {
                *axis = lerp(*axis, target, RIG_LERP);
                moving = true;
            } else {
                *axis = target;
            }
        }
        self.is_animating = moving;
        moving
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{ORIGIN, dot, normalize};

    fn approx(a: Vec3, b: Vec3) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    #[test]
    fn default_orientation_looks_down_negative_z() {
        let camera = GazeCamera::new(ORIGIN, 1.6);
        assert!(approx(camera.forward(), [0.0, 0.0, -1.0]));
        assert_eq!(camera.eye(), [0.0, 1.6, 0.0]);
    }

    #[test]
    fn look_at_points_the_ray_at_target() {
        let mut camera = GazeCamera::new([0.0, 0.0, 7.5], 1.6);
        for target in [[-4.5, 2.8, -5.0], [3.0, 0.5, 9.0], [0.0, 4.0, 7.4]] {
            camera.look_at(target);
            let expected = normalize(sub(target, camera.eye()));
            assert!(
                dot(camera.forward(), expected) > 0.9999,
                "missed {target:?}"
            );
        }
    }

    #[test]
    fn forward_is_unit_length() {
        let mut camera = GazeCamera::new(ORIGIN, 1.6);
        camera.set_orientation(1.2, -0.7);
        assert!((length(camera.forward()) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = GazeCamera::new(ORIGIN, 1.6);
        camera.rotate(0.0, 10.0);
        assert!(camera.pitch < std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn rig_eases_to_target() {
        let mut camera = GazeCamera::new([0.0, 0.0, 7.5], 1.6);
        camera.move_rig_to(ORIGIN);

        assert!(camera.update_animation());
        assert!((camera.rig[2] - 7.5 * 0.95).abs() < 1e-4);

        let mut frames = 1;
        while camera.update_animation() {
            frames += 1;
            assert!(frames < 1000);
        }
        assert_eq!(camera.rig, ORIGIN);
        assert!(!camera.is_animating);
    }
}
