//! Mapping raw solver output into the stage
//!
//! Horizontal axes keep a free band around the user's standing spot; the
//! vertical axis is a plain rescale into a comfortable viewing height.

use crate::math::{BoundingBox3D, Domain, Vec3, to_range, to_range_with_gap};
use crate::settings::Stage;

/// Width of the empty band kept around x = 0 and z = 0
pub const CENTER_GAP: f32 = 1.0;

/// Normalize solver coordinates per axis and map them into world space
pub fn map_to_stage(raw: &[Vec3], stage: &Stage) -> Vec<Vec3> {
    let bounds = BoundingBox3D::from_points(raw.iter());
    let horizontal = Domain::new(-stage.size / 2.0, stage.size / 2.0);
    let vertical = Domain::new(stage.user_height * 0.25, stage.user_height * 2.0);

    raw.iter()
        .map(|p| {
            [
                to_range_with_gap(p[0], bounds.domain(0), horizontal, CENTER_GAP),
                to_range(p[1], bounds.domain(1), vertical),
                to_range_with_gap(p[2], bounds.domain(2), horizontal, CENTER_GAP),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extremes_map_to_stage_edges() {
        let stage = Stage::default();
        let raw = [[-30.0, -10.0, 5.0], [30.0, 10.0, 25.0], [0.0, 0.0, 15.0]];

        let mapped = map_to_stage(&raw, &stage);

        assert_eq!(mapped[0][0], -5.0);
        assert_eq!(mapped[1][0], 5.0);
        assert!((mapped[0][1] - stage.user_height * 0.25).abs() < 1e-5);
        assert!((mapped[1][1] - stage.user_height * 2.0).abs() < 1e-5);
        // midpoint lands on the far side of the gap
        assert!((mapped[2][0] - CENTER_GAP / 2.0).abs() < 1e-5);
        assert!((mapped[2][2] - CENTER_GAP / 2.0).abs() < 1e-5);
    }

    #[test]
    fn no_node_inside_center_gap() {
        let stage = Stage::default();
        let raw: Vec<Vec3> = (0..21)
            .map(|i| {
                let v = i as f32 - 10.0;
                [v, v, -v]
            })
            .collect();

        for p in map_to_stage(&raw, &stage) {
            assert!(p[0].abs() >= CENTER_GAP / 2.0 - 1e-5);
            assert!(p[2].abs() >= CENTER_GAP / 2.0 - 1e-5);
        }
    }

    #[test]
    fn single_point_maps_to_finite_position() {
        let mapped = map_to_stage(&[[3.0, 3.0, 3.0]], &Stage::default());
        assert!(crate::math::is_finite(mapped[0]));
    }
}
