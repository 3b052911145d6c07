//! Camera space to screen space

use super::math::{round_half_up, Vec3};
use super::types::{ProjectionSettings, Vertex};

/// Pinhole projector. The camera looks down -Z, screen Y grows downwards.
///
/// The returned point keeps the camera-space z so the rasterizer can
/// interpolate its reciprocal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    pub settings: ProjectionSettings,
    pub snap: bool,
}

impl Projector {
    pub fn new(settings: ProjectionSettings, snap: bool) -> Self {
        Self { settings, snap }
    }

    pub fn project(&self, p: Vec3) -> Vec3 {
        let s = &self.settings;
        let depth = -p.z;
        let mut x = s.center_x + s.focal_x * p.x / depth;
        let mut y = s.center_y - s.focal_y * p.y / depth;
        if self.snap {
            x = round_half_up(x);
            y = round_half_up(y);
        }
        Vec3::new(x, y, p.z)
    }

    pub fn project_vertex(&self, v: Vertex) -> Vertex {
        Vertex::new(self.project(v.pos), v.uv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projector(snap: bool) -> Projector {
        Projector::new(ProjectionSettings::default(), snap)
    }

    #[test]
    fn test_axis_point_lands_on_center() {
        let p = projector(false).project(Vec3::new(0.0, 0.0, -5.0));
        assert_eq!((p.x, p.y, p.z), (160.0, 100.0, -5.0));
    }

    #[test]
    fn test_y_up_maps_to_screen_up() {
        let p = projector(false).project(Vec3::new(1.0, 1.0, -2.0));
        assert!((p.x - (160.0 + 96.0)).abs() < 1e-4);
        assert!(p.y < 100.0);
    }

    #[test]
    fn test_snap_rounds_to_pixels() {
        let p = projector(true).project(Vec3::new(0.01, 0.0, -3.0));
        assert_eq!(p.x, p.x.floor());
        assert_eq!(p.x, 161.0);
    }
}
