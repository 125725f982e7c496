//! View-frustum extraction and intersection tests.
//!
//! Planes are pulled straight out of the combined view-projection matrix
//! (Gribb/Hartmann extraction) and normalized, so signed distances are in
//! world units and sphere tests can compare against a radius directly.

use nalgebra::Matrix4;

/// Six normalized frustum planes as `[nx, ny, nz, w]`.
///
/// A point is inside a plane when `n . p + w > 0`; the normals point into the
/// frustum.
#[derive(Debug, Clone)]
pub struct Frustum {
    // left, right, bottom, top, near, far
    planes: [[f32; 4]; 6],
}

impl Frustum {
    /// Extracts the frustum from `projection * view`.
    pub fn from_view_projection(vp: &Matrix4<f32>) -> Self {
        let row = |i: usize| [vp[(i, 0)], vp[(i, 1)], vp[(i, 2)], vp[(i, 3)]];
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        let planes = [
            normalize(add(r3, r0)), // left
            normalize(sub(r3, r0)), // right
            normalize(add(r3, r1)), // bottom
            normalize(sub(r3, r1)), // top
            normalize(add(r3, r2)), // near
            normalize(sub(r3, r2)), // far
        ];

        Self { planes }
    }

    /// True if the point lies inside all six planes.
    pub fn contains_point(&self, x: f32, y: f32, z: f32) -> bool {
        self.planes
            .iter()
            .all(|p| p[0] * x + p[1] * y + p[2] * z + p[3] > 0.0)
    }

    /// True if a sphere at `(x, y, z)` with radius `r` touches the frustum.
    pub fn intersects_sphere(&self, x: f32, y: f32, z: f32, r: f32) -> bool {
        self.planes
            .iter()
            .all(|p| p[0] * x + p[1] * y + p[2] * z + p[3] > -r)
    }

    /// True if an axis-aligned cube centered at `(x, y, z)` with half-extent
    /// `size` touches the frustum.
    ///
    /// Conservative: a cube whose corners all fall outside one plane is
    /// rejected, everything else is kept.
    pub fn intersects_cube(&self, x: f32, y: f32, z: f32, size: f32) -> bool {
        for p in &self.planes {
            let mut any_inside = false;
            for corner in 0..8 {
                let cx = if corner & 1 == 0 { x - size } else { x + size };
                let cy = if corner & 2 == 0 { y - size } else { y + size };
                let cz = if corner & 4 == 0 { z - size } else { z + size };
                if p[0] * cx + p[1] * cy + p[2] * cz + p[3] > 0.0 {
                    any_inside = true;
                    break;
                }
            }
            if !any_inside {
                return false;
            }
        }
        true
    }
}

fn add(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2], a[3] + b[3]]
}

fn sub(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2], a[3] - b[3]]
}

fn normalize(p: [f32; 4]) -> [f32; 4] {
    let len = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
    if len > 0.0 {
        [p[0] / len, p[1] / len, p[2] / len, p[3] / len]
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;

    fn default_frustum() -> Frustum {
        // Camera at (0, 1, 0) facing -Z, 45 degree fov.
        let cam = Camera::new(800.0, 600.0);
        Frustum::from_view_projection(&cam.view_projection())
    }

    #[test]
    fn point_ahead_is_inside() {
        let f = default_frustum();
        assert!(f.contains_point(0.0, 1.0, -10.0));
    }

    #[test]
    fn point_behind_is_outside() {
        let f = default_frustum();
        assert!(!f.contains_point(0.0, 1.0, 10.0));
    }

    #[test]
    fn point_beyond_far_plane_is_outside() {
        let f = default_frustum();
        assert!(!f.contains_point(0.0, 1.0, -2000.0));
    }

    #[test]
    fn sphere_overlapping_edge_is_kept() {
        let f = default_frustum();
        // Center is off to the side, but the radius reaches into view.
        assert!(!f.contains_point(15.0, 1.0, -10.0));
        assert!(f.intersects_sphere(15.0, 1.0, -10.0, 12.0));
    }

    #[test]
    fn small_sphere_far_off_axis_is_culled() {
        let f = default_frustum();
        assert!(!f.intersects_sphere(100.0, 1.0, -10.0, 1.0));
    }

    #[test]
    fn cube_straddling_near_plane_is_kept() {
        let f = default_frustum();
        assert!(f.intersects_cube(0.0, 1.0, 0.0, 1.0));
        assert!(!f.intersects_cube(0.0, 1.0, 50.0, 1.0));
    }
}
