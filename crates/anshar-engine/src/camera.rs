//! First-person camera.
//!
//! Orientation is spherical: `pitch` rotates around the world Y axis and `yaw`
//! tilts the view vertically, both in radians. Mouse deltas are scaled by a
//! fixed aim factor so the feel is resolution-independent.

use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::{Isometry3, Matrix4, Perspective3, Point3, Vector3};

/// Vertical field of view, radians.
const FOV_Y: f32 = std::f32::consts::FRAC_PI_4;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 1000.0;

/// Mouse-delta to radians scale for [`Camera::aim`].
const AIM_FACTOR: f64 = 0.01;

/// Perspective camera with first-person movement.
///
/// The view matrix is derived from `position`, `direction` and `up` on demand;
/// only the angles and basis vectors are stored.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Point3<f32>,
    direction: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,

    /// Horizontal angle, radians. Starts at pi, which faces -Z.
    pitch: f64,
    /// Vertical angle, radians.
    yaw: f64,

    projection: Perspective3<f32>,
}

impl Camera {
    /// Creates a camera at `(0, 1, 0)` facing -Z, with a projection built for
    /// the given surface size.
    pub fn new(width: f32, height: f32) -> Self {
        let mut camera = Self {
            position: Point3::new(0.0, 1.0, 0.0),
            direction: Vector3::new(0.0, 0.0, -1.0),
            right: Vector3::new(1.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            pitch: PI,
            yaw: 0.0,
            projection: Perspective3::new(aspect(width, height), FOV_Y, Z_NEAR, Z_FAR),
        };
        camera.aim(0.0, 0.0);
        camera
    }

    /// Rebuilds the projection for a new surface size.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.projection = Perspective3::new(aspect(width, height), FOV_Y, Z_NEAR, Z_FAR);
    }

    /// Rotates the view by pointer deltas, scaled by the aim factor.
    ///
    /// Positive `dx` turns left, positive `dy` looks up.
    pub fn aim(&mut self, dx: f64, dy: f64) {
        self.pitch += dx * AIM_FACTOR;
        self.yaw += dy * AIM_FACTOR;

        self.direction = Vector3::new(
            (self.yaw.cos() * self.pitch.sin()) as f32,
            self.yaw.sin() as f32,
            (self.yaw.cos() * self.pitch.cos()) as f32,
        );

        self.right = Vector3::new(
            (self.pitch - FRAC_PI_2).sin() as f32,
            0.0,
            (self.pitch - FRAC_PI_2).cos() as f32,
        );

        self.up = self.right.cross(&self.direction);
    }

    /// Moves along the view direction.
    pub fn move_forward(&mut self, amount: f32) {
        self.position += self.direction * amount;
    }

    pub fn move_backward(&mut self, amount: f32) {
        self.move_forward(-amount);
    }

    /// Strafes along the right vector.
    pub fn move_right(&mut self, amount: f32) {
        self.position += self.right * amount;
    }

    pub fn move_left(&mut self, amount: f32) {
        self.move_right(-amount);
    }

    /// Teleports the camera without changing its orientation.
    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Point3::new(x, y, z);
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn direction(&self) -> Vector3<f32> {
        self.direction
    }

    /// Right-handed look-at view matrix.
    pub fn view(&self) -> Matrix4<f32> {
        let target = self.position + self.direction;
        Isometry3::look_at_rh(&self.position, &target, &self.up).to_homogeneous()
    }

    pub fn projection(&self) -> Matrix4<f32> {
        self.projection.to_homogeneous()
    }

    /// `projection * view`, the matrix frustum culling is derived from.
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection() * self.view()
    }
}

fn aspect(width: f32, height: f32) -> f32 {
    width / height.max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn starts_facing_negative_z() {
        let cam = Camera::new(800.0, 600.0);
        let d = cam.direction();
        assert!(approx(d.x, 0.0), "x = {}", d.x);
        assert!(approx(d.y, 0.0), "y = {}", d.y);
        assert!(approx(d.z, -1.0), "z = {}", d.z);
    }

    #[test]
    fn forward_moves_along_direction() {
        let mut cam = Camera::new(800.0, 600.0);
        // Facing -Z, a 2-unit step lands 2 units down the -Z axis.
        cam.move_forward(2.0);
        let p = cam.position();
        assert!(approx(p.x, 0.0));
        assert!(approx(p.y, 1.0));
        assert!(approx(p.z, -2.0));

        cam.move_backward(2.0);
        assert!(approx(cam.position().z, 0.0));
    }

    #[test]
    fn strafe_right_moves_along_x() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.move_right(3.0);
        assert!(approx(cam.position().x, 3.0));
        assert!(approx(cam.position().z, 0.0));
    }

    #[test]
    fn aim_keeps_direction_unit_length() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.aim(137.0, -42.0);
        assert!(approx(cam.direction().norm(), 1.0));
    }

    #[test]
    fn view_places_point_ahead_in_front_of_camera() {
        let cam = Camera::new(800.0, 600.0);
        // A point 10 units down -Z from the eye should sit on the view-space
        // -Z axis.
        let p = cam.view().transform_point(&Point3::new(0.0, 1.0, -10.0));
        assert!(approx(p.x, 0.0));
        assert!(approx(p.y, 0.0));
        assert!(approx(p.z, -10.0));
    }

    #[test]
    fn resize_updates_aspect() {
        let mut cam = Camera::new(800.0, 600.0);
        cam.resize(1000.0, 500.0);
        let proj = cam.projection();
        // Wider aspect shrinks the x scale relative to y.
        assert!(proj[(0, 0)] < proj[(1, 1)]);
    }
}
