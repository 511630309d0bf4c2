use glam::{EulerRot, Mat4, Vec3, Vec4};

use crate::error::Error;

/// Free-fly camera: a world-space position plus pitch/yaw/roll Euler
/// angles. View and projection matrices and the movement basis are
/// re-derived every frame from that state — there is no persistent
/// quaternion, so gimbal lock at pitch ±90° is an accepted limitation.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub position: Vec3,
    /// Pitch (x), yaw (y), roll (z) in radians.
    pub euler: Vec3,

    view: Mat4,
    projection: Mat4,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        let mut camera = Self {
            position,
            euler: Vec3::ZERO,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
        };
        camera.update_view();
        camera
    }

    /// Recomputes the perspective projection. Cheap; called once per frame
    /// with the current drawable aspect ratio.
    pub fn set_projection(
        &mut self,
        fov_degrees: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Result<(), Error> {
        if !fov_degrees.is_finite() || fov_degrees <= 0.0 || fov_degrees >= 180.0 {
            return Err(Error::InvalidArgument(format!(
                "vertical field of view must be inside (0, 180) degrees, got {fov_degrees}"
            )));
        }
        if !aspect.is_finite() || aspect <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "aspect ratio must be positive and finite, got {aspect}"
            )));
        }

        self.projection = Mat4::perspective_rh(fov_degrees.to_radians(), aspect, near, far);
        Ok(())
    }

    /// Recomputes the view matrix and the forward/right/up basis from the
    /// current Euler angles: intrinsic X-then-Y-then-Z rotation composed
    /// with translation by `-position`, so moving the camera moves the
    /// world oppositely.
    pub fn update_view(&mut self) {
        let rotation = Mat4::from_euler(EulerRot::XYZ, self.euler.x, self.euler.y, self.euler.z);
        // Orthonormal, so the transpose is the world-from-view rotation.
        let inverse = rotation.transpose();
        self.forward = (inverse * Vec4::new(0.0, 0.0, -1.0, 0.0)).truncate();
        self.right = (inverse * Vec4::new(1.0, 0.0, 0.0, 0.0)).truncate();
        self.up = (inverse * Vec4::new(0.0, 1.0, 0.0, 0.0)).truncate();
        self.view = rotation * Mat4::from_translation(-self.position);
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Adds pitch/yaw deltas. Takes effect at the next `update_view`.
    pub fn look(&mut self, pitch_delta: f32, yaw_delta: f32) {
        self.euler.x += pitch_delta;
        self.euler.y += yaw_delta;
    }

    // Movement accumulates against the basis derived by the most recent
    // update_view call, one frame stale relative to the position it moves.

    pub fn advance(&mut self, amount: f32) {
        self.position += self.forward * amount;
    }

    pub fn strafe(&mut self, amount: f32) {
        self.position += self.right * amount;
    }

    pub fn ascend(&mut self, amount: f32) {
        self.position.y += amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn projection_matches_cotangent_of_half_fov() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera
            .set_projection(70.0, 640.0 / 480.0, 0.1, 100.0)
            .unwrap();
        let m = camera.projection().to_cols_array_2d();
        let expected = 1.0 / (35.0f32.to_radians()).tan();
        assert!((m[1][1] - expected).abs() < EPS);
    }

    #[test]
    fn degenerate_fov_is_rejected() {
        let mut camera = Camera::new(Vec3::ZERO);
        for fov in [0.0, -10.0, 180.0, 250.0, f32::NAN] {
            assert!(matches!(
                camera.set_projection(fov, 4.0 / 3.0, 0.1, 100.0),
                Err(Error::InvalidArgument(_))
            ));
        }
        assert!(camera.set_projection(179.0, 4.0 / 3.0, 0.1, 100.0).is_ok());
    }

    #[test]
    fn identity_orientation_looks_down_negative_z() {
        let camera = Camera::new(Vec3::ZERO);
        assert!((camera.forward() - Vec3::NEG_Z).length() < EPS);
        assert!((camera.right() - Vec3::X).length() < EPS);
        assert!((camera.up() - Vec3::Y).length() < EPS);
    }

    #[test]
    fn basis_stays_orthonormal_under_rotation() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.euler = Vec3::new(0.7, -1.3, 0.2);
        camera.update_view();

        assert!((camera.forward().length() - 1.0).abs() < EPS);
        assert!((camera.right().length() - 1.0).abs() < EPS);
        assert!((camera.up().length() - 1.0).abs() < EPS);
        assert!(camera.forward().dot(camera.right()).abs() < EPS);
        assert!(camera.forward().dot(camera.up()).abs() < EPS);
        assert!(camera.right().dot(camera.up()).abs() < EPS);
    }

    #[test]
    fn view_undoes_position_and_rotation() {
        let mut camera = Camera::new(Vec3::new(3.0, -2.0, 5.0));
        camera.euler = Vec3::new(0.4, 1.1, 0.0);
        camera.update_view();

        // A point one unit ahead of the camera lands on the view -Z axis.
        let ahead = camera.position + camera.forward();
        let in_view = camera.view() * ahead.extend(1.0);
        assert!((in_view.truncate() - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-4);
    }

    #[test]
    fn movement_uses_the_basis_from_the_last_view_update() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.update_view();
        let frame_basis = camera.forward();

        // Turning without re-deriving the view must not affect movement.
        camera.look(0.0, 1.0);
        camera.advance(2.0);
        assert!((camera.position - frame_basis * 2.0).length() < EPS);

        // The next update picks the new orientation up.
        camera.update_view();
        assert!((camera.forward() - frame_basis).length() > 0.5);
    }

    #[test]
    fn yaw_right_turns_toward_positive_x() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.look(0.0, 0.5);
        camera.update_view();
        assert!(camera.forward().x > 0.1);
    }
}
