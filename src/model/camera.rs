use glam::{Mat3, Mat4, Quat, Vec3};

use crate::config::CameraConfig;

/// Perspective camera: a position plus an orientation.
///
/// Looks down its local -Z axis with +Y up, the same convention as the
/// projection matrices built here.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub orientation: Quat,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32, config: &CameraConfig) -> Self {
        let mut camera = Self {
            position: config.position,
            orientation: Quat::IDENTITY,
            fov_y: config.fov_y_degrees.to_radians(),
            aspect: 1.0,
            z_near: config.z_near,
            z_far: config.z_far,
        };
        camera.set_aspect(width, height);
        camera
    }

    /// World-space direction the camera looks at
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.orientation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Turn the camera towards `target`, keeping world +Y as up.
    ///
    /// Leaves the orientation untouched when the target coincides with the
    /// position or lies straight above/below it.
    pub fn look_at(&mut self, target: Vec3) {
        let forward = (target - self.position).normalize_or_zero();
        if forward == Vec3::ZERO {
            return;
        }
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        if right == Vec3::ZERO {
            return;
        }
        let up = right.cross(forward);
        self.orientation = Quat::from_mat3(&Mat3::from_cols(right, up, -forward)).normalize();
    }

    pub fn view(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position).inverse()
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Inverse of the projection times the rotation-only view.
    /// Maps clip-space points to world directions, used to draw the sky.
    pub fn inverse_sky_view_proj(&self) -> Mat4 {
        let rotation_only = Mat4::from_quat(self.orientation.inverse());
        (self.projection() * rotation_only).inverse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(1920, 1080, &CameraConfig::default())
    }

    #[test]
    fn starts_from_config() {
        let cam = camera();
        assert_eq!(cam.position, Vec3::new(-2.0, 40.0, -181.0));
        assert!((cam.fov_y - 60f32.to_radians()).abs() < 1e-6);
        assert!((cam.aspect - 1920.0 / 1080.0).abs() < 1e-6);
        assert!(cam.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn look_at_points_forward_at_target() {
        let mut cam = camera();
        cam.look_at(Vec3::ZERO);
        let expected = (Vec3::ZERO - cam.position).normalize();
        assert!(cam.forward().abs_diff_eq(expected, 1e-5), "{} vs {}", cam.forward(), expected);
        assert!(cam.right().y.abs() < 1e-5, "right axis should stay level");
    }

    #[test]
    fn look_at_straight_down_keeps_orientation() {
        let mut cam = camera();
        let before = cam.orientation;
        cam.look_at(cam.position - Vec3::Y * 10.0);
        assert_eq!(cam.orientation, before);
    }

    #[test]
    fn zero_sized_aspect_is_ignored() {
        let mut cam = camera();
        let before = cam.aspect;
        cam.set_aspect(800, 0);
        assert_eq!(cam.aspect, before);
        cam.set_aspect(800, 400);
        assert_eq!(cam.aspect, 2.0);
    }

    #[test]
    fn view_proj_puts_target_in_front() {
        let mut cam = camera();
        cam.look_at(Vec3::ZERO);
        let clip = cam.view_proj() * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(clip.w > 0.0);
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
