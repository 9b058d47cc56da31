use glam::Vec3;

use crate::config::MovementConfig;
use crate::controller::input::{InputState, KeyBindings};
use crate::model::Camera;

/// Horizontal projections shorter than this count as degenerate
const MIN_FLAT_LENGTH: f32 = 1e-4;

/// Drop the vertical component and renormalize; zero when nothing is left
pub fn flatten(v: Vec3) -> Vec3 {
    let flat = Vec3::new(v.x, 0.0, v.z);
    if flat.length() < MIN_FLAT_LENGTH {
        Vec3::ZERO
    } else {
        flat.normalize()
    }
}

/// Free-fly camera movement driven by held keys.
///
/// Horizontal movement follows the camera's heading with pitch ignored, so
/// looking up or down never changes altitude; ascend/descend move along
/// world Y. The step is a fixed distance per call (per rendered frame), not
/// scaled by elapsed time.
#[derive(Debug, Clone)]
pub struct CameraController {
    pub move_speed: f32,
    pub bindings: KeyBindings,
}

impl CameraController {
    pub fn new(config: &MovementConfig) -> Self {
        Self { move_speed: config.speed, bindings: config.bindings.clone() }
    }

    /// Direction of travel for the current key state, unit length or zero
    pub fn move_direction(&self, camera: &Camera, input: &InputState) -> Vec3 {
        let forward = flatten(camera.forward());
        let right = flatten(camera.right());

        let mut direction = Vec3::ZERO;
        if input.is_key_pressed(&self.bindings.forward) {
            direction += forward;
        }
        if input.is_key_pressed(&self.bindings.backward) {
            direction -= forward;
        }
        if input.is_key_pressed(&self.bindings.left) {
            direction -= right;
        }
        if input.is_key_pressed(&self.bindings.right) {
            direction += right;
        }
        if input.is_key_pressed(&self.bindings.ascend) {
            direction += Vec3::Y;
        }
        if input.is_key_pressed(&self.bindings.descend) {
            direction -= Vec3::Y;
        }
        direction.normalize_or_zero()
    }

    /// Move the camera for one frame and return the applied displacement
    pub fn update(&self, camera: &mut Camera, input: &InputState) -> Vec3 {
        let step = self.move_direction(camera, input) * self.move_speed;
        if step != Vec3::ZERO {
            camera.position += step;
        }
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use glam::Quat;
    use std::f32::consts::FRAC_PI_2;

    const EPS: f32 = 1e-5;

    fn camera_at(position: Vec3) -> Camera {
        let config = CameraConfig { position, ..Default::default() };
        Camera::new(1920, 1080, &config)
    }

    fn controller() -> CameraController {
        CameraController::new(&MovementConfig::default())
    }

    fn pressed(keys: &[&str]) -> InputState {
        let mut input = InputState::new();
        for k in keys {
            input.press(k);
        }
        input
    }

    #[test]
    fn no_keys_no_movement() {
        let mut cam = camera_at(Vec3::new(1.0, 2.0, 3.0));
        cam.orientation = Quat::from_rotation_y(0.7) * Quat::from_rotation_x(-0.3);
        let step = controller().update(&mut cam, &InputState::new());
        assert_eq!(step, Vec3::ZERO);
        assert_eq!(cam.position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn forward_from_starting_pose() {
        let mut cam = camera_at(Vec3::new(0.0, 40.0, -181.0));
        controller().update(&mut cam, &pressed(&["w"]));
        assert!(cam.position.abs_diff_eq(Vec3::new(0.0, 40.0, -184.0), EPS), "{}", cam.position);
    }

    #[test]
    fn forward_moves_exactly_speed_along_heading() {
        let mut cam = camera_at(Vec3::ZERO);
        cam.orientation = Quat::from_rotation_y(0.5) * Quat::from_rotation_x(0.4);
        let step = controller().update(&mut cam, &pressed(&["w"]));

        assert!((step.length() - 3.0).abs() < EPS);
        assert!(step.y.abs() < EPS, "pitch must not change altitude");
        let heading = flatten(cam.forward());
        assert!(step.normalize().abs_diff_eq(heading, EPS));
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut cam = camera_at(Vec3::new(5.0, 5.0, 5.0));
        for keys in [&["w", "s"][..], &["a", "d"], &[" ", "Shift"], &["w", "s", "a", "d"]] {
            let step = controller().update(&mut cam, &pressed(keys));
            assert_eq!(step, Vec3::ZERO, "keys {keys:?}");
        }
        assert_eq!(cam.position, Vec3::new(5.0, 5.0, 5.0));
    }

    #[test]
    fn diagonal_is_normalized() {
        let mut cam = camera_at(Vec3::ZERO);
        let step = controller().update(&mut cam, &pressed(&["w", "d"]));
        assert!((step.length() - 3.0).abs() < EPS, "diagonal length {}", step.length());
        let expected = Vec3::new(1.0, 0.0, -1.0).normalize() * 3.0;
        assert!(step.abs_diff_eq(expected, EPS), "{step}");
    }

    #[test]
    fn strafing_left_and_right() {
        let mut cam = camera_at(Vec3::ZERO);
        let left = controller().update(&mut cam, &pressed(&["a"]));
        assert!(left.abs_diff_eq(Vec3::new(-3.0, 0.0, 0.0), EPS));
        let right = controller().update(&mut cam, &pressed(&["d"]));
        assert!(right.abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), EPS));
        assert!(cam.position.abs_diff_eq(Vec3::ZERO, EPS));
    }

    #[test]
    fn vertical_ignores_orientation() {
        for yaw in [0.0, 1.0, 2.5, -2.0] {
            let mut cam = camera_at(Vec3::ZERO);
            cam.orientation = Quat::from_rotation_y(yaw) * Quat::from_rotation_x(0.8);
            let up = controller().update(&mut cam, &pressed(&[" "]));
            assert!(up.abs_diff_eq(Vec3::new(0.0, 3.0, 0.0), EPS), "yaw {yaw}: {up}");
            let down = controller().update(&mut cam, &pressed(&["Shift"]));
            assert!(down.abs_diff_eq(Vec3::new(0.0, -3.0, 0.0), EPS), "yaw {yaw}: {down}");
        }
    }

    #[test]
    fn looking_straight_down_has_no_forward_motion() {
        let mut cam = camera_at(Vec3::new(0.0, 50.0, 0.0));
        cam.orientation = Quat::from_rotation_x(-FRAC_PI_2);
        assert!(cam.forward().abs_diff_eq(Vec3::NEG_Y, EPS));

        let start = cam.position;
        for keys in [&["w"][..], &["s"]] {
            let step = controller().update(&mut cam, &pressed(keys));
            assert!(step.length() < EPS, "keys {keys:?} moved {step}");
        }
        assert!(cam.position.abs_diff_eq(start, EPS));

        // strafing still works since the right axis stays level
        let step = controller().update(&mut cam, &pressed(&["d"]));
        assert!((step.length() - 3.0).abs() < EPS);
    }

    #[test]
    fn custom_speed_and_bindings() {
        let mut config = MovementConfig::default();
        config.speed = 0.5;
        config.bindings.forward = "ArrowUp".to_string();
        let ctl = CameraController::new(&config);

        let mut cam = camera_at(Vec3::ZERO);
        assert_eq!(ctl.update(&mut cam, &pressed(&["w"])), Vec3::ZERO);
        let step = ctl.update(&mut cam, &pressed(&["ArrowUp"]));
        assert!(step.abs_diff_eq(Vec3::new(0.0, 0.0, -0.5), EPS));
    }

    #[test]
    fn uppercase_key_counts_as_lowercase_binding() {
        let mut cam = camera_at(Vec3::ZERO);
        let step = controller().update(&mut cam, &pressed(&["W", "Shift"]));
        let expected = Vec3::new(0.0, -1.0, -1.0).normalize() * 3.0;
        assert!(step.abs_diff_eq(expected, EPS), "{step}");
    }
}
