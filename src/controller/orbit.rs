use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use crate::config::OrbitConfig;
use crate::controller::input::{InputEvent, MouseButton};
use crate::model::Camera;

/// Keeps the polar angle off the poles where the look-at basis degenerates
const POLAR_EPS: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drag {
    Rotate,
    Pan,
}

/// Mouse orbiting around a target point: left drag rotates, right drag
/// pans, the wheel zooms.
///
/// Pointer events only accumulate deltas; [`OrbitControls::update`] applies
/// them to the camera and reports whether the view changed.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub screen_space_panning: bool,

    viewport_height: f32,
    drag: Option<Drag>,
    delta_theta: f32,
    delta_phi: f32,
    pan_pixels: Vec2,
    scale: f32,
}

impl OrbitControls {
    pub fn new(config: &OrbitConfig, viewport_height: u32) -> Self {
        Self {
            target: config.target,
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            pan_speed: config.pan_speed,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            screen_space_panning: config.screen_space_panning,
            viewport_height: viewport_height.max(1) as f32,
            drag: None,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pan_pixels: Vec2::ZERO,
            scale: 1.0,
        }
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        if height > 0 {
            self.viewport_height = height as f32;
        }
    }

    /// Aim the camera at the target without reporting a change
    pub fn sync(&self, camera: &mut Camera) {
        camera.look_at(self.target);
    }

    /// Feed a pointer event. Returns true when the event was used.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        match *event {
            InputEvent::PointerDown { button: MouseButton::Left } => {
                self.drag = Some(Drag::Rotate);
                true
            }
            InputEvent::PointerDown { button: MouseButton::Right } => {
                self.drag = Some(Drag::Pan);
                true
            }
            InputEvent::PointerUp { .. } | InputEvent::FocusLost => {
                self.drag = None;
                false
            }
            InputEvent::PointerMove { dx, dy } => match self.drag {
                Some(Drag::Rotate) => {
                    self.delta_theta -= TAU * dx / self.viewport_height * self.rotate_speed;
                    self.delta_phi -= TAU * dy / self.viewport_height * self.rotate_speed;
                    true
                }
                Some(Drag::Pan) => {
                    self.pan_pixels += Vec2::new(dx, dy);
                    true
                }
                None => false,
            },
            InputEvent::Wheel { delta_y } if delta_y != 0.0 => {
                let zoom = 0.95f32.powf(self.zoom_speed * (delta_y * 0.01).abs());
                if delta_y < 0.0 {
                    self.scale *= zoom;
                } else {
                    self.scale /= zoom;
                }
                true
            }
            _ => false,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    fn has_pending(&self) -> bool {
        self.delta_theta != 0.0 || self.delta_phi != 0.0 || self.pan_pixels != Vec2::ZERO || self.scale != 1.0
    }

    /// Apply accumulated rotate/pan/zoom. Returns true if the view changed.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        if !self.has_pending() {
            return false;
        }
        let before = (camera.position, camera.orientation, self.target);

        if self.pan_pixels != Vec2::ZERO {
            let pan = self.pan_offset(camera);
            self.target += pan;
            camera.position += pan;
        }

        let offset = camera.position - self.target;
        let radius = offset.length();
        if radius > f32::EPSILON {
            let theta = offset.x.atan2(offset.z) + self.delta_theta;
            let phi = ((offset.y / radius).clamp(-1.0, 1.0).acos() + self.delta_phi).clamp(POLAR_EPS, PI - POLAR_EPS);
            let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
            let (sin_phi, cos_phi) = phi.sin_cos();
            let (sin_theta, cos_theta) = theta.sin_cos();
            camera.position = self.target + Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta) * radius;
        }
        camera.look_at(self.target);

        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.pan_pixels = Vec2::ZERO;
        self.scale = 1.0;

        camera.position.distance_squared(before.0) > 1e-10
            || camera.orientation.dot(before.1).abs() < 1.0 - 1e-7
            || self.target.distance_squared(before.2) > 1e-10
    }

    /// World-space pan for the accumulated pixel drag. Dragging right moves
    /// the view left so the scene follows the pointer.
    fn pan_offset(&self, camera: &Camera) -> Vec3 {
        let target_distance = (camera.position - self.target).length() * (camera.fov_y / 2.0).tan();
        let per_pixel = 2.0 * target_distance / self.viewport_height * self.pan_speed;
        let up = if self.screen_space_panning {
            camera.up()
        } else {
            // slide along the ground plane instead of the screen plane
            Vec3::Y.cross(camera.right()).normalize_or_zero()
        };
        camera.right() * (-self.pan_pixels.x * per_pixel) + up * (self.pan_pixels.y * per_pixel)
    }
}
