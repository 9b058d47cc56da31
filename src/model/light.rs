use glam::{Mat4, Vec3};

use crate::config::{srgb_hex_to_linear, LightRigConfig, ShadowConfig};

#[derive(Debug, Clone)]
pub struct DirectionalLight {
    /// Linear RGB
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub shadow: Option<ShadowConfig>,
}

impl DirectionalLight {
    /// Unit vector pointing from the lit surface towards the light
    pub fn direction(&self) -> Vec3 {
        (self.position - self.target).normalize_or_zero()
    }

    /// View-projection of the orthographic shadow camera, `None` when the
    /// light casts no shadows.
    pub fn shadow_view_proj(&self) -> Option<Mat4> {
        let shadow = self.shadow.as_ref()?;
        let up = if self.direction().cross(Vec3::Y).length_squared() < 1e-6 { Vec3::Z } else { Vec3::Y };
        let view = Mat4::look_at_rh(self.position, self.target, up);
        let e = shadow.extent;
        let proj = Mat4::orthographic_rh(-e, e, -e, e, shadow.near, shadow.far);
        Some(proj * view)
    }
}

/// One sun plus a flat ambient term
#[derive(Debug, Clone)]
pub struct LightRig {
    pub sun: DirectionalLight,
    /// Linear RGB
    pub ambient: Vec3,
}

impl LightRig {
    pub fn from_config(config: &LightRigConfig) -> Self {
        Self {
            sun: DirectionalLight {
                color: srgb_hex_to_linear(config.sun_color),
                intensity: config.sun_intensity,
                position: config.sun_position,
                target: config.sun_target,
                shadow: config.shadow.clone(),
            },
            ambient: srgb_hex_to_linear(config.ambient_color),
        }
    }

    pub fn casts_shadows(&self) -> bool {
        self.sun.shadow.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rig() {
        let rig = LightRig::from_config(&LightRigConfig::default());
        assert!(rig.casts_shadows());
        assert_eq!(rig.sun.color, Vec3::ONE);
        assert!((rig.sun.direction().length() - 1.0).abs() < 1e-6);
        assert!(rig.sun.direction().y > 0.9, "sun should be high overhead");
    }

    #[test]
    fn shadow_camera_covers_the_origin() {
        let rig = LightRig::from_config(&LightRigConfig::default());
        let vp = rig.sun.shadow_view_proj().unwrap();
        let p = vp.project_point3(Vec3::ZERO);
        assert!(p.x.abs() < 1e-4 && p.y.abs() < 1e-4);
        assert!(p.z > 0.0 && p.z < 1.0, "origin depth {}", p.z);

        // ground corners at the edge of the shadow area stay inside the frustum
        let corner = vp.project_point3(Vec3::new(60.0, 0.0, 60.0));
        assert!(corner.x.abs() <= 1.0 && corner.y.abs() <= 1.0);
    }

    #[test]
    fn no_shadow_without_config() {
        let config = LightRigConfig { shadow: None, ..Default::default() };
        let rig = LightRig::from_config(&config);
        assert!(rig.sun.shadow_view_proj().is_none());
    }
}
