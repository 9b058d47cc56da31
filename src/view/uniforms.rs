use glam::{Mat3, Mat4};

use crate::model::{Camera, LightRig, SceneObject};

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view_proj: camera.view_proj().to_cols_array_2d(),
            eye: camera.position.extend(1.0).to_array(),
        }
    }
}

/// Sun, ambient and shadow parameters. Layout matches `Lighting` in the
/// mesh and shadow shaders.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
    pub light_view_proj: [[f32; 4]; 4],
    pub sun_dir: [f32; 3],
    pub sun_intensity: f32,
    pub sun_color: [f32; 3],
    pub shadow_bias: f32,
    pub ambient: [f32; 3],
    pub shadows_enabled: f32,
    pub shadow_texel: [f32; 2],
    pub _pad: [f32; 2],
}

impl LightingUniform {
    pub fn from_rig(rig: &LightRig) -> Self {
        let sun = &rig.sun;
        let (light_view_proj, bias, texel, enabled) = match (sun.shadow.as_ref(), sun.shadow_view_proj()) {
            (Some(shadow), Some(view_proj)) => {
                let texel = 1.0 / shadow.map_size.max(1) as f32;
                (view_proj, shadow.bias, [texel, texel], 1.0)
            }
            _ => (Mat4::IDENTITY, 0.0, [0.0, 0.0], 0.0),
        };
        Self {
            light_view_proj: light_view_proj.to_cols_array_2d(),
            sun_dir: sun.direction().to_array(),
            sun_intensity: sun.intensity,
            sun_color: sun.color.to_array(),
            shadow_bias: bias,
            ambient: rig.ambient.to_array(),
            shadows_enabled: enabled,
            shadow_texel: texel,
            _pad: [0.0; 2],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    /// x: receives shadows
    pub params: [f32; 4],
}

impl ModelUniform {
    pub fn from_object(object: &SceneObject) -> Self {
        let normal = Mat3::from_mat4(object.transform).inverse().transpose();
        Self {
            model: object.transform.to_cols_array_2d(),
            normal: Mat4::from_mat3(normal).to_cols_array_2d(),
            params: [if object.receive_shadow { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyUniform {
    pub inv_view_proj: [[f32; 4]; 4],
}

impl SkyUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        Self { inv_view_proj: camera.inverse_sky_view_proj().to_cols_array_2d() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GroundConfig, LightRigConfig};
    use crate::model::Scene;
    use glam::Vec3;

    #[test]
    fn uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
        assert_eq!(std::mem::size_of::<LightingUniform>(), 128);
        assert_eq!(std::mem::size_of::<ModelUniform>(), 144);
        assert_eq!(std::mem::size_of::<SkyUniform>(), 64);
    }

    #[test]
    fn lighting_from_default_rig() {
        let u = LightingUniform::from_rig(&LightRig::from_config(&LightRigConfig::default()));
        assert_eq!(u.shadows_enabled, 1.0);
        assert_eq!(u.shadow_bias, -0.001);
        assert_eq!(u.shadow_texel, [1.0 / 2048.0; 2]);
        let dir = Vec3::from_array(u.sun_dir);
        assert!(dir.abs_diff_eq(Vec3::new(20.0, 100.0, 10.0).normalize(), 1e-6));
    }

    #[test]
    fn lighting_without_shadows() {
        let config = LightRigConfig { shadow: None, ..Default::default() };
        let u = LightingUniform::from_rig(&LightRig::from_config(&config));
        assert_eq!(u.shadows_enabled, 0.0);
        assert_eq!(u.light_view_proj, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn ground_receives_shadows() {
        let scene = Scene::new(&GroundConfig::default());
        let u = ModelUniform::from_object(&scene.objects[0]);
        assert_eq!(u.params[0], 1.0);
        assert_eq!(u.normal, Mat4::IDENTITY.to_cols_array_2d());
    }
}
