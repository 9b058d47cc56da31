use glam::{Mat4, Quat, Vec3};

use crate::assets::{CubeFaces, ModelData};
use crate::config::{srgb_hex_to_linear, GroundConfig, ModelPlacement};
use crate::model::Mesh;

/// A mesh placed in the world
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub label: String,
    pub mesh: Mesh,
    pub transform: Mat4,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

/// Everything that gets drawn. Objects are only ever appended, so a
/// renderer can upload the tail it has not seen yet.
pub struct Scene {
    pub objects: Vec<SceneObject>,
    skybox: Option<CubeFaces>,
    has_skybox: bool,
}

impl Scene {
    /// Empty scene with only the ground plane in it
    pub fn new(ground: &GroundConfig) -> Self {
        let color = srgb_hex_to_linear(ground.color).extend(1.0).to_array();
        let plane = SceneObject {
            label: "ground".to_string(),
            mesh: Mesh::plane(ground.width, ground.depth, ground.segments, color),
            transform: Mat4::IDENTITY,
            cast_shadow: false,
            receive_shadow: true,
        };
        Self { objects: vec![plane], skybox: None, has_skybox: false }
    }

    /// Place a loaded model according to `placement`; returns its index
    pub fn add_model(&mut self, placement: &ModelPlacement, model: ModelData) -> usize {
        let transform = Mat4::from_scale_rotation_translation(
            Vec3::splat(placement.scale),
            Quat::IDENTITY,
            placement.position,
        );
        self.objects.push(SceneObject {
            label: model.label,
            mesh: model.mesh,
            transform,
            // models cast onto the ground but are not shadowed themselves
            cast_shadow: true,
            receive_shadow: false,
        });
        self.objects.len() - 1
    }

    pub fn find(&self, label: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.label == label)
    }

    pub fn set_skybox(&mut self, faces: CubeFaces) {
        self.skybox = Some(faces);
        self.has_skybox = true;
    }

    /// Hand the decoded sky images over for upload
    pub fn take_skybox(&mut self) -> Option<CubeFaces> {
        self.skybox.take()
    }

    pub fn has_skybox(&self) -> bool {
        self.has_skybox
    }
}
