use glam::Vec3;
use tracing::{debug, info, warn};

use crate::assets::{AssetLoader, CubeFaces, LoadHandle, LoadStatus, ModelData};
use crate::config::{ModelPlacement, SkyboxConfig, ViewerConfig};
use crate::controller::camera_controller::CameraController;
use crate::controller::input::{InputEvent, InputState};
use crate::controller::orbit::OrbitControls;
use crate::model::{Camera, LightRig, Scene};
use crate::ui::CameraReadout;

struct PendingModel {
    placement: ModelPlacement,
    handle: LoadHandle<ModelData>,
}

/// Per-frame viewer state: camera, input, controls and the scene being
/// filled in by background loads. Rendering lives elsewhere; a renderer
/// reads `camera`, `scene` and `lights` after each [`Viewer::tick`].
pub struct Viewer {
    pub camera: Camera,
    pub input: InputState,
    pub director: CameraController,
    pub orbit: OrbitControls,
    pub readout: CameraReadout,
    pub scene: Scene,
    pub lights: LightRig,
    width: u32,
    height: u32,
    placements: Vec<ModelPlacement>,
    skybox: SkyboxConfig,
    pending_models: Vec<PendingModel>,
    pending_skybox: Option<LoadHandle<CubeFaces>>,
}

impl Viewer {
    pub fn new(config: &ViewerConfig, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut camera = Camera::new(width, height, &config.camera);
        let orbit = OrbitControls::new(&config.orbit, height);
        orbit.sync(&mut camera);

        info!(
            variant = %config.variant,
            models = config.models.len(),
            width,
            height,
            "viewer ready"
        );

        Self {
            camera,
            input: InputState::new(),
            director: CameraController::new(&config.movement),
            orbit,
            readout: CameraReadout::new(),
            scene: Scene::new(&config.ground),
            lights: LightRig::from_config(&config.lights),
            width,
            height,
            placements: config.models.clone(),
            skybox: config.skybox.clone(),
            pending_models: Vec::new(),
            pending_skybox: None,
        }
    }

    /// Kick off the skybox and every model load
    pub fn start_loads(&mut self, loader: &AssetLoader) {
        self.track_skybox(loader.load_skybox(&self.skybox.faces));
        for placement in self.placements.clone() {
            let handle = loader.load_model(&placement);
            self.track_model(placement, handle);
        }
    }

    pub fn track_model(&mut self, placement: ModelPlacement, handle: LoadHandle<ModelData>) {
        self.pending_models.push(PendingModel { placement, handle });
    }

    pub fn track_skybox(&mut self, handle: LoadHandle<CubeFaces>) {
        self.pending_skybox = Some(handle);
    }

    pub fn pending_loads(&self) -> usize {
        self.pending_models.len() + usize::from(self.pending_skybox.is_some())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn handle_event(&mut self, event: &InputEvent) {
        self.input.process_event(event);
        self.orbit.handle_event(event);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        debug!(width, height, "viewer resized");
        self.width = width;
        self.height = height;
        self.camera.set_aspect(width, height);
        self.orbit.set_viewport_height(height);
    }

    /// One frame of logic: collect finished loads, apply orbit input, then
    /// fly the camera. Returns the director's displacement.
    pub fn tick(&mut self) -> Vec3 {
        self.poll_loads();
        if self.orbit.update(&mut self.camera) {
            self.readout.refresh(&self.camera);
        }
        self.director.update(&mut self.camera, &self.input)
    }

    fn poll_loads(&mut self) {
        let scene = &mut self.scene;
        self.pending_models.retain_mut(|pending| match pending.handle.poll() {
            LoadStatus::Pending => true,
            LoadStatus::Ready(model) => {
                let label = model.label.clone();
                let triangles = model.mesh.indices.len() / 3;
                scene.add_model(&pending.placement, model);
                info!(model = %label, triangles, "model added to scene");
                false
            }
            LoadStatus::Failed(err) => {
                warn!(model = %pending.placement.path, error = %err, "model failed to load");
                false
            }
        });

        if let Some(handle) = self.pending_skybox.as_mut() {
            match handle.poll() {
                LoadStatus::Pending => {}
                LoadStatus::Ready(faces) => {
                    info!(size = faces.size, "skybox loaded");
                    self.scene.set_skybox(faces);
                    self.pending_skybox = None;
                }
                LoadStatus::Failed(err) => {
                    warn!(error = %err, "skybox failed to load");
                    self.pending_skybox = None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetError;
    use crate::controller::input::MouseButton;
    use crate::model::{Mesh, Vertex};

    fn triangle(label: &str) -> ModelData {
        let v = |pos| Vertex { pos, normal: [0.0, 1.0, 0.0], color: [1.0; 4] };
        ModelData {
            label: label.to_string(),
            mesh: Mesh { vertices: vec![v([0.0; 3]), v([1.0, 0.0, 0.0]), v([0.0, 0.0, 1.0])], indices: vec![0, 1, 2] },
        }
    }

    fn viewer() -> Viewer {
        Viewer::new(&ViewerConfig::default(), 1280, 720)
    }

    #[test]
    fn starts_aimed_at_target_with_empty_readout() {
        let v = viewer();
        assert_eq!(v.camera.position, Vec3::new(-2.0, 40.0, -181.0));
        let to_origin = (Vec3::ZERO - v.camera.position).normalize();
        assert!(v.camera.forward().abs_diff_eq(to_origin, 1e-4));
        assert_eq!(v.readout.text(), "");
        assert_eq!(v.scene.objects.len(), 1);
    }

    #[test]
    fn tick_adds_loaded_models_and_drops_failures() {
        let mut v = viewer();
        let house = ModelPlacement::new("farmhouse_free.glb", 20.0, Vec3::ZERO);
        let cat = ModelPlacement::new("cat_lowpoly.glb", 20.0, Vec3::new(30.0, 0.0, -100.0));
        v.track_model(house, LoadHandle::resolved("farmhouse_free.glb", Ok(triangle("farmhouse_free.glb"))));
        v.track_model(
            cat,
            LoadHandle::resolved("cat_lowpoly.glb", Err(AssetError::EmptyModel { label: "cat_lowpoly.glb".into() })),
        );
        let (_tx, pending) = LoadHandle::<ModelData>::channel("dome.glb");
        v.track_model(ModelPlacement::new("dome.glb", 20.0, Vec3::ZERO), pending);
        assert_eq!(v.pending_loads(), 3);

        v.tick();
        assert_eq!(v.pending_loads(), 1, "only the unanswered load stays pending");
        assert!(v.scene.find("farmhouse_free.glb").is_some());
        assert!(v.scene.find("cat_lowpoly.glb").is_none());
    }

    #[test]
    fn tick_installs_skybox() {
        let mut v = viewer();
        let faces = CubeFaces { size: 1, faces: std::array::from_fn(|_| vec![255; 4]) };
        v.track_skybox(LoadHandle::resolved("skybox", Ok(faces)));
        v.tick();
        assert!(v.scene.has_skybox());
        assert_eq!(v.pending_loads(), 0);
    }

    #[test]
    fn keys_fly_the_camera() {
        let mut v = viewer();
        let start = v.camera.position;
        v.handle_event(&InputEvent::KeyDown(" ".into()));
        let step = v.tick();
        assert!(step.abs_diff_eq(Vec3::new(0.0, 3.0, 0.0), 1e-5));
        assert!(v.camera.position.abs_diff_eq(start + step, 1e-5));

        v.handle_event(&InputEvent::FocusLost);
        assert_eq!(v.tick(), Vec3::ZERO);
    }

    #[test]
    fn orbit_change_refreshes_readout() {
        let mut v = viewer();
        v.handle_event(&InputEvent::PointerDown { button: MouseButton::Left });
        v.handle_event(&InputEvent::PointerMove { dx: 40.0, dy: 0.0 });
        v.tick();
        assert!(v.readout.text().starts_with("Camera Position: x="));

        // flying alone does not touch the readout
        let text = v.readout.text().to_string();
        v.handle_event(&InputEvent::PointerUp { button: MouseButton::Left });
        v.handle_event(&InputEvent::KeyDown("w".into()));
        v.tick();
        assert_eq!(v.readout.text(), text);
    }

    #[test]
    fn zero_resize_is_ignored() {
        let mut v = viewer();
        v.resize(0, 300);
        assert_eq!(v.size(), (1280, 720));
        v.resize(800, 800);
        assert_eq!(v.size(), (800, 800));
        assert!((v.camera.aspect - 1.0).abs() < 1e-6);
    }
}
