// MODEL: camera, geometry, lights and the scene graph
pub mod camera;
pub mod light;
pub mod mesh;
pub mod scene;

pub use camera::Camera;
pub use light::{DirectionalLight, LightRig};
pub use mesh::{Mesh, MeshBuffer, Vertex};
pub use scene::{Scene, SceneObject};
