// CONTROLLER: input, camera controls and the per-frame update
pub mod camera_controller;
pub mod frame_loop;
pub mod input;
pub mod orbit;

pub use camera_controller::CameraController;
pub use frame_loop::Viewer;
pub use input::{InputEvent, InputState, KeyBindings, MouseButton};
pub use orbit::OrbitControls;
