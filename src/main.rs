use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use winit::{event::*, event_loop::EventLoop, window::Window};

// Import from the library crate
use kicia::{
    assets::AssetLoader,
    config::{ConfigError, SceneVariant, ViewerConfig},
    controller::{input::native, InputEvent, Viewer},
    error::ViewerError,
    logging, ui,
    view::{GpuContext, Overlay, Renderer},
};

/// Fly a camera through a lit glTF scene
#[derive(Debug, Parser)]
#[command(name = "kicia", version)]
struct Args {
    /// Which models to load: farmhouse, cat or dome
    #[arg(long, default_value_t = SceneVariant::Farmhouse)]
    variant: SceneVariant,

    /// Directory holding the glTF models and skybox images
    #[arg(long, default_value = "resources")]
    assets: String,

    /// Distance travelled per frame while a movement key is held
    #[arg(long)]
    move_speed: Option<f32>,

    /// Multisample count for the main pass (1 or 4)
    #[arg(long, default_value_t = 4)]
    msaa: u32,
}

impl Args {
    fn into_config(self) -> Result<ViewerConfig, ConfigError> {
        let mut config = ViewerConfig::for_variant(self.variant);
        config.asset_root = self.assets;
        if let Some(speed) = self.move_speed {
            config.movement.set_speed(speed)?;
        }
        config.render.set_msaa_samples(self.msaa)?;
        Ok(config)
    }
}

struct App {
    window: Arc<Window>,
    renderer: Renderer,
    viewer: Viewer,

    // egui
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,

    last_cursor: Option<(f64, f64)>,
}

impl App {
    async fn new(window: Arc<Window>, config: &ViewerConfig) -> Result<Self, ViewerError> {
        let size = window.inner_size();
        let gpu = GpuContext::new_native(window.clone(), config.render.msaa_samples).await?;

        let mut viewer = Viewer::new(config, size.width, size.height);
        let renderer = Renderer::new(gpu, &viewer.lights, &config.render);
        viewer.start_loads(&AssetLoader::new(config.asset_root.clone()));

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        Ok(Self { window, renderer, viewer, egui_state, egui_ctx, last_cursor: None })
    }

    /// Translate a window event for the viewer. Returns true when consumed.
    fn input(&mut self, event: &WindowEvent) -> bool {
        // the overlay is display-only, egui just needs to see the event
        let _ = self.egui_state.on_window_event(self.window.as_ref(), event);

        let input = match event {
            WindowEvent::KeyboardInput { event, .. } => native::key_event_to_input(event),
            WindowEvent::MouseInput { state, button, .. } => native::mouse_button_to_input(*state, *button),
            WindowEvent::CursorMoved { position, .. } => self
                .last_cursor
                .replace((position.x, position.y))
                .map(|(x, y)| InputEvent::PointerMove { dx: (position.x - x) as f32, dy: (position.y - y) as f32 }),
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
                None
            }
            WindowEvent::MouseWheel { delta, .. } => Some(native::wheel_to_input(delta)),
            WindowEvent::Focused(false) => Some(InputEvent::FocusLost),
            WindowEvent::Occluded(occluded) => Some(InputEvent::VisibilityChanged { visible: !occluded }),
            _ => None,
        };

        match input {
            Some(input) => {
                self.viewer.handle_event(&input);
                true
            }
            None => false,
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.renderer.resize(new_size.width, new_size.height);
            self.viewer.resize(new_size.width, new_size.height);
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.viewer.tick();
        self.renderer.sync_scene(&mut self.viewer.scene);
        self.renderer.update_camera(&self.viewer.camera);

        let raw_input = self.egui_state.take_egui_input(&self.window);
        let output = ui::build_ui(&self.egui_ctx, raw_input, &self.viewer.readout);
        self.egui_state.handle_platform_output(&self.window, output.platform_output);
        let overlay = Overlay::new(&self.egui_ctx, output.shapes, output.textures_delta, output.pixels_per_point);

        self.renderer.draw_frame(overlay)
    }
}

fn run(config: ViewerConfig) -> Result<(), ViewerError> {
    let event_loop = EventLoop::new()?;
    let window_attributes = Window::default_attributes()
        .with_title(format!("kicia - {}", config.variant))
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
    let window = event_loop
        .create_window(window_attributes)
        .map_err(|e| ViewerError::Window(e.to_string()))?;
    let window = Arc::new(window);

    let mut app = pollster::block_on(App::new(window, &config))?;

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { ref event, window_id } if window_id == app.window.id() => {
            if !app.input(event) {
                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(physical_size) => app.resize(*physical_size),
                    WindowEvent::RedrawRequested => match app.render() {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            error!("GPU out of memory, exiting");
                            elwt.exit();
                        }
                        Err(e) => warn!(error = %e, "frame dropped"),
                    },
                    _ => {}
                }
            }
        }
        Event::AboutToWait => app.window.request_redraw(),
        _ => {}
    })?;
    Ok(())
}

fn main() {
    logging::init();

    let config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid arguments");
            std::process::exit(2);
        }
    };
    info!(variant = %config.variant, assets = %config.asset_root, msaa = config.render.msaa_samples, "starting viewer");

    if let Err(e) = run(config) {
        error!(error = %e, "viewer stopped");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_farmhouse_scene() {
        let config = Args::try_parse_from(["kicia"]).unwrap().into_config().unwrap();
        assert_eq!(config.variant, SceneVariant::Farmhouse);
        assert_eq!(config.asset_root, "resources");
        assert_eq!(config.models.len(), 2);
        assert_eq!(config.render.msaa_samples, 4);
    }

    #[test]
    fn flags_override_config() {
        let args = ["kicia", "--variant", "DOME", "--assets", "/srv/scenes", "--move-speed", "0.5", "--msaa", "1"];
        let config = Args::try_parse_from(args).unwrap().into_config().unwrap();
        assert_eq!(config.variant, SceneVariant::Dome);
        assert_eq!(config.models[0].path, "dome.glb");
        assert_eq!(config.asset_root, "/srv/scenes");
        assert_eq!(config.movement.speed, 0.5);
        assert_eq!(config.render.msaa_samples, 1);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Args::try_parse_from(["kicia", "--variant", "castle"]).is_err());
        let args = Args::try_parse_from(["kicia", "--msaa", "8"]).unwrap();
        assert_eq!(args.into_config().unwrap_err(), ConfigError::MsaaSamples(8));

        for bad in ["--move-speed=NaN", "--move-speed=inf", "--move-speed=-3", "--move-speed=0"] {
            let args = Args::try_parse_from(["kicia", bad]).unwrap();
            assert!(matches!(args.into_config(), Err(ConfigError::MoveSpeed(_))), "{bad} should be rejected");
        }
    }
}
