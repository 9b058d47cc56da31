use egui::Context;

use crate::model::Camera;

pub fn format_camera_position(camera: &Camera) -> String {
    let p = camera.position;
    format!("Camera Position: x={:.2}, y={:.2}, z={:.2}", p.x, p.y, p.z)
}

/// On-screen camera position text. Stays empty until the first refresh.
#[derive(Debug, Default, Clone)]
pub struct CameraReadout {
    text: String,
}

impl CameraReadout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh(&mut self, camera: &Camera) {
        self.text = format_camera_position(camera);
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Build the overlay for one frame and return egui output
pub fn build_ui(egui_ctx: &Context, raw_input: egui::RawInput, readout: &CameraReadout) -> egui::FullOutput {
    egui_ctx.run(raw_input, |ctx| {
        draw_readout(ctx, readout);
    })
}

/// Browser frames have no egui-winit; build the input from the canvas size
pub fn raw_input_for_canvas(width: u32, height: u32, pixels_per_point: f32, now_ms: f64) -> egui::RawInput {
    let mut raw_input = egui::RawInput::default();
    raw_input.time = Some(now_ms / 1000.0);
    raw_input.screen_rect = Some(egui::Rect::from_min_size(
        egui::Pos2::new(0.0, 0.0),
        egui::vec2(width as f32 / pixels_per_point, height as f32 / pixels_per_point),
    ));
    if let Some(viewport) = raw_input.viewports.get_mut(&egui::ViewportId::ROOT) {
        viewport.native_pixels_per_point = Some(pixels_per_point);
    }
    raw_input
}

fn draw_readout(ctx: &Context, readout: &CameraReadout) {
    if readout.text().is_empty() {
        return;
    }
    egui::Area::new(egui::Id::new("camera_readout"))
        .fixed_pos(egui::pos2(10.0, 10.0))
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::new()
                .fill(egui::Color32::from_rgba_unmultiplied(0, 0, 0, 128))
                .inner_margin(egui::Margin::same(5))
                .show(ui, |ui| {
                    ui.label(egui::RichText::new(readout.text()).color(egui::Color32::WHITE).monospace());
                });
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use glam::Vec3;

    #[test]
    fn formats_two_decimals() {
        let config = CameraConfig { position: Vec3::new(-2.0, 40.0, -181.0), ..Default::default() };
        let camera = Camera::new(800, 600, &config);
        assert_eq!(format_camera_position(&camera), "Camera Position: x=-2.00, y=40.00, z=-181.00");
    }

    #[test]
    fn readout_is_empty_until_refreshed() {
        let mut readout = CameraReadout::new();
        assert_eq!(readout.text(), "");

        let mut camera = Camera::new(800, 600, &CameraConfig::default());
        camera.position = Vec3::new(1.234, 0.006, -7.0);
        readout.refresh(&camera);
        assert_eq!(readout.text(), "Camera Position: x=1.23, y=0.01, z=-7.00");
    }

    #[test]
    fn overlay_runs_headless() {
        let ctx = Context::default();
        let mut readout = CameraReadout::new();
        readout.refresh(&Camera::new(800, 600, &CameraConfig::default()));
        let raw = raw_input_for_canvas(800, 600, 1.0, 0.0);
        let output = build_ui(&ctx, raw, &readout);
        assert!(!output.shapes.is_empty());
    }
}
