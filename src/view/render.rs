use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;
use wgpu::*;

use crate::config::RenderConfig;
use crate::model::{Camera, LightRig, MeshBuffer, Scene};
use crate::view::gpu_init::GpuContext;
use crate::view::pipelines::{Layouts, Pipelines};
use crate::view::textures::{create_depth_texture, create_msaa_target, ShadowMap, SkyTexture};
use crate::view::uniforms::{CameraUniform, LightingUniform, ModelUniform, SkyUniform};

struct GpuObject {
    mesh: MeshBuffer,
    bind_group: BindGroup,
    cast_shadow: bool,
}

/// Tessellated egui output ready for the overlay pass
pub struct Overlay {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

impl Overlay {
    pub fn new(ctx: &egui::Context, shapes: Vec<egui::epaint::ClippedShape>, textures_delta: egui::TexturesDelta, pixels_per_point: f32) -> Self {
        Self { primitives: ctx.tessellate(shapes, pixels_per_point), textures_delta, pixels_per_point }
    }
}

/// Owns every GPU resource and draws shadow, sky, meshes and the overlay
pub struct Renderer {
    pub gpu: GpuContext,
    layouts: Layouts,
    pipelines: Pipelines,

    camera_buffer: Buffer,
    sky_buffer: Buffer,
    scene_bind_group: BindGroup,
    shadow_bind_group: BindGroup,
    shadow_map: ShadowMap,
    casts_shadows: bool,

    depth_view: TextureView,
    msaa_view: Option<TextureView>,

    objects: Vec<GpuObject>,
    sky_bind_group: Option<BindGroup>,
    clear_color: Color,

    egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub fn new(gpu: GpuContext, lights: &LightRig, render: &RenderConfig) -> Self {
        let device = &gpu.device;
        let samples = gpu.msaa_samples;
        let (width, height) = gpu.size();

        let layouts = Layouts::new(device);
        let pipelines = Pipelines::new(device, &layouts, gpu.format, samples);

        let camera_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("camera_buffer"),
            size: std::mem::size_of::<CameraUniform>() as BufferAddress,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let lighting_buffer = device.create_buffer_init(&util::BufferInitDescriptor {
            label: Some("lighting_buffer"),
            contents: bytemuck::bytes_of(&LightingUniform::from_rig(lights)),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let sky_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("sky_buffer"),
            size: std::mem::size_of::<SkyUniform>() as BufferAddress,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // without shadows a 1x1 map keeps the bind group valid
        let shadow_size = lights.sun.shadow.as_ref().map_or(1, |s| s.map_size);
        let shadow_map = ShadowMap::new(device, shadow_size);

        let scene_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout: &layouts.scene,
            entries: &[
                BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
                BindGroupEntry { binding: 1, resource: lighting_buffer.as_entire_binding() },
                BindGroupEntry { binding: 2, resource: BindingResource::TextureView(&shadow_map.view) },
                BindGroupEntry { binding: 3, resource: BindingResource::Sampler(&shadow_map.sampler) },
            ],
        });
        let shadow_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("shadow_bind_group"),
            layout: &layouts.shadow,
            entries: &[BindGroupEntry { binding: 0, resource: lighting_buffer.as_entire_binding() }],
        });

        let depth_view = create_depth_texture(device, width, height, samples);
        let msaa_view = create_msaa_target(device, gpu.format, width, height, samples);

        let egui_renderer = egui_wgpu::Renderer::new(device, gpu.format, egui_wgpu::RendererOptions::default());

        let [r, g, b, a] = render.clear_color;
        Self {
            layouts,
            pipelines,
            camera_buffer,
            sky_buffer,
            scene_bind_group,
            shadow_bind_group,
            shadow_map,
            casts_shadows: lights.casts_shadows(),
            depth_view,
            msaa_view,
            objects: Vec::new(),
            sky_bind_group: None,
            clear_color: Color { r, g, b, a },
            egui_renderer,
            gpu,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.gpu.size()
    }

    /// Reconfigure the surface and rebuild size-dependent targets
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        debug!(width, height, "renderer resized");
        self.gpu.resize(width, height);
        let samples = self.gpu.msaa_samples;
        self.depth_view = create_depth_texture(&self.gpu.device, width, height, samples);
        self.msaa_view = create_msaa_target(&self.gpu.device, self.gpu.format, width, height, samples);
    }

    pub fn update_camera(&self, camera: &Camera) {
        let queue = &self.gpu.queue;
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&CameraUniform::from_camera(camera)));
        queue.write_buffer(&self.sky_buffer, 0, bytemuck::bytes_of(&SkyUniform::from_camera(camera)));
    }

    /// Upload objects appended to the scene since the last call, and the
    /// skybox once it has arrived
    pub fn sync_scene(&mut self, scene: &mut Scene) {
        let device = &self.gpu.device;
        for object in scene.objects.iter().skip(self.objects.len()) {
            let uniform = ModelUniform::from_object(object);
            let buffer = device.create_buffer_init(&util::BufferInitDescriptor {
                label: Some(&format!("{}_transform", object.label)),
                contents: bytemuck::bytes_of(&uniform),
                usage: BufferUsages::UNIFORM,
            });
            let bind_group = device.create_bind_group(&BindGroupDescriptor {
                label: Some(&format!("{}_bind_group", object.label)),
                layout: &self.layouts.model,
                entries: &[BindGroupEntry { binding: 0, resource: buffer.as_entire_binding() }],
            });
            let mesh = object.mesh.upload(device, &object.label);
            debug!(object = %object.label, indices = mesh.index_count, "uploaded mesh");
            self.objects.push(GpuObject { mesh, bind_group, cast_shadow: object.cast_shadow });
        }

        if let Some(faces) = scene.take_skybox() {
            let sky = SkyTexture::upload(device, &self.gpu.queue, &faces);
            self.sky_bind_group = Some(device.create_bind_group(&BindGroupDescriptor {
                label: Some("sky_bind_group"),
                layout: &self.layouts.sky,
                entries: &[
                    BindGroupEntry { binding: 0, resource: self.sky_buffer.as_entire_binding() },
                    BindGroupEntry { binding: 1, resource: BindingResource::TextureView(&sky.view) },
                    BindGroupEntry { binding: 2, resource: BindingResource::Sampler(&sky.sampler) },
                ],
            }));
            info!(size = faces.size, "skybox uploaded");
        }
    }

    pub fn draw_frame(&mut self, overlay: Overlay) -> Result<(), SurfaceError> {
        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                warn!("surface lost, reconfiguring");
                self.gpu.reconfigure();
                return Ok(());
            }
            Err(SurfaceError::Timeout) => {
                warn!("timed out acquiring frame, skipping");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let (width, height) = self.gpu.size();
        let device = &self.gpu.device;
        let queue = &self.gpu.queue;
        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor { label: Some("encoder") });

        if self.casts_shadows {
            let mut shadow_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("shadow_pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(Operations { load: LoadOp::Clear(1.0), store: StoreOp::Store }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            shadow_pass.set_pipeline(&self.pipelines.shadow);
            shadow_pass.set_bind_group(0, &self.shadow_bind_group, &[]);
            for object in self.objects.iter().filter(|o| o.cast_shadow && o.mesh.index_count > 0) {
                shadow_pass.set_bind_group(1, &object.bind_group, &[]);
                shadow_pass.set_vertex_buffer(0, object.mesh.vertex_buffer.slice(..));
                shadow_pass.set_index_buffer(object.mesh.index_buffer.slice(..), IndexFormat::Uint32);
                shadow_pass.draw_indexed(0..object.mesh.index_count, 0, 0..1);
            }
        }

        {
            let (target, resolve_target, store) = match &self.msaa_view {
                Some(msaa) => (msaa, Some(&view), StoreOp::Discard),
                None => (&view, None, StoreOp::Store),
            };
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: Operations { load: LoadOp::Clear(self.clear_color), store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations { load: LoadOp::Clear(1.0), store: StoreOp::Store }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(sky) = &self.sky_bind_group {
                rp.set_pipeline(&self.pipelines.sky);
                rp.set_bind_group(0, sky, &[]);
                rp.draw(0..3, 0..1);
            }

            rp.set_pipeline(&self.pipelines.mesh);
            rp.set_bind_group(0, &self.scene_bind_group, &[]);
            for object in self.objects.iter().filter(|o| o.mesh.index_count > 0) {
                rp.set_bind_group(1, &object.bind_group, &[]);
                rp.set_vertex_buffer(0, object.mesh.vertex_buffer.slice(..));
                rp.set_index_buffer(object.mesh.index_buffer.slice(..), IndexFormat::Uint32);
                rp.draw_indexed(0..object.mesh.index_count, 0, 0..1);
            }
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: overlay.pixels_per_point,
        };

        // Upload egui textures
        for (id, image_delta) in &overlay.textures_delta.set {
            self.egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        let egui_commands =
            self.egui_renderer
                .update_buffers(device, queue, &mut encoder, &overlay.primitives, &screen_descriptor);

        // Render egui overlay
        {
            let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("egui_render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations { load: LoadOp::Load, store: StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.egui_renderer
                .render(&mut egui_pass.forget_lifetime(), &overlay.primitives, &screen_descriptor);
        }

        // Free egui textures
        for id in &overlay.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        queue.submit(egui_commands.into_iter().chain(std::iter::once(encoder.finish())));
        frame.present();
        Ok(())
    }
}
