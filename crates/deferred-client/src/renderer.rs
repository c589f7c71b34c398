//! The renderer context: every GPU object the demo needs, created once, plus
//! the per-frame recording that walks a `FramePlan`.

use winit::dpi::PhysicalSize;
use winit::window::Window;

use deferred_core::frame::{FrameSequencer, PassStep};
use deferred_core::light::{LightError, LightRng, LightSet};
use deferred_core::settings::RuntimeSettings;

use crate::camera::ViewUniforms;
use crate::composite::{record_composite, CompositeInputs};
use crate::config::DemoConfig;
use crate::error::{FrameError, SetupError};
use crate::gbuffer::GBuffer;
use crate::gpu::GpuState;
use crate::layouts::BindGroupLayouts;
use crate::lights::LightStore;
use crate::mesh::{load_scene_mesh, GpuMesh};
use crate::pipelines::Pipelines;
use crate::shader::ShaderLibrary;

/// Owns all GPU handles. Fields are declared in reverse creation order so
/// they are released in reverse order on drop.
pub struct DeferredRenderer {
    sequencer: FrameSequencer,
    pipelines: Pipelines,
    lights: LightStore,
    view: ViewUniforms,
    gbuffer: GBuffer,
    mesh: GpuMesh,
    gpu: GpuState,
}

impl DeferredRenderer {
    /// Build every resource. Any failure aborts setup and drops what was
    /// already created.
    pub fn new(gpu: GpuState, config: &DemoConfig) -> Result<Self, SetupError> {
        let device = &gpu.device;
        let (width, height) = (gpu.width(), gpu.height());

        let shaders = ShaderLibrary::load(config.shaders.directory.as_deref())?;
        let layouts = BindGroupLayouts::new(device)?;

        let mesh_data = load_scene_mesh(config.mesh.path.as_deref(), config.mesh.scale)?;
        let mesh = GpuMesh::upload(device, &mesh_data)?;

        let gbuffer = GBuffer::new(device, &layouts.gbuffer, width, height)?;
        let view = ViewUniforms::new(device, &layouts, width, height)?;

        let (extent_min, extent_max) = config.lights.extent();
        let mut rng = LightRng::new(config.lights.seed);
        let mut set =
            LightSet::initialize(config.lights.capacity, extent_min, extent_max, &mut rng)?;
        set.set_active_count(config.lights.count)?;
        let lights = LightStore::new(device, &layouts, set, &view.camera_buffer)?;

        let pipelines = Pipelines::new(
            device,
            &shaders,
            &layouts,
            gpu.format(),
            (gbuffer.width(), gbuffer.height()),
        )?;

        let mut sequencer = FrameSequencer::new();
        sequencer.mark_ready();
        tracing::info!("Renderer ready at {}x{}", width, height);

        Ok(Self {
            sequencer,
            pipelines,
            lights,
            view,
            gbuffer,
            mesh,
            gpu,
        })
    }

    pub fn window(&self) -> &Window {
        &self.gpu.window
    }

    pub fn frames(&self) -> u64 {
        self.sequencer.frames()
    }

    pub fn consecutive_skips(&self) -> u32 {
        self.sequencer.consecutive_skips()
    }

    /// Physical size the surface and G-buffer were created at.
    pub fn surface_size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.gpu.width(), self.gpu.height())
    }

    pub fn light_capacity(&self) -> usize {
        self.lights.capacity()
    }

    pub fn active_lights(&self) -> usize {
        self.lights.active_count()
    }

    /// Push the active light count to the GPU.
    pub fn apply_settings(&mut self, settings: &RuntimeSettings) -> Result<(), LightError> {
        self.lights
            .set_active_count(&self.gpu.queue, settings.active_lights)
    }

    /// Record, submit and present one frame, then advance the orbit clock by
    /// `dt_ms`.
    pub fn render_frame(
        &mut self,
        settings: &RuntimeSettings,
        dt_ms: f64,
    ) -> Result<(), FrameError> {
        let plan = self.sequencer.begin_frame(
            settings.render_mode,
            settings.paused,
            self.lights.capacity(),
        )?;

        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                self.sequencer.end_frame(false)?;
                return Err(FrameError::SurfaceReconfigured);
            }
            Err(e) => {
                self.sequencer.end_frame(false)?;
                return Err(FrameError::Surface(e));
            }
        };
        let target = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        for step in plan.passes {
            match step {
                PassStep::WriteGBuffer => self.record_write_gbuffers(&mut encoder),
                PassStep::UpdateLights { workgroups } => {
                    self.lights
                        .record_update(&mut encoder, &self.pipelines.light_update, workgroups)
                }
                PassStep::Composite(mode) => record_composite(
                    mode,
                    &mut encoder,
                    &target,
                    &self.pipelines,
                    &CompositeInputs {
                        gbuffer: &self.gbuffer,
                        lights: &self.lights,
                    },
                ),
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        self.view.advance(dt_ms, settings.paused);
        if plan.update_camera {
            self.view.write_camera(&self.gpu.queue);
        }
        self.sequencer.end_frame(true)?;
        Ok(())
    }

    fn record_write_gbuffers(&self, encoder: &mut wgpu::CommandEncoder) {
        let color_attachments = self.gbuffer.color_attachments();
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Write GBuffers Pass"),
            color_attachments: &color_attachments,
            depth_stencil_attachment: Some(self.gbuffer.depth_attachment()),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipelines.write_gbuffers);
        pass.set_bind_group(0, &self.view.scene_bind_group, &[]);
        pass.set_vertex_buffer(0, self.mesh.vertex_buffer.slice(..));
        pass.set_index_buffer(self.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..self.mesh.index_count, 0, 0..1);
    }
}
