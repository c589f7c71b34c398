use wgpu::util::DeviceExt;

use deferred_core::camera::{CameraUniform, ModelUniform, OrbitCamera, OrbitClock};

use crate::error::{checked, SetupError};
use crate::layouts::BindGroupLayouts;

/// Model and camera uniform buffers plus the scene bind group of the
/// G-buffer write pass.
pub struct ViewUniforms {
    pub scene_bind_group: wgpu::BindGroup,
    pub camera_buffer: wgpu::Buffer,
    pub model_buffer: wgpu::Buffer,
    camera: OrbitCamera,
    clock: OrbitClock,
}

impl ViewUniforms {
    pub fn new(
        device: &wgpu::Device,
        layouts: &BindGroupLayouts,
        width: u32,
        height: u32,
    ) -> Result<Self, SetupError> {
        let camera = OrbitCamera::for_viewport(width, height);
        let clock = OrbitClock::new();

        let model_buffer = checked(device, "Model Uniform Buffer", || {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Model Uniform Buffer"),
                contents: bytemuck::cast_slice(&[ModelUniform::default()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        })?;

        let initial = CameraUniform::from(camera.view_projection(clock.elapsed_ms()));
        let camera_buffer = checked(device, "Camera Uniform Buffer", || {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[initial]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        })?;

        let scene_bind_group = checked(device, "Scene Uniforms Bind Group", || {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Scene Uniforms Bind Group"),
                layout: &layouts.scene,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: model_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: camera_buffer.as_entire_binding(),
                    },
                ],
            })
        })?;

        Ok(Self {
            scene_bind_group,
            camera_buffer,
            model_buffer,
            camera,
            clock,
        })
    }

    /// Advance the orbit clock; it holds still while paused.
    pub fn advance(&mut self, dt_ms: f64, paused: bool) {
        self.clock.advance(dt_ms, paused);
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.clock.elapsed_ms()
    }

    /// Write the view-projection for the current orbit time.
    pub fn write_camera(&self, queue: &wgpu::Queue) {
        let uniform = CameraUniform::from(self.camera.view_projection(self.clock.elapsed_ms()));
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }
}
