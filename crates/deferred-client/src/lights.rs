use wgpu::util::DeviceExt;

use deferred_core::light::{LightError, LightSet};

use crate::error::{checked, SetupError};
use crate::layouts::BindGroupLayouts;

/// GPU side of the light array: storage buffer, active-count uniform and
/// extent uniform, with bind groups for the lighting and compute passes.
/// The storage and extent buffers are held only through the bind groups.
pub struct LightStore {
    pub lights_bind_group: wgpu::BindGroup,
    pub update_bind_group: wgpu::BindGroup,
    config_buffer: wgpu::Buffer,
    set: LightSet,
}

impl LightStore {
    /// Upload the initial light set. `camera_buffer` is shared with the
    /// lighting pass for world-position reconstruction.
    pub fn new(
        device: &wgpu::Device,
        layouts: &BindGroupLayouts,
        set: LightSet,
        camera_buffer: &wgpu::Buffer,
    ) -> Result<Self, SetupError> {
        let storage_buffer = checked(device, "Lights Storage Buffer", || {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Lights Storage Buffer"),
                contents: bytemuck::cast_slice(set.records()),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            })
        })?;

        let config_buffer = checked(device, "Lights Config Buffer", || {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Lights Config Buffer"),
                contents: bytemuck::cast_slice(&[set.config()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        })?;

        let extent_buffer = checked(device, "Lights Extent Buffer", || {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Lights Extent Buffer"),
                contents: bytemuck::cast_slice(&[set.extent()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        })?;

        let lights_bind_group = checked(device, "Lights Bind Group", || {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Lights Bind Group"),
                layout: &layouts.lights,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: storage_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: config_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: camera_buffer.as_entire_binding(),
                    },
                ],
            })
        })?;

        let update_bind_group = checked(device, "Light Update Bind Group", || {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Light Update Bind Group"),
                layout: &layouts.light_update,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: storage_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: config_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: extent_buffer.as_entire_binding(),
                    },
                ],
            })
        })?;

        tracing::info!(
            "Light store ready: {} of {} lights active",
            set.active_count(),
            set.capacity()
        );

        Ok(Self {
            lights_bind_group,
            update_bind_group,
            config_buffer,
            set,
        })
    }

    pub fn capacity(&self) -> usize {
        self.set.capacity()
    }

    pub fn active_count(&self) -> usize {
        self.set.active_count()
    }

    pub fn workgroup_count(&self) -> u32 {
        self.set.workgroup_count()
    }

    /// Change the active prefix and write the new count to the uniform read by
    /// both the compute and lighting passes.
    pub fn set_active_count(&mut self, queue: &wgpu::Queue, n: usize) -> Result<(), LightError> {
        if n == self.set.active_count() {
            return Ok(());
        }
        self.set.set_active_count(n)?;
        queue.write_buffer(
            &self.config_buffer,
            0,
            bytemuck::cast_slice(&[self.set.config()]),
        );
        tracing::debug!("Active lights: {}", n);
        Ok(())
    }

    /// Record the compute dispatch that animates the lights.
    pub fn record_update(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pipeline: &wgpu::ComputePipeline,
        workgroups: u32,
    ) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Light Update Pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.update_bind_group, &[]);
        pass.dispatch_workgroups(workgroups, 1, 1);
    }
}
