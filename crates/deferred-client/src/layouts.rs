//! Bind group layouts shared by the pipelines and the bind groups built
//! against them.

use deferred_core::camera::{CameraUniform, ModelUniform};
use deferred_core::light::{LightConfig, LightExtent};

use crate::error::{checked, SetupError};

fn uniform_entry<T>(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
        },
        count: None,
    }
}

fn storage_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    read_only: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32, sample_type: wgpu::TextureSampleType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Model and camera uniforms for the G-buffer write pass.
pub fn scene_entries() -> [wgpu::BindGroupLayoutEntry; 2] {
    [
        uniform_entry::<ModelUniform>(0, wgpu::ShaderStages::VERTEX),
        uniform_entry::<CameraUniform>(1, wgpu::ShaderStages::VERTEX),
    ]
}

/// Normal, albedo and depth targets read with `textureLoad`.
pub fn gbuffer_entries() -> [wgpu::BindGroupLayoutEntry; 3] {
    [
        texture_entry(0, wgpu::TextureSampleType::Float { filterable: false }),
        texture_entry(1, wgpu::TextureSampleType::Float { filterable: false }),
        texture_entry(2, wgpu::TextureSampleType::Depth),
    ]
}

/// Light array, active count and camera for the lighting pass.
pub fn lights_entries() -> [wgpu::BindGroupLayoutEntry; 3] {
    let shared = wgpu::ShaderStages::FRAGMENT | wgpu::ShaderStages::COMPUTE;
    [
        storage_entry(0, shared, true),
        uniform_entry::<LightConfig>(1, shared),
        uniform_entry::<CameraUniform>(2, wgpu::ShaderStages::FRAGMENT),
    ]
}

/// Writable light array, active count and extent for the compute pass.
pub fn light_update_entries() -> [wgpu::BindGroupLayoutEntry; 3] {
    [
        storage_entry(0, wgpu::ShaderStages::COMPUTE, false),
        uniform_entry::<LightConfig>(1, wgpu::ShaderStages::COMPUTE),
        uniform_entry::<LightExtent>(2, wgpu::ShaderStages::COMPUTE),
    ]
}

pub struct BindGroupLayouts {
    pub scene: wgpu::BindGroupLayout,
    pub gbuffer: wgpu::BindGroupLayout,
    pub lights: wgpu::BindGroupLayout,
    pub light_update: wgpu::BindGroupLayout,
}

impl BindGroupLayouts {
    pub fn new(device: &wgpu::Device) -> Result<Self, SetupError> {
        Ok(Self {
            scene: create_layout(device, "Scene Uniforms Layout", &scene_entries())?,
            gbuffer: create_layout(device, "GBuffer Textures Layout", &gbuffer_entries())?,
            lights: create_layout(device, "Lights Layout", &lights_entries())?,
            light_update: create_layout(device, "Light Update Layout", &light_update_entries())?,
        })
    }
}

fn create_layout(
    device: &wgpu::Device,
    label: &'static str,
    entries: &[wgpu::BindGroupLayoutEntry],
) -> Result<wgpu::BindGroupLayout, SetupError> {
    checked(device, label, || {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries,
        })
    })
}
