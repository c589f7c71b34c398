use std::collections::HashMap;

use crate::error::{checked, SetupError};
use crate::gbuffer::{ALBEDO_FORMAT, DEPTH_FORMAT, NORMAL_FORMAT};
use crate::layouts::BindGroupLayouts;
use crate::mesh::vertex_layout;
use crate::shader::{ShaderLibrary, ShaderStage};

/// Vertices drawn by each full-screen quad pass (two triangles).
pub const QUAD_VERTEX_COUNT: u32 = 6;

/// Override constants for the debug view, set to the G-buffer size.
pub fn debug_view_constants(width: u32, height: u32) -> HashMap<String, f64> {
    HashMap::from([
        ("canvasSizeWidth".to_string(), width as f64),
        ("canvasSizeHeight".to_string(), height as f64),
    ])
}

/// Fixed-function state of the G-buffer write pass.
pub fn write_gbuffers_primitive() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: Some(wgpu::Face::Back),
        polygon_mode: wgpu::PolygonMode::Fill,
        unclipped_depth: false,
        conservative: false,
    }
}

pub fn write_gbuffers_depth() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Every pipeline the frame uses, built once at startup.
pub struct Pipelines {
    pub light_update: wgpu::ComputePipeline,
    pub deferred_rendering: wgpu::RenderPipeline,
    pub gbuffers_debug_view: wgpu::RenderPipeline,
    pub write_gbuffers: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        shaders: &ShaderLibrary,
        layouts: &BindGroupLayouts,
        output_format: wgpu::TextureFormat,
        gbuffer_size: (u32, u32),
    ) -> Result<Self, SetupError> {
        let write_gbuffers = create_write_gbuffers_pipeline(device, shaders, layouts)?;
        let gbuffers_debug_view =
            create_debug_view_pipeline(device, shaders, layouts, output_format, gbuffer_size)?;
        let deferred_rendering =
            create_deferred_rendering_pipeline(device, shaders, layouts, output_format)?;
        let light_update = create_light_update_pipeline(device, shaders, layouts)?;

        tracing::info!("Created 3 render pipelines and 1 compute pipeline");

        Ok(Self {
            light_update,
            deferred_rendering,
            gbuffers_debug_view,
            write_gbuffers,
        })
    }
}

fn create_module(
    device: &wgpu::Device,
    shaders: &ShaderLibrary,
    stage: ShaderStage,
) -> Result<wgpu::ShaderModule, SetupError> {
    checked(device, stage.file_name(), || shaders.create_module(device, stage))
}

fn create_layout(
    device: &wgpu::Device,
    label: &'static str,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
) -> Result<wgpu::PipelineLayout, SetupError> {
    checked(device, label, || {
        device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts,
            push_constant_ranges: &[],
        })
    })
}

fn opaque_target(format: wgpu::TextureFormat) -> Option<wgpu::ColorTargetState> {
    Some(wgpu::ColorTargetState {
        format,
        blend: None,
        write_mask: wgpu::ColorWrites::ALL,
    })
}

/// Rasterize the mesh into the normal and albedo targets with depth.
fn create_write_gbuffers_pipeline(
    device: &wgpu::Device,
    shaders: &ShaderLibrary,
    layouts: &BindGroupLayouts,
) -> Result<wgpu::RenderPipeline, SetupError> {
    let vertex_module = create_module(device, shaders, ShaderStage::VertexWriteGBuffers)?;
    let fragment_module = create_module(device, shaders, ShaderStage::FragmentWriteGBuffers)?;
    let layout = create_layout(device, "Write GBuffers Pipeline Layout", &[&layouts.scene])?;

    checked(device, "Write GBuffers Pipeline", || {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Write GBuffers Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some("main"),
                buffers: &[vertex_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some("main"),
                targets: &[opaque_target(NORMAL_FORMAT), opaque_target(ALBEDO_FORMAT)],
                compilation_options: Default::default(),
            }),
            primitive: write_gbuffers_primitive(),
            depth_stencil: Some(write_gbuffers_depth()),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    })
}

/// Full-screen quad showing depth, normal and albedo side by side.
fn create_debug_view_pipeline(
    device: &wgpu::Device,
    shaders: &ShaderLibrary,
    layouts: &BindGroupLayouts,
    output_format: wgpu::TextureFormat,
    (width, height): (u32, u32),
) -> Result<wgpu::RenderPipeline, SetupError> {
    let vertex_module = create_module(device, shaders, ShaderStage::VertexTextureQuad)?;
    let fragment_module = create_module(device, shaders, ShaderStage::FragmentGBuffersDebugView)?;
    let layout = create_layout(device, "GBuffers Debug View Pipeline Layout", &[&layouts.gbuffer])?;
    let constants = debug_view_constants(width, height);

    checked(device, "GBuffers Debug View Pipeline", || {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("GBuffers Debug View Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some("main"),
                buffers: &[], // Full-screen quad, no vertex buffer
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some("main"),
                targets: &[opaque_target(output_format)],
                compilation_options: wgpu::PipelineCompilationOptions {
                    constants: &constants,
                    ..Default::default()
                },
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    })
}

/// Full-screen quad lighting the G-buffer with the active lights.
fn create_deferred_rendering_pipeline(
    device: &wgpu::Device,
    shaders: &ShaderLibrary,
    layouts: &BindGroupLayouts,
    output_format: wgpu::TextureFormat,
) -> Result<wgpu::RenderPipeline, SetupError> {
    let vertex_module = create_module(device, shaders, ShaderStage::VertexTextureQuad)?;
    let fragment_module = create_module(device, shaders, ShaderStage::FragmentDeferredRendering)?;
    let layout = create_layout(
        device,
        "Deferred Rendering Pipeline Layout",
        &[&layouts.gbuffer, &layouts.lights],
    )?;

    checked(device, "Deferred Rendering Pipeline", || {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Deferred Rendering Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some("main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some("main"),
                targets: &[opaque_target(output_format)],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    })
}

fn create_light_update_pipeline(
    device: &wgpu::Device,
    shaders: &ShaderLibrary,
    layouts: &BindGroupLayouts,
) -> Result<wgpu::ComputePipeline, SetupError> {
    let module = create_module(device, shaders, ShaderStage::LightUpdate)?;
    let layout = create_layout(device, "Light Update Pipeline Layout", &[&layouts.light_update])?;

    checked(device, "Light Update Pipeline", || {
        device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Light Update Pipeline"),
            layout: Some(&layout),
            module: &module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        })
    })
}
