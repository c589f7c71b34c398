//! The two final passes: lit output or G-buffer debug view. Both read the same
//! inputs and draw a full-screen quad into the surface image.

use deferred_core::settings::RenderMode;

use crate::gbuffer::GBuffer;
use crate::lights::LightStore;
use crate::pipelines::{Pipelines, QUAD_VERTEX_COUNT};

pub const COMPOSITE_CLEAR: wgpu::Color = wgpu::Color::BLACK;

/// Resources both composite passes read.
pub struct CompositeInputs<'a> {
    pub gbuffer: &'a GBuffer,
    pub lights: &'a LightStore,
}

pub fn record_composite(
    mode: RenderMode,
    encoder: &mut wgpu::CommandEncoder,
    target: &wgpu::TextureView,
    pipelines: &Pipelines,
    inputs: &CompositeInputs<'_>,
) {
    match mode {
        RenderMode::GBufferView => {
            record_gbuffer_debug_view(encoder, target, &pipelines.gbuffers_debug_view, inputs)
        }
        RenderMode::Rendering => {
            record_deferred_lighting(encoder, target, &pipelines.deferred_rendering, inputs)
        }
    }
}

fn begin_quad_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    target: &wgpu::TextureView,
    label: &'static str,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(COMPOSITE_CLEAR),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

/// Depth, normal and albedo in three vertical bands.
pub fn record_gbuffer_debug_view(
    encoder: &mut wgpu::CommandEncoder,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    inputs: &CompositeInputs<'_>,
) {
    let mut pass = begin_quad_pass(encoder, target, "GBuffers Debug View Pass");
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, &inputs.gbuffer.bind_group, &[]);
    pass.draw(0..QUAD_VERTEX_COUNT, 0..1);
}

/// Light every pixel with the active prefix of the light array.
pub fn record_deferred_lighting(
    encoder: &mut wgpu::CommandEncoder,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    inputs: &CompositeInputs<'_>,
) {
    let mut pass = begin_quad_pass(encoder, target, "Deferred Rendering Pass");
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, &inputs.gbuffer.bind_group, &[]);
    pass.set_bind_group(1, &inputs.lights.lights_bind_group, &[]);
    pass.draw(0..QUAD_VERTEX_COUNT, 0..1);
}
