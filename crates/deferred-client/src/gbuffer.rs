use crate::error::{checked, SetupError};

pub const NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const ALBEDO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8Unorm;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// Clear values for the G-buffer write pass.
pub const NORMAL_CLEAR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 1.0,
    a: 1.0,
};
pub const ALBEDO_CLEAR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};
pub const DEPTH_CLEAR: f32 = 1.0;

/// Surface size clamped so zero-sized windows still get valid textures.
pub fn target_extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: width.max(1),
        height: height.max(1),
        depth_or_array_layers: 1,
    }
}

/// One G-buffer render target and its default view.
pub struct GBufferTarget {
    pub view: wgpu::TextureView,
    pub texture: wgpu::Texture,
}

impl GBufferTarget {
    fn new(
        device: &wgpu::Device,
        label: &'static str,
        format: wgpu::TextureFormat,
        size: wgpu::Extent3d,
    ) -> Result<Self, SetupError> {
        let texture = checked(device, label, || {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
        })?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        tracing::debug!(
            "Allocated G-buffer target '{}': {:?} {}x{}",
            label,
            format,
            size.width,
            size.height
        );

        Ok(Self { view, texture })
    }
}

/// Normal, albedo and depth targets, fixed at the surface size for the run.
pub struct GBuffer {
    pub bind_group: wgpu::BindGroup,
    pub depth: GBufferTarget,
    pub albedo: GBufferTarget,
    pub normal: GBufferTarget,
    size: wgpu::Extent3d,
}

impl GBuffer {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        width: u32,
        height: u32,
    ) -> Result<Self, SetupError> {
        let size = target_extent(width, height);
        let normal = GBufferTarget::new(device, "GBuffer Normal", NORMAL_FORMAT, size)?;
        let albedo = GBufferTarget::new(device, "GBuffer Albedo", ALBEDO_FORMAT, size)?;
        let depth = GBufferTarget::new(device, "GBuffer Depth", DEPTH_FORMAT, size)?;

        let bind_group = checked(device, "GBuffer Textures Bind Group", || {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("GBuffer Textures Bind Group"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&normal.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&albedo.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&depth.view),
                    },
                ],
            })
        })?;

        tracing::info!("G-buffer created at {}x{}", size.width, size.height);

        Ok(Self {
            bind_group,
            depth,
            albedo,
            normal,
            size,
        })
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Color attachments in shader output order (normal, albedo).
    pub fn color_attachments(&self) -> [Option<wgpu::RenderPassColorAttachment<'_>>; 2] {
        [
            Some(wgpu::RenderPassColorAttachment {
                view: &self.normal.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(NORMAL_CLEAR),
                    store: wgpu::StoreOp::Store,
                },
            }),
            Some(wgpu::RenderPassColorAttachment {
                view: &self.albedo.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(ALBEDO_CLEAR),
                    store: wgpu::StoreOp::Store,
                },
            }),
        ]
    }

    pub fn depth_attachment(&self) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: &self.depth.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(DEPTH_CLEAR),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_extent_clamps_zero() {
        let e = target_extent(0, 0);
        assert_eq!((e.width, e.height, e.depth_or_array_layers), (1, 1, 1));
        let e = target_extent(1280, 720);
        assert_eq!((e.width, e.height), (1280, 720));
    }

    #[test]
    fn test_formats() {
        assert!(DEPTH_FORMAT.has_depth_aspect());
        assert!(!NORMAL_FORMAT.is_srgb());
        assert!(!ALBEDO_FORMAT.is_srgb());
    }

    #[test]
    fn test_clear_values() {
        assert_eq!(NORMAL_CLEAR.b, 1.0);
        assert_eq!(ALBEDO_CLEAR, wgpu::Color::BLACK);
        assert_eq!(DEPTH_CLEAR, 1.0);
    }
}
