use winit::dpi::PhysicalSize;

use crate::error::Error;
use crate::renderer::shader::ShaderProgram;

/// Depth/stencil format shared by the target and the scene pipeline.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

const SKY: wgpu::Color = wgpu::Color {
    r: 0.53,
    g: 0.71,
    b: 0.92,
    a: 1.0,
};

/// Off-screen framebuffer: one color image, one combined depth/stencil
/// image, and the bind group that lets the post pass sample the color.
///
/// The extent is fixed at construction; resizing means building a new
/// target and assigning it over the old one. The old GPU resources are
/// dropped exactly once by that assignment — move semantics, no manual
/// release bookkeeping.
pub struct RenderTarget {
    _color: wgpu::Texture,
    color_view: wgpu::TextureView,
    _depth: wgpu::Texture,
    depth_view: wgpu::TextureView,
    _sampler: wgpu::Sampler,
    bind_group: wgpu::BindGroup,
    size: PhysicalSize<u32>,
}

impl RenderTarget {
    /// Allocates the color and depth/stencil images at `size` and wires
    /// the sampling bind group against `post_program`'s texture layout.
    pub fn new(
        device: &wgpu::Device,
        size: PhysicalSize<u32>,
        format: wgpu::TextureFormat,
        post_program: &ShaderProgram,
    ) -> Result<Self, Error> {
        validate_extent(size.width, size.height, device.limits().max_texture_dimension_2d)?;

        let extent = wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        };

        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("RenderTarget.color"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());

        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("RenderTarget.depth"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("RenderTarget.sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("RenderTarget.sample"),
            layout: &post_program.texture_bind_group_layout(),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        Ok(Self {
            _color: color,
            color_view,
            _depth: depth,
            depth_view,
            _sampler: sampler,
            bind_group,
            size,
        })
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// True when the drawable has changed to a usable size this target no
    /// longer matches. Zero-sized drawables (minimized window) are ignored.
    pub fn needs_resize(&self, drawable: PhysicalSize<u32>) -> bool {
        drawable.width > 0 && drawable.height > 0 && drawable != self.size
    }

    /// Group-1 bind group sampling this target's color image.
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Starts the pass that redirects draws into this target: color and
    /// depth cleared, depth testing active.
    pub fn begin_scene_pass<'encoder>(
        &self,
        encoder: &'encoder mut wgpu::CommandEncoder,
    ) -> wgpu::RenderPass<'encoder> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ScenePass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.color_view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(SKY),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Store,
                }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }

    /// Starts the pass that draws to the visible surface instead: color
    /// cleared, no depth attachment.
    pub fn begin_present_pass<'encoder>(
        encoder: &'encoder mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
    ) -> wgpu::RenderPass<'encoder> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("PresentPass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }
}

fn validate_extent(width: u32, height: u32, max_dimension: u32) -> Result<(), Error> {
    if width == 0 || height == 0 {
        return Err(Error::FramebufferIncomplete {
            detail: format!("zero-sized extent {width}x{height}"),
        });
    }
    if width > max_dimension || height > max_dimension {
        return Err(Error::FramebufferIncomplete {
            detail: format!(
                "extent {width}x{height} exceeds the device limit of {max_dimension}"
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_extents_are_incomplete() {
        assert!(matches!(
            validate_extent(0, 480, 8192),
            Err(Error::FramebufferIncomplete { .. })
        ));
        assert!(matches!(
            validate_extent(640, 0, 8192),
            Err(Error::FramebufferIncomplete { .. })
        ));
    }

    #[test]
    fn oversized_extents_are_incomplete() {
        assert!(matches!(
            validate_extent(9000, 480, 8192),
            Err(Error::FramebufferIncomplete { .. })
        ));
        assert!(validate_extent(8192, 8192, 8192).is_ok());
    }

    // Requires a GPU. Recreates the target across a resize round-trip and
    // checks exactly one color and one depth image stay alive.
    #[test]
    #[ignore]
    fn resize_round_trip_keeps_a_single_target() {
        pollster::block_on(async {
            use crate::renderer::shader::{PipelineOptions, ShaderProgram, ShaderStage, StageKind};
            use crate::renderer::vertex::quad_vertex_layout;

            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions::default())
                .await
                .expect("no adapter");
            let (device, _queue) = adapter
                .request_device(&wgpu::DeviceDescriptor::default())
                .await
                .expect("no device");

            let vs = ShaderStage::from_file("shaders/post.vert.wgsl", StageKind::Vertex)
                .expect("post vertex stage");
            let fs = ShaderStage::from_file("shaders/post.frag.wgsl", StageKind::Fragment)
                .expect("post fragment stage");
            let program = ShaderProgram::link(
                &device,
                "Post",
                vs,
                fs,
                &[quad_vertex_layout().expect("quad layout")],
                &PipelineOptions {
                    color_format: wgpu::TextureFormat::Bgra8Unorm,
                    depth_format: None,
                    cull_backfaces: false,
                },
            )
            .expect("post program");

            let format = wgpu::TextureFormat::Bgra8Unorm;
            let mut target = RenderTarget::new(
                &device,
                PhysicalSize::new(640, 480),
                format,
                &program,
            )
            .expect("initial target");

            for size in [
                PhysicalSize::new(1024, 768),
                PhysicalSize::new(640, 480),
            ] {
                assert!(target.needs_resize(size));
                // The assignment drops the previous target's color and
                // depth images before this scope ends; wgpu would raise a
                // validation error on a double release.
                target = RenderTarget::new(&device, size, format, &program)
                    .expect("recreated target");
                assert_eq!(target.size(), size);
            }

            assert!(!target.needs_resize(PhysicalSize::new(640, 480)));
            assert!(!target.needs_resize(PhysicalSize::new(0, 0)));
        });
    }
}
