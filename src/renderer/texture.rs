use std::path::Path;

use crate::error::Error;
use crate::renderer::shader::ShaderProgram;

/// A sampled 2D color texture with a full mipmap chain, decoded from an
/// image file at load time. Width, height and mip count are fixed after
/// construction; the chain is generated exactly once.
pub struct Texture2D {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    size: (u32, u32),
}

impl Texture2D {
    /// Decodes `path` and uploads it as an sRGB RGBA8 image. `anti_alias`
    /// selects linear filtering for both minification and magnification;
    /// otherwise nearest. Wrap mode is always repeat.
    pub fn from_path(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: impl AsRef<Path>,
        anti_alias: bool,
    ) -> Result<Self, Error> {
        let path = path.as_ref();
        log::info!("loading texture {}", path.display());

        let rgba = decode_rgba(path)?;
        let (width, height) = rgba.dimensions();

        Ok(Self::from_rgba8(
            device,
            queue,
            &rgba,
            width,
            height,
            anti_alias,
            path.to_str(),
        ))
    }

    /// Uploads raw RGBA8 pixels and generates the mip chain.
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &[u8],
        width: u32,
        height: u32,
        anti_alias: bool,
        label: Option<&str>,
    ) -> Self {
        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        let mip_level_count = mip_levels(width, height);
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            // RENDER_ATTACHMENT is required by the mip-chain blit.
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        generate_mipmaps(device, queue, &texture, mip_level_count, format);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let filter = if anti_alias {
            wgpu::FilterMode::Linear
        } else {
            wgpu::FilterMode::Nearest
        };
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label,
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: filter,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            size: (width, height),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn mip_level_count(&self) -> u32 {
        self.texture.mip_level_count()
    }

    /// The group-1 bind group that samples this texture through `program`.
    /// One texture is bound per draw.
    pub fn bind_group(&self, device: &wgpu::Device, program: &ShaderProgram) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Texture2D.bind"),
            layout: &program.texture_bind_group_layout(),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&self.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}

/// Decodes an image file to RGBA8 pixels. Split out of the upload path so
/// the failure mode is testable without a device.
pub fn decode_rgba(path: &Path) -> Result<image::RgbaImage, Error> {
    let img = image::open(path).map_err(|e| Error::TextureLoad {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    Ok(img.to_rgba8())
}

/// Mip levels for a full chain down to 1x1.
pub fn mip_levels(width: u32, height: u32) -> u32 {
    let max_dimension = width.max(height).max(1);
    u32::BITS - max_dimension.leading_zeros()
}

/// Fills mip levels 1.. by repeatedly downsampling the previous level with
/// a linear-filtered full-screen blit.
fn generate_mipmaps(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    mip_level_count: u32,
    format: wgpu::TextureFormat,
) {
    if mip_level_count <= 1 {
        return;
    }

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("MipBlit"),
        source: wgpu::ShaderSource::Wgsl(include_str!("blit.wgsl").into()),
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("MipBlit"),
        layout: None,
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("MipBlit"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    let mip_view = |level: u32| {
        texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("MipBlit.level"),
            base_mip_level: level,
            mip_level_count: Some(1),
            ..Default::default()
        })
    };

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("MipBlit"),
    });

    for target_mip in 1..mip_level_count {
        let source_view = mip_view(target_mip - 1);
        let target_view = mip_view(target_mip);

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("MipBlit"),
            layout: &pipeline.get_bind_group_layout(0),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&source_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("MipBlit"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target_view,
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
        });

        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    queue.submit(Some(encoder.finish()));
}
