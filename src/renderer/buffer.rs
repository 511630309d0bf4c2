use std::marker::PhantomData;

use bytemuck::Pod;
use wgpu::util::DeviceExt;

use crate::error::Error;

/// An immutable typed GPU buffer. Contents are uploaded once at construction
/// and never touched again; the wrapper is move-only, so the underlying
/// handle is released exactly once when it drops.
pub struct GpuBuffer<T: Pod> {
    buffer: wgpu::Buffer,
    len: u32,
    _contents: PhantomData<T>,
}

impl<T: Pod> GpuBuffer<T> {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        contents: &[T],
        usage: wgpu::BufferUsages,
    ) -> Result<Self, Error> {
        if contents.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "buffer `{label}` constructed from an empty sequence"
            )));
        }

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(contents),
            usage,
        });

        Ok(Self {
            buffer,
            len: contents.len() as u32,
            _contents: PhantomData,
        })
    }

    /// Vertex-buffer convenience used by every mesh and instance buffer.
    pub fn vertex(device: &wgpu::Device, label: &str, contents: &[T]) -> Result<Self, Error> {
        Self::new(device, label, contents, wgpu::BufferUsages::VERTEX)
    }

    pub fn raw(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        // Construction rejects empty contents, so this is always false; kept
        // for the conventional len/is_empty pairing.
        self.len == 0
    }
}

/// What one indexed draw asks of the GPU.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawCommand {
    pub index_count: u32,
    pub instance_count: u32,
}

impl DrawCommand {
    pub fn total_indices(self) -> u64 {
        u64::from(self.index_count) * u64::from(self.instance_count)
    }
}

/// A u32 element-index buffer for triangle-list geometry. Knows its index
/// count and issues the indexed draws, optionally instanced.
pub struct IndexBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl IndexBuffer {
    pub fn new(device: &wgpu::Device, label: &str, indices: &[u32]) -> Result<Self, Error> {
        if indices.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "index buffer `{label}` constructed from an empty sequence"
            )));
        }

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Ok(Self {
            buffer,
            count: indices.len() as u32,
        })
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// The command `draw` will encode for the given instance count.
    pub fn draw_command(&self, instances: u32) -> DrawCommand {
        DrawCommand {
            index_count: self.count,
            instance_count: instances,
        }
    }

    /// Binds this buffer on the pass and draws `count` indices, replicated
    /// `instances` times. Vertex buffers (including any per-instance buffer)
    /// must already be set on the pass.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, instances: u32) {
        let command = self.draw_command(instances);
        pass.set_index_buffer(self.buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..command.index_count, 0, 0..command.instance_count);
    }
}
