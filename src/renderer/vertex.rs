use std::mem;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::error::Error;

/// Interleaved position + texture coordinate, the only per-vertex data the
/// scene shaders consume.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

#[inline]
pub fn v(position: [f32; 3], uv: [f32; 2]) -> MeshVertex {
    MeshVertex { position, uv }
}

/// Screen-space vertex for the full-screen post-processing quad.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

/// One per-instance 4x4 model matrix, column-major as glam stores it.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct InstanceData {
    pub model: [[f32; 4]; 4],
}

impl InstanceData {
    pub fn from_mat4(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
        }
    }
}

/// An ordered sequence of float-vector attribute descriptors for one vertex
/// buffer. Stride and per-attribute offsets grow as attributes are pushed;
/// shader locations are assigned sequentially from `base_location`.
///
/// The accumulated description is captured immutably when a program is
/// linked (`ShaderProgram::link` bakes it into the pipeline), so a layout is
/// applied exactly once per (buffer, program) pair — there is no ambient
/// bind state to re-describe.
pub struct VertexLayout {
    attributes: Vec<wgpu::VertexAttribute>,
    stride: u64,
    step_mode: wgpu::VertexStepMode,
    base_location: u32,
}

impl VertexLayout {
    /// A layout advanced once per vertex, locations starting at 0.
    pub fn per_vertex() -> Self {
        Self {
            attributes: Vec::new(),
            stride: 0,
            step_mode: wgpu::VertexStepMode::Vertex,
            base_location: 0,
        }
    }

    /// A layout advanced once per drawn instance. `base_location` continues
    /// the location sequence after the per-vertex layout it accompanies.
    pub fn per_instance(base_location: u32) -> Self {
        Self {
            attributes: Vec::new(),
            stride: 0,
            step_mode: wgpu::VertexStepMode::Instance,
            base_location,
        }
    }

    /// Appends one f32-vector attribute of `components` components (1 to 4)
    /// at the current end of the stride.
    pub fn push_attribute(&mut self, components: u32) -> Result<(), Error> {
        let format = match components {
            1 => wgpu::VertexFormat::Float32,
            2 => wgpu::VertexFormat::Float32x2,
            3 => wgpu::VertexFormat::Float32x3,
            4 => wgpu::VertexFormat::Float32x4,
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "vertex attribute must have 1 to 4 components, got {components}"
                )))
            }
        };

        self.attributes.push(wgpu::VertexAttribute {
            format,
            offset: self.stride,
            shader_location: self.base_location + self.attributes.len() as u32,
        });
        self.stride += u64::from(components) * mem::size_of::<f32>() as u64;
        Ok(())
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn attribute_offset(&self, index: usize) -> Option<u64> {
        self.attributes.get(index).map(|a| a.offset)
    }

    pub fn buffer_layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: self.step_mode,
            attributes: &self.attributes,
        }
    }
}

/// Layout for [`MeshVertex`] buffers: vec3 position, vec2 uv.
pub fn mesh_vertex_layout() -> Result<VertexLayout, Error> {
    let mut layout = VertexLayout::per_vertex();
    layout.push_attribute(3)?;
    layout.push_attribute(2)?;
    Ok(layout)
}

/// Layout for [`QuadVertex`] buffers: vec2 position, vec2 uv.
pub fn quad_vertex_layout() -> Result<VertexLayout, Error> {
    let mut layout = VertexLayout::per_vertex();
    layout.push_attribute(2)?;
    layout.push_attribute(2)?;
    Ok(layout)
}

/// Layout for [`InstanceData`] buffers: four vec4 columns of the model
/// matrix, stepped once per instance.
pub fn instance_layout(base_location: u32) -> Result<VertexLayout, Error> {
    let mut layout = VertexLayout::per_instance(base_location);
    for _ in 0..4 {
        layout.push_attribute(4)?;
    }
    Ok(layout)
}
