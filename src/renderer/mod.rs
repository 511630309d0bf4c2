pub mod buffer;
pub mod camera;
pub mod context;
pub mod shader;
pub mod target;
pub mod texture;
pub mod vertex;

pub use buffer::{DrawCommand, GpuBuffer, IndexBuffer};
pub use camera::Camera;
pub use context::RenderContext;
pub use shader::{PipelineOptions, ShaderProgram, ShaderStage, StageKind, UniformLocation};
pub use target::{RenderTarget, DEPTH_FORMAT};
pub use texture::Texture2D;
pub use vertex::{InstanceData, MeshVertex, QuadVertex, VertexLayout};
