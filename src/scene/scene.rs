use glam::{Mat4, Vec3};
use winit::dpi::PhysicalSize;

use crate::asset::obj;
use crate::error::Error;
use crate::renderer::target::DEPTH_FORMAT;
use crate::renderer::vertex::{
    instance_layout, mesh_vertex_layout, quad_vertex_layout, InstanceData, MeshVertex, QuadVertex,
};
use crate::renderer::{
    Camera, GpuBuffer, IndexBuffer, PipelineOptions, RenderContext, ShaderProgram, ShaderStage,
    StageKind, Texture2D, UniformLocation,
};
use crate::scene::primitives;
use crate::settings::Settings;

const SCENE_VERT: &str = "shaders/scene.vert.wgsl";
const SCENE_FRAG: &str = "shaders/scene.frag.wgsl";
const POST_VERT: &str = "shaders/post.vert.wgsl";
const POST_FRAG: &str = "shaders/post.frag.wgsl";

/// Height of the ground-cube grid relative to the camera start.
const GROUND_HEIGHT: f32 = -3.0;
/// Where the loaded mesh sits, ahead of the starting view.
const MESH_OFFSET: Vec3 = Vec3::new(0.0, 0.0, -8.0);

/// Sharpen kernel; nine weights plus three floats of array-stride padding.
const SHARPEN_KERNEL: [f32; 12] = [
    0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0,
];

struct DrawItem {
    vertices: GpuBuffer<MeshVertex>,
    indices: IndexBuffer,
    instances: GpuBuffer<InstanceData>,
    instance_count: u32,
    texture_bind: wgpu::BindGroup,
    _texture: Texture2D,
}

/// Everything the demo draws, wired to its GPU resources at startup: the
/// instanced ground grid, the loaded mesh, and the full-screen quad the
/// post pass shades.
pub struct Scene {
    scene_program: ShaderProgram,
    post_program: ShaderProgram,

    ground: DrawItem,
    mesh: DrawItem,

    quad_vertices: GpuBuffer<QuadVertex>,
    quad_indices: IndexBuffer,

    // Uniform locations are resolved once here; the program itself does
    // not cache lookups.
    loc_view: UniformLocation,
    loc_projection: UniformLocation,
    loc_texel: UniformLocation,
}

impl Scene {
    pub fn new(context: &RenderContext, settings: &Settings) -> Result<Self, Error> {
        let device = &context.device;
        let queue = &context.queue;

        let scene_program = ShaderProgram::link(
            device,
            "Scene",
            ShaderStage::from_file(SCENE_VERT, StageKind::Vertex)?,
            ShaderStage::from_file(SCENE_FRAG, StageKind::Fragment)?,
            &[mesh_vertex_layout()?, instance_layout(2)?],
            &PipelineOptions {
                color_format: context.format(),
                depth_format: Some(DEPTH_FORMAT),
                cull_backfaces: true,
            },
        )?;

        let post_program = ShaderProgram::link(
            device,
            "Post",
            ShaderStage::from_file(POST_VERT, StageKind::Vertex)?,
            ShaderStage::from_file(POST_FRAG, StageKind::Fragment)?,
            &[quad_vertex_layout()?],
            &PipelineOptions {
                color_format: context.format(),
                depth_format: None,
                cull_backfaces: false,
            },
        )?;

        let ground = {
            let (vertices, indices) = primitives::ground_cube();
            let transforms = primitives::grid_transforms(
                settings.grid_width,
                settings.grid_depth,
                settings.grid_spacing,
                GROUND_HEIGHT,
            );
            let texture =
                Texture2D::from_path(device, queue, &settings.ground_texture, settings.anti_alias)?;
            DrawItem {
                vertices: GpuBuffer::vertex(device, "Ground.vbo", &vertices)?,
                indices: IndexBuffer::new(device, "Ground.ibo", &indices)?,
                instance_count: transforms.len() as u32,
                instances: GpuBuffer::vertex(device, "Ground.instances", &transforms)?,
                texture_bind: texture.bind_group(device, &scene_program),
                _texture: texture,
            }
        };

        let mesh = {
            let loaded = obj::load(&settings.mesh_path)?;
            log::info!(
                "mesh: {} unique vertices, {} indices",
                loaded.vertices.len(),
                loaded.indices.len()
            );
            let transform = [InstanceData::from_mat4(Mat4::from_translation(MESH_OFFSET))];
            let texture =
                Texture2D::from_path(device, queue, &settings.mesh_texture, settings.anti_alias)?;
            DrawItem {
                vertices: GpuBuffer::vertex(device, "Mesh.vbo", &loaded.vertices)?,
                indices: IndexBuffer::new(device, "Mesh.ibo", &loaded.indices)?,
                instances: GpuBuffer::vertex(device, "Mesh.instances", &transform)?,
                instance_count: 1,
                texture_bind: texture.bind_group(device, &scene_program),
                _texture: texture,
            }
        };

        let (quad_vertices, quad_indices) = primitives::fullscreen_quad();
        let quad_vertices = GpuBuffer::vertex(device, "Quad.vbo", &quad_vertices)?;
        let quad_indices = IndexBuffer::new(device, "Quad.ibo", &quad_indices)?;

        let loc_view = require_uniform(&scene_program, "view")?;
        let loc_projection = require_uniform(&scene_program, "projection")?;
        let loc_texel = require_uniform(&post_program, "texel")?;

        // The effect configuration never changes after startup.
        let loc_effect = require_uniform(&post_program, "effect")?;
        let loc_strength = require_uniform(&post_program, "strength")?;
        let loc_kernel = require_uniform(&post_program, "kernel")?;
        post_program.set_i32(queue, loc_effect, settings.post_effect);
        post_program.set_f32_array(queue, loc_strength, &[settings.post_strength]);
        post_program.set_f32_array(queue, loc_kernel, &SHARPEN_KERNEL);

        Ok(Self {
            scene_program,
            post_program,
            ground,
            mesh,
            quad_vertices,
            quad_indices,
            loc_view,
            loc_projection,
            loc_texel,
        })
    }

    pub fn post_program(&self) -> &ShaderProgram {
        &self.post_program
    }

    /// Uploads this frame's view and projection matrices.
    pub fn update_camera(&self, queue: &wgpu::Queue, camera: &Camera) {
        self.scene_program.set_mat4(queue, self.loc_view, camera.view());
        self.scene_program
            .set_mat4(queue, self.loc_projection, camera.projection());
    }

    /// Tells the post pass the current texel footprint; called at startup
    /// and whenever the render target is recreated.
    pub fn set_drawable_size(&self, queue: &wgpu::Queue, size: PhysicalSize<u32>) {
        let texel = [
            1.0 / size.width.max(1) as f32,
            1.0 / size.height.max(1) as f32,
        ];
        self.post_program.set_f32_array(queue, self.loc_texel, &texel);
    }

    /// Draws the 3D scene: the ground grid instanced, then the loaded mesh.
    pub fn draw_world(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.scene_program.bind(pass);

        for item in [&self.ground, &self.mesh] {
            pass.set_bind_group(1, &item.texture_bind, &[]);
            pass.set_vertex_buffer(0, item.vertices.raw().slice(..));
            pass.set_vertex_buffer(1, item.instances.raw().slice(..));
            item.indices.draw(pass, item.instance_count);
        }
    }

    /// Draws the full-screen quad, sampling the render target's color image
    /// through the post program.
    pub fn draw_post(&self, pass: &mut wgpu::RenderPass<'_>, target_bind: &wgpu::BindGroup) {
        self.post_program.bind(pass);
        pass.set_bind_group(1, target_bind, &[]);
        pass.set_vertex_buffer(0, self.quad_vertices.raw().slice(..));
        self.quad_indices.draw(pass, 1);
    }
}

fn require_uniform(program: &ShaderProgram, name: &str) -> Result<UniformLocation, Error> {
    program.uniform_location(name).ok_or_else(|| Error::ShaderLink {
        log: format!("program does not expose required uniform `{name}`"),
    })
}
