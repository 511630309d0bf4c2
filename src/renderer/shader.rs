use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;

use glam::Mat4;

use crate::error::Error;
use crate::renderer::vertex::VertexLayout;

/// Which pipeline stage a WGSL module is compiled for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    fn to_naga(self) -> naga::ShaderStage {
        match self {
            Self::Vertex => naga::ShaderStage::Vertex,
            Self::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

/// A member of a reflected uniform block, with its WGSL-layout byte offset.
#[derive(Clone, Debug)]
pub struct UniformMemberInfo {
    pub name: String,
    pub offset: u32,
    pub size: u32,
}

/// A uniform block reflected from a compiled stage.
#[derive(Clone, Debug)]
pub struct UniformBlockInfo {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    pub size: u32,
    pub members: Vec<UniformMemberInfo>,
}

/// One compiled shader stage: WGSL parsed and validated through naga, with
/// the entry point for its stage kind resolved.
#[derive(Debug)]
pub struct ShaderStage {
    module: naga::Module,
    info: naga::valid::ModuleInfo,
    entry_index: usize,
    entry_point: String,
    kind: StageKind,
}

impl ShaderStage {
    /// Parses and validates `source`. Failures carry naga's rendered,
    /// span-annotated diagnostic; a module without an entry point for
    /// `kind` is also a compile failure.
    pub fn compile(source: &str, kind: StageKind) -> Result<Self, Error> {
        let module = naga::front::wgsl::parse_str(source).map_err(|e| Error::ShaderCompile {
            log: e.emit_to_string(source),
        })?;

        let info = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::default(),
        )
        .validate(&module)
        .map_err(|e| Error::ShaderCompile {
            log: e.emit_to_string(source),
        })?;

        let (entry_index, entry_point) = module
            .entry_points
            .iter()
            .enumerate()
            .find(|(_, ep)| ep.stage == kind.to_naga())
            .map(|(i, ep)| (i, ep.name.clone()))
            .ok_or_else(|| Error::ShaderCompile {
                log: format!("module contains no {kind} entry point"),
            })?;

        Ok(Self {
            module,
            info,
            entry_index,
            entry_point,
            kind,
        })
    }

    /// Reads a stage from disk and compiles it. The file is read fully
    /// before compilation; diagnostics are prefixed with the path.
    pub fn from_file(path: impl AsRef<Path>, kind: StageKind) -> Result<Self, Error> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| Error::AssetLoad {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        Self::compile(&source, kind).map_err(|e| match e {
            Error::ShaderCompile { log } => Error::ShaderCompile {
                log: format!("{}:\n{log}", path.display()),
            },
            other => other,
        })
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Uniform blocks this stage's entry point actually references.
    pub fn uniform_blocks(&self) -> Vec<UniformBlockInfo> {
        let entry_info = self.info.get_entry_point(self.entry_index);
        let mut blocks = Vec::new();

        for (handle, var) in self.module.global_variables.iter() {
            if var.space != naga::AddressSpace::Uniform {
                continue;
            }
            if entry_info[handle].is_empty() {
                continue;
            }
            let Some(binding) = &var.binding else {
                continue;
            };
            let ty = &self.module.types[var.ty];
            let naga::TypeInner::Struct { members, span } = &ty.inner else {
                continue;
            };

            let name = var
                .name
                .clone()
                .or_else(|| ty.name.clone())
                .unwrap_or_else(|| format!("block{}", blocks.len()));

            let members = members
                .iter()
                .filter_map(|member| {
                    let name = member.name.clone()?;
                    let size = self.module.types[member.ty].inner.size(self.module.to_ctx());
                    Some(UniformMemberInfo {
                        name,
                        offset: member.offset,
                        size,
                    })
                })
                .collect();

            blocks.push(UniformBlockInfo {
                name,
                group: binding.group,
                binding: binding.binding,
                size: *span,
                members,
            });
        }

        blocks
    }

    fn entry_function(&self) -> &naga::Function {
        &self.module.entry_points[self.entry_index].function
    }

    fn input_locations(&self) -> BTreeSet<u32> {
        let mut locations = BTreeSet::new();
        for arg in &self.entry_function().arguments {
            collect_locations(&self.module, arg.ty, arg.binding.as_ref(), &mut locations);
        }
        locations
    }

    fn output_locations(&self) -> BTreeSet<u32> {
        let mut locations = BTreeSet::new();
        if let Some(result) = &self.entry_function().result {
            collect_locations(&self.module, result.ty, result.binding.as_ref(), &mut locations);
        }
        locations
    }
}

fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut BTreeSet<u32>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            out.insert(*location);
        }
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

/// Opaque handle to one named uniform value inside a linked program.
#[derive(Clone, Copy, Debug)]
pub struct UniformLocation {
    block: usize,
    offset: u32,
    size: u32,
}

impl UniformLocation {
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn size(&self) -> u32 {
        self.size
    }
}

/// Fixed-function state baked into a program at link time.
pub struct PipelineOptions {
    pub color_format: wgpu::TextureFormat,
    pub depth_format: Option<wgpu::TextureFormat>,
    pub cull_backfaces: bool,
}

struct UniformBlock {
    info: UniformBlockInfo,
    buffer: wgpu::Buffer,
}

/// A vertex and a fragment stage linked into an executable render pipeline.
///
/// Bind-group ABI: group 0 holds the program's uniform blocks (storage owned
/// by the program itself, so setters can never write into another program's
/// state); group 1 holds the texture + sampler pair bound per draw.
pub struct ShaderProgram {
    pipeline: wgpu::RenderPipeline,
    blocks: Vec<UniformBlock>,
    uniform_bind_group: Option<wgpu::BindGroup>,
}

impl ShaderProgram {
    /// Stage-kind and interface checks that do not need a device; `link`
    /// runs these first. Every fragment input location must be fed by a
    /// vertex output.
    pub fn validate_stages(vertex: &ShaderStage, fragment: &ShaderStage) -> Result<(), Error> {
        if vertex.kind != StageKind::Vertex {
            return Err(Error::ShaderLink {
                log: format!("expected a vertex stage, got a {} stage", vertex.kind),
            });
        }
        if fragment.kind != StageKind::Fragment {
            return Err(Error::ShaderLink {
                log: format!("expected a fragment stage, got a {} stage", fragment.kind),
            });
        }

        let outputs = vertex.output_locations();
        let orphans: Vec<u32> = fragment
            .input_locations()
            .into_iter()
            .filter(|loc| !outputs.contains(loc))
            .collect();
        if !orphans.is_empty() {
            return Err(Error::ShaderLink {
                log: format!(
                    "fragment inputs at locations {orphans:?} have no matching vertex outputs"
                ),
            });
        }

        Ok(())
    }

    /// Links two compiled stages into a pipeline over the given vertex
    /// buffer layouts, and allocates zeroed storage for every uniform block
    /// the stages reference.
    pub fn link(
        device: &wgpu::Device,
        label: &str,
        vertex: ShaderStage,
        fragment: ShaderStage,
        buffers: &[VertexLayout],
        options: &PipelineOptions,
    ) -> Result<Self, Error> {
        Self::validate_stages(&vertex, &fragment)?;

        let mut block_infos = vertex.uniform_blocks();
        for block in fragment.uniform_blocks() {
            let seen = block_infos
                .iter()
                .any(|b| b.group == block.group && b.binding == block.binding);
            if !seen {
                block_infos.push(block);
            }
        }
        if let Some(stray) = block_infos.iter().find(|b| b.group != 0) {
            return Err(Error::ShaderLink {
                log: format!(
                    "uniform block `{}` lives in bind group {}, but programs keep \
                     uniform blocks in group 0",
                    stray.name, stray.group
                ),
            });
        }

        let vs_entry = vertex.entry_point.clone();
        let fs_entry = fragment.entry_point.clone();

        let vs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label}.vs")),
            source: wgpu::ShaderSource::Naga(Cow::Owned(vertex.module)),
        });
        let fs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label}.fs")),
            source: wgpu::ShaderSource::Naga(Cow::Owned(fragment.module)),
        });

        let vertex_layouts: Vec<wgpu::VertexBufferLayout<'_>> =
            buffers.iter().map(VertexLayout::buffer_layout).collect();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: None,
            vertex: wgpu::VertexState {
                module: &vs_module,
                entry_point: Some(&vs_entry),
                buffers: &vertex_layouts,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &fs_module,
                entry_point: Some(&fs_entry),
                targets: &[Some(wgpu::ColorTargetState {
                    format: options.color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: options.cull_backfaces.then_some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: options.depth_format.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let blocks: Vec<UniformBlock> = block_infos
            .into_iter()
            .map(|info| {
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("{label}.{}", info.name)),
                    size: u64::from(info.size),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                UniformBlock { info, buffer }
            })
            .collect();

        let uniform_bind_group = if blocks.is_empty() {
            None
        } else {
            let entries: Vec<wgpu::BindGroupEntry<'_>> = blocks
                .iter()
                .map(|block| wgpu::BindGroupEntry {
                    binding: block.info.binding,
                    resource: block.buffer.as_entire_binding(),
                })
                .collect();
            Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{label}.uniforms")),
                layout: &pipeline.get_bind_group_layout(0),
                entries: &entries,
            }))
        };

        Ok(Self {
            pipeline,
            blocks,
            uniform_bind_group,
        })
    }

    /// Looks a uniform up by member name. Returns `None` for names absent
    /// from every block — never an error, since shader permutations may
    /// legitimately drop uniforms.
    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.blocks.iter().enumerate().find_map(|(index, block)| {
            block
                .info
                .members
                .iter()
                .find(|member| member.name == name)
                .map(|member| UniformLocation {
                    block: index,
                    offset: member.offset,
                    size: member.size,
                })
        })
    }

    /// Writes a column-major 4x4 matrix at `location`.
    pub fn set_mat4(&self, queue: &wgpu::Queue, location: UniformLocation, value: Mat4) {
        debug_assert!(location.size as usize >= 64);
        self.write(queue, location, bytemuck::bytes_of(&value.to_cols_array()));
    }

    /// Writes a contiguous run of f32 values starting at `location`. The
    /// values must fit the member's WGSL layout (arrays in uniform space
    /// have 16-byte element stride; pack accordingly).
    pub fn set_f32_array(&self, queue: &wgpu::Queue, location: UniformLocation, values: &[f32]) {
        debug_assert!(values.len() * 4 <= location.size as usize);
        self.write(queue, location, bytemuck::cast_slice(values));
    }

    /// Writes a single i32 at `location`.
    pub fn set_i32(&self, queue: &wgpu::Queue, location: UniformLocation, value: i32) {
        debug_assert!(location.size as usize >= 4);
        self.write(queue, location, bytemuck::bytes_of(&value));
    }

    fn write(&self, queue: &wgpu::Queue, location: UniformLocation, bytes: &[u8]) {
        queue.write_buffer(
            &self.blocks[location.block].buffer,
            u64::from(location.offset),
            bytes,
        );
    }

    /// Makes this program current on the pass: pipeline plus its group-0
    /// uniform bind group.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        if let Some(bind_group) = &self.uniform_bind_group {
            pass.set_bind_group(0, bind_group, &[]);
        }
    }

    /// Layout of the group-1 texture + sampler pair. Only meaningful for
    /// programs whose fragment stage samples a texture.
    pub fn texture_bind_group_layout(&self) -> wgpu::BindGroupLayout {
        self.pipeline.get_bind_group_layout(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_VS: &str = r#"
        struct Globals {
            view: mat4x4<f32>,
            projection: mat4x4<f32>,
        }

        @group(0) @binding(0)
        var<uniform> globals: Globals;

        struct VertexOut {
            @builtin(position) clip_position: vec4<f32>,
            @location(0) uv: vec2<f32>,
        }

        @vertex
        fn vs_main(@location(0) position: vec3<f32>, @location(1) uv: vec2<f32>) -> VertexOut {
            var out: VertexOut;
            out.clip_position = globals.projection * globals.view * vec4<f32>(position, 1.0);
            out.uv = uv;
            return out;
        }
    "#;

    const VALID_FS: &str = r#"
        @fragment
        fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
            return vec4<f32>(uv, 0.0, 1.0);
        }
    "#;

    const GREEDY_FS: &str = r#"
        @fragment
        fn fs_main(
            @location(0) uv: vec2<f32>,
            @location(3) tint: vec4<f32>,
        ) -> @location(0) vec4<f32> {
            return tint + vec4<f32>(uv, 0.0, 1.0);
        }
    "#;

    #[test]
    fn invalid_source_reports_nonempty_diagnostic() {
        let err = ShaderStage::compile("@vertex fn broken(", StageKind::Vertex);
        match err {
            Err(Error::ShaderCompile { log }) => assert!(!log.is_empty()),
            other => panic!("expected ShaderCompile, got {other:?}"),
        }
    }

    #[test]
    fn missing_entry_point_is_a_compile_error() {
        let err = ShaderStage::compile(VALID_FS, StageKind::Vertex);
        assert!(matches!(err, Err(Error::ShaderCompile { .. })));
    }

    #[test]
    fn valid_stages_pass_interface_checks() {
        let vs = ShaderStage::compile(VALID_VS, StageKind::Vertex).unwrap();
        let fs = ShaderStage::compile(VALID_FS, StageKind::Fragment).unwrap();
        assert!(ShaderProgram::validate_stages(&vs, &fs).is_ok());
    }

    #[test]
    fn swapped_stage_kinds_fail_linking() {
        let vs = ShaderStage::compile(VALID_VS, StageKind::Vertex).unwrap();
        let fs = ShaderStage::compile(VALID_FS, StageKind::Fragment).unwrap();
        assert!(matches!(
            ShaderProgram::validate_stages(&fs, &vs),
            Err(Error::ShaderLink { .. })
        ));
    }

    #[test]
    fn orphan_fragment_input_fails_linking() {
        let vs = ShaderStage::compile(VALID_VS, StageKind::Vertex).unwrap();
        let fs = ShaderStage::compile(GREEDY_FS, StageKind::Fragment).unwrap();
        match ShaderProgram::validate_stages(&vs, &fs) {
            Err(Error::ShaderLink { log }) => assert!(log.contains('3')),
            other => panic!("expected ShaderLink, got {other:?}"),
        }
    }

    #[test]
    fn uniform_members_follow_wgsl_layout() {
        let vs = ShaderStage::compile(VALID_VS, StageKind::Vertex).unwrap();
        let blocks = vs.uniform_blocks();
        assert_eq!(blocks.len(), 1);

        let block = &blocks[0];
        assert_eq!(block.group, 0);
        assert_eq!(block.binding, 0);
        assert_eq!(block.size, 128);

        let view = block.members.iter().find(|m| m.name == "view").unwrap();
        assert_eq!((view.offset, view.size), (0, 64));
        let projection = block
            .members
            .iter()
            .find(|m| m.name == "projection")
            .unwrap();
        assert_eq!((projection.offset, projection.size), (64, 64));
    }

    #[test]
    fn unused_uniform_blocks_are_not_reflected() {
        let fs = ShaderStage::compile(VALID_FS, StageKind::Fragment).unwrap();
        assert!(fs.uniform_blocks().is_empty());
    }
}
