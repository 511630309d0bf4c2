//! End-to-end accounting for the demo geometry: the ground cube's index
//! data is uploaded once and replicated purely through the instance count,
//! and the shipped sample mesh deduplicates to the expected flat list.

use std::fs;
use std::path::Path;

use wgpu_meadow::asset::obj;
use wgpu_meadow::renderer::DrawCommand;
use wgpu_meadow::scene::primitives;

#[test]
fn ground_grid_draw_is_one_instanced_call() {
    let (vertices, indices) = primitives::ground_cube();
    let transforms = primitives::grid_transforms(64, 64, 2.0, -3.0);

    // One cube's worth of buffer data, 4096 transforms.
    assert_eq!(vertices.len(), 24);
    assert_eq!(indices.len(), 36);
    assert_eq!(transforms.len(), 4096);

    let command = DrawCommand {
        index_count: indices.len() as u32,
        instance_count: transforms.len() as u32,
    };
    assert_eq!(command.index_count, 36);
    assert_eq!(command.instance_count, 4096);
    assert_eq!(command.total_indices(), 36 * 4096);
}

#[test]
fn sample_mesh_deduplicates_to_a_flat_indexed_list() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/obj/cube.obj");
    let source = fs::read_to_string(&path).expect("sample mesh is part of the repository");
    let mesh = obj::parse(&source).expect("sample mesh parses");

    // Six quad faces fan into twelve triangles; every (position, uv)
    // corner pair in the file is distinct, so nothing merges below 24.
    assert_eq!(mesh.vertices.len(), 24);
    assert_eq!(mesh.indices.len(), 36);
    assert!(mesh
        .indices
        .iter()
        .all(|&i| (i as usize) < mesh.vertices.len()));

    let command = DrawCommand {
        index_count: mesh.indices.len() as u32,
        instance_count: 1,
    };
    assert_eq!(command.total_indices(), 36);
}
