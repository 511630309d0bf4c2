//! Headless checks that the shipped WGSL files compile, link, and expose
//! the uniform names the scene resolves at startup. Runs entirely through
//! naga — no GPU required.

use std::fs;
use std::path::Path;

use wgpu_meadow::renderer::{ShaderProgram, ShaderStage, StageKind};

fn stage(file: &str, kind: StageKind) -> ShaderStage {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders").join(file);
    let source = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    ShaderStage::compile(&source, kind)
        .unwrap_or_else(|e| panic!("failed to compile {file}: {e}"))
}

#[test]
fn scene_stages_compile_and_link() {
    let vs = stage("scene.vert.wgsl", StageKind::Vertex);
    let fs = stage("scene.frag.wgsl", StageKind::Fragment);
    ShaderProgram::validate_stages(&vs, &fs).expect("scene stages must link");
}

#[test]
fn post_stages_compile_and_link() {
    let vs = stage("post.vert.wgsl", StageKind::Vertex);
    let fs = stage("post.frag.wgsl", StageKind::Fragment);
    ShaderProgram::validate_stages(&vs, &fs).expect("post stages must link");
}

#[test]
fn scene_globals_hold_view_and_projection() {
    let vs = stage("scene.vert.wgsl", StageKind::Vertex);
    let blocks = vs.uniform_blocks();
    assert_eq!(blocks.len(), 1);

    let globals = &blocks[0];
    assert_eq!((globals.group, globals.binding), (0, 0));
    assert_eq!(globals.size, 128);

    let member = |name: &str| {
        globals
            .members
            .iter()
            .find(|m| m.name == name)
            .unwrap_or_else(|| panic!("scene globals missing `{name}`"))
    };
    assert_eq!((member("view").offset, member("view").size), (0, 64));
    assert_eq!(
        (member("projection").offset, member("projection").size),
        (64, 64)
    );
}

#[test]
fn post_uniforms_match_the_packed_layout() {
    let fs = stage("post.frag.wgsl", StageKind::Fragment);
    let blocks = fs.uniform_blocks();
    assert_eq!(blocks.len(), 1);

    let post = &blocks[0];
    assert_eq!((post.group, post.binding), (0, 0));
    assert_eq!(post.size, 64);

    let member = |name: &str| {
        post.members
            .iter()
            .find(|m| m.name == name)
            .unwrap_or_else(|| panic!("post uniforms missing `{name}`"))
    };
    // Nine weights vec4-packed into three rows.
    assert_eq!((member("kernel").offset, member("kernel").size), (0, 48));
    assert_eq!((member("texel").offset, member("texel").size), (48, 8));
    assert_eq!((member("effect").offset, member("effect").size), (56, 4));
    assert_eq!(
        (member("strength").offset, member("strength").size),
        (60, 4)
    );
}

#[test]
fn post_vertex_stage_feeds_every_fragment_input() {
    // Swapping the scene vertex stage in front of the post fragment stage
    // still satisfies location 0, so linking succeeds; a fragment stage in
    // the vertex slot must not.
    let scene_vs = stage("scene.vert.wgsl", StageKind::Vertex);
    let post_fs = stage("post.frag.wgsl", StageKind::Fragment);
    ShaderProgram::validate_stages(&scene_vs, &post_fs).expect("location interface is satisfied");

    let other_fs = stage("scene.frag.wgsl", StageKind::Fragment);
    assert!(ShaderProgram::validate_stages(&other_fs, &post_fs).is_err());
}
