use glam::{Mat4, Vec3};

use crate::renderer::vertex::{v, InstanceData, MeshVertex, QuadVertex};

/// The ground cube: 24 vertices (four per face) with UVs mapping into a
/// three-band texture atlas — top face samples the top third, bottom face
/// the middle third, sides the bottom third. Spans -1..1 on every axis.
pub fn ground_cube() -> (Vec<MeshVertex>, Vec<u32>) {
    let third = 1.0 / 3.0;
    let two_thirds = 2.0 / 3.0;

    let vertices = vec![
        // Top (+Y)
        v([-1.0, 1.0, -1.0], [0.0, two_thirds]),
        v([1.0, 1.0, -1.0], [1.0, two_thirds]),
        v([1.0, 1.0, 1.0], [1.0, 1.0]),
        v([-1.0, 1.0, 1.0], [0.0, 1.0]),
        // Bottom (-Y)
        v([-1.0, -1.0, -1.0], [0.0, third]),
        v([1.0, -1.0, -1.0], [1.0, third]),
        v([1.0, -1.0, 1.0], [1.0, two_thirds]),
        v([-1.0, -1.0, 1.0], [0.0, two_thirds]),
        // Near (-Z)
        v([-1.0, 1.0, -1.0], [0.0, 0.0]),
        v([1.0, 1.0, -1.0], [1.0, 0.0]),
        v([1.0, -1.0, -1.0], [1.0, third]),
        v([-1.0, -1.0, -1.0], [0.0, third]),
        // Far (+Z)
        v([-1.0, 1.0, 1.0], [0.0, 0.0]),
        v([1.0, 1.0, 1.0], [1.0, 0.0]),
        v([1.0, -1.0, 1.0], [1.0, third]),
        v([-1.0, -1.0, 1.0], [0.0, third]),
        // Right (+X)
        v([1.0, 1.0, -1.0], [1.0, 0.0]),
        v([1.0, -1.0, -1.0], [1.0, third]),
        v([1.0, -1.0, 1.0], [0.0, third]),
        v([1.0, 1.0, 1.0], [0.0, 0.0]),
        // Left (-X)
        v([-1.0, 1.0, -1.0], [1.0, 0.0]),
        v([-1.0, -1.0, -1.0], [1.0, third]),
        v([-1.0, -1.0, 1.0], [0.0, third]),
        v([-1.0, 1.0, 1.0], [0.0, 0.0]),
    ];

    // Counter-clockwise seen from outside the cube.
    let indices = vec![
        2, 1, 0, 2, 0, 3, // top
        4, 5, 6, 7, 4, 6, // bottom
        8, 9, 10, 11, 8, 10, // near
        14, 13, 12, 14, 12, 15, // far
        18, 17, 16, 18, 16, 19, // right
        20, 21, 22, 23, 20, 22, // left
    ];

    (vertices, indices)
}

/// Full-screen quad in clip space with top-left-origin UVs.
pub fn fullscreen_quad() -> (Vec<QuadVertex>, Vec<u32>) {
    let vertices = vec![
        QuadVertex {
            position: [-1.0, -1.0],
            uv: [0.0, 1.0],
        },
        QuadVertex {
            position: [1.0, -1.0],
            uv: [1.0, 1.0],
        },
        QuadVertex {
            position: [1.0, 1.0],
            uv: [1.0, 0.0],
        },
        QuadVertex {
            position: [-1.0, 1.0],
            uv: [0.0, 0.0],
        },
    ];
    let indices = vec![0, 1, 2, 0, 2, 3];
    (vertices, indices)
}

/// One translation per ground cube, laid out as a centered `width` x
/// `depth` grid on the XZ plane at height `y`.
pub fn grid_transforms(width: u32, depth: u32, spacing: f32, y: f32) -> Vec<InstanceData> {
    let half_x = (width.saturating_sub(1)) as f32 * spacing * 0.5;
    let half_z = (depth.saturating_sub(1)) as f32 * spacing * 0.5;

    let mut transforms = Vec::with_capacity((width * depth) as usize);
    for x in 0..width {
        for z in 0..depth {
            let translation = Vec3::new(
                x as f32 * spacing - half_x,
                y,
                z as f32 * spacing - half_z,
            );
            transforms.push(InstanceData::from_mat4(Mat4::from_translation(translation)));
        }
    }
    transforms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_counts_look_right() {
        let (vertices, indices) = ground_cube();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn quad_counts_look_right() {
        let (vertices, indices) = fullscreen_quad();
        assert_eq!(vertices.len(), 4);
        assert_eq!(indices.len(), 6);
    }

    #[test]
    fn grid_yields_one_transform_per_cell() {
        let transforms = grid_transforms(64, 64, 2.0, -3.0);
        assert_eq!(transforms.len(), 4096);
    }

    #[test]
    fn grid_is_centered() {
        let transforms = grid_transforms(3, 3, 2.0, 0.0);
        // Translation lives in the last matrix column.
        let first = transforms[0].model[3];
        let last = transforms[8].model[3];
        assert_eq!(first[0], -last[0]);
        assert_eq!(first[2], -last[2]);
        // Middle cell sits at the origin.
        assert_eq!(transforms[4].model[3][0], 0.0);
        assert_eq!(transforms[4].model[3][2], 0.0);
    }
}
