//! Minimal loader for triangulated OBJ meshes carrying positions and
//! texture coordinates. Faces may be triangles or convex polygons (fanned),
//! with 1-based or negative `v/vt[/vn]` corner indices. Normals are parsed
//! past but ignored; the scene shaders do not consume them.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::Error;
use crate::renderer::vertex::MeshVertex;

/// A flat indexed vertex list ready for upload.
#[derive(Debug, Default)]
pub struct ObjMesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

/// Parse failure with the 1-based source line it happened on.
#[derive(Debug)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Reads and parses an OBJ file.
pub fn load(path: impl AsRef<Path>) -> Result<ObjMesh, Error> {
    let path = path.as_ref();
    log::info!("loading mesh {}", path.display());

    let source = fs::read_to_string(path).map_err(|e| Error::AssetLoad {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    parse(&source).map_err(|e| Error::AssetLoad {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Dedup key: exact bit patterns of a corner's position and flipped uv.
#[derive(Hash, PartialEq, Eq)]
struct CornerKey {
    position: [u32; 3],
    uv: [u32; 2],
}

impl CornerKey {
    fn new(vertex: &MeshVertex) -> Self {
        Self {
            position: vertex.position.map(f32::to_bits),
            uv: vertex.uv.map(f32::to_bits),
        }
    }
}

/// Parses OBJ source text. Corners sharing a (position, uv) pair collapse
/// to a single vertex through a hash map, so building the index list is
/// amortized O(1) per corner.
pub fn parse(source: &str) -> Result<ObjMesh, ParseError> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();

    let mut mesh = ObjMesh::default();
    let mut seen: HashMap<CornerKey, u32> = HashMap::new();

    for (number, raw_line) in source.lines().enumerate() {
        let number = number + 1;
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let keyword = tokens.next().unwrap_or("");
        let rest: Vec<&str> = tokens.collect();

        match keyword {
            "v" => positions.push(parse_floats::<3>(&rest, number)?),
            "vt" => {
                let [u, v_coord] = parse_floats::<2>(&rest, number)?;
                // OBJ puts the V origin at the bottom; textures sample
                // top-down.
                uvs.push([u, 1.0 - v_coord]);
            }
            "f" => {
                if rest.len() < 3 {
                    return Err(ParseError {
                        line: number,
                        message: format!("face needs at least 3 corners, has {}", rest.len()),
                    });
                }

                let mut face = Vec::with_capacity(rest.len());
                for corner in &rest {
                    let vertex = resolve_corner(corner, &positions, &uvs, number)?;
                    let index = *seen.entry(CornerKey::new(&vertex)).or_insert_with(|| {
                        mesh.vertices.push(vertex);
                        (mesh.vertices.len() - 1) as u32
                    });
                    face.push(index);
                }

                for i in 2..face.len() {
                    mesh.indices.extend_from_slice(&[face[0], face[i - 1], face[i]]);
                }
            }
            // Groups, materials, smoothing, normals: irrelevant here.
            _ => {}
        }
    }

    if mesh.indices.is_empty() {
        return Err(ParseError {
            line: source.lines().count(),
            message: "no faces found".into(),
        });
    }

    Ok(mesh)
}

fn parse_floats<const N: usize>(tokens: &[&str], line: usize) -> Result<[f32; N], ParseError> {
    if tokens.len() < N {
        return Err(ParseError {
            line,
            message: format!("expected {N} components, found {}", tokens.len()),
        });
    }
    let mut out = [0.0f32; N];
    for (slot, token) in out.iter_mut().zip(tokens) {
        *slot = token.parse().map_err(|_| ParseError {
            line,
            message: format!("malformed number `{token}`"),
        })?;
    }
    Ok(out)
}

fn resolve_corner(
    corner: &str,
    positions: &[[f32; 3]],
    uvs: &[[f32; 2]],
    line: usize,
) -> Result<MeshVertex, ParseError> {
    let mut parts = corner.split('/');
    let position_index = parts.next().unwrap_or("");
    let uv_index = parts.next().unwrap_or("");

    let position = lookup(position_index, positions, line, "vertex")?;
    if uv_index.is_empty() {
        return Err(ParseError {
            line,
            message: format!("corner `{corner}` has no texture coordinate"),
        });
    }
    let uv = lookup(uv_index, uvs, line, "texture coordinate")?;

    Ok(MeshVertex { position, uv })
}

fn lookup<T: Copy>(
    token: &str,
    pool: &[T],
    line: usize,
    what: &str,
) -> Result<T, ParseError> {
    let index: i64 = token.parse().map_err(|_| ParseError {
        line,
        message: format!("malformed {what} index `{token}`"),
    })?;

    let resolved = if index > 0 {
        index - 1
    } else if index < 0 {
        pool.len() as i64 + index
    } else {
        return Err(ParseError {
            line,
            message: format!("{what} indices are 1-based, got 0"),
        });
    };

    usize::try_from(resolved)
        .ok()
        .and_then(|i| pool.get(i).copied())
        .ok_or_else(|| ParseError {
            line,
            message: format!("{what} index {index} out of range (pool has {})", pool.len()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_TRIANGLES: &str = "\
# a unit quad split into two triangles sharing an edge
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
f 1/1 2/2 3/3
f 1/1 3/3 4/4
";

    #[test]
    fn shared_corners_are_deduplicated() {
        let mesh = parse(TWO_TRIANGLES).unwrap();
        // Six corners, four unique (position, uv) pairs.
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn same_position_different_uv_stays_distinct() {
        let source = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
vt 0.0 0.0
vt 1.0 1.0
f 1/1 2/1 3/2
f 1/2 2/1 3/2
";
        let mesh = parse(source).unwrap();
        // Corner 1 appears with two uvs; everything else is shared.
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
    }

    #[test]
    fn quads_are_fan_triangulated() {
        let source = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
f 1/1 2/1 3/1 4/1
";
        let mesh = parse(source).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn v_coordinate_is_flipped() {
        let source = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
vt 0.0 0.25
f 1/1 2/1 3/1
";
        let mesh = parse(source).unwrap();
        assert!((mesh.vertices[0].uv[1] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn negative_indices_count_from_the_end() {
        let source = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
vt 0.5 0.5
f -3/-1 -2/-1 -1/-1
";
        let mesh = parse(source).unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.vertices[2].position, [1.0, 1.0, 0.0]);
    }

    #[test]
    fn corner_without_uv_is_rejected() {
        let source = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
f 1 2 3
";
        let err = parse(source).unwrap_err();
        assert!(err.message.contains("texture coordinate"));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let source = "\
v 0.0 0.0 0.0
vt 0.0 0.0
f 1/1 2/1 3/1
";
        let err = parse(source).unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.message.contains("out of range"));
    }

    #[test]
    fn empty_source_is_rejected() {
        assert!(parse("# nothing here\n").is_err());
    }

    #[test]
    fn missing_file_carries_the_path() {
        match load("assets/obj/no-such-mesh.obj") {
            Err(Error::AssetLoad { path, .. }) => {
                assert!(path.ends_with("no-such-mesh.obj"));
            }
            other => panic!("expected AssetLoad, got {other:?}"),
        }
    }
}
