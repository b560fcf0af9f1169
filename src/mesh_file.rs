//! STL mesh loading for attached payloads.
//!
//! Both ASCII and binary STL are accepted. A file is treated as ASCII when it
//! starts with `solid` and its first 80 bytes contain no NUL byte; binary
//! headers frequently start with `solid` too, but are padded with zeros.
//!
//! Vertices are not deduplicated: each triangle contributes three vertices.

use crate::error::{BridgeError, Result};
use glam::Vec3;
use std::path::Path;

/// STL binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// One binary triangle: normal, three vertices and the attribute count.
const TRIANGLE_SIZE: usize = 50;

/// Triangle soup read from a mesh file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl MeshData {
    fn push_triangle(&mut self, corners: [Vec3; 3]) -> Result<()> {
        let base = u32::try_from(self.vertices.len())
            .map_err(|_| BridgeError::mesh_file("mesh has more than u32::MAX vertices"))?;
        self.vertices.extend_from_slice(&corners);
        self.triangles.push([base, base + 1, base + 2]);
        Ok(())
    }
}

/// Loads an STL file, detecting ASCII or binary encoding.
pub fn load_stl<P: AsRef<Path>>(path: P) -> Result<MeshData> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "loading STL mesh");
    parse_stl(&bytes)
}

/// Parses STL content already held in memory.
pub fn parse_stl(bytes: &[u8]) -> Result<MeshData> {
    if bytes.len() < 6 {
        return Err(BridgeError::mesh_file("file too small to be valid STL"));
    }

    let head = &bytes[..bytes.len().min(HEADER_SIZE)];
    let looks_ascii = String::from_utf8_lossy(head).trim_start().starts_with("solid");
    if looks_ascii && !head.contains(&0) {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| BridgeError::mesh_file(format!("ASCII STL is not UTF-8: {e}")))?;
        parse_ascii(text)
    } else {
        parse_binary(bytes)
    }
}

fn parse_binary(bytes: &[u8]) -> Result<MeshData> {
    if bytes.len() < HEADER_SIZE + 4 {
        return Err(BridgeError::mesh_file(format!(
            "binary STL header needs {} bytes, got {}",
            HEADER_SIZE + 4,
            bytes.len()
        )));
    }

    let count_bytes = [
        bytes[HEADER_SIZE],
        bytes[HEADER_SIZE + 1],
        bytes[HEADER_SIZE + 2],
        bytes[HEADER_SIZE + 3],
    ];
    let face_count = u32::from_le_bytes(count_bytes) as usize;
    let body = &bytes[HEADER_SIZE + 4..];
    if body.len() < face_count * TRIANGLE_SIZE {
        return Err(BridgeError::mesh_file(format!(
            "binary STL declares {face_count} triangles but holds {}",
            body.len() / TRIANGLE_SIZE
        )));
    }

    let mut mesh = MeshData {
        vertices: Vec::with_capacity(face_count * 3),
        triangles: Vec::with_capacity(face_count),
    };
    for triangle in body.chunks_exact(TRIANGLE_SIZE).take(face_count) {
        // Skip the stored normal.
        mesh.push_triangle([
            read_vertex(&triangle[12..24]),
            read_vertex(&triangle[24..36]),
            read_vertex(&triangle[36..48]),
        ])?;
    }
    Ok(mesh)
}

fn read_vertex(buf: &[u8]) -> Vec3 {
    let component = |i: usize| f32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);
    Vec3::new(component(0), component(4), component(8))
}

fn parse_ascii(text: &str) -> Result<MeshData> {
    let mut mesh = MeshData::default();
    let mut corners: Vec<Vec3> = Vec::with_capacity(3);
    let mut in_loop = false;

    for (line_no, line) in text.lines().enumerate() {
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };

        match keyword.to_ascii_lowercase().as_str() {
            "outer" => {
                in_loop = true;
                corners.clear();
            }
            "vertex" if in_loop => {
                let mut coord = || -> Result<f32> {
                    let line = line_no + 1;
                    let token = parts.next().ok_or_else(|| {
                        BridgeError::mesh_file(format!("line {line}: vertex needs 3 coordinates"))
                    })?;
                    token.parse().map_err(|e| {
                        let reason = format!("line {line}: bad coordinate '{token}': {e}");
                        BridgeError::mesh_file(reason)
                    })
                };
                let (x, y, z) = (coord()?, coord()?, coord()?);
                corners.push(Vec3::new(x, y, z));
            }
            "endloop" => in_loop = false,
            "endfacet" => {
                if let [a, b, c] = corners[..] {
                    mesh.push_triangle([a, b, c])?;
                } else {
                    return Err(BridgeError::mesh_file(format!(
                        "line {}: facet with {} vertices",
                        line_no + 1,
                        corners.len()
                    )));
                }
                corners.clear();
            }
            "endsolid" => break,
            _ => {}
        }
    }

    Ok(mesh)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    const TETRA_FACE: &str = "solid tri
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid tri
";

    fn binary_stl(triangles: &[[Vec3; 3]]) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_SIZE];
        bytes[..5].copy_from_slice(b"solid");
        bytes.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for tri in triangles {
            bytes.extend_from_slice(&[0u8; 12]);
            for v in tri {
                for c in v.to_array() {
                    bytes.extend_from_slice(&c.to_le_bytes());
                }
            }
            bytes.extend_from_slice(&[0u8; 2]);
        }
        bytes
    }

    #[test]
    fn ascii_single_facet() {
        let mesh = parse_stl(TETRA_FACE.as_bytes()).unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
        assert_eq!(mesh.vertices[1], Vec3::X);
    }

    #[test]
    fn binary_with_solid_header() {
        let tri = [Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 3.0, 0.0)];
        let mesh = parse_stl(&binary_stl(&[tri, tri])).unwrap();
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [3, 4, 5]]);
        assert_eq!(mesh.vertices[4], Vec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn truncated_binary_fails() {
        let tri = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let mut bytes = binary_stl(&[tri]);
        bytes.truncate(bytes.len() - 10);
        let err = parse_stl(&bytes).unwrap_err();
        assert!(matches!(err, BridgeError::MeshFile(_)));
    }

    #[test]
    fn load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TETRA_FACE.as_bytes()).unwrap();
        let mesh = load_stl(file.path()).unwrap();
        assert_eq!(mesh.vertices[2], Vec3::Y);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_stl("/definitely/not/here.stl").unwrap_err();
        assert!(matches!(err, BridgeError::Io(_)));
    }
}
