// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Binary STL serializer

use crate::error::KernelError;
use crate::geometry::Mesh;

/// Binary STL with per-facet normals computed from the triangle geometry
pub fn to_binary_stl(mesh: &Mesh) -> Result<Vec<u8>, KernelError> {
    use stl_io::{Normal, Triangle as StlTriangle, Vertex as StlVertex};

    let triangles: Vec<StlTriangle> = mesh
        .triangles
        .iter()
        .map(|tri| {
            let [p0, p1, p2] = tri.positions(mesh);
            let normal = tri.face_normal(mesh);

            StlTriangle {
                normal: Normal::new([normal.x as f32, normal.y as f32, normal.z as f32]),
                vertices: [
                    StlVertex::new([p0.x as f32, p0.y as f32, p0.z as f32]),
                    StlVertex::new([p1.x as f32, p1.y as f32, p1.z as f32]),
                    StlVertex::new([p2.x as f32, p2.y as f32, p2.z as f32]),
                ],
            }
        })
        .collect();

    let mut buffer = Vec::with_capacity(84 + triangles.len() * 50);
    stl_io::write_stl(&mut buffer, triangles.iter())
        .map_err(|e| KernelError::Operation(format!("STL export failed: {e}")))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use nalgebra::Point3;
    use std::io::Cursor;

    #[test]
    fn test_binary_stl_reads_back() {
        let mesh = Primitive::cube(10.0, Point3::origin()).to_mesh();
        let bytes = to_binary_stl(&mesh).unwrap();
        assert_eq!(bytes.len(), 84 + 12 * 50);

        let indexed = stl_io::read_stl(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(indexed.faces.len(), 12);
        assert_eq!(indexed.vertices.len(), 8);
    }
}
