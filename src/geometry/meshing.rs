// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Decomposition of shapes into renderer-ready face and edge lists
//!
//! Coplanar triangles are grouped into faces; the outline of each face
//! becomes its edges. The output is plain data with no renderer dependency.

use super::{Mesh, Shape};
use ahash::{AHashMap, AHashSet};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Quantization step for grouping positions and planes
const QUANTUM: f64 = 1e-7;

type PointKey = [i64; 3];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecomposedMesh {
    pub face_list: Vec<DecomposedFace>,
    pub edge_list: Vec<DecomposedEdge>,
    pub point_list: Vec<[f64; 3]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecomposedFace {
    pub face_index: usize,
    /// Flattened xyz triples
    pub vertex_coord: Vec<f64>,
    pub normal_coord: Vec<f64>,
    /// Indices into this face's own vertices, three per triangle
    pub triangle_indexes: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecomposedEdge {
    pub edge_index: usize,
    pub vertex_coord: Vec<[f64; 3]>,
}

/// Decompose any shape; compounds contribute all of their children
pub fn decompose(shape: &Shape) -> DecomposedMesh {
    let mut out = DecomposedMesh::default();
    let mut seen_edges = AHashSet::new();
    decompose_into(shape, &mut out, &mut seen_edges);
    out
}

fn decompose_into(
    shape: &Shape,
    out: &mut DecomposedMesh,
    seen_edges: &mut AHashSet<(PointKey, PointKey)>,
) {
    match shape {
        Shape::Vertex(p) => out.point_list.push([p.x, p.y, p.z]),
        Shape::Wire(wire) => {
            for (a, b) in wire.segments() {
                push_edge(out, seen_edges, a, b);
            }
        }
        Shape::Solid(mesh) => decompose_mesh(mesh, out, seen_edges),
        Shape::Compound(children) => {
            for child in children {
                decompose_into(child, out, seen_edges);
            }
        }
    }
}

struct FaceBuilder {
    normal: Vector3<f64>,
    positions: Vec<Point3<f64>>,
    lookup: AHashMap<PointKey, u32>,
    triangle_indexes: Vec<u32>,
    edge_uses: AHashMap<(PointKey, PointKey), (usize, Point3<f64>, Point3<f64>)>,
}

impl FaceBuilder {
    fn new(normal: Vector3<f64>) -> Self {
        Self {
            normal,
            positions: Vec::new(),
            lookup: AHashMap::new(),
            triangle_indexes: Vec::new(),
            edge_uses: AHashMap::new(),
        }
    }

    fn add_triangle(&mut self, corners: [Point3<f64>; 3]) {
        for corner in corners {
            let key = point_key(&corner);
            let next = self.positions.len() as u32;
            let index = *self.lookup.entry(key).or_insert(next);
            if index == next {
                self.positions.push(corner);
            }
            self.triangle_indexes.push(index);
        }
        for i in 0..3 {
            let (a, b) = (corners[i], corners[(i + 1) % 3]);
            let use_count = self
                .edge_uses
                .entry(edge_key(&a, &b))
                .or_insert((0, a, b));
            use_count.0 += 1;
        }
    }
}

fn decompose_mesh(
    mesh: &Mesh,
    out: &mut DecomposedMesh,
    seen_edges: &mut AHashSet<(PointKey, PointKey)>,
) {
    let mut faces: Vec<FaceBuilder> = Vec::new();
    let mut by_plane: AHashMap<[i64; 4], usize> = AHashMap::new();

    for triangle in &mesh.triangles {
        let normal = triangle.face_normal(mesh);
        if normal == Vector3::zeros() {
            continue;
        }
        let corners = triangle.positions(mesh);
        let offset = normal.dot(&corners[0].coords);
        let plane = [
            quantize(normal.x),
            quantize(normal.y),
            quantize(normal.z),
            quantize(offset),
        ];
        let face = *by_plane.entry(plane).or_insert_with(|| {
            faces.push(FaceBuilder::new(normal));
            faces.len() - 1
        });
        faces[face].add_triangle(corners);
    }

    for face in faces {
        // Edges used once inside a planar group form its outline
        let mut outline: Vec<_> = face
            .edge_uses
            .iter()
            .filter(|(_, (uses, _, _))| *uses == 1)
            .map(|(key, (_, a, b))| (*key, *a, *b))
            .collect();
        outline.sort_by(|x, y| x.0.cmp(&y.0));
        for (_, a, b) in outline {
            push_edge(out, seen_edges, a, b);
        }

        let n = face.normal;
        out.face_list.push(DecomposedFace {
            face_index: out.face_list.len(),
            vertex_coord: face.positions.iter().flat_map(|p| [p.x, p.y, p.z]).collect(),
            normal_coord: face.positions.iter().flat_map(|_| [n.x, n.y, n.z]).collect(),
            triangle_indexes: face.triangle_indexes,
        });
    }
}

fn push_edge(
    out: &mut DecomposedMesh,
    seen_edges: &mut AHashSet<(PointKey, PointKey)>,
    a: Point3<f64>,
    b: Point3<f64>,
) {
    if seen_edges.insert(edge_key(&a, &b)) {
        out.edge_list.push(DecomposedEdge {
            edge_index: out.edge_list.len(),
            vertex_coord: vec![[a.x, a.y, a.z], [b.x, b.y, b.z]],
        });
    }
}

fn quantize(value: f64) -> i64 {
    (value / QUANTUM).round() as i64
}

fn point_key(p: &Point3<f64>) -> PointKey {
    [quantize(p.x), quantize(p.y), quantize(p.z)]
}

fn edge_key(a: &Point3<f64>, b: &Point3<f64>) -> (PointKey, PointKey) {
    let (ka, kb) = (point_key(a), point_key(b));
    if ka <= kb {
        (ka, kb)
    } else {
        (kb, ka)
    }
}
