// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives generator

use super::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

const DEFAULT_SEGMENTS: u32 = 32;

/// Geometric primitives
///
/// Boxes and spheres are placed by their centre; cylinders and cones by the
/// centre of their base, growing along +Z.
#[derive(Debug, Clone)]
pub enum Primitive {
    Box {
        size: Vector3<f64>,
        center: Point3<f64>,
    },
    Sphere {
        radius: f64,
        center: Point3<f64>,
        segments: u32,
    },
    Cone {
        radius1: f64,
        radius2: f64,
        height: f64,
        center: Point3<f64>,
        segments: u32,
    },
}

impl Primitive {
    pub fn cuboid(size: Vector3<f64>, center: Point3<f64>) -> Self {
        Self::Box { size, center }
    }

    pub fn cube(size: f64, center: Point3<f64>) -> Self {
        Self::cuboid(Vector3::new(size, size, size), center)
    }

    pub fn sphere(radius: f64, center: Point3<f64>, segments: u32) -> Self {
        Self::Sphere {
            radius,
            center,
            segments: segments_or_default(segments),
        }
    }

    pub fn cylinder(radius: f64, height: f64, center: Point3<f64>, segments: u32) -> Self {
        Self::cone(radius, radius, height, center, segments)
    }

    pub fn cone(radius1: f64, radius2: f64, height: f64, center: Point3<f64>, segments: u32) -> Self {
        Self::Cone {
            radius1,
            radius2,
            height,
            center,
            segments: segments_or_default(segments),
        }
    }

    pub fn to_mesh(&self) -> Mesh {
        match self {
            Self::Box { size, center } => generate_box_mesh(*size, *center),
            Self::Sphere {
                radius,
                center,
                segments,
            } => generate_sphere_mesh(*radius, *center, *segments),
            Self::Cone {
                radius1,
                radius2,
                height,
                center,
                segments,
            } => generate_cone_mesh(*height, *radius1, *radius2, *center, *segments),
        }
    }
}

fn segments_or_default(segments: u32) -> u32 {
    if segments >= 3 {
        segments
    } else {
        DEFAULT_SEGMENTS
    }
}

fn generate_box_mesh(size: Vector3<f64>, center: Point3<f64>) -> Mesh {
    let mut mesh = Mesh::with_capacity(36, 12);

    let half = size / 2.0;
    let min = center - half;
    let max = center + half;

    // 8 corners of the box
    let positions = [
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];

    // 6 faces, each with its normal
    let faces = [
        // Top (z+)
        ([4, 5, 6], Vector3::new(0.0, 0.0, 1.0)),
        ([4, 6, 7], Vector3::new(0.0, 0.0, 1.0)),
        // Bottom (z-)
        ([1, 0, 3], Vector3::new(0.0, 0.0, -1.0)),
        ([1, 3, 2], Vector3::new(0.0, 0.0, -1.0)),
        // Right (x+)
        ([5, 1, 2], Vector3::new(1.0, 0.0, 0.0)),
        ([5, 2, 6], Vector3::new(1.0, 0.0, 0.0)),
        // Left (x-)
        ([0, 4, 7], Vector3::new(-1.0, 0.0, 0.0)),
        ([0, 7, 3], Vector3::new(-1.0, 0.0, 0.0)),
        // Back (y+)
        ([7, 6, 2], Vector3::new(0.0, 1.0, 0.0)),
        ([7, 2, 3], Vector3::new(0.0, 1.0, 0.0)),
        // Front (y-)
        ([0, 1, 5], Vector3::new(0.0, -1.0, 0.0)),
        ([0, 5, 4], Vector3::new(0.0, -1.0, 0.0)),
    ];

    // Each face gets its own vertices for flat normals
    for (indices, normal) in faces {
        let v0 = mesh.add_vertex(Vertex::new(positions[indices[0]], normal));
        let v1 = mesh.add_vertex(Vertex::new(positions[indices[1]], normal));
        let v2 = mesh.add_vertex(Vertex::new(positions[indices[2]], normal));
        mesh.add_triangle(Triangle::new([v0, v1, v2]));
    }

    mesh
}

fn generate_sphere_mesh(radius: f64, center: Point3<f64>, segments: u32) -> Mesh {
    let mut mesh = Mesh::new();
    let stacks = segments;
    let slices = segments;

    for i in 0..=stacks {
        let phi = PI * i as f64 / stacks as f64;
        let z = radius * phi.cos();
        let r = radius * phi.sin();

        for j in 0..=slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            let offset = Vector3::new(r * theta.cos(), r * theta.sin(), z);
            let normal = if offset.norm() > 0.0 {
                offset.normalize()
            } else {
                Vector3::z()
            };
            mesh.add_vertex(Vertex::new(center + offset, normal));
        }
    }

    // Pole rows produce zero-area triangles; they contribute nothing to
    // volume or area and are skipped by the mesher.
    for i in 0..stacks {
        for j in 0..slices {
            let first = (i * (slices + 1) + j) as usize;
            let second = first + slices as usize + 1;

            mesh.add_triangle(Triangle::new([first, second, first + 1]));
            mesh.add_triangle(Triangle::new([second, second + 1, first + 1]));
        }
    }

    mesh
}

fn generate_cone_mesh(
    height: f64,
    r1: f64,
    r2: f64,
    center: Point3<f64>,
    segments: u32,
) -> Mesh {
    let mut mesh = Mesh::new();

    let bottom_center_idx = mesh.add_vertex(Vertex::new(center, Vector3::new(0.0, 0.0, -1.0)));
    let top_center_idx = mesh.add_vertex(Vertex::new(
        center + Vector3::new(0.0, 0.0, height),
        Vector3::new(0.0, 0.0, 1.0),
    ));

    let mut bottom_indices = Vec::with_capacity(segments as usize);
    let mut top_indices = Vec::with_capacity(segments as usize);

    for i in 0..segments {
        let angle = 2.0 * PI * i as f64 / segments as f64;
        let (sin, cos) = angle.sin_cos();

        let bottom_pos = center + Vector3::new(r1 * cos, r1 * sin, 0.0);
        bottom_indices.push(mesh.add_vertex(Vertex::new(bottom_pos, Vector3::new(0.0, 0.0, -1.0))));

        let top_pos = center + Vector3::new(r2 * cos, r2 * sin, height);
        top_indices.push(mesh.add_vertex(Vertex::new(top_pos, Vector3::new(0.0, 0.0, 1.0))));
    }

    let n = segments as usize;

    // Bottom cap
    for i in 0..n {
        let next = (i + 1) % n;
        mesh.add_triangle(Triangle::new([
            bottom_center_idx,
            bottom_indices[next],
            bottom_indices[i],
        ]));
    }

    // Top cap
    for i in 0..n {
        let next = (i + 1) % n;
        mesh.add_triangle(Triangle::new([
            top_center_idx,
            top_indices[i],
            top_indices[next],
        ]));
    }

    // Sides reuse rim vertices so the mesh stays manifold
    for i in 0..n {
        let next = (i + 1) % n;
        let (bi, ti) = (bottom_indices[i], top_indices[i]);
        let (bn, tn) = (bottom_indices[next], top_indices[next]);

        mesh.add_triangle(Triangle::new([bi, bn, ti]));
        mesh.add_triangle(Triangle::new([ti, bn, tn]));
    }

    mesh.recompute_normals();
    mesh
}
