// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh measurements backing the volume and area methods

use super::Mesh;

/// Sum of signed tetrahedron volumes against the origin
pub fn signed_volume(mesh: &Mesh) -> f64 {
    mesh.triangles
        .iter()
        .map(|triangle| {
            let [v0, v1, v2] = triangle.positions(mesh);
            v0.coords.dot(&v1.coords.cross(&v2.coords)) / 6.0
        })
        .sum()
}

pub fn volume(mesh: &Mesh) -> f64 {
    signed_volume(mesh).abs()
}

pub fn surface_area(mesh: &Mesh) -> f64 {
    mesh.triangles
        .iter()
        .map(|triangle| {
            let [v0, v1, v2] = triangle.positions(mesh);
            (v1 - v0).cross(&(v2 - v0)).norm() / 2.0
        })
        .sum()
}
