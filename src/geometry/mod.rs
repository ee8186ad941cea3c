// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - the mesh-backed kernel the bridge drives

mod analytics;
mod bbox;
mod boolean;
mod mesh;
mod meshing;
mod primitives;
mod shape;

pub use analytics::{signed_volume, surface_area, volume};
pub use bbox::BoundingBox;
pub use boolean::union_all;
pub use mesh::{Mesh, Triangle, Vertex};
pub use meshing::{decompose, DecomposedEdge, DecomposedFace, DecomposedMesh};
pub use primitives::Primitive;
pub use shape::{Polyline, Shape, ShapeKind};
