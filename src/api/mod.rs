// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Method names and payload types shared by both sides of the bridge

#[cfg(not(target_arch = "wasm32"))]
mod client;
pub mod dto;

/// `"namespace.method"` strings understood by the execution context
pub mod methods {
    pub const CREATE_VERTEX: &str = "shapes.vertex.createVertex";
    pub const GET_VERTEX_COORDINATES: &str = "shapes.vertex.getVertexCoordinates";
    pub const CREATE_POLYLINE_WIRE: &str = "shapes.wire.createPolylineWire";
    pub const GET_WIRE_LENGTH: &str = "shapes.wire.getWireLength";
    pub const CREATE_BOX: &str = "shapes.solid.createBox";
    pub const CREATE_CUBE: &str = "shapes.solid.createCube";
    pub const CREATE_SPHERE: &str = "shapes.solid.createSphere";
    pub const CREATE_CYLINDER: &str = "shapes.solid.createCylinder";
    pub const CREATE_CONE: &str = "shapes.solid.createCone";
    pub const GET_SOLID_VOLUME: &str = "shapes.solid.getSolidVolume";
    pub const GET_SOLID_SURFACE_AREA: &str = "shapes.solid.getSolidSurfaceArea";
    pub const GET_BOUNDING_BOX: &str = "shapes.shape.getBoundingBox";
    pub const MAKE_COMPOUND: &str = "shapes.compound.makeCompound";
    pub const UNION: &str = "booleans.union";
    pub const TRANSLATE: &str = "transforms.translate";
    pub const ROTATE: &str = "transforms.rotate";
    pub const SCALE: &str = "transforms.scale";
    pub const SHAPE_TO_MESH: &str = "meshing.shapeToMesh";
    pub const SAVE_SHAPE_STL: &str = "io.saveShapeSTL";
    pub const SAVE_SHAPE_STEP: &str = "io.saveShapeSTEP";

    pub const BEGIN_NEW_RUN: &str = "runtime.beginNewRun";
    pub const CLEAN_ALL_CACHE: &str = "runtime.cleanAllCache";
    pub const DELETE_SHAPES: &str = "runtime.deleteShapes";
    pub const CACHE_STATS: &str = "runtime.cacheStats";
}

use methods::*;

/// Methods routed to registered kernel operations
pub const KERNEL_METHODS: &[&str] = &[
    CREATE_VERTEX,
    GET_VERTEX_COORDINATES,
    CREATE_POLYLINE_WIRE,
    GET_WIRE_LENGTH,
    CREATE_BOX,
    CREATE_CUBE,
    CREATE_SPHERE,
    CREATE_CYLINDER,
    CREATE_CONE,
    GET_SOLID_VOLUME,
    GET_SOLID_SURFACE_AREA,
    GET_BOUNDING_BOX,
    MAKE_COMPOUND,
    UNION,
    TRANSLATE,
    ROTATE,
    SCALE,
    SHAPE_TO_MESH,
    SAVE_SHAPE_STL,
    SAVE_SHAPE_STEP,
];

/// Methods the adapter serves itself
pub const RUNTIME_METHODS: &[&str] = &[BEGIN_NEW_RUN, CLEAN_ALL_CACHE, DELETE_SHAPES, CACHE_STATS];

/// Split `"namespace.method"` at its last dot
pub fn split_method(name: &str) -> Option<(&str, &str)> {
    let (namespace, method) = name.rsplit_once('.')?;
    if namespace.is_empty() || method.is_empty() {
        return None;
    }
    Some((namespace, method))
}
