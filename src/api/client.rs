// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Typed forwarding helpers on [`Session`]

use super::dto::*;
use super::methods;
use crate::error::BridgeError;
use crate::geometry::DecomposedMesh;
use crate::handle::Handle;
use crate::session::Session;

impl Session {
    pub async fn create_vertex(&self, point: Point) -> Result<Handle, BridgeError> {
        self.call_typed(methods::CREATE_VERTEX, &CreateVertexInput { point })
            .await
    }

    pub async fn vertex_coordinates(&self, shape: &Handle) -> Result<Point, BridgeError> {
        self.call_typed(methods::GET_VERTEX_COORDINATES, &shape_input(shape))
            .await
    }

    pub async fn create_polyline_wire(
        &self,
        points: Vec<Point>,
        closed: bool,
    ) -> Result<Handle, BridgeError> {
        self.call_typed(
            methods::CREATE_POLYLINE_WIRE,
            &PolylineWireInput { points, closed },
        )
        .await
    }

    pub async fn wire_length(&self, shape: &Handle) -> Result<f64, BridgeError> {
        self.call_typed(methods::GET_WIRE_LENGTH, &shape_input(shape))
            .await
    }

    pub async fn create_box(
        &self,
        width: f64,
        length: f64,
        height: f64,
        center: bool,
    ) -> Result<Handle, BridgeError> {
        let input = BoxInput {
            width,
            length,
            height,
            center: Center::Flag(center),
        };
        self.call_typed(methods::CREATE_BOX, &input).await
    }

    pub async fn create_cube(&self, size: f64, center: bool) -> Result<Handle, BridgeError> {
        self.call_typed(methods::CREATE_CUBE, &CubeInput { size, center: Center::Flag(center) })
            .await
    }

    pub async fn create_sphere(&self, radius: f64, center: Point) -> Result<Handle, BridgeError> {
        let input = SphereInput {
            radius,
            center: Center::Point(center),
            segments: None,
        };
        self.call_typed(methods::CREATE_SPHERE, &input).await
    }

    pub async fn create_cylinder(
        &self,
        radius: f64,
        height: f64,
        center: bool,
    ) -> Result<Handle, BridgeError> {
        let input = CylinderInput {
            radius,
            height,
            center: Center::Flag(center),
            segments: None,
        };
        self.call_typed(methods::CREATE_CYLINDER, &input).await
    }

    pub async fn solid_volume(&self, shape: &Handle) -> Result<f64, BridgeError> {
        self.call_typed(methods::GET_SOLID_VOLUME, &shape_input(shape))
            .await
    }

    pub async fn solid_surface_area(&self, shape: &Handle) -> Result<f64, BridgeError> {
        self.call_typed(methods::GET_SOLID_SURFACE_AREA, &shape_input(shape))
            .await
    }

    pub async fn bounding_box(&self, shape: &Handle) -> Result<BoundingBoxResult, BridgeError> {
        self.call_typed(methods::GET_BOUNDING_BOX, &shape_input(shape))
            .await
    }

    pub async fn make_compound(&self, shapes: &[Handle]) -> Result<Handle, BridgeError> {
        self.call_typed(methods::MAKE_COMPOUND, &shapes_input(shapes))
            .await
    }

    pub async fn union(&self, shapes: &[Handle]) -> Result<Handle, BridgeError> {
        self.call_typed(methods::UNION, &shapes_input(shapes)).await
    }

    pub async fn translate(&self, shape: &Handle, translation: Point) -> Result<Handle, BridgeError> {
        let input = TranslateInput {
            shape: shape.clone(),
            translation,
        };
        self.call_typed(methods::TRANSLATE, &input).await
    }

    /// Rotate about an axis through the origin; `angle` is in degrees
    pub async fn rotate(&self, shape: &Handle, axis: Point, angle: f64) -> Result<Handle, BridgeError> {
        let input = RotateInput {
            shape: shape.clone(),
            axis,
            angle,
        };
        self.call_typed(methods::ROTATE, &input).await
    }

    pub async fn scale(&self, shape: &Handle, factor: f64) -> Result<Handle, BridgeError> {
        let input = ScaleInput {
            shape: shape.clone(),
            factor,
        };
        self.call_typed(methods::SCALE, &input).await
    }

    pub async fn shape_to_mesh(&self, shape: &Handle) -> Result<DecomposedMesh, BridgeError> {
        self.call_typed(methods::SHAPE_TO_MESH, &shape_input(shape))
            .await
    }

    pub async fn save_shape_stl(&self, shape: &Handle, file_name: &str) -> Result<SavedFile, BridgeError> {
        self.call_typed(methods::SAVE_SHAPE_STL, &save_input(shape, file_name))
            .await
    }

    pub async fn save_shape_step(&self, shape: &Handle, file_name: &str) -> Result<SavedFile, BridgeError> {
        self.call_typed(methods::SAVE_SHAPE_STEP, &save_input(shape, file_name))
            .await
    }
}

fn shape_input(shape: &Handle) -> ShapeInput {
    ShapeInput {
        shape: shape.clone(),
    }
}

fn shapes_input(shapes: &[Handle]) -> ShapesInput {
    ShapesInput {
        shapes: shapes.to_vec(),
    }
}

fn save_input(shape: &Handle, file_name: &str) -> SaveShapeInput {
    SaveShapeInput {
        shape: shape.clone(),
        file_name: file_name.to_string(),
    }
}
