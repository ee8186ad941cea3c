// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel operations exposed through the method registry
//!
//! Each operation receives already-decoded input, resolves handles through
//! the [`CallContext`] and emits produced shapes back through it.

use crate::adapter::{CallContext, MethodRegistry};
use crate::api::dto::*;
use crate::api::methods;
use crate::error::KernelError;
use crate::geometry::{decompose, union_all, DecomposedMesh, Mesh, Polyline, Primitive, Shape};
use crate::handle::Handle;
use crate::io;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use nalgebra::{Matrix4, Point3, Unit, Vector3};

/// Largest tessellation accepted for curved solids
pub const MAX_SEGMENTS: u32 = 1024;

/// Register every kernel method
pub fn register_all(registry: &mut MethodRegistry) {
    registry
        .register(methods::CREATE_VERTEX, create_vertex)
        .register(methods::GET_VERTEX_COORDINATES, vertex_coordinates)
        .register(methods::CREATE_POLYLINE_WIRE, create_polyline_wire)
        .register(methods::GET_WIRE_LENGTH, wire_length)
        .register(methods::CREATE_BOX, create_box)
        .register(methods::CREATE_CUBE, create_cube)
        .register(methods::CREATE_SPHERE, create_sphere)
        .register(methods::CREATE_CYLINDER, create_cylinder)
        .register(methods::CREATE_CONE, create_cone)
        .register(methods::GET_SOLID_VOLUME, solid_volume)
        .register(methods::GET_SOLID_SURFACE_AREA, solid_surface_area)
        .register(methods::GET_BOUNDING_BOX, bounding_box)
        .register(methods::MAKE_COMPOUND, make_compound)
        .register(methods::UNION, union)
        .register(methods::TRANSLATE, translate)
        .register(methods::ROTATE, rotate)
        .register(methods::SCALE, scale)
        .register(methods::SHAPE_TO_MESH, shape_to_mesh)
        .register(methods::SAVE_SHAPE_STL, save_shape_stl)
        .register(methods::SAVE_SHAPE_STEP, save_shape_step);
}

fn point(p: Point) -> Point3<f64> {
    Point3::new(p[0], p[1], p[2])
}

fn finite_point(name: &str, p: Point) -> Result<Point3<f64>, KernelError> {
    require_finite(name, &p)?;
    Ok(point(p))
}

fn require_positive(name: &str, value: f64) -> Result<f64, KernelError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(KernelError::invalid_input(format!("{name} must be positive, got {value}")))
    }
}

fn require_segments(segments: Option<u32>) -> Result<u32, KernelError> {
    match segments {
        Some(n) if n > MAX_SEGMENTS => Err(KernelError::invalid_input(format!(
            "segments must be at most {MAX_SEGMENTS}, got {n}"
        ))),
        // 0 and other tiny counts fall back to the primitive's default
        Some(n) => Ok(n),
        None => Ok(0),
    }
}

fn require_finite(name: &str, values: &[f64]) -> Result<(), KernelError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(KernelError::invalid_input(format!("{name} must be finite")))
    }
}

// Shapes

fn create_vertex(ctx: &mut CallContext<'_>, input: CreateVertexInput) -> Result<Handle, KernelError> {
    let p = finite_point("point", input.point)?;
    Ok(ctx.emit(Shape::Vertex(p)))
}

fn vertex_coordinates(ctx: &mut CallContext<'_>, input: ShapeInput) -> Result<Point, KernelError> {
    let p = ctx.shape(&input.shape)?.as_vertex()?;
    Ok([p.x, p.y, p.z])
}

fn create_polyline_wire(
    ctx: &mut CallContext<'_>,
    input: PolylineWireInput,
) -> Result<Handle, KernelError> {
    for p in &input.points {
        require_finite("points", p)?;
    }
    let wire = Polyline::new(input.points.into_iter().map(point).collect(), input.closed)?;
    Ok(ctx.emit(Shape::Wire(wire)))
}

fn wire_length(ctx: &mut CallContext<'_>, input: ShapeInput) -> Result<f64, KernelError> {
    Ok(ctx.shape(&input.shape)?.as_wire()?.length())
}

fn create_box(ctx: &mut CallContext<'_>, input: BoxInput) -> Result<Handle, KernelError> {
    let size = Vector3::new(
        require_positive("width", input.width)?,
        require_positive("length", input.length)?,
        require_positive("height", input.height)?,
    );
    let center = match input.center {
        Center::Flag(true) => Point3::origin(),
        Center::Flag(false) => Point3::from(size / 2.0),
        Center::Point(p) => finite_point("center", p)?,
    };
    Ok(ctx.emit(Shape::Solid(Primitive::cuboid(size, center).to_mesh())))
}

fn create_cube(ctx: &mut CallContext<'_>, input: CubeInput) -> Result<Handle, KernelError> {
    create_box(
        ctx,
        BoxInput {
            width: input.size,
            length: input.size,
            height: input.size,
            center: input.center,
        },
    )
}

fn create_sphere(ctx: &mut CallContext<'_>, input: SphereInput) -> Result<Handle, KernelError> {
    let radius = require_positive("radius", input.radius)?;
    let center = match input.center {
        Center::Flag(_) => Point3::origin(),
        Center::Point(p) => finite_point("center", p)?,
    };
    let segments = require_segments(input.segments)?;
    let sphere = Primitive::sphere(radius, center, segments);
    Ok(ctx.emit(Shape::Solid(sphere.to_mesh())))
}

fn create_cylinder(ctx: &mut CallContext<'_>, input: CylinderInput) -> Result<Handle, KernelError> {
    create_cone(
        ctx,
        ConeInput {
            radius1: input.radius,
            radius2: input.radius,
            height: input.height,
            center: input.center,
            segments: input.segments,
        },
    )
}

fn create_cone(ctx: &mut CallContext<'_>, input: ConeInput) -> Result<Handle, KernelError> {
    let height = require_positive("height", input.height)?;
    let segments = require_segments(input.segments)?;
    if !(input.radius1 >= 0.0 && input.radius2 >= 0.0) || input.radius1 + input.radius2 <= 0.0 {
        return Err(KernelError::invalid_input(
            "cone radii must be non-negative and not both zero",
        ));
    }
    // Cones are built from the center of their base
    let base = match input.center {
        Center::Flag(false) => Point3::origin(),
        Center::Flag(true) => Point3::new(0.0, 0.0, -height / 2.0),
        Center::Point(p) => finite_point("center", p)? - Vector3::new(0.0, 0.0, height / 2.0),
    };
    let cone = Primitive::cone(
        input.radius1,
        input.radius2,
        height,
        base,
        segments,
    );
    Ok(ctx.emit(Shape::Solid(cone.to_mesh())))
}

fn solid_volume(ctx: &mut CallContext<'_>, input: ShapeInput) -> Result<f64, KernelError> {
    ctx.shape(&input.shape)?.volume()
}

fn solid_surface_area(ctx: &mut CallContext<'_>, input: ShapeInput) -> Result<f64, KernelError> {
    ctx.shape(&input.shape)?.surface_area()
}

fn bounding_box(ctx: &mut CallContext<'_>, input: ShapeInput) -> Result<BoundingBoxResult, KernelError> {
    let bbox = ctx.shape(&input.shape)?.bounding_box();
    if bbox.is_empty() {
        return Err(KernelError::invalid_input("shape has no extent"));
    }
    Ok(BoundingBoxResult::from(&bbox))
}

fn make_compound(ctx: &mut CallContext<'_>, input: ShapesInput) -> Result<Handle, KernelError> {
    if input.shapes.is_empty() {
        return Err(KernelError::invalid_input("a compound needs at least one shape"));
    }
    let children: Vec<Shape> = ctx
        .shapes(&input.shapes)?
        .into_iter()
        .cloned()
        .collect();
    Ok(ctx.emit(Shape::Compound(children)))
}

// Booleans

fn union(ctx: &mut CallContext<'_>, input: ShapesInput) -> Result<Handle, KernelError> {
    if input.shapes.len() < 2 {
        return Err(KernelError::invalid_input("union needs at least two shapes"));
    }
    let shapes = ctx.shapes(&input.shapes)?;
    let mut solids = Vec::new();
    for shape in &shapes {
        solids.extend(shape.require_solids()?);
    }
    let merged = union_all(solids)?;
    Ok(ctx.emit(Shape::Solid(merged)))
}

// Transforms

fn transform(ctx: &mut CallContext<'_>, shape: &Handle, matrix: Matrix4<f64>) -> Result<Handle, KernelError> {
    let moved = ctx.shape(shape)?.transformed(&matrix);
    Ok(ctx.emit(moved))
}

fn translate(ctx: &mut CallContext<'_>, input: TranslateInput) -> Result<Handle, KernelError> {
    require_finite("translation", &input.translation)?;
    let [x, y, z] = input.translation;
    transform(ctx, &input.shape, Matrix4::new_translation(&Vector3::new(x, y, z)))
}

fn rotate(ctx: &mut CallContext<'_>, input: RotateInput) -> Result<Handle, KernelError> {
    require_finite("axis", &input.axis)?;
    require_finite("angle", &[input.angle])?;
    let axis = Vector3::new(input.axis[0], input.axis[1], input.axis[2]);
    let axis = Unit::try_new(axis, f64::EPSILON)
        .ok_or_else(|| KernelError::invalid_input("rotation axis must not be zero"))?;
    let matrix = Matrix4::from_axis_angle(&axis, input.angle.to_radians());
    transform(ctx, &input.shape, matrix)
}

fn scale(ctx: &mut CallContext<'_>, input: ScaleInput) -> Result<Handle, KernelError> {
    if !input.factor.is_finite() || input.factor == 0.0 {
        return Err(KernelError::invalid_input(format!(
            "scale factor must be finite and non-zero, got {}",
            input.factor
        )));
    }
    transform(ctx, &input.shape, Matrix4::new_nonuniform_scaling(&Vector3::repeat(input.factor)))
}

// Meshing and export

fn shape_to_mesh(ctx: &mut CallContext<'_>, input: ShapeInput) -> Result<DecomposedMesh, KernelError> {
    Ok(decompose(ctx.shape(&input.shape)?))
}

/// All solids of a shape merged into one mesh for export
fn export_mesh(shape: &Shape) -> Result<Mesh, KernelError> {
    let solids = shape.require_solids()?;
    let mut mesh = Mesh::new();
    for solid in solids {
        mesh.merge(solid);
    }
    Ok(mesh)
}

fn require_file_name(name: &str) -> Result<(), KernelError> {
    if name.trim().is_empty() {
        return Err(KernelError::invalid_input("fileName must not be empty"));
    }
    Ok(())
}

fn save_shape_stl(ctx: &mut CallContext<'_>, input: SaveShapeInput) -> Result<SavedFile, KernelError> {
    require_file_name(&input.file_name)?;
    let mesh = export_mesh(ctx.shape(&input.shape)?)?;
    let bytes = io::to_binary_stl(&mesh)?;
    Ok(SavedFile {
        file_name: input.file_name,
        encoding: FileEncoding::Base64,
        content: BASE64.encode(bytes),
    })
}

fn save_shape_step(ctx: &mut CallContext<'_>, input: SaveShapeInput) -> Result<SavedFile, KernelError> {
    require_file_name(&input.file_name)?;
    let solids = ctx.shape(&input.shape)?.require_solids()?;
    Ok(SavedFile {
        content: io::to_step(&solids, &input.file_name),
        file_name: input.file_name,
        encoding: FileEncoding::Text,
    })
}
