// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel entities that live behind handles

use super::{analytics, BoundingBox, Mesh};
use crate::error::KernelError;
use crate::handle::Fingerprint;
use nalgebra::{Matrix4, Point3};
use sha2::{Digest, Sha256};

/// Entity kind, mirrored in each handle's `type` string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Vertex,
    Wire,
    Solid,
    Compound,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 4] = [Self::Vertex, Self::Wire, Self::Solid, Self::Compound];

    /// The handle `type` string for this kind
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Vertex => "TopoDSVertexPointer",
            Self::Wire => "TopoDSWirePointer",
            Self::Solid => "TopoDSSolidPointer",
            Self::Compound => "TopoDSCompoundPointer",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Wire => "wire",
            Self::Solid => "solid",
            Self::Compound => "compound",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_name() == name)
    }
}

/// Open or closed chain of straight segments
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point3<f64>>,
    pub closed: bool,
}

impl Polyline {
    pub fn new(points: Vec<Point3<f64>>, closed: bool) -> Result<Self, KernelError> {
        if points.len() < 2 {
            return Err(KernelError::invalid_input("a wire needs at least two points"));
        }
        Ok(Self { points, closed })
    }

    /// Consecutive point pairs, including the closing segment
    pub fn segments(&self) -> impl Iterator<Item = (Point3<f64>, Point3<f64>)> + '_ {
        let closing = if self.closed && self.points.len() > 2 {
            Some((self.points[self.points.len() - 1], self.points[0]))
        } else {
            None
        };
        self.points
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .chain(closing)
    }

    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| (b - a).norm()).sum()
    }
}

/// A kernel-resident entity
#[derive(Debug, Clone)]
pub enum Shape {
    Vertex(Point3<f64>),
    Wire(Polyline),
    Solid(Mesh),
    Compound(Vec<Shape>),
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Vertex(_) => ShapeKind::Vertex,
            Self::Wire(_) => ShapeKind::Wire,
            Self::Solid(_) => ShapeKind::Solid,
            Self::Compound(_) => ShapeKind::Compound,
        }
    }

    /// Content digest used to spot structurally identical entities
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = Sha256::new();
        self.digest_into(&mut hasher);
        let mut fingerprint = [0u8; 32];
        fingerprint.copy_from_slice(&hasher.finalize());
        fingerprint
    }

    fn digest_into(&self, hasher: &mut Sha256) {
        hasher.update(self.kind().type_name().as_bytes());
        match self {
            Self::Vertex(p) => digest_point(hasher, p),
            Self::Wire(wire) => {
                hasher.update([wire.closed as u8]);
                hasher.update((wire.points.len() as u64).to_le_bytes());
                for p in &wire.points {
                    digest_point(hasher, p);
                }
            }
            Self::Solid(mesh) => mesh.digest_into(hasher),
            Self::Compound(children) => {
                hasher.update((children.len() as u64).to_le_bytes());
                for child in children {
                    child.digest_into(hasher);
                }
            }
        }
    }

    pub fn transformed(&self, matrix: &Matrix4<f64>) -> Shape {
        match self {
            Self::Vertex(p) => Self::Vertex(matrix.transform_point(p)),
            Self::Wire(wire) => Self::Wire(Polyline {
                points: wire.points.iter().map(|p| matrix.transform_point(p)).collect(),
                closed: wire.closed,
            }),
            Self::Solid(mesh) => {
                let mut mesh = mesh.clone();
                mesh.transform(matrix);
                Self::Solid(mesh)
            }
            Self::Compound(children) => {
                Self::Compound(children.iter().map(|c| c.transformed(matrix)).collect())
            }
        }
    }

    pub fn as_vertex(&self) -> Result<&Point3<f64>, KernelError> {
        match self {
            Self::Vertex(p) => Ok(p),
            other => Err(other.wrong_kind(ShapeKind::Vertex)),
        }
    }

    pub fn as_wire(&self) -> Result<&Polyline, KernelError> {
        match self {
            Self::Wire(wire) => Ok(wire),
            other => Err(other.wrong_kind(ShapeKind::Wire)),
        }
    }

    /// Every solid mesh reachable from this shape
    pub fn solids(&self) -> Vec<&Mesh> {
        match self {
            Self::Solid(mesh) => vec![mesh],
            Self::Compound(children) => children.iter().flat_map(|c| c.solids()).collect(),
            _ => Vec::new(),
        }
    }

    /// Solids and compounds of solids measure the same way
    pub fn volume(&self) -> Result<f64, KernelError> {
        let solids = self.require_solids()?;
        Ok(solids.iter().map(|mesh| analytics::volume(mesh)).sum())
    }

    pub fn surface_area(&self) -> Result<f64, KernelError> {
        let solids = self.require_solids()?;
        Ok(solids.iter().map(|mesh| analytics::surface_area(mesh)).sum())
    }

    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Self::Vertex(p) => BoundingBox::new(*p, *p),
            Self::Wire(wire) => BoundingBox::from_points(&wire.points),
            Self::Solid(mesh) => mesh.bounding_box(),
            Self::Compound(children) => children
                .iter()
                .map(Shape::bounding_box)
                .filter(|b| !b.is_empty())
                .fold(BoundingBox::empty(), |acc, b| acc.union(&b)),
        }
    }

    /// Like [`Shape::solids`], but an error when there are none
    pub fn require_solids(&self) -> Result<Vec<&Mesh>, KernelError> {
        let solids = self.solids();
        if solids.is_empty() {
            return Err(self.wrong_kind(ShapeKind::Solid));
        }
        Ok(solids)
    }

    fn wrong_kind(&self, expected: ShapeKind) -> KernelError {
        KernelError::WrongShapeKind {
            expected: expected.label(),
            actual: self.kind().label(),
        }
    }
}

fn digest_point(hasher: &mut Sha256, p: &Point3<f64>) {
    for c in p.coords.iter() {
        hasher.update(c.to_bits().to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_identical_content_shares_fingerprint() {
        let a = Shape::Solid(Primitive::cube(10.0, Point3::origin()).to_mesh());
        let b = Shape::Solid(Primitive::cube(10.0, Point3::origin()).to_mesh());
        let c = Shape::Solid(Primitive::cube(11.0, Point3::origin()).to_mesh());

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_kind_is_part_of_fingerprint() {
        let p = Point3::new(1.0, 2.0, 3.0);
        let vertex = Shape::Vertex(p);
        let compound = Shape::Compound(vec![Shape::Vertex(p)]);
        assert_ne!(vertex.fingerprint(), compound.fingerprint());
    }

    #[test]
    fn test_wire_length_closed() {
        let square = Polyline::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            true,
        )
        .unwrap();
        assert_relative_eq!(square.length(), 4.0);
        assert!(Polyline::new(vec![Point3::origin()], false).is_err());
    }

    #[test]
    fn test_compound_volume_and_kind_errors() {
        let cube = Shape::Solid(Primitive::cube(2.0, Point3::origin()).to_mesh());
        let compound = Shape::Compound(vec![cube.clone(), Shape::Vertex(Point3::origin()), cube]);
        assert_relative_eq!(compound.volume().unwrap(), 16.0, epsilon = 1e-9);

        let vertex = Shape::Vertex(Point3::origin());
        assert!(matches!(
            vertex.volume(),
            Err(KernelError::WrongShapeKind { expected: "solid", actual: "vertex" })
        ));
    }

    #[test]
    fn test_transformed_vertex() {
        let vertex = Shape::Vertex(Point3::new(1.0, 0.0, 0.0));
        let moved = vertex.transformed(&Matrix4::new_translation(&Vector3::new(0.0, 2.0, 0.0)));
        assert_eq!(moved.as_vertex().unwrap(), &Point3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_type_names_round_trip() {
        for kind in ShapeKind::ALL {
            assert_eq!(ShapeKind::from_type_name(kind.type_name()), Some(kind));
        }
    }
}
