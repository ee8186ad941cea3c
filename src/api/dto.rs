// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Payload and result shapes for kernel methods

use crate::geometry::BoundingBox;
use crate::handle::Handle;
use serde::{Deserialize, Serialize};

pub type Point = [f64; 3];

/// Placement of a primitive: a flag centering it on the origin, or an
/// explicit center point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Center {
    Flag(bool),
    Point(Point),
}

impl Default for Center {
    fn default() -> Self {
        Self::Flag(false)
    }
}

impl From<bool> for Center {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl From<Point> for Center {
    fn from(point: Point) -> Self {
        Self::Point(point)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVertexInput {
    pub point: Point,
}

/// Any method that takes one shape
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeInput {
    pub shape: Handle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapesInput {
    pub shapes: Vec<Handle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolylineWireInput {
    pub points: Vec<Point>,
    #[serde(default)]
    pub closed: bool,
}

/// `center: false` puts the minimum corner at the origin
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxInput {
    pub width: f64,
    pub length: f64,
    pub height: f64,
    #[serde(default)]
    pub center: Center,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CubeInput {
    pub size: f64,
    #[serde(default)]
    pub center: Center,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SphereInput {
    pub radius: f64,
    /// A flag always means the origin
    #[serde(default)]
    pub center: Center,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<u32>,
}

/// `center: false` puts the base on the XY plane
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CylinderInput {
    pub radius: f64,
    pub height: f64,
    #[serde(default)]
    pub center: Center,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConeInput {
    pub radius1: f64,
    pub radius2: f64,
    pub height: f64,
    #[serde(default)]
    pub center: Center,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateInput {
    pub shape: Handle,
    pub translation: Point,
}

/// Rotation about an axis through the origin, in degrees
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotateInput {
    pub shape: Handle,
    pub axis: Point,
    pub angle: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleInput {
    pub shape: Handle,
    pub factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveShapeInput {
    pub shape: Handle,
    pub file_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileEncoding {
    Base64,
    Text,
}

/// Exported file contents; writing to disk is the caller's business
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFile {
    pub file_name: String,
    pub encoding: FileEncoding,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBoxResult {
    pub min: Point,
    pub max: Point,
    pub center: Point,
    pub size: Point,
}

impl From<&BoundingBox> for BoundingBoxResult {
    fn from(bbox: &BoundingBox) -> Self {
        let center = bbox.center();
        let size = bbox.size();
        Self {
            min: [bbox.min.x, bbox.min.y, bbox.min.z],
            max: [bbox.max.x, bbox.max.y, bbox.max.z],
            center: [center.x, center.y, center.z],
            size: [size.x, size.y, size.z],
        }
    }
}
