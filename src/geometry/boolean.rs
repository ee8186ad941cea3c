// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boolean union of solids
//!
//! The union is a mesh merge: disjoint operands give an exact result,
//! overlapping operands keep their interior faces.

use super::Mesh;
use crate::error::KernelError;

/// Merge all operands into one mesh
pub fn union_all<'a>(meshes: impl IntoIterator<Item = &'a Mesh>) -> Result<Mesh, KernelError> {
    let mut meshes = meshes.into_iter();
    let first = meshes
        .next()
        .ok_or_else(|| KernelError::invalid_input("union needs at least two solids"))?;

    let mut result = first.clone();
    let mut operands = 1;
    for mesh in meshes {
        result.merge(mesh);
        operands += 1;
    }

    if operands < 2 {
        return Err(KernelError::invalid_input("union needs at least two solids"));
    }
    Ok(result)
}
