// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! STEP exporter
//!
//! Writes solids as faceted B-Reps: one `POLY_LOOP` face per triangle,
//! gathered in a `CLOSED_SHELL`. Vertices are shared by position.

use crate::geometry::Mesh;
use ahash::AHashMap;
use std::fmt::Write;

/// Serialize `solids` into a single STEP (AP214) document
pub fn to_step(solids: &[&Mesh], file_name: &str) -> String {
    let mut out = String::new();
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S");

    out.push_str("ISO-10303-21;\n");
    out.push_str("HEADER;\n");
    out.push_str("FILE_DESCRIPTION(('Polyframe Bridge Export'),'2;1');\n");
    let _ = writeln!(
        out,
        "FILE_NAME('{}','{}',('Polyframe'),('Polyframe Inc.'),'Polyframe Bridge','','');",
        escape(file_name),
        timestamp
    );
    out.push_str("FILE_SCHEMA(('AUTOMOTIVE_DESIGN'));\n");
    out.push_str("ENDSEC;\n");
    out.push_str("DATA;\n");

    let mut next_id = 1usize;
    let mut alloc = || {
        let id = next_id;
        next_id += 1;
        id
    };

    for (solid_index, mesh) in solids.iter().enumerate() {
        let mut point_ids: AHashMap<[u64; 3], usize> = AHashMap::new();
        let mut face_ids = Vec::with_capacity(mesh.triangles.len());

        for triangle in &mesh.triangles {
            let mut corners = [0usize; 3];
            for (slot, p) in corners.iter_mut().zip(triangle.positions(mesh)) {
                let key = [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()];
                *slot = match point_ids.get(&key) {
                    Some(id) => *id,
                    None => {
                        let id = alloc();
                        let _ = writeln!(
                            out,
                            "#{}=CARTESIAN_POINT('',({},{},{}));",
                            id,
                            real(p.x),
                            real(p.y),
                            real(p.z)
                        );
                        point_ids.insert(key, id);
                        id
                    }
                };
            }

            let loop_id = alloc();
            let _ = writeln!(
                out,
                "#{}=POLY_LOOP('',(#{},#{},#{}));",
                loop_id, corners[0], corners[1], corners[2]
            );
            let bound_id = alloc();
            let _ = writeln!(out, "#{}=FACE_OUTER_BOUND('',#{},.T.);", bound_id, loop_id);
            let face_id = alloc();
            let _ = writeln!(out, "#{}=FACE('',(#{}));", face_id, bound_id);
            face_ids.push(face_id);
        }

        let shell_id = alloc();
        let faces: Vec<String> = face_ids.iter().map(|id| format!("#{id}")).collect();
        let _ = writeln!(out, "#{}=CLOSED_SHELL('',({}));", shell_id, faces.join(","));
        let brep_id = alloc();
        let _ = writeln!(
            out,
            "#{}=FACETED_BREP('solid_{}',#{});",
            brep_id, solid_index, shell_id
        );
    }

    out.push_str("ENDSEC;\n");
    out.push_str("END-ISO-10303-21;\n");
    out
}

/// STEP reals always carry a decimal point
fn real(value: f64) -> String {
    format!("{:.6}", value)
}

fn escape(text: &str) -> String {
    text.replace('\'', "''")
}
