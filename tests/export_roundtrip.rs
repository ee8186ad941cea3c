// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Export through the bridge and read the results back

use anyhow::Result;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use polyframe_bridge::api::dto::FileEncoding;
use polyframe_bridge::{BridgeConfig, Session};
use std::io::Cursor;

#[tokio::test]
async fn test_stl_export_roundtrip() -> Result<()> {
    let session = Session::spawn(BridgeConfig::default())?;
    let a = session.create_cube(10.0, true).await?;
    let b = session.translate(&a, [20.0, 0.0, 0.0]).await?;
    let part = session.union(&[a, b]).await?;

    let saved = session.save_shape_stl(&part, "part.stl").await?;
    assert_eq!(saved.file_name, "part.stl");
    assert_eq!(saved.encoding, FileEncoding::Base64);

    let bytes = BASE64.decode(&saved.content)?;
    let mesh = stl_io::read_stl(&mut Cursor::new(bytes))?;
    println!("STL: {} faces, {} vertices", mesh.faces.len(), mesh.vertices.len());

    assert_eq!(mesh.faces.len(), 24);
    // Two disjoint cubes share no corners
    assert_eq!(mesh.vertices.len(), 16);

    session.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_step_export_structure() -> Result<()> {
    let session = Session::spawn(BridgeConfig::default())?;
    let cube = session.create_cube(10.0, true).await?;
    let sphere = session.create_sphere(2.0, [20.0, 0.0, 0.0]).await?;
    let compound = session.make_compound(&[cube.clone(), sphere]).await?;

    let saved = session.save_shape_step(&compound, "assembly.step").await?;
    assert_eq!(saved.encoding, FileEncoding::Text);

    let step = &saved.content;
    assert!(step.starts_with("ISO-10303-21;"));
    assert!(step.trim_end().ends_with("END-ISO-10303-21;"));
    assert!(step.contains("FILE_NAME('assembly.step'"));
    assert_eq!(step.matches("FACETED_BREP(").count(), 2);
    assert!(step.contains("(-5.000000,-5.000000,-5.000000)"));

    session.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_exports_need_solids() -> Result<()> {
    let session = Session::spawn(BridgeConfig::default())?;
    let wire = session
        .create_polyline_wire(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], false)
        .await?;

    let err = session.save_shape_stl(&wire, "wire.stl").await.unwrap_err();
    assert!(err.to_string().contains("expected a solid"), "{err}");

    let cube = session.create_cube(1.0, false).await?;
    assert!(session.save_shape_stl(&cube, "  ").await.is_err());

    session.shutdown().await?;
    Ok(())
}
