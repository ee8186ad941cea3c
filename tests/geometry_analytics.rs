// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry measurements served through the bridge

use anyhow::Result;
use polyframe_bridge::api::methods;
use polyframe_bridge::{BridgeConfig, BridgeError, Session};
use serde_json::json;
use std::f64::consts::PI;

#[tokio::test]
async fn test_box_volume_area_and_bounds() -> Result<()> {
    let session = Session::spawn(BridgeConfig::default())?;
    let part = session.create_box(10.0, 20.0, 30.0, true).await?;

    let volume = session.solid_volume(&part).await?;
    let area = session.solid_surface_area(&part).await?;
    let bbox = session.bounding_box(&part).await?;

    println!("Box 10×20×30:");
    println!("  Volume: {:.2} (expected: 6000)", volume);
    println!("  Surface area: {:.2} (expected: 2200)", area);

    assert!((volume - 6000.0).abs() < 1e-6);
    assert!((area - 2200.0).abs() < 1e-6);
    assert_eq!(bbox.min, [-5.0, -10.0, -15.0]);
    assert_eq!(bbox.max, [5.0, 10.0, 15.0]);
    assert_eq!(bbox.size, [10.0, 20.0, 30.0]);

    session.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_sphere_and_cylinder_within_tessellation_error() -> Result<()> {
    let session = Session::spawn(BridgeConfig::default())?;
    let radius = 5.0;

    let sphere = session.create_sphere(radius, [0.0, 0.0, 0.0]).await?;
    let expected_volume = 4.0 / 3.0 * PI * radius.powi(3);
    let volume = session.solid_volume(&sphere).await?;
    let volume_error = ((volume - expected_volume) / expected_volume).abs();
    println!("Sphere r={}: volume {:.2} (expected {:.2})", radius, volume, expected_volume);
    assert!(volume_error < 0.05, "volume error {:.1}%", volume_error * 100.0);

    let cylinder = session.create_cylinder(radius, 20.0, false).await?;
    let expected_area = 2.0 * PI * radius * (radius + 20.0);
    let area = session.solid_surface_area(&cylinder).await?;
    let area_error = ((area - expected_area) / expected_area).abs();
    println!("Cylinder r={} h=20: area {:.2} (expected {:.2})", radius, area, expected_area);
    assert!(area_error < 0.05, "area error {:.1}%", area_error * 100.0);

    session.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_transforms_preserve_or_scale_volume() -> Result<()> {
    let session = Session::spawn(BridgeConfig::default())?;
    let cube = session.create_cube(2.0, true).await?;

    let turned = session.rotate(&cube, [1.0, 1.0, 0.0], 33.0).await?;
    let doubled = session.scale(&cube, 2.0).await?;
    let mirrored = session.scale(&cube, -1.0).await?;

    assert!((session.solid_volume(&turned).await? - 8.0).abs() < 1e-9);
    assert!((session.solid_volume(&doubled).await? - 64.0).abs() < 1e-9);
    assert!((session.solid_volume(&mirrored).await? - 8.0).abs() < 1e-9);
    assert!(session.scale(&cube, 0.0).await.is_err());

    session.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_shape_to_mesh_faces_and_edges() -> Result<()> {
    let session = Session::spawn(BridgeConfig::default())?;
    let cube = session.create_cube(1.0, false).await?;
    let corner = session.create_vertex([3.0, 3.0, 3.0]).await?;
    let both = session.make_compound(&[cube, corner.clone()]).await?;

    let mesh = session.shape_to_mesh(&both).await?;
    assert_eq!(mesh.face_list.len(), 6);
    assert_eq!(mesh.edge_list.len(), 12);
    assert_eq!(mesh.point_list, vec![[3.0, 3.0, 3.0]]);
    assert_eq!(session.vertex_coordinates(&corner).await?, [3.0, 3.0, 3.0]);

    session.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_oversized_tessellation_is_a_kernel_error() -> Result<()> {
    let session = Session::spawn(BridgeConfig::default())?;

    let err = session
        .call(
            methods::CREATE_CONE,
            json!({ "radius1": 1.0, "radius2": 1.0, "height": 1.0, "segments": u32::MAX }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Kernel { .. }), "unexpected {err}");

    // The context is still serving calls afterwards
    let sphere = session
        .call(methods::CREATE_SPHERE, json!({ "radius": 1.0, "segments": 64 }))
        .await?;
    println!("Sphere with 64 segments: {}", sphere);
    assert_eq!(session.cache_stats().await?.live_handles, 1);

    session.shutdown().await?;
    Ok(())
}
