// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! End-to-end behaviour of a session talking to the kernel worker

use anyhow::Result;
use polyframe_bridge::api::methods;
use polyframe_bridge::{BridgeConfig, BridgeError, FailureKind, Handle, Phase, Session};
use serde_json::json;

fn session() -> Result<Session> {
    Ok(Session::spawn(BridgeConfig::default())?)
}

#[tokio::test]
async fn test_create_box_then_volume() -> Result<()> {
    let session = session()?;

    let result = session
        .call(
            methods::CREATE_BOX,
            json!({ "width": 10, "height": 10, "length": 10, "center": [0, 0, 0] }),
        )
        .await?;
    let h1: Handle = serde_json::from_value(result.clone())?;
    assert_eq!(h1.kind, "TopoDSSolidPointer");
    assert_eq!(result.as_object().map(|m| m.len()), Some(2));

    let volume = session
        .call(methods::GET_SOLID_VOLUME, json!({ "shape": h1 }))
        .await?;
    let volume = volume.as_f64().unwrap_or_default();
    assert!((volume - 1000.0).abs() < 1e-6, "volume {volume}");

    session.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_union_returns_new_handle_and_keeps_operands() -> Result<()> {
    let session = session()?;
    let h1 = session.create_box(10.0, 10.0, 10.0, false).await?;
    let h2 = session.create_sphere(3.0, [30.0, 0.0, 0.0]).await?;

    let h3 = session.union(&[h1.clone(), h2.clone()]).await?;
    assert_ne!(h3, h1);
    assert_ne!(h3, h2);

    // Operands stay resolvable until the next sweep
    assert!(session.solid_volume(&h1).await? > 0.0);
    assert!(session.solid_volume(&h2).await? > 0.0);
    let fused = session.solid_volume(&h3).await?;
    let parts = session.solid_volume(&h1).await? + session.solid_volume(&h2).await?;
    assert!((fused - parts).abs() < 1e-6);

    session.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_two_sweeps_free_the_first_run() -> Result<()> {
    let session = session()?;
    let old = session.create_box(1.0, 2.0, 3.0, false).await?;

    let first = session.begin_new_run().await?;
    assert_eq!(first.freed, 0);
    let second = session.begin_new_run().await?;
    assert_eq!(second.freed, 1);
    assert_eq!(session.state().run, 2);

    let err = session.solid_volume(&old).await.unwrap_err();
    assert!(err.is_stale_handle(), "unexpected {err}");
    assert_eq!(session.cache_stats().await?.live_handles, 0);

    session.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_handles_used_each_run_survive() -> Result<()> {
    let session = session()?;
    let kept = session.create_cube(5.0, true).await?;
    let dropped = session.create_cube(7.0, true).await?;

    for _ in 0..5 {
        session.solid_volume(&kept).await?;
        session.begin_new_run().await?;
    }

    assert!(session.solid_volume(&kept).await.is_ok());
    assert!(session.solid_volume(&dropped).await.unwrap_err().is_stale_handle());

    session.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_table_stays_bounded_over_many_runs() -> Result<()> {
    let session = Session::spawn(BridgeConfig::default().with_memoize_calls(false))?;

    let mut peak = 0;
    for run in 0..20 {
        // Each run builds ten parts it never built before
        for i in 0..10 {
            let size = 1.0 + (run * 10 + i) as f64;
            let cube = session.create_cube(size, false).await?;
            session.translate(&cube, [size, 0.0, 0.0]).await?;
        }
        peak = peak.max(session.cache_stats().await?.live_handles);
        session.begin_new_run().await?;
    }

    // Only the last run's twenty entries may survive a sweep
    assert_eq!(peak, 40);
    assert_eq!(session.cache_stats().await?.live_handles, 20);

    session.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_identical_calls_return_identical_handles() -> Result<()> {
    let session = Session::spawn(BridgeConfig::default().with_memoize_calls(false))?;

    let a = session.create_box(4.0, 5.0, 6.0, true).await?;
    let b = session.create_box(4.0, 5.0, 6.0, true).await?;
    assert_eq!(a, b);

    // A different route to the same geometry also lands on the same entry
    let cube = session.create_cube(2.0, true).await?;
    let moved = session.translate(&cube, [1.0, 0.0, 0.0]).await?;
    let back = session.translate(&moved, [-1.0, 0.0, 0.0]).await?;
    assert_eq!(back, cube);

    assert_eq!(session.cache_stats().await?.live_handles, 3);
    session.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_memoized_calls_hit_across_runs() -> Result<()> {
    let session = session()?;

    let first = session.create_sphere(2.0, [0.0, 0.0, 0.0]).await?;
    session.begin_new_run().await?;
    let second = session.create_sphere(2.0, [0.0, 0.0, 0.0]).await?;
    assert_eq!(first, second);

    let stats = session.cache_stats().await?;
    assert_eq!(stats.memo_hits, 1);
    assert!(stats.memoized_calls >= 1);

    // The hit counted as a use, so the sphere survives the next sweep
    session.begin_new_run().await?;
    assert!(session.solid_volume(&first).await.is_ok());

    session.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_kernel_errors_reject_without_registering() -> Result<()> {
    let session = session()?;
    let cube = session.create_cube(1.0, false).await?;
    let before = session.cache_stats().await?.live_handles;

    let err = session.create_box(-1.0, 1.0, 1.0, false).await.unwrap_err();
    assert!(matches!(err, BridgeError::Kernel { .. }), "unexpected {err}");

    let err = session.union(&[cube.clone()]).await.unwrap_err();
    assert_eq!(err.method(), Some(methods::UNION));

    let err = session.rotate(&cube, [0.0, 0.0, 0.0], 45.0).await.unwrap_err();
    assert!(matches!(err, BridgeError::Kernel { .. }));

    assert_eq!(session.cache_stats().await?.live_handles, before);
    session.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_stale_and_forged_handles_are_rejected() -> Result<()> {
    let session = session()?;
    let cube = session.create_cube(1.0, false).await?;

    let ghost = Handle::new(cube.hash + 1000, "TopoDSSolidPointer");
    let err = session.translate(&ghost, [1.0, 0.0, 0.0]).await.unwrap_err();
    assert!(err.is_stale_handle());

    session.delete_shapes(&[cube.clone()]).await?;
    assert!(session.solid_volume(&cube).await.unwrap_err().is_stale_handle());

    session.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_unknown_method_and_bad_payload() -> Result<()> {
    let session = session()?;

    match session.call("shapes.solid.createTorus", json!({})).await {
        Err(BridgeError::Rejected { kind, .. }) => assert_eq!(kind, FailureKind::UnknownMethod),
        other => panic!("unexpected {:?}", other),
    }
    match session.call(methods::CREATE_BOX, json!({ "width": "wide" })).await {
        Err(BridgeError::Rejected { kind, .. }) => assert_eq!(kind, FailureKind::InvalidPayload),
        other => panic!("unexpected {:?}", other),
    }

    session.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_clean_all_cache_keeps_run_counter() -> Result<()> {
    let session = session()?;
    let cube = session.create_cube(3.0, false).await?;
    session.begin_new_run().await?;

    assert_eq!(session.clean_all_cache().await?, 1);
    let stats = session.cache_stats().await?;
    assert_eq!(stats.live_handles, 0);
    assert_eq!(stats.memoized_calls, 0);
    assert_eq!(stats.run, 1);
    assert!(session.solid_volume(&cube).await.unwrap_err().is_stale_handle());

    // Fresh entries never reuse an old hash
    let again = session.create_cube(3.0, false).await?;
    assert_ne!(again.hash, cube.hash);

    session.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_session_phase_tracking() -> Result<()> {
    let session = session()?;
    assert_eq!(session.state().phase, Phase::Idle);

    let pending = session.call(methods::CREATE_CUBE, json!({ "size": 1.0 }));
    assert_eq!(session.state().phase, Phase::Executing);
    pending.await?;
    assert_eq!(session.state().phase, Phase::Idle);

    session.begin_new_run().await?;
    let state = session.state();
    assert_eq!(state.phase, Phase::Idle);
    assert_eq!(state.run, 1);

    session.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_calls_after_shutdown_request_lose_context() -> Result<()> {
    let session = session()?;
    let answered = session.call(methods::CREATE_CUBE, json!({ "size": 1.0 }));
    session.request_shutdown();

    // Sent before the shutdown frame, so still answered
    answered.await?;

    let err = session
        .call(methods::CREATE_CUBE, json!({ "size": 2.0 }))
        .await
        .unwrap_err();
    assert!(err.is_context_lost(), "unexpected {err}");
    Ok(())
}
