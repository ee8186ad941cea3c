// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe Bridge
//!
//! Drives a geometry kernel that lives in a separate execution context.
//! Kernel entities never cross the channel; the coordinator holds opaque
//! [`Handle`]s instead, issues calls as `"namespace.method"` strings with
//! correlated responses, and bounds memory with a generational sweep at the
//! start of every run.
//!
//! ```no_run
//! # async fn demo() -> Result<(), polyframe_bridge::BridgeError> {
//! use polyframe_bridge::{BridgeConfig, Session};
//!
//! let session = Session::spawn(BridgeConfig::default())?;
//! let part = session.create_box(10.0, 20.0, 30.0, false).await?;
//! let volume = session.solid_volume(&part).await?;
//! assert!((volume - 6000.0).abs() < 1e-6);
//! session.begin_new_run().await?;
//! session.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod api;
pub mod config;
pub mod error;
pub mod geometry;
pub mod handle;
pub mod io;
pub mod kernel;
pub mod logging;
pub mod protocol;

#[cfg(not(target_arch = "wasm32"))]
pub mod channel;
#[cfg(not(target_arch = "wasm32"))]
pub mod dispatcher;
#[cfg(not(target_arch = "wasm32"))]
pub mod script;
#[cfg(not(target_arch = "wasm32"))]
pub mod session;
#[cfg(not(target_arch = "wasm32"))]
pub mod worker;

#[cfg(feature = "wasm")]
pub mod ffi;

pub use adapter::{AdapterOptions, CacheStats, CallContext, KernelAdapter, MethodRegistry, RunReport};
pub use config::BridgeConfig;
pub use error::{BridgeError, FailureKind, KernelError};
pub use handle::{Handle, HandleTable};
pub use protocol::{Frame, RequestEnvelope, ResponseEnvelope};

#[cfg(not(target_arch = "wasm32"))]
pub use dispatcher::Dispatcher;
#[cfg(not(target_arch = "wasm32"))]
pub use session::{Phase, Session, SessionState};
