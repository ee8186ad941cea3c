// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! A coordinator session: channel, execution context and dispatcher wired
//! together, plus the run lifecycle on top.

use crate::adapter::{AdapterOptions, CacheStats, FreedReport, KernelAdapter, RunReport};
use crate::api::methods;
use crate::channel::duplex;
use crate::config::BridgeConfig;
use crate::dispatcher::Dispatcher;
use crate::error::BridgeError;
use crate::handle::Handle;
use crate::protocol::Frame;
use crate::worker;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::task::JoinHandle as TaskHandle;
use tracing::{debug, info};

/// Where the session is in its run lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No calls in flight
    Idle,
    /// At least one call is awaiting its response
    Executing,
    /// A sweep has been sent and not yet acknowledged
    SweepRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub phase: Phase,
    pub run: u64,
    pub in_flight: usize,
}

#[derive(Default)]
struct Lifecycle {
    run: AtomicU64,
    in_flight: AtomicUsize,
    sweeping: AtomicBool,
}

/// Decrements the in-flight count when the call settles or is dropped
struct InFlight(Arc<Lifecycle>);

impl InFlight {
    fn enter(lifecycle: &Arc<Lifecycle>) -> Self {
        lifecycle.in_flight.fetch_add(1, Ordering::SeqCst);
        Self(lifecycle.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

struct Sweeping<'a>(&'a Lifecycle);

impl Drop for Sweeping<'_> {
    fn drop(&mut self) {
        self.0.sweeping.store(false, Ordering::SeqCst);
    }
}

pub struct Session {
    dispatcher: Dispatcher,
    lifecycle: Arc<Lifecycle>,
    sweep_lock: tokio::sync::Mutex<()>,
    worker: Option<JoinHandle<()>>,
    router: TaskHandle<()>,
    config: BridgeConfig,
}

impl Session {
    /// Start a session around the built-in kernel.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(config: BridgeConfig) -> Result<Self, BridgeError> {
        let adapter = KernelAdapter::with_kernel(AdapterOptions {
            memoize_calls: config.memoize_calls,
        })?;
        Self::with_adapter(config, adapter)
    }

    /// Start a session around a prepared adapter
    pub fn with_adapter(config: BridgeConfig, adapter: KernelAdapter) -> Result<Self, BridgeError> {
        let (coordinator, context) = duplex();
        let worker = worker::spawn(&config.worker_thread_name, context, adapter)?;
        let (sender, receiver) = coordinator.split();
        let (dispatcher, router) = Dispatcher::start(sender, receiver, config.call_timeout());

        info!(
            worker = %config.worker_thread_name,
            timeout_ms = ?config.call_timeout_ms,
            memoize = config.memoize_calls,
            "bridge session started"
        );

        Ok(Self {
            dispatcher,
            lifecycle: Arc::new(Lifecycle::default()),
            sweep_lock: tokio::sync::Mutex::new(()),
            worker: Some(worker),
            router,
            config,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        let in_flight = self.lifecycle.in_flight.load(Ordering::SeqCst);
        let phase = if self.lifecycle.sweeping.load(Ordering::SeqCst) {
            Phase::SweepRequested
        } else if in_flight > 0 {
            Phase::Executing
        } else {
            Phase::Idle
        };
        SessionState {
            phase,
            run: self.lifecycle.run.load(Ordering::SeqCst),
            in_flight,
        }
    }

    /// Send a call now and return a future for its result
    pub fn call(
        &self,
        method: &str,
        payload: Value,
    ) -> impl Future<Output = Result<Value, BridgeError>> + Send + 'static {
        let guard = InFlight::enter(&self.lifecycle);
        let call = self.dispatcher.call(method, payload);
        async move {
            let result = call.await;
            drop(guard);
            result
        }
    }

    /// Call with typed input and output
    pub async fn call_typed<I, O>(&self, method: &str, input: &I) -> Result<O, BridgeError>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let payload = serde_json::to_value(input)?;
        let result = self.call(method, payload).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Close the current run: everything not used during it is released.
    ///
    /// Calls sent before this are answered before the sweep happens.
    pub async fn begin_new_run(&self) -> Result<RunReport, BridgeError> {
        let _serialized = self.sweep_lock.lock().await;
        self.lifecycle.sweeping.store(true, Ordering::SeqCst);
        let _reset = Sweeping(&self.lifecycle);

        let report: RunReport = self.call_typed(methods::BEGIN_NEW_RUN, &json!({})).await?;
        self.lifecycle.run.store(report.run, Ordering::SeqCst);
        debug!(run = report.run, freed = report.freed, "run closed");
        Ok(report)
    }

    pub async fn cache_stats(&self) -> Result<CacheStats, BridgeError> {
        self.call_typed(methods::CACHE_STATS, &json!({})).await
    }

    pub async fn clean_all_cache(&self) -> Result<usize, BridgeError> {
        let _serialized = self.sweep_lock.lock().await;
        let report: FreedReport = self.call_typed(methods::CLEAN_ALL_CACHE, &json!({})).await?;
        Ok(report.freed)
    }

    pub async fn delete_shapes(&self, shapes: &[Handle]) -> Result<usize, BridgeError> {
        let report: FreedReport = self
            .call_typed(methods::DELETE_SHAPES, &json!({ "shapes": shapes }))
            .await?;
        Ok(report.freed)
    }

    pub fn pending_calls(&self) -> usize {
        self.dispatcher.pending_count()
    }

    /// Ask the execution context to stop after the calls already sent.
    /// Anything sent afterwards is rejected with `ContextLost`.
    pub fn request_shutdown(&self) {
        if self.dispatcher.send_frame(&Frame::Shutdown).is_err() {
            debug!("execution context already gone");
        }
    }

    /// Stop the execution context and wait for it to finish
    pub async fn shutdown(mut self) -> Result<(), BridgeError> {
        self.request_shutdown();

        if let Some(worker) = self.worker.take() {
            let joined = tokio::task::spawn_blocking(move || worker.join()).await;
            if !matches!(joined, Ok(Ok(()))) {
                return Err(BridgeError::ContextLost {
                    method: "shutdown".to_string(),
                });
            }
        }

        drop(self.dispatcher);
        let _ = self.router.await;
        info!("bridge session stopped");
        Ok(())
    }
}
