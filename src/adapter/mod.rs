// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Execution-context side of the bridge
//!
//! The [`KernelAdapter`] owns the handle table and answers every request
//! with exactly one response. Handles in the payload are resolved before
//! the kernel operation runs; shapes the operation produces are staged in a
//! [`CallContext`] and only enter the table once the operation succeeded.

mod memo;
mod registry;

pub use memo::{CallMemo, MemoKey};
pub use registry::{Handler, MethodRegistry};

use crate::api::{self, methods};
use crate::error::{BridgeError, KernelError};
use crate::geometry::Shape;
use crate::handle::{collect_handles, Fingerprint, Handle, HandleTable};
use crate::protocol::{Frame, RequestEnvelope, ResponseEnvelope};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Per-call view of the handle table handed to kernel operations
pub struct CallContext<'a> {
    table: &'a mut HandleTable<Shape>,
    run: u64,
    staged: Vec<(u64, Shape, Fingerprint)>,
    reused: Vec<u64>,
}

impl<'a> CallContext<'a> {
    pub(crate) fn new(table: &'a mut HandleTable<Shape>, run: u64) -> Self {
        Self {
            table,
            run,
            staged: Vec::new(),
            reused: Vec::new(),
        }
    }

    pub fn run(&self) -> u64 {
        self.run
    }

    /// Resolve an input handle by its hash. The `type` label is not
    /// consulted; operations check the shape kind they need.
    pub fn shape(&self, handle: &Handle) -> Result<&Shape, KernelError> {
        self.table
            .resolve(handle)
            .ok_or_else(|| KernelError::StaleHandle {
                hash: handle.hash,
                kind: handle.kind.clone(),
            })
    }

    pub fn shapes(&self, handles: &[Handle]) -> Result<Vec<&Shape>, KernelError> {
        handles.iter().map(|h| self.shape(h)).collect()
    }

    /// Hand a produced shape to the table and get its handle back.
    ///
    /// Structurally identical shapes share one handle, whether the twin is
    /// already live or was produced earlier in this same call.
    pub fn emit(&mut self, shape: Shape) -> Handle {
        let fingerprint = shape.fingerprint();
        let kind = shape.kind().type_name();

        if let Some(existing) = self.table.lookup_fingerprint(&fingerprint) {
            self.reused.push(existing.hash);
            return existing;
        }
        if let Some((hash, _, _)) = self.staged.iter().find(|(_, _, fp)| *fp == fingerprint) {
            return Handle::new(*hash, kind);
        }

        let hash = self.table.reserve_hash();
        self.staged.push((hash, shape, fingerprint));
        Handle::new(hash, kind)
    }

    /// Move staged shapes into the table. Returns how many were added.
    pub(crate) fn commit(self) -> usize {
        let added = self.staged.len();
        for (hash, shape, fingerprint) in self.staged {
            let kind = shape.kind().type_name();
            self.table
                .insert_reserved(hash, shape, kind, Some(fingerprint), self.run);
        }
        for hash in self.reused {
            self.table.touch(hash, self.run);
        }
        added
    }
}

/// Result of closing a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// The run that is now current
    pub run: u64,
    pub freed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub run: u64,
    pub live_handles: usize,
    pub memoized_calls: usize,
    pub memo_hits: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreedReport {
    pub freed: usize,
}

#[derive(Deserialize)]
struct DeleteShapesInput {
    shapes: Vec<Handle>,
}

/// What the adapter wants done after handling a frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Reply(Frame),
    Silent,
    Shutdown,
}

#[derive(Debug, Clone, Copy)]
pub struct AdapterOptions {
    pub memoize_calls: bool,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            memoize_calls: true,
        }
    }
}

pub struct KernelAdapter {
    table: HandleTable<Shape>,
    registry: MethodRegistry,
    memo: CallMemo,
    options: AdapterOptions,
    run: u64,
    last_handled: u64,
    cancelled: AHashSet<u64>,
}

impl KernelAdapter {
    /// Build an adapter around a registry that covers every kernel method
    pub fn new(registry: MethodRegistry, options: AdapterOptions) -> Result<Self, BridgeError> {
        registry.ensure_complete(api::KERNEL_METHODS)?;
        Ok(Self {
            table: HandleTable::new(),
            registry,
            memo: CallMemo::new(),
            options,
            run: 0,
            last_handled: 0,
            cancelled: AHashSet::new(),
        })
    }

    /// Adapter wired to the built-in mesh kernel
    pub fn with_kernel(options: AdapterOptions) -> Result<Self, BridgeError> {
        let mut registry = MethodRegistry::new();
        crate::kernel::register_all(&mut registry);
        Self::new(registry, options)
    }

    pub fn run(&self) -> u64 {
        self.run
    }

    pub fn table(&self) -> &HandleTable<Shape> {
        &self.table
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            run: self.run,
            live_handles: self.table.len(),
            memoized_calls: self.memo.len(),
            memo_hits: self.memo.hits(),
        }
    }

    /// Handle one decoded frame
    pub fn handle_frame(&mut self, frame: Frame) -> FrameOutcome {
        match frame {
            Frame::Request(request) => FrameOutcome::Reply(Frame::Response(self.handle_request(request))),
            Frame::Cancel { correlation_id } => {
                self.cancel(correlation_id);
                FrameOutcome::Silent
            }
            Frame::Shutdown => FrameOutcome::Shutdown,
            Frame::Response(response) => {
                warn!(
                    correlation_id = response.correlation_id,
                    "execution context received a response frame; ignoring"
                );
                FrameOutcome::Silent
            }
        }
    }

    /// Handle one frame in its text form. Undecodable text still gets a
    /// failure response so the sender is never left waiting.
    pub fn handle_text(&mut self, text: &str) -> Option<String> {
        let outcome = match Frame::decode(text) {
            Ok(frame) => self.handle_frame(frame),
            Err(e) => {
                warn!("undecodable frame: {e}");
                let err = KernelError::InvalidPayload(format!("undecodable frame: {e}"));
                FrameOutcome::Reply(Frame::Response(ResponseEnvelope::failure(0, &err)))
            }
        };
        match outcome {
            FrameOutcome::Reply(frame) => match frame.encode() {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!("failed to encode response frame: {e}");
                    None
                }
            },
            FrameOutcome::Silent | FrameOutcome::Shutdown => None,
        }
    }

    /// Skip a request that has not been handled yet
    pub fn cancel(&mut self, correlation_id: u64) {
        if correlation_id > self.last_handled {
            self.cancelled.insert(correlation_id);
        }
    }

    pub fn handle_request(&mut self, request: RequestEnvelope) -> ResponseEnvelope {
        let RequestEnvelope {
            correlation_id,
            method_name,
            payload,
        } = request;
        let started = call_clock();

        let outcome = if self.cancelled.remove(&correlation_id) {
            Err(KernelError::Cancelled(correlation_id))
        } else {
            self.dispatch(&method_name, payload)
        };
        self.last_handled = self.last_handled.max(correlation_id);

        match outcome {
            Ok(result) => {
                debug!(
                    correlation_id,
                    method = %method_name,
                    elapsed_us = started.map(|t| t.elapsed().as_micros() as u64),
                    live = self.table.len(),
                    "request handled"
                );
                ResponseEnvelope::success(correlation_id, result)
            }
            Err(err) => {
                debug!(correlation_id, method = %method_name, error = %err, "request failed");
                ResponseEnvelope::failure(correlation_id, &err)
            }
        }
    }

    /// Drop everything last seen before the run that just finished
    pub fn begin_new_run(&mut self) -> RunReport {
        let previous = self.run;
        self.run += 1;
        let freed = self.table.sweep(previous);
        let forgotten = self.memo.sweep(previous);
        info!(
            run = self.run,
            freed,
            forgotten,
            live = self.table.len(),
            "started new run"
        );
        RunReport {
            run: self.run,
            freed,
        }
    }

    pub fn clean_all_cache(&mut self) -> usize {
        let freed = self.table.clear();
        self.memo.clear();
        info!(freed, "cleared handle table");
        freed
    }

    /// Release specific handles now. Fails without releasing anything if
    /// one of them is not live.
    pub fn delete_shapes(&mut self, handles: &[Handle]) -> Result<usize, KernelError> {
        self.require_live(handles)?;
        let freed = handles
            .iter()
            .filter(|h| self.table.remove(h.hash).is_some())
            .count();
        Ok(freed)
    }

    fn dispatch(&mut self, method: &str, payload: Value) -> Result<Value, KernelError> {
        match method {
            methods::BEGIN_NEW_RUN => return Ok(serde_json::to_value(self.begin_new_run())?),
            methods::CLEAN_ALL_CACHE => {
                let freed = self.clean_all_cache();
                return Ok(serde_json::to_value(FreedReport { freed })?);
            }
            methods::CACHE_STATS => return Ok(serde_json::to_value(self.stats())?),
            methods::DELETE_SHAPES => {
                let input: DeleteShapesInput = serde_json::from_value(payload)?;
                let freed = self.delete_shapes(&input.shapes)?;
                return Ok(serde_json::to_value(FreedReport { freed })?);
            }
            _ => {}
        }

        let handler = self
            .registry
            .get(method)
            .ok_or_else(|| KernelError::UnknownMethod(method.to_string()))?;

        let inputs = collect_handles(&payload);
        Self::check_live(&self.table, &inputs)?;
        for handle in &inputs {
            self.table.touch(handle.hash, self.run);
        }

        let memo_key = (self.options.memoize_calls && CallMemo::is_memoizable(method))
            .then(|| CallMemo::key(method, &payload));
        if let Some(key) = &memo_key {
            if let Some(result) = self.memo.lookup(key, &mut self.table, self.run) {
                debug!(method, "memo hit");
                return Ok(result);
            }
        }

        let mut ctx = CallContext::new(&mut self.table, self.run);
        let result = match catch_unwind(AssertUnwindSafe(|| handler(&mut ctx, payload))) {
            Ok(result) => result?,
            Err(panic) => return Err(KernelError::Panicked(panic_message(panic.as_ref()))),
        };
        let added = ctx.commit();
        if added > 0 {
            debug!(method, added, "registered new handles");
        }

        if let Some(key) = memo_key {
            self.memo.insert(key, result.clone(), self.run);
        }
        Ok(result)
    }

    fn require_live(&self, handles: &[Handle]) -> Result<(), KernelError> {
        Self::check_live(&self.table, handles)
    }

    fn check_live(table: &HandleTable<Shape>, handles: &[Handle]) -> Result<(), KernelError> {
        for handle in handles {
            if !table.contains(handle.hash) {
                return Err(KernelError::StaleHandle {
                    hash: handle.hash,
                    kind: handle.kind.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Start time for request logging. wasm32 has no std clock, so calls go
/// untimed there.
#[cfg(not(target_arch = "wasm32"))]
fn call_clock() -> Option<Instant> {
    Some(Instant::now())
}

#[cfg(target_arch = "wasm32")]
fn call_clock() -> Option<Instant> {
    None
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
