// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Coordinator-side request dispatcher
//!
//! Every call gets a fresh correlation id and a pending entry holding the
//! resolver for its future. A single router task reads responses off the
//! channel and settles the matching entry. Responses may arrive in any
//! order. When the channel closes, every pending future is rejected with
//! [`BridgeError::ContextLost`].

use crate::channel::{FrameReceiver, FrameSender, TransportError};
use crate::error::{BridgeError, FailureKind};
use crate::protocol::{Frame, RequestEnvelope, ResponseEnvelope};
use dashmap::DashMap;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

type Resolver = oneshot::Sender<Result<Value, BridgeError>>;

struct PendingRequest {
    method: String,
    resolver: Resolver,
    created_at: Instant,
}

/// State shared between callers and the router task
#[derive(Default)]
struct Shared {
    next_id: AtomicU64,
    pending: DashMap<u64, PendingRequest>,
    closed: AtomicBool,
}

impl Shared {
    fn settle(&self, response: ResponseEnvelope) {
        let Some((id, pending)) = self.pending.remove(&response.correlation_id) else {
            warn!(
                correlation_id = response.correlation_id,
                "response for unknown correlation id; dropping"
            );
            return;
        };

        debug!(
            correlation_id = id,
            method = %pending.method,
            ok = response.ok,
            elapsed_ms = pending.created_at.elapsed().as_millis() as u64,
            "response received"
        );

        let outcome = if response.ok {
            Ok(response.result.unwrap_or(Value::Null))
        } else {
            Err(BridgeError::from_failure(
                &pending.method,
                response.error_kind.unwrap_or(FailureKind::Kernel),
                response.error_message.unwrap_or_default(),
            ))
        };
        // The caller may have stopped waiting
        let _ = pending.resolver.send(outcome);
    }

    /// Reject `id` with `err` if it is still pending
    fn reject(&self, id: u64, err: impl FnOnce(String) -> BridgeError) {
        if let Some((_, pending)) = self.pending.remove(&id) {
            let _ = pending.resolver.send(Err(err(pending.method)));
        }
    }

    fn fail_all(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let ids: Vec<u64> = self.pending.iter().map(|entry| *entry.key()).collect();
        if !ids.is_empty() {
            warn!(pending = ids.len(), "execution context lost; rejecting pending calls");
        }
        for id in ids {
            self.reject(id, |method| BridgeError::ContextLost { method });
        }
    }
}

/// Cloneable front door for issuing calls to the execution context
#[derive(Clone)]
pub struct Dispatcher {
    shared: Arc<Shared>,
    sender: FrameSender,
    timeout: Option<Duration>,
}

impl Dispatcher {
    /// Start the response router on the current Tokio runtime
    pub fn start(
        sender: FrameSender,
        receiver: FrameReceiver,
        timeout: Option<Duration>,
    ) -> (Self, JoinHandle<()>) {
        let shared = Arc::new(Shared::default());
        let router = tokio::spawn(route_responses(shared.clone(), receiver));
        (
            Self {
                shared,
                sender,
                timeout,
            },
            router,
        )
    }

    /// Issue a call.
    ///
    /// The request is registered and sent before this returns, so calls
    /// reach the execution context in the order `call` was invoked even if
    /// the futures are awaited in a different order.
    pub fn call(
        &self,
        method: &str,
        payload: Value,
    ) -> impl Future<Output = Result<Value, BridgeError>> + Send + 'static {
        let shared = self.shared.clone();
        let sender = self.sender.clone();
        let timeout = self.timeout;
        let method = method.to_string();

        let id = shared.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let (resolver, rx) = oneshot::channel();
        shared.pending.insert(
            id,
            PendingRequest {
                method: method.clone(),
                resolver,
                created_at: Instant::now(),
            },
        );

        if shared.closed.load(Ordering::SeqCst) {
            shared.reject(id, |method| BridgeError::ContextLost { method });
        } else {
            let frame = Frame::Request(RequestEnvelope {
                correlation_id: id,
                method_name: method.clone(),
                payload,
            });
            match sender.send(&frame) {
                Ok(()) => debug!(correlation_id = id, method = %method, "request sent"),
                Err(TransportError::Closed) => {
                    shared.reject(id, |method| BridgeError::ContextLost { method })
                }
                Err(TransportError::Codec(e)) => shared.reject(id, |_| BridgeError::Codec(e)),
            }
        }

        async move {
            let started = Instant::now();
            let settled = match timeout {
                Some(limit) => match tokio::time::timeout(limit, rx).await {
                    Ok(settled) => settled,
                    Err(_) => {
                        shared.pending.remove(&id);
                        // Best effort; the context may already be running it
                        let _ = sender.send(&Frame::Cancel { correlation_id: id });
                        warn!(correlation_id = id, method = %method, "call timed out");
                        return Err(BridgeError::Timeout {
                            method,
                            elapsed: started.elapsed(),
                        });
                    }
                },
                None => rx.await,
            };
            settled.unwrap_or(Err(BridgeError::ContextLost { method }))
        }
    }

    /// Calls sent but not yet answered
    pub fn pending_count(&self) -> usize {
        self.shared.pending.len()
    }

    /// True once the response channel has closed
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn send_frame(&self, frame: &Frame) -> Result<(), TransportError> {
        self.sender.send(frame)
    }
}

async fn route_responses(shared: Arc<Shared>, mut receiver: FrameReceiver) {
    while let Some(frame) = receiver.recv().await {
        match frame {
            Frame::Response(response) => shared.settle(response),
            other => warn!(?other, "unexpected frame from execution context"),
        }
    }
    shared.fail_all();
}
