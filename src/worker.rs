// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Execution context thread
//!
//! Frames are handled strictly in arrival order. Before each request runs,
//! every frame already queued is pulled in so cancels for queued requests
//! take effect before those requests reach the kernel.

use crate::adapter::{FrameOutcome, KernelAdapter};
use crate::channel::ContextEnd;
use crate::error::BridgeError;
use crate::protocol::Frame;
use std::collections::VecDeque;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Run `adapter` on a dedicated named thread until the coordinator hangs
/// up or sends a shutdown frame.
pub fn spawn(
    name: &str,
    context: ContextEnd,
    adapter: KernelAdapter,
) -> Result<JoinHandle<()>, BridgeError> {
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || serve(context, adapter))
        .map_err(BridgeError::Spawn)
}

/// Serve frames on the calling thread
pub fn serve(context: ContextEnd, mut adapter: KernelAdapter) {
    info!("execution context started");
    let mut queue: VecDeque<Frame> = VecDeque::new();
    let mut hung_up = false;

    loop {
        if queue.is_empty() {
            if hung_up {
                break;
            }
            match context.recv() {
                Some(frame) => queue.push_back(frame),
                None => break,
            }
        }

        if !hung_up {
            loop {
                match context.try_recv() {
                    Ok(Some(frame)) => queue.push_back(frame),
                    Ok(None) => break,
                    Err(_) => {
                        hung_up = true;
                        break;
                    }
                }
            }
        }

        queue.retain(|frame| match frame {
            Frame::Cancel { correlation_id } => {
                adapter.cancel(*correlation_id);
                false
            }
            _ => true,
        });

        let Some(frame) = queue.pop_front() else {
            continue;
        };
        match adapter.handle_frame(frame) {
            FrameOutcome::Reply(reply) => {
                if context.send(&reply).is_err() {
                    debug!("coordinator stopped listening");
                    break;
                }
            }
            FrameOutcome::Silent => {}
            FrameOutcome::Shutdown => {
                if !queue.is_empty() {
                    warn!(dropped = queue.len(), "shutdown with frames still queued");
                }
                break;
            }
        }
    }

    let stats = adapter.stats();
    info!(
        run = stats.run,
        live_handles = stats.live_handles,
        "execution context stopped"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterOptions;
    use crate::api::methods;
    use crate::channel::duplex;
    use crate::error::FailureKind;
    use crate::protocol::{RequestEnvelope, ResponseEnvelope};
    use serde_json::json;

    fn request(id: u64, method: &str) -> Frame {
        Frame::Request(RequestEnvelope {
            correlation_id: id,
            method_name: method.to_string(),
            payload: json!(null),
        })
    }

    async fn next_response(receiver: &mut crate::channel::FrameReceiver) -> ResponseEnvelope {
        match receiver.recv().await {
            Some(Frame::Response(response)) => response,
            other => panic!("expected a response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_queued_cancel_skips_request() {
        let (coordinator, context) = duplex();
        let (sender, mut receiver) = coordinator.split();

        // Everything is queued before the worker starts
        sender.send(&request(1, methods::CACHE_STATS)).unwrap();
        sender.send(&request(2, methods::CACHE_STATS)).unwrap();
        sender.send(&Frame::Cancel { correlation_id: 2 }).unwrap();
        sender.send(&Frame::Shutdown).unwrap();

        let adapter = KernelAdapter::with_kernel(AdapterOptions::default()).unwrap();
        let worker = spawn("test-worker", context, adapter).unwrap();

        let first = next_response(&mut receiver).await;
        assert!(first.ok);
        let second = next_response(&mut receiver).await;
        assert_eq!(second.correlation_id, 2);
        assert_eq!(second.error_kind, Some(FailureKind::Cancelled));

        worker.join().unwrap();
        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_worker_exits_when_coordinator_hangs_up() {
        let (coordinator, context) = duplex();
        let (sender, mut receiver) = coordinator.split();
        sender.send(&request(1, methods::CACHE_STATS)).unwrap();
        drop(sender);

        let adapter = KernelAdapter::with_kernel(AdapterOptions::default()).unwrap();
        let worker = spawn("test-worker", context, adapter).unwrap();

        // Requests sent before the hang-up are still answered
        assert!(next_response(&mut receiver).await.ok);
        worker.join().unwrap();
    }
}
