// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! In-process transport between coordinator and execution context
//!
//! The contract is small: send a frame, receive a frame, notice when the
//! other side is gone. Frames cross as JSON text so handles round-trip
//! through real serialization, the same as they would over a worker or
//! process boundary.
//!
//! The execution context blocks on a `crossbeam` receiver (it owns a plain
//! thread); the coordinator reads responses from a `tokio` channel.

use crate::protocol::Frame;
use crossbeam::channel as cb;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("channel closed")]
    Closed,
    #[error("frame codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Create both ends of a fresh channel
pub fn duplex() -> (CoordinatorEnd, ContextEnd) {
    let (to_context, from_coordinator) = cb::unbounded();
    let (to_coordinator, from_context) = mpsc::unbounded_channel();
    (
        CoordinatorEnd {
            sender: FrameSender { tx: to_context },
            receiver: FrameReceiver { rx: from_context },
        },
        ContextEnd {
            rx: from_coordinator,
            tx: to_coordinator,
        },
    )
}

/// Coordinator side of the channel
pub struct CoordinatorEnd {
    sender: FrameSender,
    receiver: FrameReceiver,
}

impl CoordinatorEnd {
    pub fn split(self) -> (FrameSender, FrameReceiver) {
        (self.sender, self.receiver)
    }
}

/// Cloneable outbound half held by the coordinator
#[derive(Clone)]
pub struct FrameSender {
    tx: cb::Sender<String>,
}

impl FrameSender {
    pub fn send(&self, frame: &Frame) -> Result<(), TransportError> {
        let text = frame.encode()?;
        self.tx.send(text).map_err(|_| TransportError::Closed)
    }
}

/// Inbound half held by the coordinator's response router
pub struct FrameReceiver {
    rx: mpsc::UnboundedReceiver<String>,
}

impl FrameReceiver {
    /// Next decodable frame, or `None` once the execution context is gone
    pub async fn recv(&mut self) -> Option<Frame> {
        loop {
            let text = self.rx.recv().await?;
            match Frame::decode(&text) {
                Ok(frame) => return Some(frame),
                Err(e) => warn!("dropping undecodable frame from execution context: {e}"),
            }
        }
    }
}

/// Execution context side of the channel
pub struct ContextEnd {
    rx: cb::Receiver<String>,
    tx: mpsc::UnboundedSender<String>,
}

impl ContextEnd {
    /// Block until the next frame; `None` once the coordinator hung up
    pub fn recv(&self) -> Option<Frame> {
        loop {
            let text = self.rx.recv().ok()?;
            match Frame::decode(&text) {
                Ok(frame) => return Some(frame),
                Err(e) => warn!("dropping undecodable frame from coordinator: {e}"),
            }
        }
    }

    /// Next frame if one is already queued
    pub fn try_recv(&self) -> Result<Option<Frame>, TransportError> {
        loop {
            match self.rx.try_recv() {
                Ok(text) => match Frame::decode(&text) {
                    Ok(frame) => return Ok(Some(frame)),
                    Err(e) => warn!("dropping undecodable frame from coordinator: {e}"),
                },
                Err(cb::TryRecvError::Empty) => return Ok(None),
                Err(cb::TryRecvError::Disconnected) => return Err(TransportError::Closed),
            }
        }
    }

    pub fn send(&self, frame: &Frame) -> Result<(), TransportError> {
        let text = frame.encode()?;
        self.tx.send(text).map_err(|_| TransportError::Closed)
    }
}
