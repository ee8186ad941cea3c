// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for both sides of the bridge

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Failure category carried on the wire next to the error message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    StaleHandle,
    Kernel,
    UnknownMethod,
    InvalidPayload,
    Cancelled,
    Panicked,
}

/// Errors raised inside the execution context.
///
/// None of these ever cross the channel as anything but a failure
/// response envelope.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("handle {hash} ({kind}) is not in the handle table")]
    StaleHandle { hash: u64, kind: String },

    #[error("no kernel operation registered for '{0}'")]
    UnknownMethod(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("expected a {expected} shape, got {actual}")]
    WrongShapeKind {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{0}")]
    Operation(String),

    #[error("request {0} was cancelled before it ran")]
    Cancelled(u64),

    #[error("kernel operation panicked: {0}")]
    Panicked(String),
}

impl KernelError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::StaleHandle { .. } => FailureKind::StaleHandle,
            Self::UnknownMethod(_) => FailureKind::UnknownMethod,
            Self::InvalidPayload(_) => FailureKind::InvalidPayload,
            Self::InvalidInput(_) | Self::WrongShapeKind { .. } | Self::Operation(_) => {
                FailureKind::Kernel
            }
            Self::Cancelled(_) => FailureKind::Cancelled,
            Self::Panicked(_) => FailureKind::Panicked,
        }
    }
}

impl From<serde_json::Error> for KernelError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidPayload(err.to_string())
    }
}

/// Errors observed by the coordinator
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("{method}: stale handle: {message}")]
    StaleHandle { method: String, message: String },

    #[error("{method}: kernel operation failed: {message}")]
    Kernel { method: String, message: String },

    #[error("{method}: {message}")]
    Rejected {
        method: String,
        kind: FailureKind,
        message: String,
    },

    #[error("execution context lost while awaiting {method}")]
    ContextLost { method: String },

    #[error("{method} timed out after {elapsed:?}")]
    Timeout { method: String, elapsed: Duration },

    #[error("frame codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("failed to start execution context: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("method table is missing handlers for {0:?}")]
    MissingHandlers(Vec<String>),
}

impl BridgeError {
    /// Build the coordinator-side error for a failed response
    pub fn from_failure(method: &str, kind: FailureKind, message: String) -> Self {
        let method = method.to_string();
        match kind {
            FailureKind::StaleHandle => Self::StaleHandle { method, message },
            FailureKind::Kernel => Self::Kernel { method, message },
            kind => Self::Rejected {
                method,
                kind,
                message,
            },
        }
    }

    pub fn is_stale_handle(&self) -> bool {
        matches!(self, Self::StaleHandle { .. })
    }

    pub fn is_context_lost(&self) -> bool {
        matches!(self, Self::ContextLost { .. })
    }

    /// Method the failing call was addressed to, when there was one
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::StaleHandle { method, .. }
            | Self::Kernel { method, .. }
            | Self::Rejected { method, .. }
            | Self::ContextLost { method }
            | Self::Timeout { method, .. } => Some(method),
            _ => None,
        }
    }
}
