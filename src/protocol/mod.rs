// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Wire envelopes exchanged between coordinator and execution context
//!
//! Frames are JSON text. Payloads are opaque to the protocol apart from the
//! handles embedded in them.

use crate::error::{FailureKind, KernelError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A call addressed to a named kernel operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    pub correlation_id: u64,
    pub method_name: String,
    #[serde(default)]
    pub payload: Value,
}

/// Exactly one of these answers every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub correlation_id: u64,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FailureKind>,
}

impl ResponseEnvelope {
    pub fn success(correlation_id: u64, result: Value) -> Self {
        Self {
            correlation_id,
            ok: true,
            result: Some(result),
            error_message: None,
            error_kind: None,
        }
    }

    pub fn failure(correlation_id: u64, err: &KernelError) -> Self {
        Self {
            correlation_id,
            ok: false,
            result: None,
            error_message: Some(err.to_string()),
            error_kind: Some(err.failure_kind()),
        }
    }
}

/// Everything that travels over the channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "frame", rename_all = "camelCase")]
pub enum Frame {
    Request(RequestEnvelope),
    Response(ResponseEnvelope),
    /// Best-effort request to skip a call that has not started yet
    Cancel {
        #[serde(rename = "correlationId")]
        correlation_id: u64,
    },
    Shutdown,
}

impl Frame {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let frame = Frame::Request(RequestEnvelope {
            correlation_id: 3,
            method_name: "shapes.solid.createBox".into(),
            payload: json!({ "width": 10.0 }),
        });

        let value: Value = serde_json::from_str(&frame.encode().unwrap()).unwrap();
        assert_eq!(value["frame"], "request");
        assert_eq!(value["correlationId"], 3);
        assert_eq!(value["methodName"], "shapes.solid.createBox");
        assert_eq!(value["payload"]["width"], 10.0);
    }

    #[test]
    fn test_failure_response_carries_kind() {
        let err = KernelError::StaleHandle {
            hash: 9,
            kind: "TopoDSSolidPointer".into(),
        };
        let frame = Frame::Response(ResponseEnvelope::failure(4, &err));
        let decoded = Frame::decode(&frame.encode().unwrap()).unwrap();

        match decoded {
            Frame::Response(resp) => {
                assert!(!resp.ok);
                assert!(resp.result.is_none());
                assert_eq!(resp.error_kind, Some(FailureKind::StaleHandle));
                assert!(resp.error_message.unwrap().contains("9"));
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn test_cancel_and_shutdown_frames() {
        let cancel = Frame::Cancel { correlation_id: 12 };
        assert_eq!(
            cancel.encode().unwrap(),
            r#"{"frame":"cancel","correlationId":12}"#
        );
        assert_eq!(Frame::decode(r#"{"frame":"shutdown"}"#).unwrap(), Frame::Shutdown);
    }
}
