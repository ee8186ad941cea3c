// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Static routing table from `"namespace.method"` to kernel operation

use super::CallContext;
use crate::error::{BridgeError, KernelError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Type-erased kernel operation
pub type Handler =
    Box<dyn Fn(&mut CallContext<'_>, Value) -> Result<Value, KernelError> + Send + Sync>;

/// Method table consulted by the adapter for every request
#[derive(Default)]
pub struct MethodRegistry {
    handlers: BTreeMap<&'static str, Handler>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed operation. The payload is decoded into `I` and the
    /// operation's output encoded back into a payload value.
    pub fn register<I, O, F>(&mut self, name: &'static str, op: F) -> &mut Self
    where
        I: DeserializeOwned,
        O: Serialize,
        F: Fn(&mut CallContext<'_>, I) -> Result<O, KernelError> + Send + Sync + 'static,
    {
        let handler: Handler = Box::new(move |ctx: &mut CallContext<'_>, payload: Value| {
            let input: I = serde_json::from_value(payload)
                .map_err(|e| KernelError::InvalidPayload(format!("{name}: {e}")))?;
            let output = op(ctx, input)?;
            serde_json::to_value(output)
                .map_err(|e| KernelError::Operation(format!("{name}: failed to encode result: {e}")))
        });
        self.handlers.insert(name, handler);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered method names in sorted order
    pub fn methods(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Fail if any declared method has no handler
    pub fn ensure_complete(&self, declared: &[&str]) -> Result<(), BridgeError> {
        let missing: Vec<String> = declared
            .iter()
            .filter(|name| !self.contains(name))
            .map(|name| name.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(BridgeError::MissingHandlers(missing))
        }
    }
}
