// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! JSON call scripts replayed against a session, one pass per run
//!
//! ```json
//! { "steps": [
//!     { "method": "shapes.solid.createCube", "payload": { "size": 10 }, "bind": "cube" },
//!     { "method": "shapes.solid.getSolidVolume", "payload": { "shape": "$cube" } }
//! ] }
//! ```
//!
//! A string `"$name"` anywhere in a payload is replaced by the result bound
//! to `name` earlier in the same pass.

use crate::error::BridgeError;
use crate::session::Session;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub method: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
}

#[derive(Debug)]
pub struct StepOutcome {
    pub method: String,
    pub elapsed: Duration,
    pub result: Result<Value, BridgeError>,
}

impl Script {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read script: {:?}", path.as_ref()))?;
        let script: Script = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse script: {:?}", path.as_ref()))?;
        Ok(script)
    }

    /// Run every step once. Steps are issued one after another; a failed
    /// step leaves its binding unset and the pass continues.
    pub async fn run_once(&self, session: &Session) -> Vec<StepOutcome> {
        let mut bindings: HashMap<String, Value> = HashMap::new();
        let mut outcomes = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            let payload = substitute(&step.payload, &bindings);
            let started = Instant::now();
            let result = session.call(&step.method, payload).await;
            if let (Some(name), Ok(value)) = (&step.bind, &result) {
                bindings.insert(name.clone(), value.clone());
            }
            outcomes.push(StepOutcome {
                method: step.method.clone(),
                elapsed: started.elapsed(),
                result,
            });
        }
        outcomes
    }
}

/// Replace `"$name"` strings with their bound values
pub fn substitute(value: &Value, bindings: &HashMap<String, Value>) -> Value {
    match value {
        Value::String(s) => s
            .strip_prefix('$')
            .and_then(|name| bindings.get(name))
            .cloned()
            .unwrap_or_else(|| value.clone()),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, bindings)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(v, bindings)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_substitute_nested() {
        let mut bindings = HashMap::new();
        bindings.insert("cube".to_string(), json!({ "hash": 1, "type": "TopoDSSolidPointer" }));

        let payload = json!({ "shapes": ["$cube", "$missing"], "size": 2 });
        let out = substitute(&payload, &bindings);
        assert_eq!(out["shapes"][0]["hash"], 1);
        assert_eq!(out["shapes"][1], "$missing");
        assert_eq!(out["size"], 2);
    }

    #[test]
    fn test_script_parses_without_optional_fields() {
        let script: Script =
            serde_json::from_str(r#"{"steps":[{"method":"runtime.cacheStats"}]}"#).unwrap();
        assert_eq!(script.steps.len(), 1);
        assert!(script.steps[0].payload.is_null());
        assert!(script.steps[0].bind.is_none());
    }
}
