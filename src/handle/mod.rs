// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Opaque handles to kernel-resident entities
//!
//! A [`Handle`] is what crosses the channel in place of a geometric model.
//! Its JSON shape is `{"hash": <number>, "type": <string>}` and nothing else.

mod table;

pub use table::{Entry, Fingerprint, HandleTable, Registration};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Reference to a live entry in the execution context's handle table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle {
    pub hash: u64,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Handle {
    pub fn new(hash: u64, kind: impl Into<String>) -> Self {
        Self {
            hash,
            kind: kind.into(),
        }
    }

    /// Recognise a handle inside an arbitrary payload value.
    ///
    /// Only objects with exactly the two handle keys qualify, so DTOs that
    /// happen to carry a `hash` field are left alone.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        if map.len() != 2 {
            return None;
        }
        let hash = map.get("hash")?.as_u64()?;
        let kind = map.get("type")?.as_str()?;
        Some(Self::new(hash, kind))
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({ "hash": self.hash, "type": self.kind })
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.hash)
    }
}

/// Collect every handle embedded anywhere in `value`, depth first
pub fn collect_handles(value: &Value) -> Vec<Handle> {
    let mut found = Vec::new();
    collect_into(value, &mut found);
    found
}

fn collect_into(value: &Value, found: &mut Vec<Handle>) {
    if let Some(handle) = Handle::from_value(value) {
        found.push(handle);
        return;
    }
    match value {
        Value::Array(items) => {
            for item in items {
                collect_into(item, found);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_into(item, found);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_handle_json_shape() {
        let handle = Handle::new(42, "TopoDSSolidPointer");
        let text = serde_json::to_string(&handle).unwrap();
        assert_eq!(text, r#"{"hash":42,"type":"TopoDSSolidPointer"}"#);

        let back: Handle = serde_json::from_str(&text).unwrap();
        assert_eq!(back, handle);
    }

    #[test]
    fn test_collect_nested_handles() {
        let payload = json!({
            "shapes": [
                { "hash": 1, "type": "TopoDSSolidPointer" },
                { "hash": 2, "type": "TopoDSSolidPointer" }
            ],
            "options": { "tool": { "hash": 3, "type": "TopoDSWirePointer" }, "tolerance": 0.1 },
            "center": [0, 0, 0]
        });

        let mut hashes: Vec<u64> = collect_handles(&payload).iter().map(|h| h.hash).collect();
        hashes.sort_unstable();
        assert_eq!(hashes, vec![1, 2, 3]);
    }

    #[test]
    fn test_objects_with_extra_keys_are_not_handles() {
        let value = json!({ "hash": 1, "type": "TopoDSSolidPointer", "name": "box" });
        assert!(Handle::from_value(&value).is_none());

        let value = json!({ "hash": "abc", "type": "TopoDSSolidPointer" });
        assert!(Handle::from_value(&value).is_none());
    }
}
