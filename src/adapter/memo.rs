// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Call memoization keyed on method name and canonical payload
//!
//! A remembered result is only replayed while every handle inside it is
//! still live. Replaying stamps those handles with the current run, so a
//! memo hit keeps its results alive exactly like a fresh call would.

use crate::handle::{collect_handles, HandleTable};
use ahash::AHashMap;
use serde_json::Value;
use sha2::{Digest, Sha256};

pub type MemoKey = [u8; 32];

/// Methods whose results depend on more than their payload
const UNMEMOIZED_NAMESPACES: &[&str] = &["runtime.", "io."];

#[derive(Debug)]
struct MemoEntry {
    result: Value,
    handles: Vec<u64>,
    last_seen_run: u64,
}

#[derive(Debug, Default)]
pub struct CallMemo {
    entries: AHashMap<MemoKey, MemoEntry>,
    hits: u64,
}

impl CallMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_memoizable(method: &str) -> bool {
        !UNMEMOIZED_NAMESPACES
            .iter()
            .any(|prefix| method.starts_with(prefix))
    }

    /// Object keys serialize in sorted order, so equal payloads hash equal
    pub fn key(method: &str, payload: &Value) -> MemoKey {
        let mut hasher = Sha256::new();
        hasher.update(method.as_bytes());
        hasher.update([0u8]);
        hasher.update(payload.to_string().as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&hasher.finalize());
        key
    }

    /// Replay a remembered result if all of its handles are still live
    pub fn lookup<T>(&mut self, key: &MemoKey, table: &mut HandleTable<T>, run: u64) -> Option<Value> {
        let entry = self.entries.get_mut(key)?;
        if !entry.handles.iter().all(|hash| table.contains(*hash)) {
            self.entries.remove(key);
            return None;
        }
        for hash in &entry.handles {
            table.touch(*hash, run);
        }
        entry.last_seen_run = entry.last_seen_run.max(run);
        self.hits += 1;
        Some(entry.result.clone())
    }

    pub fn insert(&mut self, key: MemoKey, result: Value, run: u64) {
        let handles = collect_handles(&result).into_iter().map(|h| h.hash).collect();
        self.entries.insert(
            key,
            MemoEntry {
                result,
                handles,
                last_seen_run: run,
            },
        );
    }

    /// Forget results last used before `run`
    pub fn sweep(&mut self, run: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.last_seen_run >= run);
        before - self.entries.len()
    }

    pub fn clear(&mut self) -> usize {
        let freed = self.entries.len();
        self.entries.clear();
        freed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }
}
