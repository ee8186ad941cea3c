// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bridge configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "bridge.toml";

/// Bridge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Per-call timeout in milliseconds; `None` waits forever
    pub call_timeout_ms: Option<u64>,
    /// Replay results of repeated identical calls
    pub memoize_calls: bool,
    /// Name of the execution context thread
    pub worker_thread_name: String,
    /// `tracing` filter directive used by the CLI
    pub log_filter: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: Some(30_000),
            memoize_calls: true,
            worker_thread_name: "kernel-worker".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: BridgeConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `bridge.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(DEFAULT_CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `POLYFRAME_BRIDGE_*` overrides from `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(timeout) = lookup("POLYFRAME_BRIDGE_TIMEOUT_MS") {
            match timeout.trim().parse::<u64>() {
                Ok(0) => self.call_timeout_ms = None,
                Ok(ms) => self.call_timeout_ms = Some(ms),
                Err(_) => tracing::warn!("ignoring invalid POLYFRAME_BRIDGE_TIMEOUT_MS={timeout:?}"),
            }
        }

        if let Some(memoize) = lookup("POLYFRAME_BRIDGE_MEMOIZE") {
            self.memoize_calls = memoize.trim().parse().unwrap_or(self.memoize_calls);
        }

        if let Some(filter) = lookup("POLYFRAME_BRIDGE_LOG") {
            self.log_filter = filter;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Effective per-call timeout; `0` disables it like `None`
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }

    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout_ms = timeout.map(|t| t.as_millis() as u64);
        self
    }

    pub fn with_memoize_calls(mut self, memoize: bool) -> Self {
        self.memoize_calls = memoize;
        self
    }
}
