// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! FFI bindings for running the execution context inside a WASM worker

#[cfg(feature = "wasm")]
pub mod wasm;
