// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! WASM bindings using wasm-bindgen
//!
//! The host's worker glue feeds every incoming message to
//! [`KernelWorker::handle_frame`] and posts back whatever it returns.

use crate::adapter::{AdapterOptions, KernelAdapter};
use wasm_bindgen::prelude::*;

/// Execution context living inside a WASM worker
#[wasm_bindgen]
pub struct KernelWorker {
    adapter: KernelAdapter,
}

#[wasm_bindgen]
impl KernelWorker {
    #[wasm_bindgen(constructor)]
    pub fn new(memoize_calls: bool) -> Result<KernelWorker, JsValue> {
        let adapter = KernelAdapter::with_kernel(AdapterOptions { memoize_calls })
            .map_err(|e| JsValue::from_str(&format!("Kernel setup error: {}", e)))?;
        Ok(Self { adapter })
    }

    /// Handle one JSON frame; returns the reply frame, if any
    #[wasm_bindgen(js_name = handleFrame)]
    pub fn handle_frame(&mut self, frame: &str) -> Option<String> {
        self.adapter.handle_text(frame)
    }

    #[wasm_bindgen(js_name = liveHandles)]
    pub fn live_handles(&self) -> usize {
        self.adapter.table().len()
    }

    pub fn run(&self) -> u64 {
        self.adapter.run()
    }
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    const CREATE_CUBE: &str =
        r#"{"frame":"request","correlationId":1,"methodName":"shapes.solid.createCube","payload":{"size":2.0}}"#;

    #[wasm_bindgen_test]
    fn test_request_frames_run_inside_wasm() {
        let mut worker = KernelWorker::new(true).unwrap();
        let reply = worker.handle_frame(CREATE_CUBE).unwrap();
        assert!(reply.contains(r#""ok":true"#));

        let stats = worker
            .handle_frame(r#"{"frame":"request","correlationId":2,"methodName":"runtime.beginNewRun","payload":{}}"#)
            .unwrap();
        assert!(stats.contains(r#""run":1"#));
        assert_eq!(worker.run(), 1);
        assert_eq!(worker.live_handles(), 1);
    }
}
