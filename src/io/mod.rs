// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Shape serializers
//!
//! These produce in-memory payloads; writing them anywhere is the caller's
//! business.

mod step;
mod stl;

pub use step::to_step;
pub use stl::to_binary_stl;
