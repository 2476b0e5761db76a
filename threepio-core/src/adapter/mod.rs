// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded, framework-specific adapters and their staging into a run's
//! directory (spec.md §4.3).

mod sources;
mod stage;

pub use sources::{AdapterKind, SentinelStyle};
pub use stage::stage_adapter;
