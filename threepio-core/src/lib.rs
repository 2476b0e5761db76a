// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The run-orchestration engine behind `3pio`.
//!
//! This crate owns everything described as "the core" in the design
//! document: runner detection and command rewriting, the IPC tail, adapter
//! staging, the in-memory report model, the filesystem renderer, and the
//! orchestrator that wires all of it to a spawned child process.
//!
//! Everything outside of that — argument parsing, help text, version
//! reporting, packaging — lives in the `threepio-cli` binary crate.

pub mod adapter;
pub mod errors;
pub mod helpers;
pub mod ids;
pub mod ipc;
pub mod model;
pub mod orchestrator;
pub mod renderer;
pub mod runner_def;
pub mod sanitize;
pub mod signal;

pub use errors::ThreepioError;
pub use orchestrator::{Orchestrator, OrchestratorOutcome};
