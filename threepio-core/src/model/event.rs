// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The internal `Event` type that both the IPC decoder and the native
//! stdout parsers normalize into (spec.md §3 "Event (internal)").

use super::status::TestCaseStatus;
use std::time::Duration;

/// An error payload attached to a failed test case or a collection failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorPayload {
    pub message: String,
    pub stack: Option<String>,
}

/// Which output stream a chunk of captured output came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// A discriminated event, applied serially to the [`Model`](super::Model)
/// by the event applier (spec.md §5, task T5). Both the adapter's IPC
/// stream and the native stdout parsers normalize to this type.
#[derive(Clone, Debug)]
pub enum Event {
    /// A group was discovered (but has not necessarily started running
    /// yet). Idempotent: re-discovery of the same identity is a no-op
    /// beyond the first.
    GroupDiscovered {
        parent_names: Vec<String>,
        group_name: String,
    },

    /// A group transitioned to RUNNING.
    GroupStart {
        parent_names: Vec<String>,
        group_name: String,
    },

    /// A group reached a terminal result.
    GroupResult {
        parent_names: Vec<String>,
        group_name: String,
        status: super::status::GroupStatus,
    },

    /// A leaf test case result.
    TestCase {
        parent_names: Vec<String>,
        test_name: String,
        status: TestCaseStatus,
        duration: Option<Duration>,
        error: Option<ErrorPayload>,
    },

    /// Output attributed to a specific group.
    GroupOutput {
        parent_names: Vec<String>,
        group_name: String,
        stream: Stream,
        chunk: String,
    },

    /// Output with no group attribution (goes to the run's raw sink only).
    RunnerOutputChunk { stream: Stream, chunk: String },

    /// The runner began collecting/discovering tests.
    CollectionStart,

    /// The runner finished collecting tests, optionally reporting a total
    /// count up front (used to detect an empty suite early).
    CollectionComplete { total_count: Option<u64> },

    /// A fatal, run-level failure (e.g. the framework refused to run at
    /// all). Does not itself end the run — the orchestrator still waits
    /// for child exit — but marks the run ERRORED.
    Fatal { message: String },
}

impl Event {
    /// The full `parentNames ++ [groupName]` path this event addresses, if
    /// it addresses a group at all.
    pub fn group_path(&self) -> Option<Vec<String>> {
        match self {
            Event::GroupDiscovered {
                parent_names,
                group_name,
            }
            | Event::GroupStart {
                parent_names,
                group_name,
            }
            | Event::GroupResult {
                parent_names,
                group_name,
                ..
            }
            | Event::GroupOutput {
                parent_names,
                group_name,
                ..
            } => {
                let mut path = parent_names.clone();
                path.push(group_name.clone());
                Some(path)
            }
            Event::TestCase { parent_names, .. } => Some(parent_names.clone()),
            _ => None,
        }
    }
}
