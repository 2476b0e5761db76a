// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The top-level `Run` entity (spec.md §3).

use super::group::{CreationReason, Group};
use super::status::RunStatus;
use crate::ids::RunId;
use chrono::{DateTime, Utc};

/// The single top-level entity for one invocation of the tool.
#[derive(Clone, Debug)]
pub struct Run {
    pub id: RunId,
    pub original_command: Vec<String>,
    pub effective_command: Vec<String>,
    pub runner_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub child_exit_code: Option<i32>,
    /// The implicit, unnamed root under which every discovered group is
    /// attached.
    pub root: Group,
    pub collection_started: bool,
    pub collection_total: Option<u64>,
    pub fatal_message: Option<String>,
    /// Run-level anomalies: malformed IPC lines, unparseable stdout lines,
    /// and similar "event stream anomaly" conditions from spec.md §7.
    pub warnings: Vec<String>,
}

impl Run {
    pub fn new(
        id: RunId,
        original_command: Vec<String>,
        effective_command: Vec<String>,
        runner_name: String,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            original_command,
            effective_command,
            runner_name,
            start_time,
            end_time: None,
            status: RunStatus::Running,
            child_exit_code: None,
            root: Group::new("", CreationReason::Discovered),
            collection_started: false,
            collection_total: None,
            fatal_message: None,
            warnings: Vec::new(),
        }
    }
}
