// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `TestCase` leaf entity (spec.md §3).

use super::event::ErrorPayload;
use super::status::TestCaseStatus;
use std::time::Duration;

/// A single leaf test result, immutable once created except for the
/// deliberate "later wins" override on re-emission.
#[derive(Clone, Debug)]
pub struct TestCase {
    pub name: String,
    pub status: TestCaseStatus,
    pub duration: Option<Duration>,
    pub error: Option<ErrorPayload>,
}

impl TestCase {
    pub fn new(
        name: String,
        status: TestCaseStatus,
        duration: Option<Duration>,
        error: Option<ErrorPayload>,
    ) -> Self {
        Self {
            name,
            status,
            duration,
            error,
        }
    }
}
