// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The IPC wire format (spec.md §6 "IPC wire format"): one JSON object per
//! line, written by the adapter, decoded here into an internal [`Event`].

use crate::model::{ErrorPayload, Event, GroupStatus, Stream, TestCaseStatus};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(rename = "eventType")]
    event_type: String,
    payload: serde_json::Value,
}

#[derive(Debug, Deserialize, Default)]
struct WirePayload {
    #[serde(default, rename = "groupName")]
    group_name: Option<String>,
    #[serde(default, rename = "parentNames")]
    parent_names: Vec<String>,
    #[serde(default, rename = "testName")]
    test_name: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    error: Option<WireError>,
    #[serde(default)]
    chunk: Option<String>,
    #[serde(default, rename = "totalCount")]
    total_count: Option<u64>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    message: String,
    #[serde(default)]
    stack: Option<String>,
}

/// The outcome of decoding one line of the IPC file.
#[derive(Debug)]
pub enum DecodedLine {
    /// A well-formed event.
    Event(Event),
    /// A recognized but inert message (e.g. a stream event with no
    /// applicable field), or a payload the wire format says to ignore.
    Ignored,
    /// The line failed to decode. Carries a message suitable for a warning
    /// log; the caller must not abort on this (spec.md §4.2: "logs a
    /// warning with offset and continues; never aborts").
    Malformed(String),
}

/// Decodes a single complete line from the IPC file into an [`Event`].
///
/// Unknown event types are ignored with a warning (spec.md §6: "Unknown
/// event types are ignored with a warning. Extra payload fields are
/// ignored.").
pub fn decode_line(line: &str) -> DecodedLine {
    let line = line.trim();
    if line.is_empty() {
        return DecodedLine::Ignored;
    }

    let msg: WireMessage = match serde_json::from_str(line) {
        Ok(m) => m,
        Err(e) => return DecodedLine::Malformed(format!("invalid JSON: {e}")),
    };

    let payload: WirePayload = match serde_json::from_value(msg.payload) {
        Ok(p) => p,
        Err(e) => return DecodedLine::Malformed(format!("invalid payload: {e}")),
    };

    match msg.event_type.as_str() {
        "testGroupDiscovered" => with_group_name(payload, |parent_names, group_name| {
            Event::GroupDiscovered {
                parent_names,
                group_name,
            }
        }),
        "testGroupStart" => with_group_name(payload, |parent_names, group_name| {
            Event::GroupStart {
                parent_names,
                group_name,
            }
        }),
        "testGroupResult" => {
            let Some(status) = payload.status.as_deref().and_then(parse_group_status) else {
                return DecodedLine::Malformed(
                    "testGroupResult missing a recognized status".into(),
                );
            };
            with_group_name(payload, move |parent_names, group_name| Event::GroupResult {
                parent_names,
                group_name,
                status,
            })
        }
        "testCase" => {
            let Some(test_name) = payload.test_name.clone() else {
                return DecodedLine::Malformed("testCase missing testName".into());
            };
            let Some(status) = payload.status.as_deref().and_then(parse_test_case_status) else {
                return DecodedLine::Malformed("testCase missing a recognized status".into());
            };
            DecodedLine::Event(Event::TestCase {
                parent_names: payload.parent_names,
                test_name,
                status,
                duration: payload.duration.map(Duration::from_secs_f64_ms_safe),
                error: payload.error.map(|e| ErrorPayload {
                    message: e.message,
                    stack: e.stack,
                }),
            })
        }
        "groupStdout" => with_group_name_and_chunk(payload, Stream::Stdout),
        "groupStderr" => with_group_name_and_chunk(payload, Stream::Stderr),
        "testCollectionStart" => DecodedLine::Event(Event::CollectionStart),
        "testCollectionComplete" => DecodedLine::Event(Event::CollectionComplete {
            total_count: payload.total_count,
        }),
        other => DecodedLine::Malformed(format!("unknown eventType `{other}`, ignoring")),
    }
}

fn with_group_name(
    payload: WirePayload,
    build: impl FnOnce(Vec<String>, String) -> Event,
) -> DecodedLine {
    match payload.group_name {
        Some(name) => DecodedLine::Event(build(payload.parent_names, name)),
        None => DecodedLine::Malformed("event missing groupName".into()),
    }
}

fn with_group_name_and_chunk(payload: WirePayload, stream: Stream) -> DecodedLine {
    let (Some(group_name), Some(chunk)) = (payload.group_name.clone(), payload.chunk.clone())
    else {
        return DecodedLine::Malformed("output event missing groupName or chunk".into());
    };
    DecodedLine::Event(Event::GroupOutput {
        parent_names: payload.parent_names,
        group_name,
        stream,
        chunk,
    })
}

fn parse_group_status(s: &str) -> Option<GroupStatus> {
    match s {
        "PASS" => Some(GroupStatus::Pass),
        "FAIL" => Some(GroupStatus::Fail),
        "SKIP" => Some(GroupStatus::Skip),
        "ERROR" => Some(GroupStatus::Error),
        "NO_TESTS" => Some(GroupStatus::NoTests),
        _ => None,
    }
}

fn parse_test_case_status(s: &str) -> Option<TestCaseStatus> {
    match s {
        "PASS" => Some(TestCaseStatus::Pass),
        "FAIL" => Some(TestCaseStatus::Fail),
        "SKIP" => Some(TestCaseStatus::Skip),
        "TODO" => Some(TestCaseStatus::TodoTreatedAsSkip),
        _ => None,
    }
}

/// Small helper so the wire's millisecond `duration` field reads naturally
/// as a `Duration` without pulling in a whole units crate for one call
/// site.
trait DurationFromMillisF64 {
    fn from_secs_f64_ms_safe(ms: f64) -> Duration;
}

impl DurationFromMillisF64 for Duration {
    fn from_secs_f64_ms_safe(ms: f64) -> Duration {
        Duration::from_secs_f64((ms.max(0.0)) / 1000.0)
    }
}


impl std::fmt::Display for DecodedLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
