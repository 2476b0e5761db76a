// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{EventSource, ExitClass, ManifestHints, RunnerDefinition, StdoutParser};
use crate::helpers::argv_names_program;
use crate::model::{Event, TestCaseStatus};
use camino::Utf8Path;
use serde::Deserialize;
use std::time::Duration;

pub struct CargoNextestDefinition;

impl RunnerDefinition for CargoNextestDefinition {
    fn name(&self) -> &'static str {
        "cargo-nextest"
    }

    fn event_source(&self) -> EventSource {
        // Per spec.md §4.1: "native JSON plus supplementary derivation" —
        // the binary-id on every line is itself enough to build correct
        // groups, but the grouping boundary (crate vs. binary) is a
        // derivation this definition makes on top of the raw stream, not
        // something libtest-json hands us directly.
        EventSource::Hybrid
    }

    fn matches_explicit(&self, argv: &[String]) -> bool {
        argv_names_program(argv, "cargo") && argv.iter().any(|a| a == "nextest")
    }

    fn matches_by_manifest(&self, _argv: &[String], hints: &ManifestHints) -> bool {
        hints.has_nextest_config
    }

    fn build_effective_command(
        &self,
        argv: &[String],
        _ipc_path: &Utf8Path,
        _staged_adapter: Option<&Utf8Path>,
    ) -> Vec<String> {
        if argv.iter().any(|a| a == "--message-format=libtest-json-plus") {
            return argv.to_vec();
        }
        let mut out = argv.to_vec();
        out.push("--message-format=libtest-json-plus".to_string());
        out.push("-Z".to_string());
        out.push("unstable-options".to_string());
        out
    }

    fn new_stdout_parser(&self) -> Box<dyn StdoutParser> {
        Box::new(NextestStdoutParser)
    }

    fn interpret_exit_code(&self, code: i32) -> ExitClass {
        match code {
            0 => ExitClass::Success,
            100 => ExitClass::TestFailures,
            _ => ExitClass::SystemError,
        }
    }
}

/// Parses nextest's `libtest-json-plus` stream. Every line carries a
/// `binary_id` of the form `<crate>::<binary>`, which is used directly as
/// the group identity — this is what keeps two crates' identically-named
/// integration test binaries (spec.md §8 scenario 3) from colliding: the
/// binary-id differs even when the file name doesn't.
struct NextestStdoutParser;

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum NextestLine {
    Test {
        event: String,
        name: String,
        binary_id: String,
        #[serde(default)]
        exec_time: Option<f64>,
        #[serde(default)]
        stdout: Option<String>,
    },
    #[serde(other)]
    Other,
}

impl StdoutParser for NextestStdoutParser {
    fn parse_line(&mut self, line: &str) -> Vec<Event> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        let Ok(NextestLine::Test { event, name, binary_id, exec_time, stdout }) =
            serde_json::from_str::<NextestLine>(trimmed)
        else {
            return Vec::new();
        };

        let status = match event.as_str() {
            "ok" => TestCaseStatus::Pass,
            "failed" => TestCaseStatus::Fail,
            "ignored" => TestCaseStatus::Skip,
            _ => return Vec::new(),
        };

        let error = if status == TestCaseStatus::Fail {
            stdout.map(|text| crate::model::ErrorPayload {
                message: text.lines().next().unwrap_or_default().to_string(),
                stack: Some(text),
            })
        } else {
            None
        };

        vec![Event::TestCase {
            parent_names: vec![binary_id],
            test_name: name,
            status,
            duration: exec_time.map(Duration::from_secs_f64),
            error,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_id_disambiguates_identically_named_test_files_across_crates() {
        let mut parser = NextestStdoutParser;
        let a = parser.parse_line(
            r#"{"type":"test","event":"ok","name":"it_connects","binary_id":"crateA::test_client"}"#,
        );
        let b = parser.parse_line(
            r#"{"type":"test","event":"ok","name":"it_connects","binary_id":"crateB::test_client"}"#,
        );
        let Event::TestCase { parent_names: pa, .. } = &a[0] else { panic!() };
        let Event::TestCase { parent_names: pb, .. } = &b[0] else { panic!() };
        assert_ne!(pa, pb);
    }

    #[test]
    fn message_format_flag_appended_once() {
        let def = CargoNextestDefinition;
        let argv: Vec<String> = vec!["cargo".into(), "nextest".into(), "run".into()];
        let out = def.build_effective_command(&argv, Utf8Path::new("/run/ipc/events.jsonl"), None);
        assert!(out.iter().any(|a| a == "--message-format=libtest-json-plus"));
        let again = def.build_effective_command(&out, Utf8Path::new("/run/ipc/events.jsonl"), None);
        assert_eq!(again, out);
    }
}
