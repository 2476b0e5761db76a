// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{EventSource, ExitClass, ManifestHints, RunnerDefinition, StdoutParser};
use crate::helpers::argv_names_program;
use crate::model::{Event, GroupStatus, Stream, TestCaseStatus};
use camino::Utf8Path;
use serde::Deserialize;
use std::time::Duration;

pub struct GoTestDefinition;

impl RunnerDefinition for GoTestDefinition {
    fn name(&self) -> &'static str {
        "go-test"
    }

    fn event_source(&self) -> EventSource {
        EventSource::NativeStream
    }

    fn matches_explicit(&self, argv: &[String]) -> bool {
        argv_names_program(argv, "go") && argv.iter().any(|a| a == "test")
    }

    fn matches_by_manifest(&self, _argv: &[String], _hints: &ManifestHints) -> bool {
        false
    }

    fn build_effective_command(
        &self,
        argv: &[String],
        _ipc_path: &Utf8Path,
        _staged_adapter: Option<&Utf8Path>,
    ) -> Vec<String> {
        if argv.iter().any(|a| a == "-json") {
            return argv.to_vec();
        }
        let mut out = argv.to_vec();
        out.push("-json".to_string());
        out
    }

    fn new_stdout_parser(&self) -> Box<dyn StdoutParser> {
        Box::new(GoTestStdoutParser)
    }

    fn interpret_exit_code(&self, code: i32) -> ExitClass {
        match code {
            0 => ExitClass::Success,
            1 => ExitClass::TestFailures,
            _ => ExitClass::SystemError,
        }
    }
}

/// Parses `go test -json` lines into internal events. Stateless: package
/// and subtest hierarchy is derived entirely from each line's own fields,
/// leaning on the Report Model's just-in-time parent creation rather than
/// tracking discovery locally.
struct GoTestStdoutParser;

#[derive(Deserialize)]
struct GoTestLine {
    #[serde(rename = "Action")]
    action: String,
    #[serde(rename = "Package", default)]
    package: Option<String>,
    #[serde(rename = "Test", default)]
    test: Option<String>,
    #[serde(rename = "Elapsed", default)]
    elapsed: Option<f64>,
    #[serde(rename = "Output", default)]
    output: Option<String>,
}

impl StdoutParser for GoTestStdoutParser {
    fn parse_line(&mut self, line: &str) -> Vec<Event> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        let Ok(parsed) = serde_json::from_str::<GoTestLine>(trimmed) else {
            // Non-JSON lines (build failures, `go vet` banners) aren't part
            // of this contract; the tee already preserves them verbatim in
            // `output.log`.
            return Vec::new();
        };
        let Some(package) = parsed.package else {
            return Vec::new();
        };

        match parsed.test {
            Some(test_name) => test_event(package, &test_name, &parsed.action, parsed.elapsed, parsed.output),
            None => package_event(package, &parsed.action, parsed.output),
        }
    }
}

fn test_event(
    package: String,
    test_name: &str,
    action: &str,
    elapsed: Option<f64>,
    output: Option<String>,
) -> Vec<Event> {
    let mut segments: Vec<String> = test_name.split('/').map(str::to_string).collect();
    let leaf = segments.pop().unwrap_or_default();
    let mut group_path = vec![package];
    group_path.extend(segments);

    match action {
        "pass" | "fail" | "skip" => {
            let status = match action {
                "pass" => TestCaseStatus::Pass,
                "fail" => TestCaseStatus::Fail,
                _ => TestCaseStatus::Skip,
            };
            vec![Event::TestCase {
                parent_names: group_path,
                test_name: leaf,
                status,
                duration: elapsed.map(|secs| Duration::from_secs_f64(secs.max(0.0))),
                error: None,
            }]
        }
        "output" => output
            .map(|chunk| {
                let group_name = group_path.pop().unwrap_or(leaf);
                Event::GroupOutput {
                    parent_names: group_path,
                    group_name,
                    stream: Stream::Stdout,
                    chunk,
                }
            })
            .into_iter()
            .collect(),
        _ => Vec::new(),
    }
}

fn package_event(package: String, action: &str, output: Option<String>) -> Vec<Event> {
    match action {
        "pass" | "fail" => {
            let status = if action == "pass" { GroupStatus::Pass } else { GroupStatus::Fail };
            vec![Event::GroupResult {
                parent_names: Vec::new(),
                group_name: package,
                status,
            }]
        }
        "output" => output
            .map(|chunk| Event::GroupOutput {
                parent_names: Vec::new(),
                group_name: package,
                stream: Stream::Stdout,
                chunk,
            })
            .into_iter()
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(parser: &mut GoTestStdoutParser, line: &str) -> Vec<Event> {
        parser.parse_line(line)
    }

    #[test]
    fn pass_result_for_a_top_level_test() {
        let mut parser = GoTestStdoutParser;
        let events = parse(
            &mut parser,
            r#"{"Action":"pass","Package":"example.com/mod","Test":"TestFoo","Elapsed":0.01}"#,
        );
        match &events[0] {
            Event::TestCase { parent_names, test_name, status, .. } => {
                assert_eq!(parent_names, &["example.com/mod".to_string()]);
                assert_eq!(test_name, "TestFoo");
                assert_eq!(*status, TestCaseStatus::Pass);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn subtest_nests_one_level_under_its_parent() {
        let mut parser = GoTestStdoutParser;
        let events = parse(
            &mut parser,
            r#"{"Action":"fail","Package":"example.com/mod","Test":"TestFoo/case1","Elapsed":0.2}"#,
        );
        match &events[0] {
            Event::TestCase { parent_names, test_name, .. } => {
                assert_eq!(parent_names, &["example.com/mod".to_string(), "TestFoo".to_string()]);
                assert_eq!(test_name, "case1");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn package_level_result_has_no_test_field() {
        let mut parser = GoTestStdoutParser;
        let events = parse(&mut parser, r#"{"Action":"fail","Package":"example.com/mod"}"#);
        match &events[0] {
            Event::GroupResult { group_name, status, .. } => {
                assert_eq!(group_name, "example.com/mod");
                assert_eq!(*status, GroupStatus::Fail);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn non_json_lines_are_skipped_not_errored() {
        let mut parser = GoTestStdoutParser;
        assert!(parse(&mut parser, "# example.com/mod [build failed]").is_empty());
    }

    #[test]
    fn json_flag_is_appended_once() {
        let def = GoTestDefinition;
        let argv: Vec<String> = vec!["go".into(), "test".into(), "./...".into()];
        let out = def.build_effective_command(&argv, Utf8Path::new("/run/ipc/events.jsonl"), None);
        assert_eq!(out, vec!["go", "test", "./...", "-json"]);
        let again = def.build_effective_command(&out, Utf8Path::new("/run/ipc/events.jsonl"), None);
        assert_eq!(again, out);
    }
}
