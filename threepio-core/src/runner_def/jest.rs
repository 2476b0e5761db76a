// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{EventSource, ExitClass, ManifestHints, RunnerDefinition};
use crate::adapter::AdapterKind;
use crate::helpers::{argv_names_program, js_insertion_point};
use camino::Utf8Path;

pub struct JestDefinition;

impl RunnerDefinition for JestDefinition {
    fn name(&self) -> &'static str {
        "jest"
    }

    fn event_source(&self) -> EventSource {
        EventSource::Ipc
    }

    fn matches_explicit(&self, argv: &[String]) -> bool {
        argv_names_program(argv, "jest")
    }

    fn matches_by_manifest(&self, _argv: &[String], hints: &ManifestHints) -> bool {
        hints
            .package_json_test_script
            .as_deref()
            .is_some_and(|script| script.contains("jest"))
    }

    fn adapter_kind(&self) -> Option<AdapterKind> {
        Some(AdapterKind::Jest)
    }

    fn build_effective_command(
        &self,
        argv: &[String],
        _ipc_path: &Utf8Path,
        staged_adapter: Option<&Utf8Path>,
    ) -> Vec<String> {
        let adapter = staged_adapter.expect("jest is an IPC runner");
        if argv.iter().any(|a| a.contains(adapter.as_str())) {
            return argv.to_vec();
        }

        let mut out = argv.to_vec();
        let (idx, needs_dd) = js_insertion_point(argv);
        let mut insertion = Vec::new();
        if needs_dd {
            insertion.push("--".to_string());
        }
        // Jest's `--reporters` flag replaces the default reporter list when
        // given at all, so the default must be named alongside ours to
        // keep the human-readable stream intact.
        insertion.push("--reporters=default".to_string());
        insertion.push(format!("--reporters={adapter}"));
        out.splice(idx..idx, insertion);
        out
    }

    fn interpret_exit_code(&self, code: i32) -> ExitClass {
        match code {
            0 => ExitClass::Success,
            1 => ExitClass::TestFailures,
            _ => ExitClass::SystemError,
        }
    }
}
