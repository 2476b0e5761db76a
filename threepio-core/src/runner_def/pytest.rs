// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{EventSource, ExitClass, ManifestHints, RunnerDefinition};
use crate::adapter::AdapterKind;
use crate::helpers::argv_names_program;
use camino::Utf8Path;

pub struct PytestDefinition;

impl RunnerDefinition for PytestDefinition {
    fn name(&self) -> &'static str {
        "pytest"
    }

    fn event_source(&self) -> EventSource {
        EventSource::Ipc
    }

    fn matches_explicit(&self, argv: &[String]) -> bool {
        argv_names_program(argv, "pytest")
    }

    fn matches_by_manifest(&self, _argv: &[String], hints: &ManifestHints) -> bool {
        hints.has_pytest_ini || hints.has_pyproject_toml
    }

    fn adapter_kind(&self) -> Option<AdapterKind> {
        Some(AdapterKind::Pytest)
    }

    fn build_effective_command(
        &self,
        argv: &[String],
        _ipc_path: &Utf8Path,
        staged_adapter: Option<&Utf8Path>,
    ) -> Vec<String> {
        let adapter = staged_adapter.expect("pytest is an IPC runner");
        // pytest's `-p <path>` plugin loader wants a path without the
        // trailing `.py` suffix.
        let plugin_ref = adapter.as_str().strip_suffix(".py").unwrap_or(adapter.as_str());

        if argv.iter().any(|a| a == plugin_ref) {
            return argv.to_vec();
        }

        let mut out = argv.to_vec();
        out.push("-p".to_string());
        out.push(plugin_ref.to_string());
        out
    }

    fn interpret_exit_code(&self, code: i32) -> ExitClass {
        // pytest: 0 all passed, 1 some failed, 2 interrupted by user,
        // 3 internal error, 4 usage error, 5 no tests collected.
        match code {
            0 => ExitClass::Success,
            1 => ExitClass::TestFailures,
            _ => ExitClass::SystemError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn appends_plugin_flag_without_py_suffix() {
        let def = PytestDefinition;
        let adapter = Utf8Path::new("/run/adapters/pytest_plugin.py");
        let argv = strs(&["pytest", "-q"]);
        let out = def.build_effective_command(&argv, Utf8Path::new("/run/ipc/events.jsonl"), Some(adapter));
        assert_eq!(out, strs(&["pytest", "-q", "-p", "/run/adapters/pytest_plugin"]));
    }

    #[test]
    fn matches_module_invocation() {
        let def = PytestDefinition;
        assert!(def.matches_explicit(&strs(&["python", "-m", "pytest"])));
    }
}
