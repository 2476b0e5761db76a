// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runner registry and per-framework definitions (spec.md §4.1).
//!
//! A [`RunnerDefinition`] is a strategy object: it knows how to recognize
//! its own invocation, how to rewrite the command to inject observation
//! hooks, and — for runners whose own stdout is machine-readable — how to
//! turn that stdout into [`Event`](crate::model::Event)s.

mod cargo_nextest;
mod go_test;
mod jest;
mod pytest;
mod registry;
mod vitest;

use crate::adapter::AdapterKind;
use crate::model::Event;
use camino::Utf8Path;

pub use registry::Registry;

/// Hints gathered from the caller's working directory, consulted only when
/// `argv` does not explicitly name a runner (spec.md §4.1).
#[derive(Clone, Debug, Default)]
pub struct ManifestHints {
    pub has_package_json: bool,
    pub package_json_test_script: Option<String>,
    pub has_pyproject_toml: bool,
    pub has_pytest_ini: bool,
    pub has_cargo_toml: bool,
    pub has_nextest_config: bool,
}

/// How a definition's events reach the orchestrator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EventSource {
    /// Events arrive solely via the injected adapter's IPC stream.
    Ipc,
    /// Events are derived solely by parsing the child's own stdout.
    NativeStream,
    /// Both: a native structured stream plus supplementary IPC events.
    Hybrid,
}

/// How a definition classifies the child's exit code (spec.md §4.1, §7).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExitClass {
    Success,
    TestFailures,
    SystemError,
}

/// Per-line stdout parser state for NATIVE_STREAM/HYBRID definitions.
/// A fresh instance is created per child process via
/// [`RunnerDefinition::new_stdout_parser`].
pub trait StdoutParser: Send {
    fn parse_line(&mut self, line: &str) -> Vec<Event>;
}

/// A parser that never produces events, for IPC-only definitions that
/// still tee stdout to `output.log` but don't derive events from it.
struct NoopParser;

impl StdoutParser for NoopParser {
    fn parse_line(&mut self, _line: &str) -> Vec<Event> {
        Vec::new()
    }
}

/// A per-framework strategy object (spec.md §4.1).
pub trait RunnerDefinition: Send + Sync {
    /// Stable short identifier, e.g. `"jest"`.
    fn name(&self) -> &'static str;

    fn event_source(&self) -> EventSource;

    /// True if `argv` explicitly names this runner, directly or via a
    /// package-manager passthrough (`<pkgmgr> exec|run|-m <runner>`).
    /// The registry only falls back to `matches_by_manifest` when no
    /// definition's `matches_explicit` succeeds.
    fn matches_explicit(&self, argv: &[String]) -> bool;

    /// True if `hints` suggest this runner without `argv` naming one
    /// explicitly (e.g. `npm test` plus a `package.json` with a jest
    /// test script).
    fn matches_by_manifest(&self, argv: &[String], hints: &ManifestHints) -> bool {
        let _ = (argv, hints);
        false
    }

    /// For IPC/HYBRID definitions: which embedded adapter to stage.
    /// `None` for NATIVE_STREAM definitions.
    fn adapter_kind(&self) -> Option<AdapterKind> {
        None
    }

    /// Rewrites `argv` into the command actually spawned. `ipc_path` and
    /// `staged_adapter` are populated whenever `adapter_kind()` is `Some`;
    /// NATIVE_STREAM definitions that don't use them may ignore both.
    fn build_effective_command(
        &self,
        argv: &[String],
        ipc_path: &Utf8Path,
        staged_adapter: Option<&Utf8Path>,
    ) -> Vec<String>;

    /// A fresh, stateful stdout line parser. Defaults to one that never
    /// emits events (correct for IPC-only definitions).
    fn new_stdout_parser(&self) -> Box<dyn StdoutParser> {
        Box::new(NoopParser)
    }

    fn interpret_exit_code(&self, code: i32) -> ExitClass;
}

pub use cargo_nextest::CargoNextestDefinition;
pub use cargo_test::CargoTestDefinition;
pub use go_test::GoTestDefinition;
pub use jest::JestDefinition;
pub use pytest::PytestDefinition;
pub use vitest::VitestDefinition;
