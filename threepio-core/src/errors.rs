// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the orchestration engine.

use camino::Utf8PathBuf;
use thiserror::Error;

/// No runner definition matched the user's command vector.
#[derive(Clone, Debug, Error)]
#[error(
    "no supported test runner detected in `{}`\n(supported runners: {})",
    .command.join(" "),
    .supported.join(", "),
)]
#[non_exhaustive]
pub struct RunnerDetectionError {
    pub command: Vec<String>,
    pub supported: Vec<String>,
}

impl RunnerDetectionError {
    pub fn new(command: Vec<String>, supported: Vec<String>) -> Self {
        Self { command, supported }
    }
}

/// Failure while preparing the on-disk run directory.
#[derive(Debug, Error)]
#[error("failed to prepare run directory at `{path}`")]
#[non_exhaustive]
pub struct RunDirSetupError {
    pub path: Utf8PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Failure while staging an adapter into the run directory.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AdapterStageError {
    /// Reading or writing the staged adapter file failed.
    #[error("failed to stage adapter at `{path}`")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A sentinel marker survived substitution; staging refuses to produce a
    /// silently-broken adapter.
    #[error(
        "adapter `{adapter}` still contains an unsubstituted `{sentinel}` marker after staging"
    )]
    SentinelRemaining { adapter: String, sentinel: String },
}

/// Failure while opening or tailing the IPC event file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IpcError {
    #[error("IPC file at `{path}` is already being watched")]
    AlreadyWatching { path: Utf8PathBuf },

    #[error("failed to open IPC file at `{path}`")]
    Open {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install file watcher for `{path}`")]
    Watch {
        path: Utf8PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Failure while spawning the child test process.
#[derive(Debug, Error)]
#[error("failed to spawn `{}`", .command.join(" "))]
#[non_exhaustive]
pub struct ChildSpawnError {
    pub command: Vec<String>,
    #[source]
    pub source: std::io::Error,
}

/// Failure while installing the signal handler.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SignalHandlerSetupError {
    #[error("failed to install signal handler")]
    Io(#[from] std::io::Error),
}

/// Failure while rendering a report file.
#[derive(Debug, Error)]
#[error("failed to render report file at `{path}`")]
#[non_exhaustive]
pub struct RenderError {
    pub path: Utf8PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Top-level error type surfaced by the orchestrator to its caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ThreepioError {
    #[error(transparent)]
    Detection(#[from] RunnerDetectionError),

    #[error(transparent)]
    RunDirSetup(#[from] RunDirSetupError),

    #[error(transparent)]
    AdapterStage(#[from] AdapterStageError),

    #[error(transparent)]
    Ipc(#[from] IpcError),

    #[error(transparent)]
    ChildSpawn(#[from] ChildSpawnError),

    #[error(transparent)]
    SignalSetup(#[from] SignalHandlerSetupError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl ThreepioError {
    /// Maps an error to the exit-code taxonomy of spec.md §7/§8.
    ///
    /// Detection failures are usage errors (2); everything else that
    /// prevents a run from starting at all is a generic non-zero setup
    /// failure (3). Failures that happen *after* the child has started are
    /// not representable as a `ThreepioError` — they are logged and
    /// absorbed so that a report is still produced.
    pub fn exit_code(&self) -> i32 {
        match self {
            ThreepioError::Detection(_) => 2,
            _ => 3,
        }
    }
}
