// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires runner detection, adapter staging, child supervision, the IPC
//! tail, and the renderer into one run (spec.md §4.6).

mod child_guard;
mod manifest;
mod run_dir;

use crate::adapter::stage_adapter;
use crate::errors::{ChildSpawnError, ThreepioError};
use crate::ids::RunId;
use crate::ipc::{IpcTail, TailMessage};
use crate::model::{Event, Model};
use crate::renderer;
use crate::runner_def::{EventSource, ExitClass, Registry};
use crate::signal::{ShutdownEvent, SignalHandlerKind};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use child_guard::ChildGuard;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use std::sync::Arc;

/// How often the report tree is allowed to re-render while events are
/// streaming in (spec.md §4.6: rendering is throttled, not done per-event).
const RENDER_THROTTLE: Duration = Duration::from_millis(200);

/// Default grace period between forwarding a shutdown signal to the child
/// and escalating to a hard kill (spec.md §4.6 "Signal handling").
const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// What a finished run produced.
#[derive(Debug)]
pub struct OrchestratorOutcome {
    pub run_id: RunId,
    pub run_dir: Utf8PathBuf,
    /// The exit code 3pio itself should return: `0` on success, `1` on a
    /// normal test-failure exit, or the child's own code when the runner
    /// classifies its exit as a system error.
    pub exit_code: i32,
    /// The final model snapshot, for a caller (the CLI) that wants to print
    /// a human summary without re-parsing the rendered report files.
    pub run: crate::model::Run,
}

/// Owns one end-to-end run: detect, stage, spawn, observe, render.
pub struct Orchestrator {
    cwd: Utf8PathBuf,
    grace_period: Duration,
    signal_kind: SignalHandlerKind,
}

impl Orchestrator {
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self {
            cwd,
            grace_period: DEFAULT_GRACE_PERIOD,
            signal_kind: SignalHandlerKind::Standard,
        }
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Overrides signal handling, primarily so tests can run with
    /// [`SignalHandlerKind::Noop`] instead of touching process-wide signal
    /// state.
    pub fn with_signal_handler_kind(mut self, kind: SignalHandlerKind) -> Self {
        self.signal_kind = kind;
        self
    }

    /// Runs `argv` to completion, writing a full report tree under
    /// `{cwd}/.3pio/runs/{runId}/` and returning the exit code the caller
    /// should itself exit with.
    pub async fn run(&self, argv: Vec<String>) -> Result<OrchestratorOutcome, ThreepioError> {
        self.run_with_run_dir_hook(argv, |_| {}).await
    }

    /// Same as [`Orchestrator::run`], but calls `on_run_dir_ready` once the
    /// run directory has been created and its run ID is known, before the
    /// child is spawned. The CLI uses this to point its own debug-log file
    /// writer at `{run_dir}/logs/debug.log`, which can't be known any
    /// earlier than this.
    pub async fn run_with_run_dir_hook(
        &self,
        argv: Vec<String>,
        on_run_dir_ready: impl FnOnce(&Utf8Path),
    ) -> Result<OrchestratorOutcome, ThreepioError> {
        let hints = manifest::gather_hints(&self.cwd);
        let registry = Registry::new();
        let definition = registry.detect(&argv, &hints)?;

        let run_id = RunId::generate(Utc::now());
        let run_dir = self.cwd.join(".3pio").join("runs").join(run_id.as_str());
        run_dir::prepare(&run_dir)?;
        on_run_dir_ready(&run_dir);

        let ipc_path = run_dir.join("ipc").join("events.jsonl");
        let staged_adapter = match definition.adapter_kind() {
            Some(kind) => Some(stage_adapter(kind, &run_dir.join("adapters"), &ipc_path)?),
            None => None,
        };

        let effective_command =
            definition.build_effective_command(&argv, &ipc_path, staged_adapter.as_deref());

        let mut model = Model::new(
            run_id.clone(),
            argv.clone(),
            effective_command.clone(),
            definition.name().to_string(),
            Utc::now(),
        );

        // Step 3: write the initial skeleton before the child produces
        // anything, so a reader tailing the report directory immediately
        // after launch already finds a valid (empty) tree.
        renderer::render(model.run(), &run_dir)?;
        let output_log_path = run_dir.join("output.log");
        std::fs::write(&output_log_path, renderer::output_log_header(model.run()))
            .map_err(|source| crate::errors::RenderError {
                path: output_log_path.clone(),
                source,
            })?;

        let mut command = Command::new(&effective_command[0]);
        command
            .args(&effective_command[1..])
            .current_dir(self.cwd.as_std_path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|source| ChildSpawnError {
            command: effective_command.clone(),
            source,
        })?;
        let mut guard = ChildGuard::new(child);

        let (control_tx, mut control_rx) = mpsc::channel::<LoopEvent>(crate::ipc::IPC_CHANNEL_CAPACITY);

        let ipc_tail = IpcTail::new();
        let ipc_active = matches!(definition.event_source(), EventSource::Ipc | EventSource::Hybrid);
        if ipc_active {
            let mut ipc_rx = ipc_tail.open(ipc_path.clone()).await?;
            let tx = control_tx.clone();
            tokio::spawn(async move {
                while let Some(msg) = ipc_rx.recv().await {
                    let event = match msg {
                        TailMessage::Event(event) => LoopEvent::Applier(ApplierMessage::Event(event)),
                        TailMessage::Warning(warning) => {
                            LoopEvent::Applier(ApplierMessage::Warning(warning))
                        }
                    };
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
            });
        }

        let output_log = Arc::new(AsyncMutex::new(
            tokio::fs::OpenOptions::new()
                .append(true)
                .open(output_log_path.as_std_path())
                .await
                .map_err(|source| crate::errors::RenderError {
                    path: output_log_path.clone(),
                    source,
                })?,
        ));

        let stdout = guard
            .inner_mut()
            .stdout
            .take()
            .expect("child spawned with piped stdout");
        let stderr = guard
            .inner_mut()
            .stderr
            .take()
            .expect("child spawned with piped stderr");

        let wants_stdout_events = matches!(
            definition.event_source(),
            EventSource::NativeStream | EventSource::Hybrid
        );
        let mut stdout_parser = wants_stdout_events.then(|| definition.new_stdout_parser());

        {
            let tx = control_tx.clone();
            let output_log = output_log.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                loop {
                    match lines.next_line().await {
                        Ok(Some(line)) => {
                            {
                                let mut file = output_log.lock().await;
                                let _ = file.write_all(line.as_bytes()).await;
                                let _ = file.write_all(b"\n").await;
                            }
                            if let Some(parser) = stdout_parser.as_mut() {
                                for event in parser.parse_line(&line) {
                                    if tx
                                        .send(LoopEvent::Applier(ApplierMessage::Event(event)))
                                        .await
                                        .is_err()
                                    {
                                        return;
                                    }
                                }
                            }
                        }
                        _ => return,
                    }
                }
            });
        }

        {
            let output_log = output_log.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    let mut file = output_log.lock().await;
                    let _ = file.write_all(line.as_bytes()).await;
                    let _ = file.write_all(b"\n").await;
                }
            });
        }

        let signal_task = {
            let tx = control_tx.clone();
            let mut handler = self.signal_kind.build()?;
            tokio::spawn(async move {
                while let Some(event) = handler.recv().await {
                    if tx.send(LoopEvent::Shutdown(event)).await.is_err() {
                        return;
                    }
                }
            })
        };

        let timer_tx = control_tx.clone();
        drop(control_tx);

        let mut interrupted = false;
        let mut shutdown_in_progress = false;
        let mut last_render = Instant::now();

        let exit_status = loop {
            tokio::select! {
                status = guard.inner_mut().wait() => break status,
                Some(event) = control_rx.recv() => {
                    match event {
                        LoopEvent::Applier(ApplierMessage::Event(event)) => {
                            model.apply_event(event, Utc::now());
                            maybe_render(&model, &run_dir, &mut last_render)?;
                        }
                        LoopEvent::Applier(ApplierMessage::Warning(warning)) => {
                            model.record_warning(warning);
                        }
                        LoopEvent::Shutdown(event) => {
                            interrupted = true;
                            if shutdown_in_progress {
                                // A second signal during shutdown is a fast-abort:
                                // don't wait out the grace period, kill now.
                                guard.kill().await;
                            } else {
                                guard.signal_group(unix_signal_for(event));
                                shutdown_in_progress = true;
                                let tx = timer_tx.clone();
                                let grace_period = self.grace_period;
                                tokio::spawn(async move {
                                    tokio::time::sleep(grace_period).await;
                                    let _ = tx.send(LoopEvent::ForceKill).await;
                                });
                            }
                        }
                        LoopEvent::ForceKill => {
                            guard.kill().await;
                        }
                    }
                }
            }
        };

        drop(timer_tx);
        signal_task.abort();
        guard.disarm();
        if ipc_active {
            ipc_tail.close().await;
        }

        // Drain any events still in flight (the IPC tail and stdout tee
        // tasks may have a little work left after the child has exited).
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(500), control_rx.recv()).await
        {
            match event {
                LoopEvent::Applier(ApplierMessage::Event(event)) => model.apply_event(event, Utc::now()),
                LoopEvent::Applier(ApplierMessage::Warning(warning)) => model.record_warning(warning),
                LoopEvent::Shutdown(_) | LoopEvent::ForceKill => {}
            }
        }

        let child_exit_code = match &exit_status {
            Ok(status) => Some(exit_code_from_status(status)),
            Err(_) => {
                model.record_warning("failed to wait on child process");
                None
            }
        };

        let mut exit_class = None;
        if let Some(code) = child_exit_code {
            let class = definition.interpret_exit_code(code);
            if matches!(class, ExitClass::SystemError) && model.run().fatal_message.is_none() {
                model.apply_event(
                    Event::Fatal {
                        message: format!(
                            "{} exited with code {code}, which does not correspond to a normal test-result outcome",
                            definition.name()
                        ),
                    },
                    Utc::now(),
                );
            }
            exit_class = Some(class);
        }

        model.finalize(Utc::now(), child_exit_code, interrupted);
        renderer::render(model.run(), &run_dir)?;

        // spec.md's exit-code contract is a classification, not a raw
        // passthrough: success is 0, test failures are normalized to 1, and
        // only a system error mirrors the child's own code.
        let exit_code = match (exit_class, child_exit_code) {
            (Some(ExitClass::Success), _) => 0,
            (Some(ExitClass::TestFailures), _) => 1,
            (Some(ExitClass::SystemError), Some(code)) => code,
            _ => 1,
        };

        Ok(OrchestratorOutcome {
            run_id,
            run_dir,
            exit_code,
            run: model.snapshot(),
        })
    }
}

/// The unified message type the event loop selects over.
enum LoopEvent {
    Applier(ApplierMessage),
    Shutdown(ShutdownEvent),
    ForceKill,
}

enum ApplierMessage {
    Event(Event),
    Warning(String),
}

/// Re-renders the report tree if enough time has passed since the last
/// render (spec.md §4.6: rendering is throttled while events stream in).
fn maybe_render(
    model: &Model,
    run_dir: &Utf8Path,
    last_render: &mut Instant,
) -> Result<(), ThreepioError> {
    if last_render.elapsed() >= RENDER_THROTTLE {
        renderer::render(model.run(), run_dir)?;
        *last_render = Instant::now();
    }
    Ok(())
}

#[cfg(unix)]
fn unix_signal_for(event: ShutdownEvent) -> libc::c_int {
    match event {
        ShutdownEvent::Interrupt => libc::SIGINT,
        ShutdownEvent::Term => libc::SIGTERM,
        ShutdownEvent::Hangup => libc::SIGHUP,
    }
}

#[cfg(windows)]
fn unix_signal_for(_event: ShutdownEvent) -> i32 {
    0
}

#[cfg(unix)]
fn exit_code_from_status(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.code().unwrap_or_else(|| 128 + status.signal().unwrap_or(0))
}

#[cfg(windows)]
fn exit_code_from_status(status: &std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
