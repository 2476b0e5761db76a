// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

mod cli;
mod logging;
mod output;

use camino::Utf8PathBuf;
use clap::Parser;
use cli::Cli;
use logging::DebugLogWriter;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use threepio_core::Orchestrator;
use tracing_appender::non_blocking::WorkerGuard;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let _ = enable_ansi_support::enable_ansi_support();

    let cli = Cli::parse();
    cli.color.init();

    // The run directory, and with it `{run_dir}/logs/debug.log`, isn't known
    // until the orchestrator generates a run ID. The subscriber has to be
    // installed before that, so it starts out stderr-only and the debug log
    // is attached once `run_with_run_dir_hook` reports the path.
    let debug_log = DebugLogWriter::new();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&cli.log_level))
        .with_ansi(false)
        .with_writer(debug_log.clone())
        .init();

    let cwd = std::env::current_dir().expect("current directory must be accessible");
    let cwd = Utf8PathBuf::from_path_buf(cwd).expect("current directory must be valid UTF-8");

    tracing::info!(command = ?cli.command, "starting run");

    let runtime = tokio::runtime::Runtime::new()?;
    let orchestrator = Orchestrator::new(cwd).with_grace_period(Duration::from_secs(cli.grace_period));

    let guard_slot: Arc<Mutex<Option<WorkerGuard>>> = Arc::new(Mutex::new(None));
    let on_run_dir_ready = {
        let debug_log = debug_log.clone();
        let guard_slot = Arc::clone(&guard_slot);
        move |run_dir: &camino::Utf8Path| {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(run_dir.join("logs").as_std_path(), "debug.log"));
            debug_log.attach(writer);
            *guard_slot.lock().expect("debug log guard mutex poisoned") = Some(guard);
        }
    };

    let outcome = runtime.block_on(orchestrator.run_with_run_dir_hook(cli.command, on_run_dir_ready));

    // `std::process::exit` below skips destructors, so the non-blocking
    // writer's buffered lines must be flushed explicitly first.
    drop(guard_slot.lock().expect("debug log guard mutex poisoned").take());

    match outcome {
        Ok(outcome) => {
            output::print_summary(&outcome.run);
            std::process::exit(outcome.exit_code);
        }
        Err(error) => {
            eprintln!("3pio: {error}");
            std::process::exit(error.exit_code());
        }
    }
}
