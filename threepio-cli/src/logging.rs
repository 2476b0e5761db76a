// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A `tracing` writer that starts out stderr-only and starts mirroring to
//! `{run_dir}/logs/debug.log` once a run directory exists. The file target
//! can't be known until the orchestrator has generated a run ID, which
//! happens after the subscriber must already be installed, so the writer
//! is built once at startup and attached to later via [`DebugLogWriter::attach`].

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tracing_appender::non_blocking::NonBlocking;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
pub struct DebugLogWriter {
    file: Arc<Mutex<Option<NonBlocking>>>,
}

impl DebugLogWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts mirroring every subsequent log line to `writer` in addition
    /// to stderr. The caller is responsible for keeping the matching
    /// `WorkerGuard` alive until logging should stop.
    pub fn attach(&self, writer: NonBlocking) {
        *self.file.lock().expect("debug log mutex poisoned") = Some(writer);
    }
}

impl Write for DebugLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(file) = self.file.lock().expect("debug log mutex poisoned").as_mut() {
            let _ = file.write(buf);
        }
        io::stderr().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.lock().expect("debug log mutex poisoned").as_mut() {
            let _ = file.flush();
        }
        io::stderr().flush()
    }
}

impl<'a> MakeWriter<'a> for DebugLogWriter {
    type Writer = DebugLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
