// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tails the IPC event file forever, decoding one JSON object per line and
//! publishing to a bounded channel (spec.md §4.2, task T1 in §5).

use super::wire::{decode_line, DecodedLine};
use crate::errors::IpcError;
use crate::model::Event;
use camino::Utf8PathBuf;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

/// Bounded channel capacity (spec.md §4.2: "buffer cap = 10k events").
pub const IPC_CHANNEL_CAPACITY: usize = 10_000;

/// Poll fallback interval, within the 50-100ms range spec.md §4.2 names.
const POLL_INTERVAL: Duration = Duration::from_millis(75);

/// A message published by the tail task: either a successfully decoded
/// event, or a warning about a line that failed to decode (spec.md §4.2:
/// "logs a warning with offset and continues; never aborts").
#[derive(Debug)]
pub enum TailMessage {
    Event(Event),
    Warning(String),
}

struct Running {
    stop: Arc<Notify>,
    join: JoinHandle<()>,
}

/// Owns the lifecycle of one run's IPC tail. `Open`/`Close` map directly to
/// the contract in spec.md §4.2.
pub struct IpcTail {
    running: Mutex<Option<Running>>,
}

impl Default for IpcTail {
    fn default() -> Self {
        Self::new()
    }
}

impl IpcTail {
    pub fn new() -> Self {
        Self {
            running: Mutex::new(None),
        }
    }

    /// Creates an empty file at `path` and begins tailing it. Returns the
    /// receiving half of the event channel.
    pub async fn open(&self, path: Utf8PathBuf) -> Result<mpsc::Receiver<TailMessage>, IpcError> {
        {
            let guard = self.running.lock().expect("ipc tail mutex poisoned");
            if guard.is_some() {
                return Err(IpcError::AlreadyWatching { path });
            }
        }

        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .read(true)
            .truncate(true)
            .open(path.as_std_path())
            .await
            .map_err(|source| IpcError::Open {
                path: path.clone(),
                source,
            })?;

        let (tx, rx) = mpsc::channel(IPC_CHANNEL_CAPACITY);
        let changed = Arc::new(Notify::new());
        let stop = Arc::new(Notify::new());

        let watcher = spawn_fs_watcher(&path, changed.clone());

        let join = tokio::spawn(tail_loop(file, tx, changed, stop.clone(), watcher));

        *self.running.lock().expect("ipc tail mutex poisoned") = Some(Running { stop, join });
        Ok(rx)
    }

    /// Stops watching, drains any pending decoded events, and closes the
    /// channel. Safe to call from any task; safe to call when not open.
    pub async fn close(&self) {
        let running = self
            .running
            .lock()
            .expect("ipc tail mutex poisoned")
            .take();
        if let Some(running) = running {
            running.stop.notify_one();
            let _ = running.join.await;
        }
    }
}

/// Attempts to install a native file watcher that pings `changed` on any
/// write. Returns `None` (rather than erroring) on failure: the poll loop
/// in [`tail_loop`] makes a working watcher an optimization, not a
/// correctness requirement, per spec.md §4.2's "on watcher errors, fall
/// back to a 50-100ms poll loop".
fn spawn_fs_watcher(path: &Utf8PathBuf, changed: Arc<Notify>) -> Option<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if res.is_ok() {
            changed.notify_one();
        }
    })
    .ok()?;
    watcher
        .watch(path.as_std_path(), RecursiveMode::NonRecursive)
        .ok()?;
    Some(watcher)
}

async fn tail_loop(
    mut file: tokio::fs::File,
    tx: mpsc::Sender<TailMessage>,
    changed: Arc<Notify>,
    stop: Arc<Notify>,
    _watcher: Option<RecommendedWatcher>,
) {
    let mut offset: u64 = 0;
    let mut residue = String::new();

    loop {
        tokio::select! {
            _ = stop.notified() => {
                read_and_publish(&mut file, &mut offset, &mut residue, &tx).await;
                break;
            }
            _ = changed.notified() => {
                read_and_publish(&mut file, &mut offset, &mut residue, &tx).await;
            }
            _ = tokio::time::sleep(POLL_INTERVAL) => {
                read_and_publish(&mut file, &mut offset, &mut residue, &tx).await;
            }
        }
    }
    // `tx` is dropped here, closing the channel exactly once.
}

async fn read_and_publish(
    file: &mut tokio::fs::File,
    offset: &mut u64,
    residue: &mut String,
    tx: &mpsc::Sender<TailMessage>,
) {
    if file
        .seek(std::io::SeekFrom::Start(*offset))
        .await
        .is_err()
    {
        return;
    }

    let mut buf = Vec::new();
    if file.read_to_end(&mut buf).await.is_err() || buf.is_empty() {
        return;
    }
    *offset += buf.len() as u64;

    residue.push_str(&String::from_utf8_lossy(&buf));

    while let Some(idx) = residue.find('\n') {
        let line: String = residue.drain(..=idx).collect();
        let line = line.trim_end_matches('\n');
        // Back-pressure is acceptable; dropping a decoded event is not
        // (spec.md §4.2). A closed receiver (run already finalized) means
        // there's nobody left to deliver to, so just stop trying.
        match decode_line(line) {
            DecodedLine::Event(event) => {
                if tx.send(TailMessage::Event(event)).await.is_err() {
                    return;
                }
            }
            DecodedLine::Malformed(msg) => {
                if tx.send(TailMessage::Warning(msg)).await.is_err() {
                    return;
                }
            }
            DecodedLine::Ignored => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[tokio::test]
    async fn open_twice_is_already_watching() {
        let dir = camino_tempdir();
        let path = dir.join("events.jsonl");
        let tail = IpcTail::new();
        let _rx = tail.open(path.clone()).await.unwrap();
        let err = tail.open(path).await.unwrap_err();
        assert!(matches!(err, IpcError::AlreadyWatching { .. }));
        tail.close().await;
    }

    #[tokio::test]
    async fn tails_lines_appended_after_open() {
        let dir = camino_tempdir();
        let path = dir.join("events.jsonl");
        let tail = IpcTail::new();
        let mut rx = tail.open(path.clone()).await.unwrap();

        let mut f = std::fs::OpenOptions::new()
            .write(true)
            .open(path.as_std_path())
            .unwrap();
        writeln!(
            f,
            r#"{{"eventType":"testGroupStart","payload":{{"groupName":"a","parentNames":[]}}}}"#
        )
        .unwrap();
        f.sync_all().unwrap();
        drop(f);

        let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("channel closed early");
        assert!(matches!(msg, TailMessage::Event(Event::GroupStart { .. })));

        tail.close().await;
    }

    fn camino_tempdir() -> Utf8PathBuf {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "threepio-ipc-test-{}-{n}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        Utf8PathBuf::from_path_buf(dir).unwrap()
    }
}
