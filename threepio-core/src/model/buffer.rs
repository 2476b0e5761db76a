// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded per-group output buffer (spec.md §4.4 "Output buffering").

/// Per-group buffer cap: 1 MiB, per spec.md §4.4.
pub const GROUP_BUFFER_CAP_BYTES: usize = 1024 * 1024;

/// A bounded, append-only byte buffer that head-truncates on overflow,
/// recording a single marker line with the number of bytes dropped.
///
/// One of these exists per group, per stream (stdout, stderr).
#[derive(Clone, Debug, Default)]
pub struct OutputBuffer {
    data: Vec<u8>,
    bytes_dropped: u64,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk, head-truncating if the buffer would exceed the cap.
    pub fn append(&mut self, chunk: &str) {
        self.data.extend_from_slice(chunk.as_bytes());
        if self.data.len() > GROUP_BUFFER_CAP_BYTES {
            let overflow = self.data.len() - GROUP_BUFFER_CAP_BYTES;
            self.data.drain(..overflow);
            self.bytes_dropped += overflow as u64;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.bytes_dropped == 0
    }

    /// Renders the buffer's contents as a lossy UTF-8 string, prefixed with
    /// a marker line if any bytes were ever dropped from the head.
    pub fn render(&self) -> String {
        let body = String::from_utf8_lossy(&self.data);
        if self.bytes_dropped == 0 {
            body.into_owned()
        } else {
            format!(
                "[... {} bytes dropped from the head of this buffer ...]\n{body}",
                self.bytes_dropped
            )
        }
    }
}
