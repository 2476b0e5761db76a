// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The IPC manager (spec.md §4.2): owns the run's IPC event file, tails it
//! to end-of-file forever, decodes one JSON object per line, and publishes
//! typed [`Event`](crate::model::Event)s on an ordered channel.

mod tail;
mod wire;

pub use tail::{IpcTail, TailMessage, IPC_CHANNEL_CAPACITY};
pub use wire::{decode_line, DecodedLine};
