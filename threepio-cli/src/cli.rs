// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::{Parser, ValueEnum};

/// Runs your test command unchanged and leaves a structured report on disk.
#[derive(Debug, Parser)]
#[command(name = "3pio", version, about, trailing_var_arg = true)]
pub struct Cli {
    /// The test command to run, exactly as you'd normally invoke it, e.g.
    /// `3pio npm test` or `3pio cargo nextest run`.
    #[arg(required = true, allow_hyphen_values = true)]
    pub command: Vec<String>,

    /// Produce color output: auto, always, never.
    #[arg(long, value_enum, default_value_t = Color::Auto, global = true)]
    pub color: Color,

    /// Log verbosity passed to `tracing-subscriber`'s env filter, e.g.
    /// `info`, `debug`, `3pio=trace`.
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Seconds to wait after forwarding a shutdown signal to the child
    /// before escalating to a hard kill.
    #[arg(long, default_value_t = 5)]
    pub grace_period: u64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Color {
    Auto,
    Always,
    Never,
}

impl Default for Color {
    fn default() -> Self {
        Color::Auto
    }
}

impl Color {
    pub fn init(self) {
        match self {
            Color::Auto => owo_colors::unset_override(),
            Color::Always => owo_colors::set_override(true),
            Color::Never => owo_colors::set_override(false),
        }
    }
}
