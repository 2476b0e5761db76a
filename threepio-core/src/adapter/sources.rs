// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded adapter sources, one per IPC-based runner (spec.md §4.3).

/// An embedded, runner-specific adapter source, along with enough metadata
/// to stage it (the file name to stage it under, and the sentinel style
/// its host language's comment syntax uses).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AdapterKind {
    Jest,
    Vitest,
    Pytest,
}

/// The two sentinel styles named in spec.md §4.3: a JS-style block comment
/// pair, and a `#`-delimited pair for languages (Python) whose line
/// comments don't nest into a string literal the same way.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SentinelStyle {
    JsBlockComment,
    HashComment,
}

impl AdapterKind {
    pub const fn source(self) -> &'static str {
        match self {
            AdapterKind::Jest => include_str!("reporters/jest_reporter.js"),
            AdapterKind::Vitest => include_str!("reporters/vitest_reporter.mjs"),
            AdapterKind::Pytest => include_str!("reporters/pytest_plugin.py"),
        }
    }

    pub const fn staged_file_name(self) -> &'static str {
        match self {
            AdapterKind::Jest => "jest_reporter.js",
            AdapterKind::Vitest => "vitest_reporter.mjs",
            AdapterKind::Pytest => "pytest_plugin.py",
        }
    }

    pub const fn sentinel_style(self) -> SentinelStyle {
        match self {
            AdapterKind::Jest | AdapterKind::Vitest => SentinelStyle::JsBlockComment,
            AdapterKind::Pytest => SentinelStyle::HashComment,
        }
    }
}

impl SentinelStyle {
    /// The exact marker text that must appear (twice, bracketing the
    /// placeholder) in the adapter source.
    pub const fn marker(self) -> &'static str {
        match self {
            SentinelStyle::JsBlockComment => "/*__IPC_PATH__*/",
            SentinelStyle::HashComment => "#__IPC_PATH__#",
        }
    }
}
