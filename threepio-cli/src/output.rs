// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The human-readable summary printed to stdout after a run finishes
//! (spec.md §7 "Human console output"). This is strictly supplementary —
//! everything it reports also lives in the rendered report tree, and 3pio
//! never pipes or filters the child's own stdout/stderr to produce it.

use owo_colors::{OwoColorize, Style};
use threepio_core::model::Run;

pub fn print_summary(run: &Run) {
    let totals = run.root.totals();
    let label = if totals.fail > 0 {
        "FAIL".if_supports_color(owo_colors::Stream::Stdout, |s| s.style(Style::new().red().bold()))
            .to_string()
    } else if run.fatal_message.is_some() {
        "ERROR".if_supports_color(owo_colors::Stream::Stdout, |s| s.style(Style::new().yellow().bold()))
            .to_string()
    } else {
        "PASS".if_supports_color(owo_colors::Stream::Stdout, |s| s.style(Style::new().green().bold()))
            .to_string()
    };

    println!();
    println!("{label} {} ({})", run.runner_name, run.id);
    println!(
        "  {} passed, {} failed, {} skipped ({} total)",
        totals.pass.if_supports_color(owo_colors::Stream::Stdout, |s| s.style(Style::new().green())),
        totals.fail.if_supports_color(owo_colors::Stream::Stdout, |s| s.style(Style::new().red())),
        totals.skip.if_supports_color(owo_colors::Stream::Stdout, |s| s.style(Style::new().yellow())),
        totals.total(),
    );

    if let Some(message) = &run.fatal_message {
        println!("  collection error: {message}");
    }
    if !run.warnings.is_empty() {
        println!("  {} warning(s) recorded — see test-run.md", run.warnings.len());
    }

    println!("  report: .3pio/runs/{}/test-run.md", run.id);
}
