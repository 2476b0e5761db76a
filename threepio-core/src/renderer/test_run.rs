// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::model::{Group, Run};
use std::fmt::Write as _;

/// Renders `test-run.md`: run metadata, a totals table, and a
/// per-top-level-group listing linking to each group's own `index.md`
/// (spec.md §4.5). `top_level` pairs each root-level group with the
/// on-disk segment already allocated for it.
pub fn render(run: &Run, top_level: &[(String, &Group)]) -> String {
    let mut out = String::new();

    writeln!(out, "# Test Run {}", run.id).unwrap();
    writeln!(out).unwrap();
    writeln!(out, "- **Status:** {}", run.status).unwrap();
    writeln!(out, "- **Started:** {}", run.start_time.to_rfc3339()).unwrap();
    if let Some(end) = run.end_time {
        writeln!(out, "- **Ended:** {}", end.to_rfc3339()).unwrap();
    }
    writeln!(out, "- **Runner:** {}", run.runner_name).unwrap();
    writeln!(out, "- **Command:** `{}`", run.original_command.join(" ")).unwrap();
    if run.effective_command != run.original_command {
        writeln!(out, "- **Effective command:** `{}`", run.effective_command.join(" ")).unwrap();
    }
    if let Some(code) = run.child_exit_code {
        writeln!(out, "- **Exit code:** {code}").unwrap();
    }
    writeln!(out).unwrap();

    if let Some(message) = &run.fatal_message {
        writeln!(out, "## Collection Error").unwrap();
        writeln!(out).unwrap();
        writeln!(out, "```").unwrap();
        writeln!(out, "{message}").unwrap();
        writeln!(out, "```").unwrap();
        writeln!(out).unwrap();
    }

    let totals = run.root.totals();
    writeln!(out, "## Totals").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "| Groups | Tests | Pass | Fail | Skip |").unwrap();
    writeln!(out, "|---|---|---|---|---|").unwrap();
    writeln!(
        out,
        "| {} | {} | {} | {} | {} |",
        top_level.len(),
        totals.total(),
        totals.pass,
        totals.fail,
        totals.skip,
    )
    .unwrap();
    writeln!(out).unwrap();

    if top_level.is_empty() {
        writeln!(out, "_No groups were discovered._").unwrap();
        return out;
    }

    writeln!(out, "## Groups").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "| Status | Name | Duration | Report |").unwrap();
    writeln!(out, "|---|---|---|---|").unwrap();
    for (segment, group) in top_level {
        let duration = group_duration(group);
        writeln!(
            out,
            "| {} | {} | {} | [reports/{segment}/index.md](reports/{segment}/index.md) |",
            group.status, group.name, duration,
        )
        .unwrap();
    }

    out
}

/// Wall-clock duration of a group, formatted for display, or a placeholder
/// if the group never started or never ended.
fn group_duration(group: &Group) -> String {
    match (group.started, group.ended) {
        (Some(start), Some(end)) => {
            let millis = (end - start).num_milliseconds().max(0);
            format!("{:.2}s", millis as f64 / 1000.0)
        }
        _ => "-".to_string(),
    }
}
