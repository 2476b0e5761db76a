// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::write_atomic;
use crate::errors::RenderError;
use crate::model::{Group, TestCaseStatus};
use crate::sanitize::SegmentAllocator;
use camino::Utf8Path;
use std::fmt::Write as _;

/// Renders one group's `index.md` and `output.log` under `dir`, then
/// recurses into its children (spec.md §4.5). `dir` is the group's own
/// report directory, e.g. `{runDir}/reports/math_test_js`. `is_top_level`
/// controls where the "parent" link points: a top-level group's parent is
/// the run itself (`test-run.md`, two directories up), while a nested
/// group's parent is another group's `index.md` one directory up.
pub fn render_group(group: &Group, dir: &Utf8Path, is_top_level: bool) -> Result<(), RenderError> {
    std::fs::create_dir_all(dir).map_err(|source| RenderError {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut allocator = SegmentAllocator::new();
    let children: Vec<(String, &Group)> = group
        .children
        .iter()
        .map(|(name, child)| (allocator.segment_for(name), child))
        .collect();

    let index_path = dir.join("index.md");
    write_atomic(&index_path, index_md(group, &children, is_top_level).as_bytes()).map_err(|source| {
        RenderError {
            path: index_path,
            source,
        }
    })?;

    let output_path = dir.join("output.log");
    write_atomic(&output_path, output_log(group).as_bytes()).map_err(|source| RenderError {
        path: output_path,
        source,
    })?;

    for (segment, child) in &children {
        render_group(child, &dir.join(segment), false)?;
    }

    Ok(())
}

fn index_md(group: &Group, children: &[(String, &Group)], is_top_level: bool) -> String {
    let mut out = String::new();
    let display_name = if group.name.is_empty() { "(root)" } else { &group.name };

    writeln!(out, "# {display_name}").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "- **Status:** {}", group.status).unwrap();
    if let (Some(start), Some(end)) = (group.started, group.ended) {
        let millis = (end - start).num_milliseconds().max(0);
        writeln!(out, "- **Duration:** {:.2}s", millis as f64 / 1000.0).unwrap();
    }
    if !group.warnings.is_empty() {
        writeln!(out, "- **Warnings:** {}", group.warnings.len()).unwrap();
    }
    writeln!(out).unwrap();
    let parent_link = if is_top_level { "../../test-run.md" } else { "../index.md" };
    writeln!(out, "[← parent]({parent_link})").unwrap();
    writeln!(out).unwrap();

    if !children.is_empty() {
        writeln!(out, "## Child groups").unwrap();
        writeln!(out).unwrap();
        writeln!(out, "| Status | Name | Report |").unwrap();
        writeln!(out, "|---|---|---|").unwrap();
        for (segment, child) in children {
            writeln!(
                out,
                "| {} | {} | [{segment}/index.md]({segment}/index.md) |",
                child.status, child.name,
            )
            .unwrap();
        }
        writeln!(out).unwrap();
    }

    if !group.test_cases.is_empty() {
        writeln!(out, "## Test cases").unwrap();
        writeln!(out).unwrap();
        writeln!(out, "| Status | Name | Duration |").unwrap();
        writeln!(out, "|---|---|---|").unwrap();
        for case in &group.test_cases {
            let duration = case
                .duration
                .map(|d| format!("{:.3}s", d.as_secs_f64()))
                .unwrap_or_else(|| "-".to_string());
            writeln!(out, "| {} | {} | {duration} |", case.status, case.name).unwrap();
        }
        writeln!(out).unwrap();

        let failed: Vec<_> = group
            .test_cases
            .iter()
            .filter(|c| c.status == TestCaseStatus::Fail)
            .collect();
        if !failed.is_empty() {
            writeln!(out, "## Failures").unwrap();
            writeln!(out).unwrap();
            for case in failed {
                writeln!(out, "### {}", case.name).unwrap();
                writeln!(out).unwrap();
                if let Some(error) = &case.error {
                    writeln!(out, "```").unwrap();
                    writeln!(out, "{}", error.message).unwrap();
                    if let Some(stack) = &error.stack {
                        writeln!(out).unwrap();
                        writeln!(out, "{stack}").unwrap();
                    }
                    writeln!(out, "```").unwrap();
                } else {
                    writeln!(out, "_no error detail captured_").unwrap();
                }
                writeln!(out).unwrap();
            }
        }
    }

    out
}

fn output_log(group: &Group) -> String {
    let mut out = String::new();
    out.push_str(&group.stdout.render());
    if !group.stderr.is_empty() {
        out.push_str("\n--- stderr ---\n");
        out.push_str(&group.stderr.render());
    }
    out
}
