// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Projects the [`Model`](crate::model::Model) to the filesystem (spec.md
//! §4.5). Every regeneration is a full, atomic rewrite of the affected
//! files — never an append-mutation — so a crash mid-render never leaves a
//! torn file behind.

mod atomic;
mod group_report;
mod test_run;

use crate::errors::RenderError;
use crate::model::Run;
use crate::sanitize::SegmentAllocator;
use camino::Utf8Path;

pub use atomic::write_atomic;

/// The five-line header every `output.log` starts with (spec.md §4.5),
/// written once before the child starts producing any bytes.
pub fn output_log_header(run: &Run) -> String {
    format!(
        "# 3pio raw output log\n# run: {}\n# command: {}\n# this file is the verbatim combined stdout/stderr of the child process\n---\n",
        run.id,
        run.effective_command.join(" "),
    )
}

/// Regenerates the entire report tree from a model snapshot: `test-run.md`
/// plus every `reports/{…}/index.md` and `reports/{…}/output.log`
/// (spec.md §4.5). Safe to call repeatedly — including before the child
/// has produced any events, to write the initial skeleton (spec.md §4.6
/// step 3) — since rendering is a pure function of the snapshot.
pub fn render(run: &Run, run_dir: &Utf8Path) -> Result<(), RenderError> {
    let reports_dir = run_dir.join("reports");
    std::fs::create_dir_all(&reports_dir).map_err(|source| RenderError {
        path: reports_dir.clone(),
        source,
    })?;

    // Segments are allocated once here and threaded into both renderers so
    // `test-run.md`'s links always agree with the directories actually
    // written to disk.
    let mut allocator = SegmentAllocator::new();
    let top_level: Vec<(String, &crate::model::Group)> = run
        .root
        .children
        .iter()
        .map(|(name, group)| (allocator.segment_for(name), group))
        .collect();

    let test_run_path = run_dir.join("test-run.md");
    write_atomic(&test_run_path, test_run::render(run, &top_level).as_bytes()).map_err(|source| {
        RenderError {
            path: test_run_path,
            source,
        }
    })?;

    for (segment, group) in &top_level {
        group_report::render_group(group, &reports_dir.join(segment), true)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RunId;
    use crate::model::{Event, Model, TestCaseStatus};
    use camino::Utf8PathBuf;
    use chrono::Utc;

    fn tmp_run_dir(tag: &str) -> Utf8PathBuf {
        let dir = std::env::temp_dir().join(format!("threepio-render-test-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        Utf8PathBuf::from_path_buf(dir).unwrap()
    }

    #[test]
    fn renders_two_files_one_pass_one_fail() {
        // spec.md §8 scenario 1.
        let mut model = Model::new(
            RunId::generate(Utc::now()),
            vec!["npm".into(), "test".into()],
            vec!["npm".into(), "test".into()],
            "jest".into(),
            Utc::now(),
        );
        model.apply_event(
            Event::TestCase {
                parent_names: vec!["math.test.js".into()],
                test_name: "adds".into(),
                status: TestCaseStatus::Pass,
                duration: None,
                error: None,
            },
            Utc::now(),
        );
        for (name, status) in [
            ("adds numbers", TestCaseStatus::Pass),
            ("subtracts numbers", TestCaseStatus::Pass),
            ("divides numbers", TestCaseStatus::Fail),
            ("multiplies numbers", TestCaseStatus::Skip),
        ] {
            model.apply_event(
                Event::TestCase {
                    parent_names: vec!["string.test.js".into()],
                    test_name: name.into(),
                    status,
                    duration: None,
                    error: None,
                },
                Utc::now(),
            );
        }
        model.finalize(Utc::now(), Some(1), false);

        let dir = tmp_run_dir("scenario1");
        render(model.run(), &dir).unwrap();

        let test_run_md = std::fs::read_to_string(dir.join("test-run.md")).unwrap();
        assert!(test_run_md.contains("math.test.js"));
        assert!(test_run_md.contains("string.test.js"));

        let string_index = std::fs::read_to_string(dir.join("reports/string_test_js/index.md")).unwrap();
        assert!(string_index.contains("divides numbers"));
        assert!(string_index.contains("## Failures"));
    }

    #[test]
    fn empty_run_still_produces_a_valid_test_run_md() {
        let model = Model::new(
            RunId::generate(Utc::now()),
            vec!["jest".into()],
            vec!["jest".into()],
            "jest".into(),
            Utc::now(),
        );
        let dir = tmp_run_dir("empty");
        render(model.run(), &dir).unwrap();
        assert!(dir.join("test-run.md").exists());
    }

    /// Extracts every `(target)` markdown link target from `markdown`.
    fn link_targets(markdown: &str) -> Vec<String> {
        let mut targets = Vec::new();
        let mut rest = markdown;
        while let Some(open) = rest.find("](") {
            let after = &rest[open + 2..];
            if let Some(close) = after.find(')') {
                targets.push(after[..close].to_string());
                rest = &after[close + 1..];
            } else {
                break;
            }
        }
        targets
    }

    #[test]
    fn every_rendered_link_target_resolves_to_a_real_file() {
        // spec.md §4.5's link invariant: every relative link in a rendered
        // file resolves to a file that actually exists on disk, at any
        // nesting depth.
        let mut model = Model::new(
            RunId::generate(Utc::now()),
            vec!["npm".into(), "test".into()],
            vec!["npm".into(), "test".into()],
            "jest".into(),
            Utc::now(),
        );
        model.apply_event(
            Event::TestCase {
                parent_names: vec!["suite.test.js".into(), "nested describe".into()],
                test_name: "still passes".into(),
                status: TestCaseStatus::Pass,
                duration: None,
                error: None,
            },
            Utc::now(),
        );
        model.finalize(Utc::now(), Some(0), false);

        let dir = tmp_run_dir("link-targets");
        render(model.run(), &dir).unwrap();

        let mut checked = 0;
        for entry in walk_markdown(&dir) {
            let markdown = std::fs::read_to_string(&entry).unwrap();
            let file_dir = entry.parent().unwrap();
            for target in link_targets(&markdown) {
                checked += 1;
                let resolved = file_dir.join(&target);
                assert!(
                    resolved.exists(),
                    "{entry:?} links to {target}, which does not exist (resolved: {resolved:?})"
                );
            }
        }
        assert!(checked >= 2, "expected at least the top-level and nested parent links to be checked");
    }

    fn walk_markdown(dir: &Utf8Path) -> Vec<Utf8PathBuf> {
        let mut out = Vec::new();
        for entry in std::fs::read_dir(dir).unwrap() {
            let entry = entry.unwrap();
            let path = Utf8PathBuf::from_path_buf(entry.path()).unwrap();
            if path.is_dir() {
                out.extend(walk_markdown(&path));
            } else if path.extension() == Some("md") {
                out.push(path);
            }
        }
        out
    }
}
