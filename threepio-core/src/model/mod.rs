// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The in-memory report model (spec.md §4.4).
//!
//! [`Model`] holds the authoritative [`Run`] state. All mutation goes
//! through [`Model::apply_event`], the sole mutator described as task T5 in
//! spec.md §5; the renderer (T6) only ever reads a [`Model::snapshot`].

pub mod buffer;
pub mod event;
pub mod group;
pub mod run;
pub mod status;

pub use event::{ErrorPayload, Event, Stream};
pub use group::Group;
pub use run::Run;
pub use status::{GroupStatus, RunStatus, TestCaseStatus};
pub use test_case::TestCase;

mod test_case;

use chrono::{DateTime, Utc};
use ids::RunId;

use crate::ids;

/// The mutable report model for a single run.
#[derive(Debug)]
pub struct Model {
    run: Run,
}

impl Model {
    pub fn new(
        id: RunId,
        original_command: Vec<String>,
        effective_command: Vec<String>,
        runner_name: String,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            run: Run::new(id, original_command, effective_command, runner_name, start_time),
        }
    }

    /// Applies one normalized [`Event`] to the model. `now` is the
    /// timestamp to attribute to any state transition this event causes;
    /// callers pass the event's own arrival time rather than calling
    /// `Utc::now()` here, so that model mutation stays a pure function of
    /// its inputs (this matters for the renderer's purity invariant in
    /// spec.md §8, and for being able to replay a recorded event log).
    pub fn apply_event(&mut self, event: Event, now: DateTime<Utc>) {
        match event {
            Event::GroupDiscovered {
                parent_names,
                group_name,
            } => {
                let path = append(&parent_names, &group_name);
                with_group_mut(&mut self.run.root, &path, true, |_| {});
            }
            Event::GroupStart {
                parent_names,
                group_name,
            } => {
                let path = append(&parent_names, &group_name);
                with_group_mut(&mut self.run.root, &path, false, |g| g.mark_started(now));
            }
            Event::GroupResult {
                parent_names,
                group_name,
                status,
            } => {
                let path = append(&parent_names, &group_name);
                with_group_mut(&mut self.run.root, &path, false, |g| {
                    g.apply_explicit_result(status, now)
                });
            }
            Event::TestCase {
                parent_names,
                test_name,
                status,
                duration,
                error,
            } => {
                with_group_mut(&mut self.run.root, &parent_names, false, |g| {
                    g.upsert_test_case(TestCase::new(test_name, status, duration, error));
                });
            }
            Event::GroupOutput {
                parent_names,
                group_name,
                stream,
                chunk,
            } => {
                let path = append(&parent_names, &group_name);
                with_group_mut(&mut self.run.root, &path, false, |g| match stream {
                    Stream::Stdout => g.stdout.append(&chunk),
                    Stream::Stderr => g.stderr.append(&chunk),
                });
            }
            Event::RunnerOutputChunk { .. } => {
                // Ambient output with no group attribution: the orchestrator's
                // tee already wrote it verbatim to the run's output.log
                // (spec.md §4.5). The tree doesn't need to hold a copy.
            }
            Event::CollectionStart => {
                self.run.collection_started = true;
            }
            Event::CollectionComplete { total_count } => {
                self.run.collection_total = total_count;
            }
            Event::Fatal { message } => {
                self.run.status = RunStatus::Errored;
                self.run.fatal_message = Some(message);
            }
        }
    }

    /// Records a run-level anomaly (malformed IPC line, unparseable stdout
    /// line) without touching the tree.
    pub fn record_warning(&mut self, warning: impl Into<String>) {
        self.run.warnings.push(warning.into());
    }

    /// Navigates to a group by its original (pre-sanitization) name
    /// sequence, without creating anything.
    pub fn group_by_path(&self, names: &[String]) -> Option<&Group> {
        let mut current = &self.run.root;
        for name in names {
            current = current.children.get(name)?;
        }
        Some(current)
    }

    /// Finalizes the run: any group still RUNNING becomes ERROR, totals
    /// are rolled up, and the run's own terminal status is set (spec.md
    /// §4.6 step 10).
    pub fn finalize(&mut self, at: DateTime<Utc>, child_exit_code: Option<i32>, interrupted: bool) {
        self.run.root.finalize(at);
        self.run.end_time = Some(at);
        self.run.child_exit_code = child_exit_code;
        if self.run.status != RunStatus::Errored {
            self.run.status = if interrupted {
                RunStatus::Interrupted
            } else {
                RunStatus::Complete
            };
        }
    }

    /// An immutable snapshot sufficient for rendering. The model is small
    /// enough (a tree plus bounded buffers) that a deep clone is cheap
    /// relative to the I/O the renderer is about to do.
    pub fn snapshot(&self) -> Run {
        self.run.clone()
    }

    pub fn run(&self) -> &Run {
        &self.run
    }
}

fn append(parent_names: &[String], name: &str) -> Vec<String> {
    let mut path = parent_names.to_vec();
    path.push(name.to_string());
    path
}

/// Navigates from `root` along `path`, just-in-time-creating any missing
/// group at each level, then invokes `f` on the group at the end of the
/// path. Every group visited along the way has its rolled-up status
/// recomputed on the way back up, so a single call keeps every ancestor's
/// status consistent (spec.md §4.4: "recompute a group's status when any
/// of its direct children changes").
///
/// When `discover_leaf` is true, the *last* segment is created (if
/// missing) via [`Group::discover_child`] (PENDING) rather than the
/// just-in-time path (RUNNING) — used for an explicit `groupDiscovered`
/// event.
fn with_group_mut(
    root: &mut group::Group,
    path: &[String],
    discover_leaf: bool,
    f: impl FnOnce(&mut group::Group),
) {
    match path.split_first() {
        None => f(root),
        Some((head, rest)) => {
            if rest.is_empty() && discover_leaf {
                root.discover_child(head);
            }
            let child = root.child_mut(head);
            with_group_mut(child, rest, discover_leaf, f);
        }
    }
    root.recompute_status();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RunId;

    fn model() -> Model {
        Model::new(
            RunId::generate(Utc::now()),
            vec!["npm".into(), "test".into()],
            vec!["npm".into(), "test".into()],
            "jest".into(),
            Utc::now(),
        )
    }

    #[test]
    fn apply_test_case_creates_parent_group_jit() {
        let mut m = model();
        m.apply_event(
            Event::TestCase {
                parent_names: vec!["math.test.js".into()],
                test_name: "adds".into(),
                status: TestCaseStatus::Pass,
                duration: None,
                error: None,
            },
            Utc::now(),
        );
        let g = m.group_by_path(&["math.test.js".into()]).unwrap();
        assert_eq!(g.status, GroupStatus::Pass);
        assert_eq!(g.test_cases.len(), 1);
    }

    #[test]
    fn nested_groups_roll_up_through_the_whole_chain() {
        let mut m = model();
        let parents = vec!["suite.test.js".into(), "describe block".into()];
        m.apply_event(
            Event::TestCase {
                parent_names: parents.clone(),
                test_name: "fails".into(),
                status: TestCaseStatus::Fail,
                duration: None,
                error: Some(ErrorPayload {
                    message: "boom".into(),
                    stack: None,
                }),
            },
            Utc::now(),
        );
        let file = m.group_by_path(&["suite.test.js".into()]).unwrap();
        assert_eq!(file.status, GroupStatus::Fail);
        let describe = m
            .group_by_path(&["suite.test.js".into(), "describe block".into()])
            .unwrap();
        assert_eq!(describe.status, GroupStatus::Fail);
    }

    #[test]
    fn fifty_files_interleaved_have_correct_totals() {
        let mut m = model();
        for i in 0..50 {
            let file = format!("file{i}.test.js");
            m.apply_event(
                Event::GroupDiscovered {
                    parent_names: vec![],
                    group_name: file.clone(),
                },
                Utc::now(),
            );
        }
        // Interleave test-case events out of file order, as parallel
        // workers would.
        for i in (0..50).rev() {
            let file = format!("file{i}.test.js");
            m.apply_event(
                Event::TestCase {
                    parent_names: vec![file],
                    test_name: "t".into(),
                    status: TestCaseStatus::Pass,
                    duration: None,
                    error: None,
                },
                Utc::now(),
            );
        }
        assert_eq!(m.run().root.children.len(), 50);
        let totals = m.run().root.totals();
        assert_eq!(totals.pass, 50);
    }

    #[test]
    fn finalize_marks_unterminated_groups_errored_and_interrupted_run() {
        let mut m = model();
        m.apply_event(
            Event::GroupStart {
                parent_names: vec![],
                group_name: "slow.test.js".into(),
            },
            Utc::now(),
        );
        m.finalize(Utc::now(), None, true);
        let g = m.group_by_path(&["slow.test.js".into()]).unwrap();
        assert_eq!(g.status, GroupStatus::Error);
        assert_eq!(m.run().status, RunStatus::Interrupted);
    }

    #[test]
    fn malformed_ipc_line_is_recorded_as_warning_not_dropped_silently() {
        let mut m = model();
        m.record_warning("malformed IPC line at offset 128");
        assert_eq!(m.run().warnings.len(), 1);
    }
}
