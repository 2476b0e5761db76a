// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `Group` aggregation entity (spec.md §3).

use super::buffer::OutputBuffer;
use super::status::{GroupStatus, TestCaseStatus};
use super::test_case::TestCase;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Why a group was first created, which determines its initial status per
/// spec.md §3: "events arriving before the parent trigger just-in-time
/// parent creation with status RUNNING", whereas an explicit
/// `groupDiscovered` leaves the group PENDING until it actually starts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CreationReason {
    Discovered,
    JustInTimeForChild,
}

/// A named, possibly-nested aggregation level: a file, describe block,
/// class, module, crate, or test binary — spec.md treats all of these
/// uniformly as `Group`.
#[derive(Clone, Debug)]
pub struct Group {
    /// The original (pre-sanitization) name, unique among siblings.
    pub name: String,
    pub status: GroupStatus,
    /// The terminal status from an explicit `groupResult`, if any. Kept
    /// separately from `status` so that a later child event can still
    /// affect the rolled-up `status` per spec.md's combine rule.
    explicit_status: Option<GroupStatus>,
    pub started: Option<DateTime<Utc>>,
    pub ended: Option<DateTime<Utc>>,
    /// Insertion-ordered by original name, per spec.md's "insertion-ordered
    /// map by original name".
    pub children: IndexMap<String, Group>,
    pub test_cases: Vec<TestCase>,
    test_case_index: HashMap<String, usize>,
    pub stdout: OutputBuffer,
    pub stderr: OutputBuffer,
    /// Non-fatal anomalies recorded against this group, e.g. a test-name
    /// collision resolved by "later wins" (spec.md §3, TestCase identity).
    pub warnings: Vec<String>,
}

impl Group {
    pub fn new(name: impl Into<String>, reason: CreationReason) -> Self {
        let status = match reason {
            CreationReason::Discovered => GroupStatus::Pending,
            CreationReason::JustInTimeForChild => GroupStatus::Running,
        };
        Self {
            name: name.into(),
            status,
            explicit_status: None,
            started: None,
            ended: None,
            children: IndexMap::new(),
            test_cases: Vec::new(),
            test_case_index: HashMap::new(),
            stdout: OutputBuffer::new(),
            stderr: OutputBuffer::new(),
            warnings: Vec::new(),
        }
    }

    pub fn mark_started(&mut self, at: DateTime<Utc>) {
        self.status = GroupStatus::Running;
        // "started <= first child's started": only take the earliest.
        self.started = Some(match self.started {
            Some(existing) => existing.min(at),
            None => at,
        });
    }

    pub fn mark_ended(&mut self, at: DateTime<Utc>) {
        // "ended >= last child's ended": only take the latest.
        self.ended = Some(match self.ended {
            Some(existing) => existing.max(at),
            None => at,
        });
    }

    /// Applies an explicit terminal result, "later wins" for status while
    /// preserving earliest `started` / latest `ended` (spec.md §4.4).
    pub fn apply_explicit_result(&mut self, status: GroupStatus, at: DateTime<Utc>) {
        self.explicit_status = Some(match self.explicit_status {
            Some(prev) => prev.later_wins(status),
            None => status,
        });
        self.mark_ended(at);
        if self.started.is_none() {
            self.started = Some(at);
        }
    }

    /// Adds (or, on a name collision, overrides with "later wins") a test
    /// case. Collisions are recorded as a warning, never silently dropped.
    pub fn upsert_test_case(&mut self, case: TestCase) {
        if let Some(&idx) = self.test_case_index.get(&case.name) {
            self.warnings.push(format!(
                "test case `{}` reported more than once in this group; later result wins",
                case.name
            ));
            self.test_cases[idx] = case;
        } else {
            self.test_case_index
                .insert(case.name.clone(), self.test_cases.len());
            self.test_cases.push(case);
        }
    }

    /// Gets the child with `name`, creating it just-in-time if absent.
    /// Returns whether the child was freshly created, so the caller can
    /// decide whether a "parent exists before any child event" JIT
    /// creation happened.
    pub fn child_mut(&mut self, name: &str) -> &mut Group {
        if !self.children.contains_key(name) {
            self.children.insert(
                name.to_string(),
                Group::new(name, CreationReason::JustInTimeForChild),
            );
        }
        self.children.get_mut(name).expect("just inserted")
    }

    /// Ensures a child exists from an explicit `groupDiscovered`,
    /// idempotently: re-discovery of an existing identity is a no-op.
    pub fn discover_child(&mut self, name: &str) {
        self.children
            .entry(name.to_string())
            .or_insert_with(|| Group::new(name, CreationReason::Discovered));
    }

    /// Recomputes this group's rolled-up status from its test cases and
    /// children, honoring an explicit result if one was ever applied
    /// (spec.md §8 invariant: status is always at least as severe as the
    /// max of its descendants).
    pub fn recompute_status(&mut self) {
        let rolled = GroupStatus::rollup(
            self.test_cases
                .iter()
                .map(|tc| tc.status.as_group_status())
                .chain(self.children.values().map(|c| c.status)),
        );
        self.status = match self.explicit_status {
            Some(explicit) => explicit.combine(rolled),
            None => match self.status {
                // While still PENDING/RUNNING and nothing has gone wrong
                // yet, keep reflecting the group's own lifecycle state
                // rather than jumping to a premature PASS/SKIP/NO_TESTS.
                // A bad rollup (FAIL/ERROR) is surfaced immediately so a
                // failure is visible before the group's own terminal event
                // arrives.
                GroupStatus::Pending | GroupStatus::Running
                    if !matches!(rolled, GroupStatus::Fail | GroupStatus::Error) =>
                {
                    self.status
                }
                _ => rolled,
            },
        };
    }

    /// Finalization step (spec.md §4.6 step 10): any group still RUNNING
    /// becomes ERROR; a group that was never started and has no test cases
    /// or children becomes NO_TESTS. Recurses depth-first so children
    /// finalize before their parents' status is recomputed, so a PENDING
    /// parent of an ERRORed child still inherits that severity through the
    /// ordinary rollup rather than being forced to ERROR itself.
    pub fn finalize(&mut self, at: DateTime<Utc>) {
        for child in self.children.values_mut() {
            child.finalize(at);
        }
        match self.status {
            GroupStatus::Running => {
                self.explicit_status = Some(GroupStatus::Error);
                self.mark_ended(at);
            }
            GroupStatus::Pending if self.test_cases.is_empty() && self.children.is_empty() => {
                self.explicit_status = Some(GroupStatus::NoTests);
            }
            _ => {}
        }
        self.recompute_status();
    }

    /// Total test-case counts by status, including all descendants.
    pub fn totals(&self) -> Totals {
        let mut totals = Totals::default();
        for tc in &self.test_cases {
            match tc.status {
                TestCaseStatus::Pass => totals.pass += 1,
                TestCaseStatus::Fail => totals.fail += 1,
                TestCaseStatus::Skip | TestCaseStatus::TodoTreatedAsSkip => totals.skip += 1,
            }
        }
        for child in self.children.values() {
            let child_totals = child.totals();
            totals.pass += child_totals.pass;
            totals.fail += child_totals.fail;
            totals.skip += child_totals.skip;
        }
        totals
    }
}

/// Aggregate test-case counts for a subtree.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Totals {
    pub pass: u64,
    pub fail: u64,
    pub skip: u64,
}

impl Totals {
    pub fn total(&self) -> u64 {
        self.pass + self.fail + self.skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::status::TestCaseStatus;

    #[test]
    fn jit_child_creation_is_running() {
        let mut root = Group::new("root", CreationReason::Discovered);
        let child = root.child_mut("file.test.js");
        assert_eq!(child.status, GroupStatus::Running);
    }

    #[test]
    fn explicit_discovery_is_pending() {
        let mut root = Group::new("root", CreationReason::Discovered);
        root.discover_child("file.test.js");
        assert_eq!(root.children["file.test.js"].status, GroupStatus::Pending);
    }

    #[test]
    fn rediscovery_is_idempotent() {
        let mut root = Group::new("root", CreationReason::Discovered);
        root.discover_child("a");
        root.children.get_mut("a").unwrap().mark_started(Utc::now());
        root.discover_child("a");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children["a"].status, GroupStatus::Running);
    }

    #[test]
    fn rollup_reflects_children_even_with_no_explicit_result() {
        let mut root = Group::new("root", CreationReason::Discovered);
        root.child_mut("a").upsert_test_case(TestCase::new(
            "t1".into(),
            TestCaseStatus::Fail,
            None,
            None,
        ));
        root.children.get_mut("a").unwrap().recompute_status();
        root.recompute_status();
        assert_eq!(root.status, GroupStatus::Fail);
    }

    #[test]
    fn explicit_result_is_clamped_by_worse_child() {
        let mut root = Group::new("root", CreationReason::Discovered);
        root.apply_explicit_result(GroupStatus::Pass, Utc::now());
        root.child_mut("a").upsert_test_case(TestCase::new(
            "t1".into(),
            TestCaseStatus::Fail,
            None,
            None,
        ));
        root.children.get_mut("a").unwrap().recompute_status();
        root.recompute_status();
        assert_eq!(root.status, GroupStatus::Fail);
    }

    #[test]
    fn later_test_case_wins_and_warns() {
        let mut g = Group::new("file", CreationReason::Discovered);
        g.upsert_test_case(TestCase::new("t".into(), TestCaseStatus::Fail, None, None));
        g.upsert_test_case(TestCase::new("t".into(), TestCaseStatus::Pass, None, None));
        assert_eq!(g.test_cases.len(), 1);
        assert_eq!(g.test_cases[0].status, TestCaseStatus::Pass);
        assert_eq!(g.warnings.len(), 1);
    }

    #[test]
    fn finalize_marks_running_groups_as_error() {
        let mut root = Group::new("root", CreationReason::Discovered);
        root.child_mut("a").mark_started(Utc::now());
        root.finalize(Utc::now());
        assert_eq!(root.children["a"].status, GroupStatus::Error);
    }

    #[test]
    fn finalize_marks_empty_groups_no_tests() {
        let mut root = Group::new("root", CreationReason::Discovered);
        root.discover_child("empty");
        root.finalize(Utc::now());
        assert_eq!(root.children["empty"].status, GroupStatus::NoTests);
    }
}
