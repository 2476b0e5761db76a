// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Group/run status and the status algebra (spec.md §3, §4.4).

use serde::{Deserialize, Serialize};

/// The status of a [`Group`](super::group::Group).
///
/// Ordered by severity: `PASS < SKIP < ERROR < FAIL`, matching the
/// roll-up rule in spec.md §4.4 ("PASS ⊕ PASS = PASS; anything ⊕ FAIL =
/// FAIL; ... ERROR is terminal and overrides PASS/SKIP but is overridden by
/// FAIL in the aggregate").
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum GroupStatus {
    Pending,
    Running,
    Pass,
    Skip,
    Error,
    Fail,
    /// Stands only when a group has zero test cases and zero
    /// non-`NoTests` children.
    NoTests,
}

impl GroupStatus {
    /// Severity rank used to implement the roll-up and the "later wins"
    /// override rule. Higher is more severe.
    fn severity(self) -> u8 {
        match self {
            GroupStatus::Pending => 0,
            GroupStatus::Running => 0,
            GroupStatus::NoTests => 1,
            GroupStatus::Pass => 2,
            GroupStatus::Skip => 3,
            GroupStatus::Error => 4,
            GroupStatus::Fail => 5,
        }
    }

    /// Combines this status with a sibling's under the spec.md §4.4
    /// algebra. Used to fold a group's children into the group's own
    /// rolled-up status.
    pub fn combine(self, other: GroupStatus) -> GroupStatus {
        use GroupStatus::*;
        match (self, other) {
            (Fail, _) | (_, Fail) => Fail,
            (Error, _) | (_, Error) => Error,
            (Skip, Pass) | (Pass, Skip) => Pass,
            (Pass, Pass) => Pass,
            (Skip, Skip) => Skip,
            (NoTests, NoTests) => NoTests,
            (NoTests, other) | (other, NoTests) => other,
            (Pending, other) | (other, Pending) => other,
            (Running, other) | (other, Running) => other,
        }
    }

    /// Folds an iterator of child statuses into a single rolled-up status,
    /// per spec.md: "NO_TESTS only stands when a group has zero test cases
    /// and zero non-NO_TESTS children."
    pub fn rollup<I: IntoIterator<Item = GroupStatus>>(children: I) -> GroupStatus {
        children
            .into_iter()
            .fold(GroupStatus::NoTests, GroupStatus::combine)
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, GroupStatus::Pending | GroupStatus::Running)
    }

    /// "Later wins" override used when the same identity is re-emitted
    /// (spec.md §4.4). Unlike `combine`, this does not merge severities —
    /// the newer explicit result simply replaces the old one unless the
    /// new one is non-terminal, in which case the existing terminal status
    /// is kept (an explicit PASS should not be clobbered by a late,
    /// stale RUNNING re-announcement).
    pub fn later_wins(self, new: GroupStatus) -> GroupStatus {
        if new.is_terminal() || !self.is_terminal() {
            new
        } else {
            self
        }
    }
}

impl std::fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GroupStatus::Pending => "PENDING",
            GroupStatus::Running => "RUNNING",
            GroupStatus::Pass => "PASS",
            GroupStatus::Fail => "FAIL",
            GroupStatus::Skip => "SKIP",
            GroupStatus::Error => "ERROR",
            GroupStatus::NoTests => "NO_TESTS",
        };
        f.write_str(s)
    }
}

/// The status of an individual [`TestCase`](super::test_case::TestCase).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TestCaseStatus {
    Pass,
    Fail,
    Skip,
    /// A `TODO`-style marker the source runner treats as a non-failing,
    /// non-fully-run state; rolled up as SKIP.
    TodoTreatedAsSkip,
}

impl TestCaseStatus {
    /// How this test case status contributes to its enclosing group's
    /// rolled-up [`GroupStatus`].
    pub fn as_group_status(self) -> GroupStatus {
        match self {
            TestCaseStatus::Pass => GroupStatus::Pass,
            TestCaseStatus::Fail => GroupStatus::Fail,
            TestCaseStatus::Skip | TestCaseStatus::TodoTreatedAsSkip => GroupStatus::Skip,
        }
    }
}

impl std::fmt::Display for TestCaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TestCaseStatus::Pass => "PASS",
            TestCaseStatus::Fail => "FAIL",
            TestCaseStatus::Skip => "SKIP",
            TestCaseStatus::TodoTreatedAsSkip => "SKIP (todo)",
        };
        f.write_str(s)
    }
}

/// The run's own terminal status, independent of any one group.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Complete,
    Errored,
    Interrupted,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Running => "RUNNING",
            RunStatus::Complete => "COMPLETE",
            RunStatus::Errored => "ERRORED",
            RunStatus::Interrupted => "INTERRUPTED",
        };
        f.write_str(s)
    }
}
