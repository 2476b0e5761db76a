// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Kill-on-drop wrapper around the spawned child (spec.md §4.6 "Signal
//! handling"). The orchestrator's own shutdown path kills the child
//! explicitly; this guard exists so a panic or early return never leaves
//! an orphaned test process running.

use tokio::process::Child;

pub struct ChildGuard {
    child: Option<Child>,
}

impl ChildGuard {
    pub fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    pub fn inner_mut(&mut self) -> &mut Child {
        self.child.as_mut().expect("ChildGuard used after take")
    }

    /// Releases the child from the guard without killing it, for the
    /// ordinary exit path where the orchestrator has already waited on it.
    pub fn disarm(&mut self) {
        self.child = None;
    }

    /// Sends `signal` to the child's process group.
    #[cfg(unix)]
    pub fn signal_group(&self, signal: libc::c_int) {
        if let Some(pid) = self.child.as_ref().and_then(|c| c.id()) {
            unsafe {
                libc::kill(-(pid as libc::pid_t), signal);
            }
        }
    }

    /// Windows has no process-group signal delivery; Ctrl-C already
    /// propagates to the child's own console process group by default, so
    /// there's nothing to forward here. The grace-period timer still
    /// escalates to [`ChildGuard::kill`] if the child doesn't exit in time.
    #[cfg(windows)]
    pub fn signal_group(&self, _signal: i32) {}

    pub async fn kill(&mut self) {
        if let Some(child) = &mut self.child {
            let _ = child.kill().await;
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(child) = &mut self.child {
            #[cfg(unix)]
            if let Some(pid) = child.id() {
                unsafe {
                    libc::kill(-(pid as libc::pid_t), libc::SIGKILL);
                }
            }
            #[cfg(windows)]
            let _ = child.start_kill();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Stdio;
    use std::time::Duration;
    use tokio::process::Command;

    fn spawn_sleeper(seconds: u64) -> Child {
        Command::new("sh")
            .arg("-c")
            .arg(format!("sleep {seconds}"))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("sh must be on PATH")
    }

    #[tokio::test]
    async fn drop_without_disarm_kills_the_child() {
        let mut child = spawn_sleeper(30);
        let pid = child.id().expect("child has a pid") as libc::pid_t;

        {
            let _guard = ChildGuard::new(child);
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        // Signal 0 probes for existence without actually sending anything;
        // ESRCH means the process is gone.
        let probe = unsafe { libc::kill(pid, 0) };
        assert_eq!(probe, -1, "child should have been killed on drop");
    }

    #[tokio::test]
    async fn disarm_leaves_the_child_running() {
        let mut child = spawn_sleeper(30);
        let pid = child.id().expect("child has a pid") as libc::pid_t;

        {
            let mut guard = ChildGuard::new(child);
            guard.disarm();
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        let probe = unsafe { libc::kill(pid, 0) };
        assert_eq!(probe, 0, "disarmed guard must not kill the child");

        // Clean up: reap the still-running process directly.
        unsafe {
            libc::kill(pid, libc::SIGKILL);
        }
        let mut status = 0i32;
        unsafe {
            libc::waitpid(pid, &mut status, 0);
        }
    }

    #[tokio::test]
    async fn kill_terminates_the_child() {
        let child = spawn_sleeper(30);
        let mut guard = ChildGuard::new(child);
        guard.kill().await;
        let status = guard.inner_mut().wait().await.expect("wait succeeds");
        assert!(!status.success());
        guard.disarm();
    }
}
