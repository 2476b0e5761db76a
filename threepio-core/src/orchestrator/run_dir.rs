// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::RunDirSetupError;
use camino::Utf8Path;

/// Creates the run directory and its fixed subdirectories (spec.md §4.6
/// step 2): `reports/`, `adapters/`, `ipc/`, `logs/`. `output.log` and
/// `test-run.md` are plain files written directly into `run_dir` by the
/// renderer.
pub fn prepare(run_dir: &Utf8Path) -> Result<(), RunDirSetupError> {
    for sub in ["reports", "adapters", "ipc", "logs"] {
        let dir = run_dir.join(sub);
        std::fs::create_dir_all(&dir).map_err(|source| RunDirSetupError {
            path: dir,
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn creates_all_fixed_subdirectories() {
        let dir = std::env::temp_dir().join(format!("threepio-rundir-test-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let run_dir = Utf8PathBuf::from_path_buf(dir).unwrap();
        prepare(&run_dir).unwrap();
        assert!(run_dir.join("reports").is_dir());
        assert!(run_dir.join("adapters").is_dir());
        assert!(run_dir.join("ipc").is_dir());
        assert!(run_dir.join("logs").is_dir());
    }
}
