// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gathers the on-disk hints the runner registry consults when `argv`
//! doesn't explicitly name a runner (spec.md §4.1).

use crate::runner_def::ManifestHints;
use camino::Utf8Path;
use serde_json::Value;

/// Reads whatever manifest files are present in `cwd` into [`ManifestHints`].
/// Best-effort: a manifest that doesn't parse is treated the same as one
/// that's absent, since detection degrades gracefully either way (if
/// `argv` names a runner explicitly, hints are never consulted at all).
pub fn gather_hints(cwd: &Utf8Path) -> ManifestHints {
    let package_json = cwd.join("package.json");
    let (has_package_json, package_json_test_script) = match std::fs::read_to_string(&package_json) {
        Ok(contents) => {
            let script = serde_json::from_str::<Value>(&contents)
                .ok()
                .and_then(|v| {
                    v.get("scripts")?
                        .get("test")?
                        .as_str()
                        .map(|s| s.to_string())
                });
            (true, script)
        }
        Err(_) => (false, None),
    };

    ManifestHints {
        has_package_json,
        package_json_test_script,
        has_pyproject_toml: cwd.join("pyproject.toml").is_file(),
        has_pytest_ini: cwd.join("pytest.ini").is_file(),
        has_cargo_toml: cwd.join("Cargo.toml").is_file(),
        has_nextest_config: cwd.join(".config").join("nextest.toml").is_file(),
    }
}
