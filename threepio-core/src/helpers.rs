// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Small shared helpers that don't belong to any one component.

/// Returns true if `argv` invokes `candidate` either directly (`argv[0]`
/// ends in `candidate`) or via a package-manager passthrough of the form
/// `<pkgmgr> exec|run|-m candidate ...`.
///
/// Used by runner definitions (§4.1) to decide whether a runner is named
/// *explicitly*, which takes priority over manifest-based inference.
pub fn argv_names_program(argv: &[String], candidate: &str) -> bool {
    argv.iter().any(|arg| {
        arg == candidate
            || arg
                .rsplit(['/', '\\'])
                .next()
                .is_some_and(|base| base == candidate)
    })
}

/// True if `argv[0]` is (a path to) one of the well-known JS package
/// managers that can re-dispatch to another binary.
pub fn is_package_manager_invocation(argv: &[String]) -> bool {
    const PKG_MANAGERS: &[&str] = &["npm", "pnpm", "yarn", "npx", "bunx", "bun"];
    argv.first()
        .and_then(|arg0| arg0.rsplit(['/', '\\']).next())
        .is_some_and(|base| PKG_MANAGERS.contains(&base))
}

/// Finds the index right after a `--` separator in `argv`, if present.
pub fn double_dash_index(argv: &[String]) -> Option<usize> {
    argv.iter().position(|a| a == "--").map(|idx| idx + 1)
}

/// Where to splice injected reporter flags for a JS package-manager
/// invocation (spec.md §4.1: "after a `--` separator for npm/pnpm; no
/// separator for yarn; direct append for npx and bare invocations").
/// Returns the splice index and whether a fresh `--` must be inserted
/// ahead of the flags.
pub fn js_insertion_point(argv: &[String]) -> (usize, bool) {
    if let Some(idx) = double_dash_index(argv) {
        return (idx, false);
    }
    let arg0 = argv
        .first()
        .and_then(|a| a.rsplit(['/', '\\']).next())
        .unwrap_or("");
    match arg0 {
        "npm" | "pnpm" => (argv.len(), true),
        _ => (argv.len(), false),
    }
}
