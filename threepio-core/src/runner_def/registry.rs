// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    CargoNextestDefinition, CargoTestDefinition, GoTestDefinition, JestDefinition, ManifestHints,
    PytestDefinition, RunnerDefinition, VitestDefinition,
};
use crate::errors::RunnerDetectionError;

/// The ordered set of known runner definitions, and the detection rules
/// of spec.md §4.1.
pub struct Registry {
    definitions: Vec<Box<dyn RunnerDefinition>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            definitions: vec![
                // Cargo nextest is queried before plain `cargo test` so that
                // an explicit `cargo nextest run` is never mistaken for it
                // (nextest's argv always contains the literal `nextest`
                // subtoken, which `cargo test`'s matcher doesn't look for,
                // but keeping nextest first documents the precedence).
                Box::new(CargoNextestDefinition),
                Box::new(CargoTestDefinition),
                Box::new(GoTestDefinition),
                Box::new(JestDefinition),
                Box::new(VitestDefinition),
                Box::new(PytestDefinition),
            ],
        }
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `argv` (plus manifest hints gathered from the caller's
    /// working directory) to at most one runner definition.
    ///
    /// Explicit naming in `argv` always wins over manifest inference, and
    /// is checked across *all* definitions before any manifest-based match
    /// is considered — so `npm test` with a `package.json` configured for
    /// vitest still resolves to vitest even though jest is queried first.
    pub fn detect(
        &self,
        argv: &[String],
        hints: &ManifestHints,
    ) -> Result<&dyn RunnerDefinition, RunnerDetectionError> {
        if let Some(def) = self
            .definitions
            .iter()
            .find(|def| def.matches_explicit(argv))
        {
            return Ok(def.as_ref());
        }

        if let Some(def) = self
            .definitions
            .iter()
            .find(|def| def.matches_by_manifest(argv, hints))
        {
            return Ok(def.as_ref());
        }

        Err(RunnerDetectionError::new(
            argv.to_vec(),
            self.definitions.iter().map(|d| d.name().to_string()).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn explicit_runner_beats_manifest_evidence_for_a_different_runner() {
        let registry = Registry::new();
        let hints = ManifestHints {
            has_package_json: true,
            package_json_test_script: Some("jest".to_string()),
            ..Default::default()
        };
        // `npm test -- --run` doesn't name vitest explicitly via argv, but
        // direct invocation should still win when present elsewhere.
        let resolved = registry
            .detect(&argv(&["vitest", "run"]), &hints)
            .unwrap();
        assert_eq!(resolved.name(), "vitest");
    }

    #[test]
    fn manifest_only_match_when_nothing_named_explicitly() {
        let registry = Registry::new();
        let hints = ManifestHints {
            has_package_json: true,
            package_json_test_script: Some("jest --ci".to_string()),
            ..Default::default()
        };
        let resolved = registry.detect(&argv(&["npm", "test"]), &hints).unwrap();
        assert_eq!(resolved.name(), "jest");
    }

    #[test]
    fn no_match_is_a_detection_error() {
        let registry = Registry::new();
        let err = registry
            .detect(&argv(&["rake", "test"]), &ManifestHints::default())
            .unwrap_err();
        assert!(err.supported.contains(&"jest".to_string()));
    }

    #[test]
    fn package_manager_exec_names_runner_explicitly() {
        let registry = Registry::new();
        let resolved = registry
            .detect(&argv(&["npm", "exec", "jest"]), &ManifestHints::default())
            .unwrap();
        assert_eq!(resolved.name(), "jest");
    }
}
