// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run identifiers: `{UTC-timestamp}-{memorable-slug}` (spec.md §3).

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;

/// A short wordlist used to build the memorable part of a run ID. Kept
/// small and boring on purpose: the ID only needs to be easy to say out
/// loud and to type, not to be a mnemonic of anything.
const WORDLIST: &[&str] = &[
    "amber", "birch", "cedar", "delta", "ember", "falcon", "glacier", "harbor", "ivory", "jasper",
    "kelp", "lumen", "maple", "nectar", "onyx", "pebble", "quartz", "raven", "sable", "thicket",
    "umber", "violet", "willow", "yarrow", "zephyr", "acorn", "basalt", "coral", "dune", "fern",
    "granite", "heron", "indigo", "juniper", "keystone", "lichen", "moss", "nimbus", "opal",
    "pewter", "quill", "ridge", "slate", "tundra", "urchin", "vapor", "wren", "xenon", "yucca",
    "zinc",
];

/// A unique run identifier, stable for the lifetime of the run and used as
/// the run directory name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RunId(String);

impl RunId {
    /// Generates a new run ID from the given timestamp, drawing two random
    /// words from [`WORDLIST`].
    pub fn generate(now: DateTime<Utc>) -> Self {
        let mut rng = rand::thread_rng();
        let words: Vec<&str> = WORDLIST
            .choose_multiple(&mut rng, 2)
            .copied()
            .collect();
        Self::from_parts(now, &words[0], &words[1])
    }

    fn from_parts(now: DateTime<Utc>, first: &str, second: &str) -> Self {
        let stamp = now.format("%Y%m%dT%H%M%S");
        Self(format!("{stamp}-{first}-{second}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validates a run ID against the shape documented in spec.md §6:
/// `^[0-9]{8}T[0-9]{6}-[a-z]+-[a-z]+$`.
pub fn is_valid_run_id(s: &str) -> bool {
    let Some((stamp, rest)) = s.split_once('-') else {
        return false;
    };
    let Some((first, second)) = rest.split_once('-') else {
        return false;
    };

    let stamp_ok = stamp.len() == 15
        && stamp.as_bytes()[8] == b'T'
        && stamp[..8].bytes().all(|b| b.is_ascii_digit())
        && stamp[9..].bytes().all(|b| b.is_ascii_digit());
    let word_ok = |w: &str| !w.is_empty() && w.bytes().all(|b| b.is_ascii_lowercase());

    stamp_ok && word_ok(first) && word_ok(second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn generated_id_is_valid() {
        let now = Utc.with_ymd_and_hms(2026, 7, 31, 12, 0, 0).unwrap();
        let id = RunId::generate(now);
        assert!(is_valid_run_id(id.as_str()), "{}", id.as_str());
        assert!(id.as_str().starts_with("20260731T120000-"));
    }

    #[test]
    fn from_parts_matches_expected_shape() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let id = RunId::from_parts(now, "amber", "birch");
        assert_eq!(id.as_str(), "20240102T030405-amber-birch");
        assert!(is_valid_run_id(id.as_str()));
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(!is_valid_run_id("not-a-run-id"));
        assert!(!is_valid_run_id("20240102-amber-birch"));
        assert!(!is_valid_run_id("20240102T030405-Amber-birch"));
        assert!(!is_valid_run_id("20240102T030405-amber"));
    }
}
