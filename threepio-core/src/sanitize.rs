// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic mapping from free-form group names to filesystem-safe path
//! segments, with collision disambiguation (spec.md §3).

use std::collections::HashMap;

const MAX_SEGMENT_LEN: usize = 80;

/// Sanitizes a single group name into a filesystem-safe path segment:
/// lowercase ASCII alphanumerics, `_`, `-`; every other run of characters
/// collapses to a single `_`; the result is length-capped.
///
/// This alone does not guarantee uniqueness across distinct original names
/// that happen to collapse to the same segment — see [`SegmentAllocator`]
/// for the disambiguation layer the renderer actually uses.
pub fn sanitize_segment(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_collapsed = false;
    for ch in name.chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() || lower == '_' || lower == '-' {
            out.push(lower);
            last_was_collapsed = false;
        } else if !last_was_collapsed {
            out.push('_');
            last_was_collapsed = true;
        }
    }
    let trimmed = out.trim_matches('_');
    let mut result = if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    };
    if result.len() > MAX_SEGMENT_LEN {
        result.truncate(MAX_SEGMENT_LEN);
        let trimmed_again = result.trim_end_matches('_');
        if !trimmed_again.is_empty() {
            result = trimmed_again.to_string();
        }
    }
    result
}

/// A short, stable hash of a string, used to disambiguate sanitized
/// segments that collide. Not cryptographic; only needs to be stable
/// within a run and cheap.
fn short_hash(input: &str) -> String {
    // FNV-1a, 64-bit, truncated to 8 hex chars. Deterministic across
    // platforms and Rust versions, unlike `DefaultHasher`.
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in input.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    format!("{:08x}", (hash & 0xffff_ffff) as u32)
}

/// Allocates on-disk segment names for original group names within a single
/// parent directory, ensuring no two distinct original names collide.
///
/// Identity in the report model is keyed by the *original* name sequence
/// (spec.md §3: "Identity: an ordered sequence of names from root to
/// self"); this allocator only concerns itself with the derived, on-disk
/// segment for one level of that sequence at a time. One allocator exists
/// per parent directory.
#[derive(Debug, Default)]
pub struct SegmentAllocator {
    /// original name -> allocated segment, so repeated discovery of the same
    /// group is idempotent (spec.md invariant: "identity is stable once
    /// created").
    assigned: HashMap<String, String>,
    /// segment -> original name that currently owns it, to detect a new
    /// collision.
    owners: HashMap<String, String>,
}

impl SegmentAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stable on-disk segment for `original_name`, allocating
    /// one on first use. A name that sanitizes to the same segment as an
    /// already-assigned *different* name gets a short hash suffix appended.
    pub fn segment_for(&mut self, original_name: &str) -> String {
        if let Some(existing) = self.assigned.get(original_name) {
            return existing.clone();
        }

        let base = sanitize_segment(original_name);
        let segment = match self.owners.get(&base) {
            None => base,
            Some(_) => format!("{base}_{}", short_hash(original_name)),
        };

        self.owners.insert(segment.clone(), original_name.to_string());
        self.assigned
            .insert(original_name.to_string(), segment.clone());
        segment
    }
}
