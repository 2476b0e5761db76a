// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Materializes embedded adapter sources with the IPC path baked in
//! (spec.md §4.3).

use super::sources::{AdapterKind, SentinelStyle};
use crate::errors::AdapterStageError;
use camino::{Utf8Path, Utf8PathBuf};

/// Stages `kind`'s embedded adapter source into `adapters_dir`, with its
/// IPC-path sentinel replaced by `ipc_path`. Returns the path to the
/// staged file.
pub fn stage_adapter(
    kind: AdapterKind,
    adapters_dir: &Utf8Path,
    ipc_path: &Utf8Path,
) -> Result<Utf8PathBuf, AdapterStageError> {
    let source = kind.source();
    let substituted = substitute_sentinel(source, kind.sentinel_style(), ipc_path.as_str())
        .map_err(|_| AdapterStageError::SentinelRemaining {
            adapter: kind.staged_file_name().to_string(),
            sentinel: kind.sentinel_style().marker().to_string(),
        })?;

    // A silent no-op must be impossible: if the marker text is still
    // present anywhere in the staged output, refuse to hand it to the
    // child process.
    if substituted.contains(kind.sentinel_style().marker()) {
        return Err(AdapterStageError::SentinelRemaining {
            adapter: kind.staged_file_name().to_string(),
            sentinel: kind.sentinel_style().marker().to_string(),
        });
    }

    std::fs::create_dir_all(adapters_dir).map_err(|source| AdapterStageError::Io {
        path: adapters_dir.to_path_buf(),
        source,
    })?;

    let staged_path = adapters_dir.join(kind.staged_file_name());
    std::fs::write(&staged_path, substituted).map_err(|source| AdapterStageError::Io {
        path: staged_path.clone(),
        source,
    })?;

    Ok(staged_path)
}

/// Replaces every `marker ... marker` span in `source` with a quoted,
/// escaped string literal holding `ipc_path`. Returns `Err(())` if no
/// sentinel pair was found at all (nothing to substitute is itself a
/// staging bug, not a silent success).
fn substitute_sentinel(source: &str, style: SentinelStyle, ipc_path: &str) -> Result<String, ()> {
    let marker = style.marker();
    let literal = quote_for_host(ipc_path);

    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    let mut substitutions = 0;

    while let Some(open_idx) = rest.find(marker) {
        let after_open = &rest[open_idx + marker.len()..];
        let Some(close_rel) = after_open.find(marker) else {
            // Unbalanced marker: copy through verbatim and stop, so the
            // post-substitution `contains(marker)` check in the caller
            // catches it.
            out.push_str(rest);
            return Ok(out);
        };
        out.push_str(&rest[..open_idx]);
        out.push_str(&literal);
        rest = &after_open[close_rel + marker.len()..];
        substitutions += 1;
    }
    out.push_str(rest);

    if substitutions == 0 {
        Err(())
    } else {
        Ok(out)
    }
}

/// Escapes a path for embedding as a double-quoted string literal in both
/// JS-like and Python source (the two host syntaxes this crate embeds).
/// Backslashes and double quotes are escaped; everything else, including
/// non-ASCII characters, passes through unchanged since both languages
/// accept UTF-8 source directly in string literals.
fn quote_for_host(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len() + 2);
    escaped.push('"');
    for ch in path.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            _ => escaped.push(ch),
        }
    }
    escaped.push('"');
    escaped
}
