// Copyright (c) The 3pio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8Path;
use std::io;

/// Writes `contents` to `path` by first writing to a temporary sibling
/// file, then renaming it over `path`. A reader opening `path` at any
/// point during this call sees either the previous complete contents or
/// the new complete contents — never a torn write (spec.md §4.5).
pub fn write_atomic(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    std::fs::create_dir_all(parent)?;

    let file_name = path.file_name().unwrap_or("output");
    let tmp_path = parent.join(format!(".{file_name}.tmp-{}", std::process::id()));

    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    fn tmp_dir(tag: &str) -> Utf8PathBuf {
        let dir = std::env::temp_dir().join(format!("threepio-atomic-test-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        Utf8PathBuf::from_path_buf(dir).unwrap()
    }

    #[test]
    fn writes_and_overwrites_target() {
        let dir = tmp_dir("a");
        let path = dir.join("out.txt");
        write_atomic(&path, b"first").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");
        write_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn no_leftover_temp_file() {
        let dir = tmp_dir("b");
        let path = dir.join("out.txt");
        write_atomic(&path, b"data").unwrap();
        let leftovers: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tmp_dir("c");
        let path = dir.join("nested").join("deep").join("out.txt");
        write_atomic(&path, b"data").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "data");
    }
}
