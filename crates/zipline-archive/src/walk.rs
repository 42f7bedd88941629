//! Extraction-tree enumeration.

use std::path::Path;

use walkdir::WalkDir;

use crate::error::ArchiveResult;

/// Walks an extraction root recursively and collects every regular file's
/// path relative to that root, rendered with `/` separators.
///
/// Traversal is sorted by file name at each level, so the order is
/// deterministic for a given tree.
pub fn collect_entries(root: &Path) -> ArchiveResult<Vec<String>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;

        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");

        entries.push(relative);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_files_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), b"b").unwrap();

        let entries = collect_entries(dir.path()).unwrap();

        assert_eq!(entries, vec!["a.txt".to_string(), "sub/b.txt".to_string()]);
    }

    #[test]
    fn skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("only/dirs/here")).unwrap();

        let entries = collect_entries(dir.path()).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn order_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.txt", "a.txt", "b.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let first = collect_entries(dir.path()).unwrap();
        let second = collect_entries(dir.path()).unwrap();

        assert_eq!(first, vec!["a.txt", "b.txt", "c.txt"]);
        assert_eq!(first, second);
    }
}
