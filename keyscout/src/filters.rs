/// File discovery for a scan.
///
/// Only the direct children of the root directory are considered. A file joins the
/// file set when its extension is one of the configured text extensions and it does
/// not match any ignore pattern. The resulting list is sorted by path so that the same
/// directory always yields the same ordered file set, which keeps chunk boundaries
/// reproducible between runs.
use glob::Pattern;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{SearchError, SearchResult};

/// Checks if a file has one of the given extensions (case-insensitive)
pub fn has_valid_extension(path: &Path, extensions: &[String]) -> bool {
    if let Some(ext) = path.extension() {
        if let Some(ext_str) = ext.to_str() {
            return extensions.iter().any(|e| e.eq_ignore_ascii_case(ext_str));
        }
    }
    false
}

/// Checks if a file should be ignored based on ignore patterns
pub fn should_ignore(path: &Path, ignore_patterns: &[String]) -> bool {
    let path_str = path.to_string_lossy();
    let normalized_path = path_str.replace('\\', "/");

    ignore_patterns.iter().any(|pattern| {
        if let Ok(p) = Pattern::new(pattern) {
            p.matches(&normalized_path)
        } else {
            false
        }
    })
}

/// Determines if a file belongs to the file set
pub fn should_include_file(path: &Path, extensions: &[String], ignore_patterns: &[String]) -> bool {
    has_valid_extension(path, extensions) && !should_ignore(path, ignore_patterns)
}

/// Lists the text files directly inside `directory`.
///
/// Returns `DirectoryNotFound` when `directory` is missing or is not a directory.
/// An empty list is not an error here; callers decide how to report it.
pub fn list_text_files(
    directory: &Path,
    extensions: &[String],
    ignore_patterns: &[String],
) -> SearchResult<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(SearchError::directory_not_found(directory));
    }

    let mut walker = WalkBuilder::new(directory);
    walker.standard_filters(false).max_depth(Some(1));

    let mut files: Vec<PathBuf> = walker
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.depth() == 1)
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter(|entry| should_include_file(entry.path(), extensions, ignore_patterns))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();

    debug!(
        "Found {} text files in {}",
        files.len(),
        directory.display()
    );
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn txt() -> Vec<String> {
        vec!["txt".to_string()]
    }

    #[test]
    fn test_has_valid_extension() {
        let extensions = txt();
        assert!(has_valid_extension(Path::new("notes.txt"), &extensions));
        assert!(has_valid_extension(Path::new("NOTES.TXT"), &extensions));
        assert!(!has_valid_extension(Path::new("notes.md"), &extensions));
        assert!(!has_valid_extension(Path::new("notes"), &extensions));
        assert!(!has_valid_extension(Path::new("notes.txt.bak"), &extensions));
    }

    #[test]
    fn test_should_ignore() {
        let ignore_patterns = vec!["**/draft_*.txt".to_string(), "**/*.tmp".to_string()];

        assert!(should_ignore(Path::new("dir/draft_1.txt"), &ignore_patterns));
        assert!(should_ignore(Path::new("dir/scratch.tmp"), &ignore_patterns));
        assert!(!should_ignore(Path::new("dir/final.txt"), &ignore_patterns));
        assert!(!should_ignore(Path::new("dir/final.txt"), &[]));
    }

    #[test]
    fn test_list_text_files_is_flat_and_sorted() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("c.md"), "c").unwrap();
        fs::write(dir.path().join(".hidden.txt"), "h").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("deep.txt"), "d").unwrap();
        fs::create_dir(dir.path().join("folder.txt")).unwrap();

        let files = list_text_files(dir.path(), &txt(), &[]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![".hidden.txt", "a.txt", "b.txt"]);
    }

    #[test]
    fn test_list_text_files_honours_ignore_patterns() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("keep.txt"), "k").unwrap();
        fs::write(dir.path().join("draft_1.txt"), "d").unwrap();

        let files = list_text_files(dir.path(), &txt(), &["**/draft_*".to_string()]).unwrap();
        assert_eq!(files, vec![dir.path().join("keep.txt")]);
    }

    #[test]
    fn test_list_text_files_missing_directory() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = list_text_files(&missing, &txt(), &[]).unwrap_err();
        assert!(matches!(err, SearchError::DirectoryNotFound(_)));

        let file = dir.path().join("plain.txt");
        fs::write(&file, "x").unwrap();
        let err = list_text_files(&file, &txt(), &[]).unwrap_err();
        assert!(matches!(err, SearchError::DirectoryNotFound(_)));
    }

    #[test]
    fn test_list_text_files_empty_directory() {
        let dir = tempdir().unwrap();
        assert!(list_text_files(dir.path(), &txt(), &[]).unwrap().is_empty());
    }
}
