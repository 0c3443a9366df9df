use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::{FileSystemError, FileSystemResult};

/// Lists the regular files directly inside `dir` whose file name matches `pattern`.
///
/// The pattern is a glob (for example `*.xml`) applied to the file name only, not to
/// the full path. Subdirectories are not descended into. Results are sorted by file
/// name so repeated runs visit files in the same order.
///
/// # Errors
///
/// * [`FileSystemError::NotADirectory`] if `dir` exists but is not a directory.
/// * [`FileSystemError::Directory`] if `dir` cannot be read.
///
/// # Example
///
/// ```no_run
/// use boostfeed_utils::fs::matching_files;
///
/// let dumps = matching_files("/srv/feeds/dumps", "*.xml").unwrap();
/// for dump in dumps {
///     println!("{}", dump.display());
/// }
/// ```
pub fn matching_files<P: AsRef<Path>>(dir: P, pattern: &str) -> FileSystemResult<Vec<PathBuf>> {
    let dir = dir.as_ref();

    if dir.exists() && !dir.is_dir() {
        return Err(FileSystemError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let entries = fs::read_dir(dir).map_err(|err| {
        FileSystemError::Directory {
            path: dir.to_path_buf(),
            action: "read",
            source: err,
        }
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| {
            FileSystemError::Directory {
                path: dir.to_path_buf(),
                action: "read entry in",
                source: err,
            }
        })?;

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let name = entry.file_name();
        if fast_glob::glob_match(pattern, name.to_string_lossy().as_ref()) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Writes `contents` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// * [`FileSystemError::Directory`] if a parent directory could not be created.
/// * [`FileSystemError::File`] if the file could not be written.
pub fn write_file<P: AsRef<Path>>(path: P, contents: &[u8]) -> FileSystemResult<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|err| {
                FileSystemError::Directory {
                    path: parent.to_path_buf(),
                    action: "create",
                    source: err,
                }
            })?;
        }
    }

    fs::write(path, contents).map_err(|err| {
        FileSystemError::File {
            path: path.to_path_buf(),
            action: "write",
            source: err,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_matching_files_filters_by_pattern() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.xml"), "<b/>").unwrap();
        fs::write(dir.path().join("a.xml"), "<a/>").unwrap();
        fs::write(dir.path().join("notes.txt"), "skip").unwrap();
        fs::create_dir(dir.path().join("nested.xml")).unwrap();

        let files = matching_files(dir.path(), "*.xml").unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.xml"), dir.path().join("b.xml")]
        );
    }

    #[test]
    fn test_matching_files_empty_dir() {
        let dir = tempdir().unwrap();
        let files = matching_files(dir.path(), "*.xml").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_matching_files_missing_dir() {
        let dir = tempdir().unwrap();
        let result = matching_files(dir.path().join("missing"), "*.xml");
        assert!(matches!(result, Err(FileSystemError::Directory { .. })));
    }

    #[test]
    fn test_matching_files_not_a_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file.xml");
        fs::write(&file, "<x/>").unwrap();

        let result = matching_files(&file, "*.xml");
        assert!(matches!(result, Err(FileSystemError::NotADirectory { .. })));
    }

    #[test]
    fn test_write_file_creates_parents() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("feeds/boost/foo-dev.xml");

        write_file(&target, b"<interface/>").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "<interface/>");
    }
}
