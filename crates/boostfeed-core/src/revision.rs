use std::{path::Path, process::Command};

use tracing::debug;

use crate::{error::BoostfeedError, BoostfeedResult};

/// Resolves the commit a source checkout currently points at.
pub trait RevisionResolver {
    fn revision(&self, source_dir: &Path) -> BoostfeedResult<String>;
}

/// [`RevisionResolver`] that asks `git rev-parse HEAD`.
#[derive(Clone, Debug)]
pub struct GitRevision {
    program: String,
}

impl Default for GitRevision {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
        }
    }
}

impl GitRevision {
    /// Uses `program` instead of the `git` found on `PATH`.
    pub fn with_program<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl RevisionResolver for GitRevision {
    fn revision(&self, source_dir: &Path) -> BoostfeedResult<String> {
        let output = Command::new(&self.program)
            .args(["rev-parse", "HEAD"])
            .current_dir(source_dir)
            .output()
            .map_err(|source| {
                BoostfeedError::RevisionSpawn {
                    dir: source_dir.to_path_buf(),
                    source,
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BoostfeedError::Revision {
                dir: source_dir.to_path_buf(),
                reason: stderr.trim().to_string(),
            });
        }

        let revision = String::from_utf8_lossy(&output.stdout).trim().to_string();

        if revision.is_empty() {
            return Err(BoostfeedError::Revision {
                dir: source_dir.to_path_buf(),
                reason: "git returned no commit".to_string(),
            });
        }

        debug!("{} is at {}", source_dir.display(), revision);
        Ok(revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|out| out.status.success())
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap()
            .status;
        assert!(status.success(), "git {args:?} failed");
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempdir().unwrap();
        let result = GitRevision::default().revision(&dir.path().join("missing"));
        assert!(matches!(result, Err(BoostfeedError::RevisionSpawn { .. })));
    }

    #[test]
    fn test_missing_program() {
        let dir = tempdir().unwrap();
        let result =
            GitRevision::with_program("boostfeed-no-such-git").revision(dir.path());
        assert!(matches!(result, Err(BoostfeedError::RevisionSpawn { .. })));
    }

    #[test]
    fn test_not_a_repository() {
        if !git_available() {
            return;
        }
        let dir = tempdir().unwrap();
        let result = GitRevision::default().revision(dir.path());
        assert!(matches!(result, Err(BoostfeedError::Revision { .. })));
    }

    #[test]
    fn test_resolves_head() {
        if !git_available() {
            return;
        }
        let dir = tempdir().unwrap();
        git(dir.path(), &["init", "-q"]);
        git(
            dir.path(),
            &[
                "-c",
                "user.name=boostfeed",
                "-c",
                "user.email=boostfeed@example.com",
                "-c",
                "commit.gpgsign=false",
                "commit",
                "-q",
                "--allow-empty",
                "-m",
                "init",
            ],
        );

        let revision = GitRevision::default().revision(dir.path()).unwrap();
        assert_eq!(revision.len(), 40);
        assert!(revision.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
