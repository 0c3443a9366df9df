//! Error types for boostfeed-core.

use std::path::PathBuf;

use boostfeed_config::error::ConfigError;
use boostfeed_dl::error::DownloadError;
use boostfeed_registry::RegistryError;
use boostfeed_utils::error::{FileSystemError, PathError};
use miette::Diagnostic;
use thiserror::Error;

/// Error type for feed generation.
#[derive(Error, Diagnostic, Debug)]
pub enum BoostfeedError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    #[diagnostic(
        code(boostfeed::path),
        help("Every dump's source directory must live under the configured source root")
    )]
    Path(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(code(boostfeed::filesystem))]
    FileSystem(#[from] FileSystemError),

    #[error("Failed to run git in {}", dir.display())]
    #[diagnostic(
        code(boostfeed::revision::spawn),
        help("Make sure git is installed and the source directory exists")
    )]
    RevisionSpawn {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not resolve the current commit of {}: {reason}", dir.display())]
    #[diagnostic(
        code(boostfeed::revision),
        help("The library source directory must be a git checkout with at least one commit")
    )]
    Revision { dir: PathBuf, reason: String },

    #[error("Error while {action}")]
    #[diagnostic(code(boostfeed::io))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },
}

/// Trait for adding context to IO errors.
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, BoostfeedError>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, BoostfeedError>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            BoostfeedError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
