//! Error types for the registry crate.

use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur while reading metadata and dump documents.
#[derive(Error, Diagnostic, Debug)]
pub enum RegistryError {
    #[error("Error while {action}: {source}")]
    #[diagnostic(code(boostfeed_registry::io))]
    IoError {
        action: String,
        source: std::io::Error,
    },

    #[error("Malformed XML: {0}")]
    #[diagnostic(
        code(boostfeed_registry::xml),
        help("The document is not well-formed XML")
    )]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed document: {0}")]
    #[diagnostic(code(boostfeed_registry::malformed))]
    Malformed(String),

    #[error("Element `{element}` not found in {document}")]
    #[diagnostic(
        code(boostfeed_registry::missing_element),
        help("Regenerate the build dump; every dump must name its source directory")
    )]
    MissingElement {
        element: String,
        document: String,
    },

    #[error("No library metadata found for `{subdir}`")]
    #[diagnostic(
        code(boostfeed_registry::library_not_found),
        help("Add a <library> entry with <key>{}</key> to the site metadata", .subdir)
    )]
    LibraryNotFound { subdir: String },
}

/// A specialized Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Extension trait for adding context to I/O errors.
pub trait ErrorContext<T> {
    /// Adds context to an error, describing what action was being performed.
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            RegistryError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
