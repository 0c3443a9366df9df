//! Per-library build dumps.
//!
//! The build system writes one dump per library:
//!
//! ```xml
//! <cmake-dump>
//!   <source-directory>/home/dev/ryppl/boost-zero/boost/libs/filesystem</source-directory>
//!   <libraries>
//!     <library>boost_filesystem</library>
//!   </libraries>
//! </cmake-dump>
//! ```
//!
//! A dump without `libraries/library` describes a header-only library.

use std::{fs, path::Path};

use crate::{
    element::Element,
    error::{ErrorContext, RegistryError, Result},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DumpRecord {
    /// Absolute path of the library's source checkout.
    pub source_directory: String,
    /// Text of every `libraries/library` entry, in document order.
    pub libraries: Vec<String>,
}

impl DumpRecord {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading build dump {}", path.display()))?;

        Self::parse_named(&content, &path.display().to_string())
    }

    pub fn parse(xml: &str) -> Result<Self> {
        Self::parse_named(xml, "build dump")
    }

    fn parse_named(xml: &str, document: &str) -> Result<Self> {
        let root = Element::parse(xml)?;

        let source_directory = root
            .find_text("source-directory")
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                RegistryError::MissingElement {
                    element: "source-directory".to_string(),
                    document: document.to_string(),
                }
            })?;

        let libraries = root
            .find_all("libraries")
            .flat_map(|libs| libs.find_all("library"))
            .map(|lib| lib.text_content().trim().to_string())
            .collect();

        Ok(Self {
            source_directory,
            libraries,
        })
    }

    /// Whether the library builds compiled artifacts in addition to headers.
    pub fn has_binaries(&self) -> bool {
        !self.libraries.is_empty()
    }

    /// Last path segment of the source directory, i.e. the repository name.
    pub fn repository_name(&self) -> &str {
        self.source_directory
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }
}
