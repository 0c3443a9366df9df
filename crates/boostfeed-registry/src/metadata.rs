//! Site-wide library metadata.
//!
//! The site metadata document lists every known library:
//!
//! ```xml
//! <libraries xmlns:dc="http://purl.org/dc/elements/1.1/">
//!   <library>
//!     <key>libs/foo</key>
//!     <name>Foo</name>
//!     <summary>Foo library</summary>
//!     <homepage>http://www.boost.org/libs/foo</homepage>
//!     <dc:author>Jane Doe</dc:author>
//!     <description>Does foo things.</description>
//!     <category>Containers</category>
//!   </library>
//! </libraries>
//! ```
//!
//! The descriptive children are kept as elements so feeds can embed them verbatim.

use std::{fs, path::Path};

use tracing::debug;

use crate::{
    element::Element,
    error::{ErrorContext, RegistryError, Result},
};

/// Metadata tags copied into feeds, in the order they are emitted.
pub const DESCRIPTIVE_TAGS: [&str; 5] = [
    "summary",
    "homepage",
    "dc:author",
    "description",
    "category",
];

/// One `library` entry of the site metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryMetadata {
    element: Element,
}

impl LibraryMetadata {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn key(&self) -> Option<String> {
        self.trimmed_text("key")
    }

    pub fn name(&self) -> Option<String> {
        self.trimmed_text("name")
    }

    pub fn documentation(&self) -> Option<String> {
        self.trimmed_text("documentation")
    }

    /// All children named `tag`, in document order.
    pub fn fields<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.element.find_all(tag)
    }

    /// The descriptive children, grouped by [`DESCRIPTIVE_TAGS`] order and in
    /// document order within each tag. Tags absent from the entry are skipped.
    pub fn descriptive_fields(&self) -> Vec<&Element> {
        DESCRIPTIVE_TAGS
            .into_iter()
            .flat_map(|tag| self.fields(tag))
            .collect()
    }

    /// Whether this entry describes the library checked out at `subdir`
    /// (relative to the source root, e.g. `libs/foo`).
    ///
    /// An entry matches when its `key` is the subdirectory itself or the
    /// subdirectory's name under `libs/`, or when its `documentation` path
    /// points at the subdirectory.
    pub fn matches(&self, subdir: &str) -> bool {
        let subdir = subdir.trim_matches('/');

        if let Some(key) = self.key() {
            let key = key.trim_matches('/');
            if key == subdir || subdir.strip_prefix("libs/") == Some(key) {
                return true;
            }
        }

        self.documentation().is_some_and(|doc| {
            let doc = doc.trim_start_matches('/');
            let doc = doc.strip_suffix("index.html").unwrap_or(doc);
            doc.trim_end_matches('/') == subdir
        })
    }

    fn trimmed_text(&self, tag: &str) -> Option<String> {
        self.element
            .find_text(tag)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
    }
}

/// All library entries of a site metadata document.
#[derive(Clone, Debug, Default)]
pub struct LibraryRegistry {
    libraries: Vec<LibraryMetadata>,
}

impl LibraryRegistry {
    /// Reads and parses the site metadata document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::IoError`] if the file cannot be read and
    /// [`RegistryError::Xml`] or [`RegistryError::Malformed`] if it is not
    /// well-formed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading site metadata {}", path.display()))?;

        let registry = Self::parse(&content)?;
        debug!(
            "Loaded {} libraries from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Parses a site metadata document, keeping one entry per `library`
    /// element directly under the root.
    pub fn parse(xml: &str) -> Result<Self> {
        let root = Element::parse(xml)?;
        let libraries = root
            .find_all("library")
            .cloned()
            .map(LibraryMetadata::new)
            .collect();

        Ok(Self { libraries })
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LibraryMetadata> {
        self.libraries.iter()
    }

    /// First entry matching `subdir`, see [`LibraryMetadata::matches`].
    pub fn lookup(&self, subdir: &str) -> Option<&LibraryMetadata> {
        self.libraries.iter().find(|lib| lib.matches(subdir))
    }

    /// Like [`LibraryRegistry::lookup`], but a miss is an error.
    pub fn require(&self, subdir: &str) -> Result<&LibraryMetadata> {
        self.lookup(subdir)
            .ok_or_else(|| RegistryError::LibraryNotFound {
                subdir: subdir.to_string(),
            })
    }
}
