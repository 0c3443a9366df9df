//! Input documents for the boostfeed generator.
//!
//! Two kinds of XML documents feed the generator:
//! - **Site metadata**: one document describing every known library
//!   (summary, homepage, authors, description, categories).
//! - **Build dumps**: one document per library, written by the build system,
//!   naming the library's source directory and any compiled components.
//!
//! Both are read into the generic [`Element`] tree, which is also used to
//! assemble the generated feeds.
//!
//! # Example
//!
//! ```no_run
//! use boostfeed_registry::{DumpRecord, LibraryRegistry};
//!
//! fn describe() -> boostfeed_registry::Result<()> {
//!     let registry = LibraryRegistry::from_file("libraries.xml")?;
//!     let dump = DumpRecord::from_file("dumps/foo.xml")?;
//!     let metadata = registry.require("libs/foo")?;
//!     println!("{} -> {:?}", dump.source_directory, metadata.name());
//!     Ok(())
//! }
//! ```

pub mod dump;
pub mod element;
pub mod error;
pub mod metadata;

pub use dump::DumpRecord;
pub use element::{Element, Node};
pub use error::{ErrorContext, RegistryError, Result};
pub use metadata::{LibraryMetadata, LibraryRegistry, DESCRIPTIVE_TAGS};
