//! Feed assembly.
//!
//! A feed advertises one source archive of one library:
//!
//! ```xml
//! <interface uri="http://ryppl.github.com/feeds/boost/foo-dev.xml" xmlns="..." ...>
//!   <name>foo</name>
//!   <icon href="..." type="image/png"/>
//!   <summary>Foo library</summary>
//!   <group license="OSI Approved :: Boost Software License 1.0 (BSL-1.0)">
//!     <implementation arch="*-src" id="..." released="2012-03-01" stability="testing"
//!                     version="1.49-post-201203011200" compile:dup-src="true">
//!       <archive extract="boost-lib-libs/foo-0123abc" href="..." size="1234" type="application/zip"/>
//!     </implementation>
//!   </group>
//! </interface>
//! ```

use std::{fmt, path::Path};

use boostfeed_config::config::{
    Config, DEFAULT_ARCHIVE_URL_BASE, DEFAULT_FEED_URI_BASE, DEFAULT_ICON_URL, DEFAULT_LICENSE,
    DEFAULT_VERSION_PREFIX,
};
use boostfeed_dl::size::SizeResolver;
use boostfeed_registry::{DumpRecord, Element, LibraryMetadata};
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{revision::RevisionResolver, BoostfeedResult};

pub const INJECTOR_NAMESPACE: &str = "http://zero-install.sourceforge.net/2004/injector/interface";
pub const COMPILE_NAMESPACE: &str = "http://zero-install.sourceforge.net/2006/namespaces/0compile";
pub const DUBLIN_CORE_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";

const ARCHIVE_TYPE: &str = "application/zip";
const STABILITY: &str = "testing";
const SHORT_REVISION_LEN: usize = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Headers and sources only.
    Dev,
    /// The library also builds compiled components.
    Bin,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Dev => "dev",
            Variant::Bin => "bin",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of the current instant used for version and release stamps.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Static parts of every feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedSettings {
    pub feed_uri_base: String,
    pub archive_url_base: String,
    pub icon_url: String,
    pub version_prefix: String,
    pub license: String,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            feed_uri_base: DEFAULT_FEED_URI_BASE.to_string(),
            archive_url_base: DEFAULT_ARCHIVE_URL_BASE.to_string(),
            icon_url: DEFAULT_ICON_URL.to_string(),
            version_prefix: DEFAULT_VERSION_PREFIX.to_string(),
            license: DEFAULT_LICENSE.to_string(),
        }
    }
}

impl FeedSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            feed_uri_base: config.feed_uri_base().to_string(),
            archive_url_base: config.archive_url_base().to_string(),
            icon_url: config.icon_url().to_string(),
            version_prefix: config.version_prefix().to_string(),
            license: config.license().to_string(),
        }
    }

    /// `<feed_uri_base>/<feed_name>-<variant>.xml`
    pub fn interface_uri(&self, feed_name: &str, variant: Variant) -> String {
        format!(
            "{}/{}-{}.xml",
            self.feed_uri_base.trim_end_matches('/'),
            feed_name,
            variant
        )
    }

    /// `<archive_url_base>/<source_subdir>/zipball/<revision>`
    pub fn archive_url(&self, source_subdir: &str, revision: &str) -> String {
        format!(
            "{}/{}/zipball/{}",
            self.archive_url_base.trim_end_matches('/'),
            source_subdir,
            revision
        )
    }

    /// Version prefix followed by the UTC minute, e.g. `1.49-post-201203011200`.
    ///
    /// Two runs within the same minute produce the same version.
    pub fn version(&self, now: DateTime<Utc>) -> String {
        format!("{}{}", self.version_prefix, now.format("%Y%m%d%H%M"))
    }
}

/// ISO date of `now` in UTC, the same day as the version stamp.
pub fn release_date(now: DateTime<Utc>) -> String {
    now.date_naive().format("%Y-%m-%d").to_string()
}

/// Name of the top-level directory inside the archive.
pub fn extract_dir(source_subdir: &str, revision: &str) -> String {
    let short: String = revision.chars().take(SHORT_REVISION_LEN).collect();
    format!("boost-lib-{source_subdir}-{short}")
}

/// Everything needed to describe one (dump, variant) pair.
#[derive(Clone, Copy, Debug)]
pub struct FeedRequest<'a> {
    pub dump: &'a DumpRecord,
    pub feed_name: &'a str,
    pub source_subdir: &'a str,
    pub variant: Variant,
    pub metadata: &'a LibraryMetadata,
    pub now: DateTime<Utc>,
}

/// Values computed for a feed's single implementation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Implementation {
    pub id: String,
    pub revision: String,
    pub version: String,
    pub archive_url: String,
    pub size: u64,
}

/// A feed ready to leave the process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedFeed {
    pub feed_name: String,
    pub variant: Variant,
    pub source_subdir: String,
    pub document: String,
}

impl RenderedFeed {
    /// File name matching the last segment of the interface URI.
    pub fn file_name(&self) -> String {
        format!("{}-{}.xml", self.feed_name, self.variant)
    }
}

pub struct FeedBuilder<R, S> {
    settings: FeedSettings,
    revisions: R,
    sizes: S,
}

impl<R: RevisionResolver, S: SizeResolver> FeedBuilder<R, S> {
    pub fn new(settings: FeedSettings, revisions: R, sizes: S) -> Self {
        Self {
            settings,
            revisions,
            sizes,
        }
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    /// Resolves the revision and archive size and renders the feed.
    pub fn build(&self, request: &FeedRequest) -> BoostfeedResult<RenderedFeed> {
        debug!(
            "Building {} feed for repository {}",
            request.variant,
            request.dump.repository_name()
        );

        let revision = self
            .revisions
            .revision(Path::new(&request.dump.source_directory))?;

        let archive_url = self
            .settings
            .archive_url(request.source_subdir, &revision);
        let size = self.sizes.content_length(&archive_url)?;

        info!(
            "{}-{}: {} ({} bytes)",
            request.feed_name, request.variant, archive_url, size
        );

        let implementation = Implementation {
            id: Uuid::new_v4().to_string(),
            version: self.settings.version(request.now),
            revision,
            archive_url,
            size,
        };

        let document = self.assemble(request, &implementation);

        Ok(RenderedFeed {
            feed_name: request.feed_name.to_string(),
            variant: request.variant,
            source_subdir: request.source_subdir.to_string(),
            document: document.render(),
        })
    }

    /// Builds the feed tree from already resolved values.
    pub fn assemble(&self, request: &FeedRequest, implementation: &Implementation) -> Element {
        let mut interface = Element::new("interface")
            .attr(
                "uri",
                self.settings
                    .interface_uri(request.feed_name, request.variant),
            )
            .attr("xmlns", INJECTOR_NAMESPACE)
            .attr("xmlns:compile", COMPILE_NAMESPACE)
            .attr("xmlns:dc", DUBLIN_CORE_NAMESPACE)
            .child(Element::new("name").text(request.feed_name))
            .child(
                Element::new("icon")
                    .attr("href", self.settings.icon_url.as_str())
                    .attr("type", "image/png"),
            );

        interface.extend(
            request
                .metadata
                .descriptive_fields()
                .into_iter()
                .cloned(),
        );

        let archive = Element::new("archive")
            .attr(
                "extract",
                extract_dir(request.source_subdir, &implementation.revision),
            )
            .attr("href", implementation.archive_url.as_str())
            .attr("size", implementation.size.to_string())
            .attr("type", ARCHIVE_TYPE);

        let implementation_node = Element::new("implementation")
            .attr("arch", "*-src")
            .attr("id", implementation.id.as_str())
            .attr("released", release_date(request.now))
            .attr("stability", STABILITY)
            .attr("version", implementation.version.as_str())
            .attr("compile:dup-src", "true")
            .child(archive);

        interface.child(
            Element::new("group")
                .attr("license", self.settings.license.as_str())
                .child(implementation_node),
        )
    }
}
