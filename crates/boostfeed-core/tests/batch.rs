use std::{fs, path::Path};

use boostfeed_core::{
    batch::{Batch, BatchConfig},
    error::BoostfeedError,
    feed::{FeedBuilder, FeedSettings, FixedClock, RenderedFeed, Variant},
    revision::RevisionResolver,
    sink::{DirectorySink, FeedSink},
    BoostfeedResult,
};
use boostfeed_dl::error::DownloadError;
use boostfeed_dl::size::SizeResolver;
use boostfeed_registry::{Element, RegistryError};
use chrono::{TimeZone, Utc};
use tempfile::{tempdir, TempDir};

const COMMIT: &str = "fedcba9876543210fedcba9876543210fedcba98";

const SITE: &str = r#"<?xml version="1.0"?>
<libraries xmlns:dc="http://purl.org/dc/elements/1.1/">
  <library>
    <key>libs/foo</key>
    <name>Foo</name>
    <summary>Foo library</summary>
    <homepage>http://www.boost.org/libs/foo</homepage>
    <dc:author>Jane Doe</dc:author>
    <description>Does foo things.</description>
    <category>Containers</category>
  </library>
  <library>
    <key>filesystem</key>
    <documentation>libs/filesystem/</documentation>
    <summary>Portable paths and directories</summary>
  </library>
</libraries>"#;

/// Answers with the same commit for every existing checkout.
struct FakeRevision;

impl RevisionResolver for FakeRevision {
    fn revision(&self, source_dir: &Path) -> BoostfeedResult<String> {
        assert!(source_dir.is_absolute());
        Ok(COMMIT.to_string())
    }
}

struct FakeSizes;

impl SizeResolver for FakeSizes {
    fn content_length(&self, _url: &str) -> boostfeed_dl::error::Result<u64> {
        Ok(12345)
    }
}

struct FailingSizes;

impl SizeResolver for FailingSizes {
    fn content_length(&self, url: &str) -> boostfeed_dl::error::Result<u64> {
        Err(DownloadError::HttpError {
            status: 404,
            url: url.to_string(),
        })
    }
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("dumps")).unwrap();
        fs::create_dir_all(dir.path().join("boost/libs")).unwrap();
        fs::write(dir.path().join("libraries.xml"), SITE).unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn dump(&self, name: &str, subdir: &str, libraries: &[&str]) {
        let source = self.root().join("boost").join(subdir);
        let mut xml = format!(
            "<cmake-dump>\n  <source-directory>{}</source-directory>\n",
            source.display()
        );
        if !libraries.is_empty() {
            xml.push_str("  <libraries>\n");
            for lib in libraries {
                xml.push_str(&format!("    <library>{lib}</library>\n"));
            }
            xml.push_str("  </libraries>\n");
        }
        xml.push_str("</cmake-dump>\n");
        fs::write(self.root().join("dumps").join(name), xml).unwrap();
    }

    fn config(&self) -> BatchConfig {
        BatchConfig::new(
            self.root().join("dumps"),
            self.root().join("feeds"),
            self.root().join("boost"),
            self.root().join("libraries.xml"),
        )
    }
}

fn batch<S: SizeResolver>(sizes: S) -> Batch<FakeRevision, S, FixedClock> {
    let now = Utc.with_ymd_and_hms(2012, 3, 1, 12, 0, 0).unwrap();
    Batch::new(
        FeedBuilder::new(FeedSettings::default(), FakeRevision, sizes),
        FixedClock(now),
    )
}

fn child_names(root: &Element) -> Vec<String> {
    root.elements().map(|e| e.name().to_string()).collect()
}

#[test]
fn header_only_library_gets_dev_feed() {
    let fixture = Fixture::new();
    fixture.dump("foo.xml", "libs/foo", &[]);

    let mut feeds: Vec<RenderedFeed> = Vec::new();
    let summary = batch(FakeSizes).run(&fixture.config(), &mut feeds).unwrap();

    assert_eq!(summary.dumps, 1);
    assert_eq!(summary.feeds, 1);
    assert_eq!(feeds.len(), 1);

    let feed = &feeds[0];
    assert_eq!(feed.variant, Variant::Dev);
    assert_eq!(feed.source_subdir, "libs/foo");

    let root = Element::parse(&feed.document).unwrap();
    assert_eq!(
        root.attribute("uri"),
        Some("http://ryppl.github.com/feeds/boost/foo-dev.xml")
    );
    assert_eq!(root.find_text("summary").as_deref(), Some("Foo library"));
    assert_eq!(
        child_names(&root),
        vec![
            "name",
            "icon",
            "summary",
            "homepage",
            "dc:author",
            "description",
            "category",
            "group"
        ]
    );

    let implementation = root.find("group/implementation").unwrap();
    assert_eq!(implementation.attribute("version"), Some("1.49-post-201203011200"));
    assert_eq!(implementation.attribute("released"), Some("2012-03-01"));

    let archive = root.find("group/implementation/archive").unwrap();
    assert!(archive
        .attribute("href")
        .unwrap()
        .ends_with(&format!("/libs/foo/zipball/{COMMIT}")));
    assert_eq!(archive.attribute("size"), Some("12345"));
    assert_eq!(archive.attribute("extract"), Some("boost-lib-libs/foo-fedcba9"));
}

#[test]
fn compiled_library_gets_dev_and_bin_feeds() {
    let fixture = Fixture::new();
    fixture.dump("filesystem.xml", "libs/filesystem", &["boost_filesystem"]);

    let runner = batch(FakeSizes);
    let mut feeds: Vec<RenderedFeed> = Vec::new();
    let summary = runner.run(&fixture.config(), &mut feeds).unwrap();

    assert_eq!(summary.feeds, 2);
    let variants: Vec<_> = feeds.iter().map(|f| f.variant).collect();
    assert_eq!(variants, vec![Variant::Dev, Variant::Bin]);

    let uris: Vec<_> = feeds
        .iter()
        .map(|f| {
            Element::parse(&f.document)
                .unwrap()
                .attribute("uri")
                .unwrap()
                .to_string()
        })
        .collect();
    assert!(uris[0].ends_with("filesystem-dev.xml"));
    assert!(uris[1].ends_with("filesystem-bin.xml"));

    let ids: Vec<_> = feeds
        .iter()
        .map(|f| {
            Element::parse(&f.document)
                .unwrap()
                .find("group/implementation")
                .and_then(|e| e.attribute("id").map(String::from))
                .unwrap()
        })
        .collect();
    assert_ne!(ids[0], ids[1]);

    assert_eq!(
        runner.builder().settings().archive_url("libs/filesystem", COMMIT),
        format!("http://nodeload.github.com/boost-lib/libs/filesystem/zipball/{COMMIT}")
    );
    assert!(feeds.iter().all(|f| f.source_subdir == "libs/filesystem"));
}

#[test]
fn dumps_are_processed_in_name_order() {
    let fixture = Fixture::new();
    fixture.dump("foo.xml", "libs/foo", &[]);
    fixture.dump("filesystem.xml", "libs/filesystem", &["boost_filesystem"]);
    fs::write(fixture.root().join("dumps/notes.txt"), "ignored").unwrap();

    let mut feeds: Vec<RenderedFeed> = Vec::new();
    let summary = batch(FakeSizes).run(&fixture.config(), &mut feeds).unwrap();

    assert_eq!(summary.dumps, 2);
    assert_eq!(summary.feeds, 3);
    let names: Vec<_> = feeds.iter().map(RenderedFeed::file_name).collect();
    assert_eq!(
        names,
        vec!["filesystem-dev.xml", "filesystem-bin.xml", "foo-dev.xml"]
    );
}

#[test]
fn missing_metadata_aborts_before_emitting() {
    let fixture = Fixture::new();
    fixture.dump("bar.xml", "libs/bar", &["boost_bar"]);

    let mut feeds: Vec<RenderedFeed> = Vec::new();
    let err = batch(FakeSizes)
        .run(&fixture.config(), &mut feeds)
        .unwrap_err();

    assert!(matches!(
        err,
        BoostfeedError::Registry(RegistryError::LibraryNotFound { ref subdir }) if subdir == "libs/bar"
    ));
    assert!(feeds.is_empty());
}

#[test]
fn dump_outside_source_root_is_rejected() {
    let fixture = Fixture::new();
    fs::write(
        fixture.root().join("dumps/stray.xml"),
        "<cmake-dump><source-directory>/elsewhere/libs/foo</source-directory></cmake-dump>",
    )
    .unwrap();

    let mut feeds: Vec<RenderedFeed> = Vec::new();
    let err = batch(FakeSizes)
        .run(&fixture.config(), &mut feeds)
        .unwrap_err();

    assert!(matches!(err, BoostfeedError::Path(_)));
    assert!(feeds.is_empty());
}

#[test]
fn size_failure_halts_the_batch() {
    let fixture = Fixture::new();
    fixture.dump("foo.xml", "libs/foo", &[]);

    let mut feeds: Vec<RenderedFeed> = Vec::new();
    let err = batch(FailingSizes)
        .run(&fixture.config(), &mut feeds)
        .unwrap_err();

    assert!(matches!(
        err,
        BoostfeedError::Download(DownloadError::HttpError { status: 404, .. })
    ));
    assert!(feeds.is_empty());
}

#[test]
fn missing_site_metadata_is_an_error() {
    let fixture = Fixture::new();
    fs::remove_file(fixture.root().join("libraries.xml")).unwrap();

    let mut feeds: Vec<RenderedFeed> = Vec::new();
    let err = batch(FakeSizes)
        .run(&fixture.config(), &mut feeds)
        .unwrap_err();
    assert!(matches!(
        err,
        BoostfeedError::Registry(RegistryError::IoError { .. })
    ));
}

#[test]
fn directory_sink_writes_one_file_per_feed() {
    let fixture = Fixture::new();
    fixture.dump("filesystem.xml", "libs/filesystem", &["boost_filesystem"]);

    let config = fixture.config();
    let mut sink = DirectorySink::new(&config.feed_dir);
    batch(FakeSizes).run(&config, &mut sink as &mut dyn FeedSink).unwrap();

    for name in ["filesystem-dev.xml", "filesystem-bin.xml"] {
        let content = fs::read_to_string(config.feed_dir.join(name)).unwrap();
        let root = Element::parse(&content).unwrap();
        assert_eq!(root.name(), "interface");
        assert!(root.attribute("uri").unwrap().ends_with(name));
    }
}

#[test]
fn missing_dump_directory_is_an_error() {
    let fixture = Fixture::new();
    fs::remove_dir(fixture.root().join("dumps")).unwrap();

    let mut feeds: Vec<RenderedFeed> = Vec::new();
    let err = batch(FakeSizes)
        .run(&fixture.config(), &mut feeds)
        .unwrap_err();
    assert!(matches!(err, BoostfeedError::FileSystem(_)));
    assert!(feeds.is_empty());
}
