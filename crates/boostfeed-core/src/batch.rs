use std::path::{Path, PathBuf};

use boostfeed_config::config::{Config, DEFAULT_DUMP_PATTERN};
use boostfeed_dl::size::SizeResolver;
use boostfeed_registry::{DumpRecord, LibraryRegistry};
use boostfeed_utils::{fs::matching_files, path::relative_subdir};
use tracing::{debug, info, warn};

use crate::{
    error::BoostfeedError,
    feed::{Clock, FeedBuilder, FeedRequest, Variant},
    revision::RevisionResolver,
    sink::FeedSink,
    BoostfeedResult,
};

/// Inputs of one generation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    pub dump_dir: PathBuf,
    pub feed_dir: PathBuf,
    pub source_root: PathBuf,
    pub site_metadata: PathBuf,
    pub dump_pattern: String,
    pub write_feeds: bool,
}

impl BatchConfig {
    pub fn new<P: Into<PathBuf>>(
        dump_dir: P,
        feed_dir: P,
        source_root: P,
        site_metadata: P,
    ) -> Self {
        Self {
            dump_dir: dump_dir.into(),
            feed_dir: feed_dir.into(),
            source_root: source_root.into(),
            site_metadata: site_metadata.into(),
            dump_pattern: DEFAULT_DUMP_PATTERN.to_string(),
            write_feeds: false,
        }
    }

    pub fn from_config(config: &Config) -> BoostfeedResult<Self> {
        Ok(Self {
            dump_dir: config.get_dump_dir()?,
            feed_dir: config.get_feed_dir()?,
            source_root: config.get_source_root()?,
            site_metadata: config.get_site_metadata()?,
            dump_pattern: config.dump_pattern().to_string(),
            write_feeds: config.write_feeds(),
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Dump files processed.
    pub dumps: usize,
    /// Feeds handed to the sink.
    pub feeds: usize,
}

/// Generates feeds for every dump in a directory, one library at a time.
pub struct Batch<R, S, C> {
    builder: FeedBuilder<R, S>,
    clock: C,
}

impl<R, S, C> Batch<R, S, C>
where
    R: RevisionResolver,
    S: SizeResolver,
    C: Clock,
{
    pub fn new(builder: FeedBuilder<R, S>, clock: C) -> Self {
        Self { builder, clock }
    }

    pub fn builder(&self) -> &FeedBuilder<R, S> {
        &self.builder
    }

    /// Runs the whole batch. The first failing library stops the run.
    pub fn run(
        &self,
        config: &BatchConfig,
        sink: &mut dyn FeedSink,
    ) -> BoostfeedResult<BatchSummary> {
        let registry = LibraryRegistry::from_file(&config.site_metadata)?;
        if registry.is_empty() {
            warn!(
                "No libraries found in {}",
                config.site_metadata.display()
            );
        }

        let dumps = matching_files(&config.dump_dir, &config.dump_pattern)?;
        info!(
            "Found {} dumps matching '{}' in {}",
            dumps.len(),
            config.dump_pattern,
            config.dump_dir.display()
        );

        let mut summary = BatchSummary::default();
        for dump_path in &dumps {
            summary.feeds += self.process_dump(dump_path, config, &registry, sink)?;
            summary.dumps += 1;
        }

        info!(
            "Generated {} feeds from {} dumps",
            summary.feeds, summary.dumps
        );
        Ok(summary)
    }

    fn process_dump(
        &self,
        dump_path: &Path,
        config: &BatchConfig,
        registry: &LibraryRegistry,
        sink: &mut dyn FeedSink,
    ) -> BoostfeedResult<usize> {
        let feed_name = feed_name(dump_path)?;
        debug!("Processing {} as {}", dump_path.display(), feed_name);

        let dump = DumpRecord::from_file(dump_path)?;
        let source_subdir = relative_subdir(&dump.source_directory, &config.source_root)?;
        let metadata = registry.require(&source_subdir)?;

        let mut variants = vec![Variant::Dev];
        if dump.has_binaries() {
            variants.push(Variant::Bin);
        }

        let now = self.clock.now();
        for variant in &variants {
            let request = FeedRequest {
                dump: &dump,
                feed_name: &feed_name,
                source_subdir: &source_subdir,
                variant: *variant,
                metadata,
                now,
            };
            let feed = self.builder.build(&request)?;
            sink.emit(&feed)?;
        }

        Ok(variants.len())
    }
}

/// Base feed name of a dump, i.e. its file name without extension.
fn feed_name(dump_path: &Path) -> BoostfeedResult<String> {
    dump_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| {
            BoostfeedError::IoError {
                action: format!("deriving a feed name from {}", dump_path.display()),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "dump file has no name",
                ),
            }
        })
}
