use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use boostfeed_utils::fs::write_file;
use tracing::info;

use crate::{error::ErrorContext, feed::RenderedFeed, BoostfeedResult};

const BANNER_RULE: &str = "####################";

/// Destination for rendered feeds.
pub trait FeedSink {
    fn emit(&mut self, feed: &RenderedFeed) -> BoostfeedResult<()>;
}

/// Prints each feed after a banner line naming its source subdirectory.
pub struct WriterSink<W> {
    writer: W,
}

impl WriterSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FeedSink for WriterSink<W> {
    fn emit(&mut self, feed: &RenderedFeed) -> BoostfeedResult<()> {
        writeln!(
            self.writer,
            "{BANNER_RULE} {} {BANNER_RULE}",
            feed.source_subdir
        )
        .and_then(|_| writeln!(self.writer, "{}", feed.document))
        .and_then(|_| self.writer.flush())
        .with_context(|| format!("writing feed {}", feed.file_name()))
    }
}

/// Writes each feed to `<dir>/<feed name>-<variant>.xml`.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, feed: &RenderedFeed) -> PathBuf {
        self.dir.join(feed.file_name())
    }
}

impl FeedSink for DirectorySink {
    fn emit(&mut self, feed: &RenderedFeed) -> BoostfeedResult<()> {
        let path = self.path_for(feed);
        write_file(&path, feed.document.as_bytes())?;
        info!("Wrote {}", path.display());
        Ok(())
    }
}

/// Collects feeds in memory.
impl FeedSink for Vec<RenderedFeed> {
    fn emit(&mut self, feed: &RenderedFeed) -> BoostfeedResult<()> {
        self.push(feed.clone());
        Ok(())
    }
}
