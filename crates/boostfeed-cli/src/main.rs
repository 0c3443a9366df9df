use std::time::Duration;

use boostfeed_config::config::Config;
use boostfeed_core::{
    batch::{Batch, BatchConfig, BatchSummary},
    feed::{FeedBuilder, FeedSettings, SystemClock},
    revision::GitRevision,
    sink::{DirectorySink, WriterSink},
    BoostfeedResult,
};
use boostfeed_dl::{error::DownloadError, http_client::configure_http_client, size::HttpSizeResolver};
use boostfeed_utils::path::resolve_path;
use clap::Parser;
use cli::Args;
use logging::setup_logging;
use tracing::{debug, info};
use ureq::Proxy;
use utils::set_color;

mod cli;
mod logging;
mod utils;

fn load_config(args: &Args) -> BoostfeedResult<Config> {
    let mut config = match args.config.as_deref() {
        Some(path) => Config::load(&resolve_path(path)?)?,
        None => Config::new()?,
    };
    args.apply(&mut config);
    Ok(config)
}

fn configure_http(args: &Args, config: &Config) -> BoostfeedResult<()> {
    let proxy = args
        .proxy
        .as_deref()
        .map(Proxy::new)
        .transpose()
        .map_err(DownloadError::from)?;
    let user_agent = config.user_agent().to_string();
    let timeout = config.http_timeout.map(Duration::from_secs);

    configure_http_client(|client| {
        if proxy.is_some() {
            client.proxy = proxy;
        }
        client.user_agent = Some(user_agent);
        client.timeout = timeout;
    });

    Ok(())
}

fn handle_cli() -> BoostfeedResult<BatchSummary> {
    let args = Args::parse();

    set_color(!args.no_color);
    setup_logging(&args);

    let config = load_config(&args)?;
    configure_http(&args, &config)?;

    let batch_config = BatchConfig::from_config(&config)?;
    debug!("{:?}", batch_config);

    let builder = FeedBuilder::new(
        FeedSettings::from_config(&config),
        GitRevision::default(),
        HttpSizeResolver,
    );
    let batch = Batch::new(builder, SystemClock);

    let summary = if batch_config.write_feeds {
        let mut sink = DirectorySink::new(&batch_config.feed_dir);
        batch.run(&batch_config, &mut sink)?
    } else {
        let mut sink = WriterSink::stdout();
        batch.run(&batch_config, &mut sink)?
    };

    if batch_config.write_feeds {
        info!(
            "Wrote {} feeds to {}",
            summary.feeds,
            batch_config.feed_dir.display()
        );
    }

    Ok(summary)
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli() {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
