use boostfeed_config::config::Config;
use clap::{ArgAction, Parser, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
)]
pub struct Args {
    /// Directory containing the build dumps
    #[arg(value_hint = ValueHint::DirPath)]
    pub dump_dir: Option<String>,

    /// Directory feeds are written to with --write-feeds
    #[arg(value_hint = ValueHint::DirPath)]
    pub feed_dir: Option<String>,

    /// Root of the library source checkouts
    #[arg(value_hint = ValueHint::DirPath)]
    pub source_root: Option<String>,

    /// Site-wide library metadata document
    #[arg(value_hint = ValueHint::FilePath)]
    pub site_metadata: Option<String>,

    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long)]
    pub quiet: bool,

    /// Output logs as json
    #[arg(short, long)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    /// Write each feed into the feed directory instead of stdout
    #[arg(long)]
    pub write_feeds: bool,

    /// Set proxy
    #[arg(required = false, long, short = 'P')]
    pub proxy: Option<String>,

    /// Set user agent
    #[arg(required = false, long, short = 'A')]
    pub user_agent: Option<String>,
}

impl Args {
    /// Lets command line values take precedence over the configuration file.
    pub fn apply(&self, config: &mut Config) {
        let overrides = [
            (&self.dump_dir, &mut config.dump_dir),
            (&self.feed_dir, &mut config.feed_dir),
            (&self.source_root, &mut config.source_root),
            (&self.site_metadata, &mut config.site_metadata),
            (&self.user_agent, &mut config.user_agent),
        ];
        for (arg, field) in overrides {
            if let Some(value) = arg {
                *field = Some(value.clone());
            }
        }

        if self.write_feeds {
            config.write_feeds = Some(true);
        }
    }
}
