use std::{fs, path::PathBuf};

use boostfeed_utils::path::{home_dir, resolve_path, xdg_config_home};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{ConfigError, Result};

pub const DEFAULT_DUMP_PATTERN: &str = "*.xml";
pub const DEFAULT_FEED_URI_BASE: &str = "http://ryppl.github.com/feeds/boost";
pub const DEFAULT_ARCHIVE_URL_BASE: &str = "http://nodeload.github.com/boost-lib";
pub const DEFAULT_ICON_URL: &str =
    "http://svn.boost.org/svn/boost/website/public_html/live/gfx/boost-dark-trans.png";
pub const DEFAULT_VERSION_PREFIX: &str = "1.49-post-";
pub const DEFAULT_LICENSE: &str = "OSI Approved :: Boost Software License 1.0 (BSL-1.0)";
pub const DEFAULT_USER_AGENT: &str = "boostfeed";

/// Feed generator configuration.
///
/// Every field is optional in the file; missing values are filled in by
/// [`Config::resolve`].
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    /// Directory scanned for build dump files.
    /// Default: $BOOSTFEED_ROOT/feeds/dumps
    pub dump_dir: Option<String>,

    /// Directory feeds are written to when `write_feeds` is enabled.
    /// Default: $BOOSTFEED_ROOT/feeds/boost
    pub feed_dir: Option<String>,

    /// Root of the library source checkouts. Dump source directories are
    /// made relative to this path.
    /// Default: $BOOSTFEED_ROOT/boost-zero/boost
    pub source_root: Option<String>,

    /// Site-wide library metadata document.
    /// Default: ~/src/boost/svn/website/public_html/live/doc/libraries.xml
    pub site_metadata: Option<String>,

    /// Glob applied to file names in `dump_dir`.
    /// Default: *.xml
    pub dump_pattern: Option<String>,

    /// Base URL of the published feeds; the interface URI is
    /// `<feed_uri_base>/<name>-<variant>.xml`.
    pub feed_uri_base: Option<String>,

    /// Base URL archives are downloaded from; the archive URL is
    /// `<archive_url_base>/<subdir>/zipball/<commit>`.
    pub archive_url_base: Option<String>,

    /// Icon advertised by every feed.
    pub icon_url: Option<String>,

    /// Prefix of the generated version string.
    /// Default: 1.49-post-
    pub version_prefix: Option<String>,

    /// License attached to the implementation group.
    pub license: Option<String>,

    /// Write each feed into `feed_dir` instead of printing it.
    /// Default: false
    pub write_feeds: Option<bool>,

    /// Global HTTP timeout in seconds. Unset means transport defaults.
    pub http_timeout: Option<u64>,

    /// User agent sent with size probes.
    /// Default: boostfeed
    pub user_agent: Option<String>,
}

/// Location of the configuration file.
///
/// `$BOOSTFEED_CONFIG` wins; otherwise `$XDG_CONFIG_HOME/boostfeed/config.toml`.
pub fn default_config_path() -> PathBuf {
    match std::env::var("BOOSTFEED_CONFIG") {
        Ok(path) => PathBuf::from(path),
        Err(_) => xdg_config_home().join("boostfeed").join("config.toml"),
    }
}

fn workspace_root() -> String {
    std::env::var("BOOSTFEED_ROOT")
        .unwrap_or_else(|_| format!("{}/src/ryppl", home_dir().display()))
}

impl Config {
    pub fn default_config() -> Self {
        let root = workspace_root();

        Self {
            dump_dir: Some(format!("{root}/feeds/dumps")),
            feed_dir: Some(format!("{root}/feeds/boost")),
            source_root: Some(format!("{root}/boost-zero/boost")),
            site_metadata: Some(format!(
                "{}/src/boost/svn/website/public_html/live/doc/libraries.xml",
                home_dir().display()
            )),
            dump_pattern: Some(DEFAULT_DUMP_PATTERN.to_string()),
            feed_uri_base: Some(DEFAULT_FEED_URI_BASE.to_string()),
            archive_url_base: Some(DEFAULT_ARCHIVE_URL_BASE.to_string()),
            icon_url: Some(DEFAULT_ICON_URL.to_string()),
            version_prefix: Some(DEFAULT_VERSION_PREFIX.to_string()),
            license: Some(DEFAULT_LICENSE.to_string()),
            write_feeds: Some(false),
            http_timeout: None,
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
        }
    }

    /// Loads the configuration file at `path`, falling back to defaults when
    /// it does not exist.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let mut config = match fs::read_to_string(path) {
            Ok(content) => {
                debug!("Loading configuration from {}", path.display());
                toml::from_str(&content)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No configuration at {}, using defaults", path.display());
                Self::default_config()
            }
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.resolve()?;

        Ok(config)
    }

    /// Loads the configuration from [`default_config_path`].
    pub fn new() -> Result<Self> {
        Self::load(&default_config_path())
    }

    /// Fills in defaults for missing fields and validates the rest.
    pub fn resolve(&mut self) -> Result<()> {
        let defaults = Self::default_config();

        self.dump_dir.get_or_insert_with(|| defaults.dump_dir.unwrap_or_default());
        self.feed_dir.get_or_insert_with(|| defaults.feed_dir.unwrap_or_default());
        self.source_root
            .get_or_insert_with(|| defaults.source_root.unwrap_or_default());
        self.site_metadata
            .get_or_insert_with(|| defaults.site_metadata.unwrap_or_default());
        self.dump_pattern
            .get_or_insert_with(|| DEFAULT_DUMP_PATTERN.to_string());
        self.feed_uri_base
            .get_or_insert_with(|| DEFAULT_FEED_URI_BASE.to_string());
        self.archive_url_base
            .get_or_insert_with(|| DEFAULT_ARCHIVE_URL_BASE.to_string());
        self.icon_url.get_or_insert_with(|| DEFAULT_ICON_URL.to_string());
        self.version_prefix
            .get_or_insert_with(|| DEFAULT_VERSION_PREFIX.to_string());
        self.license.get_or_insert_with(|| DEFAULT_LICENSE.to_string());
        self.write_feeds.get_or_insert(false);
        self.user_agent
            .get_or_insert_with(|| DEFAULT_USER_AGENT.to_string());

        if self.dump_pattern.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(ConfigError::EmptyField("dump_pattern"));
        }

        for (field, value) in [
            ("feed_uri_base", &mut self.feed_uri_base),
            ("archive_url_base", &mut self.archive_url_base),
            ("icon_url", &mut self.icon_url),
        ] {
            if let Some(value) = value {
                Url::parse(value).map_err(|source| {
                    ConfigError::InvalidUrl {
                        field,
                        value: value.clone(),
                        source,
                    }
                })?;
                let trimmed = value.trim_end_matches('/').to_string();
                *value = trimmed;
            }
        }

        Ok(())
    }

    pub fn get_dump_dir(&self) -> Result<PathBuf> {
        Ok(resolve_path(self.dump_dir.as_deref().unwrap_or_default())?)
    }

    pub fn get_feed_dir(&self) -> Result<PathBuf> {
        Ok(resolve_path(self.feed_dir.as_deref().unwrap_or_default())?)
    }

    pub fn get_source_root(&self) -> Result<PathBuf> {
        Ok(resolve_path(
            self.source_root.as_deref().unwrap_or_default(),
        )?)
    }

    pub fn get_site_metadata(&self) -> Result<PathBuf> {
        Ok(resolve_path(
            self.site_metadata.as_deref().unwrap_or_default(),
        )?)
    }

    pub fn dump_pattern(&self) -> &str {
        self.dump_pattern.as_deref().unwrap_or(DEFAULT_DUMP_PATTERN)
    }

    pub fn feed_uri_base(&self) -> &str {
        self.feed_uri_base.as_deref().unwrap_or(DEFAULT_FEED_URI_BASE)
    }

    pub fn archive_url_base(&self) -> &str {
        self.archive_url_base
            .as_deref()
            .unwrap_or(DEFAULT_ARCHIVE_URL_BASE)
    }

    pub fn icon_url(&self) -> &str {
        self.icon_url.as_deref().unwrap_or(DEFAULT_ICON_URL)
    }

    pub fn version_prefix(&self) -> &str {
        self.version_prefix
            .as_deref()
            .unwrap_or(DEFAULT_VERSION_PREFIX)
    }

    pub fn license(&self) -> &str {
        self.license.as_deref().unwrap_or(DEFAULT_LICENSE)
    }

    pub fn write_feeds(&self) -> bool {
        self.write_feeds.unwrap_or(false)
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn test_default_config_uses_root() {
        std::env::set_var("BOOSTFEED_ROOT", "/srv/ryppl");
        let config = Config::default_config();
        std::env::remove_var("BOOSTFEED_ROOT");

        assert_eq!(config.dump_dir.as_deref(), Some("/srv/ryppl/feeds/dumps"));
        assert_eq!(config.feed_dir.as_deref(), Some("/srv/ryppl/feeds/boost"));
        assert_eq!(
            config.source_root.as_deref(),
            Some("/srv/ryppl/boost-zero/boost")
        );
        assert_eq!(config.dump_pattern(), "*.xml");
        assert_eq!(config.version_prefix(), "1.49-post-");
        assert!(!config.write_feeds());
    }

    #[test]
    #[serial]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.feed_uri_base(), DEFAULT_FEED_URI_BASE);
        assert_eq!(config.archive_url_base(), DEFAULT_ARCHIVE_URL_BASE);
        assert_eq!(config.license(), DEFAULT_LICENSE);
    }

    #[test]
    #[serial]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
dump_dir = "/data/dumps"
archive_url_base = "https://codeload.example.com/boost-lib/"
write_feeds = true
http_timeout = 30
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.get_dump_dir().unwrap(), PathBuf::from("/data/dumps"));
        assert_eq!(
            config.archive_url_base(),
            "https://codeload.example.com/boost-lib"
        );
        assert!(config.write_feeds());
        assert_eq!(config.http_timeout, Some(30));
        assert_eq!(config.version_prefix(), DEFAULT_VERSION_PREFIX);
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "dump_dir = [").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::TomlDeError(_))));
    }

    #[test]
    fn test_resolve_rejects_invalid_url() {
        let mut config = Config {
            archive_url_base: Some("not a url".to_string()),
            ..Default::default()
        };

        let result = config.resolve();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidUrl {
                field: "archive_url_base",
                ..
            })
        ));
    }

    #[test]
    fn test_resolve_rejects_empty_pattern() {
        let mut config = Config {
            dump_pattern: Some("  ".to_string()),
            ..Default::default()
        };

        let result = config.resolve();
        assert!(matches!(result, Err(ConfigError::EmptyField("dump_pattern"))));
    }

    #[test]
    #[serial]
    fn test_default_config_path_env_override() {
        std::env::set_var("BOOSTFEED_CONFIG", "/etc/boostfeed.toml");
        assert_eq!(default_config_path(), PathBuf::from("/etc/boostfeed.toml"));
        std::env::remove_var("BOOSTFEED_CONFIG");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default_config();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }
}
