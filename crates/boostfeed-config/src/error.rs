use boostfeed_utils::error::{PathError, UtilsError};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(boostfeed_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Invalid URL for `{field}`: {value}")]
    #[diagnostic(
        code(boostfeed_config::invalid_url),
        help("Use an absolute http:// or https:// URL without a trailing slash")
    )]
    InvalidUrl {
        field: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Field `{0}` must not be empty")]
    #[diagnostic(code(boostfeed_config::empty_field))]
    EmptyField(&'static str),

    #[error("IO error: {0}")]
    #[diagnostic(code(boostfeed_config::io))]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(boostfeed_config::utils))]
    Utils(#[from] UtilsError),
}

impl From<PathError> for ConfigError {
    fn from(err: PathError) -> Self {
        Self::Utils(UtilsError::Path(err))
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
