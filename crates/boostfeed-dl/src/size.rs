//! Remote archive size resolution.
//!
//! Feeds advertise the exact byte size of every archive. The size is taken from
//! the `Content-Length` of a `HEAD` response; servers that omit it get a full
//! `GET` whose body is counted.
//!
//! Both requests ask for the identity encoding so the size is that of the
//! archive bytes as stored, never of a compressed transfer.

use std::io;

use tracing::debug;
use ureq::http::{
    header::{ACCEPT_ENCODING, CONTENT_LENGTH},
    HeaderMap,
};
use url::Url;

use crate::{
    error::{DownloadError, Result},
    http_client::SHARED_AGENT,
};

const IDENTITY: &str = "identity";

/// Resolves the byte length of a remote resource.
pub trait SizeResolver {
    fn content_length(&self, url: &str) -> Result<u64>;
}

/// [`SizeResolver`] backed by the shared HTTP agent.
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpSizeResolver;

impl SizeResolver for HttpSizeResolver {
    fn content_length(&self, url: &str) -> Result<u64> {
        Url::parse(url).map_err(|source| {
            DownloadError::InvalidUrl {
                url: url.to_string(),
                source,
            }
        })?;

        let response = SHARED_AGENT
            .head(url)
            .header(ACCEPT_ENCODING, IDENTITY)
            .call()
            .map_err(|err| map_status(url, err))?;

        if let Some(length) = declared_length(response.headers()) {
            debug!("{} declares {} bytes", url, length);
            return Ok(length);
        }

        debug!("No content length for {}, fetching body", url);

        let mut response = SHARED_AGENT
            .get(url)
            .header(ACCEPT_ENCODING, IDENTITY)
            .call()
            .map_err(|err| map_status(url, err))?;

        let mut reader = response.body_mut().as_reader();
        io::copy(&mut reader, &mut io::sink()).map_err(|source| {
            DownloadError::Body {
                url: url.to_string(),
                source,
            }
        })
    }
}

/// Reads a usable `Content-Length` header, ignoring missing or malformed values.
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn map_status(url: &str, err: ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(status) => {
            DownloadError::HttpError {
                status,
                url: url.to_string(),
            }
        }
        other => DownloadError::from(other),
    }
}
