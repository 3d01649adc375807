// src/tiles/fetch.rs
//! Tile download over HTTP

use crate::error::{Result, TrackerError};
use std::io::Write;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "RegattaTracker/0.1 (Rust sailing track viewer)";

/// Streams the body behind a URL into a writer
pub trait TileFetcher {
    /// Returns the number of bytes written. Non-success responses are errors
    /// and write nothing.
    fn fetch(&self, url: &str, dest: &mut dyn Write) -> Result<u64>;
}

impl<T: TileFetcher + ?Sized> TileFetcher for &T {
    fn fetch(&self, url: &str, dest: &mut dyn Write) -> Result<u64> {
        (**self).fetch(url, dest)
    }
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// `timeout` of `None` keeps the transport default
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TrackerError::Other(format!("HTTP client error: {}", e)))?;
        Ok(Self { client })
    }
}

impl TileFetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &mut dyn Write) -> Result<u64> {
        tracing::debug!("Downloading {}", url);
        let mut response = self.client.get(url).send()?;

        if !response.status().is_success() {
            return Err(TrackerError::Fetch(format!("{} answered {}", url, response.status())));
        }

        let written = std::io::copy(&mut response, dest)?;
        Ok(written)
    }
}
