use std::fs;
use std::path::Path;
use std::time::Duration;

use log::{debug, info};

use crate::BomError;

const FETCH_TIMEOUT_SECS: u64 = 30;

/// Thin blocking HTTP collaborator. Knows nothing about feed formats;
/// it only moves bytes from a URL into a caller-supplied file.
pub struct FeedFetcher {
    client: reqwest::blocking::Client,
}

impl FeedFetcher {
    pub fn new() -> Result<Self, BomError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }

    /// Downloads the payload at `url` into `dest`. Transport errors and
    /// non-success statuses propagate unmodified; there is no retry.
    pub fn fetch_to(&self, url: &str, dest: &Path) -> Result<(), BomError> {
        info!("Fetching observation feed — url={}", url);
        let response = self.client.get(url).send()?.error_for_status()?;
        let bytes = response.bytes()?;
        fs::write(dest, &bytes)?;
        debug!(
            "Feed payload written — dest={} bytes={}",
            dest.display(),
            bytes.len()
        );
        Ok(())
    }
}
