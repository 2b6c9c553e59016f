use std::io::BufRead;
use std::path::Path;

use chrono::NaiveDateTime;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::axf::AxfParser;
use crate::dataset::{Dataset, Metadata, ParsedFeed};
use crate::fetch::FeedFetcher;
use crate::json_feed::JsonFeedParser;
use crate::plot;
use crate::{BomError, FeedFormat};

/// An immutable observation store: the normalized `(notice, header, data)`
/// triple for one fetched feed, plus the two plot layouts.
/// Single-threaded use only.
#[derive(Debug)]
pub struct Observations {
    notice: Metadata,
    header: Metadata,
    data: Dataset,
}

impl Observations {
    /// Fetches and parses a feed. The format is inferred from the URL
    /// suffix; the payload lands in a scoped temp file that is removed
    /// once parsing completes.
    pub fn from_url(url: &str) -> Result<Self, BomError> {
        let fetcher = FeedFetcher::new()?;
        Self::from_url_with(&fetcher, url)
    }

    pub fn from_url_with(fetcher: &FeedFetcher, url: &str) -> Result<Self, BomError> {
        let format = FeedFormat::from_url(url)?;
        let payload = NamedTempFile::new()?;
        fetcher.fetch_to(url, payload.path())?;
        Self::from_file(payload.path(), format)
    }

    pub fn from_file<P: AsRef<Path>>(path: P, format: FeedFormat) -> Result<Self, BomError> {
        let feed = match format {
            FeedFormat::Json => JsonFeedParser::parse_file(path)?,
            FeedFormat::Axf => AxfParser::parse_file(path)?,
        };
        Ok(Self::from_feed(feed))
    }

    pub fn from_reader<R: BufRead>(reader: R, format: FeedFormat) -> Result<Self, BomError> {
        let feed = match format {
            FeedFormat::Json => JsonFeedParser::parse(reader)?,
            FeedFormat::Axf => AxfParser::parse(reader)?,
        };
        Ok(Self::from_feed(feed))
    }

    fn from_feed(feed: ParsedFeed) -> Self {
        Self {
            notice: feed.notice,
            header: feed.header,
            data: feed.data,
        }
    }

    pub fn notice(&self) -> &Metadata {
        &self.notice
    }

    pub fn header(&self) -> &Metadata {
        &self.header
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    /// Station name from the feed header, if the feed supplies one.
    pub fn station_name(&self) -> Option<&str> {
        self.header.get("name").and_then(Value::as_str)
    }

    /// Timestamp of the newest record, from `local_date_time_full`.
    pub fn latest_time(&self) -> Option<NaiveDateTime> {
        let column = self.data.column("local_date_time_full")?;
        let newest = column.first()?.as_str()?;
        NaiveDateTime::parse_from_str(newest, "%Y%m%d%H%M%S").ok()
    }

    /// Renders temperature and humidity over time to a PNG file.
    /// `mode` 1 stacks the two series in separate panels; `mode` 2 (the
    /// default when `None`) overlays them on twin y axes with a legend.
    pub fn plot<P: AsRef<Path>>(&self, mode: Option<u8>, out: P) -> Result<(), BomError> {
        let layout = plot::layout_for_mode(mode)?;
        plot::render(&self.data, self.station_name(), layout, out.as_ref())
    }
}
