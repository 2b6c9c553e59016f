pub mod axf;
pub mod dataset;
pub mod fetch;
pub mod json_feed;
pub mod observations;
pub mod plot;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use dataset::{Dataset, DatasetBuilder, Metadata, ParsedFeed};
pub use fetch::FeedFetcher;
pub use observations::Observations;

pub const FEED_BASE_URL: &str = "http://reg.bom.gov.au/fwo";

#[derive(Error, Debug)]
pub enum BomError {
    #[error("malformed feed: {0}")]
    MalformedInput(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("render error: {0}")]
    Render(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Json,
    Axf,
}

impl FeedFormat {
    /// Derives the feed format from a URL or path suffix.
    pub fn from_url(url: &str) -> Result<Self, BomError> {
        let suffix = url.rsplit('.').next().unwrap_or("");
        match suffix.to_ascii_lowercase().as_str() {
            "json" => Ok(FeedFormat::Json),
            "axf" => Ok(FeedFormat::Axf),
            _ => Err(BomError::InvalidArgument(format!(
                "unsupported feed format in '{}' (expected a .json or .axf suffix)",
                url
            ))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FeedFormat::Json => "json",
            FeedFormat::Axf => "axf",
        }
    }
}

/// An observation product: a forecast-district product ID plus the WMO
/// station number, which together name the feed files on the BOM server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub wmo_id: String,
}

impl Product {
    pub fn new<P: Into<String>, W: Into<String>>(product_id: P, wmo_id: W) -> Self {
        Self {
            product_id: product_id.into(),
            wmo_id: wmo_id.into(),
        }
    }

    pub fn url(&self, format: FeedFormat) -> String {
        format!(
            "{}/{}/{}.{}.{}",
            FEED_BASE_URL,
            self.product_id,
            self.product_id,
            self.wmo_id,
            format.extension()
        )
    }
}

/// The default product: latest observations from Melbourne (Olympic Park).
pub fn melbourne_olympic_park() -> Product {
    Product::new("IDV60901", "95936")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_url() {
        assert_eq!(
            FeedFormat::from_url("http://reg.bom.gov.au/fwo/IDV60901/IDV60901.95936.json").unwrap(),
            FeedFormat::Json
        );
        assert_eq!(
            FeedFormat::from_url("http://reg.bom.gov.au/fwo/IDV60901/IDV60901.95936.axf").unwrap(),
            FeedFormat::Axf
        );
        assert_eq!(FeedFormat::from_url("obs.AXF").unwrap(), FeedFormat::Axf);
    }

    #[test]
    fn test_format_from_url_rejects_unknown_suffix() {
        let err = FeedFormat::from_url("http://reg.bom.gov.au/fwo/IDV60901.xml").unwrap_err();
        assert!(matches!(err, BomError::InvalidArgument(_)));

        let err = FeedFormat::from_url("no-suffix-at-all").unwrap_err();
        assert!(matches!(err, BomError::InvalidArgument(_)));
    }

    #[test]
    fn test_product_urls() {
        let melb = melbourne_olympic_park();
        assert_eq!(
            melb.url(FeedFormat::Json),
            "http://reg.bom.gov.au/fwo/IDV60901/IDV60901.95936.json"
        );
        assert_eq!(
            melb.url(FeedFormat::Axf),
            "http://reg.bom.gov.au/fwo/IDV60901/IDV60901.95936.axf"
        );
    }
}
