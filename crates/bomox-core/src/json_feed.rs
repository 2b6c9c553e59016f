use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::debug;
use serde_json::Value;

use crate::dataset::{DatasetBuilder, Metadata, ParsedFeed};
use crate::BomError;

pub struct JsonFeedParser;

impl JsonFeedParser {
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ParsedFeed, BomError> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    pub fn parse<R: Read>(reader: R) -> Result<ParsedFeed, BomError> {
        let document: Value = serde_json::from_reader(reader)?;
        Self::from_document(&document)
    }

    /// Normalizes a parsed feed document. The document must hold an
    /// `observations` object with `notice`, `header` (sequences, first
    /// element taken) and a non-empty `data` sequence of records.
    pub fn from_document(document: &Value) -> Result<ParsedFeed, BomError> {
        let observations = document.get("observations").ok_or_else(|| {
            BomError::MalformedInput("missing 'observations' object".to_string())
        })?;

        let notice = first_block(observations, "notice")?;
        let header = first_block(observations, "header")?;

        let records = observations
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                BomError::MalformedInput("missing 'observations.data' sequence".to_string())
            })?;
        let first = records.first().ok_or_else(|| {
            BomError::MalformedInput("'observations.data' is empty".to_string())
        })?;
        let first = first.as_object().ok_or_else(|| {
            BomError::MalformedInput("observation record is not an object".to_string())
        })?;

        // The first record's key order is the dataset schema.
        let mut builder = DatasetBuilder::from_schema(first.keys().cloned())?;
        for record in records {
            let record = record.as_object().ok_or_else(|| {
                BomError::MalformedInput("observation record is not an object".to_string())
            })?;
            builder.push_record(record)?;
        }

        let data = builder.build();
        debug!(
            "Parsed JSON feed — rows={} columns={}",
            data.len(),
            data.columns().len()
        );
        Ok(ParsedFeed {
            notice,
            header,
            data,
        })
    }
}

fn first_block(observations: &Value, key: &str) -> Result<Metadata, BomError> {
    observations
        .get(key)
        .and_then(Value::as_array)
        .and_then(|sequence| sequence.first())
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| BomError::MalformedInput(format!("missing '{}' block in observations", key)))
}
