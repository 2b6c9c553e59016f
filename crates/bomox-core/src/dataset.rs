use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::BomError;

/// A metadata block from a feed (station header or copyright notice).
pub type Metadata = serde_json::Map<String, Value>;

/// What a format reader produces: the two metadata blocks plus the table.
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub notice: Metadata,
    pub header: Metadata,
    pub data: Dataset,
}

/// Column-ordered observation table. Rows keep the feed's native order
/// (newest first); `reversed` yields the chronological view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<String>,
    series: Vec<Vec<Value>>,
}

impl Dataset {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.series.first().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(&self.series[index])
    }

    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.len() {
            return None;
        }
        Some(self.series.iter().map(|column| &column[index]).collect())
    }

    /// Same table with every column reversed (newest-first <-> oldest-first).
    pub fn reversed(&self) -> Dataset {
        let series = self
            .series
            .iter()
            .map(|column| column.iter().rev().cloned().collect())
            .collect();
        Dataset {
            columns: self.columns.clone(),
            series,
        }
    }
}

/// Builds a `Dataset` against a fixed schema: the first record's key order.
/// Records with a different field set are rejected rather than padded.
#[derive(Debug)]
pub struct DatasetBuilder {
    columns: Vec<String>,
    series: Vec<Vec<Value>>,
}

impl DatasetBuilder {
    pub fn from_schema<I>(keys: I) -> Result<Self, BomError>
    where
        I: IntoIterator<Item = String>,
    {
        let columns: Vec<String> = keys.into_iter().collect();
        if columns.is_empty() {
            return Err(BomError::MalformedInput(
                "observation schema has no fields".to_string(),
            ));
        }
        let series = columns.iter().map(|_| Vec::new()).collect();
        Ok(Self { columns, series })
    }

    pub fn push_record(&mut self, record: &Metadata) -> Result<(), BomError> {
        if record.len() != self.columns.len()
            || !self.columns.iter().all(|column| record.contains_key(column))
        {
            return Err(BomError::MalformedInput(format!(
                "observation record field set does not match the first record ({} fields: {})",
                self.columns.len(),
                self.columns.join(", ")
            )));
        }
        for index in 0..self.columns.len() {
            let value = record
                .get(&self.columns[index])
                .cloned()
                .unwrap_or(Value::Null);
            self.series[index].push(value);
        }
        Ok(())
    }

    pub fn push_row(&mut self, cells: Vec<Value>) -> Result<(), BomError> {
        if cells.len() != self.columns.len() {
            return Err(BomError::MalformedInput(format!(
                "data row has {} fields, expected {}",
                cells.len(),
                self.columns.len()
            )));
        }
        for (index, cell) in cells.into_iter().enumerate() {
            self.series[index].push(cell);
        }
        Ok(())
    }

    pub fn build(self) -> Dataset {
        Dataset {
            columns: self.columns,
            series: self.series,
        }
    }
}
