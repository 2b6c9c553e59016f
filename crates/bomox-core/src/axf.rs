use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;
use serde_json::Value;

use crate::dataset::{DatasetBuilder, Metadata, ParsedFeed};
use crate::BomError;

pub struct AxfParser;

impl AxfParser {
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ParsedFeed, BomError> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    /// Parses the line-oriented AXF layout: bracketed metadata sections of
    /// `key[unit]="value"` lines, a `[$]` skip marker, then a `[data]`
    /// section whose first non-blank line names the CSV columns.
    pub fn parse<R: BufRead>(reader: R) -> Result<ParsedFeed, BomError> {
        let mut sections: HashMap<String, Metadata> = HashMap::new();
        let mut current: Option<String> = None;
        let mut saw_data_marker = false;
        let mut columns: Option<Vec<String>> = None;
        let mut csv_block = String::new();

        for line in reader.lines() {
            let line = line?;

            if columns.is_some() {
                // Raw CSV region. Quoting and `[`-prefixed comment lines are
                // the csv reader's problem, not ours.
                csv_block.push_str(&line);
                csv_block.push('\n');
                continue;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if saw_data_marker {
                columns = Some(parse_column_names(trimmed)?);
                continue;
            }

            if let Some(name) = section_name(trimmed) {
                match name {
                    "$" => {}
                    "data" => saw_data_marker = true,
                    _ => {
                        // Opening a section resets its accumulator.
                        sections.insert(name.to_string(), Metadata::new());
                        current = Some(name.to_string());
                    }
                }
                continue;
            }

            if let Some(section) = &current {
                if let Some((key, value)) = split_metadata_line(trimmed) {
                    if let Some(fields) = sections.get_mut(section) {
                        fields.insert(key, Value::String(value));
                    }
                }
            }
        }

        if !saw_data_marker {
            return Err(BomError::MalformedInput(
                "missing [data] marker".to_string(),
            ));
        }
        let columns = columns.ok_or_else(|| {
            BomError::MalformedInput("missing column header line after [data]".to_string())
        })?;

        let header = sections.remove("header").ok_or_else(|| {
            BomError::MalformedInput("missing [header] section".to_string())
        })?;
        let notice = sections.remove("notice").ok_or_else(|| {
            BomError::MalformedInput("missing [notice] section".to_string())
        })?;

        let mut builder = DatasetBuilder::from_schema(columns)?;
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'['))
            .trim(csv::Trim::All)
            .from_reader(csv_block.as_bytes());
        for record in csv_reader.records() {
            let record = record?;
            let cells = record
                .iter()
                .map(|cell| Value::String(cell.to_string()))
                .collect();
            builder.push_row(cells)?;
        }

        let data = builder.build();
        debug!(
            "Parsed AXF feed — rows={} columns={}",
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

fn section_name(line: &str) -> Option<&str> {
    line.strip_prefix('[')?.strip_suffix(']')
}

/// `air_temp[C]` -> `air_temp`; the bracketed unit is a display hint,
/// not part of the name.
fn strip_unit(field: &str) -> &str {
    field.split('[').next().unwrap_or(field).trim()
}

fn parse_column_names(line: &str) -> Result<Vec<String>, BomError> {
    let names: Vec<String> = line
        .split(',')
        .map(|field| strip_unit(field).to_string())
        .collect();
    if names.is_empty() || names.iter().any(|name| name.is_empty()) {
        return Err(BomError::MalformedInput(format!(
            "cannot derive column names from header line '{}'",
            line
        )));
    }
    Ok(names)
}

fn split_metadata_line(line: &str) -> Option<(String, String)> {
    let eq = line.rfind('=')?;
    let key = strip_unit(&line[..eq]).to_string();
    if key.is_empty() {
        return None;
    }
    let value = line[eq + 1..].trim().trim_matches('"').to_string();
    Some((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "\
[header]
name[]=\"Test Station\"
[notice]
text[]=\"Copyright\"
[data]
local_date_time,air_temp,rel_hum
2018-01-01T00:00,20.0,50
2018-01-01T00:30,21.0,48
";

    #[test]
    fn test_parse_sample() {
        let feed = AxfParser::parse(Cursor::new(SAMPLE)).unwrap();

        assert_eq!(
            feed.header.get("name").and_then(Value::as_str),
            Some("Test Station")
        );
        assert_eq!(
            feed.notice.get("text").and_then(Value::as_str),
            Some("Copyright")
        );

        assert_eq!(
            feed.data.columns(),
            ["local_date_time", "air_temp", "rel_hum"]
        );
        assert_eq!(feed.data.len(), 2);
        assert_eq!(
            feed.data.column("air_temp").unwrap(),
            [
                Value::String("20.0".to_string()),
                Value::String("21.0".to_string())
            ]
        );
    }

    #[test]
    fn test_units_skip_marker_and_comments() {
        let text = "\
[header]
ID[]=\"IDV60901\"
name[80]=\"Melbourne (Olympic Park)\"

[notice]
copyright[80]=\"Copyright Commonwealth of Australia\"
[$]
[data]
sort_order[7],wmo[5],name[80],air_temp[C],rel_hum[%]
0,95936,\"Melbourne (Olympic Park)\",21.0,48
1,95936,\"Melbourne (Olympic Park)\",20.0,50
[$]
";
        let feed = AxfParser::parse(Cursor::new(text)).unwrap();

        // unit suffixes stripped from keys and column names
        assert_eq!(
            feed.header.get("name").and_then(Value::as_str),
            Some("Melbourne (Olympic Park)")
        );
        assert_eq!(
            feed.data.columns(),
            ["sort_order", "wmo", "name", "air_temp", "rel_hum"]
        );

        // trailing [$] inside the data region is a comment, quoted commas survive
        assert_eq!(feed.data.len(), 2);
        assert_eq!(
            feed.data.column("name").unwrap().first(),
            Some(&Value::String("Melbourne (Olympic Park)".to_string()))
        );
    }

    #[test]
    fn test_blank_lines_do_not_break_sections() {
        let text = "\
[header]

ID[]=\"IDV60901\"

name[]=\"Somewhere\"
[notice]
text[]=\"c\"
[data]
a,b
1,2
";
        let feed = AxfParser::parse(Cursor::new(text)).unwrap();
        assert_eq!(feed.header.len(), 2);
        assert_eq!(
            feed.header.get("name").and_then(Value::as_str),
            Some("Somewhere")
        );
    }

    #[test]
    fn test_header_row_after_blank_lines() {
        let text = "\
[header]
name[]=\"s\"
[notice]
text[]=\"c\"
[data]

a[x],b[y]
1,2
";
        let feed = AxfParser::parse(Cursor::new(text)).unwrap();
        assert_eq!(feed.data.columns(), ["a", "b"]);
        assert_eq!(feed.data.len(), 1);
    }

    #[test]
    fn test_reopened_section_resets_accumulator() {
        let text = "\
[header]
old[]=\"gone\"
[header]
name[]=\"kept\"
[notice]
text[]=\"c\"
[data]
a
1
";
        let feed = AxfParser::parse(Cursor::new(text)).unwrap();
        assert_eq!(feed.header.len(), 1);
        assert_eq!(feed.header.get("name").and_then(Value::as_str), Some("kept"));
    }

    #[test]
    fn test_missing_data_marker() {
        let text = "[header]\nname[]=\"s\"\n[notice]\ntext[]=\"c\"\n";
        let err = AxfParser::parse(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, BomError::MalformedInput(_)));
    }

    #[test]
    fn test_missing_column_header_line() {
        let text = "[header]\nname[]=\"s\"\n[notice]\ntext[]=\"c\"\n[data]\n";
        let err = AxfParser::parse(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, BomError::MalformedInput(_)));
    }

    #[test]
    fn test_missing_notice_section() {
        let text = "[header]\nname[]=\"s\"\n[data]\na\n1\n";
        let err = AxfParser::parse(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, BomError::MalformedInput(_)));
    }
}
