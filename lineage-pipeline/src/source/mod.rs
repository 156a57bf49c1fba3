//! Record sources.
//!
//! Reads CSV files (header row first) or JSON arrays of objects into
//! [`RawRecord`]s whose `row_index` is the 0-based data position.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use lineage_shared::RawRecord;
use serde_json::Value;
use tracing::info;

use crate::errors::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(SourceFormat::Csv),
            Some("json") => Ok(SourceFormat::Json),
            _ => Err(PipelineError::source(format!(
                "Cannot infer input format of {}; use a .csv or .json file",
                path.display()
            ))),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Csv => f.write_str("csv"),
            SourceFormat::Json => f.write_str("json"),
        }
    }
}

impl FromStr for SourceFormat {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "json" => Ok(SourceFormat::Json),
            other => Err(PipelineError::source(format!("Unknown input format: {}", other))),
        }
    }
}

/// Load every record from a file, inferring the format when not given.
pub fn load_records(
    path: &Path,
    format: Option<SourceFormat>,
) -> Result<Vec<RawRecord>, PipelineError> {
    let format = match format {
        Some(format) => format,
        None => SourceFormat::from_path(path)?,
    };

    let file = File::open(path).map_err(|e| {
        PipelineError::source(format!("Failed to open {}: {}", path.display(), e))
    })?;
    let reader = BufReader::new(file);

    let records = match format {
        SourceFormat::Csv => parse_csv(reader)?,
        SourceFormat::Json => parse_json(reader)?,
    };

    info!(
        path = %path.display(),
        format = %format,
        rows = records.len(),
        "Loaded input records"
    );
    Ok(records)
}

/// Parse CSV with a header row. Short rows leave the trailing columns absent.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<RawRecord>, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for (row_index, result) in reader.records().enumerate() {
        let row = result?;
        let fields = headers
            .iter()
            .zip(row.iter())
            .map(|(header, cell)| (header.to_string(), cell.to_string()));
        records.push(RawRecord::new(row_index, fields));
    }

    Ok(records)
}

/// Parse a top-level JSON array of objects.
pub fn parse_json<R: Read>(reader: R) -> Result<Vec<RawRecord>, PipelineError> {
    let document: Value = serde_json::from_reader(reader)?;
    let Value::Array(items) = document else {
        return Err(PipelineError::source(
            "JSON input must be an array of objects",
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(row_index, item)| match item {
            Value::Object(map) => Ok(RawRecord::new(
                row_index,
                map.into_iter()
                    .filter_map(|(key, value)| cell_text(value).map(|text| (key, text))),
            )),
            other => Err(PipelineError::source(format!(
                "JSON element {} is not an object: {}",
                row_index, other
            ))),
        })
        .collect()
}

fn cell_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        nested @ (Value::Array(_) | Value::Object(_)) => Some(nested.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv() {
        let input = "source_entity_guid,target_entity_guid,relationship_type,owner\n\
                     a, b ,feeds,alice\n\
                     c,d,derives\n";

        let records = parse_csv(input.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].row_index, 0);
        assert_eq!(records[0].value("target_entity_guid"), Some("b"));
        assert_eq!(records[0].value("owner"), Some("alice"));
        assert_eq!(records[1].row_index, 1);
        assert_eq!(records[1].value("owner"), None);
    }

    #[test]
    fn test_parse_json() {
        let input = r#"[
            {"source_entity_guid": "a", "confidence_score": 0.5, "metadata": {"k": [1]}, "owner": null},
            {"source_entity_guid": "b", "active": true}
        ]"#;

        let records = parse_json(input.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value("confidence_score"), Some("0.5"));
        assert_eq!(records[0].value("metadata"), Some(r#"{"k":[1]}"#));
        assert_eq!(records[0].value("owner"), None);
        assert_eq!(records[1].row_index, 1);
        assert_eq!(records[1].value("active"), Some("true"));
    }

    #[test]
    fn test_json_rejects_non_objects() {
        assert!(matches!(
            parse_json(r#"[{"a": "1"}, 42]"#.as_bytes()),
            Err(PipelineError::SourceError(msg)) if msg.contains("element 1")
        ));
        assert!(parse_json(r#"{"a": "1"}"#.as_bytes()).is_err());
        assert!(parse_json("not json".as_bytes()).is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            SourceFormat::from_path(Path::new("rows.CSV")).unwrap(),
            SourceFormat::Csv
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("dir/rows.json")).unwrap(),
            SourceFormat::Json
        );
        assert!(SourceFormat::from_path(Path::new("rows.txt")).is_err());
        assert_eq!("JSON".parse::<SourceFormat>().unwrap(), SourceFormat::Json);
    }
}
