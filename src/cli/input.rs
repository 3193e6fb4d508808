//! Bulk input files.
//!
//! Bulk commands read one column of IDs from either a CSV file with a
//! header row or a JSON-lines file of objects. Every row is checked before
//! any request is sent; a malformed file is reported with its line number.

use clap::{Args, ValueEnum};
use serde_json::Value;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::error::{IncydrError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum InputFormat {
    #[default]
    Csv,
    JsonLines,
}

/// `--file` / `--file-format` flags for bulk commands.
#[derive(Debug, Clone, Args)]
pub struct BulkInputArgs {
    /// File listing the items to process
    #[arg(long)]
    pub file: PathBuf,

    /// Format of --file
    #[arg(long, value_enum, default_value_t = InputFormat::Csv)]
    pub file_format: InputFormat,
}

impl BulkInputArgs {
    pub fn read_column(&self, column: &str) -> Result<Vec<String>> {
        read_column(&self.file, self.file_format, column)
    }
}

/// Reads the values of `column` from every row of `path`.
pub fn read_column(path: &Path, format: InputFormat, column: &str) -> Result<Vec<String>> {
    let values = match format {
        InputFormat::Csv => read_csv_column(path, column)?,
        InputFormat::JsonLines => read_json_lines_column(path, column)?,
    };
    tracing::debug!(path = %path.display(), count = values.len(), "read bulk input");
    Ok(values)
}

fn read_csv_column(path: &Path, column: &str) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)?;
    let index = reader
        .headers()?
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| {
            IncydrError::Validation(format!(
                "{}: missing required column '{column}'",
                path.display()
            ))
        })?;
    let mut values = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let value = record.get(index).map(str::trim).unwrap_or_default();
        if value.is_empty() {
            // Header is line 1.
            return Err(IncydrError::Validation(format!(
                "{}: line {}: empty '{column}' value",
                path.display(),
                row + 2
            )));
        }
        values.push(value.to_string());
    }
    Ok(values)
}

fn read_json_lines_column(path: &Path, column: &str) -> Result<Vec<String>> {
    let file = std::io::BufReader::new(std::fs::File::open(path)?);
    let mut values = Vec::new();
    for (idx, line) in file.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let invalid = |reason: &str| {
            IncydrError::Validation(format!("{}: line {}: {reason}", path.display(), idx + 1))
        };
        let object: Value =
            serde_json::from_str(&line).map_err(|e| invalid(&format!("invalid JSON ({e})")))?;
        let value = match object.get(column) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(invalid(&format!("missing '{column}' value"))),
        };
        values.push(value);
    }
    Ok(values)
}
