//! Record rendering for CLI commands.
//!
//! Every command hands serializable records to a [`RecordWriter`]. Records
//! go through `serde_json::Value`, so each format sees the wire field names.
//! `json-lines` and `csv` stream one record at a time; `table` and
//! `json-pretty` need every record before printing anything.
//!
//! For `table` and `csv`, nested objects are flattened to dotted keys
//! (`file.hash.md5`) and arrays are printed as JSON.

use clap::{Args, ValueEnum};
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Write;
use tabular::{Row, Table};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    JsonPretty,
    JsonLines,
}

/// Output flags shared by every command that prints records.
#[derive(Debug, Clone, Default, Args)]
pub struct OutputArgs {
    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Comma-separated columns to include (dotted paths for nested fields)
    #[arg(long, value_delimiter = ',')]
    pub columns: Option<Vec<String>>,
}

/// Writes records in one [`OutputFormat`].
pub struct RecordWriter<W: Write> {
    out: W,
    format: OutputFormat,
    columns: Option<Vec<String>>,
    csv_header: Option<Vec<String>>,
    buffered: Vec<Value>,
    count: usize,
}

impl RecordWriter<std::io::Stdout> {
    pub fn stdout(args: &OutputArgs) -> Self {
        RecordWriter::new(std::io::stdout(), args)
    }
}

impl<W: Write> RecordWriter<W> {
    pub fn new(out: W, args: &OutputArgs) -> Self {
        RecordWriter {
            out,
            format: args.format,
            columns: args.columns.clone().filter(|c| !c.is_empty()),
            csv_header: None,
            buffered: Vec::new(),
            count: 0,
        }
    }

    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let value = serde_json::to_value(record)?;
        match self.format {
            OutputFormat::JsonLines => {
                let value = self.project(&value);
                serde_json::to_writer(&mut self.out, &value)?;
                writeln!(self.out)?;
            }
            OutputFormat::Csv => self.write_csv_row(&value)?,
            OutputFormat::Table | OutputFormat::JsonPretty => self.buffered.push(value),
        }
        self.count += 1;
        Ok(())
    }

    /// Prints any buffered records and returns how many were written.
    pub fn finish(mut self) -> Result<usize> {
        match self.format {
            OutputFormat::Table => self.print_table()?,
            OutputFormat::JsonPretty => {
                let values: Vec<Value> = self.buffered.iter().map(|v| self.project(v)).collect();
                serde_json::to_writer_pretty(&mut self.out, &values)?;
                writeln!(self.out)?;
            }
            OutputFormat::Csv | OutputFormat::JsonLines => {}
        }
        self.out.flush()?;
        Ok(self.count)
    }

    /// Writes a single record. Tables show it as key/value rows; other
    /// formats behave as for a one-element list (`json-pretty` prints the
    /// object itself).
    pub fn write_one<T: Serialize>(mut self, record: &T) -> Result<()> {
        let value = serde_json::to_value(record)?;
        match self.format {
            OutputFormat::Table => {
                let flat = flatten(&value);
                let mut table =
                    Table::new("{:<}  {:<}").with_row(Row::from_cells(["Field", "Value"]));
                for key in self.select_columns(&[&flat]) {
                    let cell = flat.get(&key).map(cell_text).unwrap_or_default();
                    table.add_row(Row::new().with_cell(key).with_cell(cell));
                }
                write!(self.out, "{table}")?;
            }
            OutputFormat::JsonPretty => {
                let projected = self.project(&value);
                serde_json::to_writer_pretty(&mut self.out, &projected)?;
                writeln!(self.out)?;
            }
            OutputFormat::Csv | OutputFormat::JsonLines => {
                self.write(&value)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn write_csv_row(&mut self, value: &Value) -> Result<()> {
        let flat = flatten(value);
        let (header, first) = match &self.csv_header {
            Some(header) => (header.clone(), false),
            None => (self.select_columns(&[&flat]), true),
        };
        let row: Vec<String> = header
            .iter()
            .map(|key| flat.get(key).map(cell_text).unwrap_or_default())
            .collect();
        let mut csv_out = csv::Writer::from_writer(&mut self.out);
        if first {
            csv_out.write_record(&header)?;
        }
        csv_out.write_record(&row)?;
        csv_out.flush()?;
        if first {
            self.csv_header = Some(header);
        }
        Ok(())
    }

    fn print_table(&mut self) -> Result<()> {
        if self.buffered.is_empty() {
            return Ok(());
        }
        let rows: Vec<Map<String, Value>> = self.buffered.iter().map(flatten).collect();
        let refs: Vec<&Map<String, Value>> = rows.iter().collect();
        let header = self.select_columns(&refs);
        let spec = vec!["{:<}"; header.len()].join("  ");
        let mut table = Table::new(&spec).with_row(Row::from_cells(header.iter().cloned()));
        for flat in &rows {
            let mut row = Row::new();
            for key in &header {
                row.add_cell(flat.get(key).map(cell_text).unwrap_or_default());
            }
            table.add_row(row);
        }
        write!(self.out, "{table}")?;
        Ok(())
    }

    /// The requested columns, or every key seen in `rows` in first-seen
    /// order.
    fn select_columns(&self, rows: &[&Map<String, Value>]) -> Vec<String> {
        if let Some(columns) = &self.columns {
            return columns.clone();
        }
        let mut keys: Vec<String> = Vec::new();
        for row in rows {
            for key in row.keys() {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }
        keys
    }

    /// Restricts a JSON record to the requested columns, keyed by the
    /// column name as given.
    fn project(&self, value: &Value) -> Value {
        match &self.columns {
            None => value.clone(),
            Some(columns) => {
                let mut out = Map::new();
                for column in columns {
                    out.insert(column.clone(), lookup(value, column).cloned().unwrap_or(Value::Null));
                }
                Value::Object(out)
            }
        }
    }
}

/// Follows a dotted path (`file.hash.md5`). A top-level key that itself
/// contains dots (`@timestamp`, `$type`) is matched first.
fn lookup<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    if let Some(direct) = value.get(path) {
        return Some(direct);
    }
    path.split('.').try_fold(value, |current, key| current.get(key))
}

/// Flattens nested objects to dotted keys. Arrays stay as values.
pub fn flatten(value: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    match value {
        Value::Object(map) => flatten_into(&mut out, "", map),
        other => {
            out.insert("value".to_string(), other.clone());
        }
    }
    out
}

fn flatten_into(out: &mut Map<String, Value>, prefix: &str, map: &Map<String, Value>) {
    for (key, value) in map {
        let full = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(out, &full, inner),
            other => {
                out.insert(full, other.clone());
            }
        }
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(format: OutputFormat, columns: Option<&[&str]>, records: &[Value]) -> String {
        let args = OutputArgs {
            format,
            columns: columns.map(|c| c.iter().map(|s| s.to_string()).collect()),
        };
        let mut buf = Vec::new();
        let mut writer = RecordWriter::new(&mut buf, &args);
        for record in records {
            writer.write(record).unwrap();
        }
        writer.finish().unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn records() -> Vec<Value> {
        vec![
            json!({"id": "a", "file": {"name": "x.doc", "hash": {"md5": "m1"}}, "tags": ["t1"]}),
            json!({"id": "b", "file": {"name": "y.zip"}}),
        ]
    }

    #[test]
    fn json_lines_prints_one_object_per_line() {
        let text = render(OutputFormat::JsonLines, None, &records());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["file"]["hash"]["md5"], "m1");
    }

    #[test]
    fn csv_flattens_and_uses_first_record_header() {
        let text = render(OutputFormat::Csv, None, &records());
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("file.hash.md5,file.name,id,tags"));
        assert_eq!(lines.next(), Some("m1,x.doc,a,\"[\"\"t1\"\"]\""));
        assert_eq!(lines.next(), Some(",y.zip,b,"));
    }

    #[test]
    fn columns_select_dotted_paths() {
        let text = render(OutputFormat::JsonPretty, Some(&["id", "file.name"]), &records());
        let values: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(values, json!([
            {"id": "a", "file.name": "x.doc"},
            {"id": "b", "file.name": "y.zip"}
        ]));
    }

    #[test]
    fn table_has_header_and_a_row_per_record() {
        let text = render(OutputFormat::Table, Some(&["id", "file.name"]), &records());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id"));
        assert!(lines[2].contains("y.zip"));
    }

    #[test]
    fn empty_table_prints_nothing() {
        assert_eq!(render(OutputFormat::Table, None, &[]), "");
    }

    #[test]
    fn single_record_json_pretty_is_the_projected_object() {
        let args = OutputArgs {
            format: OutputFormat::JsonPretty,
            columns: Some(vec!["number".to_string()]),
        };
        let mut buf = Vec::new();
        RecordWriter::new(&mut buf, &args)
            .write_one(&json!({"number": 7, "name": "Case"}))
            .unwrap();
        let value: Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value, json!({"number": 7}));
    }

    #[test]
    fn lookup_prefers_literal_keys_with_dots() {
        let value = json!({"@timestamp": "t", "a": {"b": 1}});
        assert_eq!(lookup(&value, "@timestamp"), Some(&json!("t")));
        assert_eq!(lookup(&value, "a.b"), Some(&json!(1)));
        assert_eq!(lookup(&value, "a.c"), None);
    }

    #[test]
    fn single_record_table_is_key_value() {
        let mut buf = Vec::new();
        RecordWriter::new(&mut buf, &OutputArgs::default())
            .write_one(&json!({"number": 7, "name": "Case"}))
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.lines().any(|l| l.starts_with("name") && l.contains("Case")));
    }
}
