// 🖨️ Output Formatting - table / CSV / JSON / JSONL

use crate::error::{QueryError, QueryResult};
use crate::infer::Value;
use crate::relation::ResultSet;
use clap::ValueEnum;
use serde_json::{Map, Value as JsonValue};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Aligned ASCII table
    #[default]
    Table,
    Csv,
    /// JSON array of objects
    Json,
    /// One JSON object per line
    Jsonl,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

pub fn format_result(result: &ResultSet, format: OutputFormat) -> QueryResult<String> {
    match format {
        OutputFormat::Table => Ok(format_table(result)),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Json => format_json(result),
        OutputFormat::Jsonl => format_jsonl(result),
    }
}

// ============================================================================
// TABLE
// ============================================================================

fn format_table(result: &ResultSet) -> String {
    if result.columns.is_empty() {
        return "(empty result)".to_string();
    }

    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect();

    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();

    let header: Vec<String> = result
        .columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<width$}", c, width = *w))
        .collect();
    out.push_str(header.join(" | ").trim_end());
    out.push('\n');

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&sep.join("-+-"));
    out.push('\n');

    for (row, values) in cells.iter().zip(&result.rows) {
        let formatted: Vec<String> = row
            .iter()
            .zip(values)
            .zip(&widths)
            .map(|((cell, value), w)| match value {
                // Numbers right-aligned
                Value::Integer(_) | Value::Real(_) => format!("{:>width$}", cell, width = *w),
                _ => format!("{:<width$}", cell, width = *w),
            })
            .collect();
        out.push_str(formatted.join(" | ").trim_end());
        out.push('\n');
    }

    out.push_str(&format!(
        "({} row{})",
        result.len(),
        if result.len() == 1 { "" } else { "s" }
    ));

    out
}

// ============================================================================
// CSV / JSON
// ============================================================================

fn format_csv(result: &ResultSet) -> QueryResult<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    wtr.write_record(&result.columns)
        .map_err(QueryError::CsvOutput)?;
    for row in &result.rows {
        wtr.write_record(row.iter().map(|v| match v {
            Value::Null => String::new(),
            other => other.to_string(),
        }))
        .map_err(QueryError::CsvOutput)?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| QueryError::Render(e.to_string()))?;
    let out = String::from_utf8(bytes).map_err(|e| QueryError::Render(e.to_string()))?;

    Ok(out.trim_end_matches('\n').to_string())
}

fn row_object(columns: &[String], row: &[Value]) -> QueryResult<JsonValue> {
    let mut object = Map::new();
    for (column, value) in columns.iter().zip(row) {
        object.insert(column.clone(), serde_json::to_value(value)?);
    }
    Ok(JsonValue::Object(object))
}

fn format_json(result: &ResultSet) -> QueryResult<String> {
    let objects = result
        .rows
        .iter()
        .map(|row| row_object(&result.columns, row))
        .collect::<QueryResult<Vec<_>>>()?;

    Ok(serde_json::to_string_pretty(&objects)?)
}

fn format_jsonl(result: &ResultSet) -> QueryResult<String> {
    let lines = result
        .rows
        .iter()
        .map(|row| Ok(row_object(&result.columns, row)?.to_string()))
        .collect::<QueryResult<Vec<_>>>()?;

    Ok(lines.join("\n"))
}
