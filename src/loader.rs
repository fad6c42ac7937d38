// 📂 CSV Loader - CSV → in-memory SQLite table
// Column names come from the header, column types from value inspection

use crate::error::{QueryError, QueryResult};
use crate::infer::{infer_column, Value};
use crate::relation::quote_ident;
use crate::schema::{ColumnDef, TableSchema};
use chrono::{DateTime, Utc};
use rusqlite::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions { delimiter: b',' }
    }
}

/// What a load produced (provenance for the report)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSummary {
    pub source: PathBuf,
    pub table: String,
    pub schema: TableSchema,
    pub rows: usize,
    /// SHA-256 of the file bytes
    pub fingerprint: String,
    pub loaded_at: DateTime<Utc>,
}

impl LoadSummary {
    pub fn describe(&self) -> String {
        let columns: Vec<String> = self
            .schema
            .columns
            .iter()
            .map(|c| format!("{}:{}", c.name, c.column_type))
            .collect();

        format!(
            "{} → {} ({} rows; {}; sha256 {})",
            self.source.display(),
            self.table,
            self.rows,
            columns.join(", "),
            &self.fingerprint[..12.min(self.fingerprint.len())]
        )
    }
}

// ============================================================================
// HEADER HANDLING
// ============================================================================

/// SQLite's implicit row id aliases; a header with one of these names would hide file order
const ROWID_ALIASES: [&str; 3] = ["rowid", "oid", "_rowid_"];

/// Trim header names, name blank ones `column{i}`, suffix duplicates `_1`, `_2`...
/// Row id aliases are suffixed the same way.
pub fn normalize_headers<'a, I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashSet<String> = ROWID_ALIASES.iter().map(|a| a.to_string()).collect();
    let mut names = Vec::new();

    for (index, header) in raw.into_iter().enumerate() {
        let base = match header.trim() {
            "" => format!("column{}", index),
            trimmed => trimmed.to_string(),
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while !seen.insert(name.to_lowercase()) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        names.push(name);
    }

    names
}

// ============================================================================
// LOADING
// ============================================================================

pub fn load_csv(
    conn: &Connection,
    csv_path: &Path,
    table: &str,
    options: &LoadOptions,
) -> QueryResult<LoadSummary> {
    let bytes = std::fs::read(csv_path).map_err(|source| QueryError::Io {
        path: csv_path.to_path_buf(),
        source,
    })?;

    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(QueryError::load(csv_path, "file is empty (no header row)"));
    }

    let fingerprint = format!("{:x}", Sha256::digest(&bytes));

    let csv_err = |source: csv::Error| QueryError::Csv {
        path: csv_path.to_path_buf(),
        source,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes.as_slice());

    let headers = normalize_headers(rdr.headers().map_err(csv_err)?.iter());

    let records = rdr
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(csv_err)?;

    debug!(columns = headers.len(), records = records.len(), "parsed CSV");

    let columns: Vec<ColumnDef> = headers
        .into_iter()
        .enumerate()
        .map(|(i, name)| ColumnDef {
            column_type: infer_column(records.iter().map(|r| r.get(i).unwrap_or(""))),
            null_only: records.iter().all(|r| r.get(i).unwrap_or("").is_empty()),
            name,
        })
        .collect();
    let schema = TableSchema::new(columns);

    create_table(conn, table, &schema)?;
    let rows = insert_records(conn, table, &schema, &records)?;

    info!(
        source = %csv_path.display(),
        table,
        rows,
        columns = schema.len(),
        "loaded CSV"
    );

    Ok(LoadSummary {
        source: csv_path.to_path_buf(),
        table: table.to_string(),
        schema,
        rows,
        fingerprint,
        loaded_at: Utc::now(),
    })
}

fn create_table(conn: &Connection, table: &str, schema: &TableSchema) -> QueryResult<()> {
    let column_sql: Vec<String> = schema
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.column_type.sql_type()))
        .collect();

    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table};
         CREATE TABLE {table} ({columns});",
        table = quote_ident(table),
        columns = column_sql.join(", ")
    ))?;

    Ok(())
}

/// Insert in file order so rowid == record ordinal
fn insert_records(
    conn: &Connection,
    table: &str,
    schema: &TableSchema,
    records: &[csv::StringRecord],
) -> QueryResult<usize> {
    let placeholders: Vec<String> = (1..=schema.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "INSERT INTO {} VALUES ({})",
        quote_ident(table),
        placeholders.join(", ")
    );

    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(&sql)?;

        for record in records {
            let cells = schema
                .columns
                .iter()
                .enumerate()
                .map(|(i, column)| convert_field(column, record.get(i).unwrap_or("")))
                .collect::<QueryResult<Vec<Value>>>()?;

            stmt.execute(params_from_iter(cells.iter()))?;
        }
    }
    tx.commit()?;

    Ok(records.len())
}

fn convert_field(column: &ColumnDef, raw: &str) -> QueryResult<Value> {
    column
        .column_type
        .convert(raw)
        .ok_or_else(|| QueryError::UnexpectedValue {
            column: column.name.clone(),
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::ColumnType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_normalize_headers() {
        let names = normalize_headers([" author ", "", "name", "Name", "name"]);
        assert_eq!(names, vec!["author", "column1", "name", "Name_1", "name_2"]);
    }

    #[test]
    fn test_rowid_alias_headers_are_renamed() {
        let names = normalize_headers(["_rowid_", "ROWID", "oid", "author"]);
        assert_eq!(names, vec!["_rowid__1", "ROWID_1", "oid_1", "author"]);
    }

    #[test]
    fn test_load_infers_types_and_rows() {
        let file = write_csv(
            "author,name,year,extinct\n\
             alice,mallard,2001,0\n\
             alice,teal,2003,0\n\
             bob,wigeon,1999,1\n",
        );
        let conn = Connection::open_in_memory().unwrap();

        let summary = load_csv(&conn, file.path(), "ducks", &LoadOptions::default()).unwrap();

        assert_eq!(summary.rows, 3);
        assert_eq!(summary.schema.names(), vec!["author", "name", "year", "extinct"]);
        assert_eq!(summary.schema.column("year").unwrap().column_type, ColumnType::Integer);
        assert_eq!(summary.schema.column("author").unwrap().column_type, ColumnType::Text);
        assert_eq!(summary.fingerprint.len(), 64, "SHA-256 should be 64 hex characters");

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM ducks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 3);

        // rowid follows file order
        let first: String = conn
            .query_row("SELECT name FROM ducks WHERE _rowid_ = 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(first, "mallard");
    }

    #[test]
    fn test_boolean_flags_stored_as_integers() {
        let file = write_csv("author,extinct\nalice,false\nbob,TRUE\n");
        let conn = Connection::open_in_memory().unwrap();

        let summary = load_csv(&conn, file.path(), "ducks", &LoadOptions::default()).unwrap();
        assert_eq!(summary.schema.column("extinct").unwrap().column_type, ColumnType::Boolean);

        let alive: i64 = conn
            .query_row("SELECT COUNT(*) FROM ducks WHERE extinct = 0", [], |row| row.get(0))
            .unwrap();
        assert_eq!(alive, 1);
    }

    #[test]
    fn test_empty_fields_load_as_null() {
        let file = write_csv("author,year\nalice,\nbob,1999\n");
        let conn = Connection::open_in_memory().unwrap();

        load_csv(&conn, file.path(), "ducks", &LoadOptions::default()).unwrap();

        let nulls: i64 = conn
            .query_row("SELECT COUNT(*) FROM ducks WHERE year IS NULL", [], |row| row.get(0))
            .unwrap();
        assert_eq!(nulls, 1);
    }

    #[test]
    fn test_header_only_file_loads_zero_rows() {
        let file = write_csv("author,name,year,extinct\n");
        let conn = Connection::open_in_memory().unwrap();

        let summary = load_csv(&conn, file.path(), "ducks", &LoadOptions::default()).unwrap();
        assert_eq!(summary.rows, 0);
        assert_eq!(summary.schema.len(), 4);
        assert!(summary.schema.columns.iter().all(|c| c.null_only));
    }

    #[test]
    fn test_custom_delimiter() {
        let file = write_csv("author;year\nalice;2001\n");
        let conn = Connection::open_in_memory().unwrap();

        let summary =
            load_csv(&conn, file.path(), "ducks", &LoadOptions { delimiter: b';' }).unwrap();
        assert_eq!(summary.schema.names(), vec!["author", "year"]);
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let conn = Connection::open_in_memory().unwrap();
        let err = load_csv(
            &conn,
            Path::new("/nonexistent/ducks.csv"),
            "ducks",
            &LoadOptions::default(),
        )
        .unwrap_err();

        assert!(err.is_load_error(), "got: {:?}", err);
    }

    #[test]
    fn test_empty_file_is_load_error() {
        let file = write_csv("");
        let conn = Connection::open_in_memory().unwrap();

        let err = load_csv(&conn, file.path(), "ducks", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, QueryError::Load { .. }), "got: {:?}", err);
    }

    #[test]
    fn test_ragged_rows_are_load_error() {
        let file = write_csv("author,name,year\nalice,mallard\n");
        let conn = Connection::open_in_memory().unwrap();

        let err = load_csv(&conn, file.path(), "ducks", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, QueryError::Csv { .. }), "got: {:?}", err);
    }
}
