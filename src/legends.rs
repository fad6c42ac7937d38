// 🦆 Duck Legends - the query runner
// Which authors found the most (non-extinct) ducks, and when did they start?

use crate::error::{QueryError, QueryResult};
use crate::infer::Value;
use crate::loader::{load_csv, LoadOptions, LoadSummary};
use crate::relation::{Relation, ResultSet};
use crate::schema::{Requirement, SchemaValidator};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

pub const DEFAULT_SOURCE: &str = "ducks.csv";
pub const DUCKS_TABLE: &str = "ducks";

pub const LEGEND_COLUMNS: [&str; 3] = ["author", "count_name", "min_year"];

/// One output row: everything an author found, summarized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuckLegend {
    pub author: String,
    pub count_name: i64,
    /// None when every counted sighting has an empty year
    pub min_year: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegendReport {
    pub summary: LoadSummary,
    pub legends: Vec<DuckLegend>,
}

impl LegendReport {
    /// Legends as a generic result table for rendering
    pub fn to_result_set(&self) -> ResultSet {
        ResultSet {
            columns: LEGEND_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: self
                .legends
                .iter()
                .map(|l| {
                    vec![
                        Value::Text(l.author.clone()),
                        Value::Integer(l.count_name),
                        l.min_year.map(Value::Integer).unwrap_or(Value::Null),
                    ]
                })
                .collect(),
        }
    }
}

// ============================================================================
// QUERY
// ============================================================================

/// Columns the query touches, and what they must hold
pub fn legends_validator() -> SchemaValidator {
    SchemaValidator::new()
        .require("extinct", Requirement::IntegerLike)
        .require("author", Requirement::Present)
        .require("name", Requirement::Present)
        .require("year", Requirement::IntegerLike)
}

/// filter → aggregate → order.
/// Ties on count keep the order in which authors first appear in the file.
pub fn legends_relation<'conn>(conn: &'conn Connection, table: &str) -> Relation<'conn> {
    Relation::table(conn, table)
        .filter("extinct = 0")
        .aggregate(
            "author, count(name) AS count_name, min(year) AS min_year",
            "author",
        )
        .order("count_name DESC, min(_rowid_) ASC")
}

/// Run the legends query against a table produced by `load_csv`
pub fn duck_legends(conn: &Connection, summary: &LoadSummary) -> QueryResult<Vec<DuckLegend>> {
    legends_validator()
        .validate(&summary.schema)
        .map_err(QueryError::Schema)?;

    let result = legends_relation(conn, &summary.table).execute()?;

    let legends = result
        .rows
        .iter()
        .map(|row| legend_from_row(row))
        .collect::<QueryResult<Vec<_>>>()?;

    info!(authors = legends.len(), "duck legends computed");

    Ok(legends)
}

/// Load `csv_path` into a fresh in-memory database and run the query
pub fn run(csv_path: &Path, options: &LoadOptions) -> QueryResult<LegendReport> {
    let conn = Connection::open_in_memory()?;
    let summary = load_csv(&conn, csv_path, DUCKS_TABLE, options)?;
    let legends = duck_legends(&conn, &summary)?;

    Ok(LegendReport { summary, legends })
}

fn legend_from_row(row: &[Value]) -> QueryResult<DuckLegend> {
    let unexpected = |column: &str, value: &Value| QueryError::UnexpectedValue {
        column: column.to_string(),
        value: value.to_string(),
    };

    let author = match &row[0] {
        // Empty author fields load as NULL; they form one group
        Value::Null => String::new(),
        Value::Text(s) => s.clone(),
        other => other.to_string(),
    };

    let count_name = row[1].as_i64().ok_or_else(|| unexpected("count_name", &row[1]))?;

    let min_year = match &row[2] {
        Value::Null => None,
        Value::Integer(year) => Some(*year),
        other => return Err(unexpected("min_year", other)),
    };

    Ok(DuckLegend {
        author,
        count_name,
        min_year,
    })
}
