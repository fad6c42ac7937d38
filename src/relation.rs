// 🔗 Relation Builder - chainable relational operators over SQLite
// table → filter → aggregate → order → limit, compiled to a single SELECT

use crate::error::{QueryError, QueryResult};
use crate::infer::Value;
use crate::schema::SchemaViolation;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Quote an identifier for SQLite ("a""b")
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

// ============================================================================
// RESULT SET
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Every value of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }
}

// ============================================================================
// RELATION
// ============================================================================

/// A query that has not run yet.
///
/// Operations fold into one SELECT while they arrive in clause order
/// (WHERE, GROUP BY, ORDER BY, LIMIT). An operation that would land in an
/// earlier clause than one already set wraps the relation as a subquery.
#[derive(Clone)]
pub struct Relation<'conn> {
    conn: &'conn Connection,
    source: String,
    filters: Vec<String>,
    projection: Option<String>,
    groups: Option<String>,
    order: Option<String>,
    limit: Option<usize>,
    depth: usize,
}

impl<'conn> Relation<'conn> {
    /// Scan a table
    pub fn table(conn: &'conn Connection, name: &str) -> Self {
        Self::from_source(conn, quote_ident(name), 0)
    }

    /// Start from an arbitrary SELECT statement
    pub fn sql(conn: &'conn Connection, select: &str) -> Self {
        Self::from_source(conn, format!("({}) AS _rel0", select), 1)
    }

    fn from_source(conn: &'conn Connection, source: String, depth: usize) -> Self {
        Relation {
            conn,
            source,
            filters: Vec::new(),
            projection: None,
            groups: None,
            order: None,
            limit: None,
            depth,
        }
    }

    /// Turn the current query into the FROM source of a fresh one
    fn wrap(self) -> Self {
        let source = format!("({}) AS _rel{}", self.to_sql(), self.depth);
        Self::from_source(self.conn, source, self.depth + 1)
    }

    /// Keep rows matching a SQL predicate. Consecutive filters are AND-ed.
    pub fn filter(self, predicate: &str) -> Self {
        let mut rel = if self.projection.is_some() || self.order.is_some() || self.limit.is_some() {
            self.wrap()
        } else {
            self
        };
        rel.filters.push(predicate.to_string());
        rel
    }

    /// Compute `exprs` per group of `groups`. Empty `groups` = one global group.
    pub fn aggregate(self, exprs: &str, groups: &str) -> Self {
        let mut rel = if self.projection.is_some() || self.order.is_some() || self.limit.is_some() {
            self.wrap()
        } else {
            self
        };
        rel.projection = Some(exprs.to_string());
        rel.groups = match groups.trim() {
            "" => None,
            g => Some(g.to_string()),
        };
        rel
    }

    pub fn project(self, exprs: &str) -> Self {
        let mut rel = if self.projection.is_some() || self.order.is_some() || self.limit.is_some() {
            self.wrap()
        } else {
            self
        };
        rel.projection = Some(exprs.to_string());
        rel
    }

    /// Sort by SQL order keys (`count_name DESC, author`)
    pub fn order(self, keys: &str) -> Self {
        let mut rel = if self.order.is_some() || self.limit.is_some() {
            self.wrap()
        } else {
            self
        };
        rel.order = Some(keys.to_string());
        rel
    }

    pub fn limit(self, n: usize) -> Self {
        let mut rel = if self.limit.is_some() { self.wrap() } else { self };
        rel.limit = Some(n);
        rel
    }

    pub fn to_sql(&self) -> String {
        let mut sql = format!(
            "SELECT {} FROM {}",
            self.projection.as_deref().unwrap_or("*"),
            self.source
        );

        if !self.filters.is_empty() {
            let predicates: Vec<String> = self.filters.iter().map(|f| format!("({})", f)).collect();
            sql.push_str(" WHERE ");
            sql.push_str(&predicates.join(" AND "));
        }
        if let Some(groups) = &self.groups {
            sql.push_str(" GROUP BY ");
            sql.push_str(groups);
        }
        if let Some(order) = &self.order {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        sql
    }

    /// Run the query and materialize every row
    pub fn execute(&self) -> QueryResult<ResultSet> {
        let sql = self.to_sql();
        debug!(%sql, "executing relation");

        let mut stmt = self.conn.prepare(&sql).map_err(classify_engine_error)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();

        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get_ref(i).map(Value::from))
                    .collect::<rusqlite::Result<Vec<Value>>>()
            })
            .map_err(classify_engine_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(classify_engine_error)?;

        debug!(rows = rows.len(), "relation executed");

        Ok(ResultSet { columns, rows })
    }
}

impl fmt::Display for Relation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

impl fmt::Debug for Relation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation").field("sql", &self.to_sql()).finish()
    }
}

/// Unknown columns are a schema problem, everything else an engine one
fn classify_engine_error(err: rusqlite::Error) -> QueryError {
    const NO_SUCH_COLUMN: &str = "no such column: ";

    let message = err.to_string();
    match message.find(NO_SUCH_COLUMN) {
        Some(pos) => {
            let column = message[pos + NO_SUCH_COLUMN.len()..].trim();
            QueryError::Schema(vec![SchemaViolation::missing(column)])
        }
        None => QueryError::Engine(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE ducks (author TEXT, name TEXT, year INTEGER, extinct INTEGER);
             INSERT INTO ducks VALUES ('alice', 'mallard', 2001, 0);
             INSERT INTO ducks VALUES ('alice', 'teal', 2003, 0);
             INSERT INTO ducks VALUES ('bob', 'wigeon', 1999, 1);
             INSERT INTO ducks VALUES ('carol', 'pintail', 2010, 0);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("ducks"), "\"ducks\"");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn test_chain_folds_into_one_select() {
        let conn = setup();
        let rel = Relation::table(&conn, "ducks")
            .filter("extinct = 0")
            .aggregate("author, count(name) AS count_name", "author")
            .order("count_name DESC")
            .limit(5);

        assert_eq!(
            rel.to_sql(),
            "SELECT author, count(name) AS count_name FROM \"ducks\" \
             WHERE (extinct = 0) GROUP BY author ORDER BY count_name DESC LIMIT 5"
        );
    }

    #[test]
    fn test_consecutive_filters_are_anded() {
        let conn = setup();
        let rel = Relation::table(&conn, "ducks")
            .filter("extinct = 0")
            .filter("year > 2002");

        assert!(rel.to_sql().ends_with("WHERE (extinct = 0) AND (year > 2002)"));
        let result = rel.execute().unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_filter_after_aggregate_wraps() {
        let conn = setup();
        let rel = Relation::table(&conn, "ducks")
            .aggregate("author, count(*) AS n", "author")
            .filter("n > 1");

        assert_eq!(
            rel.to_sql(),
            "SELECT * FROM (SELECT author, count(*) AS n FROM \"ducks\" GROUP BY author) AS _rel0 \
             WHERE (n > 1)"
        );

        let result = rel.execute().unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows[0][0], Value::Text("alice".to_string()));
    }

    #[test]
    fn test_second_order_wraps() {
        let conn = setup();
        let sql = Relation::table(&conn, "ducks")
            .order("year")
            .order("name")
            .to_sql();

        assert!(sql.starts_with("SELECT * FROM (SELECT * FROM \"ducks\" ORDER BY year) AS _rel0"));
        assert!(sql.ends_with("ORDER BY name"));
    }

    #[test]
    fn test_global_aggregate() {
        let conn = setup();
        let result = Relation::table(&conn, "ducks")
            .aggregate("count(*) AS n, min(year) AS earliest", "")
            .execute()
            .unwrap();

        assert_eq!(result.columns, vec!["n", "earliest"]);
        assert_eq!(result.rows, vec![vec![Value::Integer(4), Value::Integer(1999)]]);
    }

    #[test]
    fn test_relation_from_sql() {
        let conn = setup();
        let result = Relation::sql(&conn, "SELECT name, year FROM ducks")
            .filter("year < 2002")
            .project("name")
            .order("name")
            .execute()
            .unwrap();

        assert_eq!(
            result.column("name").unwrap(),
            vec![&Value::Text("mallard".to_string()), &Value::Text("wigeon".to_string())]
        );
    }

    #[test]
    fn test_unknown_column_is_schema_error() {
        let conn = setup();
        let err = Relation::table(&conn, "ducks")
            .filter("species = 'teal'")
            .execute()
            .unwrap_err();

        match err {
            QueryError::Schema(violations) => assert_eq!(violations[0].column(), "species"),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_table_is_engine_error() {
        let conn = setup();
        let err = Relation::table(&conn, "geese").execute().unwrap_err();
        assert!(matches!(err, QueryError::Engine(_)), "got: {:?}", err);
    }
}
