// ⚠️ Error Types
// LoadError family (file missing / unreadable / malformed) and SchemaError

use crate::schema::SchemaViolation;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    /// Source file exists but cannot be used as a table (empty, no header)
    #[error("failed to load {}: {message}", .path.display())]
    Load { path: PathBuf, message: String },

    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("schema error: {}", format_violations(.0))]
    Schema(Vec<SchemaViolation>),

    #[error("query engine error")]
    Engine(#[from] rusqlite::Error),

    #[error("failed to render CSV output")]
    CsvOutput(#[source] csv::Error),

    #[error("failed to render JSON output")]
    Json(#[from] serde_json::Error),

    #[error("failed to render output: {0}")]
    Render(String),

    #[error("unexpected value in column `{column}`: {value}")]
    UnexpectedValue { column: String, value: String },
}

impl QueryError {
    pub fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        QueryError::Load {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for errors raised while reading the source file
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            QueryError::Load { .. } | QueryError::Io { .. } | QueryError::Csv { .. }
        )
    }

    pub fn is_schema_error(&self) -> bool {
        matches!(self, QueryError::Schema(_))
    }
}

fn format_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type QueryResult<T> = std::result::Result<T, QueryError>;
