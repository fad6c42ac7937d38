// Duck Legends - Core Library
// CSV sightings → in-memory SQLite → filter / aggregate / order → rendered table

pub mod config;
pub mod error;
pub mod infer;
pub mod legends;
pub mod loader;
pub mod output;
pub mod relation;
pub mod schema;

// Re-export commonly used types
pub use config::{CliArgs, Config};
pub use error::{QueryError, QueryResult};
pub use infer::{infer_column, ColumnType, Value};
pub use legends::{
    duck_legends, legends_relation, legends_validator, run,
    DuckLegend, LegendReport, DEFAULT_SOURCE, DUCKS_TABLE,
};
pub use loader::{load_csv, normalize_headers, LoadOptions, LoadSummary};
pub use output::{format_result, OutputFormat};
pub use relation::{quote_ident, Relation, ResultSet};
pub use schema::{
    ColumnDef, Requirement, SchemaValidator, SchemaViolation, TableSchema,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
