// 📐 Shape Layer - Schema Validation
// Checks a loaded table against the columns a query needs

use crate::infer::ColumnType;
use serde::{Deserialize, Serialize};

// ============================================================================
// TABLE SCHEMA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    /// Every field was empty, so the type is a default rather than an observation
    #[serde(default)]
    pub null_only: bool,
}

impl ColumnDef {
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        ColumnDef {
            name: name.to_string(),
            column_type,
            null_only: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        TableSchema { columns }
    }

    /// Look up a column the way SQL resolves identifiers (case-insensitive)
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ============================================================================
// VIOLATIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    MissingColumn {
        column: String,
    },
    WrongType {
        column: String,
        expected: &'static str,
        found: ColumnType,
    },
}

impl SchemaViolation {
    pub fn missing(column: &str) -> Self {
        SchemaViolation::MissingColumn {
            column: column.to_string(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            SchemaViolation::MissingColumn { column } => column,
            SchemaViolation::WrongType { column, .. } => column,
        }
    }
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaViolation::MissingColumn { column } => {
                write!(f, "required column `{}` not found", column)
            }
            SchemaViolation::WrongType {
                column,
                expected,
                found,
            } => write!(
                f,
                "column `{}` must be {}, found {}",
                column, expected, found
            ),
        }
    }
}

// ============================================================================
// SCHEMA VALIDATOR
// ============================================================================

/// What a query requires of one column
#[derive(Debug, Clone)]
pub enum Requirement {
    /// Any type will do
    Present,
    /// Integer or boolean (stored as 0/1)
    IntegerLike,
}

pub struct SchemaValidator {
    required: Vec<(String, Requirement)>,
}

impl SchemaValidator {
    pub fn new() -> Self {
        SchemaValidator {
            required: Vec::new(),
        }
    }

    pub fn require(mut self, column: &str, requirement: Requirement) -> Self {
        self.required.push((column.to_string(), requirement));
        self
    }

    /// Validate a schema, reporting every violation rather than the first
    pub fn validate(&self, schema: &TableSchema) -> Result<(), Vec<SchemaViolation>> {
        let mut errors = Vec::new();

        for (name, requirement) in &self.required {
            let Some(column) = schema.column(name) else {
                errors.push(SchemaViolation::missing(name));
                continue;
            };

            if let Requirement::IntegerLike = requirement {
                if !column.column_type.is_integer_like() && !column.null_only {
                    errors.push(SchemaViolation::WrongType {
                        column: name.clone(),
                        expected: "an integer",
                        found: column.column_type,
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}
