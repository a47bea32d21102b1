use std::sync::LazyLock;

use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use regex::Regex;

use crate::error::AppError;

/// `Key (field)=(value)` from the DETAIL line of a PostgreSQL constraint error.
static KEY_VALUE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Key \(([^)]+)\)=\(([^)]*)\)").ok());

/// Converts diesel errors into structured `AppError` variants.
///
/// Constraint names follow the PostgreSQL defaults: `<table>_<column>_key`
/// for unique constraints and `<table>_<column>_fkey` for foreign keys.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info.as_ref(), operation)
            }
            DieselError::NotFound => AppError::not_found("resource", "id", "unknown"),
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        info: &(dyn DatabaseErrorInformation + Send + Sync),
        operation: &str,
    ) -> AppError {
        let message = info.message();
        let detail = info.details().unwrap_or(message);
        let constraint = info.constraint_name().and_then(Self::parse_constraint_name);

        match (kind, constraint) {
            (DatabaseErrorKind::UniqueViolation, Some((table, column))) => {
                let value = Self::extract_key_value(detail)
                    .or_else(|| Self::extract_key_value(message))
                    .map(|(_, value)| value)
                    .unwrap_or_else(|| "duplicate_value".to_string());
                AppError::duplicate(&table, &column, value)
            }
            // Deleting a parent that still has children.
            (DatabaseErrorKind::ForeignKeyViolation, Some((table, _)))
                if message.starts_with("update or delete") =>
            {
                AppError::conflict(format!("record is still referenced by {table}"))
            }
            (DatabaseErrorKind::ForeignKeyViolation, Some((_, column))) => {
                let value = Self::extract_key_value(detail)
                    .or_else(|| Self::extract_key_value(message))
                    .map(|(_, value)| value)
                    .unwrap_or_else(|| "unknown".to_string());
                AppError::validation(&column, format!("Invalid reference with value '{value}'"))
            }
            (DatabaseErrorKind::NotNullViolation, _) => AppError::validation(
                info.column_name().unwrap_or("unknown"),
                "Field is required",
            ),
            (DatabaseErrorKind::CheckViolation, Some((_, column))) => {
                AppError::validation(&column, "Check constraint failed")
            }
            _ => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::msg(format!("Database error: {message}")),
            },
        }
    }

    /// Split `<table>_<column>_<suffix>` into `(table, column)`.
    pub fn parse_constraint_name(constraint: &str) -> Option<(String, String)> {
        let stem = ["_key", "_fkey", "_check", "_pkey"]
            .iter()
            .find_map(|suffix| constraint.strip_suffix(suffix))?;
        let (table, column) = stem.split_once('_')?;
        (!table.is_empty() && !column.is_empty()).then(|| (table.to_string(), column.to_string()))
    }

    pub fn extract_key_value(message: &str) -> Option<(String, String)> {
        let captures = KEY_VALUE.as_ref()?.captures(message)?;
        Some((captures[1].to_string(), captures[2].to_string()))
    }
}
