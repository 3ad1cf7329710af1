use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    Internal(String),
    NotFound(String),
    ValidationError(String),
    DatabaseError(String),
    /// A write collided with an existing unique value.
    Conflict(String),
    IoError(String),
    ConfigError(String),

    // Import taxonomy. Each one is terminal for the current import attempt.
    UnreadableFile(String),
    EmptyFile,
    MissingColumns(Vec<String>),
    NoValidData { rejected: usize },
    Upsert(String),
    ImportInProgress(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            AppError::UnreadableFile(msg) => write!(f, "Could not read the file: {}", msg),
            AppError::EmptyFile => write!(f, "The file contains no rows"),
            AppError::MissingColumns(columns) => {
                write!(f, "Missing required columns: {}", columns.join(", "))
            }
            AppError::NoValidData { rejected } => write!(
                f,
                "No valid rows to import ({} rows rejected)",
                rejected
            ),
            AppError::Upsert(msg) => write!(f, "Saving the imported rows failed: {}", msg),
            AppError::ImportInProgress(entity) => {
                write!(f, "An import of {} is already running", entity)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_lists_fields() {
        let err = AppError::MissingColumns(vec!["name".to_string(), "extension".to_string()]);
        assert_eq!(err.to_string(), "Missing required columns: name, extension");
    }
}
